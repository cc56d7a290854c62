use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use crate::assets::decode::DecodedImage;
use crate::foundation::error::{ThumbError, ThumbResult};

/// A background-removal service: turns an image into a transparent-background cutout.
///
/// `progress` receives completion percentages in `0..=100`; implementations may call it any
/// number of times, including never.
pub trait BackgroundRemover: Send + Sync {
    /// Produce the cutout for `image`.
    fn remove_background(
        &self,
        image: &DecodedImage,
        progress: &mut dyn FnMut(f32),
    ) -> ThumbResult<DecodedImage>;
}

/// Message sent from a removal worker.
#[derive(Debug)]
pub enum RemovalEvent {
    /// Completion percentage in `0..=100`.
    Progress(f32),
    /// Final result; always the last event.
    Finished(ThumbResult<DecodedImage>),
}

/// Handle to a background removal running on its own thread.
#[derive(Debug)]
pub struct RemovalTask {
    rx: mpsc::Receiver<RemovalEvent>,
    handle: Option<JoinHandle<()>>,
}

/// Start `remover` on a dedicated thread; progress and the result arrive over a channel.
#[tracing::instrument(skip(remover, image), fields(width = image.width, height = image.height))]
pub fn spawn_removal(
    remover: Arc<dyn BackgroundRemover>,
    image: DecodedImage,
) -> ThumbResult<RemovalTask> {
    let (tx, rx) = mpsc::channel::<RemovalEvent>();
    let handle = std::thread::Builder::new()
        .name("thumbkit-removal".to_owned())
        .spawn(move || {
            let progress_tx = tx.clone();
            let mut progress = |pct: f32| {
                let pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
                // The receiver may have been dropped; the result is simply discarded then.
                let _ = progress_tx.send(RemovalEvent::Progress(pct));
            };
            let result = remover.remove_background(&image, &mut progress);
            let _ = tx.send(RemovalEvent::Finished(result));
        })
        .map_err(|e| ThumbError::removal(format!("spawn removal worker: {e}")))?;

    Ok(RemovalTask {
        rx,
        handle: Some(handle),
    })
}

impl RemovalTask {
    /// Next event if one is ready, without blocking.
    pub fn try_next(&self) -> Option<RemovalEvent> {
        self.rx.try_recv().ok()
    }

    /// Block until the worker finishes, forwarding progress to `on_progress`.
    pub fn wait(mut self, mut on_progress: impl FnMut(f32)) -> ThumbResult<DecodedImage> {
        let outcome = loop {
            match self.rx.recv() {
                Ok(RemovalEvent::Progress(pct)) => on_progress(pct),
                Ok(RemovalEvent::Finished(result)) => break Some(result),
                Err(_) => break None,
            }
        };

        let joined = self.handle.take().map(JoinHandle::join);
        if let Some(Err(_)) = joined {
            return Err(ThumbError::removal("background removal worker panicked"));
        }
        outcome.unwrap_or_else(|| {
            Err(ThumbError::removal(
                "background removal worker stopped without a result",
            ))
        })
    }
}

/// Keys out pixels close to the image's corner color.
///
/// Deterministic stand-in for a segmentation model: the key is the mean of the four corner
/// pixels, pixels within `tolerance` (normalized RGB distance, `0..=1`) become transparent and
/// pixels within a further `feather` fade linearly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorKeyRemover {
    tolerance: f32,
    feather: f32,
}

impl Default for ColorKeyRemover {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            feather: 0.05,
        }
    }
}

impl ColorKeyRemover {
    /// Remover with the given tolerance and feather, both in `0..=1`.
    pub fn new(tolerance: f32, feather: f32) -> ThumbResult<Self> {
        for (name, v) in [("tolerance", tolerance), ("feather", feather)] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(ThumbError::validation(format!(
                    "color key {name} must be in 0..=1, got {v}"
                )));
            }
        }
        Ok(Self { tolerance, feather })
    }

    /// Key tolerance.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    fn key_color(rgba: &[u8], w: usize, h: usize) -> [f32; 3] {
        let corners = [0, w - 1, (h - 1) * w, h * w - 1];
        let mut sum = [0.0f32; 3];
        for i in corners {
            for c in 0..3 {
                sum[c] += f32::from(rgba[i * 4 + c]) / 255.0;
            }
        }
        sum.map(|v| v / 4.0)
    }
}

impl BackgroundRemover for ColorKeyRemover {
    fn remove_background(
        &self,
        image: &DecodedImage,
        progress: &mut dyn FnMut(f32),
    ) -> ThumbResult<DecodedImage> {
        let (w, h) = (image.width as usize, image.height as usize);
        if w == 0 || h == 0 {
            return Err(ThumbError::removal("cannot remove background of an empty image"));
        }
        let mut rgba = image.to_straight_rgba8();
        let key = Self::key_color(&rgba, w, h);
        let norm = 3.0f32.sqrt();

        progress(0.0);
        let report_every = (h / 10).max(1);
        for (y, row) in rgba.chunks_exact_mut(w * 4).enumerate() {
            for px in row.chunks_exact_mut(4) {
                let d = (0..3)
                    .map(|c| {
                        let v = f32::from(px[c]) / 255.0 - key[c];
                        v * v
                    })
                    .sum::<f32>()
                    .sqrt()
                    / norm;
                let keep = if d <= self.tolerance {
                    0.0
                } else if self.feather > 0.0 && d < self.tolerance + self.feather {
                    (d - self.tolerance) / self.feather
                } else {
                    1.0
                };
                px[3] = (f32::from(px[3]) * keep).round() as u8;
            }
            if (y + 1) % report_every == 0 {
                progress((y + 1) as f32 / h as f32 * 100.0);
            }
        }
        progress(100.0);
        DecodedImage::from_straight(image.width, image.height, rgba)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/removal/service.rs"]
mod tests;
