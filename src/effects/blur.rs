use crate::foundation::error::{ThumbError, ThumbResult};

/// Largest blur radius (in pixels) a single pass will run.
pub(crate) const MAX_BLUR_RADIUS: u32 = 256;

/// Kernel radius that covers a gaussian of the given standard deviation.
pub(crate) fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    ((sigma * 3.0).ceil() as u32).min(MAX_BLUR_RADIUS)
}

/// Gaussian blur over premultiplied RGBA8 with standard deviation `sigma` in pixels.
///
/// Edge pixels are clamped (replicated) outside the buffer.
pub(crate) fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> ThumbResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .filter(|&len| len == src.len())
        .ok_or_else(|| {
            ThumbError::render(format!(
                "blur input of {} bytes does not match {width}x{height} RGBA8",
                src.len()
            ))
        })?;
    let radius = radius_for_sigma(sigma);
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let (w, h) = (width as usize, height as usize);
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];
    convolve(src, &mut tmp, w, h, &kernel, Axis::Horizontal);
    convolve(&tmp, &mut out, w, h, &kernel, Axis::Vertical);
    Ok(out)
}

/// Normalized gaussian weights for `-radius..=radius` in Q16; they sum to exactly `1 << 16`.
pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ThumbResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ThumbError::validation("blur sigma must be finite and > 0"));
    }

    let r = i64::from(radius);
    let two_sigma_sq = 2.0 * f64::from(sigma).powi(2);
    let raw: Vec<f64> = (-r..=r)
        .map(|i| (-((i * i) as f64) / two_sigma_sq).exp())
        .collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(ThumbError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = raw
        .iter()
        .map(|w| ((w / total) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Rounding drift goes to the center tap.
    let drift = 65536 - weights.iter().map(|&w| i64::from(w)).sum::<i64>();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + drift).clamp(0, 65536) as u32;
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One separable pass along `axis`, replicating edge pixels.
fn convolve(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32], axis: Axis) {
    let radius = kernel.len() / 2;
    let (len, lines) = match axis {
        Axis::Horizontal => (width, height),
        Axis::Vertical => (height, width),
    };
    let offset = |line: usize, pos: usize| match axis {
        Axis::Horizontal => (line * width + pos) * 4,
        Axis::Vertical => (pos * width + line) * 4,
    };

    for line in 0..lines {
        for pos in 0..len {
            let mut acc = [0u64; 4];
            for (k, &weight) in kernel.iter().enumerate() {
                let sample = (pos + k).saturating_sub(radius).min(len - 1);
                let i = offset(line, sample);
                for (a, &v) in acc.iter_mut().zip(&src[i..i + 4]) {
                    *a += u64::from(weight) * u64::from(v);
                }
            }
            let o = offset(line, pos);
            for (d, a) in dst[o..o + 4].iter_mut().zip(acc) {
                *d = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
