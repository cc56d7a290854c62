use super::*;

#[test]
fn empty_history_undo_redo_are_no_ops() {
    let mut h = EditHistory::new("a");
    assert!(!h.can_undo());
    assert!(!h.can_redo());
    assert_eq!(h.undo(), None);
    assert_eq!(h.redo(), None);
    assert_eq!(*h.current(), "a");
}

#[test]
fn snapshot_pushes_current_and_clears_redo() {
    let mut h = EditHistory::new(0);
    h.snapshot(1);
    h.snapshot(2);
    assert_eq!(h.undo(), Some(&1));
    assert!(h.can_redo());
    h.snapshot(3);
    assert!(!h.can_redo());
    assert_eq!(*h.current(), 3);
    assert_eq!(h.undo(), Some(&1));
    assert_eq!(h.undo(), Some(&0));
    assert_eq!(h.undo(), None);
}

#[test]
fn n_undos_then_n_redos_round_trip() {
    for n in 1..6 {
        let mut h = EditHistory::new(0usize);
        for i in 1..=n {
            h.snapshot(i);
        }
        for _ in 0..n {
            assert!(h.undo().is_some());
        }
        assert_eq!(*h.current(), 0);
        assert_eq!((h.undo_len(), h.redo_len()), (0, n));

        for _ in 0..n {
            assert!(h.redo().is_some());
        }
        assert_eq!(*h.current(), n);
        assert_eq!((h.undo_len(), h.redo_len()), (n, 0));
    }
}

#[test]
fn capacity_drops_oldest_steps() {
    let mut h = EditHistory::with_capacity('a', 2);
    h.snapshot('b');
    h.snapshot('c');
    h.snapshot('d');
    assert_eq!(h.undo_len(), 2);
    assert_eq!(h.undo(), Some(&'c'));
    assert_eq!(h.undo(), Some(&'b'));
    assert_eq!(h.undo(), None);
    assert_eq!(h.capacity(), 2);
    assert_eq!(EditHistory::with_capacity(0, 0).capacity(), 1);
}

#[test]
fn clear_keeps_current() {
    let mut h = EditHistory::new(String::from("x"));
    h.snapshot("y".into());
    h.undo();
    h.clear();
    assert_eq!(h.current(), "x");
    assert!(!h.can_undo() && !h.can_redo());
}
