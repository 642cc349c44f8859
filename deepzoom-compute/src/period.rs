//! Checkpoint cadence and periodicity windows.
//!
//! Anchor iterations follow the Fibonacci schedule 1, 2, 3, 5, 8, 13, 21,
//! 34, ... so the number of anchors up to n is O(log n). The same cadence
//! drives reference-orbit checkpoints and per-pixel periodicity closure.

/// Distance from iteration `n` (1-indexed) back to the most recent anchor,
/// counting the anchor iteration itself: `d = n - a + 1` for the greatest
/// anchor `a <= n`.
///
/// `d == 1` exactly at anchor iterations and signals "take a checkpoint
/// here". A periodicity closure observed at iteration `n` against a
/// baseline snapshotted on entry to anchor `a` spans `d` true iterations,
/// so `d` is the reported orbital period (not `d - 1`; the entering-state
/// snapshot absorbs the save/compute offset).
pub fn checkpoint_distance(n: u64) -> u64 {
    debug_assert!(n >= 1, "iterations are 1-indexed");
    n - previous_anchor(n) + 1
}

/// True when `n` is an anchor iteration.
pub fn is_anchor(n: u64) -> bool {
    checkpoint_distance(n) == 1
}

/// Greatest anchor iteration `<= n`.
pub fn previous_anchor(n: u64) -> u64 {
    let mut a: u64 = 1;
    let mut b: u64 = 2;
    while b <= n {
        let next = match a.checked_add(b) {
            Some(s) => s,
            None => break,
        };
        a = b;
        b = next;
    }
    a
}

/// All anchors up to and including `n`, in increasing order.
pub fn anchors_up_to(n: u64) -> Vec<u64> {
    let mut out = Vec::new();
    let mut a: u64 = 1;
    let mut b: u64 = 2;
    while a <= n {
        out.push(a);
        let next = match a.checked_add(b) {
            Some(s) => s,
            None => break,
        };
        a = b;
        b = next;
    }
    out
}
