//! Window boundary math and the per-series window state machine used by
//! the call iterator.

use chrono::{DateTime, Utc};

/// Renders a nanosecond epoch timestamp as RFC 3339, for trace logging and
/// test failure messages only — the engine's own arithmetic stays in raw
/// `i64` nanoseconds throughout.
#[must_use]
pub fn format_nanos(t: i64) -> String {
    DateTime::<Utc>::from_timestamp_nanos(t).to_rfc3339()
}

///
/// Compute the half-open window `[w, w+interval)` containing `t`:
/// `w = lo + offset + floor((t - lo - offset) / D) * D`.
///
/// `interval == 0` means "no windowing"; callers should not invoke this in
/// that case, but it degenerates to returning `lo` unconditionally so a
/// caller that does is not punished with a panic.
#[must_use]
pub fn window_start(t: i64, lo: i64, offset: i64, interval: i64) -> i64 {
    if interval <= 0 {
        return lo;
    }

    let base = lo.saturating_add(offset);
    let delta = t.saturating_sub(base);
    // Floor-division toward negative infinity, not truncation, so points
    // before `base` still land in the correct (negative-indexed) window.
    let steps = delta.div_euclid(interval);
    base.saturating_add(steps.saturating_mul(interval))
}

/// Enumerate every window start in `[lo, hi)`, inclusive of `lo`'s window,
/// exclusive of `hi`. Used by the fill combinator to synthesize points for
/// windows a series never touched.
#[must_use]
pub fn window_starts(lo: i64, hi: i64, offset: i64, interval: i64) -> Vec<i64> {
    if interval <= 0 {
        return Vec::new();
    }

    let first = window_start(lo, lo, offset, interval);
    let mut starts = Vec::new();
    let mut w = first;
    while w < hi {
        starts.push(w);
        w = w.saturating_add(interval);
    }
    starts
}
