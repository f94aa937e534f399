//! The cancellation token `Select`'s entry point threads through every
//! compiled pipeline (§6 "context: cancellation token / deadline (abstract)").
//!
//! The engine holds no mutable global state (§5), so this is deliberately
//! `Rc`-based rather than borrowed: a token must outlive every `BoxStream`
//! `compile()` hands back, and those streams are boxed `'static` trait
//! objects. Single-threaded cooperative scheduling (§5) means `Rc` is the
//! right shared-ownership primitive here, not `Arc`.

use std::{
    rc::Rc,
    sync::atomic::{AtomicBool, Ordering},
};

///
/// CancellationToken
///
/// Checked at factory-call boundaries; per §9's design note, checking once
/// per window (rather than threading it into every combinator) bounds
/// cancellation latency by at most one window's worth of work.
///

pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// The default token for hosts that never cancel a query.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

///
/// FlagCancellationToken
///
/// A minimal concrete token: an `Rc<AtomicBool>` a host flips from outside
/// the pipeline (e.g. from a connection-close handler). `AtomicBool` is used
/// over `Cell<bool>` purely so the flag can be flipped through a `&self`
/// method without `unsafe`; the pipeline itself never crosses a thread.
///

#[derive(Clone, Debug, Default)]
pub struct FlagCancellationToken(Rc<AtomicBool>);

impl FlagCancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl CancellationToken for FlagCancellationToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_cancelled_is_always_false() {
        assert!(!NeverCancelled.is_cancelled());
    }

    #[test]
    fn flag_token_observes_cancel_through_clones() {
        let token = FlagCancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
