//! Blocking interrupt signals around process spawning.

use crate::error::Result;
use log::warn;
use nix::sys::signal::{SigSet, SigmaskHow, Signal};

/// The set of signals held off while the shell updates its process bookkeeping.
pub fn critical_signals() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    set
}

/// Blocks a signal set on the current thread until dropped.
///
/// The previous mask is restored on drop, so nesting guards is safe. Children
/// spawned through `std::process::Command` start with an empty mask regardless.
#[must_use = "signals are unblocked again as soon as the guard is dropped"]
pub struct SignalBlock {
    previous: SigSet,
}

impl SignalBlock {
    pub fn new(set: &SigSet) -> Result<Self> {
        let previous = set.thread_swap_mask(SigmaskHow::SIG_BLOCK)?;
        Ok(Self { previous })
    }
}

impl Drop for SignalBlock {
    fn drop(&mut self) {
        if let Err(e) = self.previous.thread_set_mask() {
            warn!("failed to restore signal mask: {e}");
        }
    }
}
