//! Connectivity gate for network-dependent lookups.

/// Answers "is it worth attempting a network request right now?".
///
/// Implementations wrap whatever reachability signal the host platform
/// provides. The answer is advisory: a `true` does not guarantee a request
/// will succeed, it only stops the controller from firing requests that are
/// known to be doomed.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Trivial gate for hosts without a reachability signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}
