//! Process-scoped audio host lifecycle.
//!
//! Several capture sessions may hold the host at once. The first lease
//! brings it up and the last one to drop tears it down; no single session
//! owns it.

use parking_lot::{const_mutex, Mutex};

use crate::error::CpalError;

static HOST_LEASES: LeaseCounter = LeaseCounter::new();

/// Counts live leases. `enter`/`exit` report the first and last user.
pub(crate) struct LeaseCounter {
    users: Mutex<usize>,
}

impl LeaseCounter {
    pub(crate) const fn new() -> Self {
        Self {
            users: const_mutex(0),
        }
    }

    /// Returns true for the first live lease.
    pub(crate) fn enter(&self) -> bool {
        let mut users = self.users.lock();
        *users += 1;
        *users == 1
    }

    /// Returns true when the last live lease is released.
    pub(crate) fn exit(&self) -> bool {
        let mut users = self.users.lock();
        *users = users.saturating_sub(1);
        *users == 0
    }

    pub(crate) fn count(&self) -> usize {
        *self.users.lock()
    }
}

/// A counted handle on a cpal host.
pub struct HostLease {
    host: cpal::Host,
}

impl HostLease {
    /// Lease the named host (matched case-insensitively against cpal host
    /// ids), or the platform default when `name` is None.
    pub fn acquire(name: Option<&str>) -> Result<Self, CpalError> {
        let host = match name {
            None => cpal::default_host(),
            Some(name) => {
                let id = cpal::available_hosts()
                    .into_iter()
                    .find(|id| id.name().eq_ignore_ascii_case(name))
                    .ok_or_else(|| CpalError::UnknownHost(name.to_string()))?;
                cpal::host_from_id(id)?
            }
        };

        if HOST_LEASES.enter() {
            log::info!("audio host '{}' initialised", host.id().name());
        }
        Ok(Self { host })
    }

    pub fn host(&self) -> &cpal::Host {
        &self.host
    }

    /// Number of live leases in this process.
    pub fn active() -> usize {
        HOST_LEASES.count()
    }
}

impl Drop for HostLease {
    fn drop(&mut self) {
        if HOST_LEASES.exit() {
            log::info!("audio host '{}' released", self.host.id().name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_lease_are_reported() {
        let counter = LeaseCounter::new();

        assert!(counter.enter());
        assert!(!counter.enter());
        assert_eq!(counter.count(), 2);

        assert!(!counter.exit());
        assert!(counter.exit());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn extra_exit_does_not_underflow() {
        let counter = LeaseCounter::new();
        assert!(counter.exit());
        assert!(counter.enter());
    }

    #[test]
    fn unknown_host_is_rejected_without_leasing() {
        let before = HostLease::active();
        let err = HostLease::acquire(Some("no-such-audio-host")).err().unwrap();

        assert!(matches!(err, CpalError::UnknownHost(name) if name == "no-such-audio-host"));
        assert_eq!(HostLease::active(), before);
    }
}
