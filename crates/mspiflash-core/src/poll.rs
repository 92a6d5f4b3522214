//! Poll-until helper shared by every wait in the driver
//!
//! The hardware gives no interrupts, so the driver spins on a register until
//! a condition holds. By default the spin is unbounded, which hangs forever
//! on a dead device. A bounded policy turns exhaustion into
//! [`Error::DeviceUnresponsive`].
//!
//! Typical poll delays when a bound is wanted (from flashprog):
//! * Page program: 10us
//! * 4KB sector erase: 10,000us (10ms)

use crate::error::{Error, Result, WaitTarget};
use crate::transport::IndirectTransport;

/// How often and how long to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollPolicy {
    /// Delay between attempts in microseconds (0 = spin)
    pub interval_us: u32,
    /// Give up after this many attempts (`None` = never)
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// Spin until the condition holds, however long that takes
    pub const fn unbounded() -> Self {
        Self {
            interval_us: 0,
            max_attempts: None,
        }
    }

    /// Poll at most `max_attempts` times, sleeping `interval_us` in between
    pub const fn bounded(interval_us: u32, max_attempts: u32) -> Self {
        Self {
            interval_us,
            max_attempts: Some(max_attempts),
        }
    }

    /// Bound derived from a total timeout, like flashprog's poll loops
    pub const fn with_timeout(interval_us: u32, timeout_us: u32) -> Self {
        let attempts = if interval_us > 0 {
            timeout_us / interval_us
        } else {
            timeout_us
        };
        Self::bounded(interval_us, attempts)
    }
}

/// Evaluate `probe` until it returns `true`
///
/// Errors from `probe` abort the loop immediately. Returns the number of
/// attempts that returned `false` before the condition held.
pub fn poll_until<T, F>(
    transport: &mut T,
    policy: PollPolicy,
    target: WaitTarget,
    mut probe: F,
) -> Result<u32>
where
    T: IndirectTransport + ?Sized,
    F: FnMut(&mut T) -> Result<bool>,
{
    let mut misses: u32 = 0;

    loop {
        if probe(transport)? {
            if misses > 0 {
                log::trace!("{} after {} polls", target, misses);
            }
            return Ok(misses);
        }

        misses = misses.saturating_add(1);
        if let Some(max) = policy.max_attempts {
            if misses >= max {
                log::warn!("Gave up waiting for {} after {} polls", target, misses);
                return Err(Error::DeviceUnresponsive(target));
            }
        }

        if policy.interval_us > 0 {
            transport.delay_us(policy.interval_us);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirect::tests::RegisterFile;

    #[test]
    fn test_returns_miss_count() {
        let mut bus = RegisterFile::new();
        let mut left = 5;
        let misses = poll_until(&mut bus, PollPolicy::unbounded(), WaitTarget::SpiDone, |_| {
            left -= 1;
            Ok(left == 0)
        })
        .unwrap();
        assert_eq!(misses, 4);
    }

    #[test]
    fn test_bounded_poll_gives_up() {
        let mut bus = RegisterFile::new();
        let mut calls = 0;
        let result = poll_until(
            &mut bus,
            PollPolicy::bounded(10, 3),
            WaitTarget::FlashReady,
            |_| {
                calls += 1;
                Ok(false)
            },
        );
        assert_eq!(
            result,
            Err(Error::DeviceUnresponsive(WaitTarget::FlashReady))
        );
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_probe_error_aborts() {
        let mut bus = RegisterFile::new();
        let result = poll_until(&mut bus, PollPolicy::unbounded(), WaitTarget::SpiDone, |_| {
            Err(Error::Transport)
        });
        assert_eq!(result, Err(Error::Transport));
    }

    #[test]
    fn test_timeout_conversion() {
        assert_eq!(PollPolicy::with_timeout(10, 10_000).max_attempts, Some(1000));
        assert_eq!(PollPolicy::with_timeout(0, 50).max_attempts, Some(50));
    }
}
