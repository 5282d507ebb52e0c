//! Blocking discovery poll loop
//!
//! A download-mode ROM enumerates a while after the button combo is pressed,
//! so discovery polls forever at a fixed interval. Only the operator ends the
//! wait (by killing the process).

use std::time::Duration;

use crate::error::Result;

/// Seconds between enumeration attempts
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Consecutive misses before the plug-in hint is shown
pub const HINT_AFTER_MISSES: u32 = 15;

/// Source of delays for the poll loop
pub trait Sleeper {
    /// Block for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between attempts
    pub interval: Duration,
    /// Number of misses after which [`PollEvent::Hint`] fires (once)
    pub hint_after: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            hint_after: HINT_AFTER_MISSES,
        }
    }
}

/// Things the loop reports while waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// An attempt found nothing (1-based count)
    Miss(u32),
    /// The miss threshold was reached
    Hint,
}

/// Call `probe` until it yields a value
///
/// Errors from `probe` are logged and treated like a miss; nothing short of a
/// found device ends the loop.
pub fn poll_until<T, S, F, O>(
    policy: &PollPolicy,
    sleeper: &mut S,
    mut probe: F,
    mut observe: O,
) -> T
where
    S: Sleeper + ?Sized,
    F: FnMut() -> Result<Option<T>>,
    O: FnMut(PollEvent),
{
    let mut misses: u32 = 0;
    let mut hinted = false;

    loop {
        match probe() {
            Ok(Some(found)) => return found,
            Ok(None) => {}
            Err(e) if e.is_transient() => {}
            Err(e) => log::debug!("Enumeration attempt failed: {}", e),
        }

        misses = misses.saturating_add(1);
        if !hinted && misses >= policy.hint_after {
            hinted = true;
            observe(PollEvent::Hint);
        }
        observe(PollEvent::Miss(misses));

        sleeper.sleep(policy.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    struct CountingSleeper {
        total: Duration,
        calls: u32,
    }

    impl Sleeper for CountingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.total += duration;
            self.calls += 1;
        }
    }

    #[test]
    fn test_found_immediately() {
        let mut sleeper = CountingSleeper::default();
        let value = poll_until(
            &PollPolicy::default(),
            &mut sleeper,
            || Ok(Some(7)),
            |_| panic!("no events expected"),
        );

        assert_eq!(value, 7);
        assert_eq!(sleeper.calls, 0);
    }

    #[test]
    fn test_hint_fires_once() {
        let mut sleeper = CountingSleeper::default();
        let mut attempts = 0;
        let mut events = Vec::new();

        let value = poll_until(
            &PollPolicy::default(),
            &mut sleeper,
            || {
                attempts += 1;
                Ok((attempts > 40).then_some("device"))
            },
            |ev| events.push(ev),
        );

        assert_eq!(value, "device");
        assert_eq!(sleeper.calls, 40);
        assert_eq!(sleeper.total, Duration::from_secs(40));

        let hints = events.iter().filter(|e| **e == PollEvent::Hint).count();
        assert_eq!(hints, 1);

        // Hint shows up right before the 15th miss is reported
        let pos = events.iter().position(|e| *e == PollEvent::Hint).unwrap();
        assert_eq!(events[pos + 1], PollEvent::Miss(15));
    }

    #[test]
    fn test_errors_count_as_misses() {
        let mut sleeper = CountingSleeper::default();
        let mut attempts = 0;

        let value = poll_until(
            &PollPolicy {
                interval: Duration::from_millis(5),
                hint_after: 100,
            },
            &mut sleeper,
            || {
                attempts += 1;
                match attempts {
                    1 => Err(Error::DeviceNotFound),
                    2 => Err(Error::Transport("enumeration failed".into())),
                    _ => Ok(Some(attempts)),
                }
            },
            |_| {},
        );

        assert_eq!(value, 3);
        assert_eq!(sleeper.calls, 2);
        assert_eq!(sleeper.total, Duration::from_millis(10));
    }
}
