//! Two-step reset confirmation.
//!
//! The first trigger arms a deadline; a second trigger before the deadline
//! confirms. Once the deadline passes the arm is void and the next trigger
//! starts over.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetArm {
    #[default]
    Disarmed,
    Armed {
        deadline: Instant,
    },
}

/// Result of pressing the reset control once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTrigger {
    Armed { deadline: Instant },
    Confirmed,
}

impl ResetArm {
    pub fn trigger(&mut self, now: Instant, window: Duration) -> ResetTrigger {
        match *self {
            Self::Armed { deadline } if now < deadline => {
                *self = Self::Disarmed;
                ResetTrigger::Confirmed
            }
            _ => {
                let deadline = now + window;
                *self = Self::Armed { deadline };
                ResetTrigger::Armed { deadline }
            }
        }
    }

    pub fn is_armed(&self, now: Instant) -> bool {
        matches!(*self, Self::Armed { deadline } if now < deadline)
    }

    pub fn disarm(&mut self) {
        *self = Self::Disarmed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3);

    #[test]
    fn test_second_trigger_within_window_confirms() {
        let start = Instant::now();
        let mut arm = ResetArm::default();

        assert_eq!(
            arm.trigger(start, WINDOW),
            ResetTrigger::Armed {
                deadline: start + WINDOW
            }
        );
        assert!(arm.is_armed(start + Duration::from_secs(1)));
        assert_eq!(
            arm.trigger(start + Duration::from_secs(2), WINDOW),
            ResetTrigger::Confirmed
        );
        assert_eq!(arm, ResetArm::Disarmed);
    }

    #[test]
    fn test_expired_arm_rearms() {
        let start = Instant::now();
        let mut arm = ResetArm::default();
        arm.trigger(start, WINDOW);

        let late = start + WINDOW + Duration::from_millis(1);
        assert!(!arm.is_armed(late));
        assert_eq!(
            arm.trigger(late, WINDOW),
            ResetTrigger::Armed {
                deadline: late + WINDOW
            }
        );
    }

    #[test]
    fn test_disarm() {
        let start = Instant::now();
        let mut arm = ResetArm::default();
        arm.trigger(start, WINDOW);
        arm.disarm();

        assert!(!arm.is_armed(start));
        assert!(matches!(arm.trigger(start, WINDOW), ResetTrigger::Armed { .. }));
    }
}
