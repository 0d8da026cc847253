//! Dash state.
//!
//! `Idle -> Dashing` on activation, `Dashing -> Idle` once the duration has
//! elapsed. Activation while dashing (or during the optional cooldown) is
//! ignored. While dashing the player moves at dash speed and ignores contact.

use std::time::Duration;

use echo_shared::config::GameTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DashPhase {
    Idle,
    Dashing { until: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct DashState {
    phase: DashPhase,
    duration: Duration,
    cooldown: Duration,
    ready_at: Duration,
}

impl DashState {
    pub fn new(duration: Duration, cooldown: Duration) -> Self {
        Self {
            phase: DashPhase::Idle,
            duration,
            cooldown,
            ready_at: Duration::ZERO,
        }
    }

    pub fn from_tuning(tuning: &GameTuning) -> Self {
        Self::new(
            Duration::from_millis(tuning.dash_duration_ms),
            Duration::from_millis(tuning.dash_cooldown_ms),
        )
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.phase, DashPhase::Dashing { .. })
    }

    /// Starts a dash at `now`. Returns false if one is running or the
    /// cooldown has not elapsed.
    pub fn try_activate(&mut self, now: Duration) -> bool {
        if self.is_dashing() || now < self.ready_at {
            return false;
        }
        self.phase = DashPhase::Dashing {
            until: now + self.duration,
        };
        true
    }

    /// Ends the dash once its deadline has passed. Returns true on the tick
    /// the dash ends.
    pub fn update(&mut self, now: Duration) -> bool {
        match self.phase {
            DashPhase::Dashing { until } if now >= until => {
                self.phase = DashPhase::Idle;
                self.ready_at = until + self.cooldown;
                true
            }
            _ => false,
        }
    }

    /// Time left in the current dash.
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        match self.phase {
            DashPhase::Dashing { until } => Some(until.saturating_sub(now)),
            DashPhase::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn dash_lasts_exactly_its_duration() {
        let mut dash = DashState::new(ms(300), Duration::ZERO);
        assert!(!dash.is_dashing());

        assert!(dash.try_activate(ms(1000)));
        assert!(dash.is_dashing());

        assert!(!dash.update(ms(1299)));
        assert!(dash.is_dashing());
        assert_eq!(dash.remaining(ms(1299)), Some(ms(1)));

        assert!(dash.update(ms(1300)));
        assert!(!dash.is_dashing());
        assert_eq!(dash.remaining(ms(1300)), None);
    }

    #[test]
    fn cannot_retrigger_mid_dash() {
        let mut dash = DashState::new(ms(300), Duration::ZERO);
        assert!(dash.try_activate(ms(0)));
        assert!(!dash.try_activate(ms(150)));
        // The rejected press must not extend the deadline.
        assert!(dash.update(ms(300)));
        assert!(dash.try_activate(ms(300)));
    }

    #[test]
    fn cooldown_delays_next_dash() {
        let mut dash = DashState::new(ms(250), ms(500));
        assert!(dash.try_activate(ms(0)));
        assert!(dash.update(ms(250)));
        assert!(!dash.try_activate(ms(600)));
        assert!(dash.try_activate(ms(750)));
    }
}
