/// Cancellable one-shot delay driven by simulation time.
///
/// `schedule` replaces any pending shot, so re-arming never fires twice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OneShotTimer {
    remaining: Option<f32>,
}

impl OneShotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: f32) {
        self.remaining = Some(delay.max(0.0));
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }

    /// Advance by `dt`; returns true exactly once when the delay elapses.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(left) = self.remaining.as_mut() else { return false };
        if dt.is_finite() && dt > 0.0 {
            *left -= dt;
        }
        if *left <= 0.0 {
            self.remaining = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let mut t = OneShotTimer::new();
        t.schedule(1.0);
        assert!(!t.tick(0.5));
        assert!(t.tick(0.5));
        assert!(!t.tick(1.0));
        assert!(!t.is_pending());
    }

    #[test]
    fn reschedule_restarts_the_delay() {
        let mut t = OneShotTimer::new();
        t.schedule(1.0);
        assert!(!t.tick(0.75));
        t.schedule(1.0);
        assert!(!t.tick(0.75));
        assert!(t.tick(0.25));
    }

    /// Seconds of simulated time until the shot fires.
    fn fire_time(delay: f32, dt: f32) -> f32 {
        let mut t = OneShotTimer::new();
        t.schedule(delay);
        let mut ticks = 0u32;
        while !t.tick(dt) {
            ticks += 1;
            assert!(ticks < 10_000, "never fired");
        }
        (ticks + 1) as f32 * dt
    }

    #[test]
    fn fires_after_the_same_time_at_any_tick_rate() {
        let slow = fire_time(1.0, 1.0 / 30.0);
        let fast = fire_time(1.0, 1.0 / 120.0);

        assert!(slow >= 1.0 - 1e-4 && slow <= 1.0 + 1.0 / 30.0 + 1e-4, "30 Hz fired at {slow}");
        assert!(fast >= 1.0 - 1e-4 && fast <= 1.0 + 1.0 / 120.0 + 1e-4, "120 Hz fired at {fast}");
        assert!((slow - fast).abs() <= 1.0 / 30.0 + 1e-4);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut t = OneShotTimer::new();
        t.schedule(0.1);
        t.cancel();
        assert!(!t.tick(5.0));
    }
}
