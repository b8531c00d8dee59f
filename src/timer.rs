/// Seconds remaining at which the display switches to the urgent treatment.
pub const URGENT_THRESHOLD_SECS: u64 = 10;

/// Countdown clock for timed sessions, driven by the runtime tick.
///
/// A limit of zero disables the countdown entirely. Expiry fires exactly once;
/// the session routes it into the surrender path.
#[derive(Clone, Copy, Debug)]
pub struct Countdown {
    limit_secs: u64,
    remaining_ms: u64,
    running: bool,
}

impl Countdown {
    pub fn new(limit_secs: u64) -> Self {
        Self {
            limit_secs,
            remaining_ms: limit_secs * 1000,
            running: limit_secs > 0,
        }
    }

    /// Whether this session has a time limit at all.
    pub fn enabled(&self) -> bool {
        self.limit_secs > 0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the clock. Returns true on the tick that reaches zero.
    pub fn tick(&mut self, elapsed_ms: u64) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms == 0 {
            self.running = false;
            return true;
        }
        false
    }

    /// Idempotent; called on every path into game over.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }

    pub fn is_urgent(&self) -> bool {
        self.enabled() && self.seconds_remaining() <= URGENT_THRESHOLD_SECS
    }

    /// `MM:SS` display form.
    pub fn format(&self) -> String {
        let secs = self.seconds_remaining();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_disabled() {
        let mut timer = Countdown::new(0);
        assert!(!timer.enabled());
        assert!(!timer.is_running());
        assert!(!timer.tick(1000));
        assert_eq!(timer.seconds_remaining(), 0);
    }

    #[test]
    fn expires_exactly_once() {
        let mut timer = Countdown::new(2);
        assert!(!timer.tick(1000));
        assert!(timer.tick(1000));
        assert!(!timer.tick(1000));
        assert!(!timer.is_running());
    }

    #[test]
    fn never_goes_negative() {
        let mut timer = Countdown::new(1);
        assert!(timer.tick(5000));
        assert_eq!(timer.seconds_remaining(), 0);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        let timer = Countdown::new(125);
        assert_eq!(timer.format(), "02:05");
        let timer = Countdown::new(9);
        assert_eq!(timer.format(), "00:09");
    }

    #[test]
    fn urgent_at_ten_seconds() {
        let mut timer = Countdown::new(11);
        assert!(!timer.is_urgent());
        timer.tick(1000);
        assert!(timer.is_urgent());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut timer = Countdown::new(30);
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.tick(1000));
        assert_eq!(timer.seconds_remaining(), 30);
    }

    #[test]
    fn partial_ticks_accumulate() {
        let mut timer = Countdown::new(1);
        for _ in 0..9 {
            assert!(!timer.tick(100));
        }
        assert!(timer.tick(100));
    }
}
