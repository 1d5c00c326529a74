use std::time::Duration;

/// Accumulated scene time, advanced once per rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneClock {
    elapsed: f32,
    frames: u64,
}

impl SceneClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame's worth of time.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt.as_secs_f32();
        self.frames += 1;
    }

    /// Seconds since the clock started; feeds the grass `time` uniform.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = SceneClock::new();
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.frames(), 0);
    }

    #[test]
    fn accumulates_frames() {
        let mut clock = SceneClock::new();
        for _ in 0..60 {
            clock.advance(Duration::from_millis(16));
        }
        assert_eq!(clock.frames(), 60);
        assert!((clock.elapsed() - 0.96).abs() < 1e-4);
    }
}
