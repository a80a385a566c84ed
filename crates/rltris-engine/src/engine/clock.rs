/// Which gravity timers fired since the previous tick.
///
/// The session drops the current piece on the `fast` timer while speed-up is
/// active and on the `normal` timer otherwise.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockSignal {
    pub normal: bool,
    pub fast: bool,
}

impl ClockSignal {
    pub const NONE: Self = Self {
        normal: false,
        fast: false,
    };
    pub const BOTH: Self = Self {
        normal: true,
        fast: true,
    };

    #[must_use]
    pub fn fires(self, speed_up: bool) -> bool {
        if speed_up {
            self.fast
        } else {
            self.normal
        }
    }
}

/// Deterministic frame-counting replacement for wall-clock gravity timers.
///
/// Each call to [`FrameClock::advance`] is one frame. The normal timer fires
/// every `normal_period` frames and the fast timer every `fast_period` frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    normal_period: u64,
    fast_period: u64,
    total_frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NORMAL_PERIOD, Self::DEFAULT_FAST_PERIOD)
    }
}

impl FrameClock {
    /// Wall-clock length of one frame the default periods are tuned for.
    pub const DEFAULT_FRAME_MILLIS: u64 = 2;
    /// 30 ms gravity at 2 ms per frame.
    pub const DEFAULT_NORMAL_PERIOD: u64 = 15;
    /// 2 ms gravity at 2 ms per frame.
    pub const DEFAULT_FAST_PERIOD: u64 = 1;

    /// # Panics
    ///
    /// Panics if a period is zero.
    #[must_use]
    pub fn new(normal_period: u64, fast_period: u64) -> Self {
        assert!(normal_period > 0 && fast_period > 0, "clock periods must be positive");
        Self {
            normal_period,
            fast_period,
            total_frames: 0,
        }
    }

    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn advance(&mut self) -> ClockSignal {
        self.total_frames += 1;
        ClockSignal {
            normal: self.total_frames % self.normal_period == 0,
            fast: self.total_frames % self.fast_period == 0,
        }
    }

    pub fn reset(&mut self) {
        self.total_frames = 0;
    }
}
