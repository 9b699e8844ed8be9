/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameTime {
    /// Host timestamp of this tick, in seconds.
    pub time: f32,

    /// Seconds since the previous tick.
    pub dt: f32,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots from host timestamps.
///
/// The previous timestamp starts at zero, so the first tick's delta equals its
/// timestamp. By default deltas are not clamped; `with_clamps` bounds them,
/// which keeps animation stable after stalls.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: f32,
    frame_index: u64,
    clamps: Option<(f32, f32)>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock whose deltas are clamped to `[dt_min, dt_max]` seconds.
    pub fn with_clamps(dt_min: f32, dt_max: f32) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            clamps: Some((dt_min, dt_max)),
            ..Self::default()
        }
    }

    /// Moves the baseline to `time` without producing a tick.
    pub fn reset(&mut self, time: f32) {
        self.last = time;
    }

    /// Timestamp of the most recent tick.
    #[inline]
    pub fn last(&self) -> f32 {
        self.last
    }

    /// Advances the clock to `time` and returns the new `FrameTime`.
    pub fn advance(&mut self, time: f32) -> FrameTime {
        let mut dt = time - self.last;
        if let Some((min, max)) = self.clamps {
            dt = dt.clamp(min, max);
        }

        self.last = time;

        let ft = FrameTime {
            time,
            dt,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}
