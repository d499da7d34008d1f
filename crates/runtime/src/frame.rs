use foundation::time::Time;

/// Frame metadata handed to every per-frame update.
///
/// Frames are produced by a [`FrameClock`] from display-synchronized deltas;
/// tests build them directly with a fixed step so runs can be replayed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Engine time at the end of this frame's step (seconds).
    pub time: Time,
}

impl Frame {
    /// Fixed-step frame: `time = (index + 1) * dt_s`.
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time((index + 1) as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

/// Accumulates variable frame deltas into [`Frame`]s.
///
/// Non-finite or negative deltas count as zero and large deltas (a suspended
/// tab, a debugger pause) are capped so animations never jump.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    next_index: u64,
    time: Time,
    max_dt_s: f64,
}

pub const DEFAULT_MAX_DT_S: f64 = 0.25;

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DT_S)
    }
}

impl FrameClock {
    pub fn new(max_dt_s: f64) -> Self {
        Self {
            next_index: 0,
            time: Time::ZERO,
            max_dt_s,
        }
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.next_index
    }

    pub fn advance(&mut self, dt_s: f64) -> Frame {
        let dt_s = if dt_s.is_finite() && dt_s > 0.0 {
            dt_s.min(self.max_dt_s)
        } else {
            0.0
        };
        self.time = self.time.advanced_by(dt_s);
        let frame = Frame {
            index: self.next_index,
            dt_s,
            time: self.time,
        };
        self.next_index += 1;
        frame
    }
}
