//! Frame timing for the emitted sequence

use crate::types::Framerate;

/// Timestamps for an unbounded run of frames at a fixed rate
///
/// Frame `n` is presented at `n * duration`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_count: u64,
    duration_ns: u64,
}

impl FrameClock {
    pub fn new(framerate: Framerate) -> Self {
        Self {
            frame_count: 0,
            duration_ns: framerate.frame_duration_ns(),
        }
    }

    /// Duration of every frame in nanoseconds
    pub fn duration_ns(&self) -> u64 {
        self.duration_ns
    }

    /// Frames emitted since the last reset
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sequence number and PTS for the next frame, then advance
    pub fn tick(&mut self) -> (u64, u64) {
        let sequence = self.frame_count;
        let pts = sequence.saturating_mul(self.duration_ns);
        self.frame_count += 1;
        (sequence, pts)
    }

    pub fn reset(&mut self) {
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_monotonic() {
        let mut clock = FrameClock::new(Framerate::FPS_25);
        assert_eq!(clock.tick(), (0, 0));
        assert_eq!(clock.tick(), (1, 40_000_000));
        assert_eq!(clock.tick(), (2, 80_000_000));
        assert_eq!(clock.frame_count(), 3);

        clock.reset();
        assert_eq!(clock.tick(), (0, 0));
    }

    #[test]
    fn test_ntsc_rate() {
        let mut clock = FrameClock::new(Framerate::new(30000, 1001));
        clock.tick();
        let (_, pts) = clock.tick();
        assert_eq!(pts, 33_366_666);
    }
}
