//! Frame playback for the animated charts.

use crate::analysis::RankedFrame;
use std::time::Duration;

/// Steps through a fixed number of frames at a fixed frame duration.
#[derive(Debug, Clone)]
pub struct FramePlayer {
    frame_count: usize,
    current: usize,
    /// Seconds spent in the current frame.
    elapsed: f64,
    frame_duration: Duration,
    playing: bool,
}

impl FramePlayer {
    pub fn new(frame_count: usize, frame_duration: Duration) -> Self {
        Self {
            frame_count,
            current: 0,
            elapsed: 0.0,
            frame_duration,
            playing: false,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Fraction of the way from the current frame to the next one.
    pub fn progress(&self) -> f64 {
        let duration = self.frame_duration.as_secs_f64();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.elapsed / duration).clamp(0.0, 1.0)
    }

    /// Start playing; restarts from the first frame when at the end.
    pub fn play(&mut self) {
        if self.frame_count < 2 {
            return;
        }
        if self.current + 1 >= self.frame_count {
            self.current = 0;
        }
        self.elapsed = 0.0;
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.elapsed = 0.0;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, index: usize) {
        self.current = index.min(self.frame_count.saturating_sub(1));
        self.elapsed = 0.0;
    }

    /// Advance playback by `dt` seconds. Returns true when the frame index moved.
    /// Playback stops on the last frame.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.playing {
            return false;
        }
        let duration = self.frame_duration.as_secs_f64();
        self.elapsed += dt.max(0.0);

        let mut moved = false;
        while self.elapsed >= duration && self.current + 1 < self.frame_count {
            self.elapsed -= duration;
            self.current += 1;
            moved = true;
        }
        if self.current + 1 >= self.frame_count {
            self.playing = false;
            self.elapsed = 0.0;
        }
        moved
    }
}

/// A bar placed between two ranked frames. `slot` 0 is the top bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPosition {
    pub category: String,
    pub value: f64,
    pub slot: f64,
}

/// Blend two consecutive frames at `t` in [0, 1].
///
/// Only categories present in `next` are drawn. Those also present in `prev`
/// slide from their old slot and value; newcomers appear in place.
pub fn interpolate_frames<T>(prev: &RankedFrame<T>, next: &RankedFrame<T>, t: f64) -> Vec<BarPosition> {
    let t = t.clamp(0.0, 1.0);
    next.entries
        .iter()
        .map(|entry| {
            let target_slot = (entry.rank - 1) as f64;
            match prev.entries.iter().find(|p| p.category == entry.category) {
                Some(old) => {
                    let old_slot = (old.rank - 1) as f64;
                    BarPosition {
                        category: entry.category.clone(),
                        value: old.value + (entry.value - old.value) * t,
                        slot: old_slot + (target_slot - old_slot) * t,
                    }
                }
                None => BarPosition {
                    category: entry.category.clone(),
                    value: entry.value,
                    slot: target_slot,
                },
            }
        })
        .collect()
}

/// Bars of a frame without blending.
pub fn frame_positions<T>(frame: &RankedFrame<T>) -> Vec<BarPosition> {
    interpolate_frames(frame, frame, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RankedEntry;

    fn frame(entries: &[(&str, f64)]) -> RankedFrame<u32> {
        RankedFrame {
            time_bucket: 0,
            entries: entries
                .iter()
                .enumerate()
                .map(|(i, (c, v))| RankedEntry {
                    category: c.to_string(),
                    value: *v,
                    rank: i + 1,
                })
                .collect(),
        }
    }

    #[test]
    fn player_advances_and_stops_at_end() {
        let mut player = FramePlayer::new(3, Duration::from_millis(600));
        assert!(!player.advance(1.0));

        player.play();
        assert!(!player.advance(0.3));
        assert!((player.progress() - 0.5).abs() < 1e-9);
        assert!(player.advance(0.3));
        assert_eq!(player.current(), 1);

        assert!(player.advance(5.0));
        assert_eq!(player.current(), 2);
        assert!(!player.is_playing());

        player.play();
        assert_eq!(player.current(), 0);
        assert!(player.is_playing());
    }

    #[test]
    fn seek_is_clamped() {
        let mut player = FramePlayer::new(4, Duration::from_millis(600));
        player.seek(10);
        assert_eq!(player.current(), 3);

        let mut empty = FramePlayer::new(0, Duration::from_millis(600));
        empty.seek(2);
        empty.play();
        assert_eq!(empty.current(), 0);
        assert!(!empty.is_playing());
    }

    #[test]
    fn shared_categories_slide_between_frames() {
        let prev = frame(&[("30~35", 100.0), ("35~40", 90.0)]);
        let next = frame(&[("35~40", 120.0), ("30~35", 80.0), ("40~45", 70.0)]);

        let mid = interpolate_frames(&prev, &next, 0.5);
        assert_eq!(mid.len(), 3);
        assert_eq!(mid[0].category, "35~40");
        assert_eq!(mid[0].value, 105.0);
        assert_eq!(mid[0].slot, 0.5);
        assert_eq!(mid[1].value, 90.0);
        assert_eq!(mid[1].slot, 0.5);
        // newcomer is not blended from zero
        assert_eq!(mid[2].value, 70.0);
        assert_eq!(mid[2].slot, 2.0);
    }

    #[test]
    fn dropped_categories_are_not_drawn() {
        let prev = frame(&[("A", 3.0), ("B", 2.0)]);
        let next = frame(&[("A", 4.0)]);
        let bars = interpolate_frames(&prev, &next, 0.25);
        assert_eq!(bars.len(), 1);
        assert_eq!(frame_positions(&next)[0].value, 4.0);
    }
}
