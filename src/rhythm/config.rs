//! Validated pair of beat counts.
//!
//! The right (cross) bound depends on the current left count, so it is
//! recomputed every time it is consulted. Lowering the left count never
//! rewrites a stored right count: the bound shown to the user moves, the
//! stored value stays until the user edits it, and
//! [`RhythmConfig::right_exceeds_bound`] reports the mismatch.

use tracing::warn;

use super::Side;
use crate::error::InputRangeError;

pub const MIN_BEATS: u32 = 2;
pub const MAX_LEFT_BEATS: u32 = 150;
/// The cross rhythm may have at most this many beats per base beat
pub const RIGHT_BEATS_FACTOR: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhythmConfig {
    left_beats: u32,
    right_beats: u32,
    left_error: bool,
    right_error: bool,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            left_beats: 3,
            right_beats: 4,
            left_error: false,
            right_error: false,
        }
    }
}

impl RhythmConfig {
    pub fn left_beats(&self) -> u32 {
        self.left_beats
    }

    pub fn right_beats(&self) -> u32 {
        self.right_beats
    }

    pub fn beats(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_beats,
            Side::Right => self.right_beats,
        }
    }

    /// Inclusive valid range for a side, using the current left count
    pub fn bounds(&self, side: Side) -> (u32, u32) {
        match side {
            Side::Left => (MIN_BEATS, MAX_LEFT_BEATS),
            Side::Right => (MIN_BEATS, self.left_beats * RIGHT_BEATS_FACTOR),
        }
    }

    pub fn error(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left_error,
            Side::Right => self.right_error,
        }
    }

    /// True when a left edit shrank the bound below the stored right count
    pub fn right_exceeds_bound(&self) -> bool {
        self.right_beats > self.bounds(Side::Right).1
    }

    pub fn set_left_beats(&mut self, n: i64) -> Result<u32, InputRangeError> {
        self.set_beats(Side::Left, Some(n))
    }

    pub fn set_right_beats(&mut self, n: i64) -> Result<u32, InputRangeError> {
        self.set_beats(Side::Right, Some(n))
    }

    /// Apply an edit typed by the user. Text that is not an integer is
    /// rejected like any other out-of-range value.
    pub fn set_beats_text(&mut self, side: Side, text: &str) -> Result<u32, InputRangeError> {
        self.set_beats(side, text.trim().parse::<i64>().ok())
    }

    pub fn set_beats(&mut self, side: Side, n: Option<i64>) -> Result<u32, InputRangeError> {
        let (min, max) = self.bounds(side);
        let accepted = n
            .filter(|n| (min as i64..=max as i64).contains(n))
            .map(|n| n as u32);

        let flag = match side {
            Side::Left => &mut self.left_error,
            Side::Right => &mut self.right_error,
        };

        match accepted {
            Some(beats) => {
                *flag = false;
                match side {
                    Side::Left => self.left_beats = beats,
                    Side::Right => self.right_beats = beats,
                }
                Ok(beats)
            }
            None => {
                *flag = true;
                warn!(%side, value = ?n, min, max, "rejected beat count");
                Err(InputRangeError {
                    side,
                    value: n,
                    min,
                    max,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_range() {
        let mut config = RhythmConfig::default();
        for n in 2..=150 {
            assert_eq!(config.set_left_beats(n), Ok(n as u32));
            assert!(!config.error(Side::Left));
        }
        for n in [i64::MIN, -3, 0, 1, 151, 1000] {
            let err = config.set_left_beats(n).unwrap_err();
            assert_eq!(err.max, 150);
            assert!(config.error(Side::Left));
            assert_eq!(config.left_beats(), 150);
        }
    }

    #[test]
    fn test_right_range_follows_left() {
        let mut config = RhythmConfig::default();
        // left = 3 -> right may go up to 18
        assert_eq!(config.set_right_beats(18), Ok(18));
        assert!(config.set_right_beats(19).is_err());
        assert!(config.error(Side::Right));
        assert_eq!(config.right_beats(), 18);

        assert!(config.set_right_beats(1).is_err());
        assert_eq!(config.set_right_beats(2), Ok(2));
        assert!(!config.error(Side::Right));
    }

    #[test]
    fn test_error_clears_on_valid_edit() {
        let mut config = RhythmConfig::default();
        assert!(config.set_left_beats(1).is_err());
        assert!(config.error(Side::Left));
        config.set_left_beats(5).unwrap();
        assert!(!config.error(Side::Left));
        // The other side is unaffected
        assert!(!config.error(Side::Right));
    }

    #[test]
    fn test_shrinking_left_leaves_right_stale() {
        let mut config = RhythmConfig::default();
        config.set_left_beats(10).unwrap();
        config.set_right_beats(50).unwrap();

        config.set_left_beats(2).unwrap();
        assert_eq!(config.bounds(Side::Right), (2, 12));
        assert_eq!(config.right_beats(), 50);
        assert!(config.right_exceeds_bound());
        assert!(!config.error(Side::Right));

        // Re-editing the same value is now rejected against the new bound
        let err = config.set_right_beats(50).unwrap_err();
        assert_eq!((err.min, err.max), (2, 12));
        assert_eq!(config.right_beats(), 50);

        config.set_right_beats(12).unwrap();
        assert!(!config.right_exceeds_bound());
    }

    #[test]
    fn test_text_input() {
        let mut config = RhythmConfig::default();
        assert_eq!(config.set_beats_text(Side::Left, " 7 "), Ok(7));
        let err = config.set_beats_text(Side::Left, "seven").unwrap_err();
        assert_eq!(err.value, None);
        assert_eq!(err.to_string(), "Input must be between 2 and 150");
        assert_eq!(config.left_beats(), 7);
    }
}
