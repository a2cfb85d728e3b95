//! Per-voice highlight state, shared between the loop callbacks (audio
//! thread) and the view.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::rhythm::Side;

/// What the square row of one voice should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Nothing has played since load, or a start is in progress
    NotStarted,
    /// The user stopped playback
    Stopped,
    /// Number of beats fired by the current loop generation, minus one.
    /// Never clamped; the view wraps it by the beat count.
    Active(u64),
}

impl Highlight {
    pub fn is_active(&self) -> bool {
        matches!(self, Highlight::Active(_))
    }

    /// Square to light in a row of `beats` squares
    pub fn lit_square(&self, beats: u32) -> Option<usize> {
        match self {
            Highlight::Active(index) if beats > 0 => Some((index % beats as u64) as usize),
            _ => None,
        }
    }

    fn encode(self) -> i64 {
        match self {
            Highlight::NotStarted => NOT_STARTED,
            Highlight::Stopped => STOPPED,
            Highlight::Active(index) => index.min(i64::MAX as u64) as i64,
        }
    }

    fn decode(raw: i64) -> Self {
        match raw {
            STOPPED => Highlight::Stopped,
            r if r < 0 => Highlight::NotStarted,
            r => Highlight::Active(r as u64),
        }
    }
}

const NOT_STARTED: i64 = -1;
const STOPPED: i64 = -2;

/// Two lock-free highlight cells, one per side
#[derive(Debug)]
pub struct HighlightCells {
    cells: [AtomicI64; 2],
}

impl Default for HighlightCells {
    fn default() -> Self {
        Self {
            cells: [AtomicI64::new(NOT_STARTED), AtomicI64::new(NOT_STARTED)],
        }
    }
}

impl HighlightCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Side) -> Highlight {
        Highlight::decode(self.cells[side.index()].load(Ordering::Acquire))
    }

    pub fn set(&self, side: Side, highlight: Highlight) {
        self.cells[side.index()].store(highlight.encode(), Ordering::Release);
    }

    pub fn set_both(&self, highlight: Highlight) {
        for side in Side::BOTH {
            self.set(side, highlight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let cells = HighlightCells::new();
        assert_eq!(cells.get(Side::Left), Highlight::NotStarted);
        assert_eq!(cells.get(Side::Right), Highlight::NotStarted);
    }

    #[test]
    fn test_states_round_trip_through_cells() {
        let cells = HighlightCells::new();
        for state in [
            Highlight::Stopped,
            Highlight::Active(0),
            Highlight::Active(12_345),
            Highlight::NotStarted,
        ] {
            cells.set(Side::Left, state);
            assert_eq!(cells.get(Side::Left), state);
        }
        assert_eq!(cells.get(Side::Right), Highlight::NotStarted);
    }

    #[test]
    fn test_lit_square_wraps() {
        assert_eq!(Highlight::Active(0).lit_square(3), Some(0));
        assert_eq!(Highlight::Active(5).lit_square(3), Some(2));
        assert_eq!(Highlight::Active(6).lit_square(3), Some(0));
        assert_eq!(Highlight::Stopped.lit_square(3), None);
        assert_eq!(Highlight::NotStarted.lit_square(3), None);
    }
}
