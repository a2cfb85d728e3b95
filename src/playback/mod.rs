//! Playback control: the controller that owns the loops and the transport,
//! and an offline backend for running it without audio hardware.

pub mod controller;
pub mod offline;

pub use controller::{
    PlaybackController, DEFAULT_LEFT_NOTE, DEFAULT_RIGHT_NOTE, START_LEAD_SECONDS,
    STOP_LEAD_SECONDS, STOP_RAMP_SECONDS,
};
pub use offline::{NoteEvent, OfflineBackend, VolumeChange};

use crate::highlight::Highlight;
use crate::rhythm::Side;
use crate::sequencing::Pitch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Running,
}

/// Snapshot of one voice, as the view needs it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub side: Side,
    pub beats: u32,
    pub note: Pitch,
    pub highlight: Highlight,
}

impl Voice {
    pub fn lit_square(&self) -> Option<usize> {
        self.highlight.lit_square(self.beats)
    }
}
