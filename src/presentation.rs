//! What the front end shows, independent of how it draws it.
//!
//! The two panels are cross-wired: each shows its own voice's beat count and
//! square row next to the *other* voice's pitch selector.

use crate::error::InputRangeError;
use crate::playback::{PlaybackController, PlaybackState, Voice};
use crate::rhythm::volume::{FLOOR_THRESHOLD_DB, VOLUME_STEP_DB};
use crate::rhythm::Side;
use crate::sequencing::{NoteSet, Pitch};
use crate::transport::AudioBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub title: &'static str,
    /// Voice whose beat count and squares this panel shows
    pub beats_side: Side,
    /// Voice whose pitch selector sits in this panel
    pub pitch_side: Side,
}

pub const PANELS: [PanelLayout; 2] = [
    PanelLayout {
        title: "Base Rhythm",
        beats_side: Side::Left,
        pitch_side: Side::Right,
    },
    PanelLayout {
        title: "Cross Rhythm",
        beats_side: Side::Right,
        pitch_side: Side::Left,
    },
];

/// The panel holding `side`'s beat input
pub fn panel_for(side: Side) -> &'static PanelLayout {
    match side {
        Side::Left => &PANELS[0],
        Side::Right => &PANELS[1],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportControl {
    Play,
    Stop,
}

impl TransportControl {
    pub fn for_state(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Stopped => TransportControl::Play,
            PlaybackState::Running => TransportControl::Stop,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransportControl::Play => "Play",
            TransportControl::Stop => "Stop",
        }
    }
}

/// Volume knob position: 0 at -45 dB up to 8 at -5 dB
pub fn volume_label(db: f32) -> i32 {
    ((db - FLOOR_THRESHOLD_DB) / VOLUME_STEP_DB).round() as i32 + 1
}

/// Squares of one row; `true` marks the lit one
pub fn squares(voice: &Voice) -> Vec<bool> {
    let lit = voice.lit_square();
    (0..voice.beats as usize).map(|i| Some(i) == lit).collect()
}

/// Everything one panel draws
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub layout: PanelLayout,
    pub beats: u32,
    pub bounds: (u32, u32),
    pub squares: Vec<bool>,
    pub pitch: Pitch,
    pub pitches: &'static [Pitch],
    /// Range message shown in place of the pitch selector
    pub error: Option<String>,
    /// Stored right count is above the bound implied by the left count
    pub stale: bool,
}

impl PanelView {
    pub fn build<B: AudioBackend>(controller: &PlaybackController<B>, layout: PanelLayout) -> Self {
        let side = layout.beats_side;
        let rhythm = controller.rhythm();
        let bounds = rhythm.bounds(side);
        let error = rhythm.error(side).then(|| {
            InputRangeError {
                side,
                value: None,
                min: bounds.0,
                max: bounds.1,
            }
            .to_string()
        });

        Self {
            layout,
            beats: rhythm.beats(side),
            bounds,
            squares: squares(&controller.voice(side)),
            pitch: controller.note(layout.pitch_side),
            pitches: NoteSet::for_side(layout.pitch_side).pitches(),
            error,
            stale: side == Side::Right && rhythm.right_exceeds_bound(),
        }
    }

    pub fn all<B: AudioBackend>(controller: &PlaybackController<B>) -> [PanelView; 2] {
        PANELS.map(|layout| Self::build(controller, layout))
    }
}
