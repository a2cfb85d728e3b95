//! Startup session settings.
//!
//! Read once from a TOML file (all fields optional) and applied through the
//! controller setters, so they are validated exactly like user edits.
//! Nothing is ever written back.
//!
//! ```toml
//! tempo = 90
//! volume = -25
//!
//! [rhythm]
//! left_beats = 5
//! right_beats = 7
//!
//! [notes]
//! left = "D4"
//! right = "G3"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::playback::{PlaybackController, DEFAULT_LEFT_NOTE, DEFAULT_RIGHT_NOTE};
use crate::rhythm::tempo::DEFAULT_TEMPO;
use crate::rhythm::volume::DEFAULT_VOLUME_DB;
use crate::rhythm::Side;
use crate::sequencing::NoteSet;
use crate::transport::AudioBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tempo: f64,
    /// Output level in dB
    pub volume: f32,
    pub rhythm: RhythmSection,
    pub notes: NotesSection,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            volume: DEFAULT_VOLUME_DB,
            rhythm: RhythmSection::default(),
            notes: NotesSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmSection {
    pub left_beats: u32,
    pub right_beats: u32,
}

impl Default for RhythmSection {
    fn default() -> Self {
        Self {
            left_beats: 3,
            right_beats: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesSection {
    pub left: String,
    pub right: String,
}

impl Default for NotesSection {
    fn default() -> Self {
        Self {
            left: DEFAULT_LEFT_NOTE.to_string(),
            right: DEFAULT_RIGHT_NOTE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text)?;
        info!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Push every setting into a stopped controller.
    ///
    /// Left beats go first, since they set the bound for the right count.
    pub fn apply<B: AudioBackend>(
        &self,
        controller: &mut PlaybackController<B>,
    ) -> Result<(), ConfigError> {
        for (side, value) in [
            (Side::Left, self.rhythm.left_beats),
            (Side::Right, self.rhythm.right_beats),
        ] {
            controller
                .set_beats(side, Some(value as i64))
                .map_err(|source| ConfigError::Beats {
                    side,
                    value,
                    source,
                })?;
        }

        for (side, name) in [(Side::Left, &self.notes.left), (Side::Right, &self.notes.right)] {
            let pitch = NoteSet::for_side(side).parse(name, side)?;
            controller.set_note(side, pitch)?;
        }

        controller.set_tempo(self.tempo);
        controller.set_volume(self.volume);
        Ok(())
    }
}
