//! Error types for the crossbeat core

use std::path::PathBuf;

use thiserror::Error;

use crate::rhythm::Side;

/// A beat-count edit outside its valid range.
///
/// The previous valid value stays in effect and the side's error flag is set.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Input must be between {min} and {max}")]
pub struct InputRangeError {
    pub side: Side,
    /// The rejected value (`None` when the input was not a number)
    pub value: Option<i64>,
    pub min: u32,
    pub max: u32,
}

/// The audio output could not be brought up.
///
/// Playback stays stopped and nothing else is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioActivationError {
    /// No output device available
    #[error("No audio output device available")]
    NoDevice,

    /// Failed to query the device configuration
    #[error("Failed to get device config: {0}")]
    Config(String),

    /// Failed to build the output stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    /// Failed to start the output stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlay(String),

    /// The host refused to enable audio output
    #[error("Audio output was not permitted: {0}")]
    Denied(String),
}

/// A pitch name that cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PitchError {
    #[error("Unknown pitch name: '{0}'")]
    Unknown(String),

    #[error("Pitch {pitch} is not available for the {side} voice")]
    NotInSet { pitch: String, side: Side },
}

/// The startup session file could not be used
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {side} beat count {value}: {source}")]
    Beats {
        side: Side,
        value: u32,
        #[source]
        source: InputRangeError,
    },

    #[error(transparent)]
    Pitch(#[from] PitchError),
}
