pub mod config; // Startup session file
pub mod engine; // cpal output stream
pub mod error;
pub mod highlight;
pub mod playback; // Controller and offline backend
pub mod presentation;
pub mod rhythm; // Beat counts, tempo, volume
pub mod sequencing; // Musical time and pitch
pub mod synth;
pub mod transport; // Clock, loops, substrate traits

/// Frames rendered per transport step in the audio callback
pub const MAX_BLOCK_SIZE: usize = 64;
