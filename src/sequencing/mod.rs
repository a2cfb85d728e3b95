//! Musical time and pitch.

pub mod duration;
pub mod pitch;

pub use duration::Duration;
pub use pitch::{NoteSet, Pitch};
