//! PlaybackController - owns the audio backend and both loop generations.
//!
//! It is the only thing allowed to start or stop the shared transport. Every
//! edit goes through it so that a running transport is reconfigured the
//! same way regardless of where the edit came from.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PlaybackState, Voice};
use crate::error::{AudioActivationError, InputRangeError, PitchError};
use crate::highlight::{Highlight, HighlightCells};
use crate::rhythm::tempo::TEMPO_RAMP_SECONDS;
use crate::rhythm::volume::{SILENCE_DB, VOLUME_RAMP_SECONDS};
use crate::rhythm::{RhythmConfig, Side, Tempo, Volume};
use crate::sequencing::{NoteSet, Pitch};
use crate::transport::{AudioBackend, LoopHandle, LoopRequest, LoopScheduler};

/// Delay between starting and the first beat, avoids a glitchy downbeat
pub const START_LEAD_SECONDS: f64 = 0.1;
/// Fade-out length on stop
pub const STOP_RAMP_SECONDS: f64 = 0.3;
/// Extra wait after the fade before the transport halts
pub const STOP_LEAD_SECONDS: f64 = 0.1;

pub const DEFAULT_LEFT_NOTE: Pitch = Pitch::from_midi(60); // C4
pub const DEFAULT_RIGHT_NOTE: Pitch = Pitch::from_midi(53); // F3

pub struct PlaybackController<B: AudioBackend> {
    backend: B,
    rhythm: RhythmConfig,
    notes: [Pitch; 2],
    tempo: Tempo,
    volume: Volume,
    state: PlaybackState,
    highlights: Arc<HighlightCells>,
    loops: Vec<LoopScheduler>,
}

impl<B: AudioBackend> PlaybackController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            rhythm: RhythmConfig::default(),
            notes: [DEFAULT_LEFT_NOTE, DEFAULT_RIGHT_NOTE],
            tempo: Tempo::default(),
            volume: Volume::default(),
            state: PlaybackState::Stopped,
            highlights: Arc::new(HighlightCells::new()),
            loops: Vec::with_capacity(2),
        }
    }

    // === Lifecycle ===

    /// Bring audio up and start both loops.
    ///
    /// All or nothing: if the output cannot be activated nothing changes and
    /// playback stays stopped. Calling it while running does nothing.
    pub fn start(&mut self) -> Result<(), AudioActivationError> {
        if self.state == PlaybackState::Running {
            debug!("start ignored, already running");
            return Ok(());
        }

        if let Err(err) = self.backend.activate() {
            warn!(%err, "audio activation failed");
            return Err(err);
        }

        self.highlights.set_both(Highlight::NotStarted);
        self.backend.set_volume(self.volume.output_db());
        self.backend.set_bpm(self.transport_bpm());
        self.rebuild_loops();
        self.backend.start(START_LEAD_SECONDS);
        self.state = PlaybackState::Running;

        info!(
            left = self.rhythm.left_beats(),
            right = self.rhythm.right_beats(),
            bpm = self.transport_bpm(),
            "playback started"
        );
        Ok(())
    }

    /// Silence and halt. The highlights always end up `Stopped`.
    ///
    /// Loops are cancelled at once; the output fades over
    /// [`STOP_RAMP_SECONDS`] and the transport halts
    /// [`STOP_LEAD_SECONDS`] after the fade has finished.
    pub fn stop(&mut self) {
        // Cancel before marking, so no late fire can relight a square
        self.cancel_loops();
        self.highlights.set_both(Highlight::Stopped);
        if self.state == PlaybackState::Stopped {
            return;
        }

        self.backend.ramp_volume(SILENCE_DB, STOP_RAMP_SECONDS);
        self.backend.stop(STOP_RAMP_SECONDS + STOP_LEAD_SECONDS);
        self.state = PlaybackState::Stopped;
        info!("playback stopped");
    }

    pub fn toggle(&mut self) -> Result<(), AudioActivationError> {
        match self.state {
            PlaybackState::Running => {
                self.stop();
                Ok(())
            }
            PlaybackState::Stopped => self.start(),
        }
    }

    // === Edits ===

    pub fn set_left_beats(&mut self, n: i64) -> Result<u32, InputRangeError> {
        self.set_beats(Side::Left, Some(n))
    }

    pub fn set_right_beats(&mut self, n: i64) -> Result<u32, InputRangeError> {
        self.set_beats(Side::Right, Some(n))
    }

    pub fn set_beats_text(&mut self, side: Side, text: &str) -> Result<u32, InputRangeError> {
        self.set_beats(side, text.trim().parse::<i64>().ok())
    }

    pub fn set_beats(&mut self, side: Side, n: Option<i64>) -> Result<u32, InputRangeError> {
        let before = self.rhythm.beats(side);
        let beats = self.rhythm.set_beats(side, n)?;
        if beats != before && self.is_running() {
            self.rebuild_loops();
            if side == Side::Right {
                self.backend.ramp_bpm(self.transport_bpm(), TEMPO_RAMP_SECONDS);
            }
        }
        Ok(beats)
    }

    /// Choose a pitch from the side's note set
    pub fn set_note(&mut self, side: Side, pitch: Pitch) -> Result<(), PitchError> {
        if !NoteSet::for_side(side).contains(pitch) {
            warn!(%side, %pitch, "pitch not in note set");
            return Err(PitchError::NotInSet {
                pitch: pitch.to_string(),
                side,
            });
        }
        if self.notes[side.index()] != pitch {
            self.notes[side.index()] = pitch;
            if self.is_running() {
                self.rebuild_loops();
            }
        }
        Ok(())
    }

    /// Move through the side's note set, wrapping around
    pub fn step_note(&mut self, side: Side, delta: i32) -> Pitch {
        let next = NoteSet::for_side(side).step(self.note(side), delta);
        // `step` only returns members of the set
        let _ = self.set_note(side, next);
        next
    }

    pub fn set_tempo(&mut self, tempo: f64) -> f64 {
        let before = self.tempo.value();
        let value = self.tempo.set(tempo);
        if value != before && self.is_running() {
            self.backend.ramp_bpm(self.transport_bpm(), TEMPO_RAMP_SECONDS);
        }
        value
    }

    pub fn set_volume(&mut self, db: f32) -> f32 {
        let before = self.volume.db();
        let value = self.volume.set(db);
        if value != before && self.is_running() {
            self.backend.ramp_volume(self.volume.output_db(), VOLUME_RAMP_SECONDS);
        }
        value
    }

    pub fn step_volume(&mut self, steps: i32) -> f32 {
        let mut next = self.volume;
        next.step(steps);
        self.set_volume(next.db())
    }

    // === Loops ===

    fn cancel_loops(&mut self) {
        if self.loops.is_empty() {
            return;
        }
        let old = std::mem::take(&mut self.loops);
        self.loops = LoopScheduler::replace_all(&mut self.backend, old, Vec::new());
    }

    /// Swap the current generation for a new one in a single transport
    /// step, so no callback of the old generation runs once the new one
    /// exists and both new loops anchor against the same position.
    fn rebuild_loops(&mut self) {
        let cross_beats = self.rhythm.right_beats();
        let requests = Side::BOTH
            .into_iter()
            .map(|side| {
                LoopRequest::new(
                    side,
                    self.rhythm.beats(side),
                    cross_beats,
                    self.notes[side.index()],
                    Arc::clone(&self.highlights),
                )
            })
            .collect();
        let old = std::mem::take(&mut self.loops);
        self.loops = LoopScheduler::replace_all(&mut self.backend, old, requests);
    }

    // === Queries ===

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn highlight(&self, side: Side) -> Highlight {
        self.highlights.get(side)
    }

    /// Shared handle for readers on other threads
    pub fn highlights(&self) -> Arc<HighlightCells> {
        Arc::clone(&self.highlights)
    }

    pub fn rhythm(&self) -> &RhythmConfig {
        &self.rhythm
    }

    pub fn error(&self, side: Side) -> bool {
        self.rhythm.error(side)
    }

    pub fn note(&self, side: Side) -> Pitch {
        self.notes[side.index()]
    }

    pub fn tempo(&self) -> f64 {
        self.tempo.value()
    }

    pub fn volume(&self) -> f32 {
        self.volume.db()
    }

    pub fn transport_bpm(&self) -> f64 {
        self.tempo.transport_bpm(self.rhythm.right_beats())
    }

    pub fn voice(&self, side: Side) -> Voice {
        Voice {
            side,
            beats: self.rhythm.beats(side),
            note: self.note(side),
            highlight: self.highlight(side),
        }
    }

    pub fn loop_handles(&self) -> Vec<LoopHandle> {
        self.loops.iter().map(LoopScheduler::handle).collect()
    }

    pub fn loops(&self) -> &[LoopScheduler] {
        &self.loops
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: AudioBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.cancel_loops();
    }
}
