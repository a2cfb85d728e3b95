//! OfflineBackend - a substrate that runs without an audio device.
//!
//! Notes and volume automation are recorded instead of rendered, and time
//! only moves when [`OfflineBackend::advance`] is called. Used by the tests,
//! the benchmarks and `crossbeat --simulate`.

use crate::error::AudioActivationError;
use crate::rhythm::volume::DEFAULT_VOLUME_DB;
use crate::rhythm::Side;
use crate::sequencing::{Duration, Pitch};
use crate::transport::{
    AudioBackend, LogicalTransport, LoopCallback, LoopHandle, NoteOutput, Ramp, Transport,
};

/// A note the transport asked for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub time: f64,
    pub side: Side,
    pub pitch: Pitch,
    pub duration: f64,
}

/// A volume change the controller asked for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeChange {
    /// Context time of the request
    pub at: f64,
    pub target_db: f32,
    /// Context time the target is reached
    pub complete_at: f64,
}

#[derive(Debug, Default)]
struct NoteRecorder {
    notes: Vec<NoteEvent>,
}

impl NoteOutput for NoteRecorder {
    fn trigger_note(&mut self, side: Side, pitch: Pitch, duration: f64, time: f64) {
        self.notes.push(NoteEvent {
            time,
            side,
            pitch,
            duration,
        });
    }
}

pub struct OfflineBackend {
    transport: LogicalTransport,
    recorder: NoteRecorder,
    volume_db: Ramp,
    volume_changes: Vec<VolumeChange>,
    denial: Option<String>,
    activations: u32,
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self {
            transport: LogicalTransport::default(),
            recorder: NoteRecorder::default(),
            volume_db: Ramp::constant(DEFAULT_VOLUME_DB as f64),
            volume_changes: Vec::new(),
            denial: None,
            activations: 0,
        }
    }

    /// A backend whose host refuses to enable audio
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            denial: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Let the host accept (`None`) or refuse future activations
    pub fn set_denial(&mut self, reason: Option<String>) {
        self.denial = reason;
    }

    pub fn advance(&mut self, seconds: f64) {
        self.transport.advance(seconds, &mut self.recorder);
    }

    pub fn time(&self) -> f64 {
        self.transport.time()
    }

    pub fn transport(&self) -> &LogicalTransport {
        &self.transport
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.recorder.notes
    }

    pub fn take_notes(&mut self) -> Vec<NoteEvent> {
        std::mem::take(&mut self.recorder.notes)
    }

    pub fn notes_for(&self, side: Side) -> impl Iterator<Item = &NoteEvent> {
        self.recorder.notes.iter().filter(move |n| n.side == side)
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db.value_at(self.transport.time()) as f32
    }

    pub fn volume_changes(&self) -> &[VolumeChange] {
        &self.volume_changes
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }
}

impl Transport for OfflineBackend {
    fn set_bpm(&mut self, bpm: f64) {
        self.transport.set_bpm(bpm);
    }

    fn ramp_bpm(&mut self, bpm: f64, over: f64) {
        self.transport.ramp_bpm(bpm, over);
    }

    fn start(&mut self, lead: f64) {
        self.transport.start(lead);
    }

    fn stop(&mut self, lead: f64) {
        self.transport.stop(lead);
    }

    fn schedule_repeat(&mut self, interval: Duration, callback: LoopCallback) -> LoopHandle {
        self.transport.schedule_repeat(interval, callback)
    }

    fn cancel(&mut self, handle: LoopHandle) -> bool {
        self.transport.cancel(handle)
    }

    fn replace_loops(
        &mut self,
        cancel: &[LoopHandle],
        register: Vec<(Duration, LoopCallback)>,
    ) -> Vec<LoopHandle> {
        self.transport.replace_loops(cancel, register)
    }
}

impl AudioBackend for OfflineBackend {
    fn activate(&mut self) -> Result<(), AudioActivationError> {
        match &self.denial {
            Some(reason) => Err(AudioActivationError::Denied(reason.clone())),
            None => {
                self.activations += 1;
                Ok(())
            }
        }
    }

    fn set_volume(&mut self, db: f32) {
        let now = self.transport.time();
        self.volume_db.set(db as f64);
        self.volume_changes.push(VolumeChange {
            at: now,
            target_db: db,
            complete_at: now,
        });
    }

    fn ramp_volume(&mut self, db: f32, over: f64) {
        let now = self.transport.time();
        self.volume_db.ramp_to(now, db as f64, over);
        self.volume_changes.push(VolumeChange {
            at: now,
            target_db: db,
            complete_at: self.volume_db.end_time(),
        });
    }
}
