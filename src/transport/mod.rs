//! The audio-scheduling substrate.
//!
//! The core treats the clock and the output as opaque capabilities:
//! repeating callbacks on a shared transport, cancellation by handle, note
//! triggers and ramped parameter changes. [`Transport`] and [`AudioBackend`]
//! spell out that contract; [`LogicalTransport`] is the deterministic clock
//! both shipped backends are built on.

pub mod clock;
pub mod loops;
pub mod ramp;

pub use clock::{LogicalTransport, TransportState};
pub use loops::{loop_interval, LoopRequest, LoopScheduler, NOTE_SECONDS};
pub use ramp::Ramp;

use crate::error::AudioActivationError;
use crate::rhythm::Side;
use crate::sequencing::{Duration, Pitch};

/// Identifies one registered repeating callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopHandle(pub(crate) u64);

impl LoopHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Passed to a loop callback on every fire
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTick {
    /// Fires of this loop so far (0 on the first)
    pub index: u64,
    /// Context time of the fire, in seconds
    pub time: f64,
}

/// Something that can sound a note
pub trait NoteOutput {
    fn trigger_note(&mut self, side: Side, pitch: Pitch, duration: f64, time: f64);
}

pub type LoopCallback = Box<dyn FnMut(LoopTick, &mut dyn NoteOutput) + Send>;

/// A schedulable logical clock
pub trait Transport {
    /// Jump the clock rate
    fn set_bpm(&mut self, bpm: f64);

    /// Glide the clock rate to `bpm` over `over` seconds
    fn ramp_bpm(&mut self, bpm: f64, over: f64);

    /// Start from position 0 after `lead` seconds, replacing any pending
    /// start/stop. A running clock is halted first.
    fn start(&mut self, lead: f64);

    /// Halt and rewind after `lead` seconds, replacing any pending start/stop
    fn stop(&mut self, lead: f64);

    /// Run `callback` every `interval`, aligned to the transport grid
    fn schedule_repeat(&mut self, interval: Duration, callback: LoopCallback) -> LoopHandle;

    /// Remove a callback. Once this returns, the callback never runs again.
    fn cancel(&mut self, handle: LoopHandle) -> bool;

    /// Cancel `cancel`, then register `register`, as one step: no fire can
    /// happen between the two. Returns the new handles in order.
    fn replace_loops(
        &mut self,
        cancel: &[LoopHandle],
        register: Vec<(Duration, LoopCallback)>,
    ) -> Vec<LoopHandle> {
        for &handle in cancel {
            self.cancel(handle);
        }
        register
            .into_iter()
            .map(|(interval, callback)| self.schedule_repeat(interval, callback))
            .collect()
    }
}

/// Transport plus the output stage it drives
pub trait AudioBackend: Transport {
    /// Bring the output up. Hosts may refuse.
    fn activate(&mut self) -> Result<(), AudioActivationError>;

    fn set_volume(&mut self, db: f32);

    fn ramp_volume(&mut self, db: f32, over: f64);
}
