//! LoopScheduler - one repeating note loop per voice
//!
//! Both voices share one cycle of `cross_beats` measures (the cross voice is
//! the one whose beat count scales the transport). A voice with `my_beats`
//! beats fires every
//!
//! ```text
//!     1m / (my_beats / cross_beats)
//! ```
//!
//! so over one cycle the two voices fire in the exact ratio
//! `left_beats : right_beats`. For 3 against 4 the base voice fires every
//! 4/3 of a measure and the cross voice once per measure.

use std::sync::Arc;

use tracing::debug;

use super::{LoopCallback, LoopHandle, Transport};
use crate::highlight::{Highlight, HighlightCells};
use crate::rhythm::Side;
use crate::sequencing::{Duration, Pitch};

/// How long each fired note sounds
pub const NOTE_SECONDS: f64 = 0.1;

/// Interval between fires for a voice with `my_beats` beats per cycle
pub fn loop_interval(my_beats: u32, cross_beats: u32) -> Duration {
    Duration::MEASURE.div_ratio(my_beats.max(1), cross_beats.max(1))
}

/// A loop ready to be registered: its interval and the callback that
/// plays the note and advances the side's highlight
pub struct LoopRequest {
    side: Side,
    interval: Duration,
    pitch: Pitch,
    callback: LoopCallback,
}

impl LoopRequest {
    pub fn new(
        side: Side,
        my_beats: u32,
        cross_beats: u32,
        pitch: Pitch,
        highlights: Arc<HighlightCells>,
    ) -> Self {
        Self {
            side,
            interval: loop_interval(my_beats, cross_beats),
            pitch,
            callback: Box::new(move |tick, out| {
                out.trigger_note(side, pitch, NOTE_SECONDS, tick.time);
                highlights.set(side, Highlight::Active(tick.index));
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// A registered loop generation for one side.
///
/// Not `Clone`: the only ways to end a generation are
/// [`LoopScheduler::cancel`] and [`LoopScheduler::replace_all`], which
/// consume it.
#[derive(Debug, PartialEq, Eq)]
pub struct LoopScheduler {
    side: Side,
    handle: LoopHandle,
    interval: Duration,
    pitch: Pitch,
}

impl LoopScheduler {
    /// Register a loop that plays `pitch` and advances the side's highlight
    pub fn schedule<T: Transport + ?Sized>(
        transport: &mut T,
        side: Side,
        my_beats: u32,
        cross_beats: u32,
        pitch: Pitch,
        highlights: Arc<HighlightCells>,
    ) -> Self {
        let request = LoopRequest::new(side, my_beats, cross_beats, pitch, highlights);
        let (side, interval, pitch) = (request.side, request.interval, request.pitch);
        let handle = transport.schedule_repeat(interval, request.callback);
        Self::registered(side, handle, interval, pitch)
    }

    /// End every generation in `old` and register `requests` in their place,
    /// without a fire in between
    pub fn replace_all<T: Transport + ?Sized>(
        transport: &mut T,
        old: Vec<LoopScheduler>,
        requests: Vec<LoopRequest>,
    ) -> Vec<LoopScheduler> {
        let cancel: Vec<LoopHandle> = old.iter().map(LoopScheduler::handle).collect();
        let mut meta = Vec::with_capacity(requests.len());
        let mut register = Vec::with_capacity(requests.len());
        for request in requests {
            meta.push((request.side, request.interval, request.pitch));
            register.push((request.interval, request.callback));
        }

        let handles = transport.replace_loops(&cancel, register);
        meta.into_iter()
            .zip(handles)
            .map(|((side, interval, pitch), handle)| Self::registered(side, handle, interval, pitch))
            .collect()
    }

    fn registered(side: Side, handle: LoopHandle, interval: Duration, pitch: Pitch) -> Self {
        debug!(%side, %interval, %pitch, handle = handle.id(), "loop built");
        Self {
            side,
            handle,
            interval,
            pitch,
        }
    }

    /// Remove this generation from the transport
    pub fn cancel<T: Transport + ?Sized>(self, transport: &mut T) {
        transport.cancel(self.handle);
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }
}
