//! LogicalTransport - a deterministic transport clock
//!
//! Time only moves when the owner calls [`LogicalTransport::advance`] (or
//! [`LogicalTransport::process_frames`] from an audio callback), so the same
//! sequence of calls always produces the same fires. Position is kept in
//! quarter-note beats; loop fire positions are recomputed from their index
//! rather than accumulated, so long runs do not drift.

use tracing::debug;

use super::{LoopCallback, LoopHandle, LoopTick, NoteOutput, Ramp, Transport};
use crate::sequencing::Duration;

/// Tolerance when comparing beat positions
const BEAT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    at: f64,
    state: TransportState,
}

struct LoopEntry {
    handle: LoopHandle,
    interval_beats: f64,
    /// Grid slot of the first fire
    anchor: u64,
    fired: u64,
    callback: LoopCallback,
}

pub struct LogicalTransport {
    /// Context time in seconds
    time: f64,
    /// Position in quarter-note beats since the last start
    position: f64,
    state: TransportState,
    pending: Option<Pending>,
    bpm: Ramp,
    loops: Vec<LoopEntry>,
    next_handle: u64,
    /// Scratch list of (beat, loop slot) reused between advances
    due: Vec<(f64, usize)>,
    last_start: Option<f64>,
    last_halt: Option<f64>,
    /// Beat position every slot up to which has been dispatched, `None`
    /// until the first window after a start
    dispatched_through: Option<f64>,
}

impl Default for LogicalTransport {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl LogicalTransport {
    pub fn new(bpm: f64) -> Self {
        Self {
            time: 0.0,
            position: 0.0,
            state: TransportState::Stopped,
            pending: None,
            bpm: Ramp::constant(bpm),
            loops: Vec::with_capacity(4),
            next_handle: 1,
            due: Vec::with_capacity(16),
            last_start: None,
            last_halt: None,
            dispatched_through: None,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn position_beats(&self) -> f64 {
        self.position
    }

    /// Current rate, including any ramp in progress
    pub fn bpm(&self) -> f64 {
        self.bpm.value_at(self.time)
    }

    /// Rate the clock is heading to
    pub fn target_bpm(&self) -> f64 {
        self.bpm.target()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Scheduled state change, with its context time
    pub fn pending(&self) -> Option<(f64, TransportState)> {
        self.pending.map(|p| (p.at, p.state))
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn is_scheduled(&self, handle: LoopHandle) -> bool {
        self.loops.iter().any(|l| l.handle == handle)
    }

    /// Context time the clock last started running
    pub fn last_start(&self) -> Option<f64> {
        self.last_start
    }

    /// Context time the clock last halted
    pub fn last_halt(&self) -> Option<f64> {
        self.last_halt
    }

    /// Advance by a block of audio frames
    pub fn process_frames(&mut self, frames: usize, sample_rate: f64, out: &mut dyn NoteOutput) {
        if sample_rate > 0.0 {
            self.advance(frames as f64 / sample_rate, out);
        }
    }

    /// Advance context time, applying pending state changes and dispatching
    /// every loop fire that falls inside the window, in time order.
    pub fn advance(&mut self, seconds: f64, out: &mut dyn NoteOutput) {
        let end = self.time + seconds.max(0.0);

        loop {
            let boundary = match self.pending {
                Some(p) if p.at <= end => p.at,
                _ => end,
            };
            self.run_until(boundary.max(self.time), out);

            match self.pending {
                Some(p) if p.at <= end => {
                    self.pending = None;
                    self.apply(p.state);
                }
                _ => break,
            }
        }
    }

    fn apply(&mut self, state: TransportState) {
        match state {
            TransportState::Started => {
                if self.state == TransportState::Started {
                    self.halt();
                }
                self.state = TransportState::Started;
                self.last_start = Some(self.time);
                debug!(time = self.time, bpm = self.bpm(), "transport started");
            }
            TransportState::Stopped => {
                if self.state == TransportState::Started {
                    self.halt();
                }
            }
        }
    }

    /// Stop and rewind. Loops stay registered and restart from the top of
    /// the grid.
    fn halt(&mut self) {
        self.state = TransportState::Stopped;
        self.position = 0.0;
        self.dispatched_through = None;
        for entry in &mut self.loops {
            entry.anchor = 0;
            entry.fired = 0;
        }
        self.last_halt = Some(self.time);
        debug!(time = self.time, "transport halted");
    }

    fn run_until(&mut self, t1: f64, out: &mut dyn NoteOutput) {
        let t0 = self.time;
        if self.state == TransportState::Stopped || t1 <= t0 {
            self.time = t1;
            return;
        }

        let beats = self.bpm.integrate(t0, t1) / 60.0;
        let start_pos = self.position;
        let end_pos = start_pos + beats;

        let mut due = std::mem::take(&mut self.due);
        due.clear();
        for (slot, entry) in self.loops.iter().enumerate() {
            if entry.interval_beats <= 0.0 {
                continue;
            }
            let mut k = 0u64;
            loop {
                let at = (entry.anchor + entry.fired + k) as f64 * entry.interval_beats;
                if at > end_pos + BEAT_EPSILON {
                    break;
                }
                due.push((at, slot));
                k += 1;
            }
        }
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for &(at, slot) in &due {
            // Map the beat position back to context time within this window
            let frac = if beats > 0.0 {
                ((at - start_pos) / beats).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let entry = &mut self.loops[slot];
            let tick = LoopTick {
                index: entry.fired,
                time: t0 + frac * (t1 - t0),
            };
            entry.fired += 1;
            (entry.callback)(tick, out);
        }

        self.due = due;
        self.dispatched_through = Some(end_pos);
        self.position = end_pos;
        self.time = t1;
    }
}

impl Transport for LogicalTransport {
    fn set_bpm(&mut self, bpm: f64) {
        self.bpm.set(bpm);
    }

    fn ramp_bpm(&mut self, bpm: f64, over: f64) {
        self.bpm.ramp_to(self.time, bpm, over);
    }

    fn start(&mut self, lead: f64) {
        if self.state == TransportState::Started {
            self.halt();
        }
        self.pending = Some(Pending {
            at: self.time + lead.max(0.0),
            state: TransportState::Started,
        });
    }

    fn stop(&mut self, lead: f64) {
        self.pending = Some(Pending {
            at: self.time + lead.max(0.0),
            state: TransportState::Stopped,
        });
    }

    fn schedule_repeat(&mut self, interval: Duration, callback: LoopCallback) -> LoopHandle {
        let handle = LoopHandle(self.next_handle);
        self.next_handle += 1;

        let interval_beats = interval.to_beats();
        // First slot strictly after everything already dispatched
        let anchor = match self.dispatched_through {
            Some(through) if self.state == TransportState::Started && interval_beats > 0.0 => {
                ((through + BEAT_EPSILON) / interval_beats).floor().max(0.0) as u64 + 1
            }
            _ => 0,
        };

        debug!(handle = handle.0, %interval, anchor, "loop scheduled");
        self.loops.push(LoopEntry {
            handle,
            interval_beats,
            anchor,
            fired: 0,
            callback,
        });
        handle
    }

    fn cancel(&mut self, handle: LoopHandle) -> bool {
        let before = self.loops.len();
        self.loops.retain(|l| l.handle != handle);
        let removed = self.loops.len() != before;
        if removed {
            debug!(handle = handle.0, "loop cancelled");
        }
        removed
    }
}
