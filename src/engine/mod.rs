//! CpalBackend - the real-time backend: a cpal output stream driving the
//! logical transport and the stereo synth.
//!
//! Everything the audio callback touches lives in one `Arc<Mutex<..>>`. The
//! control side takes the same lock to schedule, cancel or ramp, so a loop
//! cancelled here can never fire again once `cancel` returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::error::AudioActivationError;
use crate::rhythm::volume::DEFAULT_VOLUME_DB;
use crate::sequencing::Duration;
use crate::synth::StereoSynth;
use crate::transport::{AudioBackend, LogicalTransport, LoopCallback, LoopHandle, Transport};
use crate::MAX_BLOCK_SIZE;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

const FALLBACK_SAMPLE_RATE: f32 = 48_000.0;

/// State shared with the audio thread
struct EngineState {
    transport: LogicalTransport,
    synth: StereoSynth,
    sample_rate: f32,
    #[cfg(feature = "rtrb")]
    scope: Option<Producer<[f32; 2]>>,
}

impl EngineState {
    /// Fill an interleaved output buffer, block by block
    fn process(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let sample_rate = self.sample_rate as f64;

        for block in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = block.len() / channels;
            // Fires land at the start of the block they fall in
            self.transport.process_frames(frames, sample_rate, &mut self.synth);
            self.synth.render(block, channels);

            #[cfg(feature = "rtrb")]
            if let Some(scope) = self.scope.as_mut() {
                for frame in block.chunks(channels) {
                    // Left channel carries the right voice, and vice versa
                    let pair = [frame[0], frame.get(1).copied().unwrap_or(frame[0])];
                    // Drop frames when the view falls behind
                    let _ = scope.push(pair);
                }
            }
        }
    }
}

/// What the header bar shows about the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSnapshot {
    pub time: f64,
    pub bpm: f64,
    pub position_beats: f64,
    pub sample_rate: f32,
    pub volume_db: f32,
}

pub struct CpalBackend {
    state: Arc<Mutex<EngineState>>,
    stream: Option<cpal::Stream>,
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalBackend {
    pub fn new() -> Self {
        let mut synth = StereoSynth::new(FALLBACK_SAMPLE_RATE);
        synth.set_volume(DEFAULT_VOLUME_DB);
        Self {
            state: Arc::new(Mutex::new(EngineState {
                transport: LogicalTransport::default(),
                synth,
                sample_rate: FALLBACK_SAMPLE_RATE,
                #[cfg(feature = "rtrb")]
                scope: None,
            })),
            stream: None,
        }
    }

    /// Backend that also copies its first two output channels into a ring
    /// buffer for the oscilloscope, one `[left, right]` pair per frame
    #[cfg(feature = "rtrb")]
    pub fn with_scope(capacity: usize) -> (Self, Consumer<[f32; 2]>) {
        let backend = Self::new();
        let (producer, consumer) = RingBuffer::new(capacity);
        backend.lock().scope = Some(producer);
        (backend, consumer)
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.lock();
        EngineSnapshot {
            time: state.transport.time(),
            bpm: state.transport.bpm(),
            position_beats: state.transport.position_beats(),
            sample_rate: state.sample_rate,
            volume_db: state.synth.volume_db(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // A panic on the audio thread leaves the state usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_stream(&self) -> Result<cpal::Stream, AudioActivationError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioActivationError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioActivationError::Config(e.to_string()))?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioActivationError::Config(format!(
                "unsupported sample format {:?}",
                config.sample_format()
            )));
        }

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels,
            "opening output stream"
        );

        {
            let mut state = self.lock();
            if state.sample_rate != sample_rate {
                let db = state.synth.volume_db();
                state.synth = StereoSynth::new(sample_rate);
                state.synth.set_volume(db);
                state.sample_rate = sample_rate;
            }
        }

        let shared = Arc::clone(&self.state);
        device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    state.process(data, channels);
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioActivationError::StreamBuild(e.to_string()))
    }
}

impl Transport for CpalBackend {
    fn set_bpm(&mut self, bpm: f64) {
        self.lock().transport.set_bpm(bpm);
    }

    fn ramp_bpm(&mut self, bpm: f64, over: f64) {
        self.lock().transport.ramp_bpm(bpm, over);
    }

    fn start(&mut self, lead: f64) {
        self.lock().transport.start(lead);
    }

    fn stop(&mut self, lead: f64) {
        self.lock().transport.stop(lead);
    }

    fn schedule_repeat(&mut self, interval: Duration, callback: LoopCallback) -> LoopHandle {
        self.lock().transport.schedule_repeat(interval, callback)
    }

    fn cancel(&mut self, handle: LoopHandle) -> bool {
        self.lock().transport.cancel(handle)
    }

    fn replace_loops(
        &mut self,
        cancel: &[LoopHandle],
        register: Vec<(Duration, LoopCallback)>,
    ) -> Vec<LoopHandle> {
        // One lock for the whole swap: the callback cannot run in between
        self.lock().transport.replace_loops(cancel, register)
    }
}

impl AudioBackend for CpalBackend {
    fn activate(&mut self) -> Result<(), AudioActivationError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = self.build_stream()?;
        stream
            .play()
            .map_err(|e| AudioActivationError::StreamPlay(e.to_string()))?;
        self.stream = Some(stream);
        info!("audio output active");
        Ok(())
    }

    fn set_volume(&mut self, db: f32) {
        self.lock().synth.set_volume(db);
    }

    fn ramp_volume(&mut self, db: f32, over: f64) {
        self.lock().synth.ramp_volume(db, over);
    }
}
