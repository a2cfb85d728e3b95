//! Two pluck voices panned hard apart, a shared gain stage and a master
//! volume with linear dB ramps.

pub mod voice;

pub use voice::{PluckShape, PluckVoice};

use crate::rhythm::volume::{db_to_gain, DEFAULT_VOLUME_DB, SILENCE_DB};
use crate::rhythm::Side;
use crate::sequencing::Pitch;
use crate::transport::{NoteOutput, Ramp};

/// Shared gain applied after the voices are mixed
pub const VOICE_GAIN: f32 = 0.6;

/// Stereo position per side: -1 = left channel, +1 = right channel.
///
/// Panning is crossed: the left voice sounds on the right channel.
pub fn pan_for(side: Side) -> f32 {
    match side {
        Side::Left => 1.0,
        Side::Right => -1.0,
    }
}

/// Equal-power pan law: (left gain, right gain)
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}

pub struct StereoSynth {
    voices: [PluckVoice; 2],
    pans: [(f32, f32); 2],
    volume_db: Ramp,
    sample_rate: f32,
    /// Context time in seconds, advanced per rendered frame
    time: f64,
}

impl StereoSynth {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: [PluckVoice::default(), PluckVoice::default()],
            pans: [pan_gains(pan_for(Side::Left)), pan_gains(pan_for(Side::Right))],
            volume_db: Ramp::constant(DEFAULT_VOLUME_DB as f64),
            sample_rate,
            time: 0.0,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db.value_at(self.time) as f32
    }

    pub fn set_volume(&mut self, db: f32) {
        self.volume_db.set(db as f64);
    }

    pub fn ramp_volume(&mut self, db: f32, over: f64) {
        self.volume_db.ramp_to(self.time, db as f64, over);
    }

    pub fn is_active(&self) -> bool {
        self.voices.iter().any(PluckVoice::is_active)
    }

    /// Render interleaved frames into `out`
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let dt = 1.0 / self.sample_rate as f64;

        for frame in out.chunks_mut(channels) {
            let mut left = 0.0f32;
            let mut right = 0.0f32;
            for (voice, (gl, gr)) in self.voices.iter_mut().zip(self.pans.iter()) {
                let s = voice.next_sample(self.sample_rate);
                left += s * gl;
                right += s * gr;
            }

            let db = self.volume_db.value_at(self.time) as f32;
            let master = (if db <= SILENCE_DB { 0.0 } else { db_to_gain(db) }) * VOICE_GAIN;
            left *= master;
            right *= master;

            match frame.len() {
                1 => frame[0] = (left + right) * 0.5,
                _ => {
                    frame[0] = left;
                    frame[1] = right;
                    for extra in frame.iter_mut().skip(2) {
                        *extra = 0.0;
                    }
                }
            }
            self.time += dt;
        }
    }
}

impl NoteOutput for StereoSynth {
    fn trigger_note(&mut self, side: Side, pitch: Pitch, duration: f64, _time: f64) {
        self.voices[side.index()].trigger(pitch, duration, self.sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pan_law() {
        let (l, r) = pan_gains(1.0);
        assert_relative_eq!(l, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r, 1.0, epsilon = 1e-6);
        let (l, r) = pan_gains(0.0);
        assert_relative_eq!(l, r, epsilon = 1e-6);
    }

    #[test]
    fn test_left_voice_sounds_on_right_channel() {
        let mut synth = StereoSynth::new(48_000.0);
        synth.set_volume(0.0);
        synth.trigger_note(Side::Left, "C4".parse().unwrap(), 0.1, 0.0);

        let mut buffer = vec![0.0f32; 2 * 2048];
        synth.render(&mut buffer, 2);
        let left_peak = buffer.iter().step_by(2).fold(0.0f32, |a, &x| a.max(x.abs()));
        let right_peak = buffer.iter().skip(1).step_by(2).fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!(left_peak < 1e-4);
        assert!(right_peak > 0.1);
    }

    #[test]
    fn test_silence_floor_mutes() {
        let mut synth = StereoSynth::new(48_000.0);
        synth.set_volume(SILENCE_DB);
        synth.trigger_note(Side::Right, "F3".parse().unwrap(), 0.1, 0.0);
        let mut buffer = vec![0.0f32; 512];
        synth.render(&mut buffer, 2);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_volume_ramp_follows_render_time() {
        let mut synth = StereoSynth::new(1_000.0);
        synth.set_volume(-20.0);
        synth.ramp_volume(-100.0, 0.3);
        let mut buffer = vec![0.0f32; 2 * 150];
        synth.render(&mut buffer, 2);
        assert_relative_eq!(synth.volume_db(), -60.0, epsilon = 0.5);
        let mut buffer = vec![0.0f32; 2 * 200];
        synth.render(&mut buffer, 2);
        assert_relative_eq!(synth.volume_db(), -100.0);
    }
}
