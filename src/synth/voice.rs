//! Pluck voice - percussive, quickly-decaying note.
//!
//! 1. Triangle wave for a soft, bell-like tone
//! 2. Near-instant attack (5ms)
//! 3. Short decay (150ms) down to a low sustain
//! 4. Release once the gate closes

use crate::sequencing::Pitch;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Shape of the amplitude envelope, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PluckShape {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for PluckShape {
    fn default() -> Self {
        Self {
            attack: 0.005,
            decay: 0.15,
            sustain: 0.35,
            release: 0.25,
        }
    }
}

pub struct PluckVoice {
    shape: PluckShape,
    stage: Stage,
    level: f32,
    release_step: f32,
    phase: f32,
    frequency: f32,
    /// Samples left before the gate closes
    gate_samples: u32,
}

impl Default for PluckVoice {
    fn default() -> Self {
        Self::new(PluckShape::default())
    }
}

impl PluckVoice {
    pub fn new(shape: PluckShape) -> Self {
        Self {
            shape,
            stage: Stage::Idle,
            level: 0.0,
            release_step: 0.0,
            phase: 0.0,
            frequency: 440.0,
            gate_samples: 0,
        }
    }

    /// Start a note that holds its gate for `duration` seconds.
    ///
    /// Retriggering restarts the attack from zero so repeated notes stay
    /// distinct.
    pub fn trigger(&mut self, pitch: Pitch, duration: f64, sample_rate: f32) {
        self.frequency = pitch.frequency();
        self.phase = 0.0;
        self.level = 0.0;
        self.stage = Stage::Attack;
        self.gate_samples = (duration * sample_rate as f64).round().max(1.0) as u32;
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if self.stage == Stage::Idle {
            return 0.0;
        }
        self.advance_envelope(sample_rate);

        // Triangle from phase in [0, 1)
        let tri = 1.0 - 4.0 * (self.phase - 0.5).abs();
        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        tri * self.level
    }

    fn advance_envelope(&mut self, sample_rate: f32) {
        if self.gate_samples > 0 {
            self.gate_samples -= 1;
            if self.gate_samples == 0 {
                self.release(sample_rate);
            }
        }

        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Attack => {
                self.level += 1.0 / (self.shape.attack.max(1e-4) * sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                let span = 1.0 - self.shape.sustain;
                self.level -= span / (self.shape.decay.max(1e-4) * sample_rate);
                if self.level <= self.shape.sustain {
                    self.level = self.shape.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {}
            Stage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
    }

    fn release(&mut self, sample_rate: f32) {
        if self.stage == Stage::Idle {
            return;
        }
        // Release from wherever we are, reaching zero in `release` seconds
        let samples = (self.shape.release * sample_rate).max(1.0);
        self.release_step = self.level.max(1e-6) / samples;
        self.stage = Stage::Release;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn test_silent_until_triggered() {
        let mut voice = PluckVoice::default();
        assert!(!voice.is_active());
        assert_eq!(voice.next_sample(SR), 0.0);
    }

    #[test]
    fn test_note_sounds_then_dies_out() {
        let mut voice = PluckVoice::default();
        voice.trigger("A4".parse().unwrap(), 0.1, SR);

        let block: Vec<f32> = (0..4800).map(|_| voice.next_sample(SR)).collect();
        let peak = block.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(peak > 0.3);
        assert!(block.iter().all(|s| s.abs() <= 1.0));

        // Gate (0.1s) plus release (0.25s) well within half a second more
        for _ in 0..(SR as usize / 2) {
            voice.next_sample(SR);
        }
        assert!(!voice.is_active());
    }

    #[test]
    fn test_retrigger_restarts_attack() {
        let mut voice = PluckVoice::default();
        let pitch = "C4".parse().unwrap();
        voice.trigger(pitch, 0.1, SR);
        for _ in 0..2000 {
            voice.next_sample(SR);
        }
        voice.trigger(pitch, 0.1, SR);
        assert_eq!(voice.level(), 0.0);
        assert!(voice.is_active());
    }
}
