//! Tempo knob and the transport rate derived from it.
//!
//! The master clock is expressed in units of the cross voice: the transport
//! runs at `tempo * right_beats` BPM, so both voices' intervals stay simple
//! fractions of one clock without searching for a common denominator.

pub const MIN_TEMPO: f64 = 20.0;
pub const MAX_TEMPO: f64 = 300.0;
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Seconds over which a running transport glides to a new rate
pub const TEMPO_RAMP_SECONDS: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    value: f64,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            value: DEFAULT_TEMPO,
        }
    }
}

impl Tempo {
    pub fn new(value: f64) -> Self {
        let mut tempo = Self::default();
        tempo.set(value);
        tempo
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the knob, clamped to its range. Returns the stored value.
    pub fn set(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.value = value.clamp(MIN_TEMPO, MAX_TEMPO);
        }
        self.value
    }

    pub fn transport_bpm(&self, right_beats: u32) -> f64 {
        self.value * right_beats as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transport_rate_scales_with_cross_beats() {
        let tempo = Tempo::new(120.0);
        assert_relative_eq!(tempo.transport_bpm(4), 480.0);
        assert_relative_eq!(tempo.transport_bpm(7), 840.0);
    }

    #[test]
    fn test_clamped() {
        let mut tempo = Tempo::default();
        assert_relative_eq!(tempo.set(5.0), MIN_TEMPO);
        assert_relative_eq!(tempo.set(1000.0), MAX_TEMPO);
        assert_relative_eq!(tempo.set(f64::NAN), MAX_TEMPO);
    }
}
