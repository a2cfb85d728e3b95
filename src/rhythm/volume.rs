//! Master volume in decibels.

pub const MIN_VOLUME_DB: f32 = -45.0;
pub const MAX_VOLUME_DB: f32 = -5.0;
pub const DEFAULT_VOLUME_DB: f32 = -20.0;
pub const VOLUME_STEP_DB: f32 = 5.0;

/// Knob values below this are treated as "off"
pub const FLOOR_THRESHOLD_DB: f32 = -40.0;
/// Output level used for "off"
pub const SILENCE_DB: f32 = -100.0;

pub const VOLUME_RAMP_SECONDS: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    db: f32,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            db: DEFAULT_VOLUME_DB,
        }
    }
}

impl Volume {
    pub fn new(db: f32) -> Self {
        let mut volume = Self::default();
        volume.set(db);
        volume
    }

    pub fn db(&self) -> f32 {
        self.db
    }

    pub fn set(&mut self, db: f32) -> f32 {
        if db.is_finite() {
            self.db = db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);
        }
        self.db
    }

    /// Move the knob by whole UI steps
    pub fn step(&mut self, steps: i32) -> f32 {
        self.set(self.db + steps as f32 * VOLUME_STEP_DB)
    }

    /// Level actually sent to the output stage
    pub fn output_db(&self) -> f32 {
        if self.db < FLOOR_THRESHOLD_DB {
            SILENCE_DB
        } else {
            self.db
        }
    }
}

/// Convert decibels to linear amplitude
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
