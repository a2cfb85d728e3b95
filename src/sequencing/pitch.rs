/*
Pitch Names
===========

Voices are configured with scientific pitch names such as "Bb2" or "C4".
Middle C (C4) = MIDI note 60.

    note_number = 12 * (octave + 1) + semitone

where semitone: C=0, C#/Db=1, D=2, D#/Eb=3, E=4, F=5, F#/Gb=6, G=7,
G#/Ab=8, A=9, A#/Bb=10, B=11.

Names are always rendered with flats, which is how the selectable note sets
are spelled.
*/

use std::str::FromStr;

use crate::error::PitchError;
use crate::rhythm::Side;

const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A pitch, stored as its MIDI note number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch(u8);

impl Pitch {
    pub const fn from_midi(note: u8) -> Self {
        Self(note)
    }

    pub const fn midi(self) -> u8 {
        self.0
    }

    /// Frequency in Hz. A4 = 440 Hz = MIDI note 69
    pub fn frequency(self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }

    pub fn octave(self) -> i32 {
        self.0 as i32 / 12 - 1
    }

    fn class_name(self) -> &'static str {
        FLAT_NAMES[(self.0 % 12) as usize]
    }
}

impl std::fmt::Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.class_name(), self.octave())
    }
}

impl FromStr for Pitch {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || PitchError::Unknown(s.to_string());
        let mut chars = s.trim().chars().peekable();

        let semitone: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(unknown()),
        };

        let accidental = match chars.peek() {
            Some('b') => {
                chars.next();
                -1
            }
            Some('#') | Some('s') => {
                chars.next();
                1
            }
            _ => 0,
        };

        let octave: i32 = chars.collect::<String>().parse().map_err(|_| unknown())?;
        let note = 12 * (octave + 1) + semitone + accidental;
        u8::try_from(note)
            .ok()
            .filter(|n| *n <= 127)
            .map(Pitch)
            .ok_or_else(unknown)
    }
}

/// The fixed pitches a voice may choose from.
///
/// The left voice sits an octave above the right one so the two stay
/// distinguishable when they coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSet {
    pitches: &'static [Pitch],
}

/// Bb3..A4, chosen for the left voice
const UPPER: [Pitch; 12] = chromatic_from(58);
/// Bb2..A3, chosen for the right voice
const LOWER: [Pitch; 12] = chromatic_from(46);

const fn chromatic_from(start: u8) -> [Pitch; 12] {
    let mut out = [Pitch(0); 12];
    let mut i = 0;
    while i < 12 {
        out[i] = Pitch(start + i as u8);
        i += 1;
    }
    out
}

impl NoteSet {
    pub const fn for_side(side: Side) -> Self {
        match side {
            Side::Left => NoteSet { pitches: &UPPER },
            Side::Right => NoteSet { pitches: &LOWER },
        }
    }

    pub fn pitches(&self) -> &'static [Pitch] {
        self.pitches
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.pitches.contains(&pitch)
    }

    pub fn position(&self, pitch: Pitch) -> Option<usize> {
        self.pitches.iter().position(|p| *p == pitch)
    }

    /// Step through the set, wrapping at either end
    pub fn step(&self, pitch: Pitch, delta: i32) -> Pitch {
        let len = self.pitches.len() as i32;
        let from = self.position(pitch).unwrap_or(0) as i32;
        self.pitches[(from + delta).rem_euclid(len) as usize]
    }

    /// Parse a pitch name and check it belongs to this set
    pub fn parse(&self, name: &str, side: Side) -> Result<Pitch, PitchError> {
        let pitch: Pitch = name.parse()?;
        if self.contains(pitch) {
            Ok(pitch)
        } else {
            Err(PitchError::NotInSet {
                pitch: pitch.to_string(),
                side,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_names() {
        assert_eq!("C4".parse::<Pitch>().unwrap().midi(), 60);
        assert_eq!("A4".parse::<Pitch>().unwrap().midi(), 69);
        assert_eq!("Bb2".parse::<Pitch>().unwrap().midi(), 46);
        assert_eq!("F#3".parse::<Pitch>().unwrap().midi(), 54);
        assert_eq!("Gb3".parse::<Pitch>().unwrap().midi(), 54);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("H4".parse::<Pitch>(), Err(PitchError::Unknown(_))));
        assert!(matches!("C".parse::<Pitch>(), Err(PitchError::Unknown(_))));
        assert!(matches!("C99".parse::<Pitch>(), Err(PitchError::Unknown(_))));
    }

    #[test]
    fn test_display_uses_flats() {
        assert_eq!(Pitch::from_midi(54).to_string(), "Gb3");
        assert_eq!(Pitch::from_midi(60).to_string(), "C4");
        assert_eq!(Pitch::from_midi(46).to_string(), "Bb2");
    }

    #[test]
    fn test_frequency() {
        assert_relative_eq!(Pitch::from_midi(69).frequency(), 440.0);
        assert_relative_eq!(Pitch::from_midi(57).frequency(), 220.0, epsilon = 1e-3);
    }

    #[test]
    fn test_note_sets() {
        let left: Vec<String> = NoteSet::for_side(Side::Left)
            .pitches()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            left,
            ["Bb3", "B3", "C4", "Db4", "D4", "Eb4", "E4", "F4", "Gb4", "G4", "Ab4", "A4"]
        );

        let right: Vec<String> = NoteSet::for_side(Side::Right)
            .pitches()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            right,
            ["Bb2", "B2", "C3", "Db3", "D3", "Eb3", "E3", "F3", "Gb3", "G3", "Ab3", "A3"]
        );
    }

    #[test]
    fn test_set_membership() {
        let right = NoteSet::for_side(Side::Right);
        assert!(right.parse("F3", Side::Right).is_ok());
        assert!(matches!(
            right.parse("C4", Side::Right),
            Err(PitchError::NotInSet { .. })
        ));
    }

    #[test]
    fn test_step_wraps() {
        let left = NoteSet::for_side(Side::Left);
        let a4: Pitch = "A4".parse().unwrap();
        let bb3: Pitch = "Bb3".parse().unwrap();
        assert_eq!(left.step(a4, 1), bb3);
        assert_eq!(left.step(bb3, -1), a4);
    }
}
