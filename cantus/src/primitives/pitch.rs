//! Pitch spelling in Scientific Pitch Notation.
//!
//! A [`Pitch`] keeps the written spelling (step, accidental, octave)
//! rather than a bare MIDI number, so that `F#4` and `Gb4` stay
//! distinct values even though they sound the same. Semitone
//! arithmetic goes through [`Pitch::midi`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Letter name of a pitch, C through B.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}
impl Step {
    /// Semitones above C within one octave.
    pub fn semitones(&self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }
    pub fn letter(&self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'C' => Some(Step::C),
            'D' => Some(Step::D),
            'E' => Some(Step::E),
            'F' => Some(Step::F),
            'G' => Some(Step::G),
            'A' => Some(Step::A),
            'B' => Some(Step::B),
            _ => None,
        }
    }
}
impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Written alteration of a step.
///
/// The textual suffixes are the ones the TLR grammar accepts:
/// `bb`, `b`, nothing, `#`, `x`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}
impl Accidental {
    /// Chromatic alteration in semitones: -2..=2.
    pub fn alter(&self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }
    pub fn suffix(&self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "x",
        }
    }
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "bb" => Some(Accidental::DoubleFlat),
            "b" => Some(Accidental::Flat),
            "" => Some(Accidental::Natural),
            "#" => Some(Accidental::Sharp),
            "x" => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }
}
impl fmt::Display for Accidental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pitch literal: `{0}`")]
pub struct InvalidPitch(pub String);

/// A spelled pitch: step + accidental + octave, SPN semantics.
///
/// # Example
/// ```
/// use cantus::primitives::Pitch;
/// let fis: Pitch = "F#4".parse().unwrap();
/// assert_eq!(fis.midi(), 66);
/// assert_eq!(fis.to_string(), "F#4");
/// assert_eq!(fis.transposed(2).to_string(), "G#4");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Pitch {
    pub step: Step,
    pub accidental: Accidental,
    pub octave: i8,
}
impl Pitch {
    pub fn new(step: Step, accidental: Accidental, octave: i8) -> Self {
        Self {
            step,
            accidental,
            octave,
        }
    }

    /// Natural pitch without alteration, shorthand for builders and tests.
    pub fn natural(step: Step, octave: i8) -> Self {
        Self::new(step, Accidental::Natural, octave)
    }

    /// MIDI note number of the sounding pitch. C4 is 60.
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12
            + self.step.semitones()
            + self.accidental.alter()
    }

    /// Signed semitone distance from `other` up to `self`.
    pub fn semitones_from(&self, other: &Pitch) -> i32 {
        self.midi() - other.midi()
    }

    /// New pitch shifted by `semitones`, respelled from the chromatic
    /// scale with sharps. The spelling is deterministic: transposing
    /// `Gb4` up two semitones yields `G#4`, not `Ab4`.
    pub fn transposed(&self, semitones: i32) -> Pitch {
        Self::from_midi(self.midi() + semitones)
    }

    /// Sharp-preferred spelling of a MIDI note number.
    pub fn from_midi(midi: i32) -> Pitch {
        let octave = (midi.div_euclid(12) - 1) as i8;
        let (step, accidental) = match midi.rem_euclid(12) {
            0 => (Step::C, Accidental::Natural),
            1 => (Step::C, Accidental::Sharp),
            2 => (Step::D, Accidental::Natural),
            3 => (Step::D, Accidental::Sharp),
            4 => (Step::E, Accidental::Natural),
            5 => (Step::F, Accidental::Natural),
            6 => (Step::F, Accidental::Sharp),
            7 => (Step::G, Accidental::Natural),
            8 => (Step::G, Accidental::Sharp),
            9 => (Step::A, Accidental::Natural),
            10 => (Step::A, Accidental::Sharp),
            _ => (Step::B, Accidental::Natural),
        };
        Pitch {
            step,
            accidental,
            octave,
        }
    }
}
impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.step, self.accidental, self.octave)
    }
}
impl FromStr for Pitch {
    type Err = InvalidPitch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let step = chars
            .next()
            .and_then(Step::from_letter)
            .ok_or_else(|| InvalidPitch(s.to_string()))?;
        let rest = &s[1..];
        let octave_at = rest
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| InvalidPitch(s.to_string()))?;
        let accidental = Accidental::from_suffix(&rest[..octave_at])
            .ok_or_else(|| InvalidPitch(s.to_string()))?;
        let octave: i8 = rest[octave_at..]
            .parse()
            .map_err(|_| InvalidPitch(s.to_string()))?;
        Ok(Pitch {
            step,
            accidental,
            octave,
        })
    }
}

/// Major or minor mode of a key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Mode {
    Major,
    Minor,
}
impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => write!(f, "major"),
            Mode::Minor => write!(f, "minor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid key literal: `{0}`")]
pub struct InvalidKey(pub String);

/// Global key of a score, e.g. "C major" or "F# minor".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Key {
    pub tonic: Step,
    pub accidental: Accidental,
    pub mode: Mode,
}
impl Key {
    pub fn new(tonic: Step, accidental: Accidental, mode: Mode) -> Self {
        Self {
            tonic,
            accidental,
            mode,
        }
    }
}
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {}", self.tonic, self.accidental, self.mode)
    }
}
impl FromStr for Key {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tonic_str, mode_str) = s
            .split_once(' ')
            .ok_or_else(|| InvalidKey(s.to_string()))?;
        let mode = match mode_str.trim() {
            "major" | "Major" => Mode::Major,
            "minor" | "Minor" => Mode::Minor,
            _ => return Err(InvalidKey(s.to_string())),
        };
        let mut chars = tonic_str.chars();
        let tonic = chars
            .next()
            .and_then(Step::from_letter)
            .ok_or_else(|| InvalidKey(s.to_string()))?;
        let accidental = Accidental::from_suffix(chars.as_str())
            .ok_or_else(|| InvalidKey(s.to_string()))?;
        Ok(Key {
            tonic,
            accidental,
            mode,
        })
    }
}

/// English phrase for a signed semitone interval, with direction:
/// `interval_phrase(2)` is `"up a major second"`.
///
/// Compound intervals are folded at the octave: 14 semitones reads
/// "up an octave and a major second".
pub fn interval_phrase(semitones: i32) -> String {
    if semitones == 0 {
        return "unchanged".to_string();
    }
    let direction = if semitones > 0 { "up" } else { "down" };
    let total = semitones.unsigned_abs();
    let octaves = total / 12;
    let simple = total % 12;
    let simple_name = match simple {
        0 => "",
        1 => "a minor second",
        2 => "a major second",
        3 => "a minor third",
        4 => "a major third",
        5 => "a perfect fourth",
        6 => "a tritone",
        7 => "a perfect fifth",
        8 => "a minor sixth",
        9 => "a major sixth",
        10 => "a minor seventh",
        _ => "a major seventh",
    };
    match (octaves, simple) {
        (0, _) => format!("{direction} {simple_name}"),
        (1, 0) => format!("{direction} an octave"),
        (n, 0) => format!("{direction} {n} octaves"),
        (1, _) => format!("{direction} an octave and {simple_name}"),
        (n, _) => format!("{direction} {n} octaves and {simple_name}"),
    }
}
