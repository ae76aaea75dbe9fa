//! The smallest pieces of music a measure holds.
//!
//! The event set is closed: the validator and the diff analyzer rely
//! on exhaustive matches over these four variants, so a new event
//! kind is a breaking change by design of the pipeline, not an
//! extension point.

use std::fmt;
use std::str::FromStr;

use fraction::Fraction;
use serde::{Deserialize, Serialize};

use super::Pitch;

/// Tie marking carried by a note, start or stop of a tied group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Tie {
    Start,
    Stop,
}
impl fmt::Display for Tie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tie::Start => write!(f, "start"),
            Tie::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tie value: `{0}`")]
pub struct InvalidTie(pub String);

impl FromStr for Tie {
    type Err = InvalidTie;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Tie::Start),
            "stop" => Ok(Tie::Stop),
            _ => Err(InvalidTie(s.to_string())),
        }
    }
}

/// A sounding note: pitched, with onset and duration in whole notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub onset: Fraction,
    pub duration: Fraction,
    pub pitch: Pitch,
    pub tie: Option<Tie>,
}
impl Note {
    pub fn new(onset: Fraction, duration: Fraction, pitch: Pitch) -> Self {
        Self {
            onset,
            duration,
            pitch,
            tie: None,
        }
    }
    pub fn tied(mut self, tie: Tie) -> Self {
        self.tie = Some(tie);
        self
    }
}

/// Silence occupying time in the voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Rest {
    pub onset: Fraction,
    pub duration: Fraction,
}
impl Rest {
    pub fn new(onset: Fraction, duration: Fraction) -> Self {
        Self { onset, duration }
    }
}

/// A chord symbol at an onset. Harmony events are the only legal
/// channel for expressing harmonic change in a transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Harmony {
    pub onset: Fraction,
    pub symbol: String,
    /// Optional key context, e.g. "E minor".
    pub key: Option<String>,
}
impl Harmony {
    pub fn new(onset: Fraction, symbol: impl Into<String>) -> Self {
        Self {
            onset,
            symbol: symbol.into(),
            key: None,
        }
    }
    pub fn in_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A syllable of text aligned to an onset.
#[derive(Debug, Clone, PartialEq)]
pub struct Lyric {
    pub onset: Fraction,
    pub text: String,
}
impl Lyric {
    pub fn new(onset: Fraction, text: impl Into<String>) -> Self {
        Self {
            onset,
            text: text.into(),
        }
    }
}

/// Tagged event variant held by a measure.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Note(Note),
    Rest(Rest),
    Harmony(Harmony),
    Lyric(Lyric),
}
impl Event {
    pub fn onset(&self) -> Fraction {
        match self {
            Event::Note(note) => note.onset,
            Event::Rest(rest) => rest.onset,
            Event::Harmony(harmony) => harmony.onset,
            Event::Lyric(lyric) => lyric.onset,
        }
    }

    /// Duration for the timed kinds (Note, Rest). Harmony and Lyric
    /// are instantaneous annotations and take no time in the voice.
    pub fn duration(&self) -> Option<Fraction> {
        match self {
            Event::Note(note) => Some(note.duration),
            Event::Rest(rest) => Some(rest.duration),
            Event::Harmony(_) | Event::Lyric(_) => None,
        }
    }

    /// End of the occupied span, for timed kinds.
    pub fn end(&self) -> Option<Fraction> {
        self.duration().map(|duration| self.onset() + duration)
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, Event::Note(_) | Event::Rest(_))
    }

    /// TLR type tag of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Note(_) => "NOTE",
            Event::Rest(_) => "REST",
            Event::Harmony(_) => "HARMONY",
            Event::Lyric(_) => "LYRIC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Accidental, Step};

    #[test]
    fn spans() {
        let note = Event::Note(Note::new(
            Fraction::new(1u64, 4u64),
            Fraction::new(1u64, 8u64),
            Pitch::new(Step::C, Accidental::Natural, 4),
        ));
        assert_eq!(note.end(), Some(Fraction::new(3u64, 8u64)));
        assert!(note.is_timed());

        let harmony = Event::Harmony(Harmony::new(
            Fraction::new(0u64, 1u64),
            "Am",
        ));
        assert_eq!(harmony.duration(), None);
        assert!(!harmony.is_timed());
        assert_eq!(harmony.type_name(), "HARMONY");
    }
}
