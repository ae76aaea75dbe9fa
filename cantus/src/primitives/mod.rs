//! Elements from which the score tree is constructed.
//!
//! Pitches, rational durations, time signatures, events and measures.
//! Everything here is a plain value: the pipeline never mutates a
//! score in place, it builds new trees, so all of these types are
//! cheap to clone and compare.

pub mod duration;
pub mod event;
pub mod measure;
pub mod pitch;
pub mod time_signature;

pub use duration::{
    beat_label, duration_name, parse_rational, RationalError,
};
pub use event::{Event, Harmony, InvalidTie, Lyric, Note, Rest, Tie};
pub use measure::{EventIntegrityError, Measure};
pub use pitch::{
    interval_phrase, Accidental, InvalidKey, InvalidPitch, Key, Mode,
    Pitch, Step,
};
pub use time_signature::{InvalidTimeSignature, TimeSignature};
