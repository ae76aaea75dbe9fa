//! The textual score surface handed to the language model.
//!
//! TLR is the *only* representation a model ever sees or edits. The
//! grammar is fixed and line-oriented:
//!
//! ```text
//! PART <name>
//! VOICE <index>
//! MEASURE <index>
//! NOTE t=<onset> dur=<duration> pitch=<SPN> [tie=<start|stop>]
//! REST t=<onset> dur=<duration>
//! HARMONY t=<onset> symbol=<chord-symbol> [key=<key-context>]
//! LYRIC t=<onset> text=<text>
//! ```
//!
//! Headers open nested scopes in that strict order; onsets and
//! durations are rational literals; no blank lines, no commentary.
//! Encoding is pure and deterministic, decoding is strict: anything
//! the grammar does not admit fails with a line-addressed
//! [`ParseError`] rather than being coerced.

pub mod decode;
pub mod encode;

pub use decode::{decode, decode_with_attrs, ParseError, ParseReason};
pub use encode::{encode, encode_scope, TlrScope};

pub(crate) const PART_TAG: &str = "PART";
pub(crate) const VOICE_TAG: &str = "VOICE";
pub(crate) const MEASURE_TAG: &str = "MEASURE";
pub(crate) const NOTE_TAG: &str = "NOTE";
pub(crate) const REST_TAG: &str = "REST";
pub(crate) const HARMONY_TAG: &str = "HARMONY";
pub(crate) const LYRIC_TAG: &str = "LYRIC";
