//! Representation and validation pipeline for model-assisted choral
//! score transformation.
//!
//! A score lives as an immutable value tree ([`score::Score`]),
//! travels to the language model as a fixed textual grammar
//! ([`tlr`]), comes back through a strict decoder, and is only
//! accepted if the [`validate`] barrier agrees the edit stays inside
//! the musician's explicitly granted transformation flags. Accepted
//! snapshots are explained by the semantic [`diff`] analyzer in
//! musical vocabulary, cross-referenced through stable event IDs
//! ([`index`]).
//!
//! The surrounding system (file parsing, rendering, audio, the model
//! process itself, any UI) stays outside; it talks to this crate
//! through [`pipeline`].

pub mod diff;
pub mod index;
pub mod pipeline;
pub mod primitives;
pub mod score;
pub mod tlr;
pub mod validate;

pub use diff::{
    diff, ChangeCategory, DiffEntry, DiffInconsistency, DiffLevel,
};
pub use index::{EventId, EventIndex, EventPath};
pub use pipeline::{
    apply_candidate, run, ModelError, Rejection, TransformOutcome,
};
pub use score::{Part, Score, ScoreAttrs, ScoreError, Voice};
pub use tlr::{
    decode, decode_with_attrs, encode, encode_scope, ParseError,
    ParseReason, TlrScope,
};
pub use validate::{
    validate, FlagViolation, Location, StructuralViolation,
    TransformFlag, TransformFlags, ValidationResult, Violation,
};
