//! One transformation request, end to end.
//!
//! encode -> (external model) -> decode -> validate -> diff. The
//! model call is an opaque closure supplied by the caller, who also
//! owns timeout and retry policy. Every failure path leaves the
//! caller's original snapshot untouched; acceptance hands back a new
//! tree plus the musically-phrased change list.

use crate::diff::{diff, DiffEntry, DiffInconsistency};
use crate::tlr::{decode_with_attrs, encode, ParseError};
use crate::validate::{validate, TransformFlags, Violation};
use crate::score::Score;

/// Failure of the caller-supplied model invocation (timeout,
/// transport, refusal). Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model invocation failed: {0}")]
pub struct ModelError(pub String);

/// Why a candidate was not accepted. The original snapshot is always
/// retained alongside.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("candidate did not parse: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("candidate rejected with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),
}

/// Result of one transformation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    /// The candidate passed validation; `score` is the new snapshot
    /// and `changes` explains what it changed.
    Accepted {
        score: Score,
        changes: Vec<DiffEntry>,
    },
    /// The candidate was discarded whole; the caller keeps the
    /// original.
    Rejected(Rejection),
}

/// Decode a model response and validate it against `original` under
/// `flags`; diff on acceptance.
///
/// The decoded candidate inherits the original's global attributes,
/// since the TLR surface does not carry them and no flag permits
/// changing them. A [`DiffInconsistency`] can only escape here if
/// validation let a shape change through, which is a defect, not a
/// user-facing rejection.
pub fn apply_candidate(
    original: &Score,
    response: &str,
    flags: TransformFlags,
) -> Result<TransformOutcome, DiffInconsistency> {
    let candidate = match decode_with_attrs(
        response,
        original.attrs().clone(),
    ) {
        Ok(candidate) => candidate,
        Err(err) => {
            log::info!("candidate rejected at decode: {err}");
            return Ok(TransformOutcome::Rejected(Rejection::Parse(
                err,
            )));
        }
    };
    let result = validate(original, &candidate, flags);
    if !result.pass {
        return Ok(TransformOutcome::Rejected(
            Rejection::Validation(result.violations),
        ));
    }
    let changes = diff(original, &candidate)?;
    log::debug!(
        "candidate accepted with {} change(s)",
        changes.len()
    );
    Ok(TransformOutcome::Accepted {
        score: candidate,
        changes,
    })
}

/// Run a whole request: build the prompt, invoke the model, then
/// [`apply_candidate`] on its response.
pub fn run<M>(
    original: &Score,
    request: &str,
    flags: TransformFlags,
    model: M,
) -> Result<TransformOutcome, DiffInconsistency>
where
    M: FnOnce(&str) -> Result<String, ModelError>,
{
    let prompt = build_prompt(request, original, flags);
    match model(&prompt) {
        Ok(response) => apply_candidate(original, &response, flags),
        Err(err) => {
            log::info!("model invocation failed: {err}");
            Ok(TransformOutcome::Rejected(Rejection::Model(err)))
        }
    }
}

/// The request text, the flag constraint block, then the TLR block.
fn build_prompt(
    request: &str,
    original: &Score,
    flags: TransformFlags,
) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        request.trim(),
        flags.prompt_constraints(),
        encode(original)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::TransformFlag;
    use fraction::Fraction;

    use crate::primitives::{Event, Measure, Note, Pitch, Step};
    use crate::score::{Part, ScoreAttrs, Voice};

    fn single_note_score() -> Score {
        let mut measure = Measure::new(1);
        measure
            .push(Event::Note(Note::new(
                Fraction::new(0u64, 1u64),
                Fraction::new(1u64, 4u64),
                Pitch::natural(Step::C, 4),
            )))
            .unwrap();
        let mut voice = Voice::new(1);
        voice.push_measure(measure).unwrap();
        let mut part = Part::new("Soprano");
        part.push_voice(voice).unwrap();
        Score::new(ScoreAttrs::default(), vec![part]).unwrap()
    }

    #[test]
    fn prompt_carries_constraints_and_tlr() {
        let score = single_note_score();
        let flags =
            TransformFlags::none().with(TransformFlag::Transpose);
        let prompt =
            build_prompt("Transpose up a major second.", &score, flags);
        assert!(prompt.starts_with("Transpose up a major second."));
        assert!(prompt.contains("ALLOWED TRANSFORMATIONS:"));
        assert!(prompt.contains("PART Soprano"));
        assert!(prompt.contains("NOTE t=0 dur=1/4 pitch=C4"));
    }

    #[test]
    fn model_failure_is_a_rejection_not_an_error() {
        let score = single_note_score();
        let outcome = run(
            &score,
            "do nothing",
            TransformFlags::none(),
            |_prompt| Err(ModelError("timed out".to_string())),
        )
        .unwrap();
        assert!(matches!(
            outcome,
            TransformOutcome::Rejected(Rejection::Model(_))
        ));
    }
}
