use fraction::Fraction;

use cantus::pipeline::{
    apply_candidate, run, ModelError, Rejection, TransformOutcome,
};
use cantus::primitives::{Event, Measure, Note, Rest};
use cantus::score::{Part, Score, ScoreAttrs, Voice};
use cantus::tlr::encode;
use cantus::validate::{TransformFlag, TransformFlags};

fn frac(num: u64, den: u64) -> Fraction {
    Fraction::new(num, den)
}

fn scenario_score() -> Score {
    let mut m1 = Measure::new(1);
    m1.push(Event::Note(Note::new(
        frac(0, 1),
        frac(1, 4),
        "C4".parse().unwrap(),
    )))
    .unwrap();
    let mut m2 = Measure::new(2);
    m2.push(Event::Rest(Rest::new(frac(0, 1), frac(1, 1))))
        .unwrap();
    let mut voice = Voice::new(1);
    voice.push_measure(m1).unwrap();
    voice.push_measure(m2).unwrap();
    let mut part = Part::new("Soprano");
    part.push_voice(voice).unwrap();
    Score::new(ScoreAttrs::default(), vec![part]).unwrap()
}

#[test]
fn accepted_candidate_comes_with_its_explanation() {
    let original = scenario_score();
    let flags = TransformFlags::none().with(TransformFlag::Transpose);
    let response = encode(&original.transposed(2));

    let outcome =
        apply_candidate(&original, &response, flags).unwrap();
    match outcome {
        TransformOutcome::Accepted { score, changes } => {
            assert_eq!(score, original.transposed(2));
            assert_eq!(changes.len(), 1);
            assert_eq!(
                changes[0].description,
                "Transposed by +2 semitones"
            );
        }
        TransformOutcome::Rejected(rejection) => {
            panic!("expected acceptance, got {rejection:?}")
        }
    }
}

#[test]
fn accepted_candidate_keeps_the_original_attrs() {
    let original = scenario_score();
    let attrs = ScoreAttrs {
        tempo: Some(84),
        style: Some("chorale".to_string()),
        ..ScoreAttrs::default()
    };
    let original = original.with_attrs(attrs.clone());
    let flags = TransformFlags::none().with(TransformFlag::Transpose);
    let response = encode(&original.transposed(2));

    let outcome =
        apply_candidate(&original, &response, flags).unwrap();
    match outcome {
        TransformOutcome::Accepted { score, .. } => {
            assert_eq!(score.attrs(), &attrs);
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[test]
fn malformed_response_is_a_parse_rejection() {
    let original = scenario_score();
    let snapshot = original.clone();

    let outcome = apply_candidate(
        &original,
        "I transposed it for you!\n",
        TransformFlags::none().with(TransformFlag::Transpose),
    )
    .unwrap();
    assert!(matches!(
        outcome,
        TransformOutcome::Rejected(Rejection::Parse(_))
    ));
    // The caller's snapshot is bit-for-bit what it was.
    assert_eq!(original, snapshot);
}

#[test]
fn creative_overreach_is_a_validation_rejection() {
    let original = scenario_score();
    let snapshot = original.clone();
    // The model transposes even though no flag permits it.
    let response = encode(&original.transposed(2));

    let outcome = apply_candidate(
        &original,
        &response,
        TransformFlags::none(),
    )
    .unwrap();
    match outcome {
        TransformOutcome::Rejected(Rejection::Validation(
            violations,
        )) => {
            assert!(violations
                .iter()
                .any(|v| v.flag() == Some(TransformFlag::Transpose)));
        }
        other => panic!("expected validation rejection, got {other:?}"),
    }
    assert_eq!(original, snapshot);
}

#[test]
fn run_wires_the_model_through_the_pipeline() {
    let original = scenario_score();
    let transposed = encode(&original.transposed(2));
    let flags = TransformFlags::none().with(TransformFlag::Transpose);

    let outcome = run(
        &original,
        "Transpose up a major second.",
        flags,
        |prompt| {
            // The prompt carries the constraint block and the score.
            assert!(prompt.contains("ALLOWED TRANSFORMATIONS:"));
            assert!(prompt.contains("NOTE t=0 dur=1/4 pitch=C4"));
            Ok(transposed.clone())
        },
    )
    .unwrap();
    assert!(matches!(outcome, TransformOutcome::Accepted { .. }));
}

#[test]
fn model_timeout_surfaces_as_rejection() {
    let original = scenario_score();
    let outcome = run(
        &original,
        "anything",
        TransformFlags::none(),
        |_| Err(ModelError("deadline exceeded".to_string())),
    )
    .unwrap();
    assert!(matches!(
        outcome,
        TransformOutcome::Rejected(Rejection::Model(_))
    ));
}

#[test]
fn identity_response_is_accepted_with_no_changes() {
    let original = scenario_score();
    let outcome = apply_candidate(
        &original,
        &encode(&original),
        TransformFlags::none(),
    )
    .unwrap();
    match outcome {
        TransformOutcome::Accepted { score, changes } => {
            assert_eq!(score, original);
            assert!(changes.is_empty());
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}
