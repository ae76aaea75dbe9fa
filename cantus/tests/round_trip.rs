use fraction::Fraction;
use itertools::Itertools;

use cantus::primitives::{
    Event, Harmony, Lyric, Measure, Note, Pitch, Rest, Step, Tie,
    TimeSignature,
};
use cantus::score::{Part, Score, ScoreAttrs, Voice};
use cantus::tlr::{
    decode, decode_with_attrs, encode, encode_scope, ParseReason,
    TlrScope,
};

fn frac(num: u64, den: u64) -> Fraction {
    Fraction::new(num, den)
}

fn choral_attrs() -> ScoreAttrs {
    ScoreAttrs {
        key: "E minor".parse().unwrap(),
        time: TimeSignature::new(4, 4),
        tempo: Some(96),
        style: Some("chorale".to_string()),
    }
}

/// Two parts, one voice each, two measures each, with a harmony
/// annotation, a lyric syllable and a tied note along the way.
fn choral_score() -> Score {
    let mut soprano_m1 = Measure::new(1);
    soprano_m1
        .push(Event::Harmony(Harmony::new(frac(0, 1), "Em")))
        .unwrap();
    soprano_m1
        .push(Event::Lyric(Lyric::new(frac(0, 1), "Ky-")))
        .unwrap();
    soprano_m1
        .push(Event::Note(Note::new(
            frac(0, 1),
            frac(1, 4),
            Pitch::natural(Step::E, 5),
        )))
        .unwrap();
    soprano_m1
        .push(Event::Note(Note::new(
            frac(1, 4),
            frac(1, 4),
            "F#5".parse().unwrap(),
        )))
        .unwrap();
    soprano_m1
        .push(Event::Note(
            Note::new(frac(1, 2), frac(1, 2), Pitch::natural(Step::G, 5))
                .tied(Tie::Start),
        ))
        .unwrap();

    let mut soprano_m2 = Measure::new(2);
    soprano_m2
        .push(Event::Note(
            Note::new(frac(0, 1), frac(1, 4), Pitch::natural(Step::G, 5))
                .tied(Tie::Stop),
        ))
        .unwrap();
    soprano_m2
        .push(Event::Rest(Rest::new(frac(1, 4), frac(3, 4))))
        .unwrap();

    let mut alto_m1 = Measure::new(1);
    alto_m1
        .push(Event::Note(Note::new(
            frac(0, 1),
            frac(1, 2),
            Pitch::natural(Step::B, 4),
        )))
        .unwrap();
    alto_m1
        .push(Event::Note(Note::new(
            frac(1, 2),
            frac(1, 2),
            Pitch::natural(Step::B, 4),
        )))
        .unwrap();
    let mut alto_m2 = Measure::new(2);
    alto_m2
        .push(Event::Rest(Rest::new(frac(0, 1), frac(1, 1))))
        .unwrap();

    let mut soprano_voice = Voice::new(1);
    soprano_voice.push_measure(soprano_m1).unwrap();
    soprano_voice.push_measure(soprano_m2).unwrap();
    let mut soprano = Part::new("Soprano");
    soprano.push_voice(soprano_voice).unwrap();

    let mut alto_voice = Voice::new(1);
    alto_voice.push_measure(alto_m1).unwrap();
    alto_voice.push_measure(alto_m2).unwrap();
    let mut alto = Part::new("Alto");
    alto.push_voice(alto_voice).unwrap();

    Score::new(choral_attrs(), vec![soprano, alto]).unwrap()
}

#[test]
fn encode_is_deterministic() {
    let score = choral_score();
    assert_eq!(encode(&score), encode(&score));
}

#[test]
fn encode_emits_the_fixed_grammar() {
    let score = choral_score();
    let text = encode(&score);
    let expected = [
        "PART Soprano",
        "VOICE 1",
        "MEASURE 1",
        "HARMONY t=0 symbol=Em",
        "LYRIC t=0 text=Ky-",
        "NOTE t=0 dur=1/4 pitch=E5",
        "NOTE t=1/4 dur=1/4 pitch=F#5",
        "NOTE t=1/2 dur=1/2 pitch=G5 tie=start",
        "MEASURE 2",
        "NOTE t=0 dur=1/4 pitch=G5 tie=stop",
        "REST t=1/4 dur=3/4",
        "PART Alto",
        "VOICE 1",
        "MEASURE 1",
        "NOTE t=0 dur=1/2 pitch=B4",
        "NOTE t=1/2 dur=1/2 pitch=B4",
        "MEASURE 2",
        "REST t=0 dur=1",
    ];
    text.trim_end()
        .lines()
        .zip_eq(expected)
        .for_each(|(line, want)| assert_eq!(line, want));
}

#[test]
fn round_trip_identity() {
    let score = choral_score();
    let decoded =
        decode_with_attrs(&encode(&score), choral_attrs()).unwrap();
    assert_eq!(decoded, score);
}

#[test]
fn round_trip_preserves_equivalent_rational_forms() {
    // 2/8 and 1/4 are the same value; the re-encoded text settles on
    // the reduced form and the trees compare equal.
    let first = decode(
        "PART S\nVOICE 1\nMEASURE 1\nNOTE t=0 dur=2/8 pitch=C4\n",
    )
    .unwrap();
    let second = decode(
        "PART S\nVOICE 1\nMEASURE 1\nNOTE t=0 dur=1/4 pitch=C4\n",
    )
    .unwrap();
    assert_eq!(first, second);
    assert!(encode(&first).contains("dur=1/4"));
}

#[test]
fn scope_restricts_parts_and_measures() {
    let score = choral_score();
    let alto_only =
        encode_scope(&score, &TlrScope::all().with_parts(&[1]));
    assert!(alto_only.starts_with("PART Alto"));
    assert!(!alto_only.contains("Soprano"));

    let first_measures = encode_scope(
        &score,
        &TlrScope::all().with_measures(1, 1),
    );
    assert!(first_measures.contains("MEASURE 1"));
    assert!(!first_measures.contains("MEASURE 2"));

    let corner = encode_scope(
        &score,
        &TlrScope::all().with_parts(&[0]).with_measures(2, 2),
    );
    assert!(corner.contains("PART Soprano"));
    assert!(corner.contains("tie=stop"));
    assert!(!corner.contains("PART Alto"));
    assert!(!corner.contains("MEASURE 1"));
}

#[test]
fn scoped_fragments_decode_on_their_own() {
    let score = choral_score();
    let fragment = encode_scope(
        &score,
        &TlrScope::all().with_parts(&[0]).with_measures(1, 1),
    );
    let decoded = decode(&fragment).unwrap();
    assert_eq!(decoded.parts().len(), 1);
    assert_eq!(decoded.parts()[0].name(), "Soprano");
}

#[test]
fn decoder_rejects_line_noise_with_addresses() {
    // A natural-language apology instead of TLR, the classic model
    // failure mode.
    let err = decode("Sorry, I cannot transform this score.\n")
        .unwrap_err();
    assert_eq!(err.line, 1);
    assert!(matches!(err.reason, ParseReason::UnknownLine(_)));

    let err = decode(
        "PART S\nVOICE 1\nMEASURE 1\nNOTE t=0 dur=1/4 pitch=C4\n\
         MEASURE 1\n",
    )
    .unwrap_err();
    assert_eq!(err.line, 5);
    assert!(matches!(err.reason, ParseReason::Structure(_)));

    let err = decode(
        "PART S\nVOICE 1\nMEASURE 1\n\
         NOTE t=1/4 dur=1/4 pitch=C4\nNOTE t=0 dur=1/4 pitch=D4\n",
    )
    .unwrap_err();
    assert_eq!(err.line, 5);
    assert!(matches!(err.reason, ParseReason::Integrity(_)));
}

#[test]
fn decoder_rejects_duplicate_onsets() {
    let err = decode(
        "PART S\nVOICE 1\nMEASURE 1\n\
         HARMONY t=0 symbol=Am\nHARMONY t=0 symbol=F\n",
    )
    .unwrap_err();
    assert_eq!(err.line, 5);
    assert!(matches!(err.reason, ParseReason::Integrity(_)));
}
