//! Parse TLR text back into a score, or fail precisely.
//!
//! The decoder treats its input as untrusted model output: every
//! deviation from the grammar fails with the offending line number
//! and a reason, nothing is silently coerced. Whether the decoded
//! score is a *legal transformation* of some original is not decided
//! here; that is the validator's job.

use fraction::Fraction;

use crate::primitives::{
    parse_rational, Event, EventIntegrityError, Harmony, Lyric, Measure,
    Note, Rest, RationalError,
};
use crate::score::{Part, Score, ScoreAttrs, ScoreError, Voice};

use super::{
    HARMONY_TAG, LYRIC_TAG, MEASURE_TAG, NOTE_TAG, PART_TAG, REST_TAG,
    VOICE_TAG,
};

/// Why a TLR line was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseReason {
    #[error("blank line inside a TLR block")]
    BlankLine,
    #[error("unknown line kind `{0}`")]
    UnknownLine(String),
    #[error("malformed {0} header")]
    MalformedHeader(&'static str),
    #[error("VOICE header before any PART")]
    VoiceOutsidePart,
    #[error("MEASURE header before any VOICE")]
    MeasureOutsideVoice,
    #[error("event line outside any MEASURE")]
    EventOutsideMeasure,
    #[error("expected `{0}=` field")]
    MissingField(&'static str),
    #[error("unexpected trailing field `{0}`")]
    TrailingField(String),
    #[error("{field} is not a rational literal: `{value}`")]
    BadRational { field: &'static str, value: String },
    #[error("onset must not be negative")]
    NegativeOnset,
    #[error("duration must be positive")]
    NonPositiveDuration,
    #[error("invalid pitch literal: `{0}`")]
    BadPitch(String),
    #[error("invalid tie value: `{0}`")]
    BadTie(String),
    #[error("harmony symbol cannot be empty")]
    EmptySymbol,
    #[error("lyric text cannot be empty")]
    EmptyText,
    #[error("PART `{0}` has no voices")]
    PartWithoutVoices(String),
    #[error("VOICE {0} has no measures")]
    VoiceWithoutMeasures(u32),
    #[error("empty TLR block")]
    EmptyBlock,
    #[error(transparent)]
    Integrity(#[from] EventIntegrityError),
    #[error(transparent)]
    Structure(#[from] ScoreError),
}

/// Syntax failure, addressed to the 1-based input line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: ParseReason,
}
impl ParseError {
    fn new(line: usize, reason: impl Into<ParseReason>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Decode a TLR block with default score attributes.
pub fn decode(text: &str) -> Result<Score, ParseError> {
    decode_with_attrs(text, ScoreAttrs::default())
}

/// Decode a TLR block, attaching the given global attributes.
///
/// The TLR surface never carries key/meter/tempo, so the pipeline
/// passes the original snapshot's attributes here; with that,
/// `decode_with_attrs(encode(s), s.attrs().clone()) == s` for every
/// well-formed score `s`.
pub fn decode_with_attrs(
    text: &str,
    attrs: ScoreAttrs,
) -> Result<Score, ParseError> {
    let mut parts: Vec<Part> = Vec::new();
    let mut line_no = 0;
    for raw in text.trim().lines() {
        line_no += 1;
        let line = raw.trim();
        if line.is_empty() {
            return Err(ParseError::new(line_no, ParseReason::BlankLine));
        }
        let tag = line.split_whitespace().next().unwrap_or_default();
        match tag {
            PART_TAG => {
                close_open_scopes(&parts, line_no)?;
                let name = parse_header_value(line, PART_TAG, line_no)?;
                parts.push(Part::new(name));
            }
            VOICE_TAG => {
                let index: u32 = parse_header_value(
                    line, VOICE_TAG, line_no,
                )?
                .parse()
                .map_err(|_| {
                    ParseError::new(
                        line_no,
                        ParseReason::MalformedHeader(VOICE_TAG),
                    )
                })?;
                let part = parts.last_mut().ok_or_else(|| {
                    ParseError::new(
                        line_no,
                        ParseReason::VoiceOutsidePart,
                    )
                })?;
                if let Some(open) = part.voices().last() {
                    if open.measures().is_empty() {
                        return Err(ParseError::new(
                            line_no,
                            ParseReason::VoiceWithoutMeasures(
                                open.index(),
                            ),
                        ));
                    }
                }
                part.push_voice(Voice::new(index))
                    .map_err(|e| ParseError::new(line_no, e))?;
            }
            MEASURE_TAG => {
                let index: u32 = parse_header_value(
                    line,
                    MEASURE_TAG,
                    line_no,
                )?
                .parse()
                .map_err(|_| {
                    ParseError::new(
                        line_no,
                        ParseReason::MalformedHeader(MEASURE_TAG),
                    )
                })?;
                let voice =
                    open_voice(&mut parts).ok_or_else(|| {
                        ParseError::new(
                            line_no,
                            ParseReason::MeasureOutsideVoice,
                        )
                    })?;
                voice
                    .push_measure(Measure::new(index))
                    .map_err(|e| ParseError::new(line_no, e))?;
            }
            NOTE_TAG | REST_TAG | HARMONY_TAG | LYRIC_TAG => {
                let event = parse_event(tag, line, line_no)?;
                let measure =
                    open_measure(&mut parts).ok_or_else(|| {
                        ParseError::new(
                            line_no,
                            ParseReason::EventOutsideMeasure,
                        )
                    })?;
                measure
                    .push(event)
                    .map_err(|e| ParseError::new(line_no, e))?;
            }
            other => {
                return Err(ParseError::new(
                    line_no,
                    ParseReason::UnknownLine(other.to_string()),
                ));
            }
        }
    }
    if line_no == 0 {
        return Err(ParseError::new(1, ParseReason::EmptyBlock));
    }
    close_open_scopes(&parts, line_no)?;
    Score::new(attrs, parts)
        .map_err(|e| ParseError::new(line_no, e))
}

/// Reject a part or voice scope that is about to close while empty.
fn close_open_scopes(
    parts: &[Part],
    line_no: usize,
) -> Result<(), ParseError> {
    let Some(part) = parts.last() else {
        return Ok(());
    };
    match part.voices().last() {
        None => Err(ParseError::new(
            line_no,
            ParseReason::PartWithoutVoices(part.name().to_string()),
        )),
        Some(voice) if voice.measures().is_empty() => {
            Err(ParseError::new(
                line_no,
                ParseReason::VoiceWithoutMeasures(voice.index()),
            ))
        }
        Some(_) => Ok(()),
    }
}

fn open_voice(parts: &mut [Part]) -> Option<&mut Voice> {
    parts.last_mut()?.voices_mut().last_mut()
}

fn open_measure(parts: &mut [Part]) -> Option<&mut Measure> {
    open_voice(parts)?.measures_mut().last_mut()
}

/// `HEADER <value>`: exactly one value token, nothing trailing.
fn parse_header_value<'a>(
    line: &'a str,
    tag: &'static str,
    line_no: usize,
) -> Result<&'a str, ParseError> {
    let mut tokens = line.split_whitespace().skip(1);
    let value = tokens.next().ok_or_else(|| {
        ParseError::new(line_no, ParseReason::MalformedHeader(tag))
    })?;
    if tokens.next().is_some() {
        return Err(ParseError::new(
            line_no,
            ParseReason::MalformedHeader(tag),
        ));
    }
    Ok(value)
}

fn parse_event(
    tag: &str,
    line: &str,
    line_no: usize,
) -> Result<Event, ParseError> {
    match tag {
        NOTE_TAG => parse_note(line, line_no),
        REST_TAG => parse_rest(line, line_no),
        HARMONY_TAG => parse_harmony(line, line_no),
        _ => parse_lyric(line, line_no),
    }
}

fn field_value<'a>(
    token: Option<&'a str>,
    field: &'static str,
    line_no: usize,
) -> Result<&'a str, ParseError> {
    token
        .and_then(|token| {
            token
                .strip_prefix(field)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .ok_or_else(|| {
            ParseError::new(line_no, ParseReason::MissingField(field))
        })
}

fn parse_onset(value: &str, line_no: usize) -> Result<Fraction, ParseError> {
    parse_rational(value).map_err(|err| match err {
        RationalError::Negative => {
            ParseError::new(line_no, ParseReason::NegativeOnset)
        }
        _ => ParseError::new(
            line_no,
            ParseReason::BadRational {
                field: "onset",
                value: value.to_string(),
            },
        ),
    })
}

fn parse_duration(
    value: &str,
    line_no: usize,
) -> Result<Fraction, ParseError> {
    let duration = parse_rational(value).map_err(|err| match err {
        RationalError::Negative => {
            ParseError::new(line_no, ParseReason::NonPositiveDuration)
        }
        _ => ParseError::new(
            line_no,
            ParseReason::BadRational {
                field: "duration",
                value: value.to_string(),
            },
        ),
    })?;
    if duration == Fraction::new(0u64, 1u64) {
        return Err(ParseError::new(
            line_no,
            ParseReason::NonPositiveDuration,
        ));
    }
    Ok(duration)
}

fn no_trailing(
    mut tokens: impl Iterator<Item = impl Into<String>>,
    line_no: usize,
) -> Result<(), ParseError> {
    match tokens.next() {
        Some(extra) => Err(ParseError::new(
            line_no,
            ParseReason::TrailingField(extra.into()),
        )),
        None => Ok(()),
    }
}

fn parse_note(line: &str, line_no: usize) -> Result<Event, ParseError> {
    let mut tokens = line.split_whitespace().skip(1);
    let onset = parse_onset(
        field_value(tokens.next(), "t", line_no)?,
        line_no,
    )?;
    let duration = parse_duration(
        field_value(tokens.next(), "dur", line_no)?,
        line_no,
    )?;
    let pitch_str = field_value(tokens.next(), "pitch", line_no)?;
    let pitch = pitch_str.parse().map_err(|_| {
        ParseError::new(
            line_no,
            ParseReason::BadPitch(pitch_str.to_string()),
        )
    })?;
    let mut note = Note::new(onset, duration, pitch);
    if let Some(token) = tokens.next() {
        let tie_str = field_value(Some(token), "tie", line_no)?;
        let tie = tie_str.parse().map_err(|_| {
            ParseError::new(
                line_no,
                ParseReason::BadTie(tie_str.to_string()),
            )
        })?;
        note = note.tied(tie);
    }
    no_trailing(tokens, line_no)?;
    Ok(Event::Note(note))
}

fn parse_rest(line: &str, line_no: usize) -> Result<Event, ParseError> {
    let mut tokens = line.split_whitespace().skip(1);
    let onset = parse_onset(
        field_value(tokens.next(), "t", line_no)?,
        line_no,
    )?;
    let duration = parse_duration(
        field_value(tokens.next(), "dur", line_no)?,
        line_no,
    )?;
    no_trailing(tokens, line_no)?;
    Ok(Event::Rest(Rest::new(onset, duration)))
}

fn parse_harmony(line: &str, line_no: usize) -> Result<Event, ParseError> {
    // The key context may contain spaces ("E minor"), so it is split
    // off the raw line before tokenizing the head.
    let (head, key) = match line.split_once(" key=") {
        Some((head, key)) => (head, Some(key.trim().to_string())),
        None => (line, None),
    };
    let mut tokens = head.split_whitespace().skip(1);
    let onset = parse_onset(
        field_value(tokens.next(), "t", line_no)?,
        line_no,
    )?;
    let symbol = field_value(tokens.next(), "symbol", line_no)?;
    if symbol.is_empty() {
        return Err(ParseError::new(line_no, ParseReason::EmptySymbol));
    }
    no_trailing(tokens, line_no)?;
    let mut harmony = Harmony::new(onset, symbol);
    if let Some(key) = key {
        if key.is_empty() {
            return Err(ParseError::new(
                line_no,
                ParseReason::MissingField("key"),
            ));
        }
        harmony = harmony.in_key(key);
    }
    Ok(Event::Harmony(harmony))
}

fn parse_lyric(line: &str, line_no: usize) -> Result<Event, ParseError> {
    // Lyric text runs to the end of the line and may contain spaces.
    let (head, text) = match line.split_once("text=") {
        Some((head, text)) => (head, text.trim_end()),
        None => {
            return Err(ParseError::new(
                line_no,
                ParseReason::MissingField("text"),
            ));
        }
    };
    if text.is_empty() {
        return Err(ParseError::new(line_no, ParseReason::EmptyText));
    }
    let mut tokens = head.split_whitespace().skip(1);
    let onset = parse_onset(
        field_value(tokens.next(), "t", line_no)?,
        line_no,
    )?;
    no_trailing(tokens, line_no)?;
    Ok(Event::Lyric(Lyric::new(onset, text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_minimal_block() {
        let score = decode(
            "PART Soprano\nVOICE 1\nMEASURE 1\n\
             NOTE t=0 dur=1/4 pitch=C4\nREST t=1/4 dur=3/4\n",
        )
        .unwrap();
        assert_eq!(score.parts().len(), 1);
        let measure = &score.parts()[0].voices()[0].measures()[0];
        assert_eq!(measure.events().len(), 2);
    }

    #[test]
    fn header_order_is_enforced() {
        let err = decode("VOICE 1\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.reason, ParseReason::VoiceOutsidePart);

        let err = decode("PART S\nMEASURE 1\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.reason, ParseReason::MeasureOutsideVoice);

        let err =
            decode("NOTE t=0 dur=1/4 pitch=C4\n").unwrap_err();
        assert_eq!(err.reason, ParseReason::EventOutsideMeasure);
    }

    #[test]
    fn rejects_empty_scopes() {
        let err = decode("PART S\nPART A\nVOICE 1\nMEASURE 1\n")
            .unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.reason,
            ParseReason::PartWithoutVoices("S".to_string())
        );

        let err = decode("PART S\nVOICE 1\n").unwrap_err();
        assert_eq!(err.reason, ParseReason::VoiceWithoutMeasures(1));
    }

    #[test]
    fn rejects_bad_durations() {
        let err = decode(
            "PART S\nVOICE 1\nMEASURE 1\nNOTE t=0 dur=0 pitch=C4\n",
        )
        .unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.reason, ParseReason::NonPositiveDuration);

        let err = decode(
            "PART S\nVOICE 1\nMEASURE 1\nNOTE t=0 dur=0.25 pitch=C4\n",
        )
        .unwrap_err();
        assert!(matches!(
            err.reason,
            ParseReason::BadRational { field: "duration", .. }
        ));

        let err = decode(
            "PART S\nVOICE 1\nMEASURE 1\nREST t=-1/4 dur=1/4\n",
        )
        .unwrap_err();
        assert_eq!(err.reason, ParseReason::NegativeOnset);
    }

    #[test]
    fn rejects_overlap_incrementally() {
        let err = decode(
            "PART S\nVOICE 1\nMEASURE 1\n\
             NOTE t=0 dur=1/2 pitch=C4\n\
             NOTE t=1/4 dur=1/4 pitch=D4\n",
        )
        .unwrap_err();
        assert_eq!(err.line, 5);
        assert!(matches!(
            err.reason,
            ParseReason::Integrity(EventIntegrityError::Overlap { .. })
        ));
    }

    #[test]
    fn rejects_unknown_lines_and_blanks() {
        let err = decode("PART S\nVOICE 1\nMEASURE 1\nOOPS x\n")
            .unwrap_err();
        assert_eq!(
            err.reason,
            ParseReason::UnknownLine("OOPS".to_string())
        );

        let err =
            decode("PART S\n\nVOICE 1\nMEASURE 1\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.reason, ParseReason::BlankLine);

        assert_eq!(
            decode("").unwrap_err().reason,
            ParseReason::EmptyBlock
        );
    }

    #[test]
    fn lyric_text_and_harmony_key_take_the_rest_of_the_line() {
        let score = decode(
            "PART S\nVOICE 1\nMEASURE 1\n\
             HARMONY t=0 symbol=Am key=E minor\n\
             LYRIC t=0 text=Ky ri e\n",
        )
        .unwrap();
        let measure = &score.parts()[0].voices()[0].measures()[0];
        let harmony = measure.harmonies().next().unwrap();
        assert_eq!(harmony.symbol, "Am");
        assert_eq!(harmony.key.as_deref(), Some("E minor"));
        let lyric = measure.lyrics().next().unwrap();
        assert_eq!(lyric.text, "Ky ri e");
    }

    #[test]
    fn note_tie_field_round_trips() {
        let score = decode(
            "PART S\nVOICE 1\nMEASURE 1\n\
             NOTE t=0 dur=1/4 pitch=C4 tie=start\n",
        )
        .unwrap();
        let note = score.parts()[0].voices()[0].measures()[0]
            .notes()
            .next()
            .unwrap()
            .clone();
        assert_eq!(note.tie, Some(crate::primitives::Tie::Start));

        let err = decode(
            "PART S\nVOICE 1\nMEASURE 1\n\
             NOTE t=0 dur=1/4 pitch=C4 tie=maybe\n",
        )
        .unwrap_err();
        assert_eq!(
            err.reason,
            ParseReason::BadTie("maybe".to_string())
        );
    }
}
