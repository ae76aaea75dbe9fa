//! Serialize a score (or a sub-scope of it) into TLR text.

use crate::primitives::Event;
use crate::score::Score;

use super::{
    HARMONY_TAG, LYRIC_TAG, MEASURE_TAG, NOTE_TAG, PART_TAG, REST_TAG,
    VOICE_TAG,
};

/// Restriction of the encoded surface to selected parts and/or a
/// measure index range. Headers outside the scope are not emitted at
/// all, so the model never sees material it is not asked to edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlrScope {
    parts: Option<Vec<usize>>,
    measures: Option<(u32, u32)>,
}
impl TlrScope {
    /// The whole score.
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep only the parts at the given zero-based positions.
    pub fn with_parts(mut self, parts: &[usize]) -> Self {
        self.parts = Some(parts.to_vec());
        self
    }

    /// Keep only measures with `first <= index <= last`.
    pub fn with_measures(mut self, first: u32, last: u32) -> Self {
        self.measures = Some((first, last));
        self
    }

    fn includes_part(&self, part: usize) -> bool {
        match &self.parts {
            Some(parts) => parts.contains(&part),
            None => true,
        }
    }

    fn includes_measure(&self, index: u32) -> bool {
        match self.measures {
            Some((first, last)) => first <= index && index <= last,
            None => true,
        }
    }
}

/// Encode a whole score. Deterministic: identical trees always yield
/// identical text, in stored part/voice/measure/event order.
///
/// # Example
/// ```
/// use fraction::Fraction;
/// use cantus::primitives::{Event, Measure, Note, Pitch, Step};
/// use cantus::score::{Part, Score, ScoreAttrs, Voice};
/// use cantus::tlr::encode;
///
/// let mut measure = Measure::new(1);
/// measure
///     .push(Event::Note(Note::new(
///         Fraction::new(0u64, 1u64),
///         Fraction::new(1u64, 4u64),
///         Pitch::natural(Step::C, 4),
///     )))
///     .unwrap();
/// let mut voice = Voice::new(1);
/// voice.push_measure(measure).unwrap();
/// let mut part = Part::new("Soprano");
/// part.push_voice(voice).unwrap();
/// let score = Score::new(ScoreAttrs::default(), vec![part]).unwrap();
///
/// assert_eq!(
///     encode(&score),
///     "PART Soprano\nVOICE 1\nMEASURE 1\nNOTE t=0 dur=1/4 pitch=C4\n"
/// );
/// ```
pub fn encode(score: &Score) -> String {
    encode_scope(score, &TlrScope::all())
}

/// Encode the selected sub-scope of a score.
pub fn encode_scope(score: &Score, scope: &TlrScope) -> String {
    let mut out = String::new();
    for (part_idx, part) in score.parts().iter().enumerate() {
        if !scope.includes_part(part_idx) {
            continue;
        }
        out.push_str(PART_TAG);
        out.push(' ');
        out.push_str(part.name());
        out.push('\n');
        for voice in part.voices() {
            out.push_str(&format!("{} {}\n", VOICE_TAG, voice.index()));
            for measure in voice.measures() {
                if !scope.includes_measure(measure.index()) {
                    continue;
                }
                out.push_str(&format!(
                    "{} {}\n",
                    MEASURE_TAG,
                    measure.index()
                ));
                for event in measure.events() {
                    out.push_str(&event_line(event));
                    out.push('\n');
                }
            }
        }
    }
    out
}

fn event_line(event: &Event) -> String {
    match event {
        Event::Note(note) => {
            let mut line = format!(
                "{} t={} dur={} pitch={}",
                NOTE_TAG, note.onset, note.duration, note.pitch
            );
            if let Some(tie) = note.tie {
                line.push_str(&format!(" tie={tie}"));
            }
            line
        }
        Event::Rest(rest) => {
            format!("{} t={} dur={}", REST_TAG, rest.onset, rest.duration)
        }
        Event::Harmony(harmony) => {
            let mut line = format!(
                "{} t={} symbol={}",
                HARMONY_TAG, harmony.onset, harmony.symbol
            );
            if let Some(key) = &harmony.key {
                line.push_str(&format!(" key={key}"));
            }
            line
        }
        Event::Lyric(lyric) => {
            format!("{} t={} text={}", LYRIC_TAG, lyric.onset, lyric.text)
        }
    }
}
