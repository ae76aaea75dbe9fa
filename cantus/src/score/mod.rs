//! The canonical score tree: Score -> Part -> Voice -> Measure.
//!
//! Trees are created fresh from a host's score reader or from TLR
//! decoding, and are only ever updated functionally: an edit produces
//! a new tree, so an "original" and a "candidate" snapshot can never
//! alias each other. That is what makes atomic accept/reject and
//! diffing safe.

use fraction::Fraction;

use crate::primitives::{
    Accidental, Event, Key, Measure, Mode, Note, Step, TimeSignature,
};

/// A structurally invalid tree under construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("a score must contain at least one part")]
    EmptyScore,
    #[error(
        "voice index {index} is not above the previous voice \
         {previous} in part `{part}`"
    )]
    VoiceOrder {
        part: String,
        index: u32,
        previous: u32,
    },
    #[error("measure indices are 1-based, got 0")]
    MeasureIndexZero,
    #[error(
        "measure index {index} is not above the previous measure \
         {previous}"
    )]
    MeasureOrder { index: u32, previous: u32 },
}

/// Global attributes of a score: key, meter, optional tempo and
/// style tag. The TLR surface deliberately omits these, so a decoded
/// candidate inherits them from the original snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAttrs {
    pub key: Key,
    pub time: TimeSignature,
    /// Beats per minute.
    pub tempo: Option<u32>,
    pub style: Option<String>,
}
impl Default for ScoreAttrs {
    fn default() -> Self {
        Self {
            key: Key::new(Step::C, Accidental::Natural, Mode::Major),
            time: TimeSignature::new(4, 4),
            tempo: None,
            style: None,
        }
    }
}

/// Ordered measures of one melodic line, identified by an index
/// unique within its part.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    index: u32,
    measures: Vec<Measure>,
}
impl Voice {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            measures: Vec::new(),
        }
    }
    pub fn index(&self) -> u32 {
        self.index
    }
    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }
    pub(crate) fn measures_mut(&mut self) -> &mut Vec<Measure> {
        &mut self.measures
    }

    /// Append a measure; indices must be 1-based and strictly
    /// increasing.
    pub fn push_measure(
        &mut self,
        measure: Measure,
    ) -> Result<(), ScoreError> {
        if measure.index() == 0 {
            return Err(ScoreError::MeasureIndexZero);
        }
        if let Some(previous) = self.measures.last() {
            if measure.index() <= previous.index() {
                return Err(ScoreError::MeasureOrder {
                    index: measure.index(),
                    previous: previous.index(),
                });
            }
        }
        self.measures.push(measure);
        Ok(())
    }
}

/// A named voice group, e.g. "Soprano". Owned exclusively by its
/// score.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    name: String,
    voices: Vec<Voice>,
}
impl Part {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            voices: Vec::new(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
    pub(crate) fn voices_mut(&mut self) -> &mut Vec<Voice> {
        &mut self.voices
    }

    /// Append a voice; indices must be strictly increasing within
    /// the part.
    pub fn push_voice(&mut self, voice: Voice) -> Result<(), ScoreError> {
        if let Some(previous) = self.voices.last() {
            if voice.index() <= previous.index() {
                return Err(ScoreError::VoiceOrder {
                    part: self.name.clone(),
                    index: voice.index(),
                    previous: previous.index(),
                });
            }
        }
        self.voices.push(voice);
        Ok(())
    }
}

/// One measure in its structural context, yielded by [`Score::walk`].
#[derive(Debug, Clone, Copy)]
pub struct MeasureRef<'a> {
    pub part: usize,
    pub part_name: &'a str,
    pub voice: usize,
    pub voice_index: u32,
    pub measure: &'a Measure,
}

/// An immutable score snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    attrs: ScoreAttrs,
    parts: Vec<Part>,
}
impl Score {
    /// A score holds at least one part.
    pub fn new(
        attrs: ScoreAttrs,
        parts: Vec<Part>,
    ) -> Result<Self, ScoreError> {
        if parts.is_empty() {
            return Err(ScoreError::EmptyScore);
        }
        Ok(Self { attrs, parts })
    }

    pub fn attrs(&self) -> &ScoreAttrs {
        &self.attrs
    }
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Measure capacity under the global time signature.
    pub fn capacity(&self) -> Fraction {
        self.attrs.time.capacity()
    }

    /// Functional update: same parts, new attributes.
    pub fn with_attrs(&self, attrs: ScoreAttrs) -> Score {
        Score {
            attrs,
            parts: self.parts.clone(),
        }
    }

    /// Functional update: every note shifted by `semitones`, with
    /// deterministic respelling. The receiver is untouched.
    pub fn transposed(&self, semitones: i32) -> Score {
        let mut next = self.clone();
        for part in &mut next.parts {
            for voice in &mut part.voices {
                for measure in &mut voice.measures {
                    *measure = transpose_measure(measure, semitones);
                }
            }
        }
        next
    }

    /// Depth-first traversal over all measures with their structural
    /// coordinates, in part -> voice -> measure order.
    pub fn walk(&self) -> impl Iterator<Item = MeasureRef<'_>> {
        self.parts.iter().enumerate().flat_map(|(part_idx, part)| {
            part.voices().iter().enumerate().flat_map(
                move |(voice_idx, voice)| {
                    voice.measures().iter().map(move |measure| {
                        MeasureRef {
                            part: part_idx,
                            part_name: part.name(),
                            voice: voice_idx,
                            voice_index: voice.index(),
                            measure,
                        }
                    })
                },
            )
        })
    }
}

fn transpose_measure(measure: &Measure, semitones: i32) -> Measure {
    let mut next = Measure::new(measure.index());
    for event in measure.events() {
        let event = match event {
            Event::Note(note) => Event::Note(Note {
                pitch: note.pitch.transposed(semitones),
                ..note.clone()
            }),
            other => other.clone(),
        };
        // Transposition never moves an event, so the invariants the
        // source measure already satisfied cannot break here.
        if let Err(err) = next.push(event) {
            unreachable!(
                "transposition broke measure invariants: {err}"
            );
        }
    }
    next
}
