//! The hard barrier between a model's creativity and the score.
//!
//! Given the original snapshot, a decoded candidate and the active
//! transformation flags, the validator either accepts the candidate
//! or itemizes every reason it cannot. There is no partial
//! acceptance: on failure the caller keeps the original, whole.
//!
//! Checks run in a fixed order: structural preservation (fatal
//! regardless of flags), event integrity of the candidate, then flag
//! compliance. All categories are checked even after the first hit,
//! so a rejection carries full diagnostics for a retry prompt.

pub mod flags;

use std::fmt;

use fraction::Fraction;

use crate::index::EventPath;
use crate::primitives::{
    Event, EventIntegrityError, Harmony, Lyric, Measure, Note,
};
use crate::score::Score;

pub use flags::{TransformFlag, TransformFlags, UnknownFlag};

/// Where in the tree a violation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Score,
    Part {
        part: usize,
    },
    Measure {
        part: usize,
        voice: usize,
        measure: u32,
    },
    Event(EventPath),
}
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Score => write!(f, "score"),
            Location::Part { part } => write!(f, "Part={part}"),
            Location::Measure {
                part,
                voice,
                measure,
            } => {
                write!(
                    f,
                    "Part={part}/Voice={voice}/Measure={measure}"
                )
            }
            Location::Event(path) => write!(f, "{path}"),
        }
    }
}

/// Part/voice/measure shape or score attributes differ between
/// original and candidate. Always fatal, no flag permits it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralViolation {
    #[error("part count changed: {original} -> {candidate}")]
    PartCount { original: usize, candidate: usize },
    #[error(
        "part {part} renamed: `{original}` -> `{candidate}`"
    )]
    PartName {
        part: usize,
        original: String,
        candidate: String,
    },
    #[error(
        "voice count changed in part `{part}`: {original} -> {candidate}"
    )]
    VoiceCount {
        part: String,
        original: usize,
        candidate: usize,
    },
    #[error(
        "voice identifier changed in part `{part}`: \
         {original} -> {candidate}"
    )]
    VoiceIndex {
        part: String,
        original: u32,
        candidate: u32,
    },
    #[error(
        "measure count changed at {location}: {original} -> {candidate}"
    )]
    MeasureCount {
        location: Location,
        original: usize,
        candidate: usize,
    },
    #[error(
        "measure index changed at {location}: {original} -> {candidate}"
    )]
    MeasureIndex {
        location: Location,
        original: u32,
        candidate: u32,
    },
    #[error("score attributes changed: {0}")]
    Attrs(String),
}

/// A change category showed a diff while its flag is unset, or an
/// active flag's own constraint was broken.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{flag} violation at {location}: {detail}")]
pub struct FlagViolation {
    pub flag: TransformFlag,
    pub location: Location,
    pub detail: String,
}

/// One reason a candidate was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("structural violation: {0}")]
    Structural(#[from] StructuralViolation),
    #[error("event integrity at {location}: {source}")]
    Integrity {
        location: Location,
        source: EventIntegrityError,
    },
    #[error("flag violation: {0}")]
    Flag(#[from] FlagViolation),
}
impl Violation {
    /// The flag a [`Violation::Flag`] refers to.
    pub fn flag(&self) -> Option<TransformFlag> {
        match self {
            Violation::Flag(v) => Some(v.flag),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Violation::Structural(_) => None,
            Violation::Integrity { location, .. } => Some(*location),
            Violation::Flag(v) => Some(v.location),
        }
    }
}

/// Outcome of validating one candidate against one original.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub pass: bool,
    pub violations: Vec<Violation>,
}
impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            pass: violations.is_empty(),
            violations,
        }
    }
}

/// Validate `candidate` as a transformation of `original` under the
/// active `flags`.
pub fn validate(
    original: &Score,
    candidate: &Score,
    flags: TransformFlags,
) -> ValidationResult {
    log::debug!(
        "validating candidate, active flags: [{}]",
        flags
            .iter_set()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let result = Validator {
        original,
        candidate,
        flags,
        violations: Vec::new(),
    }
    .run();
    if result.pass {
        log::debug!("candidate accepted");
    } else {
        log::info!(
            "candidate rejected with {} violation(s)",
            result.violations.len()
        );
    }
    result
}

struct Validator<'a> {
    original: &'a Score,
    candidate: &'a Score,
    flags: TransformFlags,
    violations: Vec<Violation>,
}

/// A note or rest with its position inside the measure event list.
struct Timed<'a> {
    idx: usize,
    onset: Fraction,
    duration: Fraction,
    note: Option<&'a Note>,
}

fn collect_timed(measure: &Measure) -> Vec<Timed<'_>> {
    measure
        .events()
        .iter()
        .enumerate()
        .filter_map(|(idx, event)| match event {
            Event::Note(note) => Some(Timed {
                idx,
                onset: note.onset,
                duration: note.duration,
                note: Some(note),
            }),
            Event::Rest(rest) => Some(Timed {
                idx,
                onset: rest.onset,
                duration: rest.duration,
                note: None,
            }),
            _ => None,
        })
        .collect()
}

fn collect_harmonies(measure: &Measure) -> Vec<(usize, &Harmony)> {
    measure
        .events()
        .iter()
        .enumerate()
        .filter_map(|(idx, event)| match event {
            Event::Harmony(harmony) => Some((idx, harmony)),
            _ => None,
        })
        .collect()
}

fn collect_lyrics(measure: &Measure) -> Vec<(usize, &Lyric)> {
    measure
        .events()
        .iter()
        .enumerate()
        .filter_map(|(idx, event)| match event {
            Event::Lyric(lyric) => Some((idx, lyric)),
            _ => None,
        })
        .collect()
}

/// True when a changed or newly introduced harmony event in the
/// candidate measure governs the given onset, i.e. the pitch edit at
/// that onset is the voicing of a declared harmonic change.
fn covered_by_changed_harmony(
    original: &Measure,
    candidate: &Measure,
    onset: Fraction,
) -> bool {
    let governing = candidate
        .harmonies()
        .filter(|harmony| harmony.onset <= onset)
        .last();
    match governing {
        None => false,
        Some(harmony) => !original.harmonies().any(|other| {
            other.onset == harmony.onset
                && other.symbol == harmony.symbol
                && other.key == harmony.key
        }),
    }
}

impl<'a> Validator<'a> {
    fn run(mut self) -> ValidationResult {
        let structure_ok = self.check_structure();
        self.check_integrity();
        if structure_ok {
            self.check_flags();
        }
        ValidationResult::from_violations(self.violations)
    }

    fn push_structural(&mut self, violation: StructuralViolation) {
        self.violations.push(Violation::Structural(violation));
    }

    fn push_flag(
        &mut self,
        flag: TransformFlag,
        location: Location,
        detail: String,
    ) {
        self.violations.push(Violation::Flag(FlagViolation {
            flag,
            location,
            detail,
        }));
    }

    /// Step 1: part/voice/measure identities and global attributes
    /// must match exactly. Returns false when the shapes differ, in
    /// which case position-addressed flag checks are skipped.
    fn check_structure(&mut self) -> bool {
        let before = self.violations.len();
        let (orig, cand) = (self.original, self.candidate);

        let (oa, ca) = (orig.attrs(), cand.attrs());
        if oa.key != ca.key {
            self.push_structural(StructuralViolation::Attrs(format!(
                "key changed from {} to {}",
                oa.key, ca.key
            )));
        }
        if oa.time != ca.time {
            self.push_structural(StructuralViolation::Attrs(format!(
                "time signature changed from {} to {}",
                oa.time, ca.time
            )));
        }
        if oa.tempo != ca.tempo {
            self.push_structural(StructuralViolation::Attrs(
                "tempo changed".to_string(),
            ));
        }
        if oa.style != ca.style {
            self.push_structural(StructuralViolation::Attrs(
                "style tag changed".to_string(),
            ));
        }

        if orig.parts().len() != cand.parts().len() {
            self.push_structural(StructuralViolation::PartCount {
                original: orig.parts().len(),
                candidate: cand.parts().len(),
            });
            return false;
        }
        for (part_idx, (op, cp)) in
            orig.parts().iter().zip(cand.parts()).enumerate()
        {
            if op.name() != cp.name() {
                self.push_structural(StructuralViolation::PartName {
                    part: part_idx,
                    original: op.name().to_string(),
                    candidate: cp.name().to_string(),
                });
            }
            if op.voices().len() != cp.voices().len() {
                self.push_structural(StructuralViolation::VoiceCount {
                    part: op.name().to_string(),
                    original: op.voices().len(),
                    candidate: cp.voices().len(),
                });
                continue;
            }
            for (voice_idx, (ov, cv)) in
                op.voices().iter().zip(cp.voices()).enumerate()
            {
                if ov.index() != cv.index() {
                    self.push_structural(
                        StructuralViolation::VoiceIndex {
                            part: op.name().to_string(),
                            original: ov.index(),
                            candidate: cv.index(),
                        },
                    );
                }
                if ov.measures().len() != cv.measures().len() {
                    self.push_structural(
                        StructuralViolation::MeasureCount {
                            location: Location::Part { part: part_idx },
                            original: ov.measures().len(),
                            candidate: cv.measures().len(),
                        },
                    );
                    continue;
                }
                for (om, cm) in
                    ov.measures().iter().zip(cv.measures())
                {
                    if om.index() != cm.index() {
                        self.push_structural(
                            StructuralViolation::MeasureIndex {
                                location: Location::Measure {
                                    part: part_idx,
                                    voice: voice_idx,
                                    measure: om.index(),
                                },
                                original: om.index(),
                                candidate: cm.index(),
                            },
                        );
                    }
                }
            }
        }
        self.violations.len() == before
    }

    /// Step 2: every candidate measure must obey the §3 invariants
    /// under the global capacity.
    fn check_integrity(&mut self) {
        let capacity = self.candidate.capacity();
        let candidate = self.candidate;
        for mref in candidate.walk() {
            if let Err(source) = mref.measure.validate(capacity) {
                self.violations.push(Violation::Integrity {
                    location: Location::Measure {
                        part: mref.part,
                        voice: mref.voice,
                        measure: mref.measure.index(),
                    },
                    source,
                });
            }
        }
    }

    /// Step 3: compare measure pairs position by position and gate
    /// every change category on its flag.
    fn check_flags(&mut self) {
        let (orig, cand) = (self.original, self.candidate);
        let mut deltas: Vec<(i32, EventPath)> = Vec::new();
        for (om, cm) in orig.walk().zip(cand.walk()) {
            self.check_measure_pair(
                om.part,
                om.voice,
                om.measure,
                cm.measure,
                &mut deltas,
            );
        }
        if self.flags.transpose {
            if let Some(&(first, _)) = deltas.first() {
                if let Some(&(other, path)) = deltas
                    .iter()
                    .find(|(delta, _)| *delta != first)
                {
                    self.push_flag(
                        TransformFlag::Transpose,
                        Location::Event(path),
                        format!(
                            "transposition must be a single global \
                             interval: found {first:+} and {other:+} \
                             semitones"
                        ),
                    );
                }
            }
        }
    }

    fn check_measure_pair(
        &mut self,
        part: usize,
        voice: usize,
        orig: &Measure,
        cand: &Measure,
        deltas: &mut Vec<(i32, EventPath)>,
    ) {
        let measure = orig.index();
        let measure_loc = Location::Measure {
            part,
            voice,
            measure,
        };
        let path = |event: usize| EventPath {
            part,
            voice,
            measure,
            event,
        };

        let orig_timed = collect_timed(orig);
        let cand_timed = collect_timed(cand);

        // Rhythm: without the flag the onset/duration sequence is
        // frozen; with it, only the per-measure duration sum is.
        if !self.flags.rhythm_simplify {
            if orig_timed.len() != cand_timed.len() {
                self.push_flag(
                    TransformFlag::RhythmSimplify,
                    measure_loc,
                    format!(
                        "note/rest count changed from {} to {}",
                        orig_timed.len(),
                        cand_timed.len()
                    ),
                );
            }
            for (o, c) in orig_timed.iter().zip(&cand_timed) {
                if o.onset != c.onset || o.duration != c.duration {
                    self.push_flag(
                        TransformFlag::RhythmSimplify,
                        Location::Event(path(c.idx)),
                        format!(
                            "timing changed: onset {} dur {} -> \
                             onset {} dur {}",
                            o.onset, o.duration, c.onset, c.duration
                        ),
                    );
                }
            }
        } else {
            let orig_sum = orig.timed_duration_sum();
            let cand_sum = cand.timed_duration_sum();
            if orig_sum != cand_sum {
                self.push_flag(
                    TransformFlag::RhythmSimplify,
                    measure_loc,
                    format!(
                        "total duration changed from {orig_sum} \
                         to {cand_sum}"
                    ),
                );
            }
        }

        // Note <-> rest substitutions are content edits no rhythm or
        // pitch rule covers; they ride on the style flag.
        for (o, c) in orig_timed.iter().zip(&cand_timed) {
            if o.note.is_some() != c.note.is_some()
                && !self.flags.style_change
            {
                let detail = if o.note.is_some() {
                    "note replaced by rest"
                } else {
                    "rest replaced by note"
                };
                self.push_flag(
                    TransformFlag::StyleChange,
                    Location::Event(path(c.idx)),
                    detail.to_string(),
                );
            }
        }

        // Pitch.
        let orig_notes: Vec<(usize, &Note)> = orig_timed
            .iter()
            .filter_map(|t| t.note.map(|n| (t.idx, n)))
            .collect();
        let cand_notes: Vec<(usize, &Note)> = cand_timed
            .iter()
            .filter_map(|t| t.note.map(|n| (t.idx, n)))
            .collect();
        for ((_, on), (ci, cn)) in
            orig_notes.iter().zip(&cand_notes)
        {
            let delta = cn.pitch.semitones_from(&on.pitch);
            let event_path = path(*ci);
            deltas.push((delta, event_path));
            if delta != 0 && !self.flags.transpose {
                if self.flags.harmonic_reharm {
                    if !covered_by_changed_harmony(
                        orig, cand, cn.onset,
                    ) {
                        self.push_flag(
                            TransformFlag::HarmonicReharm,
                            Location::Event(event_path),
                            format!(
                                "pitch changed from {} to {} with \
                                 no governing harmony event \
                                 declaring the new function",
                                on.pitch, cn.pitch
                            ),
                        );
                    }
                } else {
                    self.push_flag(
                        TransformFlag::Transpose,
                        Location::Event(event_path),
                        format!(
                            "pitch changed from {} to {}",
                            on.pitch, cn.pitch
                        ),
                    );
                }
            }
            if on.tie != cn.tie && !self.flags.style_change {
                self.push_flag(
                    TransformFlag::StyleChange,
                    Location::Event(event_path),
                    "tie marking changed".to_string(),
                );
            }
        }

        // Harmony events.
        if !self.flags.harmonic_reharm {
            let orig_harm = collect_harmonies(orig);
            let cand_harm = collect_harmonies(cand);
            for ((_, oh), (ci, ch)) in
                orig_harm.iter().zip(&cand_harm)
            {
                if oh.onset != ch.onset
                    || oh.symbol != ch.symbol
                    || oh.key != ch.key
                {
                    self.push_flag(
                        TransformFlag::HarmonicReharm,
                        Location::Event(path(*ci)),
                        format!(
                            "harmony changed from {} to {}",
                            oh.symbol, ch.symbol
                        ),
                    );
                }
            }
            if orig_harm.len() != cand_harm.len() {
                self.push_flag(
                    TransformFlag::HarmonicReharm,
                    measure_loc,
                    format!(
                        "harmony event count changed from {} to {}",
                        orig_harm.len(),
                        cand_harm.len()
                    ),
                );
            }
        }

        // Lyrics and other additions ride on the style flag.
        if !self.flags.style_change {
            let orig_lyr = collect_lyrics(orig);
            let cand_lyr = collect_lyrics(cand);
            for ((_, ol), (ci, cl)) in
                orig_lyr.iter().zip(&cand_lyr)
            {
                if ol.onset != cl.onset || ol.text != cl.text {
                    self.push_flag(
                        TransformFlag::StyleChange,
                        Location::Event(path(*ci)),
                        format!(
                            "lyric changed from `{}` to `{}`",
                            ol.text, cl.text
                        ),
                    );
                }
            }
            if orig_lyr.len() != cand_lyr.len() {
                self.push_flag(
                    TransformFlag::StyleChange,
                    measure_loc,
                    format!(
                        "lyric count changed from {} to {}",
                        orig_lyr.len(),
                        cand_lyr.len()
                    ),
                );
            }
        }
    }
}
