//! Explain, in musical terms, what changed between two snapshots.
//!
//! The analyzer assumes both trees already share one shape (the
//! validator guarantees that for accepted candidates) and walks them
//! in a fixed order: score-level facts first, then measures in
//! part/voice/measure order, events in onset order. Wording is
//! deterministic and restricted to musical vocabulary: note values,
//! interval names, pitch names, chord symbols. Raw fractions, XML
//! and internal IDs never appear in a description; IDs ride in the
//! `refs` field for programmatic cross-reference.

pub mod report;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::index::{EventId, EventIndex, EventPath};
use crate::primitives::{
    beat_label, duration_name, interval_phrase, Harmony, Lyric, Measure,
    TimeSignature,
};
use crate::score::{Score, ScoreAttrs};

/// Level of the tree a diff entry describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum DiffLevel {
    Score,
    Part,
    Voice,
    Measure,
    Event,
}

/// Renderer-agnostic grouping hint for a diff entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum ChangeCategory {
    Structure,
    Meta,
    Pitch,
    Rhythm,
    Harmony,
    Lyric,
    Style,
}

/// One musically-phrased change.
///
/// `refs` resolve against the *after* snapshot's event index, except
/// entries describing removed content, which refer into *before*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub level: DiffLevel,
    pub category: ChangeCategory,
    pub description: String,
    pub refs: Vec<EventId>,
}
impl DiffEntry {
    fn new(
        level: DiffLevel,
        category: ChangeCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            description: description.into(),
            refs: Vec::new(),
        }
    }
    fn with_refs(mut self, refs: Vec<EventId>) -> Self {
        self.refs = refs;
        self
    }
}

/// The two trees do not share a shape: a precondition was broken
/// upstream (the validator would have rejected this candidate), so
/// the surrounding request should fail rather than guess.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot diff scores of different shape: {0}")]
pub struct DiffInconsistency(pub String);

/// Compare two same-shaped snapshots and produce the ordered change
/// list. `diff(s, s)` is empty; the same inputs always produce the
/// same entries, grouping and wording.
pub fn diff(
    before: &Score,
    after: &Score,
) -> Result<Vec<DiffEntry>, DiffInconsistency> {
    check_shape(before, after)?;
    let before_index = EventIndex::build(before);
    let after_index = EventIndex::build(after);
    let mut entries = Vec::new();

    diff_attrs(before.attrs(), after.attrs(), &mut entries);

    let transposition = global_transposition(before, after);
    if let Some(semitones) = transposition {
        entries.push(DiffEntry::new(
            DiffLevel::Score,
            ChangeCategory::Pitch,
            format!("Transposed by {semitones:+} semitones"),
        ));
    }

    let time = &after.attrs().time;
    for (bm, am) in before.walk().zip(after.walk()) {
        let ctx = MeasureCtx {
            part: bm.part,
            voice: bm.voice,
            measure: bm.measure.index(),
            time,
            before_index: &before_index,
            after_index: &after_index,
            suppress_pitch: transposition.is_some(),
        };
        diff_measure(&ctx, bm.measure, am.measure, &mut entries);
    }
    Ok(entries)
}

fn check_shape(
    before: &Score,
    after: &Score,
) -> Result<(), DiffInconsistency> {
    if before.parts().len() != after.parts().len() {
        return Err(DiffInconsistency(format!(
            "part count {} vs {}",
            before.parts().len(),
            after.parts().len()
        )));
    }
    for (bp, ap) in before.parts().iter().zip(after.parts()) {
        if bp.name() != ap.name() {
            return Err(DiffInconsistency(format!(
                "part `{}` vs `{}`",
                bp.name(),
                ap.name()
            )));
        }
        if bp.voices().len() != ap.voices().len() {
            return Err(DiffInconsistency(format!(
                "voice count in part `{}`",
                bp.name()
            )));
        }
        for (bv, av) in bp.voices().iter().zip(ap.voices()) {
            if bv.index() != av.index()
                || bv.measures().len() != av.measures().len()
            {
                return Err(DiffInconsistency(format!(
                    "voice {} shape in part `{}`",
                    bv.index(),
                    bp.name()
                )));
            }
            for (bm, am) in
                bv.measures().iter().zip(av.measures())
            {
                if bm.index() != am.index() {
                    return Err(DiffInconsistency(format!(
                        "measure index {} vs {}",
                        bm.index(),
                        am.index()
                    )));
                }
            }
        }
    }
    Ok(())
}

fn diff_attrs(
    before: &ScoreAttrs,
    after: &ScoreAttrs,
    entries: &mut Vec<DiffEntry>,
) {
    if before.key != after.key {
        entries.push(DiffEntry::new(
            DiffLevel::Score,
            ChangeCategory::Meta,
            format!(
                "Key changed from {} to {}",
                before.key, after.key
            ),
        ));
    }
    if before.time != after.time {
        entries.push(DiffEntry::new(
            DiffLevel::Score,
            ChangeCategory::Meta,
            format!(
                "Meter changed from {} to {}",
                before.time, after.time
            ),
        ));
    }
    match (before.tempo, after.tempo) {
        (Some(b), Some(a)) if b != a => {
            entries.push(DiffEntry::new(
                DiffLevel::Score,
                ChangeCategory::Meta,
                format!("Tempo changed from {b} to {a} BPM"),
            ));
        }
        (None, Some(a)) => {
            entries.push(DiffEntry::new(
                DiffLevel::Score,
                ChangeCategory::Meta,
                format!("Tempo set to {a} BPM"),
            ));
        }
        (Some(_), None) => {
            entries.push(DiffEntry::new(
                DiffLevel::Score,
                ChangeCategory::Meta,
                "Tempo marking removed".to_string(),
            ));
        }
        _ => {}
    }
    match (&before.style, &after.style) {
        (Some(b), Some(a)) if b != a => {
            entries.push(DiffEntry::new(
                DiffLevel::Score,
                ChangeCategory::Style,
                format!("Style adapted from {b} to {a}"),
            ));
        }
        (None, Some(a)) => {
            entries.push(DiffEntry::new(
                DiffLevel::Score,
                ChangeCategory::Style,
                format!("Style tagged as {a}"),
            ));
        }
        (Some(b), None) => {
            entries.push(DiffEntry::new(
                DiffLevel::Score,
                ChangeCategory::Style,
                format!("Style tag {b} removed"),
            ));
        }
        _ => {}
    }
}

/// The single uniform semitone delta over every note pair, if there
/// is one and it is nonzero. Requires matched note counts in every
/// measure, otherwise a global claim would paper over added or
/// dropped notes.
fn global_transposition(before: &Score, after: &Score) -> Option<i32> {
    let mut delta: Option<i32> = None;
    for (bm, am) in before.walk().zip(after.walk()) {
        let b_notes: Vec<_> = bm.measure.notes().collect();
        let a_notes: Vec<_> = am.measure.notes().collect();
        if b_notes.len() != a_notes.len() {
            return None;
        }
        for (b, a) in b_notes.iter().zip(&a_notes) {
            let d = a.pitch.semitones_from(&b.pitch);
            match delta {
                None => delta = Some(d),
                Some(previous) if previous != d => return None,
                Some(_) => {}
            }
        }
    }
    delta.filter(|d| *d != 0)
}

struct MeasureCtx<'a> {
    part: usize,
    voice: usize,
    measure: u32,
    time: &'a TimeSignature,
    before_index: &'a EventIndex,
    after_index: &'a EventIndex,
    suppress_pitch: bool,
}
impl MeasureCtx<'_> {
    fn before_ref(&self, event: usize) -> Vec<EventId> {
        self.before_index
            .id(&self.path(event))
            .into_iter()
            .collect()
    }
    fn after_ref(&self, event: usize) -> Vec<EventId> {
        self.after_index
            .id(&self.path(event))
            .into_iter()
            .collect()
    }
    fn path(&self, event: usize) -> EventPath {
        EventPath {
            part: self.part,
            voice: self.voice,
            measure: self.measure,
            event,
        }
    }
}

fn diff_measure(
    ctx: &MeasureCtx<'_>,
    before: &Measure,
    after: &Measure,
    entries: &mut Vec<DiffEntry>,
) {
    diff_timed(ctx, before, after, entries);
    diff_harmonies(ctx, before, after, entries);
    diff_lyrics(ctx, before, after, entries);
}

struct TimedView<'a> {
    idx: usize,
    event: &'a crate::primitives::Event,
}

fn timed_views(measure: &Measure) -> Vec<TimedView<'_>> {
    measure
        .events()
        .iter()
        .enumerate()
        .filter(|(_, event)| event.is_timed())
        .map(|(idx, event)| TimedView { idx, event })
        .collect()
}

fn timed_pattern(measure: &Measure) -> String {
    let pattern = measure
        .events()
        .iter()
        .filter_map(|event| event.duration())
        .map(duration_name)
        .join(" + ");
    if pattern.is_empty() {
        "silence".to_string()
    } else {
        pattern
    }
}

fn describe_timed(event: &crate::primitives::Event) -> String {
    use crate::primitives::Event;
    match event {
        Event::Note(note) => format!(
            "{} {}",
            duration_name(note.duration),
            note.pitch
        ),
        Event::Rest(rest) => {
            format!("{} rest", duration_name(rest.duration))
        }
        other => other.type_name().to_lowercase(),
    }
}

fn diff_timed(
    ctx: &MeasureCtx<'_>,
    before: &Measure,
    after: &Measure,
    entries: &mut Vec<DiffEntry>,
) {
    use crate::primitives::Event;

    let b = timed_views(before);
    let a = timed_views(after);

    if b.len() != a.len() {
        let sums_equal =
            before.timed_duration_sum() == after.timed_duration_sum();
        if sums_equal {
            // One grouped entry instead of add/remove noise: the
            // measure still fills the same span, its rhythm was
            // regrouped.
            let refs = a
                .iter()
                .flat_map(|view| ctx.after_ref(view.idx))
                .collect();
            entries.push(
                DiffEntry::new(
                    DiffLevel::Measure,
                    ChangeCategory::Rhythm,
                    format!(
                        "Measure {}: rhythm changed from {} to {}",
                        ctx.measure,
                        timed_pattern(before),
                        timed_pattern(after)
                    ),
                )
                .with_refs(refs),
            );
        } else {
            for view in a.iter().skip(b.len()) {
                entries.push(
                    DiffEntry::new(
                        DiffLevel::Event,
                        ChangeCategory::Style,
                        format!(
                            "Measure {}: added {} on {}",
                            ctx.measure,
                            describe_timed(view.event),
                            beat_label(view.event.onset(), ctx.time)
                        ),
                    )
                    .with_refs(ctx.after_ref(view.idx)),
                );
            }
            for view in b.iter().skip(a.len()) {
                entries.push(
                    DiffEntry::new(
                        DiffLevel::Event,
                        ChangeCategory::Style,
                        format!(
                            "Measure {}: removed {} from {}",
                            ctx.measure,
                            describe_timed(view.event),
                            beat_label(view.event.onset(), ctx.time)
                        ),
                    )
                    .with_refs(ctx.before_ref(view.idx)),
                );
            }
        }
        return;
    }

    for (bv, av) in b.iter().zip(&a) {
        match (bv.event, av.event) {
            (Event::Note(bn), Event::Note(an)) => {
                let pitch_changed = bn.pitch != an.pitch;
                let duration_changed = bn.duration != an.duration;
                let onset_changed = bn.onset != an.onset;
                let refs = ctx.after_ref(av.idx);
                if pitch_changed
                    && duration_changed
                    && !ctx.suppress_pitch
                {
                    entries.push(
                        DiffEntry::new(
                            DiffLevel::Event,
                            ChangeCategory::Pitch,
                            format!(
                                "Measure {}: note changed from {} {} \
                                 to {} {}",
                                ctx.measure,
                                duration_name(bn.duration),
                                bn.pitch,
                                duration_name(an.duration),
                                an.pitch
                            ),
                        )
                        .with_refs(refs),
                    );
                } else {
                    if pitch_changed && !ctx.suppress_pitch {
                        let delta =
                            an.pitch.semitones_from(&bn.pitch);
                        entries.push(
                            DiffEntry::new(
                                DiffLevel::Event,
                                ChangeCategory::Pitch,
                                format!(
                                    "Measure {}: pitch changed from \
                                     {} to {} ({})",
                                    ctx.measure,
                                    bn.pitch,
                                    an.pitch,
                                    interval_phrase(delta)
                                ),
                            )
                            .with_refs(refs.clone()),
                        );
                    }
                    if duration_changed {
                        entries.push(
                            DiffEntry::new(
                                DiffLevel::Event,
                                ChangeCategory::Rhythm,
                                format!(
                                    "Measure {}: duration changed \
                                     from {} to {}",
                                    ctx.measure,
                                    duration_name(bn.duration),
                                    duration_name(an.duration)
                                ),
                            )
                            .with_refs(refs.clone()),
                        );
                    }
                    if onset_changed && !duration_changed {
                        entries.push(
                            DiffEntry::new(
                                DiffLevel::Event,
                                ChangeCategory::Rhythm,
                                format!(
                                    "Measure {}: {} moved from {} \
                                     to {}",
                                    ctx.measure,
                                    describe_timed(av.event),
                                    beat_label(bn.onset, ctx.time),
                                    beat_label(an.onset, ctx.time)
                                ),
                            )
                            .with_refs(refs.clone()),
                        );
                    }
                }
                if bn.tie != an.tie {
                    let detail = match an.tie {
                        Some(_) => "tie added",
                        None => "tie removed",
                    };
                    entries.push(
                        DiffEntry::new(
                            DiffLevel::Event,
                            ChangeCategory::Style,
                            format!(
                                "Measure {}: {} on {}",
                                ctx.measure, detail, an.pitch
                            ),
                        )
                        .with_refs(ctx.after_ref(av.idx)),
                    );
                }
            }
            (Event::Rest(br), Event::Rest(ar)) => {
                if br.duration != ar.duration {
                    entries.push(
                        DiffEntry::new(
                            DiffLevel::Event,
                            ChangeCategory::Rhythm,
                            format!(
                                "Measure {}: rest changed from {} \
                                 to {}",
                                ctx.measure,
                                duration_name(br.duration),
                                duration_name(ar.duration)
                            ),
                        )
                        .with_refs(ctx.after_ref(av.idx)),
                    );
                }
            }
            (b_ev, a_ev) => {
                entries.push(
                    DiffEntry::new(
                        DiffLevel::Event,
                        ChangeCategory::Style,
                        format!(
                            "Measure {}: {} replaced by {}",
                            ctx.measure,
                            describe_timed(b_ev),
                            describe_timed(a_ev)
                        ),
                    )
                    .with_refs(ctx.after_ref(av.idx)),
                );
            }
        }
    }
}

fn harmony_label(harmony: &Harmony) -> String {
    match &harmony.key {
        Some(key) => format!("{} (in {})", harmony.symbol, key),
        None => harmony.symbol.clone(),
    }
}

fn diff_harmonies(
    ctx: &MeasureCtx<'_>,
    before: &Measure,
    after: &Measure,
    entries: &mut Vec<DiffEntry>,
) {
    let b: Vec<(usize, &Harmony)> = before
        .events()
        .iter()
        .enumerate()
        .filter_map(|(idx, event)| match event {
            crate::primitives::Event::Harmony(h) => Some((idx, h)),
            _ => None,
        })
        .collect();
    let a: Vec<(usize, &Harmony)> = after
        .events()
        .iter()
        .enumerate()
        .filter_map(|(idx, event)| match event {
            crate::primitives::Event::Harmony(h) => Some((idx, h)),
            _ => None,
        })
        .collect();

    let (mut bi, mut ai) = (0, 0);
    while bi < b.len() || ai < a.len() {
        match (b.get(bi), a.get(ai)) {
            (Some(&(_, bh)), Some(&(aidx, ah)))
                if bh.onset == ah.onset =>
            {
                if bh.symbol != ah.symbol || bh.key != ah.key {
                    entries.push(
                        DiffEntry::new(
                            DiffLevel::Event,
                            ChangeCategory::Harmony,
                            format!(
                                "Measure {}: harmony changed from \
                                 {} to {} on {}",
                                ctx.measure,
                                harmony_label(bh),
                                harmony_label(ah),
                                beat_label(ah.onset, ctx.time)
                            ),
                        )
                        .with_refs(ctx.after_ref(aidx)),
                    );
                }
                bi += 1;
                ai += 1;
            }
            (Some(&(bidx, bh)), Some(&(_, ah)))
                if bh.onset < ah.onset =>
            {
                entries.push(removed_harmony(ctx, bidx, bh));
                bi += 1;
            }
            (Some(_), Some(&(aidx, ah))) => {
                entries.push(added_harmony(ctx, aidx, ah));
                ai += 1;
            }
            (Some(&(bidx, bh)), None) => {
                entries.push(removed_harmony(ctx, bidx, bh));
                bi += 1;
            }
            (None, Some(&(aidx, ah))) => {
                entries.push(added_harmony(ctx, aidx, ah));
                ai += 1;
            }
            (None, None) => break,
        }
    }
}

fn added_harmony(
    ctx: &MeasureCtx<'_>,
    idx: usize,
    harmony: &Harmony,
) -> DiffEntry {
    DiffEntry::new(
        DiffLevel::Event,
        ChangeCategory::Harmony,
        format!(
            "Measure {}: added harmony {} on {}",
            ctx.measure,
            harmony_label(harmony),
            beat_label(harmony.onset, ctx.time)
        ),
    )
    .with_refs(ctx.after_ref(idx))
}

fn removed_harmony(
    ctx: &MeasureCtx<'_>,
    idx: usize,
    harmony: &Harmony,
) -> DiffEntry {
    DiffEntry::new(
        DiffLevel::Event,
        ChangeCategory::Harmony,
        format!(
            "Measure {}: removed harmony {} from {}",
            ctx.measure,
            harmony_label(harmony),
            beat_label(harmony.onset, ctx.time)
        ),
    )
    .with_refs(ctx.before_ref(idx))
}

fn diff_lyrics(
    ctx: &MeasureCtx<'_>,
    before: &Measure,
    after: &Measure,
    entries: &mut Vec<DiffEntry>,
) {
    let b: Vec<&Lyric> = before.lyrics().collect();
    let a: Vec<(usize, &Lyric)> = after
        .events()
        .iter()
        .enumerate()
        .filter_map(|(idx, event)| match event {
            crate::primitives::Event::Lyric(l) => Some((idx, l)),
            _ => None,
        })
        .collect();

    for (bl, (aidx, al)) in b.iter().zip(&a) {
        if bl.text != al.text || bl.onset != al.onset {
            entries.push(
                DiffEntry::new(
                    DiffLevel::Event,
                    ChangeCategory::Lyric,
                    format!(
                        "Measure {}: lyric on {} changed from \
                         \"{}\" to \"{}\"",
                        ctx.measure,
                        beat_label(al.onset, ctx.time),
                        bl.text,
                        al.text
                    ),
                )
                .with_refs(ctx.after_ref(*aidx)),
            );
        }
    }
    for (aidx, al) in a.iter().skip(b.len()) {
        entries.push(
            DiffEntry::new(
                DiffLevel::Event,
                ChangeCategory::Lyric,
                format!(
                    "Measure {}: added lyric \"{}\" on {}",
                    ctx.measure,
                    al.text,
                    beat_label(al.onset, ctx.time)
                ),
            )
            .with_refs(ctx.after_ref(*aidx)),
        );
    }
    if b.len() > a.len() {
        for bl in b.iter().skip(a.len()) {
            entries.push(DiffEntry::new(
                DiffLevel::Event,
                ChangeCategory::Lyric,
                format!(
                    "Measure {}: removed lyric \"{}\" from {}",
                    ctx.measure,
                    bl.text,
                    beat_label(bl.onset, ctx.time)
                ),
            ));
        }
    }
}
