//! Stable event identifiers for diffs and explanations.
//!
//! Indexing walks a score in part -> voice -> measure -> event order
//! and hands out `event_<n>` IDs starting at 1. The walk is the
//! stored order, so re-indexing an unchanged score always yields the
//! same IDs, and two snapshots of the same shape with the same event
//! counts index identically position by position.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Opaque, stable reference to one event, rendered as `event_<n>`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub struct EventId(u32);
impl EventId {
    pub fn number(&self) -> u32 {
        self.0
    }
}
impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid event id: `{0}`")]
pub struct InvalidEventId(pub String);

impl FromStr for EventId {
    type Err = InvalidEventId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("event_")
            .and_then(|n| n.parse().ok())
            .map(EventId)
            .ok_or_else(|| InvalidEventId(s.to_string()))
    }
}

/// Structural address of one event.
///
/// `part` and `voice` are zero-based positions, `measure` is the
/// 1-based measure index, `event` is the zero-based onset-order
/// position within the measure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub struct EventPath {
    pub part: usize,
    pub voice: usize,
    pub measure: u32,
    pub event: usize,
}
impl fmt::Display for EventPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Part={}/Voice={}/Measure={}/Event={}",
            self.part, self.voice, self.measure, self.event
        )
    }
}

/// Total order of stable IDs over every event of one score snapshot.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    paths: Vec<EventPath>,
    ids: HashMap<EventPath, EventId>,
}
impl EventIndex {
    /// Index a score. Stateless: the same tree always produces the
    /// same index.
    pub fn build(score: &Score) -> Self {
        let mut paths = Vec::new();
        let mut ids = HashMap::new();
        for measure_ref in score.walk() {
            for event_idx in 0..measure_ref.measure.events().len() {
                let path = EventPath {
                    part: measure_ref.part,
                    voice: measure_ref.voice,
                    measure: measure_ref.measure.index(),
                    event: event_idx,
                };
                let id = EventId(paths.len() as u32 + 1);
                paths.push(path);
                ids.insert(path, id);
            }
        }
        Self { paths, ids }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn id(&self, path: &EventPath) -> Option<EventId> {
        self.ids.get(path).copied()
    }

    pub fn path(&self, id: EventId) -> Option<EventPath> {
        let slot = (id.0 as usize).checked_sub(1)?;
        self.paths.get(slot).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = EventId> + '_ {
        (1..=self.paths.len() as u32).map(EventId)
    }

    /// Human-readable reference for an indexed event, e.g.
    /// "Soprano, Voice 1, Measure 2, event 1".
    pub fn format_ref(
        &self,
        score: &Score,
        id: EventId,
    ) -> Option<String> {
        let path = self.path(id)?;
        let part = score.parts().get(path.part)?;
        let voice = part.voices().get(path.voice)?;
        Some(format!(
            "{}, Voice {}, Measure {}, event {}",
            part.name(),
            voice.index(),
            path.measure,
            path.event + 1
        ))
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::*;
    use crate::primitives::{Event, Measure, Note, Pitch, Step};
    use crate::score::{Part, ScoreAttrs, Voice};

    fn two_measure_score() -> Score {
        let mut first = Measure::new(1);
        first
            .push(Event::Note(Note::new(
                Fraction::new(0u64, 1u64),
                Fraction::new(1u64, 4u64),
                Pitch::natural(Step::C, 4),
            )))
            .unwrap();
        first
            .push(Event::Note(Note::new(
                Fraction::new(1u64, 4u64),
                Fraction::new(1u64, 4u64),
                Pitch::natural(Step::D, 4),
            )))
            .unwrap();
        let mut second = Measure::new(2);
        second
            .push(Event::Note(Note::new(
                Fraction::new(0u64, 1u64),
                Fraction::new(1u64, 2u64),
                Pitch::natural(Step::E, 4),
            )))
            .unwrap();
        let mut voice = Voice::new(1);
        voice.push_measure(first).unwrap();
        voice.push_measure(second).unwrap();
        let mut part = Part::new("Soprano");
        part.push_voice(voice).unwrap();
        Score::new(ScoreAttrs::default(), vec![part]).unwrap()
    }

    #[test]
    fn ids_are_stable_and_start_at_one() {
        let score = two_measure_score();
        let index = EventIndex::build(&score);
        assert_eq!(index.len(), 3);
        let first = index.ids().next().unwrap();
        assert_eq!(first.to_string(), "event_1");
        assert_eq!(
            index.path(first),
            Some(EventPath {
                part: 0,
                voice: 0,
                measure: 1,
                event: 0
            })
        );

        let again = EventIndex::build(&score);
        let paths: Vec<_> =
            index.ids().filter_map(|id| index.path(id)).collect();
        let paths_again: Vec<_> =
            again.ids().filter_map(|id| again.path(id)).collect();
        assert_eq!(paths, paths_again);
    }

    #[test]
    fn path_display_matches_violation_wording() {
        let path = EventPath {
            part: 0,
            voice: 0,
            measure: 1,
            event: 0,
        };
        assert_eq!(
            path.to_string(),
            "Part=0/Voice=0/Measure=1/Event=0"
        );
    }

    #[test]
    fn format_ref_names_the_position() {
        let score = two_measure_score();
        let index = EventIndex::build(&score);
        let id = index
            .id(&EventPath {
                part: 0,
                voice: 0,
                measure: 2,
                event: 0,
            })
            .unwrap();
        assert_eq!(
            index.format_ref(&score, id).as_deref(),
            Some("Soprano, Voice 1, Measure 2, event 1")
        );
    }

    #[test]
    fn event_id_parses_back() {
        let id: EventId = "event_42".parse().unwrap();
        assert_eq!(id.number(), 42);
        assert!("note_42".parse::<EventId>().is_err());
    }
}
