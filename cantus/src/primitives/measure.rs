//! Measure holds the events of one voice, onset-ordered.
//!
//! A measure enforces its invariants at insertion time: events must
//! arrive in onset order, timed events must not overlap, durations
//! must be positive. Capacity bounds depend on the score's global
//! time signature, which the measure does not know, so
//! [`Measure::validate`] re-checks the full invariant set once the
//! capacity is available.

use fraction::Fraction;

use super::{Event, Harmony, Lyric, Note, Rest};

/// A broken measure invariant: overlap, bad duration, out-of-order
/// or out-of-bounds events.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventIntegrityError {
    #[error("duration must be positive, got {duration} at onset {onset}")]
    NonPositiveDuration { onset: Fraction, duration: Fraction },
    #[error(
        "overlapping events: onset {onset} begins before the \
         previous event ends at {prev_end}"
    )]
    Overlap { onset: Fraction, prev_end: Fraction },
    #[error(
        "events out of onset order: {onset} after {prev_onset}"
    )]
    OutOfOrder {
        onset: Fraction,
        prev_onset: Fraction,
    },
    #[error("duplicate {kind} onset {onset}")]
    DuplicateOnset { kind: &'static str, onset: Fraction },
    #[error("onset {onset} lies outside the measure of capacity {capacity}")]
    OnsetOutOfBounds { onset: Fraction, capacity: Fraction },
    #[error(
        "measure overfilled: an event ends at {end}, past the \
         capacity {capacity}"
    )]
    Overfilled { end: Fraction, capacity: Fraction },
}

/// Ordered sequence of events, identified by a 1-based index unique
/// within its voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    index: u32,
    events: Vec<Event>,
}
impl Measure {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            events: Vec::new(),
        }
    }

    /// Build a measure from events, checking invariants along the way.
    pub fn with_events(
        index: u32,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<Self, EventIntegrityError> {
        let mut measure = Self::new(index);
        for event in events {
            measure.push(event)?;
        }
        Ok(measure)
    }

    pub fn index(&self) -> u32 {
        self.index
    }
    pub fn events(&self) -> &[Event] {
        &self.events
    }
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append an event, enforcing onset order, positive durations and
    /// non-overlap incrementally.
    pub fn push(&mut self, event: Event) -> Result<(), EventIntegrityError> {
        let onset = event.onset();
        if let Some(duration) = event.duration() {
            if duration <= Fraction::new(0u64, 1u64) {
                return Err(EventIntegrityError::NonPositiveDuration {
                    onset,
                    duration,
                });
            }
        }
        if let Some(prev) = self.events.last() {
            if onset < prev.onset() {
                return Err(EventIntegrityError::OutOfOrder {
                    onset,
                    prev_onset: prev.onset(),
                });
            }
        }
        if event.is_timed() {
            if let Some(prev_end) =
                self.events.iter().rev().find_map(Event::end)
            {
                if onset < prev_end {
                    return Err(EventIntegrityError::Overlap {
                        onset,
                        prev_end,
                    });
                }
            }
        } else {
            let duplicate = self
                .events
                .iter()
                .rev()
                .filter(|other| {
                    other.type_name() == event.type_name()
                })
                .any(|other| other.onset() == onset);
            if duplicate {
                return Err(EventIntegrityError::DuplicateOnset {
                    kind: event.type_name(),
                    onset,
                });
            }
        }
        self.events.push(event);
        Ok(())
    }

    /// Full invariant check against a measure capacity: everything
    /// `push` enforces, plus onset bounds and total duration.
    pub fn validate(
        &self,
        capacity: Fraction,
    ) -> Result<(), EventIntegrityError> {
        let mut replay = Measure::new(self.index);
        for event in &self.events {
            if event.onset() >= capacity {
                return Err(EventIntegrityError::OnsetOutOfBounds {
                    onset: event.onset(),
                    capacity,
                });
            }
            if let Some(end) = event.end() {
                if end > capacity {
                    return Err(EventIntegrityError::Overfilled {
                        end,
                        capacity,
                    });
                }
            }
            replay.push(event.clone())?;
        }
        Ok(())
    }

    /// Total duration of notes and rests.
    pub fn timed_duration_sum(&self) -> Fraction {
        self.events
            .iter()
            .filter_map(Event::duration)
            .fold(Fraction::new(0u64, 1u64), |acc, duration| {
                acc + duration
            })
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.events.iter().filter_map(|event| match event {
            Event::Note(note) => Some(note),
            _ => None,
        })
    }
    pub fn rests(&self) -> impl Iterator<Item = &Rest> {
        self.events.iter().filter_map(|event| match event {
            Event::Rest(rest) => Some(rest),
            _ => None,
        })
    }
    pub fn harmonies(&self) -> impl Iterator<Item = &Harmony> {
        self.events.iter().filter_map(|event| match event {
            Event::Harmony(harmony) => Some(harmony),
            _ => None,
        })
    }
    pub fn lyrics(&self) -> impl Iterator<Item = &Lyric> {
        self.events.iter().filter_map(|event| match event {
            Event::Lyric(lyric) => Some(lyric),
            _ => None,
        })
    }
}
