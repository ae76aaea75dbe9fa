//! Transformation permissions.
//!
//! Each flag names one category of change a candidate edit may
//! legally make. Everything outside the active set is rejected by
//! the validator, which is what keeps a creative model inside the
//! musician's request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One named transformation permission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum TransformFlag {
    Transpose,
    RhythmSimplify,
    StyleChange,
    HarmonicReharm,
}
impl TransformFlag {
    pub const ALL: [TransformFlag; 4] = [
        TransformFlag::Transpose,
        TransformFlag::RhythmSimplify,
        TransformFlag::StyleChange,
        TransformFlag::HarmonicReharm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TransformFlag::Transpose => "transpose",
            TransformFlag::RhythmSimplify => "rhythm_simplify",
            TransformFlag::StyleChange => "style_change",
            TransformFlag::HarmonicReharm => "harmonic_reharm",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TransformFlag::Transpose => {
                "Change pitch by semitones (maintain intervals)"
            }
            TransformFlag::RhythmSimplify => {
                "Simplify rhythmic patterns (e.g., dotted to straight)"
            }
            TransformFlag::StyleChange => {
                "Change musical style while preserving essential structure"
            }
            TransformFlag::HarmonicReharm => {
                "Reharmonize while preserving melody"
            }
        }
    }

    fn allowed_changes(&self) -> &'static str {
        match self {
            TransformFlag::Transpose => "pitch spelling, octave",
            TransformFlag::RhythmSimplify => "onset, duration",
            TransformFlag::StyleChange => {
                "event additions, lyrics, articulation"
            }
            TransformFlag::HarmonicReharm => "harmony symbols",
        }
    }

    fn forbidden_changes(&self) -> &'static str {
        match self {
            TransformFlag::Transpose => "onset, duration, structure",
            TransformFlag::RhythmSimplify => "pitch, structure",
            TransformFlag::StyleChange => {
                "part, voice and measure structure"
            }
            TransformFlag::HarmonicReharm => "melody pitch, rhythm",
        }
    }
}
impl fmt::Display for TransformFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transformation flag: `{0}`")]
pub struct UnknownFlag(pub String);

impl FromStr for TransformFlag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformFlag::ALL
            .into_iter()
            .find(|flag| flag.name() == s)
            .ok_or_else(|| UnknownFlag(s.to_string()))
    }
}

/// The active permission set for one transformation request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct TransformFlags {
    pub transpose: bool,
    pub rhythm_simplify: bool,
    pub style_change: bool,
    pub harmonic_reharm: bool,
}
impl TransformFlags {
    /// No permissions: any musical change is rejected.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: TransformFlag) -> Self {
        match flag {
            TransformFlag::Transpose => self.transpose = true,
            TransformFlag::RhythmSimplify => {
                self.rhythm_simplify = true
            }
            TransformFlag::StyleChange => self.style_change = true,
            TransformFlag::HarmonicReharm => {
                self.harmonic_reharm = true
            }
        }
        self
    }

    pub fn is_set(&self, flag: TransformFlag) -> bool {
        match flag {
            TransformFlag::Transpose => self.transpose,
            TransformFlag::RhythmSimplify => self.rhythm_simplify,
            TransformFlag::StyleChange => self.style_change,
            TransformFlag::HarmonicReharm => self.harmonic_reharm,
        }
    }

    pub fn iter_set(&self) -> impl Iterator<Item = TransformFlag> + '_ {
        TransformFlag::ALL
            .into_iter()
            .filter(|flag| self.is_set(*flag))
    }

    pub fn is_empty(&self) -> bool {
        self.iter_set().next().is_none()
    }

    /// Constraint text for the host's model prompt: the allowed and
    /// forbidden change lists of every active flag.
    pub fn prompt_constraints(&self) -> String {
        let mut lines = Vec::new();
        if self.is_empty() {
            lines.push(
                "No transformations are permitted; return the \
                 material unchanged."
                    .to_string(),
            );
            return lines.join("\n");
        }
        lines.push("ALLOWED TRANSFORMATIONS:".to_string());
        for flag in self.iter_set() {
            lines.push(format!(
                "- {}: {}",
                flag.name().to_uppercase(),
                flag.description()
            ));
            lines.push(format!(
                "  Allowed changes: {}",
                flag.allowed_changes()
            ));
            lines.push(format!(
                "  Forbidden changes: {}",
                flag.forbidden_changes()
            ));
        }
        lines.push(String::new());
        lines.push("RULES:".to_string());
        lines.push(
            "- Only perform the explicitly allowed transformations \
             above."
                .to_string(),
        );
        lines.push(
            "- Do not invent creative changes beyond the allowed \
             types."
                .to_string(),
        );
        lines.push(
            "- If multiple flags are set, apply them in combination."
                .to_string(),
        );
        lines.join("\n")
    }
}
