//! Minimal plain-text presentation of a change list.
//!
//! Built purely from the level and category hints, so terminal or
//! HTML renderers can follow the same recipe without re-deriving any
//! semantics from the descriptions.

use super::{DiffEntry, DiffLevel};

/// Indented plain-text rendering, score-level facts flush left and
/// event-level detail nested beneath.
pub fn render_plain(entries: &[DiffEntry]) -> String {
    if entries.is_empty() {
        return "No musical changes.".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let indent = match entry.level {
            DiffLevel::Score => "",
            DiffLevel::Part | DiffLevel::Voice => "  ",
            DiffLevel::Measure => "    ",
            DiffLevel::Event => "      ",
        };
        out.push_str(indent);
        out.push_str("- ");
        out.push_str(&entry.description);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeCategory;

    #[test]
    fn renders_by_level() {
        let entries = vec![
            DiffEntry {
                level: DiffLevel::Score,
                category: ChangeCategory::Pitch,
                description: "Transposed by +2 semitones".to_string(),
                refs: Vec::new(),
            },
            DiffEntry {
                level: DiffLevel::Event,
                category: ChangeCategory::Rhythm,
                description: "Measure 1: duration changed".to_string(),
                refs: Vec::new(),
            },
        ];
        let text = render_plain(&entries);
        assert_eq!(
            text,
            "- Transposed by +2 semitones\n      - Measure 1: duration changed\n"
        );
    }

    #[test]
    fn empty_list_reads_as_no_changes() {
        assert_eq!(render_plain(&[]), "No musical changes.");
    }
}
