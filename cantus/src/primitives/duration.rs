//! Tools for rational onsets and durations.
//!
//! Onsets and durations are exact fractions of a whole note. The
//! helpers here parse and name them: the TLR grammar only admits
//! rational literals (`0`, `1/4`, `3/8`), and user-facing text only
//! admits note-value vocabulary ("quarter note", "dotted half note").

use fraction::Fraction;

use super::TimeSignature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RationalError {
    #[error("not a rational literal")]
    Malformed,
    #[error("negative values are not allowed")]
    Negative,
    #[error("denominator must be nonzero")]
    ZeroDenominator,
}

/// Parse a TLR rational literal.
///
/// Accepts `<int>` or `<int>/<int>`; rejects floating point, signs
/// and empty fields. The result is automatically reduced, so `2/8`
/// parses equal to `1/4`.
///
/// # Example
/// ```
/// use fraction::Fraction;
/// use cantus::primitives::parse_rational;
/// assert_eq!(parse_rational("3/8"), Ok(Fraction::new(3u64, 8u64)));
/// assert_eq!(parse_rational("0"), Ok(Fraction::new(0u64, 1u64)));
/// assert!(parse_rational("0.25").is_err());
/// ```
pub fn parse_rational(s: &str) -> Result<Fraction, RationalError> {
    if s.starts_with('-') {
        return Err(RationalError::Negative);
    }
    match s.split_once('/') {
        Some((num, den)) => {
            let num: u64 =
                num.parse().map_err(|_| RationalError::Malformed)?;
            let den: u64 =
                den.parse().map_err(|_| RationalError::Malformed)?;
            if den == 0 {
                return Err(RationalError::ZeroDenominator);
            }
            Ok(Fraction::new(num, den))
        }
        None => {
            let num: u64 =
                s.parse().map_err(|_| RationalError::Malformed)?;
            Ok(Fraction::new(num, 1u64))
        }
    }
}

fn plain_name(denominator: u64) -> Option<&'static str> {
    match denominator {
        1 => Some("whole note"),
        2 => Some("half note"),
        4 => Some("quarter note"),
        8 => Some("eighth note"),
        16 => Some("sixteenth note"),
        32 => Some("thirty-second note"),
        64 => Some("sixty-fourth note"),
        128 => Some("hundred-twenty-eighth note"),
        _ => None,
    }
}

/// English note-value name of a duration, whole note = 1.
///
/// Dotted and double-dotted values are recognized; anything else
/// falls back to a fraction of a whole note, which is still exact
/// vocabulary rather than a floating-point artifact.
pub fn duration_name(duration: Fraction) -> String {
    let (num, den) = match (duration.numer(), duration.denom()) {
        (Some(&num), Some(&den)) => (num, den),
        _ => return format!("{duration} of a whole note"),
    };
    let named = match num {
        1 => plain_name(den).map(str::to_string),
        2 if den == 1 => Some("breve".to_string()),
        3 if den == 1 => Some("dotted breve".to_string()),
        3 if den >= 2 => {
            plain_name(den / 2).map(|name| format!("dotted {name}"))
        }
        7 if den >= 4 => plain_name(den / 4)
            .map(|name| format!("double-dotted {name}")),
        _ => None,
    };
    named.unwrap_or_else(|| format!("{num}/{den} of a whole note"))
}

/// Human beat label for an onset under a time signature.
///
/// The beat unit is the signature's denominator: in 4/4, onset `1/4`
/// is "beat 2"; an onset inside a beat is labelled by the beat it
/// falls in.
pub fn beat_label(onset: Fraction, time: &TimeSignature) -> String {
    let beats = onset * Fraction::new(time.denominator as u64, 1u64);
    match (beats.numer(), beats.denom()) {
        (Some(&num), Some(&1)) => format!("beat {}", num + 1),
        (Some(&num), Some(&den)) => format!("beat {}", num / den + 1),
        _ => "beat 1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rational_literals() {
        assert_eq!(
            parse_rational("1/4"),
            Ok(Fraction::new(1u64, 4u64))
        );
        assert_eq!(parse_rational("2/8"), Ok(Fraction::new(1u64, 4u64)));
        assert_eq!(parse_rational("3"), Ok(Fraction::new(3u64, 1u64)));
        assert_eq!(parse_rational("0"), Ok(Fraction::new(0u64, 1u64)));
    }

    #[test]
    fn parse_rational_rejections() {
        assert_eq!(parse_rational("-1/4"), Err(RationalError::Negative));
        assert_eq!(
            parse_rational("1/0"),
            Err(RationalError::ZeroDenominator)
        );
        for bad in ["", "a", "0.25", "1/4/2", "1/ 4", "+1"] {
            assert_eq!(
                parse_rational(bad),
                Err(RationalError::Malformed),
                "accepted `{bad}`"
            );
        }
    }

    #[test]
    fn duration_names() {
        assert_eq!(
            duration_name(Fraction::new(1u64, 4u64)),
            "quarter note"
        );
        assert_eq!(duration_name(Fraction::new(1u64, 1u64)), "whole note");
        assert_eq!(
            duration_name(Fraction::new(3u64, 8u64)),
            "dotted quarter note"
        );
        assert_eq!(
            duration_name(Fraction::new(7u64, 8u64)),
            "double-dotted half note"
        );
        assert_eq!(
            duration_name(Fraction::new(5u64, 8u64)),
            "5/8 of a whole note"
        );
        // 2/8 reduces to 1/4 on construction.
        assert_eq!(
            duration_name(Fraction::new(2u64, 8u64)),
            "quarter note"
        );
    }

    #[test]
    fn beat_labels() {
        let common = TimeSignature::new(4, 4);
        assert_eq!(
            beat_label(Fraction::new(0u64, 1u64), &common),
            "beat 1"
        );
        assert_eq!(
            beat_label(Fraction::new(1u64, 4u64), &common),
            "beat 2"
        );
        assert_eq!(
            beat_label(Fraction::new(3u64, 8u64), &common),
            "beat 2"
        );
        let compound = TimeSignature::new(6, 8);
        assert_eq!(
            beat_label(Fraction::new(1u64, 4u64), &compound),
            "beat 3"
        );
    }
}
