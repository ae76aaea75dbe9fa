//! Meter of the score, and the measure capacity derived from it.

use std::fmt;
use std::str::FromStr;

use fraction::Fraction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time signature: `{0}`")]
pub struct InvalidTimeSignature(pub String);

/// Global time signature. Every measure of the score is bound by the
/// capacity derived from it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}
impl TimeSignature {
    /// Both fields must be positive; `new` is reserved for literals
    /// and panics on zero, `from_str` reports the error instead.
    pub fn new(numerator: u32, denominator: u32) -> Self {
        assert!(
            numerator > 0 && denominator > 0,
            "time signature fields must be positive"
        );
        Self {
            numerator,
            denominator,
        }
    }

    /// Measure capacity as a fraction of a whole note: 4/4 -> 1, 3/8 -> 3/8.
    pub fn capacity(&self) -> Fraction {
        Fraction::new(self.numerator as u64, self.denominator as u64)
    }
}
impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
impl FromStr for TimeSignature {
    type Err = InvalidTimeSignature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| InvalidTimeSignature(s.to_string()))?;
        let numerator: u32 = num
            .parse()
            .map_err(|_| InvalidTimeSignature(s.to_string()))?;
        let denominator: u32 = den
            .parse()
            .map_err(|_| InvalidTimeSignature(s.to_string()))?;
        if numerator == 0 || denominator == 0 {
            return Err(InvalidTimeSignature(s.to_string()));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity() {
        assert_eq!(
            TimeSignature::new(4, 4).capacity(),
            Fraction::new(1u64, 1u64)
        );
        assert_eq!(
            TimeSignature::new(7, 8).capacity(),
            Fraction::new(7u64, 8u64)
        );
    }

    #[test]
    fn parse_and_display() {
        let ts: TimeSignature = "3/4".parse().unwrap();
        assert_eq!(ts, TimeSignature::new(3, 4));
        assert_eq!(ts.to_string(), "3/4");
        assert!("4".parse::<TimeSignature>().is_err());
        assert!("0/4".parse::<TimeSignature>().is_err());
        assert!("4/x".parse::<TimeSignature>().is_err());
    }
}
