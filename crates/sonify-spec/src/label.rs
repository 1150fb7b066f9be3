//! The four categorical labels driving motif selection and arrangement.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    MomentumPos,
    MomentumNeg,
    VolatileSpike,
    Neutral,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::MomentumPos => "MOMENTUM_POS",
            Label::MomentumNeg => "MOMENTUM_NEG",
            Label::VolatileSpike => "VOLATILE_SPIKE",
            Label::Neutral => "NEUTRAL",
        }
    }

    /// Parses a label string, degrading unknown values to `NEUTRAL` — the
    /// learned model is never trusted to invent labels outside the four
    /// defined values.
    pub fn from_model_output(s: &str) -> Label {
        match s {
            "MOMENTUM_POS" => Label::MomentumPos,
            "MOMENTUM_NEG" => Label::MomentumNeg,
            "VOLATILE_SPIKE" => Label::VolatileSpike,
            _ => Label::Neutral,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_output_degrades_to_neutral() {
        assert_eq!(Label::from_model_output("BOGUS"), Label::Neutral);
    }

    #[test]
    fn round_trips_known_values() {
        for l in [
            Label::MomentumPos,
            Label::MomentumNeg,
            Label::VolatileSpike,
            Label::Neutral,
        ] {
            assert_eq!(Label::from_model_output(l.as_str()), l);
        }
    }
}
