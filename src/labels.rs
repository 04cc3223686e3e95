//! Prediction labels returned by the classifier and their display treatment.

use std::fmt;

use serde::{Serialize, Serializer};

/// Classification assigned to one KOI row by the remote model.
///
/// The three known dispositions form a closed set; anything else the service
/// sends is kept verbatim in [`PredictionLabel::Unrecognized`] so consumers are
/// forced to decide how to treat it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PredictionLabel {
    Confirmed,
    Candidate,
    FalsePositive,
    Unrecognized(String),
}

/// Visual tone used when colour-coding a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelTone {
    Positive,
    Pending,
    Negative,
    Neutral,
}

impl LabelTone {
    /// RGB colour used for badges of this tone.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Positive => (34, 197, 94),
            Self::Pending => (234, 179, 8),
            Self::Negative => (239, 68, 68),
            Self::Neutral => (115, 115, 115),
        }
    }
}

impl PredictionLabel {
    /// All recognized labels in summary order.
    pub const KNOWN: [PredictionLabel; 3] = [
        PredictionLabel::Confirmed,
        PredictionLabel::Candidate,
        PredictionLabel::FalsePositive,
    ];

    /// Parse label text from the service.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `_`, `-` and
    /// spaces alike, so `FALSE POSITIVE`, `false_positive` and
    /// `False-Positive` all resolve to [`PredictionLabel::FalsePositive`].
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|ch| match ch {
                '_' | '-' => ' ',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        match collapsed.as_str() {
            "CONFIRMED" => Self::Confirmed,
            "CANDIDATE" => Self::Candidate,
            "FALSE POSITIVE" => Self::FalsePositive,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Canonical wire form, used for CSV export and summaries.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Candidate => "CANDIDATE",
            Self::FalsePositive => "FALSE_POSITIVE",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// Human-friendly name for badges.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Candidate => "Candidate",
            Self::FalsePositive => "False Positive",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    pub fn tone(&self) -> LabelTone {
        match self {
            Self::Confirmed => LabelTone::Positive,
            Self::Candidate => LabelTone::Pending,
            Self::FalsePositive => LabelTone::Negative,
            Self::Unrecognized(_) => LabelTone::Neutral,
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PredictionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_labels_loosely() {
        assert_eq!(PredictionLabel::parse("CONFIRMED"), PredictionLabel::Confirmed);
        assert_eq!(PredictionLabel::parse(" candidate "), PredictionLabel::Candidate);
        assert_eq!(
            PredictionLabel::parse("FALSE POSITIVE"),
            PredictionLabel::FalsePositive
        );
        assert_eq!(
            PredictionLabel::parse("false_positive"),
            PredictionLabel::FalsePositive
        );
    }

    #[test]
    fn keeps_unknown_text_verbatim() {
        let label = PredictionLabel::parse("MAYBE");
        assert_eq!(label, PredictionLabel::Unrecognized("MAYBE".into()));
        assert_eq!(label.tone(), LabelTone::Neutral);
        assert_eq!(label.display_name(), "MAYBE");
    }

    #[test]
    fn tones_follow_disposition() {
        assert_eq!(PredictionLabel::Confirmed.tone(), LabelTone::Positive);
        assert_eq!(PredictionLabel::Candidate.tone(), LabelTone::Pending);
        assert_eq!(PredictionLabel::FalsePositive.tone(), LabelTone::Negative);
    }
}
