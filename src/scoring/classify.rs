use crate::models::StrengthLabel;

use super::ruleset::StrengthCutPoints;

/// A classified domain score. `percentage` is `None` when the maximum was not
/// positive and the label is the Medium fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strength {
    pub label: StrengthLabel,
    pub percentage: Option<f64>,
}

impl Strength {
    pub fn is_fallback(&self) -> bool {
        self.percentage.is_none()
    }
}

pub fn label_for_percentage(percentage: f64, cuts: &StrengthCutPoints) -> StrengthLabel {
    if percentage >= cuts.very_high {
        StrengthLabel::VeryHigh
    } else if percentage >= cuts.high {
        StrengthLabel::High
    } else if percentage >= cuts.medium {
        StrengthLabel::Medium
    } else {
        StrengthLabel::Low
    }
}

pub fn classify(raw: f64, max_possible: f64, cuts: &StrengthCutPoints) -> Strength {
    let percentage = raw / max_possible * 100.0;
    if max_possible <= 0.0 || !percentage.is_finite() {
        return Strength {
            label: StrengthLabel::Medium,
            percentage: None,
        };
    }
    Strength {
        label: label_for_percentage(percentage, cuts),
        percentage: Some(percentage),
    }
}
