//! Versioned rule tables: classifier cut points, flag rules and zone weights.
//!
//! The standard ruleset is compiled in. Alternates can be loaded from JSON
//! and are validated before use.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{BehavioralTrait, BigFiveTrait, Domain, RiasecDomain};

pub const STANDARD_VERSION: &str = "1.1";

#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("failed to read ruleset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("ruleset is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid ruleset: {0}")]
    Invalid(String),
}

/// Percentage cut points; a score at or above a cut point earns that label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthCutPoints {
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Below,
    AtLeast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub domain: Domain,
    pub comparison: Comparison,
    pub percent: f64,
}

impl Condition {
    pub fn holds(&self, percentage: f64) -> bool {
        match self.comparison {
            Comparison::Below => percentage < self.percent,
            Comparison::AtLeast => percentage >= self.percent,
        }
    }
}

/// A flag is raised when every condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagRule {
    pub name: String,
    pub all_of: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ZoneTerm {
    /// Normalized score of one named domain.
    Domain { domain: Domain, weight: f64 },
    /// Normalized score of the RIASEC domain at `rank` (1-based) in the
    /// Holland ordering.
    RiasecRank { rank: usize, weight: f64 },
}

impl ZoneTerm {
    pub fn weight(&self) -> f64 {
        match self {
            ZoneTerm::Domain { weight, .. } | ZoneTerm::RiasecRank { weight, .. } => *weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneWeights {
    pub love: Vec<ZoneTerm>,
    pub mastery: Vec<ZoneTerm>,
    pub contribution: Vec<ZoneTerm>,
    pub sustainability: Vec<ZoneTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub version: String,
    pub strength: StrengthCutPoints,
    /// Points for a selected forced-choice option that carries none of its own.
    pub forced_choice_points: f64,
    pub flags: Vec<FlagRule>,
    pub zones: ZoneWeights,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::standard()
    }
}

fn behavioral(t: BehavioralTrait) -> Domain {
    Domain::Behavioral(t)
}

fn riasec_term(d: RiasecDomain, weight: f64) -> ZoneTerm {
    ZoneTerm::Domain {
        domain: Domain::Riasec(d),
        weight,
    }
}

impl Ruleset {
    pub fn standard() -> Self {
        use Comparison::{AtLeast, Below};

        let single = |name: &str, domain: Domain, comparison: Comparison, percent: f64| FlagRule {
            name: name.to_string(),
            all_of: vec![Condition {
                domain,
                comparison,
                percent,
            }],
        };

        Self {
            version: STANDARD_VERSION.to_string(),
            strength: StrengthCutPoints {
                medium: 40.0,
                high: 60.0,
                very_high: 80.0,
            },
            forced_choice_points: 3.0,
            flags: vec![
                single(
                    "procrastination_risk",
                    behavioral(BehavioralTrait::TaskStartTempo),
                    Below,
                    40.0,
                ),
                FlagRule {
                    name: "perfectionism_risk".to_string(),
                    all_of: vec![
                        Condition {
                            domain: Domain::BigFive(BigFiveTrait::Conscientiousness),
                            comparison: AtLeast,
                            percent: 90.0,
                        },
                        Condition {
                            domain: Domain::BigFive(BigFiveTrait::Neuroticism),
                            comparison: AtLeast,
                            percent: 60.0,
                        },
                    ],
                },
                single(
                    "low_grit_risk",
                    behavioral(BehavioralTrait::GritPersistence),
                    Below,
                    40.0,
                ),
                single(
                    "poor_regulation_risk",
                    behavioral(BehavioralTrait::SelfEfficacy),
                    Below,
                    40.0,
                ),
                single(
                    "growth_mindset",
                    behavioral(BehavioralTrait::LearningOrientation),
                    AtLeast,
                    60.0,
                ),
            ],
            zones: ZoneWeights {
                love: vec![
                    riasec_term(RiasecDomain::Artistic, 0.5),
                    riasec_term(RiasecDomain::Social, 0.5),
                ],
                mastery: vec![
                    ZoneTerm::RiasecRank {
                        rank: 1,
                        weight: 0.5,
                    },
                    ZoneTerm::RiasecRank {
                        rank: 2,
                        weight: 0.5,
                    },
                ],
                contribution: vec![
                    riasec_term(RiasecDomain::Social, 0.5),
                    riasec_term(RiasecDomain::Enterprising, 0.5),
                ],
                sustainability: vec![
                    riasec_term(RiasecDomain::Conventional, 0.5),
                    riasec_term(RiasecDomain::Realistic, 0.5),
                ],
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RulesetError> {
        let ruleset: Ruleset = serde_json::from_str(json)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    pub fn from_file(path: &Path) -> Result<Self, RulesetError> {
        let json = fs::read_to_string(path).map_err(|source| RulesetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), RulesetError> {
        if self.version.trim().is_empty() {
            return Err(RulesetError::Invalid("version must not be empty".into()));
        }

        let s = &self.strength;
        let ascending = 0.0 < s.medium && s.medium < s.high && s.high < s.very_high;
        if !ascending || s.very_high > 100.0 {
            return Err(RulesetError::Invalid(format!(
                "strength cut points must ascend within (0, 100], got {}/{}/{}",
                s.medium, s.high, s.very_high
            )));
        }

        if !(self.forced_choice_points.is_finite() && self.forced_choice_points > 0.0) {
            return Err(RulesetError::Invalid(
                "forced_choice_points must be positive".into(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.flags {
            if rule.name.trim().is_empty() || !seen.insert(rule.name.as_str()) {
                return Err(RulesetError::Invalid(format!(
                    "flag name '{}' is empty or duplicated",
                    rule.name
                )));
            }
            if rule.all_of.is_empty() {
                return Err(RulesetError::Invalid(format!(
                    "flag '{}' has no conditions",
                    rule.name
                )));
            }
        }

        let zones = [
            ("love", &self.zones.love),
            ("mastery", &self.zones.mastery),
            ("contribution", &self.zones.contribution),
            ("sustainability", &self.zones.sustainability),
        ];
        for (name, terms) in zones {
            for term in terms {
                let w = term.weight();
                if !(w.is_finite() && w >= 0.0) {
                    return Err(RulesetError::Invalid(format!(
                        "zone '{name}' has weight {w}, weights must be non-negative"
                    )));
                }
                if let ZoneTerm::RiasecRank { rank, .. } = term {
                    if !(1..=RiasecDomain::ALL.len()).contains(rank) {
                        return Err(RulesetError::Invalid(format!(
                            "zone '{name}' references RIASEC rank {rank}"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
