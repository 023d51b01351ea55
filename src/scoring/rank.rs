//! Holland code resolution.
//!
//! Domains are ordered by the explicit key `(-score, priority)` where the
//! priority is the canonical R, I, A, S, E, C order. Scores are compared
//! exactly; the priority only decides exact ties. Nothing here depends on
//! the order in which scores were produced.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{RiasecDomain, RiasecScores};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HollandCode([RiasecDomain; 3]);

impl HollandCode {
    pub fn domains(&self) -> [RiasecDomain; 3] {
        self.0
    }

    pub fn top(&self) -> RiasecDomain {
        self.domains()[0]
    }
}

impl fmt::Display for HollandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.domains() {
            write!(f, "{}", d.code())?;
        }
        Ok(())
    }
}

// Adding 0.0 folds -0.0 into 0.0, so signed zeros tie and fall to priority
fn by_score_then_priority(a: &(RiasecDomain, f64), b: &(RiasecDomain, f64)) -> Ordering {
    (b.1 + 0.0)
        .total_cmp(&(a.1 + 0.0))
        .then_with(|| a.0.priority().cmp(&b.0.priority()))
}

/// Order the given domains best first. A domain listed twice keeps its last score.
pub fn rank<I>(entries: I) -> Vec<(RiasecDomain, f64)>
where
    I: IntoIterator<Item = (RiasecDomain, f64)>,
{
    let unique: BTreeMap<RiasecDomain, f64> = entries.into_iter().collect();
    let mut ranked: Vec<_> = unique.into_iter().collect();
    ranked.sort_by(by_score_then_priority);
    ranked
}

/// Present RIASEC domains of a score set, best first.
pub fn rank_scores(scores: &RiasecScores) -> Vec<(RiasecDomain, f64)> {
    rank(
        RiasecDomain::ALL
            .iter()
            .filter_map(|d| scores.get(*d).map(|s| (*d, s))),
    )
}

/// The 3-letter code, or `None` unless all six domains are scored.
pub fn resolve<I>(entries: I) -> Option<HollandCode>
where
    I: IntoIterator<Item = (RiasecDomain, f64)>,
{
    let ranked = rank(entries);
    if ranked.len() < RiasecDomain::ALL.len() {
        return None;
    }
    Some(HollandCode([ranked[0].0, ranked[1].0, ranked[2].0]))
}

pub fn holland_code(scores: &RiasecScores) -> Option<HollandCode> {
    let ranked = rank_scores(scores);
    resolve(ranked)
}
