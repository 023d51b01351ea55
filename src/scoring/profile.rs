use tracing::{debug, warn};

use crate::models::{
    AnswerRecord, BehavioralScores, BehavioralTrait, BigFiveScores, BigFiveTrait, DataWarning,
    Domain, Module, ProfileDetail, RiasecDomain, RiasecScores, StrengthLabels,
};

use super::aggregate::{aggregate, Aggregate};
use super::classify::{classify, Strength};
use super::flags;
use super::rank::{self, HollandCode};
use super::ruleset::Ruleset;
use super::zones;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    pub riasec: bool,
    pub big_five: bool,
    pub behavioral: bool,
}

/// The assembled result of one scoring pass. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub riasec: RiasecScores,
    pub big_five: BigFiveScores,
    pub behavioral: BehavioralScores,
    pub holland_code: Option<HollandCode>,
    pub completion: Completion,
    pub detail: ProfileDetail,
}

// A module is covered when it has items and every one of them is answered
fn module_covered(answers: &[AnswerRecord], module: Module) -> bool {
    let mut items = answers.iter().filter(|a| a.item.module == module).peekable();
    items.peek().is_some() && items.all(|a| a.value.is_some())
}

fn strength(
    agg: &Aggregate,
    domain: Domain,
    ruleset: &Ruleset,
    warnings: &mut Vec<DataWarning>,
) -> Option<Strength> {
    let total = agg.get(domain)?;
    let s = classify(total.raw, total.max_possible, &ruleset.strength);
    if s.is_fallback() {
        warn!(%domain, "maximum score is not positive, using Medium");
        warnings.push(DataWarning::ZeroMaxPossible { domain });
    }
    Some(s)
}

pub fn assemble(answers: &[AnswerRecord], ruleset: &Ruleset) -> Profile {
    let agg = aggregate(answers, ruleset);
    let mut warnings = agg.warnings.clone();

    let riasec = RiasecScores::from_fn(|d| agg.raw(Domain::Riasec(d)));
    let big_five = BigFiveScores::from_fn(|t| agg.raw(Domain::BigFive(t)));
    let behavioral = BehavioralScores::from_fn(|t| agg.raw(Domain::Behavioral(t)));

    let mut labels = StrengthLabels::default();
    for d in RiasecDomain::ALL {
        if let Some(s) = strength(&agg, Domain::Riasec(d), ruleset, &mut warnings) {
            labels.riasec.insert(d, s.label);
        }
    }
    for t in BigFiveTrait::ALL {
        if let Some(s) = strength(&agg, Domain::BigFive(t), ruleset, &mut warnings) {
            labels.big_five.insert(t, s.label);
        }
    }
    for t in BehavioralTrait::ALL {
        if let Some(s) = strength(&agg, Domain::Behavioral(t), ruleset, &mut warnings) {
            labels.behavioral.insert(t, s.label);
        }
    }

    let holland_code = rank::holland_code(&riasec);
    if holland_code.is_none() {
        for d in RiasecDomain::ALL {
            if riasec.get(d).is_none() {
                warnings.push(DataWarning::MissingRiasecDomain { domain: d });
            }
        }
    }

    let flags = flags::evaluate(&ruleset.flags, |d| agg.percentage(d));

    let ranked: Vec<RiasecDomain> = rank::rank_scores(&riasec)
        .into_iter()
        .map(|(d, _)| d)
        .collect();
    let zones = zones::synthesize(&ruleset.zones, &ranked, |d| agg.normalized(d));

    let completion = Completion {
        riasec: module_covered(answers, Module::Riasec) && holland_code.is_some(),
        big_five: module_covered(answers, Module::BigFive),
        behavioral: module_covered(answers, Module::Behavioral),
    };

    debug!(
        holland_code = ?holland_code.map(|c| c.to_string()),
        riasec_complete = completion.riasec,
        big_five_complete = completion.big_five,
        behavioral_complete = completion.behavioral,
        warnings = warnings.len(),
        "profile assembled"
    );

    Profile {
        riasec,
        big_five,
        behavioral,
        holland_code,
        completion,
        detail: ProfileDetail {
            ruleset_version: ruleset.version.clone(),
            top_domain: holland_code.map(|c| c.top()),
            labels,
            flags,
            zones,
            warnings,
        },
    }
}
