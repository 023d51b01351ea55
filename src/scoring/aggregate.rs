use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::models::{AnswerRecord, DataWarning, Domain, Item, RawValue, ScaleType};

use super::ruleset::Ruleset;

/// Accumulated credit for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DomainTotal {
    pub raw: f64,
    pub max_possible: f64,
    pub items: usize,
}

impl DomainTotal {
    pub fn percentage(&self) -> Option<f64> {
        self.normalized().map(|n| n * 100.0)
    }

    pub fn normalized(&self) -> Option<f64> {
        if self.max_possible > 0.0 {
            Some(self.raw / self.max_possible)
        } else {
            None
        }
    }
}

/// Per-domain totals for one session. Domains without any answered item are
/// absent rather than zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub totals: BTreeMap<Domain, DomainTotal>,
    pub warnings: Vec<DataWarning>,
}

impl Aggregate {
    pub fn get(&self, domain: Domain) -> Option<&DomainTotal> {
        self.totals.get(&domain)
    }

    pub fn raw(&self, domain: Domain) -> Option<f64> {
        self.get(domain).map(|t| t.raw)
    }

    pub fn percentage(&self, domain: Domain) -> Option<f64> {
        self.get(domain).and_then(DomainTotal::percentage)
    }

    pub fn normalized(&self, domain: Domain) -> Option<f64> {
        self.get(domain).and_then(DomainTotal::normalized)
    }

    fn credit(&mut self, domain: Domain, raw: f64, max_possible: f64) {
        let total = self.totals.entry(domain).or_default();
        total.raw += raw;
        total.max_possible += max_possible;
        total.items += 1;
    }

    fn reject(&mut self, item: &Item, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(item_id = %item.item_id, %reason, "answer excluded from scoring");
        self.warnings.push(DataWarning::InvalidAnswer {
            item_id: item.item_id.clone(),
            reason,
        });
    }

    fn unknown_domain(&mut self, item: &Item, tag: &str) {
        warn!(item_id = %item.item_id, tag, "unknown domain tag, excluded from scoring");
        self.warnings.push(DataWarning::UnknownDomain {
            item_id: item.item_id.clone(),
            tag: tag.to_string(),
        });
    }
}

/// Sum every answered item into its domain(s).
pub fn aggregate(answers: &[AnswerRecord], ruleset: &Ruleset) -> Aggregate {
    let mut agg = Aggregate::default();

    for record in answers {
        let Some(value) = &record.value else {
            continue;
        };
        let item = &record.item;
        match (item.scale_type, value) {
            (ScaleType::Likert5, RawValue::Scalar(raw)) => add_likert(&mut agg, item, *raw),
            (ScaleType::ForcedChoice, RawValue::Selected(selected)) => {
                add_forced_choice(&mut agg, item, selected, ruleset.forced_choice_points)
            }
            (ScaleType::Ranking, RawValue::Ranked(order)) => add_ranking(&mut agg, item, order),
            (scale, _) => agg.reject(
                item,
                format!("answer kind does not match scale {}", scale.as_str()),
            ),
        }
    }

    debug!(domains = agg.totals.len(), warnings = agg.warnings.len(), "aggregated answers");
    agg
}

/// Likert contribution; reverse-scored items are inverted within the scale bounds.
pub fn effective_likert(item: &Item, raw: f64) -> f64 {
    if item.reverse_scored {
        item.scale_min + item.scale_max - raw
    } else {
        raw
    }
}

fn add_likert(agg: &mut Aggregate, item: &Item, raw: f64) {
    let Some(tag) = item.domain.as_deref() else {
        agg.unknown_domain(item, "");
        return;
    };
    let Some(domain) = Domain::from_tag(item.module, tag) else {
        agg.unknown_domain(item, tag);
        return;
    };
    if !raw.is_finite() || raw < item.scale_min || raw > item.scale_max {
        agg.reject(
            item,
            format!(
                "value {raw} outside scale {}-{}",
                item.scale_min, item.scale_max
            ),
        );
        return;
    }
    agg.credit(domain, effective_likert(item, raw), item.scale_max);
}

// Resolve option domains, dropping (and reporting) options with unknown tags
fn option_domains(agg: &mut Aggregate, item: &Item) -> Vec<Option<Domain>> {
    item.options
        .iter()
        .map(|opt| {
            let domain = Domain::from_tag(item.module, &opt.domain);
            if domain.is_none() {
                agg.unknown_domain(item, &opt.domain);
            }
            domain
        })
        .collect()
}

fn add_forced_choice(agg: &mut Aggregate, item: &Item, selected: &[String], default_points: f64) {
    if selected.is_empty() {
        agg.reject(item, "no option selected");
        return;
    }
    if let Some(unknown) = selected.iter().find(|v| item.option(v).is_none()) {
        agg.reject(item, format!("selected unknown option '{unknown}'"));
        return;
    }

    let domains = option_domains(agg, item);
    let mut per_domain: BTreeMap<Domain, (f64, f64)> = BTreeMap::new();
    for (opt, domain) in item.options.iter().zip(domains) {
        let Some(domain) = domain else { continue };
        let points = opt.points.unwrap_or(default_points);
        let entry = per_domain.entry(domain).or_default();
        entry.1 += points;
        if selected.iter().any(|v| *v == opt.value) {
            entry.0 += points;
        }
    }

    for (domain, (raw, cap)) in per_domain {
        agg.credit(domain, raw, cap);
    }
}

/// Rank weight for a 0-based position among `n` options: first place earns `n`.
pub fn rank_weight(position: usize, n: usize) -> f64 {
    n.saturating_sub(position) as f64
}

fn add_ranking(agg: &mut Aggregate, item: &Item, order: &[String]) {
    let n = item.options.len();
    let distinct: HashSet<&str> = order.iter().map(String::as_str).collect();
    let is_permutation = order.len() == n
        && distinct.len() == n
        && order.iter().all(|v| item.option(v).is_some());
    if !is_permutation {
        agg.reject(item, "ranking is not a permutation of the options");
        return;
    }

    let domains = option_domains(agg, item);
    let mut per_domain: BTreeMap<Domain, (f64, f64)> = BTreeMap::new();

    // Cap: a domain holding k options can at best take the top k positions
    let mut held: BTreeMap<Domain, usize> = BTreeMap::new();
    for domain in domains.iter().flatten() {
        *held.entry(*domain).or_default() += 1;
    }
    for (domain, k) in &held {
        let cap: f64 = (0..*k).map(|p| rank_weight(p, n)).sum();
        per_domain.entry(*domain).or_default().1 = cap;
    }

    for (position, value) in order.iter().enumerate() {
        let idx = item
            .options
            .iter()
            .position(|o| o.value == *value)
            .unwrap_or_default();
        if let Some(domain) = domains[idx] {
            per_domain.entry(domain).or_default().0 += rank_weight(position, n);
        }
    }

    for (domain, (raw, cap)) in per_domain {
        agg.credit(domain, raw, cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BigFiveTrait, ItemOption, Module, RiasecDomain};

    fn answered(item: Item, value: RawValue) -> AnswerRecord {
        AnswerRecord {
            item,
            value: Some(value),
        }
    }

    fn riasec(d: RiasecDomain) -> Domain {
        Domain::Riasec(d)
    }

    fn six_way(item_id: &str) -> Item {
        Item::ranking(
            item_id,
            ["R", "I", "A", "S", "E", "C"]
                .iter()
                .map(|d| ItemOption::new(&d.to_lowercase(), d))
                .collect(),
        )
    }

    mod likert_tests {
        use super::*;

        #[test]
        fn reverse_scored_item_is_inverted() {
            let item = Item::likert("BF_N1", Module::BigFive, "N", true);
            let agg = aggregate(
                &[answered(item, RawValue::Scalar(2.0))],
                &Ruleset::standard(),
            );
            let total = agg.get(Domain::BigFive(BigFiveTrait::Neuroticism)).unwrap();
            assert_eq!(total.raw, 4.0);
            assert_eq!(total.max_possible, 5.0);
            assert_eq!(total.items, 1);
        }

        #[test]
        fn forward_item_keeps_raw_value() {
            let item = Item::likert("R1", Module::Riasec, "R", false);
            let agg = aggregate(
                &[answered(item, RawValue::Scalar(2.0))],
                &Ruleset::standard(),
            );
            assert_eq!(agg.raw(riasec(RiasecDomain::Realistic)), Some(2.0));
        }

        #[test]
        fn sums_items_and_maxima_per_domain() {
            let answers = vec![
                answered(Item::likert("R1", Module::Riasec, "R", false), RawValue::Scalar(5.0)),
                answered(Item::likert("R2", Module::Riasec, "R", false), RawValue::Scalar(3.0)),
                answered(Item::likert("R3", Module::Riasec, "R", true), RawValue::Scalar(5.0)),
            ];
            let agg = aggregate(&answers, &Ruleset::standard());
            let total = agg.get(riasec(RiasecDomain::Realistic)).unwrap();
            assert_eq!(total.raw, 9.0);
            assert_eq!(total.max_possible, 15.0);
            assert_eq!(total.items, 3);
            assert_eq!(total.percentage(), Some(60.0));
        }

        #[test]
        fn unanswered_domain_is_omitted_not_zero() {
            let answers = vec![
                answered(Item::likert("R1", Module::Riasec, "R", false), RawValue::Scalar(1.0)),
                AnswerRecord {
                    item: Item::likert("I1", Module::Riasec, "I", false),
                    value: None,
                },
            ];
            let agg = aggregate(&answers, &Ruleset::standard());
            assert!(agg.get(riasec(RiasecDomain::Realistic)).is_some());
            assert!(agg.get(riasec(RiasecDomain::Investigative)).is_none());
        }

        #[test]
        fn unknown_domain_tag_is_excluded_with_warning() {
            let item = Item::likert("X1", Module::Riasec, "Z", false);
            let agg = aggregate(
                &[answered(item, RawValue::Scalar(4.0))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
            assert_eq!(
                agg.warnings,
                vec![DataWarning::UnknownDomain {
                    item_id: "X1".into(),
                    tag: "Z".into()
                }]
            );
        }

        #[test]
        fn out_of_range_value_is_excluded() {
            let item = Item::likert("R1", Module::Riasec, "R", false);
            let agg = aggregate(
                &[answered(item, RawValue::Scalar(9.0))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
            assert!(matches!(agg.warnings[0], DataWarning::InvalidAnswer { .. }));
        }

        #[test]
        fn mismatched_value_kind_is_excluded() {
            let item = Item::likert("R1", Module::Riasec, "R", false);
            let agg = aggregate(
                &[answered(item, RawValue::Selected(vec!["a".into()]))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
            assert_eq!(agg.warnings.len(), 1);
        }
    }

    mod forced_choice_tests {
        use super::*;

        fn pair() -> Item {
            Item::forced_choice(
                "FC_RI_1",
                vec![ItemOption::new("A", "R"), ItemOption::new("B", "I")],
            )
        }

        #[test]
        fn selected_option_earns_default_points() {
            let agg = aggregate(
                &[answered(pair(), RawValue::Selected(vec!["B".into()]))],
                &Ruleset::standard(),
            );
            let i = agg.get(riasec(RiasecDomain::Investigative)).unwrap();
            assert_eq!((i.raw, i.max_possible), (3.0, 3.0));
            let r = agg.get(riasec(RiasecDomain::Realistic)).unwrap();
            assert_eq!((r.raw, r.max_possible), (0.0, 3.0));
        }

        #[test]
        fn option_points_override_default() {
            let mut item = pair();
            item.options[0].points = Some(5.0);
            let agg = aggregate(
                &[answered(item, RawValue::Selected(vec!["A".into()]))],
                &Ruleset::standard(),
            );
            assert_eq!(agg.raw(riasec(RiasecDomain::Realistic)), Some(5.0));
        }

        #[test]
        fn unknown_selection_is_rejected() {
            let agg = aggregate(
                &[answered(pair(), RawValue::Selected(vec!["Q".into()]))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
            assert_eq!(agg.warnings.len(), 1);
        }

        #[test]
        fn empty_selection_is_rejected() {
            let agg = aggregate(
                &[answered(pair(), RawValue::Selected(vec![]))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
        }
    }

    mod ranking_tests {
        use super::*;

        #[test]
        fn weights_decrease_with_position() {
            assert_eq!(rank_weight(0, 6), 6.0);
            assert_eq!(rank_weight(5, 6), 1.0);
            assert_eq!(rank_weight(6, 6), 0.0);
        }

        #[test]
        fn first_place_earns_most() {
            let order = ["i", "r", "a", "s", "e", "c"].map(String::from).to_vec();
            let agg = aggregate(
                &[answered(six_way("RANK1"), RawValue::Ranked(order))],
                &Ruleset::standard(),
            );
            assert_eq!(agg.raw(riasec(RiasecDomain::Investigative)), Some(6.0));
            assert_eq!(agg.raw(riasec(RiasecDomain::Realistic)), Some(5.0));
            assert_eq!(agg.raw(riasec(RiasecDomain::Conventional)), Some(1.0));
            for d in RiasecDomain::ALL {
                assert_eq!(agg.get(riasec(d)).unwrap().max_possible, 6.0);
            }
        }

        #[test]
        fn partial_ranking_is_rejected() {
            let order = ["i", "r"].map(String::from).to_vec();
            let agg = aggregate(
                &[answered(six_way("RANK1"), RawValue::Ranked(order))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
            assert_eq!(agg.warnings.len(), 1);
        }

        #[test]
        fn duplicate_entries_are_rejected() {
            let order = ["i", "i", "a", "s", "e", "c"].map(String::from).to_vec();
            let agg = aggregate(
                &[answered(six_way("RANK1"), RawValue::Ranked(order))],
                &Ruleset::standard(),
            );
            assert!(agg.totals.is_empty());
        }

        #[test]
        fn domain_holding_two_options_caps_at_top_two_weights() {
            let item = Item::ranking(
                "RANKX",
                vec![
                    ItemOption::new("a", "R"),
                    ItemOption::new("b", "R"),
                    ItemOption::new("c", "I"),
                ],
            );
            let order = ["c", "a", "b"].map(String::from).to_vec();
            let agg = aggregate(&[answered(item, RawValue::Ranked(order))], &Ruleset::standard());
            let r = agg.get(riasec(RiasecDomain::Realistic)).unwrap();
            assert_eq!((r.raw, r.max_possible), (3.0, 5.0));
        }
    }

    #[test]
    fn mixed_answers_accumulate_into_one_domain() {
        let answers = vec![
            answered(Item::likert("I1", Module::Riasec, "I", false), RawValue::Scalar(4.0)),
            answered(
                Item::forced_choice(
                    "FC_RI_1",
                    vec![ItemOption::new("A", "R"), ItemOption::new("B", "I")],
                ),
                RawValue::Selected(vec!["B".into()]),
            ),
            answered(
                six_way("RANK1"),
                RawValue::Ranked(["i", "r", "a", "s", "e", "c"].map(String::from).to_vec()),
            ),
        ];
        let agg = aggregate(&answers, &Ruleset::standard());
        let i = agg.get(riasec(RiasecDomain::Investigative)).unwrap();
        assert_eq!(i.raw, 4.0 + 3.0 + 6.0);
        assert_eq!(i.max_possible, 5.0 + 3.0 + 6.0);
        assert_eq!(i.items, 3);
    }
}
