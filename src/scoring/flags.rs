use std::collections::BTreeMap;

use tracing::debug;

use crate::models::Domain;

use super::ruleset::FlagRule;

/// Evaluate every rule against already computed domain percentages.
///
/// A rule whose domains are not all available evaluates to `false`.
pub fn evaluate<F>(rules: &[FlagRule], percentage: F) -> BTreeMap<String, bool>
where
    F: Fn(Domain) -> Option<f64>,
{
    rules
        .iter()
        .map(|rule| {
            let raised = rule.all_of.iter().all(|condition| {
                percentage(condition.domain).is_some_and(|pct| condition.holds(pct))
            });
            if raised {
                debug!(flag = %rule.name, "flag raised");
            }
            (rule.name.clone(), raised)
        })
        .collect()
}
