use crate::models::{Domain, IkigaiZones, RiasecDomain};

use super::ruleset::{ZoneTerm, ZoneWeights};

fn zone_score<F>(terms: &[ZoneTerm], ranked: &[RiasecDomain], normalized: &F) -> f64
where
    F: Fn(Domain) -> Option<f64>,
{
    let sum: f64 = terms
        .iter()
        .map(|term| {
            let value = match term {
                ZoneTerm::Domain { domain, .. } => normalized(*domain),
                ZoneTerm::RiasecRank { rank, .. } => ranked
                    .get(rank.saturating_sub(1))
                    .and_then(|d| normalized(Domain::Riasec(*d))),
            };
            value.unwrap_or(0.0) * term.weight()
        })
        .sum();
    sum.clamp(0.0, 1.0)
}

/// Weighted zone composites over normalized (0-1) domain scores.
///
/// `ranked` is the RIASEC order produced by the rank resolver; absent
/// domains contribute nothing.
pub fn synthesize<F>(weights: &ZoneWeights, ranked: &[RiasecDomain], normalized: F) -> IkigaiZones
where
    F: Fn(Domain) -> Option<f64>,
{
    IkigaiZones {
        love: zone_score(&weights.love, ranked, &normalized),
        mastery: zone_score(&weights.mastery, ranked, &normalized),
        contribution: zone_score(&weights.contribution, ranked, &normalized),
        sustainability: zone_score(&weights.sustainability, ranked, &normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ruleset::Ruleset;
    use std::collections::HashMap;
    use RiasecDomain::*;

    fn normalized(values: &[(RiasecDomain, f64)]) -> impl Fn(Domain) -> Option<f64> {
        let map: HashMap<Domain, f64> = values
            .iter()
            .map(|(d, v)| (Domain::Riasec(*d), *v))
            .collect();
        move |d| map.get(&d).copied()
    }

    #[test]
    fn standard_zones_average_their_domains() {
        let values = [
            (Realistic, 0.2),
            (Investigative, 0.9),
            (Artistic, 0.6),
            (Social, 0.4),
            (Enterprising, 0.8),
            (Conventional, 0.0),
        ];
        let ranked = [Investigative, Enterprising, Artistic, Social, Realistic, Conventional];
        let zones = synthesize(&Ruleset::standard().zones, &ranked, normalized(&values));
        assert!((zones.love - 0.5).abs() < 1e-12);
        assert!((zones.mastery - 0.85).abs() < 1e-12);
        assert!((zones.contribution - 0.6).abs() < 1e-12);
        assert!((zones.sustainability - 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_domains_contribute_zero() {
        let zones = synthesize(
            &Ruleset::standard().zones,
            &[Artistic],
            normalized(&[(Artistic, 1.0)]),
        );
        assert_eq!(zones.love, 0.5);
        assert_eq!(zones.mastery, 0.5);
        assert_eq!(zones.contribution, 0.0);
        assert_eq!(zones.sustainability, 0.0);
    }

    #[test]
    fn zones_clamp_to_unit_interval() {
        let mut weights = Ruleset::standard().zones;
        weights.love = vec![ZoneTerm::Domain {
            domain: Domain::Riasec(Artistic),
            weight: 3.0,
        }];
        let zones = synthesize(&weights, &[], normalized(&[(Artistic, 0.9)]));
        assert_eq!(zones.love, 1.0);
    }

    #[test]
    fn all_zones_bounded_for_full_scores() {
        let values: Vec<_> = RiasecDomain::ALL.iter().map(|d| (*d, 1.0)).collect();
        let zones = synthesize(
            &Ruleset::standard().zones,
            &RiasecDomain::ALL,
            normalized(&values),
        );
        for z in [zones.love, zones.mastery, zones.contribution, zones.sustainability] {
            assert!((0.0..=1.0).contains(&z));
            assert!((z - 1.0).abs() < 1e-12);
        }
    }
}
