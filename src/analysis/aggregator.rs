//! Payroll aggregation and classification.
//!
//! This module turns typed payroll records into the derived tables of the
//! report: per-occupation statistics with their traffic-light
//! classification, the monthly trend, headcount distributions, salary
//! detail and the summary indicators.

use super::stats::{describe, mean, median, percentage, ratio};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::{
    AggregateBundle, Classification, ClassificationCounts, CompetenceMonth, DemographicCount,
    MonthlyTrend, OccupationDistribution, OccupationGroupStat, OccupationKey, PayrollRecord,
    RemediationItem, SalaryDetail, Sex,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Ratios of medians below this are red.
pub const RED_BELOW: f64 = 0.95;
/// Ratios of medians below this (and not red) are amber.
pub const AMBER_BELOW: f64 = 0.99;
/// Size of the top/bottom ratio lists.
pub const TOP_N: usize = 3;
/// k-anonymity threshold used when the caller does not set one.
pub const DEFAULT_K_MIN: usize = 3;

pub const REMEDIATION_ACTION: &str = "Revisar faixas salariais";
pub const REMEDIATION_TARGET: f64 = 1.0;
pub const REMEDIATION_HORIZON: &str = "Próximo semestre";

/// Values collected for one occupation and sex.
#[derive(Debug, Default)]
struct SexGroup<'a> {
    salaries: Vec<f64>,
    compensations: Vec<f64>,
    workers: BTreeSet<&'a str>,
}

type OccupationGroups<'a> = BTreeMap<&'a OccupationKey, BTreeMap<&'a Sex, SexGroup<'a>>>;

/// Aggregate a loaded dataset.
///
/// Fails only when required columns are missing; degenerate data yields
/// undefined (`None`) values instead.
pub fn aggregate(dataset: &Dataset, k_min: usize) -> Result<AggregateBundle> {
    let records = dataset.records()?;
    Ok(aggregate_records(&records, k_min))
}

/// Aggregate typed records.
pub fn aggregate_records(records: &[PayrollRecord], k_min: usize) -> AggregateBundle {
    info!(
        "Aggregating {} payroll records (k_min = {})",
        records.len(),
        k_min
    );

    let groups = group_by_occupation_and_sex(records);
    let occupations = occupation_statistics(&groups, k_min);
    let salary_detail = salary_detail(&groups);
    let monthly_trend = monthly_trend(records);
    let distribution = occupation_distribution(records);
    let demographics = demographic_counts(records);

    let classification_counts = ClassificationCounts::from_stats(&occupations);
    let top_ratios = top_by_ratio(&occupations, TOP_N);
    let bottom_ratios = bottom_by_ratio(&occupations, TOP_N);
    let mean_ratio_median = mean_of_defined(occupations.iter().map(|o| o.ratio_median));
    let mean_ratio_mean = mean_of_defined(occupations.iter().map(|o| o.ratio_mean));
    let remediation_plan = remediation_plan(&occupations);

    debug!(
        "Derived {} occupations, {} months, {} demographic cells",
        occupations.len(),
        monthly_trend.len(),
        demographics.len()
    );
    for label in Classification::ALL {
        debug!(
            "{} {}: {}",
            label.emoji(),
            label,
            classification_counts.get(label)
        );
    }

    AggregateBundle {
        k_min,
        occupations,
        monthly_trend,
        distribution,
        demographics,
        salary_detail,
        classification_counts,
        top_ratios,
        bottom_ratios,
        mean_ratio_median,
        mean_ratio_mean,
        remediation_plan,
    }
}

/// Classify an occupation from its distinct-worker counts and ratio of
/// medians.
///
/// The k-anonymity gate comes first. An undefined ratio cannot be compared
/// and is reported as insufficient as well.
pub fn classify(
    workers_female: usize,
    workers_male: usize,
    ratio_median: Option<f64>,
    k_min: usize,
) -> Classification {
    if workers_female < k_min || workers_male < k_min {
        return Classification::Insufficient;
    }

    match ratio_median {
        None => Classification::Insufficient,
        Some(r) if r < RED_BELOW => Classification::Red,
        Some(r) if r < AMBER_BELOW => Classification::Amber,
        Some(_) => Classification::Green,
    }
}

/// Partition records by occupation and sex.
fn group_by_occupation_and_sex(records: &[PayrollRecord]) -> OccupationGroups<'_> {
    let mut grouped: OccupationGroups<'_> = BTreeMap::new();

    for record in records {
        let (Some(occupation), Some(sex)) = (&record.occupation, &record.sex) else {
            continue;
        };

        let group = grouped
            .entry(occupation)
            .or_default()
            .entry(sex)
            .or_default();

        if let Some(salary) = record.salary {
            group.salaries.push(salary);
        }
        if let Some(compensation) = record.compensation {
            group.compensations.push(compensation);
        }
        if let Some(worker) = &record.worker_id {
            group.workers.insert(worker);
        }
    }

    grouped
}

/// One row per occupation with female/male columns, ratios and
/// classification.
fn occupation_statistics(
    groups: &OccupationGroups<'_>,
    k_min: usize,
) -> Vec<OccupationGroupStat> {
    groups
        .iter()
        .map(|(occupation, by_sex)| {
            let female = by_sex.get(&Sex::Female);
            let male = by_sex.get(&Sex::Male);

            let median_salary_female = female.and_then(|g| median(&g.salaries));
            let median_salary_male = male.and_then(|g| median(&g.salaries));
            let mean_compensation_female = female.and_then(|g| mean(&g.compensations));
            let mean_compensation_male = male.and_then(|g| mean(&g.compensations));
            let workers_female = female.map(|g| g.workers.len());
            let workers_male = male.map(|g| g.workers.len());

            let ratio_median = ratio(median_salary_female, median_salary_male);
            let ratio_mean = ratio(mean_compensation_female, mean_compensation_male);

            OccupationGroupStat {
                occupation: (*occupation).clone(),
                median_salary_female,
                median_salary_male,
                ratio_median,
                mean_compensation_female,
                mean_compensation_male,
                ratio_mean,
                workers_female,
                workers_male,
                classification: classify(
                    workers_female.unwrap_or(0),
                    workers_male.unwrap_or(0),
                    ratio_median,
                    k_min,
                ),
            }
        })
        .collect()
}

/// Contractual salary detail per occupation, female and male.
fn salary_detail(groups: &OccupationGroups<'_>) -> Vec<SalaryDetail> {
    groups
        .iter()
        .map(|(occupation, by_sex)| SalaryDetail {
            occupation: (*occupation).clone(),
            female: by_sex.get(&Sex::Female).and_then(|g| describe(&g.salaries)),
            male: by_sex.get(&Sex::Male).and_then(|g| describe(&g.salaries)),
        })
        .collect()
}

/// Mean total compensation per competence month, female vs male.
pub fn monthly_trend(records: &[PayrollRecord]) -> Vec<MonthlyTrend> {
    let mut grouped: BTreeMap<CompetenceMonth, BTreeMap<&Sex, Vec<f64>>> = BTreeMap::new();

    for record in records {
        let (Some(month), Some(sex)) = (record.month, &record.sex) else {
            continue;
        };

        let values = grouped.entry(month).or_default().entry(sex).or_default();
        if let Some(compensation) = record.compensation {
            values.push(compensation);
        }
    }

    grouped
        .into_iter()
        .map(|(month, by_sex)| {
            let female = by_sex.get(&Sex::Female).and_then(|v| mean(v));
            let male = by_sex.get(&Sex::Male).and_then(|v| mean(v));

            MonthlyTrend {
                month,
                mean_compensation_female: female,
                mean_compensation_male: male,
                ratio: ratio(female, male),
            }
        })
        .collect()
}

/// Distinct workers per occupation, overall and per sex, with percentages.
pub fn occupation_distribution(records: &[PayrollRecord]) -> Vec<OccupationDistribution> {
    #[derive(Default)]
    struct Headcount<'a> {
        all: BTreeSet<&'a str>,
        female: BTreeSet<&'a str>,
        male: BTreeSet<&'a str>,
    }

    let mut grouped: BTreeMap<&OccupationKey, Headcount<'_>> = BTreeMap::new();

    for record in records {
        let Some(occupation) = &record.occupation else {
            continue;
        };

        let headcount = grouped.entry(occupation).or_default();
        let Some(worker) = record.worker_id.as_deref() else {
            continue;
        };

        headcount.all.insert(worker);
        match record.sex {
            Some(Sex::Female) => {
                headcount.female.insert(worker);
            }
            Some(Sex::Male) => {
                headcount.male.insert(worker);
            }
            _ => {}
        }
    }

    grouped
        .into_iter()
        .map(|(occupation, headcount)| {
            let total = headcount.all.len();
            let female = headcount.female.len();
            let male = headcount.male.len();

            OccupationDistribution {
                occupation: occupation.clone(),
                total,
                female,
                male,
                percent_female: percentage(female, total),
                percent_male: percentage(male, total),
            }
        })
        .collect()
}

/// Distinct workers per occupation × sex × race/color, long form.
///
/// No small-cell suppression is applied here.
pub fn demographic_counts(records: &[PayrollRecord]) -> Vec<DemographicCount> {
    let mut grouped: BTreeMap<(&OccupationKey, &Sex, &str), BTreeSet<&str>> = BTreeMap::new();

    for record in records {
        let (Some(occupation), Some(sex), Some(race)) =
            (&record.occupation, &record.sex, record.race.as_deref())
        else {
            continue;
        };

        let workers = grouped.entry((occupation, sex, race)).or_default();
        if let Some(worker) = record.worker_id.as_deref() {
            workers.insert(worker);
        }
    }

    grouped
        .into_iter()
        .map(|((occupation, sex, race), workers)| DemographicCount {
            occupation: occupation.clone(),
            sex: sex.clone(),
            race: race.to_string(),
            workers: workers.len(),
        })
        .collect()
}

/// Occupations with the highest ratio of medians.
///
/// Undefined ratios are skipped; ties keep summary-table order.
pub fn top_by_ratio(stats: &[OccupationGroupStat], n: usize) -> Vec<OccupationGroupStat> {
    let mut ranked: Vec<_> = stats.iter().filter(|s| s.ratio_median.is_some()).collect();
    ranked.sort_by(|a, b| {
        b.ratio_median
            .partial_cmp(&a.ratio_median)
            .unwrap_or(Ordering::Equal)
    });
    ranked.into_iter().take(n).cloned().collect()
}

/// Occupations with the lowest ratio of medians.
pub fn bottom_by_ratio(stats: &[OccupationGroupStat], n: usize) -> Vec<OccupationGroupStat> {
    let mut ranked: Vec<_> = stats.iter().filter(|s| s.ratio_median.is_some()).collect();
    ranked.sort_by(|a, b| {
        a.ratio_median
            .partial_cmp(&b.ratio_median)
            .unwrap_or(Ordering::Equal)
    });
    ranked.into_iter().take(n).cloned().collect()
}

/// Every red occupation with the standard corrective action.
pub fn remediation_plan(stats: &[OccupationGroupStat]) -> Vec<RemediationItem> {
    stats
        .iter()
        .filter(|s| s.classification == Classification::Red)
        .map(|s| RemediationItem {
            occupation: s.occupation.clone(),
            ratio_median: s.ratio_median,
            action: REMEDIATION_ACTION,
            target_ratio: REMEDIATION_TARGET,
            horizon: REMEDIATION_HORIZON,
        })
        .collect()
}

fn mean_of_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    mean(&defined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(
        code: &str,
        sex: &str,
        race: &str,
        salary: f64,
        month: (i32, u32),
        worker: &str,
    ) -> PayrollRecord {
        PayrollRecord {
            employer_id: "11222333000144".to_string(),
            occupation: Some(OccupationKey::new(code, format!("Ocupação {}", code))),
            sex: Some(Sex::parse(sex)),
            race: Some(race.to_string()),
            salary: Some(salary),
            compensation: Some(salary * 1.1),
            month: CompetenceMonth::new(month.0, month.1),
            worker_id: Some(worker.to_string()),
        }
    }

    /// `n_f` women earning `salary_f` and `n_m` men earning `salary_m`.
    fn occupation(
        code: &str,
        n_f: usize,
        salary_f: f64,
        n_m: usize,
        salary_m: f64,
    ) -> Vec<PayrollRecord> {
        let women = (0..n_f).map(|i| {
            create_test_record(code, "F", "Parda", salary_f, (2024, 1), &format!("{code}-f{i}"))
        });
        let men = (0..n_m).map(|i| {
            create_test_record(code, "M", "Branca", salary_m, (2024, 1), &format!("{code}-m{i}"))
        });
        women.chain(men).collect()
    }

    fn stat_for<'a>(bundle: &'a AggregateBundle, code: &str) -> &'a OccupationGroupStat {
        bundle
            .occupations
            .iter()
            .find(|s| s.occupation.code == code)
            .expect("occupation present")
    }

    #[test]
    fn test_red_and_insufficient_scenario() {
        let mut records = occupation("100", 5, 4000.0, 5, 5000.0);
        records.extend(occupation("200", 2, 1000.0, 10, 5000.0));

        let bundle = aggregate_records(&records, 3);

        let a = stat_for(&bundle, "100");
        assert_eq!(a.ratio_median, Some(0.8));
        assert_eq!(a.classification, Classification::Red);
        assert_eq!(a.workers_female, Some(5));
        assert_eq!(a.workers_male, Some(5));

        let b = stat_for(&bundle, "200");
        assert_eq!(b.classification, Classification::Insufficient);
    }

    #[test]
    fn test_boundary_ratio_is_green() {
        let records = occupation("300", 5, 4950.0, 5, 5000.0);
        let bundle = aggregate_records(&records, 3);

        let stat = stat_for(&bundle, "300");
        assert_eq!(stat.ratio_median, Some(0.99));
        assert_eq!(stat.classification, Classification::Green);
    }

    #[test]
    fn test_classify_step_function() {
        assert_eq!(classify(5, 5, Some(0.5), 5), Classification::Red);
        assert_eq!(classify(5, 5, Some(0.9499), 5), Classification::Red);
        assert_eq!(classify(5, 5, Some(0.95), 5), Classification::Amber);
        assert_eq!(classify(5, 5, Some(0.98), 5), Classification::Amber);
        assert_eq!(classify(5, 5, Some(0.99), 5), Classification::Green);
        assert_eq!(classify(5, 5, Some(1.3), 5), Classification::Green);
        assert_eq!(classify(5, 5, None, 5), Classification::Insufficient);
    }

    #[test]
    fn test_classify_gate_ignores_ratio() {
        for ratio in [Some(0.1), Some(0.97), Some(1.0), Some(2.0), None] {
            assert_eq!(classify(4, 50, ratio, 5), Classification::Insufficient);
            assert_eq!(classify(50, 0, ratio, 5), Classification::Insufficient);
        }
    }

    #[test]
    fn test_single_sex_occupation_has_undefined_ratio() {
        let records = occupation("400", 6, 3000.0, 0, 0.0);
        let bundle = aggregate_records(&records, 3);

        let stat = stat_for(&bundle, "400");
        assert_eq!(stat.median_salary_male, None);
        assert_eq!(stat.workers_male, None);
        assert_eq!(stat.ratio_median, None);
        assert_eq!(stat.ratio_mean, None);
        assert_eq!(stat.classification, Classification::Insufficient);
    }

    #[test]
    fn test_distinct_workers_counted_per_group() {
        // Same worker in three months counts once.
        let records: Vec<_> = (1..=3)
            .map(|m| create_test_record("500", "F", "Preta", 3000.0, (2024, m), "w-1"))
            .collect();
        let bundle = aggregate_records(&records, 1);

        assert_eq!(stat_for(&bundle, "500").workers_female, Some(1));
        assert_eq!(bundle.distribution[0].total, 1);
        assert_eq!(bundle.demographics[0].workers, 1);
    }

    #[test]
    fn test_monthly_trend_sorted_with_ratio() {
        let records = vec![
            create_test_record("100", "F", "Parda", 900.0, (2024, 3), "a"),
            create_test_record("100", "M", "Parda", 1000.0, (2024, 3), "b"),
            create_test_record("100", "F", "Parda", 800.0, (2023, 12), "a"),
            create_test_record("100", "M", "Parda", 1000.0, (2023, 12), "b"),
        ];

        let trend = monthly_trend(&records);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].month.to_string(), "2023-12");
        assert_eq!(trend[1].month.to_string(), "2024-03");
        assert!((trend[0].ratio.unwrap() - 0.8).abs() < 1e-12);
        assert!((trend[1].ratio.unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_counts_and_percentages() {
        let records = occupation("600", 1, 1000.0, 2, 1000.0);
        let dist = occupation_distribution(&records);

        assert_eq!(dist.len(), 1);
        assert_eq!(dist[0].total, 3);
        assert_eq!(dist[0].female + dist[0].male, dist[0].total);
        assert_eq!(dist[0].percent_female, 33.33);
        assert_eq!(dist[0].percent_male, 66.67);
    }

    #[test]
    fn test_distribution_fills_missing_sex_with_zero() {
        let records = occupation("700", 0, 0.0, 4, 2000.0);
        let dist = occupation_distribution(&records);

        assert_eq!(dist[0].female, 0);
        assert_eq!(dist[0].percent_female, 0.0);
        assert_eq!(dist[0].percent_male, 100.0);
    }

    #[test]
    fn test_demographic_counts_long_form() {
        let mut records = occupation("800", 2, 1000.0, 3, 1000.0);
        records.push(create_test_record("800", "F", "Amarela", 1000.0, (2024, 1), "x"));

        let demo = demographic_counts(&records);
        let cells: Vec<_> = demo
            .iter()
            .map(|d| (d.sex.as_str(), d.race.as_str(), d.workers))
            .collect();
        assert_eq!(
            cells,
            vec![("F", "Amarela", 1), ("F", "Parda", 2), ("M", "Branca", 3)]
        );
    }

    #[test]
    fn test_top_and_bottom_are_stable_and_disjoint() {
        // Ratios: 0.8, 0.9, 0.9, 1.0, 1.1, 1.2
        let mut records = Vec::new();
        for (code, salary_f) in [
            ("1", 800.0),
            ("2", 900.0),
            ("3", 900.0),
            ("4", 1000.0),
            ("5", 1100.0),
            ("6", 1200.0),
        ] {
            records.extend(occupation(code, 5, salary_f, 5, 1000.0));
        }

        let bundle = aggregate_records(&records, 5);
        let top: Vec<_> = bundle
            .top_ratios
            .iter()
            .map(|s| s.occupation.code.as_str())
            .collect();
        let bottom: Vec<_> = bundle
            .bottom_ratios
            .iter()
            .map(|s| s.occupation.code.as_str())
            .collect();

        assert_eq!(top, vec!["6", "5", "4"]);
        assert_eq!(bottom, vec!["1", "2", "3"]);
        assert!(top.iter().all(|c| !bottom.contains(c)));
    }

    #[test]
    fn test_tie_break_keeps_first_seen_order() {
        let mut records = Vec::new();
        for code in ["10", "20", "30", "40"] {
            records.extend(occupation(code, 3, 1000.0, 3, 1000.0));
        }

        let bundle = aggregate_records(&records, 3);
        let top: Vec<_> = bundle
            .top_ratios
            .iter()
            .map(|s| s.occupation.code.as_str())
            .collect();
        let bottom: Vec<_> = bundle
            .bottom_ratios
            .iter()
            .map(|s| s.occupation.code.as_str())
            .collect();

        assert_eq!(top, vec!["10", "20", "30"]);
        assert_eq!(bottom, vec!["10", "20", "30"]);
    }

    #[test]
    fn test_summary_indicators_and_plan() {
        let mut records = occupation("1", 5, 800.0, 5, 1000.0);
        records.extend(occupation("2", 5, 1000.0, 5, 1000.0));
        records.extend(occupation("3", 1, 500.0, 5, 1000.0));

        let bundle = aggregate_records(&records, 5);

        assert_eq!(bundle.classification_counts.red, 1);
        assert_eq!(bundle.classification_counts.green, 1);
        assert_eq!(bundle.classification_counts.insufficient, 1);
        assert_eq!(bundle.classification_counts.total(), 3);

        let expected_mean = (0.8 + 1.0 + 0.5) / 3.0;
        assert!((bundle.mean_ratio_median.unwrap() - expected_mean).abs() < 1e-12);

        assert_eq!(bundle.remediation_plan.len(), 1);
        let item = &bundle.remediation_plan[0];
        assert_eq!(item.occupation.code, "1");
        assert_eq!(item.action, REMEDIATION_ACTION);
        assert_eq!(item.target_ratio, 1.0);
        assert_eq!(item.horizon, REMEDIATION_HORIZON);
    }

    #[test]
    fn test_salary_detail_follows_summary_order() {
        let mut records = occupation("20", 3, 2000.0, 0, 0.0);
        records.extend(occupation("3", 2, 1500.0, 2, 1800.0));

        let bundle = aggregate_records(&records, 1);
        let codes: Vec<_> = bundle
            .salary_detail
            .iter()
            .map(|d| d.occupation.code.as_str())
            .collect();
        let summary_codes: Vec<_> = bundle
            .occupations
            .iter()
            .map(|s| s.occupation.code.as_str())
            .collect();

        assert_eq!(codes, vec!["3", "20"]);
        assert_eq!(codes, summary_codes);
        assert!(bundle.salary_detail[1].male.is_none());
        assert_eq!(bundle.salary_detail[1].female.map(|s| s.count), Some(3));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let mut records = occupation("1", 5, 800.0, 5, 1000.0);
        records.extend(occupation("2", 4, 990.0, 6, 1000.0));

        let first = aggregate_records(&records, 3);
        records.reverse();
        let second = aggregate_records(&records, 3);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_mixed_codes_group_into_one_row_each() {
        let codes = ["9", "10", "1a", "9", "10", "1a", "2", "0x", "100", "9", "1a"];
        let records: Vec<PayrollRecord> = codes
            .iter()
            .enumerate()
            .flat_map(|(i, code)| {
                vec![
                    create_test_record(code, "F", "Parda", 1000.0, (2024, 1), &format!("f{i}")),
                    create_test_record(code, "M", "Parda", 1000.0, (2024, 1), &format!("m{i}")),
                ]
            })
            .collect();

        let bundle = aggregate_records(&records, 1);
        let summary: Vec<&str> = bundle
            .occupations
            .iter()
            .map(|s| s.occupation.code.as_str())
            .collect();

        assert_eq!(summary, vec!["2", "9", "10", "100", "0x", "1a"]);
        assert_eq!(stat_for(&bundle, "9").workers_female, Some(3));
        assert_eq!(stat_for(&bundle, "1a").workers_male, Some(3));
        assert_eq!(bundle.distribution.len(), 6);
    }
}
