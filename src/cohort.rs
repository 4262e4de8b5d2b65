//! Aggregation and ranking over caller-selected cohorts.
//!
//! A cohort is any slice of derived records. Nothing here filters by sport or
//! time on its own; callers build the cohort and hand it in.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{
    DerivedMonitoringRecord, DerivedSessionRecord, Gender, InjuryRisk, PerformanceLevel,
};

/// A record that exposes named numeric fields.
pub trait Measured {
    type Field: Copy;

    fn value(&self, field: Self::Field) -> f64;
}

impl<R: Measured + ?Sized> Measured for &R {
    type Field = R::Field;

    fn value(&self, field: Self::Field) -> f64 {
        (**self).value(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoringField {
    PerformanceScore,
    FatigueLevel,
    RecoveryIndex,
    NutritionScore,
    SleepHours,
    TrainingHours,
    TalentScore,
}

impl MonitoringField {
    pub fn name(&self) -> &'static str {
        match self {
            MonitoringField::PerformanceScore => "performance_score",
            MonitoringField::FatigueLevel => "fatigue_level",
            MonitoringField::RecoveryIndex => "recovery_index",
            MonitoringField::NutritionScore => "nutrition_score",
            MonitoringField::SleepHours => "sleep_hours",
            MonitoringField::TrainingHours => "training_hours",
            MonitoringField::TalentScore => "talent_score",
        }
    }
}

impl FromStr for MonitoringField {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "performance_score" => Ok(MonitoringField::PerformanceScore),
            "fatigue_level" => Ok(MonitoringField::FatigueLevel),
            "recovery_index" => Ok(MonitoringField::RecoveryIndex),
            "nutrition_score" => Ok(MonitoringField::NutritionScore),
            "sleep_hours" => Ok(MonitoringField::SleepHours),
            "training_hours" => Ok(MonitoringField::TrainingHours),
            "talent_score" => Ok(MonitoringField::TalentScore),
            other => Err(AnalyticsError::validation(
                "field",
                format!("unknown monitoring field {other:?}"),
            )),
        }
    }
}

impl fmt::Display for MonitoringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Measured for DerivedMonitoringRecord {
    type Field = MonitoringField;

    fn value(&self, field: MonitoringField) -> f64 {
        let record = self.record();
        match field {
            MonitoringField::PerformanceScore => record.performance_score(),
            MonitoringField::FatigueLevel => f64::from(record.fatigue_level()),
            MonitoringField::RecoveryIndex => record.recovery_index(),
            MonitoringField::NutritionScore => record.nutrition_score(),
            MonitoringField::SleepHours => record.sleep_hours(),
            MonitoringField::TrainingHours => record.training_hours(),
            MonitoringField::TalentScore => self.talent_score(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    HeartRateAvg,
    EnduranceScore,
    TechniqueScore,
    SessionDuration,
    DistanceCovered,
    SpeedAvg,
    Age,
    TrainingEfficiency,
    TrainingLoad,
}

impl SessionField {
    pub fn name(&self) -> &'static str {
        match self {
            SessionField::HeartRateAvg => "heart_rate_avg",
            SessionField::EnduranceScore => "endurance_score",
            SessionField::TechniqueScore => "technique_score",
            SessionField::SessionDuration => "session_duration",
            SessionField::DistanceCovered => "distance_covered",
            SessionField::SpeedAvg => "speed_avg",
            SessionField::Age => "age",
            SessionField::TrainingEfficiency => "training_efficiency",
            SessionField::TrainingLoad => "training_load",
        }
    }
}

impl FromStr for SessionField {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "heart_rate_avg" => Ok(SessionField::HeartRateAvg),
            "endurance_score" => Ok(SessionField::EnduranceScore),
            "technique_score" => Ok(SessionField::TechniqueScore),
            "session_duration" => Ok(SessionField::SessionDuration),
            "distance_covered" => Ok(SessionField::DistanceCovered),
            "speed_avg" => Ok(SessionField::SpeedAvg),
            "age" => Ok(SessionField::Age),
            "training_efficiency" => Ok(SessionField::TrainingEfficiency),
            "training_load" => Ok(SessionField::TrainingLoad),
            other => Err(AnalyticsError::validation(
                "field",
                format!("unknown session field {other:?}"),
            )),
        }
    }
}

impl fmt::Display for SessionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Measured for DerivedSessionRecord {
    type Field = SessionField;

    fn value(&self, field: SessionField) -> f64 {
        let record = self.record();
        match field {
            SessionField::HeartRateAvg => record.heart_rate_avg(),
            SessionField::EnduranceScore => record.endurance_score(),
            SessionField::TechniqueScore => record.technique_score(),
            SessionField::SessionDuration => record.session_duration(),
            SessionField::DistanceCovered => record.distance_covered(),
            SessionField::SpeedAvg => record.speed_avg(),
            SessionField::Age => f64::from(record.age()),
            SessionField::TrainingEfficiency => self.training_efficiency(),
            SessionField::TrainingLoad => self.training_load(),
        }
    }
}

/// Mean of `field` per group. Groups with no records simply do not appear.
pub fn grouped_mean<R, K, F>(records: &[R], key: F, field: R::Field) -> BTreeMap<K, f64>
where
    R: Measured,
    K: Ord,
    F: Fn(&R) -> K,
{
    let mut totals: BTreeMap<K, (f64, usize)> = BTreeMap::new();

    for record in records {
        let entry = totals.entry(key(record)).or_insert((0.0, 0));
        entry.0 += record.value(field);
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(group, (total, count))| (group, total / count as f64))
        .collect()
}

pub fn mean<R: Measured>(records: &[R], field: R::Field) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: f64 = records.iter().map(|record| record.value(field)).sum();
    Some(total / records.len() as f64)
}

pub fn count_by<R, K, F>(records: &[R], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&R) -> K,
{
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(key(record)).or_insert(0) += 1;
    }
    counts
}

/// The `n` records with the largest `field`, descending. Ties keep input order.
pub fn top_n<R: Measured>(records: &[R], field: R::Field, n: usize) -> Vec<&R> {
    let mut ranked: Vec<&R> = records.iter().collect();
    ranked.sort_by(|a, b| {
        b.value(field)
            .partial_cmp(&a.value(field))
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

/// The `q`-th quantile of `field`, linearly interpolated between order statistics.
pub fn quantile_threshold<R: Measured>(
    records: &[R],
    field: R::Field,
    q: f64,
) -> AnalyticsResult<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(AnalyticsError::validation(
            "quantile",
            format!("{q} is outside [0, 1]"),
        ));
    }
    if records.is_empty() {
        return Err(AnalyticsError::EmptyCohort {
            operation: "quantile threshold",
        });
    }

    let mut values: Vec<f64> = records.iter().map(|record| record.value(field)).collect();
    values.sort_by(f64::total_cmp);

    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Ok(values[lower] + (values[upper] - values[lower]) * fraction)
}

/// Records whose `field` is at or above the `q`-th quantile, in input order.
pub fn elite_subset<R: Measured>(
    records: &[R],
    field: R::Field,
    q: f64,
) -> AnalyticsResult<Vec<&R>> {
    let threshold = quantile_threshold(records, field, q)?;
    Ok(at_or_above(records, field, threshold))
}

/// Records whose `field` is at or above `threshold`, in input order.
pub fn at_or_above<R: Measured>(records: &[R], field: R::Field, threshold: f64) -> Vec<&R> {
    records
        .iter()
        .filter(|record| record.value(field) >= threshold)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileRank {
    pub rank: usize,
    pub cohort_size: usize,
    pub percentile: f64,
}

/// Ranks `record` within `cohort` by `field`.
///
/// Rank is one plus the number of cohort records strictly below the record's
/// value, so tied records share a rank.
pub fn percentile_rank<R: Measured>(
    record: &R,
    field: R::Field,
    cohort: &[R],
) -> AnalyticsResult<PercentileRank> {
    if cohort.is_empty() {
        return Err(AnalyticsError::EmptyCohort {
            operation: "percentile rank",
        });
    }

    let value = record.value(field);
    let below = cohort
        .iter()
        .filter(|other| other.value(field) < value)
        .count();
    let rank = below + 1;
    let cohort_size = cohort.len();
    let percentile = (cohort_size as f64 - rank as f64) / cohort_size as f64 * 100.0;

    Ok(PercentileRank {
        rank,
        cohort_size,
        percentile,
    })
}

/// Monitoring records at the given injury-risk level, in input order.
pub fn at_risk(
    records: &[DerivedMonitoringRecord],
    level: InjuryRisk,
) -> Vec<&DerivedMonitoringRecord> {
    records
        .iter()
        .filter(|record| record.record().injury_risk() == level)
        .collect()
}

/// Distinct identifiers (athlete ids, sports) in sorted order.
pub fn distinct_values<'a, I>(values: I) -> BTreeSet<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().collect()
}

/// One athlete's monitoring history ordered by date.
pub fn athlete_history<'a>(
    records: &'a [DerivedMonitoringRecord],
    athlete_id: &str,
) -> Vec<&'a DerivedMonitoringRecord> {
    let mut history: Vec<&DerivedMonitoringRecord> = records
        .iter()
        .filter(|record| record.record().athlete_id() == athlete_id)
        .collect();
    history.sort_by_key(|record| record.record().date());
    history
}

/// The athlete's last monitoring record in input order.
pub fn latest_monitoring<'a>(
    records: &'a [DerivedMonitoringRecord],
    athlete_id: &str,
) -> Option<&'a DerivedMonitoringRecord> {
    records
        .iter()
        .rev()
        .find(|record| record.record().athlete_id() == athlete_id)
}

pub fn same_sport<'a>(
    records: &'a [DerivedMonitoringRecord],
    sport: &str,
) -> Vec<&'a DerivedMonitoringRecord> {
    records
        .iter()
        .filter(|record| record.record().sport_type() == sport)
        .collect()
}

/// Conjunctive session filter; an unset predicate matches everything.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub sport: Option<String>,
    pub performance_level: Option<PerformanceLevel>,
    pub gender: Option<Gender>,
}

impl SessionFilter {
    pub fn matches(&self, session: &DerivedSessionRecord) -> bool {
        let record = session.record();
        self.sport
            .as_deref()
            .map_or(true, |sport| record.sport_type() == sport)
            && self
                .performance_level
                .map_or(true, |level| record.performance_level() == level)
            && self.gender.map_or(true, |gender| record.gender() == gender)
    }

    pub fn apply(&self, sessions: &[DerivedSessionRecord]) -> Vec<DerivedSessionRecord> {
        sessions
            .iter()
            .filter(|session| self.matches(session))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{derive_monitoring, derive_session};
    use crate::models::fixtures::{raw_monitoring, raw_session};
    use crate::models::{AthleteMonitoringRecord, TrainingSessionRecord};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn athlete(id: &str, sport: &str, performance: f64) -> DerivedMonitoringRecord {
        let mut raw = raw_monitoring(id, sport);
        raw.performance_score = performance;
        derive_monitoring(AthleteMonitoringRecord::new(raw).unwrap())
    }

    fn performances(values: &[f64]) -> Vec<DerivedMonitoringRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| athlete(&format!("A{i:03}"), "Rowing", *value))
            .collect()
    }

    #[test]
    fn grouped_mean_per_sport() {
        let records = vec![
            athlete("A001", "Rowing", 70.0),
            athlete("A002", "Rowing", 90.0),
            athlete("A003", "Judo", 60.0),
        ];
        let means = grouped_mean(
            &records,
            |record| record.record().sport_type().to_string(),
            MonitoringField::PerformanceScore,
        );
        assert_eq!(means.len(), 2);
        assert_relative_eq!(means["Rowing"], 80.0);
        assert_relative_eq!(means["Judo"], 60.0);
    }

    #[test]
    fn grouped_mean_of_nothing_is_empty() {
        let means = grouped_mean(
            &Vec::<DerivedMonitoringRecord>::new(),
            |record| record.record().sport_type().to_string(),
            MonitoringField::TalentScore,
        );
        assert!(means.is_empty());
        assert_eq!(mean(&Vec::<DerivedMonitoringRecord>::new(), MonitoringField::TalentScore), None);
    }

    #[test]
    fn top_n_truncates_to_collection_size() {
        let records = performances(&[55.0, 90.0, 72.0]);
        let top = top_n(&records, MonitoringField::PerformanceScore, 10);
        let values: Vec<f64> = top
            .iter()
            .map(|record| record.value(MonitoringField::PerformanceScore))
            .collect();
        assert_eq!(values, vec![90.0, 72.0, 55.0]);
    }

    #[test]
    fn top_n_breaks_ties_by_input_order() {
        let records = performances(&[80.0, 95.0, 80.0, 80.0]);
        let top = top_n(&records, MonitoringField::PerformanceScore, 3);
        let ids: Vec<&str> = top.iter().map(|record| record.record().athlete_id()).collect();
        assert_eq!(ids, vec!["A001", "A000", "A002"]);
    }

    #[test]
    fn median_is_linearly_interpolated() {
        let records = performances(&[40.0, 10.0, 30.0, 20.0]);
        let median = quantile_threshold(&records, MonitoringField::PerformanceScore, 0.5).unwrap();
        assert_relative_eq!(median, 25.0);

        let p90 = quantile_threshold(&records, MonitoringField::PerformanceScore, 0.9).unwrap();
        assert_relative_eq!(p90, 37.0, epsilon = 1e-9);
        assert_relative_eq!(
            quantile_threshold(&records, MonitoringField::PerformanceScore, 0.0).unwrap(),
            10.0
        );
        assert_relative_eq!(
            quantile_threshold(&records, MonitoringField::PerformanceScore, 1.0).unwrap(),
            40.0
        );
    }

    #[test]
    fn quantile_of_empty_cohort_fails() {
        let err = quantile_threshold(
            &Vec::<DerivedMonitoringRecord>::new(),
            MonitoringField::TalentScore,
            0.9,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyCohort { .. }));
        assert!(elite_subset(&Vec::<DerivedMonitoringRecord>::new(), MonitoringField::TalentScore, 0.9).is_err());
    }

    #[test]
    fn quantile_outside_unit_interval_is_rejected() {
        let records = performances(&[10.0]);
        assert!(matches!(
            quantile_threshold(&records, MonitoringField::PerformanceScore, 1.5),
            Err(AnalyticsError::Validation { field: "quantile", .. })
        ));
    }

    struct Sample(&'static str, f64);

    impl Measured for Sample {
        type Field = ();

        fn value(&self, _: ()) -> f64 {
            self.1
        }
    }

    #[test]
    fn top_n_treats_signed_zeros_as_tied() {
        let samples = [Sample("A001", -0.0), Sample("A002", 0.0), Sample("A003", 1.0)];
        let ids: Vec<&str> = top_n(&samples, (), 3).iter().map(|sample| sample.0).collect();
        assert_eq!(ids, vec!["A003", "A001", "A002"]);
    }

    #[test]
    fn same_sport_borrows_a_rankable_cohort() {
        let records = vec![
            athlete("A001", "Rowing", 60.0),
            athlete("A002", "Judo", 99.0),
            athlete("A003", "Rowing", 80.0),
        ];
        let rowers = same_sport(&records, "Rowing");
        assert_eq!(rowers, vec![&records[0], &records[2]]);

        let ranked = percentile_rank(&rowers[0], MonitoringField::PerformanceScore, &rowers).unwrap();
        assert_eq!(ranked.rank, 1);
        assert_eq!(ranked.cohort_size, 2);
        assert_relative_eq!(ranked.percentile, 50.0);

        let top = top_n(&rowers, MonitoringField::PerformanceScore, 1);
        assert_eq!(top[0].record().athlete_id(), "A003");
    }

    #[test]
    fn at_or_above_keeps_input_order() {
        let records = performances(&[70.0, 20.0, 90.0]);
        let above = at_or_above(&records, MonitoringField::PerformanceScore, 70.0);
        let ids: Vec<&str> = above.iter().map(|record| record.record().athlete_id()).collect();
        assert_eq!(ids, vec!["A000", "A002"]);
    }

    #[test]
    fn elite_subset_includes_threshold_value() {
        let records = performances(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let elite = elite_subset(&records, MonitoringField::PerformanceScore, 0.75).unwrap();
        let ids: Vec<&str> = elite.iter().map(|record| record.record().athlete_id()).collect();
        assert_eq!(ids, vec!["A003", "A004"]);
    }

    #[test]
    fn percentile_rank_counts_strictly_lower_values() {
        let cohort = performances(&[50.0, 60.0, 70.0, 80.0]);
        let ranked = percentile_rank(&cohort[2], MonitoringField::PerformanceScore, &cohort).unwrap();
        assert_eq!(ranked.rank, 3);
        assert_eq!(ranked.cohort_size, 4);
        assert_relative_eq!(ranked.percentile, 25.0);
    }

    #[test]
    fn tied_records_share_a_rank() {
        let cohort = performances(&[50.0, 70.0, 70.0, 90.0]);
        let first = percentile_rank(&cohort[1], MonitoringField::PerformanceScore, &cohort).unwrap();
        let second = percentile_rank(&cohort[2], MonitoringField::PerformanceScore, &cohort).unwrap();
        assert_eq!(first.rank, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn percentile_rank_of_empty_cohort_fails() {
        let record = athlete("A001", "Rowing", 50.0);
        assert_eq!(
            percentile_rank(&record, MonitoringField::PerformanceScore, &[]),
            Err(AnalyticsError::EmptyCohort {
                operation: "percentile rank"
            })
        );
    }

    #[test]
    fn risk_filter_and_history() {
        let mut raw = raw_monitoring("A001", "Rowing");
        raw.injury_risk = "High".to_string();
        raw.date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let late = derive_monitoring(AthleteMonitoringRecord::new(raw).unwrap());

        let mut raw = raw_monitoring("A001", "Rowing");
        raw.date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let early = derive_monitoring(AthleteMonitoringRecord::new(raw).unwrap());

        let records = vec![late.clone(), athlete("A002", "Rowing", 70.0), early.clone()];

        let flagged = at_risk(&records, InjuryRisk::High);
        assert_eq!(flagged, vec![&late]);

        let history = athlete_history(&records, "A001");
        assert_eq!(history, vec![&early, &late]);
        assert_eq!(latest_monitoring(&records, "A001"), Some(&early));
        assert_eq!(latest_monitoring(&records, "A999"), None);

        let ids = distinct_values(records.iter().map(|record| record.record().athlete_id()));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn session_filter_is_conjunctive() {
        let session = |sport: &str, level: &str, gender: &str| {
            let mut raw = raw_session("A001", sport);
            raw.performance_level = level.to_string();
            raw.gender = gender.to_string();
            derive_session(TrainingSessionRecord::new(raw).unwrap()).unwrap()
        };
        let sessions = vec![
            session("Running", "Excellent", "Male"),
            session("Running", "Average", "Female"),
            session("Cycling", "Excellent", "Female"),
        ];

        assert_eq!(SessionFilter::default().apply(&sessions).len(), 3);

        let filter = SessionFilter {
            sport: Some("Running".to_string()),
            performance_level: Some(PerformanceLevel::Excellent),
            gender: None,
        };
        let matched = filter.apply(&sessions);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].record().gender(), Gender::Male);

        let counts = count_by(&sessions, |session| session.record().sport_type().to_string());
        assert_eq!(counts["Running"], 2);
    }

    #[test]
    fn field_names_round_trip() {
        assert_eq!(
            "talent_score".parse::<MonitoringField>().unwrap(),
            MonitoringField::TalentScore
        );
        assert_eq!(SessionField::TrainingLoad.to_string(), "training_load");
        assert!("speed".parse::<SessionField>().is_err());
    }
}
