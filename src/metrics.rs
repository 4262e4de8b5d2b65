//! Per-record metric derivation.
//!
//! Every function here is a pure function of one record. Batch derivation
//! fans out with rayon and keeps input order.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AgeGroup, AthleteMonitoringRecord, DerivedMonitoringRecord, DerivedSessionRecord, HrZone,
    TrainingSessionRecord,
};

/// Reference night of sleep used to project sleep hours onto a 0-100 axis.
pub const SLEEP_REFERENCE_HOURS: f64 = 9.0;

/// Reference daily training volume for the performance profile.
pub const TRAINING_REFERENCE_HOURS: f64 = 6.0;

/// Fixed-weight composite of performance, freshness, recovery, nutrition and sleep.
///
/// Not clamped: sleep above the reference pushes the score past 100.
pub fn talent_score(record: &AthleteMonitoringRecord) -> f64 {
    let freshness = 100.0 - f64::from(record.fatigue_level()) * 10.0;
    let sleep = record.sleep_hours() / SLEEP_REFERENCE_HOURS * 100.0;

    record.performance_score() * 0.4
        + freshness * 0.2
        + record.recovery_index() * 0.2
        + record.nutrition_score() * 0.1
        + sleep * 0.1
}

pub fn hr_zone(heart_rate_avg: f64) -> HrZone {
    if heart_rate_avg < 120.0 {
        HrZone::Low
    } else if heart_rate_avg < 140.0 {
        HrZone::Moderate
    } else if heart_rate_avg < 160.0 {
        HrZone::High
    } else {
        HrZone::Maximum
    }
}

pub fn training_efficiency(record: &TrainingSessionRecord) -> AnalyticsResult<f64> {
    let duration = positive_duration(record)?;
    let distance_rate = record.distance_covered() / duration;

    Ok(record.endurance_score() * 0.4 + record.technique_score() * 0.4 + distance_rate * 10.0 * 0.2)
}

pub fn training_load(record: &TrainingSessionRecord) -> AnalyticsResult<f64> {
    let duration = positive_duration(record)?;
    Ok(duration * (record.heart_rate_avg() / 100.0) * (record.speed_avg() / 10.0))
}

/// Buckets an age into `(0, 20]`, `(20, 23]` or `(23, 30]`.
pub fn age_group(age: u32) -> AnalyticsResult<AgeGroup> {
    match age {
        1..=20 => Ok(AgeGroup::UpTo20),
        21..=23 => Ok(AgeGroup::From21To23),
        24..=30 => Ok(AgeGroup::From24),
        _ => Err(AnalyticsError::UnclassifiedBucket { age }),
    }
}

fn positive_duration(record: &TrainingSessionRecord) -> AnalyticsResult<f64> {
    let session_duration = record.session_duration();
    if session_duration <= 0.0 {
        return Err(AnalyticsError::DivisionUndefined { session_duration });
    }
    Ok(session_duration)
}

pub fn derive_monitoring(record: AthleteMonitoringRecord) -> DerivedMonitoringRecord {
    let score = talent_score(&record);
    DerivedMonitoringRecord::new(record, score)
}

/// Derives every session field. An age outside the buckets is kept as an
/// unbucketed session rather than failing the whole derivation.
pub fn derive_session(record: TrainingSessionRecord) -> AnalyticsResult<DerivedSessionRecord> {
    let zone = hr_zone(record.heart_rate_avg());
    let efficiency = training_efficiency(&record)?;
    let load = training_load(&record)?;
    let group = match age_group(record.age()) {
        Ok(group) => Some(group),
        Err(AnalyticsError::UnclassifiedBucket { .. }) => None,
        Err(err) => return Err(err),
    };

    Ok(DerivedSessionRecord::new(record, zone, efficiency, load, group))
}

pub fn derive_monitoring_batch(
    records: Vec<AthleteMonitoringRecord>,
) -> Vec<DerivedMonitoringRecord> {
    records.into_par_iter().map(derive_monitoring).collect()
}

/// Derives a batch of sessions. When several sessions are invalid the error
/// for the earliest one is returned.
pub fn derive_session_batch(
    records: Vec<TrainingSessionRecord>,
) -> AnalyticsResult<Vec<DerivedSessionRecord>> {
    let derived: Vec<AnalyticsResult<DerivedSessionRecord>> =
        records.into_par_iter().map(derive_session).collect();
    derived.into_iter().collect()
}

/// Radar-chart axes for one monitoring record, each on a nominal 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceProfile {
    pub performance: f64,
    pub recovery: f64,
    pub nutrition: f64,
    pub sleep_quality: f64,
    pub training_load: f64,
}

impl PerformanceProfile {
    pub fn from_record(record: &AthleteMonitoringRecord) -> Self {
        Self {
            performance: record.performance_score(),
            recovery: record.recovery_index(),
            nutrition: record.nutrition_score(),
            sleep_quality: record.sleep_hours() / SLEEP_REFERENCE_HOURS * 100.0,
            training_load: record.training_hours() / TRAINING_REFERENCE_HOURS * 100.0,
        }
    }

    pub fn axes(&self) -> [(&'static str, f64); 5] {
        [
            ("Performance", self.performance),
            ("Recovery", self.recovery),
            ("Nutrition", self.nutrition),
            ("Sleep Quality", self.sleep_quality),
            ("Training Load", self.training_load),
        ]
    }
}
