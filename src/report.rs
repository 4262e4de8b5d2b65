use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::cohort::{
    self, at_or_above, at_risk, count_by, distinct_values, grouped_mean, top_n,
    MonitoringField, SessionField,
};
use crate::error::AnalyticsResult;
use crate::models::{DerivedMonitoringRecord, DerivedSessionRecord, InjuryRisk};

/// Share of the talent distribution treated as elite.
pub const ELITE_QUANTILE: f64 = 0.9;

/// Training-load quantile above which a session counts as high load.
pub const HIGH_LOAD_QUANTILE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_athletes: usize,
    pub sports: usize,
    pub avg_performance: Option<f64>,
    pub high_risk_athletes: usize,
    pub high_risk_share: f64,
}

pub fn summarize_dashboard(records: &[DerivedMonitoringRecord]) -> DashboardSummary {
    let athletes = distinct_values(records.iter().map(|record| record.record().athlete_id()));
    let sports = distinct_values(records.iter().map(|record| record.record().sport_type()));
    let high_risk = distinct_values(
        at_risk(records, InjuryRisk::High)
            .into_iter()
            .map(|record| record.record().athlete_id()),
    );

    let high_risk_share = if athletes.is_empty() {
        0.0
    } else {
        high_risk.len() as f64 / athletes.len() as f64 * 100.0
    };

    DashboardSummary {
        total_athletes: athletes.len(),
        sports: sports.len(),
        avg_performance: cohort::mean(records, MonitoringField::PerformanceScore),
        high_risk_athletes: high_risk.len(),
        high_risk_share,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub total_sessions: usize,
    pub athletes: usize,
    pub avg_duration: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub high_load_threshold: Option<f64>,
}

pub fn summarize_training(sessions: &[DerivedSessionRecord]) -> TrainingSummary {
    let athletes = distinct_values(sessions.iter().map(|session| session.record().athlete_id()));
    // an empty cohort has no threshold
    let high_load_threshold =
        cohort::quantile_threshold(sessions, SessionField::TrainingLoad, HIGH_LOAD_QUANTILE).ok();

    TrainingSummary {
        total_sessions: sessions.len(),
        athletes: athletes.len(),
        avg_duration: cohort::mean(sessions, SessionField::SessionDuration),
        avg_heart_rate: cohort::mean(sessions, SessionField::HeartRateAvg),
        high_load_threshold,
    }
}

/// Mean performance keyed by (`YYYY-MM`, sport).
pub fn monthly_performance(records: &[DerivedMonitoringRecord]) -> BTreeMap<(String, String), f64> {
    grouped_mean(
        records,
        |record| {
            (
                record.record().date().format("%Y-%m").to_string(),
                record.record().sport_type().to_string(),
            )
        },
        MonitoringField::PerformanceScore,
    )
}

/// Talent threshold for the elite quantile and the number of elite records per sport.
pub fn elite_by_sport(
    records: &[DerivedMonitoringRecord],
    q: f64,
) -> AnalyticsResult<(f64, BTreeMap<String, usize>)> {
    let threshold = cohort::quantile_threshold(records, MonitoringField::TalentScore, q)?;
    let elite = at_or_above(records, MonitoringField::TalentScore, threshold);
    let counts = count_by(&elite, |record| record.record().sport_type().to_string());
    Ok((threshold, counts))
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "n/a".to_string(),
    }
}

pub fn build_report(
    records: &[DerivedMonitoringRecord],
    sessions: &[DerivedSessionRecord],
) -> String {
    let mut output = String::new();

    let summary = summarize_dashboard(records);
    let _ = writeln!(output, "# Athlete Performance Report");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Athletes: {}", summary.total_athletes);
    let _ = writeln!(output, "- Sports disciplines: {}", summary.sports);
    let _ = writeln!(
        output,
        "- Average performance: {}/100",
        format_optional(summary.avg_performance, 1)
    );
    let _ = writeln!(
        output,
        "- High-risk athletes: {} ({:.1}%)",
        summary.high_risk_athletes, summary.high_risk_share
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance by Sport");
    let by_sport = grouped_mean(
        records,
        |record| record.record().sport_type().to_string(),
        MonitoringField::PerformanceScore,
    );
    if by_sport.is_empty() {
        let _ = writeln!(output, "No monitoring records loaded.");
    } else {
        let counts = count_by(records, |record| record.record().sport_type().to_string());
        for (sport, avg) in by_sport.iter() {
            let _ = writeln!(
                output,
                "- {}: {} records (avg performance {:.1})",
                sport,
                counts.get(sport).copied().unwrap_or_default(),
                avg
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Injury Risk");
    let risk_counts = count_by(records, |record| record.record().injury_risk());
    for (risk, count) in risk_counts.iter() {
        let _ = writeln!(output, "- {risk}: {count} records");
    }
    let flagged = at_risk(records, InjuryRisk::High);
    if flagged.is_empty() {
        let _ = writeln!(output, "No high-risk records.");
    } else {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Requiring Attention");
        for record in flagged.iter().take(10) {
            let record = record.record();
            let _ = writeln!(
                output,
                "- {} ({}) fatigue {}/10, sleep {:.1}h, recovery {:.0}",
                record.athlete_id(),
                record.sport_type(),
                record.fatigue_level(),
                record.sleep_hours(),
                record.recovery_index()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Elite Athletes");
    match elite_by_sport(records, ELITE_QUANTILE) {
        Ok((threshold, counts)) => {
            let _ = writeln!(output, "Talent score threshold {threshold:.1} (top 10%)");
            for (sport, count) in counts.iter() {
                let _ = writeln!(output, "- {sport}: {count} elite records");
            }
        }
        Err(_) => {
            let _ = writeln!(output, "No monitoring records loaded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Training Sessions");
    let training = summarize_training(sessions);
    if training.total_sessions == 0 {
        let _ = writeln!(output, "No training sessions loaded.");
    } else {
        let _ = writeln!(
            output,
            "- {} sessions across {} athletes",
            training.total_sessions, training.athletes
        );
        let _ = writeln!(
            output,
            "- Average duration {} min, average heart rate {} bpm",
            format_optional(training.avg_duration, 0),
            format_optional(training.avg_heart_rate, 0)
        );
        let _ = writeln!(
            output,
            "- High load threshold {}",
            format_optional(training.high_load_threshold, 1)
        );
        let zones = count_by(sessions, |session| session.hr_zone());
        for (zone, count) in zones.iter() {
            let _ = writeln!(output, "- {zone}: {count} sessions");
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "### Top Training Performances");
        for session in top_n(sessions, SessionField::TrainingEfficiency, 10) {
            let _ = writeln!(
                output,
                "- {} ({}) efficiency {:.1}, {}",
                session.record().athlete_id(),
                session.record().sport_type(),
                session.training_efficiency(),
                session.record().performance_level()
            );
        }
    }

    output
}
