use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{AthleteMonitoringRecord, TrainingSessionRecord};

pub const DEFAULT_ATHLETE_DATA: &str = "Athlete_Training_Recovery_Tracker_Dataset.csv";
pub const DEFAULT_SESSION_DATA: &str = "sports_training_dataset.csv";

pub fn load_monitoring(path: &Path) -> anyhow::Result<Vec<AthleteMonitoringRecord>> {
    let reader = open(path)?;
    let records = read_rows(reader, "monitoring", AthleteMonitoringRecord::new)
        .and_then(unique_observations)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded athlete monitoring records");
    Ok(records)
}

pub fn load_sessions(path: &Path) -> anyhow::Result<Vec<TrainingSessionRecord>> {
    let reader = open(path)?;
    let records = read_rows(reader, "session", TrainingSessionRecord::new)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded training sessions");
    Ok(records)
}

pub fn monitoring_from_reader<R: Read>(input: R) -> anyhow::Result<Vec<AthleteMonitoringRecord>> {
    read_rows(builder().from_reader(input), "monitoring", AthleteMonitoringRecord::new)
        .and_then(unique_observations)
}

pub fn sessions_from_reader<R: Read>(input: R) -> anyhow::Result<Vec<TrainingSessionRecord>> {
    read_rows(builder().from_reader(input), "session", TrainingSessionRecord::new)
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

fn open(path: &Path) -> anyhow::Result<csv::Reader<std::fs::File>> {
    builder()
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn read_rows<R, Raw, T, F>(
    mut reader: csv::Reader<R>,
    kind: &str,
    validate: F,
) -> anyhow::Result<Vec<T>>
where
    R: Read,
    Raw: DeserializeOwned,
    F: Fn(Raw) -> AnalyticsResult<T>,
{
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<Raw>().enumerate() {
        // line 1 is the header
        let line = index + 2;
        let raw = result.with_context(|| format!("malformed {kind} row on line {line}"))?;
        let record = validate(raw).with_context(|| format!("invalid {kind} row on line {line}"))?;
        records.push(record);
    }

    tracing::debug!(kind, rows = records.len(), "parsed csv rows");
    Ok(records)
}

/// An athlete has at most one monitoring observation per date.
fn unique_observations(
    records: Vec<AthleteMonitoringRecord>,
) -> anyhow::Result<Vec<AthleteMonitoringRecord>> {
    let mut seen = HashSet::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let line = index + 2;
        if !seen.insert((record.athlete_id(), record.date())) {
            let err = AnalyticsError::validation(
                "athlete_id/date",
                format!("{} already has a record on {}", record.athlete_id(), record.date()),
            );
            return Err(err).with_context(|| format!("invalid monitoring row on line {line}"));
        }
    }

    Ok(records)
}
