use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum InjuryRisk {
    Low,
    Medium,
    High,
}

impl InjuryRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            InjuryRisk::Low => "Low",
            InjuryRisk::Medium => "Medium",
            InjuryRisk::High => "High",
        }
    }
}

impl FromStr for InjuryRisk {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Low" => Ok(InjuryRisk::Low),
            "Medium" => Ok(InjuryRisk::Medium),
            "High" => Ok(InjuryRisk::High),
            other => Err(AnalyticsError::validation(
                "injury_risk",
                format!("expected Low, Medium or High, got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for InjuryRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PerformanceLevel {
    Excellent,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Average => "Average",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl FromStr for PerformanceLevel {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Excellent" => Ok(PerformanceLevel::Excellent),
            "Average" => Ok(PerformanceLevel::Average),
            "Needs Improvement" => Ok(PerformanceLevel::NeedsImprovement),
            other => Err(AnalyticsError::validation(
                "performance_level",
                format!("expected Excellent, Average or Needs Improvement, got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            other => Err(AnalyticsError::validation(
                "gender",
                format!("expected Male, Female or Other, got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heart-rate derived training intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HrZone {
    #[serde(rename = "Low Intensity")]
    Low,
    #[serde(rename = "Moderate Intensity")]
    Moderate,
    #[serde(rename = "High Intensity")]
    High,
    #[serde(rename = "Maximum Intensity")]
    Maximum,
}

impl HrZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            HrZone::Low => "Low Intensity",
            HrZone::Moderate => "Moderate Intensity",
            HrZone::High => "High Intensity",
            HrZone::Maximum => "Maximum Intensity",
        }
    }
}

impl fmt::Display for HrZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "18-20")]
    UpTo20,
    #[serde(rename = "21-23")]
    From21To23,
    #[serde(rename = "24+")]
    From24,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::UpTo20 => "18-20",
            AgeGroup::From21To23 => "21-23",
            AgeGroup::From24 => "24+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the athlete monitoring dataset, as handed over by the loader.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMonitoringRecord {
    #[serde(rename = "Athlete_ID")]
    pub athlete_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Sport_Type")]
    pub sport_type: String,
    #[serde(rename = "Performance_Score")]
    pub performance_score: f64,
    #[serde(rename = "Fatigue_Level")]
    pub fatigue_level: u8,
    #[serde(rename = "Recovery_Index")]
    pub recovery_index: f64,
    #[serde(rename = "Nutrition_Score")]
    pub nutrition_score: f64,
    #[serde(rename = "Sleep_Hours")]
    pub sleep_hours: f64,
    #[serde(rename = "Injury_Risk")]
    pub injury_risk: String,
    #[serde(rename = "Training_Hours")]
    pub training_hours: f64,
}

/// A validated athlete monitoring observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteMonitoringRecord {
    athlete_id: String,
    date: NaiveDate,
    sport_type: String,
    performance_score: f64,
    fatigue_level: u8,
    recovery_index: f64,
    nutrition_score: f64,
    sleep_hours: f64,
    injury_risk: InjuryRisk,
    training_hours: f64,
}

impl AthleteMonitoringRecord {
    pub fn new(raw: RawMonitoringRecord) -> AnalyticsResult<Self> {
        if raw.fatigue_level > 10 {
            return Err(AnalyticsError::validation(
                "fatigue_level",
                format!("{} is outside [0, 10]", raw.fatigue_level),
            ));
        }

        Ok(Self {
            athlete_id: non_empty("athlete_id", raw.athlete_id)?,
            date: raw.date,
            sport_type: non_empty("sport_type", raw.sport_type)?,
            performance_score: score("performance_score", raw.performance_score)?,
            fatigue_level: raw.fatigue_level,
            recovery_index: score("recovery_index", raw.recovery_index)?,
            nutrition_score: score("nutrition_score", raw.nutrition_score)?,
            sleep_hours: non_negative("sleep_hours", raw.sleep_hours)?,
            injury_risk: raw.injury_risk.parse()?,
            training_hours: non_negative("training_hours", raw.training_hours)?,
        })
    }

    pub fn athlete_id(&self) -> &str {
        &self.athlete_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sport_type(&self) -> &str {
        &self.sport_type
    }

    pub fn performance_score(&self) -> f64 {
        self.performance_score
    }

    pub fn fatigue_level(&self) -> u8 {
        self.fatigue_level
    }

    pub fn recovery_index(&self) -> f64 {
        self.recovery_index
    }

    pub fn nutrition_score(&self) -> f64 {
        self.nutrition_score
    }

    pub fn sleep_hours(&self) -> f64 {
        self.sleep_hours
    }

    pub fn injury_risk(&self) -> InjuryRisk {
        self.injury_risk
    }

    pub fn training_hours(&self) -> f64 {
        self.training_hours
    }
}

/// One row of the training session dataset, as handed over by the loader.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSessionRecord {
    #[serde(rename = "Athlete_ID")]
    pub athlete_id: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Sport_Type")]
    pub sport_type: String,
    #[serde(rename = "Heart_Rate_Avg")]
    pub heart_rate_avg: f64,
    #[serde(rename = "Endurance_Score")]
    pub endurance_score: f64,
    #[serde(rename = "Technique_Score")]
    pub technique_score: f64,
    #[serde(rename = "Session_Duration")]
    pub session_duration: f64,
    #[serde(rename = "Distance_Covered")]
    pub distance_covered: f64,
    #[serde(rename = "Speed_Avg")]
    pub speed_avg: f64,
    #[serde(rename = "Performance_Level")]
    pub performance_level: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Gender")]
    pub gender: String,
}

/// A validated training session.
///
/// `session_duration` is only checked for being finite here; a non-positive
/// duration is reported by metric derivation, where it makes the rate terms
/// undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSessionRecord {
    athlete_id: String,
    date: NaiveDate,
    sport_type: String,
    heart_rate_avg: f64,
    endurance_score: f64,
    technique_score: f64,
    session_duration: f64,
    distance_covered: f64,
    speed_avg: f64,
    performance_level: PerformanceLevel,
    age: u32,
    gender: Gender,
}

impl TrainingSessionRecord {
    pub fn new(raw: RawSessionRecord) -> AnalyticsResult<Self> {
        Ok(Self {
            athlete_id: non_empty("athlete_id", raw.athlete_id)?,
            date: raw.date,
            sport_type: non_empty("sport_type", raw.sport_type)?,
            heart_rate_avg: non_negative("heart_rate_avg", raw.heart_rate_avg)?,
            endurance_score: score("endurance_score", raw.endurance_score)?,
            technique_score: score("technique_score", raw.technique_score)?,
            session_duration: finite("session_duration", raw.session_duration)?,
            distance_covered: non_negative("distance_covered", raw.distance_covered)?,
            speed_avg: non_negative("speed_avg", raw.speed_avg)?,
            performance_level: raw.performance_level.parse()?,
            age: raw.age,
            gender: raw.gender.parse()?,
        })
    }

    pub fn athlete_id(&self) -> &str {
        &self.athlete_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sport_type(&self) -> &str {
        &self.sport_type
    }

    pub fn heart_rate_avg(&self) -> f64 {
        self.heart_rate_avg
    }

    pub fn endurance_score(&self) -> f64 {
        self.endurance_score
    }

    pub fn technique_score(&self) -> f64 {
        self.technique_score
    }

    pub fn session_duration(&self) -> f64 {
        self.session_duration
    }

    pub fn distance_covered(&self) -> f64 {
        self.distance_covered
    }

    pub fn speed_avg(&self) -> f64 {
        self.speed_avg
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        self.performance_level
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }
}

/// A monitoring record enriched with its talent score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMonitoringRecord {
    #[serde(flatten)]
    record: AthleteMonitoringRecord,
    talent_score: f64,
}

impl DerivedMonitoringRecord {
    pub(crate) fn new(record: AthleteMonitoringRecord, talent_score: f64) -> Self {
        Self {
            record,
            talent_score,
        }
    }

    pub fn record(&self) -> &AthleteMonitoringRecord {
        &self.record
    }

    pub fn talent_score(&self) -> f64 {
        self.talent_score
    }
}

/// A training session enriched with zone, efficiency, load and age group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSessionRecord {
    #[serde(flatten)]
    record: TrainingSessionRecord,
    hr_zone: HrZone,
    training_efficiency: f64,
    training_load: f64,
    age_group: Option<AgeGroup>,
}

impl DerivedSessionRecord {
    pub(crate) fn new(
        record: TrainingSessionRecord,
        hr_zone: HrZone,
        training_efficiency: f64,
        training_load: f64,
        age_group: Option<AgeGroup>,
    ) -> Self {
        Self {
            record,
            hr_zone,
            training_efficiency,
            training_load,
            age_group,
        }
    }

    pub fn record(&self) -> &TrainingSessionRecord {
        &self.record
    }

    pub fn hr_zone(&self) -> HrZone {
        self.hr_zone
    }

    pub fn training_efficiency(&self) -> f64 {
        self.training_efficiency
    }

    pub fn training_load(&self) -> f64 {
        self.training_load
    }

    /// The session's age bucket, or `UnclassifiedBucket` when the athlete's
    /// age is outside every bucket.
    pub fn age_group(&self) -> AnalyticsResult<AgeGroup> {
        self.age_group
            .ok_or(AnalyticsError::UnclassifiedBucket {
                age: self.record.age,
            })
    }

    pub fn is_bucketed(&self) -> bool {
        self.age_group.is_some()
    }
}

fn non_empty(field: &'static str, value: String) -> AnalyticsResult<String> {
    if value.trim().is_empty() {
        return Err(AnalyticsError::validation(field, "must not be empty"));
    }
    Ok(value)
}

fn finite(field: &'static str, value: f64) -> AnalyticsResult<f64> {
    if !value.is_finite() {
        return Err(AnalyticsError::validation(field, format!("{value} is not a finite number")));
    }
    // folds -0.0 into 0.0
    Ok(value + 0.0)
}

fn non_negative(field: &'static str, value: f64) -> AnalyticsResult<f64> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(AnalyticsError::validation(field, format!("{value} is negative")));
    }
    Ok(value)
}

fn score(field: &'static str, value: f64) -> AnalyticsResult<f64> {
    let value = finite(field, value)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(AnalyticsError::validation(field, format!("{value} is outside [0, 100]")));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn raw_monitoring(athlete_id: &str, sport: &str) -> RawMonitoringRecord {
        RawMonitoringRecord {
            athlete_id: athlete_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            sport_type: sport.to_string(),
            performance_score: 80.0,
            fatigue_level: 4,
            recovery_index: 75.0,
            nutrition_score: 82.0,
            sleep_hours: 8.0,
            injury_risk: "Low".to_string(),
            training_hours: 3.0,
        }
    }

    pub fn raw_session(athlete_id: &str, sport: &str) -> RawSessionRecord {
        RawSessionRecord {
            athlete_id: athlete_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            sport_type: sport.to_string(),
            heart_rate_avg: 150.0,
            endurance_score: 75.0,
            technique_score: 70.0,
            session_duration: 60.0,
            distance_covered: 6000.0,
            speed_avg: 5.0,
            performance_level: "Average".to_string(),
            age: 22,
            gender: "Female".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn accepts_well_formed_monitoring_row() {
        let record = AthleteMonitoringRecord::new(raw_monitoring("A001", "Swimming")).unwrap();
        assert_eq!(record.athlete_id(), "A001");
        assert_eq!(record.injury_risk(), InjuryRisk::Low);
        assert_eq!(record.fatigue_level(), 4);
    }

    #[test]
    fn rejects_fatigue_above_ten() {
        let mut raw = raw_monitoring("A001", "Swimming");
        raw.fatigue_level = 11;
        let err = AthleteMonitoringRecord::new(raw).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Validation {
                field: "fatigue_level",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_injury_risk() {
        let mut raw = raw_monitoring("A001", "Swimming");
        raw.injury_risk = "Severe".to_string();
        let err = AthleteMonitoringRecord::new(raw).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Validation {
                field: "injury_risk",
                ..
            }
        ));
    }

    #[test]
    fn rejects_scores_outside_percent_range() {
        let mut raw = raw_monitoring("A001", "Swimming");
        raw.recovery_index = 101.0;
        assert!(AthleteMonitoringRecord::new(raw).is_err());

        let mut raw = raw_session("A001", "Swimming");
        raw.technique_score = -1.0;
        assert!(TrainingSessionRecord::new(raw).is_err());
    }

    #[test]
    fn rejects_blank_athlete_id() {
        let raw = raw_monitoring("  ", "Swimming");
        let err = AthleteMonitoringRecord::new(raw).unwrap_err();
        assert_eq!(err.to_string(), "invalid athlete_id: must not be empty");
    }

    #[test]
    fn session_keeps_non_positive_duration_for_derivation() {
        let mut raw = raw_session("A001", "Running");
        raw.session_duration = 0.0;
        let record = TrainingSessionRecord::new(raw).unwrap();
        assert_eq!(record.session_duration(), 0.0);
    }

    #[test]
    fn session_rejects_nan_duration() {
        let mut raw = raw_session("A001", "Running");
        raw.session_duration = f64::NAN;
        assert!(TrainingSessionRecord::new(raw).is_err());
    }

    #[test]
    fn negative_zero_is_stored_as_zero() {
        let mut raw = raw_monitoring("A001", "Swimming");
        raw.performance_score = -0.0;
        let record = AthleteMonitoringRecord::new(raw).unwrap();
        assert!(record.performance_score().is_sign_positive());
    }

    #[test]
    fn parses_categoricals() {
        assert_eq!(
            "Needs Improvement".parse::<PerformanceLevel>().unwrap(),
            PerformanceLevel::NeedsImprovement
        );
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert!("unknown".parse::<Gender>().is_err());
        assert_eq!(HrZone::Maximum.to_string(), "Maximum Intensity");
        assert_eq!(AgeGroup::From24.to_string(), "24+");
    }
}
