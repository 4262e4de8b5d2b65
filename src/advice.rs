//! Threshold-driven advisories for monitoring records and training sessions.
//!
//! Rules run in a fixed order and the output keeps that order.

use std::fmt;

use serde::Serialize;

use crate::models::{DerivedMonitoringRecord, DerivedSessionRecord, InjuryRisk, PerformanceLevel};

/// Advisory raised for an athlete monitoring record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringAdvice {
    HighFatigue,
    ModerateFatigue,
    LowFatigue,
    IncreaseSleep,
    ConsultNutritionist,
    AddRecoverySessions,
    MedicalAssessment,
}

impl MonitoringAdvice {
    pub fn category(&self) -> &'static str {
        match self {
            MonitoringAdvice::HighFatigue => "HIGH FATIGUE",
            MonitoringAdvice::ModerateFatigue => "MODERATE FATIGUE",
            MonitoringAdvice::LowFatigue => "LOW FATIGUE",
            MonitoringAdvice::IncreaseSleep => "SLEEP",
            MonitoringAdvice::ConsultNutritionist => "NUTRITION",
            MonitoringAdvice::AddRecoverySessions => "RECOVERY",
            MonitoringAdvice::MedicalAssessment => "INJURY RISK",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            MonitoringAdvice::HighFatigue => "high fatigue, reduce intensity 30%",
            MonitoringAdvice::ModerateFatigue => "moderate fatigue, add recovery",
            MonitoringAdvice::LowFatigue => "low fatigue, may increase intensity 10-15%",
            MonitoringAdvice::IncreaseSleep => "increase sleep to 8-9h",
            MonitoringAdvice::ConsultNutritionist => "consult nutritionist",
            MonitoringAdvice::AddRecoverySessions => "add recovery sessions",
            MonitoringAdvice::MedicalAssessment => "medical assessment required",
        }
    }
}

impl fmt::Display for MonitoringAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Advisory raised for a training session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAdvice {
    IncreaseIntensity,
    ReduceIntensity,
    FocusAerobicCapacity,
    MaintainProgram,
    PrioritizeSkills,
    AdvancedTechnique,
    ExtendSession,
    ShortenSession,
    ProgressionPlan,
}

impl SessionAdvice {
    pub fn category(&self) -> &'static str {
        match self {
            SessionAdvice::IncreaseIntensity | SessionAdvice::ReduceIntensity => "INTENSITY",
            SessionAdvice::FocusAerobicCapacity | SessionAdvice::MaintainProgram => "ENDURANCE",
            SessionAdvice::PrioritizeSkills | SessionAdvice::AdvancedTechnique => "TECHNIQUE",
            SessionAdvice::ExtendSession | SessionAdvice::ShortenSession => "DURATION",
            SessionAdvice::ProgressionPlan => "PERFORMANCE",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SessionAdvice::IncreaseIntensity => "increase intensity",
            SessionAdvice::ReduceIntensity => "reduce intensity, overexertion risk",
            SessionAdvice::FocusAerobicCapacity => "focus on aerobic capacity",
            SessionAdvice::MaintainProgram => "excellent, maintain program",
            SessionAdvice::PrioritizeSkills => "prioritize skill development",
            SessionAdvice::AdvancedTechnique => "advanced level achieved",
            SessionAdvice::ExtendSession => "extend session length",
            SessionAdvice::ShortenSession => "consider shorter intense sessions",
            SessionAdvice::ProgressionPlan => "implement progression plan",
        }
    }
}

impl fmt::Display for SessionAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A stateless rule evaluator over one derived record.
pub trait Advisor {
    type Record;
    type Advice;

    fn advise(&self, record: &Self::Record) -> Vec<Self::Advice>;
}

/// Fatigue, sleep, nutrition, recovery and injury-risk rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitoringAdvisor;

impl Advisor for MonitoringAdvisor {
    type Record = DerivedMonitoringRecord;
    type Advice = MonitoringAdvice;

    fn advise(&self, derived: &DerivedMonitoringRecord) -> Vec<MonitoringAdvice> {
        let record = derived.record();
        let mut advice = Vec::with_capacity(5);

        advice.push(match record.fatigue_level() {
            8..=u8::MAX => MonitoringAdvice::HighFatigue,
            6..=7 => MonitoringAdvice::ModerateFatigue,
            _ => MonitoringAdvice::LowFatigue,
        });

        if record.sleep_hours() < 7.0 {
            advice.push(MonitoringAdvice::IncreaseSleep);
        }
        if record.nutrition_score() < 70.0 {
            advice.push(MonitoringAdvice::ConsultNutritionist);
        }
        if record.recovery_index() < 60.0 {
            advice.push(MonitoringAdvice::AddRecoverySessions);
        }
        if record.injury_risk() == InjuryRisk::High {
            advice.push(MonitoringAdvice::MedicalAssessment);
        }

        advice
    }
}

/// Heart-rate, endurance, technique, duration and performance-level rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionAdvisor;

impl Advisor for SessionAdvisor {
    type Record = DerivedSessionRecord;
    type Advice = SessionAdvice;

    fn advise(&self, derived: &DerivedSessionRecord) -> Vec<SessionAdvice> {
        let record = derived.record();
        let mut advice = Vec::new();

        let heart_rate = record.heart_rate_avg();
        if heart_rate < 120.0 {
            advice.push(SessionAdvice::IncreaseIntensity);
        } else if heart_rate > 170.0 {
            advice.push(SessionAdvice::ReduceIntensity);
        }

        let endurance = record.endurance_score();
        if endurance < 60.0 {
            advice.push(SessionAdvice::FocusAerobicCapacity);
        } else if endurance > 90.0 {
            advice.push(SessionAdvice::MaintainProgram);
        }

        let technique = record.technique_score();
        if technique < 60.0 {
            advice.push(SessionAdvice::PrioritizeSkills);
        } else if technique > 85.0 {
            advice.push(SessionAdvice::AdvancedTechnique);
        }

        let duration = record.session_duration();
        if duration < 30.0 {
            advice.push(SessionAdvice::ExtendSession);
        } else if duration > 90.0 {
            advice.push(SessionAdvice::ShortenSession);
        }

        if record.performance_level() == PerformanceLevel::NeedsImprovement {
            advice.push(SessionAdvice::ProgressionPlan);
        }

        advice
    }
}

pub fn monitoring_advice(record: &DerivedMonitoringRecord) -> Vec<MonitoringAdvice> {
    MonitoringAdvisor.advise(record)
}

pub fn session_advice(record: &DerivedSessionRecord) -> Vec<SessionAdvice> {
    SessionAdvisor.advise(record)
}
