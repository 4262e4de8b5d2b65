use athlete_performance_platform::cohort::{latest_monitoring, same_sport, SessionFilter};
use athlete_performance_platform::loader::{monitoring_from_reader, sessions_from_reader};
use athlete_performance_platform::models::{HrZone, PerformanceLevel};
use athlete_performance_platform::report;
use athlete_performance_platform::{
    derive_monitoring_batch, derive_session_batch, monitoring_advice, percentile_rank,
    session_advice, top_n, AnalyticsError, MonitoringField, SessionField,
};

const MONITORING: &str = "\
Athlete_ID,Date,Sport_Type,Performance_Score,Fatigue_Level,Recovery_Index,Nutrition_Score,Sleep_Hours,Injury_Risk,Training_Hours
A001,2024-01-05,Swimming,72,5,70,80,8.0,Low,3.0
A002,2024-01-05,Swimming,88,3,85,90,8.5,Low,4.0
A003,2024-01-06,Swimming,65,9,40,50,5.0,High,5.5
A001,2024-02-05,Swimming,76,9,45,60,6.0,High,3.5
A004,2024-01-07,Athletics,91,2,92,95,9.5,Medium,2.0
";

const SESSIONS: &str = "\
Athlete_ID,Date,Sport_Type,Heart_Rate_Avg,Endurance_Score,Technique_Score,Session_Duration,Distance_Covered,Speed_Avg,Performance_Level,Age,Gender
A001,2024-01-05,Swimming,150,75,70,60,3000,1.5,Average,21,Male
A002,2024-01-05,Swimming,175,95,90,100,5000,1.8,Excellent,24,Female
A003,2024-01-06,Swimming,110,55,50,20,800,1.1,Needs Improvement,19,Male
A004,2024-01-07,Athletics,165,82,88,45,9000,5.2,Excellent,35,Female
";

#[test]
fn monitoring_pipeline_ranks_and_advises() {
    let records = derive_monitoring_batch(monitoring_from_reader(MONITORING.as_bytes()).unwrap());
    assert_eq!(records.len(), 5);

    let latest = latest_monitoring(&records, "A001").unwrap();
    assert_eq!(latest.record().performance_score(), 76.0);

    let advice: Vec<String> = monitoring_advice(latest)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        advice,
        vec![
            "high fatigue, reduce intensity 30%",
            "increase sleep to 8-9h",
            "consult nutritionist",
            "add recovery sessions",
            "medical assessment required",
        ]
    );

    let swimmers = same_sport(&records, "Swimming");
    let ranking = percentile_rank(&latest, MonitoringField::PerformanceScore, &swimmers).unwrap();
    // 72 and 65 are below 76
    assert_eq!(ranking.rank, 3);
    assert_eq!(ranking.cohort_size, 4);
    assert!((ranking.percentile - 25.0).abs() < 1e-9);

    let top = top_n(&swimmers, MonitoringField::TalentScore, 10);
    assert_eq!(top.len(), 4);
    assert_eq!(top[0].record().athlete_id(), "A002");
    assert!(top
        .windows(2)
        .all(|pair| pair[0].talent_score() >= pair[1].talent_score()));

    let summary = report::summarize_dashboard(&records);
    assert_eq!(summary.total_athletes, 4);
    assert_eq!(summary.high_risk_athletes, 2);
}

#[test]
fn session_pipeline_filters_and_advises() {
    let sessions = derive_session_batch(sessions_from_reader(SESSIONS.as_bytes()).unwrap()).unwrap();
    assert_eq!(sessions[0].hr_zone(), HrZone::High);
    assert_eq!(sessions[3].hr_zone(), HrZone::Maximum);
    assert!(session_advice(&sessions[0]).is_empty());
    assert_eq!(session_advice(&sessions[2]).len(), 5);
    assert!(matches!(
        sessions[3].age_group(),
        Err(AnalyticsError::UnclassifiedBucket { age: 35 })
    ));

    let excellent = SessionFilter {
        performance_level: Some(PerformanceLevel::Excellent),
        ..SessionFilter::default()
    }
    .apply(&sessions);
    assert_eq!(excellent.len(), 2);

    let best = top_n(&excellent, SessionField::TrainingEfficiency, 1);
    assert_eq!(best[0].record().athlete_id(), "A004");
}

#[test]
fn zero_duration_session_fails_the_batch() {
    let input = SESSIONS.replace(",45,9000,", ",0,9000,");
    let records = sessions_from_reader(input.as_bytes()).unwrap();
    assert_eq!(
        derive_session_batch(records).unwrap_err(),
        AnalyticsError::DivisionUndefined {
            session_duration: 0.0
        }
    );
}

#[test]
fn report_covers_both_datasets() {
    let records = derive_monitoring_batch(monitoring_from_reader(MONITORING.as_bytes()).unwrap());
    let sessions = derive_session_batch(sessions_from_reader(SESSIONS.as_bytes()).unwrap()).unwrap();
    let markdown = report::build_report(&records, &sessions);

    assert!(markdown.contains("- Athletes: 4"));
    assert!(markdown.contains("- Swimming: 4 records"));
    assert!(markdown.contains("- 4 sessions across 4 athletes"));
    assert!(markdown.contains("### Top Training Performances"));
}
