use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use athlete_performance_platform::cohort::{
    self, at_risk, count_by, grouped_mean, latest_monitoring, same_sport, SessionFilter,
};
use athlete_performance_platform::loader::{self, DEFAULT_ATHLETE_DATA, DEFAULT_SESSION_DATA};
use athlete_performance_platform::metrics::{self, PerformanceProfile};
use athlete_performance_platform::models::{
    DerivedMonitoringRecord, DerivedSessionRecord, Gender, InjuryRisk, PerformanceLevel,
};
use athlete_performance_platform::report;
use athlete_performance_platform::{
    monitoring_advice, percentile_rank, session_advice, top_n, MonitoringField, SessionField,
};

#[derive(Parser)]
#[command(name = "athlete-performance")]
#[command(about = "Athlete performance monitoring and talent identification", long_about = None)]
struct Cli {
    /// Athlete monitoring dataset
    #[arg(long, global = true, env = "ATHLETE_DATA", default_value = DEFAULT_ATHLETE_DATA)]
    athletes: PathBuf,
    /// Training session dataset
    #[arg(long, global = true, env = "SESSION_DATA", default_value = DEFAULT_SESSION_DATA)]
    sessions: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline figures and performance trends
    Dashboard,
    /// Injury risk distribution and athletes requiring attention
    Injury {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Top talents within a sport and elite athletes overall
    Talent {
        #[arg(long)]
        sport: Option<String>,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[arg(long, default_value_t = report::ELITE_QUANTILE)]
        quantile: f64,
    },
    /// Latest profile, recommendations and ranking for one athlete
    Profile {
        #[arg(long)]
        athlete: String,
        #[arg(long)]
        json: bool,
    },
    /// Rank an athlete within their sport by any monitoring field
    Rank {
        #[arg(long)]
        athlete: String,
        #[arg(long, default_value = "talent_score")]
        field: MonitoringField,
    },
    /// Training session analysis
    Training {
        #[arg(long)]
        sport: Option<String>,
        #[arg(long)]
        level: Option<PerformanceLevel>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        athlete: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dashboard => dashboard(&load_monitoring(&cli.athletes)?),
        Commands::Injury { limit } => injury(&load_monitoring(&cli.athletes)?, limit),
        Commands::Talent {
            sport,
            limit,
            quantile,
        } => talent(&load_monitoring(&cli.athletes)?, sport.as_deref(), limit, quantile)?,
        Commands::Profile { athlete, json } => {
            profile(&load_monitoring(&cli.athletes)?, &athlete, json)?
        }
        Commands::Rank { athlete, field } => rank(&load_monitoring(&cli.athletes)?, &athlete, field)?,
        Commands::Training {
            sport,
            level,
            gender,
            athlete,
            limit,
        } => {
            let filter = SessionFilter {
                sport,
                performance_level: level,
                gender,
            };
            training(&load_sessions(&cli.sessions)?, &filter, athlete.as_deref(), limit)?
        }
        Commands::Report { out } => {
            let records = load_monitoring(&cli.athletes)?;
            let sessions = load_sessions(&cli.sessions)?;
            let report = report::build_report(&records, &sessions);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_monitoring(path: &Path) -> anyhow::Result<Vec<DerivedMonitoringRecord>> {
    let records = loader::load_monitoring(path)?;
    Ok(metrics::derive_monitoring_batch(records))
}

fn load_sessions(path: &Path) -> anyhow::Result<Vec<DerivedSessionRecord>> {
    let records = loader::load_sessions(path)?;
    metrics::derive_session_batch(records)
        .with_context(|| format!("failed to derive session metrics for {}", path.display()))
}

fn dashboard(records: &[DerivedMonitoringRecord]) {
    let summary = report::summarize_dashboard(records);
    println!("Total athletes: {}", summary.total_athletes);
    println!("Sports disciplines: {}", summary.sports);
    match summary.avg_performance {
        Some(avg) => println!("Avg performance: {avg:.1}/100"),
        None => println!("Avg performance: n/a"),
    }
    println!(
        "High-risk athletes: {} ({:.1}%)",
        summary.high_risk_athletes, summary.high_risk_share
    );

    println!();
    println!("Athletes by sport:");
    let counts = count_by(records, |record| record.record().sport_type().to_string());
    for (sport, count) in counts.iter() {
        println!("- {sport}: {count} records");
    }

    println!();
    println!("Average performance by sport:");
    let by_sport = grouped_mean(
        records,
        |record| record.record().sport_type().to_string(),
        MonitoringField::PerformanceScore,
    );
    for (sport, avg) in by_sport.iter() {
        println!("- {sport}: {avg:.1}");
    }

    println!();
    println!("Monthly performance trend:");
    for ((month, sport), avg) in report::monthly_performance(records).iter() {
        println!("- {month} {sport}: {avg:.1}");
    }
}

fn injury(records: &[DerivedMonitoringRecord], limit: usize) {
    println!("Injury risk distribution:");
    for (risk, count) in count_by(records, |record| record.record().injury_risk()).iter() {
        println!("- {risk}: {count}");
    }

    println!();
    println!("Injury risk by sport:");
    let by_sport = count_by(records, |record| {
        (
            record.record().sport_type().to_string(),
            record.record().injury_risk(),
        )
    });
    for ((sport, risk), count) in by_sport.iter() {
        println!("- {sport} / {risk}: {count}");
    }

    let flagged = at_risk(records, InjuryRisk::High);
    println!();
    if flagged.is_empty() {
        println!("No high-risk athletes.");
        return;
    }

    println!("High-risk athletes requiring attention:");
    for record in flagged.iter().take(limit) {
        let record = record.record();
        println!(
            "- {} ({}) fatigue {}/10, sleep {:.1}h, recovery {:.0}",
            record.athlete_id(),
            record.sport_type(),
            record.fatigue_level(),
            record.sleep_hours(),
            record.recovery_index()
        );
    }
}

fn talent(
    records: &[DerivedMonitoringRecord],
    sport: Option<&str>,
    limit: usize,
    quantile: f64,
) -> anyhow::Result<()> {
    if let Some(sport) = sport {
        let sport_cohort = same_sport(records, sport);
        if sport_cohort.is_empty() {
            println!("No athletes found for {sport}.");
        } else {
            println!("Top talents in {sport}:");
            for record in top_n(&sport_cohort, MonitoringField::TalentScore, limit) {
                println!(
                    "- {} talent {:.1}, performance {:.0}, injury risk {}",
                    record.record().athlete_id(),
                    record.talent_score(),
                    record.record().performance_score(),
                    record.record().injury_risk()
                );
            }
        }
        println!();
    }

    println!("Talent score by sport:");
    let by_sport = grouped_mean(
        records,
        |record| record.record().sport_type().to_string(),
        MonitoringField::TalentScore,
    );
    for (sport, avg) in by_sport.iter() {
        println!("- {sport}: {avg:.1}");
    }

    let (threshold, elite) = report::elite_by_sport(records, quantile)?;
    println!();
    println!(
        "Elite athletes (top {:.0}%, score >= {threshold:.1}):",
        (1.0 - quantile) * 100.0
    );
    for (sport, count) in elite.iter() {
        println!("- {sport}: {count}");
    }

    Ok(())
}

fn profile(records: &[DerivedMonitoringRecord], athlete: &str, json: bool) -> anyhow::Result<()> {
    let latest = latest_monitoring(records, athlete)
        .with_context(|| format!("no monitoring records for athlete {athlete}"))?;
    let record = latest.record();
    let profile = PerformanceProfile::from_record(record);
    let advice = monitoring_advice(latest);
    let sport_cohort = same_sport(records, record.sport_type());
    let ranking = percentile_rank(&latest, MonitoringField::PerformanceScore, &sport_cohort)?;
    let history = cohort::athlete_history(records, athlete);

    if json {
        let payload = serde_json::json!({
            "record": latest,
            "profile": profile,
            "recommendations": advice.iter().map(|item| item.message()).collect::<Vec<_>>(),
            "performance_rank": ranking,
            "history_length": history.len(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Athlete {} ({})", record.athlete_id(), record.sport_type());
    println!("- Performance score: {:.0}/100", record.performance_score());
    println!("- Talent score: {:.1}/100", latest.talent_score());
    println!("- Injury risk: {}", record.injury_risk());
    println!("- Fatigue level: {}/10", record.fatigue_level());
    println!("- Recovery index: {:.0}/100", record.recovery_index());
    println!("- Training hours: {:.1}h", record.training_hours());
    println!("- Sleep hours: {:.1}h", record.sleep_hours());
    println!("- Nutrition score: {:.0}/100", record.nutrition_score());

    println!();
    println!("Performance profile:");
    for (axis, value) in profile.axes() {
        println!("- {axis}: {value:.1}");
    }

    println!();
    println!("Recommendations:");
    for item in advice.iter() {
        println!("- {}: {}", item.category(), item.message());
    }

    if history.len() > 1 {
        println!();
        println!("Performance history:");
        for entry in history.iter() {
            println!(
                "- {}: {:.0}",
                entry.record().date(),
                entry.record().performance_score()
            );
        }
    }

    println!();
    println!(
        "Performance rank in {}: {}/{} ({:.1} percentile)",
        record.sport_type(),
        ranking.rank,
        ranking.cohort_size,
        ranking.percentile
    );

    Ok(())
}

fn rank(records: &[DerivedMonitoringRecord], athlete: &str, field: MonitoringField) -> anyhow::Result<()> {
    let latest = latest_monitoring(records, athlete)
        .with_context(|| format!("no monitoring records for athlete {athlete}"))?;
    let sport_cohort = same_sport(records, latest.record().sport_type());
    let ranking = percentile_rank(&latest, field, &sport_cohort)?;

    println!(
        "{} {} rank in {}: {}/{} ({:.1} percentile)",
        athlete,
        field,
        latest.record().sport_type(),
        ranking.rank,
        ranking.cohort_size,
        ranking.percentile
    );
    Ok(())
}

fn training(
    sessions: &[DerivedSessionRecord],
    filter: &SessionFilter,
    athlete: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let filtered = filter.apply(sessions);
    tracing::debug!(matched = filtered.len(), total = sessions.len(), "filtered sessions");

    let summary = report::summarize_training(&filtered);
    if summary.total_sessions == 0 {
        println!("No sessions match these filters.");
        return Ok(());
    }

    println!("Total sessions: {}", summary.total_sessions);
    println!("Athletes in training: {}", summary.athletes);
    if let Some(avg) = summary.avg_duration {
        println!("Avg session duration: {avg:.0} min");
    }
    if let Some(avg) = summary.avg_heart_rate {
        println!("Avg heart rate: {avg:.0} bpm");
    }

    println!();
    println!("Training intensity distribution:");
    for (zone, count) in count_by(&filtered, |session| session.hr_zone()).iter() {
        println!("- {zone}: {count}");
    }

    println!();
    println!("Performance level distribution:");
    for (level, count) in count_by(&filtered, |session| session.record().performance_level()).iter() {
        println!("- {level}: {count}");
    }

    println!();
    println!("Training efficiency by sport:");
    let efficiency = grouped_mean(
        &filtered,
        |session| session.record().sport_type().to_string(),
        SessionField::TrainingEfficiency,
    );
    for (sport, avg) in efficiency.iter() {
        println!("- {sport}: {avg:.1}");
    }

    println!();
    println!("Top training performances:");
    for session in top_n(&filtered, SessionField::TrainingEfficiency, limit) {
        let record = session.record();
        println!(
            "- {} ({}) efficiency {:.1}, endurance {:.1}, technique {:.1}, {}",
            record.athlete_id(),
            record.sport_type(),
            session.training_efficiency(),
            record.endurance_score(),
            record.technique_score(),
            record.performance_level()
        );
    }

    println!();
    println!("Average training load by sport:");
    let load = grouped_mean(
        &filtered,
        |session| session.record().sport_type().to_string(),
        SessionField::TrainingLoad,
    );
    for (sport, avg) in load.iter() {
        println!("- {sport}: {avg:.1}");
    }
    if let Some(threshold) = summary.high_load_threshold {
        println!("High load threshold: {threshold:.1}");
    }

    if let Some(athlete) = athlete {
        println!();
        session_detail(&filtered, athlete)?;
    }

    Ok(())
}

fn session_detail(sessions: &[DerivedSessionRecord], athlete: &str) -> anyhow::Result<()> {
    let history: Vec<&DerivedSessionRecord> = sessions
        .iter()
        .filter(|session| session.record().athlete_id() == athlete)
        .collect();
    let latest = history
        .last()
        .with_context(|| format!("no sessions for athlete {athlete} under these filters"))?;
    let record = latest.record();

    println!("Latest session for {athlete} on {}:", record.date());
    println!("- Performance level: {}", record.performance_level());
    println!("- Heart rate: {:.0} bpm ({})", record.heart_rate_avg(), latest.hr_zone());
    println!("- Duration: {:.0} min", record.session_duration());
    println!("- Endurance score: {:.1}/100", record.endurance_score());
    println!("- Technique score: {:.1}/100", record.technique_score());
    println!("- Training efficiency: {:.1}", latest.training_efficiency());
    println!("- Average speed: {:.1} m/s", record.speed_avg());
    println!("- Distance covered: {:.0} m", record.distance_covered());
    println!("- Training load: {:.1}", latest.training_load());
    match latest.age_group() {
        Ok(group) => println!("- Age group: {group}"),
        Err(err) => println!("- Age group: unbucketed ({err})"),
    }

    println!();
    let advice = session_advice(latest);
    if advice.is_empty() {
        println!("No training adjustments recommended.");
    } else {
        println!("Training recommendations:");
        for item in advice.iter() {
            println!("- {}: {}", item.category(), item.message());
        }
    }

    if history.len() > 1 {
        println!();
        println!("Session history:");
        for session in history.iter() {
            println!(
                "- {}: endurance {:.1}, technique {:.1}",
                session.record().date(),
                session.record().endurance_score(),
                session.record().technique_score()
            );
        }
    }

    Ok(())
}
