mod cli;
mod config;
mod dataset;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use audit_engine::{AuditData, AuditEngine, AuditResult, AuditSummary};
use behavior_shield::{
    ActivitySnapshot, AdaptiveShield, BehaviorScorer, MachineRuleSet, ShieldDecision, StandardModel,
};
use diagnostic_log::{JsonlSink, RingLog};
use integrity_core::{DiagnosticSink, EngineConfig};
use sentinel::{ActionSentinel, EconomyData, EconomySentinel};

use crate::cli::{Cli, Command};
use crate::dataset::Dataset;

/// In-memory only, or ring plus JSON-lines file when a log path is set.
/// Both deduplicate through a [`RingLog`].
enum Diagnostics {
    Memory(RingLog),
    File(JsonlSink),
}

impl Diagnostics {
    fn recent(&self) -> &RingLog {
        match self {
            Diagnostics::Memory(ring) => ring,
            Diagnostics::File(sink) => sink.recent(),
        }
    }
}

impl DiagnosticSink for Diagnostics {
    fn record(&self, category: &str, payload: serde_json::Value, subject_id: &str) {
        match self {
            Diagnostics::Memory(ring) => ring.record(category, payload, subject_id),
            Diagnostics::File(sink) => sink.record(category, payload, subject_id),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShieldVerdict<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    decision: ShieldDecision,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditOutput {
    as_of: DateTime<Utc>,
    summary: AuditSummary,
    results: Vec<AuditResult>,
}

fn load_engine_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => integrity_core::loader::load_config(path),
        None => {
            info!("no engine config given; using built-in rule defaults");
            Ok(EngineConfig::default())
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize report")?;
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(&cli.config)?;
    if let Some(ref path) = cli.engine_config {
        cfg.engine_config = Some(path.clone());
    }
    if let Some(ref path) = cli.diagnostic_log {
        cfg.logging.diagnostic_log_path = Some(path.clone());
    }
    if let Some(ref level) = cli.log_level {
        cfg.logging.level = level.clone();
    }

    // Logs go to stderr so stdout carries only the JSON report.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        config_file = %cli.config.display(),
        engine_config = ?cfg.engine_config,
        "trust-engine starting"
    );

    let engine_config = load_engine_config(cfg.engine_config.as_ref())
        .context("failed to load engine config")?;
    let pretty = cfg.output.pretty;

    match cli.command {
        Command::CheckConfig => print_json(&engine_config, pretty)?,

        Command::Shield { dataset } => {
            let data = dataset::load(&dataset)?;

            let capacity = cfg.logging.ring_capacity;
            let (diagnostics, writer) = match &cfg.logging.diagnostic_log_path {
                Some(path) => {
                    let (sink, handle) = JsonlSink::start(path, capacity)
                        .await
                        .context("failed to start diagnostic log")?;
                    (Diagnostics::File(sink), Some(handle))
                }
                None => (Diagnostics::Memory(RingLog::with_capacity(capacity)), None),
            };

            let shield = AdaptiveShield::new(StandardModel {
                scorer: BehaviorScorer::new(engine_config.score_bands.clone()),
                rules: MachineRuleSet,
            });
            let verdicts = run_shield(&shield, &data, &diagnostics);
            info!(
                users = verdicts.len(),
                diagnostics = diagnostics.recent().len(),
                "shield evaluation finished"
            );
            print_json(&verdicts, pretty)?;

            // Closing the channel lets the writer flush and exit.
            drop(diagnostics);
            if let Some(handle) = writer {
                let stats = handle.await.context("diagnostic writer task failed")?;
                info!(
                    written = stats.written,
                    failed = stats.failed,
                    "diagnostic log closed"
                );
            }
        }

        Command::Audit { dataset } => {
            let data = dataset::load(&dataset)?;
            let as_of = resolve_as_of(cli.as_of, &data);
            let output = run_audit(&engine_config, &data, as_of)?;
            info!(
                audited = output.summary.audited_users,
                danger = output.summary.high_risk_users.len(),
                anomalies = output.summary.anomalies.len(),
                "audit finished"
            );
            print_json(&output, pretty)?;
        }

        Command::ScanActions { dataset } => {
            let data = dataset::load(&dataset)?;
            let sentinel = ActionSentinel::new(engine_config.action.clone())
                .context("failed to build action sentinel")?;
            let scan = sentinel.scan(&data.missions, &data.submissions);
            info!(risk = ?scan.global_risk_level, "action scan finished");
            print_json(&scan, pretty)?;
        }

        Command::ScanEconomy { dataset } => {
            let data = dataset::load(&dataset)?;
            let as_of = resolve_as_of(cli.as_of, &data);
            let sentinel = EconomySentinel::new(
                engine_config.plans.clone(),
                engine_config.economy.clone(),
                engine_config.queue.clone(),
            );
            let scan = sentinel.scan(&EconomyData {
                users: &data.users,
                missions: &data.missions,
                submissions: &data.submissions,
                transactions: &data.transactions,
                redeemed_items: &data.redeemed_items,
                queue: &data.queue,
                as_of: as_of.date_naive(),
            });
            info!(risk = ?scan.global_risk_level, "economy scan finished");
            print_json(&scan, pretty)?;
        }
    }

    Ok(())
}

/// CLI flag first, then the dataset's own `asOf`, then the current time.
fn resolve_as_of(flag: Option<DateTime<Utc>>, data: &Dataset) -> DateTime<Utc> {
    flag.or(data.as_of).unwrap_or_else(Utc::now)
}

fn run_shield<'a>(
    shield: &AdaptiveShield,
    data: &'a Dataset,
    sink: &dyn DiagnosticSink,
) -> Vec<ShieldVerdict<'a>> {
    let activity = data.activity_by_user();
    let idle = ActivitySnapshot::default();

    data.users
        .iter()
        .map(|user| ShieldVerdict {
            user_id: &user.id,
            decision: shield.evaluate(
                user,
                activity.get(user.id.as_str()).copied().unwrap_or(&idle),
                sink,
            ),
        })
        .collect()
}

fn run_audit(config: &EngineConfig, data: &Dataset, as_of: DateTime<Utc>) -> Result<AuditOutput> {
    let engine = AuditEngine::new(config.audit.clone(), config.queue.clone());
    let results = engine
        .audit_all_users(
            &data.users,
            &AuditData {
                as_of,
                transactions: &data.transactions,
                submissions: &data.submissions,
                redeemed_items: &data.redeemed_items,
                queue: &data.queue,
            },
        )
        .context("audit failed")?;

    Ok(AuditOutput {
        as_of,
        summary: audit_engine::summarize(&results, &config.anomalies),
        results,
    })
}
