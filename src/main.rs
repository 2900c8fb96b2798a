use clap::{Args, Parser, Subcommand};
use pl5_verifier::config::{AppConfig, VerifierConfig};
use pl5_verifier::error::AppError;
use pl5_verifier::telemetry;
use pl5_verifier::workflows::verification::{
    extract_recommendations, read_text, CycleOutcome, Evaluation, EvaluationEntry, PrizeTier,
    RecommendationSet, ReportCandidate, ReportFormat, VerificationCycle, VerificationError,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "pl5-verifier",
    about = "Check Pick-5 prediction reports against the latest draw and keep a prize ledger",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score the newest draw against its matching report (default command)
    Verify(VerifyArgs),
    /// Print the recommendations parsed from a single report file
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Default)]
struct VerifyArgs {
    /// Override the draw history table
    #[arg(long)]
    draw_table: Option<PathBuf>,
    /// Override the directory scanned for reports
    #[arg(long)]
    report_dir: Option<PathBuf>,
    /// Override the report filename pattern
    #[arg(long)]
    report_pattern: Option<String>,
    /// Override the ledger file
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// Print the evaluation as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Report file to parse
    report: PathBuf,
    /// Print the recommendations as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct VerificationResponse<'a> {
    cutoff_period: &'a str,
    report: &'a ReportCandidate,
    evaluation: &'a EvaluationEntry,
    tier_counts: &'a BTreeMap<PrizeTier, usize>,
    recommendations: &'a RecommendationSet,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Verify(VerifyArgs::default()));

    match command {
        Command::Verify(args) => run_verify(config, args),
        Command::Extract(args) => run_extract(args),
    }
}

fn apply_overrides(config: &mut VerifierConfig, args: &mut VerifyArgs) {
    if let Some(path) = args.draw_table.take() {
        config.draw_table = path;
    }
    if let Some(dir) = args.report_dir.take() {
        config.report_dir = dir;
    }
    if let Some(pattern) = args.report_pattern.take() {
        config.report_pattern = pattern;
    }
    if let Some(path) = args.ledger.take() {
        config.ledger_path = path;
    }
}

fn run_verify(mut config: AppConfig, mut args: VerifyArgs) -> Result<(), AppError> {
    apply_overrides(&mut config.verifier, &mut args);

    info!("pl5 verifier started");
    let cycle = VerificationCycle::from_app_config(&config);

    // A failed cycle is already logged and written to the ledger.
    if let CycleOutcome::Recorded(evaluation) = cycle.run() {
        if args.json {
            println!("{}", render_json(&evaluation)?);
        } else {
            for line in evaluation.summary_lines() {
                println!("{line}");
            }
        }
    }

    info!("verification finished");
    Ok(())
}

fn render_json(evaluation: &Evaluation) -> Result<String, AppError> {
    let response = VerificationResponse {
        cutoff_period: &evaluation.cutoff_period,
        report: &evaluation.report,
        evaluation: &evaluation.entry,
        tier_counts: &evaluation.score.tier_counts,
        recommendations: &evaluation.recommendations,
    };
    serde_json::to_string_pretty(&response).map_err(|err| AppError::Io(err.into()))
}

fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let content = read_text(&args.report).map_err(|source| VerificationError::MissingFile {
        what: "analysis report",
        source,
    })?;
    let recommendations = extract_recommendations(ReportFormat::standard(), &content);

    if args.json {
        let json = serde_json::to_string_pretty(&recommendations)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{json}");
    } else {
        for line in render_recommendations(&recommendations) {
            println!("{line}");
        }
    }
    Ok(())
}

fn render_recommendations(recommendations: &RecommendationSet) -> Vec<String> {
    let mut lines = Vec::new();
    match &recommendations.target_period {
        Some(period) => lines.push(format!("Target period: {period}")),
        None => lines.push("Target period: (not stated)".to_string()),
    }

    lines.push(format!("Single bets: {}", recommendations.singles.len()));
    for bet in &recommendations.singles {
        lines.push(format!("- #{}: {}", bet.index, bet.numbers));
    }

    if !recommendations.duplex.is_empty() {
        lines.push("Duplex positions:".to_string());
        for (position, digits) in &recommendations.duplex {
            let joined = digits
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",");
            lines.push(format!("- {}: [{joined}]", position.number()));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verify_flags_override_config() {
        let cli = Cli::try_parse_from([
            "pl5-verifier",
            "verify",
            "--draw-table",
            "data/pl5.csv",
            "--ledger",
            "out/ledger.txt",
        ])
        .expect("arguments parse");

        let Some(Command::Verify(mut args)) = cli.command else {
            panic!("expected verify command");
        };
        let mut config = VerifierConfig::default();
        apply_overrides(&mut config, &mut args);

        assert_eq!(config.draw_table, PathBuf::from("data/pl5.csv"));
        assert_eq!(config.ledger_path, PathBuf::from("out/ledger.txt"));
        assert_eq!(config.report_pattern, "pl5_analysis_output_*.txt");
    }

    #[test]
    fn renders_extracted_recommendations() {
        let text = "本次预测目标: 第 25090 期\n注 1: [1, 2, 3, 4, 5]\n第一位推荐: [2, 0]\n";
        let recommendations = extract_recommendations(ReportFormat::standard(), text);
        assert_eq!(
            render_recommendations(&recommendations),
            vec![
                "Target period: 25090",
                "Single bets: 1",
                "- #1: 12345",
                "Duplex positions:",
                "- 1: [0,2]",
            ]
        );
    }

    #[test]
    fn extract_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = run_extract(ExtractArgs {
            report: dir.path().join("absent.txt"),
            json: false,
        })
        .expect_err("missing report");
        assert!(matches!(error, AppError::Verification(_)));
    }
}
