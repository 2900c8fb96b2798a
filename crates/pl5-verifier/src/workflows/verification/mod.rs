//! Verifies the latest prediction report against the newest draw and records
//! the outcome in the ledger.
//!
//! One cycle: load the draw table, take the newest period as the one to score
//! and the one before it as the cutoff a report must declare, locate the
//! newest such report, extract its single bets, score them and prepend the
//! result to the ledger. Any failure along the way is logged and recorded as
//! an error entry instead.

pub mod domain;
pub mod draws;
pub mod extractor;
pub mod format;
pub mod ledger;
pub mod locator;
pub mod scoring;
mod summary;
pub mod text;

pub use domain::{
    Digits, DrawRecord, DuplexPosition, ErrorEntry, EvaluationEntry, PrizeTier,
    RecommendationSet, SingleBet, WinRecord,
};
pub use draws::{DrawTable, DrawTableError};
pub use extractor::extract_recommendations;
pub use format::ReportFormat;
pub use ledger::{Ledger, LedgerError, LedgerSections};
pub use locator::{LocatorError, ReportCandidate, ReportLocator};
pub use scoring::{Score, ScoringEngine};
pub use summary::summary_lines;
pub use text::{read_text, TextReadError};

use crate::config::{AppConfig, PrizeTable, RetentionLimits, VerifierConfig};
use chrono::{Local, NaiveDateTime};
use std::error::Error as _;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("cannot read {what}: {source}")]
    MissingFile {
        what: &'static str,
        #[source]
        source: TextReadError,
    },
    #[error("draw table parsing failed: no valid rows")]
    NoDrawData,
    #[error("insufficient data: at least 2 periods required, found {found}")]
    InsufficientPeriods { found: usize },
    #[error("no analysis report found with data cutoff period {cutoff}")]
    NoMatchingReport { cutoff: String },
    #[error("report search failed: {0}")]
    ReportScan(#[source] LocatorError),
    #[error("no valid recommendations found in report {}", report.display())]
    EmptyRecommendations { report: PathBuf },
    #[error(transparent)]
    LedgerWriteFailure(#[from] LedgerError),
}

impl From<DrawTableError> for VerificationError {
    fn from(err: DrawTableError) -> Self {
        match err {
            DrawTableError::Read(source) => Self::MissingFile {
                what: "draw table",
                source,
            },
            DrawTableError::NoData => Self::NoDrawData,
        }
    }
}

impl From<LocatorError> for VerificationError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::NotFound { cutoff } => Self::NoMatchingReport { cutoff },
            other => Self::ReportScan(other),
        }
    }
}

/// Everything learned while scoring one report.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub entry: EvaluationEntry,
    pub cutoff_period: String,
    pub report: ReportCandidate,
    pub recommendations: RecommendationSet,
    pub score: Score,
}

impl Evaluation {
    pub fn summary_lines(&self) -> Vec<String> {
        summary_lines(&self.entry, &self.recommendations)
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Recorded(Box<Evaluation>),
    Failed(VerificationError),
}

#[derive(Debug, Clone)]
pub struct VerificationCycle {
    config: VerifierConfig,
    format: &'static ReportFormat,
    scoring: ScoringEngine,
    ledger: Ledger,
}

impl VerificationCycle {
    pub fn new(config: VerifierConfig, retention: RetentionLimits, prizes: PrizeTable) -> Self {
        let ledger = Ledger::new(config.ledger_path.clone(), retention);
        Self {
            config,
            format: ReportFormat::standard(),
            scoring: ScoringEngine::new(prizes),
            ledger,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.verifier.clone(), config.retention, config.prizes)
    }

    /// Scores the newest period without touching the ledger.
    pub fn evaluate(&self, now: NaiveDateTime) -> Result<Evaluation, VerificationError> {
        let table = DrawTable::from_path(&self.config.draw_table)?;
        let pair = table
            .latest_pair()
            .ok_or(VerificationError::InsufficientPeriods { found: table.len() })?;
        let eval_period = pair.evaluation.period.clone();
        let cutoff_period = pair.cutoff.period.clone();
        let numbers = pair.evaluation.numbers;
        info!(evaluation = %eval_period, cutoff = %cutoff_period, "periods resolved");

        let locator = ReportLocator::new(
            self.format,
            self.config.report_dir.clone(),
            &self.config.report_pattern,
        )?;
        let report = locator.locate(&cutoff_period)?;

        let content = read_text(&report.path).map_err(|source| VerificationError::MissingFile {
            what: "analysis report",
            source,
        })?;
        let recommendations = extract_recommendations(self.format, &content);
        if recommendations.singles.is_empty() {
            return Err(VerificationError::EmptyRecommendations {
                report: report.path.clone(),
            });
        }

        let mut score = self
            .scoring
            .score(&recommendations.single_numbers(), numbers.as_ref());
        for win in &mut score.winners {
            if let Some(bet) = recommendations.singles.get(win.bet_index - 1) {
                win.bet_index = bet.index;
            }
        }

        let entry = EvaluationEntry {
            timestamp: now,
            period: eval_period,
            numbers,
            recommendation_count: recommendations.singles.len(),
            winning_count: score.winning_count(),
            total_prize: score.total_prize,
            winning_details: score.winners.clone(),
        };

        Ok(Evaluation {
            entry,
            cutoff_period,
            report,
            recommendations,
            score,
        })
    }

    /// Runs one cycle now.
    pub fn run(&self) -> CycleOutcome {
        self.run_at(Local::now().naive_local())
    }

    /// Runs one cycle and records its outcome, stamped with `now`. Failures are
    /// logged and written to the ledger's error stream, never propagated.
    pub fn run_at(&self, now: NaiveDateTime) -> CycleOutcome {
        let result = self.evaluate(now).and_then(|evaluation| {
            self.ledger.record_evaluation(&evaluation.entry)?;
            Ok(evaluation)
        });

        match result {
            Ok(evaluation) => {
                log_evaluation(&evaluation);
                CycleOutcome::Recorded(Box::new(evaluation))
            }
            Err(err) => {
                error!(error = %err, "verification cycle failed");
                let mut cause = err.source();
                while let Some(inner) = cause {
                    error!(cause = %inner, "caused by");
                    cause = inner.source();
                }

                let entry = ErrorEntry {
                    timestamp: now,
                    message: format!("verification failed: {err}"),
                };
                if let Err(write_err) = self.ledger.record_error(&entry) {
                    error!(error = %write_err, "could not record failure in ledger");
                }
                CycleOutcome::Failed(err)
            }
        }
    }
}

fn log_evaluation(evaluation: &Evaluation) {
    let entry = &evaluation.entry;
    info!(
        period = %entry.period,
        numbers = %entry.numbers,
        recommendations = entry.recommendation_count,
        winners = entry.winning_count,
        total_prize = entry.total_prize,
        "evaluation complete"
    );
    for win in &entry.winning_details {
        info!(
            bet = win.bet_index,
            numbers = %win.numbers,
            tier = win.tier.label(),
            prize = win.prize_amount,
            "winning bet"
        );
    }
}
