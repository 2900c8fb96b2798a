//! Size-capped, human-readable log of evaluation outcomes and failures.
//!
//! The file is a sequence of plain-text sections separated by a line of 80
//! `=`. Normal records come first, newest first, followed by the error
//! stream under its own header. Every write regenerates the whole file.

use super::domain::{group_thousands, ErrorEntry, EvaluationEntry};
use super::text::{self, TextReadError};
use crate::config::RetentionLimits;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const DELIMITER_WIDTH: usize = 80;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EVALUATION_MARKER: &str = "评估时间:";
const ERROR_MARKERS: [&str; 2] = ["ERROR", "错误"];
const ERROR_HEADER: &str = "错误日志:";

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to write ledger {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn delimiter() -> String {
    format!("\n{}\n", "=".repeat(DELIMITER_WIDTH))
}

/// The two retained record streams, newest first, as rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSections {
    pub normal: Vec<String>,
    pub errors: Vec<String>,
}

impl LedgerSections {
    /// Sections that are neither errors nor evaluations are dropped, as is
    /// the error stream header.
    pub fn parse(content: &str) -> Self {
        let mut sections = Self::default();

        for section in content.split(delimiter().as_str()) {
            let trimmed = section.trim();
            if trimmed.is_empty() || trimmed == ERROR_HEADER {
                continue;
            }

            if ERROR_MARKERS.iter().any(|marker| section.contains(marker)) {
                sections.errors.push(section.to_string());
            } else if section.contains(EVALUATION_MARKER) {
                sections.normal.push(section.to_string());
            }
        }

        sections
    }

    pub fn push_evaluation(&mut self, entry: &EvaluationEntry) {
        self.normal.insert(0, render_evaluation(entry));
    }

    pub fn push_error(&mut self, entry: &ErrorEntry) {
        self.errors.insert(0, render_error(entry));
    }

    /// Drops the oldest sections beyond the caps.
    pub fn truncate(&mut self, limits: RetentionLimits) {
        self.normal.truncate(limits.max_normal);
        self.errors.truncate(limits.max_errors);
    }

    pub fn render(&self) -> String {
        let mut parts: Vec<&str> = self.normal.iter().map(String::as_str).collect();

        if !self.errors.is_empty() {
            if !parts.is_empty() {
                parts.push("");
            }
            parts.push(ERROR_HEADER);
            parts.extend(self.errors.iter().map(String::as_str));
        }

        parts.join(delimiter().as_str())
    }
}

pub fn render_evaluation(entry: &EvaluationEntry) -> String {
    let mut lines = vec![
        format!(
            "{EVALUATION_MARKER} {}",
            entry.timestamp.format(TIMESTAMP_FORMAT)
        ),
        format!("评估期号: {}", entry.period),
        format!("开奖号码: {}", entry.numbers),
        format!("推荐数量: {}注", entry.recommendation_count),
        format!("中奖数量: {}注", entry.winning_count),
        format!("总奖金: {}元", group_thousands(entry.total_prize)),
        String::new(),
    ];

    if !entry.winning_details.is_empty() {
        lines.push("中奖详情:".to_string());
        for win in &entry.winning_details {
            lines.push(format!(
                "  第{}注: {} - {} - {}元",
                win.bet_index,
                win.numbers,
                win.tier.label(),
                group_thousands(win.prize_amount)
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn render_error(entry: &ErrorEntry) -> String {
    format!(
        "错误时间: {}\n错误信息: {}\n",
        entry.timestamp.format(TIMESTAMP_FORMAT),
        entry.message
    )
}

/// Read-modify-write access to the ledger file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    limits: RetentionLimits,
}

impl Ledger {
    pub fn new<P: Into<PathBuf>>(path: P, limits: RetentionLimits) -> Self {
        Self {
            path: path.into(),
            limits,
        }
    }

    /// Current sections. A missing file is an empty ledger; an unreadable one
    /// is logged and treated as empty.
    pub fn load(&self) -> LedgerSections {
        if !self.path.exists() {
            return LedgerSections::default();
        }

        match text::read_text(&self.path) {
            Ok(content) => LedgerSections::parse(&content),
            Err(TextReadError::MissingFile { .. }) => LedgerSections::default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "existing ledger unreadable; starting fresh");
                LedgerSections::default()
            }
        }
    }

    pub fn record_evaluation(&self, entry: &EvaluationEntry) -> Result<LedgerSections, LedgerError> {
        self.record(Some(entry), None)
    }

    pub fn record_error(&self, entry: &ErrorEntry) -> Result<LedgerSections, LedgerError> {
        self.record(None, Some(entry))
    }

    /// Prepends the new entries, enforces the caps and rewrites the file.
    pub fn record(
        &self,
        evaluation: Option<&EvaluationEntry>,
        error: Option<&ErrorEntry>,
    ) -> Result<LedgerSections, LedgerError> {
        let mut sections = self.load();

        if let Some(entry) = evaluation {
            sections.push_evaluation(entry);
        }
        if let Some(entry) = error {
            sections.push_error(entry);
        }
        sections.truncate(self.limits);

        write_replacing(&self.path, &sections.render()).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            normal = sections.normal.len(),
            errors = sections.errors.len(),
            "ledger updated"
        );
        Ok(sections)
    }
}

/// Writes to a sibling temp file and renames it over `path`.
fn write_replacing(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::verification::domain::{Digits, PrizeTier, WinRecord};
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .expect("valid date")
            .and_hms_opt(21, minute, 0)
            .expect("valid time")
    }

    fn evaluation(period: &str, minute: u32) -> EvaluationEntry {
        EvaluationEntry {
            timestamp: at(minute),
            period: period.to_string(),
            numbers: Digits::new([1, 2, 3, 4, 5]).expect("digits"),
            recommendation_count: 5,
            winning_count: 0,
            total_prize: 0,
            winning_details: Vec::new(),
        }
    }

    fn error(message: &str, minute: u32) -> ErrorEntry {
        ErrorEntry {
            timestamp: at(minute),
            message: message.to_string(),
        }
    }

    #[test]
    fn renders_evaluation_with_winners() {
        let numbers = Digits::new([1, 2, 3, 4, 5]).expect("digits");
        let entry = EvaluationEntry {
            winning_count: 1,
            total_prize: 100_000,
            winning_details: vec![WinRecord {
                bet_index: 3,
                numbers,
                tier: PrizeTier::DirectSelection,
                prize_amount: 100_000,
            }],
            ..evaluation("25001", 30)
        };

        assert_eq!(
            render_evaluation(&entry),
            "评估时间: 2025-01-02 21:30:00\n评估期号: 25001\n开奖号码: 12345\n推荐数量: 5注\n中奖数量: 1注\n总奖金: 100,000元\n\n中奖详情:\n  第3注: 12345 - 直选 - 100,000元\n"
        );
    }

    #[test]
    fn render_then_parse_keeps_both_streams() {
        let mut sections = LedgerSections::default();
        sections.push_evaluation(&evaluation("25001", 1));
        sections.push_evaluation(&evaluation("25002", 2));
        sections.push_error(&error("no report", 3));

        let text = sections.render();
        assert_eq!(text.matches(ERROR_HEADER).count(), 1);
        assert_eq!(LedgerSections::parse(&text), sections);
    }

    #[test]
    fn header_is_not_counted_as_an_error() {
        let mut sections = LedgerSections::default();
        sections.push_error(&error("first", 1));
        let reparsed = LedgerSections::parse(&sections.render());
        assert_eq!(reparsed.errors.len(), 1);
        assert!(reparsed.normal.is_empty());
    }

    #[test]
    fn unknown_sections_are_dropped() {
        let text = format!("stray notes{}{}", delimiter(), render_evaluation(&evaluation("25001", 1)));
        let sections = LedgerSections::parse(&text);
        assert_eq!(sections.normal.len(), 1);
        assert!(sections.errors.is_empty());
    }

    #[test]
    fn record_writes_file_and_enforces_caps() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("ledger.txt");
        let ledger = Ledger::new(
            &path,
            RetentionLimits {
                max_normal: 2,
                max_errors: 1,
            },
        );

        ledger.record_evaluation(&evaluation("25001", 1)).expect("write");
        ledger.record_error(&error("boom", 2)).expect("write");
        ledger.record_evaluation(&evaluation("25002", 3)).expect("write");
        ledger.record_error(&error("bang", 4)).expect("write");
        let sections = ledger.record_evaluation(&evaluation("25003", 5)).expect("write");

        assert_eq!(sections.normal.len(), 2);
        assert!(sections.normal[0].contains("评估期号: 25003"));
        assert!(sections.normal[1].contains("评估期号: 25002"));
        assert_eq!(sections.errors.len(), 1);
        assert!(sections.errors[0].contains("bang"));

        let on_disk = fs::read_to_string(&path).expect("ledger readable");
        assert_eq!(LedgerSections::parse(&on_disk), sections);
    }

    #[test]
    fn unreadable_ledger_loads_empty_and_write_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ledger = Ledger::new(dir.path(), RetentionLimits::default());

        assert_eq!(ledger.load(), LedgerSections::default());
        match ledger.record_error(&error("boom", 1)) {
            Err(LedgerError::Write { path, .. }) => assert_eq!(path, dir.path()),
            other => panic!("expected write failure, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn newest_entries_survive_truncation(cap in 1usize..8, extra in 0usize..8) {
            let limits = RetentionLimits { max_normal: cap, max_errors: cap };
            let mut text = String::new();
            let total = cap + extra;

            for index in 0..total {
                let mut sections = LedgerSections::parse(&text);
                sections.push_evaluation(&evaluation(&format!("{}", 10_000 + index), 0));
                sections.truncate(limits);
                text = sections.render();
            }

            let sections = LedgerSections::parse(&text);
            prop_assert_eq!(sections.normal.len(), cap);
            for (offset, section) in sections.normal.iter().enumerate() {
                let expected = format!("评估期号: {}", 10_000 + total - 1 - offset);
                prop_assert!(section.contains(&expected));
            }
        }
    }
}
