use super::format::ReportFormat;
use super::text;
use chrono::NaiveDateTime;
use regex_lite::Regex;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("invalid report pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },
    #[error("failed to scan report directory {}: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("no report declares data cutoff period {cutoff}")]
    NotFound { cutoff: String },
}

/// A report whose declared cutoff matched and whose filename carries a
/// generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCandidate {
    pub path: PathBuf,
    pub declared_cutoff: String,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug)]
pub struct ReportLocator<'f> {
    format: &'f ReportFormat,
    dir: PathBuf,
    file_pattern: Regex,
}

impl<'f> ReportLocator<'f> {
    pub fn new<P: Into<PathBuf>>(
        format: &'f ReportFormat,
        dir: P,
        glob: &str,
    ) -> Result<Self, LocatorError> {
        let file_pattern = glob_to_regex(glob).map_err(|source| LocatorError::InvalidPattern {
            pattern: glob.to_string(),
            source,
        })?;

        Ok(Self {
            format,
            dir: dir.into(),
            file_pattern,
        })
    }

    /// All selectable reports for `cutoff`, in filename order.
    pub fn candidates(&self, cutoff: &str) -> Result<Vec<ReportCandidate>, LocatorError> {
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(LocatorError::Scan {
                        dir: self.dir.clone(),
                        source,
                    })
                }
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            if !self.file_pattern.is_match(file_name) {
                continue;
            }

            let content = match text::read_text(entry.path()) {
                Ok(content) => content,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable report");
                    continue;
                }
            };

            if self.format.declared_cutoff(&content) != Some(cutoff) {
                continue;
            }
            let Some(generated_at) = self.format.filename_timestamp(file_name) else {
                debug!(file = file_name, "matching report has no filename timestamp");
                continue;
            };

            candidates.push(ReportCandidate {
                path: entry.into_path(),
                declared_cutoff: cutoff.to_string(),
                generated_at,
            });
        }

        Ok(candidates)
    }

    /// The most recently generated report based on `cutoff`.
    pub fn locate(&self, cutoff: &str) -> Result<ReportCandidate, LocatorError> {
        info!(cutoff, dir = %self.dir.display(), "looking for analysis report");

        let latest = self
            .candidates(cutoff)?
            .into_iter()
            .max_by(|a, b| (a.generated_at, &a.path).cmp(&(b.generated_at, &b.path)));

        match latest {
            Some(candidate) => {
                info!(report = %candidate.path.display(), generated_at = %candidate.generated_at, "selected report");
                Ok(candidate)
            }
            None => {
                warn!(cutoff, "no report found for data cutoff");
                Err(LocatorError::NotFound {
                    cutoff: cutoff.to_string(),
                })
            }
        }
    }
}

/// Anchored regex for a filename glob. `*` matches any run of characters and
/// `?` a single one; everything else is literal.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex_lite::Error> {
    let mut pattern = String::from("^");
    let mut literal = String::new();

    for ch in glob.chars() {
        match ch {
            '*' | '?' => {
                pattern.push_str(&regex_lite::escape(&literal));
                literal.clear();
                pattern.push_str(if ch == '*' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    pattern.push_str(&regex_lite::escape(&literal));
    pattern.push('$');

    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const PATTERN: &str = "pl5_analysis_output_*.txt";

    fn write_report(dir: &Path, name: &str, cutoff: &str) {
        let body = format!("分析基于数据: 截至 {cutoff} 期\n注 1: [1,2,3,4,5]\n");
        fs::write(dir.join(name), body).expect("write report");
    }

    #[test]
    fn glob_matches_literal_dots() {
        let regex = glob_to_regex(PATTERN).expect("valid glob");
        assert!(regex.is_match("pl5_analysis_output_20250101_120000.txt"));
        assert!(!regex.is_match("pl5_analysis_output_20250101_120000.txt.bak"));
        assert!(!regex.is_match("pl5_analysis_output_20250101_120000xtxt"));
        assert!(glob_to_regex("report_?.txt").expect("valid").is_match("report_1.txt"));
    }

    #[test]
    fn picks_latest_timestamp_for_cutoff() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_report(dir.path(), "pl5_analysis_output_20250101_120000.txt", "100");
        write_report(dir.path(), "pl5_analysis_output_20250102_080000.txt", "100");
        write_report(dir.path(), "pl5_analysis_output_20250103_080000.txt", "099");
        write_report(dir.path(), "pl5_analysis_output_latest.txt", "100");
        write_report(dir.path(), "other_20250104_080000.txt", "100");

        let locator =
            ReportLocator::new(ReportFormat::standard(), dir.path(), PATTERN).expect("locator");
        let candidates = locator.candidates("100").expect("scan");
        assert_eq!(candidates.len(), 2);

        let chosen = locator.locate("100").expect("report found");
        assert_eq!(
            chosen.path.file_name().and_then(|name| name.to_str()),
            Some("pl5_analysis_output_20250102_080000.txt")
        );
        assert_eq!(chosen.declared_cutoff, "100");
    }

    #[test]
    fn cutoff_must_match_exactly() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_report(dir.path(), "pl5_analysis_output_20250101_120000.txt", "1000");

        let locator =
            ReportLocator::new(ReportFormat::standard(), dir.path(), PATTERN).expect("locator");
        match locator.locate("100") {
            Err(LocatorError::NotFound { cutoff }) => assert_eq!(cutoff, "100"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_report_is_considered() {
        let source = tempfile::tempdir().expect("temp dir");
        let reports = tempfile::tempdir().expect("temp dir");
        write_report(source.path(), "generated.txt", "0100");
        std::os::unix::fs::symlink(
            source.path().join("generated.txt"),
            reports
                .path()
                .join("pl5_analysis_output_20250101_120000.txt"),
        )
        .expect("symlink report");

        let locator =
            ReportLocator::new(ReportFormat::standard(), reports.path(), PATTERN).expect("locator");
        let chosen = locator.locate("0100").expect("linked report found");
        assert!(chosen
            .path
            .ends_with("pl5_analysis_output_20250101_120000.txt"));
        assert_eq!(chosen.generated_at.to_string(), "2025-01-01 12:00:00");
    }

    #[test]
    fn missing_directory_is_a_scan_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let locator = ReportLocator::new(
            ReportFormat::standard(),
            dir.path().join("absent"),
            PATTERN,
        )
        .expect("locator");
        assert!(matches!(
            locator.locate("100"),
            Err(LocatorError::Scan { .. })
        ));
    }
}
