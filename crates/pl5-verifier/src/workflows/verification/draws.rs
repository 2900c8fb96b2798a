use super::domain::{Digits, DrawRecord, DIGITS_PER_DRAW};
use super::text::{self, TextReadError};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum DrawTableError {
    #[error(transparent)]
    Read(#[from] TextReadError),
    #[error("draw table contains no valid rows")]
    NoData,
}

/// Draw history keyed by the numeric value of the period.
#[derive(Debug, Clone, Default)]
pub struct DrawTable {
    records: BTreeMap<u64, DrawRecord>,
}

/// The two newest periods: the one being scored and the one reports must be
/// based on.
#[derive(Debug, Clone, Copy)]
pub struct PeriodPair<'a> {
    pub evaluation: &'a DrawRecord,
    pub cutoff: &'a DrawRecord,
}

impl DrawTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DrawTableError> {
        let content = text::read_text(path)?;
        Self::parse(&content)
    }

    /// Parses header + rows of `period,d1,d2,d3,d4,d5[,...]`. Rows that fail
    /// validation are skipped.
    pub fn parse(content: &str) -> Result<Self, DrawTableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut records = BTreeMap::new();

        for result in reader.records() {
            let row = match result {
                Ok(row) => row,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable draw row");
                    continue;
                }
            };
            let line = row.position().map(|pos| pos.line()).unwrap_or_default();

            match parse_row(&row) {
                Ok((value, record)) => {
                    if let Some(previous) = records.insert(value, record) {
                        debug!(period = %previous.period, line, "duplicate period replaced");
                    }
                }
                Err(reason) => {
                    warn!(line, row = ?row.iter().collect::<Vec<_>>(), reason, "skipping malformed draw row");
                }
            }
        }

        if records.is_empty() {
            warn!("no valid draw rows found");
            return Err(DrawTableError::NoData);
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, period: &str) -> Option<&DrawRecord> {
        period
            .parse::<u64>()
            .ok()
            .and_then(|value| self.records.get(&value))
    }

    /// Periods in ascending numeric order.
    pub fn periods(&self) -> Vec<&str> {
        self.records
            .values()
            .map(|record| record.period.as_str())
            .collect()
    }

    pub fn latest_pair(&self) -> Option<PeriodPair<'_>> {
        let mut newest = self.records.values().rev();
        let evaluation = newest.next()?;
        let cutoff = newest.next()?;
        Some(PeriodPair { evaluation, cutoff })
    }
}

fn parse_row(row: &csv::StringRecord) -> Result<(u64, DrawRecord), &'static str> {
    if row.len() < DIGITS_PER_DRAW + 1 {
        return Err("expected a period and five digits");
    }

    let period = &row[0];
    if !is_period(period) {
        return Err("period must be 4-7 digits");
    }
    let value = period.parse::<u64>().map_err(|_| "period is not numeric")?;

    let mut digits = [0u8; DIGITS_PER_DRAW];
    for (slot, field) in digits.iter_mut().zip(row.iter().skip(1)) {
        let parsed = field.parse::<i64>().map_err(|_| "digit is not an integer")?;
        *slot = u8::try_from(parsed).map_err(|_| "digit outside 0-9")?;
    }
    let numbers = Digits::new(digits).ok_or("digit outside 0-9")?;

    Ok((
        value,
        DrawRecord {
            period: period.to_string(),
            numbers,
        },
    ))
}

fn is_period(value: &str) -> bool {
    (4..=7).contains(&value.len()) && value.bytes().all(|byte| byte.is_ascii_digit())
}
