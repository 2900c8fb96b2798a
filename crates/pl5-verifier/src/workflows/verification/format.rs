//! Text patterns of the prediction report format.
//!
//! The generator writes Chinese labels; the English alternatives are accepted
//! so hand-written reports and fixtures parse the same way. Nothing outside
//! this module knows what the labels look like.

use super::domain::DuplexPosition;
use chrono::NaiveDateTime;
use regex_lite::{Captures, Regex};
use std::sync::OnceLock;

const DIGIT_LIST: &str = r"\[([0-9\s,]+)\]";
const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug)]
pub struct ReportFormat {
    cutoff: Regex,
    target: Regex,
    single: Regex,
    duplex: Vec<(DuplexPosition, Regex)>,
    filename_timestamp: Regex,
}

/// A labelled single-bet line before its digits are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSingle<'t> {
    pub label: Option<usize>,
    pub body: &'t str,
}

impl ReportFormat {
    pub fn standard() -> &'static ReportFormat {
        static FORMAT: OnceLock<ReportFormat> = OnceLock::new();
        FORMAT.get_or_init(|| Self::build().expect("report patterns are valid"))
    }

    fn build() -> Result<Self, regex_lite::Error> {
        let cutoff = Regex::new(
            r"分析基于数据[:：]\s*截至\s*(\d+)\s*期|(?i:based on data through period)\s*(\d+)",
        )?;
        let target = Regex::new(
            r"本次预测目标[:：]\s*第\s*(\d+)\s*期|(?i:prediction target)[:：]?\s*(?i:period)\s*(\d+)",
        )?;
        let single = Regex::new(&format!(r"(?:注|\b(?i:bet))\s*(\d+)\s*[:：]\s*{DIGIT_LIST}"))?;

        let chinese_ordinals = ["一", "二", "三", "四", "五"];
        let duplex = DuplexPosition::ordered()
            .into_iter()
            .zip(chinese_ordinals)
            .map(|(position, ordinal)| {
                let pattern = format!(
                    r"(?:第{ordinal}位推荐|\b(?i:position)\s*{number}\s*(?i:recommendation))\s*[:：]\s*{DIGIT_LIST}",
                    number = position.number(),
                );
                Regex::new(&pattern).map(|regex| (position, regex))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let filename_timestamp = Regex::new(r"_(\d{8}_\d{6})\.txt$")?;

        Ok(Self {
            cutoff,
            target,
            single,
            duplex,
            filename_timestamp,
        })
    }

    /// Period the report's data ends at.
    pub fn declared_cutoff<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.cutoff.captures(text).and_then(first_group)
    }

    /// Period the report was predicting.
    pub fn target_period<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.target.captures(text).and_then(first_group)
    }

    /// Every single-bet line in order of appearance.
    pub fn single_lines<'a, 't>(&'a self, text: &'t str) -> impl Iterator<Item = RawSingle<'t>> + 'a
    where
        't: 'a,
    {
        self.single.captures_iter(text).filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            let label = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
            Some(RawSingle { label, body })
        })
    }

    /// Bracket body of the first recommendation line for `position`.
    pub fn duplex_body<'t>(&self, position: DuplexPosition, text: &'t str) -> Option<&'t str> {
        self.duplex
            .iter()
            .find(|(candidate, _)| *candidate == position)
            .and_then(|(_, regex)| regex.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Generation time embedded as `_YYYYMMDD_HHMMSS.txt`.
    pub fn filename_timestamp(&self, file_name: &str) -> Option<NaiveDateTime> {
        let caps = self.filename_timestamp.captures(file_name)?;
        NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), FILENAME_TIMESTAMP_FORMAT).ok()
    }
}

fn first_group<'t>(caps: Captures<'t>) -> Option<&'t str> {
    (1..caps.len()).find_map(|group| caps.get(group).map(|m| m.as_str()))
}

/// Every digit character in a bracket body, separators ignored.
pub fn digits_in(body: &str) -> Vec<u8> {
    body.chars()
        .filter_map(|ch| ch.to_digit(10))
        .filter_map(|digit| u8::try_from(digit).ok())
        .collect()
}
