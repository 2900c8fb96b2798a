use super::domain::{Digits, DuplexPosition, RecommendationSet, SingleBet};
use super::format::{digits_in, ReportFormat};
use std::collections::BTreeSet;
use tracing::debug;

/// Parses the recommendations out of one report's text.
///
/// Singles keep their order of appearance; a line whose brackets do not hold
/// exactly five digits is dropped. A bet keeps the report's own label, or
/// its 1-based position among kept bets when the label is absent or zero.
/// Duplex positions keep the deduplicated, sorted digits of their first line.
/// An empty result is not an error here.
pub fn extract_recommendations(format: &ReportFormat, text: &str) -> RecommendationSet {
    let target_period = format.target_period(text).map(str::to_string);

    let mut singles = Vec::new();
    for raw in format.single_lines(text) {
        let digits = digits_in(raw.body);
        match Digits::from_slice(&digits) {
            Some(numbers) => singles.push(SingleBet {
                index: raw
                    .label
                    .filter(|label| *label > 0)
                    .unwrap_or(singles.len() + 1),
                numbers,
            }),
            None => debug!(body = raw.body, "discarding single bet without five digits"),
        }
    }

    let duplex = DuplexPosition::ordered()
        .into_iter()
        .filter_map(|position| {
            let body = format.duplex_body(position, text)?;
            let digits: BTreeSet<u8> = digits_in(body).into_iter().filter(|d| *d <= 9).collect();
            (!digits.is_empty()).then_some((position, digits))
        })
        .collect();

    RecommendationSet {
        target_period,
        singles,
        duplex,
    }
}
