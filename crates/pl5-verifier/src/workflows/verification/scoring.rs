use super::domain::{Digits, PrizeTier, WinRecord, DIGITS_PER_DRAW};
use crate::config::PrizeTable;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub total_prize: u64,
    pub tier_counts: BTreeMap<PrizeTier, usize>,
    /// Winners only, in bet order.
    pub winners: Vec<WinRecord>,
}

impl Score {
    pub fn winning_count(&self) -> usize {
        self.winners.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    prizes: PrizeTable,
}

impl ScoringEngine {
    pub fn new(prizes: PrizeTable) -> Self {
        Self { prizes }
    }

    pub fn prize_for(&self, tier: PrizeTier) -> u64 {
        match tier {
            PrizeTier::DirectSelection => self.prizes.direct_selection,
        }
    }

    /// Scores each bet against the draw. Only the direct selection tier
    /// exists: all five digits equal, in order. A draw that is not five
    /// digits yields an empty score; bets that are not five digits are
    /// skipped. `bet_index` is the 1-based position in `bets`.
    pub fn score<B: AsRef<[u8]>>(&self, bets: &[B], draw: &[u8]) -> Score {
        let Some(draw) = Digits::from_slice(draw) else {
            warn!(len = draw.len(), "draw numbers are not five digits; scoring skipped");
            return Score::default();
        };
        if bets.is_empty() {
            return Score::default();
        }

        let mut score = Score {
            tier_counts: PrizeTier::ordered()
                .into_iter()
                .map(|tier| (tier, 0))
                .collect(),
            ..Score::default()
        };

        for (position, bet) in bets.iter().enumerate() {
            let bet = bet.as_ref();
            if bet.len() != DIGITS_PER_DRAW {
                continue;
            }
            if bet != draw.as_ref() {
                continue;
            }

            let tier = PrizeTier::DirectSelection;
            let prize_amount = self.prize_for(tier);
            score.total_prize = score.total_prize.saturating_add(prize_amount);
            *score.tier_counts.entry(tier).or_default() += 1;
            score.winners.push(WinRecord {
                bet_index: position + 1,
                numbers: draw,
                tier,
                prize_amount,
            });
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(PrizeTable::default())
    }

    #[test]
    fn exact_match_wins_direct_selection() {
        let score = engine().score(&[[1u8, 2, 3, 4, 5]], &[1, 2, 3, 4, 5]);
        assert_eq!(score.total_prize, 100_000);
        assert_eq!(score.winning_count(), 1);
        assert_eq!(score.tier_counts.get(&PrizeTier::DirectSelection), Some(&1));
        assert_eq!(score.winners[0].bet_index, 1);
    }

    #[test]
    fn near_miss_and_permutation_score_nothing() {
        let bets = [[1u8, 2, 3, 4, 6], [5, 4, 3, 2, 1]];
        let score = engine().score(&bets, &[1, 2, 3, 4, 5]);
        assert_eq!(score.total_prize, 0);
        assert!(score.winners.is_empty());
        assert_eq!(score.tier_counts.get(&PrizeTier::DirectSelection), Some(&0));
    }

    #[test]
    fn winners_keep_bet_order_and_skip_bad_lengths() {
        let bets: Vec<Vec<u8>> = vec![
            vec![7, 7, 7, 7, 7],
            vec![7, 7, 7, 7],
            vec![0, 0, 0, 0, 0],
            vec![7, 7, 7, 7, 7],
        ];
        let score = engine().score(&bets, &[7, 7, 7, 7, 7]);
        let indexes: Vec<_> = score.winners.iter().map(|win| win.bet_index).collect();
        assert_eq!(indexes, vec![1, 4]);
        assert_eq!(score.total_prize, 200_000);
    }

    #[test]
    fn malformed_draw_degrades_to_empty_score() {
        let score = engine().score(&[[1u8, 2, 3, 4, 5]], &[1, 2, 3, 4]);
        assert_eq!(score, Score::default());
        let out_of_range = engine().score(&[[1u8, 2, 3, 4, 5]], &[1, 2, 3, 4, 15]);
        assert_eq!(out_of_range, Score::default());
    }

    #[test]
    fn prize_amount_follows_table() {
        let engine = ScoringEngine::new(PrizeTable {
            direct_selection: 250,
        });
        let score = engine.score(&[Digits::new([0, 1, 2, 3, 4]).expect("digits")], &[0, 1, 2, 3, 4]);
        assert_eq!(score.total_prize, 250);
    }

    #[test]
    fn total_prize_saturates_on_huge_prize() {
        let engine = ScoringEngine::new(PrizeTable {
            direct_selection: u64::MAX,
        });
        let score = engine.score(&[[3u8, 3, 3, 3, 3], [3, 3, 3, 3, 3]], &[3, 3, 3, 3, 3]);
        assert_eq!(score.winning_count(), 2);
        assert_eq!(score.total_prize, u64::MAX);
    }
}
