use super::domain::{group_thousands, EvaluationEntry, RecommendationSet};

/// Console summary of one evaluation, with the duplex picks as reference.
pub fn summary_lines(entry: &EvaluationEntry, recommendations: &RecommendationSet) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(target) = &recommendations.target_period {
        lines.push(format!("预测期号: 第{target}期"));
    }
    lines.push(format!("开奖号码: {}", entry.numbers));

    if entry.winning_details.is_empty() {
        lines.push("遗憾：所有推荐号码均未中奖".to_string());
    } else {
        lines.push(format!("恭喜：共有 {} 注中奖", entry.winning_details.len()));
        for win in &entry.winning_details {
            lines.push(format!(
                "  第{}注: {} - {} - {}元",
                win.bet_index,
                win.numbers,
                win.tier.label(),
                group_thousands(win.prize_amount)
            ));
        }
    }

    if !recommendations.duplex.is_empty() {
        lines.push(String::new());
        lines.push("复式推荐参考:".to_string());
        for (position, digits) in &recommendations.duplex {
            let joined = digits
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",");
            lines.push(format!("  {}: [{joined}]", position.label()));
        }
    }

    lines
}
