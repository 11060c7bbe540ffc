/// Decay applied to the best score when a pass scores below it.
pub const DEFAULT_PENALTY: u8 = 10;

/// The best-score ratchet.
///
/// A better pass replaces the best score. A worse pass lowers it by a flat
/// `penalty`, floored at zero. An equal pass leaves it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePolicy {
    pub penalty: u8,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY,
        }
    }
}

impl ScorePolicy {
    pub fn new(penalty: u8) -> Self {
        Self { penalty }
    }

    /// New best score after a pass scoring `percent`. Without a previous best, the
    /// pass score is taken as is.
    pub fn apply(&self, best: Option<u8>, percent: u8) -> u8 {
        let percent = percent.min(100);
        match best {
            None => percent,
            Some(best) if percent > best => percent,
            Some(best) if percent < best => best.saturating_sub(self.penalty),
            Some(best) => best,
        }
    }
}

/// `round(100 * correct / total)`, or 0 for an empty quiz.
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = correct.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}
