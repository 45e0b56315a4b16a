//! Batch planner.

use super::prompt::Prompt;

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Estimated tokens allowed per budget window.
    pub token_budget: usize,
    /// Hard cap on prompts in one request.
    pub max_prompts_per_request: usize,
}
impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            token_budget: 40_000,
            max_prompts_per_request: 20,
        }
    }
}
impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_token_budget(mut self, b: usize) -> Self {
        self.token_budget = b;
        self
    }
    pub fn with_max_prompts_per_request(mut self, m: usize) -> Self {
        self.max_prompts_per_request = m;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchPlanner {
    config: PlannerConfig,
}

impl BatchPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan(&self, remaining: &[Prompt], per_prompt_fixed_cost: usize) -> usize {
        plan_batch_size(
            remaining,
            per_prompt_fixed_cost,
            self.config.token_budget,
            self.config.max_prompts_per_request,
        )
    }
}

/// Number of prompts from the front of `remaining` to submit next.
///
/// Only the first `max_prompts_per_request` prompts can ever be taken, so the
/// budget check looks at that window. If the whole window fits it is taken;
/// otherwise the count is sized against the most expensive prompt in the
/// window so any prefix of that length fits. The result is at least 1 for
/// non-empty input: an oversized prompt is still attempted on its own.
pub fn plan_batch_size(
    remaining: &[Prompt],
    per_prompt_fixed_cost: usize,
    token_budget: usize,
    max_prompts_per_request: usize,
) -> usize {
    let window = remaining.len().min(max_prompts_per_request.max(1));
    if window == 0 {
        return 0;
    }
    let window_prompts = &remaining[..window];

    let total: usize = window_prompts
        .iter()
        .map(|p| p.text_cost.saturating_add(per_prompt_fixed_cost))
        .fold(0usize, |acc, c| acc.saturating_add(c));
    if total <= token_budget {
        return window;
    }

    let max_cost = window_prompts
        .iter()
        .map(|p| p.text_cost)
        .max()
        .unwrap_or(0)
        .saturating_add(per_prompt_fixed_cost);
    // total > budget implies max_cost > 0
    let count = token_budget.checked_div(max_cost).unwrap_or(window);
    count.clamp(1, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts(costs: &[usize]) -> Vec<Prompt> {
        costs
            .iter()
            .enumerate()
            .map(|(i, &c)| Prompt {
                index: i,
                text: "x".repeat(c * 4),
                text_cost: c,
            })
            .collect()
    }

    #[test]
    fn test_empty_plans_zero() {
        assert_eq!(plan_batch_size(&[], 10, 100, 5), 0);
    }

    #[test]
    fn test_everything_fits() {
        let p = prompts(&[5, 5, 5]);
        assert_eq!(plan_batch_size(&p, 10, 1_000, 20), 3);
    }

    #[test]
    fn test_capped_by_max_prompts() {
        let p = prompts(&[1; 50]);
        assert_eq!(plan_batch_size(&p, 1, 1_000_000, 20), 20);
    }

    #[test]
    fn test_sized_by_most_expensive_prompt() {
        // (max 30 + fixed 10) = 40 per slot, budget 100 -> 2
        let p = prompts(&[5, 30, 5, 5]);
        assert_eq!(plan_batch_size(&p, 10, 100, 20), 2);
    }

    #[test]
    fn test_oversized_prompt_still_attempted() {
        let p = prompts(&[500, 1]);
        assert_eq!(plan_batch_size(&p, 10, 100, 20), 1);
    }

    #[test]
    fn test_zero_max_prompts_treated_as_one() {
        let p = prompts(&[1, 1]);
        assert_eq!(plan_batch_size(&p, 0, 100, 0), 1);
    }

    #[test]
    fn test_zero_cost_zero_budget_fits() {
        let p = prompts(&[0, 0, 0]);
        assert_eq!(plan_batch_size(&p, 0, 0, 5), 3);
    }

    #[test]
    fn test_result_always_in_range() {
        let budgets = [0usize, 1, 7, 50, 120, 10_000];
        let maxes = [1usize, 2, 3, 7, 20];
        let shapes: [&[usize]; 4] = [&[0], &[3, 90, 1, 1, 1], &[10; 9], &[1000, 0, 0]];
        for &budget in &budgets {
            for &max in &maxes {
                for shape in shapes {
                    let p = prompts(shape);
                    let n = plan_batch_size(&p, 4, budget, max);
                    assert!(n >= 1, "budget={budget} max={max} shape={shape:?}");
                    assert!(n <= max, "budget={budget} max={max} shape={shape:?}");
                    assert!(n <= p.len());
                }
            }
        }
    }

    #[test]
    fn test_planned_prefix_respects_budget_unless_single() {
        let p = prompts(&[3, 9, 27, 2, 2, 8]);
        let budget = 40;
        let fixed = 4;
        let n = plan_batch_size(&p, fixed, budget, 10);
        let cost: usize = p[..n].iter().map(|x| x.text_cost + fixed).sum();
        assert!(n == 1 || cost <= budget);
    }

    #[test]
    fn test_planner_uses_config() {
        let planner = BatchPlanner::new(
            PlannerConfig::new()
                .with_token_budget(30)
                .with_max_prompts_per_request(4),
        );
        let p = prompts(&[5; 10]);
        // 10 per prompt with fixed cost 5 -> 3 fit
        assert_eq!(planner.plan(&p, 5), 3);
    }
}
