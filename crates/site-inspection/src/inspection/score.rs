use super::bank::QuestionBank;
use serde::Serialize;
use std::collections::BTreeMap;

/// Derived score and progress for one audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTotals {
    pub live_score: u32,
    pub total_possible_score: u32,
    pub total_questions: usize,
    pub answered_questions: usize,
}

impl ScoreTotals {
    /// Gates the save action.
    pub fn is_form_complete(&self) -> bool {
        self.total_questions > 0 && self.total_questions == self.answered_questions
    }

    pub fn progress_pct(&self) -> f32 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.answered_questions as f32 / self.total_questions as f32 * 100.0
    }
}

/// Possible score is optimistic: unanswered questions count at full value
/// until they are answered with a not-applicable option. Sums saturate.
pub fn compute_totals(bank: &QuestionBank, answers: &BTreeMap<String, String>) -> ScoreTotals {
    let mut totals = ScoreTotals::default();

    for question in bank.questions().filter(|question| question.is_counted()) {
        totals.total_questions += 1;

        let Some(answer) = answers.get(&question.id) else {
            totals.total_possible_score =
                totals.total_possible_score.saturating_add(question.max_points);
            continue;
        };

        totals.answered_questions += 1;

        let applicable = match question.option(answer) {
            Some(option) => {
                if let Some(points) = option.points.value() {
                    totals.live_score = totals.live_score.saturating_add(points);
                }
                !option.points.is_not_applicable()
            }
            None => true,
        };

        if applicable {
            totals.total_possible_score =
                totals.total_possible_score.saturating_add(question.max_points);
        }
    }

    totals
}
