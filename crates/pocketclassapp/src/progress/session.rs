use super::policy::score_percent;
use crate::model::{Capsule, CapsuleId};

/// Result of evaluating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_index: usize,
    pub chosen: usize,
    pub correct_index: usize,
    pub is_correct: bool,
}

/// One pass through a capsule's quiz. Never persisted.
///
/// After an answer the session is locked until [`QuizSession::advance`] is
/// called, which is how the feedback window between answer and next question is
/// kept free of double submissions.
#[derive(Debug, Clone)]
pub struct QuizSession {
    capsule_id: CapsuleId,
    answer_key: Vec<usize>,
    current: usize,
    correct: usize,
    awaiting_advance: bool,
}

impl QuizSession {
    pub fn start(capsule: &Capsule) -> Self {
        Self {
            capsule_id: capsule.id.clone(),
            answer_key: capsule.quiz.iter().map(|q| q.correct).collect(),
            current: 0,
            correct: 0,
            awaiting_advance: false,
        }
    }

    pub fn capsule_id(&self) -> &CapsuleId {
        &self.capsule_id
    }

    pub fn total(&self) -> usize {
        self.answer_key.len()
    }

    /// Position of the question being asked.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Running count of correct answers in this pass.
    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.answer_key.len()
    }

    pub fn accepts_input(&self) -> bool {
        !self.awaiting_advance && !self.is_finished()
    }

    /// Evaluates `chosen` for `question_index`.
    ///
    /// Ignored (None) while locked, after the pass is finished, or when
    /// `question_index` is not the current question.
    pub fn answer(&mut self, question_index: usize, chosen: usize) -> Option<AnswerOutcome> {
        if !self.accepts_input() || question_index != self.current {
            return None;
        }
        let correct_index = self.answer_key[self.current];
        let is_correct = chosen == correct_index;
        if is_correct {
            self.correct += 1;
        }
        self.awaiting_advance = true;

        Some(AnswerOutcome {
            question_index,
            chosen,
            correct_index,
            is_correct,
        })
    }

    /// Moves to the next question once the current one has been answered.
    /// Returns false when there was nothing to advance from.
    pub fn advance(&mut self) -> bool {
        if !self.awaiting_advance {
            return false;
        }
        self.awaiting_advance = false;
        self.current += 1;
        true
    }

    /// Score of the pass so far, over the whole quiz.
    pub fn percent(&self) -> u8 {
        score_percent(self.correct, self.total())
    }

    pub fn restart(&mut self) {
        self.current = 0;
        self.correct = 0;
        self.awaiting_advance = false;
    }
}
