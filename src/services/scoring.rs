//! Scoring rules for answer submissions and standings.

use crate::models::domain::{Question, Quiz, QuizPhase, QuizResult};

/// Rating gained for solving `question`. Unrated quizzes never move ratings.
pub fn rating_delta(quiz: &Quiz, question: &Question) -> i32 {
    if quiz.is_rated {
        question.difficulty
    } else {
        0
    }
}

/// Whether a submission may change the participant's row at all. The
/// first-solve check happens in the store.
pub fn should_score(phase: QuizPhase, registered: bool, is_correct: bool) -> bool {
    phase == QuizPhase::GoesOn && registered && is_correct
}

/// Competition ranking ("1224") by solved count. `rows` must already be in
/// standings order.
pub fn competition_places(rows: &[QuizResult]) -> Vec<i32> {
    let mut places = Vec::with_capacity(rows.len());
    let mut last: Option<(i32, i32)> = None;

    for (i, row) in rows.iter().enumerate() {
        let place = match last {
            Some((solved, place)) if solved == row.solved => place,
            _ => i as i32 + 1,
        };
        places.push(place);
        last = Some((row.solved, place));
    }

    places
}
