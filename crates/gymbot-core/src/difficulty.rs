//! Adaptive difficulty: a pure function over the recent feedback window.

use crate::shared::{Difficulty, Feedback, FeedbackKind, WorkoutRecord};

/// Number of preceding workouts considered together with the new feedback.
pub const FEEDBACK_WINDOW: usize = 5;

/// Matching feedbacks in the window needed to move one level.
pub const ADJUST_THRESHOLD: usize = 3;

/// Result of one adjustment, for messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Raised(Difficulty),
    Lowered(Difficulty),
    /// Too easy, but already at the top.
    AtMaximum,
    /// Too hard, but already at the bottom.
    AtMinimum,
    Unchanged,
}

/// New level after `new` is submitted at `current`.
///
/// `recent` holds the feedback of the records preceding the new one, oldest first;
/// only the last [`FEEDBACK_WINDOW`] entries are read and `None` (skipped) counts as absent.
/// Moves at most one step.
pub fn adjust(current: Difficulty, recent: &[Option<Feedback>], new: FeedbackKind) -> Difficulty {
    match classify(current, recent, new) {
        Adjustment::Raised(d) | Adjustment::Lowered(d) => d,
        Adjustment::AtMaximum | Adjustment::AtMinimum | Adjustment::Unchanged => current,
    }
}

/// Same decision as [`adjust`], keeping the reason.
pub fn classify(current: Difficulty, recent: &[Option<Feedback>], new: FeedbackKind) -> Adjustment {
    let start = recent.len().saturating_sub(FEEDBACK_WINDOW);
    let window = recent[start..]
        .iter()
        .copied()
        .chain(std::iter::once(new.as_feedback()));

    let (mut easy, mut hard) = (0usize, 0usize);
    for f in window.flatten() {
        match f {
            Feedback::TooEasy => easy += 1,
            Feedback::TooHard => hard += 1,
            Feedback::Perfect => {}
        }
    }

    if easy >= ADJUST_THRESHOLD {
        if current == Difficulty::Advanced {
            Adjustment::AtMaximum
        } else {
            Adjustment::Raised(current.harder())
        }
    } else if hard >= ADJUST_THRESHOLD {
        if current == Difficulty::Beginner {
            Adjustment::AtMinimum
        } else {
            Adjustment::Lowered(current.easier())
        }
    } else {
        Adjustment::Unchanged
    }
}

/// Feedback window for a history whose newest record is the one just submitted.
pub fn preceding_window(history: &[WorkoutRecord]) -> Vec<Option<Feedback>> {
    let preceding = history.len().saturating_sub(1);
    let start = preceding.saturating_sub(FEEDBACK_WINDOW);
    history[start..preceding]
        .iter()
        .map(WorkoutRecord::feedback_kind)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Feedback::*;

    #[test]
    fn three_easy_promotes_beginner() {
        let recent = [Some(TooEasy), Some(TooEasy)];
        assert_eq!(
            adjust(Difficulty::Beginner, &recent, FeedbackKind::TooEasy),
            Difficulty::Intermediate
        );
    }

    #[test]
    fn three_easy_at_advanced_stays() {
        let recent = [Some(TooEasy), Some(TooEasy)];
        assert_eq!(
            adjust(Difficulty::Advanced, &recent, FeedbackKind::TooEasy),
            Difficulty::Advanced
        );
        assert_eq!(
            classify(Difficulty::Advanced, &recent, FeedbackKind::TooEasy),
            Adjustment::AtMaximum
        );
    }

    #[test]
    fn three_hard_demotes_intermediate() {
        let recent = [Some(TooHard), Some(TooHard), Some(Perfect)];
        assert_eq!(
            adjust(Difficulty::Intermediate, &recent, FeedbackKind::TooHard),
            Difficulty::Beginner
        );
    }

    #[test]
    fn only_last_five_preceding_count() {
        // Two old too_easy entries fall outside the window.
        let recent = [
            Some(TooEasy),
            Some(TooEasy),
            Some(Perfect),
            None,
            Some(TooEasy),
            Some(Perfect),
            None,
        ];
        assert_eq!(
            classify(Difficulty::Intermediate, &recent, FeedbackKind::TooEasy),
            Adjustment::Unchanged
        );
    }

    #[test]
    fn skip_adds_nothing() {
        let recent = [Some(TooEasy), Some(TooEasy)];
        assert_eq!(
            classify(Difficulty::Beginner, &recent, FeedbackKind::Skip),
            Adjustment::Unchanged
        );
    }

    #[test]
    fn preceding_window_excludes_newest() {
        let mut history: Vec<WorkoutRecord> = (0..8)
            .map(|_| {
                WorkoutRecord::now(
                    crate::shared::Category::Core,
                    crate::shared::Environment::Home,
                    Difficulty::Intermediate,
                    vec![],
                )
            })
            .collect();
        history[7].feedback = Some(crate::shared::FeedbackEntry::now(
            TooHard,
            crate::shared::RoutineId(1),
        ));
        let window = preceding_window(&history);
        assert_eq!(window.len(), FEEDBACK_WINDOW);
        assert!(window.iter().all(Option::is_none));
        assert!(preceding_window(&[]).is_empty());
    }
}
