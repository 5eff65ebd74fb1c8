//! Property tests: difficulty adjustment bounds and action token round-trips.

use gymbot_core::difficulty::{adjust, classify, Adjustment};
use gymbot_core::{
    Action, Category, Difficulty, Environment, Feedback, FeedbackKind, Language, RoutineId,
    MAX_TOKEN_LEN,
};
use proptest::prelude::*;

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(Difficulty::ALL.to_vec())
}

fn feedback_kind() -> impl Strategy<Value = FeedbackKind> {
    prop::sample::select(FeedbackKind::ALL.to_vec())
}

fn recent() -> impl Strategy<Value = Vec<Option<Feedback>>> {
    prop::collection::vec(prop::option::of(prop::sample::select(Feedback::ALL.to_vec())), 0..12)
}

fn environment() -> impl Strategy<Value = Environment> {
    prop::sample::select(Environment::ALL.to_vec())
}

fn category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn any_action() -> impl Strategy<Value = Action> {
    let lang = prop::sample::select(Language::ALL.to_vec());
    prop_oneof![
        lang.clone().prop_map(Action::SelectLanguage),
        Just(Action::StartWorkout),
        environment().prop_map(Action::SelectEnvironment),
        (environment(), category()).prop_map(|(environment, category)| Action::SelectCategory {
            environment,
            category
        }),
        (environment(), category()).prop_map(|(environment, category)| Action::ConfirmRoutine {
            environment,
            category
        }),
        (environment(), category()).prop_map(|(environment, category)| Action::NewRoutine {
            environment,
            category
        }),
        (0..=RoutineId::MAX.0, environment(), category()).prop_map(|(id, environment, category)| {
            Action::FinishWorkout {
                routine_id: RoutineId(id),
                environment,
                category,
            }
        }),
        (feedback_kind(), 0..=RoutineId::MAX.0, environment(), category()).prop_map(
            |(kind, id, environment, category)| Action::Feedback {
                kind,
                routine_id: RoutineId(id),
                environment,
                category,
            }
        ),
        Just(Action::BackToMain),
        Just(Action::ShowHistory),
        Just(Action::OpenSettings),
        Just(Action::ChangeLanguage),
        lang.prop_map(Action::SetLanguage),
        Just(Action::ChangeDifficulty),
        difficulty().prop_map(Action::SetDifficulty),
        Just(Action::ClearHistory),
        Just(Action::ConfirmClearHistory),
    ]
}

fn step(d: Difficulty) -> i32 {
    match d {
        Difficulty::Beginner => 0,
        Difficulty::Intermediate => 1,
        Difficulty::Advanced => 2,
    }
}

proptest! {
    #[test]
    fn adjust_moves_at_most_one_level(current in difficulty(), recent in recent(), new in feedback_kind()) {
        let next = adjust(current, &recent, new);
        prop_assert!((step(next) - step(current)).abs() <= 1);
    }

    #[test]
    fn adjust_is_deterministic(current in difficulty(), recent in recent(), new in feedback_kind()) {
        prop_assert_eq!(adjust(current, &recent, new), adjust(current, &recent, new));
    }

    #[test]
    fn skip_counts_like_a_neutral_answer(current in difficulty(), recent in recent()) {
        // Only the window can trigger a move; skip itself contributes nothing.
        let with_skip = classify(current, &recent, FeedbackKind::Skip);
        let with_perfect = classify(current, &recent, FeedbackKind::Perfect);
        prop_assert_eq!(with_skip, with_perfect);
    }

    #[test]
    fn sequence_stays_in_range(start in difficulty(), answers in prop::collection::vec(feedback_kind(), 0..40)) {
        let mut level = start;
        let mut history: Vec<Option<Feedback>> = Vec::new();
        for kind in answers {
            let next = adjust(level, &history, kind);
            prop_assert!((step(next) - step(level)).abs() <= 1);
            level = next;
            history.push(kind.as_feedback());
        }
        prop_assert!(Difficulty::ALL.contains(&level));
    }

    #[test]
    fn every_action_round_trips(action in any_action()) {
        let token = action.encode();
        prop_assert_eq!(Action::decode(&token), Ok(action));
    }

    #[test]
    fn tokens_fit_callback_limit(action in any_action(), id in 0..=RoutineId::MAX.0) {
        let action = match action {
            Action::FinishWorkout { environment, category, .. } => Action::FinishWorkout {
                routine_id: RoutineId(id),
                environment,
                category,
            },
            Action::Feedback { kind, environment, category, .. } => Action::Feedback {
                kind,
                routine_id: RoutineId(id),
                environment,
                category,
            },
            other => other,
        };
        prop_assert!(action.encode().len() <= MAX_TOKEN_LEN);
    }

    #[test]
    fn decode_never_panics(token in ".{0,80}") {
        let _ = Action::decode(&token);
    }
}

#[test]
fn promotion_and_demotion_examples() {
    use Feedback::*;
    assert_eq!(
        adjust(Difficulty::Beginner, &[Some(TooEasy), Some(TooEasy)], FeedbackKind::TooEasy),
        Difficulty::Intermediate
    );
    assert_eq!(
        adjust(Difficulty::Advanced, &[Some(TooEasy), Some(TooEasy)], FeedbackKind::TooEasy),
        Difficulty::Advanced
    );
    assert_eq!(
        adjust(
            Difficulty::Intermediate,
            &[Some(TooHard), Some(TooHard), Some(Perfect)],
            FeedbackKind::TooHard
        ),
        Difficulty::Beginner
    );
    assert_eq!(
        classify(Difficulty::Beginner, &[Some(TooHard), Some(TooHard)], FeedbackKind::TooHard),
        Adjustment::AtMinimum
    );
}
