//! Derived user statistics and the next-category recommendation.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::shared::{Category, Feedback, WorkoutRecord};

/// Days scanned backwards (today included) when computing the streak.
pub const STREAK_SCAN_DAYS: u64 = 30;

/// Workouts looked at when recommending the next category.
pub const RECOMMEND_LOOKBACK: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCounts {
    pub too_easy: usize,
    pub perfect: usize,
    pub too_hard: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_workouts: usize,
    pub favorite_category: Option<Category>,
    pub current_streak: u32,
    pub by_category: BTreeMap<Category, usize>,
    pub feedback: FeedbackCounts,
}

impl UserStats {
    pub fn from_history(history: &[WorkoutRecord], today: NaiveDate) -> Self {
        let mut by_category = BTreeMap::new();
        let mut feedback = FeedbackCounts::default();
        for w in history {
            *by_category.entry(w.category).or_insert(0) += 1;
            match w.feedback_kind() {
                Some(Feedback::TooEasy) => feedback.too_easy += 1,
                Some(Feedback::Perfect) => feedback.perfect += 1,
                Some(Feedback::TooHard) => feedback.too_hard += 1,
                None => feedback.skipped += 1,
            }
        }

        // Ties go to the category listed first.
        let mut favorite_category = None;
        let mut best = 0;
        for c in Category::ALL {
            let n = by_category.get(&c).copied().unwrap_or(0);
            if n > best {
                best = n;
                favorite_category = Some(c);
            }
        }

        Self {
            total_workouts: history.len(),
            favorite_category,
            current_streak: streak(history, today),
            by_category,
            feedback,
        }
    }
}

/// Consecutive training days counted back from today. A missing day today does not
/// break the streak; any earlier gap does.
pub fn streak(history: &[WorkoutRecord], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = history.iter().map(|w| w.completed_at.date_naive()).collect();
    let mut count = 0;
    for offset in 0..STREAK_SCAN_DAYS {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        if days.contains(&day) {
            count += 1;
        } else if offset > 0 {
            break;
        }
    }
    count
}

/// A category not trained in the last few workouts, chosen at random; `FullBody`
/// when every category was used recently or there is no history yet.
pub fn recommended_category<R: Rng + ?Sized>(history: &[WorkoutRecord], rng: &mut R) -> Category {
    if history.is_empty() {
        return Category::FullBody;
    }
    let start = history.len().saturating_sub(RECOMMEND_LOOKBACK);
    let recent: HashSet<Category> = history[start..].iter().map(|w| w.category).collect();
    let unused: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|c| !recent.contains(c))
        .collect();
    unused.choose(rng).copied().unwrap_or(Category::FullBody)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{Difficulty, Environment, FeedbackEntry, RoutineId};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn on(day: NaiveDate, category: Category) -> WorkoutRecord {
        let mut w = WorkoutRecord::now(category, Environment::Gym, Difficulty::Beginner, vec![]);
        w.completed_at = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
        w
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_history_has_no_favorite() {
        let stats = UserStats::from_history(&[], d(2024, 5, 10));
        assert_eq!(stats.total_workouts, 0);
        assert_eq!(stats.favorite_category, None);
        assert_eq!(stats.current_streak, 0);
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn favorite_ties_break_by_category_order() {
        let today = d(2024, 5, 10);
        let history = vec![
            on(today, Category::Yoga),
            on(today, Category::Core),
            on(today, Category::Yoga),
            on(today, Category::Core),
        ];
        let stats = UserStats::from_history(&history, today);
        assert_eq!(stats.favorite_category, Some(Category::Core));
        assert_eq!(stats.by_category[&Category::Yoga], 2);
        assert_eq!(stats.feedback.skipped, 4);
    }

    #[test]
    fn feedback_is_counted_per_kind() {
        let today = d(2024, 5, 10);
        let mut a = on(today, Category::Core);
        a.feedback = Some(FeedbackEntry::now(Feedback::TooHard, RoutineId(1)));
        let mut b = on(today, Category::Core);
        b.feedback = Some(FeedbackEntry::now(Feedback::Perfect, RoutineId(2)));
        let stats = UserStats::from_history(&[a, b, on(today, Category::Cardio)], today);
        assert_eq!(
            stats.feedback,
            FeedbackCounts {
                too_easy: 0,
                perfect: 1,
                too_hard: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn streak_tolerates_a_rest_day_today_but_not_a_gap() {
        let today = d(2024, 5, 10);
        let history = vec![
            on(d(2024, 5, 5), Category::Core),
            on(d(2024, 5, 7), Category::Core),
            on(d(2024, 5, 8), Category::Core),
            on(d(2024, 5, 9), Category::Core),
            on(d(2024, 5, 9), Category::Yoga),
        ];
        assert_eq!(streak(&history, today), 3);

        let mut with_today = history.clone();
        with_today.push(on(today, Category::Cardio));
        assert_eq!(streak(&with_today, today), 4);

        assert_eq!(streak(&history, d(2024, 5, 12)), 0);
    }

    #[test]
    fn recommendation_avoids_recent_categories() {
        let today = d(2024, 5, 10);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(recommended_category(&[], &mut rng), Category::FullBody);

        let history = vec![
            on(today, Category::FullBody),
            on(today, Category::Core),
            on(today, Category::Yoga),
            on(today, Category::Cardio),
        ];
        for _ in 0..20 {
            let c = recommended_category(&history, &mut rng);
            assert!(![Category::Core, Category::Yoga, Category::Cardio].contains(&c));
        }
    }
}
