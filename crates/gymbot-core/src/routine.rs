//! Routine generator: picks and orders a bounded set of exercises from the catalog.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RoutineError;
use crate::shared::{Category, Difficulty, Environment, Language, RoutineId};
use crate::store::{CatalogStore, Exercise, ExerciseQuery, Prescription};

/// Categories a full-body routine draws from.
pub const FULL_BODY_GROUPS: [Category; 4] = [
    Category::ChestBiceps,
    Category::BackTriceps,
    Category::LegsShoulders,
    Category::Core,
];

/// Exercises drawn from each group for a full-body routine.
pub const FULL_BODY_PER_GROUP: usize = 2;

/// Maximum number of exercises in a routine of `category`.
pub fn routine_size(category: Category) -> usize {
    match category {
        Category::Core => 4,
        Category::FullBody => 6,
        _ => 5,
    }
}

/// One numbered line of a generated routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineEntry {
    /// 1-based.
    pub position: usize,
    pub exercise_id: String,
    pub name: String,
    pub sets: String,
    pub alternatives: Vec<String>,
    pub tip: Option<String>,
    pub video_url: Option<String>,
}

/// One generation result. Never persisted; rebuilt on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineInstance {
    pub id: RoutineId,
    pub category: Category,
    pub environment: Environment,
    pub difficulty: Difficulty,
    pub language: Language,
    pub entries: Vec<RoutineEntry>,
}

impl RoutineInstance {
    pub fn exercise_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

fn format_sets(sets: u32, reps: &str, lang: Language) -> String {
    match lang {
        Language::En => format!("{sets} sets x {reps}"),
        Language::Es => format!("{sets} series x {reps}"),
    }
}

fn to_entry(position: usize, ex: &Exercise, prescription: &Prescription, lang: Language) -> RoutineEntry {
    let sets = format_sets(prescription.sets, &prescription.reps, lang);
    let tip = ex.tips.get(lang).trim();
    RoutineEntry {
        position,
        exercise_id: ex.id.clone(),
        name: ex.name.get(lang).to_string(),
        sets,
        alternatives: ex.alternatives.get(lang).to_vec(),
        tip: (!tip.is_empty()).then(|| tip.to_string()),
        video_url: ex.video_url.clone().filter(|u| !u.trim().is_empty()),
    }
}

/// Shuffle and cut the candidate pools. Full body keeps a few from each group
/// before the final shuffle.
pub fn select<R: Rng + ?Sized>(
    category: Category,
    pools: Vec<Vec<Exercise>>,
    rng: &mut R,
) -> Vec<Exercise> {
    let mut picked = if category == Category::FullBody {
        let mut all = Vec::new();
        for mut pool in pools {
            pool.shuffle(rng);
            pool.truncate(FULL_BODY_PER_GROUP);
            all.extend(pool);
        }
        all
    } else {
        pools.into_iter().flatten().collect()
    };
    picked.shuffle(rng);
    picked.truncate(routine_size(category));
    picked
}

pub struct RoutineGenerator {
    catalog: Arc<dyn CatalogStore>,
}

impl RoutineGenerator {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    async fn candidates(
        &self,
        category: Category,
        environment: Environment,
        difficulty: Difficulty,
    ) -> Result<Vec<Vec<Exercise>>, RoutineError> {
        let groups: &[Category] = if category == Category::FullBody {
            &FULL_BODY_GROUPS
        } else {
            std::slice::from_ref(&category)
        };
        let mut pools = Vec::with_capacity(groups.len());
        for &group in groups {
            let query = ExerciseQuery::new(group, environment, difficulty);
            pools.push(self.catalog.find(&query).await?);
        }
        Ok(pools)
    }

    /// Fresh routine for the given choices, shuffled with the thread RNG.
    pub async fn generate(
        &self,
        category: Category,
        environment: Environment,
        difficulty: Difficulty,
        language: Language,
    ) -> Result<RoutineInstance, RoutineError> {
        let pools = self.candidates(category, environment, difficulty).await?;
        // ThreadRng is !Send; keep it out of any await.
        let picked = {
            let mut rng = rand::thread_rng();
            select(category, pools, &mut rng)
        };
        build(category, environment, difficulty, language, picked)
    }

    /// Same as [`generate`](Self::generate) with a caller-supplied RNG.
    pub async fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        category: Category,
        environment: Environment,
        difficulty: Difficulty,
        language: Language,
        rng: &mut R,
    ) -> Result<RoutineInstance, RoutineError> {
        let pools = self.candidates(category, environment, difficulty).await?;
        let picked = select(category, pools, rng);
        build(category, environment, difficulty, language, picked)
    }
}

fn build(
    category: Category,
    environment: Environment,
    difficulty: Difficulty,
    language: Language,
    picked: Vec<Exercise>,
) -> Result<RoutineInstance, RoutineError> {
    // Same rule the catalog filtered with, so every picked exercise resolves.
    let query = ExerciseQuery {
        difficulty: Some(difficulty),
        ..Default::default()
    };
    let entries = picked
        .iter()
        .filter_map(|ex| query.prescription(ex).map(|p| (ex, p)))
        .enumerate()
        .map(|(i, (ex, p))| to_entry(i + 1, ex, p, language))
        .collect::<Vec<_>>();
    if entries.is_empty() {
        tracing::warn!(
            target: "gymbot::routine",
            category = category.as_str(),
            environment = environment.as_str(),
            difficulty = difficulty.as_str(),
            "No exercises matched"
        );
        return Err(RoutineError::Empty { category });
    }
    tracing::info!(
        target: "gymbot::routine",
        category = category.as_str(),
        environment = environment.as_str(),
        difficulty = difficulty.as_str(),
        exercises = entries.len(),
        "Routine generated"
    );
    Ok(RoutineInstance {
        id: RoutineId::now(),
        category,
        environment,
        difficulty,
        language,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        CatalogEnvironment, LocalizedList, LocalizedText, MemoryCatalog, Prescription,
        Prescriptions,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ex(en: &str, es: &str, category: Category) -> Exercise {
        Exercise {
            id: en.to_lowercase().replace(' ', "-"),
            name: LocalizedText::new(en, es),
            category,
            environment: CatalogEnvironment::Both,
            prescriptions: Prescriptions {
                beginner: Some(Prescription {
                    sets: 2,
                    reps: "10".into(),
                }),
                intermediate: Some(Prescription {
                    sets: 3,
                    reps: "12".into(),
                }),
                advanced: None,
            },
            description: LocalizedText::default(),
            tips: LocalizedText::new("Breathe", ""),
            alternatives: LocalizedList {
                en: vec!["Wall sit".into()],
                es: vec![],
            },
            video_url: None,
        }
    }

    #[test]
    fn select_caps_by_category() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool: Vec<Exercise> = (0..9).map(|i| ex(&format!("Core {i}"), "", Category::Core)).collect();
        assert_eq!(select(Category::Core, vec![pool.clone()], &mut rng).len(), 4);
        assert_eq!(select(Category::Cardio, vec![pool], &mut rng).len(), 5);
    }

    #[test]
    fn full_body_takes_two_per_group() {
        let mut rng = StdRng::seed_from_u64(5);
        let pools: Vec<Vec<Exercise>> = FULL_BODY_GROUPS
            .iter()
            .map(|&g| (0..4).map(|i| ex(&format!("{} {i}", g.as_str()), "", g)).collect())
            .collect();
        let picked = select(Category::FullBody, pools, &mut rng);
        assert_eq!(picked.len(), 6);
        for g in FULL_BODY_GROUPS {
            assert!(picked.iter().filter(|e| e.category == g).count() <= FULL_BODY_PER_GROUP);
        }
    }

    #[test]
    fn unprescribed_exercise_never_becomes_an_entry() {
        let mut beginner_only = ex("Wall Push", "Flexión en pared", Category::ChestBiceps);
        beginner_only.prescriptions.intermediate = None;
        let bench = ex("Bench Press", "Press de banca", Category::ChestBiceps);

        let routine = build(
            Category::ChestBiceps,
            Environment::Gym,
            Difficulty::Advanced,
            Language::En,
            vec![beginner_only.clone(), bench],
        )
        .unwrap();
        assert_eq!(routine.exercise_names(), vec!["Bench Press".to_string()]);
        assert_eq!(routine.entries[0].position, 1);
        assert_eq!(routine.entries[0].sets, "3 sets x 12");

        let err = build(
            Category::ChestBiceps,
            Environment::Gym,
            Difficulty::Advanced,
            Language::En,
            vec![beginner_only],
        )
        .unwrap_err();
        assert!(matches!(err, RoutineError::Empty { category: Category::ChestBiceps }));
    }

    #[tokio::test]
    async fn entries_are_numbered_and_localized() {
        let catalog = Arc::new(MemoryCatalog::new(vec![ex("Squat", "Sentadilla", Category::LegsShoulders)]));
        let generator = RoutineGenerator::new(catalog);
        let routine = generator
            .generate(
                Category::LegsShoulders,
                Environment::Home,
                Difficulty::Advanced,
                Language::Es,
            )
            .await
            .unwrap();

        assert_eq!(routine.entries.len(), 1);
        let entry = &routine.entries[0];
        assert_eq!(entry.position, 1);
        assert_eq!(entry.name, "Sentadilla");
        // No advanced prescription: intermediate is used.
        assert_eq!(entry.sets, "3 series x 12");
        assert_eq!(entry.alternatives, vec!["Wall sit".to_string()]);
        assert_eq!(entry.tip.as_deref(), Some("Breathe"));
    }
}
