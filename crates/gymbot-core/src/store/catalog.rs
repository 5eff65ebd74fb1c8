//! Exercise catalog: record types, query filter, sled-backed store and seeding.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{blocking, CatalogStore};
use crate::error::StoreResult;
use crate::shared::{Category, Difficulty, Environment, Language};

const EXERCISES_TREE: &str = "exercises";
const EXERCISE_PREFIX: &str = "exercise/";

/// Catalog bundled with the crate; seeded on boot when enabled.
const DEFAULT_CATALOG_JSON: &str = include_str!("../../data/exercises.json");

/// Where an exercise can be done. `Both` matches either training environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEnvironment {
    Gym,
    Home,
    Both,
}

impl CatalogEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gym => "gym",
            Self::Home => "home",
            Self::Both => "both",
        }
    }

    pub fn matches(&self, env: Environment) -> bool {
        matches!(
            (self, env),
            (Self::Both, _) | (Self::Gym, Environment::Gym) | (Self::Home, Environment::Home)
        )
    }
}

/// Text in both interface languages; Spanish falls back to English when blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub es: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, es: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            es: es.into(),
        }
    }

    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Es if !self.es.trim().is_empty() => &self.es,
            _ => &self.en,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.trim().is_empty() && self.es.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedList {
    #[serde(default)]
    pub en: Vec<String>,
    #[serde(default)]
    pub es: Vec<String>,
}

impl LocalizedList {
    pub fn get(&self, lang: Language) -> &[String] {
        match lang {
            Language::Es if !self.es.is_empty() => &self.es,
            _ => &self.en,
        }
    }
}

/// Sets and a reps string ("10-12", "30 sec", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub sets: u32,
    pub reps: String,
}

/// Per-level prescriptions; any level may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescriptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beginner: Option<Prescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate: Option<Prescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<Prescription>,
}

impl Prescriptions {
    pub fn get(&self, difficulty: Difficulty) -> Option<&Prescription> {
        match difficulty {
            Difficulty::Beginner => self.beginner.as_ref(),
            Difficulty::Intermediate => self.intermediate.as_ref(),
            Difficulty::Advanced => self.advanced.as_ref(),
        }
    }

    /// Prescription for `difficulty`, falling back to intermediate.
    pub fn resolve(&self, difficulty: Difficulty) -> Option<&Prescription> {
        self.get(difficulty).or(self.intermediate.as_ref())
    }
}

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Slug; derived from the English name when absent.
    #[serde(default)]
    pub id: String,
    pub name: LocalizedText,
    pub category: Category,
    pub environment: CatalogEnvironment,
    #[serde(default, alias = "difficulty")]
    pub prescriptions: Prescriptions,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub tips: LocalizedText,
    #[serde(default)]
    pub alternatives: LocalizedList,
    #[serde(default, alias = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Catalog filter. Environment matches the exact value or `both`; difficulty keeps
/// exercises prescribed at that level or at intermediate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExerciseQuery {
    pub category: Option<Category>,
    pub environment: Option<Environment>,
    pub difficulty: Option<Difficulty>,
}

impl ExerciseQuery {
    pub fn new(category: Category, environment: Environment, difficulty: Difficulty) -> Self {
        Self {
            category: Some(category),
            environment: Some(environment),
            difficulty: Some(difficulty),
        }
    }

    pub fn matches(&self, ex: &Exercise) -> bool {
        self.category.map_or(true, |c| ex.category == c)
            && self.environment.map_or(true, |e| ex.environment.matches(e))
            && self.difficulty.map_or(true, |_| self.prescription(ex).is_some())
    }

    /// Sets and reps `ex` is done with under this query. Without a difficulty
    /// filter the intermediate prescription applies.
    pub fn prescription<'a>(&self, ex: &'a Exercise) -> Option<&'a Prescription> {
        ex.prescriptions
            .resolve(self.difficulty.unwrap_or(Difficulty::Intermediate))
    }
}

/// Number of exercises per (category, environment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStat {
    pub category: Category,
    pub environment: CatalogEnvironment,
    pub count: usize,
}

/// Outcome of a seeding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub added: BTreeMap<Category, usize>,
    /// English names skipped because the name already existed.
    pub skipped: Vec<String>,
    pub total: usize,
}

impl SeedReport {
    pub fn added_total(&self) -> usize {
        self.added.values().sum()
    }
}

/// Parse a catalog JSON array.
pub fn parse_catalog(json: &str) -> Result<Vec<Exercise>, serde_json::Error> {
    serde_json::from_str(json)
}

/// The bundled default catalog.
pub fn default_catalog() -> Result<Vec<Exercise>, serde_json::Error> {
    parse_catalog(DEFAULT_CATALOG_JSON)
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Exercises in the `exercises` tree of a sled database.
#[derive(Clone)]
pub struct SledCatalog {
    tree: sled::Tree,
}

impl SledCatalog {
    pub fn open_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    pub fn from_db(db: &sled::Db) -> StoreResult<Self> {
        Ok(Self {
            tree: db.open_tree(EXERCISES_TREE)?,
        })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert one exercise; returns the key slug used. An explicit id replaces the
    /// stored row. Without one the slug comes from the English name, suffixed
    /// (`-2`, `-3`, ...) while another exercise already holds it.
    pub fn insert(&self, exercise: &Exercise) -> StoreResult<String> {
        let mut exercise = exercise.clone();
        if exercise.id.trim().is_empty() {
            exercise.id = self.free_slug(&slugify(&exercise.name.en))?;
        }
        let key = format!("{EXERCISE_PREFIX}{}", exercise.id);
        self.tree.insert(key.as_bytes(), serde_json::to_vec(&exercise)?)?;
        Ok(exercise.id)
    }

    fn free_slug(&self, base: &str) -> StoreResult<String> {
        let mut candidate = base.to_string();
        let mut n = 1;
        while self.tree.contains_key(format!("{EXERCISE_PREFIX}{candidate}"))? {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        Ok(candidate)
    }

    pub fn all(&self) -> StoreResult<Vec<Exercise>> {
        let mut out = Vec::new();
        for item in self.tree.scan_prefix(EXERCISE_PREFIX) {
            let (_, bytes) = item?;
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }

    /// Insert every exercise whose English or Spanish name is not already present.
    pub fn seed_missing(&self, exercises: Vec<Exercise>) -> StoreResult<SeedReport> {
        let existing = self.all()?;
        let mut en_names: HashSet<String> = existing.iter().map(|e| e.name.en.clone()).collect();
        let mut es_names: HashSet<String> = existing.iter().map(|e| e.name.es.clone()).collect();

        let mut report = SeedReport::default();
        for ex in exercises {
            let duplicate = en_names.contains(&ex.name.en)
                || (!ex.name.es.is_empty() && es_names.contains(&ex.name.es));
            if duplicate {
                tracing::debug!(target: "gymbot::catalog", name = %ex.name.en, "Skipping duplicate exercise");
                report.skipped.push(ex.name.en);
                continue;
            }
            self.insert(&ex)?;
            en_names.insert(ex.name.en.clone());
            es_names.insert(ex.name.es.clone());
            *report.added.entry(ex.category).or_insert(0) += 1;
        }
        self.tree.flush()?;
        report.total = self.len();

        tracing::info!(
            target: "gymbot::catalog",
            added = report.added_total(),
            skipped = report.skipped.len(),
            total = report.total,
            "Catalog seeded"
        );
        Ok(report)
    }

    /// Exercise counts per (category, environment), in category order.
    pub fn stats(&self) -> StoreResult<Vec<CatalogStat>> {
        let mut counts: BTreeMap<(Category, CatalogEnvironment), usize> = BTreeMap::new();
        for ex in self.all()? {
            *counts.entry((ex.category, ex.environment)).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((category, environment), count)| CatalogStat {
                category,
                environment,
                count,
            })
            .collect())
    }

    /// Case-insensitive substring search over names, descriptions and alternatives
    /// in both languages.
    pub fn search(&self, text: &str) -> StoreResult<Vec<Exercise>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        Ok(self
            .all()?
            .into_iter()
            .filter(|ex| {
                hit(&ex.name.en)
                    || hit(&ex.name.es)
                    || hit(&ex.description.en)
                    || hit(&ex.description.es)
                    || ex.alternatives.en.iter().any(|a| hit(a))
                    || ex.alternatives.es.iter().any(|a| hit(a))
            })
            .collect())
    }
}

#[async_trait]
impl CatalogStore for SledCatalog {
    async fn find(&self, query: &ExerciseQuery) -> StoreResult<Vec<Exercise>> {
        let catalog = self.clone();
        let filter = *query;
        let found: Vec<Exercise> = blocking(move || {
            Ok(catalog.all()?.into_iter().filter(|e| filter.matches(e)).collect())
        })
        .await?;
        tracing::debug!(
            target: "gymbot::catalog",
            category = ?query.category,
            environment = ?query.environment,
            difficulty = ?query.difficulty,
            found = found.len(),
            "Catalog query"
        );
        Ok(found)
    }
}

/// Catalog held in memory; used where no sled directory is wanted.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    exercises: Vec<Exercise>,
}

impl MemoryCatalog {
    pub fn new(exercises: Vec<Exercise>) -> Self {
        Self { exercises }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find(&self, query: &ExerciseQuery) -> StoreResult<Vec<Exercise>> {
        Ok(self
            .exercises
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect())
    }
}
