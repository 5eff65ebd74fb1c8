use std::sync::Arc;
use std::time::Duration;

use crate::codec::Action;
use crate::difficulty::Adjustment;
use crate::error::{DialogError, RoutineError, StoreError};
use crate::routine::{RoutineGenerator, RoutineInstance};
use crate::session::SessionStore;
use crate::shared::{
    Category, Difficulty, Environment, FeedbackKind, Language, RoutineId,
    UserRecord, WorkoutRecord,
};
use crate::store::stats::{recommended_category, UserStats};
use crate::store::{with_timeout, CatalogStore, ProfileStore, ProfileUpsert};

use super::i18n::{self, escape_html, fill, texts};
use super::{Choice, DialogState, Event, Inbound, Screen};

/// Workouts listed on the history screen.
const HISTORY_PREVIEW: usize = 5;

/// The conversation state machine. Cheap to share behind an `Arc`; every call to
/// [`handle`](Self::handle) is an independent unit of work.
pub struct DialogEngine {
    profiles: Arc<dyn ProfileStore>,
    routines: RoutineGenerator,
    sessions: SessionStore,
    store_timeout: Duration,
}

impl DialogEngine {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        catalog: Arc<dyn CatalogStore>,
        sessions: SessionStore,
        store_timeout: Duration,
    ) -> Self {
        Self {
            profiles,
            routines: RoutineGenerator::new(catalog),
            sessions,
            store_timeout,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// Next screen for `inbound`. Never fails: every error becomes a recovery screen.
    pub async fn handle(&self, inbound: &Inbound) -> Screen {
        let user_id = inbound.user_id.as_str();
        let result = match &inbound.event {
            Event::Command(cmd) if is_start(cmd) => self.start(inbound).await,
            Event::Command(_) | Event::Text(_) => self.fallback(inbound).await,
            Event::Callback(token) => match Action::decode(token) {
                Ok(action) => {
                    tracing::debug!(target: "gymbot::dialog", user_id, action = action.name(), "Callback");
                    self.on_action(inbound, action).await
                }
                Err(e) => Err(DialogError::InvalidToken(e)),
            },
        };

        let screen = match result {
            Ok(screen) => screen,
            Err(err) => self.recover(inbound, err).await,
        };

        if screen.state == DialogState::MainMenu {
            self.sessions.clear_selection(user_id);
        }
        self.sessions.set_state(user_id, screen.state);
        screen
    }

    async fn on_action(&self, inbound: &Inbound, action: Action) -> Result<Screen, DialogError> {
        let user_id = inbound.user_id.as_str();
        let Some(record) = self.timed(self.profiles.get_record(user_id)).await? else {
            // First contact: only a language choice can create the profile.
            return match action {
                Action::SelectLanguage(lang) => self.select_language(inbound, lang).await,
                _ => Err(DialogError::ProfileMissing(user_id.to_string())),
            };
        };
        let lang = record.profile.language;
        let screen = match action {
            // A known user pressing a language button from an older screen.
            Action::SelectLanguage(lang) => return self.select_language(inbound, lang).await,
            Action::StartWorkout => environment_screen(lang),
            Action::SelectEnvironment(env) => {
                self.sessions.set_environment(user_id, env);
                category_screen(env, lang, None)
            }
            Action::SelectCategory {
                environment,
                category,
            } => {
                self.sessions.set_selection(user_id, environment, category);
                confirmation_screen(environment, category, record.profile.difficulty, lang)
            }
            Action::ConfirmRoutine {
                environment,
                category,
            }
            | Action::NewRoutine {
                environment,
                category,
            } => {
                self.sessions.set_selection(user_id, environment, category);
                let difficulty = record.profile.difficulty;
                match self.draw(category, environment, difficulty, lang).await? {
                    Some(routine) => routine_screen(&routine),
                    None => category_screen(environment, lang, Some(texts(lang).no_exercises)),
                }
            }
            Action::FinishWorkout {
                routine_id,
                environment,
                category,
            } => feedback_screen(routine_id, environment, category, lang),
            Action::Feedback {
                kind,
                routine_id,
                environment,
                category,
            } => {
                self.record_feedback(&record, kind, routine_id, environment, category)
                    .await?
            }
            Action::BackToMain => main_menu(&inbound.first_name, &record),
            Action::ShowHistory => history_screen(&record),
            Action::OpenSettings => settings_screen(&record),
            Action::ChangeLanguage => {
                let t = texts(lang);
                let mut screen = Screen::new(DialogState::SettingsLanguage, t.choose_new_language);
                for l in Language::ALL {
                    screen = screen.button(i18n::language_label(l), Action::SetLanguage(l));
                }
                screen.button(t.btn_back_to_settings, Action::OpenSettings)
            }
            Action::SetLanguage(new_lang) => {
                self.timed(self.profiles.upsert_profile(&ProfileUpsert::update(user_id).language(new_lang)))
                    .await?;
                settings_confirmation(i18n::language_changed(new_lang), new_lang)
            }
            Action::ChangeDifficulty => {
                let t = texts(lang);
                let mut screen = Screen::new(DialogState::SettingsDifficulty, t.choose_new_difficulty);
                for d in Difficulty::ALL {
                    screen = screen.button(i18n::difficulty_label(d, lang), Action::SetDifficulty(d));
                }
                screen.button(t.btn_back_to_settings, Action::OpenSettings)
            }
            Action::SetDifficulty(d) => {
                self.timed(self.profiles.upsert_profile(&ProfileUpsert::update(user_id).difficulty(d)))
                    .await?;
                tracing::info!(
                    target: "gymbot::dialog",
                    user_id,
                    from = record.profile.difficulty.as_str(),
                    to = d.as_str(),
                    "Difficulty set manually"
                );
                let text = fill(
                    texts(lang).difficulty_changed,
                    &[("level", i18n::difficulty_name(d, lang))],
                );
                settings_confirmation(&text, lang)
            }
            Action::ClearHistory => {
                let t = texts(lang);
                Screen::new(DialogState::ConfirmClearHistory, t.clear_confirm)
                    .button(t.btn_clear_yes, Action::ConfirmClearHistory)
                    .button(t.btn_back_to_settings, Action::OpenSettings)
            }
            Action::ConfirmClearHistory => {
                self.timed(self.profiles.clear_history(user_id)).await?;
                settings_confirmation(texts(lang).history_cleared, lang)
            }
        };
        Ok(screen)
    }

    async fn start(&self, inbound: &Inbound) -> Result<Screen, DialogError> {
        let user_id = inbound.user_id.as_str();
        match self.timed(self.profiles.get_record(user_id)).await? {
            None => {
                tracing::info!(target: "gymbot::dialog", user_id, "New user");
                Ok(language_screen(DialogState::AwaitingLanguage, texts(Language::En).welcome_new))
            }
            Some(record) => {
                let renamed = !inbound.first_name.is_empty()
                    && (record.profile.first_name != inbound.first_name
                        || (inbound.username.is_some() && record.profile.username != inbound.username));
                if renamed {
                    let upsert = ProfileUpsert::update(user_id)
                        .first_name(inbound.first_name.clone())
                        .username(inbound.username.clone());
                    self.timed(self.profiles.upsert_profile(&upsert)).await?;
                }
                Ok(main_menu(&inbound.first_name, &record))
            }
        }
    }

    async fn fallback(&self, inbound: &Inbound) -> Result<Screen, DialogError> {
        match self.timed(self.profiles.get_profile(&inbound.user_id)).await? {
            None => Ok(language_screen(DialogState::AwaitingLanguage, texts(Language::En).welcome_new)),
            Some(profile) => Ok(main_menu_keyboard(
                Screen::new(DialogState::MainMenu, texts(profile.language).fallback),
                profile.language,
            )),
        }
    }

    async fn select_language(&self, inbound: &Inbound, lang: Language) -> Result<Screen, DialogError> {
        let upsert = ProfileUpsert::create(inbound.user_id.clone(), lang)
            .first_name(inbound.first_name.clone())
            .username(inbound.username.clone());
        let profile = self.timed(self.profiles.upsert_profile(&upsert)).await?;
        tracing::info!(
            target: "gymbot::dialog",
            user_id = %inbound.user_id,
            language = lang.as_str(),
            difficulty = profile.difficulty.as_str(),
            "Language selected"
        );
        let text = fill(
            texts(lang).language_set,
            &[("name", &escape_html(&inbound.first_name))],
        );
        Ok(main_menu_keyboard(Screen::new(DialogState::MainMenu, text), lang))
    }

    async fn record_feedback(
        &self,
        record: &UserRecord,
        kind: FeedbackKind,
        routine_id: RoutineId,
        environment: Environment,
        category: Category,
    ) -> Result<Screen, DialogError> {
        let user_id = record.profile.user_id.as_str();
        let lang = record.profile.language;
        let t = texts(lang);

        if !self.sessions.mark_logged(user_id, routine_id) {
            tracing::debug!(target: "gymbot::dialog", user_id, %routine_id, "Duplicate feedback ignored");
            return Ok(completion_screen(t.already_saved, lang));
        }

        let outcome = self
            .log_workout(record, kind, routine_id, environment, category)
            .await;
        match outcome {
            Ok(message) => Ok(completion_screen(message, lang)),
            Err(e) => {
                // Let the same button through again. The store records a routine id once.
                self.sessions.update(user_id, |s| {
                    if s.last_logged_routine == Some(routine_id) {
                        s.last_logged_routine = None;
                    }
                });
                Err(e)
            }
        }
    }

    async fn log_workout(
        &self,
        record: &UserRecord,
        kind: FeedbackKind,
        routine_id: RoutineId,
        environment: Environment,
        category: Category,
    ) -> Result<&'static str, DialogError> {
        let user_id = record.profile.user_id.as_str();
        let lang = record.profile.language;
        let t = texts(lang);

        // The list shown to the user is not kept; a fresh draw stands in for it.
        let exercises = self
            .draw(category, environment, record.profile.difficulty, lang)
            .await?
            .map(|r| r.exercise_names())
            .unwrap_or_default();
        let workout = WorkoutRecord::now(category, environment, record.profile.difficulty, exercises);
        let outcome = self
            .timed(self.profiles.complete_workout(user_id, routine_id, workout, kind))
            .await?;

        if outcome.duplicate {
            return Ok(t.already_saved);
        }
        if kind == FeedbackKind::Skip {
            return Ok(t.saved_without_feedback);
        }
        let message = match outcome.adjustment {
            Adjustment::Raised(next) | Adjustment::Lowered(next) => {
                tracing::info!(
                    target: "gymbot::dialog",
                    user_id,
                    from = outcome.previous.as_str(),
                    to = next.as_str(),
                    "Difficulty adjusted"
                );
                if matches!(outcome.adjustment, Adjustment::Raised(_)) {
                    t.difficulty_raised
                } else {
                    t.difficulty_lowered
                }
            }
            Adjustment::AtMaximum => t.difficulty_at_max,
            Adjustment::AtMinimum => t.difficulty_at_min,
            Adjustment::Unchanged if kind == FeedbackKind::Perfect => t.difficulty_kept,
            Adjustment::Unchanged => t.feedback_noted,
        };
        Ok(message)
    }

    /// One routine draw; `None` when the catalog has nothing matching.
    async fn draw(
        &self,
        category: Category,
        environment: Environment,
        difficulty: Difficulty,
        language: Language,
    ) -> Result<Option<RoutineInstance>, DialogError> {
        let generated = tokio::time::timeout(
            self.store_timeout,
            self.routines.generate(category, environment, difficulty, language),
        )
        .await;
        match generated {
            Ok(Ok(routine)) => Ok(Some(routine)),
            Ok(Err(RoutineError::Empty { .. })) => Ok(None),
            Ok(Err(RoutineError::Store(e))) => Err(e.into()),
            Err(_) => Err(StoreError::Timeout(self.timeout_ms()).into()),
        }
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        with_timeout(self.store_timeout, fut).await
    }

    fn timeout_ms(&self) -> u64 {
        self.store_timeout.as_millis() as u64
    }

    async fn recover(&self, inbound: &Inbound, err: DialogError) -> Screen {
        let user_id = inbound.user_id.as_str();
        match err {
            DialogError::ProfileMissing(_) => {
                tracing::info!(target: "gymbot::dialog", user_id, "Profile missing, asking for language");
                language_screen(DialogState::AwaitingLanguage, texts(Language::En).profile_missing)
            }
            DialogError::InvalidToken(e) => {
                tracing::warn!(target: "gymbot::dialog", user_id, error = %e, "Unknown action token");
                match self.fallback(inbound).await {
                    Ok(screen) => screen,
                    Err(e) => self.transient(user_id, &e.to_string()),
                }
            }
            DialogError::Transient(msg) => self.transient(user_id, &msg),
        }
    }

    fn transient(&self, user_id: &str, msg: &str) -> Screen {
        tracing::error!(target: "gymbot::dialog", user_id, error = msg, "Store failure");
        let state = self
            .sessions
            .get(user_id)
            .state
            .unwrap_or(DialogState::AwaitingLanguage);
        Screen::new(state, texts(Language::En).try_again)
            .button(texts(Language::En).btn_main_menu, Action::BackToMain)
    }
}

fn is_start(cmd: &str) -> bool {
    let cmd = cmd.trim();
    let name = cmd.split_whitespace().next().unwrap_or(cmd);
    name == "/start" || name.starts_with("/start@")
}

fn language_screen(state: DialogState, text: &str) -> Screen {
    Screen::new(state, text).row(
        Language::ALL
            .into_iter()
            .map(|l| Choice::new(i18n::language_label(l), Action::SelectLanguage(l)))
            .collect(),
    )
}

fn main_menu_keyboard(screen: Screen, lang: Language) -> Screen {
    let t = texts(lang);
    screen
        .button(t.btn_start_workout, Action::StartWorkout)
        .button(t.btn_history, Action::ShowHistory)
        .button(t.btn_settings, Action::OpenSettings)
}

fn main_menu(first_name: &str, record: &UserRecord) -> Screen {
    let lang = record.profile.language;
    let t = texts(lang);
    let name = if first_name.is_empty() {
        &record.profile.first_name
    } else {
        first_name
    };
    let mut text = fill(t.greeting, &[("name", &escape_html(name))]);
    if let Some(last) = record.last_workout() {
        let date = last.completed_at.format("%Y-%m-%d").to_string();
        text.push_str("\n\n");
        text.push_str(&fill(
            t.last_workout,
            &[
                ("workout", i18n::category_name(last.category, lang)),
                ("date", &date),
            ],
        ));
    }
    main_menu_keyboard(Screen::new(DialogState::MainMenu, text), lang)
}

fn environment_screen(lang: Language) -> Screen {
    let t = texts(lang);
    Screen::new(DialogState::AwaitingEnvironment, t.choose_environment)
        .row(
            Environment::ALL
                .into_iter()
                .map(|e| Choice::new(i18n::environment_label(e, lang), Action::SelectEnvironment(e)))
                .collect(),
        )
        .button(t.btn_main_menu, Action::BackToMain)
}

fn category_screen(environment: Environment, lang: Language, notice: Option<&str>) -> Screen {
    let t = texts(lang);
    let mut text = String::new();
    if let Some(notice) = notice {
        text.push_str(notice);
        text.push_str("\n\n");
    }
    text.push_str(&format!(
        "🎯 {}\n\n{}",
        i18n::environment_label(environment, lang),
        t.choose_category
    ));

    let choice = |category: Category| {
        Choice::new(
            i18n::category_label(category, lang),
            Action::SelectCategory {
                environment,
                category,
            },
        )
    };
    let mut screen = Screen::new(DialogState::AwaitingCategory, text).row(vec![choice(Category::FullBody)]);
    for pair in Category::ALL[1..].chunks(2) {
        screen = screen.row(pair.iter().map(|&c| choice(c)).collect());
    }
    screen
        .button(t.btn_back, Action::StartWorkout)
        .button(t.btn_main_menu, Action::BackToMain)
}

fn confirmation_screen(
    environment: Environment,
    category: Category,
    difficulty: Difficulty,
    lang: Language,
) -> Screen {
    let t = texts(lang);
    let text = format!(
        "{}\n\n📍 {}\n🎯 {}\n⚡ {}\n\n{}",
        t.confirm_title,
        i18n::environment_label(environment, lang),
        i18n::category_label(category, lang),
        i18n::difficulty_label(difficulty, lang),
        t.confirm_question
    );
    Screen::new(DialogState::AwaitingConfirmation, text)
        .button(
            t.btn_confirm,
            Action::ConfirmRoutine {
                environment,
                category,
            },
        )
        .button(t.btn_change_category, Action::SelectEnvironment(environment))
        .button(t.btn_main_menu, Action::BackToMain)
}

/// HTML body of a routine.
pub(crate) fn render_routine(routine: &RoutineInstance) -> String {
    let lang = routine.language;
    let t = texts(lang);
    let mut text = fill(
        t.routine_title,
        &[("category", i18n::category_name(routine.category, lang))],
    );
    text.push_str(&format!(
        "\n📍 {}\n⚡ {}\n\n{}\n",
        i18n::environment_label(routine.environment, lang),
        i18n::difficulty_label(routine.difficulty, lang),
        t.exercises_header
    ));
    for entry in &routine.entries {
        text.push_str(&format!(
            "\n{}. <b>{}</b>\n   {}\n",
            entry.position,
            escape_html(&entry.name),
            escape_html(&entry.sets)
        ));
        if !entry.alternatives.is_empty() {
            text.push_str(&format!(
                "   <i>{}: {}</i>\n",
                t.alternatives,
                escape_html(&entry.alternatives.join(", "))
            ));
        }
        if let Some(tip) = &entry.tip {
            text.push_str(&format!("   💡 {}\n", escape_html(tip)));
        }
        if let Some(url) = &entry.video_url {
            text.push_str(&format!("   🎥 <a href=\"{}\">Video</a>\n", escape_html(url)));
        }
    }
    text.push('\n');
    text.push_str(t.motivation);
    text
}

fn routine_screen(routine: &RoutineInstance) -> Screen {
    let lang = routine.language;
    let t = texts(lang);
    let (environment, category) = (routine.environment, routine.category);
    Screen::new(DialogState::RoutineDisplayed, render_routine(routine))
        .button(
            t.btn_finish,
            Action::FinishWorkout {
                routine_id: routine.id,
                environment,
                category,
            },
        )
        .button(
            t.btn_new_routine,
            Action::NewRoutine {
                environment,
                category,
            },
        )
        .button(t.btn_main_menu, Action::BackToMain)
}

fn feedback_screen(
    routine_id: RoutineId,
    environment: Environment,
    category: Category,
    lang: Language,
) -> Screen {
    let t = texts(lang);
    let choice = |kind: FeedbackKind| {
        Choice::new(
            i18n::feedback_label(kind, lang),
            Action::Feedback {
                kind,
                routine_id,
                environment,
                category,
            },
        )
    };
    Screen::new(DialogState::AwaitingFeedback, t.workout_completed)
        .row(vec![choice(FeedbackKind::TooEasy), choice(FeedbackKind::Perfect)])
        .row(vec![choice(FeedbackKind::TooHard)])
        .row(vec![choice(FeedbackKind::Skip)])
        .button(t.btn_main_menu, Action::BackToMain)
}

fn completion_screen(message: &str, lang: Language) -> Screen {
    let t = texts(lang);
    Screen::new(DialogState::MainMenu, format!("{message}\n\n{}", t.whats_next))
        .button(t.btn_new_workout, Action::StartWorkout)
        .button(t.btn_history, Action::ShowHistory)
        .button(t.btn_main_menu, Action::BackToMain)
}

fn history_screen(record: &UserRecord) -> Screen {
    let lang = record.profile.language;
    let t = texts(lang);
    let stats = UserStats::from_history(&record.history, chrono::Utc::now().date_naive());
    let recommended = recommended_category(&record.history, &mut rand::thread_rng());

    let n = stats.total_workouts.to_string();
    let streak = stats.current_streak.to_string();
    let mut lines = vec![
        t.history_title.to_string(),
        String::new(),
        t.stats_header.to_string(),
        fill(t.total_workouts, &[("n", &n)]),
        fill(t.current_streak, &[("n", &streak)]),
    ];
    if let Some(favorite) = stats.favorite_category {
        lines.push(fill(
            t.favorite_category,
            &[("category", i18n::category_name(favorite, lang))],
        ));
    }
    lines.push(fill(
        t.current_difficulty,
        &[("level", i18n::difficulty_name(record.profile.difficulty, lang))],
    ));
    lines.push(String::new());

    if record.history.is_empty() {
        lines.push(t.no_workouts.to_string());
    } else {
        lines.push(t.recent_header.to_string());
        for (i, w) in record.history.iter().rev().take(HISTORY_PREVIEW).enumerate() {
            lines.push(format!(
                "{}. {} ({}) - {}",
                i + 1,
                i18n::category_name(w.category, lang),
                i18n::environment_label(w.environment, lang),
                w.completed_at.format("%Y-%m-%d")
            ));
        }
    }
    lines.push(String::new());
    lines.push(fill(
        t.recommended,
        &[("category", i18n::category_name(recommended, lang))],
    ));

    Screen::new(DialogState::History, lines.join("\n"))
        .button(t.btn_new_workout, Action::StartWorkout)
        .button(t.btn_main_menu, Action::BackToMain)
}

fn settings_screen(record: &UserRecord) -> Screen {
    let p = &record.profile;
    let lang = p.language;
    let t = texts(lang);
    let since = p.created_at.format("%Y-%m-%d").to_string();
    let text = [
        t.settings_title.to_string(),
        fill(t.settings_language, &[("language", i18n::language_label(lang))]),
        fill(
            t.settings_difficulty,
            &[("level", i18n::difficulty_name(p.difficulty, lang))],
        ),
        fill(t.member_since, &[("date", &since)]),
        String::new(),
        t.settings_question.to_string(),
    ]
    .join("\n");
    Screen::new(DialogState::Settings, text)
        .button(t.btn_change_language, Action::ChangeLanguage)
        .button(t.btn_change_difficulty, Action::ChangeDifficulty)
        .button(t.btn_clear_history, Action::ClearHistory)
        .button(t.btn_main_menu, Action::BackToMain)
}

fn settings_confirmation(text: &str, lang: Language) -> Screen {
    let t = texts(lang);
    Screen::new(DialogState::Settings, text)
        .button(t.btn_back_to_settings, Action::OpenSettings)
        .button(t.btn_main_menu, Action::BackToMain)
}
