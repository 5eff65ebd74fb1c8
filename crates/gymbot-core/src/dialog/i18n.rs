//! Interface strings in English and Spanish.

use crate::shared::{Category, Difficulty, Environment, FeedbackKind, Language};

pub struct Texts {
    pub welcome_new: &'static str,
    pub profile_missing: &'static str,
    pub fallback: &'static str,
    pub try_again: &'static str,
    pub greeting: &'static str,
    pub last_workout: &'static str,
    pub language_set: &'static str,
    pub btn_start_workout: &'static str,
    pub btn_history: &'static str,
    pub btn_settings: &'static str,
    pub btn_main_menu: &'static str,
    pub btn_back: &'static str,
    pub btn_back_to_settings: &'static str,
    pub choose_environment: &'static str,
    pub choose_category: &'static str,
    pub confirm_title: &'static str,
    pub confirm_question: &'static str,
    pub btn_confirm: &'static str,
    pub btn_change_category: &'static str,
    pub no_exercises: &'static str,
    pub routine_title: &'static str,
    pub exercises_header: &'static str,
    pub alternatives: &'static str,
    pub motivation: &'static str,
    pub btn_finish: &'static str,
    pub btn_new_routine: &'static str,
    pub workout_completed: &'static str,
    pub difficulty_raised: &'static str,
    pub difficulty_at_max: &'static str,
    pub difficulty_lowered: &'static str,
    pub difficulty_at_min: &'static str,
    pub difficulty_kept: &'static str,
    pub feedback_noted: &'static str,
    pub saved_without_feedback: &'static str,
    pub already_saved: &'static str,
    pub whats_next: &'static str,
    pub btn_new_workout: &'static str,
    pub history_title: &'static str,
    pub stats_header: &'static str,
    pub total_workouts: &'static str,
    pub current_streak: &'static str,
    pub favorite_category: &'static str,
    pub current_difficulty: &'static str,
    pub recommended: &'static str,
    pub recent_header: &'static str,
    pub no_workouts: &'static str,
    pub settings_title: &'static str,
    pub settings_language: &'static str,
    pub settings_difficulty: &'static str,
    pub member_since: &'static str,
    pub settings_question: &'static str,
    pub btn_change_language: &'static str,
    pub btn_change_difficulty: &'static str,
    pub btn_clear_history: &'static str,
    pub choose_new_language: &'static str,
    pub choose_new_difficulty: &'static str,
    pub difficulty_changed: &'static str,
    pub clear_confirm: &'static str,
    pub btn_clear_yes: &'static str,
    pub history_cleared: &'static str,
}

const EN: Texts = Texts {
    welcome_new: "👋 Welcome to GymBot! / ¡Bienvenido a GymBot!\n\nI'm your personal workout assistant. Choose your language:\nSoy tu asistente de entrenamiento. Elige tu idioma:",
    profile_missing: "⚠️ I couldn't find your profile. Please choose your language to restart.\n⚠️ No encontré tu perfil. Elige tu idioma para empezar de nuevo.",
    fallback: "I didn't understand that. Use the menu below:",
    try_again: "❌ Something went wrong. Please try again.\n❌ Algo salió mal. Intentá de nuevo.",
    greeting: "Hello {name}! 🏋️‍♂️\n\n🎯 What would you like to do today?",
    last_workout: "Last time you did: <b>{workout}</b> ({date})",
    language_set: "Perfect {name}! 🎉\n\nWelcome to GymBot! I'm your personal gym assistant.\n\nWhat would you like to do today?",
    btn_start_workout: "💪 Start Workout",
    btn_history: "📊 View My History",
    btn_settings: "⚙️ Settings",
    btn_main_menu: "🏠 Main Menu",
    btn_back: "🔙 Back",
    btn_back_to_settings: "🔙 Back to Settings",
    choose_environment: "🏋️‍♂️ Where are you training today?",
    choose_category: "What type of workout do you prefer?",
    confirm_title: "🎯 <b>Confirm Workout</b>",
    confirm_question: "Do you want to start this workout?",
    btn_confirm: "✅ Yes, start",
    btn_change_category: "🔄 Change Category",
    no_exercises: "❌ No exercises found for this category. Try another option.",
    routine_title: "🎯 <b>Your {category} Routine</b>",
    exercises_header: "<b>Exercises:</b>",
    alternatives: "Alternatives",
    motivation: "💪 <i>You got this! Every rep brings you closer to your goal.</i>",
    btn_finish: "✅ Finish Workout",
    btn_new_routine: "🔄 New Routine",
    workout_completed: "🎉 <b>Workout Completed!</b>\n\n💪 Congratulations! You've finished your routine.\n\nHow did it go? Your feedback helps me improve your next routines.",
    difficulty_raised: "📈 Great! I increased your difficulty to {level}. Keep growing!",
    difficulty_at_max: "🏆 You're already at the maximum level! You're a machine!",
    difficulty_lowered: "📉 Got it, I lowered the difficulty to {level}. Let's go step by step!",
    difficulty_at_min: "🟢 You're already at the minimum level! We start from the basics!",
    difficulty_kept: "🎯 Excellent! We'll keep this level. Keep it up!",
    feedback_noted: "📝 Noted! I'll adjust your level if this keeps happening.",
    saved_without_feedback: "✅ Workout saved! No feedback this time.",
    already_saved: "✅ This workout is already saved.",
    whats_next: "✨ Thanks! What would you like to do now?",
    btn_new_workout: "💪 New Workout",
    history_title: "📊 <b>Your Workout History</b>",
    stats_header: "📈 <b>Statistics:</b>",
    total_workouts: "• Total workouts: {n}",
    current_streak: "• Current streak: {n} days",
    favorite_category: "• Favorite category: {category}",
    current_difficulty: "• Current difficulty: {level}",
    recommended: "💡 Suggested next: {category}",
    recent_header: "🕒 <b>Recent Workouts:</b>",
    no_workouts: "💭 No workouts recorded yet.\nStart your first routine!",
    settings_title: "⚙️ <b>Settings</b>\n\n📋 <b>Your current profile:</b>",
    settings_language: "• Language: {language}",
    settings_difficulty: "• Difficulty: {level}",
    member_since: "• Member since: {date}",
    settings_question: "What would you like to change?",
    btn_change_language: "🌍 Change Language",
    btn_change_difficulty: "⚡ Change Difficulty",
    btn_clear_history: "🗑️ Clear History",
    choose_new_language: "🌍 Choose your new language:",
    choose_new_difficulty: "⚡ Choose your new difficulty level:",
    difficulty_changed: "✅ Difficulty changed to {level}!",
    clear_confirm: "⚠️ Are you sure you want to delete your whole workout history?\n\nThis action cannot be undone.",
    btn_clear_yes: "✅ Yes, clear all",
    history_cleared: "✅ History cleared successfully!",
};

const ES: Texts = Texts {
    welcome_new: EN.welcome_new,
    profile_missing: EN.profile_missing,
    fallback: "No entendí eso. Usá el menú de abajo:",
    try_again: EN.try_again,
    greeting: "¡Hola {name}! 🏋️‍♂️\n\n🎯 ¿Qué quieres hacer hoy?",
    last_workout: "La última vez hiciste: <b>{workout}</b> ({date})",
    language_set: "¡Perfecto {name}! 🎉\n\n¡Bienvenido a GymBot! Soy tu asistente personal de gimnasio.\n\n¿Qué quieres hacer hoy?",
    btn_start_workout: "💪 Empezar Entrenamiento",
    btn_history: "📊 Ver Mi Historial",
    btn_settings: "⚙️ Configuración",
    btn_main_menu: "🏠 Menú Principal",
    btn_back: "🔙 Volver",
    btn_back_to_settings: "🔙 Volver a Configuración",
    choose_environment: "🏋️‍♂️ ¿Dónde vas a entrenar hoy?",
    choose_category: "¿Qué tipo de entrenamiento prefieres?",
    confirm_title: "🎯 <b>Confirmar Entrenamiento</b>",
    confirm_question: "¿Quieres empezar este entrenamiento?",
    btn_confirm: "✅ Sí, empezar",
    btn_change_category: "🔄 Cambiar Categoría",
    no_exercises: "❌ No se encontraron ejercicios para esta categoría. Intenta otra opción.",
    routine_title: "🎯 <b>Tu Rutina de {category}</b>",
    exercises_header: "<b>Ejercicios:</b>",
    alternatives: "Alternativas",
    motivation: "💪 <i>¡Dale que puedes! Cada repetición te acerca a tu objetivo.</i>",
    btn_finish: "✅ Terminar Entrenamiento",
    btn_new_routine: "🔄 Nueva Rutina",
    workout_completed: "🎉 <b>¡Entrenamiento Completado!</b>\n\n💪 ¡Felicitaciones! Has terminado tu rutina.\n\n¿Cómo te fue? Tu feedback me ayuda a mejorar tus próximas rutinas.",
    difficulty_raised: "📈 ¡Genial! Subí tu dificultad a {level}. ¡Sigues creciendo!",
    difficulty_at_max: "🏆 ¡Ya estás en el nivel máximo! ¡Eres una máquina!",
    difficulty_lowered: "📉 Entendido, bajé la dificultad a {level}. ¡Vamos paso a paso!",
    difficulty_at_min: "🟢 ¡Ya estás en el nivel mínimo! ¡Empezamos desde lo básico!",
    difficulty_kept: "🎯 ¡Excelente! Mantenemos este nivel. ¡Sigue así!",
    feedback_noted: "📝 ¡Anotado! Ajustaré tu nivel si esto se repite.",
    saved_without_feedback: "✅ ¡Entrenamiento guardado! Sin feedback esta vez.",
    already_saved: "✅ Este entrenamiento ya está guardado.",
    whats_next: "✨ ¡Gracias! ¿Qué quieres hacer ahora?",
    btn_new_workout: "💪 Nuevo Entrenamiento",
    history_title: "📊 <b>Tu Historial de Entrenamientos</b>",
    stats_header: "📈 <b>Estadísticas:</b>",
    total_workouts: "• Total entrenamientos: {n}",
    current_streak: "• Racha actual: {n} días",
    favorite_category: "• Categoría favorita: {category}",
    current_difficulty: "• Dificultad actual: {level}",
    recommended: "💡 Sugerencia para la próxima: {category}",
    recent_header: "🕒 <b>Entrenamientos Recientes:</b>",
    no_workouts: "💭 Aún no tienes entrenamientos registrados.\n¡Comienza tu primera rutina!",
    settings_title: "⚙️ <b>Configuración</b>\n\n📋 <b>Tu perfil actual:</b>",
    settings_language: "• Idioma: {language}",
    settings_difficulty: "• Dificultad: {level}",
    member_since: "• Miembro desde: {date}",
    settings_question: "¿Qué querés cambiar?",
    btn_change_language: "🌍 Cambiar Idioma",
    btn_change_difficulty: "⚡ Cambiar Dificultad",
    btn_clear_history: "🗑️ Borrar Historial",
    choose_new_language: "🌍 Elige tu nuevo idioma:",
    choose_new_difficulty: "⚡ Elige tu nuevo nivel de dificultad:",
    difficulty_changed: "✅ ¡Dificultad cambiada a {level}!",
    clear_confirm: "⚠️ ¿Estás seguro de que quieres borrar todo tu historial de entrenamientos?\n\nEsta acción no se puede deshacer.",
    btn_clear_yes: "✅ Sí, borrar todo",
    history_cleared: "✅ ¡Historial borrado exitosamente!",
};

pub fn texts(lang: Language) -> &'static Texts {
    match lang {
        Language::En => &EN,
        Language::Es => &ES,
    }
}

/// Fill `{key}` placeholders. Unknown keys are left as written.
pub fn fill(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in params {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Minimal escaping for text interpolated into HTML-formatted messages.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn language_label(lang: Language) -> &'static str {
    match lang {
        Language::En => "🇺🇸 English",
        Language::Es => "🇪🇸 Español",
    }
}

pub fn language_changed(lang: Language) -> &'static str {
    match lang {
        Language::En => "✅ Language changed to English!",
        Language::Es => "✅ ¡Idioma cambiado a Español!",
    }
}

pub fn environment_label(env: Environment, lang: Language) -> &'static str {
    match (env, lang) {
        (Environment::Gym, Language::En) => "🏋️ Gym",
        (Environment::Gym, Language::Es) => "🏋️ Gimnasio",
        (Environment::Home, Language::En) => "🏠 Home",
        (Environment::Home, Language::Es) => "🏠 Casa",
    }
}

/// Category name without emoji, for sentences.
pub fn category_name(category: Category, lang: Language) -> &'static str {
    match (category, lang) {
        (Category::FullBody, Language::En) => "Full Body",
        (Category::FullBody, Language::Es) => "Cuerpo Completo",
        (Category::ChestBiceps, Language::En) => "Chest & Biceps",
        (Category::ChestBiceps, Language::Es) => "Pecho y Bíceps",
        (Category::BackTriceps, Language::En) => "Back & Triceps",
        (Category::BackTriceps, Language::Es) => "Espalda y Tríceps",
        (Category::LegsShoulders, Language::En) => "Legs & Shoulders",
        (Category::LegsShoulders, Language::Es) => "Piernas y Hombros",
        (Category::Core, _) => "Core",
        (Category::Cardio, _) => "Cardio",
        (Category::Yoga, _) => "Yoga",
    }
}

pub fn category_label(category: Category, lang: Language) -> String {
    let icon = match category {
        Category::FullBody => "💪",
        Category::ChestBiceps => "🫸",
        Category::BackTriceps => "🫷",
        Category::LegsShoulders => "🦵",
        Category::Core => "🅰️",
        Category::Cardio => "🫀",
        Category::Yoga => "🧘",
    };
    format!("{icon} {}", category_name(category, lang))
}

pub fn difficulty_name(difficulty: Difficulty, lang: Language) -> &'static str {
    match (difficulty, lang) {
        (Difficulty::Beginner, Language::En) => "Beginner",
        (Difficulty::Beginner, Language::Es) => "Principiante",
        (Difficulty::Intermediate, Language::En) => "Intermediate",
        (Difficulty::Intermediate, Language::Es) => "Intermedio",
        (Difficulty::Advanced, Language::En) => "Advanced",
        (Difficulty::Advanced, Language::Es) => "Avanzado",
    }
}

pub fn difficulty_label(difficulty: Difficulty, lang: Language) -> String {
    let icon = match difficulty {
        Difficulty::Beginner => "🟢",
        Difficulty::Intermediate => "🟡",
        Difficulty::Advanced => "🔴",
    };
    format!("{icon} {}", difficulty_name(difficulty, lang))
}

pub fn feedback_label(kind: FeedbackKind, lang: Language) -> &'static str {
    match (kind, lang) {
        (FeedbackKind::TooEasy, Language::En) => "😊 Too Easy",
        (FeedbackKind::TooEasy, Language::Es) => "😊 Muy Fácil",
        (FeedbackKind::Perfect, Language::En) => "👍 Perfect",
        (FeedbackKind::Perfect, Language::Es) => "👍 Perfecto",
        (FeedbackKind::TooHard, Language::En) => "😰 Too Hard",
        (FeedbackKind::TooHard, Language::Es) => "😰 Muy Difícil",
        (FeedbackKind::Skip, Language::En) => "⏭️ Skip Feedback",
        (FeedbackKind::Skip, Language::Es) => "⏭️ Omitir Feedback",
    }
}
