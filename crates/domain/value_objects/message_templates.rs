use chrono::{DateTime, Utc};

pub const BRAND_NAME: &str = "SkillBoost Kenya";

pub struct TrackLine<'a> {
    pub icon: &'a str,
    pub name: &'a str,
    pub total_lessons: i32,
}

pub struct ProgressLine<'a> {
    pub track_name: &'a str,
    pub percent: i32,
}

pub struct LessonMessage<'a> {
    pub track_name: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub reading_minutes: i32,
    pub quiz_question: Option<&'a str>,
    pub progress_percent: i32,
}

pub fn help_menu() -> String {
    format!(
        "🤖 *{BRAND_NAME} Help*\n\n\
         • HELP - show this menu\n\
         • PAUSE - pause your daily lessons\n\
         • RESUME - resume your daily lessons\n\
         • PROGRESS - see your learning stats\n\
         • NEXT - preview your next lesson\n\
         • TRACKS - list available courses\n\
         • PAID - confirm an M-Pesa payment\n\n\
         Need a human? Reply with your question and our team will get back to you."
    )
}

pub fn onboarding(signup_url: &str) -> String {
    format!(
        "Welcome to {BRAND_NAME}! 🎉\n\n\
         To get started with your daily 5-minute lessons, visit: {signup_url}\n\n\
         Reply \"START\" when you're ready to begin your learning journey!"
    )
}

pub fn paused() -> String {
    "⏸️ Lessons paused successfully!\n\n\
     Your learning is now on hold. Reply \"RESUME\" anytime to continue your progress."
        .to_string()
}

pub fn resumed(name: &str, preferred_time: &str) -> String {
    format!(
        "▶️ Welcome back, {name}!\n\n\
         Your lessons are now resumed. You'll receive your next lesson at {preferred_time}.\n\n\
         Let's continue building your skills! 💪"
    )
}

pub fn subscription_not_active(name: &str, signup_url: &str) -> String {
    format!(
        "⏳ Hi {name}, your subscription isn't active yet.\n\n         Complete your M-Pesa payment to start your daily lessons, or pick a plan at: {signup_url}\n\n         Already paid? Reply \"PAID\" and we'll verify it right away."
    )
}

pub fn progress_summary(name: &str, lines: &[ProgressLine<'_>]) -> String {
    let body = if lines.is_empty() {
        "No active tracks".to_string()
    } else {
        lines
            .iter()
            .map(|line| format!("📚 {}: {}%", line.track_name, line.percent))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "📊 *Your Learning Progress*\n\n{body}\n\n\
         🎯 Keep going, {name}! Every lesson brings you closer to your goals.\n\n\
         Reply \"TRACKS\" to explore more courses!"
    )
}

pub fn next_lesson_preview(upcoming: &[(&str, &str, i32)]) -> String {
    if upcoming.is_empty() {
        return "🏁 You've completed every lesson in your active tracks!\n\n\
                Reply \"TRACKS\" to pick a new course."
            .to_string();
    }

    let body = upcoming
        .iter()
        .map(|(track, title, minutes)| format!("📘 {track}: *{title}* (~{minutes} min)"))
        .collect::<Vec<_>>()
        .join("\n");

    format!("👀 *Coming up next*\n\n{body}\n\nIt will arrive at your usual lesson time.")
}

pub fn track_catalog(tracks: &[TrackLine<'_>], signup_url: &str) -> String {
    let body = if tracks.is_empty() {
        "No tracks available".to_string()
    } else {
        tracks
            .iter()
            .map(|t| format!("{} {} - {} lessons", t.icon, t.name, t.total_lessons))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "📚 *Available Learning Tracks*\n\n{body}\n\n\
         To enroll in additional tracks, visit: {signup_url}\n\n\
         Reply \"PROGRESS\" to see your current progress!"
    )
}

pub fn payment_verification(support_phone: &str) -> String {
    format!(
        "💰 *Payment Verification*\n\n\
         We're checking your payment now. This usually takes 1-2 minutes.\n\n\
         Once verified, your subscription will be activated automatically!\n\n\
         If you continue to have issues, please contact support: {support_phone}"
    )
}

pub fn fallback() -> String {
    "Thanks for your response! 👍\n\n\
     For help with commands, reply \"HELP\"\n\
     To see your progress, reply \"PROGRESS\"\n\
     To view available courses, reply \"TRACKS\""
        .to_string()
}

pub fn welcome(name: &str, plan_name: &str) -> String {
    format!(
        "🎉 Welcome to {BRAND_NAME}, {name}!\n\n\
         Your {plan_name} is now active and ready to go!\n\n\
         📚 Your first lesson arrives at your preferred time\n\
         📈 Track your progress and earn certificates as you complete tracks\n\n\
         Reply \"HELP\" for the list of commands.\n\n\
         _From the {BRAND_NAME} Team_"
    )
}

pub fn daily_lesson(lesson: &LessonMessage<'_>) -> String {
    let quiz = lesson
        .quiz_question
        .unwrap_or("What's one key takeaway from today's lesson?");

    format!(
        "📚 *Daily Lesson - {track}*\n\n\
         *{title}*\n\n\
         {content}\n\n\
         📊 *Your Progress:* {progress}% complete\n\
         ⏱️ *Time:* ~{minutes} minutes\n\n\
         *Quick Quiz:* {quiz}\n\n\
         ---\n\
         Reply \"NEXT\" for tomorrow's preview\n\
         Reply \"HELP\" for more options",
        track = lesson.track_name,
        title = lesson.title,
        content = lesson.content,
        progress = lesson.progress_percent,
        minutes = lesson.reading_minutes,
    )
}

pub fn payment_confirmation(
    name: &str,
    amount: i64,
    receipt: &str,
    plan_name: &str,
    expires_at: DateTime<Utc>,
) -> String {
    format!(
        "✅ *Payment Confirmed!*\n\n\
         Hi {name}! Your payment of KES {amount} has been received.\n\n\
         📱 *Transaction ID:* {receipt}\n\
         📅 *Subscription:* {plan_name}\n\
         ⏰ *Valid until:* {valid_until}\n\n\
         Your daily lessons will continue as scheduled. Welcome to {BRAND_NAME}! 🎉\n\n\
         Questions? Reply \"HELP\" for support.",
        valid_until = expires_at.format("%d %b %Y"),
    )
}

pub fn payment_reminder(
    name: &str,
    plan_name: &str,
    amount: i32,
    expires_at: DateTime<Utc>,
) -> String {
    format!(
        "💰 *Payment Reminder*\n\n\
         Hi {name}!\n\n\
         Your {plan_name} subscription expires on {expiry}. To keep receiving daily lessons, \
         please renew:\n\n\
         💵 Amount: KES {amount}\n\n\
         Once paid, reply \"PAID\" and we'll verify it right away.\n\n\
         Keep learning! 📚",
        expiry = expires_at.format("%d %b %Y"),
    )
}
