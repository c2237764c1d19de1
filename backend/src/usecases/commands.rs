use std::sync::Arc;

use chrono::Utc;
use crates::{
    domain::{
        entities::users::UserEntity,
        repositories::{
            learning::LearningRepository, messaging::OutboundChannel,
            outbound_messages::OutboundMessageRepository, users::UserRepository,
        },
        value_objects::{
            commands::Intent,
            enums::{
                message_types::MessageType, subscription_plans::SubscriptionPlan,
                subscription_statuses::SubscriptionStatus,
            },
            learning::lesson_progress_percent,
            message_templates::{self, ProgressLine, TrackLine},
            whatsapp_webhook::{InboundMessage, WhatsAppWebhookEnvelope},
        },
    },
    infra::messaging::delivery::{Delivery, deliver_and_log_as},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

impl CommandError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            CommandError::Ledger(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No text body (media, reactions); nothing was done.
    Unroutable,
    /// Sender is not a subscriber; an onboarding pointer was sent.
    Onboarded,
    Handled(Intent),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookSummary {
    pub received: usize,
    pub handled: usize,
    pub onboarded: usize,
    pub unroutable: usize,
    pub failed: usize,
}

/// Static values interpolated into replies.
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub signup_url: String,
    pub support_phone: String,
}

pub struct CommandRouterUseCase<U, L, O, C>
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    learning_repo: Arc<L>,
    message_log: Arc<O>,
    channel: Arc<C>,
    settings: ReplySettings,
}

impl<U, L, O, C> CommandRouterUseCase<U, L, O, C>
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        learning_repo: Arc<L>,
        message_log: Arc<O>,
        channel: Arc<C>,
        settings: ReplySettings,
    ) -> Self {
        Self {
            user_repo,
            learning_repo,
            message_log,
            channel,
            settings,
        }
    }

    /// Routes every message in a webhook delivery. One failing message never stops the rest.
    pub async fn handle_webhook(&self, envelope: WhatsAppWebhookEnvelope) -> WebhookSummary {
        let messages = envelope.inbound_messages();
        let mut summary = WebhookSummary {
            received: messages.len(),
            ..Default::default()
        };

        for message in messages {
            let from = message.from.clone();
            match self.handle_inbound(message).await {
                Ok(RouteOutcome::Handled(_)) => summary.handled += 1,
                Ok(RouteOutcome::Onboarded) => summary.onboarded += 1,
                Ok(RouteOutcome::Unroutable) => summary.unroutable += 1,
                Err(err) => {
                    error!(%from, error = ?err, "commands: failed to handle inbound message");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    pub async fn handle_inbound(&self, message: InboundMessage) -> UseCaseResult<RouteOutcome> {
        let Some(text) = message.text.as_deref() else {
            info!(from = %message.from, "commands: message without text body ignored");
            return Ok(RouteOutcome::Unroutable);
        };

        let Some(user) = self
            .user_repo
            .find_by_whatsapp_number(&message.from)
            .await
            .map_err(|err| {
                error!(from = %message.from, db_error = ?err, "commands: failed to look up sender");
                CommandError::Ledger(err)
            })?
        else {
            info!(from = %message.from, "commands: unknown sender, sending onboarding");
            let body = message_templates::onboarding(&self.settings.signup_url);
            if let Err(err) = self.channel.send_text(&message.from, &body).await {
                warn!(from = %message.from, error = ?err, "commands: onboarding send failed");
            }
            return Ok(RouteOutcome::Onboarded);
        };

        let intent = Intent::parse(text);
        info!(user_id = %user.id, intent = %intent, "commands: intent resolved");

        let reply = match intent {
            Intent::Help => message_templates::help_menu(),
            Intent::Pause => self.pause(&user).await?,
            Intent::Resume => self.resume(&user).await?,
            Intent::Progress => self.progress(&user).await?,
            Intent::Preview => self.preview(&user).await?,
            Intent::Catalog => self.catalog().await?,
            Intent::PaymentCheck => {
                message_templates::payment_verification(&self.settings.support_phone)
            }
            Intent::Fallback => message_templates::fallback(),
        };

        let audit = format!("User: {} | Bot: {}", text.trim(), intent);
        deliver_and_log_as(
            self.channel.as_ref(),
            self.message_log.as_ref(),
            Delivery {
                user_id: user.id,
                to: &user.whatsapp_number,
                message_type: MessageType::Response,
                body: &reply,
            },
            &audit,
        )
        .await;

        Ok(RouteOutcome::Handled(intent))
    }

    async fn pause(&self, user: &UserEntity) -> UseCaseResult<String> {
        self.user_repo
            .update_status(user.id, SubscriptionStatus::Inactive)
            .await?;
        info!(user_id = %user.id, "commands: lessons paused");
        Ok(message_templates::paused())
    }

    async fn resume(&self, user: &UserEntity) -> UseCaseResult<String> {
        let now = Utc::now();

        // A lapsed subscription is not reactivated; the subscriber is asked to renew instead.
        if user.status_at(now) == SubscriptionStatus::Expired {
            self.user_repo
                .update_status(user.id, SubscriptionStatus::Expired)
                .await?;
            let plan = user.plan().unwrap_or(SubscriptionPlan::Weekly);
            info!(user_id = %user.id, "commands: resume refused, subscription expired");
            return Ok(message_templates::payment_reminder(
                &user.name,
                plan.display_name(),
                plan.price_kes(),
                user.subscription_expires_at.unwrap_or(now),
            ));
        }

        // No paid window yet: the checkout never completed.
        if user.subscription_expires_at.is_none() {
            info!(user_id = %user.id, "commands: resume refused, no paid subscription");
            return Ok(message_templates::subscription_not_active(
                &user.name,
                &self.settings.signup_url,
            ));
        }

        self.user_repo
            .update_status(user.id, SubscriptionStatus::Active)
            .await?;
        info!(user_id = %user.id, "commands: lessons resumed");
        Ok(message_templates::resumed(
            &user.name,
            user.preferred_time().as_str(),
        ))
    }

    async fn progress(&self, user: &UserEntity) -> UseCaseResult<String> {
        let enrollments = self.learning_repo.list_active_enrollments(user.id).await?;

        let mut percents = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let completed = self
                .learning_repo
                .count_completed_in_track(user.id, enrollment.track.id)
                .await?;
            percents.push(lesson_progress_percent(
                completed,
                enrollment.track.total_lessons,
            ));
        }

        let lines: Vec<ProgressLine<'_>> = enrollments
            .iter()
            .zip(percents)
            .map(|(enrollment, percent)| ProgressLine {
                track_name: &enrollment.track.name,
                percent,
            })
            .collect();

        Ok(message_templates::progress_summary(&user.name, &lines))
    }

    async fn preview(&self, user: &UserEntity) -> UseCaseResult<String> {
        let enrollments = self.learning_repo.list_active_enrollments(user.id).await?;
        let completed = self.learning_repo.completed_lesson_ids(user.id).await?;

        let mut upcoming = Vec::new();
        for enrollment in &enrollments {
            if let Some(lesson) = self
                .learning_repo
                .next_lesson(enrollment.track.id, completed.clone())
                .await?
            {
                upcoming.push((enrollment.track.name.as_str(), lesson));
            }
        }

        let lines: Vec<(&str, &str, i32)> = upcoming
            .iter()
            .map(|(track, lesson)| {
                (
                    *track,
                    lesson.title.as_str(),
                    lesson.estimated_reading_time_minutes,
                )
            })
            .collect();

        Ok(message_templates::next_lesson_preview(&lines))
    }

    async fn catalog(&self) -> UseCaseResult<String> {
        let tracks = self.learning_repo.list_tracks().await?;
        let lines: Vec<TrackLine<'_>> = tracks
            .iter()
            .map(|track| TrackLine {
                icon: &track.icon,
                name: &track.name,
                total_lessons: track.total_lessons,
            })
            .collect();

        Ok(message_templates::track_catalog(
            &lines,
            &self.settings.signup_url,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crates::domain::{
        entities::{
            lessons::LessonEntity, tracks::TrackEntity, user_tracks::UserTrackEntity,
        },
        repositories::{
            learning::MockLearningRepository, messaging::MockOutboundChannel,
            outbound_messages::MockOutboundMessageRepository, users::MockUserRepository,
        },
        value_objects::learning::ActiveEnrollment,
    };
    use mockall::predicate::eq;
    use serde_json::json;
    use uuid::Uuid;

    type TestRouter = CommandRouterUseCase<
        MockUserRepository,
        MockLearningRepository,
        MockOutboundMessageRepository,
        MockOutboundChannel,
    >;

    fn settings() -> ReplySettings {
        ReplySettings {
            signup_url: "https://skillboost.test".to_string(),
            support_phone: "+254 700 000 000".to_string(),
        }
    }

    fn build(
        users: MockUserRepository,
        learning: MockLearningRepository,
        message_log: MockOutboundMessageRepository,
        channel: MockOutboundChannel,
    ) -> TestRouter {
        CommandRouterUseCase::new(
            Arc::new(users),
            Arc::new(learning),
            Arc::new(message_log),
            Arc::new(channel),
            settings(),
        )
    }

    fn subscriber(id: Uuid) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id,
            whatsapp_number: "+254712345678".to_string(),
            name: "Otieno".to_string(),
            email: None,
            preferred_time: "9:00 AM".to_string(),
            subscription_plan: "monthly".to_string(),
            subscription_status: "active".to_string(),
            subscription_expires_at: Some(now + Duration::days(10)),
            created_at: now,
            updated_at: now,
        }
    }

    fn track(name: &str, total_lessons: i32) -> TrackEntity {
        TrackEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            icon: "💻".to_string(),
            total_lessons,
            duration_weeks: 4,
            created_at: Utc::now(),
        }
    }

    fn enrollment(user_id: Uuid, track: TrackEntity) -> ActiveEnrollment {
        let now = Utc::now();
        ActiveEnrollment {
            user_track: UserTrackEntity {
                id: Uuid::new_v4(),
                user_id,
                track_id: track.id,
                progress: 0,
                is_active: true,
                started_at: now,
                updated_at: now,
            },
            track,
        }
    }

    fn inbound(text: Option<&str>) -> InboundMessage {
        InboundMessage {
            from: "+254712345678".to_string(),
            message_id: Some("wamid.in".to_string()),
            text: text.map(str::to_string),
        }
    }

    fn expect_reply(
        channel: &mut MockOutboundChannel,
        message_log: &mut MockOutboundMessageRepository,
        audit: &'static str,
    ) {
        channel
            .expect_send_text()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .withf(move |entry| entry.message_type == "response" && entry.content == audit)
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
    }

    fn expect_reply_containing(
        channel: &mut MockOutboundChannel,
        message_log: &mut MockOutboundMessageRepository,
        needles: &'static [&'static str],
        audit: &'static str,
    ) {
        channel
            .expect_send_text()
            .withf(move |to, body| {
                to == "+254712345678" && needles.iter().all(|needle| body.contains(needle))
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .withf(move |entry| entry.message_type == "response" && entry.content == audit)
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
    }

    #[tokio::test]
    async fn pause_sets_status_inactive() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .withf(|number| number == "+254712345678")
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        users
            .expect_update_status()
            .with(eq(user_id), eq(SubscriptionStatus::Inactive))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        expect_reply(
            &mut channel,
            &mut message_log,
            "User: PAUSE | Bot: pause_lessons",
        );

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("PAUSE "))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Pause));
    }

    #[tokio::test]
    async fn unknown_text_falls_back_without_mutation() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();
        let text = "what time does the next lesson arrive??";

        users
            .expect_find_by_whatsapp_number()
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        users.expect_update_status().never();
        users.expect_update_subscription().never();
        channel
            .expect_send_text()
            .withf(|_, body| body.contains("HELP"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some(text))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Fallback));
    }

    #[tokio::test]
    async fn unknown_sender_gets_onboarding_only() {
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .returning(|_| Box::pin(async { Ok(None) }));
        users.expect_upsert_user().never();
        channel
            .expect_send_text()
            .withf(|to, body| to == "+254712345678" && body.contains("https://skillboost.test"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log.expect_log_message().never();

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("help"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Onboarded);
    }

    #[tokio::test]
    async fn message_without_text_is_unroutable() {
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        users.expect_find_by_whatsapp_number().never();
        channel.expect_send_text().never();

        let router = build(
            users,
            MockLearningRepository::new(),
            MockOutboundMessageRepository::new(),
            channel,
        );
        let outcome = router.handle_inbound(inbound(None)).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Unroutable);
    }

    #[tokio::test]
    async fn resume_after_expiry_asks_for_renewal() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users.expect_find_by_whatsapp_number().returning(move |_| {
            let mut user = subscriber(user_id);
            user.subscription_status = "inactive".to_string();
            user.subscription_expires_at = Some(Utc::now() - Duration::days(1));
            Box::pin(async move { Ok(Some(user)) })
        });
        users
            .expect_update_status()
            .with(eq(user_id), eq(SubscriptionStatus::Expired))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        channel
            .expect_send_text()
            .withf(|_, body| body.contains("KES 150"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("start"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Resume));
    }

    #[tokio::test]
    async fn progress_reports_percent_per_track() {
        let user_id = Uuid::new_v4();
        let web = track("Web Development", 5);
        let web_id = web.id;
        let mut users = MockUserRepository::new();
        let mut learning = MockLearningRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        learning
            .expect_list_active_enrollments()
            .with(eq(user_id))
            .returning(move |_| {
                let enrollments = vec![enrollment(user_id, web.clone())];
                Box::pin(async move { Ok(enrollments) })
            });
        learning
            .expect_count_completed_in_track()
            .with(eq(user_id), eq(web_id))
            .returning(|_, _| Box::pin(async { Ok(2) }));
        channel
            .expect_send_text()
            .withf(|_, body| body.contains("Web Development: 40%"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let router = build(users, learning, message_log, channel);
        router.handle_inbound(inbound(Some("stats"))).await.unwrap();
    }

    #[tokio::test]
    async fn preview_does_not_record_completion() {
        let user_id = Uuid::new_v4();
        let web = track("Web Development", 5);
        let web_id = web.id;
        let mut users = MockUserRepository::new();
        let mut learning = MockLearningRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        learning
            .expect_list_active_enrollments()
            .returning(move |_| {
                let enrollments = vec![enrollment(user_id, web.clone())];
                Box::pin(async move { Ok(enrollments) })
            });
        learning
            .expect_completed_lesson_ids()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        learning
            .expect_next_lesson()
            .withf(move |track_id, _| *track_id == web_id)
            .returning(move |track_id, _| {
                let lesson = LessonEntity {
                    id: Uuid::new_v4(),
                    track_id,
                    lesson_number: 1,
                    title: "HTML Basics".to_string(),
                    content: "...".to_string(),
                    estimated_reading_time_minutes: 5,
                    quiz_question: None,
                    created_at: Utc::now(),
                };
                Box::pin(async move { Ok(Some(lesson)) })
            });
        learning.expect_record_lesson_completion().never();
        channel
            .expect_send_text()
            .withf(|_, body| body.contains("HTML Basics"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let router = build(users, learning, message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("NEXT"))).await.unwrap();
        assert_eq!(outcome, RouteOutcome::Handled(Intent::Preview));
    }

    #[tokio::test]
    async fn webhook_routes_each_message_and_counts_failures() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .withf(|number| number == "+254712345678")
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        users
            .expect_find_by_whatsapp_number()
            .withf(|number| number == "+254799999999")
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));
        channel
            .expect_send_text()
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        message_log
            .expect_log_message()
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let envelope: WhatsAppWebhookEnvelope = serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messages": [
                            { "from": "254712345678", "id": "a", "type": "text", "text": { "body": "help" } },
                            { "from": "254799999999", "id": "b", "type": "text", "text": { "body": "help" } },
                            { "from": "254712345678", "id": "c", "type": "image" }
                        ]
                    }
                }]
            }]
        }))
        .unwrap();

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let summary = router.handle_webhook(envelope).await;

        assert_eq!(
            summary,
            WebhookSummary {
                received: 3,
                handled: 1,
                onboarded: 0,
                unroutable: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn help_lists_the_commands() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        users.expect_update_status().never();
        expect_reply_containing(
            &mut channel,
            &mut message_log,
            &["PAUSE - pause your daily lessons", "TRACKS - list available courses"],
            "User: help | Bot: send_help",
        );

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("help"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Help));
    }

    #[tokio::test]
    async fn catalog_lists_tracks_with_lesson_counts() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut learning = MockLearningRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        learning.expect_list_tracks().times(1).returning(|| {
            let tracks = vec![track("Web Development", 5), track("Digital Marketing", 8)];
            Box::pin(async move { Ok(tracks) })
        });
        expect_reply_containing(
            &mut channel,
            &mut message_log,
            &[
                "💻 Web Development - 5 lessons",
                "💻 Digital Marketing - 8 lessons",
                "https://skillboost.test",
            ],
            "User: courses | Bot: show_tracks",
        );

        let router = build(users, learning, message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("courses"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Catalog));
    }

    #[tokio::test]
    async fn paid_points_to_support_without_touching_the_subscription() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users
            .expect_find_by_whatsapp_number()
            .returning(move |_| Box::pin(async move { Ok(Some(subscriber(user_id))) }));
        users.expect_update_status().never();
        users.expect_update_subscription().never();
        expect_reply_containing(
            &mut channel,
            &mut message_log,
            &["Payment Verification", "+254 700 000 000"],
            "User: PAID | Bot: verify_payment",
        );

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("PAID"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::PaymentCheck));
    }

    #[tokio::test]
    async fn resume_within_paid_window_reactivates_lessons() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users.expect_find_by_whatsapp_number().returning(move |_| {
            let mut user = subscriber(user_id);
            user.subscription_status = "inactive".to_string();
            Box::pin(async move { Ok(Some(user)) })
        });
        users
            .expect_update_status()
            .with(eq(user_id), eq(SubscriptionStatus::Active))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        expect_reply_containing(
            &mut channel,
            &mut message_log,
            &["Welcome back, Otieno", "9:00 AM"],
            "User: resume | Bot: resume_lessons",
        );

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("resume"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Resume));
    }

    #[tokio::test]
    async fn start_without_completed_payment_stays_inactive() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        users.expect_find_by_whatsapp_number().returning(move |_| {
            let mut user = subscriber(user_id);
            user.subscription_plan = "weekly".to_string();
            user.subscription_status = "inactive".to_string();
            user.subscription_expires_at = None;
            Box::pin(async move { Ok(Some(user)) })
        });
        users.expect_update_status().never();
        users.expect_update_subscription().never();
        expect_reply_containing(
            &mut channel,
            &mut message_log,
            &["isn't active yet", "https://skillboost.test"],
            "User: START | Bot: resume_lessons",
        );

        let router = build(users, MockLearningRepository::new(), message_log, channel);
        let outcome = router.handle_inbound(inbound(Some("START"))).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Handled(Intent::Resume));
    }
}
