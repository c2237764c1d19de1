use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Offset, Timelike, Utc};
use crates::{
    domain::{
        entities::users::UserEntity,
        repositories::{
            learning::LearningRepository, messaging::OutboundChannel,
            outbound_messages::OutboundMessageRepository, users::UserRepository,
        },
        value_objects::{
            enums::{
                delivery_statuses::DeliveryStatus, message_types::MessageType,
                preferred_times::PreferredTime, subscription_statuses::SubscriptionStatus,
            },
            learning::lesson_progress_percent,
            message_templates::{self, LessonMessage},
        },
    },
    infra::messaging::delivery::{Delivery, deliver_and_log},
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct LessonSchedulerSettings {
    /// Local clock offset from UTC, in whole hours.
    pub utc_offset_hours: i32,
    pub max_concurrency: usize,
    /// Delay after every outbound send, to stay under the channel's rate limit.
    pub pacing: Duration,
    /// Local hour at which renewal reminders go out.
    pub reminder_hour: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LessonDispatchSummary {
    pub scanned_users: usize,
    /// Listed users without a paid window at `now`; nothing is sent to them.
    pub skipped_lapsed: usize,
    pub units: usize,
    pub delivered: usize,
    pub skipped_finished: usize,
    pub failed: usize,
    pub reminders_sent: usize,
    pub reminders_failed: usize,
}

impl LessonDispatchSummary {
    fn absorb(&mut self, user: UserDispatch) {
        self.units += user.units;
        self.delivered += user.delivered;
        self.skipped_finished += user.skipped_finished;
        self.failed += user.failed;
    }
}

#[derive(Debug, Default)]
struct UserDispatch {
    units: usize,
    delivered: usize,
    skipped_finished: usize,
    failed: usize,
}

#[derive(Clone)]
struct DispatchContext {
    learning_repo: Arc<dyn LearningRepository + Send + Sync>,
    message_log: Arc<dyn OutboundMessageRepository + Send + Sync>,
    channel: Arc<dyn OutboundChannel + Send + Sync>,
    pacing: Duration,
}

pub struct LessonSchedulerUseCase {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    context: DispatchContext,
    settings: LessonSchedulerSettings,
}

impl LessonSchedulerUseCase {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        learning_repo: Arc<dyn LearningRepository + Send + Sync>,
        message_log: Arc<dyn OutboundMessageRepository + Send + Sync>,
        channel: Arc<dyn OutboundChannel + Send + Sync>,
        settings: LessonSchedulerSettings,
    ) -> Self {
        Self {
            user_repo,
            context: DispatchContext {
                learning_repo,
                message_log,
                channel,
                pacing: settings.pacing,
            },
            settings,
        }
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.settings.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix());
        now.with_timezone(&offset)
    }

    /// One scheduler tick. Only a failure to list due subscribers aborts the run; everything
    /// per-user is counted in the summary instead.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<LessonDispatchSummary> {
        let local = self.local_time(now);
        let mut summary = LessonDispatchSummary::default();

        match PreferredTime::for_hour(local.hour()) {
            Some(slot) => self.dispatch_lessons(slot, now, &mut summary).await?,
            None => info!(local_hour = local.hour(), "lesson_scheduler: no delivery slot this hour"),
        }

        if local.hour() == self.settings.reminder_hour {
            self.send_renewal_reminders(now, &mut summary).await;
        }

        info!(
            scanned_users = summary.scanned_users,
            skipped_lapsed = summary.skipped_lapsed,
            units = summary.units,
            delivered = summary.delivered,
            skipped_finished = summary.skipped_finished,
            failed = summary.failed,
            reminders_sent = summary.reminders_sent,
            reminders_failed = summary.reminders_failed,
            "lesson_scheduler: run finished"
        );
        Ok(summary)
    }

    async fn dispatch_lessons(
        &self,
        slot: PreferredTime,
        now: DateTime<Utc>,
        summary: &mut LessonDispatchSummary,
    ) -> Result<()> {
        let users = self
            .user_repo
            .list_active_users_at_hour(slot, now)
            .await
            .map_err(|err| {
                error!(preferred_time = %slot, db_error = ?err, "lesson_scheduler: failed to list users");
                err
            })?;

        summary.scanned_users = users.len();
        let (users, lapsed): (Vec<UserEntity>, Vec<UserEntity>) = users
            .into_iter()
            .partition(|user| has_paid_window(user, now));
        for user in &lapsed {
            warn!(user_id = %user.id, "lesson_scheduler: skipping subscriber without a paid window");
        }
        summary.skipped_lapsed = lapsed.len();
        info!(preferred_time = %slot, users = users.len(), "lesson_scheduler: dispatching lessons");

        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for user in users {
            let semaphore = Arc::clone(&semaphore);
            let context = self.context.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return UserDispatch::default(),
                };
                dispatch_user(&context, &user).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(user_dispatch) => summary.absorb(user_dispatch),
                Err(err) => {
                    error!(error = ?err, "lesson_scheduler: dispatch task panicked");
                    summary.failed += 1;
                }
            }
        }

        Ok(())
    }

    async fn send_renewal_reminders(&self, now: DateTime<Utc>, summary: &mut LessonDispatchSummary) {
        let users = match self
            .user_repo
            .list_expiring_between(now, now + ChronoDuration::hours(24))
            .await
        {
            Ok(users) => users,
            Err(err) => {
                error!(db_error = ?err, "lesson_scheduler: failed to list expiring subscriptions");
                return;
            }
        };

        for user in users {
            let (Some(plan), Some(expires_at)) = (user.plan(), user.subscription_expires_at) else {
                continue;
            };
            if plan.is_free() {
                continue;
            }

            let body = message_templates::payment_reminder(
                &user.name,
                plan.display_name(),
                plan.price_kes(),
                expires_at,
            );
            let status = deliver_and_log(
                self.context.channel.as_ref(),
                self.context.message_log.as_ref(),
                Delivery {
                    user_id: user.id,
                    to: &user.whatsapp_number,
                    message_type: MessageType::Reminder,
                    body: &body,
                },
            )
            .await;

            match status {
                DeliveryStatus::Sent => summary.reminders_sent += 1,
                DeliveryStatus::Failed => summary.reminders_failed += 1,
            }
            tokio::time::sleep(self.context.pacing).await;
        }
    }
}

/// Active and backed by an expiry that has not passed. A missing expiry means no payment landed.
fn has_paid_window(user: &UserEntity, now: DateTime<Utc>) -> bool {
    user.subscription_expires_at.is_some() && user.status_at(now) == SubscriptionStatus::Active
}

/// Sends the next lesson of each active track, one track at a time.
async fn dispatch_user(context: &DispatchContext, user: &UserEntity) -> UserDispatch {
    let mut outcome = UserDispatch::default();

    let enrollments = match context.learning_repo.list_active_enrollments(user.id).await {
        Ok(enrollments) => enrollments,
        Err(err) => {
            error!(user_id = %user.id, db_error = ?err, "lesson_scheduler: failed to load enrollments");
            outcome.failed += 1;
            return outcome;
        }
    };
    if enrollments.is_empty() {
        return outcome;
    }

    let completed = match context.learning_repo.completed_lesson_ids(user.id).await {
        Ok(completed) => completed,
        Err(err) => {
            error!(user_id = %user.id, db_error = ?err, "lesson_scheduler: failed to load completions");
            outcome.units += enrollments.len();
            outcome.failed += enrollments.len();
            return outcome;
        }
    };

    for enrollment in enrollments {
        outcome.units += 1;
        let track = &enrollment.track;

        let lesson = match context
            .learning_repo
            .next_lesson(track.id, completed.clone())
            .await
        {
            Ok(Some(lesson)) => lesson,
            Ok(None) => {
                info!(user_id = %user.id, track_id = %track.id, "lesson_scheduler: track finished");
                outcome.skipped_finished += 1;
                continue;
            }
            Err(err) => {
                error!(user_id = %user.id, track_id = %track.id, db_error = ?err, "lesson_scheduler: failed to select lesson");
                outcome.failed += 1;
                continue;
            }
        };

        let completed_in_track = match context
            .learning_repo
            .count_completed_in_track(user.id, track.id)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                warn!(user_id = %user.id, track_id = %track.id, db_error = ?err, "lesson_scheduler: progress unavailable");
                0
            }
        };

        let body = message_templates::daily_lesson(&LessonMessage {
            track_name: &track.name,
            title: &lesson.title,
            content: &lesson.content,
            reading_minutes: lesson.estimated_reading_time_minutes,
            quiz_question: lesson.quiz_question.as_deref(),
            progress_percent: lesson_progress_percent(completed_in_track, track.total_lessons),
        });

        let status = deliver_and_log(
            context.channel.as_ref(),
            context.message_log.as_ref(),
            Delivery {
                user_id: user.id,
                to: &user.whatsapp_number,
                message_type: MessageType::Lesson,
                body: &body,
            },
        )
        .await;

        match status {
            DeliveryStatus::Sent => {
                info!(
                    user_id = %user.id,
                    track_id = %track.id,
                    lesson_number = lesson.lesson_number,
                    "lesson_scheduler: lesson delivered"
                );
                outcome.delivered += 1;
            }
            DeliveryStatus::Failed => outcome.failed += 1,
        }

        tokio::time::sleep(context.pacing).await;
    }

    outcome
}
