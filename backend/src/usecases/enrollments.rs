use std::{collections::HashSet, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::Utc;
use crates::{
    domain::{
        entities::{
            payments::{NewPaymentEntity, PaymentEntity, PaymentStatusUpdate},
            users::{UpsertUserEntity, UserEntity},
        },
        repositories::{
            learning::LearningRepository, messaging::OutboundChannel,
            outbound_messages::OutboundMessageRepository, payments::PaymentRepository,
            users::UserRepository,
        },
        value_objects::{
            enrollments::{
                EnrollmentOutcome, EnrollmentRequest, LessonAcknowledgement, PaymentStatusDto,
            },
            enums::{
                message_types::MessageType, payment_methods::PaymentMethod,
                payment_statuses::PaymentStatus, preferred_times::PreferredTime,
                subscription_plans::SubscriptionPlan, subscription_statuses::SubscriptionStatus,
            },
            message_templates,
            mpesa_callback::{CallbackResult, MpesaCallbackAck, parse_callback},
            phone_numbers::PhoneNumber,
            plans::{PLAN_CURRENCY, PlanDto, plan_catalog, subscription_expiry},
        },
    },
    infra::messaging::delivery::{Delivery, deliver_and_log},
    payments::mpesa_client::{MpesaClient, PushOutcome, StatusQueryResult},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result code the provider uses for a confirmed payment.
const PROVIDER_SUCCESS_CODE: &str = "0";

const FREE_TRIAL_TRACK_LIMIT: usize = 1;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MpesaGateway: Send + Sync {
    async fn initiate_push(
        &self,
        phone: &str,
        amount: i64,
        account_reference: &str,
        description: &str,
    ) -> PushOutcome;

    async fn query_status(&self, checkout_request_id: &str) -> AnyResult<StatusQueryResult>;
}

#[async_trait]
impl MpesaGateway for MpesaClient {
    async fn initiate_push(
        &self,
        phone: &str,
        amount: i64,
        account_reference: &str,
        description: &str,
    ) -> PushOutcome {
        self.initiate_push(
            phone,
            amount,
            account_reference,
            description,
            self.callback_url(),
        )
        .await
    }

    async fn query_status(&self, checkout_request_id: &str) -> AnyResult<StatusQueryResult> {
        Ok(self.query_status(checkout_request_id).await?)
    }
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("invalid enrollment: {0}")]
    Validation(String),
    #[error("payment could not be started: {0}")]
    Gateway(String),
    #[error("malformed provider callback: {0}")]
    CallbackParse(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

impl EnrollmentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            EnrollmentError::Validation(_) | EnrollmentError::CallbackParse(_) => {
                StatusCode::BAD_REQUEST
            }
            EnrollmentError::Gateway(_) => StatusCode::BAD_GATEWAY,
            EnrollmentError::NotFound(_) => StatusCode::NOT_FOUND,
            EnrollmentError::Conflict(_) => StatusCode::CONFLICT,
            EnrollmentError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, EnrollmentError>;

pub struct EnrollmentUseCase<U, P, L, O, C, G>
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    user_repo: Arc<U>,
    payment_repo: Arc<P>,
    learning_repo: Arc<L>,
    message_log: Arc<O>,
    channel: Arc<C>,
    gateway: Arc<G>,
}

impl<U, P, L, O, C, G> EnrollmentUseCase<U, P, L, O, C, G>
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        payment_repo: Arc<P>,
        learning_repo: Arc<L>,
        message_log: Arc<O>,
        channel: Arc<C>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            user_repo,
            payment_repo,
            learning_repo,
            message_log,
            channel,
            gateway,
        }
    }

    pub fn list_plans(&self) -> Vec<PlanDto> {
        plan_catalog()
    }

    pub async fn start_enrollment(
        &self,
        request: EnrollmentRequest,
    ) -> UseCaseResult<EnrollmentOutcome> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(EnrollmentError::Validation("name is required".to_string()));
        }

        let whatsapp_number = PhoneNumber::parse(&request.whatsapp_number)
            .map_err(|err| EnrollmentError::Validation(format!("whatsapp_number: {err}")))?;

        let plan = SubscriptionPlan::from_str(&request.plan).ok_or_else(|| {
            EnrollmentError::Validation(format!("unknown plan: {}", request.plan.trim()))
        })?;

        let preferred_time = match request.preferred_time.as_deref() {
            None => PreferredTime::default(),
            Some(raw) if raw.trim().is_empty() => PreferredTime::default(),
            Some(raw) => PreferredTime::from_str(raw).ok_or_else(|| {
                EnrollmentError::Validation(format!("unsupported preferred_time: {}", raw.trim()))
            })?,
        };

        // Paid plans need a chargeable number before anything is written.
        let payer_phone = if plan.is_free() {
            None
        } else {
            let raw = request
                .payer_phone
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .unwrap_or(whatsapp_number.as_str());
            Some(
                PhoneNumber::parse(raw)
                    .map_err(|err| EnrollmentError::Validation(format!("payer_phone: {err}")))?,
            )
        };

        let mut seen = HashSet::new();
        let track_ids: Vec<Uuid> = request
            .track_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        if plan.is_free() && track_ids.len() > FREE_TRIAL_TRACK_LIMIT {
            return Err(EnrollmentError::Validation(format!(
                "the free trial includes {FREE_TRIAL_TRACK_LIMIT} track"
            )));
        }

        let email = request
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        info!(
            whatsapp_number = %whatsapp_number,
            plan = %plan,
            preferred_time = %preferred_time,
            "enrollments: enrollment requested"
        );

        let user = self
            .user_repo
            .upsert_user(UpsertUserEntity {
                whatsapp_number: whatsapp_number.as_str().to_string(),
                name,
                email,
                preferred_time: preferred_time.as_str().to_string(),
                subscription_plan: plan.as_str().to_string(),
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "enrollments: failed to upsert user");
                EnrollmentError::Ledger(err)
            })?;

        // The upsert leaves subscription fields untouched, so `user` still carries any paid plan.
        if plan.is_free() && has_active_paid_plan(&user) {
            warn!(user_id = %user.id, "enrollments: free trial refused, paid plan still active");
            return Err(EnrollmentError::Conflict(
                "a paid subscription is already active for this number".to_string(),
            ));
        }

        for track_id in track_ids {
            self.learning_repo
                .enroll_in_track(user.id, track_id)
                .await
                .map_err(|err| {
                    error!(
                        user_id = %user.id,
                        %track_id,
                        db_error = ?err,
                        "enrollments: failed to enroll user in track"
                    );
                    EnrollmentError::Ledger(err)
                })?;
        }

        match payer_phone {
            None => self.activate_free_plan(&user, plan).await,
            Some(payer_phone) => self.initiate_paid_checkout(&user, plan, &payer_phone).await,
        }
    }

    async fn activate_free_plan(
        &self,
        user: &UserEntity,
        plan: SubscriptionPlan,
    ) -> UseCaseResult<EnrollmentOutcome> {
        let expires_at = plan.expiry_from(Utc::now());

        let user = self
            .user_repo
            .update_subscription(user.id, plan, SubscriptionStatus::Active, Some(expires_at))
            .await
            .map_err(|err| {
                error!(user_id = %user.id, db_error = ?err, "enrollments: failed to activate free plan");
                EnrollmentError::Ledger(err)
            })?;

        info!(user_id = %user.id, %expires_at, "enrollments: free plan activated");

        let body = message_templates::welcome(&user.name, plan.display_name());
        deliver_and_log(
            self.channel.as_ref(),
            self.message_log.as_ref(),
            Delivery {
                user_id: user.id,
                to: &user.whatsapp_number,
                message_type: MessageType::Welcome,
                body: &body,
            },
        )
        .await;

        Ok(EnrollmentOutcome::Activated {
            user_id: user.id,
            plan,
            status: SubscriptionStatus::Active,
            expires_at,
        })
    }

    pub async fn initiate_paid_checkout(
        &self,
        user: &UserEntity,
        plan: SubscriptionPlan,
        payer_phone: &PhoneNumber,
    ) -> UseCaseResult<EnrollmentOutcome> {
        let payment = self
            .payment_repo
            .create_payment(NewPaymentEntity {
                user_id: user.id,
                amount: plan.price_kes(),
                currency: PLAN_CURRENCY.to_string(),
                plan: plan.as_str().to_string(),
                payment_method: PaymentMethod::Mpesa.as_str().to_string(),
                phone_number: payer_phone.as_str().to_string(),
                status: PaymentStatus::Pending.as_str().to_string(),
            })
            .await
            .map_err(|err| {
                error!(user_id = %user.id, db_error = ?err, "enrollments: failed to create payment");
                EnrollmentError::Ledger(err)
            })?;

        let reference = account_reference(user.id);
        let description = format!("{} subscription", plan.display_name());

        let outcome = self
            .gateway
            .initiate_push(
                payer_phone.as_str(),
                i64::from(payment.amount),
                &reference,
                &description,
            )
            .await;

        let (checkout_request_id, merchant_request_id) =
            match (outcome.success, outcome.checkout_request_id) {
                (true, Some(checkout_request_id)) => {
                    (checkout_request_id, outcome.merchant_request_id)
                }
                _ => {
                    let reason = outcome
                        .error
                        .unwrap_or_else(|| "push request was not accepted".to_string());
                    warn!(
                        user_id = %user.id,
                        payment_id = %payment.id,
                        reason = %reason,
                        "enrollments: gateway rejected push"
                    );

                    self.payment_repo
                        .update_payment_status(
                            payment.id,
                            PaymentStatusUpdate {
                                status: PaymentStatus::Failed,
                                mpesa_receipt_number: None,
                                result_desc: Some(reason.clone()),
                            },
                        )
                        .await
                        .map_err(EnrollmentError::Ledger)?;

                    return Err(EnrollmentError::Gateway(reason));
                }
            };

        self.payment_repo
            .attach_provider_refs(
                payment.id,
                &checkout_request_id,
                merchant_request_id.as_deref().unwrap_or_default(),
            )
            .await
            .map_err(|err| {
                error!(
                    payment_id = %payment.id,
                    %checkout_request_id,
                    db_error = ?err,
                    "enrollments: failed to attach provider references"
                );
                EnrollmentError::Ledger(err)
            })?;

        info!(
            user_id = %user.id,
            payment_id = %payment.id,
            %checkout_request_id,
            amount = payment.amount,
            "enrollments: push sent"
        );

        Ok(EnrollmentOutcome::PushSent {
            user_id: user.id,
            payment_id: payment.id,
            checkout_request_id,
            customer_message: outcome.customer_message,
        })
    }

    /// Applies a provider result callback. Safe to call repeatedly for the same checkout id.
    pub async fn handle_provider_callback(&self, payload: &[u8]) -> UseCaseResult<MpesaCallbackAck> {
        let callback = parse_callback(payload).map_err(|err| {
            warn!(error = %err, "enrollments: malformed mpesa callback");
            EnrollmentError::CallbackParse(err.to_string())
        })?;

        info!(
            checkout_request_id = %callback.checkout_request_id,
            result_code = callback.result_code,
            result_desc = %callback.result_desc,
            "enrollments: mpesa callback received"
        );

        let Some(payment) = self
            .payment_repo
            .find_by_checkout_request_id(&callback.checkout_request_id)
            .await?
        else {
            warn!(
                checkout_request_id = %callback.checkout_request_id,
                "enrollments: callback for unknown checkout request"
            );
            return Ok(MpesaCallbackAck::accepted());
        };

        if payment.status().is_terminal() {
            info!(
                payment_id = %payment.id,
                status = %payment.status(),
                "enrollments: payment already finalized, ignoring callback"
            );
            return Ok(MpesaCallbackAck::accepted());
        }

        if callback.is_success() {
            self.complete_payment(&payment, &callback).await?;
        } else {
            self.fail_payment(&payment, callback.result_desc.clone()).await?;
        }

        Ok(MpesaCallbackAck::accepted())
    }

    async fn complete_payment(
        &self,
        payment: &PaymentEntity,
        callback: &CallbackResult,
    ) -> UseCaseResult<()> {
        let expires_at = subscription_expiry(&payment.plan, Utc::now());
        // Unrecognised plan labels are billed and extended like the weekly plan.
        let plan = payment.plan().unwrap_or(SubscriptionPlan::Weekly);

        let activated = self
            .payment_repo
            .complete_and_extend(
                payment.id,
                PaymentStatusUpdate {
                    status: PaymentStatus::Completed,
                    mpesa_receipt_number: callback.receipt_number.clone(),
                    result_desc: Some(callback.result_desc.clone()),
                },
                plan,
                expires_at,
            )
            .await
            .map_err(|err| {
                error!(
                    user_id = %payment.user_id,
                    payment_id = %payment.id,
                    db_error = ?err,
                    "enrollments: failed to complete payment"
                );
                EnrollmentError::Ledger(err)
            })?;

        let Some(user) = activated else {
            info!(payment_id = %payment.id, "enrollments: payment finalized concurrently");
            return Ok(());
        };

        info!(
            user_id = %user.id,
            payment_id = %payment.id,
            plan = %plan,
            %expires_at,
            "enrollments: subscription activated"
        );

        let receipt = callback
            .receipt_number
            .as_deref()
            .or(payment.mpesa_receipt_number.as_deref())
            .unwrap_or("N/A");
        let body = message_templates::payment_confirmation(
            &user.name,
            callback.amount.unwrap_or(i64::from(payment.amount)),
            receipt,
            plan.display_name(),
            expires_at,
        );

        deliver_and_log(
            self.channel.as_ref(),
            self.message_log.as_ref(),
            Delivery {
                user_id: user.id,
                to: &user.whatsapp_number,
                message_type: MessageType::Payment,
                body: &body,
            },
        )
        .await;

        Ok(())
    }

    async fn fail_payment(&self, payment: &PaymentEntity, result_desc: String) -> UseCaseResult<()> {
        let applied = self
            .payment_repo
            .update_payment_status(
                payment.id,
                PaymentStatusUpdate {
                    status: PaymentStatus::Failed,
                    mpesa_receipt_number: None,
                    result_desc: Some(result_desc.clone()),
                },
            )
            .await?;

        if applied {
            info!(
                payment_id = %payment.id,
                user_id = %payment.user_id,
                result_desc = %result_desc,
                "enrollments: payment failed"
            );
        }
        Ok(())
    }

    /// Fallback for a missing callback: asks the provider directly while the payment is pending.
    pub async fn reconcile_payment(
        &self,
        checkout_request_id: &str,
    ) -> UseCaseResult<PaymentStatusDto> {
        let payment = self
            .payment_repo
            .find_by_checkout_request_id(checkout_request_id)
            .await?
            .ok_or(EnrollmentError::NotFound("payment"))?;

        if payment.status().is_terminal() {
            return Ok(payment_status_dto(&payment));
        }

        let result = match self.gateway.query_status(checkout_request_id).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    %checkout_request_id,
                    error = ?err,
                    "enrollments: status query failed, payment stays pending"
                );
                return Ok(payment_status_dto(&payment));
            }
        };

        let Some(result_code) = result.result_code.as_deref() else {
            info!(%checkout_request_id, "enrollments: payment still processing");
            return Ok(payment_status_dto(&payment));
        };

        let result_desc = result.result_desc.clone().unwrap_or_default();
        if result_code == PROVIDER_SUCCESS_CODE {
            let callback = CallbackResult {
                merchant_request_id: payment.merchant_request_id.clone().unwrap_or_default(),
                checkout_request_id: checkout_request_id.to_string(),
                result_code: 0,
                result_desc,
                amount: None,
                receipt_number: None,
                transaction_date: None,
                phone_number: None,
            };
            self.complete_payment(&payment, &callback).await?;
        } else {
            self.fail_payment(&payment, result_desc).await?;
        }

        let refreshed = self
            .payment_repo
            .find_by_checkout_request_id(checkout_request_id)
            .await?
            .ok_or(EnrollmentError::NotFound("payment"))?;

        Ok(payment_status_dto(&refreshed))
    }

    /// Records a lesson as completed. Returns `false` when it had already been acknowledged.
    pub async fn acknowledge_lesson(
        &self,
        acknowledgement: LessonAcknowledgement,
    ) -> UseCaseResult<bool> {
        if let Some(score) = acknowledgement.quiz_score {
            if !(0..=100).contains(&score) {
                return Err(EnrollmentError::Validation(
                    "quiz_score must be between 0 and 100".to_string(),
                ));
            }
        }

        let user_id = acknowledgement.user_id;
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(EnrollmentError::NotFound("user"));
        }

        let recorded = self
            .learning_repo
            .record_lesson_completion(
                user_id,
                acknowledgement.lesson_id,
                acknowledgement.quiz_score,
            )
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    lesson_id = %acknowledgement.lesson_id,
                    db_error = ?err,
                    "enrollments: failed to record lesson completion"
                );
                EnrollmentError::Ledger(err)
            })?;

        info!(
            %user_id,
            lesson_id = %acknowledgement.lesson_id,
            recorded,
            "enrollments: lesson acknowledged"
        );
        Ok(recorded)
    }
}

fn has_active_paid_plan(user: &UserEntity) -> bool {
    user.plan().is_some_and(|plan| !plan.is_free())
        && user.subscription_expires_at.is_some()
        && user.status_at(Utc::now()) == SubscriptionStatus::Active
}

/// Short, provider-safe reference derived from the user id.
fn account_reference(user_id: Uuid) -> String {
    let simple = user_id.simple().to_string();
    format!("SB-{}", simple[..8].to_ascii_uppercase())
}

fn payment_status_dto(payment: &PaymentEntity) -> PaymentStatusDto {
    PaymentStatusDto {
        payment_id: payment.id,
        checkout_request_id: payment.checkout_request_id.clone(),
        status: payment.status(),
        plan: payment.plan.clone(),
        amount: payment.amount,
        receipt_number: payment.mpesa_receipt_number.clone(),
        result_desc: payment.result_desc.clone(),
    }
}
