pub mod delivery_statuses;
pub mod message_types;
pub mod payment_methods;
pub mod payment_statuses;
pub mod preferred_times;
pub mod subscription_plans;
pub mod subscription_statuses;
