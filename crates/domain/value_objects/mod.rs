pub mod commands;
pub mod enrollments;
pub mod enums;
pub mod learning;
pub mod message_templates;
pub mod mpesa_callback;
pub mod phone_numbers;
pub mod plans;
pub mod whatsapp_webhook;
