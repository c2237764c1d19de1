pub mod enrollments;
pub mod payments;
pub mod plans;
pub mod progress;
pub mod whatsapp_webhook;
