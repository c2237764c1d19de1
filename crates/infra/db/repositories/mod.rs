pub mod learning;
pub mod outbound_messages;
pub mod payments;
pub mod users;
