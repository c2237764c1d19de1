pub mod learning;
pub mod messaging;
pub mod outbound_messages;
pub mod payments;
pub mod users;
