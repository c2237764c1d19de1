pub mod lesson_progress;
pub mod lessons;
pub mod outbound_messages;
pub mod payments;
pub mod tracks;
pub mod user_tracks;
pub mod users;
