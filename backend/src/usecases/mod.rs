pub mod commands;
pub mod enrollments;
