pub mod lesson_scheduler;
