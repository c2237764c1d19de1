use crate::domain::entities::{tracks::TrackEntity, user_tracks::UserTrackEntity};

/// An active enrollment together with the track it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEnrollment {
    pub user_track: UserTrackEntity,
    pub track: TrackEntity,
}

/// Whole-number completion percentage, clamped to `0..=100`. A track with no lessons reports 0.
pub fn lesson_progress_percent(completed: i64, total_lessons: i32) -> i32 {
    if total_lessons <= 0 || completed <= 0 {
        return 0;
    }

    let percent = completed.saturating_mul(100) / i64::from(total_lessons);
    percent.clamp(0, 100) as i32
}
