use crate::error::CoreError;

pub const DURATION_OPTIONS: [u32; 12] = [10, 15, 20, 30, 45, 60, 75, 90, 120, 150, 180, 240];
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

pub fn validate_duration(minutes: u32) -> Result<u32, CoreError> {
    if DURATION_OPTIONS.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(CoreError::InvalidDuration(minutes))
    }
}
