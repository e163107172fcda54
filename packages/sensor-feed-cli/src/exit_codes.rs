use sensor_feed::FeedError;

pub const SUCCESS: i32 = 0;
pub const EXECUTION_ERROR: i32 = 1;
pub const INPUT_ERROR: i32 = 2;
pub const SCHEMA_ERROR: i32 = 3;
pub const PARTIAL_FAILURE: i32 = 4;

/// Exit code for a library error
pub fn for_error(err: &FeedError) -> i32 {
    match err {
        FeedError::SchemaMismatch { .. } | FeedError::MalformedRow { .. } => SCHEMA_ERROR,
        FeedError::Open { .. }
        | FeedError::Config(_)
        | FeedError::InvalidParameter(_)
        | FeedError::BufferTooSmall { .. } => INPUT_ERROR,
        _ => EXECUTION_ERROR,
    }
}
