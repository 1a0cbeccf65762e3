/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Position of a root record within its batch.
pub type RecordIndex = usize;
