use serde::{de::DeserializeOwned, Serialize};
use time::OffsetDateTime;

use crate::models::RecordMeta;

/// A record shape that can live in a persisted slot.
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Caller-supplied fields for a new record.
    type Draft: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Slot used when configuration does not name one.
    const DEFAULT_SLOT: &'static str;

    fn from_draft(draft: Self::Draft, meta: RecordMeta) -> Self;
    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> &str {
        &self.meta().id
    }
}

/// Pre-insert check run by a store before it assigns an id.
pub trait DuplicateCheck<R: StoredRecord>: Send + Sync {
    fn is_duplicate(&self, draft: &R::Draft, existing: &R) -> bool;
}

/// Current UTC time truncated to whole milliseconds, the resolution ids are
/// generated at.
pub fn timestamp_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.millisecond() as u32 * 1_000_000)
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_millisecond_aligned() {
        let ts = timestamp_now();
        assert_eq!(ts.nanosecond() % 1_000_000, 0);
        assert!(ts.offset().is_utc());
    }
}
