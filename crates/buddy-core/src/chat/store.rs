//! RecordStore trait definition.

use buddy_types::error::StoreError;
use buddy_types::record::StoredRecord;

/// Persistence for records extracted from assistant responses.
///
/// Implementations live in buddy-infra (e.g., `JsonlRecordStore`).
pub trait RecordStore: Send + Sync {
    /// Persist one record.
    fn save(
        &self,
        record: &StoredRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
