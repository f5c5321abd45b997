use async_trait::async_trait;

use crate::error::Result;

/// A record that already exists at the provider: its provider-assigned
/// identifier and current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedRecord {
    pub id: String,
    pub content: String,
}

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up the record matching `(record_type, name)`.
    ///
    /// Returns `None` when no single matching record exists; callers treat
    /// that as "absent" and create the record.
    async fn locate_record(&self, record_type: &str, name: &str)
        -> Result<Option<LocatedRecord>>;

    /// Create a record with the given content.
    async fn create_record(&self, record_type: &str, content: &str) -> Result<()>;

    /// Update an existing record, addressed by its provider-assigned id.
    async fn update_record(&self, id: &str, record_type: &str, content: &str) -> Result<()>;
}
