use tracing::info;

use crate::config::Settings;
use crate::dns::DnsProvider;
use crate::error::Result;
use crate::ip::{AddressFamily, IpResolver};

/// What one address family's pass did to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Created,
    Updated,
}

/// Reconcile one address family: resolve the current public address, locate
/// the existing record, and create or update it when stale.
///
/// Any failure aborts this family's pass; families are otherwise isolated
/// from each other.
pub async fn sync_family(
    settings: &Settings,
    resolver: &IpResolver,
    provider: &dyn DnsProvider,
    family: AddressFamily,
) -> Result<SyncOutcome> {
    let record_type = family.record_type();
    let content = resolver.resolve(family).await?.to_string();

    let located = provider
        .locate_record(record_type, &settings.record_fqdn())
        .await?;

    match located {
        Some(record) if record.content == content => {
            info!(
                "{} record {} is up to date ({})",
                record_type,
                settings.record_name,
                content
            );
            Ok(SyncOutcome::Unchanged)
        }
        None => {
            info!(
                "Creating {} record {} with address {}",
                record_type, settings.record_name, content
            );
            provider.create_record(record_type, &content).await?;
            Ok(SyncOutcome::Created)
        }
        Some(record) => {
            info!(
                "Updating {} record {} from {} to {}",
                record_type, settings.record_name, record.content, content
            );
            provider
                .update_record(&record.id, record_type, &content)
                .await?;
            Ok(SyncOutcome::Updated)
        }
    }
}
