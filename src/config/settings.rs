use crate::error::{Result, SyncError};

/// Immutable settings for one synchronization pass.
///
/// Built once from the command line at startup and passed by reference into
/// each component; no component mutates it.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cloudflare account email, sent as `X-Auth-Email`.
    pub email: String,
    /// Cloudflare API key, sent as `X-Auth-Key`.
    pub api_key: String,
    /// Identifier of the zone holding the record.
    pub zone_id: String,
    /// Name of the A/AAAA record to keep in sync.
    pub record_name: String,
    /// Optional zone name; when set, lookups use `record_name.zone_name`.
    pub zone_name: Option<String>,
    /// When true, raw write-response bodies are logged for diagnostics.
    pub debug: bool,
}

impl Settings {
    /// Reject empty required fields before any network call is made.
    pub fn validate(&self) -> Result<()> {
        for (value, flag) in [
            (&self.email, "email"),
            (&self.api_key, "apikey"),
            (&self.zone_id, "zoneid"),
            (&self.record_name, "recordname"),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "missing required flag: {}",
                    flag
                )));
            }
        }

        if let Some(zone) = &self.zone_name {
            if zone.trim().is_empty() {
                return Err(SyncError::Config(
                    "zonename must not be empty when provided".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Fully-qualified name used when looking the record up: the bare record
    /// name, or `record_name.zone_name` when a zone name is configured.
    pub fn record_fqdn(&self) -> String {
        match &self.zone_name {
            Some(zone) => format!("{}.{}", self.record_name, zone),
            None => self.record_name.clone(),
        }
    }
}
