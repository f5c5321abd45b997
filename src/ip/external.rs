use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::AddressFamily;
use crate::error::{Result, SyncError};

const IPV4_LOOKUP_URL: &str = "https://api.ipify.org/?format=json";
const IPV6_LOOKUP_URL: &str = "https://v6.ident.me/.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// IPv4 lookup envelope: `{ "ip": "<address>" }`.
#[derive(Debug, Deserialize)]
struct Ipv4Envelope {
    ip: String,
}

/// IPv6 lookup envelope. The service also returns an `ip` field, but
/// `address` is the authoritative one; the two must not be conflated.
#[derive(Debug, Deserialize)]
struct Ipv6Envelope {
    #[allow(dead_code)]
    #[serde(default)]
    ip: String,
    address: String,
}

/// Resolves the caller's current public address per family from external
/// lookup services.
pub struct IpResolver {
    client: Client,
    /// The IPv6 lookup host presents a certificate that standard validation
    /// rejects, so that single unauthenticated call goes through a relaxed
    /// client. Never used for requests carrying credentials.
    relaxed_client: Client,
    ipv4_url: String,
    ipv6_url: String,
}

impl IpResolver {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SyncError::Transport)?;

        let relaxed_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(SyncError::Transport)?;

        Ok(Self {
            client,
            relaxed_client,
            ipv4_url: IPV4_LOOKUP_URL.to_string(),
            ipv6_url: IPV6_LOOKUP_URL.to_string(),
        })
    }

    /// Point the resolver at alternate lookup endpoints (used by tests).
    pub fn with_endpoints(ipv4_url: &str, ipv6_url: &str) -> Result<Self> {
        let mut resolver = Self::new()?;
        resolver.ipv4_url = ipv4_url.to_string();
        resolver.ipv6_url = ipv6_url.to_string();
        Ok(resolver)
    }

    /// Look up the current public address for `family`.
    pub async fn resolve(&self, family: AddressFamily) -> Result<IpAddr> {
        let address = match family {
            AddressFamily::V4 => {
                let envelope: Ipv4Envelope = self.fetch(&self.client, &self.ipv4_url).await?;
                envelope.ip
            }
            AddressFamily::V6 => {
                let envelope: Ipv6Envelope =
                    self.fetch(&self.relaxed_client, &self.ipv6_url).await?;
                envelope.address
            }
        };

        let ip: IpAddr = address.parse().map_err(|_| {
            SyncError::Malformed(format!("lookup returned invalid address: {:?}", address))
        })?;

        let family_matches = match family {
            AddressFamily::V4 => ip.is_ipv4(),
            AddressFamily::V6 => ip.is_ipv6(),
        };
        if !family_matches {
            return Err(SyncError::Malformed(format!(
                "lookup returned {} for an {} query",
                ip, family
            )));
        }

        tracing::debug!("Resolved {} address: {}", family, ip);
        Ok(ip)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, client: &Client, url: &str) -> Result<T> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(SyncError::from_request)?;

        if !response.status().is_success() {
            return Err(SyncError::Upstream {
                status: response.status(),
                url: url.to_string(),
            });
        }

        response.json().await.map_err(SyncError::from_request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn resolver_for(server: &MockServer) -> IpResolver {
        IpResolver::with_endpoints(
            &format!("{}/v4", server.uri()),
            &format!("{}/v6", server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_ipv4() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "203.0.113.7"
            })))
            .mount(&server)
            .await;

        let ip = resolver_for(&server)
            .await
            .resolve(AddressFamily::V4)
            .await
            .unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_resolve_ipv6_reads_address_field_not_ip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "1.2.3.4",
                "address": "::1"
            })))
            .mount(&server)
            .await;

        let ip = resolver_for(&server)
            .await
            .resolve(AddressFamily::V6)
            .await
            .unwrap();
        assert_eq!(ip.to_string(), "::1");
    }

    #[tokio::test]
    async fn test_resolve_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .await
            .resolve(AddressFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Upstream { .. }), "got: {:?}", err);
    }

    #[tokio::test]
    async fn test_resolve_unparsable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .await
            .resolve(AddressFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Malformed(_)), "got: {:?}", err);
    }

    #[tokio::test]
    async fn test_resolve_rejects_wrong_family() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "1.2.3.4",
                "address": "5.6.7.8"
            })))
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .await
            .resolve(AddressFamily::V6)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Malformed(_)), "got: {:?}", err);
    }
}
