//! Hosting/IP metadata lookup: resolve the host, then RDAP the address.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const RDAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a host is served from. Degrades field-by-field like
/// [`super::WhoisRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct HostingRecord {
    pub domain: String,
    pub ip: Option<String>,
    pub network_name: Option<String>,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub error: Option<String>,
}

impl HostingRecord {
    pub fn unavailable(domain: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ip: None,
            network_name: None,
            organization: None,
            country: None,
            error: Some(error.into()),
        }
    }
}

/// Hosting collaborator boundary.
#[async_trait]
pub trait HostingLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> HostingRecord;
}

/// DNS resolve + RDAP IP lookup.
pub struct RdapHosting {
    client: reqwest::Client,
}

impl Default for RdapHosting {
    fn default() -> Self {
        Self::new()
    }
}

impl RdapHosting {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HostingLookup for RdapHosting {
    async fn lookup(&self, domain: &str) -> HostingRecord {
        let addrs = match tokio::net::lookup_host((domain, 443)).await {
            Ok(addrs) => addrs.collect::<Vec<_>>(),
            Err(err) => return HostingRecord::unavailable(domain, err.to_string()),
        };
        let Some(ip) = addrs.first().map(|a| a.ip()) else {
            return HostingRecord::unavailable(domain, "no addresses resolved");
        };

        debug!(domain = %domain, ip = %ip, "RDAP ip lookup");
        let url = format!("https://rdap.org/ip/{ip}");
        let response = match self
            .client
            .get(&url)
            .timeout(RDAP_TIMEOUT)
            .header(reqwest::header::ACCEPT, "application/rdap+json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(err) => {
                let mut record = HostingRecord::unavailable(domain, err.to_string());
                record.ip = Some(ip.to_string());
                return record;
            }
        };

        match response.json::<Value>().await {
            Ok(payload) => parse_rdap_ip(domain, &ip.to_string(), &payload),
            Err(err) => {
                let mut record = HostingRecord::unavailable(domain, err.to_string());
                record.ip = Some(ip.to_string());
                record
            }
        }
    }
}

/// Build a record from an RDAP IP network payload.
pub fn parse_rdap_ip(domain: &str, ip: &str, payload: &Value) -> HostingRecord {
    let organization = payload
        .get("entities")
        .and_then(Value::as_array)
        .and_then(|entities| {
            entities.iter().find_map(|entity| {
                let vcard = entity.get("vcardArray")?.as_array()?;
                let properties = vcard.get(1)?.as_array()?;
                properties.iter().find_map(|property| {
                    let parts = property.as_array()?;
                    if parts.len() == 4 && parts[0].as_str() == Some("fn") {
                        parts[3].as_str().map(|s| s.to_string())
                    } else {
                        None
                    }
                })
            })
        });

    HostingRecord {
        domain: domain.to_string(),
        ip: Some(ip.to_string()),
        network_name: payload
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        organization,
        country: payload
            .get("country")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_network_metadata() {
        let payload = json!({
            "name": "EXAMPLE-NET",
            "country": "US",
            "entities": [
                {"vcardArray": ["vcard", [["fn", {}, "text", "Example Hosting Inc"]]]}
            ]
        });

        let record = parse_rdap_ip("example.com", "203.0.113.10", &payload);
        assert_eq!(record.ip.as_deref(), Some("203.0.113.10"));
        assert_eq!(record.network_name.as_deref(), Some("EXAMPLE-NET"));
        assert_eq!(record.organization.as_deref(), Some("Example Hosting Inc"));
        assert_eq!(record.country.as_deref(), Some("US"));
    }

    #[test]
    fn missing_fields_stay_none() {
        let record = parse_rdap_ip("example.com", "203.0.113.10", &json!({}));
        assert!(record.network_name.is_none());
        assert!(record.organization.is_none());
        assert!(record.error.is_none());
    }
}
