//! Registrar lookup over RDAP.
//!
//! RDAP is WHOIS with a JSON contract (RFC 9083) and needs no extra
//! client library: one GET against rdap.org, which redirects to the
//! registry responsible for the TLD.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const RDAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Registrar facts for one domain. Every field degrades to `None`; a
/// failed lookup is a record with `error` set, never an aborted run.
#[derive(Debug, Clone, Serialize)]
pub struct WhoisRecord {
    pub domain: String,
    pub registrar: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
    pub error: Option<String>,
}

impl WhoisRecord {
    /// A record carrying only a failure note.
    pub fn unavailable(domain: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            registrar: None,
            created_at: None,
            updated_at: None,
            expires_at: None,
            name_servers: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// WHOIS collaborator boundary.
#[async_trait]
pub trait RegistrarLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> WhoisRecord;
}

/// RDAP-backed registrar lookup.
pub struct RdapWhois {
    client: reqwest::Client,
}

impl Default for RdapWhois {
    fn default() -> Self {
        Self::new()
    }
}

impl RdapWhois {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RegistrarLookup for RdapWhois {
    async fn lookup(&self, domain: &str) -> WhoisRecord {
        let url = format!("https://rdap.org/domain/{domain}");
        debug!(domain = %domain, "RDAP domain lookup");

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
            Err(err) => return WhoisRecord::unavailable(domain, err.to_string()),
        };

        match response.json::<Value>().await {
            Ok(payload) => parse_rdap_domain(domain, &payload),
            Err(err) => WhoisRecord::unavailable(domain, err.to_string()),
        }
    }
}

/// Build a record from an RDAP domain payload.
pub fn parse_rdap_domain(domain: &str, payload: &Value) -> WhoisRecord {
    WhoisRecord {
        domain: domain.to_string(),
        registrar: registrar_name(payload),
        created_at: event_date(payload, "registration"),
        updated_at: event_date(payload, "last changed"),
        expires_at: event_date(payload, "expiration"),
        name_servers: name_servers(payload),
        error: None,
    }
}

/// The registrar entity's vCard full name.
fn registrar_name(payload: &Value) -> Option<String> {
    let entities = payload.get("entities")?.as_array()?;
    for entity in entities {
        let has_role = entity
            .get("roles")
            .and_then(Value::as_array)
            .is_some_and(|roles| {
                roles
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|role| role.eq_ignore_ascii_case("registrar"))
            });
        if !has_role {
            continue;
        }
        if let Some(name) = vcard_fn(entity) {
            return Some(name);
        }
    }
    None
}

/// Extract the `fn` property from an entity's vcardArray.
fn vcard_fn(entity: &Value) -> Option<String> {
    let vcard = entity.get("vcardArray")?.as_array()?;
    let properties = vcard.get(1)?.as_array()?;
    for property in properties {
        let parts = property.as_array()?;
        if parts.len() == 4 && parts[0].as_str() == Some("fn") {
            if let Some(name) = parts[3].as_str() {
                return Some(name.to_string());
            }
        }
    }
    None
}

fn event_date(payload: &Value, action: &str) -> Option<DateTime<Utc>> {
    let events = payload.get("events")?.as_array()?;
    for event in events {
        if event.get("eventAction").and_then(Value::as_str) == Some(action) {
            let date = event.get("eventDate")?.as_str()?;
            if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
                return Some(parsed.with_timezone(&Utc));
            }
        }
    }
    None
}

fn name_servers(payload: &Value) -> Vec<String> {
    let mut servers: Vec<String> = payload
        .get("nameservers")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|s| s.get("ldhName").and_then(Value::as_str))
                .map(|s| s.to_lowercase())
                .collect()
        })
        .unwrap_or_default();
    servers.sort();
    servers.dedup();
    servers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "entities": [
                {
                    "roles": ["registrant"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Owner Co"]]]
                },
                {
                    "roles": ["Registrar"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar LLC"]]]
                }
            ],
            "events": [
                {"eventAction": "registration", "eventDate": "2019-03-04T10:00:00Z"},
                {"eventAction": "expiration", "eventDate": "2027-03-04T10:00:00Z"}
            ],
            "nameservers": [
                {"ldhName": "NS2.EXAMPLE-DNS.NET"},
                {"ldhName": "ns1.example-dns.net"}
            ]
        })
    }

    #[test]
    fn parses_registrar_events_and_nameservers() {
        let record = parse_rdap_domain("example.com", &sample_payload());

        assert_eq!(record.registrar.as_deref(), Some("Example Registrar LLC"));
        assert_eq!(record.created_at.unwrap().to_rfc3339(), "2019-03-04T10:00:00+00:00");
        assert!(record.expires_at.is_some());
        assert!(record.updated_at.is_none());
        assert_eq!(
            record.name_servers,
            vec!["ns1.example-dns.net", "ns2.example-dns.net"]
        );
        assert!(record.error.is_none());
    }

    #[test]
    fn empty_payload_degrades_to_unknown_fields() {
        let record = parse_rdap_domain("example.com", &json!({}));
        assert!(record.registrar.is_none());
        assert!(record.created_at.is_none());
        assert!(record.name_servers.is_empty());
        assert!(record.error.is_none());
    }
}
