//! External collaborators consumed only by reporting.
//!
//! Each adapter is a one-method capability the orchestration layer
//! constructs and hands to the report builder; the core pipeline never
//! depends on any of them. Lookup failures degrade to records with the
//! `error` field set; they never abort a run and never reach the
//! similarity score.

pub mod hosting;
pub mod screenshot;
pub mod whois;

pub use hosting::{HostingLookup, HostingRecord, RdapHosting};
pub use screenshot::{CaptureOptions, ChromiumCapture, ScreenshotCapture};
pub use whois::{RdapWhois, RegistrarLookup, WhoisRecord};

/// Registrable domain of a URL, for WHOIS/hosting lookups.
pub fn domain_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}
