//! Relationship domains

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A registrable domain such as `getcode.com`.
///
/// Input may be a bare host or a URL. Scheme, credentials, port and path are
/// dropped and subdomains are folded into their base, so `https://app.getcode.com/login`
/// and `getcode.com` name the same relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain {
    base: String,
}

impl Domain {
    pub fn new(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidDomain(input.to_string());

        let mut host = input.trim().to_ascii_lowercase();
        if let Some((_, rest)) = host.split_once("://") {
            host = rest.to_string();
        }
        let host = host
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        let host = host.rsplit('@').next().unwrap_or_default();
        let host = host.split(':').next().unwrap_or_default();
        let host = host.strip_suffix('.').unwrap_or(host);

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 || !labels.iter().all(|label| is_valid_label(label)) {
            return Err(invalid());
        }

        let tld = labels[labels.len() - 1];
        if tld.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let base = labels[labels.len() - 2..].join(".");
        Ok(Self { base })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Domain {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.base
    }
}
