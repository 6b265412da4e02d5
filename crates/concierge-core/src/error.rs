//! Error types for concierge-core

use std::time::Duration;

use thiserror::Error;

use crate::types::Domain;

#[derive(Error, Debug)]
pub enum RouterError {
    /// A domain name that does not parse, or one with no registered responder
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// Every candidate responder, fallback included, failed
    #[error("No responder available (attempted: {})", join_domains(.attempted))]
    NoResponderAvailable { attempted: Vec<Domain> },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;

/// A responder failed or timed out. Recovered by the coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Responder '{domain}' unavailable: {reason}")]
pub struct ResponderUnavailable {
    pub domain: Domain,
    pub reason: String,
}

impl ResponderUnavailable {
    pub fn new(domain: Domain, reason: impl Into<String>) -> Self {
        Self {
            domain,
            reason: reason.into(),
        }
    }

    pub fn timed_out(domain: Domain, after: Duration) -> Self {
        Self::new(domain, format!("timed out after {}ms", after.as_millis()))
    }
}

fn join_domains(domains: &[Domain]) -> String {
    domains
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
