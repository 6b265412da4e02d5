//! Responder capability and registry
//!
//! A responder answers queries for exactly one domain. The coordinator only
//! sees this trait, so an in-process template, a shared model client or a
//! remote service all plug in the same way.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ResponderUnavailable;
use crate::types::{Domain, Query};

/// Identity and advertised capabilities of a responder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderProfile {
    pub domain: Domain,
    /// Display name, e.g. "Tech Agent"
    pub label: String,
    /// Identification tag prefixed to every response, e.g. "💻"
    pub tag: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl ResponderProfile {
    pub fn new(domain: Domain, label: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            domain,
            label: label.into(),
            tag: tag.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Standard label, tag and capability list for a domain
    pub fn builtin(domain: Domain) -> Self {
        match domain {
            Domain::Hello => Self::new(domain, "Hello Agent", "👋").with_capabilities(&[
                "General conversation and greetings",
                "User assistance and guidance",
                "System overview and orientation",
                "Basic information and answers",
            ]),
            Domain::Tech => Self::new(domain, "Tech Agent", "💻").with_capabilities(&[
                "Programming and code assistance",
                "Debugging and troubleshooting",
                "Software architecture and design",
                "API development and integration",
                "DevOps and CI/CD",
            ]),
            Domain::Creative => Self::new(domain, "Creative Agent", "🎨").with_capabilities(&[
                "Creative writing and storytelling",
                "Brainstorming and ideation",
                "Content creation and marketing",
                "Artistic direction and design",
            ]),
            Domain::Business => Self::new(domain, "Business Agent", "💼").with_capabilities(&[
                "Business strategy and planning",
                "Market analysis and research",
                "Financial planning and analysis",
                "Career guidance and professional development",
            ]),
        }
    }

    /// "<tag> <label>", the prefix used when rendering
    pub fn heading(&self) -> String {
        format!("{} {}", self.tag, self.label)
    }
}

/// A stateless capability that answers queries within one domain
#[async_trait]
pub trait Responder: Send + Sync {
    fn profile(&self) -> &ResponderProfile;

    async fn respond(&self, query: &Query) -> Result<String, ResponderUnavailable>;

    /// Cheap liveness probe. In-process responders are always healthy.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Read-only map from domain to responder once built
pub struct ResponderRegistry {
    responders: HashMap<Domain, Arc<dyn Responder>>,
}

impl ResponderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            responders: HashMap::new(),
        }
    }

    /// Register a responder under its profile's domain, replacing any previous one
    pub fn register(&mut self, responder: Arc<dyn Responder>) {
        let domain = responder.profile().domain;
        debug!("Registering responder: {} ({})", domain, responder.profile().label);
        if self.responders.insert(domain, responder).is_some() {
            warn!("Replaced existing responder for domain {}", domain);
        }
    }

    /// Get the responder for a domain
    pub fn get(&self, domain: Domain) -> Option<Arc<dyn Responder>> {
        self.responders.get(&domain).cloned()
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.responders.contains_key(&domain)
    }

    /// Registered domains in priority order
    pub fn domains(&self) -> Vec<Domain> {
        Domain::PRIORITY
            .into_iter()
            .filter(|d| self.responders.contains_key(d))
            .collect()
    }

    /// Profiles of every registered responder in priority order
    pub fn profiles(&self) -> Vec<ResponderProfile> {
        self.domains()
            .into_iter()
            .filter_map(|d| self.responders.get(&d))
            .map(|r| r.profile().clone())
            .collect()
    }

    /// Number of registered responders
    pub fn len(&self) -> usize {
        self.responders.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }
}

impl Default for ResponderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResponder {
        profile: ResponderProfile,
        text: &'static str,
    }

    #[async_trait]
    impl Responder for FixedResponder {
        fn profile(&self) -> &ResponderProfile {
            &self.profile
        }

        async fn respond(&self, _query: &Query) -> Result<String, ResponderUnavailable> {
            Ok(self.text.to_string())
        }
    }

    fn fixed(domain: Domain, text: &'static str) -> Arc<dyn Responder> {
        Arc::new(FixedResponder {
            profile: ResponderProfile::builtin(domain),
            text,
        })
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let mut registry = ResponderRegistry::new();
        registry.register(fixed(Domain::Tech, "tech answer"));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(Domain::Tech));
        assert!(!registry.contains(Domain::Hello));

        let responder = registry.get(Domain::Tech).unwrap();
        let text = responder.respond(&Query::new("q")).await.unwrap();
        assert_eq!(text, "tech answer");
        assert!(responder.health_check().await);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ResponderRegistry::new();
        registry.register(fixed(Domain::Hello, "first"));
        registry.register(fixed(Domain::Hello, "second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_domains_in_priority_order() {
        let mut registry = ResponderRegistry::new();
        registry.register(fixed(Domain::Hello, "h"));
        registry.register(fixed(Domain::Creative, "c"));
        registry.register(fixed(Domain::Tech, "t"));
        assert_eq!(
            registry.domains(),
            vec![Domain::Tech, Domain::Creative, Domain::Hello]
        );
        let labels: Vec<String> = registry.profiles().into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Tech Agent", "Creative Agent", "Hello Agent"]);
    }

    #[test]
    fn test_builtin_profiles() {
        let tech = ResponderProfile::builtin(Domain::Tech);
        assert_eq!(tech.heading(), "💻 Tech Agent");
        assert!(!tech.capabilities.is_empty());
        assert_eq!(ResponderProfile::builtin(Domain::Hello).tag, "👋");
        assert_eq!(ResponderProfile::builtin(Domain::Creative).tag, "🎨");
        assert_eq!(ResponderProfile::builtin(Domain::Business).tag, "💼");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ResponderRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get(Domain::Tech).is_none());
        assert!(registry.profiles().is_empty());
    }
}
