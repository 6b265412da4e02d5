//! Shared types for concierge-core

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// A fixed category of expertise a responder covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[serde(alias = "general")]
    Hello,
    #[serde(alias = "technical")]
    Tech,
    Creative,
    Business,
}

impl Domain {
    /// All domains in tie-break priority order (highest first)
    pub const PRIORITY: [Domain; 4] = [Domain::Tech, Domain::Business, Domain::Creative, Domain::Hello];

    /// Position in the tie-break order; lower wins
    pub fn rank(self) -> usize {
        match self {
            Self::Tech => 0,
            Self::Business => 1,
            Self::Creative => 2,
            Self::Hello => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::Tech => "tech",
            Self::Creative => "creative",
            Self::Business => "business",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hello" | "general" => Ok(Self::Hello),
            "tech" | "technical" => Ok(Self::Tech),
            "creative" => Ok(Self::Creative),
            "business" => Ok(Self::Business),
            _ => Err(RouterError::UnknownDomain(s.to_string())),
        }
    }
}

/// Incoming user query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_id: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context_id: None,
        }
    }

    /// Attach a conversation context identifier
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn context_id(&self) -> Option<&str> {
        self.context_id.as_deref()
    }

    /// True for empty or whitespace-only text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Relevance of one domain to a query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,
    pub score: f64,
}

impl DomainScore {
    pub fn new(domain: Domain, score: f64) -> Self {
        Self { domain, score }
    }
}

/// Sort scores highest first, breaking ties by domain priority.
pub fn rank_scores(scores: &mut [DomainScore]) {
    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.domain.rank().cmp(&b.domain.rank()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse_aliases() {
        assert_eq!("tech".parse::<Domain>().unwrap(), Domain::Tech);
        assert_eq!("Technical".parse::<Domain>().unwrap(), Domain::Tech);
        assert_eq!("general".parse::<Domain>().unwrap(), Domain::Hello);
        assert_eq!(" BUSINESS ".parse::<Domain>().unwrap(), Domain::Business);
    }

    #[test]
    fn test_domain_parse_unknown() {
        let err = "finance".parse::<Domain>().unwrap_err();
        assert!(matches!(err, RouterError::UnknownDomain(ref name) if name == "finance"));
    }

    #[test]
    fn test_domain_display_roundtrip() {
        for domain in Domain::PRIORITY {
            assert_eq!(domain.to_string().parse::<Domain>().unwrap(), domain);
        }
    }

    #[test]
    fn test_query_blank() {
        assert!(Query::new("").is_blank());
        assert!(Query::new("  \t\n").is_blank());
        assert!(!Query::new("hi").is_blank());
    }

    #[test]
    fn test_query_context_id() {
        let q = Query::new("hi").with_context_id("session-1");
        assert_eq!(q.context_id(), Some("session-1"));
        assert_eq!(Query::new("hi").context_id(), None);
    }

    #[test]
    fn test_rank_scores_ties_use_priority() {
        let mut scores = vec![
            DomainScore::new(Domain::Hello, 1.0),
            DomainScore::new(Domain::Creative, 1.0),
            DomainScore::new(Domain::Business, 1.0),
            DomainScore::new(Domain::Tech, 1.0),
        ];
        rank_scores(&mut scores);
        let order: Vec<Domain> = scores.iter().map(|s| s.domain).collect();
        assert_eq!(order, Domain::PRIORITY.to_vec());
    }

    #[test]
    fn test_rank_scores_descending() {
        let mut scores = vec![
            DomainScore::new(Domain::Tech, 1.0),
            DomainScore::new(Domain::Creative, 3.0),
            DomainScore::new(Domain::Hello, 0.0),
        ];
        rank_scores(&mut scores);
        assert_eq!(scores[0].domain, Domain::Creative);
        assert_eq!(scores[1].domain, Domain::Tech);
        assert_eq!(scores[2].domain, Domain::Hello);
    }
}
