//! Routing decision: single dispatch or collaboration.

use serde::{Deserialize, Serialize};

use crate::coordinator::CoordinatorConfig;
use crate::types::{Domain, DomainScore, Query};

/// How many responders a request fans out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    Single,
    Collaboration,
}

/// Why the decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchReason {
    /// Blank input, routed straight to the fallback
    EmptyQuery,
    /// No keyword matched any domain
    NoMatch,
    /// One domain clearly dominated
    BestMatch,
    /// Two or more domains scored within the collaboration threshold
    Collaboration,
}

impl std::fmt::Display for DispatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "empty_query"),
            Self::NoMatch => write!(f, "no_match"),
            Self::BestMatch => write!(f, "best_match"),
            Self::Collaboration => write!(f, "collaboration"),
        }
    }
}

/// The result of routing analysis for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Highest-ranked domain (or the fallback)
    pub primary: Domain,
    /// Additional domains joining a collaboration, in rank order
    #[serde(default)]
    pub collaborators: Vec<Domain>,
    pub reason: DispatchReason,
    /// How strongly the primary domain dominates (0.0 - 1.0)
    pub confidence: f64,
    /// Human-readable explanation with the score distribution
    pub reasoning: String,
}

impl RoutingDecision {
    pub fn mode(&self) -> DispatchMode {
        if self.collaborators.is_empty() {
            DispatchMode::Single
        } else {
            DispatchMode::Collaboration
        }
    }

    /// Primary followed by collaborators
    pub fn selected(&self) -> Vec<Domain> {
        std::iter::once(self.primary)
            .chain(self.collaborators.iter().copied())
            .collect()
    }
}

/// Decide which domain(s) should answer `query` given ranked `scores`.
///
/// `scores` must already be sorted highest first.
pub fn decide(
    query: &Query,
    scores: &[DomainScore],
    fallback: Domain,
    config: &CoordinatorConfig,
) -> RoutingDecision {
    let top = scores.first().copied();

    let Some(top) = top.filter(|t| t.score > 0.0) else {
        let reason = if query.is_blank() {
            DispatchReason::EmptyQuery
        } else {
            DispatchReason::NoMatch
        };
        return RoutingDecision {
            primary: fallback,
            collaborators: Vec::new(),
            reason,
            confidence: 0.0,
            reasoning: format!(
                "No domain matched ({}), using fallback '{}'; {}",
                reason,
                fallback,
                distribution(scores)
            ),
        };
    };

    let cutoff = config.collaboration_threshold * top.score;
    let collaborators: Vec<Domain> = scores
        .iter()
        .skip(1)
        .take(config.max_collaborators.saturating_sub(1))
        .take_while(|s| s.score > 0.0 && s.score >= cutoff)
        .map(|s| s.domain)
        .collect();

    let reason = if collaborators.is_empty() {
        DispatchReason::BestMatch
    } else {
        DispatchReason::Collaboration
    };

    let mut reasoning = format!("Primary '{}' selected with score {:.2}", top.domain, top.score);
    if !collaborators.is_empty() {
        let joined = collaborators
            .iter()
            .filter_map(|d| scores.iter().find(|s| s.domain == *d))
            .map(|s| format!("'{}' (score: {:.2})", s.domain, s.score))
            .collect::<Vec<_>>()
            .join(", ");
        reasoning.push_str(&format!("; collaborating with {}", joined));
    }
    reasoning.push_str("; ");
    reasoning.push_str(&distribution(scores));

    RoutingDecision {
        primary: top.domain,
        collaborators,
        reason,
        confidence: confidence(scores, top.score),
        reasoning,
    }
}

/// Share of the total score held by the top domain, doubled and capped at 1.
fn confidence(scores: &[DomainScore], top: f64) -> f64 {
    let total: f64 = scores.iter().map(|s| s.score).sum();
    if top <= 0.0 || total <= 0.0 {
        return 0.0;
    }
    (top / total * 2.0).min(1.0)
}

fn distribution(scores: &[DomainScore]) -> String {
    let parts = scores
        .iter()
        .map(|s| format!("{}: {:.2}", s.domain, s.score))
        .collect::<Vec<_>>()
        .join(", ");
    format!("score distribution: {}", parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(Domain, f64)]) -> Vec<DomainScore> {
        pairs.iter().map(|(d, s)| DomainScore::new(*d, *s)).collect()
    }

    fn config() -> CoordinatorConfig {
        CoordinatorConfig::default()
    }

    #[test]
    fn test_zero_top_uses_fallback() {
        let s = scores(&[(Domain::Tech, 0.0), (Domain::Hello, 0.0)]);
        let d = decide(&Query::new("qwerty"), &s, Domain::Hello, &config());
        assert_eq!(d.primary, Domain::Hello);
        assert_eq!(d.reason, DispatchReason::NoMatch);
        assert_eq!(d.mode(), DispatchMode::Single);
        assert_eq!(d.confidence, 0.0);
    }

    #[test]
    fn test_blank_query_reason() {
        let s = scores(&[(Domain::Hello, 0.0)]);
        let d = decide(&Query::new("  "), &s, Domain::Hello, &config());
        assert_eq!(d.reason, DispatchReason::EmptyQuery);
        assert_eq!(d.selected(), vec![Domain::Hello]);
    }

    #[test]
    fn test_empty_scores_use_fallback() {
        let d = decide(&Query::new("anything"), &[], Domain::Business, &config());
        assert_eq!(d.primary, Domain::Business);
        assert_eq!(d.reason, DispatchReason::NoMatch);
    }

    #[test]
    fn test_single_dispatch_when_second_is_zero() {
        let s = scores(&[(Domain::Tech, 3.0), (Domain::Business, 0.0)]);
        let d = decide(&Query::new("q"), &s, Domain::Hello, &config());
        assert_eq!(d.primary, Domain::Tech);
        assert!(d.collaborators.is_empty());
        assert_eq!(d.reason, DispatchReason::BestMatch);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_single_dispatch_below_threshold() {
        let s = scores(&[(Domain::Tech, 3.0), (Domain::Creative, 1.0)]);
        let d = decide(&Query::new("q"), &s, Domain::Hello, &config());
        assert_eq!(d.mode(), DispatchMode::Single);
    }

    #[test]
    fn test_collaboration_at_threshold() {
        let s = scores(&[(Domain::Creative, 2.0), (Domain::Tech, 1.0), (Domain::Business, 1.0)]);
        let d = decide(&Query::new("q"), &s, Domain::Hello, &config());
        assert_eq!(d.mode(), DispatchMode::Collaboration);
        assert_eq!(d.selected(), vec![Domain::Creative, Domain::Tech]);
        assert_eq!(d.reason, DispatchReason::Collaboration);
        assert!(d.reasoning.contains("collaborating with 'tech' (score: 1.00)"));
        // 2 / 4 * 2
        assert!((d.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_collaborators_extends_fan_out() {
        let s = scores(&[(Domain::Creative, 2.0), (Domain::Tech, 1.0), (Domain::Business, 1.0)]);
        let cfg = CoordinatorConfig {
            max_collaborators: 3,
            ..Default::default()
        };
        let d = decide(&Query::new("q"), &s, Domain::Hello, &cfg);
        assert_eq!(
            d.selected(),
            vec![Domain::Creative, Domain::Tech, Domain::Business]
        );
    }

    #[test]
    fn test_max_collaborators_one_disables_collaboration() {
        let s = scores(&[(Domain::Tech, 2.0), (Domain::Business, 2.0)]);
        let cfg = CoordinatorConfig {
            max_collaborators: 1,
            ..Default::default()
        };
        let d = decide(&Query::new("q"), &s, Domain::Hello, &cfg);
        assert_eq!(d.mode(), DispatchMode::Single);
    }

    #[test]
    fn test_custom_threshold() {
        let s = scores(&[(Domain::Tech, 4.0), (Domain::Business, 3.0)]);
        let strict = CoordinatorConfig {
            collaboration_threshold: 0.8,
            ..Default::default()
        };
        assert_eq!(
            decide(&Query::new("q"), &s, Domain::Hello, &strict).mode(),
            DispatchMode::Single
        );
        assert_eq!(
            decide(&Query::new("q"), &s, Domain::Hello, &config()).mode(),
            DispatchMode::Collaboration
        );
    }

    #[test]
    fn test_confidence_partial() {
        let s = scores(&[(Domain::Tech, 2.0), (Domain::Business, 1.0), (Domain::Creative, 2.0)]);
        // 2 / 5 * 2 = 0.8
        assert!((confidence(&s, 2.0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_reasoning_lists_distribution() {
        let s = scores(&[(Domain::Tech, 3.0), (Domain::Hello, 0.0)]);
        let d = decide(&Query::new("q"), &s, Domain::Hello, &config());
        assert_eq!(
            d.reasoning,
            "Primary 'tech' selected with score 3.00; score distribution: tech: 3.00, hello: 0.00"
        );
    }
}
