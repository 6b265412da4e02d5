//! Coordinator: classify, decide, dispatch, format
//!
//! Holds the injected classifier and the read-only responder registry. Each
//! `handle()` call is independent; the only shared mutable state is the
//! statistics counter, which never influences routing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::error::{ResponderUnavailable, Result, RouterError};
use crate::formatter::{Response, ResponseSection};
use crate::responder::{Responder, ResponderProfile, ResponderRegistry};
use crate::routing::{DispatchReason, RoutingDecision, decide};
use crate::stats::{DispatchStats, StatsSnapshot};
use crate::types::{Domain, DomainScore, Query, rank_scores};

/// Dispatch tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// A ranked domain joins when its score is at least this fraction of the top score
    #[serde(default = "default_collaboration_threshold")]
    pub collaboration_threshold: f64,
    /// Upper bound on domains answering one query, primary included
    #[serde(default = "default_max_collaborators")]
    pub max_collaborators: usize,
    #[serde(default = "default_responder_timeout_ms")]
    pub responder_timeout_ms: u64,
    /// Invoke collaborating responders concurrently
    #[serde(default)]
    pub parallel_dispatch: bool,
}

fn default_collaboration_threshold() -> f64 {
    0.5
}

fn default_max_collaborators() -> usize {
    2
}

fn default_responder_timeout_ms() -> u64 {
    30_000
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            collaboration_threshold: default_collaboration_threshold(),
            max_collaborators: default_max_collaborators(),
            responder_timeout_ms: default_responder_timeout_ms(),
            parallel_dispatch: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        let t = self.collaboration_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(RouterError::Config(format!(
                "collaboration_threshold must be in (0, 1], got {}",
                t
            )));
        }
        if self.max_collaborators == 0 {
            return Err(RouterError::Config(
                "max_collaborators must be at least 1".to_string(),
            ));
        }
        if self.responder_timeout_ms == 0 {
            return Err(RouterError::Config(
                "responder_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn responder_timeout(&self) -> Duration {
        Duration::from_millis(self.responder_timeout_ms)
    }
}

/// Routes queries to responders and merges their output
pub struct Coordinator {
    classifier: Arc<dyn Classifier>,
    registry: Arc<ResponderRegistry>,
    config: CoordinatorConfig,
    stats: DispatchStats,
}

impl Coordinator {
    /// Fails if the config is invalid or any domain the classifier can emit
    /// (fallback included) has no registered responder.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        registry: Arc<ResponderRegistry>,
        config: CoordinatorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut required = classifier.domains();
        required.push(classifier.fallback());
        for domain in required {
            if !registry.contains(domain) {
                return Err(RouterError::UnknownDomain(format!(
                    "{} (no responder registered)",
                    domain
                )));
            }
        }

        info!(
            "Coordinator ready: {} responders, fallback={}, threshold={}, parallel={}",
            registry.len(),
            classifier.fallback(),
            config.collaboration_threshold,
            config.parallel_dispatch
        );

        Ok(Self {
            classifier,
            registry,
            config,
            stats: DispatchStats::new(),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Classification and routing decision, without invoking any responder
    pub fn route(&self, query: &Query) -> (Vec<DomainScore>, RoutingDecision) {
        let mut scores = self.classifier.classify(query.text());
        rank_scores(&mut scores);
        let decision = decide(query, &scores, self.classifier.fallback(), &self.config);
        (scores, decision)
    }

    /// Handle one query end to end.
    ///
    /// Only errors when every candidate responder, fallback included, failed.
    pub async fn handle(&self, query: Query) -> Result<Response> {
        let correlation_id = query
            .context_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = info_span!("handle", correlation_id = %correlation_id);
        self.dispatch(query).instrument(span).await
    }

    async fn dispatch(&self, query: Query) -> Result<Response> {
        let (scores, decision) = self.route(&query);
        let selected = decision.selected();
        info!(
            "Routing to {} ({}, confidence {:.2})",
            selected
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(" + "),
            decision.reason,
            decision.confidence
        );
        debug!("{}", decision.reasoning);

        let outcomes = if self.config.parallel_dispatch && selected.len() > 1 {
            self.invoke_parallel(&selected, &query).await
        } else {
            self.invoke_sequential(&selected, &query).await
        };

        let mut sections = Vec::new();
        let mut omitted = Vec::new();
        for (domain, outcome) in selected.iter().copied().zip(outcomes) {
            let profile = self.profile_of(domain);
            match outcome {
                Ok(section) => sections.push(section),
                Err(e) => {
                    warn!("Omitting {}: {}", profile.label, e.reason);
                    omitted.push(profile);
                }
            }
        }

        let mut used_fallback = matches!(
            decision.reason,
            DispatchReason::EmptyQuery | DispatchReason::NoMatch
        );

        if sections.is_empty() {
            let fallback = self.classifier.fallback();
            let mut attempted = selected.clone();
            if attempted.contains(&fallback) {
                error!("No responder available (attempted: {:?})", attempted);
                self.stats.record_request(None, used_fallback);
                return Err(RouterError::NoResponderAvailable { attempted });
            }

            warn!("All selected responders failed, falling back to {}", fallback);
            attempted.push(fallback);
            used_fallback = true;

            let outcome = self.invoke_sequential(&[fallback], &query).await;
            match outcome.into_iter().next() {
                Some(Ok(section)) => {
                    let response = Response::single(
                        section,
                        &omitted,
                        decision,
                        scores,
                        query.context_id().map(str::to_string),
                    );
                    self.stats.record_request(Some(response.mode), used_fallback);
                    return Ok(response);
                }
                _ => {
                    error!("No responder available (attempted: {:?})", attempted);
                    self.stats.record_request(None, used_fallback);
                    return Err(RouterError::NoResponderAvailable { attempted });
                }
            }
        }

        let context_id = query.context_id().map(str::to_string);
        let response = if selected.len() > 1 {
            Response::collaboration(
                query.text(),
                sections,
                &omitted,
                decision,
                scores,
                context_id,
            )
        } else {
            let section = sections.remove(0);
            Response::single(section, &omitted, decision, scores, context_id)
        };

        self.stats.record_request(Some(response.mode), used_fallback);
        Ok(response)
    }

    async fn invoke_sequential(
        &self,
        domains: &[Domain],
        query: &Query,
    ) -> Vec<std::result::Result<ResponseSection, ResponderUnavailable>> {
        let mut outcomes = Vec::with_capacity(domains.len());
        for &domain in domains {
            let handle = self.spawn_call(domain, query);
            outcomes.push(self.join_call(domain, handle).await);
        }
        outcomes
    }

    /// One task per responder, joined in selection order so the output
    /// matches the sequential path exactly.
    async fn invoke_parallel(
        &self,
        domains: &[Domain],
        query: &Query,
    ) -> Vec<std::result::Result<ResponseSection, ResponderUnavailable>> {
        let handles: Vec<_> = domains
            .iter()
            .map(|&domain| (domain, self.spawn_call(domain, query)))
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (domain, handle) in handles {
            outcomes.push(self.join_call(domain, handle).await);
        }
        outcomes
    }

    /// Both dispatch modes run each call in its own task, so a panicking
    /// responder surfaces as unavailable in either mode.
    fn spawn_call(&self, domain: Domain, query: &Query) -> JoinHandle<CallOutcome> {
        let responder = self.registry.get(domain);
        let query = query.clone();
        let timeout = self.config.responder_timeout();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match responder {
                Some(responder) => call_responder(responder, &query, timeout).await,
                None => Err(ResponderUnavailable::new(domain, "no responder registered")),
            };
            (outcome, started.elapsed())
        })
    }

    async fn join_call(
        &self,
        domain: Domain,
        handle: JoinHandle<CallOutcome>,
    ) -> std::result::Result<ResponseSection, ResponderUnavailable> {
        let (outcome, elapsed) = match handle.await {
            Ok(result) => result,
            Err(e) => (
                Err(ResponderUnavailable::new(
                    domain,
                    format!("responder task failed: {}", e),
                )),
                Duration::ZERO,
            ),
        };
        self.stats.record_call(domain, outcome.is_ok(), elapsed);
        outcome
    }

    fn profile_of(&self, domain: Domain) -> ResponderProfile {
        self.registry
            .get(domain)
            .map(|r| r.profile().clone())
            .unwrap_or_else(|| ResponderProfile::builtin(domain))
    }

    /// Profiles of every registered responder in priority order
    pub fn profiles(&self) -> Vec<ResponderProfile> {
        self.registry.profiles()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Probe every registered responder concurrently
    pub async fn health_check(&self) -> BTreeMap<Domain, bool> {
        let timeout = self.config.responder_timeout();
        let mut handles = Vec::new();
        for domain in self.registry.domains() {
            if let Some(responder) = self.registry.get(domain) {
                handles.push((
                    domain,
                    tokio::spawn(async move {
                        tokio::time::timeout(timeout, responder.health_check())
                            .await
                            .unwrap_or(false)
                    }),
                ));
            }
        }

        let mut health = BTreeMap::new();
        for (domain, handle) in handles {
            let healthy = handle.await.unwrap_or(false);
            if !healthy {
                warn!("Responder {} failed health check", domain);
            }
            health.insert(domain, healthy);
        }
        health
    }
}

type CallOutcome = (
    std::result::Result<ResponseSection, ResponderUnavailable>,
    Duration,
);

/// Invoke with a timeout. Output that is blank once the echoed heading is
/// stripped counts as unavailable.
async fn call_responder(
    responder: Arc<dyn Responder>,
    query: &Query,
    timeout: Duration,
) -> std::result::Result<ResponseSection, ResponderUnavailable> {
    let profile = responder.profile();
    let text = match tokio::time::timeout(timeout, responder.respond(query)).await {
        Ok(outcome) => outcome?,
        Err(_) => return Err(ResponderUnavailable::timed_out(profile.domain, timeout)),
    };

    let section = ResponseSection::new(profile, &text);
    if section.body.is_empty() {
        return Err(ResponderUnavailable::new(profile.domain, "empty response"));
    }
    Ok(section)
}
