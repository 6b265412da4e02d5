//! Per-responder request statistics
//!
//! Observability only: nothing here feeds back into routing.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::routing::DispatchMode;
use crate::types::Domain;

/// Request counters for one responder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponderStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub avg_latency_ms: f64,
    pub last_latency_ms: f64,
}

impl ResponderStats {
    fn record(&mut self, success: bool, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.total += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.last_latency_ms = ms;
        self.avg_latency_ms += (ms - self.avg_latency_ms) / self.total as f64;
    }

    /// Fraction of successful calls; 1.0 before any call
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub collaborations: u64,
    pub fallbacks: u64,
    pub errors: u64,
    pub responders: BTreeMap<Domain, ResponderStats>,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "requests={} collaborations={} fallbacks={} errors={}",
            self.requests, self.collaborations, self.fallbacks, self.errors
        )?;
        for (domain, s) in &self.responders {
            writeln!(
                f,
                "  {:<9} total={} ok={} failed={} success={:.0}% avg={:.1}ms",
                domain,
                s.total,
                s.succeeded,
                s.failed,
                s.success_rate() * 100.0,
                s.avg_latency_ms
            )?;
        }
        Ok(())
    }
}

/// Thread-safe accumulator owned by the coordinator
#[derive(Debug, Default)]
pub struct DispatchStats {
    inner: Mutex<StatsSnapshot>,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self, domain: Domain, success: bool, elapsed: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .responders
            .entry(domain)
            .or_default()
            .record(success, elapsed);
    }

    pub fn record_request(&self, mode: Option<DispatchMode>, used_fallback: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.requests += 1;
        match mode {
            Some(DispatchMode::Collaboration) => inner.collaborations += 1,
            Some(DispatchMode::Single) => {}
            None => inner.errors += 1,
        }
        if used_fallback {
            inner.fallbacks += 1;
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
