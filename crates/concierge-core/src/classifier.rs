//! Keyword intent classification
//!
//! Maps free text to a ranked list of domain relevance scores. Matching is
//! case-insensitive and works on word tokens, so `hi` never fires inside
//! `this`. Multi-word keywords (`thank you`, `ci/cd`) match when their tokens
//! appear next to each other in the query.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{Domain, DomainScore, rank_scores};

/// Strategy that turns text into ranked domain scores.
///
/// Implementations must be deterministic and must never fail on input text.
pub trait Classifier: Send + Sync {
    /// Score `text` against every known domain, highest first
    fn classify(&self, text: &str) -> Vec<DomainScore>;

    /// Every domain this classifier can emit
    fn domains(&self) -> Vec<Domain>;

    /// Domain used when nothing matches or the input is blank
    fn fallback(&self) -> Domain;
}

const HELLO_KEYWORDS: &[&str] = &[
    "hello", "hi", "hey", "greetings", "good morning", "good afternoon", "good evening",
    "thanks", "thank you", "how are you", "nice to meet you", "welcome",
];

const TECH_KEYWORDS: &[&str] = &[
    "python", "javascript", "typescript", "java", "rust", "c++", "c#", "react", "django",
    "flask", "fastapi", "debug", "debugging", "code", "coding", "programming", "software",
    "api", "database", "sql", "docker", "kubernetes", "error", "bug", "compile", "deploy",
    "deployment", "algorithm", "git", "devops", "ci/cd", "cloud", "aws", "server",
    "technical", "function", "stack trace",
];

const CREATIVE_KEYWORDS: &[&str] = &[
    "story", "stories", "creative", "writing", "art", "design", "brainstorm", "idea", "ideas",
    "concept", "character", "plot", "narrative", "poem", "poetry", "novel", "fiction",
    "inspiration", "imagination", "artistic", "visual", "brand", "marketing", "advertising",
    "slogan", "storytelling", "world building",
];

const BUSINESS_KEYWORDS: &[&str] = &[
    "business", "strategy", "market", "marketing", "financial", "finance", "investment",
    "revenue", "profit", "budget", "startup", "company", "enterprise", "management",
    "leadership", "career", "sales", "customer", "pricing", "funding", "roi", "kpi",
    "growth", "competitor", "competitive",
];

/// Built-in vocabulary keyed by domain name
pub fn default_keywords() -> BTreeMap<String, Vec<String>> {
    let to_vec = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (Domain::Hello.to_string(), to_vec(HELLO_KEYWORDS)),
        (Domain::Tech.to_string(), to_vec(TECH_KEYWORDS)),
        (Domain::Creative.to_string(), to_vec(CREATIVE_KEYWORDS)),
        (Domain::Business.to_string(), to_vec(BUSINESS_KEYWORDS)),
    ])
}

fn default_fallback() -> Domain {
    Domain::Hello
}

/// Configuration for the keyword classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Domain used for blank input and zero-match queries
    #[serde(default = "default_fallback")]
    pub fallback: Domain,
    /// Divide match counts by the query's token count
    #[serde(default)]
    pub normalize: bool,
    /// Domain name → trigger keywords or phrases
    #[serde(default = "default_keywords")]
    pub keywords: BTreeMap<String, Vec<String>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            normalize: false,
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone)]
struct Keyword {
    phrase: String,
    tokens: Vec<String>,
}

/// Classifier that counts distinct keyword hits per domain
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    vocabulary: BTreeMap<Domain, Vec<Keyword>>,
    fallback: Domain,
    normalize: bool,
}

impl KeywordClassifier {
    /// Build from configuration. Unknown domain names are rejected.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let mut vocabulary: BTreeMap<Domain, Vec<Keyword>> = BTreeMap::new();

        for (name, words) in &config.keywords {
            let domain: Domain = name.parse()?;
            let entry = vocabulary.entry(domain).or_default();
            for word in words {
                let tokens = tokenize(word);
                if tokens.is_empty() {
                    warn!("Ignoring keyword {:?} for domain {}: no matchable text", word, domain);
                    continue;
                }
                if entry.iter().any(|k| k.tokens == tokens) {
                    continue;
                }
                entry.push(Keyword {
                    phrase: tokens.join(" "),
                    tokens,
                });
            }
        }

        // The fallback always shows up in the score vector
        vocabulary.entry(config.fallback).or_default();

        debug!(
            "Keyword classifier ready: {}",
            vocabulary
                .iter()
                .map(|(d, k)| format!("{}={}", d, k.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            vocabulary,
            fallback: config.fallback,
            normalize: config.normalize,
        })
    }

    /// Classifier over the built-in vocabulary
    pub fn with_defaults() -> Self {
        let config = ClassifierConfig::default();
        Self::new(&config).expect("built-in vocabulary uses known domains")
    }

    /// Keywords of `domain` that appear in `text`
    pub fn matched_keywords(&self, domain: Domain, text: &str) -> Vec<&str> {
        let tokens = tokenize(text);
        self.vocabulary
            .get(&domain)
            .map(|keywords| {
                keywords
                    .iter()
                    .filter(|k| contains_phrase(&tokens, &k.tokens))
                    .map(|k| k.phrase.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Vec<DomainScore> {
        if text.trim().is_empty() {
            debug!("Blank query, scoring fallback domain {} only", self.fallback);
            return vec![DomainScore::new(self.fallback, 0.0)];
        }

        let tokens = tokenize(text);
        let mut scores: Vec<DomainScore> = self
            .vocabulary
            .iter()
            .map(|(domain, keywords)| {
                let hits = keywords
                    .iter()
                    .filter(|k| contains_phrase(&tokens, &k.tokens))
                    .count() as f64;
                let score = if self.normalize && !tokens.is_empty() {
                    hits / tokens.len() as f64
                } else {
                    hits
                };
                DomainScore::new(*domain, score)
            })
            .collect();

        rank_scores(&mut scores);
        debug!(
            "Classified query ({} tokens): {}",
            tokens.len(),
            scores
                .iter()
                .map(|s| format!("{}={:.2}", s.domain, s.score))
                .collect::<Vec<_>>()
                .join(", ")
        );
        scores
    }

    fn domains(&self) -> Vec<Domain> {
        self.vocabulary.keys().copied().collect()
    }

    fn fallback(&self) -> Domain {
        self.fallback
    }
}

/// Lowercase word tokens. `+` and `#` count as word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase.len()).any(|window| window == phrase)
}
