//! In-process responders that answer from a fixed outline per domain.

use async_trait::async_trait;

use crate::error::ResponderUnavailable;
use crate::responder::{Responder, ResponderProfile};
use crate::types::{Domain, Query};

/// Deterministic responder producing a structured outline for its domain
pub struct TemplateResponder {
    profile: ResponderProfile,
}

impl TemplateResponder {
    pub fn new(domain: Domain) -> Self {
        Self {
            profile: ResponderProfile::builtin(domain),
        }
    }

    /// Use a custom label/tag while keeping the domain's outline
    pub fn with_profile(profile: ResponderProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl Responder for TemplateResponder {
    fn profile(&self) -> &ResponderProfile {
        &self.profile
    }

    async fn respond(&self, query: &Query) -> Result<String, ResponderUnavailable> {
        Ok(render(self.profile.domain, query.text().trim()))
    }
}

fn render(domain: Domain, text: &str) -> String {
    match domain {
        Domain::Hello => format!(
            "Hello there! I'm here to help with general conversation and questions.\n\n\
             Query: {text}\n\n\
             1. **Warm Welcome**: Great to meet you!\n\
             2. **General Support**: Ask me anything, or ask for a specialist.\n\
             3. **Helpful Guidance**: I can point you to the Tech, Creative or Business agents.\n\n\
             How can I make your day better?"
        ),
        Domain::Tech => format!(
            "I can help you with this technical question.\n\n\
             Query: {text}\n\n\
             1. **Technical Analysis**: Break the problem into reproducible steps.\n\
             2. **Best Practices**: Follow the conventions of your language and framework.\n\
             3. **Debugging Steps**: Isolate, reproduce, inspect, then fix.\n\
             4. **Resources**: Official documentation and the project's issue tracker.\n\n\
             Would you like more specific technical guidance?"
        ),
        Domain::Creative => format!(
            "Let's explore your creative potential!\n\n\
             Query: {text}\n\n\
             1. **Creative Direction**: Pick a tone and an audience first.\n\
             2. **Brainstorming**: Generate many options before judging any.\n\
             3. **Artistic Elements**: Visual and conceptual hooks that stand out.\n\
             4. **Story Development**: Give every idea a beginning, tension and payoff.\n\n\
             Let's unlock your creativity together!"
        ),
        Domain::Business => format!(
            "From a business perspective, here's my strategic analysis.\n\n\
             Query: {text}\n\n\
             1. **Market Analysis**: Understand the landscape and the customer.\n\
             2. **Strategic Planning**: Set long-term goals with measurable milestones.\n\
             3. **Risk Assessment**: Weigh costs, competitors and opportunities.\n\
             4. **Action Plan**: Concrete next steps with owners and dates.\n\n\
             Let's develop a solid strategy together!"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_template_echoes_query() {
        let responder = TemplateResponder::new(Domain::Tech);
        let text = responder
            .respond(&Query::new("  fix my build  "))
            .await
            .unwrap();
        assert!(text.contains("Query: fix my build\n"));
        assert!(text.contains("**Debugging Steps**"));
    }

    #[tokio::test]
    async fn test_each_domain_has_distinct_outline() {
        let mut outputs = Vec::new();
        for domain in Domain::PRIORITY {
            let responder = TemplateResponder::new(domain);
            assert_eq!(responder.profile().domain, domain);
            outputs.push(responder.respond(&Query::new("q")).await.unwrap());
        }
        outputs.sort();
        outputs.dedup();
        assert_eq!(outputs.len(), 4);
    }

    #[tokio::test]
    async fn test_custom_profile() {
        let profile = ResponderProfile::new(Domain::Business, "Strategy Desk", "📈");
        let responder = TemplateResponder::with_profile(profile);
        assert_eq!(responder.profile().heading(), "📈 Strategy Desk");
        let text = responder.respond(&Query::new("q")).await.unwrap();
        assert!(text.contains("**Market Analysis**"));
    }
}
