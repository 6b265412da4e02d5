//! Response tagging and merging
//!
//! Pure string construction: the same sections always render to the same
//! bytes.

use serde::{Deserialize, Serialize};

use crate::responder::ResponderProfile;
use crate::routing::{DispatchMode, RoutingDecision};
use crate::types::{Domain, DomainScore};

pub const COLLABORATION_HEADING: &str = "🤝 Multi-Agent Collaboration:";
pub const COMBINED_HEADING: &str = "Combined Recommendation:";

/// One responder's contribution to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSection {
    pub domain: Domain,
    pub tag: String,
    pub label: String,
    pub body: String,
}

impl ResponseSection {
    /// Wrap raw responder text. A leading "<tag> <label>:" echoed by the
    /// responder itself is dropped so the heading never appears twice.
    pub fn new(profile: &ResponderProfile, body: &str) -> Self {
        let prefix = format!("{}:", profile.heading());
        let trimmed = body.trim();
        let body = trimmed
            .strip_prefix(prefix.as_str())
            .map(str::trim)
            .unwrap_or(trimmed);
        Self {
            domain: profile.domain,
            tag: profile.tag.clone(),
            label: profile.label.clone(),
            body: body.to_string(),
        }
    }

    pub fn heading(&self) -> String {
        format!("{} {}", self.tag, self.label)
    }
}

/// `<tag> <Label>: <body>`, plus a note per responder that was left out
pub fn format_single(section: &ResponseSection, omitted: &[ResponderProfile]) -> String {
    let mut output = format!("{}: {}", section.heading(), section.body);
    push_omission_notes(&mut output, omitted);
    output
}

/// Multi-section template: every contributor, then a combined section noting
/// the collaboration and any responders that were left out.
pub fn format_collaboration(
    query_text: &str,
    sections: &[ResponseSection],
    omitted: &[ResponderProfile],
) -> String {
    let mut output = String::from(COLLABORATION_HEADING);
    output.push_str("\n\n");
    output.push_str(&format!("Query: {}\n\n", query_text.trim()));

    for section in sections {
        output.push_str(&format!("{}:\n{}\n\n", section.heading(), section.body));
    }

    output.push_str(COMBINED_HEADING);
    output.push('\n');
    let contributors = sections
        .iter()
        .map(|s| s.label.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    output.push_str(&format!(
        "{} contributed to this answer. Review each perspective above.",
        contributors
    ));
    push_omission_notes(&mut output, omitted);
    output
}

fn push_omission_notes(output: &mut String, omitted: &[ResponderProfile]) {
    for profile in omitted {
        output.push_str(&format!(
            "\nNote: {} was unavailable and is not included.",
            profile.label
        ));
    }
}

/// Final result of handling one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub mode: DispatchMode,
    pub sections: Vec<ResponseSection>,
    /// Selected responders that failed and were left out
    #[serde(default)]
    pub omitted: Vec<Domain>,
    pub decision: RoutingDecision,
    pub scores: Vec<DomainScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    text: String,
}

impl Response {
    pub fn single(
        section: ResponseSection,
        omitted: &[ResponderProfile],
        decision: RoutingDecision,
        scores: Vec<DomainScore>,
        context_id: Option<String>,
    ) -> Self {
        let text = format_single(&section, omitted);
        Self {
            mode: DispatchMode::Single,
            sections: vec![section],
            omitted: omitted.iter().map(|p| p.domain).collect(),
            decision,
            scores,
            context_id,
            text,
        }
    }

    pub fn collaboration(
        query_text: &str,
        sections: Vec<ResponseSection>,
        omitted: &[ResponderProfile],
        decision: RoutingDecision,
        scores: Vec<DomainScore>,
        context_id: Option<String>,
    ) -> Self {
        let text = format_collaboration(query_text, &sections, omitted);
        Self {
            mode: DispatchMode::Collaboration,
            sections,
            omitted: omitted.iter().map(|p| p.domain).collect(),
            decision,
            scores,
            context_id,
            text,
        }
    }

    /// Rendered response text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Domains that contributed a section, in order
    pub fn responders(&self) -> Vec<Domain> {
        self.sections.iter().map(|s| s.domain).collect()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
