//! Metadata rendering.
//!
//! Metadata is passthrough data for ingestion: it only has to be valid at
//! render time. Rendering is behind a trait so a cycle can be driven with
//! a renderer that fails, which the pipeline must record rather than crash on.

use askama::Template;
use chrono::{DateTime, Utc};

use crate::error::GenerateResult;

/// Rendered metadata fields of one synthetic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub attributes: String,
    pub workflow_status: String,
    pub system_attributes: String,
    pub usage_tickets: String,
}

/// Produces the metadata fields for a record.
pub trait MetadataRenderer: Send + Sync {
    fn render(&self, identifier: &str, now: DateTime<Utc>) -> GenerateResult<Metadata>;
}

#[derive(Template)]
#[template(path = "attributes.xml", escape = "none")]
struct AttributesTemplate<'a> {
    uuid: &'a str,
}

#[derive(Template)]
#[template(path = "system_attributes.xml", escape = "none")]
struct SystemAttributesTemplate {
    date: String,
}

#[derive(Template)]
#[template(path = "usage_tickets.xml", escape = "none")]
struct UsageTicketsTemplate<'a> {
    uuid: &'a str,
    date: String,
    formatted_date: String,
}

/// Renders metadata from the compiled Askama templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl MetadataRenderer for TemplateRenderer {
    fn render(&self, identifier: &str, now: DateTime<Utc>) -> GenerateResult<Metadata> {
        let attributes = AttributesTemplate { uuid: identifier }.render()?;
        let system_attributes = SystemAttributesTemplate {
            date: now.format("%Y%m%d").to_string(),
        }
        .render()?;
        let usage_tickets = UsageTicketsTemplate {
            uuid: identifier,
            date: now.format("%Y%m%d%H%M%S").to_string(),
            formatted_date: now.format("%a %b %e %H:%M:%S %Z %Y").to_string(),
        }
        .render()?;

        Ok(Metadata {
            attributes,
            workflow_status: String::new(),
            system_attributes,
            usage_tickets,
        })
    }
}
