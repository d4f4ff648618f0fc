//! Synthetic record generator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::debug;

use synth_core::{IMAGE_KIND, PAYLOAD_LEN, SyntheticRecord, encode_payload};

use crate::error::GenerateResult;
use crate::metadata::{MetadataRenderer, TemplateRenderer};

/// Builds a fresh `SyntheticRecord` per monitoring cycle.
#[derive(Clone)]
pub struct PayloadGenerator {
    renderer: Arc<dyn MetadataRenderer>,
}

impl Default for PayloadGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadGenerator {
    /// Generator backed by the compiled metadata templates.
    pub fn new() -> Self {
        Self {
            renderer: Arc::new(TemplateRenderer),
        }
    }

    pub fn with_renderer(renderer: Arc<dyn MetadataRenderer>) -> Self {
        Self { renderer }
    }

    /// Build a record stamped with the current wall-clock time.
    pub fn generate(&self, identifier: &str) -> GenerateResult<SyntheticRecord> {
        self.generate_at(identifier, Utc::now())
    }

    /// Build a record with metadata rendered for `now`.
    pub fn generate_at(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> GenerateResult<SyntheticRecord> {
        let metadata = self.renderer.render(identifier, now)?;
        let payload = random_payload();
        debug!(%identifier, bytes = payload.len(), "synthetic record generated");

        Ok(SyntheticRecord {
            identifier: identifier.to_string(),
            kind: IMAGE_KIND.to_string(),
            payload: encode_payload(&payload),
            attributes: metadata.attributes,
            workflow_status: metadata.workflow_status,
            system_attributes: metadata.system_attributes,
            usage_tickets: metadata.usage_tickets,
            linked_objects: Vec::new(),
        })
    }
}

/// Draw `PAYLOAD_LEN` fresh random bytes.
pub fn random_payload() -> Vec<u8> {
    let mut buf = vec![0u8; PAYLOAD_LEN];
    rand::rng().fill_bytes(&mut buf);
    buf
}
