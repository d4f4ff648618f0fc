//! synth-payload — builds the synthetic image records the monitor publishes.
//!
//! Each record carries a fresh 1000-byte random payload (base64 on the
//! wire) and metadata rendered from Askama templates parameterized by the
//! record identifier and the current time.
//!
//! # Architecture
//!
//! ```text
//! PayloadGenerator
//!   ├── random_payload() → 1000 bytes from the thread-local RNG
//!   └── MetadataRenderer (default: TemplateRenderer)
//!       ├── attributes.xml        ← uuid
//!       ├── system_attributes.xml ← YYYYMMDD
//!       └── usage_tickets.xml     ← uuid, YYYYMMDDhhmmss, Unix date
//! ```

pub mod error;
pub mod generator;
pub mod metadata;

pub use error::{GenerateError, GenerateResult};
pub use generator::{PayloadGenerator, random_payload};
pub use metadata::{Metadata, MetadataRenderer, TemplateRenderer};
