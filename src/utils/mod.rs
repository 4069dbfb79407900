//! Helper functions shared across layers.
//!
//! - [`code_generator`] - Preview secrets and admin tokens
//! - [`slug`] - Title slugs and id-slug parsing
//! - [`url_normalizer`] - External URL normalization

pub mod code_generator;
pub mod slug;
pub mod url_normalizer;
