//! Integration version identity, ordering and tag resolution.
//!
//! Versions are never stored anywhere; they are derived on every run from tags
//! of the form `namespace/name/semver` or from the working-tree directory layout.

mod parse;
mod types;

pub use parse::{ResolvedTag, TagError, resolve_tag};
pub use types::{IntegrationVersion, NamespacedIntegrations, Origin, VersionedIntegrations, latest_version};
