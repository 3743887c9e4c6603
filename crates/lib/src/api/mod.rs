//! Typed integration configuration and the shapes of the rendered endpoints.
//!
//! - [`Integration`]: the validated content of `sensu-integration.yaml`
//! - [`decode_config`]: envelope dispatch on `(api_version, type)`
//! - [`resources_from_yaml`]: multi-document resource manifest parsing
//! - [`catalog`]: response bodies written into a release

pub mod catalog;
mod envelope;
mod integration;
mod resources;

pub use envelope::{DecodeError, Envelope, INTEGRATION_TYPE_VERSION, decode_config};
pub use integration::{
  Class, Integration, Metadata, PostInstall, Prompt, Provider, ResourcePatch, ResourcePatchRef, ValidationError,
};
pub use resources::{ResourceError, Resources, resources_from_yaml};
