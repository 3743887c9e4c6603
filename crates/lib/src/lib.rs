//! catalog-api-lib: builds a static, content-addressed catalog API
//!
//! Integrations live in a repository as `<namespace>/<name>/` directories and
//! are versioned by `<namespace>/<name>/<semver>` tags. This crate provides:
//! - `version`: tag parsing and version ordering
//! - `loader`: reading one version's artifacts from git history or disk
//! - `source`: discovering which versions exist
//! - `manager`: rendering every endpoint (`build`) or checking them (`validate`)
//! - `release`: digest-named publishing of a rendered tree
//! - `watch`, `live`, `server`: the local development loop

pub mod api;
pub mod consts;
pub mod live;
pub mod loader;
pub mod manager;
pub mod release;
pub mod server;
pub mod source;
pub mod util;
pub mod version;
pub mod watch;
