//! Fixed names shared by the loaders, the renderer and the dev server.

use std::time::Duration;

/// Default directory (relative to the repository root) holding `<namespace>/<name>/` trees.
pub const DEFAULT_INTEGRATIONS_DIR: &str = "integrations";

pub const CONFIG_FILENAME: &str = "sensu-integration.yaml";
pub const RESOURCES_FILENAME: &str = "sensu-resources.yaml";
pub const LOGO_FILENAME: &str = "logo.png";
pub const README_FILENAME: &str = "README.md";
pub const CHANGELOG_FILENAME: &str = "CHANGELOG.md";
pub const IMAGES_DIRNAME: &str = "img";

/// Extensions accepted from the images directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "gif", "png"];

/// Version segment of every rendered endpoint path.
pub const API_VERSION: &str = "v1";

pub const RESOURCES_ENDPOINT: &str = "sensu-resources.json";
pub const VERSIONS_ENDPOINT: &str = "versions.json";
pub const CATALOG_ENDPOINT: &str = "catalog.json";
pub const VERSION_POINTER_FILENAME: &str = "version.json";

/// Major version given to integrations read straight from the working tree.
///
/// Chosen so that a working-tree version always sorts above any tagged release.
pub const WORKING_TREE_MAJOR: u64 = 99991231;

/// Quiet period after the last filesystem event before a rebuild starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1250);

/// Text frame pushed to live-preview clients after a successful rebuild.
pub const RELOAD_MESSAGE: &str = "refresh";

/// Interval between keepalive pings sent to live-preview clients.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Per-client outbound queue depth. A client that falls this far behind is dropped.
pub const CLIENT_QUEUE_CAPACITY: usize = 256;
