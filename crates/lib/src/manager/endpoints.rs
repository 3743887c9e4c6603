//! Release-relative paths of every rendered endpoint.

use crate::consts::{
  API_VERSION, CATALOG_ENDPOINT, CHANGELOG_FILENAME, IMAGES_DIRNAME, LOGO_FILENAME, README_FILENAME,
  RESOURCES_ENDPOINT, VERSIONS_ENDPOINT,
};
use crate::version::IntegrationVersion;

pub fn catalog() -> String {
  format!("{API_VERSION}/{CATALOG_ENDPOINT}")
}

pub fn namespace(namespace: &str) -> String {
  format!("{API_VERSION}/{namespace}.json")
}

pub fn integration(namespace: &str, name: &str) -> String {
  format!("{API_VERSION}/{namespace}/{name}.json")
}

pub fn versions(namespace: &str, name: &str) -> String {
  format!("{API_VERSION}/{namespace}/{name}/{VERSIONS_ENDPOINT}")
}

pub fn version(version: &IntegrationVersion) -> String {
  format!("{}.json", version_dir(version))
}

pub fn resources(version: &IntegrationVersion) -> String {
  format!("{}/{RESOURCES_ENDPOINT}", version_dir(version))
}

pub fn logo(version: &IntegrationVersion) -> String {
  format!("{}/{LOGO_FILENAME}", version_dir(version))
}

pub fn readme(version: &IntegrationVersion) -> String {
  format!("{}/{README_FILENAME}", version_dir(version))
}

pub fn changelog(version: &IntegrationVersion) -> String {
  format!("{}/{CHANGELOG_FILENAME}", version_dir(version))
}

pub fn image(version: &IntegrationVersion, file: &str) -> String {
  format!("{}/{IMAGES_DIRNAME}/{file}", version_dir(version))
}

fn version_dir(version: &IntegrationVersion) -> String {
  format!(
    "{API_VERSION}/{}/{}/{}",
    version.namespace,
    version.name,
    version.semver()
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::version::{ResolvedTag, resolve_tag};

  #[test]
  fn layout() {
    let ResolvedTag::Matched(v) = resolve_tag("acme/widget/1.2.3", "abc").unwrap() else {
      panic!("tag should match");
    };

    assert_eq!(catalog(), "v1/catalog.json");
    assert_eq!(namespace("acme"), "v1/acme.json");
    assert_eq!(integration("acme", "widget"), "v1/acme/widget.json");
    assert_eq!(versions("acme", "widget"), "v1/acme/widget/versions.json");
    assert_eq!(version(&v), "v1/acme/widget/1.2.3.json");
    assert_eq!(resources(&v), "v1/acme/widget/1.2.3/sensu-resources.json");
    assert_eq!(logo(&v), "v1/acme/widget/1.2.3/logo.png");
    assert_eq!(readme(&v), "v1/acme/widget/1.2.3/README.md");
    assert_eq!(changelog(&v), "v1/acme/widget/1.2.3/CHANGELOG.md");
    assert_eq!(image(&v, "a.png"), "v1/acme/widget/1.2.3/img/a.png");
  }
}
