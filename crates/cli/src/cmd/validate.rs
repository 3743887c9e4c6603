//! Implementation of the `catalog-api validate` command.

use anyhow::{Context, Result, bail};
use serde_json::json;

use catalog_api_lib::manager::{ValidateError, validate};
use catalog_api_lib::source::{SourceConfig, SourceMode};

use crate::output::{OutputFormat, print_error, print_json, print_success};

/// Execute the validate command.
///
/// Checks every integration in the working tree and reports all problems
/// before failing.
pub fn cmd_validate(source: SourceConfig, format: OutputFormat) -> Result<()> {
  let source = SourceMode::Path.open(source);

  match validate(source.as_ref()) {
    Ok(report) => {
      if format.is_json() {
        print_json(&json!({ "checked": report.checked, "failures": [] }))?;
      } else {
        print_success(&format!("{} integration(s) are valid", report.checked));
      }
      Ok(())
    }
    Err(ValidateError::Failed { checked, failures }) => {
      if format.is_json() {
        let items: Vec<_> = failures
          .iter()
          .map(|f| {
            json!({
              "namespace": f.namespace,
              "name": f.name,
              "version": f.version,
              "error": f.error.to_string(),
            })
          })
          .collect();
        print_json(&json!({ "checked": checked, "failures": items }))?;
      } else {
        for failure in &failures {
          print_error(&failure.to_string());
        }
      }
      bail!("{} of {} integration(s) failed validation", failures.len(), checked)
    }
    Err(err) => Err(err).context("Failed to validate catalog"),
  }
}
