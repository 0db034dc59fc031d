// ABOUTME: Artifact command implementations.
// ABOUTME: Publish, clean, and locate artifacts against a directory-backed store.

use std::path::Path;
use std::sync::Arc;
use strata::artifacts::{self, ArtifactManager};
use strata::config::Config;
use strata::error::Result;
use strata::output::Output;
use strata::remote::LocalStore;

pub async fn publish_artifacts(
    config: &Config,
    stack: &str,
    store: &Path,
    mut output: Output,
) -> Result<()> {
    let stack = config.stack(stack)?;
    output.start_timer();
    output.progress(&format!(
        "Publishing {} artifact(s) of {} to {}",
        stack.artifacts.len(),
        stack.name,
        store.display()
    ));

    let manager = ArtifactManager::new(Arc::new(LocalStore::new(store)), config.dry_run);
    let uploaded = manager.publish(stack).await?;
    for key in &uploaded {
        output.item(&format!("  ✓ {key}"), key);
    }

    output.success(&format!("Published {} artifact(s)", uploaded.len()));
    Ok(())
}

pub async fn clean_artifacts(
    config: &Config,
    stack: &str,
    store: &Path,
    dry_run: bool,
    output: Output,
) -> Result<()> {
    let stack = config.stack(stack)?;
    let dry_run = dry_run || config.dry_run;

    let manager = ArtifactManager::new(Arc::new(LocalStore::new(store)), dry_run);
    let report = manager.cleanup(stack).await?;

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    for key in &report.deleted {
        output.item(&format!("  {verb} {key}"), key);
    }
    output.success(&format!(
        "{verb} {} old artifact(s), kept {}",
        report.deleted.len(),
        report.kept
    ));
    Ok(())
}

pub fn artifact_location(config: &Config, stack: &str, artifact: &str, output: Output) -> Result<()> {
    let stack = config.stack(stack)?;
    let location = artifacts::locate(stack, artifact)?;
    output.item(&location, &location);
    Ok(())
}
