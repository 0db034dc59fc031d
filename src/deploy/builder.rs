// ABOUTME: Orchestrates deploying a stack with its dependencies and follow-up work.
// ABOUTME: Sanity check, ordered builds, confirmation, artifact cleanup, then the url check.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::artifacts::{self, ArtifactManager, CleanupReport};
use crate::config::{Config, Stack, StackWaitConfig, Stacks};
use crate::diagnostics::Diagnostics;
use crate::layers::{Layer, Layers};
use crate::remote::{MessageSource, ObjectStore, ScalingOps, StackOps};

use super::confirm::{ConfirmationReport, DeploymentConfirmer};
use super::driver::StackDriver;
use super::error::DeployError;
use super::run::DeployRun;
use super::url_check::check_url;

/// The remote services a deploy talks to.
#[derive(Clone)]
pub struct Clients {
    pub stacks: Arc<dyn StackOps>,
    pub scaling: Arc<dyn ScalingOps>,
    pub messages: Arc<dyn MessageSource>,
    pub store: Arc<dyn ObjectStore>,
}

pub struct Builder {
    driver: StackDriver,
    confirmer: DeploymentConfirmer,
    artifacts: ArtifactManager,
}

fn lookup<'a>(name: &str, stacks: &'a Stacks) -> Result<&'a Stack, DeployError> {
    stacks.get(name).ok_or_else(|| DeployError::NoSuchStack {
        looking_for: name.to_string(),
        available: stacks.keys().cloned().collect(),
    })
}

impl Builder {
    pub fn new(clients: Clients, wait: StackWaitConfig, dry_run: bool) -> Self {
        Self {
            driver: StackDriver::new(Arc::clone(&clients.stacks), Arc::clone(&clients.scaling), wait),
            confirmer: DeploymentConfirmer::new(clients.stacks, clients.scaling, clients.messages),
            artifacts: ArtifactManager::new(clients.store, dry_run),
        }
    }

    pub fn from_config(clients: Clients, config: &Config) -> Self {
        Self::new(clients, config.stack_wait.clone(), config.dry_run)
    }

    pub fn layered(&self, stacks: &Stacks, only_pushable: bool) -> Result<Vec<Layer>, DeployError> {
        Ok(Layers::layered(stacks, only_pushable)?)
    }

    /// Deploy `name` and whatever it needs in a fresh run.
    pub async fn deploy_stack(&self, name: &str, stacks: &Stacks) -> Result<DeployRun, DeployError> {
        let mut run = DeployRun::new();
        self.deploy_in_run(&mut run, name, stacks).await?;
        Ok(run)
    }

    /// Deploy `name` as part of an existing run; stacks the run already built are skipped.
    pub async fn deploy_in_run(
        &self,
        run: &mut DeployRun,
        name: &str,
        stacks: &Stacks,
    ) -> Result<(), DeployError> {
        let stack = lookup(name, stacks)?;
        self.sanity_check(stack, stacks, false, run).await?;
        self.deploy(stack, stacks, run, false).await
    }

    /// Check everything a deploy of `stack` will need before anything changes.
    pub fn sanity_check<'a>(
        &'a self,
        stack: &'a Stack,
        stacks: &'a Stacks,
        ignore_deps: bool,
        run: &'a mut DeployRun,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        async move {
            if !run.mark_checked(&stack.name) {
                return Ok(());
            }
            tracing::debug!(stack = %stack.name, "sanity checking");

            stack.find_missing_env()?;
            let document_error = |source| DeployError::Document {
                stack: stack.name.clone(),
                source,
            };
            stack.template_document().map_err(document_error)?;
            stack.params_file().map_err(document_error)?;
            if stack.artifact_retention_after_deployment {
                artifacts::find_missing_build_env(stack)?;
            }

            let status = self.driver.status(stack.stack_name()).await?;
            if status.failed {
                return Err(DeployError::StackInFailedState {
                    stack: stack.name.clone(),
                    status: status.name().to_string(),
                });
            }

            if !ignore_deps && !stack.ignore_deps {
                for dep in stack.dependencies() {
                    self.sanity_check(lookup(dep, stacks)?, stacks, ignore_deps, run)
                        .await?;
                }
            }
            for name in &stack.build_after {
                self.sanity_check(lookup(name, stacks)?, stacks, ignore_deps, run)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn deploy<'a>(
        &'a self,
        stack: &'a Stack,
        stacks: &'a Stacks,
        run: &'a mut DeployRun,
        ignore_deps: bool,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        async move {
            if run.is_made(&stack.name) {
                return Ok(());
            }

            if !ignore_deps && !stack.ignore_deps {
                for dep in stack.dependencies() {
                    self.deploy(lookup(dep, stacks)?, stacks, run, true).await?;
                }
            }

            tracing::info!(stack = %stack.name, stack_name = stack.stack_name(), "making stack");
            self.driver.build(stack, stacks, &mut run.diagnostics).await?;
            run.mark_made(&stack.name);

            let confirm_early = stack.confirmation.as_ref().is_some_and(|c| c.straight_after);
            if confirm_early {
                self.confirm_deployment(stack, &mut run.diagnostics).await?;
            }

            for name in &stack.build_after {
                self.deploy(lookup(name, stacks)?, stacks, run, true).await?;
            }

            if stack.confirmation.is_some() && !confirm_early {
                self.confirm_deployment(stack, &mut run.diagnostics).await?;
            }

            if stack.artifact_retention_after_deployment {
                self.clean_old_artifacts(stack).await?;
            }

            if let Some(checker) = &stack.url_checker {
                check_url(stack, checker).await?;
            }
            Ok(())
        }
        .boxed()
    }

    pub async fn confirm_deployment(
        &self,
        stack: &Stack,
        diagnostics: &mut Diagnostics,
    ) -> Result<ConfirmationReport, DeployError> {
        let report = self.confirmer.confirm(stack, diagnostics).await?;
        tracing::info!(stack = %stack.name, %report, "deployment confirmed");
        Ok(report)
    }

    /// Build and upload every artifact of the stack; returns the uploaded keys.
    pub async fn publish_artifacts(&self, stack: &Stack) -> Result<Vec<String>, DeployError> {
        Ok(self.artifacts.publish(stack).await?)
    }

    pub async fn clean_old_artifacts(&self, stack: &Stack) -> Result<CleanupReport, DeployError> {
        Ok(self.artifacts.cleanup(stack).await?)
    }

    pub fn artifact_location(&self, stack: &Stack, artifact: &str) -> Result<String, DeployError> {
        Ok(artifacts::locate(stack, artifact)?)
    }
}
