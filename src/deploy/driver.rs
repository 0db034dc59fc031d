// ABOUTME: Drives one stack through create-or-update and waits for it to settle.
// ABOUTME: Resolves parameters, applies equivalence skips, and suspends scaling actions.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{Parameter, ParamValue, Stack, StackWaitConfig, Stacks};
use crate::diagnostics::{Diagnostics, Warning};
use crate::poll::{PollError, Poller, Step};
use crate::remote::{ScalingOps, StackError, StackOps, StackRequest};
use crate::status::Status;
use crate::types::PhysicalId;

use super::error::DeployError;

/// Builds single stacks against the provisioning service.
pub struct StackDriver {
    stacks: Arc<dyn StackOps>,
    scaling: Arc<dyn ScalingOps>,
    wait: StackWaitConfig,
}

impl StackDriver {
    pub fn new(
        stacks: Arc<dyn StackOps>,
        scaling: Arc<dyn ScalingOps>,
        wait: StackWaitConfig,
    ) -> Self {
        Self {
            stacks,
            scaling,
            wait,
        }
    }

    /// Current status of a remote stack; an absent stack is NONEXISTENT.
    pub async fn status(&self, stack_name: &str) -> Result<Arc<Status>, DeployError> {
        match self.stacks.describe(stack_name).await {
            Ok(description) => Ok(Status::find(&description.status)),
            Err(StackError::NotFound(_)) => Ok(Status::nonexistent()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve one parameter value, reading another stack's outputs if needed.
    pub async fn resolve_value(
        &self,
        value: &ParamValue,
        stacks: &Stacks,
    ) -> Result<String, DeployError> {
        match value {
            ParamValue::Value(env) => Ok(env.resolve()?),
            ParamValue::Output { stack, output } => {
                let source = stacks.get(stack).ok_or_else(|| DeployError::NoSuchStack {
                    looking_for: stack.clone(),
                    available: stacks.keys().cloned().collect(),
                })?;
                let description = self.stacks.describe(source.stack_name()).await?;
                description
                    .outputs
                    .get(output)
                    .cloned()
                    .ok_or_else(|| DeployError::MissingOutput {
                        stack: stack.clone(),
                        output: output.clone(),
                    })
            }
        }
    }

    /// Parameters for a write: the params file overlaid with inline params.
    pub async fn resolve_params(
        &self,
        stack: &Stack,
        stacks: &Stacks,
    ) -> Result<Vec<Parameter>, DeployError> {
        let from_file = stack.params_file().map_err(|source| DeployError::Document {
            stack: stack.name.clone(),
            source,
        })?;

        let mut merged: BTreeMap<String, String> = from_file
            .into_iter()
            .map(|param| (param.key, param.value))
            .collect();
        for (key, value) in &stack.params {
            merged.insert(key.clone(), self.resolve_value(value, stacks).await?);
        }

        Ok(merged
            .into_iter()
            .map(|(key, value)| Parameter { key, value })
            .collect())
    }

    /// True when the stack declares equivalence checks and every one holds.
    pub async fn is_equivalent(&self, stack: &Stack, stacks: &Stacks) -> Result<bool, DeployError> {
        if stack.skip_update_if_equivalent.is_empty() {
            return Ok(false);
        }

        for check in &stack.skip_update_if_equivalent {
            let lhs = self.resolve_value(&check.lhs, stacks).await?;
            let rhs = self.resolve_value(&check.rhs, stacks).await?;
            if lhs != rhs {
                tracing::debug!(stack = %stack.name, %lhs, %rhs, "equivalence check differs");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Physical id of the stack's confirmation scaling group.
    pub async fn scaling_group(&self, stack: &Stack) -> Result<PhysicalId, DeployError> {
        let confirmation =
            stack
                .confirmation
                .as_ref()
                .ok_or_else(|| DeployError::Misconfigured {
                    stack: stack.name.clone(),
                    reason: "no confirmation block names a scaling group".to_string(),
                })?;
        Ok(self
            .stacks
            .physical_id(stack.stack_name(), &confirmation.auto_scaling_group_id)
            .await?)
    }

    /// Create or update the stack and wait until it settles.
    ///
    /// With `suspend_actions`, scheduled scaling actions are suspended for the
    /// duration and resumed afterwards even if the build failed; the build
    /// error is the one returned.
    pub async fn build(
        &self,
        stack: &Stack,
        stacks: &Stacks,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), DeployError> {
        let group = if stack.suspend_actions {
            let group = self.scaling_group(stack).await?;
            tracing::info!(stack = %stack.name, %group, "suspending scheduled actions");
            self.scaling.suspend_scheduled_actions(&group).await?;
            Some(group)
        } else {
            None
        };

        let built = self.write_and_wait(stack, stacks).await;

        if let Some(group) = group {
            tracing::info!(stack = %stack.name, %group, "resuming scheduled actions");
            if let Err(e) = self.scaling.resume_scheduled_actions(&group).await {
                if built.is_ok() {
                    return Err(e.into());
                }
                diagnostics.warn(Warning::scaling_resume(format!(
                    "could not resume scheduled actions on {group}: {e}"
                )));
            }
        }

        built
    }

    async fn write_and_wait(&self, stack: &Stack, stacks: &Stacks) -> Result<(), DeployError> {
        let stack_name = stack.stack_name();

        if self.is_equivalent(stack, stacks).await? {
            tracing::info!(stack = %stack.name, "equivalent to the deployed stack, skipping update");
            self.wait(stack_name).await?;
            return Ok(());
        }

        let template = stack.template_document().map_err(|source| DeployError::Document {
            stack: stack.name.clone(),
            source,
        })?;
        let request = StackRequest {
            stack_name: stack_name.to_string(),
            template,
            params: self.resolve_params(stack, stacks).await?,
            tags: stack.tags.clone(),
        };

        let outcome = self.stacks.create_or_update(&request).await?;
        tracing::info!(stack = %stack.name, ?outcome, "submitted stack");

        self.wait(stack_name).await?;
        Ok(())
    }

    /// Poll the stack until it reaches a complete status.
    ///
    /// A stack already failed on the first look is an error, as is any failed
    /// status later on. NONEXISTENT keeps polling, and a completed rollback is
    /// a failure even when this build wrote nothing.
    pub async fn wait(&self, stack_name: &str) -> Result<Arc<Status>, DeployError> {
        let last = Mutex::new(Status::nonexistent());
        let poller = Poller::new(self.wait.interval).timeout(self.wait.timeout);

        let settled = poller
            .until(&format!("waiting for stack {stack_name}"), |attempt| {
                let last = &last;
                async move {
                    let status = self.status(stack_name).await?;
                    *last.lock() = Arc::clone(&status);
                    tracing::debug!(stack = stack_name, %status, attempt, "stack status");

                    if attempt == 1 && status.failed {
                        return Err(DeployError::StackInFailedState {
                            stack: stack_name.to_string(),
                            status: status.name().to_string(),
                        });
                    }

                    // Absent right after the write: not visible yet, keep polling.
                    if !status.exists {
                        return Ok(Step::Pending);
                    }

                    // Ends the wait, so NONEXISTENT is never waited on after a failure.
                    if status.failed {
                        return Err(DeployError::StackFailed {
                            stack: stack_name.to_string(),
                            status: status.name().to_string(),
                        });
                    }

                    if status.complete {
                        if status.is_rollback {
                            return Err(DeployError::RolledBack {
                                stack: stack_name.to_string(),
                                status: status.name().to_string(),
                            });
                        }
                        return Ok(Step::Done(status));
                    }

                    Ok(Step::Pending)
                }
            })
            .await;

        match settled {
            Err(DeployError::Poll(PollError::TimedOut { .. })) => Err(DeployError::WaitTimeout {
                stack: stack_name.to_string(),
                status: last.lock().name().to_string(),
            }),
            Ok(status) => {
                tracing::info!(stack = stack_name, %status, "stack settled");
                Ok(status)
            }
            Err(e) => Err(e),
        }
    }
}
