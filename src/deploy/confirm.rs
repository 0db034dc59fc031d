// ABOUTME: Confirms that every in-service instance of a stack's group adopted the new version.
// ABOUTME: Consumes deployment messages from a queue until all targets report or time runs out.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::config::{Stack, interpolate, resolve_env_map};
use crate::diagnostics::{Diagnostics, Warning};
use crate::poll::{PollError, Poller, Step};
use crate::remote::{MessageSource, ScalingOps, StackOps};
use crate::types::InstanceId;

use super::error::DeployError;
use super::message::DeploymentMessage;

/// Who answered a confirmation, and with what.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmationReport {
    pub expected: String,
    pub succeeded: Vec<String>,
    /// Instance id mapped to the output it reported instead.
    pub failed: BTreeMap<String, String>,
}

impl ConfirmationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for ConfirmationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {:?}; {} succeeded",
            self.expected,
            self.succeeded.len()
        )?;
        if !self.failed.is_empty() {
            let failures: Vec<String> = self
                .failed
                .iter()
                .map(|(instance, output)| format!("{instance} reported {output:?}"))
                .collect();
            write!(f, "; {} failed: {}", self.failed.len(), failures.join(", "))?;
        }
        Ok(())
    }
}

/// Classifies incoming messages against the target instance set.
#[derive(Debug)]
struct ConfirmationTracker {
    expected: String,
    targets: BTreeSet<InstanceId>,
    succeeded: BTreeSet<InstanceId>,
    failed: BTreeMap<InstanceId, String>,
    diagnostics: Diagnostics,
}

impl ConfirmationTracker {
    fn new(expected: String, targets: BTreeSet<InstanceId>) -> Self {
        Self {
            expected,
            targets,
            succeeded: BTreeSet::new(),
            failed: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    fn record(&mut self, raw: &str) {
        let message: DeploymentMessage = match raw.parse() {
            Ok(message) => message,
            Err(e) => {
                self.diagnostics.warn(Warning::malformed_message(e.to_string()));
                return;
            }
        };

        let instance = message.instance_id;
        if !self.targets.contains(&instance) {
            self.diagnostics.warn(Warning::stray_message(format!(
                "ignoring message from {instance}, which is not in service for this deployment"
            )));
            return;
        }

        if self.succeeded.contains(&instance) || self.failed.contains_key(&instance) {
            tracing::debug!(%instance, "ignoring repeated message");
            return;
        }

        if message.output == self.expected {
            tracing::info!(%instance, "instance confirmed");
            self.succeeded.insert(instance);
        } else {
            tracing::warn!(%instance, output = %message.output, "instance reported an unexpected version");
            self.failed.insert(instance, message.output);
        }
    }

    fn is_settled(&self) -> bool {
        self.succeeded.len() + self.failed.len() == self.targets.len()
    }

    fn pending(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|id| !self.succeeded.contains(*id) && !self.failed.contains_key(*id))
            .map(|id| id.to_string())
            .collect()
    }

    fn report(&self) -> ConfirmationReport {
        ConfirmationReport {
            expected: self.expected.clone(),
            succeeded: self.succeeded.iter().map(|id| id.to_string()).collect(),
            failed: self
                .failed
                .iter()
                .map(|(id, output)| (id.to_string(), output.clone()))
                .collect(),
        }
    }
}

/// Waits for a stack's instances to report the expected version.
pub struct DeploymentConfirmer {
    stacks: Arc<dyn StackOps>,
    scaling: Arc<dyn ScalingOps>,
    messages: Arc<dyn MessageSource>,
}

impl DeploymentConfirmer {
    pub fn new(
        stacks: Arc<dyn StackOps>,
        scaling: Arc<dyn ScalingOps>,
        messages: Arc<dyn MessageSource>,
    ) -> Self {
        Self {
            stacks,
            scaling,
            messages,
        }
    }

    pub async fn confirm(
        &self,
        stack: &Stack,
        diagnostics: &mut Diagnostics,
    ) -> Result<ConfirmationReport, DeployError> {
        let confirmation = stack
            .confirmation
            .as_ref()
            .ok_or_else(|| DeployError::Misconfigured {
                stack: stack.name.clone(),
                reason: "nothing to confirm without a confirmation block".to_string(),
            })?;

        let env = resolve_env_map(&confirmation.env)?;
        let expected = interpolate(&confirmation.version_message, &env)?;

        let group = self
            .stacks
            .physical_id(stack.stack_name(), &confirmation.auto_scaling_group_id)
            .await?;
        let targets: BTreeSet<InstanceId> = self
            .scaling
            .in_service_instances(&group)
            .await?
            .into_iter()
            .collect();

        if targets.is_empty() {
            tracing::info!(stack = %stack.name, %group, "no instances in service, nothing to confirm");
            return Ok(ConfirmationReport {
                expected,
                ..Default::default()
            });
        }

        tracing::info!(
            stack = %stack.name,
            instances = targets.len(),
            %expected,
            "waiting for deployment messages"
        );

        let tracker = Mutex::new(ConfirmationTracker::new(expected, targets));
        let queue = confirmation.deployment_queue.as_str();
        let poller = Poller::new(confirmation.interval).timeout(confirmation.timeout);

        let waited = poller
            .until(&format!("confirming {}", stack.name), |_| {
                let tracker = &tracker;
                async move {
                    let batch = self.messages.poll_new_messages(queue).await?;
                    let settled = {
                        let mut tracker = tracker.lock();
                        for raw in &batch {
                            tracker.record(raw);
                        }
                        tracker.is_settled()
                    };
                    Ok::<_, DeployError>(if settled { Step::Done(()) } else { Step::Pending })
                }
            })
            .await;

        let tracker = tracker.into_inner();
        let report = tracker.report();
        let pending = tracker.pending();
        diagnostics.absorb(tracker.diagnostics);

        match waited {
            Ok(()) if report.is_success() => Ok(report),
            Ok(()) => Err(DeployError::BadDeployment {
                stack: stack.name.clone(),
                report,
            }),
            Err(DeployError::Poll(PollError::TimedOut { .. })) => {
                Err(DeployError::ConfirmationTimeout {
                    stack: stack.name.clone(),
                    pending,
                })
            }
            Err(e) => Err(e),
        }
    }
}
