// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes of the remote services plus config and tracing helpers.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;
use strata::config::{Config, StackWaitConfig};
use strata::deploy::{Builder, Clients, StackDriver};
use strata::remote::{
    MessageSource, ObjectInfo, ObjectStore, QueueError, ScalingError, ScalingOps, StackDescription,
    StackError, StackOps, StackRequest, StoreError, WriteOutcome,
};
use strata::status::NONEXISTENT;
use strata::types::{InstanceId, LogicalId, PhysicalId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("strata=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Inline template every test stack can use.
#[allow(dead_code)]
pub const TEMPLATE: &str = "{Resources: {Thing: {Type: T}}}";

#[derive(Default)]
struct StacksState {
    statuses: HashMap<String, VecDeque<String>>,
    outputs: HashMap<String, HashMap<String, String>>,
    resources: HashMap<(String, String), String>,
    requests: Vec<StackRequest>,
    outcome: Option<WriteOutcome>,
}

/// Provisioning service fake with scripted statuses.
///
/// Each describe pops the next scripted status; the last one sticks.
/// A stack with no script, or whose current entry is NONEXISTENT, is not found.
#[derive(Default)]
pub struct FakeStacks {
    state: Mutex<StacksState>,
}

#[allow(dead_code)]
impl FakeStacks {
    pub fn script(&self, stack: &str, statuses: &[&str]) {
        self.state.lock().statuses.insert(
            stack.to_string(),
            statuses.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn set_outputs(&self, stack: &str, outputs: &[(&str, &str)]) {
        self.state.lock().outputs.insert(
            stack.to_string(),
            outputs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }

    pub fn set_resource(&self, stack: &str, logical: &str, physical: &str) {
        self.state.lock().resources.insert(
            (stack.to_string(), logical.to_string()),
            physical.to_string(),
        );
    }

    pub fn set_outcome(&self, outcome: WriteOutcome) {
        self.state.lock().outcome = Some(outcome);
    }

    /// Names of the stacks written, in order.
    pub fn written(&self) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .map(|r| r.stack_name.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<StackRequest> {
        self.state.lock().requests.clone()
    }
}

#[async_trait]
impl StackOps for FakeStacks {
    async fn describe(&self, stack_name: &str) -> Result<StackDescription, StackError> {
        let mut state = self.state.lock();
        let status = match state.statuses.get_mut(stack_name) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match status {
            Some(status) if status != NONEXISTENT => Ok(StackDescription {
                status,
                outputs: state.outputs.get(stack_name).cloned().unwrap_or_default(),
            }),
            _ => Err(StackError::NotFound(stack_name.to_string())),
        }
    }

    async fn create_or_update(&self, request: &StackRequest) -> Result<WriteOutcome, StackError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        Ok(state.outcome.unwrap_or(WriteOutcome::Updated))
    }

    async fn physical_id(
        &self,
        stack_name: &str,
        logical_id: &LogicalId,
    ) -> Result<PhysicalId, StackError> {
        self.state
            .lock()
            .resources
            .get(&(stack_name.to_string(), logical_id.to_string()))
            .map(PhysicalId::new)
            .ok_or_else(|| StackError::ResourceNotFound {
                stack_name: stack_name.to_string(),
                logical_id: logical_id.to_string(),
            })
    }
}

#[derive(Default)]
struct ScalingState {
    instances: HashMap<String, Vec<String>>,
    calls: Vec<String>,
    fail_resume: bool,
}

/// Scaling service fake recording suspend/resume calls as `suspend:<group>`.
#[derive(Default)]
pub struct FakeScaling {
    state: Mutex<ScalingState>,
}

#[allow(dead_code)]
impl FakeScaling {
    pub fn set_instances(&self, group: &str, instances: &[&str]) {
        self.state.lock().instances.insert(
            group.to_string(),
            instances.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn fail_resume(&self) {
        self.state.lock().fail_resume = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl ScalingOps for FakeScaling {
    async fn in_service_instances(
        &self,
        group: &PhysicalId,
    ) -> Result<Vec<InstanceId>, ScalingError> {
        self.state
            .lock()
            .instances
            .get(group.as_str())
            .map(|ids| ids.iter().map(InstanceId::new).collect())
            .ok_or_else(|| ScalingError::GroupNotFound(group.to_string()))
    }

    async fn suspend_scheduled_actions(&self, group: &PhysicalId) -> Result<(), ScalingError> {
        self.state.lock().calls.push(format!("suspend:{group}"));
        Ok(())
    }

    async fn resume_scheduled_actions(&self, group: &PhysicalId) -> Result<(), ScalingError> {
        let mut state = self.state.lock();
        state.calls.push(format!("resume:{group}"));
        if state.fail_resume {
            return Err(ScalingError::Service("resume refused".to_string()));
        }
        Ok(())
    }
}

/// Queue fake handing out one scripted batch per poll, then nothing.
#[derive(Default)]
pub struct FakeQueue {
    batches: Mutex<HashMap<String, VecDeque<Vec<String>>>>,
}

#[allow(dead_code)]
impl FakeQueue {
    pub fn push_batch(&self, queue: &str, messages: &[&str]) {
        self.batches
            .lock()
            .entry(queue.to_string())
            .or_default()
            .push_back(messages.iter().map(|s| s.to_string()).collect());
    }
}

#[async_trait]
impl MessageSource for FakeQueue {
    async fn poll_new_messages(&self, queue: &str) -> Result<Vec<String>, QueueError> {
        Ok(self
            .batches
            .lock()
            .get_mut(queue)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }
}

/// Object store held in memory; keys map to upload times.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, DateTime<Utc>>>,
    deleted: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MemoryStore {
    /// Add objects whose upload times increase in the order given.
    pub fn seed(&self, keys: &[&str]) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut objects = self.objects.lock();
        for (i, key) in keys.iter().enumerate() {
            objects.insert(key.to_string(), start + ChronoDuration::minutes(i as i64));
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    /// Keys passed to delete, including dry runs.
    pub fn delete_calls(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, local: &Path, dest: &str) -> Result<(), StoreError> {
        if !local.exists() {
            return Err(StoreError::NotFound(local.display().to_string()));
        }
        self.objects.lock().insert(dest.to_string(), Utc::now());
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        Ok(self
            .objects
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, last_modified)| ObjectInfo {
                key: key.clone(),
                last_modified: *last_modified,
            })
            .collect())
    }

    async fn delete(&self, key: &str, dry_run: bool) -> Result<(), StoreError> {
        self.deleted.lock().push(key.to_string());
        if dry_run {
            return Ok(());
        }
        self.objects
            .lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

/// Every fake, plus a builder wired to them with fast polling.
#[allow(dead_code)]
pub struct Harness {
    pub stacks: Arc<FakeStacks>,
    pub scaling: Arc<FakeScaling>,
    pub queue: Arc<FakeQueue>,
    pub store: Arc<MemoryStore>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        init_tracing();
        Self {
            stacks: Arc::default(),
            scaling: Arc::default(),
            queue: Arc::default(),
            store: Arc::default(),
        }
    }

    pub fn clients(&self) -> Clients {
        Clients {
            stacks: self.stacks.clone(),
            scaling: self.scaling.clone(),
            messages: self.queue.clone(),
            store: self.store.clone(),
        }
    }

    /// Builder polling every millisecond, giving up on a stack after `timeout`.
    pub fn builder(&self, timeout: Duration) -> Builder {
        Builder::new(self.clients(), fast_wait(timeout), false)
    }

    /// Stack driver on its own, for checks that need its diagnostics.
    pub fn driver(&self, timeout: Duration) -> StackDriver {
        StackDriver::new(self.stacks.clone(), self.scaling.clone(), fast_wait(timeout))
    }
}

fn fast_wait(timeout: Duration) -> StackWaitConfig {
    StackWaitConfig {
        interval: Duration::from_millis(1),
        timeout,
    }
}

/// Parse a config from YAML, panicking on errors.
#[allow(dead_code)]
pub fn config(yaml: &str) -> Config {
    Config::from_yaml(yaml).unwrap()
}
