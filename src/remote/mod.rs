// ABOUTME: Capability traits for the external services a deployment talks to.
// ABOUTME: Defines StackOps, ScalingOps, ObjectStore, MessageSource, plus a filesystem store.

mod local_store;
mod messages;
mod object_store;
mod scaling;
mod shared_types;
mod stack;

pub use local_store::LocalStore;
pub use messages::{MessageSource, QueueError};
pub use object_store::{ObjectStore, StoreError};
pub use scaling::{ScalingError, ScalingOps};
pub use shared_types::*;
pub use stack::{StackError, StackOps};
