// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to keep logical, physical, and instance IDs apart.

mod id;
mod stack_name;

pub use id::{InstanceId, LogicalId, PhysicalId};
pub use stack_name::{StackName, StackNameError};
