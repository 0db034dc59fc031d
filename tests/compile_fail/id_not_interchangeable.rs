// ABOUTME: Compile-fail test verifying PhysicalId and InstanceId are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use strata::types::{InstanceId, PhysicalId};

fn takes_instance_id(_id: InstanceId) {}

fn main() {
    let group = PhysicalId::new("asg-1234");
    takes_instance_id(group); // ERROR: expected InstanceId, found PhysicalId
}
