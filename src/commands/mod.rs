// ABOUTME: Command module aggregator for the strata CLI.
// ABOUTME: Re-exports validate, layers, and artifact command handlers.

mod artifacts;
mod layers;
mod validate;

pub use artifacts::{artifact_location, clean_artifacts, publish_artifacts};
pub use layers::layers;
pub use validate::validate;
