// ABOUTME: Stack deployment orchestration.
// ABOUTME: Exports the Builder entry point, its per-run state, and deploy errors.

mod builder;
mod confirm;
mod driver;
mod error;
mod message;
mod run;
mod url_check;

pub use builder::{Builder, Clients};
pub use confirm::{ConfirmationReport, DeploymentConfirmer};
pub use driver::StackDriver;
pub use error::{DeployError, ErrorCategory};
pub use message::{DeploymentMessage, MessageError};
pub use run::DeployRun;
pub use url_check::check_url;
