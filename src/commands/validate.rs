// ABOUTME: Validate command implementation.
// ABOUTME: Offline checks of every stack's environment, template, and parameters.

use strata::artifacts::find_missing_build_env;
use strata::config::{Config, Stack};
use strata::error::{Error, Result};
use strata::output::Output;

/// Check every stack and report all problems, not just the first.
pub fn validate(config: &Config, output: &Output) -> Result<()> {
    let mut problems = 0;

    for stack in config.stacks.values() {
        output.progress(&format!("  → Checking {}...", stack.name));
        for problem in check_stack(stack) {
            problems += 1;
            output.item(&format!("{}: {}", stack.name, problem), &problem);
        }
    }

    if problems > 0 {
        return Err(Error::InvalidConfig(format!(
            "{problems} problem(s) across {} stack(s)",
            config.stacks.len()
        )));
    }

    output.success(&format!("{} stack(s) valid", config.stacks.len()));
    Ok(())
}

fn check_stack(stack: &Stack) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(e) = stack.find_missing_env() {
        problems.push(e.to_string());
    }
    if let Err(e) = find_missing_build_env(stack) {
        problems.push(format!("artifacts: {e}"));
    }
    if let Err(e) = stack.template_document() {
        problems.push(e.to_string());
    }
    if let Err(e) = stack.params_file() {
        problems.push(e.to_string());
    }

    problems
}
