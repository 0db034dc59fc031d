// ABOUTME: Named-placeholder string templates used for paths and messages.
// ABOUTME: Expands {NAME} from an environment map; {{ and }} are literal braces.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{template}' references unknown variable '{name}'")]
    UnknownVariable { template: String, name: String },

    #[error("template '{template}' has an unterminated placeholder")]
    Unterminated { template: String },

    #[error("template '{template}' has an unmatched '}}'")]
    UnmatchedClose { template: String },
}

/// Expand `{NAME}` placeholders in `template` using `env`.
pub fn interpolate(template: &str, env: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(TemplateError::Unterminated {
                                template: template.to_string(),
                            });
                        }
                    }
                }
                let value = env
                    .get(name.trim())
                    .ok_or_else(|| TemplateError::UnknownVariable {
                        template: template.to_string(),
                        name: name.trim().to_string(),
                    })?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(TemplateError::UnmatchedClose {
                    template: template.to_string(),
                });
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
