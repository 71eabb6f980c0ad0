//! API credential resolution.
//!
//! Precedence: explicit value (CLI flag, which clap already backs with the
//! environment and `.env`), then an interactive prompt when allowed. Blank
//! values count as missing.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{AnalysisError, AppError};

pub const SERPAPI_ENV: &str = "SERPAPI_KEY";
pub const OPENAI_ENV: &str = "OPENAI_API_KEY";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub serpapi_key: String,
    pub openai_key: String,
}

// Keys never reach logs or error output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("serpapi_key", &"<redacted>")
            .field("openai_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve both keys from already-collected values.
    pub fn resolve(serpapi_key: Option<String>, openai_key: Option<String>) -> Result<Self, AnalysisError> {
        let serpapi_key = non_blank(serpapi_key).ok_or(AnalysisError::CredentialMissing {
            name: "SerpApi key",
            flag: "serpapi-key",
            env_var: SERPAPI_ENV,
        })?;
        let openai_key = non_blank(openai_key).ok_or(AnalysisError::CredentialMissing {
            name: "OpenAI API key",
            flag: "openai-key",
            env_var: OPENAI_ENV,
        })?;
        Ok(Self { serpapi_key, openai_key })
    }

    /// Like [`Credentials::resolve`], but asks on the terminal for whatever is missing.
    pub fn resolve_interactive(
        serpapi_key: Option<String>,
        openai_key: Option<String>,
    ) -> Result<Self, AppError> {
        let serpapi_key = match non_blank(serpapi_key) {
            Some(k) => Some(k),
            None => prompt_for_key("SerpApi key")?,
        };
        let openai_key = match non_blank(openai_key) {
            Some(k) => Some(k),
            None => prompt_for_key("OpenAI API key")?,
        };
        Ok(Self::resolve(serpapi_key, openai_key)?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read one line from stdin. Returns `None` when stdin is not a terminal or the line is empty.
fn prompt_for_key(label: &str) -> Result<Option<String>, AppError> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }

    eprint!("{label} (leave blank to cancel): ");
    io::stderr()
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

    Ok(non_blank(Some(input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_requires_both_keys() {
        let creds = Credentials::resolve(Some("s".into()), Some("o".into())).unwrap();
        assert_eq!(creds.serpapi_key, "s");
        assert_eq!(creds.openai_key, "o");

        let err = Credentials::resolve(None, Some("o".into())).unwrap_err();
        assert!(matches!(err, AnalysisError::CredentialMissing { env_var: SERPAPI_ENV, .. }));

        let err = Credentials::resolve(Some("s".into()), None).unwrap_err();
        assert!(matches!(err, AnalysisError::CredentialMissing { env_var: OPENAI_ENV, .. }));
    }

    #[test]
    fn blank_keys_count_as_missing_and_values_are_trimmed() {
        let err = Credentials::resolve(Some("   ".into()), Some("o".into())).unwrap_err();
        assert!(matches!(err, AnalysisError::CredentialMissing { .. }));

        let creds = Credentials::resolve(Some(" s \n".into()), Some("o".into())).unwrap();
        assert_eq!(creds.serpapi_key, "s");
    }

    #[test]
    fn debug_output_redacts_keys() {
        let creds = Credentials::resolve(Some("sk-serp".into()), Some("sk-open".into())).unwrap();
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("sk-serp"));
        assert!(!dbg.contains("sk-open"));
    }
}
