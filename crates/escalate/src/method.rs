//! The contract every become method implements, and the resolved command spec.

use std::fmt;

use crate::error::{BecomeError, BecomeResult};
use crate::options::{OptionSpec, resolve_option_with_origin};
use crate::prompt::{PromptClassification, PromptMarkers};
use crate::shell::{ShellWrap, output_has_marker};
use crate::sources::OptionSources;

/// Option name of the escalation executable.
pub const OPT_EXE: &str = "become_exe";
/// Option name of the extra flags.
pub const OPT_FLAGS: &str = "become_flags";
/// Option name of the escalation password.
pub const OPT_PASS: &str = "become_pass";

/// A privilege-escalation method the host can drive.
///
/// Instances are created per escalation attempt through the registry; building a
/// command mutates per-attempt state (prompt expectation, success marker), so an
/// instance must not be shared across concurrent attempts.
pub trait BecomeMethod: Send {
    /// Stable registry name.
    fn name(&self) -> &'static str;

    /// Option schema, consumed by the host's resolver.
    fn options(&self) -> &'static [OptionSpec];

    /// Prompt and failure markers recognized in the method's output.
    fn markers(&self) -> PromptMarkers;

    /// Wrap `command` for escalation.
    fn build_command(&mut self, command: &str, shell: &dyn ShellWrap, spec: &CommandSpec)
    -> String;

    /// Whether the host must wait for an interactive prompt before proceeding.
    fn expects_prompt(&self) -> bool;

    /// Marker emitted by the most recently built command, if any.
    fn success_marker(&self) -> Option<&str>;

    fn check_password_prompt(&self, output: &[u8]) -> bool {
        self.markers().is_prompt(output)
    }

    fn check_incorrect_password(&self, output: &[u8]) -> bool {
        self.markers().is_failure(output)
    }

    fn check_missing_password(&self, output: &[u8]) -> bool {
        self.markers().is_missing(output)
    }

    fn classify_output(&self, output: &[u8]) -> PromptClassification {
        self.markers().classify(output)
    }

    /// Whether `output` shows the wrapped command started running.
    fn check_success(&self, output: &[u8]) -> bool {
        self.success_marker()
            .is_some_and(|marker| output_has_marker(output, marker))
    }

    /// Look up one option of the schema by name.
    fn option(&self, name: &str) -> Option<&'static OptionSpec> {
        self.options().iter().find(|opt| opt.name == name)
    }
}

/// The resolved executable, flags and password for one escalation attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub executable: String,
    pub flags: String,
    pub password: Option<String>,
}

impl CommandSpec {
    pub fn new(executable: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            flags: flags.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Resolve the executable, flags and password options of `method`.
    pub fn resolve(method: &dyn BecomeMethod, sources: &OptionSources) -> BecomeResult<Self> {
        let resolve = |name: &str| -> BecomeResult<Option<String>> {
            match method.option(name) {
                Some(option) => {
                    Ok(resolve_option_with_origin(option, sources)?.map(|resolved| resolved.value))
                }
                None => Ok(None),
            }
        };

        let executable = resolve(OPT_EXE)?.ok_or_else(|| BecomeError::Configuration {
            option: OPT_EXE.to_string(),
        })?;
        let flags = resolve(OPT_FLAGS)?.unwrap_or_default();
        let password = resolve(OPT_PASS)?;

        Ok(Self {
            executable,
            flags,
            password,
        })
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("executable", &self.executable)
            .field("flags", &self.flags)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let spec = CommandSpec::new("devel-su", "").with_password("hunter2");
        let rendered = format!("{spec:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_debug_without_password() {
        let rendered = format!("{:?}", CommandSpec::new("devel-su", "-p"));
        assert!(rendered.contains("password: None"));
    }
}
