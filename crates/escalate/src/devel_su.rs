//! `devel-su` become method (Sailfish OS).
//!
//! Runs commands as root through the `devel-su` utility. The utility always
//! prints a password prompt, so every built command expects one.

use log::debug;

use crate::method::{BecomeMethod, CommandSpec};
use crate::options::{OptionSpec, SourceRef};
use crate::prompt::PromptMarkers;
use crate::shell::{ShellWrap, new_success_marker};

/// Registry name of this method.
pub const NAME: &str = "community.general.devel_su";

/// Default executable.
pub const DEFAULT_EXE: &str = "devel-su";

// Not localized by devel-su.
const MARKERS: PromptMarkers = PromptMarkers {
    prompt_prefix: b"Password:",
    fail: &["Password incorrect"],
    missing: &["No password given"],
};

static OPTIONS: [OptionSpec; 3] = [
    OptionSpec {
        name: "become_exe",
        description: "devel-su executable",
        default: Some(DEFAULT_EXE),
        required: false,
        sources: &[
            SourceRef::var("ansible_become_exe"),
            SourceRef::var("ansible_develsu_exe"),
            SourceRef::env("ANSIBLE_BECOME_EXE"),
            SourceRef::env("ANSIBLE_DEVELSU_EXE"),
            SourceRef::ini("privilege_escalation", "become_exe"),
            SourceRef::ini("develsu_become_plugin", "executable"),
        ],
    },
    OptionSpec {
        name: "become_flags",
        description: "Options to pass to devel-su",
        default: Some(""),
        required: false,
        sources: &[
            SourceRef::var("ansible_become_flags"),
            SourceRef::var("ansible_develsu_flags"),
            SourceRef::env("ANSIBLE_BECOME_FLAGS"),
            SourceRef::env("ANSIBLE_DEVELSU_FLAGS"),
            SourceRef::ini("privilege_escalation", "become_flags"),
            SourceRef::ini("develsu_become_plugin", "flags"),
        ],
    },
    OptionSpec {
        name: "become_pass",
        description: "devel-su password",
        default: None,
        required: false,
        sources: &[
            SourceRef::var("ansible_develsu_pass"),
            SourceRef::var("ansible_become_pass"),
            SourceRef::var("ansible_become_password"),
            SourceRef::env("ANSIBLE_BECOME_PASS"),
            SourceRef::env("ANSIBLE_DEVELSU_PASS"),
            SourceRef::ini("develsu_become_plugin", "password"),
        ],
    },
];

/// Per-attempt `devel-su` command builder.
#[derive(Debug, Default)]
pub struct DevelSu {
    prompt: bool,
    success: Option<String>,
}

impl DevelSu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry factory.
    pub fn boxed() -> Box<dyn BecomeMethod> {
        Box::new(Self::new())
    }
}

impl BecomeMethod for DevelSu {
    fn name(&self) -> &'static str {
        NAME
    }

    fn options(&self) -> &'static [OptionSpec] {
        &OPTIONS
    }

    fn markers(&self) -> PromptMarkers {
        MARKERS
    }

    fn build_command(
        &mut self,
        command: &str,
        shell: &dyn ShellWrap,
        spec: &CommandSpec,
    ) -> String {
        // The host times out waiting for escalation unless told a prompt is coming.
        self.prompt = true;
        let marker = self.success.insert(new_success_marker());

        if command.is_empty() {
            return command.to_string();
        }

        // Empty flags leave a double space; kept so the command text stays stable.
        let built = format!(
            "{} {} {}",
            spec.executable,
            spec.flags,
            shell.wrap(command, marker)
        );
        debug!(
            "built {} command with {} (password {})",
            NAME,
            spec.executable,
            if spec.password.is_some() { "set" } else { "unset" }
        );
        built
    }

    fn expects_prompt(&self) -> bool {
        self.prompt
    }

    fn success_marker(&self) -> Option<&str> {
        self.success.as_deref()
    }
}
