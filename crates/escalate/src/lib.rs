//! Privilege-escalation ("become") providers for configuration-management agents.
//!
//! A become method turns a user command into the command line that runs it as
//! another user, and tells the host how to read the escalation tool's output:
//!
//! ```text
//! OptionSources (host vars > env > ini > default)
//!        |
//!        v
//!   CommandSpec --> BecomeMethod::build_command --> "devel-su <flags> /bin/sh -c '...'"
//!                          |
//!                          +--> expects_prompt / classify_output / check_success
//! ```
//!
//! The host owns process execution, the prompt loop and timeouts. Methods are
//! looked up by name in a [`BecomeRegistry`] and instantiated once per attempt.

pub mod devel_su;
pub mod error;
pub mod method;
pub mod options;
pub mod prompt;
pub mod registry;
pub mod shell;
pub mod sources;

pub use devel_su::DevelSu;
pub use error::{BecomeError, BecomeResult};
pub use method::{BecomeMethod, CommandSpec};
pub use options::{OptionSpec, Origin, Resolved, SourceRef, resolve_option, resolve_option_with_origin};
pub use prompt::PromptClassification;
pub use registry::{BecomeRegistry, MethodFactory};
pub use shell::{PosixShell, ShellWrap, shell_quote};
pub use sources::{IniConfig, OptionSources};
