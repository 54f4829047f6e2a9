//! Shell quoting and success-marker wrapping of escalated commands.
//!
//! The host decides how a command is wrapped before it is handed to the become
//! executable. The wrapper echoes a per-attempt success marker first so the host
//! can tell "escalation succeeded and the command ran" apart from escalation
//! failures that never reach the shell.

use rand::Rng;

use crate::prompt::contains;

/// Prefix of every success marker.
pub const SUCCESS_PREFIX: &str = "BECOME-SUCCESS-";

const SUCCESS_ID_LEN: usize = 32;

/// Wraps a user command so its execution can be detected by the host.
pub trait ShellWrap {
    /// Wrap `command`; `success_marker` is the token the wrapper should emit
    /// before running it.
    fn wrap(&self, command: &str, success_marker: &str) -> String;
}

/// Any plain quoting function can act as a wrapper; it ignores the marker.
impl<F> ShellWrap for F
where
    F: Fn(&str) -> String,
{
    fn wrap(&self, command: &str, _success_marker: &str) -> String {
        self(command)
    }
}

/// Wrapper for POSIX `sh`-family shells.
///
/// Produces `<executable> -c '<echo marker ; command>'`, or just the quoted
/// string when no executable is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixShell {
    pub executable: Option<String>,
}

impl Default for PosixShell {
    fn default() -> Self {
        Self {
            executable: Some("/bin/sh".to_string()),
        }
    }
}

impl PosixShell {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: Some(executable.into()),
        }
    }

    /// A wrapper that quotes but does not re-invoke a shell.
    pub fn without_executable() -> Self {
        Self { executable: None }
    }
}

impl ShellWrap for PosixShell {
    fn wrap(&self, command: &str, success_marker: &str) -> String {
        if command.is_empty() || success_marker.is_empty() {
            return command.to_string();
        }
        let quoted = shell_quote(&format!("echo {success_marker} ; {command}"));
        match self.executable.as_deref().filter(|exe| !exe.is_empty()) {
            Some(exe) => format!("{exe} -c {quoted}"),
            None => quoted,
        }
    }
}

/// Quote a string for a POSIX shell.
///
/// Strings made only of word characters and `@%+=:,./-` are returned as is;
/// everything else is single-quoted with embedded quotes escaped as `'"'"'`.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.bytes().all(|b| {
        matches!(b,
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' |
            b'_' | b'@' | b'%' | b'+' | b'=' | b':' | b',' | b'.' | b'/' | b'-'
        )
    }) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\"'\"'");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

/// Generate a fresh `BECOME-SUCCESS-<32 lowercase letters>` marker.
pub fn new_success_marker() -> String {
    let mut rng = rand::rng();
    let id: String = (0..SUCCESS_ID_LEN)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect();
    format!("{SUCCESS_PREFIX}{id}")
}

/// Whether any line of `output` contains `marker`. Both `\n` and `\r` end a
/// line, and the marker may share its line with a leftover prompt.
pub fn output_has_marker(output: &[u8], marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    output
        .split(|b| matches!(b, b'\n' | b'\r'))
        .any(|line| contains(line, marker.as_bytes()))
}
