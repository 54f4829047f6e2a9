//! Lookup sources for option resolution: environment, host variables, ini.

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use log::debug;
use serde_yaml::Value as YamlValue;

use crate::error::{BecomeError, BecomeResult};
use crate::options::SourceRef;

/// Environment variable naming an explicit ini file.
pub const CONFIG_ENV_VAR: &str = "ANSIBLE_CONFIG";

/// File name searched for in the working directory.
const LOCAL_CONFIG_NAME: &str = "ansible.cfg";

/// File name searched for in the home directory.
const HOME_CONFIG_NAME: &str = ".ansible.cfg";

/// System-wide fallback.
const SYSTEM_CONFIG_PATH: &str = "/etc/ansible/ansible.cfg";

/// Ini-style configuration, addressed by section and key.
///
/// Values are kept verbatim: no backslash escapes and no quote stripping, so a
/// password or Windows path reads back exactly as written.
#[derive(Debug, Clone)]
pub struct IniConfig {
    inner: Ini,
}

impl Default for IniConfig {
    fn default() -> Self {
        Self { inner: Ini::new() }
    }
}

fn verbatim() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

impl IniConfig {
    /// A configuration with no sections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse ini text held in memory.
    pub fn parse(text: &str) -> BecomeResult<Self> {
        let inner = Ini::load_from_str_opt(text, verbatim())?;
        Ok(Self { inner })
    }

    /// Load an ini file from disk.
    pub fn from_path(path: &Path) -> BecomeResult<Self> {
        debug!("loading ini configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Look up `key` in `section`. Missing sections and keys yield `None`.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.inner.get_from(Some(section), key).map(str::to_string)
    }
}

/// Locate the ini file the host would read, in priority order:
///
/// 1. `ANSIBLE_CONFIG` (a file, or a directory containing `ansible.cfg`)
/// 2. `./ansible.cfg`, unless the working directory is world-writable
/// 3. `~/.ansible.cfg`
/// 4. `/etc/ansible/ansible.cfg`
pub fn discover_ini_path(environment: &HashMap<String, String>) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(explicit) = environment.get(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(shellexpand::tilde(explicit).into_owned());
        if path.is_dir() {
            candidates.push(path.join(LOCAL_CONFIG_NAME));
        } else {
            candidates.push(path);
        }
    }
    if let Some(local) = env::current_dir().ok().and_then(|cwd| local_candidate(&cwd)) {
        candidates.push(local);
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(HOME_CONFIG_NAME));
    }
    candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));

    candidates.into_iter().find(|path| path.is_file())
}

/// `ansible.cfg` inside `dir`, or `None` when anyone could have planted it there.
fn local_candidate(dir: &Path) -> Option<PathBuf> {
    if is_world_writable(dir) {
        debug!(
            "ignoring {} in world-writable directory {}",
            LOCAL_CONFIG_NAME,
            dir.display()
        );
        return None;
    }
    Some(dir.join(LOCAL_CONFIG_NAME))
}

#[cfg(unix)]
fn is_world_writable(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(dir)
        .map(|meta| meta.permissions().mode() & 0o002 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_world_writable(_dir: &Path) -> bool {
    false
}

/// Keep only variables whose name and value are valid UTF-8.
fn utf8_vars<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// The three lookup collaborators bundled together.
#[derive(Debug, Clone, Default)]
pub struct OptionSources {
    pub environment: HashMap<String, String>,
    pub host_vars: HashMap<String, String>,
    pub ini: IniConfig,
}

impl OptionSources {
    pub fn new(
        environment: HashMap<String, String>,
        host_vars: HashMap<String, String>,
        ini: IniConfig,
    ) -> Self {
        Self {
            environment,
            host_vars,
            ini,
        }
    }

    /// Snapshot the current process environment, with no host vars or ini.
    /// Variables that are not valid UTF-8 cannot name an option and are skipped.
    pub fn from_process_env() -> Self {
        Self {
            environment: utf8_vars(env::vars_os()),
            ..Self::default()
        }
    }

    pub fn with_host_vars(mut self, host_vars: HashMap<String, String>) -> Self {
        self.host_vars = host_vars;
        self
    }

    pub fn with_ini(mut self, ini: IniConfig) -> Self {
        self.ini = ini;
        self
    }

    /// Read a single source.
    pub fn lookup(&self, source: &SourceRef) -> Option<String> {
        match *source {
            SourceRef::EnvVar { name } => self.environment.get(name).cloned(),
            SourceRef::HostVar { name } => self.host_vars.get(name).cloned(),
            SourceRef::IniKey { section, key } => self.ini.get(section, key),
        }
    }
}

/// Parse a `KEY=VALUE` assignment. The value may be empty and may contain `=`.
pub fn parse_assignment(text: &str) -> BecomeResult<(String, String)> {
    match text.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(BecomeError::InvalidAssignment(text.to_string())),
    }
}

/// Load host variables from a YAML (or JSON) mapping.
///
/// Only scalar values are kept; nested structures cannot name an option value.
pub fn load_host_vars(path: &Path) -> BecomeResult<HashMap<String, String>> {
    let text = fs::read_to_string(path)?;
    let parsed: YamlValue = serde_yaml::from_str(&text).map_err(|e| BecomeError::HostVars {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mapping = match parsed {
        YamlValue::Mapping(mapping) => mapping,
        YamlValue::Null => return Ok(HashMap::new()),
        _ => {
            return Err(BecomeError::HostVars {
                path: path.to_path_buf(),
                message: "top level must be a mapping".to_string(),
            });
        }
    };

    let mut vars = HashMap::new();
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            debug!("skipping non-scalar host variable key in {}", path.display());
            continue;
        };
        match scalar_to_string(&value) {
            Some(value) => {
                vars.insert(key, value);
            }
            None => debug!("skipping non-scalar host variable {key}"),
        }
    }
    Ok(vars)
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Tagged(tagged) => scalar_to_string(&tagged.value),
        YamlValue::Null | YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}
