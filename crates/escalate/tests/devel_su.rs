//! End-to-end resolution and command building for the devel-su method.

use std::collections::HashMap;
use std::io::Write;

use escalate::{
    BecomeMethod, BecomeRegistry, CommandSpec, DevelSu, IniConfig, OptionSources, Origin,
    PosixShell, PromptClassification, SourceRef, resolve_option, resolve_option_with_origin,
};

const INI: &str = "[privilege_escalation]\nbecome_exe = /opt/ini/devel-su\n";

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn become_exe() -> &'static escalate::OptionSpec {
    DevelSu::new().option("become_exe").unwrap()
}

#[test]
fn test_become_exe_from_env_only() {
    let env = vars(&[("ANSIBLE_BECOME_EXE", "/opt/env/devel-su")]);
    let value = resolve_option(become_exe(), &env, &HashMap::new(), &IniConfig::empty()).unwrap();
    assert_eq!(value.as_deref(), Some("/opt/env/devel-su"));
}

#[test]
fn test_become_exe_from_ini_only() {
    let ini = IniConfig::parse(INI).unwrap();
    let value = resolve_option(become_exe(), &HashMap::new(), &HashMap::new(), &ini).unwrap();
    assert_eq!(value.as_deref(), Some("/opt/ini/devel-su"));
}

#[test]
fn test_become_exe_env_beats_ini() {
    let env = vars(&[("ANSIBLE_DEVELSU_EXE", "/opt/env/devel-su")]);
    let ini = IniConfig::parse(INI).unwrap();
    let value = resolve_option(become_exe(), &env, &HashMap::new(), &ini).unwrap();
    assert_eq!(value.as_deref(), Some("/opt/env/devel-su"));
}

#[test]
fn test_become_exe_default() {
    let value = resolve_option(
        become_exe(),
        &HashMap::new(),
        &HashMap::new(),
        &IniConfig::empty(),
    )
    .unwrap();
    assert_eq!(value.as_deref(), Some("devel-su"));
}

#[test]
fn test_env_order_within_option() {
    let env = vars(&[
        ("ANSIBLE_BECOME_EXE", "/first"),
        ("ANSIBLE_DEVELSU_EXE", "/second"),
    ]);
    let value = resolve_option(become_exe(), &env, &HashMap::new(), &IniConfig::empty()).unwrap();
    assert_eq!(value.as_deref(), Some("/first"));
}

#[test]
fn test_host_var_beats_env_and_ini() {
    let sources = OptionSources::new(
        vars(&[("ANSIBLE_BECOME_EXE", "/opt/env/devel-su")]),
        vars(&[("ansible_develsu_exe", "/opt/var/devel-su")]),
        IniConfig::parse(INI).unwrap(),
    );
    let resolved = resolve_option_with_origin(become_exe(), &sources)
        .unwrap()
        .unwrap();
    assert_eq!(resolved.value, "/opt/var/devel-su");
    assert_eq!(
        resolved.origin,
        Origin::Source(SourceRef::var("ansible_develsu_exe"))
    );
}

#[test]
fn test_command_spec_resolution() {
    let mut ini_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        ini_file,
        "[develsu_become_plugin]\nflags = -p\npassword = from-ini"
    )
    .unwrap();

    let sources = OptionSources::default()
        .with_ini(IniConfig::from_path(ini_file.path()).unwrap())
        .with_host_vars(vars(&[("ansible_become_password", "from-var")]));
    let method = DevelSu::new();
    let spec = CommandSpec::resolve(&method, &sources).unwrap();

    assert_eq!(spec.executable, "devel-su");
    assert_eq!(spec.flags, "-p");
    assert_eq!(spec.password.as_deref(), Some("from-var"));
}

#[test]
fn test_password_defaults_to_none() {
    let spec = CommandSpec::resolve(&DevelSu::new(), &OptionSources::default()).unwrap();
    assert_eq!(spec, CommandSpec::new("devel-su", ""));
}

#[test]
fn test_registry_round_trip_through_host_loop() {
    let registry = BecomeRegistry::with_builtins();
    let mut method = registry.create("community.general.devel_su").unwrap();
    let sources = OptionSources::new(
        vars(&[("ANSIBLE_BECOME_FLAGS", "-p")]),
        HashMap::new(),
        IniConfig::empty(),
    );
    let spec = CommandSpec::resolve(method.as_ref(), &sources).unwrap();
    let cmd = method.build_command("id -u", &PosixShell::default(), &spec);

    let marker = method.success_marker().unwrap().to_string();
    assert_eq!(cmd, format!("devel-su -p /bin/sh -c 'echo {marker} ; id -u'"));
    assert!(method.expects_prompt());

    assert_eq!(
        method.classify_output(b"Password: "),
        PromptClassification::PasswordPrompt
    );
    assert!(method.check_success(format!("\n{marker}\n0\n").as_bytes()));
}
