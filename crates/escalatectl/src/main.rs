//! escalatectl - inspect become option resolution and escalated commands.
//!
//! ## Usage
//!
//! ```bash
//! # Show the option schema of the devel-su method
//! escalatectl options
//!
//! # Resolve options from the environment, ansible.cfg and host vars
//! escalatectl resolve --var ansible_become_flags=-p --vars-file host_vars/phone.yml
//!
//! # Print the escalated command line
//! escalatectl build -- id -u
//!
//! # Classify a chunk of escalation output
//! printf 'Password: ' | escalatectl classify
//! ```

use std::collections::HashMap;
use std::env;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use escalate::devel_su;
use escalate::method::OPT_PASS;
use escalate::sources::{discover_ini_path, load_host_vars, parse_assignment};
use escalate::{
    BecomeRegistry, CommandSpec, IniConfig, OptionSources, PosixShell,
    PromptClassification, resolve_option_with_origin, shell_quote,
};
use log::LevelFilter;
use serde::Serialize;
use tracing::debug;

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.common);

    let registry = BecomeRegistry::with_builtins();
    let out = Output {
        json: cli.common.json,
    };

    match cli.command {
        Command::Options { method } => handle_options(&registry, &method, out),
        Command::Resolve(cmd) => handle_resolve(&registry, cmd, out),
        Command::Build(cmd) => handle_build(&registry, cmd, out),
        Command::Classify(cmd) => handle_classify(&registry, cmd, out),
        Command::Methods => handle_methods(&registry, out),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Inspect become option resolution and escalated commands.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    debug: bool,
    /// Enable trace logging (overrides other levels)
    #[arg(long, global = true)]
    trace: bool,
    /// Output machine readable JSON
    #[arg(long, global = true)]
    json: bool,
    /// Disable ANSI colors in output
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    /// Control color output (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the option schema of a become method
    Options {
        /// Become method name
        #[arg(long, default_value = devel_su::NAME)]
        method: String,
    },
    /// Resolve option values and report where they came from
    Resolve(ResolveCommand),
    /// Print the escalated command line
    Build(BuildCommand),
    /// Classify escalation output read from stdin
    Classify(ClassifyCommand),
    /// List registered become methods
    Methods,
}

#[derive(Debug, Clone, Args)]
struct SourceOpts {
    /// Become method name
    #[arg(long, default_value = devel_su::NAME)]
    method: String,
    /// Ini file to read (default: ANSIBLE_CONFIG, ./ansible.cfg, ~/.ansible.cfg, /etc/ansible/ansible.cfg)
    #[arg(long, value_name = "PATH", conflicts_with = "no_ini")]
    ini: Option<PathBuf>,
    /// Do not read any ini file
    #[arg(long = "no-ini")]
    no_ini: bool,
    /// Host variable assignment (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,
    /// YAML or JSON file of host variables
    #[arg(long = "vars-file", value_name = "PATH")]
    vars_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ResolveCommand {
    #[command(flatten)]
    sources: SourceOpts,
}

#[derive(Debug, Clone, Args)]
struct BuildCommand {
    #[command(flatten)]
    sources: SourceOpts,
    /// Shell used to run the wrapped command
    #[arg(long, default_value = "/bin/sh")]
    shell: String,
    /// Quote the command without the success marker wrapper
    #[arg(long)]
    raw: bool,
    /// Command to escalate
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(Debug, Clone, Args)]
struct ClassifyCommand {
    /// Become method name
    #[arg(long, default_value = devel_su::NAME)]
    method: String,
    /// Classify this text instead of stdin
    #[arg(long)]
    text: Option<String>,
}

fn init_logging(common: &CommonOpts) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    if common.quiet {
        log::set_max_level(LevelFilter::Off);
        return;
    }

    let level = match effective_log_level(common) {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("escalate={level},escalatectl={level}")));

    if common.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()
            .ok();
    } else {
        let force_color =
            matches!(common.color, ColorOption::Always) || env::var_os("FORCE_COLOR").is_some();
        let disable_color = common.no_color
            || matches!(common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some()
            || (!force_color && !io::stderr().is_terminal());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(!disable_color)
                    .with_target(false),
            )
            .try_init()
            .ok();
    }
}

fn effective_log_level(common: &CommonOpts) -> LevelFilter {
    if common.trace {
        LevelFilter::Trace
    } else if common.debug {
        LevelFilter::Debug
    } else {
        match common.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("serializing output")?;
        println!("{text}");
        Ok(())
    }
}

fn load_sources(opts: &SourceOpts) -> Result<OptionSources> {
    let mut sources = OptionSources::from_process_env();

    let ini_path = if opts.no_ini {
        None
    } else {
        opts.ini
            .clone()
            .or_else(|| discover_ini_path(&sources.environment))
    };
    if let Some(path) = ini_path {
        debug!("reading ini configuration {}", path.display());
        let ini = IniConfig::from_path(&path)
            .with_context(|| format!("loading ini file {}", path.display()))?;
        sources = sources.with_ini(ini);
    }

    let mut host_vars = HashMap::new();
    if let Some(ref path) = opts.vars_file {
        host_vars = load_host_vars(path)
            .with_context(|| format!("loading host variables from {}", path.display()))?;
    }
    for assignment in &opts.vars {
        let (key, value) = parse_assignment(assignment)?;
        host_vars.insert(key, value);
    }

    Ok(sources.with_host_vars(host_vars))
}

fn handle_methods(registry: &BecomeRegistry, out: Output) -> Result<()> {
    let names: Vec<&str> = registry.names().collect();
    if out.json {
        return out.emit(&names);
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn handle_options(registry: &BecomeRegistry, name: &str, out: Output) -> Result<()> {
    let method = registry.create(name)?;
    if out.json {
        return out.emit(&method.options());
    }

    for option in method.options() {
        println!("{}", option.name);
        println!("  {}", option.description);
        match option.default {
            Some(default) => println!("  default: {default:?}"),
            None => println!("  default: (none)"),
        }
        if option.required {
            println!("  required");
        }
        for source in option.sources {
            println!("  - {source}");
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ResolvedView {
    name: &'static str,
    value: Option<String>,
    origin: Option<String>,
}

fn handle_resolve(registry: &BecomeRegistry, cmd: ResolveCommand, out: Output) -> Result<()> {
    let method = registry.create(&cmd.sources.method)?;
    let sources = load_sources(&cmd.sources)?;

    let mut views = Vec::new();
    for option in method.options() {
        let resolved = resolve_option_with_origin(option, &sources)?;
        let (value, origin) = match resolved {
            Some(resolved) if option.name == OPT_PASS => {
                (Some("********".to_string()), Some(resolved.origin.to_string()))
            }
            Some(resolved) => (Some(resolved.value), Some(resolved.origin.to_string())),
            None => (None, None),
        };
        views.push(ResolvedView {
            name: option.name,
            value,
            origin,
        });
    }

    if out.json {
        return out.emit(&views);
    }
    for view in views {
        match (view.value, view.origin) {
            (Some(value), Some(origin)) => println!("{} = {value:?} ({origin})", view.name),
            _ => println!("{} is unset", view.name),
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct BuildView {
    command: String,
    expects_prompt: bool,
    success_marker: Option<String>,
}

fn handle_build(registry: &BecomeRegistry, cmd: BuildCommand, out: Output) -> Result<()> {
    let mut method = registry.create(&cmd.sources.method)?;
    let sources = load_sources(&cmd.sources)?;
    let spec = CommandSpec::resolve(method.as_ref(), &sources)?;
    debug!("resolved {spec:?}");

    let user_command = cmd
        .command
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ");

    let built = if cmd.raw {
        method.build_command(&user_command, &|c: &str| shell_quote(c), &spec)
    } else {
        method.build_command(&user_command, &PosixShell::new(cmd.shell), &spec)
    };

    let view = BuildView {
        command: built,
        expects_prompt: method.expects_prompt(),
        success_marker: if cmd.raw {
            None
        } else {
            method.success_marker().map(str::to_string)
        },
    };

    if out.json {
        return out.emit(&view);
    }
    println!("{}", view.command);
    if view.expects_prompt {
        eprintln!("expects password prompt");
    }
    Ok(())
}

fn handle_classify(registry: &BecomeRegistry, cmd: ClassifyCommand, out: Output) -> Result<()> {
    let method = registry.create(&cmd.method)?;
    let bytes = match cmd.text {
        Some(text) => text.into_bytes(),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("reading output from stdin")?;
            buf
        }
    };

    let classification = method.classify_output(&bytes);
    if out.json {
        return out.emit(&classification);
    }
    let label = match classification {
        PromptClassification::PasswordPrompt => "password-prompt",
        PromptClassification::Failure => "failure (password incorrect)",
        PromptClassification::Missing => "missing (no password given)",
        PromptClassification::Unrecognized => "unrecognized",
    };
    println!("{label}");
    Ok(())
}
