use crate::classify;
use crate::config::{AppConfig, RecognitionRules};
use crate::discovery::{self, CancelToken, DiscoveryMessage, DiscoveryOutcome};
use crate::planner::{self, ImportMode, ImportPlan, WizardContext};
use crate::session::ResolverSession;
use crate::validator::{ConfirmOverwrite, ValidationError};
use anyhow::{bail, Result};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

enum CliAction {
    Help,
    Version,
    Run {
        command: CliCommand,
        path: String,
        options: CommonOptions,
    },
}

#[derive(Clone, Copy)]
enum CliCommand {
    Classify,
    Discover,
    Plan,
    Validate,
}

struct CommonOptions {
    format: OutputFormat,
    markers: Vec<String>,
    extensions: Vec<String>,
    into: Option<PathBuf>,
    location_dir: Option<PathBuf>,
    name: Option<String>,
    location: Option<PathBuf>,
    extract_to: Option<PathBuf>,
    assume_yes: bool,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            markers: Vec::new(),
            extensions: Vec::new(),
            into: None,
            location_dir: None,
            name: None,
            location: None,
            extract_to: None,
            assume_yes: false,
        }
    }
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        CliAction::Help => {
            print_help();
            Ok(())
        }
        CliAction::Version => {
            println!("stevedore v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliAction::Run {
            command,
            path,
            options,
        } => run_command(command, &path, options),
    }
}

fn parse_args(args: &[String]) -> Result<CliAction> {
    let Some(first) = args.first() else {
        return Ok(CliAction::Help);
    };
    match first.as_str() {
        "--help" | "-h" | "help" => return Ok(CliAction::Help),
        "--version" | "-V" | "version" => return Ok(CliAction::Version),
        _ => {}
    }

    let command = match first.as_str() {
        "classify" => CliCommand::Classify,
        "discover" => CliCommand::Discover,
        "plan" => CliCommand::Plan,
        "validate" => CliCommand::Validate,
        other => bail!("unknown command: {other} (see `stevedore help`)"),
    };

    let mut options = CommonOptions::default();
    let mut path: Option<String> = None;
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" => {
                let Some(value) = iter.next() else {
                    bail!("--format requires a value (text or json)");
                };
                let Some(format) = OutputFormat::parse(value) else {
                    bail!("unknown format: {value}");
                };
                options.format = format;
            }
            "--marker" => {
                let Some(value) = iter.next() else {
                    bail!("--marker requires a file name");
                };
                options.markers.push(value.clone());
            }
            "--ext" => {
                let Some(value) = iter.next() else {
                    bail!("--ext requires an extension");
                };
                options.extensions.push(value.trim_start_matches('.').to_string());
            }
            "--into" => {
                let Some(value) = iter.next() else {
                    bail!("--into requires a directory");
                };
                options.into = Some(PathBuf::from(value));
            }
            "--location-dir" => {
                let Some(value) = iter.next() else {
                    bail!("--location-dir requires a directory");
                };
                options.location_dir = Some(PathBuf::from(value));
            }
            "--name" => {
                let Some(value) = iter.next() else {
                    bail!("--name requires a value");
                };
                options.name = Some(value.clone());
            }
            "--location" => {
                let Some(value) = iter.next() else {
                    bail!("--location requires a directory");
                };
                options.location = Some(PathBuf::from(value));
            }
            "--extract-to" => {
                let Some(value) = iter.next() else {
                    bail!("--extract-to requires a directory");
                };
                options.extract_to = Some(PathBuf::from(value));
            }
            "--yes" | "-y" => options.assume_yes = true,
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => {
                if path.is_some() {
                    bail!("unexpected argument: {other}");
                }
                path = Some(other.to_string());
            }
        }
    }

    let Some(path) = path else {
        bail!("missing <path> argument");
    };
    Ok(CliAction::Run {
        command,
        path,
        options,
    })
}

fn run_command(command: CliCommand, path: &str, options: CommonOptions) -> Result<()> {
    let config = AppConfig::load_or_create()?;
    let mut rules = config.rules.clone();
    if !options.markers.is_empty() {
        rules.project_markers = options.markers.clone();
    }
    if !options.extensions.is_empty() {
        rules.archive_extensions = options.extensions.clone();
    }

    match command {
        CliCommand::Classify => {
            let kind = classify::classify(path, &rules);
            match options.format {
                OutputFormat::Text => println!("{}", kind.label()),
                OutputFormat::Json => print_json(&ClassifyReport {
                    path,
                    kind: kind.label(),
                })?,
            }
            Ok(())
        }
        CliCommand::Discover => {
            let show_progress = options.format == OutputFormat::Text;
            let rx = discovery::spawn_discovery(
                PathBuf::from(path),
                rules.clone(),
                CancelToken::new(),
            );
            let mut report = DiscoverReport {
                roots: Vec::new(),
                cancelled: false,
            };
            let mut progress_shown = false;
            for message in rx {
                match message {
                    DiscoveryMessage::Progress { visited } => {
                        if show_progress {
                            eprint!("\rscanned {visited} entries");
                            progress_shown = true;
                        }
                    }
                    DiscoveryMessage::Completed { roots } => {
                        report.roots = roots;
                        break;
                    }
                    DiscoveryMessage::Cancelled => {
                        report.cancelled = true;
                        break;
                    }
                }
            }
            if progress_shown {
                eprintln!();
            }
            match options.format {
                OutputFormat::Text => {
                    if report.cancelled {
                        println!("scan cancelled");
                    } else if report.roots.is_empty() {
                        println!("no projects found");
                    } else {
                        for root in &report.roots {
                            println!("{}", root.display());
                        }
                    }
                }
                OutputFormat::Json => print_json(&report)?,
            }
            Ok(())
        }
        CliCommand::Plan => {
            let session = resolve_session(path, &options, rules);
            print_plan(&session, options.format)
        }
        CliCommand::Validate => {
            let mut session = resolve_session(path, &options, rules);
            if let Some(name) = &options.name {
                session.set_suggested_name(name);
            }
            if let Some(location) = &options.location {
                session.set_suggested_location(location.clone());
            }
            if let Some(extract_to) = &options.extract_to {
                session.set_extraction_path(extract_to.clone());
            }

            let interactive = !options.assume_yes && config.confirm_overwrite;
            let result = if interactive {
                session.validate(&PromptConfirm)
            } else {
                session.validate(&AutoConfirm)
            };
            report_validation(result, options.format)
        }
    }
}

fn resolve_session(path: &str, options: &CommonOptions, rules: RecognitionRules) -> ResolverSession {
    let mode = if options.into.is_some() {
        ImportMode::ImportIntoExisting
    } else {
        ImportMode::CreateNewProject
    };
    let context = WizardContext {
        project_base_dir: options.into.clone(),
        project_file_dir: options.location_dir.clone(),
    };
    let mut session = ResolverSession::new(rules, mode, context);
    session.set_source_path(path);
    session.wait_for_scan();
    session
}

fn print_plan(session: &ResolverSession, format: OutputFormat) -> Result<()> {
    let kind = session.kind();
    let plan = session.plan();
    match format {
        OutputFormat::Json => print_json(&PlanReport {
            kind: kind.label(),
            mode: mode_label(session.mode()),
            plan,
        })?,
        OutputFormat::Text => {
            println!("kind: {}", kind.label());
            println!("mode: {}", mode_label(session.mode()));
            if session.discovery() == Some(&DiscoveryOutcome::Cancelled) {
                println!("scan cancelled");
            }
            if let Some(name) = &plan.suggested_name {
                println!("suggested name: {name}");
            }
            if let Some(location) = &plan.suggested_location {
                println!("suggested location: {}", location.display());
            }
            if let Some(extraction) = &plan.extraction_path {
                println!("extraction path: {}", extraction.display());
            }
            if planner::extract_to_subfolder_applicable(kind, session.mode()) {
                println!("extract to subfolder: {}", plan.extract_to_subfolder);
            }
            if !plan.project_roots.is_empty() {
                println!("project roots:");
                for root in &plan.project_roots {
                    println!("  {}", root.display());
                }
            }
        }
    }
    Ok(())
}

fn report_validation(result: Result<(), ValidationError>, format: OutputFormat) -> Result<()> {
    match result {
        Ok(()) => {
            match format {
                OutputFormat::Text => println!("ready to import"),
                OutputFormat::Json => print_json(&ValidateReport {
                    ready: true,
                    title: None,
                    message: None,
                })?,
            }
            Ok(())
        }
        Err(err) if err.is_user_abort() => {
            match format {
                OutputFormat::Text => println!("not ready: {err}"),
                OutputFormat::Json => print_json(&ValidateReport {
                    ready: false,
                    title: Some(err.title()),
                    message: Some(err.to_string()),
                })?,
            }
            Ok(())
        }
        Err(err) => bail!("{}: {err}", err.title()),
    }
}

fn mode_label(mode: ImportMode) -> &'static str {
    match mode {
        ImportMode::CreateNewProject => "Create New Project",
        ImportMode::ImportIntoExisting => "Import Into Existing",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct AutoConfirm;

impl ConfirmOverwrite for AutoConfirm {
    fn confirm_overwrite(&self, _dir: &Path) -> bool {
        true
    }
}

struct PromptConfirm;

impl ConfirmOverwrite for PromptConfirm {
    fn confirm_overwrite(&self, dir: &Path) -> bool {
        print!(
            "Folder {} is not empty. Import into it anyway? [y/N] ",
            dir.display()
        );
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes" | "YES")
    }
}

#[derive(Serialize)]
struct ClassifyReport<'a> {
    path: &'a str,
    kind: &'static str,
}

#[derive(Serialize)]
struct DiscoverReport {
    roots: Vec<PathBuf>,
    cancelled: bool,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    kind: &'static str,
    mode: &'static str,
    plan: &'a ImportPlan,
}

#[derive(Serialize)]
struct ValidateReport {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn print_help() {
    println!("stevedore v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Resolve a directory or project archive into a validated import plan.");
    println!();
    println!("USAGE:");
    println!("  stevedore <command> <path> [options]");
    println!();
    println!("COMMANDS:");
    println!("  classify   Report what kind of import source the path is");
    println!("  discover   List project roots under a directory");
    println!("  plan       Derive the import plan for the path");
    println!("  validate   Check that the derived plan is ready to commit");
    println!();
    println!("OPTIONS:");
    println!("  --into <dir>          Import into an existing project based at <dir>");
    println!("  --location-dir <dir>  Default directory for new-project locations");
    println!("  --name <name>         Override the suggested project name");
    println!("  --location <dir>      Override the suggested project location");
    println!("  --extract-to <dir>    Override the archive extraction directory");
    println!("  --marker <file>       Project marker file name (repeatable)");
    println!("  --ext <ext>           Recognized archive extension (repeatable)");
    println!("  --format <fmt>        Output format: text (default) or json");
    println!("  --yes, -y             Confirm overwrite prompts automatically");
}
