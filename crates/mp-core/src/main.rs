//! mp-import - forward analytics events to Mixpanel from the command line
//!
//! Commands:
//! - `track`: send one live event
//! - `import`: send one event with an explicit time
//! - `import-batch`: send a file of historical events in batches
//! - `config show`: print the resolved configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use mp_common::{EventTime, StructuredError};
use mp_config::{load_config, ConfigOptions};
use mp_core::exit_codes::ExitCode;
use mp_core::input::{parse_property, properties_from_pairs, read_events};
use mp_core::logging::{generate_run_id, init_logging, LogConfig, LogFlags, LogFormat, LogLevel};
use mp_core::{BatchReport, ImportOptions, Mixpanel, RecordingTransport, RequestError};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, info_span};

/// Forward analytics events to Mixpanel
#[derive(Parser)]
#[command(name = "mp-import")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project token (overrides MIXPANEL_TOKEN and the config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API key for the import endpoint (overrides MIXPANEL_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Tracking service host (overrides MIXPANEL_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Log level (overrides MP_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (overrides MP_LOG_FORMAT)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Omit timestamps from human log lines
    #[arg(long, global = true)]
    no_log_timestamps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Human,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a live event
    Track(TrackArgs),

    /// Import one event that happened at a given time
    Import(ImportArgs),

    /// Import a file of historical events in batches
    ImportBatch(ImportBatchArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct TrackArgs {
    /// Event name
    event: String,

    /// Event property as key=value (repeatable; values parse as JSON when possible)
    #[arg(short = 'p', long = "prop", value_parser = parse_property)]
    props: Vec<(String, Value)>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Event name
    event: String,

    /// Event time: Unix seconds or an RFC 3339 date-time
    #[arg(short, long)]
    time: EventTime,

    /// Event property as key=value (repeatable)
    #[arg(short = 'p', long = "prop", value_parser = parse_property)]
    props: Vec<(String, Value)>,
}

#[derive(Args, Debug)]
struct ImportBatchArgs {
    /// JSON array or JSON Lines file of events (`-` for stdin)
    file: PathBuf,

    /// Events per request (capped at 50)
    #[arg(long)]
    max_batch_size: Option<usize>,

    /// Requests in flight at once
    #[arg(long)]
    max_concurrent_requests: Option<usize>,

    /// Validate and plan the batches without sending anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration (credentials masked)
    Show,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(LogFlags {
        level: cli.global.log_level,
        format: cli.global.log_format,
        verbose: cli.global.verbose,
        quiet: cli.global.quiet,
    })
    .with_timestamps(!cli.global.no_log_timestamps);
    init_logging(&log_config);

    let run_id = generate_run_id();
    let span = info_span!("run", run_id = %run_id);
    let _entered = span.enter();

    let exit_code = match &cli.command {
        Commands::Track(args) => run_track(&cli.global, args),
        Commands::Import(args) => run_import(&cli.global, args),
        Commands::ImportBatch(args) => run_import_batch(&cli.global, args),
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
        },
    };

    if exit_code.is_error() {
        debug!(exit_code = %exit_code, "run failed");
    } else {
        debug!(exit_code = %exit_code, "run finished");
    }
    std::process::exit(exit_code.as_i32());
}

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        config_path: global.config.clone(),
        token: global.token.clone(),
        api_key: global.api_key.clone(),
        host: global.host.clone(),
    }
}

/// Build a client from the resolved config; `dry_run` swaps in a recording transport.
fn build_client(
    global: &GlobalOpts,
    dry_run: bool,
) -> Result<(Mixpanel, Option<Arc<RecordingTransport>>), ExitCode> {
    let resolved = match load_config(&config_options(global)) {
        Ok(resolved) => resolved,
        Err(err) => {
            output_failure(global, ExitCode::ConfigError, "Configuration Error", &err.to_string(), None);
            return Err(ExitCode::ConfigError);
        }
    };
    info!(source = %resolved.source, host = %resolved.config.host, "configuration loaded");

    let config = resolved.config;
    let token = match config.token.clone() {
        Some(token) => token,
        None => {
            output_error(global, &mp_common::Error::MissingToken);
            return Err(ExitCode::ConfigError);
        }
    };

    let built = if dry_run {
        let recorder = Arc::new(RecordingTransport::new());
        Mixpanel::with_transport(token, config, recorder.clone()).map(|client| (client, Some(recorder)))
    } else {
        Mixpanel::init(token, config).map(|client| (client, None))
    };

    built.map_err(|err| {
        output_error(global, &err);
        ExitCode::for_error(&err)
    })
}

fn run_track(global: &GlobalOpts, args: &TrackArgs) -> ExitCode {
    let client = match build_client(global, false) {
        Ok((client, _)) => client,
        Err(code) => return code,
    };
    let properties = properties_from_pairs(args.props.clone());
    let result = client.track(&args.event, properties);
    output_single(global, "/track", &args.event, None, result)
}

fn run_import(global: &GlobalOpts, args: &ImportArgs) -> ExitCode {
    let client = match build_client(global, false) {
        Ok((client, _)) => client,
        Err(code) => return code,
    };
    let properties = properties_from_pairs(args.props.clone());
    let result = client.import(&args.event, args.time, properties);
    output_single(global, "/track", &args.event, Some(args.time), result)
}

fn run_import_batch(global: &GlobalOpts, args: &ImportBatchArgs) -> ExitCode {
    let events = match read_events(&args.file) {
        Ok(events) => events,
        Err(err) => {
            output_error(global, &err);
            return ExitCode::for_error(&err);
        }
    };
    info!(file = %args.file.display(), events = events.len(), "read events");

    let (client, recorder) = match build_client(global, args.dry_run) {
        Ok(built) => built,
        Err(code) => return code,
    };

    let options = ImportOptions {
        max_batch_size: args.max_batch_size,
        max_concurrent_requests: args.max_concurrent_requests,
    };

    let report = match client.import_batch(events, &options) {
        Ok(report) => report,
        Err(err) => {
            output_error(global, &err);
            return ExitCode::for_error(&err);
        }
    };

    let requests: Option<Vec<Value>> = recorder.map(|recorder| {
        recorder
            .requests()
            .iter()
            .map(|request| {
                json!({
                    "endpoint": request.endpoint.path(),
                    "events": request.event_count(),
                })
            })
            .collect()
    });

    if let Err(code) = output_batch_report(global, &report, args.dry_run, requests) {
        return code;
    }

    if report.is_success() {
        ExitCode::Clean
    } else {
        ExitCode::PartialFail
    }
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let resolved = match load_config(&config_options(global)) {
        Ok(resolved) => resolved,
        Err(err) => {
            output_failure(global, ExitCode::ConfigError, "Configuration Error", &err.to_string(), None);
            return ExitCode::ConfigError;
        }
    };

    let config = resolved.config.redacted();
    match global.format {
        OutputFormat::Json => {
            let config_value = match to_json_value(&config) {
                Ok(value) => value,
                Err(code) => return code,
            };
            print_json(&json!({
                "source": resolved.source.to_string(),
                "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                "base_url": config.base_url(),
                "config": config_value,
            }));
        }
        OutputFormat::Human => {
            println!("Source:   {}", resolved.source);
            if let Some(path) = &resolved.path {
                println!("Path:     {}", path.display());
            }
            println!("Endpoint: {}", config.base_url());
            println!("Token:    {}", config.token.as_deref().unwrap_or("(unset)"));
            println!("API key:  {}", config.api_key.as_deref().unwrap_or("(unset)"));
            println!("Verbose:  {}", config.verbose);
            println!("Test:     {}", config.test);
            println!("Timeout:  {}s", config.timeout_secs);
        }
    }
    ExitCode::Clean
}

// ============================================================================
// Output helpers
// ============================================================================

/// Convert a result type for JSON output; failure is an internal error.
fn to_json_value<T: Serialize>(value: &T) -> Result<Value, ExitCode> {
    serde_json::to_value(value).map_err(|err| {
        error!(error = %err, "failed to serialize output");
        ExitCode::InternalError
    })
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => error!(error = %err, "failed to serialize output"),
    }
}

fn output_single(
    global: &GlobalOpts,
    endpoint: &str,
    event: &str,
    time: Option<EventTime>,
    result: Result<(), RequestError>,
) -> ExitCode {
    let (status, error, code) = match &result {
        Ok(()) => ("ok", None, ExitCode::Clean),
        Err(err) => ("error", Some(err.to_string()), ExitCode::PartialFail),
    };

    match global.format {
        OutputFormat::Json => print_json(&json!({
            "status": status,
            "endpoint": endpoint,
            "event": event,
            "time": time.map(|t| t.unix_seconds()),
            "error": error,
        })),
        OutputFormat::Human => match &error {
            None => println!("✓ sent '{}' to {}", event, endpoint),
            Some(reason) => eprintln!("✗ '{}' was not accepted: {}", event, reason),
        },
    }
    code
}

fn output_batch_report(
    global: &GlobalOpts,
    report: &BatchReport,
    dry_run: bool,
    requests: Option<Vec<Value>>,
) -> Result<(), ExitCode> {
    match global.format {
        OutputFormat::Json => {
            let mut output = json!({
                "status": if report.is_success() { "ok" } else { "partial" },
                "dry_run": dry_run,
                "report": to_json_value(report)?,
            });
            if let Some(requests) = requests {
                output["requests"] = Value::Array(requests);
            }
            print_json(&output);
        }
        OutputFormat::Human => {
            let verb = if dry_run { "planned" } else { "sent" };
            println!(
                "{} {} events in {} requests of up to {} ({} rounds)",
                verb,
                report.events,
                report.requests,
                report.plan.batch_size,
                report.plan.round_count()
            );
            for failure in &report.errors {
                eprintln!(
                    "✗ batch {} ({} events): {}",
                    failure.batch_index, failure.event_count, failure.error
                );
            }
        }
    }
    Ok(())
}

fn output_error(global: &GlobalOpts, err: &mp_common::Error) {
    let structured = StructuredError::from(err);
    let message = structured.message.clone();
    output_failure(
        global,
        ExitCode::for_error(err),
        err.headline(),
        &message,
        Some((structured, err.remediation())),
    );
}

fn output_failure(
    global: &GlobalOpts,
    code: ExitCode,
    headline: &str,
    message: &str,
    structured: Option<(StructuredError, &str)>,
) {
    error!(exit_code = code.as_i32(), "{}", message);
    match global.format {
        OutputFormat::Json => {
            let error = match &structured {
                Some((structured, _)) => serde_json::to_value(structured).unwrap_or(Value::Null),
                None => json!({ "message": message }),
            };
            print_json(&json!({
                "status": "error",
                "exit_code": code.code_name(),
                "error": error,
            }));
        }
        OutputFormat::Human => {
            eprintln!("✗ {}", headline);
            eprintln!("  Reason: {}", message);
            if let Some((_, fix)) = structured {
                eprintln!("  Fix: {}", fix);
            }
        }
    }
}
