mod commands;

use clap::Parser;
use commands::exit_code_for;
use fwsync_core::Synchronizer;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "fwsync",
    version,
    about = "Update per-device OTA manifests from firmware, SPIFFS, and config artifacts"
)]
struct Cli {
    /// Repository root containing firmware/, spiffs/, and config/.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// TOML file with url_base, schema_url, and chip settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL artifacts are served from (overrides the config file).
    #[arg(long)]
    url_base: Option<String>,

    /// Report what would change without writing any manifest.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Output the sync report as structured JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false)]
    trace: bool,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("FWSYNC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let result = commands::resolve_config(
        &cli.root,
        cli.config.as_deref(),
        cli.url_base.as_deref(),
    )
    .and_then(|config| {
        let sync = Synchronizer::new(config);
        commands::sync::run(&sync, cli.dry_run, cli.json)
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}
