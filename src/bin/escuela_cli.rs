//!
//! escuela CLI binary
//! ------------------
//! Terminal client for the school-management backend. Without a command it starts
//! the interactive shell; with one (e.g. `escuela_cli status`) it runs that command
//! against the stored session and exits.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use escuela::api::{HttpBackend, SharedBackend};
use escuela::cli::{run_repl, Command, Flow, Prompter, Shell};
use escuela::config::ClientConfig;
use escuela::error::{AppError, AppResult};
use escuela::storage::{FileCredentialStore, MemoryCredentialStore, SharedCredentials};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--profile <name>] [--state-dir <path>] [--memory] [<command> ...]\n\nFlags:\n  --api <url>          Backend base URL (env ESCUELA_API_URL, default http://127.0.0.1:8000)\n  --profile <name>     Credential profile (env ESCUELA_PROFILE, default: OS user name)\n  --state-dir <path>   Where sessions are stored (env ESCUELA_STATE_DIR, default ~/.escuela)\n  --memory             Keep the session in memory only\n  -h, --help           Show this help\n\nWith no command the interactive shell starts. Commands are the shell's, e.g.\n  {program} login admin@escuela.com 123456\n  {program} students list\n  {program} logout"
    );
}

/// One-shot mode has no terminal prompts; a command that needs input fails instead.
struct NoPrompt;

impl Prompter for NoPrompt {
    fn ask(&mut self, label: &str) -> AppResult<String> {
        Err(AppError::invalid_field("input", format!("'{}' is required; run the interactive shell", label).as_str()))
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut cfg = ClientConfig::from_env()?;
    let mut rest: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" | "--profile" | "--state-dir" if i + 1 >= args.len() => {
                eprintln!("{} requires a value", args[i]);
                print_usage(&program);
                std::process::exit(2);
            }
            "--api" => { cfg = cfg.with_api_url(&args[i + 1])?; i += 2; }
            "--profile" => { cfg = cfg.with_profile(&args[i + 1]); i += 2; }
            "--state-dir" => { cfg = cfg.with_state_dir(&args[i + 1]); i += 2; }
            "--memory" => { cfg = cfg.ephemeral(true); i += 1; }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            _ => {
                rest = args[i..].to_vec();
                break;
            }
        }
    }

    let store: SharedCredentials = if cfg.ephemeral {
        MemoryCredentialStore::shared()
    } else {
        Arc::new(
            FileCredentialStore::open(&cfg.state_dir, &cfg.profile)
                .with_context(|| format!("failed to open credential store in {}", cfg.state_dir.display()))?,
        )
    };
    let backend: SharedBackend = Arc::new(HttpBackend::new(cfg.api_url.clone())?);
    info!(target: "escuela", "escuela_cli: api={} profile={} ephemeral={}", cfg.api_url, cfg.profile, cfg.ephemeral);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let mut shell = Shell::new(backend, store);
    if rest.is_empty() {
        return run_repl(&rt, &mut shell);
    }

    let cmd: Command = match rest.join(" ").parse() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.message());
            print_usage(&program);
            std::process::exit(2);
        }
    };
    match rt.block_on(shell.execute(cmd, &mut NoPrompt)) {
        Ok(Flow::Continue) | Ok(Flow::Quit) => Ok(()),
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            std::process::exit(1);
        }
    }
}
