//!
//! contextvault server binary
//! --------------------------
//! Command-line entry point for the context vault HTTP server. Configuration
//! comes from defaults, an optional JSON file, `CONTEXTVAULT_*` environment
//! variables and finally CLI flags.

use anyhow::{Context, Result};
use std::env;

use contextvault::VaultConfig;

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            return args.get(i + 1).map(|s| s.as_str());
        }
        i += 1;
    }
    None
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match arg_value(args, flag) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("invalid value for {}: '{}'", flag, v)),
        None => Ok(None),
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

const HELP: &str = "contextvault Server

USAGE:
  contextvault_server [--config PATH] [--http-port N] [--history-capacity N]
                      [--idle-ttl-secs N] [--sweep-interval-secs N]
                      [--resolver-url URL] [--sessions-file PATH]

OPTIONS:
  --config PATH              JSON config file (env: CONTEXTVAULT_CONFIG)
  --http-port N              HTTP API port (env: CONTEXTVAULT_HTTP_PORT, default 8001)
  --history-capacity N       Audit events retained (env: CONTEXTVAULT_HISTORY_CAPACITY, default 100)
  --idle-ttl-secs N          Idle eviction window (env: CONTEXTVAULT_IDLE_TTL_SECS, default 86400)
  --sweep-interval-secs N    Background sweep interval, 0 disables (env: CONTEXTVAULT_SWEEP_INTERVAL_SECS, default 300)
  --resolver-url URL         Remote identity resolver endpoint (env: CONTEXTVAULT_RESOLVER_URL)
  --sessions-file PATH       JSON session table for local resolution (env: CONTEXTVAULT_SESSIONS_FILE)
  --open-privileged          Let any authenticated identity run privileged operations
";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", HELP);
        return Ok(());
    }

    // File from the CLI wins over the environment-named file.
    let mut cfg = match arg_value(&args, "--config") {
        Some(path) => {
            let mut c = VaultConfig::load_file(path).with_context(|| format!("While loading --config {}", path))?;
            c.apply_env()?;
            c
        }
        None => VaultConfig::from_env()?,
    };

    // CLI arguments override environment
    if let Some(p) = parse_arg::<u16>(&args, "--http-port")? { cfg.http_port = p; }
    if let Some(n) = parse_arg::<usize>(&args, "--history-capacity")? { cfg.history_capacity = n; }
    if let Some(n) = parse_arg::<u64>(&args, "--idle-ttl-secs")? { cfg.idle_ttl_secs = n; }
    if let Some(n) = parse_arg::<u64>(&args, "--sweep-interval-secs")? { cfg.sweep_interval_secs = n; }
    if let Some(u) = arg_value(&args, "--resolver-url") { cfg.resolver_url = Some(u.to_string()); }
    if let Some(p) = arg_value(&args, "--sessions-file") { cfg.sessions_file = Some(p.to_string()); }
    if has_flag(&args, "--open-privileged") { cfg.open_privileged = true; }

    tracing::info!(
        "contextvault using http={}:{}, history_capacity={}, idle_ttl_secs={}",
        cfg.bind_address, cfg.http_port, cfg.history_capacity, cfg.idle_ttl_secs
    );
    contextvault::server::run_with_config(cfg).await
}
