use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hwc::core::telemetry::init_tracing_with;
use hwc::server::{self, AppState};
use hwc::{build_registry, dispatch_path, render, HwcConfig, SystemRunner};

/// Hardware capabilities as JSON: lscpu, lspci, lsusb, lshw and /proc/cpuinfo
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// TOML config file (default: ./hwc.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the HTTP service
    Serve {
        /// Override `server.bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Dispatch one path in-process and print the result
    Query {
        /// Request path, e.g. /hal/hwc/lsusb
        path: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        json_pretty: bool,
    },
    /// List route fragments in priority order
    Routes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HwcConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing_with(&config.log);

    let reg = build_registry(&config);
    let runner = SystemRunner::new(config.runner.timeout_ms);

    match cli.command {
        Cmd::Routes => {
            for (fragment, name, command) in reg.list_routes() {
                println!("{}\t{}\t{}", fragment, name, command);
            }
        }
        Cmd::Query { path, json_pretty } => match dispatch_path(&reg, &runner, &path) {
            Ok(value) => println!("{}", render(&value, json_pretty)),
            Err(fault) => {
                println!("{}", render(&fault.to_json(), json_pretty));
                std::process::exit(1);
            }
        },
        Cmd::Serve { bind } => {
            let addr = match bind {
                Some(addr) => addr,
                None => config.bind_addr()?,
            };
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting async runtime")?;
            rt.block_on(server::serve(addr, AppState::new(reg, runner)))
                .with_context(|| format!("serving on {}", addr))?;
        }
    }
    Ok(())
}
