// Copyright 2026 Navatlas Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use navatlas::capture::FsArtifactWriter;
use navatlas::config::Config;
use navatlas::connect;
use navatlas::host::{self, DetachedHost};
use navatlas::sink;
use navatlas::traverse::{self, Traversal};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "navatlas",
    about = "Navatlas — map and capture a desktop app's embedded category menu",
    version
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to a JSON config file overriding the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and traverse the whole menu, capturing every leaf
    Run {
        /// Candidate CDP debug ports, overriding the configured list
        #[arg(long)]
        ports: Vec<u16>,
        /// Number of full connection sweeps before giving up
        #[arg(long)]
        retries: Option<u32>,
        /// Output file for the discovered tree and results
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory for captured screenshots
        #[arg(long)]
        screenshot_dir: Option<String>,
        /// Skip the initial full-page screenshot
        #[arg(long)]
        no_initial_screenshot: bool,
    },
    /// Drive one named path and capture a single artifact
    Probe {
        /// Top-level entry text (e.g. "3D模型")
        entry: String,
        /// Category title (e.g. "沙发")
        category: String,
        /// First-level item text (e.g. "全部")
        first: String,
        /// Second-level item text, when probing a two-deep leaf
        #[arg(long)]
        second: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "navatlas=debug"
    } else {
        "navatlas=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse().context("bad log directive")?),
        )
        .init();

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Run {
            ports,
            retries,
            out,
            screenshot_dir,
            no_initial_screenshot,
        } => {
            if !ports.is_empty() {
                cfg.cdp_ports = ports;
            }
            if let Some(retries) = retries {
                cfg.connection_retries = retries;
            }
            if let Some(out) = out {
                cfg.output_file = out.display().to_string();
            }
            if let Some(dir) = screenshot_dir {
                cfg.screenshot_dir = dir;
            }
            if no_initial_screenshot {
                cfg.initial_screenshot = false;
            }
            run(&cfg).await
        }
        Commands::Probe {
            entry,
            category,
            first,
            second,
        } => probe(&cfg, &entry, &category, &first, second.as_deref()).await,
    }
}

async fn run(cfg: &Config) -> Result<()> {
    host::ensure_online(&DetachedHost).context("host application not ready")?;
    let page = connect::resolve(cfg)
        .await
        .context("no usable CDP endpoint")?;
    let writer = FsArtifactWriter::new(&cfg.screenshot_dir);

    let output = Traversal::new(&page, &writer, cfg).run().await;
    let summary = sink::write_report(Path::new(&cfg.output_file), &output)?;

    println!("entries:            {}", summary.entries);
    println!("categories:         {}", summary.categories);
    println!("first-level items:  {}", summary.first_level_items);
    println!("second-level items: {}", summary.second_level_items);
    println!("leaves visited:     {}", summary.leaves_visited);
    println!(
        "captures:           {} ok, {} failed",
        summary.captures_ok, summary.captures_failed
    );
    Ok(())
}

async fn probe(
    cfg: &Config,
    entry: &str,
    category: &str,
    first: &str,
    second: Option<&str>,
) -> Result<()> {
    host::ensure_online(&DetachedHost).context("host application not ready")?;
    let page = connect::resolve(cfg)
        .await
        .context("no usable CDP endpoint")?;
    let writer = FsArtifactWriter::new(&cfg.screenshot_dir);

    let result = traverse::probe_path(&page, &writer, cfg, entry, category, first, second)
        .await
        .context("probe failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
