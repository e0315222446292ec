//! voltree: browse a server's container volumes from the command line.
//!
//! Volumes are described by a RON config (see `BrowserConfig`) and served
//! from their host directories.
//!
//! ```bash
//! voltree ls /                      # mount roots and the directories above them
//! voltree ls /data --depth 2 --json
//! voltree zip /data/world --out ~/backups
//! voltree mkdir /data/backups
//! voltree mv /data/old.txt /data/new.txt
//! voltree rm /data/new.txt
//! voltree put ./ops.json /config/ops.json
//! ```

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::Instrument;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use voltree_browser::{BrowserConfig, DirectorySink, FileBrowser, LocalRemote};

/// Browse, edit and download a server's container volumes.
#[derive(Parser, Debug)]
#[command(name = "voltree")]
#[command(about = "Virtual file browser over container volume mounts")]
struct Args {
    /// Browser config (RON). Defaults to the user config dir.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Listing depth (defaults to the configured fetch depth)
        #[arg(short, long)]
        depth: Option<u32>,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a directory tree as `<name>.zip`
    Zip {
        path: String,
        /// Directory the archive is written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Rename or move an entry
    Mv { from: String, to: String },
    /// Delete a file or directory tree
    Rm { path: String },
    /// Upload a local file
    Put { local: PathBuf, path: String },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Ls { .. } => "ls",
            Command::Zip { .. } => "zip",
            Command::Mkdir { .. } => "mkdir",
            Command::Mv { .. } => "mv",
            Command::Rm { .. } => "rm",
            Command::Put { .. } => "put",
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("voltree").join("browser.ron"))
}

fn load_config(path: Option<PathBuf>) -> Result<BrowserConfig> {
    let path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => bail!("no config dir on this platform; pass --config"),
    };
    BrowserConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(feature = "telemetry")]
    let _otel_guard = if voltree_telemetry::otel_enabled() {
        let (otel_layer, guard) = voltree_telemetry::otel_layer("voltree")?;
        registry.with(otel_layer).init();
        Some(guard)
    } else {
        registry.init();
        None
    };
    #[cfg(not(feature = "telemetry"))]
    registry.init();

    let args = Args::parse();
    let mut config = load_config(args.config)?;

    if let Command::Ls {
        depth: Some(depth), ..
    } = &args.command
    {
        if *depth == 0 {
            bail!("--depth must be at least 1");
        }
        config.fetch_depth = *depth;
    }

    let remote = Arc::new(LocalRemote::new(&config.mounts));
    let browser = FileBrowser::open(&config, remote);

    let span = tracing::info_span!("browser.command", command = args.command.name());
    let result = run(&browser, args.command).instrument(span).await;
    browser.close();
    result
}

async fn run(browser: &FileBrowser, command: Command) -> Result<()> {
    match command {
        Command::Ls { path, json, .. } => {
            browser.set_current_path(&path).await;
            if let Some(error) = browser.error() {
                bail!("{error}: {}", browser.current_path());
            }

            let objects = browser.objects();
            if json {
                println!("{}", serde_json::to_string_pretty(&objects)?);
            } else {
                print!("{}", render::listing_text(&objects));
            }
        }
        Command::Zip { path, out } => {
            tokio::fs::create_dir_all(&out)
                .await
                .with_context(|| format!("creating {}", out.display()))?;
            let sink = DirectorySink::new(&out);

            let summary = browser
                .zip_and_download(&path, &sink, |done, total| {
                    eprint!("{}", render::progress_line(done, total));
                })
                .await?;
            if summary.files > 0 {
                eprintln!();
            }
            println!(
                "{} ({} files, {} bytes)",
                sink.target(&summary.file_name).display(),
                summary.files,
                summary.archive_size
            );
        }
        Command::Mkdir { path } => browser.create_directory(&path).await?,
        Command::Mv { from, to } => browser.rename(&from, &to).await?,
        Command::Rm { path } => browser.delete(&path).await?,
        Command::Put { local, path } => {
            let data = tokio::fs::read(&local)
                .await
                .with_context(|| format!("reading {}", local.display()))?;
            browser.upload(&path, &data).await?;
            tracing::info!(%path, bytes = data.len(), "uploaded");
        }
    }
    Ok(())
}
