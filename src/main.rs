use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rankstats::adapter::InMemoryDirectory;
use rankstats::app::config::Config;
use rankstats::app::App;
use rankstats::domain::SubjectId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{error, info};

/// Resolve group statistics placeholders read from stdin.
///
/// Each input line is `<identifier>` or `<subject> <identifier>`; the
/// resolved value is printed on its own line.
#[derive(Debug, Parser)]
#[command(name = "rankstats", version, about)]
struct Args {
    /// Configuration file. Defaults apply if it does not exist.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory snapshot (TOML) to serve.
    #[arg(short, long)]
    directory: PathBuf,

    /// Subject used for lines without one.
    #[arg(short, long)]
    subject: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!("rankstats starting");

    let directory = match InMemoryDirectory::load(&args.directory)
        .with_context(|| format!("loading directory snapshot {}", args.directory.display()))
    {
        Ok(d) => d,
        Err(e) => {
            error!(error = ?e, "Fatal error");
            std::process::exit(1);
        }
    };

    let app = App::start(&config, Arc::new(directory));
    let default_subject = args.subject.map(SubjectId::from);

    tokio::select! {
        result = serve_stdin(&app, default_subject.as_ref()) => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    app.shutdown().await;
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    if !args.config.exists() {
        return Ok(Config::default());
    }
    Config::load(&args.config).with_context(|| format!("reading {}", args.config.display()))
}

async fn serve_stdin(app: &App, default_subject: Option<&SubjectId>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (subject, identifier) = match line.split_once(char::is_whitespace) {
            Some((subject, identifier)) => (Some(SubjectId::from(subject)), identifier.trim()),
            None => (default_subject.cloned(), line),
        };

        let rendered = app
            .resolve(subject.as_ref(), identifier)
            .unwrap_or_else(|| format!("unknown placeholder: {identifier}"));
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
