mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use console::ConsoleObserver;
use seminar::Role;
use seminar::client::{DisplaySurface, SeminarIdentity, SeminarSession, SessionConfig, SyntheticCapture};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seminar")]
#[command(bin_name = "seminar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },

    /// Join a seminar as a headless participant until Ctrl-C.
    Join {
        #[arg(long)]
        seminar: String,

        /// Prompted for when omitted.
        #[arg(long)]
        username: Option<String>,

        #[arg(long, default_value = "STUDENT")]
        role: Role,

        /// Base signaling URL, overrides the config file.
        #[arg(long)]
        server: Option<String>,

        /// TOML file with session settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Share a synthetic screen right after joining (instructor only).
        #[arg(long, value_enum)]
        screen: Option<SurfaceArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SurfaceArg {
    Monitor,
    Window,
    BrowserTab,
}

impl From<SurfaceArg> for DisplaySurface {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Monitor => DisplaySurface::Monitor,
            SurfaceArg::Window => DisplaySurface::Window,
            SurfaceArg::BrowserTab => DisplaySurface::BrowserTab,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind } => serve(&bind).await,
        Commands::Join {
            seminar,
            username,
            role,
            server,
            config,
            screen,
        } => {
            let mut session_config = match config {
                Some(path) => load_config(&path)?,
                None => SessionConfig::default(),
            };
            if let Some(server) = server {
                session_config.signaling_url = server;
            }

            let username = match username {
                Some(name) => name,
                None => dialoguer::Input::<String>::new()
                    .with_prompt("Username")
                    .interact_text()?,
            };

            join(
                session_config,
                SeminarIdentity::new(seminar, username, role),
                screen.map(DisplaySurface::from),
            )
            .await
        }
    }
}

async fn serve(bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    println!(
        "{} {}",
        "Seminar relay listening on".green().bold(),
        listener.local_addr()?
    );
    seminar::server::serve(listener).await?;
    Ok(())
}

async fn join(
    config: SessionConfig,
    identity: SeminarIdentity,
    screen: Option<DisplaySurface>,
) -> Result<()> {
    println!(
        "{} {} as {} ({})",
        "Joining seminar".cyan(),
        identity.seminar_id,
        identity.username.bold(),
        identity.role
    );

    let observer = Arc::new(ConsoleObserver::default());
    let session = SeminarSession::connect_rtc(
        config,
        identity,
        Arc::new(SyntheticCapture::new()),
        observer.clone(),
    )
    .await
    .context("Failed to reach the signaling server")?;

    let handle = session.handle().clone();
    handle
        .start_microphone()
        .await
        .context("Failed to start microphone")?;

    if let Some(surface) = screen {
        handle
            .start_screen_share(surface)
            .await
            .context("Failed to start screen share")?;
        println!("{}", "Sharing screen".green());
    }

    println!("{}", "Press Ctrl-C to leave".dimmed());
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.context("Failed to listen for Ctrl-C")?,
        _ = observer.lost() => println!("{}", "Signaling lost, giving up".red().bold()),
    }

    let peers = handle.peers().await.unwrap_or_default();
    session.leave().await?;
    println!("{} ({} peers closed)", "Left seminar".green().bold(), peers.len());
    Ok(())
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}
