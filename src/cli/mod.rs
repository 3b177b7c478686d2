//! Command-line interface for dashver.
//!
//! Without arguments the CLI walks through an interactive rollback. `--list`
//! and `--apply` cover scripted use; subcommands export, report the current
//! version, show configuration, or start the HTTP API.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig};
use crate::core::{select_by_position, Orchestrator};
use crate::domain::Revision;
use crate::http_server::{ApiState, HttpServer};

/// dashver - GitOps version manager for Grafana dashboards
#[derive(Parser, Debug)]
#[command(name = "dashver")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// List tagged dashboard versions, one "<hash> <message>" per line
    #[arg(long, conflicts_with = "apply")]
    pub list: bool,

    /// Roll back to a version tag (e.g. v3) or revision hash without prompting
    #[arg(long, value_name = "REVISION_OR_TAG")]
    pub apply: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the live dashboard and commit it if it changed
    Export,

    /// Print the current version pointer
    Current,

    /// Start the HTTP API
    Serve {
        /// Address to bind to (overrides DASHVER_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides DASHVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match (self.command, self.list, self.apply) {
            (Some(Commands::Config), _, _) => show_config(cfg),
            (Some(Commands::Serve { host, port }), _, _) => serve(cfg, host, port).await,
            (Some(Commands::Export), _, _) => export(&orchestrator(cfg)?).await,
            (Some(Commands::Current), _, _) => show_current(&orchestrator(cfg)?),
            (None, true, _) => list_versions(&orchestrator(cfg)?, &mut io::stdout()).await,
            (None, false, Some(version)) => {
                apply(&orchestrator(cfg)?, &version, &mut io::stdout()).await
            }
            (None, false, None) => {
                let input = io::BufReader::new(io::stdin());
                interactive(&orchestrator(cfg)?, input, &mut io::stdout()).await
            }
        }
    }
}

fn orchestrator(cfg: &ResolvedConfig) -> Result<Orchestrator> {
    Orchestrator::from_config(cfg).context("Failed to set up orchestrator")
}

/// Print tagged versions, newest first
pub async fn list_versions(orchestrator: &Orchestrator, out: &mut impl Write) -> Result<()> {
    let versions = orchestrator.list_versions().await?;

    for revision in &versions {
        writeln!(out, "{}", revision.label())?;
    }

    Ok(())
}

/// Non-interactive rollback
pub async fn apply(orchestrator: &Orchestrator, version: &str, out: &mut impl Write) -> Result<()> {
    let outcome = orchestrator
        .rollback(version)
        .await
        .with_context(|| format!("Rollback to {} failed", version.trim()))?;

    writeln!(
        out,
        "Dashboard rolled back to {} (revision {}).",
        outcome.current, outcome.resolved.revision
    )?;
    Ok(())
}

/// Numbered menu of versions, then rollback to the chosen one
pub async fn interactive(
    orchestrator: &Orchestrator,
    mut input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "\n--- Grafana One-Click Rollback ---")?;

    let versions = orchestrator.list_versions().await?;
    if versions.is_empty() {
        anyhow::bail!("No tagged versions found");
    }

    writeln!(out, "\nAvailable Versions:\n")?;
    write!(out, "{}", render_menu(&versions))?;
    write!(out, "\nSelect version number: ")?;
    out.flush().context("Failed to flush output")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read selection")?;

    let revision = select_by_position(&versions, &line)?;
    writeln!(out, "\nFetching dashboard from {}...", revision.id)?;

    let outcome = orchestrator
        .rollback_to(revision)
        .await
        .with_context(|| format!("Rollback to {} failed", revision.id))?;

    writeln!(
        out,
        "\nDashboard updated successfully. Current version: {}",
        outcome.current
    )?;
    Ok(())
}

/// `"1. <hash> <message>"` lines
fn render_menu(versions: &[Revision]) -> String {
    versions
        .iter()
        .enumerate()
        .map(|(i, rev)| format!("{}. {}\n", i + 1, rev.label()))
        .collect()
}

/// Run the export flow once
async fn export(orchestrator: &Orchestrator) -> Result<()> {
    let outcome = orchestrator.export().await.context("Export failed")?;
    println!("{}", outcome.message());
    Ok(())
}

fn show_current(orchestrator: &Orchestrator) -> Result<()> {
    match orchestrator.current()? {
        Some(current) => println!("{}", current),
        None => println!("none (no export has happened yet)"),
    }
    Ok(())
}

/// Start the HTTP API
async fn serve(cfg: &ResolvedConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = cfg.server.clone();
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let state = ApiState::new(orchestrator(cfg)?);
    let server = HttpServer::new(settings, state);
    let addr = server.socket_addr();

    server
        .start()
        .await
        .with_context(|| format!("HTTP server on {} failed", addr))
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("dashver configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Grafana:");
    println!(
        "  URL:           {}",
        cfg.grafana_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Token:         {}",
        cfg.redacted_token().unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  Dashboard UID: {}", cfg.dashboard_uid);
    println!();
    println!("Paths:");
    println!("  Repository:    {}", cfg.repo_dir.display());
    println!("  Dashboard:     {}", cfg.dashboard_file().display());
    println!("  State file:    {}", cfg.state_file.display());
    println!();
    println!("Server:          {}", cfg.socket_addr());
    println!(
        "Timeouts:        http {}s, git {}s",
        cfg.timeouts.http_seconds, cfg.timeouts.git_seconds
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_flag() {
        let cli = Cli::try_parse_from(["dashver", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.apply.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_apply_flag() {
        let cli = Cli::try_parse_from(["dashver", "--apply", "v3"]).unwrap();
        assert_eq!(cli.apply.as_deref(), Some("v3"));
        assert!(!cli.list);
    }

    #[test]
    fn test_list_conflicts_with_apply() {
        assert!(Cli::try_parse_from(["dashver", "--list", "--apply", "v3"]).is_err());
    }

    #[test]
    fn test_parse_serve_subcommand() {
        let cli = Cli::try_parse_from(["dashver", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_arguments_is_interactive() {
        let cli = Cli::try_parse_from(["dashver"]).unwrap();
        assert!(cli.command.is_none() && !cli.list && cli.apply.is_none());
    }

    #[test]
    fn test_render_menu_is_one_based() {
        let menu = render_menu(&[
            Revision::new("c3c3c3c", "v2 Dashboard update"),
            Revision::new("a1a1a1a", "v1 Dashboard update"),
        ]);
        assert_eq!(
            menu,
            "1. c3c3c3c v2 Dashboard update\n2. a1a1a1a v1 Dashboard update\n"
        );
    }
}
