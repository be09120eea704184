// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sticker Factory: print stickers on Brother QL label printers.
//
// Entry point.  Initialises logging, loads the configuration, builds the
// backend services, and runs one command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use sticker_core::AppConfig;
use sticker_core::config::DEFAULT_CONFIG_PATH;
use sticker_core::error::{Result, StickerError};
use sticker_core::human_errors::{Severity, humanize_error};
use sticker_core::types::{JobStatus, Rotation};

use services::app_services::StickerServices;

/// Sticker Factory - print stickers on Brother QL label printers
#[derive(Parser, Debug)]
#[command(name = "sticker-factory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "STICKER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List attached Brother QL printers
    Discover {
        /// Print the printer list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the label geometry stickers are laid out for
    Label {
        /// Rescan printers instead of using the cached result
        #[arg(long)]
        refresh: bool,
    },

    /// Print an image on the first usable printer
    Print {
        /// Image file (PNG, JPEG, ...)
        image: PathBuf,

        /// Rotation in degrees (0 or 90)
        #[arg(long, default_value = "0", value_parser = parse_rotation)]
        rotate: Rotation,

        /// Dither instead of thresholding
        #[arg(long)]
        dither: bool,

        /// Seconds to wait for the job to finish
        #[arg(long, default_value = "60")]
        wait: u64,
    },
}

fn parse_rotation(value: &str) -> std::result::Result<Rotation, String> {
    value
        .parse::<u16>()
        .ok()
        .and_then(Rotation::from_degrees)
        .ok_or_else(|| format!("unsupported rotation {value:?}, expected 0 or 90"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            if human.severity == Severity::Transient {
                eprintln!("  This is usually temporary; running the command again may work.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(&cli.config)?;
    let services = StickerServices::init(config);
    info!(title = %services.config().app.title, "Sticker Factory starting");

    match cli.command {
        Commands::Discover { json } => {
            let printers = services.discover().await;
            if json {
                let text = serde_json::to_string_pretty(&printers)
                    .map_err(|e| StickerError::Io(e.into()))?;
                println!("{text}");
            } else if printers.is_empty() {
                println!("No Brother QL printers found.");
            } else {
                for printer in &printers {
                    println!("{}  [{}]  {}", printer.name, printer.status, printer.identifier);
                }
            }
        }
        Commands::Label { refresh } => {
            let resolution = services.label_info(refresh).await;
            println!(
                "{}  {} dots wide  ({})",
                resolution.label_type, resolution.label_width, resolution.message
            );
            if resolution.needs_warning() {
                eprintln!("Warning: no printer detected, check the USB connection.");
            }
        }
        Commands::Print {
            image: path,
            rotate,
            dither,
            wait,
        } => {
            let bitmap = image::open(&path)
                .map_err(|e| StickerError::Image(format!("{}: {e}", path.display())))?;
            let snapshot = services
                .print_image(bitmap, rotate, dither, Duration::from_secs(wait))
                .await?;

            if snapshot.status == JobStatus::Failed {
                eprintln!(
                    "Print failed: {}",
                    snapshot.error.as_deref().unwrap_or("unknown error")
                );
                return Ok(ExitCode::FAILURE);
            }
            match snapshot.message {
                Some(message) => println!("{message}"),
                None => println!("Printed."),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_command_parses_options() {
        let cli = Cli::try_parse_from([
            "sticker-factory",
            "--config",
            "/etc/sticker.toml",
            "print",
            "cat.png",
            "--rotate",
            "90",
            "--dither",
            "--wait",
            "5",
        ])
        .expect("valid arguments");

        assert_eq!(cli.config, PathBuf::from("/etc/sticker.toml"));
        match cli.command {
            Commands::Print {
                image,
                rotate,
                dither,
                wait,
            } => {
                assert_eq!(image, PathBuf::from("cat.png"));
                assert_eq!(rotate, Rotation::Deg90);
                assert!(dither);
                assert_eq!(wait, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn print_defaults() {
        let cli = Cli::try_parse_from(["sticker-factory", "print", "a.png"]).expect("valid");
        match cli.command {
            Commands::Print {
                rotate, dither, wait, ..
            } => {
                assert_eq!(rotate, Rotation::Deg0);
                assert!(!dither);
                assert_eq!(wait, 60);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn odd_rotation_is_rejected() {
        assert!(Cli::try_parse_from(["sticker-factory", "print", "a.png", "--rotate", "45"]).is_err());
    }

    #[test]
    fn label_refresh_flag() {
        let cli = Cli::try_parse_from(["sticker-factory", "label", "--refresh"]).expect("valid");
        assert!(matches!(cli.command, Commands::Label { refresh: true }));
    }
}
