//! Command-line parsing and routing.

use crate::commands;
use crate::config::config_path;
use crate::logging;
use crate::setup::{self, SetupState};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A quick voice recorder with a live scrolling waveform
#[derive(Parser, Debug)]
#[command(name = "quickrec")]
#[command(version)]
#[command(about = "A quick voice recorder with a live scrolling waveform")]
#[command(long_about = "A quick voice recorder with a live scrolling waveform, a recordings browser\nand playback with a waveform preview.\n\nDEFAULT COMMAND:\n    If no command is given, 'record' is used.\n\nEXAMPLES:\n    # Record; Enter saves, Space pauses, Esc discards\n    $ quickrec\n\n    # Save the running recording from another process\n    $ pkill -USR1 quickrec\n\n    # Browse recordings\n    $ quickrec list\n\n    # Play the second most recent recording\n    $ quickrec play 2\n\n    # Preview any audio file\n    $ quickrec play ~/Music/memo.m4a")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/quickrec/quickrec.toml\n    Recordings:         ~/.local/share/quickrec/recordings/\n    Logs:               ~/.local/state/quickrec/quickrec.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Record audio with a live waveform (default)
    ///
    /// Press Enter to save, Space to pause/resume, Escape/q to discard.
    /// Sending SIGUSR1 saves as well.
    #[command(visible_alias = "r")]
    Record,

    /// Browse saved recordings
    ///
    /// Arrow keys select, Enter plays, d deletes, Escape exits.
    #[command(visible_alias = "ls")]
    List,

    /// Play a recording with a waveform preview
    #[command(visible_alias = "p")]
    Play {
        /// Recording index (1 = most recent) or path to an audio file
        #[arg(value_name = "N|FILE")]
        target: Option<String>,
    },

    /// Delete a saved recording and its audio file
    #[command(visible_alias = "rm")]
    Delete {
        /// Recording index (1 = most recent)
        #[arg(value_name = "N")]
        index: usize,
    },

    /// Open the configuration file in your editor
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, value_name = "LINES")]
        lines: Option<usize>,
    },

    /// Generate a shell completion script
    ///
    /// Examples:
    ///   quickrec completions bash > quickrec.bash
    ///   quickrec completions zsh > _quickrec
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Brings the config file up to date before any command reads it.
fn check_and_run_setup() -> Result<(), anyhow::Error> {
    let path = config_path()?;
    match setup::ensure_config(&path).map_err(|e| {
        tracing::error!("Setup failed: {e:#}");
        e.context("Setup failed")
    })? {
        SetupState::Missing => {
            eprintln!("Created default configuration at {}", path.display());
        }
        SetupState::Outdated(_) | SetupState::Current => {}
    }
    Ok(())
}

/// Parses the command line and runs the chosen command.
///
/// # Errors
/// - If logging or setup cannot be initialized
/// - If the command fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "quickrec", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            if let Err(e) = commands::handle_list_devices() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            return Ok(());
        }
        Some(Commands::Logs { lines }) => {
            if let Err(e) = commands::handle_logs(*lines) {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command.unwrap_or(Commands::Record) {
        Commands::Record => commands::handle_record().await?,
        Commands::List => commands::handle_list().await?,
        Commands::Play { target } => commands::handle_play(target).await?,
        Commands::Delete { index } => commands::handle_delete(index).await?,
        Commands::Config => commands::handle_config()?,
        Commands::Completions { .. } | Commands::ListDevices | Commands::Logs { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_record_is_the_default() {
        let cli = Cli::try_parse_from(["quickrec"]).unwrap();
        assert_eq!(cli.command, None);
        let cli = Cli::try_parse_from(["quickrec", "r"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Record));
    }

    #[test]
    fn test_play_and_delete_arguments() {
        let cli = Cli::try_parse_from(["quickrec", "play", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Play {
                target: Some("2".to_string())
            })
        );
        let cli = Cli::try_parse_from(["quickrec", "rm", "3"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Delete { index: 3 }));
        assert!(Cli::try_parse_from(["quickrec", "delete", "x"]).is_err());
    }

    #[test]
    fn test_logs_line_count() {
        let cli = Cli::try_parse_from(["quickrec", "logs", "-n", "10"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Logs { lines: Some(10) }));
    }
}
