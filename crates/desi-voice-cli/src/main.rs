// crates/desi-voice-cli/src/main.rs
// ============================================================================
// Module: Desi Voice CLI Entry Point
// Description: Command dispatcher for server and contract workflows.
// Purpose: Provide a safe local bootstrap for the voice engine.
// Dependencies: clap, desi-voice-core, desi-voice-server, tokio
// ============================================================================

//! ## Overview
//! The CLI starts the HTTP server and validates contract documents offline.
//! Exit codes: 0 on success, 2 on usage or validation errors, 1 on runtime
//! failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use desi_voice_core::CONTRACT_VERSION;
use desi_voice_core::ContractStore;
use desi_voice_core::ENGINE_NAME;
use desi_voice_core::ENGINE_RELEASE_STAGE;
use desi_voice_core::ENGINE_VERSION;
use desi_voice_server::VoiceServer;
use desi_voice_server::VoiceServerConfig;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "desi-voice", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the voice HTTP server.
    Serve(ServeCommand),
    /// Contract utilities.
    Contract {
        /// Selected contract subcommand.
        #[command(subcommand)]
        command: ContractCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to desi-voice.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Contract subcommands.
#[derive(Subcommand, Debug)]
enum ContractCommand {
    /// Validate a contract document against the engine's contract version.
    Validate(ContractValidateCommand),
}

/// Configuration for `contract validate`.
#[derive(Args, Debug)]
struct ContractValidateCommand {
    /// Contract document path.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.show_version {
        println!("{ENGINE_NAME} {ENGINE_VERSION} ({ENGINE_RELEASE_STAGE})");
        return ExitCode::SUCCESS;
    }
    match cli.command {
        Some(Commands::Serve(command)) => run_serve(command).await,
        Some(Commands::Contract {
            command: ContractCommand::Validate(command),
        }) => run_contract_validate(&command),
        None => {
            eprintln!("a subcommand is required; see --help");
            ExitCode::from(2)
        }
    }
}

// ============================================================================
// SECTION: Command Handlers
// ============================================================================

/// Runs the HTTP server until it stops.
async fn run_serve(command: ServeCommand) -> ExitCode {
    let config = match VoiceServerConfig::load(command.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    let server = match VoiceServer::from_config(config) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = server.serve().await {
        eprintln!("{err}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

/// Validates a contract document offline.
fn run_contract_validate(command: &ContractValidateCommand) -> ExitCode {
    match ContractStore::from_path(&command.input, CONTRACT_VERSION) {
        Ok(store) => {
            println!("contract valid (version {})", store.version());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
