// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use tutor_config::EditFailurePolicy;

#[derive(Parser, Debug)]
#[command(
    name = "tutor",
    about = "Terminal client for the algorithm tutoring chat service",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional first message, sent before the chat loop starts
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Use the offline echo provider and an in-memory record store
    #[arg(long)]
    pub mock: bool,

    /// What a failed edit does to the messages after it (overrides config)
    #[arg(long, value_enum)]
    pub edit_failure: Option<EditFailurePolicy>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// Print the persisted conversation history
    History,
    /// Segment a reply (file or stdin) and print the segments as JSON
    Render {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tutor", &mut std::io::stdout());
}
