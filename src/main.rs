// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;
mod commands;
mod render;

use std::future::Future;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::ChatCommand;
use render::render_reply;
use tutor_config::Config;
use tutor_core::{
    nth_user_turn, turn_short_preview, ConversationEvent, ConversationStore, Outcome, Sender, StoreError, Turn,
};
use tutor_model::SessionContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(cmd) = &cli.command {
        match cmd {
            Commands::Completions { shell } => {
                cli::print_completions(*shell);
                return Ok(());
            }
            Commands::ShowConfig => {
                let mut config = load_config(&cli)?;
                if config.backend.token.is_some() {
                    config.backend.token = Some("<redacted>".into());
                }
                println!("{}", serde_yaml::to_string(&config)?);
                return Ok(());
            }
            Commands::History => {
                let config = load_config(&cli)?;
                let mut store = open_store(&config)?;
                store.load_history().await?;
                let color = io::stdout().is_terminal();
                for turn in store.turns() {
                    print_turn(turn, color);
                }
                return Ok(());
            }
            Commands::Render { file } => {
                let raw = read_input(file.as_deref())?;
                let segments = tutor_content::segment(&raw);
                println!("{}", serde_json::to_string_pretty(&segments)?);
                return Ok(());
            }
        }
    }

    let config = load_config(&cli)?;
    run_chat(&config, cli.prompt.as_deref()).await
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = tutor_config::load(cli.config.as_deref())?;
    if cli.mock {
        config.backend.provider = "mock".into();
    }
    if let Some(policy) = cli.edit_failure {
        config.chat.edit_failure = policy;
    }
    debug!(provider = %config.backend.provider, edit_failure = %config.chat.edit_failure, "configuration loaded");
    Ok(config)
}

fn open_store(config: &Config) -> anyhow::Result<ConversationStore> {
    let session = SessionContext::from_backend(&config.backend);
    debug!(
        ?session,
        authenticated = session.is_authenticated(),
        provider = %config.backend.provider,
        "opening conversation store"
    );
    let collaborators = tutor_model::from_config(&config.backend, &session)
        .context("failed to set up backend collaborators")?;
    Ok(ConversationStore::new(collaborators, session).with_edit_failure(config.chat.edit_failure))
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read {}", p.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

// ── Chat loop ─────────────────────────────────────────────────────────────────

async fn run_chat(config: &Config, prompt: Option<&str>) -> anyhow::Result<()> {
    let color = io::stdout().is_terminal();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut store = open_store(config)?.with_events(tx);

    match store.load_history().await {
        Ok(n) => debug!(records = n, "history loaded"),
        Err(e) => eprintln!("warning: {e}; starting with an empty conversation"),
    }
    // History is not re-rendered; only show what arrives from now on.
    while rx.try_recv().is_ok() {}

    if store.is_empty() {
        println!("Ask anything about algorithms. /suggest lists starter questions, /help shows commands.");
    } else {
        println!("{} earlier messages loaded. /list shows them.", store.len());
    }

    if let Some(p) = prompt {
        report(drive(store.append(p), &mut rx, color).await);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", if store.editing_index().is_some() { "edit> " } else { "> " });
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let cmd = match commands::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        // While an edit is open the next line is the replacement text.
        if store.editing_index().is_some() {
            match cmd {
                None => {
                    store.cancel_editing();
                    println!("(edit cancelled)");
                }
                Some(ChatCommand::Send(text)) => {
                    report(drive(store.commit_edit(&text), &mut rx, color).await);
                }
                Some(_) => eprintln!("finish the edit first, or send an empty line to cancel"),
            }
            continue;
        }

        let Some(cmd) = cmd else { continue };
        match cmd {
            ChatCommand::Send(text) => report(drive(store.append(&text), &mut rx, color).await),
            ChatCommand::List => {
                for line in list_lines(store.turns()) {
                    println!("{line}");
                }
            }
            ChatCommand::Edit { message, text } => {
                let Some(index) = nth_user_turn(store.turns(), message) else {
                    eprintln!("no message {}", message + 1);
                    continue;
                };
                if text.is_empty() {
                    match store.start_editing(index) {
                        Ok(current) => {
                            println!("editing [{}]: {current}", message + 1);
                            println!("type the new text, or an empty line to cancel");
                        }
                        Err(e) => eprintln!("error: {e}"),
                    }
                } else {
                    report(drive(store.edit(index, &text), &mut rx, color).await);
                }
            }
            ChatCommand::Delete { message } => {
                let Some(index) = nth_user_turn(store.turns(), message) else {
                    eprintln!("no message {}", message + 1);
                    continue;
                };
                report(drive(store.delete(index), &mut rx, color).await);
            }
            ChatCommand::Suggest(None) => {
                for (i, s) in config.chat.suggestions.iter().enumerate() {
                    println!("  {}. {s}", i + 1);
                }
            }
            ChatCommand::Suggest(Some(n)) => match config.chat.suggestions.get(n) {
                Some(s) => {
                    println!("you: {s}");
                    report(drive(store.append(s), &mut rx, color).await);
                }
                None => eprintln!("no suggestion {}", n + 1),
            },
            ChatCommand::Help => println!("{}", commands::HELP),
            ChatCommand::Quit => break,
        }
    }
    Ok(())
}

/// Run one store operation, printing its events as they arrive.
async fn drive<F>(
    op: F,
    rx: &mut mpsc::UnboundedReceiver<ConversationEvent>,
    color: bool,
) -> Result<Outcome, StoreError>
where
    F: Future<Output = Result<Outcome, StoreError>>,
{
    tokio::pin!(op);
    loop {
        tokio::select! {
            result = &mut op => {
                while let Ok(ev) = rx.try_recv() {
                    show_event(ev, color);
                }
                return result;
            }
            Some(ev) = rx.recv() => show_event(ev, color),
        }
    }
}

fn show_event(event: ConversationEvent, color: bool) {
    match event {
        ConversationEvent::TurnAdded { turn, .. } if turn.sender == Sender::Assistant => {
            print_turn(&turn, color);
        }
        ConversationEvent::TurnAdded { .. } => println!("  …"),
        ConversationEvent::Truncated { removed, .. } if removed > 2 => {
            println!("({} later messages discarded)", removed - 2);
        }
        ConversationEvent::RolledBack { len } => debug!(len, "rolled back"),
        ConversationEvent::Removed { indices } => println!("(removed {} messages)", indices.len()),
        other => debug!(?other, "store event"),
    }
}

fn report(result: Result<Outcome, StoreError>) {
    match result {
        Ok(Outcome::Completed) => {}
        Ok(Outcome::Skipped) => println!("(nothing to send)"),
        Err(e) if e.is_warning() => eprintln!("warning: {e}; this exchange may not be saved"),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn print_turn(turn: &Turn, color: bool) {
    match turn.sender {
        Sender::User => println!("you: {}", turn.text),
        Sender::Assistant => println!("tutor:\n{}\n", render_reply(&turn.text, color)),
    }
}

/// One line per turn; user messages are numbered 1.. in the order `/edit`
/// and `/delete` expect.
fn list_lines(turns: &[Turn]) -> Vec<String> {
    let mut number = 0;
    turns
        .iter()
        .map(|turn| match turn.sender {
            Sender::User => {
                number += 1;
                let mark = if turn.pending { " (unsaved)" } else { "" };
                format!("[{number}] you: {}{mark}", turn_short_preview(Some(turn)))
            }
            Sender::Assistant => format!("    tutor: {}", turn_short_preview(Some(turn))),
        })
        .collect()
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
