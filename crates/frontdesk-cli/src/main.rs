use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use frontdesk_common::config::FrontdeskConfig;
use frontdesk_common::{APP_NAME, logging};
use frontdesk_core::{Desk, HelpRequest, timestamp};
use frontdesk_memory::JsonFileStore;
use frontdesk_token::{Credentials, TokenIssuer};
use frontdesk_web as web_runtime;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "frontdesk", about = "Receptionist knowledge base and supervisor desk", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate local setup and generate default config if missing.
    Doctor,
    /// Serve the customer page, supervisor dashboard and JSON endpoints.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Help request operations.
    Requests {
        #[command(subcommand)]
        command: RequestsCommand,
    },
    /// Knowledge base operations.
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommand,
    },
    /// Mint one voice room token and print it as JSON.
    Token,
}

#[derive(Debug, Subcommand)]
enum RequestsCommand {
    /// List requests by status (times out stale ones first).
    List,
    /// Time out stale pending requests and report how many changed.
    Sweep,
    /// Answer a pending request and add the answer to the knowledge base.
    Answer { id: u64, answer: String },
}

#[derive(Debug, Subcommand)]
enum KnowledgeCommand {
    /// Print every learned question and answer.
    List,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Doctor) => doctor(),
        Some(Command::Serve { bind }) => serve(bind),
        Some(Command::Requests { command }) => requests(command),
        Some(Command::Knowledge { command }) => knowledge(command),
        Some(Command::Token) => token(),
        None => {
            println!("{APP_NAME} CLI bootstrap complete.");
            println!("Run `frontdesk doctor` to generate and validate local config.");
            Ok(())
        }
    }
}

fn load_initialized_config() -> Result<FrontdeskConfig> {
    let (config, _, _) = FrontdeskConfig::load_or_create()?;
    config.validate_and_prepare()?;
    logging::init(&config.log_level);
    Ok(config)
}

fn open_desk(config: &FrontdeskConfig) -> Desk<JsonFileStore> {
    let store = JsonFileStore::open(&config.knowledge_path(), &config.requests_path());
    Desk::with_timeout_minutes(store, config.timeout_minutes)
}

fn build_issuer(config: &FrontdeskConfig) -> Result<TokenIssuer> {
    let livekit = &config.livekit;
    let credentials = Credentials::from_env(
        &livekit.api_key_env,
        &livekit.api_secret_env,
        &livekit.url_env,
    )?;
    Ok(TokenIssuer::new(
        credentials,
        livekit.room.clone(),
        Duration::from_secs(livekit.token_ttl_secs),
    ))
}

fn doctor() -> Result<()> {
    let (config, path, created) = FrontdeskConfig::load_or_create()?;
    config.validate_and_prepare()?;
    logging::init(&config.log_level);

    println!("{APP_NAME} doctor: OK");
    println!("config: {}", path.display());
    println!("created_config: {created}");
    println!("knowledge_file: {}", config.knowledge_path().display());
    println!("requests_file: {}", config.requests_path().display());
    println!("timeout_minutes: {}", config.timeout_minutes);

    let desk = open_desk(&config);
    let entries = desk.knowledge().context("knowledge base is unreadable")?;
    println!("knowledge_entries: {}", entries.len());
    match build_issuer(&config) {
        Ok(issuer) => println!("voice_tokens: enabled (room {})", issuer.room()),
        Err(err) => println!("voice_tokens: disabled ({err})"),
    }
    Ok(())
}

fn serve(bind: Option<String>) -> Result<()> {
    let config = load_initialized_config()?;
    let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
    let issuer = match build_issuer(&config) {
        Ok(issuer) => Some(issuer),
        Err(err) => {
            warn!(error = %err, "voice token endpoint disabled");
            None
        }
    };
    let state = web_runtime::AppState::new(open_desk(&config), issuer);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    println!("web_status: starting");
    println!("bind: {bind}");
    println!("data: {}", config.data_dir.display());
    runtime.block_on(web_runtime::serve(&bind, state))
}

fn requests(command: RequestsCommand) -> Result<()> {
    let config = load_initialized_config()?;
    let mut desk = open_desk(&config);

    match command {
        RequestsCommand::List => {
            let board = desk.list(timestamp::now())?;
            print_section("pending", &board.pending);
            print_section("resolved", &board.resolved);
            print_section("unresolved", &board.unresolved);
        }
        RequestsCommand::Sweep => {
            let promoted = desk.sweep_timeouts(timestamp::now())?;
            println!("timed_out: {promoted}");
        }
        RequestsCommand::Answer { id, answer } => {
            let resolved = desk.answer(id, &answer, timestamp::now())?;
            println!("resolved: #{} {}", resolved.id, resolved.question);
            println!("learned_answer: {}", resolved.answer.unwrap_or_default());
        }
    }
    Ok(())
}

fn print_section(label: &str, requests: &[HelpRequest]) {
    println!("{label} ({})", requests.len());
    for req in requests {
        let settled = req
            .resolved_at
            .or(req.timeout_at)
            .map(|ts| format!(" -> {}", timestamp::display(&ts)))
            .unwrap_or_default();
        println!(
            "  #{} [{}{}] {}",
            req.id,
            timestamp::display(&req.created_at),
            settled,
            req.question
        );
        if let Some(answer) = &req.answer {
            println!("      {answer}");
        }
    }
}

fn knowledge(command: KnowledgeCommand) -> Result<()> {
    let config = load_initialized_config()?;
    let desk = open_desk(&config);

    match command {
        KnowledgeCommand::List => {
            let entries = desk.knowledge()?;
            if entries.is_empty() {
                println!("knowledge base is empty");
            }
            for entry in entries {
                println!(
                    "[{}] {} => {}",
                    timestamp::display(&entry.added_at),
                    entry.question,
                    entry.answer
                );
            }
        }
    }
    Ok(())
}

fn token() -> Result<()> {
    let config = load_initialized_config()?;
    let issued = build_issuer(&config)?.issue()?;
    println!("{}", serde_json::to_string_pretty(&issued)?);
    Ok(())
}
