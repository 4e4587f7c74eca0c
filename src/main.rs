//! CLI entry point for toolrelay.

mod cli;

use clap::Parser;
use cli::Command;
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolrelay::api::ApiClient;
use toolrelay::config::{
    apply_overrides, initialize_local_config, load_config, ConfigInitResult, ConfigOverrides,
};
use toolrelay::conversation::{ChatDefaults, Conversation, TurnOutcome};
use toolrelay::types::ReasoningEffort;
use toolrelay::{server, tools};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    match &args.command {
        Some(Command::Init) => {
            run_init();
            return;
        }
        Some(Command::Tools) => {
            match serde_json::to_string_pretty(tools::catalog()) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
            return;
        }
        _ => {}
    }

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let listen = match &args.command {
        Some(Command::Serve { listen }) => listen.clone(),
        _ => None,
    };
    let overrides = ConfigOverrides {
        model: args.model.clone(),
        base_url: args.base_url.clone(),
        listen,
    };
    if let Err(e) = apply_overrides(&mut config, &overrides) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    init_tracing(&config.server.log_level);
    if config.api.api_key.is_empty() {
        warn!("no API key configured; set TOOLRELAY_API_KEY or OPENAI_API_KEY if the endpoint requires one");
    }

    let api = Arc::new(ApiClient::new(&config.api));
    let conversation = Conversation::new(api, ChatDefaults::from_config(&config));
    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    let result = match args.command {
        Some(Command::Ask {
            prompt,
            system,
            tools,
            stream,
            json,
            effort,
        }) => {
            let request = AskRequest {
                prompt,
                system,
                tools,
                stream,
                json,
                effort,
            };
            run_ask(&conversation, request, &shutdown).await
        }
        _ => server::serve(&config.server, conversation, shutdown)
            .await
            .map_err(|e| format!("server failed: {e}")),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; shutting down");
            token.cancel();
        }
    });
}

fn run_init() {
    match initialize_local_config() {
        Ok(ConfigInitResult::Created { path }) => {
            println!("wrote {}", path.display());
        }
        Ok(ConfigInitResult::AlreadyInitialized { path }) => {
            println!("{} already exists; leaving it unchanged", path.display());
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

struct AskRequest {
    prompt: String,
    system: Option<String>,
    tools: bool,
    stream: bool,
    json: bool,
    effort: Option<String>,
}

async fn run_ask(
    conversation: &Conversation,
    request: AskRequest,
    cancel: &CancellationToken,
) -> Result<(), String> {
    let effort = request
        .effort
        .as_deref()
        .map(str::parse::<ReasoningEffort>)
        .transpose()?;
    let turn = conversation
        .turn(request.system.as_deref(), &request.prompt)
        .map_err(|e| e.to_string())?;
    let options = conversation.options(None, request.json, effort, None);

    let outcome = match conversation
        .run(&turn, &options, request.tools, request.stream, cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => {
            eprintln!("cancelled");
            return Ok(());
        }
        Err(e) => return Err(e.to_string()),
    };

    match outcome {
        TurnOutcome::Answer(text) => println!("{text}"),
        TurnOutcome::Stream { exchange, mut deltas } => {
            if let Some(exchange) = exchange {
                eprintln!(
                    "[tool] {} -> {}",
                    exchange.call.name,
                    exchange.result.to_json_string()
                );
            }
            let mut stdout = std::io::stdout();
            while let Some(item) = deltas.next().await {
                let delta = item.map_err(|e| e.to_string())?;
                write!(stdout, "{delta}").map_err(|e| e.to_string())?;
                stdout.flush().map_err(|e| e.to_string())?;
            }
            println!();
            if cancel.is_cancelled() {
                eprintln!("cancelled");
            }
        }
    }
    Ok(())
}
