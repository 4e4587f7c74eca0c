//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// Tool-augmented chat relay for OpenAI-compatible `/responses` APIs.
#[derive(Debug, Parser)]
#[command(name = "toolrelay", version)]
pub struct Args {
    /// Path to config file (default: ./toolrelay.toml or ~/.config/toolrelay/toolrelay.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Override the default model id.
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Override API base URL.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP surface (default).
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000.
        #[arg(long = "listen")]
        listen: Option<String>,
    },
    /// Run one conversation turn and print the answer.
    Ask {
        /// User prompt.
        prompt: String,
        /// System prompt override.
        #[arg(long = "system")]
        system: Option<String>,
        /// Offer the tool catalog and run a proposed tool.
        #[arg(long = "tools")]
        tools: bool,
        /// Print the answer as it is generated.
        #[arg(long = "stream")]
        stream: bool,
        /// Ask for a JSON-object answer.
        #[arg(long = "json")]
        json: bool,
        /// Reasoning effort for reasoning-tier models: low, medium or high.
        #[arg(long = "effort")]
        effort: Option<String>,
    },
    /// Print the tool catalog as JSON.
    Tools,
    /// Write a default toolrelay.toml in the current directory if none exists.
    Init,
}
