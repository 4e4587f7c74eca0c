//! toolrelay: a tool-augmented relay in front of OpenAI-compatible
//! `/responses` APIs.
//!
//! A conversation turn can run in two phases. A detection round offers the
//! fixed tool catalog to the remote service; when it proposes a call, the tool
//! runs locally and a continuation round streams the model's answer about the
//! result. Turns without tools are a single direct round, buffered or
//! streamed. The same [`conversation::Conversation`] backs the HTTP surface in
//! [`server`] and the `toolrelay ask` command.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use toolrelay::api::ApiClient;
//! use toolrelay::config::load_config;
//! use toolrelay::conversation::{ChatDefaults, Conversation};
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let api = Arc::new(ApiClient::new(&config.api));
//! let conversation = Conversation::new(api, ChatDefaults::from_config(&config));
//! let turn = conversation.turn(None, "What time is it in Tokyo?").unwrap();
//! let options = conversation.options(None, false, None, None);
//! let detection = conversation
//!     .detect(&turn, &options, &CancellationToken::new())
//!     .await
//!     .unwrap();
//! println!("{:?}", detection.tool_call);
//! # }
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod server;
#[cfg(test)]
pub mod testsupport;
pub mod tools;
pub mod types;
