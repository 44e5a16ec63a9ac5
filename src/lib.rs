//! Quipchat - a small chat relay in front of a hosted generative model
//!
//! This library provides both halves of the chat:
//! - The relay: `POST /api/chat` and `POST /api/audio-chat`, forwarding
//!   text or audio plus the caller's history to the model
//! - The client: conversation history, a two-state voice recorder, voice
//!   selection and text cleanup for spoken replies
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Client                          │
//! │   ChatSession  │  Recorder  │  Speech  │  Terminal   │
//! └────────────────────┬────────────────────────────────┘
//!                      │  JSON / multipart over HTTP
//! ┌────────────────────▼────────────────────────────────┐
//! │                      Relay                           │
//! │   /api/chat  │  /api/audio-chat  │  static files     │
//! └────────────────────┬────────────────────────────────┘
//!                      │  generateContent
//! ┌────────────────────▼────────────────────────────────┐
//! │              Hosted generative model                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The relay keeps no conversation state. History lives with the client
//! and travels with every request.

pub mod api;
pub mod audio;
pub mod chat;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod model;
pub mod persona;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use audio::AudioClip;
pub use chat::ChatService;
pub use config::Config;
pub use conversation::{Message, Part, Role};
pub use error::{Error, Result};
pub use model::{GeminiClient, GenerationConfig, GenerativeModel};
