//! # Steward Core - Tool-Call Orchestration and Realtime Dispatch
//!
//! Rust implementation of the Steward engine providing:
//! - Tool registry with typed parameter schemas and enable/disable state
//! - Role-based permission gating with deny-by-default semantics
//! - Permission-gated execution with bounded waits and failure isolation
//! - Tool-call extraction from free-form model output
//! - Per-conversation context with last-tool-result feedback
//! - Execution analytics with online-mean aggregates
//! - Best-effort realtime fan-out to all connected subscribers
//!
//! ## Architecture
//!
//! The `ChatEngine` is the composition root; every collaborator is an owned
//! store passed in at construction:
//! ```text
//!   inbound text →  ┌─────────────────────────────────┐
//!                   │          ChatEngine             │
//!                   │  ┌─────────┐ ┌─────────┐        │
//!                   │  │ Context │ │ Tool    │        │
//!                   │  │  Store  │ │Registry │        │
//!                   │  └─────────┘ └─────────┘        │
//!                   │  ┌─────────┐ ┌─────────┐        │
//!                   │  │Executor │ │Broadcast│ → subscribers
//!                   │  │ +Perms  │ │   er    │        │
//!                   │  └─────────┘ └─────────┘        │
//!                   └─────────────────────────────────┘
//!                        ↓ analytics      ↓ completion
//!                     StatsStore      CompletionClient
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod analytics;
pub mod chat;
pub mod llm;
pub mod realtime;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use chat::{ChatEngine, Message};
pub use types::{Config, Error, Result};
