//! Backend for the fitness tracker web app.
//!
//! Two server variants share one codebase:
//!
//! - **Gateway**: serves the static front end and proxies Gemini
//!   `generateContent` calls, injecting the server-held API key so the
//!   browser never sees it.
//! - **Data proxy**: the gateway plus per-user session and nutrition
//!   endpoints backed by Supabase, scoped by the `x-user-id` header.
//!
//! ```text
//! browser ──► /api/proxy-generate ──► Gemini
//!         ──► /api/sessions        ──► Supabase `sessions`
//!         ──► /api/nutrition       ──► Supabase `nutrition`
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Error types and the JSON error envelope
//! - [`gemini`]: Gemini client
//! - [`store`]: Record store trait, Supabase client and in-memory store
//! - [`api`]: Routers and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
