//! Gemini generative API proxy.
//!
//! The client injects the server-held credential; the payload itself is
//! never inspected.

pub mod client;

pub use client::GeminiClient;
