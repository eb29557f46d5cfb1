//! studio: research, write and review SEO articles
//!
//! This library provides:
//! - A three-stage content pipeline (research, writing, review) with
//!   progress events and per-stage failure records
//! - Completion providers for OpenAI-compatible chat APIs (Groq, OpenAI,
//!   OpenRouter, Ollama) plus a scripted offline provider
//! - DuckDuckGo web search for the research stage
//! - Prompt templates that can be overridden from disk
//! - Markdown / plain-text export of the finished article

pub mod agent;
pub mod config;
pub mod export;
pub mod llm;
pub mod orchestration;
pub mod prompts;
pub mod search;
pub mod transport;

pub use config::Config;
pub use orchestration::{Pipeline, PipelineResult, PipelineState, Topic};
