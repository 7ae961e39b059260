//! Inbox Triage — LLM-assisted email categorization, action-item
//! extraction, reply drafting and inbox chat.

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod mail;
pub mod state;
pub mod store;
pub mod triage;
