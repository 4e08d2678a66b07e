//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine, selector and repository calls into use-case APIs.
//! - Keep the CLI decoupled from storage details.

pub mod run_service;
pub mod seed;
