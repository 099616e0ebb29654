//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod event_service;
pub mod insights_service;
pub mod kanban_service;
pub mod task_service;
