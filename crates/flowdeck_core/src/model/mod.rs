//! Domain model for tasks, events and the kanban hierarchy.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep write-time invariants next to the records they guard.
//!
//! # Invariants
//! - Every domain object is identified by a stable uuid.
//! - A kanban card references exactly one task or event; the `CardLink`
//!   sum type makes the exclusivity a type-level guarantee.

pub mod event;
pub mod kanban;
pub mod task;
