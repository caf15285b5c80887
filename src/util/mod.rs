//! Utility helpers shared across session and page modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/router concerns from state logic so the
//! policies stay testable without a DOM.

pub mod guard;
pub mod task;
