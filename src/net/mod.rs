//! Networking for the identity backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` owns every HTTP call the session layer makes: the identity
//! endpoint, provider code exchange, password login, and logout notice.

pub mod api;
