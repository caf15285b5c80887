//! Client-side session state.
//!
//! DESIGN
//! ======
//! `session` is the state machine, `refresh` its authoritative profile
//! source, and `callback` the provider redirect flows that feed it.

pub mod callback;
pub mod refresh;
pub mod session;
