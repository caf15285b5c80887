//! Identity payload handling.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every payload that describes a user (password login responses, code
//! exchange responses, identity endpoint bodies, decoded token claims) goes
//! through `normalize` so there is exactly one place that guesses field names.

pub mod claims;
pub mod normalize;

pub use normalize::{CanonicalIdentity, IdentityNormalizer};
