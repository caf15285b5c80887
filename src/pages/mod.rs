//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Pages never gate themselves on authentication; the route guard owns that.
//! Each page reads `SessionContext` and renders or acts on it.

pub mod callback;
pub mod dashboard;
pub mod entry;
pub mod login;
