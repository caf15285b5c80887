//! Reusable UI component modules.

pub mod notice_toast;
