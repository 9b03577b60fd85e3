//! Core types for Satchel.

pub mod email;
pub mod id;
pub mod status;
