//! Admin services.

pub mod export;
