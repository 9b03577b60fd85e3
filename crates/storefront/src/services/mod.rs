//! Storefront services.

pub mod checkout;
