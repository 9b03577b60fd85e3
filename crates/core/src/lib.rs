//! Satchel Core - Shared types library.
//!
//! Types shared between the storefront and admin binaries: newtype entity
//! IDs, closed status enumerations with explicit allowed transitions, and
//! a validated email address type.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::email::{Email, EmailError};
pub use types::id::{InquiryId, OrderId, OrderItemId, ProductId, TrackingEntryId, UserId};
pub use types::status::{
    InquiryStatus, OrderStatus, PaymentMethod, PaymentStatus, TrackingOrigin,
};
