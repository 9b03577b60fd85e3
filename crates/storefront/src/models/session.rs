//! Session-related types.
//!
//! Authentication itself is handled elsewhere; handlers here only read back
//! the minimal identity the login flow stored in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use satchel_core::{Email, UserId};

/// Session-stored user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Get the logged-in user from the session, if any.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the serialized shopping cart.
    pub const SHOPPING_CART: &str = "shopping_cart";
}
