//! Repair inquiry repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use satchel_core::{InquiryId, InquiryStatus};

use super::RepositoryError;

/// A repair service inquiry submitted by a customer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceInquiry {
    pub id: InquiryId,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_type: String,
    pub status: InquiryStatus,
    pub description: String,
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
}

/// Fields an admin may change on an inquiry. `None` leaves a field as-is.
#[derive(Debug, Clone, Default)]
pub struct InquiryUpdate {
    pub status: Option<InquiryStatus>,
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
}

/// Repository for repair inquiry operations.
pub struct InquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InquiryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all inquiries, newest first.
    pub async fn list(&self) -> Result<Vec<ServiceInquiry>, RepositoryError> {
        let inquiries = sqlx::query_as::<_, ServiceInquiry>(
            "SELECT id, created_at, full_name, email, phone, service_type,
                    status, description, quoted_price, admin_notes
             FROM service_inquiry
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(inquiries)
    }

    /// Fetch one inquiry.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the inquiry does not exist.
    pub async fn get(&self, id: InquiryId) -> Result<ServiceInquiry, RepositoryError> {
        sqlx::query_as::<_, ServiceInquiry>(
            "SELECT id, created_at, full_name, email, phone, service_type,
                    status, description, quoted_price, admin_notes
             FROM service_inquiry
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Apply an admin update, validating any status transition.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidTransition`] if the requested status
    /// is not reachable from the current one.
    pub async fn update(
        &self,
        id: InquiryId,
        update: InquiryUpdate,
    ) -> Result<ServiceInquiry, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, InquiryStatus>(
            "SELECT status FROM service_inquiry WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let new_status = match update.status {
            Some(next) if next != current => {
                if !current.can_transition_to(next) {
                    return Err(RepositoryError::InvalidTransition {
                        from: current.to_string(),
                        to: next.to_string(),
                    });
                }
                next
            }
            _ => current,
        };

        sqlx::query(
            "UPDATE service_inquiry
             SET status = $2,
                 quoted_price = COALESCE($3, quoted_price),
                 admin_notes = COALESCE($4, admin_notes)
             WHERE id = $1",
        )
        .bind(id)
        .bind(new_status)
        .bind(update.quoted_price)
        .bind(update.admin_notes.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(id).await
    }
}
