//! Structural validation of checkout requests
//!
//! Pure checks over the request alone. Anything that needs the catalog or
//! the staff directory is a business check and lives in the lending service.

use crate::domain::{CheckoutRequest, Rejection};

/// First structural problem of a checkout request, if any
pub fn validate_checkout(user_id: &str, request: &CheckoutRequest) -> Result<(), Rejection> {
    if request.staff_nik.trim().is_empty() {
        return Err(Rejection::EmptyStaffNik);
    }

    if user_id.trim().is_empty() {
        return Err(Rejection::EmptyUserId);
    }

    if request.duration_days < 0 {
        return Err(Rejection::NegativeDuration {
            days: request.duration_days,
        });
    }

    if request.lines.is_empty() {
        return Err(Rejection::EmptyLines);
    }

    for (line, item) in request.lines.iter().enumerate() {
        if item.asset_id.trim().is_empty() {
            return Err(Rejection::EmptyAssetId { line });
        }

        if item.status.trim().is_empty() {
            return Err(Rejection::EmptyStatus { line });
        }

        if item.quantity < 0 {
            return Err(Rejection::NegativeQuantity {
                line,
                quantity: item.quantity,
            });
        }
    }

    Ok(())
}

/// Lookup keys must be non-empty
pub fn validate_lookup_key(key: &str, empty: Rejection) -> Result<(), Rejection> {
    if key.trim().is_empty() {
        Err(empty)
    } else {
        Ok(())
    }
}
