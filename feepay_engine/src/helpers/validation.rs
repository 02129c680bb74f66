use once_cell::sync::Lazy;
use regex::Regex;

use fpg_common::UsdtAmount;

use crate::{traits::LedgerError, usdt_exchange_objects::ConversionRequest};

pub const MIN_CONVERSION_USDT: i64 = 1;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").unwrap()
});

pub fn validate_email(email: &str) -> Result<(), LedgerError> {
    if email.len() > 255 || !EMAIL.is_match(email) {
        return Err(LedgerError::ValidationError(format!("'{email}' is not a valid email address")));
    }
    Ok(())
}

pub fn validate_new_order_request(sku: &str, target_number: &str, customer_email: &str) -> Result<(), LedgerError> {
    if sku.trim().is_empty() || sku.len() > 100 {
        return Err(LedgerError::ValidationError("Product SKU is required (max 100 characters)".into()));
    }
    if target_number.trim().is_empty() || target_number.len() > 50 {
        return Err(LedgerError::ValidationError("Target number is required (max 50 characters)".into()));
    }
    validate_email(customer_email)
}

pub fn validate_proof_reference(proof: &str) -> Result<(), LedgerError> {
    if proof.trim().is_empty() || proof.len() > 255 {
        return Err(LedgerError::ValidationError("Payment proof reference is required (max 255 characters)".into()));
    }
    Ok(())
}

fn required(value: &str, field: &str, max: usize) -> Result<(), LedgerError> {
    if value.trim().is_empty() || value.chars().count() > max {
        return Err(LedgerError::ValidationError(format!("{field} is required (max {max} characters)")));
    }
    Ok(())
}

pub fn validate_conversion_request(request: &ConversionRequest) -> Result<(), LedgerError> {
    if request.amount < UsdtAmount::from_usdt(MIN_CONVERSION_USDT) {
        return Err(LedgerError::ValidationError(format!("Amount must be at least {MIN_CONVERSION_USDT} USDT")));
    }
    required(&request.bank_name, "Bank name", 100)?;
    required(&request.account_number, "Account number", 50)?;
    required(&request.account_name, "Account name", 255)?;
    validate_proof_reference(&request.proof_reference)?;
    if let Some(phone) = &request.customer_phone {
        if phone.chars().count() > 20 {
            return Err(LedgerError::ValidationError("Phone number is longer than 20 characters".into()));
        }
    }
    validate_email(request.customer_email.trim())
}
