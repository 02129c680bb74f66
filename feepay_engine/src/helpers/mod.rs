mod failure_reason;
mod references;
mod validation;

pub use failure_reason::FailureCategory;
pub use references::{new_conversion_id, new_order_id, new_payment_id};
pub use validation::{
    validate_conversion_request,
    validate_email,
    validate_new_order_request,
    validate_proof_reference,
    MIN_CONVERSION_USDT,
};
