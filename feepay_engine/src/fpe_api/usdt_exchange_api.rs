use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{BankDetails, NewUsdtConversion, UsdtConversion, UsdtConversionStatus},
    events::{EventProducers, UsdtConversionResolvedEvent},
    helpers::{new_conversion_id, validate_conversion_request},
    traits::{LedgerError, UsdtConversions},
    usdt_exchange_objects::{ConversionQueryFilter, ConversionRequest, ConversionResolution},
};

pub const MAX_REVIEW_NOTE_LENGTH: usize = 500;

/// Customers sell USDT for rupiah paid into their bank account. A submission is priced at the current USDT rate
/// when it is stored, and stays `pending` until an admin approves or rejects it.
pub struct UsdtExchangeApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for UsdtExchangeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UsdtExchangeApi")
    }
}

impl<B> UsdtExchangeApi<B>
where B: UsdtConversions
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub async fn submit_conversion(&self, request: ConversionRequest) -> Result<UsdtConversion, LedgerError> {
        validate_conversion_request(&request)?;
        let conversion = NewUsdtConversion {
            trx_id: new_conversion_id(),
            amount: request.amount,
            network: request.network,
            bank_details: BankDetails {
                bank_name: request.bank_name.trim().to_string(),
                account_number: request.account_number.trim().to_string(),
                account_name: request.account_name.trim().to_string(),
            },
            proof_reference: request.proof_reference.trim().to_string(),
            customer_email: request.customer_email.trim().to_lowercase(),
            customer_phone: request.customer_phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        };
        let conversion = self.db.insert_conversion(conversion).await?;
        info!(
            "💱️ Conversion {} submitted: {} on {} for {} at {}",
            conversion.trx_id, conversion.amount, conversion.network, conversion.idr_received, conversion.rate
        );
        Ok(conversion)
    }

    /// The customer-facing lookup. A conversion is only returned when `email` matches the one it was submitted with.
    pub async fn conversion_for_customer(
        &self,
        trx_id: &str,
        email: &str,
    ) -> Result<Option<UsdtConversion>, LedgerError> {
        let conversion = self.db.fetch_conversion(trx_id).await?;
        Ok(conversion.filter(|c| c.customer_email.eq_ignore_ascii_case(email.trim())))
    }

    pub async fn fetch_conversion(&self, trx_id: &str) -> Result<Option<UsdtConversion>, LedgerError> {
        self.db.fetch_conversion(trx_id).await
    }

    pub async fn search_conversions(&self, query: ConversionQueryFilter) -> Result<Vec<UsdtConversion>, LedgerError> {
        self.db.search_conversions(query).await
    }

    /// Approves or rejects a pending conversion. Subscribers are notified once the decision has committed.
    pub async fn resolve_conversion(
        &self,
        trx_id: &str,
        resolution: ConversionResolution,
    ) -> Result<UsdtConversion, LedgerError> {
        if resolution.status == UsdtConversionStatus::Pending {
            return Err(LedgerError::ValidationError("A conversion can only be approved or rejected".into()));
        }
        let note = resolution.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if note.as_ref().map(|n| n.chars().count() > MAX_REVIEW_NOTE_LENGTH).unwrap_or(false) {
            return Err(LedgerError::ValidationError(format!(
                "The note is longer than {MAX_REVIEW_NOTE_LENGTH} characters"
            )));
        }
        let resolution = ConversionResolution { note, ..resolution };
        let conversion = self.db.resolve_conversion_locked(trx_id, resolution).await?;
        info!(
            "💱️ Conversion {} {} by admin {:?}",
            conversion.trx_id, conversion.status, conversion.approved_by
        );
        let event = UsdtConversionResolvedEvent::new(conversion.clone());
        for emitter in &self.producers.conversion_resolved_producer {
            debug!("💱️📬️ Notifying conversion resolved hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
        Ok(conversion)
    }
}
