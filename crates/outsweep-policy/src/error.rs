use thiserror::Error;

use crate::executor::DeclineReport;
use crate::platform::PlatformError;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Catalog lookup failed: {0}")]
    Catalog(outsweep_store::StoreError),

    #[error("No gain policy configured for trade type {0:?}")]
    UnknownTradeType(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Store error: {0}")]
    Store(#[from] outsweep_store::StoreError),

    #[error("Offer {offer_id}: {quantity} does not fit in range")]
    Overflow { offer_id: u64, quantity: &'static str },

    #[error("Decline incomplete: {0}")]
    PartialDecline(DeclineReport),
}
