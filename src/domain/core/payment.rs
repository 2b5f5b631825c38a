use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::Money;

/// How the registry's gateway collects money, as named in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit card processor.
    #[display(fmt = "card")]
    Card,
    /// Prepaid wallet, standing in for online payment services.
    #[display(fmt = "wallet")]
    Wallet,
}

/// Charges an amount and reports whether it was approved.
///
/// There are no retries or partial captures: a declined charge leaves nothing
/// to undo, and the caller decides what to do with the reservation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn method(&self) -> PaymentMethod;
    async fn charge(&self, amount: &Money) -> bool;
}
