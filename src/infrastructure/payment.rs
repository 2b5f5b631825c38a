use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::core::{Money, PaymentGateway, PaymentMethod};
use crate::Payment;

/// Card processor. Approves every charge unless a per-charge limit is set.
#[derive(Clone, Debug, Default)]
pub struct CardPaymentGateway {
    limit: Option<Money>,
}

impl CardPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Money) -> Self {
        Self { limit: Some(limit) }
    }
}

#[async_trait]
impl PaymentGateway for CardPaymentGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Card
    }

    async fn charge(&self, amount: &Money) -> bool {
        match self.limit.map(|limit| amount.fits_within(&limit)) {
            None | Some(Some(true)) => {
                info!("Card payment approved: {}", amount);
                true
            }
            Some(_) => {
                warn!("Card payment declined: {}", amount);
                false
            }
        }
    }
}

/// Prepaid wallet. Each approved charge is debited from the balance.
#[derive(Debug)]
pub struct WalletPaymentGateway {
    balance: Mutex<Money>,
}

impl WalletPaymentGateway {
    pub fn new(balance: Money) -> Self {
        Self {
            balance: Mutex::new(balance),
        }
    }

    pub async fn balance(&self) -> Money {
        *self.balance.lock().await
    }
}

#[async_trait]
impl PaymentGateway for WalletPaymentGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Wallet
    }

    async fn charge(&self, amount: &Money) -> bool {
        let mut balance = self.balance.lock().await;
        match balance.checked_sub(amount) {
            Some(rest) => {
                *balance = rest;
                info!("Wallet payment approved: {} (remaining {})", amount, rest);
                true
            }
            None => {
                warn!("Wallet payment declined: {} (balance {})", amount, *balance);
                false
            }
        }
    }
}

pub fn payment_gateway(config: &Payment) -> Box<dyn PaymentGateway> {
    match config.method {
        PaymentMethod::Card => match config.card_limit {
            Some(limit) => Box::new(CardPaymentGateway::with_limit(Money::new(
                limit,
                config.currency,
            ))),
            None => Box::new(CardPaymentGateway::new()),
        },
        PaymentMethod::Wallet => Box::new(WalletPaymentGateway::new(Money::new(
            config.wallet_balance,
            config.currency,
        ))),
    }
}
