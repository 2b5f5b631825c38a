use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::domain::core::{Currency, PaymentMethod};

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct RentalConfig {
    pub logger: Logger,
    pub payment: Payment,
    pub snowflake: Snowflake,
}

impl RentalConfig {
    /// `rental.toml` is optional; `RENTAL__PAYMENT__METHOD=wallet` style variables override it.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("rental.toml").required(false))
            .add_source(Environment::with_prefix("RENTAL").separator("__"))
            .build()?
            .try_deserialize::<RentalConfig>()
    }

    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<RentalConfig>()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("logger.level", "INFO")?
            .set_default("payment.method", "card")?
            .set_default("payment.currency", "USD")?
            .set_default("payment.wallet_balance", 0_i64)?
            .set_default("snowflake.machine_id", 1_i64)?
            .set_default("snowflake.node_id", 1_i64)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub currency: Currency,
    /// Per-charge ceiling for card payments, in minor units.
    pub card_limit: Option<u64>,
    /// Prepaid wallet funds, in minor units.
    pub wallet_balance: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Snowflake {
    pub machine_id: i32,
    pub node_id: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}
