mod payment;

pub use self::payment::*;

use crate::domain::{registry::ReservationRegistry, IdGenerator};
use crate::RentalConfig;

/// Builds a registry wired with the configured payment gateway and id generator.
pub fn registry(config: &RentalConfig) -> ReservationRegistry {
    ReservationRegistry::new(
        payment_gateway(&config.payment),
        IdGenerator::new(config.snowflake.machine_id, config.snowflake.node_id),
    )
}
