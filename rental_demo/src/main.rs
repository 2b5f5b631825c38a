use std::error::Error;

use chrono::{Duration, Utc};
use rental::{
    domain::{
        core::{Currency, Customer, CustomerId, Money, Resource, ResourceFilter},
        registry::{RegistryError, ReservationRegistry},
        Entity,
    },
    infrastructure, RentalConfig,
};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() {
    match RentalConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = run(&config).await {
                error!("Application error: {}", error);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("Application error: {}", error)
        }
    }
}

async fn run(config: &RentalConfig) -> Result<(), Box<dyn Error>> {
    let registry = infrastructure::registry(config);
    register_fleet(&registry, config.payment.currency).await?;

    let customer = Customer::create(
        CustomerId::from(1),
        "John Doe".to_owned(),
        "john@example.com".to_owned(),
        "DL1234".to_owned(),
    )?;

    let start = Utc::now();
    let end = start + Duration::hours(72);
    let filter = ResourceFilter::default().make("Toyota").model("Camry");
    let found = registry.find_available(&filter, start..end).await?;

    match found.first() {
        None => info!("No available cars found for the given criteria"),
        Some(car) => match registry.book(customer, &car.id(), start..end).await {
            Ok(reservation) => {
                info!(
                    "Reserved {} {} ({}) for {} day(s): {}",
                    car.make(),
                    car.model(),
                    car.id(),
                    reservation.days(),
                    reservation.total_price()
                );
                if registry.charge(&reservation.id()).await? {
                    info!("Reservation successful. Reservation ID: {}", reservation.id());
                } else {
                    info!("Payment failed. Reservation cancelled");
                    registry.cancel(&reservation.id()).await?;
                }
            }
            Err(RegistryError::ResourceUnavailable { .. }) => {
                info!("Selected car is not available for the given dates")
            }
            Err(e) => return Err(e.into()),
        },
    }

    for event in registry.take_events().await {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

async fn register_fleet(
    registry: &ReservationRegistry,
    currency: Currency,
) -> Result<(), Box<dyn Error>> {
    let fleet = [
        ("ABC123", "Toyota", "Camry", 2022, 5000),
        ("XYZ789", "Honda", "Civic", 2021, 4500),
        ("DEF456", "Ford", "Mustang", 2023, 8000),
    ];
    for (plate, make, model, year, price) in fleet {
        let resource = Resource::register(
            plate.into(),
            make.to_owned(),
            model.to_owned(),
            year,
            Money::new(price, currency),
        )?;
        registry.register_resource(resource).await;
    }
    Ok(())
}
