use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::{Aggregation, Entity, Event, EventQueue, Id};

use super::Money;

/// License plate of a rentable car.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
    Default,
)]
pub struct ResourceId(String);

impl Id for ResourceId {
    type Inner = String;
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceEvent {
    /// A car joined the fleet. Registration makes it available.
    ResourceRegistered {
        id: ResourceId,
        make: String,
        model: String,
        year: u16,
        price_per_day: Money,
    },
    /// The availability flag flipped.
    AvailabilityChanged {
        id: ResourceId,
        available: bool,
    },
    /// The car left the fleet.
    ResourceRemoved {
        id: ResourceId,
    },
}

impl Event for ResourceEvent {
    type Id = ResourceId;
}

/// A rentable car keyed by its license plate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    make: String,
    model: String,
    year: u16,
    price_per_day: Money,
    available: bool,
    #[serde(skip)]
    events: EventQueue<ResourceEvent>,
}

impl Resource {
    pub fn register(
        id: ResourceId,
        make: String,
        model: String,
        year: u16,
        price_per_day: Money,
    ) -> Result<Self, ResourceError> {
        let mut entity = Resource::default();
        let event = ResourceEvent::ResourceRegistered {
            id,
            make,
            model,
            year,
            price_per_day,
        };
        entity.validate(&event)?;
        entity.apply(event);
        Ok(entity)
    }

    /// No event is recorded when the flag already has the requested value.
    pub fn change_availability(&mut self, available: bool) {
        if self.available == available {
            return;
        }
        self.apply(ResourceEvent::AvailabilityChanged {
            id: self.id.clone(),
            available,
        });
    }

    pub fn remove(&mut self) {
        self.apply(ResourceEvent::ResourceRemoved {
            id: self.id.clone(),
        });
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn price_per_day(&self) -> &Money {
        &self.price_per_day
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn validate_id(&self, id: &ResourceId) -> Result<(), ResourceError> {
        match self.id == *id {
            true => Ok(()),
            false => Err(ResourceError::MismatchedId),
        }
    }

    fn validate_registered(id: &ResourceId, make: &str, model: &str) -> Result<(), ResourceError> {
        if id.trim().is_empty() {
            return Err(ResourceError::IdIsBlank);
        }
        if make.trim().is_empty() {
            return Err(ResourceError::MakeIsBlank);
        }
        if model.trim().is_empty() {
            return Err(ResourceError::ModelIsBlank);
        }
        Ok(())
    }
}

impl Entity for Resource {
    type Id = ResourceId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }
}

impl Aggregation for Resource {
    type Event = ResourceEvent;
    type Error = ResourceError;

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            ResourceEvent::ResourceRegistered {
                id, make, model, ..
            } => Self::validate_registered(id, make, model),
            ResourceEvent::AvailabilityChanged { id, .. }
            | ResourceEvent::ResourceRemoved { id } => self.validate_id(id),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match &event {
            ResourceEvent::ResourceRegistered {
                id,
                make,
                model,
                year,
                price_per_day,
            } => {
                self.id = id.clone();
                self.make = make.clone();
                self.model = model.clone();
                self.year = *year;
                self.price_per_day = *price_per_day;
                self.available = true;
            }
            ResourceEvent::AvailabilityChanged { id, available } => {
                if self.id != *id {
                    return;
                }
                self.available = *available;
            }
            ResourceEvent::ResourceRemoved { id } => {
                if self.id != *id {
                    return;
                }
            }
        }
        self.events.push(event);
    }

    fn events(&self) -> &EventQueue<Self::Event> {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventQueue<Self::Event> {
        &mut self.events
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.make == other.make
            && self.model == other.model
            && self.year == other.year
            && self.price_per_day == other.price_per_day
            && self.available == other.available
    }
}

impl Eq for Resource {}

#[derive(Error, Display, Debug)]
pub enum ResourceError {
    /// The event belongs to another resource.
    #[display(fmt = "ID does not match")]
    MismatchedId,
    /// Plate is empty or whitespace.
    #[display(fmt = "License plate cannot be blank")]
    IdIsBlank,
    /// Make is empty or whitespace.
    #[display(fmt = "Make cannot be blank")]
    MakeIsBlank,
    /// Model is empty or whitespace.
    #[display(fmt = "Model cannot be blank")]
    ModelIsBlank,
}

/// Attribute criteria for availability searches. Unset fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFilter {
    make: Option<String>,
    model: Option<String>,
    year: Option<u16>,
    max_price_per_day: Option<Money>,
}

impl ResourceFilter {
    pub fn make(mut self, make: impl Into<String>) -> Self {
        self.make = Some(make.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn max_price_per_day(mut self, price: Money) -> Self {
        self.max_price_per_day = Some(price);
        self
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        self.make.as_deref().map_or(true, |m| m == resource.make)
            && self.model.as_deref().map_or(true, |m| m == resource.model)
            && self.year.map_or(true, |y| y == resource.year)
            && self.max_price_per_day.map_or(true, |limit| {
                resource.price_per_day.fits_within(&limit).unwrap_or(false)
            })
    }
}
