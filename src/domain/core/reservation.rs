use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::{Aggregation, Entity, Event, EventQueue, Id};

use super::{Customer, Money, Resource, ResourceId};

/// Snowflake-generated reservation number.
#[derive(
    Copy,
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
pub struct ReservationId(u64);

impl Id for ReservationId {
    type Inner = u64;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationEvent {
    /// A window was booked at the resource's current daily rate.
    ReservationBooked {
        id: ReservationId,
        customer: Customer,
        resource_id: ResourceId,
        time: Range<DateTime<Utc>>,
        daily_rate: Money,
    },
    /// The reservation was cancelled and its window released.
    ReservationCancelled { id: ReservationId },
}

impl Event for ReservationEvent {
    type Id = ReservationId;
}

/// A customer's hold on one resource for a time window, priced when booked.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    customer: Customer,
    resource_id: ResourceId,
    time: Range<DateTime<Utc>>,
    daily_rate: Money,
    total_price: Money,
    cancelled: bool,
    #[serde(skip)]
    events: EventQueue<ReservationEvent>,
}

impl Reservation {
    /// Books `resource` for `time`, fixing its current rate as the daily rate.
    pub fn book(
        id: ReservationId,
        customer: Customer,
        resource: &Resource,
        time: Range<DateTime<Utc>>,
    ) -> Result<Self, ReservationError> {
        Self::create(id, customer, resource.id(), time, *resource.price_per_day())
    }

    fn create(
        id: ReservationId,
        customer: Customer,
        resource_id: ResourceId,
        time: Range<DateTime<Utc>>,
        daily_rate: Money,
    ) -> Result<Self, ReservationError> {
        let mut entity = Reservation::default();
        let event = ReservationEvent::ReservationBooked {
            id,
            customer,
            resource_id,
            time,
            daily_rate,
        };
        entity.validate(&event)?;
        entity.apply(event);
        Ok(entity)
    }

    /// Fails with `AlreadyCancelled` on a second call.
    pub fn cancel(&mut self) -> Result<(), ReservationError> {
        let event = ReservationEvent::ReservationCancelled { id: self.id };
        self.validate(&event)?;
        self.apply(event);
        Ok(())
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn time(&self) -> &Range<DateTime<Utc>> {
        &self.time
    }

    pub fn daily_rate(&self) -> &Money {
        &self.daily_rate
    }

    pub fn total_price(&self) -> &Money {
        &self.total_price
    }

    pub fn days(&self) -> u64 {
        billable_days(&self.time)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn validate_id(&self, id: &ReservationId) -> Result<(), ReservationError> {
        if self.id != *id {
            return Err(ReservationError::MismatchedId);
        }
        Ok(())
    }

    fn validate_time(time: &Range<DateTime<Utc>>) -> Result<(), ReservationError> {
        if time.start >= time.end {
            return Err(ReservationError::InvalidTime);
        }
        Ok(())
    }

    fn price(time: &Range<DateTime<Utc>>, daily_rate: &Money) -> Result<Money, ReservationError> {
        daily_rate
            .checked_mul(billable_days(time))
            .ok_or(ReservationError::PriceOverflow)
    }
}

/// Whole days charged for a window: started days count in full, with a
/// minimum of one.
pub fn billable_days(time: &Range<DateTime<Utc>>) -> u64 {
    let duration = time.end - time.start;
    let whole = duration.num_days();
    let days = match duration > Duration::days(whole) {
        true => whole + 1,
        false => whole,
    };
    days.max(1) as u64
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Aggregation for Reservation {
    type Event = ReservationEvent;
    type Error = ReservationError;

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            ReservationEvent::ReservationBooked {
                time, daily_rate, ..
            } => {
                Self::validate_time(time)?;
                Self::price(time, daily_rate).map(|_| ())
            }
            ReservationEvent::ReservationCancelled { id } => {
                self.validate_id(id)?;
                match self.cancelled {
                    true => Err(ReservationError::AlreadyCancelled),
                    false => Ok(()),
                }
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match &event {
            ReservationEvent::ReservationBooked {
                id,
                customer,
                resource_id,
                time,
                daily_rate,
            } => {
                let total_price = match Self::price(time, daily_rate) {
                    Ok(total_price) => total_price,
                    Err(_) => return,
                };
                self.id = *id;
                self.customer = customer.clone();
                self.resource_id = resource_id.clone();
                self.time = time.clone();
                self.daily_rate = *daily_rate;
                self.total_price = total_price;
                self.cancelled = false;
            }
            ReservationEvent::ReservationCancelled { id } => {
                if self.id != *id {
                    return;
                }
                self.cancelled = true;
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

impl PartialEq for Reservation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.customer == other.customer
            && self.resource_id == other.resource_id
            && self.time == other.time
            && self.daily_rate == other.daily_rate
            && self.total_price == other.total_price
            && self.cancelled == other.cancelled
    }
}

impl Eq for Reservation {}

#[derive(Error, Display, Debug)]
pub enum ReservationError {
    /// The event belongs to another reservation.
    #[display(fmt = "ID does not match")]
    MismatchedId,
    /// The window does not end after it starts.
    #[display(fmt = "Reservation must end after it starts")]
    InvalidTime,
    /// Daily rate times billable days does not fit in `u64`.
    #[display(fmt = "Total price exceeds the representable amount")]
    PriceOverflow,
    /// `cancel` was called twice.
    #[display(fmt = "Reservation is already cancelled")]
    AlreadyCancelled,
}
