use std::{collections::BTreeMap, ops::Range};

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::core::{
    Customer, Hold, PaymentGateway, PaymentMethod, Reservation, ReservationError,
    ReservationEvent, ReservationId, Resource, ResourceEvent, ResourceFilter, ResourceId,
    Timetable, TimetableError,
};
use crate::domain::{Aggregation, Entity, IdGenerator};

/// Domain events drained from the registry's aggregates, in the order they happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    ResourceEvent(ResourceEvent),
    ReservationEvent(ReservationEvent),
}

impl From<ResourceEvent> for RegistryEvent {
    fn from(value: ResourceEvent) -> Self {
        Self::ResourceEvent(value)
    }
}

impl From<ReservationEvent> for RegistryEvent {
    fn from(value: ReservationEvent) -> Self {
        Self::ReservationEvent(value)
    }
}

#[derive(Default)]
struct Ledger {
    resources: BTreeMap<ResourceId, Resource>,
    timetables: BTreeMap<ResourceId, Timetable>,
    reservations: BTreeMap<ReservationId, Reservation>,
    ids: IdGenerator,
    journal: Vec<RegistryEvent>,
}

impl Ledger {
    fn conflict(&self, id: &ResourceId, time: &Range<DateTime<Utc>>) -> Option<ReservationId> {
        self.timetables.get(id).and_then(|t| t.conflict(time))
    }

    fn is_held(&self, id: &ResourceId) -> bool {
        self.timetables.get(id).map_or(false, |t| !t.is_empty())
    }

    fn record<A>(journal: &mut Vec<RegistryEvent>, entity: &mut A)
    where
        A: Aggregation,
        RegistryEvent: From<A::Event>,
    {
        journal.extend(entity.pop_all().into_iter().map(RegistryEvent::from));
    }
}

/// Owner of the rentable resources and their reservations.
///
/// Every check-then-mutate sequence (`book`, `cancel`) runs under the write
/// lock, so two callers can never both win an overlapping window. Queries
/// share the read lock. Callers only ever receive copies of the records.
///
/// Each state change appends to an in-memory event journal that is only
/// emptied by `take_events`; long-running owners must drain it.
pub struct ReservationRegistry {
    ledger: RwLock<Ledger>,
    gateway: Box<dyn PaymentGateway>,
}

impl ReservationRegistry {
    pub fn new(gateway: Box<dyn PaymentGateway>, ids: IdGenerator) -> Self {
        Self {
            ledger: RwLock::new(Ledger {
                ids,
                ..Default::default()
            }),
            gateway,
        }
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.gateway.method()
    }

    /// Inserts or silently replaces the resource stored under the same key,
    /// returning the replaced record.
    ///
    /// The availability flag is taken from the resource's timetable, not from
    /// the record passed in.
    pub async fn register_resource(&self, mut resource: Resource) -> Option<Resource> {
        let mut guard = self.ledger.write().await;
        let ledger = &mut *guard;
        let id = resource.id();
        resource.change_availability(!ledger.is_held(&id));
        Ledger::record(&mut ledger.journal, &mut resource);
        info!("Resource registered: {}", id);
        ledger.resources.insert(id, resource)
    }

    /// Reservations on the resource are left untouched; re-registering the
    /// same key makes them visible again.
    pub async fn remove_resource(&self, id: &ResourceId) -> Option<Resource> {
        let mut guard = self.ledger.write().await;
        let ledger = &mut *guard;
        let mut resource = ledger.resources.remove(id)?;
        resource.remove();
        Ledger::record(&mut ledger.journal, &mut resource);
        if ledger.is_held(id) {
            warn!("Resource {} removed while it still has reservations", id);
        } else {
            info!("Resource removed: {}", id);
        }
        Some(resource)
    }

    /// A copy of the registered resource.
    pub async fn resource(&self, id: &ResourceId) -> Option<Resource> {
        self.ledger.read().await.resources.get(id).cloned()
    }

    /// All registered resources ordered by key.
    pub async fn resources(&self) -> Vec<Resource> {
        self.ledger.read().await.resources.values().cloned().collect()
    }

    /// Resources matching `filter` that are currently flagged available and
    /// have no reservation overlapping `time`, ordered by key.
    pub async fn find_available(
        &self,
        filter: &ResourceFilter,
        time: Range<DateTime<Utc>>,
    ) -> Result<Vec<Resource>, RegistryError> {
        validate_window(&time)?;
        let ledger = self.ledger.read().await;
        let found = ledger
            .resources
            .iter()
            .filter(|(_, r)| filter.matches(r) && r.is_available())
            .filter(|(id, _)| ledger.conflict(id, &time).is_none())
            .map(|(_, r)| r.clone())
            .collect::<Vec<_>>();
        debug!(
            "{} resource(s) available from {} to {}",
            found.len(),
            time.start,
            time.end
        );
        Ok(found)
    }

    /// Whether no reservation on `id` overlaps `time`. Fails with
    /// `UnknownResource` for a plate that is not registered, as `book` does.
    pub async fn is_available(
        &self,
        id: &ResourceId,
        time: Range<DateTime<Utc>>,
    ) -> Result<bool, RegistryError> {
        validate_window(&time)?;
        let ledger = self.ledger.read().await;
        if !ledger.resources.contains_key(id) {
            return Err(RegistryError::UnknownResource { id: id.clone() });
        }
        Ok(ledger.conflict(id, &time).is_none())
    }

    /// Reserves `id` for `time` and marks it unavailable. The returned copy
    /// carries the generated id and the total price.
    pub async fn book(
        &self,
        customer: Customer,
        id: &ResourceId,
        time: Range<DateTime<Utc>>,
    ) -> Result<Reservation, RegistryError> {
        validate_window(&time)?;
        let mut guard = self.ledger.write().await;
        let ledger = &mut *guard;
        let resource = ledger
            .resources
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownResource { id: id.clone() })?;
        if let Some(conflicting) = ledger.timetables.get(id).and_then(|t| t.conflict(&time)) {
            warn!(
                "Resource {} is unavailable from {} to {}: held by reservation {}",
                id, time.start, time.end, conflicting
            );
            return Err(RegistryError::ResourceUnavailable {
                id: id.clone(),
                conflicting,
            });
        }

        let reservation_id = loop {
            let candidate: ReservationId = ledger.ids.generate();
            if !ledger.reservations.contains_key(&candidate) {
                break candidate;
            }
        };
        let mut reservation = Reservation::book(reservation_id, customer, resource, time.clone())?;
        ledger
            .timetables
            .entry(id.clone())
            .or_default()
            .place(Hold::new(reservation_id, time))?;
        resource.change_availability(false);

        Ledger::record(&mut ledger.journal, &mut reservation);
        Ledger::record(&mut ledger.journal, resource);
        info!(
            "Reservation {} booked: {} for {} day(s), total {}",
            reservation_id,
            id,
            reservation.days(),
            reservation.total_price()
        );
        ledger.reservations.insert(reservation_id, reservation.clone());
        Ok(reservation)
    }

    /// Deletes the reservation and frees its window. The resource becomes
    /// available again once it has no other reservation.
    pub async fn cancel(&self, id: &ReservationId) -> Result<Reservation, RegistryError> {
        let mut guard = self.ledger.write().await;
        let ledger = &mut *guard;
        let mut reservation = ledger
            .reservations
            .remove(id)
            .ok_or(RegistryError::UnknownReservation { id: *id })?;
        if let Err(e) = reservation.cancel() {
            ledger.reservations.insert(*id, reservation);
            return Err(e.into());
        }
        Ledger::record(&mut ledger.journal, &mut reservation);

        let resource_id = reservation.resource_id();
        let emptied = match ledger.timetables.get_mut(resource_id) {
            Some(timetable) => {
                if let Err(e) = timetable.release(id) {
                    warn!("Reservation {} had no hold on {}: {}", id, resource_id, e);
                }
                timetable.is_empty()
            }
            None => false,
        };
        if emptied {
            ledger.timetables.remove(resource_id);
        }
        let held = ledger.is_held(resource_id);
        if let Some(resource) = ledger.resources.get_mut(resource_id) {
            resource.change_availability(!held);
            Ledger::record(&mut ledger.journal, resource);
        }
        info!("Reservation {} cancelled: {}", id, resource_id);
        Ok(reservation)
    }

    /// Charges the reservation's total through the configured gateway.
    ///
    /// State is left as it is whatever the outcome; on a decline the caller
    /// is expected to `cancel`.
    pub async fn charge(&self, id: &ReservationId) -> Result<bool, RegistryError> {
        let amount = {
            let ledger = self.ledger.read().await;
            ledger
                .reservations
                .get(id)
                .map(|r| *r.total_price())
                .ok_or(RegistryError::UnknownReservation { id: *id })?
        };
        let approved = self.gateway.charge(&amount).await;
        match approved {
            true => info!("Reservation {} paid {} by {}", id, amount, self.payment_method()),
            false => warn!("Payment of {} for reservation {} was declined", amount, id),
        }
        Ok(approved)
    }

    /// A copy of an active reservation.
    pub async fn reservation(&self, id: &ReservationId) -> Option<Reservation> {
        self.ledger.read().await.reservations.get(id).cloned()
    }

    /// Active reservations on a resource ordered by start time.
    pub async fn reservations_for(&self, id: &ResourceId) -> Vec<Reservation> {
        let ledger = self.ledger.read().await;
        ledger
            .timetables
            .get(id)
            .map(|t| {
                t.holds()
                    .iter()
                    .filter_map(|h| ledger.reservations.get(&h.reservation_id()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drains the events recorded since the previous call. The journal is
    /// unbounded until drained.
    pub async fn take_events(&self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.ledger.write().await.journal)
    }
}

fn validate_window(time: &Range<DateTime<Utc>>) -> Result<(), RegistryError> {
    match time.start < time.end {
        true => Ok(()),
        false => Err(RegistryError::InvalidWindow),
    }
}

#[derive(Error, Display, Debug)]
pub enum RegistryError {
    /// No resource is registered under the plate.
    #[display(fmt = "Resource {} is not registered", id)]
    UnknownResource { id: ResourceId },
    /// No active reservation has the id.
    #[display(fmt = "Reservation {} does not exist", id)]
    UnknownReservation { id: ReservationId },
    /// Another reservation holds an overlapping window.
    #[display(
        fmt = "Resource {} is already reserved for an overlapping window by {}",
        id,
        conflicting
    )]
    ResourceUnavailable {
        id: ResourceId,
        conflicting: ReservationId,
    },
    /// The window does not end after it starts.
    #[display(fmt = "Window must end after it starts")]
    InvalidWindow,
    /// Rejected by the reservation aggregate.
    #[display(fmt = "Reservation error: {}", _0)]
    Reservation(#[error(source)] ReservationError),
    /// Rejected by the resource's timetable.
    #[display(fmt = "Timetable error: {}", _0)]
    Timetable(#[error(source)] TimetableError),
}

impl From<ReservationError> for RegistryError {
    fn from(value: ReservationError) -> Self {
        Self::Reservation(value)
    }
}

impl From<TimetableError> for RegistryError {
    fn from(value: TimetableError) -> Self {
        Self::Timetable(value)
    }
}
