use std::{fmt, ops::Range};

use bio::data_structures::interval_tree::IntervalTree;
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use super::ReservationId;

/// A window during which a resource is held by a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hold {
    reservation_id: ReservationId,
    time: Range<DateTime<Utc>>,
}

impl Hold {
    pub fn new(reservation_id: ReservationId, time: Range<DateTime<Utc>>) -> Self {
        Self {
            reservation_id,
            time,
        }
    }

    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }

    pub fn time(&self) -> &Range<DateTime<Utc>> {
        &self.time
    }
}

/// Interval index of the holds placed on one resource.
///
/// Windows are half-open, so a hold ending at 10:00 and another starting at
/// 10:00 do not overlap. Holds are kept ordered by start time.
pub struct Timetable {
    holds: Vec<Hold>,
    index: IntervalTree<DateTime<Utc>, ReservationId>,
}

impl Timetable {
    pub fn new() -> Self {
        Self {
            holds: Vec::new(),
            index: IntervalTree::new(),
        }
    }

    pub fn place(&mut self, hold: Hold) -> Result<(), TimetableError> {
        self.validate_time(&hold.time)?;
        self.validate_duplicate_hold(&hold.reservation_id)?;
        self.validate_overlapping_hold(&hold.time)?;
        self.index.insert(hold.time.clone(), hold.reservation_id);
        let at = self
            .holds
            .partition_point(|h| h.time.start <= hold.time.start);
        self.holds.insert(at, hold);
        Ok(())
    }

    pub fn release(&mut self, reservation_id: &ReservationId) -> Result<Hold, TimetableError> {
        let pos = self
            .holds
            .iter()
            .position(|h| h.reservation_id == *reservation_id)
            .ok_or(TimetableError::HoldNotFound)?;
        let hold = self.holds.remove(pos);
        self.index = self
            .holds
            .iter()
            .map(|h| (h.time.clone(), h.reservation_id))
            .collect();
        Ok(hold)
    }

    /// The first hold overlapping `time`, if any. An empty or reversed
    /// window overlaps nothing.
    pub fn conflict(&self, time: &Range<DateTime<Utc>>) -> Option<ReservationId> {
        if time.start >= time.end {
            return None;
        }
        self.index.find(time.clone()).next().map(|entry| *entry.data())
    }

    pub fn is_free(&self, time: &Range<DateTime<Utc>>) -> bool {
        self.conflict(time).is_none()
    }

    pub fn holds(&self) -> &[Hold] {
        &self.holds
    }

    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    fn validate_time(&self, time: &Range<DateTime<Utc>>) -> Result<(), TimetableError> {
        match time.start < time.end {
            true => Ok(()),
            false => Err(TimetableError::InvalidTime),
        }
    }

    fn validate_duplicate_hold(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<(), TimetableError> {
        match self.holds.iter().find(|h| h.reservation_id == *reservation_id) {
            Some(_) => Err(TimetableError::DuplicateHold),
            None => Ok(()),
        }
    }

    fn validate_overlapping_hold(
        &self,
        time: &Range<DateTime<Utc>>,
    ) -> Result<(), TimetableError> {
        match self.conflict(time) {
            Some(reservation_id) => Err(TimetableError::Overlapping { reservation_id }),
            None => Ok(()),
        }
    }
}

impl Default for Timetable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timetable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timetable").field("holds", &self.holds).finish()
    }
}

#[derive(Error, Display, Debug)]
pub enum TimetableError {
    /// The window overlaps a hold already placed.
    #[display(fmt = "Window overlaps with reservation {}", reservation_id)]
    Overlapping { reservation_id: ReservationId },
    /// The reservation already has a hold here.
    #[display(fmt = "The reservation already holds this resource")]
    DuplicateHold,
    /// No hold belongs to the reservation.
    #[display(fmt = "The reservation does not hold this resource")]
    HoldNotFound,
    /// The window does not end after it starts.
    #[display(fmt = "Window must end after it starts")]
    InvalidTime,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn timetable() -> Timetable {
        let mut timetable = Timetable::new();
        timetable.place(Hold::new(1.into(), at(10)..at(20))).unwrap();
        timetable
    }

    #[test]
    fn test_overlap_detection() {
        let timetable = timetable();
        assert_eq!(timetable.conflict(&(at(15)..at(25))), Some(1.into()));
        assert_eq!(timetable.conflict(&(at(5)..at(11))), Some(1.into()));
        assert_eq!(timetable.conflict(&(at(12)..at(13))), Some(1.into()));
        assert_eq!(timetable.conflict(&(at(0)..at(30))), Some(1.into()));
        assert!(timetable.is_free(&(at(0)..at(5))));
        assert!(timetable.is_free(&(at(25)..at(30))));
    }

    #[test]
    fn test_back_to_back_windows_are_free() {
        let timetable = timetable();
        assert!(timetable.is_free(&(at(20)..at(30))));
        assert!(timetable.is_free(&(at(0)..at(10))));
    }

    #[test]
    fn test_place_rejects_overlap() {
        let mut timetable = timetable();
        assert!(matches!(
            timetable.place(Hold::new(2.into(), at(19)..at(21))),
            Err(TimetableError::Overlapping { reservation_id }) if reservation_id == ReservationId::from(1)
        ));
        assert!(matches!(
            timetable.place(Hold::new(1.into(), at(40)..at(41))),
            Err(TimetableError::DuplicateHold)
        ));
    }

    #[test]
    fn test_place_rejects_invalid_window() {
        let mut timetable = Timetable::new();
        assert!(matches!(
            timetable.place(Hold::new(1.into(), at(10)..at(0))),
            Err(TimetableError::InvalidTime)
        ));
        assert!(matches!(
            timetable.place(Hold::new(1.into(), at(10)..at(10))),
            Err(TimetableError::InvalidTime)
        ));
        assert!(timetable.is_empty());
        assert!(timetable.is_free(&(at(20)..at(30))));

        timetable.place(Hold::new(2.into(), at(0)..at(10))).unwrap();
        assert_eq!(timetable.conflict(&(at(5)..at(1))), None);
        assert_eq!(timetable.conflict(&(at(5)..at(5))), None);
        assert_eq!(timetable.conflict(&(at(5)..at(6))), Some(2.into()));
    }

    #[test]
    fn test_index_follows_release() {
        let mut timetable = timetable();
        timetable.place(Hold::new(2.into(), at(20)..at(30))).unwrap();
        timetable.release(&1.into()).unwrap();
        assert!(timetable.is_free(&(at(10)..at(20))));
        assert_eq!(timetable.conflict(&(at(15)..at(25))), Some(2.into()));
        timetable.place(Hold::new(3.into(), at(10)..at(20))).unwrap();
        assert_eq!(timetable.conflict(&(at(0)..at(11))), Some(3.into()));
    }

    #[test]
    fn test_holds_sorted_by_start() {
        let mut timetable = timetable();
        timetable.place(Hold::new(3.into(), at(30)..at(40))).unwrap();
        timetable.place(Hold::new(2.into(), at(0)..at(10))).unwrap();
        let ids = timetable
            .holds()
            .iter()
            .map(Hold::reservation_id)
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![ReservationId::from(2), ReservationId::from(1), ReservationId::from(3)]
        );
    }

    #[test]
    fn test_release() {
        let mut timetable = timetable();
        let hold = timetable.release(&1.into()).unwrap();
        assert_eq!(hold.time(), &(at(10)..at(20)));
        assert!(timetable.is_empty());
        assert!(timetable.is_free(&(at(10)..at(20))));
        assert!(matches!(
            timetable.release(&1.into()),
            Err(TimetableError::HoldNotFound)
        ));
    }
}
