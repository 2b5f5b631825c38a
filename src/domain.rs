pub mod core;
pub mod registry;

use serde::{Deserialize, Serialize};
use snowflake::SnowflakeIdGenerator;
use std::{
    collections::VecDeque,
    error::Error,
    fmt::{Debug, Display},
    hash::Hash,
    ops::Deref,
};

pub trait Id:
    Clone
    + Eq
    + Ord
    + Hash
    + Deref<Target = Self::Inner>
    + From<Self::Inner>
    + Display
    + Debug
    + Serialize
    + for<'de> Deserialize<'de>
{
    type Inner;
}

pub trait Event: Clone + Eq + Debug + Serialize + for<'a> Deserialize<'a> {
    type Id: Id;
}

pub trait Entity {
    type Id: Id;

    fn id(&self) -> Self::Id;
}

/// An entity whose state changes are expressed as events.
///
/// Mutators build an event and hand it to `apply`, running `validate` first
/// whenever the event can be rejected. `apply` is the only place state
/// changes, and it records the event in the pending queue so the owner can
/// drain it.
pub trait Aggregation: Entity {
    type Event: Event<Id = Self::Id>;
    type Error: Error;

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error>;
    fn apply(&mut self, event: Self::Event);
    fn events(&self) -> &EventQueue<Self::Event>;
    fn events_mut(&mut self) -> &mut EventQueue<Self::Event>;
    fn pop(&mut self) -> Option<Self::Event> {
        self.events_mut().pop()
    }
    fn pop_all(&mut self) -> Vec<Self::Event> {
        self.events_mut().drain()
    }
    fn clear(&mut self) {
        self.events_mut().drain();
    }
    fn peek(&self) -> Option<&Self::Event> {
        self.events().peek()
    }
}

/// Pending events of an aggregate, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQueue<T>(VecDeque<T>);

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self(VecDeque::new())
    }

    pub fn push(&mut self, event: T) {
        self.0.push_back(event)
    }

    pub fn pop(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    pub fn peek(&self) -> Option<&T> {
        self.0.front()
    }

    pub fn drain(&mut self) -> Vec<T> {
        self.0.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Snowflake ids: time ordered and unique per `(machine_id, node_id)`.
pub struct IdGenerator(SnowflakeIdGenerator);

impl IdGenerator {
    pub fn new(machine_id: i32, node_id: i32) -> Self {
        Self(SnowflakeIdGenerator::new(machine_id, node_id))
    }

    pub fn generate<T>(&mut self) -> T
    where
        T: From<u64>,
    {
        T::from(self.0.generate() as u64)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_fifo() {
        let mut queue = EventQueue::new();
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek(), Some(&1));
        assert_eq!(queue.pop(), Some(1));
        queue.push(3);
        assert_eq!(queue.drain(), vec![2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_id_generator_unique() {
        let mut gen = IdGenerator::default();
        let ids = (0..10_000).map(|_| gen.generate::<u64>()).collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }
}
