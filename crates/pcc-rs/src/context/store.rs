//! Ordered message storage with incremental token bookkeeping.
//!
//! Messages live in an arena of slots addressed by [`MessageId`] handles; a
//! separate order list records insertion (age) order, oldest first. Removing a
//! message frees its slot and bumps the slot generation, so any handle still
//! pointing at it becomes stale instead of aliasing a newer message.
//!
//! `total_tokens` and the message count are updated together with every
//! append and removal.

use crate::error::{Error, Result};
use crate::Message;
use std::collections::{HashSet, VecDeque};

/// Stable handle to a message held by a [`MessageStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    message: Option<Message>,
}

#[derive(Debug, Default)]
pub struct MessageStore {
    slots: Vec<Slot>,
    free: Vec<usize>,
    order: VecDeque<MessageId>,
    total_tokens: usize,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of the cached token counts of every stored message.
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Append at the newest end.
    ///
    /// Capacity is reserved and the new total computed before anything is
    /// touched, so a failure leaves the store unchanged.
    pub fn push(&mut self, message: Message) -> Result<MessageId> {
        let total_tokens = self
            .total_tokens
            .checked_add(message.token_count)
            .ok_or_else(|| Error::InvalidParameter("total token count overflows".into()))?;
        self.order.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
        if self.free.is_empty() {
            self.slots.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
        }

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.message = Some(message);
                MessageId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    message: Some(message),
                });
                MessageId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };

        self.order.push_back(id);
        self.total_tokens = total_tokens;
        Ok(id)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.message.as_ref())
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a single message by handle. Returns `None` for stale handles.
    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        let message = self.release(id)?;
        if let Some(pos) = self.order.iter().position(|&o| o == id) {
            self.order.remove(pos);
        }
        Some(message)
    }

    /// Remove a batch of messages in one pass over the order list.
    ///
    /// Returned messages are in the order of `ids`; stale handles are skipped.
    pub fn remove_many(&mut self, ids: &[MessageId]) -> Vec<Message> {
        let mut removed = Vec::with_capacity(ids.len());
        let mut gone = HashSet::with_capacity(ids.len());
        for &id in ids {
            if let Some(message) = self.release(id) {
                gone.insert(id);
                removed.push(message);
            }
        }
        if !gone.is_empty() {
            self.order.retain(|id| !gone.contains(id));
        }
        removed
    }

    /// Remove and return the oldest message.
    pub fn pop_oldest(&mut self) -> Option<Message> {
        let id = self.order.pop_front()?;
        self.release(id)
    }

    /// Handle of the first (oldest) message satisfying `pred`.
    pub fn find(&self, mut pred: impl FnMut(&Message) -> bool) -> Option<MessageId> {
        self.iter().find(|(_, m)| pred(m)).map(|(id, _)| id)
    }

    /// Handles of every message satisfying `pred`, oldest first.
    pub fn collect_ids(&self, mut pred: impl FnMut(&Message) -> bool) -> Vec<MessageId> {
        self.iter()
            .filter(|(_, m)| pred(m))
            .map(|(id, _)| id)
            .collect()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (MessageId, &Message)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.get(id).map(|m| (id, m)))
    }

    /// Drop every message. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for id in std::mem::take(&mut self.order) {
            self.release(id);
        }
        debug_assert_eq!(self.total_tokens, 0);
    }

    /// Free a slot without touching the order list.
    fn release(&mut self, id: MessageId) -> Option<Message> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let message = slot.message.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.total_tokens -= message.token_count;
        Some(message)
    }
}
