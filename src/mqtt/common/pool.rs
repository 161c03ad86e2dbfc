/**
 * MIT License
 *
 * Copyright (c) 2025 Takatoshi Kondo
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use serde::Serialize;

/// Handle to a pool slot: array index plus a generation counter.
///
/// The generation defeats use-after-free: releasing a slot bumps its
/// generation, so a stale handle held across a release dereferences to
/// `None` instead of aliasing the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
    /// Next slot in whichever intrusive list this slot is on.
    next: Option<u32>,
    in_use: bool,
}

/// Bounded pool of fixed-capacity records with stable identity.
///
/// Backed by a contiguous slot array with two intrusive singly-linked lists
/// over it: a free list (LIFO, allocation is O(1)) and an in-use list kept
/// in insertion order (the broker round-robins sessions in the order they
/// were admitted). Every slot is on exactly one of the two lists; the lists
/// partition the array. No allocation happens after construction.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    used_head: Option<u32>,
    used_tail: Option<u32>,
    used_count: usize,
}

impl<T> Pool<T> {
    /// Create a pool with `capacity` slots, all free.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = u32::try_from(capacity).expect("pool capacity fits u32");
        let mut slots = Vec::with_capacity(capacity as usize);
        for index in 0..capacity {
            let next = if index + 1 < capacity {
                Some(index + 1)
            } else {
                None
            };
            slots.push(Slot {
                value: None,
                generation: 0,
                next,
                in_use: false,
            });
        }
        Self {
            slots,
            free_head: if capacity > 0 { Some(0) } else { None },
            used_head: None,
            used_tail: None,
            used_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.used_count
    }

    pub fn is_empty(&self) -> bool {
        self.used_count == 0
    }

    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Move a slot from the free list to the tail of the in-use list and
    /// store `value` in it. Returns `None` when the pool is exhausted.
    pub fn allocate(&mut self, value: T) -> Option<SlotId> {
        let index = self.free_head?;
        let slot = &mut self.slots[index as usize];
        self.free_head = slot.next;

        slot.value = Some(value);
        slot.next = None;
        slot.in_use = true;
        let id = SlotId {
            index,
            generation: slot.generation,
        };

        match self.used_tail {
            Some(tail) => self.slots[tail as usize].next = Some(index),
            None => self.used_head = Some(index),
        }
        self.used_tail = Some(index);
        self.used_count += 1;
        Some(id)
    }

    /// Return a slot to the free list, bumping its generation. Yields the
    /// stored value, or `None` for a stale or unknown handle.
    pub fn release(&mut self, id: SlotId) -> Option<T> {
        if !self.is_live(id) {
            return None;
        }

        // unlink from the in-use list
        let index = id.index;
        let mut prev: Option<u32> = None;
        let mut cursor = self.used_head;
        while let Some(current) = cursor {
            if current == index {
                break;
            }
            prev = Some(current);
            cursor = self.slots[current as usize].next;
        }
        let next = self.slots[index as usize].next;
        match prev {
            Some(prev) => self.slots[prev as usize].next = next,
            None => self.used_head = next,
        }
        if self.used_tail == Some(index) {
            self.used_tail = prev;
        }

        let slot = &mut self.slots[index as usize];
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.next = self.free_head;
        self.free_head = Some(index);
        self.used_count -= 1;
        slot.value.take()
    }

    /// True when `id` still refers to the allocation it was produced by.
    pub fn is_live(&self, id: SlotId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.in_use && slot.generation == id.generation)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        if !self.is_live(id) {
            return None;
        }
        self.slots[id.index()].value.as_ref()
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        if !self.is_live(id) {
            return None;
        }
        self.slots[id.index()].value.as_mut()
    }

    /// Handles of all live slots in insertion order.
    ///
    /// Collected into a buffer so callers may allocate and release while
    /// walking; handles released mid-walk simply dereference to `None`.
    pub fn live_ids(&self) -> Vec<SlotId> {
        let mut ids = Vec::with_capacity(self.used_count);
        let mut cursor = self.used_head;
        while let Some(index) = cursor {
            let slot = &self.slots[index as usize];
            ids.push(SlotId {
                index,
                generation: slot.generation,
            });
            cursor = slot.next;
        }
        ids
    }

    /// Iterate live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        PoolIter {
            pool: self,
            cursor: self.used_head,
        }
    }
}

struct PoolIter<'a, T> {
    pool: &'a Pool<T>,
    cursor: Option<u32>,
}

impl<'a, T> Iterator for PoolIter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.pool.slots[index as usize];
        self.cursor = slot.next;
        let id = SlotId {
            index,
            generation: slot.generation,
        };
        Some((id, slot.value.as_ref().expect("live slot holds a value")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_and_used_lists_partition_the_array() {
        let mut pool = Pool::with_capacity(3);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.len(), 0);

        let a = pool.allocate("a").unwrap();
        let b = pool.allocate("b").unwrap();
        let c = pool.allocate("c").unwrap();
        assert!(pool.is_full());
        assert!(pool.allocate("d").is_none());

        assert_eq!(pool.release(b), Some("b"));
        assert_eq!(pool.len(), 2);
        assert!(!pool.is_full());

        // b's slot is reusable, a and c untouched
        let b2 = pool.allocate("b2").unwrap();
        assert!(pool.is_full());
        assert_eq!(pool.get(a), Some(&"a"));
        assert_eq!(pool.get(c), Some(&"c"));
        assert_eq!(pool.get(b2), Some(&"b2"));
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut pool = Pool::with_capacity(1);
        let first = pool.allocate(1u32).unwrap();
        pool.release(first);
        let second = pool.allocate(2u32).unwrap();

        // same slot, new generation
        assert_eq!(first.index(), second.index());
        assert!(!pool.is_live(first));
        assert_eq!(pool.get(first), None);
        assert_eq!(pool.get_mut(first), None);
        assert_eq!(pool.release(first), None);
        assert_eq!(pool.get(second), Some(&2));
    }

    #[test]
    fn iteration_preserves_insertion_order_across_churn() {
        let mut pool = Pool::with_capacity(4);
        let a = pool.allocate("a").unwrap();
        let b = pool.allocate("b").unwrap();
        let c = pool.allocate("c").unwrap();
        pool.release(b);
        let d = pool.allocate("d").unwrap();
        let _ = (a, c, d);

        let order: Vec<&str> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, ["a", "c", "d"]);
        let ids = pool.live_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| pool.is_live(*id)));
    }

    #[test]
    fn release_head_and_tail_keep_links_consistent() {
        let mut pool = Pool::with_capacity(3);
        let a = pool.allocate(1).unwrap();
        let b = pool.allocate(2).unwrap();
        let c = pool.allocate(3).unwrap();

        pool.release(a); // head
        assert_eq!(pool.iter().map(|(_, v)| *v).collect::<Vec<_>>(), [2, 3]);
        pool.release(c); // tail
        assert_eq!(pool.iter().map(|(_, v)| *v).collect::<Vec<_>>(), [2]);
        pool.release(b); // last
        assert!(pool.is_empty());

        // every slot is free again
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(pool.allocate(i).unwrap());
        }
        assert!(pool.is_full());
    }
}
