// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Fixed-capacity ring of bucket timestamps.
//!
//! ```text
//!   slots: [t2, t3, _, t1]    head = 3, len = 3
//!   front => slots[head]                      (oldest)
//!   back  => slots[(head + len - 1) % cap]    (newest)
//! ```

/// A ring buffer holding at most `capacity` timestamps, oldest at the front.
///
/// The storage is allocated once and never grows. A push into a full ring and
/// a pop from an empty ring are reported to the caller instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BucketRing {
    slots: Box<[u64]>,
    head: usize,
    len: usize,
}

impl BucketRing {
    /// Creates an empty ring.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        BucketRing {
            slots: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Appends `value` at the back, handing it back if the ring is full.
    pub fn push_back(&mut self, value: u64) -> Result<(), u64> {
        if self.is_full() {
            return Err(value);
        }
        let tail = self.physical(self.len);
        self.slots[tail] = value;
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the oldest value.
    pub fn pop_front(&mut self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head];
        self.head = self.physical(1);
        self.len -= 1;
        Some(value)
    }

    /// Returns the oldest value without removing it.
    pub fn front(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.head])
        }
    }

    /// Returns the newest value without removing it.
    pub fn back(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.physical(self.len - 1)])
        }
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |i| self.slots[self.physical(i)])
    }

    /// Heap bytes held by the slot storage.
    pub fn allocated_bytes(&self) -> usize {
        std::mem::size_of_val(&*self.slots)
    }

    #[inline]
    fn physical(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ring() {
        let mut ring = BucketRing::with_capacity(3);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.capacity(), 3);
        assert_eq!(ring.front(), None);
        assert_eq!(ring.back(), None);
        assert_eq!(ring.pop_front(), None);
        assert_eq!(ring.allocated_bytes(), 3 * 8);
    }

    #[test]
    fn test_push_until_full() {
        let mut ring = BucketRing::with_capacity(2);
        assert_eq!(ring.push_back(1), Ok(()));
        assert_eq!(ring.push_back(2), Ok(()));
        assert!(ring.is_full());
        assert_eq!(ring.push_back(3), Err(3));
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_wraps_and_keeps_order() {
        let mut ring = BucketRing::with_capacity(3);
        for ts in 1..=3 {
            ring.push_back(ts).unwrap();
        }
        assert_eq!(ring.pop_front(), Some(1));
        assert_eq!(ring.pop_front(), Some(2));
        ring.push_back(4).unwrap();
        ring.push_back(5).unwrap();
        assert_eq!(ring.front(), Some(3));
        assert_eq!(ring.back(), Some(5));
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![3, 4, 5]);

        for expected in 3..=5 {
            assert_eq!(ring.pop_front(), Some(expected));
        }
        assert!(ring.is_empty());
    }

    #[test]
    #[should_panic(expected = "ring capacity must be positive")]
    fn test_zero_capacity() {
        BucketRing::with_capacity(0);
    }
}
