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

use std::fmt;

use super::ring::BucketRing;

/// Outcome of [`BucketGroup::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The group absorbed the bucket.
    NoCarry,
    /// The two oldest buckets were merged; the timestamp of the merged bucket
    /// must be inserted into the group of the next weight class.
    Carry(u64),
}

/// Outcome of [`BucketGroup::expire_if_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// The oldest bucket left the window; holds the weight it represented.
    Expired(u64),
    /// The group holds buckets but the oldest one is still inside the window.
    NotDue,
    /// The group holds no buckets.
    Empty,
}

/// All buckets of one weight class `2^index`, stored as the timestamps of
/// their most recent item, oldest first.
///
/// A group holds at most `k + 1` buckets. Inserting into a full group merges
/// its two oldest buckets into one bucket of twice the weight, which is
/// handed back to the caller as a carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketGroup {
    index: u32,
    weight: u64,
    buckets: BucketRing,
}

impl BucketGroup {
    /// Creates an empty group for weight class `index` with room for `k + 1`
    /// buckets.
    ///
    /// # Panics
    ///
    /// If `k` is zero or `index` does not leave room for a 64-bit weight.
    pub fn new(index: u32, k: u32) -> Self {
        assert!(k >= 1, "k must be at least 1, got {k}");
        assert!(index < u64::BITS, "group index {index} is out of range");
        BucketGroup {
            index,
            weight: 1 << index,
            buckets: BucketRing::with_capacity(k as usize + 1),
        }
    }

    /// Returns the weight class index `i` of this group.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the number of items each bucket represents, `2^index`.
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Returns the maximum number of buckets, `k + 1`.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    /// Returns the number of buckets currently held.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total weight of the buckets currently held.
    pub fn total_weight(&self) -> u64 {
        self.buckets.len() as u64 * self.weight
    }

    /// Timestamp of the oldest bucket.
    pub fn oldest(&self) -> Option<u64> {
        self.buckets.front()
    }

    /// Timestamps of all buckets, oldest first.
    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.buckets.iter()
    }

    /// Appends a bucket stamped `timestamp`, merging the two oldest buckets
    /// first if the group is full.
    ///
    /// # Panics
    ///
    /// If `timestamp` is not newer than every bucket already held.
    pub fn insert(&mut self, timestamp: u64) -> Insertion {
        if let Some(newest) = self.buckets.back() {
            assert!(
                newest < timestamp,
                "bucket timestamps must increase: {timestamp} after {newest} in group {}",
                self.index
            );
        }

        let mut outcome = Insertion::NoCarry;
        if self.buckets.is_full() {
            // the older of the pair is absorbed into the newer one
            let dropped = self.buckets.pop_front();
            let merged = self.buckets.pop_front();
            match (dropped, merged) {
                (Some(_), Some(ts)) => outcome = Insertion::Carry(ts),
                _ => unreachable!("a full group holds at least two buckets"),
            }
        }

        if self.buckets.push_back(timestamp).is_err() {
            unreachable!("a group has room after merging");
        }
        outcome
    }

    /// Removes the oldest bucket if it lies outside the window of the last
    /// `window` items ending at `now`, i.e. its timestamp is `<= now - window`.
    pub fn expire_if_due(&mut self, now: u64, window: u64) -> Expiration {
        let Some(oldest) = self.buckets.front() else {
            return Expiration::Empty;
        };
        if now < window || oldest > now - window {
            return Expiration::NotDue;
        }
        self.buckets.pop_front();
        Expiration::Expired(self.weight)
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        self.buckets.allocated_bytes()
    }
}

impl fmt::Display for BucketGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group {} (weight {}, {}/{}): [",
            self.index,
            self.weight,
            self.len(),
            self.capacity()
        )?;
        for (i, ts) in self.timestamps().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ts}")?;
        }
        write!(f, "]")
    }
}
