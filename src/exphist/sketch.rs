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

use super::MIN_K;
use super::MIN_WINDOW_SIZE;
use super::group::BucketGroup;
use super::group::Expiration;
use super::group::Insertion;
use crate::error::Error;

/// Counts the `1` bits among the most recent `window_size` items of a stream
/// with relative error at most `1/k`.
///
/// See the [exphist module level documentation](crate::exphist) for more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowCounter {
    window_size: u32,
    k: u32,
    groups: Vec<BucketGroup>,
    clock: u64,
    sum: u64,
    active: usize,
    num_merges: u64,
}

impl WindowCounter {
    /// Creates a counter over the last `window_size` items with error parameter `k`.
    ///
    /// # Panics
    ///
    /// If `window_size` or `k` is less than 1.
    ///
    /// # Examples
    ///
    /// ```
    /// # use window_count::exphist::WindowCounter;
    /// let counter = WindowCounter::new(1000, 10);
    /// assert_eq!(counter.window_size(), 1000);
    /// assert_eq!(counter.k(), 10);
    /// ```
    pub fn new(window_size: u32, k: u32) -> Self {
        assert!(
            window_size >= MIN_WINDOW_SIZE,
            "window_size must be at least {MIN_WINDOW_SIZE}, got {window_size}"
        );
        assert!(k >= MIN_K, "k must be at least {MIN_K}, got {k}");
        Self::make(window_size, k)
    }

    /// Creates a counter, reporting invalid parameters as an error instead of
    /// panicking.
    pub fn try_new(window_size: u32, k: u32) -> Result<Self, Error> {
        if window_size < MIN_WINDOW_SIZE {
            return Err(Error::config_invalid(
                window_size.into(),
                k.into(),
                format!("window_size must be at least {MIN_WINDOW_SIZE}"),
            ));
        }
        if k < MIN_K {
            return Err(Error::config_invalid(
                window_size.into(),
                k.into(),
                format!("k must be at least {MIN_K}"),
            ));
        }
        Ok(Self::make(window_size, k))
    }

    fn make(window_size: u32, k: u32) -> Self {
        let num_groups = num_groups(window_size, k);
        let groups = (0..num_groups as u32)
            .map(|index| BucketGroup::new(index, k))
            .collect();
        let counter = WindowCounter {
            window_size,
            k,
            groups,
            clock: 0,
            sum: 0,
            active: 0,
            num_merges: 0,
        };
        log::debug!(
            "created window counter: window_size={window_size}, k={k}, groups={num_groups}, bytes={}",
            counter.allocated_bytes()
        );
        counter
    }

    /// Returns the number of most recent items the count covers.
    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Returns the error parameter k; the relative error is at most `1/k`.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Returns the number of weight classes, fixed at construction.
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Returns the bucket group of weight class `index`, if it exists.
    pub fn group(&self, index: usize) -> Option<&BucketGroup> {
        self.groups.get(index)
    }

    /// Returns the number of items seen so far, including `0` items.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns the total weight of all buckets, an upper bound on the count.
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Returns the index of the highest weight class that may hold buckets.
    pub fn active_group(&self) -> usize {
        self.active
    }

    /// Returns how many bucket merges happened since construction.
    pub fn num_merges(&self) -> u64 {
        self.num_merges
    }

    /// Returns the number of buckets currently held across all groups.
    pub fn num_buckets(&self) -> usize {
        self.groups.iter().map(BucketGroup::len).sum()
    }

    /// Returns true if no `1` item is inside the window.
    pub fn is_empty(&self) -> bool {
        self.sum == 0
    }

    /// Returns the heap bytes owned by the counter: group headers plus bucket
    /// storage.
    pub fn allocated_bytes(&self) -> usize {
        let headers = self.groups.capacity() * std::mem::size_of::<BucketGroup>();
        let buckets: usize = self.groups.iter().map(BucketGroup::allocated_bytes).sum();
        headers + buckets
    }

    /// Feeds one item and returns the estimated number of `1` items among the
    /// last `window_size` items.
    ///
    /// # Examples
    ///
    /// ```
    /// # use window_count::exphist::WindowCounter;
    /// let mut counter = WindowCounter::new(4, 2);
    /// assert_eq!(counter.update(true), 1);
    /// assert_eq!(counter.update(false), 1);
    /// assert_eq!(counter.clock(), 2);
    /// ```
    pub fn update(&mut self, item: bool) -> u64 {
        self.clock += 1;
        if item {
            self.sum += 1;
            self.insert(self.clock);
        }
        self.expire();
        self.estimate()
    }

    /// Returns the estimate for the window ending at the current clock.
    ///
    /// The window is exact while only unit buckets remain; otherwise the
    /// oldest bucket is assumed to be half inside the window.
    pub fn estimate(&self) -> u64 {
        if self.sum == 0 {
            return 0;
        }
        if self.active == 0 {
            return self.sum;
        }
        let weight = self.groups[self.active].weight();
        self.sum - weight / 2 + 1
    }

    /// Returns the largest count consistent with the buckets held.
    pub fn upper_bound(&self) -> u64 {
        self.sum
    }

    /// Returns the smallest count consistent with the buckets held.
    ///
    /// The newest item of the oldest bucket is always inside the window, so at
    /// least one of its items counts.
    pub fn lower_bound(&self) -> u64 {
        if self.sum == 0 {
            return 0;
        }
        self.sum - self.groups[self.active].weight() + 1
    }

    /// Inserts a unit bucket and carries merges up through the weight classes.
    fn insert(&mut self, timestamp: u64) {
        let mut index = 0;
        let mut timestamp = timestamp;
        loop {
            let outcome = self.groups[index].insert(timestamp);
            self.active = self.active.max(index);
            match outcome {
                Insertion::NoCarry => return,
                Insertion::Carry(carry) => {
                    self.num_merges += 1;
                    log::trace!(
                        "merged two buckets of weight {} into timestamp {carry}",
                        self.groups[index].weight()
                    );
                    index += 1;
                    assert!(
                        index < self.groups.len(),
                        "merge carried past the top group {} (window_size={}, k={})",
                        self.groups.len() - 1,
                        self.window_size,
                        self.k
                    );
                    timestamp = carry;
                }
            }
        }
    }

    /// Expires at most one bucket, scanning down from the active group.
    fn expire(&mut self) {
        let now = self.clock;
        let window = u64::from(self.window_size);
        loop {
            match self.groups[self.active].expire_if_due(now, window) {
                Expiration::Expired(weight) => {
                    assert!(
                        weight <= self.sum,
                        "expired weight {weight} exceeds running sum {}",
                        self.sum
                    );
                    self.sum -= weight;
                    log::trace!("expired bucket of weight {weight} at clock {now}");
                    break;
                }
                Expiration::NotDue => break,
                Expiration::Empty => {
                    if self.active == 0 {
                        break;
                    }
                    self.active -= 1;
                }
            }
        }

        // settle onto the highest group that still holds buckets
        while self.active > 0 && self.groups[self.active].is_empty() {
            self.active -= 1;
        }
    }
}

impl fmt::Display for WindowCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "WindowCounter(window_size={}, k={}, clock={}, sum={}, active={}, merges={}, estimate={})",
            self.window_size,
            self.k,
            self.clock,
            self.sum,
            self.active,
            self.num_merges,
            self.estimate()
        )?;
        for group in &self.groups {
            writeln!(f, "  {group}")?;
        }
        Ok(())
    }
}

/// Number of weight classes needed for a window of `window_size` items:
/// `ceil(log2(window_size / (k + 1) + 1)) + 1`.
pub(super) fn num_groups(window_size: u32, k: u32) -> usize {
    let per_group = u64::from(k) + 1;
    let target = u64::from(window_size) + per_group;
    let mut exponent = 0;
    while (per_group << exponent) < target {
        exponent += 1;
    }
    exponent + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(counter: &WindowCounter, index: usize) -> Vec<u64> {
        counter.group(index).unwrap().timestamps().collect()
    }

    #[test]
    fn test_num_groups() {
        assert_eq!(num_groups(1, 1), 2);
        assert_eq!(num_groups(2, 1), 2);
        assert_eq!(num_groups(3, 1), 3);
        assert_eq!(num_groups(8, 1), 4);
        assert_eq!(num_groups(4, 2), 3);
        assert_eq!(num_groups(100, 10), 5);
        assert_eq!(num_groups(1000, 100), 5);
        assert_eq!(num_groups(1 << 20, 1), 21);
        assert_eq!(num_groups(u32::MAX, 1), 33);
    }

    #[test]
    fn test_groups_have_power_of_two_weights() {
        let counter = WindowCounter::new(100, 10);
        assert_eq!(counter.num_groups(), 5);
        for index in 0..counter.num_groups() {
            let group = counter.group(index).unwrap();
            assert_eq!(group.weight(), 1 << index);
            assert_eq!(group.capacity(), 11);
            assert!(group.is_empty());
        }
        assert!(counter.group(5).is_none());
    }

    #[test]
    fn test_allocated_bytes() {
        let counter = WindowCounter::new(8, 1);
        let expected = 4 * std::mem::size_of::<BucketGroup>() + 4 * 2 * 8;
        assert_eq!(counter.allocated_bytes(), expected);
    }

    #[test]
    fn test_cascade_state_after_eight_ones() {
        let mut counter = WindowCounter::new(8, 1);
        for _ in 0..8 {
            counter.update(true);
        }
        assert_eq!(timestamps(&counter, 0), vec![7, 8]);
        assert_eq!(timestamps(&counter, 1), vec![6]);
        assert_eq!(timestamps(&counter, 2), vec![4]);
        assert!(timestamps(&counter, 3).is_empty());
        assert_eq!(counter.sum(), 8);
        assert_eq!(counter.active_group(), 2);
        assert_eq!(counter.num_merges(), 4);
        assert_eq!(counter.num_buckets(), 4);
        assert_eq!(counter.estimate(), 7);
        assert_eq!(counter.lower_bound(), 5);
        assert_eq!(counter.upper_bound(), 8);
    }

    #[test]
    fn test_window_drains_to_zero() {
        let mut counter = WindowCounter::new(8, 1);
        for _ in 0..8 {
            counter.update(true);
        }
        let estimates: Vec<u64> = (0..10).map(|_| counter.update(false)).collect();
        assert_eq!(estimates, vec![7, 7, 7, 4, 4, 2, 1, 0, 0, 0]);
        assert_eq!(counter.active_group(), 0);
        assert_eq!(counter.num_buckets(), 0);
        assert!(counter.is_empty());
    }

    #[test]
    fn test_cursor_tracks_highest_group() {
        let mut counter = WindowCounter::new(100, 1);
        counter.update(true);
        counter.update(true);
        assert_eq!(counter.active_group(), 0);
        counter.update(true);
        assert_eq!(counter.active_group(), 1);
        assert_eq!(counter.num_merges(), 1);
    }

    #[test]
    fn test_display_lists_every_group() {
        let mut counter = WindowCounter::new(4, 2);
        counter.update(true);
        counter.update(false);
        counter.update(true);
        let dump = counter.to_string();
        assert_eq!(
            dump,
            "WindowCounter(window_size=4, k=2, clock=3, sum=2, active=0, merges=0, estimate=2)\n\
             \x20 group 0 (weight 1, 2/3): [1, 3]\n\
             \x20 group 1 (weight 2, 0/3): []\n\
             \x20 group 2 (weight 4, 0/3): []\n"
        );
    }
}
