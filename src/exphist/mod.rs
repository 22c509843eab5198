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

//! Exponential histogram for counting `1` bits over a sliding window.
//!
//! The counter keeps the most recent `window_size` items of a binary stream
//! summarized as buckets of power-of-two weight. Each weight class holds at
//! most `k + 1` buckets; when a class overflows, its two oldest buckets merge
//! into one bucket of the next class. Buckets whose newest item left the
//! window are dropped. Memory is `O(k log(window_size / k))` and the count
//! has relative error at most `1/k`.
//!
//! # Usage
//!
//! ```rust
//! # use window_count::exphist::WindowCounter;
//! let mut counter = WindowCounter::new(8, 1);
//! for _ in 0..8 {
//!     counter.update(true);
//! }
//! let estimate = counter.estimate();
//! assert!(estimate >= 4 && estimate <= 8);
//! assert!(counter.lower_bound() <= 8 && 8 <= counter.upper_bound());
//! ```

mod group;
mod ring;
mod sketch;
mod stream;

pub use self::group::BucketGroup;
pub use self::group::Expiration;
pub use self::group::Insertion;
pub use self::sketch::WindowCounter;

/// Default value of parameter k (10% relative error).
pub const DEFAULT_K: u32 = 10;
/// Minimum value of parameter k.
pub const MIN_K: u32 = 1;
/// Minimum window size.
pub const MIN_WINDOW_SIZE: u32 = 1;
