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

use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use window_count::exphist::DEFAULT_K;
use window_count::exphist::WindowCounter;

fn main() {
    let window_size = 10_000;
    let mut counter = WindowCounter::new(window_size, DEFAULT_K);
    println!(
        "Counting ones over the last {} items with k={} ({} groups, {} bytes)",
        window_size,
        counter.k(),
        counter.num_groups(),
        counter.allocated_bytes()
    );

    let mut rng = StdRng::seed_from_u64(42);
    let mut exact = VecDeque::with_capacity(window_size as usize + 1);
    let mut ones = 0u64;
    let mut worst = 0.0f64;
    for step in 0..200_000u64 {
        // density drifts so the window sees both sparse and dense stretches
        let density = if (step / 25_000) % 2 == 0 { 0.1 } else { 0.8 };
        let item = rng.gen_bool(density);

        let estimate = counter.update(item);
        exact.push_back(item);
        ones += u64::from(item);
        if exact.len() > window_size as usize && exact.pop_front() == Some(true) {
            ones -= 1;
        }
        if ones > 0 {
            worst = worst.max(estimate.abs_diff(ones) as f64 / ones as f64);
        }
    }

    println!("Exact count: {}", ones);
    println!("Estimated count: {}", counter.estimate());
    println!(
        "Bounds: [{}, {}]",
        counter.lower_bound(),
        counter.upper_bound()
    );
    println!(
        "Worst relative error: {:.4} (limit {:.4})",
        worst,
        1.0 / counter.k() as f64
    );
    println!(
        "Buckets held: {}, merges performed: {}",
        counter.num_buckets(),
        counter.num_merges()
    );

    // Packed input: every word is read least significant bit first
    println!("\nFeeding a packed stream...");
    let mut small = WindowCounter::new(16, 2);
    let words: Vec<u8> = [0x00ff_00ffu64, u64::MAX]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect();
    let estimate = small.update_packed(&mut words.as_slice(), 96).unwrap();
    println!("Estimate after 96 packed bits: {}", estimate);
    println!("\n{}", small);
}
