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

//! Feeding a [`WindowCounter`] from bit streams.

use std::io::Read;

use byteorder::LittleEndian;
use byteorder::ReadBytesExt;

use super::WindowCounter;
use crate::error::Error;

const BITS_PER_WORD: u64 = u64::BITS as u64;

impl WindowCounter {
    /// Feeds `num_bits` items read from a packed stream and returns the
    /// estimate after the last one.
    ///
    /// The stream is a sequence of little-endian `u64` words; items are taken
    /// from each word starting at the least significant bit. Only the words
    /// needed for `num_bits` items are read.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedStream`](crate::error::ErrorKind::MalformedStream)
    /// if the reader ends before `num_bits` items were read. Items consumed
    /// before the failure stay applied.
    ///
    /// # Examples
    ///
    /// ```
    /// # use window_count::exphist::WindowCounter;
    /// let mut counter = WindowCounter::new(64, 4);
    /// let words = 0b1011u64.to_le_bytes();
    /// let estimate = counter.update_packed(&mut &words[..], 4).unwrap();
    /// assert_eq!(estimate, 3);
    /// assert_eq!(counter.clock(), 4);
    /// ```
    pub fn update_packed<R: Read>(&mut self, reader: &mut R, num_bits: u64) -> Result<u64, Error> {
        let mut consumed = 0;
        while consumed < num_bits {
            let word = reader
                .read_u64::<LittleEndian>()
                .map_err(|err| Error::truncated_stream(consumed, err))?;
            let take = (num_bits - consumed).min(BITS_PER_WORD);
            for bit in 0..take {
                self.update((word >> bit) & 1 == 1);
            }
            consumed += take;
        }
        Ok(self.estimate())
    }
}

impl Extend<bool> for WindowCounter {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for item in iter {
            self.update(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use byteorder::WriteBytesExt;

    use super::*;
    use crate::error::ErrorKind;

    fn packed(words: &[u64]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(words.len() * 8);
        for &word in words {
            bytes.write_u64::<LittleEndian>(word).unwrap();
        }
        bytes
    }

    #[test]
    fn test_packed_matches_bit_by_bit() {
        let words = [0xdead_beef_0123_4567u64, 0x0f0f_f0f0_aaaa_5555];
        let bytes = packed(&words);

        let mut packed_counter = WindowCounter::new(50, 3);
        let estimate = packed_counter
            .update_packed(&mut bytes.as_slice(), 100)
            .unwrap();

        let mut counter = WindowCounter::new(50, 3);
        let mut last = 0;
        for i in 0..100 {
            let word = words[i / 64];
            last = counter.update((word >> (i % 64)) & 1 == 1);
        }

        assert_eq!(estimate, last);
        assert_eq!(packed_counter, counter);
    }

    #[test]
    fn test_packed_zero_bits_reads_nothing() {
        let mut counter = WindowCounter::new(8, 1);
        let mut empty: &[u8] = &[];
        assert_eq!(counter.update_packed(&mut empty, 0).unwrap(), 0);
        assert_eq!(counter.clock(), 0);
    }

    #[test]
    fn test_packed_truncated_stream() {
        let bytes = packed(&[u64::MAX]);
        let mut counter = WindowCounter::new(1000, 2);
        let err = counter
            .update_packed(&mut bytes.as_slice(), 65)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStream);
        assert_eq!(err.context_value("bits_consumed"), Some("64"));
        assert_eq!(counter.clock(), 64);
    }

    #[test]
    fn test_extend() {
        let mut counter = WindowCounter::new(4, 2);
        counter.extend([false, true, false, true, false, true]);
        assert_eq!(counter.clock(), 6);
        assert_eq!(counter.estimate(), 2);
    }
}
