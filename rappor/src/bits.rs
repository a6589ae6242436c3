//
// Copyright 2024 The RAPPOR Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Fixed-width bit vector used for the Bloom filter and both randomized
//! response stages.
//!
//! A single u64 word is enough for every supported filter width, keeps the
//! whole pipeline allocation-free, and makes the per-stage masking a couple
//! of machine instructions. Stage logic only goes through the operations
//! below, so a wider byte-array backing could be introduced later without
//! touching the stages themselves.

use core::ops::{BitAnd, BitOr, Not};

/// A packed bit set of up to 64 bits.
///
/// The filter width in use is tracked by the encoder, not by the vector;
/// bits at or above the configured width are always zero by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bits(u64);

impl Bits {
    pub const ZERO: Bits = Bits(0);

    pub fn new(word: u64) -> Self {
        Bits(word)
    }

    /// Sets the bit at `index`, counting from the least significant bit.
    pub fn set(&mut self, index: u32) {
        self.0 |= 1u64 << index;
    }

    pub fn get(&self, index: u32) -> bool {
        self.0 & (1u64 << index) != 0
    }

    pub fn count_ones(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn word(&self) -> u64 {
        self.0
    }

    /// Serializes the low `num_bytes` bytes, least significant byte first.
    ///
    /// The output always has exactly `num_bytes` bytes; previous buffer
    /// contents are discarded by the caller before writing.
    pub fn to_le_bytes(&self, num_bytes: usize) -> Vec<u8> {
        let mut word = self.0;
        let mut output = Vec::with_capacity(num_bytes);
        for _ in 0..num_bytes {
            output.push((word & 0xff) as u8);
            word >>= 8;
        }
        output
    }

    /// Inverse of [`Bits::to_le_bytes`] on the low `8 * bytes.len()` bits.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let mut word = 0u64;
        for (i, byte) in bytes.iter().enumerate() {
            word |= (*byte as u64) << (8 * i);
        }
        Bits(word)
    }
}

impl BitAnd for Bits {
    type Output = Bits;

    fn bitand(self, rhs: Bits) -> Bits {
        Bits(self.0 & rhs.0)
    }
}

impl BitOr for Bits {
    type Output = Bits;

    fn bitor(self, rhs: Bits) -> Bits {
        Bits(self.0 | rhs.0)
    }
}

impl Not for Bits {
    type Output = Bits;

    fn not(self) -> Bits {
        Bits(!self.0)
    }
}
