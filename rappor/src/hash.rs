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

//! Hashing strategies that map a reported value onto Bloom filter bits.
//!
//! The encoder is generic over the strategy: [`RollingHash`] uses a simple
//! polynomial string hash, [`DigestHash`] derives bit positions from a
//! message digest of the value. Hash collisions between rounds are expected
//! and accepted; so is the modulo bias when the filter width does not evenly
//! divide the hash space.

use core::marker::PhantomData;

use md5::{Digest, Md5};

use crate::{bits::Bits, params::Params, Error};

/// Maps a value to `num_hashes` bit positions, ORed into one bit vector.
pub trait BloomHash {
    fn bloom(&self, value: &[u8], params: &Params) -> Bits;
}

/// djb2-style rolling string hash (seed 5381, multiplier 33).
#[derive(Clone, Copy, Debug, Default)]
pub struct RollingHash;

impl BloomHash for RollingHash {
    fn bloom(&self, value: &[u8], params: &Params) -> Bits {
        let mut bloom = Bits::ZERO;
        for i in 0..params.num_hashes {
            // TODO: need more than one hash function; every round computes
            // the same value, so all rounds land on the same bit. Salting
            // the seed with the round index would decorrelate them.
            let mut h: u32 = 5381;
            for &byte in value {
                h = h.wrapping_shl(5).wrapping_add(h).wrapping_add(byte as u32);
            }
            let bit_to_set = (h as u64 % params.num_bits as u64) as u32;
            log::trace!("hash {}: {:#x}, set bit {}", i, h, bit_to_set);
            bloom.set(bit_to_set);
        }
        bloom
    }
}

/// The number of hash bits consumed per round, log2 of the filter width.
///
/// Returns `None` for widths outside the supported set; callers must turn
/// that into a configuration error rather than use it as a shift amount.
pub fn hash_part_width(bloom_width: usize) -> Option<u32> {
    match bloom_width {
        8 => Some(3),
        16 => Some(4),
        32 => Some(5),
        64 => Some(6),
        128 => Some(7),
        _ => None,
    }
}

/// Derives bit positions from a message digest of the value.
///
/// The value is digested once; successive rounds consume successive
/// `hash_part_width`-bit slices of the digest-derived hash, so the rounds
/// stay decorrelated without rehashing.
pub struct DigestHash<D> {
    hash_part_width: u32,
    _digest: PhantomData<D>,
}

/// The digest variant with MD5, the digest the original client shipped with.
pub type Md5Hash = DigestHash<Md5>;

impl<D: Digest> DigestHash<D> {
    /// Fails if `num_bits` is not one of the supported power-of-two widths.
    pub fn new(num_bits: usize) -> crate::Result<Self> {
        let hash_part_width = hash_part_width(num_bits).ok_or_else(|| {
            Error::new(format!(
                "digest hash: unsupported filter width {}, expected one of 8, 16, 32, 64 or 128",
                num_bits
            ))
        })?;
        Ok(Self {
            hash_part_width,
            _digest: PhantomData,
        })
    }
}

impl<D: Digest> BloomHash for DigestHash<D> {
    fn bloom(&self, value: &[u8], params: &Params) -> Bits {
        let digest = D::digest(value);

        // The filter needs only a few bits per round, so a 16-bit slice of
        // the digest is plenty of precision to start from.
        let mut hash = digest[0] as u64 | (digest[1] as u64) << 8;

        let mut bloom = Bits::ZERO;
        for i in 0..params.num_hashes {
            // Same as hash & mask, where mask is (1 << log2(num_bits)) - 1.
            let bit_to_set = (hash % params.num_bits as u64) as u32;
            log::trace!("hash {}: {:#x}, set bit {}", i, hash, bit_to_set);
            bloom.set(bit_to_set);
            hash >>= self.hash_part_width;
        }
        bloom
    }
}
