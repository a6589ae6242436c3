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

//! Checks for encoder configuration parameters.

use crate::Error;

/// Maximum supported Bloom filter width; the bit vector is backed by a u64.
pub const MAX_NUM_BITS: usize = 64;

/// Returns an error if `num_bits` is zero, not a whole number of bytes, or
/// wider than the bit-vector backing.
pub fn check_num_bits(label: &str, num_bits: usize) -> crate::Result<()> {
    if num_bits == 0 || num_bits % 8 != 0 {
        return Err(Error::new(format!(
            "{}: num_bits is {}, should be a positive multiple of 8",
            label, num_bits
        )));
    }
    if num_bits > MAX_NUM_BITS {
        return Err(Error::new(format!(
            "{}: num_bits is {}, should be at most {}",
            label, num_bits, MAX_NUM_BITS
        )));
    }
    Ok(())
}

/// Returns an error if `num_hashes` is zero.
pub fn check_num_hashes(label: &str, num_hashes: usize) -> crate::Result<()> {
    if num_hashes == 0 {
        return Err(Error::new(format!(
            "{}: num_hashes is {}, should be strictly positive",
            label, num_hashes
        )));
    }
    Ok(())
}

/// Returns an error if `p` is not a probability in [0, 1].
pub fn check_probability(label: &str, name: &str, p: f64) -> crate::Result<()> {
    if !(0.0..=1.0).contains(&p) || p.is_nan() {
        return Err(Error::new(format!(
            "{}: {} is {}, should be in [0, 1]",
            label, name, p
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_bits_must_be_whole_bytes() {
        assert!(check_num_bits("test", 8).is_ok());
        assert!(check_num_bits("test", 64).is_ok());
        assert!(check_num_bits("test", 0).is_err());
        assert!(check_num_bits("test", 10).is_err());
        assert!(check_num_bits("test", 128).is_err());
    }

    #[test]
    fn num_hashes_must_be_positive() {
        assert!(check_num_hashes("test", 2).is_ok());
        assert!(check_num_hashes("test", 0).is_err());
    }

    #[test]
    fn probabilities_must_be_in_range() {
        assert!(check_probability("test", "prob_f", 0.0).is_ok());
        assert!(check_probability("test", "prob_f", 0.5).is_ok());
        assert!(check_probability("test", "prob_f", 1.0).is_ok());
        assert!(check_probability("test", "prob_f", -0.1).is_err());
        assert!(check_probability("test", "prob_f", 1.1).is_err());
        assert!(check_probability("test", "prob_f", f64::NAN).is_err());
    }
}
