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

//! Encoder configuration parameters.

use crate::checks;

/// RAPPOR encoding parameters, fixed for the lifetime of an encoder.
///
/// `num_bits` is the Bloom filter width in bits and must be a whole number
/// of bytes; `num_hashes` is the number of hash rounds applied per value.
/// `prob_f` controls the Permanent Randomized Response: each Bloom filter
/// bit is replaced by a fair coin flip with probability `f` and passed
/// through otherwise. `prob_p` and `prob_q` control the Instantaneous
/// Randomized Response: a transmitted bit is 1 with probability `q` when
/// the underlying PRR bit is 1 and with probability `p` when it is 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub num_bits: usize,
    pub num_hashes: usize,
    pub prob_f: f64,
    pub prob_p: f64,
    pub prob_q: f64,
}

impl Params {
    /// Returns an error describing the first violated constraint, if any.
    pub fn validate(&self, label: &str) -> crate::Result<()> {
        checks::check_num_bits(label, self.num_bits)?;
        checks::check_num_hashes(label, self.num_hashes)?;
        checks::check_probability(label, "prob_f", self.prob_f)?;
        checks::check_probability(label, "prob_p", self.prob_p)?;
        checks::check_probability(label, "prob_q", self.prob_q)
    }
}

impl Default for Params {
    /// The parameter choices published with the original RAPPOR analysis:
    /// a 16-bit filter, two hash rounds, f = 0.5, p = 0.5, q = 0.75.
    fn default() -> Self {
        Self {
            num_bits: 16,
            num_hashes: 2,
            prob_f: 0.5,
            prob_p: 0.5,
            prob_q: 0.75,
        }
    }
}
