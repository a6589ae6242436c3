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

//! Randomness sources for the two randomized response stages.
//!
//! The permanent stage needs a source that is deterministic per reported
//! value, so that re-encoding the same value reproduces the same noise
//! (memoization without per-value storage). The instantaneous stage needs
//! the opposite: fresh entropy on every call. Both are injected into the
//! encoder as owned objects; there is no process-global generator to seed.

use hmac::{Hmac, Mac};
use rand::{rngs::StdRng, thread_rng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::{bits::Bits, checks, params::Params, Error};

/// Deterministic, per-value-seeded source for the permanent stage.
///
/// After `seed(value)`, the draws are a pure function of the seeding value
/// (and whatever long-lived secret the implementation carries), in a fixed
/// order: `f_bits` first, then `uniform`.
pub trait PrrRand {
    /// Re-seeds the source from the value being encoded. Called at the start
    /// of every encoding; same value, same subsequent draws.
    fn seed(&mut self, value: &[u8]);

    /// A word of fair coin flips, one per filter bit.
    fn f_bits(&mut self) -> Bits;

    /// The per-bit selection mask: each bit is set with probability `f`.
    /// A set mask bit means the corresponding output bit is taken from
    /// `f_bits` instead of the Bloom filter.
    fn uniform(&mut self) -> Bits;
}

/// Non-deterministic source for the instantaneous stage.
///
/// Both words must be freshly drawn on every call; reusing them across
/// reports breaks the privacy guarantee.
pub trait IrrRand {
    /// A word with each bit set with probability `p`.
    fn p_bits(&mut self) -> Bits;

    /// A word with each bit set with probability `q`.
    fn q_bits(&mut self) -> Bits;
}

/// Draws `num_bits` independent Bernoulli(p1) bits into one word.
fn bernoulli_bits<R: Rng>(rng: &mut R, p1: f64, num_bits: usize) -> Bits {
    let mut bits = Bits::ZERO;
    for i in 0..num_bits {
        if rng.gen_bool(p1) {
            bits.set(i as u32);
        }
    }
    bits
}

/// Permanent-stage source deriving its stream from HMAC-SHA256.
///
/// Seeding computes HMAC-SHA256(client_secret, value) and uses the tag as a
/// ChaCha20 seed, so the noise is stable per (secret, value) pair while an
/// observer without the secret cannot predict it.
pub struct HmacPrrRand {
    mac: Hmac<Sha256>,
    prob_f: f64,
    num_bits: usize,
    rng: ChaCha20Rng,
}

impl HmacPrrRand {
    pub fn new(client_secret: &[u8], params: &Params) -> crate::Result<Self> {
        checks::check_num_bits("HmacPrrRand", params.num_bits)?;
        checks::check_probability("HmacPrrRand", "prob_f", params.prob_f)?;
        let mac = Hmac::<Sha256>::new_from_slice(client_secret)
            .map_err(|error| Error::new(format!("couldn't key HMAC-SHA256: {}", error)))?;
        Ok(Self {
            mac,
            prob_f: params.prob_f,
            num_bits: params.num_bits,
            // Placeholder stream; replaced on the first `seed` call.
            rng: ChaCha20Rng::from_seed([0; 32]),
        })
    }
}

impl PrrRand for HmacPrrRand {
    fn seed(&mut self, value: &[u8]) {
        let mut mac = self.mac.clone();
        mac.update(value);
        let tag = mac.finalize().into_bytes();
        self.rng = ChaCha20Rng::from_seed(tag.into());
    }

    fn f_bits(&mut self) -> Bits {
        bernoulli_bits(&mut self.rng, 0.5, self.num_bits)
    }

    fn uniform(&mut self) -> Bits {
        bernoulli_bits(&mut self.rng, self.prob_f, self.num_bits)
    }
}

/// Instantaneous-stage source drawing from the thread-local generator.
pub struct SecureIrrRand {
    rng: StdRng,
    prob_p: f64,
    prob_q: f64,
    num_bits: usize,
}

impl SecureIrrRand {
    pub fn new(params: &Params) -> crate::Result<Self> {
        checks::check_num_bits("SecureIrrRand", params.num_bits)?;
        checks::check_probability("SecureIrrRand", "prob_p", params.prob_p)?;
        checks::check_probability("SecureIrrRand", "prob_q", params.prob_q)?;
        Ok(Self::new_with_rng(StdRng::from_rng(thread_rng())?, params))
    }

    #[cfg(test)]
    pub fn new_for_test(rng: StdRng, params: &Params) -> Self {
        Self::new_with_rng(rng, params)
    }

    fn new_with_rng(rng: StdRng, params: &Params) -> Self {
        Self {
            rng,
            prob_p: params.prob_p,
            prob_q: params.prob_q,
            num_bits: params.num_bits,
        }
    }
}

impl IrrRand for SecureIrrRand {
    fn p_bits(&mut self) -> Bits {
        bernoulli_bits(&mut self.rng, self.prob_p, self.num_bits)
    }

    fn q_bits(&mut self) -> Bits {
        bernoulli_bits(&mut self.rng, self.prob_q, self.num_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(num_bits: usize, prob_f: f64) -> Params {
        Params {
            num_bits,
            prob_f,
            ..Params::default()
        }
    }

    #[test]
    fn prr_draws_are_stable_per_value() {
        let config = params(64, 0.5);
        let mut a = HmacPrrRand::new(b"secret", &config).unwrap();
        let mut b = HmacPrrRand::new(b"secret", &config).unwrap();

        a.seed(b"test");
        b.seed(b"test");
        assert_eq!(a.f_bits(), b.f_bits());
        assert_eq!(a.uniform(), b.uniform());

        // Re-seeding with the same value restarts the same stream.
        a.seed(b"test");
        b.seed(b"test");
        assert_eq!(a.f_bits(), b.f_bits());
    }

    #[test]
    fn prr_draws_depend_on_secret_and_value() {
        let config = params(64, 0.5);
        let mut a = HmacPrrRand::new(b"secret", &config).unwrap();
        let mut b = HmacPrrRand::new(b"other secret", &config).unwrap();
        a.seed(b"test");
        b.seed(b"test");
        assert_ne!(a.f_bits(), b.f_bits());

        let mut c = HmacPrrRand::new(b"secret", &config).unwrap();
        let mut d = HmacPrrRand::new(b"secret", &config).unwrap();
        c.seed(b"test");
        d.seed(b"other value");
        assert_ne!(c.f_bits(), d.f_bits());
    }

    #[test]
    fn degenerate_selection_probabilities() {
        let mut always = HmacPrrRand::new(b"secret", &params(64, 1.0)).unwrap();
        always.seed(b"test");
        let _ = always.f_bits();
        assert_eq!(always.uniform(), Bits::new(u64::MAX));

        let mut never = HmacPrrRand::new(b"secret", &params(64, 0.0)).unwrap();
        never.seed(b"test");
        let _ = never.f_bits();
        assert_eq!(never.uniform(), Bits::ZERO);
    }

    #[test]
    fn degenerate_irr_probabilities() {
        let config = Params {
            num_bits: 16,
            prob_p: 0.0,
            prob_q: 1.0,
            ..Params::default()
        };
        let mut rand = SecureIrrRand::new_for_test(StdRng::seed_from_u64(7), &config);
        assert_eq!(rand.p_bits(), Bits::ZERO);
        assert_eq!(rand.q_bits(), Bits::new(0xffff));
    }

    #[test]
    fn fair_bits_are_roughly_balanced() {
        let mut rand = HmacPrrRand::new(b"secret", &params(64, 0.5)).unwrap();
        rand.seed(b"balance check");
        let mut ones = 0u32;
        let trials = 200;
        for _ in 0..trials {
            ones += rand.f_bits().count_ones();
        }
        let frequency = ones as f64 / (trials * 64) as f64;
        assert!((frequency - 0.5).abs() < 0.05, "frequency {}", frequency);
    }
}
