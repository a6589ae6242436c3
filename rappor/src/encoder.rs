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

//! The encoder: Bloom filter, permanent and instantaneous randomized
//! response, and little-endian serialization of the transmitted word.

use crate::{
    bits::Bits,
    hash::BloomHash,
    params::Params,
    rand::{IrrRand, PrrRand},
    Error,
};

/// Encodes string values into privacy-preserving reports.
///
/// The hashing strategy and both randomness sources are injected, so the
/// rolling-hash and digest-based variants share this one pipeline. An
/// encoder owns its sources; `encode` takes `&mut self` because the
/// permanent source is re-seeded on every call.
///
/// Construction never fails, but a configuration violating the parameter
/// constraints leaves the instance unusable: [`Encoder::is_valid`] reports
/// false and [`Encoder::encode`] returns an error.
pub struct Encoder {
    metric_name: String,
    cohort: u32,
    params: Params,
    hash: Box<dyn BloomHash>,
    prr_rand: Box<dyn PrrRand>,
    irr_rand: Box<dyn IrrRand>,
    num_bytes: usize,
    is_valid: bool,
}

impl Encoder {
    /// `metric_name` labels log lines and error messages; `cohort` selects
    /// the hash-function family the caller assigned this client to. Neither
    /// enters the bit pipeline here.
    pub fn new(
        metric_name: impl Into<String>,
        cohort: u32,
        params: Params,
        hash: Box<dyn BloomHash>,
        prr_rand: Box<dyn PrrRand>,
        irr_rand: Box<dyn IrrRand>,
    ) -> Self {
        let metric_name = metric_name.into();
        let is_valid = params.validate(&metric_name).is_ok();
        let num_bytes = if is_valid { params.num_bits / 8 } else { 0 };
        if is_valid {
            log::debug!("{}: num bytes: {}", metric_name, num_bytes);
        } else {
            log::warn!("{}: invalid params, encoder disabled", metric_name);
        }
        Self {
            metric_name,
            cohort,
            params,
            hash,
            prr_rand,
            irr_rand,
            num_bytes,
            is_valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn cohort(&self) -> u32 {
        self.cohort
    }

    /// The report length in bytes, `num_bits / 8`.
    pub fn num_bytes(&self) -> usize {
        self.num_bytes
    }

    /// Encodes `value` into a freshly allocated report.
    pub fn encode(&mut self, value: &str) -> crate::Result<Vec<u8>> {
        let mut output = Vec::new();
        self.encode_into(value, &mut output)?;
        Ok(output)
    }

    /// Encodes `value` into `output`, discarding its previous contents.
    /// The buffer ends up holding exactly `num_bytes` bytes, least
    /// significant byte of the report word first.
    pub fn encode_into(&mut self, value: &str, output: &mut Vec<u8>) -> crate::Result<()> {
        if !self.is_valid {
            return Err(Error::new(format!(
                "{}: can't encode with an invalid configuration",
                self.metric_name
            )));
        }

        let bloom = self.hash.bloom(value.as_bytes(), &self.params);
        log::trace!("{}: bloom: {:#x}", self.metric_name, bloom.word());

        let prr = self.permanent_response(value.as_bytes(), bloom);
        let irr = self.instantaneous_response(prr);

        output.clear();
        output.extend_from_slice(&irr.to_le_bytes(self.num_bytes));
        Ok(())
    }

    /// Permanent randomized response.
    ///
    /// The source is re-seeded from the value on every call, which stands in
    /// for memoizing one randomized word per value: the same value always
    /// produces the same `prr`, without per-value storage.
    fn permanent_response(&mut self, value: &[u8], bloom: Bits) -> Bits {
        self.prr_rand.seed(value);
        let f_bits = self.prr_rand.f_bits();
        let uniform = self.prr_rand.uniform();
        log::trace!(
            "{}: f_bits: {:#x}, uniform: {:#x}",
            self.metric_name,
            f_bits.word(),
            uniform.word()
        );

        // Bits selected by the mask take the fair coin flip, the rest pass
        // the Bloom filter bit through, so each output bit is 1 with
        // probability f/2 + (1 - f) * bloom_bit.
        let prr = (f_bits & uniform) | (bloom & !uniform);
        log::trace!("{}: prr: {:#x}", self.metric_name, prr.word());
        prr
    }

    /// Instantaneous randomized response: the two-coin construction on top
    /// of `prr`, with fresh randomness on every report.
    fn instantaneous_response(&mut self, prr: Bits) -> Bits {
        let p_bits = self.irr_rand.p_bits();
        let q_bits = self.irr_rand.q_bits();
        log::trace!(
            "{}: p_bits: {:#x}, q_bits: {:#x}",
            self.metric_name,
            p_bits.word(),
            q_bits.word()
        );

        // A transmitted bit is 1 with probability q where prr is 1 and with
        // probability p where it is 0.
        let irr = (p_bits & !prr) | (q_bits & prr);
        log::trace!("{}: irr: {:#x}", self.metric_name, irr.word());
        irr
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        hash::RollingHash,
        rand::{HmacPrrRand, SecureIrrRand},
    };

    fn encoder(params: Params, rng_seed: u64) -> Encoder {
        Encoder::new(
            "test_metric",
            0,
            params,
            Box::new(RollingHash),
            Box::new(HmacPrrRand::new(b"client secret", &params).unwrap()),
            Box::new(SecureIrrRand::new_for_test(
                StdRng::seed_from_u64(rng_seed),
                &params,
            )),
        )
    }

    #[test]
    fn validity_gating() {
        let valid = encoder(
            Params {
                num_bits: 64,
                ..Params::default()
            },
            1,
        );
        assert!(valid.is_valid());
        assert_eq!(valid.num_bytes(), 8);

        // The sources are built against a valid configuration; only the
        // encoder sees the ragged width.
        let good = Params::default();
        let mut invalid = Encoder::new(
            "test_metric",
            0,
            Params {
                num_bits: 10,
                ..Params::default()
            },
            Box::new(RollingHash),
            Box::new(HmacPrrRand::new(b"client secret", &good).unwrap()),
            Box::new(SecureIrrRand::new_for_test(StdRng::seed_from_u64(1), &good)),
        );
        assert!(!invalid.is_valid());
        assert!(invalid.encode("anything").is_err());
    }

    #[test]
    fn report_has_exactly_num_bytes() {
        let params = Params {
            num_bits: 32,
            ..Params::default()
        };
        let mut encoder = encoder(params, 2);
        let mut output = vec![0xaa; 17];
        encoder.encode_into("some value", &mut output).unwrap();
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn permanent_response_is_deterministic() {
        let params = Params {
            num_bits: 64,
            ..Params::default()
        };
        let mut a = encoder(params, 3);
        let mut b = encoder(params, 4);

        let bloom = RollingHash.bloom(b"test", &params);
        let first = a.permanent_response(b"test", bloom);
        for _ in 0..10 {
            assert_eq!(a.permanent_response(b"test", bloom), first);
        }
        // Same secret, independent instance: same permanent response.
        assert_eq!(b.permanent_response(b"test", bloom), first);
    }

    #[test]
    fn instantaneous_response_matches_two_coin_model() {
        let params = Params {
            num_bits: 64,
            prob_p: 0.5,
            prob_q: 0.75,
            ..Params::default()
        };
        let mut encoder = encoder(params, 5);

        // Half the word is 1s so both coins get exercised.
        let prr = Bits::new(0x0000_ffff_ffff_0000);
        let trials = 3000;
        let mut ones_where_set = 0u64;
        let mut ones_where_clear = 0u64;
        for _ in 0..trials {
            let irr = encoder.instantaneous_response(prr);
            ones_where_set += (irr & prr).count_ones() as u64;
            ones_where_clear += (irr & !prr).count_ones() as u64;
        }
        let samples = (trials * 32) as f64;
        let q_hat = ones_where_set as f64 / samples;
        let p_hat = ones_where_clear as f64 / samples;
        assert!((q_hat - 0.75).abs() < 0.02, "q_hat {}", q_hat);
        assert!((p_hat - 0.5).abs() < 0.02, "p_hat {}", p_hat);
    }

    #[test]
    fn reports_vary_between_calls() {
        let params = Params {
            num_bits: 64,
            ..Params::default()
        };
        let mut encoder = encoder(params, 6);
        let reports: Vec<_> = (0..8).map(|_| encoder.encode("test").unwrap()).collect();
        assert!(
            reports.windows(2).any(|w| w[0] != w[1]),
            "instantaneous noise produced 8 identical reports"
        );
    }
}
