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

//! Client-side encoder for RAPPOR (Randomized Aggregatable Privacy-Preserving
//! Ordinal Response).
//!
//! A reported value goes through three stages before it leaves the client:
//!
//! 1. the value is hashed into a fixed-width Bloom filter;
//! 2. the Permanent Randomized Response (PRR) deterministically perturbs the
//!    filter, so that repeated reports of the same value are statistically
//!    indistinguishable from a single fixed randomized value;
//! 3. the Instantaneous Randomized Response (IRR) adds fresh noise on every
//!    report, so that individual reports are not linkable across time.
//!
//! The IRR bit vector is what gets serialized and transmitted; aggregation
//! and estimation happen server-side and are not part of this crate.
//!
//! Based on the upstream design described in
//! https://research.google/pubs/pub42852/

use core::fmt;

pub mod bits;
pub mod checks;
pub mod encoder;
pub mod hash;
pub mod params;
pub mod rand;


/// Error type for invalid encoder configurations and failed entropy draws.
#[derive(Debug, PartialEq)]
pub struct Error {
    message: String,
}

impl Error {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl From<::rand::Error> for Error {
    fn from(error: ::rand::Error) -> Self {
        Self::new(format!("couldn't obtain randomness: {}", error))
    }
}

pub type Result<T> = core::result::Result<T, Error>;
