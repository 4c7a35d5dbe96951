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

use std::fmt::{Debug, Formatter};

use streamsign_core::utils::Redact;
use streamsign_core::{Error, Result};

use crate::{SigningKey, V4SigningResult};

/// Signer that chains every signature onto the previous one.
///
/// `sign` is sequential: each call sees the signature the last call
/// produced.
#[derive(Clone)]
pub struct RollingSigner {
    key: SigningKey,
    previous: String,
}

impl RollingSigner {
    /// Create a signer seeded with `seed`, usually the request signature.
    pub fn new(key: SigningKey, seed: impl Into<String>) -> Result<Self> {
        let previous = seed.into();
        if previous.is_empty() {
            return Err(Error::invalid_argument(
                "rolling signer requires a non-empty seed signature",
            ));
        }
        Ok(Self { key, previous })
    }

    /// Seed from the result of signing the request.
    pub fn from_result(result: &V4SigningResult) -> Result<Self> {
        Self::new(result.signing_key, result.signature.clone())
    }

    /// The last signature produced, or the seed.
    pub fn previous(&self) -> &str {
        &self.previous
    }

    /// Sign the string `template` builds from the previous signature.
    ///
    /// ```text
    /// next = hex(HMAC(key, template(previous)))
    /// ```
    pub fn sign(&mut self, template: impl FnOnce(&str) -> String) -> Result<String> {
        let string_to_sign = template(&self.previous);
        let next = self.key.sign(string_to_sign.as_bytes())?;
        self.previous.clone_from(&next);
        Ok(next)
    }
}

impl Debug for RollingSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingSigner")
            .field("key", &self.key)
            .field("previous", &Redact::from(&self.previous))
            .finish()
    }
}
