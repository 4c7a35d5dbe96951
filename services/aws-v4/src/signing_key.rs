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

//! Signing key derivation.
//!
//! ```text
//! kDate    = HMAC("AWS4" + kSecret, yyyyMMdd)
//! kRegion  = HMAC(kDate, region)
//! kService = HMAC(kRegion, service)
//! kSigning = HMAC(kService, "aws4_request")
//! ```

use std::fmt::{Debug, Formatter};

use streamsign_core::hash::{hex_hmac_sha256, hmac_sha256};
use streamsign_core::Result;

use crate::constants::AWS4_REQUEST;
use crate::CredentialScope;

/// The derived `kSigning` key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    /// Derive the signing key for `scope` from a secret access key.
    pub fn derive(secret: &str, scope: &CredentialScope) -> Result<Self> {
        let secret = format!("AWS4{secret}");
        // Sign date
        let sign_date = hmac_sha256(secret.as_bytes(), scope.date().as_bytes())?;
        // Sign region
        let sign_region = hmac_sha256(&sign_date, scope.region().as_bytes())?;
        // Sign service
        let sign_service = hmac_sha256(&sign_region, scope.service().as_bytes())?;
        // Sign request
        let sign_request = hmac_sha256(&sign_service, AWS4_REQUEST.as_bytes())?;

        Ok(Self(sign_request))
    }

    /// Hex encoded `HMAC(kSigning, string_to_sign)`.
    pub fn sign(&self, string_to_sign: &[u8]) -> Result<String> {
        hex_hmac_sha256(&self.0, string_to_sign)
    }
}

impl AsRef<[u8]> for SigningKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for SigningKey {
    fn from(key: [u8; 32]) -> Self {
        Self(key)
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey")
    }
}
