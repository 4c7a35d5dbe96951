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
use streamsign_core::time::{format_iso8601, DateTime};
use streamsign_core::utils::Redact;
use streamsign_core::{Error, Result};

/// Credential that holds the access_key and secret_key.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access key id for aws services.
    pub access_key_id: String,
    /// Secret access key for aws services.
    pub secret_access_key: String,
    /// Session token for aws services.
    pub session_token: Option<String>,
    /// Account id the credential belongs to.
    pub account_id: Option<String>,
    /// Expiration time for this credential.
    pub expires_in: Option<DateTime>,
}

impl Credential {
    /// Create a long-term credential.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            ..Default::default()
        }
    }

    /// Attach a session token.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attach an account id.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Attach an expiration time.
    pub fn with_expires_in(mut self, expires_in: DateTime) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Check if this credential has expired at `now`.
    pub fn is_expired(&self, now: DateTime) -> bool {
        self.expires_in.is_some_and(|v| v <= now)
    }

    /// Check that this credential can sign a request at `now`.
    pub fn check(&self, now: DateTime) -> Result<()> {
        if self.access_key_id.is_empty() {
            return Err(Error::invalid_argument("access key id must not be empty"));
        }
        if self.secret_access_key.is_empty() {
            return Err(Error::invalid_argument(
                "secret access key must not be empty",
            ));
        }
        if let Some(expires_in) = self.expires_in.filter(|_| self.is_expired(now)) {
            return Err(Error::invalid_argument(format!(
                "credential expired at {}",
                format_iso8601(expires_in)
            )));
        }
        Ok(())
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("account_id", &self.account_id)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
