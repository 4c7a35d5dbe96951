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

use std::sync::Arc;

use http::header::{HeaderName, CONNECTION, EXPECT, USER_AGENT};
use streamsign_core::time::{Clock, DateTime, SystemClock};

use crate::{Credential, CredentialScope};

const X_AMZN_TRACE_ID: &str = "x-amzn-trace-id";

/// Settings that change how a request is canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningSettings {
    /// Percent-encode the already encoded path a second time.
    ///
    /// Every service except S3 expects this.
    pub double_url_encode: bool,
    /// Remove `.`, `..` and empty segments from the path before signing.
    pub normalize_path: bool,
    /// Headers that are never signed even when present.
    ///
    /// Proxies are free to rewrite these, which would break the signature.
    pub excluded_headers: Vec<HeaderName>,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            double_url_encode: true,
            normalize_path: true,
            excluded_headers: vec![
                CONNECTION,
                USER_AGENT,
                HeaderName::from_static(X_AMZN_TRACE_ID),
                EXPECT,
            ],
        }
    }
}

impl SigningSettings {
    /// Settings expected by `service`.
    ///
    /// S3 signs the raw path: no normalization, no double encoding.
    pub fn for_service(service: &str) -> Self {
        match service {
            "s3" | "s3-outposts" | "s3express" => Self::default()
                .with_double_url_encode(false)
                .with_normalize_path(false),
            _ => Self::default(),
        }
    }

    /// Set `double_url_encode`.
    pub fn with_double_url_encode(mut self, v: bool) -> Self {
        self.double_url_encode = v;
        self
    }

    /// Set `normalize_path`.
    pub fn with_normalize_path(mut self, v: bool) -> Self {
        self.normalize_path = v;
        self
    }

    /// Replace the excluded header list.
    pub fn with_excluded_headers(mut self, headers: Vec<HeaderName>) -> Self {
        self.excluded_headers = headers;
        self
    }

    pub(crate) fn is_excluded(&self, name: &str) -> bool {
        self.excluded_headers.iter().any(|h| h.as_str() == name)
    }
}

/// Everything a signing invocation needs besides the request itself.
#[derive(Debug, Clone)]
pub struct SigningProperties {
    /// Credential used to derive the signing key.
    pub credential: Credential,
    /// Region to sign for.
    pub region: String,
    /// Service to sign for.
    pub service: String,
    /// Source of the signing instant.
    pub clock: Arc<dyn Clock>,
    /// Canonicalization settings.
    pub settings: SigningSettings,
}

impl SigningProperties {
    /// Create properties that sign with the wall clock and the settings
    /// `service` expects.
    pub fn new(credential: Credential, region: impl Into<String>, service: impl Into<String>) -> Self {
        let service = service.into();
        Self {
            credential,
            region: region.into(),
            settings: SigningSettings::for_service(&service),
            service,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use another clock.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Use other canonicalization settings.
    pub fn with_settings(mut self, settings: SigningSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Read the clock once and build the scope for this invocation.
    pub fn scope(&self) -> CredentialScope {
        self.scope_at(self.clock.now())
    }

    pub(crate) fn scope_at(&self, instant: DateTime) -> CredentialScope {
        CredentialScope::new(&self.region, &self.service, instant)
    }
}
