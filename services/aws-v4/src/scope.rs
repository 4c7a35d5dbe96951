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

use std::fmt;

use streamsign_core::time::{format_date, format_iso8601, DateTime};

use crate::constants::AWS4_REQUEST;

/// The scope a signature is valid for.
///
/// ```text
/// scope    = "{yyyyMMdd}/{region}/{service}/aws4_request"
/// datetime = "{yyyyMMdd}T{HHmmss}Z"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    region: String,
    service: String,
    instant: DateTime,
}

impl CredentialScope {
    /// Create a scope for `region` and `service` at the signing instant.
    pub fn new(region: impl Into<String>, service: impl Into<String>, instant: DateTime) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
            instant,
        }
    }

    /// Region to sign for.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Service to sign for.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The signing instant.
    pub fn instant(&self) -> DateTime {
        self.instant
    }

    /// Day precision date: `20130524`
    pub fn date(&self) -> String {
        format_date(self.instant)
    }

    /// Timestamp used as `x-amz-date`: `20130524T000000Z`
    pub fn datetime(&self) -> String {
        format_iso8601(self.instant)
    }

    /// `20130524/us-east-1/s3/aws4_request`
    pub fn scope(&self) -> String {
        self.to_string()
    }

    /// Credential string: `{access_key_id}/{scope}`
    pub fn credential(&self, access_key_id: &str) -> String {
        format!("{access_key_id}/{self}")
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            format_date(self.instant),
            self.region,
            self.service,
            AWS4_REQUEST
        )
    }
}
