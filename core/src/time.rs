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

//! Time related utils.

use crate::Error;
use crate::Result;
use chrono::NaiveDateTime;
use chrono::Utc;
use std::fmt::Debug;

/// The instant type used across signing.
pub type DateTime = chrono::DateTime<Utc>;

/// Date format: "20220313"
const DATE: &str = "%Y%m%d";

/// Time format for ISO 8601: "20220313T072004Z"
const ISO8601: &str = "%Y%m%dT%H%M%SZ";

/// Create a new DateTime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    t.format(DATE).to_string()
}

/// Format time into ISO8601: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format(ISO8601).to_string()
}

/// Parse time from ISO8601: `20220313T072004Z`
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    let t = NaiveDateTime::parse_from_str(s, ISO8601).map_err(|e| {
        Error::invalid_argument(format!("invalid iso8601 timestamp: {s}")).with_source(e)
    })?;
    Ok(t.and_utc())
}

/// Clock provides the signing instant.
///
/// Signers read the clock exactly once per signing invocation.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> DateTime;
}

/// Clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        now()
    }
}

/// Clock that always returns the same instant.
///
/// Use it for reproducible signatures, for example in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime);

impl FixedClock {
    /// Create a clock frozen at `time`.
    pub fn new(time: DateTime) -> Self {
        Self(time)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}
