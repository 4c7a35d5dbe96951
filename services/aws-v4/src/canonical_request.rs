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
use std::fmt::{Display, Formatter};

use http::Method;
use log::debug;
use percent_encoding::utf8_percent_encode;
use streamsign_core::hash::hex_sha256;
use streamsign_core::utils::uri_encode;
use streamsign_core::{Result, SigningRequest};

use crate::constants::{AWS4_HMAC_SHA256, AWS_URI_ENCODE_SET};
use crate::{CredentialScope, SigningSettings};

/// Sorted, lowercase names of the headers covered by a signature.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignedHeaders(Vec<String>);

impl SignedHeaders {
    /// The names in ascending order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Check if `name` is signed.
    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|v| v.as_str().cmp(name)).is_ok()
    }
}

impl Display for SignedHeaders {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// `name:value` lines of the canonical request, already sorted.
#[derive(Debug, Clone)]
pub(crate) struct CanonicalHeaders {
    headers: Vec<(String, String)>,
}

impl CanonicalHeaders {
    /// Canonicalize every header of `req` that `settings` doesn't exclude.
    pub(crate) fn from_request(req: &SigningRequest, settings: &SigningSettings) -> Result<Self> {
        let mut headers = Vec::with_capacity(req.headers.keys_len());
        for name in req.headers.keys() {
            if settings.is_excluded(name.as_str()) {
                continue;
            }

            let mut value = String::new();
            for (i, v) in req.headers.get_all(name).iter().enumerate() {
                if i > 0 {
                    value.push(',');
                }
                collapse_whitespace(v.to_str()?, &mut value);
            }
            // HeaderName is lowercase already.
            headers.push((name.as_str().to_string(), value));
        }
        headers.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        Ok(Self { headers })
    }

    pub(crate) fn signed_headers(&self) -> SignedHeaders {
        SignedHeaders(self.headers.iter().map(|(k, _)| k.clone()).collect())
    }
}

/// Trim `value` and replace every run of spaces and tabs inside it with a
/// single space.
fn collapse_whitespace(value: &str, out: &mut String) {
    let mut words = value
        .split(|c| c == ' ' || c == '\t')
        .filter(|v| !v.is_empty());
    if let Some(first) = words.next() {
        out.push_str(first);
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
    }
}

/// The canonical form of a request.
///
/// ```text
/// {METHOD}\n
/// {CanonicalURI}\n
/// {CanonicalQueryString}\n
/// {CanonicalHeaders}\n
/// {SignedHeaders}\n
/// {HashedPayload}
/// ```
#[derive(Debug, Clone)]
pub(crate) struct CanonicalRequest<'a> {
    method: &'a Method,
    path: String,
    query: String,
    headers: CanonicalHeaders,
    signed_headers: SignedHeaders,
    payload_hash: &'a str,
}

impl<'a> CanonicalRequest<'a> {
    pub(crate) fn new(
        req: &'a SigningRequest,
        headers: CanonicalHeaders,
        settings: &SigningSettings,
        payload_hash: &'a str,
    ) -> Self {
        let signed_headers = headers.signed_headers();
        Self {
            method: &req.method,
            path: canonical_uri(&req.path, settings),
            query: canonical_query(&req.query),
            headers,
            signed_headers,
            payload_hash,
        }
    }

    pub(crate) fn signed_headers(&self) -> &SignedHeaders {
        &self.signed_headers
    }

    /// Build the string to sign for this request.
    pub(crate) fn string_to_sign<'s>(&self, scope: &'s CredentialScope) -> StringToSign<'s> {
        let creq = self.to_string();
        debug!("calculated canonical request: {creq}");

        StringToSign {
            algorithm: AWS4_HMAC_SHA256,
            scope,
            hashed_request: hex_sha256(creq.as_bytes()),
        }
    }
}

impl Display for CanonicalRequest<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.path)?;
        writeln!(f, "{}", self.query)?;
        for (name, value) in &self.headers.headers {
            writeln!(f, "{name}:{value}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.signed_headers)?;
        write!(f, "{}", self.payload_hash)
    }
}

/// ```text
/// AWS4-HMAC-SHA256
/// 20130524T000000Z
/// 20130524/us-east-1/s3/aws4_request
/// <hashed_canonical_request>
/// ```
#[derive(Debug, Clone)]
pub(crate) struct StringToSign<'a> {
    algorithm: &'static str,
    scope: &'a CredentialScope,
    hashed_request: String,
}

impl Display for StringToSign<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.algorithm)?;
        writeln!(f, "{}", self.scope.datetime())?;
        writeln!(f, "{}", self.scope)?;
        write!(f, "{}", self.hashed_request)
    }
}

/// Canonical URI of an already percent-encoded `path`.
pub(crate) fn canonical_uri(path: &str, settings: &SigningSettings) -> String {
    let mut path = if settings.normalize_path {
        remove_dot_segments(path)
    } else {
        path.to_string()
    };
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    if settings.double_url_encode {
        utf8_percent_encode(&path, &AWS_URI_ENCODE_SET).to_string()
    } else {
        path
    }
}

/// RFC 3986 section 5.2.4, dropping empty segments and keeping the
/// trailing `/`.
fn remove_dot_segments(path: &str) -> String {
    let mut output: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                output.pop();
            }
            v => output.push(v),
        }
    }

    let trailing_slash = ["/", "/.", "/.."].iter().any(|v| path.ends_with(v));

    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    normalized.push_str(&output.join("/"));
    if trailing_slash && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Encode every pair and sort by the encoded name, then value.
pub(crate) fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    pairs.sort_unstable();

    let mut s = String::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            s.push('&');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s
}
