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

use std::mem;
use std::str::FromStr;

use http::header::HeaderName;
use http::header::HOST;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::utils::uri_encode;
use crate::Error;
use crate::Result;

/// Signing context for request.
///
/// Headers keep the case-insensitive, multi-valued semantics of
/// [`HeaderMap`]. Query pairs are stored decoded and in insertion order;
/// they are percent-encoded again when applied back to a request.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, percent-encoded as it appears on the wire.
    pub path: String,
    /// HTTP query parameters.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Hint for the payload hash, used when the request carries no
    /// explicit payload hash header.
    pub body_hash: Option<String>,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    ///
    /// `parts` is left untouched; call [`SigningRequest::apply`] to write the
    /// signed request back.
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let uri = parts.uri.clone().into_parts();
        let authority = uri.authority.ok_or_else(|| {
            Error::invalid_argument("request without authority is invalid for signing")
        })?;
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers: parts.headers.clone(),
            body_hash: None,
        })
    }

    /// Build a signing context from a method and an absolute uri.
    pub fn from_uri(method: Method, uri: &str) -> Result<Self> {
        let (parts, _) = http::Request::builder()
            .method(method)
            .uri(Uri::from_str(uri)?)
            .body(())?
            .into_parts();
        Self::build(&parts)
    }

    /// Set the payload hash hint.
    pub fn with_body_hash(mut self, hash: impl Into<String>) -> Self {
        self.body_hash = Some(hash.into());
        self
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        let query_size = self.query_size();

        let uri = {
            let mut uri_parts = parts.uri.clone().into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if query_size == 0 {
                    self.path
                } else {
                    let mut s = self.path;
                    s.reserve(query_size + 1);

                    s.push('?');
                    for (i, (k, v)) in self.query.iter().enumerate() {
                        if i > 0 {
                            s.push('&');
                        }

                        s.push_str(&uri_encode(k));
                        if !v.is_empty() {
                            s.push('=');
                            s.push_str(&uri_encode(v));
                        }
                    }

                    s
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        // Nothing below can fail, the request is only touched once the uri is valid.
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = uri;

        Ok(())
    }

    /// Value of the `Host` header derived from the authority.
    ///
    /// The default port of the scheme is omitted.
    pub fn host(&self) -> &str {
        let default_port = if self.scheme == Scheme::HTTPS {
            Some(443)
        } else if self.scheme == Scheme::HTTP {
            Some(80)
        } else {
            None
        };

        match self.authority.port_u16() {
            Some(port) if Some(port) == default_port => self.authority.host(),
            _ => self.authority.as_str(),
        }
    }

    /// Get query size.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Get the first query value of given key.
    pub fn query_get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert a header, replacing all existing values of the same name.
    pub fn header_insert(&mut self, key: HeaderName, value: &str) -> Result<()> {
        self.headers.insert(key, HeaderValue::from_str(value)?);
        Ok(())
    }

    /// Insert a sensitive header, replacing all existing values of the same name.
    ///
    /// The value is marked sensitive so it is hidden from `Debug` output.
    pub fn header_insert_sensitive(&mut self, key: HeaderName, value: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(true);
        self.headers.insert(key, value);
        Ok(())
    }

    /// Insert the `Host` header derived from authority if it's absent.
    pub fn header_insert_host(&mut self) -> Result<()> {
        if !self.headers.contains_key(HOST) {
            let host = HeaderValue::from_str(self.host())?;
            self.headers.insert(HOST, host);
        }
        Ok(())
    }

    /// Get header value by name.
    ///
    /// Returns `None` if the header is not found.
    pub fn header_get(&self, key: &str) -> Result<Option<&str>> {
        match self.headers.get(key) {
            Some(v) => Ok(Some(v.to_str()?)),
            None => Ok(None),
        }
    }
}
