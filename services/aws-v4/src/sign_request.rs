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

use std::time::Duration;

use http::header::{HeaderName, AUTHORIZATION};
use http::request::Parts;
use log::debug;
use streamsign_core::hash::hex_sha256;
use streamsign_core::{Error, Result, SigningRequest};

use crate::canonical_request::{CanonicalHeaders, CanonicalRequest, SignedHeaders};
use crate::constants::*;
use crate::{CredentialScope, SigningKey, SigningProperties};

/// Body of the request being signed, used to compute the payload hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableBody<'a> {
    /// The whole body, hashed with SHA-256.
    Bytes(&'a [u8]),
    /// An already computed payload hash.
    Precomputed(String),
    /// `UNSIGNED-PAYLOAD`
    UnsignedPayload,
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
    StreamingSigned,
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD-TRAILER`
    StreamingSignedTrailer,
    /// `STREAMING-UNSIGNED-PAYLOAD-TRAILER`
    StreamingUnsignedTrailer,
}

impl SignableBody<'_> {
    /// The value used as the canonical request's hashed payload.
    pub fn payload_hash(&self) -> String {
        match self {
            SignableBody::Bytes(v) => hex_sha256(v),
            SignableBody::Precomputed(v) => v.clone(),
            SignableBody::UnsignedPayload => UNSIGNED_PAYLOAD.to_string(),
            SignableBody::StreamingSigned => STREAMING_SIGNED_PAYLOAD.to_string(),
            SignableBody::StreamingSignedTrailer => STREAMING_SIGNED_PAYLOAD_TRAILER.to_string(),
            SignableBody::StreamingUnsignedTrailer => {
                STREAMING_UNSIGNED_PAYLOAD_TRAILER.to_string()
            }
        }
    }
}

/// Where the signature ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureLocation {
    /// `Authorization` header.
    Headers,
    /// `X-Amz-Signature` query parameter.
    QueryParams,
    /// Presigned url valid for the given duration.
    Presigned(Duration),
}

/// Output of a signing invocation.
#[derive(Debug, Clone)]
pub struct V4SigningResult {
    /// The signed request.
    pub request: SigningRequest,
    /// Hex encoded signature, the seed of a chunk signature chain.
    pub signature: String,
    /// Scope the signature is valid for.
    pub scope: CredentialScope,
    /// Headers covered by the signature.
    pub signed_headers: SignedHeaders,
    /// Key the signature was computed with.
    pub signing_key: SigningKey,
}

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// Every method works on a copy of the request: on error the caller's
/// request is left as it was.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    properties: SigningProperties,
}

impl RequestSigner {
    /// Create a new signer.
    pub fn new(properties: SigningProperties) -> Self {
        Self { properties }
    }

    /// Properties this signer signs with.
    pub fn properties(&self) -> &SigningProperties {
        &self.properties
    }

    /// Compute the signature without attaching anything but `Host`.
    ///
    /// The payload hash comes from `x-amz-content-sha256`, or the body hint.
    pub fn sign(&self, req: &SigningRequest) -> Result<V4SigningResult> {
        let (scope, req) = self.prepare(req)?;
        let payload_hash = match req.header_get(X_AMZ_CONTENT_SHA_256)? {
            Some(v) => v.to_string(),
            None => req.body_hash.clone().ok_or_else(|| {
                Error::missing_payload_hash("request has neither x-amz-content-sha256 nor body hash")
            })?,
        };

        let headers = CanonicalHeaders::from_request(&req, &self.properties.settings)?;
        self.calculate(req, headers, scope, &payload_hash)
    }

    /// Sign and attach `X-Amz-Date`, `X-Amz-Security-Token` and
    /// `Authorization` headers.
    ///
    /// Fails with `MissingPayloadHash` when the request has no
    /// `x-amz-content-sha256` header and no body hint to fill it from.
    pub fn sign_header(&self, req: &SigningRequest) -> Result<V4SigningResult> {
        let (scope, mut req) = self.prepare(req)?;
        let content_sha256 = req
            .header_get(X_AMZ_CONTENT_SHA_256)?
            .map(|v| v.to_string());
        let payload_hash = match content_sha256 {
            Some(v) => v,
            None => {
                let hint = req.body_hash.clone().ok_or_else(|| {
                    Error::missing_payload_hash(
                        "header signing requires x-amz-content-sha256 to be set",
                    )
                })?;
                req.header_insert(HeaderName::from_static(X_AMZ_CONTENT_SHA_256), &hint)?;
                hint
            }
        };

        let cred = &self.properties.credential;
        req.headers.remove(AUTHORIZATION);
        req.header_insert(HeaderName::from_static(X_AMZ_DATE), &scope.datetime())?;
        if let Some(token) = &cred.session_token {
            req.header_insert_sensitive(HeaderName::from_static(X_AMZ_SECURITY_TOKEN), token)?;
        }

        let headers = CanonicalHeaders::from_request(&req, &self.properties.settings)?;
        let mut result = self.calculate(req, headers, scope, &payload_hash)?;

        let authorization = format!(
            "{AWS4_HMAC_SHA256} Credential={}, SignedHeaders={}, Signature={}",
            result.scope.credential(&cred.access_key_id),
            result.signed_headers,
            result.signature
        );
        result
            .request
            .header_insert_sensitive(AUTHORIZATION, &authorization)?;
        Ok(result)
    }

    /// Sign and attach the signature as query parameters.
    ///
    /// `x-amz-date` is carried by the query, not by a header.
    pub fn sign_query(&self, req: &SigningRequest) -> Result<V4SigningResult> {
        self.sign_query_inner(req, None)
    }

    /// Build a presigned request valid for `expires`.
    ///
    /// `x-amz-content-sha256` is removed from the headers, its value is
    /// still used as the payload hash.
    pub fn sign_presigned(
        &self,
        req: &SigningRequest,
        expires: Duration,
    ) -> Result<V4SigningResult> {
        self.sign_query_inner(req, Some(expires))
    }

    /// Sign `parts` in place.
    pub fn sign_parts(
        &self,
        parts: &mut Parts,
        body: &SignableBody<'_>,
        location: SignatureLocation,
    ) -> Result<V4SigningResult> {
        let req = SigningRequest::build(parts)?.with_body_hash(body.payload_hash());
        let result = match location {
            SignatureLocation::Headers => self.sign_header(&req)?,
            SignatureLocation::QueryParams => self.sign_query(&req)?,
            SignatureLocation::Presigned(expires) => self.sign_presigned(&req, expires)?,
        };

        result.request.clone().apply(parts)?;
        Ok(result)
    }

    fn sign_query_inner(
        &self,
        req: &SigningRequest,
        expires: Option<Duration>,
    ) -> Result<V4SigningResult> {
        let (scope, mut req) = self.prepare(req)?;
        let content_sha256 = if expires.is_some() {
            req.headers
                .remove(X_AMZ_CONTENT_SHA_256)
                .map(|v| v.to_str().map(|v| v.to_string()))
                .transpose()?
        } else {
            req.header_get(X_AMZ_CONTENT_SHA_256)?.map(|v| v.to_string())
        };
        let payload_hash = content_sha256
            .or_else(|| req.body_hash.clone())
            .unwrap_or_else(|| UNSIGNED_PAYLOAD.to_string());

        let cred = &self.properties.credential;
        let headers = CanonicalHeaders::from_request(&req, &self.properties.settings)?;

        req.query_push(X_AMZ_ALGORITHM_QUERY, AWS4_HMAC_SHA256);
        req.query_push(
            X_AMZ_CREDENTIAL_QUERY,
            scope.credential(&cred.access_key_id),
        );
        req.query_push(X_AMZ_DATE_QUERY, scope.datetime());
        if let Some(expires) = expires {
            req.query_push(X_AMZ_EXPIRES_QUERY, expires.as_secs().to_string());
        }
        req.query_push(
            X_AMZ_SIGNED_HEADERS_QUERY,
            headers.signed_headers().to_string(),
        );
        if let Some(token) = &cred.session_token {
            req.query_push(X_AMZ_SECURITY_TOKEN_QUERY, token);
        }

        let mut result = self.calculate(req, headers, scope, &payload_hash)?;
        result
            .request
            .query_push(X_AMZ_SIGNATURE_QUERY, result.signature.clone());
        Ok(result)
    }

    /// Read the clock, check the credential and copy the request.
    fn prepare(&self, req: &SigningRequest) -> Result<(CredentialScope, SigningRequest)> {
        let now = self.properties.clock.now();
        self.properties.credential.check(now)?;

        let scope = self.properties.scope_at(now);
        debug!("calculated scope: {scope}");

        let mut req = req.clone();
        req.header_insert_host()?;
        Ok((scope, req))
    }

    fn calculate(
        &self,
        req: SigningRequest,
        headers: CanonicalHeaders,
        scope: CredentialScope,
        payload_hash: &str,
    ) -> Result<V4SigningResult> {
        let signing_key =
            SigningKey::derive(&self.properties.credential.secret_access_key, &scope)?;

        let (signature, signed_headers) = {
            let creq = CanonicalRequest::new(&req, headers, &self.properties.settings, payload_hash);
            let string_to_sign = creq.string_to_sign(&scope).to_string();
            debug!("calculated string to sign: {string_to_sign}");

            (
                signing_key.sign(string_to_sign.as_bytes())?,
                creq.signed_headers().clone(),
            )
        };

        Ok(V4SigningResult {
            request: req,
            signature,
            scope,
            signed_headers,
            signing_key,
        })
    }
}
