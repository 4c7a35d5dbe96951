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

//! `aws-chunked` payloads signed chunk by chunk.
//!
//! - [Signature calculations for the Authorization Header: Transferring payload in multiple chunks](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html)

use std::io::Read;
use std::sync::{Arc, Mutex};

use http::header::{HeaderName, CONTENT_ENCODING, CONTENT_LENGTH};
use log::debug;
use streamsign_core::hash::{hex_sha256, EMPTY_SHA256};
use streamsign_core::{
    hex_chunk_size, ChunkEncoder, ChunkExtension, Error, Result, SigningRequest, Trailer,
};

use crate::constants::*;
use crate::{CredentialScope, RollingSigner, V4SigningResult};

/// Length of a hex encoded signature.
const SIGNATURE_LEN: usize = 64;

/// Rolling signer shared by the chunk and trailer signatures of one payload.
pub type SharedRollingSigner = Arc<Mutex<RollingSigner>>;

/// ```text
/// AWS4-HMAC-SHA256-PAYLOAD
/// {amzDate}
/// {scope}
/// {previous}
/// {hex(sha256(""))}
/// {hex(sha256(chunk))}
/// ```
pub fn chunk_string_to_sign(scope: &CredentialScope, previous: &str, chunk: &[u8]) -> String {
    format!(
        "{AWS4_HMAC_SHA256_PAYLOAD}\n{}\n{scope}\n{previous}\n{EMPTY_SHA256}\n{}",
        scope.datetime(),
        hex_sha256(chunk)
    )
}

/// ```text
/// AWS4-HMAC-SHA256-TRAILER
/// {amzDate}
/// {scope}
/// {previous}
/// {hex(sha256(trailer))}
/// ```
pub fn trailer_string_to_sign(scope: &CredentialScope, previous: &str, trailer: &[u8]) -> String {
    format!(
        "{AWS4_HMAC_SHA256_TRAILER}\n{}\n{scope}\n{previous}\n{}",
        scope.datetime(),
        hex_sha256(trailer)
    )
}

fn sign_with(
    signer: &SharedRollingSigner,
    template: impl FnOnce(&str) -> String,
) -> Result<Vec<u8>> {
    let mut signer = signer
        .lock()
        .map_err(|_| Error::encoding_invariant("rolling signer poisoned by a panicking producer"))?;
    Ok(signer.sign(template)?.into_bytes())
}

/// `chunk-signature` extension.
pub struct ChunkSignatureExtension {
    signer: SharedRollingSigner,
    scope: CredentialScope,
}

impl ChunkSignatureExtension {
    /// Sign chunks through `signer`.
    pub fn new(signer: SharedRollingSigner, scope: CredentialScope) -> Self {
        Self { signer, scope }
    }
}

impl ChunkExtension for ChunkSignatureExtension {
    fn name(&self) -> &str {
        CHUNK_SIGNATURE
    }

    fn value(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let scope = &self.scope;
        sign_with(&self.signer, |prev| chunk_string_to_sign(scope, prev, chunk))
    }
}

/// `x-amz-trailer-signature` trailer.
///
/// Must come after every trailer it covers.
pub struct TrailerSignature {
    signer: SharedRollingSigner,
    scope: CredentialScope,
}

impl TrailerSignature {
    /// Sign the trailer block through `signer`.
    pub fn new(signer: SharedRollingSigner, scope: CredentialScope) -> Self {
        Self { signer, scope }
    }
}

impl Trailer for TrailerSignature {
    fn name(&self) -> &str {
        X_AMZ_TRAILER_SIGNATURE
    }

    fn value(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let scope = &self.scope;
        sign_with(&self.signer, |prev| trailer_string_to_sign(scope, prev, chunk))
    }
}

/// Build an encoder that signs every chunk of `source`, seeded by the
/// signature in `result`.
///
/// When `trailers` is not empty, an `x-amz-trailer-signature` trailer is
/// appended after them.
pub fn aws_chunked_encoder<R: Read>(
    result: &V4SigningResult,
    source: R,
    chunk_size: usize,
    mut trailers: Vec<Box<dyn Trailer>>,
) -> Result<ChunkEncoder<R>> {
    let signer = Arc::new(Mutex::new(RollingSigner::from_result(result)?));

    let extensions: Vec<Box<dyn ChunkExtension>> = vec![Box::new(ChunkSignatureExtension::new(
        signer.clone(),
        result.scope.clone(),
    ))];
    if !trailers.is_empty() {
        trailers.push(Box::new(TrailerSignature::new(
            signer,
            result.scope.clone(),
        )));
    }

    ChunkEncoder::new(
        source,
        chunk_size,
        Box::new(hex_chunk_size),
        extensions,
        trailers,
    )
}

/// Number of bytes an `aws-chunked` encoder emits for `payload_len` bytes.
///
/// `trailers` holds the name and the value length of each trailer. With
/// `signed`, every chunk carries a `chunk-signature` and a non-empty
/// trailer block ends with `x-amz-trailer-signature`.
pub fn encoded_length(
    payload_len: u64,
    chunk_size: usize,
    signed: bool,
    trailers: &[(&str, usize)],
) -> Result<u64> {
    if chunk_size == 0 {
        return Err(Error::invalid_argument("chunk size must be positive"));
    }

    // ";chunk-signature=" + signature
    let extension_len = if signed {
        (CHUNK_SIGNATURE.len() + SIGNATURE_LEN + 2) as u64
    } else {
        0
    };
    let chunk_len = |len: u64| format!("{len:x}").len() as u64 + extension_len + 2 + len + 2;

    let chunk_size = chunk_size as u64;
    let full_chunks = payload_len / chunk_size;
    let remaining = payload_len % chunk_size;

    let mut total = full_chunks * chunk_len(chunk_size);
    if remaining > 0 {
        total += chunk_len(remaining);
    }
    // Terminator chunk carries no payload and no payload CRLF.
    total += chunk_len(0) - 2;

    let trailer_len = |name: &str, value_len: usize| (name.len() + 1 + value_len + 2) as u64;
    for (name, value_len) in trailers {
        total += trailer_len(name, *value_len);
    }
    if signed && !trailers.is_empty() {
        total += trailer_len(X_AMZ_TRAILER_SIGNATURE, SIGNATURE_LEN);
    }

    Ok(total + 2)
}

/// Set the headers of a request whose payload will be sent as signed
/// `aws-chunked`.
///
/// Sign the request in header mode afterwards and feed the result to
/// [`aws_chunked_encoder`].
pub fn prepare_streaming_request(
    req: &mut SigningRequest,
    payload_len: u64,
    chunk_size: usize,
    trailers: &[(&str, usize)],
) -> Result<()> {
    let content_length = encoded_length(payload_len, chunk_size, true, trailers)?;
    let content_sha256 = if trailers.is_empty() {
        STREAMING_SIGNED_PAYLOAD
    } else {
        STREAMING_SIGNED_PAYLOAD_TRAILER
    };
    debug!("streaming {payload_len} bytes as {content_length} aws-chunked bytes");

    let mut prepared = req.clone();
    prepared.header_insert(HeaderName::from_static(X_AMZ_CONTENT_SHA_256), content_sha256)?;
    prepared.header_insert(CONTENT_ENCODING, AWS_CHUNKED)?;
    prepared.header_insert(
        HeaderName::from_static(X_AMZ_DECODED_CONTENT_LENGTH),
        &payload_len.to_string(),
    )?;
    if !trailers.is_empty() {
        let names = trailers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(",");
        prepared.header_insert(HeaderName::from_static(X_AMZ_TRAILER), &names)?;
    }
    prepared.header_insert(CONTENT_LENGTH, &content_length.to_string())?;

    *req = prepared;
    Ok(())
}
