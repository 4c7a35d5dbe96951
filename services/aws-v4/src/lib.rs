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

//! AWS SigV4 signer with chunk-signed streaming payloads.
//!
//! ## Example
//!
//! ```
//! use std::io::Read;
//!
//! use http::Method;
//! use streamsign_aws_v4::{aws_chunked_encoder, prepare_streaming_request};
//! use streamsign_aws_v4::{Credential, RequestSigner, SigningProperties};
//! use streamsign_core::SigningRequest;
//!
//! let signer = RequestSigner::new(SigningProperties::new(
//!     Credential::new("access_key_id", "secret_access_key"),
//!     "us-east-1",
//!     "s3",
//! ));
//!
//! let payload = b"hello, world";
//! let mut req = SigningRequest::from_uri(Method::PUT, "https://s3.amazonaws.com/bucket/key")?;
//! prepare_streaming_request(&mut req, payload.len() as u64, 64 * 1024, &[])?;
//!
//! let result = signer.sign_header(&req)?;
//! let mut body = Vec::new();
//! aws_chunked_encoder(&result, &payload[..], 64 * 1024, vec![])?.read_to_end(&mut body)?;
//! assert!(body.starts_with(b"c;chunk-signature="));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod credential;
pub use credential::Credential;
mod scope;
pub use scope::CredentialScope;
mod signing_key;
pub use signing_key::SigningKey;
mod settings;
pub use settings::{SigningProperties, SigningSettings};
mod canonical_request;
pub use canonical_request::SignedHeaders;
mod sign_request;
pub use sign_request::{RequestSigner, SignableBody, SignatureLocation, V4SigningResult};
mod rolling;
pub use rolling::RollingSigner;
mod streaming;
pub use streaming::{
    aws_chunked_encoder, chunk_string_to_sign, encoded_length, prepare_streaming_request,
    trailer_string_to_sign, ChunkSignatureExtension, SharedRollingSigner, TrailerSignature,
};
mod checksum;
pub use checksum::{ChecksumAlgorithm, ChecksumReader, ChecksumTrailer};
