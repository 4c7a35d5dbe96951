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

//! Core components for signing API requests and streaming payloads.
//!
//! This crate provides the foundational, provider independent pieces of the
//! streamsign workspace:
//!
//! - [`SigningRequest`]: a mutable descriptor of the request being signed,
//!   built from and applied back to [`http::request::Parts`].
//! - [`ChunkEncoder`]: a lazy HTTP/1.1 chunked transfer encoder with
//!   per-chunk extensions and trailers.
//! - [`Error`]: the error type shared by every crate in the workspace.
//!
//! ## Example
//!
//! ```
//! use std::io::Read;
//! use streamsign_core::{extension_fn, ChunkEncoder};
//!
//! let mut encoder = ChunkEncoder::builder(&b"abcdefghij"[..], 3)
//!     .extension(extension_fn("hello", |_| Ok(b"world!".to_vec())))
//!     .build()?;
//!
//! let mut out = String::new();
//! encoder.read_to_string(&mut out)?;
//! assert!(out.starts_with("3;hello=world!\r\nabc\r\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and injectable clocks
//! - [`utils`]: Percent encoding and data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};
mod request;
pub use request::SigningRequest;
mod chunked;
pub use chunked::{
    extension_fn, hex_chunk_size, trailer_fn, ChunkEncoder, ChunkEncoderBuilder, ChunkExtension,
    FnExtension, FnTrailer, SizeEncoder, Trailer,
};
