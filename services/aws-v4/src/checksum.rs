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

use std::io;
use std::io::Read;
use std::sync::{Arc, Mutex};

use sha1::Sha1;
use sha2::{Digest, Sha256};
use streamsign_core::hash::base64_encode;
use streamsign_core::{Error, Result, Trailer};

use crate::constants::{
    X_AMZ_CHECKSUM_CRC32, X_AMZ_CHECKSUM_CRC32C, X_AMZ_CHECKSUM_SHA1, X_AMZ_CHECKSUM_SHA256,
};

/// Algorithm of a flexible checksum sent as a trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// `x-amz-checksum-crc32`
    Crc32,
    /// `x-amz-checksum-crc32c`
    Crc32c,
    /// `x-amz-checksum-sha256`
    Sha256,
    /// `x-amz-checksum-sha1`
    Sha1,
}

impl ChecksumAlgorithm {
    /// Name of the trailer carrying the checksum.
    pub fn header_name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Crc32 => X_AMZ_CHECKSUM_CRC32,
            ChecksumAlgorithm::Crc32c => X_AMZ_CHECKSUM_CRC32C,
            ChecksumAlgorithm::Sha256 => X_AMZ_CHECKSUM_SHA256,
            ChecksumAlgorithm::Sha1 => X_AMZ_CHECKSUM_SHA1,
        }
    }

    /// Length of the base64 encoded checksum.
    pub fn encoded_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::Crc32 | ChecksumAlgorithm::Crc32c => 8,
            ChecksumAlgorithm::Sha256 => 44,
            ChecksumAlgorithm::Sha1 => 28,
        }
    }

    fn hasher(&self) -> Hasher {
        match self {
            ChecksumAlgorithm::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
            ChecksumAlgorithm::Crc32c => Hasher::Crc32c(0),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
        }
    }
}

#[derive(Clone)]
enum Hasher {
    Crc32(crc32fast::Hasher),
    /// Running crc32c value.
    Crc32c(u32),
    Sha256(Sha256),
    Sha1(Sha1),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Crc32(h) => h.update(data),
            Hasher::Crc32c(crc) => *crc = crc32c::crc32c_append(*crc, data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
        }
    }

    /// Checksum of everything seen so far, CRCs as big-endian bytes.
    fn digest(&self) -> Vec<u8> {
        match self.clone() {
            Hasher::Crc32(h) => h.finalize().to_be_bytes().to_vec(),
            Hasher::Crc32c(crc) => crc.to_be_bytes().to_vec(),
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha1(h) => h.finalize().to_vec(),
        }
    }
}

type SharedHasher = Arc<Mutex<Hasher>>;

fn poisoned() -> Error {
    Error::encoding_invariant("checksum state poisoned by a panicking reader")
}

/// Reader that checksums every byte read through it.
///
/// The matching [`ChecksumTrailer`] emits the checksum once the encoder
/// has drained this reader.
pub struct ChecksumReader<R> {
    inner: R,
    algorithm: ChecksumAlgorithm,
    hasher: SharedHasher,
}

impl<R: Read> ChecksumReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R, algorithm: ChecksumAlgorithm) -> Self {
        Self {
            inner,
            algorithm,
            hasher: Arc::new(Mutex::new(algorithm.hasher())),
        }
    }

    /// Trailer that reports the checksum of everything read so far.
    pub fn trailer(&self) -> ChecksumTrailer {
        ChecksumTrailer {
            algorithm: self.algorithm,
            hasher: self.hasher.clone(),
        }
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher
            .lock()
            .map_err(|_| io::Error::other(poisoned()))?
            .update(&buf[..n]);
        Ok(n)
    }
}

/// Trailer carrying the base64 checksum computed by a [`ChecksumReader`].
pub struct ChecksumTrailer {
    algorithm: ChecksumAlgorithm,
    hasher: SharedHasher,
}

impl Trailer for ChecksumTrailer {
    fn name(&self) -> &str {
        self.algorithm.header_name()
    }

    fn value(&mut self, _: &[u8]) -> Result<Vec<u8>> {
        let digest = self.hasher.lock().map_err(|_| poisoned())?.digest();
        Ok(base64_encode(&digest).into_bytes())
    }
}
