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

use std::io::Read;
use std::sync::{Arc, Mutex};

use super::{seeded_result, test_scope, SECRET_ACCESS_KEY, SEED_SIGNATURE};
use anyhow::Result;
use pretty_assertions::assert_eq;
use streamsign_aws_v4::{
    aws_chunked_encoder, ChunkSignatureExtension, RollingSigner, SigningKey, TrailerSignature,
};
use streamsign_core::{trailer_fn, ChunkEncoder, Trailer};

const CHUNK_SIGNATURES: [&str; 3] = [
    "b474d8862b1487a5145d686f57f013e54db672cee1c953b3010fb58501ef5aa2",
    "1c1344b170168f8e65b41376b44b20fe354e373826ccbbe2c1d40a8cae51e5c7",
    "2ca2aba2005185cf7159c6277faf83795951dd77a3a99e6e65d5c9f85863f992",
];
const TRAILER_SIGNATURE: &str = "4473a2a8e96dc7a3dd547ee4f63fcfa4c87c15f9078c3d69927873a340c8daa8";

fn expected_output(payload: &[u8]) -> Vec<u8> {
    let mut expected = Vec::new();
    expected.extend_from_slice(
        format!("10000;chunk-signature={}\r\n", CHUNK_SIGNATURES[0]).as_bytes(),
    );
    expected.extend_from_slice(&payload[..65536]);
    expected.extend_from_slice(b"\r\n");
    expected.extend_from_slice(
        format!("400;chunk-signature={}\r\n", CHUNK_SIGNATURES[1]).as_bytes(),
    );
    expected.extend_from_slice(&payload[65536..]);
    expected.extend_from_slice(b"\r\n");
    expected.extend_from_slice(format!("0;chunk-signature={}\r\n", CHUNK_SIGNATURES[2]).as_bytes());
    expected.extend_from_slice(b"x-amz-checksum-crc32c:wdBDMA==\r\n");
    expected.extend_from_slice(
        format!("x-amz-trailer-signature:{TRAILER_SIGNATURE}\r\n\r\n").as_bytes(),
    );
    expected
}

#[test]
fn test_rolling_signature_with_encoder_builder() -> Result<()> {
    let scope = test_scope();
    let key = SigningKey::derive(SECRET_ACCESS_KEY, &scope)?;
    let signer = Arc::new(Mutex::new(RollingSigner::new(key, SEED_SIGNATURE)?));
    let payload = vec![b'a'; 65 * 1024];

    let mut encoder = ChunkEncoder::builder(&payload[..], 65536)
        .extension(ChunkSignatureExtension::new(signer.clone(), scope.clone()))
        .trailer(trailer_fn("x-amz-checksum-crc32c", |_| {
            Ok(b"wdBDMA==".to_vec())
        }))
        .trailer(TrailerSignature::new(signer.clone(), scope))
        .build()?;

    let mut out = Vec::new();
    encoder.read_to_end(&mut out)?;

    assert_eq!(out.len(), 66946);
    assert_eq!(out, expected_output(&payload));
    assert_eq!(signer.lock().unwrap().previous(), TRAILER_SIGNATURE);
    Ok(())
}

#[test]
fn test_rolling_signature_with_aws_chunked_encoder() -> Result<()> {
    let payload = vec![b'a'; 65 * 1024];
    let trailers: Vec<Box<dyn Trailer>> = vec![Box::new(trailer_fn(
        "x-amz-checksum-crc32c",
        |_| Ok(b"wdBDMA==".to_vec()),
    ))];

    let mut encoder =
        aws_chunked_encoder(&seeded_result(SEED_SIGNATURE), &payload[..], 65536, trailers)?;

    // Drain through a small buffer to cross every frame boundary.
    let mut out = Vec::new();
    let mut buf = [0u8; 7];
    loop {
        let n = encoder.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }

    assert_eq!(out, expected_output(&payload));
    assert_eq!(encoder.read(&mut buf)?, 0);
    Ok(())
}

#[test]
fn test_rolling_signature_without_trailers() -> Result<()> {
    let payload = vec![b'a'; 65 * 1024];
    let mut encoder =
        aws_chunked_encoder(&seeded_result(SEED_SIGNATURE), &payload[..], 65536, vec![])?;

    let mut out = String::new();
    encoder.read_to_string(&mut out)?;

    // Chunk signatures don't depend on the trailers.
    for signature in CHUNK_SIGNATURES {
        assert!(out.contains(&format!(";chunk-signature={signature}\r\n")));
    }
    assert!(out.ends_with(&format!(
        "0;chunk-signature={}\r\n\r\n",
        CHUNK_SIGNATURES[2]
    )));
    assert!(!out.contains("x-amz-trailer-signature"));
    Ok(())
}
