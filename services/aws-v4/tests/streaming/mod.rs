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

mod chunked;
mod rolling;

use http::Method;
use streamsign_aws_v4::{
    CredentialScope, SignedHeaders, SigningKey, V4SigningResult,
};
use streamsign_core::time::parse_iso8601;
use streamsign_core::SigningRequest;

pub const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
pub const SEED_SIGNATURE: &str = "106e2a8a18243abcf37539882f36619c00e2dfc72633413f02d3b74544bfeb8e";

pub fn test_scope() -> CredentialScope {
    let _ = env_logger::builder().is_test(true).try_init();

    CredentialScope::new(
        "us-east-1",
        "s3",
        parse_iso8601("20130524T000000Z").expect("time must be valid"),
    )
}

/// A signing result carrying `seed` as its signature.
pub fn seeded_result(seed: &str) -> V4SigningResult {
    let scope = test_scope();
    V4SigningResult {
        request: SigningRequest::from_uri(Method::PUT, "https://s3.amazonaws.com/examplebucket")
            .expect("request must be valid"),
        signature: seed.to_string(),
        signing_key: SigningKey::derive(SECRET_ACCESS_KEY, &scope).expect("key must derive"),
        signed_headers: SignedHeaders::default(),
        scope,
    }
}

/// Strip the chunk framing, returning the payload and every chunk header line.
pub fn decode_chunks(mut encoded: &[u8]) -> (Vec<u8>, Vec<String>) {
    let mut payload = Vec::new();
    let mut headers = Vec::new();
    loop {
        let end = encoded
            .windows(2)
            .position(|w| w == b"\r\n")
            .expect("chunk header must end with CRLF");
        let header = String::from_utf8(encoded[..end].to_vec()).expect("header must be utf8");
        let size = header.split(';').next().expect("size must exist");
        let size = usize::from_str_radix(size, 16).expect("size must be hex");
        headers.push(header);
        encoded = &encoded[end + 2..];
        if size == 0 {
            return (payload, headers);
        }

        payload.extend_from_slice(&encoded[..size]);
        assert_eq!(&encoded[size..size + 2], b"\r\n");
        encoded = &encoded[size + 2..];
    }
}
