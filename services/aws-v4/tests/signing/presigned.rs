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

use super::{test_credential, test_request, test_signer};
use anyhow::Result;
use pretty_assertions::assert_eq;

#[test]
fn test_sign_presigned() -> Result<()> {
    let result = test_signer(test_credential()).sign_presigned(&test_request(), Duration::ZERO)?;
    let req = &result.request;

    assert_eq!(
        result.signature,
        "691f39caa2064fe4fb897976dfb4b09df54749c825a5fcd1e2f0b3fcd1bcc600"
    );
    assert_eq!(req.query_get("X-Amz-Expires"), Some("0"));
    assert_eq!(
        req.query_get("X-Amz-SignedHeaders"),
        Some("host;x-amz-archive-description")
    );
    assert_eq!(
        req.query_get("X-Amz-Signature"),
        Some(result.signature.as_str())
    );
    assert!(req.headers.get("x-amz-content-sha256").is_none());
    Ok(())
}

#[test]
fn test_sign_presigned_with_session_token() -> Result<()> {
    let result = test_signer(test_credential().with_session_token("token"))
        .sign_presigned(&test_request(), Duration::ZERO)?;
    let req = &result.request;

    // The token is part of the canonical query, so the signature changes.
    assert_eq!(
        result.signature,
        "33f6631784f09568486cebf02d04f155e0c871dbc0b9525272775b0e2515f836"
    );
    assert_eq!(req.query_get("X-Amz-Security-Token"), Some("token"));
    assert_eq!(
        req.query.last(),
        Some(&("X-Amz-Signature".to_string(), result.signature.clone()))
    );
    assert!(req.headers.get("x-amz-security-token").is_none());
    Ok(())
}

#[test]
fn test_sign_presigned_expires_in_seconds() -> Result<()> {
    let result = test_signer(test_credential())
        .sign_presigned(&test_request(), Duration::from_millis(3_600_900))?;

    assert_eq!(result.request.query_get("X-Amz-Expires"), Some("3600"));
    Ok(())
}

#[test]
fn test_sign_presigned_leaves_input_untouched() -> Result<()> {
    let req = test_request();
    test_signer(test_credential()).sign_presigned(&req, Duration::from_secs(60))?;

    assert!(req.query.is_empty());
    assert_eq!(req.header_get("x-amz-content-sha256")?, Some("checksum"));
    Ok(())
}
