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

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Headers used in aws services.
pub const X_AMZ_CONTENT_SHA_256: &str = "x-amz-content-sha256";
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
pub const X_AMZ_DECODED_CONTENT_LENGTH: &str = "x-amz-decoded-content-length";
pub const X_AMZ_TRAILER: &str = "x-amz-trailer";
pub const X_AMZ_TRAILER_SIGNATURE: &str = "x-amz-trailer-signature";
pub const X_AMZ_CHECKSUM_CRC32: &str = "x-amz-checksum-crc32";
pub const X_AMZ_CHECKSUM_CRC32C: &str = "x-amz-checksum-crc32c";
pub const X_AMZ_CHECKSUM_SHA256: &str = "x-amz-checksum-sha256";
pub const X_AMZ_CHECKSUM_SHA1: &str = "x-amz-checksum-sha1";

// Query parameters used in query and presigned signing.
pub const X_AMZ_ALGORITHM_QUERY: &str = "X-Amz-Algorithm";
pub const X_AMZ_CREDENTIAL_QUERY: &str = "X-Amz-Credential";
pub const X_AMZ_DATE_QUERY: &str = "X-Amz-Date";
pub const X_AMZ_EXPIRES_QUERY: &str = "X-Amz-Expires";
pub const X_AMZ_SECURITY_TOKEN_QUERY: &str = "X-Amz-Security-Token";
pub const X_AMZ_SIGNATURE_QUERY: &str = "X-Amz-Signature";
pub const X_AMZ_SIGNED_HEADERS_QUERY: &str = "X-Amz-SignedHeaders";

// Chunk extension carrying the rolling signature.
pub const CHUNK_SIGNATURE: &str = "chunk-signature";

// Algorithm tags.
pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";
pub const AWS4_HMAC_SHA256_PAYLOAD: &str = "AWS4-HMAC-SHA256-PAYLOAD";
pub const AWS4_HMAC_SHA256_TRAILER: &str = "AWS4-HMAC-SHA256-TRAILER";
pub const AWS4_REQUEST: &str = "aws4_request";

// Payload hash tokens.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
pub const STREAMING_SIGNED_PAYLOAD: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";
pub const STREAMING_SIGNED_PAYLOAD_TRAILER: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD-TRAILER";
pub const STREAMING_UNSIGNED_PAYLOAD_TRAILER: &str = "STREAMING-UNSIGNED-PAYLOAD-TRAILER";

pub const AWS_CHUNKED: &str = "aws-chunked";

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html)
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - `/` is kept so a whole path can be encoded segment by segment.
pub static AWS_URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
