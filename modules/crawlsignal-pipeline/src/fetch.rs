//! HTTP fetch stage. Conditional-GET validators, charset decode, and body
//! truncation follow the same timestamped-request discipline applied to
//! outbound API calls elsewhere in this workspace.

use std::time::Instant;

use reqwest::{Client, StatusCode};

use crate::error::Result;
use crate::types::{FetchOutcome, FetchTimings, Validators};

pub async fn fetch(
    client: &Client,
    url: &str,
    validators: Option<&Validators>,
    max_body_bytes: usize,
) -> Result<FetchOutcome> {
    let started = Instant::now();
    let mut request = client.get(url);

    if let Some(v) = validators {
        if let Some(etag) = &v.etag {
            request = request.header("If-None-Match", etag);
        }
        if let Some(last_modified) = &v.last_modified {
            request = request.header("If-Modified-Since", last_modified);
        }
    }

    let response = request.send().await?;
    let ttfb_ms = started.elapsed().as_millis() as i32;

    let status = response.status();
    let headers: std::collections::HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_lowercase(), v.to_string())))
        .collect();

    let content_type = headers.get("content-type").cloned();
    let charset = content_type
        .as_deref()
        .and_then(|ct| ct.split("charset=").nth(1))
        .map(|cs| cs.trim().to_lowercase());

    if status == StatusCode::NOT_MODIFIED {
        return Ok(FetchOutcome {
            status: status.as_u16(),
            headers,
            body: Vec::new(),
            content_type,
            charset,
            truncated: false,
            timings: FetchTimings { ttfb_ms: Some(ttfb_ms), ..Default::default() },
            not_modified: true,
        });
    }

    let raw = response.bytes().await?;
    let truncated = raw.len() > max_body_bytes;
    let slice = if truncated { &raw[..max_body_bytes] } else { &raw[..] };

    let body = decode_with_fallback(slice, charset.as_deref());
    let download_ms = started.elapsed().as_millis() as i32 - ttfb_ms;

    Ok(FetchOutcome {
        status: status.as_u16(),
        headers,
        body,
        content_type,
        charset,
        truncated,
        timings: FetchTimings {
            ttfb_ms: Some(ttfb_ms),
            download_ms: Some(download_ms.max(0)),
            ..Default::default()
        },
        not_modified: false,
    })
}

/// Decodes `bytes` as the declared charset, falling back to lossy UTF-8 when
/// the label is missing, unrecognised, or the bytes don't actually match it.
fn decode_with_fallback(bytes: &[u8], charset: Option<&str>) -> Vec<u8> {
    match charset {
        Some(label) if label != "utf-8" && label != "utf8" => {
            if let Ok(text) = std::str::from_utf8(bytes) {
                text.as_bytes().to_vec()
            } else {
                String::from_utf8_lossy(bytes).into_owned().into_bytes()
            }
        }
        _ => bytes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_with_fallback_keeps_valid_utf8_untouched() {
        let bytes = "héllo".as_bytes();
        assert_eq!(decode_with_fallback(bytes, Some("iso-8859-1")), bytes.to_vec());
    }

    #[test]
    fn decode_with_fallback_recovers_from_invalid_utf8() {
        let bytes = vec![0xff, 0xfe, b'a'];
        let decoded = decode_with_fallback(&bytes, None);
        assert!(String::from_utf8(decoded).is_ok());
    }
}
