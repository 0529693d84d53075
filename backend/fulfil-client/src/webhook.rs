//! Webhook signature checks.
//!
//! Fulfil signs each webhook delivery with HMAC-SHA256 over the raw body,
//! keyed with the webhook secret, and sends the base64 digest in a header.

use crate::error::FulfilError;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use log::debug;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Check a webhook payload against its signature header.
///
/// `secret_b64` is the secret as shown in Fulfil, base64 encoded.
/// Returns `Ok(false)` on a signature mismatch and an error only when the
/// secret itself cannot be decoded.
pub fn verify_webhook(
    data: &[u8],
    secret_b64: &str,
    hmac_header: &str,
) -> Result<bool, FulfilError> {
    let secret = STANDARD.decode(secret_b64.trim()).map_err(|e| {
        FulfilError::validation(format!("Webhook secret is not valid base64: {e}"))
    })?;

    let mut mac = HmacSha256::new_from_slice(&secret)
        .map_err(|e| FulfilError::validation(format!("Unusable webhook secret: {e}")))?;
    mac.update(data);
    let computed = STANDARD.encode(mac.finalize().into_bytes());

    let verified = constant_time_eq(&computed, hmac_header.trim());
    if !verified {
        debug!("Webhook signature mismatch");
    }
    Ok(verified)
}

pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
