//! # Payment receipt signatures
//!
//! When a customer completes a payment, the gateway hands the client a receipt consisting of the gateway order id,
//! the gateway payment id and a signature. The client forwards the receipt to us, so none of it can be trusted until
//! the signature has been checked.
//!
//! ## Message format
//!
//! ```text
//!    {gateway_order_id}|{gateway_payment_id}
//! ```
//!
//! The signature is the hex-encoded HMAC-SHA256 of the message, keyed with the secret shared between the merchant and
//! the gateway. Hex digits may be upper or lower case.
//!
//! Verification fails closed: a blank secret, a signature that is not hex, or one of the wrong length is simply
//! "not valid". The comparison itself is constant-time ([`Mac::verify_slice`]).
use checkout_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierConfigError {
    #[error("The payment gateway secret has not been configured")]
    MissingSecret,
}

pub fn signature_message(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    format!("{gateway_order_id}|{gateway_payment_id}")
}

/// Produces the signature the gateway would issue for the given receipt, as lowercase hex.
pub fn sign_payment(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(signature_message(gateway_order_id, gateway_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Returns true iff `signature` is the gateway's HMAC of the receipt under `secret`.
pub fn verify_payment(gateway_order_id: &str, gateway_payment_id: &str, signature: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(signature) = hex::decode(signature.trim()) else {
        trace!("🔐️ Payment signature is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signature_message(gateway_order_id, gateway_payment_id).as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Holds the gateway secret. Construction fails if no secret is configured, so "not configured" is reported before
/// any receipt is looked at, and separately from "signature does not match".
#[derive(Debug, Clone)]
pub struct PaymentVerifier {
    secret: Secret<String>,
}

impl PaymentVerifier {
    pub fn new(secret: Secret<String>) -> Result<Self, VerifierConfigError> {
        if secret.is_blank() {
            return Err(VerifierConfigError::MissingSecret);
        }
        Ok(Self { secret })
    }

    pub fn verify(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        verify_payment(gateway_order_id, gateway_payment_id, signature, self.secret.reveal())
    }
}
