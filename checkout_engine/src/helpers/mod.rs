mod payment_signature;

pub use payment_signature::{sign_payment, signature_message, verify_payment, PaymentVerifier, VerifierConfigError};
