//! Response parsing and verification.
//!
//! A response is accepted only with HTTP 200, a body that decodes into the
//! expected type and, when the gateway key is known, a valid signature.

use crate::errors::{CsobError, Result};
use crate::keys::GatewayKey;
use crate::protocol::{Operation, ProtocolVersion};
use crate::signing::{verify_fields, FieldSource};
use crate::transport::HttpResponse;
use crate::types::{EchoResponse, PaymentReturn, PaymentStatus};
use serde::de::DeserializeOwned;

/// A gateway message that carries its own signature.
pub trait SignedMessage: FieldSource {
    /// Operation whose layout the signature covers.
    const OPERATION: Operation;

    /// The Base64 signature.
    fn signature(&self) -> &str;
}

impl SignedMessage for PaymentStatus {
    const OPERATION: Operation = Operation::PaymentResponse;

    fn signature(&self) -> &str {
        &self.signature
    }
}

impl SignedMessage for EchoResponse {
    const OPERATION: Operation = Operation::EchoResponse;

    fn signature(&self) -> &str {
        &self.signature
    }
}

impl SignedMessage for PaymentReturn {
    const OPERATION: Operation = Operation::PaymentReturn;

    fn signature(&self) -> &str {
        &self.signature
    }
}

/// Requires status 200 and decodes the JSON body into `T`.
pub fn parse_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    if response.status != 200 {
        return Err(CsobError::GatewayError {
            status_code: response.status,
            body: response.body.clone(),
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// Verifies the signature of `message` with the gateway key.
pub fn verify_message<M: SignedMessage>(
    message: &M,
    key: &GatewayKey,
    version: ProtocolVersion,
) -> Result<()> {
    verify_fields(
        key,
        version.digest(),
        &M::OPERATION.layout(version),
        message,
        message.signature(),
    )
}

/// Parses `response` and, if a gateway key is given, verifies it.
pub fn parse_verified<T: DeserializeOwned + SignedMessage>(
    response: &HttpResponse,
    key: Option<&GatewayKey>,
    version: ProtocolVersion,
) -> Result<T> {
    let message: T = parse_response(response)?;
    match key {
        Some(key) => verify_message(&message, key, version)?,
        None => tracing::warn!("no gateway key configured, response signature not verified"),
    }
    Ok(message)
}
