//! Protocol versions and the per-operation field-order tables.
//!
//! The gateway verifies every request by rebuilding a pipe-delimited string
//! from the request fields in a fixed order and checking the signature over
//! it. The order, and which optional fields take part, depends on both the
//! operation and the protocol version, so it lives here as explicit tables
//! keyed by ([`Operation`], [`ProtocolVersion`]) instead of in argument order.

use crate::errors::{CsobError, Result};
use std::fmt;
use std::str::FromStr;

/// Version of the gateway eAPI a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVersion {
    /// eAPI 1.5, SHA-1 signatures.
    #[default]
    V1_5,
    /// eAPI 1.6, SHA-1 signatures, adds payment page customisation fields.
    V1_6,
    /// eAPI 1.7, SHA-256 signatures.
    V1_7,
}

impl ProtocolVersion {
    /// All versions this crate can speak, oldest first.
    pub const ALL: [ProtocolVersion; 3] = [Self::V1_5, Self::V1_6, Self::V1_7];

    /// Path segment used in the API base URL (e.g. `v1.5`).
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::V1_5 => "v1.5",
            Self::V1_6 => "v1.6",
            Self::V1_7 => "v1.7",
        }
    }

    /// Digest the signatures of this version are computed over.
    pub fn digest(self) -> DigestAlgorithm {
        match self {
            Self::V1_5 | Self::V1_6 => DigestAlgorithm::Sha1,
            Self::V1_7 => DigestAlgorithm::Sha256,
        }
    }

    /// Whether `ttlSec`, `logoVersion` and `colorSchemeVersion` exist on payment init.
    pub fn supports_page_options(self) -> bool {
        !matches!(self, Self::V1_5)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for ProtocolVersion {
    type Err = CsobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('v') {
            "1.5" => Ok(Self::V1_5),
            "1.6" => Ok(Self::V1_6),
            "1.7" => Ok(Self::V1_7),
            other => Err(CsobError::ConfigError(format!(
                "unsupported protocol version: {}",
                other
            ))),
        }
    }
}

/// Message digest used before RSA signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-1 (eAPI 1.5 and 1.6)
    Sha1,
    /// SHA-256 (eAPI 1.7)
    Sha256,
}

/// Gateway operations, both outbound requests and signed inbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Connectivity and signature check.
    Echo,
    /// Create a new payment.
    PaymentInit,
    /// Query the state of a payment.
    PaymentStatus,
    /// Confirm an authorised payment for settlement.
    PaymentClose,
    /// Cancel an authorised payment before settlement.
    PaymentReverse,
    /// Return the money of a settled payment.
    PaymentRefund,
    /// Browser redirect to the gateway payment page.
    PaymentProcess,
    /// EET fiscal receipt extension attached to payment init.
    EetExtension,
    /// Signed body of an echo response.
    EchoResponse,
    /// Signed body of every payment response.
    PaymentResponse,
    /// Signed parameters the gateway sends to the merchant's return URL.
    PaymentReturn,
}

impl Operation {
    /// Endpoint path below the versioned base URL, `None` for messages
    /// that are only ever received or embedded.
    pub fn path(self) -> Option<&'static str> {
        match self {
            Self::Echo => Some("echo"),
            Self::PaymentInit => Some("payment/init"),
            Self::PaymentStatus => Some("payment/status"),
            Self::PaymentClose => Some("payment/close"),
            Self::PaymentReverse => Some("payment/reverse"),
            Self::PaymentRefund => Some("payment/refund"),
            Self::PaymentProcess => Some("payment/process"),
            Self::EetExtension
            | Self::EchoResponse
            | Self::PaymentResponse
            | Self::PaymentReturn => None,
        }
    }

    /// Field order signed for this operation under `version`.
    pub fn layout(self, version: ProtocolVersion) -> Layout {
        use Field::*;

        const PAY_ID: &[Field] = &[MerchantId, PayId, Dttm];

        match self {
            Self::Echo => Layout::flat(&[MerchantId, Dttm]),
            Self::PaymentInit => {
                let fields: &'static [Field] = if version.supports_page_options() {
                    &[
                        MerchantId, OrderNo, Dttm, PayOperation, PayMethod, TotalAmount,
                        Currency, ClosePayment, ReturnUrl, ReturnMethod, Cart, Description,
                        MerchantData, CustomerId, Language, TtlSec, LogoVersion,
                        ColorSchemeVersion,
                    ]
                } else {
                    &[
                        MerchantId, OrderNo, Dttm, PayOperation, PayMethod, TotalAmount,
                        Currency, ClosePayment, ReturnUrl, ReturnMethod, Cart, Description,
                        MerchantData, CustomerId, Language,
                    ]
                };
                Layout {
                    fields,
                    item_fields: &[ItemName, ItemQuantity, ItemAmount, ItemDescription],
                }
            }
            Self::PaymentStatus
            | Self::PaymentClose
            | Self::PaymentReverse
            | Self::PaymentRefund
            | Self::PaymentProcess => Layout::flat(PAY_ID),
            Self::EetExtension => {
                Layout::flat(&[Extension, Dttm, PremiseId, CashRegisterId, TotalPrice])
            }
            Self::EchoResponse => Layout::flat(&[Dttm, ResultCode, ResultMessage]),
            Self::PaymentResponse => Layout::flat(&[
                PayId, Dttm, ResultCode, ResultMessage, PaymentStatus, AuthCode,
            ]),
            Self::PaymentReturn => Layout::flat(&[
                PayId, Dttm, ResultCode, ResultMessage, PaymentStatus, AuthCode, MerchantData,
            ]),
        }
    }
}

/// A named field that can take part in a signing string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Field {
    MerchantId,
    OrderNo,
    Dttm,
    PayOperation,
    PayMethod,
    TotalAmount,
    Currency,
    ClosePayment,
    ReturnUrl,
    ReturnMethod,
    /// Placeholder expanded into each cart item's `item_fields`.
    Cart,
    Description,
    MerchantData,
    CustomerId,
    Language,
    TtlSec,
    LogoVersion,
    ColorSchemeVersion,
    PayId,
    ItemName,
    ItemQuantity,
    ItemAmount,
    ItemDescription,
    Extension,
    PremiseId,
    CashRegisterId,
    TotalPrice,
    ResultCode,
    ResultMessage,
    PaymentStatus,
    AuthCode,
}

impl Field {
    /// JSON key (or query parameter name) carrying this field on the wire.
    pub fn json_key(self) -> &'static str {
        match self {
            Self::MerchantId => "merchantId",
            Self::OrderNo => "orderNo",
            Self::Dttm => "dttm",
            Self::PayOperation => "payOperation",
            Self::PayMethod => "payMethod",
            Self::TotalAmount => "totalAmount",
            Self::Currency => "currency",
            Self::ClosePayment => "closePayment",
            Self::ReturnUrl => "returnUrl",
            Self::ReturnMethod => "returnMethod",
            Self::Cart => "cart",
            Self::Description | Self::ItemDescription => "description",
            Self::MerchantData => "merchantData",
            Self::CustomerId => "customerId",
            Self::Language => "language",
            Self::TtlSec => "ttlSec",
            Self::LogoVersion => "logoVersion",
            Self::ColorSchemeVersion => "colorSchemeVersion",
            Self::PayId => "payId",
            Self::ItemName => "name",
            Self::ItemQuantity => "quantity",
            Self::ItemAmount => "amount",
            Self::Extension => "extension",
            Self::PremiseId => "premiseId",
            Self::CashRegisterId => "cashRegisterId",
            Self::TotalPrice => "totalPrice",
            Self::ResultCode => "resultCode",
            Self::ResultMessage => "resultMessage",
            Self::PaymentStatus => "paymentStatus",
            Self::AuthCode => "authCode",
        }
    }
}

/// Ordered fields of one signing string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Top-level fields in signing order.
    pub fields: &'static [Field],
    /// Per-item fields substituted for [`Field::Cart`], in signing order.
    pub item_fields: &'static [Field],
}

impl Layout {
    /// A layout without nested items.
    pub const fn flat(fields: &'static [Field]) -> Self {
        Self {
            fields,
            item_fields: &[],
        }
    }
}
