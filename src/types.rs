//! Core type definitions for the gateway API.
//!
//! This module contains the order a merchant submits, the enumerations used
//! on the wire, and the typed responses and callbacks the gateway returns.

use crate::errors::{CsobError, Result};
use crate::protocol::{Field, ProtocolVersion};
use crate::signing::FieldSource;
use crate::utils::encode_merchant_data;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Maximum number of cart items the gateway accepts.
pub const MAX_CART_ITEMS: usize = 2;

/// Largest order total, in minor units, this crate will sign.
///
/// Fifteen digits keep the EET `totalPrice` exact when it is sent as a JSON
/// number.
pub const MAX_TOTAL_AMOUNT: u64 = 999_999_999_999_999;

/// Payment currency.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Currency {
    #[default]
    Czk,
    Eur,
    Usd,
    Gbp,
    Huf,
    Pln,
}

impl Currency {
    /// ISO 4217 code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Czk => "CZK",
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Huf => "HUF",
            Self::Pln => "PLN",
        }
    }
}

/// Language of the payment page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Language {
    #[default]
    Cz,
    En,
    De,
    Fr,
    Hu,
    It,
    Ja,
    Pl,
    Pt,
    Ro,
    Ru,
    Sk,
    Es,
    Tr,
    Vi,
}

impl Language {
    /// Code sent in the `language` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cz => "CZ",
            Self::En => "EN",
            Self::De => "DE",
            Self::Fr => "FR",
            Self::Hu => "HU",
            Self::It => "IT",
            Self::Ja => "JA",
            Self::Pl => "PL",
            Self::Pt => "PT",
            Self::Ro => "RO",
            Self::Ru => "RU",
            Self::Sk => "SK",
            Self::Es => "ES",
            Self::Tr => "TR",
            Self::Vi => "VI",
        }
    }
}

/// Kind of payment operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PayOperation {
    /// Regular one-time payment.
    #[default]
    Payment,
    /// Payment that can be repeated later without the customer present.
    OneclickPayment,
}

impl PayOperation {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::OneclickPayment => "oneclickPayment",
        }
    }
}

/// Payment method offered on the payment page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayMethod {
    /// Card payment.
    #[default]
    #[serde(rename = "card")]
    Card,
    /// Card payment with low value payment exemption.
    #[serde(rename = "card#LVP")]
    CardLvp,
}

impl PayMethod {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::CardLvp => "card#LVP",
        }
    }
}

/// HTTP method the gateway uses to send the customer back to the merchant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum ReturnMethod {
    #[default]
    Post,
    Get,
}

impl ReturnMethod {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Get => "GET",
        }
    }
}

impl std::str::FromStr for ReturnMethod {
    type Err = CsobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "GET" => Ok(Self::Get),
            other => Err(CsobError::ConfigError(format!("invalid return method: {}", other))),
        }
    }
}

/// One line of the shopping cart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Item name shown on the payment page (max 20 characters)
    pub name: String,

    /// Quantity, at least 1
    pub quantity: u32,

    /// Line total in minor units
    pub amount: u64,

    /// Optional item description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CartItem {
    /// Creates a cart line without a description.
    pub fn new(name: impl Into<String>, quantity: u32, amount: u64) -> Self {
        Self {
            name: name.into(),
            quantity,
            amount,
            description: None,
        }
    }

    /// Sets the item description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl FieldSource for CartItem {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::ItemName => Some(self.name.clone()),
            Field::ItemQuantity => Some(self.quantity.to_string()),
            Field::ItemAmount => Some(self.amount.to_string()),
            Field::ItemDescription => self.description.clone(),
            _ => None,
        }
    }
}

/// A payment order, built up by the caller and checked when submitted.
///
/// The total amount is always the sum of the cart lines.
///
/// # Examples
///
/// ```
/// use csob_rs::types::{CartItem, Currency, Order};
///
/// let order = Order::new("5547", "Purchase at example.com")
///     .currency(Currency::Czk)
///     .item(CartItem::new("Widget", 1, 200000))
///     .close_payment(true);
///
/// assert_eq!(order.total_amount().unwrap(), 200000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Merchant's order reference, numeric, at most 10 digits
    pub order_no: String,

    /// Description shown to the customer
    pub description: String,

    /// Currency of all amounts
    pub currency: Currency,

    /// Cart lines, one or two
    pub items: Vec<CartItem>,

    /// Settle automatically after authorisation
    pub close_payment: bool,

    /// Payment page language
    pub language: Language,

    /// Operation selector
    pub pay_operation: PayOperation,

    /// Method selector
    pub pay_method: PayMethod,

    /// Opaque merchant data, sent Base64 encoded
    pub merchant_data: Option<Vec<u8>>,

    /// Merchant's customer identifier
    pub customer_id: Option<String>,

    /// Payment page lifetime in seconds (eAPI 1.6+)
    pub ttl_sec: Option<u32>,

    /// Merchant logo version (eAPI 1.6+)
    pub logo_version: Option<u32>,

    /// Colour scheme version (eAPI 1.6+)
    pub color_scheme_version: Option<u32>,
}

impl Order {
    /// Starts a new order with no items.
    pub fn new(order_no: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            order_no: order_no.into(),
            description: description.into(),
            currency: Currency::default(),
            items: Vec::new(),
            close_payment: false,
            language: Language::default(),
            pay_operation: PayOperation::default(),
            pay_method: PayMethod::default(),
            merchant_data: None,
            customer_id: None,
            ttl_sec: None,
            logo_version: None,
            color_scheme_version: None,
        }
    }

    /// Sets the currency.
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Adds a cart line.
    pub fn item(mut self, item: CartItem) -> Self {
        self.items.push(item);
        self
    }

    /// Sets whether the payment is closed (settled) automatically.
    pub fn close_payment(mut self, close: bool) -> Self {
        self.close_payment = close;
        self
    }

    /// Sets the payment page language.
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Sets the operation selector.
    pub fn pay_operation(mut self, operation: PayOperation) -> Self {
        self.pay_operation = operation;
        self
    }

    /// Sets the method selector.
    pub fn pay_method(mut self, method: PayMethod) -> Self {
        self.pay_method = method;
        self
    }

    /// Attaches opaque merchant data, returned unchanged on the return URL.
    pub fn merchant_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.merchant_data = Some(data.into());
        self
    }

    /// Sets the merchant's customer identifier.
    pub fn customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Sets the payment page lifetime in seconds.
    pub fn ttl_sec(mut self, ttl: u32) -> Self {
        self.ttl_sec = Some(ttl);
        self
    }

    /// Sets the logo version shown on the payment page.
    pub fn logo_version(mut self, version: u32) -> Self {
        self.logo_version = Some(version);
        self
    }

    /// Sets the colour scheme version of the payment page.
    pub fn color_scheme_version(mut self, version: u32) -> Self {
        self.color_scheme_version = Some(version);
        self
    }

    /// Sum of all cart line amounts.
    ///
    /// Fails with [`CsobError::ValidationError`] if the sum exceeds
    /// [`MAX_TOTAL_AMOUNT`].
    pub fn total_amount(&self) -> Result<u64> {
        self.items
            .iter()
            .try_fold(0u64, |total, item| total.checked_add(item.amount))
            .filter(|total| *total <= MAX_TOTAL_AMOUNT)
            .ok_or_else(|| {
                CsobError::ValidationError(format!(
                    "order total exceeds {} minor units",
                    MAX_TOTAL_AMOUNT
                ))
            })
    }

    /// Merchant data in its wire (Base64) form.
    pub fn encoded_merchant_data(&self) -> Option<String> {
        self.merchant_data.as_deref().map(encode_merchant_data)
    }

    /// Checks the order against the gateway's limits for `version`.
    pub fn validate(&self, version: ProtocolVersion) -> Result<()> {
        let invalid = |msg: String| Err(CsobError::ValidationError(msg));

        if self.order_no.is_empty()
            || self.order_no.len() > 10
            || !self.order_no.bytes().all(|b| b.is_ascii_digit())
        {
            return invalid(format!(
                "orderNo must be 1 to 10 digits, got '{}'",
                self.order_no
            ));
        }
        if self.items.is_empty() || self.items.len() > MAX_CART_ITEMS {
            return invalid(format!(
                "cart must contain 1 to {} items, got {}",
                MAX_CART_ITEMS,
                self.items.len()
            ));
        }
        for item in &self.items {
            let chars = item.name.chars().count();
            if chars == 0 || chars > 20 {
                return invalid(format!(
                    "cart item name must be 1 to 20 characters: '{}'",
                    item.name
                ));
            }
            if item.quantity == 0 {
                return invalid(format!("cart item '{}' has zero quantity", item.name));
            }
        }
        self.total_amount()?;
        if self.description.chars().count() > 255 {
            return invalid("description is longer than 255 characters".to_string());
        }
        if let Some(data) = self.encoded_merchant_data() {
            if data.len() > 255 {
                return invalid("encoded merchantData is longer than 255 characters".to_string());
            }
        }
        if let Some(customer_id) = &self.customer_id {
            if customer_id.chars().count() > 50 {
                return invalid("customerId is longer than 50 characters".to_string());
            }
        }
        let page_options = [
            ("ttlSec", self.ttl_sec),
            ("logoVersion", self.logo_version),
            ("colorSchemeVersion", self.color_scheme_version),
        ];
        if !version.supports_page_options() {
            if let Some((name, _)) = page_options.iter().find(|(_, v)| v.is_some()) {
                return invalid(format!("{} is not supported by eAPI {}", name, version));
            }
        }
        if let Some(ttl) = self.ttl_sec {
            if !(300..=1800).contains(&ttl) {
                return invalid(format!("ttlSec must be between 300 and 1800, got {}", ttl));
            }
        }
        Ok(())
    }
}

/// Lifecycle state of a payment, as reported in `paymentStatus`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(from = "u8", into = "u8")]
pub enum PaymentStatusCode {
    /// 1: payment created
    Created,
    /// 2: customer is on the payment page
    InProgress,
    /// 3: cancelled by the customer
    Cancelled,
    /// 4: authorised and confirmed
    Confirmed,
    /// 5: reversed before settlement
    Reversed,
    /// 6: rejected
    Rejected,
    /// 7: awaiting settlement
    AwaitingSettlement,
    /// 8: settled
    Settled,
    /// 9: refund in progress
    RefundProcessing,
    /// 10: refunded
    Refunded,
    /// Any code this crate does not know
    Unknown(u8),
}

impl From<u8> for PaymentStatusCode {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Created,
            2 => Self::InProgress,
            3 => Self::Cancelled,
            4 => Self::Confirmed,
            5 => Self::Reversed,
            6 => Self::Rejected,
            7 => Self::AwaitingSettlement,
            8 => Self::Settled,
            9 => Self::RefundProcessing,
            10 => Self::Refunded,
            other => Self::Unknown(other),
        }
    }
}

impl From<PaymentStatusCode> for u8 {
    fn from(status: PaymentStatusCode) -> Self {
        match status {
            PaymentStatusCode::Created => 1,
            PaymentStatusCode::InProgress => 2,
            PaymentStatusCode::Cancelled => 3,
            PaymentStatusCode::Confirmed => 4,
            PaymentStatusCode::Reversed => 5,
            PaymentStatusCode::Rejected => 6,
            PaymentStatusCode::AwaitingSettlement => 7,
            PaymentStatusCode::Settled => 8,
            PaymentStatusCode::RefundProcessing => 9,
            PaymentStatusCode::Refunded => 10,
            PaymentStatusCode::Unknown(code) => code,
        }
    }
}

impl PaymentStatusCode {
    /// Numeric wire code.
    pub fn code(self) -> u8 {
        self.into()
    }

    /// Display label in `language`. Czech for [`Language::Cz`] and
    /// [`Language::Sk`], English otherwise.
    pub fn label(self, language: Language) -> &'static str {
        let czech = matches!(language, Language::Cz | Language::Sk);
        match (self, czech) {
            (Self::Created, false) => "Payment created",
            (Self::Created, true) => "Platba založena",
            (Self::InProgress, false) => "Payment in progress",
            (Self::InProgress, true) => "Platba probíhá",
            (Self::Cancelled, false) => "Payment cancelled",
            (Self::Cancelled, true) => "Platba zrušena",
            (Self::Confirmed, false) => "Payment confirmed",
            (Self::Confirmed, true) => "Platba potvrzena",
            (Self::Reversed, false) => "Payment reversed",
            (Self::Reversed, true) => "Platba odvolána",
            (Self::Rejected, false) => "Payment rejected",
            (Self::Rejected, true) => "Platba zamítnuta",
            (Self::AwaitingSettlement, false) => "Awaiting settlement",
            (Self::AwaitingSettlement, true) => "Čeká na zúčtování",
            (Self::Settled, false) => "Payment settled",
            (Self::Settled, true) => "Platba zúčtována",
            (Self::RefundProcessing, false) => "Refund in progress",
            (Self::RefundProcessing, true) => "Zpracování vrácení",
            (Self::Refunded, false) => "Payment refunded",
            (Self::Refunded, true) => "Platba vrácena",
            (Self::Unknown(_), false) => "Unknown status",
            (Self::Unknown(_), true) => "Neznámý stav",
        }
    }
}

impl fmt::Display for PaymentStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Language::En))
    }
}

/// English label for a raw `paymentStatus` code.
///
/// # Examples
///
/// ```
/// use csob_rs::types::human_readable_status;
///
/// assert_eq!(human_readable_status(4), "Payment confirmed");
/// assert_eq!(human_readable_status(42), "Unknown status");
/// ```
pub fn human_readable_status(code: u8) -> &'static str {
    PaymentStatusCode::from(code).label(Language::En)
}

/// Gateway response to every payment operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    /// Gateway-assigned payment identifier
    pub pay_id: String,

    /// Response timestamp
    pub dttm: String,

    /// 0 on success
    pub result_code: i32,

    /// Human-readable result
    pub result_message: String,

    /// Lifecycle state, absent on some error responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatusCode>,

    /// Card authorisation code, present once authorised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,

    /// Gateway signature over the fields above
    pub signature: String,
}

impl PaymentStatus {
    /// Whether the gateway reported success (`resultCode` 0).
    pub fn is_ok(&self) -> bool {
        self.result_code == 0
    }
}

impl FieldSource for PaymentStatus {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::PayId => Some(self.pay_id.clone()),
            Field::Dttm => Some(self.dttm.clone()),
            Field::ResultCode => Some(self.result_code.to_string()),
            Field::ResultMessage => Some(self.result_message.clone()),
            Field::PaymentStatus => self.payment_status.map(|s| s.code().to_string()),
            Field::AuthCode => self.auth_code.clone(),
            _ => None,
        }
    }
}

/// Gateway response to echo.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EchoResponse {
    /// Response timestamp
    pub dttm: String,

    /// 0 on success
    pub result_code: i32,

    /// Human-readable result
    pub result_message: String,

    /// Gateway signature
    pub signature: String,
}

impl EchoResponse {
    /// Whether the gateway reported success (`resultCode` 0).
    pub fn is_ok(&self) -> bool {
        self.result_code == 0
    }
}

impl FieldSource for EchoResponse {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::Dttm => Some(self.dttm.clone()),
            Field::ResultCode => Some(self.result_code.to_string()),
            Field::ResultMessage => Some(self.result_message.clone()),
            _ => None,
        }
    }
}

/// Parameters the gateway sends to the merchant's return URL after the
/// customer leaves the payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReturn {
    /// Payment identifier
    pub pay_id: String,
    /// Timestamp
    pub dttm: String,
    /// 0 on success
    pub result_code: i32,
    /// Human-readable result
    pub result_message: String,
    /// Lifecycle state
    pub payment_status: Option<PaymentStatusCode>,
    /// Authorisation code
    pub auth_code: Option<String>,
    /// Merchant data from the init request, still Base64 encoded
    pub merchant_data: Option<String>,
    /// Gateway signature
    pub signature: String,
}

impl PaymentReturn {
    /// Parses the URL-encoded query string (GET) or form body (POST) of a
    /// return request.
    pub fn from_query(query: &str) -> Result<Self> {
        let params: HashMap<String, String> = url::form_urlencoded::parse(
            query.trim_start_matches('?').as_bytes(),
        )
        .into_owned()
        .collect();

        let required = |name: &str| {
            params
                .get(name)
                .cloned()
                .ok_or_else(|| CsobError::ValidationError(format!("missing '{}' parameter", name)))
        };
        let numeric = |name: &str, value: String| {
            value.parse::<i32>().map_err(|_| {
                CsobError::ValidationError(format!("'{}' is not a number: {}", name, value))
            })
        };

        let result_code = numeric("resultCode", required("resultCode")?)?;
        let payment_status = match params.get("paymentStatus") {
            Some(raw) => {
                let code = raw.parse::<u8>().map_err(|_| {
                    CsobError::ValidationError(format!("'paymentStatus' is not a number: {}", raw))
                })?;
                Some(PaymentStatusCode::from(code))
            }
            None => None,
        };

        Ok(Self {
            pay_id: required("payId")?,
            dttm: required("dttm")?,
            result_code,
            result_message: required("resultMessage")?,
            payment_status,
            auth_code: params.get("authCode").cloned(),
            merchant_data: params.get("merchantData").cloned(),
            signature: required("signature")?,
        })
    }

    /// Parses the query string of a full return URL.
    pub fn from_url(return_url: &str) -> Result<Self> {
        let url = url::Url::parse(return_url)?;
        Self::from_query(url.query().unwrap_or_default())
    }
}

impl FieldSource for PaymentReturn {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::PayId => Some(self.pay_id.clone()),
            Field::Dttm => Some(self.dttm.clone()),
            Field::ResultCode => Some(self.result_code.to_string()),
            Field::ResultMessage => Some(self.result_message.clone()),
            Field::PaymentStatus => self.payment_status.map(|s| s.code().to_string()),
            Field::AuthCode => self.auth_code.clone(),
            Field::MerchantData => self.merchant_data.clone(),
            _ => None,
        }
    }
}

/// EET (electronic sales records) identity of the merchant's point of sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EetConfig {
    /// Premise identifier registered with the tax authority
    pub premise_id: i64,
    /// Cash register identifier
    pub cash_register_id: String,
}

impl EetConfig {
    /// Creates an EET configuration.
    pub fn new(premise_id: i64, cash_register_id: impl Into<String>) -> Self {
        Self {
            premise_id,
            cash_register_id: cash_register_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_order() -> Order {
        Order::new("554822", "Nákup na vasobchod.cz")
            .item(CartItem::new("Lenovo ThinkPad", 1, 1789600))
            .close_payment(true)
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(human_readable_status(4), "Payment confirmed");
        assert_eq!(human_readable_status(10), "Payment refunded");
        assert_eq!(human_readable_status(0), "Unknown status");
        assert_eq!(human_readable_status(11), "Unknown status");
        assert_eq!(PaymentStatusCode::Confirmed.label(Language::Cz), "Platba potvrzena");
        assert_eq!(PaymentStatusCode::Unknown(99).label(Language::Cz), "Neznámý stav");
        assert_eq!(PaymentStatusCode::Settled.to_string(), "Payment settled");
    }

    #[test]
    fn test_status_code_conversion() {
        for code in 1..=10u8 {
            assert_eq!(PaymentStatusCode::from(code).code(), code);
            assert!(!matches!(PaymentStatusCode::from(code), PaymentStatusCode::Unknown(_)));
        }
        assert_eq!(PaymentStatusCode::from(77), PaymentStatusCode::Unknown(77));
    }

    #[test]
    fn test_payment_status_deserialization() {
        let body = json!({
            "payId": "d165e3c4b624fBD",
            "dttm": "20240101120000",
            "resultCode": 0,
            "resultMessage": "OK",
            "paymentStatus": 1,
            "signature": "c2ln"
        });
        let status: PaymentStatus = serde_json::from_value(body).unwrap();
        assert_eq!(status.pay_id, "d165e3c4b624fBD");
        assert_eq!(status.payment_status, Some(PaymentStatusCode::Created));
        assert_eq!(status.auth_code, None);
        assert!(status.is_ok());

        let back = serde_json::to_value(&status).unwrap();
        assert_eq!(back["paymentStatus"], 1);
        assert!(back.get("authCode").is_none());
    }

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(serde_json::to_value(Currency::Czk).unwrap(), "CZK");
        assert_eq!(serde_json::to_value(Language::En).unwrap(), "EN");
        assert_eq!(serde_json::to_value(PayOperation::Payment).unwrap(), "payment");
        assert_eq!(serde_json::to_value(PayMethod::CardLvp).unwrap(), "card#LVP");
        assert_eq!(serde_json::to_value(ReturnMethod::Post).unwrap(), "POST");
        assert_eq!(Currency::Eur.as_str(), "EUR");
        assert_eq!("get".parse::<ReturnMethod>().unwrap(), ReturnMethod::Get);
    }

    #[test]
    fn test_order_total() {
        let order = valid_order().item(CartItem::new("Poštovné", 1, 9900));
        assert_eq!(order.total_amount().unwrap(), 1799500);
    }

    #[test]
    fn test_order_total_overflow() {
        let overflowing = Order::new("1", "d")
            .item(CartItem::new("a", 1, u64::MAX))
            .item(CartItem::new("b", 1, 1));
        assert!(matches!(
            overflowing.total_amount(),
            Err(CsobError::ValidationError(_))
        ));
        assert!(matches!(
            overflowing.validate(ProtocolVersion::V1_5),
            Err(CsobError::ValidationError(_))
        ));

        let at_limit = Order::new("1", "d").item(CartItem::new("a", 1, MAX_TOTAL_AMOUNT));
        assert_eq!(at_limit.total_amount().unwrap(), MAX_TOTAL_AMOUNT);
        assert!(at_limit.validate(ProtocolVersion::V1_5).is_ok());

        let over_limit = at_limit.item(CartItem::new("b", 1, 1));
        assert!(over_limit.validate(ProtocolVersion::V1_5).is_err());
    }

    #[test]
    fn test_order_validation() {
        assert!(valid_order().validate(ProtocolVersion::V1_5).is_ok());

        let empty = Order::new("1", "empty");
        assert!(matches!(
            empty.validate(ProtocolVersion::V1_5),
            Err(CsobError::ValidationError(_))
        ));

        let three = valid_order()
            .item(CartItem::new("b", 1, 1))
            .item(CartItem::new("c", 1, 1));
        assert!(three.validate(ProtocolVersion::V1_5).is_err());

        let bad_no = Order::new("ABC", "x").item(CartItem::new("a", 1, 1));
        assert!(bad_no.validate(ProtocolVersion::V1_5).is_err());

        let long_no = Order::new("12345678901", "x").item(CartItem::new("a", 1, 1));
        assert!(long_no.validate(ProtocolVersion::V1_5).is_err());

        let zero_qty = Order::new("1", "x").item(CartItem::new("a", 0, 1));
        assert!(zero_qty.validate(ProtocolVersion::V1_5).is_err());

        let long_name = Order::new("1", "x").item(CartItem::new("a".repeat(21), 1, 1));
        assert!(long_name.validate(ProtocolVersion::V1_5).is_err());
    }

    #[test]
    fn test_page_options_need_newer_version() {
        let order = valid_order().ttl_sec(600);
        assert!(order.validate(ProtocolVersion::V1_5).is_err());
        assert!(order.validate(ProtocolVersion::V1_6).is_ok());
        assert!(valid_order().ttl_sec(60).validate(ProtocolVersion::V1_7).is_err());
    }

    #[test]
    fn test_payment_return_from_query() {
        let ret = PaymentReturn::from_query(
            "payId=6baae05fce1edCC&dttm=20170307135300&resultCode=0&resultMessage=OK&paymentStatus=4&signature=ab%2Bc%3D%3D&authCode=858466",
        )
        .unwrap();
        assert_eq!(ret.pay_id, "6baae05fce1edCC");
        assert_eq!(ret.payment_status, Some(PaymentStatusCode::Confirmed));
        assert_eq!(ret.auth_code.as_deref(), Some("858466"));
        assert_eq!(ret.merchant_data, None);
        assert_eq!(ret.signature, "ab+c==");
    }

    #[test]
    fn test_payment_return_missing_field() {
        let err = PaymentReturn::from_query("payId=1&dttm=20170307135300").unwrap_err();
        assert!(matches!(err, CsobError::ValidationError(_)));
    }

    #[test]
    fn test_payment_return_from_url() {
        let ret = PaymentReturn::from_url(
            "http://localhost:8081/paid?payId=P1&dttm=20240101120000&resultCode=0&resultMessage=OK&signature=c2ln",
        )
        .unwrap();
        assert_eq!(ret.pay_id, "P1");
        assert_eq!(ret.payment_status, None);
    }
}
