//! Signed request bodies and URL paths for every gateway operation.
//!
//! Each request type implements [`FieldSource`] from the same values it
//! serializes, so the signed string and the JSON body cannot drift apart.

use crate::errors::{CsobError, Result};
use crate::protocol::{Field, Operation};
use crate::signing::{FieldSource, Signer};
use crate::types::{
    CartItem, Currency, EetConfig, Language, Order, PayMethod, PayOperation, ReturnMethod,
    MAX_TOTAL_AMOUNT,
};
use crate::utils::{encode_path_segment, format_price};
use serde::{Serialize, Serializer};

/// Name of the EET extension this crate produces.
pub const EET_EXTENSION: &str = "eetV3";

/// Body of `POST echo`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EchoRequest {
    /// Merchant identifier
    pub merchant_id: String,
    /// Request timestamp
    pub dttm: String,
    /// Signature of `merchantId|dttm`
    pub signature: String,
}

impl EchoRequest {
    /// Builds and signs an echo request.
    pub fn signed(merchant_id: &str, dttm: &str, signer: &Signer) -> Result<Self> {
        let mut request = Self {
            merchant_id: merchant_id.to_string(),
            dttm: dttm.to_string(),
            signature: String::new(),
        };
        request.signature =
            signer.sign_fields(&Operation::Echo.layout(signer.version()), &request)?;
        Ok(request)
    }

    /// Path of the GET variant: `echo/{merchantId}/{dttm}/{signature}`.
    pub fn get_path(&self) -> String {
        format!(
            "echo/{}/{}/{}",
            encode_path_segment(&self.merchant_id),
            self.dttm,
            encode_path_segment(&self.signature)
        )
    }
}

impl FieldSource for EchoRequest {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::MerchantId => Some(self.merchant_id.clone()),
            Field::Dttm => Some(self.dttm.clone()),
            _ => None,
        }
    }
}

/// Body of the operations addressing an existing payment
/// (status, close, reverse, refund, process).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PayIdRequest {
    /// Merchant identifier
    pub merchant_id: String,
    /// Payment identifier
    pub pay_id: String,
    /// Request timestamp
    pub dttm: String,
    /// Signature of `merchantId|payId|dttm`
    pub signature: String,
}

impl PayIdRequest {
    /// Builds and signs a request for `operation`.
    pub fn signed(
        operation: Operation,
        merchant_id: &str,
        pay_id: &str,
        dttm: &str,
        signer: &Signer,
    ) -> Result<Self> {
        let mut request = Self {
            merchant_id: merchant_id.to_string(),
            pay_id: pay_id.to_string(),
            dttm: dttm.to_string(),
            signature: String::new(),
        };
        request.signature = signer.sign_fields(&operation.layout(signer.version()), &request)?;
        Ok(request)
    }

    /// URL path with all fields embedded:
    /// `{prefix}/{merchantId}/{payId}/{dttm}/{signature}`.
    pub fn embedded_path(&self, prefix: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            prefix,
            encode_path_segment(&self.merchant_id),
            encode_path_segment(&self.pay_id),
            self.dttm,
            encode_path_segment(&self.signature)
        )
    }
}

impl FieldSource for PayIdRequest {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::MerchantId => Some(self.merchant_id.clone()),
            Field::PayId => Some(self.pay_id.clone()),
            Field::Dttm => Some(self.dttm.clone()),
            _ => None,
        }
    }
}

/// Fiscal data of the EET extension.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EetData {
    /// Premise identifier
    pub premise_id: i64,
    /// Cash register identifier
    pub cash_register_id: String,
    /// Total price in minor units, sent as a decimal number
    #[serde(serialize_with = "serialize_price")]
    pub total_price: u64,
}

/// Exact for totals up to [`MAX_TOTAL_AMOUNT`]; the signed string uses
/// [`format_price`] and never goes through `f64`.
fn serialize_price<S: Serializer>(
    minor_units: &u64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(*minor_units as f64 / 100.0)
}

/// EET extension embedded in payment init.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EetExtension {
    /// Extension name
    pub extension: String,
    /// Extension timestamp
    pub dttm: String,
    /// Fiscal data
    pub data: EetData,
    /// Signature of `extension|dttm|premiseId|cashRegisterId|totalPrice`
    pub signature: String,
}

impl EetExtension {
    /// Builds and signs the extension for an order of `total_amount` minor units.
    pub fn signed(
        eet: &EetConfig,
        total_amount: u64,
        dttm: &str,
        signer: &Signer,
    ) -> Result<Self> {
        if total_amount > MAX_TOTAL_AMOUNT {
            return Err(CsobError::ValidationError(format!(
                "EET totalPrice exceeds {} minor units",
                MAX_TOTAL_AMOUNT
            )));
        }
        let mut extension = Self {
            extension: EET_EXTENSION.to_string(),
            dttm: dttm.to_string(),
            data: EetData {
                premise_id: eet.premise_id,
                cash_register_id: eet.cash_register_id.clone(),
                total_price: total_amount,
            },
            signature: String::new(),
        };
        extension.signature =
            signer.sign_fields(&Operation::EetExtension.layout(signer.version()), &extension)?;
        Ok(extension)
    }
}

impl FieldSource for EetExtension {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::Extension => Some(self.extension.clone()),
            Field::Dttm => Some(self.dttm.clone()),
            Field::PremiseId => Some(self.data.premise_id.to_string()),
            Field::CashRegisterId => Some(self.data.cash_register_id.clone()),
            Field::TotalPrice => Some(format_price(self.data.total_price)),
            _ => None,
        }
    }
}

/// Where the gateway sends the customer after the payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTarget {
    /// Return URL
    pub url: String,
    /// HTTP method used for the return
    pub method: ReturnMethod,
}

/// Body of `POST payment/init`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    /// Merchant identifier
    pub merchant_id: String,
    /// Merchant order number
    pub order_no: String,
    /// Request timestamp
    pub dttm: String,
    /// Operation selector
    pub pay_operation: PayOperation,
    /// Method selector
    pub pay_method: PayMethod,
    /// Sum of cart amounts in minor units
    pub total_amount: u64,
    /// Currency
    pub currency: Currency,
    /// Settle automatically after authorisation
    pub close_payment: bool,
    /// Return URL
    pub return_url: String,
    /// Return method
    pub return_method: ReturnMethod,
    /// Cart lines
    pub cart: Vec<CartItem>,
    /// Order description
    pub description: String,
    /// Base64 merchant data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_data: Option<String>,
    /// Customer identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Payment page language
    pub language: Language,
    /// Payment page lifetime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_sec: Option<u32>,
    /// Logo version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_version: Option<u32>,
    /// Colour scheme version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scheme_version: Option<u32>,
    /// Separately signed extensions (EET)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<EetExtension>,
    /// Signature over the init layout
    pub signature: String,
}

impl InitRequest {
    /// Builds and signs a payment init request for a validated `order`.
    pub fn signed(
        merchant_id: &str,
        order: &Order,
        dttm: &str,
        target: &ReturnTarget,
        extensions: Vec<EetExtension>,
        signer: &Signer,
    ) -> Result<Self> {
        order.validate(signer.version())?;

        let mut request = Self {
            merchant_id: merchant_id.to_string(),
            order_no: order.order_no.clone(),
            dttm: dttm.to_string(),
            pay_operation: order.pay_operation,
            pay_method: order.pay_method,
            total_amount: order.total_amount()?,
            currency: order.currency,
            close_payment: order.close_payment,
            return_url: target.url.clone(),
            return_method: target.method,
            cart: order.items.clone(),
            description: order.description.clone(),
            merchant_data: order.encoded_merchant_data(),
            customer_id: order.customer_id.clone(),
            language: order.language,
            ttl_sec: order.ttl_sec,
            logo_version: order.logo_version,
            color_scheme_version: order.color_scheme_version,
            extensions,
            signature: String::new(),
        };
        request.signature =
            signer.sign_fields(&Operation::PaymentInit.layout(signer.version()), &request)?;
        Ok(request)
    }
}

impl FieldSource for InitRequest {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::MerchantId => Some(self.merchant_id.clone()),
            Field::OrderNo => Some(self.order_no.clone()),
            Field::Dttm => Some(self.dttm.clone()),
            Field::PayOperation => Some(self.pay_operation.as_str().to_string()),
            Field::PayMethod => Some(self.pay_method.as_str().to_string()),
            Field::TotalAmount => Some(self.total_amount.to_string()),
            Field::Currency => Some(self.currency.as_str().to_string()),
            Field::ClosePayment => Some(self.close_payment.to_string()),
            Field::ReturnUrl => Some(self.return_url.clone()),
            Field::ReturnMethod => Some(self.return_method.as_str().to_string()),
            Field::Description => Some(self.description.clone()),
            Field::MerchantData => self.merchant_data.clone(),
            Field::CustomerId => self.customer_id.clone(),
            Field::Language => Some(self.language.as_str().to_string()),
            Field::TtlSec => self.ttl_sec.map(|v| v.to_string()),
            Field::LogoVersion => self.logo_version.map(|v| v.to_string()),
            Field::ColorSchemeVersion => self.color_scheme_version.map(|v| v.to_string()),
            _ => None,
        }
    }

    fn items(&self) -> Vec<&dyn FieldSource> {
        self.cart.iter().map(|item| item as &dyn FieldSource).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MerchantKey;
    use crate::protocol::ProtocolVersion;
    use crate::signing::{verify, SigningString};
    use serde_json::Value;

    const MERCHANT_KEY: &str = include_str!("../tests/fixtures/merchant_test.key");

    fn signer(version: ProtocolVersion) -> Signer {
        let key = MerchantKey::from_pem(MERCHANT_KEY).unwrap();
        Signer::new(key, version)
    }

    /// The two-item order from the gateway's signing walkthrough.
    fn reference_order() -> Order {
        Order::new(
            "554822",
            "Nákup žluťoučký kůň na vasobchod.cz (Lenovo ThinkPad Edge E540, Doprava PPL)",
        )
        .item(
            CartItem::new("žluťoučký kůň", 1, 1789600)
                .with_description("Lenovo ThinkPad Edge E540"),
        )
        .item(CartItem::new("Poštovné", 1, 0).with_description("Doprava PPL"))
        .close_payment(true)
        .merchant_data("some-base64-encoded-merchant-data")
    }

    fn reference_target() -> ReturnTarget {
        ReturnTarget {
            url: "https://vasobchod.cz/return-gateway".to_string(),
            method: ReturnMethod::Post,
        }
    }

    const REFERENCE_STRING: &str = "A1233aBcVn|554822|20151013133307|payment|card|1789600|CZK|true|https://vasobchod.cz/return-gateway|POST|žluťoučký kůň|1|1789600|Lenovo ThinkPad Edge E540|Poštovné|1|0|Doprava PPL|Nákup žluťoučký kůň na vasobchod.cz (Lenovo ThinkPad Edge E540, Doprava PPL)|c29tZS1iYXNlNjQtZW5jb2RlZC1tZXJjaGFudC1kYXRh|CZ";

    fn init(version: ProtocolVersion, order: &Order) -> InitRequest {
        InitRequest::signed(
            "A1233aBcVn",
            order,
            "20151013133307",
            &reference_target(),
            Vec::new(),
            &signer(version),
        )
        .unwrap()
    }

    /// Every field in the layout is in the JSON body iff it is in the
    /// signing string, for the request and each of its cart items.
    fn assert_lockstep(version: ProtocolVersion, request: &InitRequest) {
        let layout = Operation::PaymentInit.layout(version);
        let body = serde_json::to_value(request).unwrap();
        for field in layout.fields.iter().filter(|f| **f != Field::Cart) {
            assert_eq!(
                body.get(field.json_key()).is_some(),
                request.value(*field).is_some(),
                "{:?} out of step in {}",
                field,
                version
            );
        }
        let cart = body["cart"].as_array().unwrap();
        for (json_item, item) in cart.iter().zip(&request.cart) {
            for field in layout.item_fields {
                assert_eq!(json_item.get(field.json_key()).is_some(), item.value(*field).is_some());
            }
        }
        let signed_keys: Vec<&str> = layout.fields.iter().map(|f| f.json_key()).collect();
        for key in body.as_object().unwrap().keys() {
            assert!(
                signed_keys.contains(&key.as_str()) || key == "signature" || key == "extensions",
                "unsigned key {} in body",
                key
            );
        }
    }

    #[test]
    fn test_echo_request() {
        let signer = signer(ProtocolVersion::V1_5);
        let request = EchoRequest::signed("M1", "20240101000000", &signer).unwrap();
        let public = signer.key().public_key();
        let digest = signer.version().digest();
        assert!(verify(&public, digest, "M1|20240101000000", &request.signature).is_ok());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["merchantId"], "M1");
        assert_eq!(body["dttm"], "20240101000000");

        let path = request.get_path();
        assert!(path.starts_with("echo/M1/20240101000000/"));
        assert!(!path["echo/M1/20240101000000/".len()..].contains('/'));
    }

    #[test]
    fn test_init_signing_string_reference() {
        let request = init(ProtocolVersion::V1_5, &reference_order());
        let layout = Operation::PaymentInit.layout(ProtocolVersion::V1_5);
        let canonical = SigningString::from_layout(&layout, &request).build().unwrap();
        assert_eq!(canonical, REFERENCE_STRING);
        assert_eq!(
            request.signature,
            "CWrrR/6qPej2gxTSwSZ7Q2c2M+MmM4iOVohoj9VWPvkH6dlP3rO0LteX/Z8+q600XC6nPWft2g4FKZoaluABAd330h/cniQjZw2VqYYdxcfJILqWundXVKBvCH9vPETxM4h8FR8htOJZPHTiU+m3wwEPsXZi5ZdYYPj+pBPnkZ4wvwWwOdTvBU7S9Pr56w0NWAj3iByXajtOmBZ6T7tT3SLRceIRC4J37ygyfdRnb3qHn4YY7ipQQPdYMadtPnr6jSz21VFDMIDfYm36Xx4XwxmVePrjjw6HXUb8snvOQEk52XMPXvKRbySBU32dDArGGnKSAcdOSsMxPbQ5cs5/kQ=="
        );
    }

    #[test]
    fn test_init_signature_v1_7_uses_sha256() {
        let request = init(ProtocolVersion::V1_7, &reference_order());
        assert_eq!(
            request.signature,
            "uZd+Qt4vRgxbrVw2AAABdvtqNGNlTlKOnaFQPiSuwv76t3+4+hj5dmfejkBh07DHhchxj+VJ+RJwGWS/WRZPAv20CZjA5dDPVcTZs77xeaqZP1GxLmqTQY9XOi6hVz0yN8I3vLo9crunNQWKxe2nHzlbdyixCgJRuF5+RBMhJw7egx3fEJPYZqKZYOiI82kolXSKCYqpC0IBIoyZR55YUeAC+Fao353yY+xSLUKk38ogysHPqOa+d5vW+mSd+i8ajJr9P5XkcerSGCKH/f7UgmO0Wg5F6/JAAJkKosp1Lt7+pbSYIWqr4QMqP4UvzX6WEG5Oba3aOUHva/KvtjuRog=="
        );
    }

    #[test]
    fn test_init_optional_fields_v1_6() {
        let order = Order::new("1", "desc")
            .item(CartItem::new("a", 1, 100))
            .customer_id("cust-1")
            .ttl_sec(600)
            .color_scheme_version(2)
            .language(Language::En);
        let request = init(ProtocolVersion::V1_6, &order);
        let layout = Operation::PaymentInit.layout(ProtocolVersion::V1_6);
        let canonical = SigningString::from_layout(&layout, &request).build().unwrap();
        assert_eq!(
            canonical,
            "A1233aBcVn|1|20151013133307|payment|card|100|CZK|false|https://vasobchod.cz/return-gateway|POST|a|1|100|desc|cust-1|EN|600|2"
        );
    }

    #[test]
    fn test_init_body_and_signing_string_in_lockstep() {
        let minimal = Order::new("1", "desc").item(CartItem::new("a", 1, 100));
        let full = reference_order()
            .customer_id("c")
            .ttl_sec(900)
            .logo_version(1)
            .color_scheme_version(1);

        assert_lockstep(ProtocolVersion::V1_5, &init(ProtocolVersion::V1_5, &minimal));
        assert_lockstep(ProtocolVersion::V1_5, &init(ProtocolVersion::V1_5, &reference_order()));
        for version in [ProtocolVersion::V1_6, ProtocolVersion::V1_7] {
            assert_lockstep(version, &init(version, &minimal));
            assert_lockstep(version, &init(version, &full));
        }
    }

    #[test]
    fn test_init_json_types() {
        let request = init(ProtocolVersion::V1_5, &reference_order());
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["totalAmount"], 1789600);
        assert_eq!(body["closePayment"], Value::Bool(true));
        assert_eq!(body["currency"], "CZK");
        assert_eq!(body["payOperation"], "payment");
        assert_eq!(body["cart"][1]["amount"], 0);
        assert!(body.get("customerId").is_none());
        assert!(body.get("extensions").is_none());
    }

    #[test]
    fn test_init_rejects_invalid_order() {
        let order = Order::new("1", "no items");
        let result = InitRequest::signed(
            "M1",
            &order,
            "20240101000000",
            &reference_target(),
            Vec::new(),
            &signer(ProtocolVersion::V1_5),
        );
        assert!(matches!(result, Err(crate::CsobError::ValidationError(_))));
    }

    #[test]
    fn test_init_rejects_delimiter_in_description() {
        let order = Order::new("1", "a|b").item(CartItem::new("a", 1, 1));
        let result = InitRequest::signed(
            "M1",
            &order,
            "20240101000000",
            &reference_target(),
            Vec::new(),
            &signer(ProtocolVersion::V1_5),
        );
        assert!(matches!(result, Err(crate::CsobError::ValidationError(_))));
    }

    #[test]
    fn test_pay_id_request() {
        let signer = signer(ProtocolVersion::V1_5);
        let request =
            PayIdRequest::signed(Operation::PaymentClose, "M1", "P1", "20240101000000", &signer)
                .unwrap();
        assert!(verify(
            &signer.key().public_key(),
            signer.version().digest(),
            "M1|P1|20240101000000",
            &request.signature
        )
        .is_ok());

        let body = serde_json::to_value(&request).unwrap();
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(body["payId"], "P1");
    }

    #[test]
    fn test_embedded_path_escapes_signature() {
        let request = PayIdRequest {
            merchant_id: "M1".to_string(),
            pay_id: "P1".to_string(),
            dttm: "20240101000000".to_string(),
            signature: "ab+c/d==".to_string(),
        };
        assert_eq!(
            request.embedded_path("payment/status"),
            "payment/status/M1/P1/20240101000000/ab%2Bc%2Fd%3D%3D"
        );
    }

    #[test]
    fn test_eet_extension() {
        let signer = signer(ProtocolVersion::V1_5);
        let eet = EetConfig::new(123, "cashRegister");
        let extension = EetExtension::signed(&eet, 200000, "20240101120000", &signer).unwrap();

        let layout = Operation::EetExtension.layout(ProtocolVersion::V1_5);
        let canonical = SigningString::from_layout(&layout, &extension).build().unwrap();
        assert_eq!(canonical, "eetV3|20240101120000|123|cashRegister|2000.00");
        assert_eq!(
            extension.signature,
            "ogU4oO3kUJVL3bngwW9IEPcef5bBX8g2zvTpdSfHMZG3m7kEUoB7uYMwCFPltydY9JGI2Ehqd9q/ykzsG5FODGgaqb652QpWQ1K6FAl15J20IvirlfUGm2bAIWxJTHNWeFaxNVFNFOb1CEP9rwk7kyUy+mOLtyRpfbD2M/932LGc6j85N0BiVY58YmgaPdSNKTqM8Z0gTh+tEQ34F987AgJQFOqFqQaVgS/h128e4fkCGgOKhjHb8KoFTRWm6sKn/fukxHrvMSvsu+rJVQN/zsjavIRJVv6hH/BaF89jJOxJLhlOPvY50ozE9MITUgnbLfaxEXrXysJkw2ld7tjtVg=="
        );

        let body = serde_json::to_value(&extension).unwrap();
        assert_eq!(body["extension"], "eetV3");
        assert_eq!(body["data"]["premiseId"], 123);
        assert_eq!(body["data"]["totalPrice"], 2000.0);
    }

    #[test]
    fn test_eet_price_bounds() {
        let signer = signer(ProtocolVersion::V1_5);
        let eet = EetConfig::new(1, "pos");

        let max = EetExtension::signed(&eet, MAX_TOTAL_AMOUNT, "20240101120000", &signer).unwrap();
        let body = serde_json::to_string(&max).unwrap();
        assert!(body.contains("\"totalPrice\":9999999999999.99"));
        assert_eq!(max.value(Field::TotalPrice).unwrap(), "9999999999999.99");

        let result = EetExtension::signed(&eet, MAX_TOTAL_AMOUNT + 1, "20240101120000", &signer);
        assert!(matches!(result, Err(CsobError::ValidationError(_))));
    }

    #[test]
    fn test_init_with_extension_body() {
        let signer = signer(ProtocolVersion::V1_6);
        let order = Order::new("7", "eet").item(CartItem::new("a", 1, 12345));
        let eet = EetConfig::new(1, "pos");
        let total = order.total_amount().unwrap();
        let extension = EetExtension::signed(&eet, total, "20240101120000", &signer).unwrap();
        let request = InitRequest::signed(
            "M1",
            &order,
            "20240101120000",
            &reference_target(),
            vec![extension],
            &signer,
        )
        .unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["extensions"][0]["data"]["totalPrice"], 123.45);
        assert_lockstep(ProtocolVersion::V1_6, &request);
    }
}
