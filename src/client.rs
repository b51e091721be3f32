//! Operation façade over the payment gateway.
//!
//! [`CsobClient`] owns the merchant key, the optional gateway key and a
//! [`Transport`]. Each operation stamps a fresh `dttm`, signs the request,
//! sends it and returns the parsed (and, with a gateway key, verified)
//! response.

use crate::config::ClientConfig;
use crate::errors::{CsobError, Result};
use crate::keys::{GatewayKey, MerchantKey};
use crate::protocol::Operation;
use crate::requests::{EchoRequest, EetExtension, InitRequest, PayIdRequest, ReturnTarget};
use crate::responses::{parse_verified, verify_message, SignedMessage};
use crate::signing::Signer;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::types::{EchoResponse, Order, PaymentReturn, PaymentStatus};
use crate::utils::{timestamp, validate_dttm};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Client for the CSOB payment gateway.
///
/// # Examples
///
/// ```no_run
/// use csob_rs::{ClientConfig, CsobClient, CartItem, Order, ReturnMethod};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new("A1029DTmM7", "keys/rsa_A1029DTmM7.key")
///     .with_gateway_key("keys/mips_iplatebnibrana.csob.cz.pub")
///     .with_return_url(ReturnMethod::Post, "https://shop.example.com/paid");
/// let client = CsobClient::new(config)?;
///
/// let order = Order::new("5547", "Order 5547").item(CartItem::new("Shirt", 1, 49900));
/// let status = client.init_payment(&order).await?;
/// println!("redirect to {}", client.process_url(&status)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CsobClient<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    signer: Signer,
    gateway_key: Option<GatewayKey>,
    transport: T,
}

impl CsobClient<ReqwestTransport> {
    /// Loads the keys named by `config` and uses the default HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> CsobClient<T> {
    /// Loads the keys named by `config` and sends requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let merchant_key = MerchantKey::from_file(&config.private_key_path)?;
        let gateway_key = config
            .gateway_key_path
            .as_ref()
            .map(GatewayKey::from_file)
            .transpose()?;
        Ok(Self::from_parts(config, merchant_key, gateway_key, transport))
    }

    /// Builds a client from keys already in memory.
    ///
    /// The key paths in `config` are ignored.
    pub fn from_parts(
        config: ClientConfig,
        merchant_key: MerchantKey,
        gateway_key: Option<GatewayKey>,
        transport: T,
    ) -> Self {
        if gateway_key.is_none() {
            tracing::warn!(
                merchant_id = %config.merchant_id,
                "gateway public key not configured, responses will not be verified"
            );
        }
        let signer = Signer::new(merchant_key, config.protocol_version);
        Self {
            config,
            signer,
            gateway_key,
            transport,
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport requests are sent through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `POST echo`: checks connectivity and the merchant key.
    pub async fn echo(&self) -> Result<EchoResponse> {
        let request = EchoRequest::signed(&self.config.merchant_id, &timestamp(), &self.signer)?;
        let body = serde_json::to_value(&request)?;
        self.dispatch(Operation::Echo, Method::POST, self.url("echo"), Some(body))
            .await
    }

    /// `GET echo/{merchantId}/{dttm}/{signature}`.
    pub async fn echo_via_get(&self) -> Result<EchoResponse> {
        let request = EchoRequest::signed(&self.config.merchant_id, &timestamp(), &self.signer)?;
        self.dispatch(Operation::Echo, Method::GET, self.url(&request.get_path()), None)
            .await
    }

    /// `POST payment/init`: registers `order` and returns the new payment.
    ///
    /// The order is validated before anything is signed. When EET is
    /// configured the signed `eetV3` extension is attached.
    pub async fn init_payment(&self, order: &Order) -> Result<PaymentStatus> {
        if self.config.return_url.is_empty() {
            return Err(CsobError::ConfigError("return URL is not configured".to_string()));
        }
        let target = ReturnTarget {
            url: self.config.return_url.clone(),
            method: self.config.return_method,
        };
        order.validate(self.config.protocol_version)?;
        let dttm = timestamp();

        let extensions = match &self.config.eet {
            Some(eet) => {
                let total = order.total_amount()?;
                vec![EetExtension::signed(eet, total, &dttm, &self.signer)?]
            }
            None => Vec::new(),
        };

        let request = InitRequest::signed(
            &self.config.merchant_id,
            order,
            &dttm,
            &target,
            extensions,
            &self.signer,
        )?;
        tracing::info!(
            order_no = %request.order_no,
            total_amount = request.total_amount,
            currency = request.currency.as_str(),
            "initiating payment"
        );

        self.dispatch(
            Operation::PaymentInit,
            Method::POST,
            self.url("payment/init"),
            Some(serde_json::to_value(&request)?),
        )
        .await
    }

    /// `GET payment/status/...`: current state of payment `pay_id`.
    pub async fn payment_status(&self, pay_id: &str) -> Result<PaymentStatus> {
        let request = self.pay_id_request(Operation::PaymentStatus, pay_id, &timestamp())?;
        let path = request.embedded_path("payment/status");
        self.dispatch(Operation::PaymentStatus, Method::GET, self.url(&path), None)
            .await
    }

    /// `PUT payment/close`: sends an authorised payment to settlement.
    pub async fn close(&self, pay_id: &str) -> Result<PaymentStatus> {
        self.put_pay_id(Operation::PaymentClose, pay_id).await
    }

    /// `PUT payment/reverse`: cancels an authorised, not yet settled payment.
    pub async fn reverse(&self, pay_id: &str) -> Result<PaymentStatus> {
        self.put_pay_id(Operation::PaymentReverse, pay_id).await
    }

    /// `PUT payment/refund`: refunds a settled payment in full.
    pub async fn refund(&self, pay_id: &str) -> Result<PaymentStatus> {
        self.put_pay_id(Operation::PaymentRefund, pay_id).await
    }

    /// Payment page URL the customer's browser is redirected to.
    pub fn process_url(&self, status: &PaymentStatus) -> Result<String> {
        self.process_url_at(&status.pay_id, &timestamp())
    }

    /// [`process_url`](Self::process_url) with a caller-supplied `dttm`.
    pub fn process_url_at(&self, pay_id: &str, dttm: &str) -> Result<String> {
        validate_dttm(dttm)?;
        let request = self.pay_id_request(Operation::PaymentProcess, pay_id, dttm)?;
        Ok(self.url(&request.embedded_path("payment/process")))
    }

    /// Verifies the signed parameters the gateway sent to the return URL.
    ///
    /// Requires a configured gateway key.
    pub fn verify_return(&self, payment_return: &PaymentReturn) -> Result<()> {
        let key = self.gateway_key.as_ref().ok_or_else(|| {
            CsobError::ConfigError("gateway public key is required to verify returns".to_string())
        })?;
        verify_message(payment_return, key, self.config.protocol_version)?;
        tracing::debug!(pay_id = %payment_return.pay_id, "payment return verified");
        Ok(())
    }

    /// Signed EET extension for an order of `total_amount` minor units.
    pub fn eet_extension(&self, total_amount: u64) -> Result<EetExtension> {
        let eet = self
            .config
            .eet
            .as_ref()
            .ok_or_else(|| CsobError::ConfigError("EET is not configured".to_string()))?;
        EetExtension::signed(eet, total_amount, &timestamp(), &self.signer)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url(), path)
    }

    fn pay_id_request(
        &self,
        operation: Operation,
        pay_id: &str,
        dttm: &str,
    ) -> Result<PayIdRequest> {
        if pay_id.is_empty() {
            return Err(CsobError::ValidationError("payId must not be empty".to_string()));
        }
        PayIdRequest::signed(operation, &self.config.merchant_id, pay_id, dttm, &self.signer)
    }

    async fn put_pay_id(&self, operation: Operation, pay_id: &str) -> Result<PaymentStatus> {
        let request = self.pay_id_request(operation, pay_id, &timestamp())?;
        let path = operation.path().ok_or_else(|| {
            CsobError::ValidationError(format!("{:?} has no endpoint", operation))
        })?;
        let body = serde_json::to_value(&request)?;
        self.dispatch(operation, Method::PUT, self.url(path), Some(body))
            .await
    }

    async fn dispatch<R>(
        &self,
        operation: Operation,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<R>
    where
        R: DeserializeOwned + SignedMessage,
    {
        tracing::debug!(?operation, %method, %url, "sending gateway request");
        if self.config.debug {
            if let Some(body) = &body {
                tracing::debug!(?operation, body = %body, "request body");
            }
        }

        let response = self
            .transport
            .execute(HttpRequest { method, url, body })
            .await?;

        if self.config.debug {
            tracing::debug!(
                ?operation,
                status = response.status,
                body = %response.body,
                "response body"
            );
        }
        if response.status != 200 {
            tracing::warn!(
                ?operation,
                status = response.status,
                "gateway returned an error status"
            );
        }

        parse_verified(
            &response,
            self.gateway_key.as_ref(),
            self.config.protocol_version,
        )
    }
}
