//! # csob-rs
//!
//! A Rust client for the ČSOB payment gateway (eAPI 1.5, 1.6 and 1.7).
//!
//! Every request to the gateway carries an RSA signature over a
//! pipe-delimited string of its fields, in an order fixed per operation and
//! protocol version. This crate builds those strings from explicit layout
//! tables, signs them with the merchant key, sends the requests and
//! verifies the gateway's signed responses.
//!
//! ## Features
//!
//! - **Signing**: RSA PKCS#1 v1.5 over SHA-1 (1.5, 1.6) or SHA-256 (1.7)
//! - **Operations**: echo, payment init, status, close, reverse, refund
//! - **Payment page**: signed `payment/process` redirect URLs
//! - **Verification**: response and return-callback signatures checked with the gateway key
//! - **EET**: signed `eetV3` fiscal extension attached to payment init
//! - **Pluggable transport**: `reqwest` by default, any [`transport::Transport`] in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csob_rs::{CartItem, ClientConfig, CsobClient, Environment, Order, ReturnMethod};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("A1029DTmM7", "keys/rsa_A1029DTmM7.key")
//!     .with_environment(Environment::Sandbox)
//!     .with_gateway_key("keys/mips_iplatebnibrana.csob.cz.pub")
//!     .with_return_url(ReturnMethod::Post, "https://shop.example.com/paid");
//!
//! let client = CsobClient::new(config)?;
//! client.echo().await?;
//!
//! let order = Order::new("5547", "Order 5547")
//!     .item(CartItem::new("Shirt", 1, 49900).with_description("Blue, XL"))
//!     .close_payment(true);
//!
//! let payment = client.init_payment(&order).await?;
//! let redirect = client.process_url(&payment)?;
//! println!("send the customer to {}", redirect);
//! # Ok(())
//! # }
//! ```
//!
//! ## Payment Flow
//!
//! 1. **Init**: `payment/init` registers the order and returns a `payId`
//! 2. **Redirect**: the customer is sent to the signed `payment/process` URL
//! 3. **Return**: the gateway redirects back with signed parameters ([`PaymentReturn`])
//! 4. **Follow-up**: status, close, reverse and refund address the payment by `payId`
//!
//! ## Security
//!
//! - Signing values may not contain `|`; such input is rejected rather than sent
//! - Without a gateway key, responses are parsed but not verified and a warning is logged

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod errors;
pub mod keys;
pub mod protocol;
pub mod requests;
pub mod responses;
pub mod signing;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use client::CsobClient;
pub use config::{ClientConfig, Environment};
pub use errors::{CsobError, Result};
pub use keys::{GatewayKey, MerchantKey};
pub use protocol::ProtocolVersion;
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    human_readable_status, CartItem, Currency, EchoResponse, EetConfig, Language, Order,
    PayMethod, PayOperation, PaymentReturn, PaymentStatus, PaymentStatusCode, ReturnMethod,
};
