//! Example gateway client.
//!
//! Checks connectivity, registers a one-item order and prints the payment
//! page URL the customer would be redirected to.
//!
//! Run with:
//! ```bash
//! cargo run --example client
//! ```
//!
//! Environment variables (a `.env` file is read if present):
//! - CSOB_MERCHANT_ID: merchant identifier
//! - CSOB_PRIVATE_KEY_PATH: merchant private key (PEM)
//! - CSOB_GATEWAY_KEY_PATH: gateway public key (PEM), enables response verification
//! - CSOB_RETURN_URL: where the customer returns after paying
//! - CSOB_ENVIRONMENT, CSOB_PROTOCOL_VERSION, CSOB_RETURN_METHOD, CSOB_DEBUG: optional

use csob_rs::{CartItem, ClientConfig, CsobClient, Order};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    println!("Gateway: {}", config.base_url());
    println!("Merchant: {}", config.merchant_id);
    println!();

    let client = CsobClient::new(config)?;

    let echo = client.echo().await?;
    println!("Echo: {} ({})", echo.result_message, echo.result_code);

    let order_no = chrono::Local::now().format("%H%M%S").to_string();
    let order = Order::new(&order_no, format!("Test order {}", order_no))
        .item(CartItem::new("Test item", 1, 10000).with_description("Demo purchase"))
        .close_payment(true);

    let payment = client.init_payment(&order).await?;
    if !payment.is_ok() {
        anyhow::bail!(
            "payment init failed: {} ({})",
            payment.result_message,
            payment.result_code
        );
    }

    println!("Payment {} created", payment.pay_id);
    if let Some(status) = payment.payment_status {
        println!("Status: {}", status);
    }
    println!("Redirect the customer to:\n{}", client.process_url(&payment)?);

    let status = client.payment_status(&payment.pay_id).await?;
    println!(
        "Current status: {}",
        status
            .payment_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );

    Ok(())
}
