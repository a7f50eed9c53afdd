use crate::{config::AppConfig, errors::ServiceError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

/// Result of issuing a QR payment request with the external provider.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedPayment {
    /// Provider-side payment request (transaction) id
    pub transaction_id: String,
    /// Provider-side payment method id
    pub payment_method_id: String,
    /// Scannable QR payload
    pub qr_string: String,
}

#[derive(Debug, Deserialize)]
struct PaymentRequestResponse {
    id: String,
    payment_method: PaymentMethodResponse,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodResponse {
    id: String,
    qr_code: Option<QrCodeResponse>,
}

#[derive(Debug, Deserialize)]
struct QrCodeResponse {
    channel_properties: Option<QrChannelProperties>,
}

#[derive(Debug, Deserialize)]
struct QrChannelProperties {
    qr_string: Option<String>,
}

/// HTTP client for the external payment provider's payment-request API.
///
/// All settlement and cryptographic work lives on the provider side; this
/// service only issues QRIS payment requests scoped to an order total and,
/// in test environments, drives the provider's payment simulation.
#[derive(Clone)]
pub struct PaymentService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    currency: String,
}

impl PaymentService {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.payment_api_base.trim_end_matches('/').to_string(),
            api_key: cfg.payment_api_key.clone(),
            currency: cfg.payment_currency.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, ServiceError> {
        self.api_key.as_deref().ok_or_else(|| {
            ServiceError::ExternalServiceError("payment provider is not configured".to_string())
        })
    }

    /// Issues a QRIS payment request for the given amount, tied to an order
    /// via `reference_id`. No retries; provider errors surface as 502.
    #[instrument(skip(self), fields(reference_id = %reference_id, %amount))]
    pub async fn create_qris(
        &self,
        amount: Decimal,
        reference_id: Uuid,
    ) -> Result<IssuedPayment, ServiceError> {
        let key = self.api_key()?;

        let body = json!({
            "currency": self.currency,
            "amount": amount,
            "reference_id": reference_id,
            "payment_method": {
                "type": "QR_CODE",
                "reusability": "ONE_TIME_USE",
                "qr_code": { "channel_code": "QRIS" }
            }
        });

        let response = self
            .client
            .post(format!("{}/payment_requests", self.base_url))
            .basic_auth(key, None::<&str>)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "payment provider returned {}",
                response.status()
            )));
        }

        let payment_request: PaymentRequestResponse = response.json().await?;

        let qr_string = payment_request
            .payment_method
            .qr_code
            .and_then(|qr| qr.channel_properties)
            .and_then(|props| props.qr_string)
            .ok_or_else(|| {
                ServiceError::ExternalServiceError(
                    "payment request is missing the QR payload".to_string(),
                )
            })?;

        info!(
            transaction_id = %payment_request.id,
            "issued QRIS payment request"
        );

        Ok(IssuedPayment {
            transaction_id: payment_request.id,
            payment_method_id: payment_request.payment_method.id,
            qr_string,
        })
    }

    /// Drives the provider's test-mode settlement for a payment method,
    /// which in turn fires the reconciliation webhook.
    #[instrument(skip(self), fields(%payment_method_id, %amount))]
    pub async fn simulate_payment(
        &self,
        payment_method_id: &str,
        amount: Decimal,
    ) -> Result<(), ServiceError> {
        let key = self.api_key()?;

        let response = self
            .client
            .post(format!(
                "{}/payment_methods/{}/payments/simulate",
                self.base_url, payment_method_id
            ))
            .basic_auth(key, None::<&str>)
            .json(&json!({ "amount": amount }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "payment provider returned {}",
                response.status()
            )));
        }

        info!("requested payment simulation");
        Ok(())
    }
}
