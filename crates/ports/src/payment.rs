//! Payment service port: create payments and move their status.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::PaymentId;
use domain::{Payment, PaymentStatus};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::PortError;

const SERVICE: &str = "payment";

/// Capability contract against the payment service.
#[async_trait]
pub trait PaymentPort: Send + Sync {
    /// Creates a payment for the given price. Payments are synchronous:
    /// an accepted payment lands directly in [`PaymentStatus::Paid`].
    async fn create_payment(&self, price: u64) -> Result<Payment, PortError>;

    /// Moves a payment to the given status. Idempotent; `false` means
    /// the identifier is unknown (nothing to update), which is distinct
    /// from a transport error.
    async fn set_payment_status(
        &self,
        payment_uid: PaymentId,
        status: PaymentStatus,
    ) -> Result<bool, PortError>;

    /// Fetches a payment by identifier.
    async fn get_payment(
        &self,
        payment_uid: PaymentId,
    ) -> Result<Option<Payment>, PortError>;

    /// Probes the service's health endpoint.
    async fn health_check(&self) -> Result<(), PortError>;
}

/// HTTP client for the payment service REST API.
#[derive(Debug, Clone)]
pub struct HttpPaymentPort {
    base_url: Url,
    client: Client,
}

impl HttpPaymentPort {
    /// Creates a port against the given base URL, reusing the shared
    /// HTTP client's connection pool.
    pub fn new(base_url: &str, client: Client) -> Result<Self, PortError> {
        Ok(Self {
            base_url: crate::parse_base_url(base_url)?,
            client,
        })
    }
}

#[async_trait]
impl PaymentPort for HttpPaymentPort {
    async fn create_payment(&self, price: u64) -> Result<Payment, PortError> {
        let url = self.base_url.join("api/v1/payments")?;
        let response = self
            .client
            .post(url)
            .query(&[("price", price.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PortError::from_response(SERVICE, response).await);
        }
        Ok(response.json().await?)
    }

    async fn set_payment_status(
        &self,
        payment_uid: PaymentId,
        status: PaymentStatus,
    ) -> Result<bool, PortError> {
        let url = self
            .base_url
            .join(&format!("api/v1/payments/{payment_uid}/status"))?;
        let response = self.client.put(url).body(status.as_str()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            _ => Err(PortError::from_response(SERVICE, response).await),
        }
    }

    async fn get_payment(
        &self,
        payment_uid: PaymentId,
    ) -> Result<Option<Payment>, PortError> {
        let url = self
            .base_url
            .join(&format!("api/v1/payments/{payment_uid}"))?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json().await?)),
            _ => Err(PortError::from_response(SERVICE, response).await),
        }
    }

    async fn health_check(&self) -> Result<(), PortError> {
        let url = self.base_url.join("manage/health")?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PortError::from_response(SERVICE, response).await);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: HashMap<PaymentId, Payment>,
    fail_on_create: bool,
    fail_on_set_status: bool,
}

/// In-memory payment port for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentPort {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentPort {
    /// Creates an empty in-memory payment port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures create calls to fail with a transport-class error.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures status updates to fail with a transport-class error.
    pub fn set_fail_on_set_status(&self, fail: bool) {
        self.state.write().unwrap().fail_on_set_status = fail;
    }

    /// Returns the number of payments ever created.
    pub fn payment_count(&self) -> usize {
        self.state.read().unwrap().payments.len()
    }

    /// Statuses of every payment ever created, in no particular order.
    pub fn statuses(&self) -> Vec<PaymentStatus> {
        self.state
            .read()
            .unwrap()
            .payments
            .values()
            .map(|p| p.status)
            .collect()
    }

    /// Reports the status of a payment, if it exists.
    pub fn status_of(&self, payment_uid: PaymentId) -> Option<PaymentStatus> {
        self.state
            .read()
            .unwrap()
            .payments
            .get(&payment_uid)
            .map(|p| p.status)
    }
}

#[async_trait]
impl PaymentPort for InMemoryPaymentPort {
    async fn create_payment(&self, price: u64) -> Result<Payment, PortError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(PortError::injected(SERVICE));
        }

        let payment = Payment {
            payment_uid: PaymentId::new(),
            status: PaymentStatus::Paid,
            price,
        };
        state.payments.insert(payment.payment_uid, payment.clone());
        Ok(payment)
    }

    async fn set_payment_status(
        &self,
        payment_uid: PaymentId,
        status: PaymentStatus,
    ) -> Result<bool, PortError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_set_status {
            return Err(PortError::injected(SERVICE));
        }

        match state.payments.get_mut(&payment_uid) {
            Some(payment) => {
                payment.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_payment(
        &self,
        payment_uid: PaymentId,
    ) -> Result<Option<Payment>, PortError> {
        Ok(self.state.read().unwrap().payments.get(&payment_uid).cloned())
    }

    async fn health_check(&self) -> Result<(), PortError> {
        Ok(())
    }
}
