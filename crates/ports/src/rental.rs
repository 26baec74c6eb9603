//! Rental service port: owner-scoped queries and lifecycle transitions.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CarId, PaymentId, RentalId};
use domain::{Rental, RentalStatus};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use crate::USER_HEADER;
use crate::error::PortError;
use crate::page::Page;

const SERVICE: &str = "rental";

/// Outcome of an owner-scoped rental lookup.
#[derive(Debug, Clone)]
pub enum RentalAccess {
    /// No rental exists with the requested identifier.
    NotFound,
    /// The rental exists but belongs to another user. The rental data is
    /// deliberately not carried here.
    Forbidden,
    /// The rental exists and the caller owns it.
    Permitted(Rental),
}

/// Properties of a rental to be created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRental {
    pub username: String,
    pub payment_uid: PaymentId,
    pub car_uid: CarId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Capability contract against the rental service.
#[async_trait]
pub trait RentalPort: Send + Sync {
    /// Fetches a page of the caller's rentals.
    async fn get_user_rentals(
        &self,
        username: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Rental>, PortError>;

    /// Fetches one rental, enforcing ownership remotely.
    async fn get_user_rental(
        &self,
        rental_uid: RentalId,
        username: &str,
    ) -> Result<RentalAccess, PortError>;

    /// Creates a rental in its initial [`RentalStatus::InProgress`] state.
    async fn create_rental(&self, new: NewRental) -> Result<Rental, PortError>;

    /// Moves a rental to the given status. Idempotent; `false` means the
    /// identifier is unknown.
    async fn set_rental_status(
        &self,
        rental_uid: RentalId,
        status: RentalStatus,
    ) -> Result<bool, PortError>;

    /// Probes the service's health endpoint.
    async fn health_check(&self) -> Result<(), PortError>;
}

/// HTTP client for the rental service REST API.
#[derive(Debug, Clone)]
pub struct HttpRentalPort {
    base_url: Url,
    client: Client,
}

impl HttpRentalPort {
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
impl RentalPort for HttpRentalPort {
    async fn get_user_rentals(
        &self,
        username: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Rental>, PortError> {
        let url = self.base_url.join("api/v1/rentals")?;
        let response = self
            .client
            .get(url)
            .header(USER_HEADER, username)
            .query(&[("offset", offset.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PortError::from_response(SERVICE, response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_user_rental(
        &self,
        rental_uid: RentalId,
        username: &str,
    ) -> Result<RentalAccess, PortError> {
        let url = self
            .base_url
            .join(&format!("api/v1/rentals/{rental_uid}"))?;
        let response = self
            .client
            .get(url)
            .header(USER_HEADER, username)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(RentalAccess::NotFound),
            StatusCode::FORBIDDEN => Ok(RentalAccess::Forbidden),
            s if s.is_success() => Ok(RentalAccess::Permitted(response.json().await?)),
            _ => Err(PortError::from_response(SERVICE, response).await),
        }
    }

    async fn create_rental(&self, new: NewRental) -> Result<Rental, PortError> {
        let url = self.base_url.join("api/v1/rentals")?;
        let response = self.client.post(url).json(&new).send().await?;

        if !response.status().is_success() {
            return Err(PortError::from_response(SERVICE, response).await);
        }
        Ok(response.json().await?)
    }

    async fn set_rental_status(
        &self,
        rental_uid: RentalId,
        status: RentalStatus,
    ) -> Result<bool, PortError> {
        let url = self
            .base_url
            .join(&format!("api/v1/rentals/{rental_uid}/status"))?;
        let response = self.client.put(url).body(status.as_str()).send().await?;
        tracing::debug!(%rental_uid, %status, code = %response.status(), "status transition");

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
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
struct InMemoryRentalState {
    rentals: Vec<Rental>,
    create_delay: Option<Duration>,
    fail_on_create: bool,
    fail_on_set_status: bool,
}

/// In-memory rental port for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRentalPort {
    state: Arc<RwLock<InMemoryRentalState>>,
}

impl InMemoryRentalPort {
    /// Creates an empty in-memory rental port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing rental.
    pub fn add_rental(&self, rental: Rental) {
        self.state.write().unwrap().rentals.push(rental);
    }

    /// Configures create calls to fail with a transport-class error.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Delays create calls, simulating a slow rental service.
    pub fn set_create_delay(&self, delay: Duration) {
        self.state.write().unwrap().create_delay = Some(delay);
    }

    /// Configures status updates to fail with a transport-class error.
    pub fn set_fail_on_set_status(&self, fail: bool) {
        self.state.write().unwrap().fail_on_set_status = fail;
    }

    /// Returns the number of rentals ever created.
    pub fn rental_count(&self) -> usize {
        self.state.read().unwrap().rentals.len()
    }

    /// Reports the status of a rental, if it exists.
    pub fn status_of(&self, rental_uid: RentalId) -> Option<RentalStatus> {
        self.state
            .read()
            .unwrap()
            .rentals
            .iter()
            .find(|r| r.rental_uid == rental_uid)
            .map(|r| r.status)
    }
}

#[async_trait]
impl RentalPort for InMemoryRentalPort {
    async fn get_user_rentals(
        &self,
        username: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Rental>, PortError> {
        let state = self.state.read().unwrap();
        let owned: Vec<&Rental> = state
            .rentals
            .iter()
            .filter(|r| r.username == username)
            .collect();
        let items = owned
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|r| (*r).clone())
            .collect();
        Ok(Page {
            items,
            total_elements: owned.len() as u64,
        })
    }

    async fn get_user_rental(
        &self,
        rental_uid: RentalId,
        username: &str,
    ) -> Result<RentalAccess, PortError> {
        let state = self.state.read().unwrap();
        match state.rentals.iter().find(|r| r.rental_uid == rental_uid) {
            None => Ok(RentalAccess::NotFound),
            Some(rental) if rental.username != username => Ok(RentalAccess::Forbidden),
            Some(rental) => Ok(RentalAccess::Permitted(rental.clone())),
        }
    }

    async fn create_rental(&self, new: NewRental) -> Result<Rental, PortError> {
        let delay = self.state.read().unwrap().create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(PortError::injected(SERVICE));
        }

        let rental = Rental {
            rental_uid: RentalId::new(),
            username: new.username,
            payment_uid: new.payment_uid,
            car_uid: new.car_uid,
            date_from: new.date_from,
            date_to: new.date_to,
            status: RentalStatus::InProgress,
        };
        state.rentals.push(rental.clone());
        Ok(rental)
    }

    async fn set_rental_status(
        &self,
        rental_uid: RentalId,
        status: RentalStatus,
    ) -> Result<bool, PortError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_set_status {
            return Err(PortError::injected(SERVICE));
        }

        match state.rentals.iter_mut().find(|r| r.rental_uid == rental_uid) {
            Some(rental) => {
                rental.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), PortError> {
        Ok(())
    }
}
