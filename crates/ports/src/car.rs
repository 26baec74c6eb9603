//! Car service port: query, lock, and unlock cars.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::CarId;
use domain::Car;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::PortError;
use crate::page::Page;

const SERVICE: &str = "car";

/// Outcome of a lock attempt on a car.
///
/// The distinction between `NotFound` and `AlreadyLocked` matters to the
/// saga: the first is a business rejection, the second is the remote
/// concurrency-control signal (another rental holds the car).
#[derive(Debug, Clone)]
pub enum LockOutcome {
    /// No car exists with the requested identifier.
    NotFound,
    /// The car exists but another lock is active.
    AlreadyLocked,
    /// The lock was acquired; carries the now-locked car.
    Locked(Car),
}

/// Capability contract against the car service.
#[async_trait]
pub trait CarPort: Send + Sync {
    /// Fetches a page of cars. Unavailable cars are included only when
    /// `show_all` is set.
    async fn get_cars(
        &self,
        offset: u64,
        limit: u64,
        show_all: bool,
    ) -> Result<Page<Car>, PortError>;

    /// Fetches a single car by identifier.
    async fn get_car(&self, car_uid: CarId) -> Result<Option<Car>, PortError>;

    /// Attempts to acquire the car's single lock. The conditional check
    /// happens remotely; the gateway provides no guarantee of its own.
    async fn lock_car(&self, car_uid: CarId) -> Result<LockOutcome, PortError>;

    /// Releases the car's lock. Idempotent: releasing an unlocked car
    /// still reports `true`; `false` means the car itself is unknown.
    async fn unlock_car(&self, car_uid: CarId) -> Result<bool, PortError>;

    /// Probes the service's health endpoint.
    async fn health_check(&self) -> Result<(), PortError>;
}

/// HTTP client for the car service REST API.
#[derive(Debug, Clone)]
pub struct HttpCarPort {
    base_url: Url,
    client: Client,
}

impl HttpCarPort {
    /// Creates a port against the given base URL, reusing the shared
    /// HTTP client's connection pool.
    pub fn new(base_url: &str, client: Client) -> Result<Self, PortError> {
        Ok(Self {
            base_url: crate::parse_base_url(base_url)?,
            client,
        })
    }

    fn lock_url(&self, car_uid: CarId) -> Result<Url, PortError> {
        Ok(self.base_url.join(&format!("api/v1/cars/{car_uid}/lock"))?)
    }
}

#[async_trait]
impl CarPort for HttpCarPort {
    async fn get_cars(
        &self,
        offset: u64,
        limit: u64,
        show_all: bool,
    ) -> Result<Page<Car>, PortError> {
        let url = self.base_url.join("api/v1/cars")?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("showAll", show_all.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PortError::from_response(SERVICE, response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_car(&self, car_uid: CarId) -> Result<Option<Car>, PortError> {
        let url = self.base_url.join(&format!("api/v1/cars/{car_uid}"))?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(PortError::from_response(SERVICE, response).await),
        }
    }

    async fn lock_car(&self, car_uid: CarId) -> Result<LockOutcome, PortError> {
        let response = self.client.post(self.lock_url(car_uid)?).send().await?;
        tracing::debug!(%car_uid, status = %response.status(), "lock attempt");

        match response.status() {
            StatusCode::NOT_FOUND => Ok(LockOutcome::NotFound),
            StatusCode::LOCKED => Ok(LockOutcome::AlreadyLocked),
            status if status.is_success() => {
                Ok(LockOutcome::Locked(response.json().await?))
            }
            _ => Err(PortError::from_response(SERVICE, response).await),
        }
    }

    async fn unlock_car(&self, car_uid: CarId) -> Result<bool, PortError> {
        let response = self.client.delete(self.lock_url(car_uid)?).send().await?;
        tracing::debug!(%car_uid, status = %response.status(), "unlock attempt");

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
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
struct InMemoryCarState {
    cars: Vec<Car>,
    lookup_delays: HashMap<CarId, Duration>,
    fail_on_lock: bool,
    fail_on_unlock: bool,
    fail_on_get: bool,
    unlock_calls: u32,
}

/// In-memory car port for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCarPort {
    state: Arc<RwLock<InMemoryCarState>>,
}

impl InMemoryCarPort {
    /// Creates an empty in-memory car port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a car.
    pub fn add_car(&self, car: Car) {
        self.state.write().unwrap().cars.push(car);
    }

    /// Configures lock calls to fail with a transport-class error.
    pub fn set_fail_on_lock(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lock = fail;
    }

    /// Configures unlock calls to fail with a transport-class error.
    pub fn set_fail_on_unlock(&self, fail: bool) {
        self.state.write().unwrap().fail_on_unlock = fail;
    }

    /// Configures single-car lookups to fail with a transport-class error.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Delays single-car lookups for the given car.
    pub fn set_lookup_delay(&self, car_uid: CarId, delay: Duration) {
        self.state
            .write()
            .unwrap()
            .lookup_delays
            .insert(car_uid, delay);
    }

    /// Reports the availability flag of a car, if it exists.
    pub fn is_available(&self, car_uid: CarId) -> Option<bool> {
        self.state
            .read()
            .unwrap()
            .cars
            .iter()
            .find(|c| c.car_uid == car_uid)
            .map(|c| c.available)
    }

    /// Number of unlock calls received, including no-op releases.
    pub fn unlock_calls(&self) -> u32 {
        self.state.read().unwrap().unlock_calls
    }
}

#[async_trait]
impl CarPort for InMemoryCarPort {
    async fn get_cars(
        &self,
        offset: u64,
        limit: u64,
        show_all: bool,
    ) -> Result<Page<Car>, PortError> {
        let state = self.state.read().unwrap();
        let visible: Vec<&Car> = state
            .cars
            .iter()
            .filter(|c| show_all || c.available)
            .collect();
        let items = visible
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|c| (*c).clone())
            .collect();
        Ok(Page {
            items,
            total_elements: visible.len() as u64,
        })
    }

    async fn get_car(&self, car_uid: CarId) -> Result<Option<Car>, PortError> {
        let delay = self
            .state
            .read()
            .unwrap()
            .lookup_delays
            .get(&car_uid)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().unwrap();
        if state.fail_on_get {
            return Err(PortError::injected(SERVICE));
        }
        Ok(state.cars.iter().find(|c| c.car_uid == car_uid).cloned())
    }

    async fn lock_car(&self, car_uid: CarId) -> Result<LockOutcome, PortError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_lock {
            return Err(PortError::injected(SERVICE));
        }

        let Some(car) = state.cars.iter_mut().find(|c| c.car_uid == car_uid) else {
            return Ok(LockOutcome::NotFound);
        };
        if !car.available {
            return Ok(LockOutcome::AlreadyLocked);
        }
        car.available = false;
        Ok(LockOutcome::Locked(car.clone()))
    }

    async fn unlock_car(&self, car_uid: CarId) -> Result<bool, PortError> {
        let mut state = self.state.write().unwrap();
        state.unlock_calls += 1;
        if state.fail_on_unlock {
            return Err(PortError::injected(SERVICE));
        }

        match state.cars.iter_mut().find(|c| c.car_uid == car_uid) {
            Some(car) => {
                car.available = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), PortError> {
        Ok(())
    }
}
