//! Saga error taxonomy.
//!
//! Three classes: business rejections (no compensation needed, nothing
//! was committed), remote failures (forward steps were compensated),
//! and inconsistencies (a compensation itself failed and backend state
//! needs external repair).

use chrono::NaiveDate;
use common::{CarId, PaymentId, RentalId};
use domain::RentalStatus;
use ports::PortError;
use serde::Serialize;
use thiserror::Error;

/// Entities a failed compensation left behind.
///
/// Carried by [`SagaError::Inconsistent`] so the caller-visible error
/// names every orphan for manual or asynchronous reconciliation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrphanReport {
    /// Car left locked with no valid rental.
    pub car_uid: Option<CarId>,
    /// Payment left in the paid state with no valid rental.
    pub payment_uid: Option<PaymentId>,
    /// Rental record left behind in a non-terminal state.
    pub rental_uid: Option<RentalId>,
    /// The failure that triggered the unwind.
    pub detail: String,
}

impl OrphanReport {
    /// True when every compensation succeeded.
    pub fn is_empty(&self) -> bool {
        self.car_uid.is_none() && self.payment_uid.is_none() && self.rental_uid.is_none()
    }
}

impl std::fmt::Display for OrphanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "orphaned entities:")?;
        if let Some(id) = self.car_uid {
            write!(f, " car={id}")?;
        }
        if let Some(id) = self.payment_uid {
            write!(f, " payment={id}")?;
        }
        if let Some(id) = self.rental_uid {
            write!(f, " rental={id}")?;
        }
        write!(f, " (cause: {})", self.detail)
    }
}

/// An idempotent cleanup step a cancel or finish saga could not run.
///
/// Unlike an orphan, re-invoking the saga retries these safely: the
/// target states are idempotent terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CleanupStep {
    CancelPayment(PaymentId),
    UnlockCar(CarId),
}

impl std::fmt::Display for CleanupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupStep::CancelPayment(id) => write!(f, "cancel payment {id}"),
            CleanupStep::UnlockCar(id) => write!(f, "unlock car {id}"),
        }
    }
}

fn list_steps(steps: &[CleanupStep]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by the rental orchestrator.
#[derive(Debug, Error)]
pub enum SagaError {
    /// No car exists with the requested identifier.
    #[error("car {0} not found")]
    CarNotFound(CarId),

    /// The car is locked by another rental.
    #[error("car {0} is already rented")]
    CarUnavailable(CarId),

    /// No rental exists with the requested identifier.
    #[error("rental {0} not found")]
    RentalNotFound(RentalId),

    /// The rental belongs to another user.
    #[error("rental {0} belongs to another user")]
    RentalForbidden(RentalId),

    /// The rental period has no billable days.
    #[error("invalid rental period: {date_from} to {date_to}")]
    InvalidPeriod {
        date_from: NaiveDate,
        date_to: NaiveDate,
    },

    /// A backend lost an entity between creating it and the status
    /// update that should have followed.
    #[error("{entity} {id} vanished during status update")]
    MissingOnUpdate { entity: &'static str, id: String },

    /// A backend call failed at the transport level. Completed forward
    /// steps were compensated before this surfaced.
    #[error(transparent)]
    Remote(#[from] PortError),

    /// A compensation failed and backend state could not be reconciled.
    #[error("unreconciled backend state: {0}")]
    Inconsistent(OrphanReport),

    /// The rental reached its terminal status but idempotent cleanup is
    /// incomplete; re-invoking the operation finishes it.
    #[error("rental {rental_uid} is {status} but cleanup is incomplete, retry to finish: {}", list_steps(remaining))]
    CleanupIncomplete {
        rental_uid: RentalId,
        status: RentalStatus,
        remaining: Vec<CleanupStep>,
    },

    /// The detached saga task aborted before reaching an outcome.
    #[error("saga task aborted: {0}")]
    Aborted(String),
}
