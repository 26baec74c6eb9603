//! Cross-service rental workflow with ordered compensations.
//!
//! No transaction spans the car, payment, and rental services, so the
//! create-rental workflow is an explicit saga: each completed forward
//! step records its undo action, and on failure the recorded actions run
//! in strict reverse order. The orchestrator is the only code path that
//! transitions car, payment, and rental status together.
//!
//! CreateRentalSaga steps:
//! 1. Lock the car
//! 2. Create the payment
//! 3. Register the rental
//! 4. Confirm the rental
//!
//! CancelRentalSaga flips the rental to CANCELED first (the
//! caller-visible truth), then performs idempotent cleanup that a
//! repeated cancel can safely finish.

pub mod compensation;
pub mod error;
pub mod orchestrator;

pub use compensation::Compensation;
pub use error::{CleanupStep, OrphanReport, SagaError};
pub use orchestrator::{CreateRentalRequest, CreatedRental, RentalOrchestrator};
