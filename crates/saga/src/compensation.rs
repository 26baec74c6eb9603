//! Recorded undo actions for completed forward steps.

use common::{CarId, PaymentId, RentalId};

/// The undo action paired with one completed forward step.
///
/// A saga pushes one of these after each step that committed remote
/// state; on failure the stack is popped and executed in strict reverse
/// order. The stack lives only for one orchestrator call and is never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    /// Undo for a successful lock.
    UnlockCar(CarId),
    /// Undo for a created payment.
    CancelPayment(PaymentId),
    /// Undo for a registered rental.
    CancelRental(RentalId),
}

impl std::fmt::Display for Compensation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compensation::UnlockCar(id) => write!(f, "unlock car {id}"),
            Compensation::CancelPayment(id) => write!(f, "cancel payment {id}"),
            Compensation::CancelRental(id) => write!(f, "cancel rental {id}"),
        }
    }
}
