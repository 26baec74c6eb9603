//! Saga orchestrator for the rental workflow.

use std::time::Duration;

use chrono::NaiveDate;
use common::{CarId, RentalId};
use domain::{Car, Payment, PaymentStatus, Rental, RentalStatus, rental_days};
use ports::{CarPort, LockOutcome, NewRental, PaymentPort, PortError, RentalAccess, RentalPort};

use crate::compensation::Compensation;
use crate::error::{CleanupStep, OrphanReport, SagaError};

/// Attempts per compensation before the orphan is reported.
const COMPENSATION_ATTEMPTS: u32 = 3;

/// Deadline per compensation attempt, independent of the (possibly
/// already expired) caller deadline.
const COMPENSATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Input of the create-rental saga.
#[derive(Debug, Clone)]
pub struct CreateRentalRequest {
    pub username: String,
    pub car_uid: CarId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Result of a successful create-rental saga: the confirmed rental and
/// the car and payment it committed, ready for response assembly.
#[derive(Debug, Clone)]
pub struct CreatedRental {
    pub rental: Rental,
    pub car: Car,
    pub payment: Payment,
}

/// Drives the rental sagas across the three service ports.
///
/// Steps are strictly sequential: each depends on an identifier produced
/// by the previous one. Saga bodies run in a spawned task awaited by the
/// caller, so a client that disconnects mid-saga never aborts forward
/// progress before its compensations have run.
#[derive(Debug, Clone)]
pub struct RentalOrchestrator<C, P, R> {
    car: C,
    payment: P,
    rental: R,
}

impl<C, P, R> RentalOrchestrator<C, P, R>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    /// Creates an orchestrator over the three ports.
    pub fn new(car: C, payment: P, rental: R) -> Self {
        Self {
            car,
            payment,
            rental,
        }
    }

    /// Executes the create-rental saga to a terminal outcome.
    pub async fn create_rental(
        &self,
        request: CreateRentalRequest,
    ) -> Result<CreatedRental, SagaError> {
        let this = self.clone();
        tokio::spawn(async move { this.run_create(request).await })
            .await
            .map_err(|e| SagaError::Aborted(e.to_string()))?
    }

    /// Executes the cancel-rental saga: CANCELED rental, CANCELED
    /// payment, unlocked car.
    pub async fn cancel_rental(
        &self,
        rental_uid: RentalId,
        username: &str,
    ) -> Result<(), SagaError> {
        let rental = self.owned_rental(rental_uid, username).await?;
        let this = self.clone();
        tokio::spawn(async move { this.run_release(rental, RentalStatus::Canceled).await })
            .await
            .map_err(|e| SagaError::Aborted(e.to_string()))?
    }

    /// Executes the finish-rental saga: FINISHED rental, unlocked car.
    /// The payment stays PAID.
    pub async fn finish_rental(
        &self,
        rental_uid: RentalId,
        username: &str,
    ) -> Result<(), SagaError> {
        let rental = self.owned_rental(rental_uid, username).await?;
        let this = self.clone();
        tokio::spawn(async move { this.run_release(rental, RentalStatus::Finished).await })
            .await
            .map_err(|e| SagaError::Aborted(e.to_string()))?
    }

    async fn owned_rental(
        &self,
        rental_uid: RentalId,
        username: &str,
    ) -> Result<Rental, SagaError> {
        match self.rental.get_user_rental(rental_uid, username).await? {
            RentalAccess::NotFound => Err(SagaError::RentalNotFound(rental_uid)),
            RentalAccess::Forbidden => Err(SagaError::RentalForbidden(rental_uid)),
            RentalAccess::Permitted(rental) => Ok(rental),
        }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(username = %request.username, car_uid = %request.car_uid)
    )]
    async fn run_create(&self, request: CreateRentalRequest) -> Result<CreatedRental, SagaError> {
        metrics::counter!("create_rental_sagas_total").increment(1);
        let started = std::time::Instant::now();

        let days = rental_days(request.date_from, request.date_to).ok_or(
            SagaError::InvalidPeriod {
                date_from: request.date_from,
                date_to: request.date_to,
            },
        )?;

        // Step 1: lock the car. Nothing is committed before the lock, so
        // every failure here short-circuits without compensation.
        let car = match self.car.lock_car(request.car_uid).await? {
            LockOutcome::NotFound => return Err(SagaError::CarNotFound(request.car_uid)),
            LockOutcome::AlreadyLocked => return Err(SagaError::CarUnavailable(request.car_uid)),
            LockOutcome::Locked(car) => car,
        };
        let mut stack = vec![Compensation::UnlockCar(car.car_uid)];
        tracing::info!(step = "lock_car", "saga step completed");

        // Step 2: charge for the whole period up front. An overflowing
        // total is a bad request, but the lock is already taken and has
        // to be unwound like any later failure.
        let Some(price) = car.price.checked_mul(days) else {
            let cause = SagaError::InvalidPeriod {
                date_from: request.date_from,
                date_to: request.date_to,
            };
            return Err(self.abort(stack, cause).await);
        };
        let payment = match self.payment.create_payment(price).await {
            Ok(payment) => payment,
            Err(e) => return Err(self.abort(stack, e.into()).await),
        };
        stack.push(Compensation::CancelPayment(payment.payment_uid));
        tracing::info!(step = "create_payment", payment_uid = %payment.payment_uid, price, "saga step completed");

        // Step 3: register the rental, funded by the payment.
        let new = NewRental {
            username: request.username.clone(),
            payment_uid: payment.payment_uid,
            car_uid: car.car_uid,
            date_from: request.date_from,
            date_to: request.date_to,
        };
        let mut rental = match self.rental.create_rental(new).await {
            Ok(rental) => rental,
            Err(e) => return Err(self.abort(stack, e.into()).await),
        };
        stack.push(Compensation::CancelRental(rental.rental_uid));
        tracing::info!(step = "create_rental", rental_uid = %rental.rental_uid, "saga step completed");

        // Step 4: confirm. Only after this may the caller see the rental.
        match self
            .rental
            .set_rental_status(rental.rental_uid, RentalStatus::Confirmed)
            .await
        {
            Ok(true) => rental.status = RentalStatus::Confirmed,
            Ok(false) => {
                let cause = SagaError::MissingOnUpdate {
                    entity: "rental",
                    id: rental.rental_uid.to_string(),
                };
                return Err(self.abort(stack, cause).await);
            }
            Err(e) => return Err(self.abort(stack, e.into()).await),
        }

        metrics::histogram!("saga_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("create_rental_sagas_completed").increment(1);
        tracing::info!(rental_uid = %rental.rental_uid, "create rental saga completed");

        Ok(CreatedRental {
            rental,
            car,
            payment,
        })
    }

    /// Flips the rental to its terminal status, then runs the idempotent
    /// cleanup shared by cancel and finish.
    #[tracing::instrument(
        skip(self, rental),
        fields(rental_uid = %rental.rental_uid, %target)
    )]
    async fn run_release(&self, rental: Rental, target: RentalStatus) -> Result<(), SagaError> {
        // The status flip is the caller-visible truth; everything after
        // it can be retried by re-invoking the operation.
        match self
            .rental
            .set_rental_status(rental.rental_uid, target)
            .await?
        {
            true => {}
            false => return Err(SagaError::RentalNotFound(rental.rental_uid)),
        }

        let mut remaining = Vec::new();

        if target == RentalStatus::Canceled {
            match self
                .payment
                .set_payment_status(rental.payment_uid, PaymentStatus::Canceled)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    // A retry cannot conjure the payment back; report it
                    // instead of asking the caller to retry.
                    metrics::counter!("saga_inconsistent_total").increment(1);
                    tracing::warn!(payment_uid = %rental.payment_uid, "payment unknown during cancel");
                }
                Err(e) => {
                    tracing::warn!(payment_uid = %rental.payment_uid, error = %e, "payment cancel failed");
                    remaining.push(CleanupStep::CancelPayment(rental.payment_uid));
                }
            }
        }

        match self.car.unlock_car(rental.car_uid).await {
            Ok(true) => {}
            Ok(false) => {
                metrics::counter!("saga_inconsistent_total").increment(1);
                tracing::warn!(car_uid = %rental.car_uid, "car unknown during release");
            }
            Err(e) => {
                tracing::warn!(car_uid = %rental.car_uid, error = %e, "car unlock failed");
                remaining.push(CleanupStep::UnlockCar(rental.car_uid));
            }
        }

        if !remaining.is_empty() {
            metrics::counter!("release_cleanup_incomplete_total").increment(1);
            return Err(SagaError::CleanupIncomplete {
                rental_uid: rental.rental_uid,
                status: target,
                remaining,
            });
        }

        tracing::info!("release saga completed");
        Ok(())
    }

    /// Unwinds completed forward steps in reverse order, then returns
    /// the error the caller should see: the original cause when every
    /// compensation succeeded, otherwise the orphan report.
    async fn abort(&self, stack: Vec<Compensation>, cause: SagaError) -> SagaError {
        metrics::counter!("create_rental_sagas_failed").increment(1);
        tracing::warn!(error = %cause, completed_steps = stack.len(), "saga failed, unwinding");

        let mut report = OrphanReport::default();
        for step in stack.into_iter().rev() {
            if self.run_compensation(step).await {
                continue;
            }
            match step {
                Compensation::UnlockCar(id) => report.car_uid = Some(id),
                Compensation::CancelPayment(id) => report.payment_uid = Some(id),
                Compensation::CancelRental(id) => report.rental_uid = Some(id),
            }
        }

        if report.is_empty() {
            return cause;
        }
        report.detail = cause.to_string();
        metrics::counter!("saga_inconsistent_total").increment(1);
        tracing::error!(%report, "compensation failed, external reconciliation required");
        SagaError::Inconsistent(report)
    }

    async fn run_compensation(&self, step: Compensation) -> bool {
        for attempt in 1..=COMPENSATION_ATTEMPTS {
            metrics::counter!("saga_compensation_attempts_total").increment(1);
            match tokio::time::timeout(COMPENSATION_TIMEOUT, self.apply_compensation(step)).await {
                Ok(Ok(())) => return true,
                Ok(Err(e)) => {
                    tracing::warn!(%step, attempt, error = %e, "compensation attempt failed");
                }
                Err(_) => {
                    tracing::warn!(%step, attempt, "compensation attempt timed out");
                }
            }
        }
        false
    }

    async fn apply_compensation(&self, step: Compensation) -> Result<(), PortError> {
        // A found=false here means there is nothing left to undo.
        match step {
            Compensation::UnlockCar(id) => {
                self.car.unlock_car(id).await?;
            }
            Compensation::CancelPayment(id) => {
                self.payment
                    .set_payment_status(id, PaymentStatus::Canceled)
                    .await?;
            }
            Compensation::CancelRental(id) => {
                self.rental
                    .set_rental_status(id, RentalStatus::Canceled)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::CarType;
    use ports::{InMemoryCarPort, InMemoryPaymentPort, InMemoryRentalPort};

    type TestOrchestrator =
        RentalOrchestrator<InMemoryCarPort, InMemoryPaymentPort, InMemoryRentalPort>;

    fn setup() -> (
        TestOrchestrator,
        InMemoryCarPort,
        InMemoryPaymentPort,
        InMemoryRentalPort,
    ) {
        let car = InMemoryCarPort::new();
        let payment = InMemoryPaymentPort::new();
        let rental = InMemoryRentalPort::new();
        let orchestrator = RentalOrchestrator::new(car.clone(), payment.clone(), rental.clone());
        (orchestrator, car, payment, rental)
    }

    fn seed_car(port: &InMemoryCarPort, price: u64, available: bool) -> CarId {
        let car = Car {
            car_uid: CarId::new(),
            brand: "Mercedes Benz".to_string(),
            model: "GLA 250".to_string(),
            registration_number: "AB123CD".to_string(),
            power: 249,
            price,
            car_type: CarType::Sedan,
            available,
        };
        let id = car.car_uid;
        port.add_car(car);
        id
    }

    fn request(car_uid: CarId) -> CreateRentalRequest {
        CreateRentalRequest {
            username: "alice".to_string(),
            car_uid,
            date_from: "2024-10-01".parse().unwrap(),
            date_to: "2024-10-04".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn create_commits_all_three_services() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, 3500, true);

        let created = orchestrator.create_rental(request(car_uid)).await.unwrap();

        // Exactly one car locked, one payment paid, one rental confirmed.
        assert_eq!(car.is_available(car_uid), Some(false));
        assert_eq!(payment.payment_count(), 1);
        assert_eq!(
            payment.status_of(created.payment.payment_uid),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(rental.rental_count(), 1);
        assert_eq!(created.rental.status, RentalStatus::Confirmed);
        assert_eq!(
            rental.status_of(created.rental.rental_uid),
            Some(RentalStatus::Confirmed)
        );
        // The rental is funded by the payment the saga created.
        assert_eq!(created.rental.payment_uid, created.payment.payment_uid);
        // Three billable days at 3500.
        assert_eq!(created.payment.price, 10_500);
    }

    #[tokio::test]
    async fn unknown_car_rejects_before_committing_anything() {
        let (orchestrator, _, payment, rental) = setup();

        let err = orchestrator
            .create_rental(request(CarId::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::CarNotFound(_)));
        assert_eq!(payment.payment_count(), 0);
        assert_eq!(rental.rental_count(), 0);
    }

    #[tokio::test]
    async fn locked_car_rejects_without_payment() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, 3500, false);

        let err = orchestrator
            .create_rental(request(car_uid))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::CarUnavailable(_)));
        assert_eq!(payment.payment_count(), 0);
        assert_eq!(rental.rental_count(), 0);
    }

    #[tokio::test]
    async fn empty_period_is_rejected_up_front() {
        let (orchestrator, car, payment, _) = setup();
        let car_uid = seed_car(&car, 3500, true);

        let mut req = request(car_uid);
        req.date_to = req.date_from;
        let err = orchestrator.create_rental(req).await.unwrap_err();

        assert!(matches!(err, SagaError::InvalidPeriod { .. }));
        // The lock was never taken.
        assert_eq!(car.is_available(car_uid), Some(true));
        assert_eq!(payment.payment_count(), 0);
    }

    #[tokio::test]
    async fn overflowing_price_is_rejected_and_unlocks_the_car() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, u64::MAX, true);

        let err = orchestrator
            .create_rental(request(car_uid))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::InvalidPeriod { .. }));
        assert_eq!(car.is_available(car_uid), Some(true));
        assert_eq!(payment.payment_count(), 0);
        assert_eq!(rental.rental_count(), 0);
    }

    #[tokio::test]
    async fn payment_failure_unlocks_the_car() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, 3500, true);
        payment.set_fail_on_create(true);

        let err = orchestrator
            .create_rental(request(car_uid))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::Remote(_)));
        assert_eq!(car.is_available(car_uid), Some(true));
        assert_eq!(rental.rental_count(), 0);
    }

    #[tokio::test]
    async fn confirm_failure_compensates_all_three_steps() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, 3500, true);
        // Fails the confirm transition and the cancel-rental
        // compensation alike, so the rental is reported as an orphan.
        rental.set_fail_on_set_status(true);

        let err = orchestrator
            .create_rental(request(car_uid))
            .await
            .unwrap_err();

        let SagaError::Inconsistent(report) = err else {
            panic!("expected Inconsistent, got {err}");
        };
        assert!(report.rental_uid.is_some());
        assert!(report.car_uid.is_none());
        assert!(report.payment_uid.is_none());
        // Payment and lock were still unwound.
        assert_eq!(car.is_available(car_uid), Some(true));
        let orphaned = report.rental_uid.unwrap();
        assert_eq!(rental.status_of(orphaned), Some(RentalStatus::InProgress));
        assert_eq!(payment.payment_count(), 1);
        assert_eq!(payment.statuses(), vec![PaymentStatus::Canceled]);
    }

    #[tokio::test]
    async fn cancel_reverses_the_whole_rental() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, 3500, true);
        let created = orchestrator.create_rental(request(car_uid)).await.unwrap();

        orchestrator
            .cancel_rental(created.rental.rental_uid, "alice")
            .await
            .unwrap();

        assert_eq!(
            rental.status_of(created.rental.rental_uid),
            Some(RentalStatus::Canceled)
        );
        assert_eq!(
            payment.status_of(created.payment.payment_uid),
            Some(PaymentStatus::Canceled)
        );
        assert_eq!(car.is_available(car_uid), Some(true));
    }

    #[tokio::test]
    async fn cancel_enforces_ownership() {
        let (orchestrator, car, _, rental) = setup();
        let car_uid = seed_car(&car, 3500, true);
        let created = orchestrator.create_rental(request(car_uid)).await.unwrap();

        let err = orchestrator
            .cancel_rental(created.rental.rental_uid, "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, SagaError::RentalForbidden(_)));
        assert_eq!(
            rental.status_of(created.rental.rental_uid),
            Some(RentalStatus::Confirmed)
        );

        let err = orchestrator
            .cancel_rental(RentalId::new(), "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, SagaError::RentalNotFound(_)));
    }

    #[tokio::test]
    async fn finish_unlocks_but_keeps_the_payment_paid() {
        let (orchestrator, car, payment, rental) = setup();
        let car_uid = seed_car(&car, 3500, true);
        let created = orchestrator.create_rental(request(car_uid)).await.unwrap();

        orchestrator
            .finish_rental(created.rental.rental_uid, "alice")
            .await
            .unwrap();

        assert_eq!(
            rental.status_of(created.rental.rental_uid),
            Some(RentalStatus::Finished)
        );
        assert_eq!(
            payment.status_of(created.payment.payment_uid),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(car.is_available(car_uid), Some(true));
    }
}
