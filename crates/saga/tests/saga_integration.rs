//! End-to-end saga tests over the in-memory ports, covering the failure
//! injection scenarios the compensation design exists for.

use std::time::Duration;

use common::CarId;
use domain::{Car, CarType, PaymentStatus, RentalStatus};
use ports::{InMemoryCarPort, InMemoryPaymentPort, InMemoryRentalPort};
use saga::{CleanupStep, CreateRentalRequest, RentalOrchestrator, SagaError};

type Orchestrator = RentalOrchestrator<InMemoryCarPort, InMemoryPaymentPort, InMemoryRentalPort>;

fn setup() -> (
    Orchestrator,
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

fn seed_car(port: &InMemoryCarPort, available: bool) -> CarId {
    let car = Car {
        car_uid: CarId::new(),
        brand: "Audi".to_string(),
        model: "A6".to_string(),
        registration_number: "EF456GH".to_string(),
        power: 340,
        price: 2000,
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
        date_from: "2024-11-01".parse().unwrap(),
        date_to: "2024-11-03".parse().unwrap(),
    }
}

// Scenario A: lock succeeds, payment succeeds, rental creation fails.
// The payment must end canceled and the car unlocked.
#[tokio::test]
async fn rental_creation_failure_unwinds_payment_then_lock() {
    let (orchestrator, car, payment, rental) = setup();
    let car_uid = seed_car(&car, true);
    rental.set_fail_on_create(true);

    let err = orchestrator
        .create_rental(request(car_uid))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Remote(_)));
    assert_eq!(car.is_available(car_uid), Some(true));
    assert_eq!(payment.statuses(), vec![PaymentStatus::Canceled]);
    assert_eq!(rental.rental_count(), 0);
}

// Scenario B: the lock conflict is a business rejection, so no payment
// may ever be created.
#[tokio::test]
async fn lock_conflict_creates_no_payment() {
    let (orchestrator, car, payment, rental) = setup();
    let car_uid = seed_car(&car, false);

    let err = orchestrator
        .create_rental(request(car_uid))
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::CarUnavailable(id) if id == car_uid));
    assert_eq!(payment.payment_count(), 0);
    assert_eq!(rental.rental_count(), 0);
}

// Scenario C: cancel flips the rental, then the unlock fails. The
// caller gets a retryable partial failure naming the remaining step,
// and a second cancel finishes the cleanup.
#[tokio::test]
async fn failed_unlock_during_cancel_is_retryable() {
    let (orchestrator, car, payment, _rental) = setup();
    let car_uid = seed_car(&car, true);
    let created = orchestrator.create_rental(request(car_uid)).await.unwrap();
    let rental_uid = created.rental.rental_uid;

    car.set_fail_on_unlock(true);
    let err = orchestrator
        .cancel_rental(rental_uid, "alice")
        .await
        .unwrap_err();

    let SagaError::CleanupIncomplete {
        rental_uid: reported,
        status,
        remaining,
    } = err
    else {
        panic!("expected CleanupIncomplete, got {err}");
    };
    assert_eq!(reported, rental_uid);
    assert_eq!(status, RentalStatus::Canceled);
    assert_eq!(remaining, vec![CleanupStep::UnlockCar(car_uid)]);
    // The payment cancel had already gone through.
    assert_eq!(
        payment.status_of(created.payment.payment_uid),
        Some(PaymentStatus::Canceled)
    );
    assert_eq!(car.is_available(car_uid), Some(false));

    // Re-invoking cancel is a no-op on the already-canceled state and
    // completes the unlock.
    car.set_fail_on_unlock(false);
    orchestrator.cancel_rental(rental_uid, "alice").await.unwrap();
    assert_eq!(car.is_available(car_uid), Some(true));
}

// No orphan lock: when compensation cannot release the car, the orphan
// must be reported, never hidden behind a plain remote error.
#[tokio::test]
async fn unreleasable_lock_is_reported_as_inconsistent() {
    let (orchestrator, car, payment, rental) = setup();
    let car_uid = seed_car(&car, true);
    rental.set_fail_on_create(true);
    car.set_fail_on_unlock(true);

    let err = orchestrator
        .create_rental(request(car_uid))
        .await
        .unwrap_err();

    let SagaError::Inconsistent(report) = err else {
        panic!("expected Inconsistent, got {err}");
    };
    assert_eq!(report.car_uid, Some(car_uid));
    assert_eq!(report.payment_uid, None);
    assert!(!report.detail.is_empty());
    // The payment compensation still ran.
    assert_eq!(payment.statuses(), vec![PaymentStatus::Canceled]);
    // Retries were bounded: the car really is still locked.
    assert_eq!(car.is_available(car_uid), Some(false));
}

// A caller that walks away mid-saga must not abort forward progress or
// the compensations that follow it: the saga body is detached from the
// caller's future and always reaches a terminal backend state.
#[tokio::test]
async fn dropped_caller_future_still_unwinds_to_a_terminal_state() {
    let (orchestrator, car, payment, rental) = setup();
    let car_uid = seed_car(&car, true);
    // The rental step is slow and then fails, so the interesting part
    // (failure plus compensation) happens after the caller is gone.
    rental.set_create_delay(Duration::from_millis(80));
    rental.set_fail_on_create(true);

    let create = orchestrator.create_rental(request(car_uid));
    tokio::select! {
        outcome = create => panic!("saga finished before the caller disconnected: {outcome:?}"),
        () = tokio::time::sleep(Duration::from_millis(10)) => {}
    }
    // `create` was dropped by the select; only the await on the join
    // handle is cancelled, not the spawned saga body.

    let mut converged = false;
    for _ in 0..100 {
        if car.is_available(car_uid) == Some(true)
            && payment.statuses() == vec![PaymentStatus::Canceled]
        {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(converged, "backends never reached the compensated state");
    assert_eq!(rental.rental_count(), 0);
}

// Many sagas over distinct cars run concurrently without interference;
// the backends arbitrate all conflicts.
#[tokio::test]
async fn concurrent_sagas_on_distinct_cars_all_commit() {
    let (orchestrator, car, payment, rental) = setup();
    let ids: Vec<CarId> = (0..8).map(|_| seed_car(&car, true)).collect();

    let handles: Vec<_> = ids
        .iter()
        .map(|&car_uid| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.create_rental(request(car_uid)).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(payment.payment_count(), 8);
    assert_eq!(rental.rental_count(), 8);
    for id in ids {
        assert_eq!(car.is_available(id), Some(false));
    }
}
