//! Joins rentals with their cars and payments.

use domain::Rental;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use ports::{CarPort, Page, PaymentPort, PortError};

use crate::view::{CarSummary, PaymentView, RentalView};

/// Cap on simultaneous car/payment lookups while assembling a page.
///
/// Bounds the load fanned out to the backends without falling back to N
/// sequential round trips.
pub const FAN_OUT_LIMIT: usize = 8;

/// Assembles caller-facing rental views from the car and payment ports.
#[derive(Debug, Clone)]
pub struct ResponseAssembler<C, P> {
    car: C,
    payment: P,
}

impl<C, P> ResponseAssembler<C, P>
where
    C: CarPort,
    P: PaymentPort,
{
    /// Creates an assembler over the two lookup ports.
    pub fn new(car: C, payment: P) -> Self {
        Self { car, payment }
    }

    /// Joins one rental with its car and payment.
    ///
    /// The two lookups are independent and run concurrently. A missing
    /// car or payment violates the workflow invariants, so it is logged
    /// and counted, but the item is still served with that section null.
    pub async fn assemble(&self, rental: Rental) -> Result<RentalView, PortError> {
        let (car, payment) = tokio::try_join!(
            self.car.get_car(rental.car_uid),
            self.payment.get_payment(rental.payment_uid),
        )?;

        if car.is_none() {
            metrics::counter!("assembler_missing_entities_total").increment(1);
            tracing::warn!(
                rental_uid = %rental.rental_uid,
                car_uid = %rental.car_uid,
                "rental references a car the car service does not know"
            );
        }
        if payment.is_none() {
            metrics::counter!("assembler_missing_entities_total").increment(1);
            tracing::warn!(
                rental_uid = %rental.rental_uid,
                payment_uid = %rental.payment_uid,
                "rental references a payment the payment service does not know"
            );
        }

        Ok(RentalView {
            rental_uid: rental.rental_uid,
            date_from: rental.date_from,
            date_to: rental.date_to,
            status: rental.status,
            car: car.map(CarSummary::from),
            payment: payment.map(PaymentView::from),
        })
    }

    /// Joins a page of rentals with bounded concurrent fan-out.
    ///
    /// Lookups for up to [`FAN_OUT_LIMIT`] items run at once; results
    /// are yielded keyed by input position, so the output order equals
    /// the input rental order no matter which fetch completes first.
    pub async fn assemble_page(
        &self,
        page: Page<Rental>,
    ) -> Result<Page<RentalView>, PortError> {
        let items = stream::iter(page.items)
            .map(|rental| self.assemble(rental))
            .buffered(FAN_OUT_LIMIT)
            .try_collect()
            .await?;

        Ok(Page {
            items,
            total_elements: page.total_elements,
        })
    }
}
