//! Rental endpoints: the saga triggers and the assembled read views.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::NaiveDate;
use common::{CarId, RentalId};
use domain::RentalStatus;
use ports::{CarPort, PaymentPort, RentalAccess, RentalPort, USER_HEADER};
use saga::{CreateRentalRequest, CreatedRental, SagaError};
use serde::{Deserialize, Serialize};
use views::{PaymentView, RentalView};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::PageQuery;

/// Pulls the trusted caller identity out of the request headers.
fn username(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("missing {USER_HEADER} header")))
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalBody {
    pub car_uid: CarId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalsResponse {
    pub page: u64,
    pub page_size: u64,
    pub total_elements: u64,
    pub items: Vec<RentalView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalResponse {
    pub rental_uid: RentalId,
    pub status: RentalStatus,
    pub car_uid: CarId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub payment: PaymentView,
}

impl From<CreatedRental> for CreateRentalResponse {
    fn from(created: CreatedRental) -> Self {
        Self {
            rental_uid: created.rental.rental_uid,
            status: created.rental.status,
            car_uid: created.car.car_uid,
            date_from: created.rental.date_from,
            date_to: created.rental.date_to,
            payment: PaymentView::from(created.payment),
        }
    }
}

// -- Handlers --

/// GET /api/v1/rentals — assembled page of the caller's rentals.
pub async fn list<C, P, R>(
    State(state): State<Arc<AppState<C, P, R>>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<RentalsResponse>, ApiError>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let username = username(&headers)?;
    let rentals = state
        .rental
        .get_user_rentals(&username, query.offset(), query.size())
        .await?;
    let assembled = state.assembler.assemble_page(rentals).await?;

    Ok(Json(RentalsResponse {
        page: query.page(),
        page_size: query.size(),
        total_elements: assembled.total_elements,
        items: assembled.items,
    }))
}

/// GET /api/v1/rentals/{id} — one assembled rental, owner-scoped.
pub async fn get<C, P, R>(
    State(state): State<Arc<AppState<C, P, R>>>,
    headers: HeaderMap,
    Path(rental_uid): Path<RentalId>,
) -> Result<Json<RentalView>, ApiError>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let username = username(&headers)?;
    let rental = match state
        .rental
        .get_user_rental(rental_uid, &username)
        .await?
    {
        RentalAccess::NotFound => {
            return Err(SagaError::RentalNotFound(rental_uid).into());
        }
        RentalAccess::Forbidden => {
            return Err(SagaError::RentalForbidden(rental_uid).into());
        }
        RentalAccess::Permitted(rental) => rental,
    };

    Ok(Json(state.assembler.assemble(rental).await?))
}

/// POST /api/v1/rentals — runs the create-rental saga.
pub async fn create<C, P, R>(
    State(state): State<Arc<AppState<C, P, R>>>,
    headers: HeaderMap,
    Json(body): Json<CreateRentalBody>,
) -> Result<(StatusCode, Json<CreateRentalResponse>), ApiError>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let username = username(&headers)?;
    let created = state
        .orchestrator
        .create_rental(CreateRentalRequest {
            username,
            car_uid: body.car_uid,
            date_from: body.date_from,
            date_to: body.date_to,
        })
        .await?;

    Ok((StatusCode::OK, Json(created.into())))
}

/// DELETE /api/v1/rentals/{id} — runs the cancel-rental saga.
pub async fn cancel<C, P, R>(
    State(state): State<Arc<AppState<C, P, R>>>,
    headers: HeaderMap,
    Path(rental_uid): Path<RentalId>,
) -> Result<StatusCode, ApiError>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let username = username(&headers)?;
    state.orchestrator.cancel_rental(rental_uid, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/rentals/{id}/finish — runs the finish-rental saga.
pub async fn finish<C, P, R>(
    State(state): State<Arc<AppState<C, P, R>>>,
    headers: HeaderMap,
    Path(rental_uid): Path<RentalId>,
) -> Result<StatusCode, ApiError>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let username = username(&headers)?;
    state.orchestrator.finish_rental(rental_uid, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
