//! Car catalogue read-through proxy.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::Car;
use ports::{CarPort, PaymentPort, RentalPort};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::PageQuery;

#[derive(Debug, Deserialize)]
pub struct CarsQuery {
    page: Option<u64>,
    size: Option<u64>,
    #[serde(rename = "showAll")]
    show_all: Option<bool>,
}

impl CarsQuery {
    fn paging(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            size: self.size,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarsResponse {
    pub page: u64,
    pub page_size: u64,
    pub total_elements: u64,
    pub items: Vec<Car>,
}

/// GET /api/v1/cars — pass-through page of the car catalogue.
pub async fn list<C, P, R>(
    State(state): State<Arc<AppState<C, P, R>>>,
    Query(query): Query<CarsQuery>,
) -> Result<Json<CarsResponse>, ApiError>
where
    C: CarPort + Clone + 'static,
    P: PaymentPort + Clone + 'static,
    R: RentalPort + Clone + 'static,
{
    let paging = query.paging();
    let page = state
        .car
        .get_cars(paging.offset(), paging.size(), query.show_all.unwrap_or(false))
        .await?;

    Ok(Json(CarsResponse {
        page: paging.page(),
        page_size: paging.size(),
        total_elements: page.total_elements,
        items: page.items,
    }))
}
