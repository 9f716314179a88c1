//! Consumption summary route handler.

use axum::{Json, extract::State};
use serde::Deserialize;

use super::ApiQuery;
use crate::db::Store;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::analytics::{AnalyticsService, SummaryQuery, SummaryRow};
use crate::state::AppState;

/// Raw `?start_date=&end_date=&agg=` parameters.
#[derive(Debug, Deserialize)]
pub struct OverviewParams {
    pub start_date: String,
    pub end_date: String,
    pub agg: Option<String>,
}

/// Summed quantities per item per time bucket.
pub async fn overview<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiQuery(params): ApiQuery<OverviewParams>,
) -> Result<Json<Vec<SummaryRow>>> {
    let query = SummaryQuery::parse(&params.start_date, &params.end_date, params.agg.as_deref())?;

    let rows = AnalyticsService::new(state.store())
        .summary(&identity, &query)
        .await?;
    Ok(Json(rows))
}
