use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    AreaInsights, ComparableSale, MarketPoint, PropertyRecord, Scenario, ScenarioSelection, Valuer,
    normalize_area, price_per_sqm,
};
use crate::error::Error;

type AppState = Arc<Valuer>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeriesParams {
    months: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustPayload {
    postcode: String,
    #[serde(default)]
    scenarios: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PropertyResponse<'a> {
    #[serde(flatten)]
    property: &'a PropertyRecord,
    area: String,
    price_per_sqm: u64,
    confidence_stars: u8,
}

impl<'a> From<&'a PropertyRecord> for PropertyResponse<'a> {
    fn from(property: &'a PropertyRecord) -> Self {
        Self {
            property,
            area: property.area(),
            price_per_sqm: price_per_sqm(property),
            confidence_stars: property.confidence_stars(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparableResponse {
    #[serde(flatten)]
    sale: ComparableSale,
    price_per_sqm: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarketPointResponse {
    month: String,
    label: String,
    median_price: u64,
    index: f64,
}

impl From<&MarketPoint> for MarketPointResponse {
    fn from(point: &MarketPoint) -> Self {
        Self {
            month: point.month.format("%Y-%m").to_string(),
            label: point.label(),
            median_price: point.median_price,
            index: point.index,
        }
    }
}

#[derive(Debug, Serialize)]
struct InsightsResponse<'a> {
    area: String,
    #[serde(flatten)]
    insights: &'a AreaInsights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResponse {
    key: &'static str,
    label: &'static str,
    description: &'static str,
    uplift: u64,
    cost: u64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(valuer: Valuer) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/properties/search", get(search_handler))
        .route("/properties/:postcode", get(property_handler))
        .route("/properties/:postcode/comparables", get(comparables_handler))
        .route("/properties/:postcode/explanation", get(explanation_handler))
        .route("/market/:area/series", get(series_handler))
        .route("/market/:area/insights", get(insights_handler))
        .route("/scenarios", get(scenarios_handler))
        .route("/valuations/adjust", post(adjust_handler))
        .fallback(not_found_handler)
        .layer(middleware::map_response(method_not_allowed_as_json))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(valuer))
}

pub async fn run_http_server(valuer: Valuer, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(valuer);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "valuation API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

// The method router answers a wrong verb with an empty 405; rewrite it into
// the JSON error shape, keeping its Allow header.
async fn method_not_allowed_as_json(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let mut json = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    if let Some(allow) = response.headers().get(header::ALLOW) {
        json.headers_mut().insert(header::ALLOW, allow.clone());
    }
    json
}

async fn search_handler(
    State(valuer): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return failure(Error::InvalidInput(rejection.body_text())),
    };
    let Some(query) = params.q else {
        return failure(Error::InvalidInput("missing query parameter q".to_string()));
    };
    match valuer.resolve(&query) {
        Ok(property) => json_response(StatusCode::OK, PropertyResponse::from(property)),
        Err(e) => failure(e),
    }
}

async fn property_handler(
    State(valuer): State<AppState>,
    Path(postcode): Path<String>,
) -> Response {
    match valuer.lookup(&postcode) {
        Ok(property) => json_response(StatusCode::OK, PropertyResponse::from(property)),
        Err(e) => failure(e),
    }
}

async fn comparables_handler(
    State(valuer): State<AppState>,
    Path(postcode): Path<String>,
) -> Response {
    let property = match valuer.lookup(&postcode) {
        Ok(property) => property,
        Err(e) => return failure(e),
    };
    let body: Vec<ComparableResponse> = valuer
        .comparables_for(property)
        .into_iter()
        .map(|sale| ComparableResponse {
            price_per_sqm: sale.price_per_sqm(),
            sale,
        })
        .collect();
    json_response(StatusCode::OK, body)
}

async fn explanation_handler(
    State(valuer): State<AppState>,
    Path(postcode): Path<String>,
) -> Response {
    match valuer.lookup(&postcode) {
        Ok(property) => json_response(StatusCode::OK, valuer.explain(property)),
        Err(e) => failure(e),
    }
}

async fn series_handler(
    State(valuer): State<AppState>,
    Path(area): Path<String>,
    params: Result<Query<SeriesParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return failure(Error::InvalidInput(rejection.body_text())),
    };
    let series = match params.months {
        Some(0) => {
            return failure(Error::InvalidInput("months must be >= 1".to_string()));
        }
        Some(months) => valuer.recent_series(&area, months),
        None => valuer.series_for(&area),
    };
    match series {
        Ok(points) => {
            let body: Vec<MarketPointResponse> = points.iter().map(Into::into).collect();
            json_response(StatusCode::OK, body)
        }
        Err(e) => failure(e),
    }
}

async fn insights_handler(
    State(valuer): State<AppState>,
    Path(area): Path<String>,
) -> Response {
    match valuer.insights_for(&area) {
        Ok(insights) => json_response(
            StatusCode::OK,
            InsightsResponse {
                area: normalize_area(&area),
                insights,
            },
        ),
        Err(e) => failure(e),
    }
}

async fn scenarios_handler() -> Response {
    let body: Vec<ScenarioResponse> = Scenario::ALL
        .into_iter()
        .map(|scenario| ScenarioResponse {
            key: scenario.key(),
            label: scenario.label(),
            description: scenario.description(),
            uplift: scenario.uplift(),
            cost: scenario.cost(),
        })
        .collect();
    json_response(StatusCode::OK, body)
}

async fn adjust_handler(
    State(valuer): State<AppState>,
    payload: Result<Json<AdjustPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return failure(Error::InvalidInput(rejection.body_text()));
        }
    };

    let selection = match ScenarioSelection::from_flags(
        payload
            .scenarios
            .iter()
            .map(|(name, &on)| (name.as_str(), on)),
    ) {
        Ok(selection) => selection,
        Err(e) => return failure(e),
    };

    match valuer.scenario_summary(&payload.postcode, &selection) {
        Ok(summary) => {
            tracing::debug!(
                postcode = %summary.postcode,
                adjusted = summary.adjusted_valuation,
                "valuation adjusted"
            );
            json_response(StatusCode::OK, summary)
        }
        Err(e) => failure(e),
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::InvalidRecord(_) | Error::Config(_) | Error::Render(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn failure(err: Error) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::debug!(error = %err, "request rejected");
    }
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
