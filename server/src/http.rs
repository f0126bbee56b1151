use std::{
    any::Any,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{self, HeaderName, HeaderValue, Method},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, put},
};
use platform_api::{ApiError, ApiResult};
use products_hr::{
    DirectoryError, EmployeeId, EmployeeView, HrModule, ListQuery, Listing, SortField,
};
use serde::{Deserialize, Serialize};
use tera::{Context as TemplateContext, Tera};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::config::AppConfig;

const EMPLOYEES_TEMPLATE: &str = "employees.html";

#[derive(Clone)]
pub struct AppState {
    pub hr: HrModule,
    pub templates: Arc<Tera>,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub fn load_templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template(
        EMPLOYEES_TEMPLATE,
        include_str!("../templates/employees.html"),
    )
    .context("failed to parse employees template")?;
    Ok(tera)
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "directory server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::PUT])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/employees", get(employees_handler))
        .route("/employees/{id}/manager", put(update_manager_handler))
        .route("/api/employees/{id}/manager", put(update_manager_handler))
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn index_handler() -> Redirect {
    Redirect::to("/employees")
}

#[derive(Debug, Deserialize)]
struct ListParams {
    search: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

#[derive(Debug, Serialize)]
struct ColumnLink {
    field: &'static str,
    label: &'static str,
    next_order: &'static str,
    active: bool,
}

const COLUMNS: &[(SortField, &str)] = &[
    (SortField::Id, "ID"),
    (SortField::FullName, "Full name"),
    (SortField::Position, "Position"),
    (SortField::HireDate, "Hire date"),
    (SortField::Salary, "Salary"),
];

async fn employees_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Html<String>> {
    let query = ListQuery::from_params(
        params.search.as_deref(),
        params.sort.as_deref(),
        params.order.as_deref(),
    );
    let listing = state.hr.employees(&query).await;
    let page = render_listing(&state.templates, &query, &listing).map_err(ApiError::internal)?;
    Ok(Html(page))
}

fn render_listing(
    templates: &Tera,
    query: &ListQuery,
    listing: &Listing,
) -> tera::Result<String> {
    let active = query.sort.unwrap_or(SortField::Id);
    let columns = COLUMNS
        .iter()
        .map(|(field, label)| ColumnLink {
            field: field.as_str(),
            label: *label,
            next_order: if *field == active {
                query.order.reversed().as_str()
            } else {
                "asc"
            },
            active: *field == active,
        })
        .collect::<Vec<_>>();

    let mut context = TemplateContext::new();
    context.insert("employees", &listing.employees);
    context.insert("warning", &listing.warning);
    context.insert("search_query", query.search_term().unwrap_or(""));
    context.insert("sort_field", active.as_str());
    context.insert("sort_order", query.order.as_str());
    context.insert("columns", &columns);
    templates.render(EMPLOYEES_TEMPLATE, &context)
}

#[derive(Debug, Deserialize)]
struct ManagerUpdate {
    #[serde(default)]
    manager_id: Option<EmployeeId>,
}

#[derive(Debug, Serialize)]
struct ManagerUpdated {
    message: &'static str,
    employee: EmployeeView,
}

async fn update_manager_handler(
    State(state): State<AppState>,
    id: Result<Path<EmployeeId>, PathRejection>,
    payload: Result<Json<ManagerUpdate>, JsonRejection>,
) -> ApiResult<Json<ManagerUpdated>> {
    let Ok(Path(employee_id)) = id else {
        return Err(ApiError::not_found(platform_api::NOT_FOUND_MESSAGE));
    };
    let Json(update) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let employee = state
        .hr
        .set_manager(employee_id, update.manager_id)
        .await
        .map_err(directory_error)?;
    Ok(Json(ManagerUpdated {
        message: "manager updated",
        employee,
    }))
}

fn directory_error(err: DirectoryError) -> ApiError {
    match err {
        DirectoryError::EmployeeNotFound(_) | DirectoryError::ManagerNotFound(_) => {
            ApiError::not_found(err.to_string())
        }
        DirectoryError::SelfManagement(_)
        | DirectoryError::CycleDetected { .. }
        | DirectoryError::ChainLimitExceeded { .. } => ApiError::bad_request(err.to_string()),
        DirectoryError::Integrity(detail) => {
            warn!(%detail, "manager change violated a constraint");
            ApiError::bad_request("data integrity violation")
        }
        DirectoryError::Persistence(source) => ApiError::internal(source),
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = platform_db::ping(state.hr.db()).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn fallback_handler() -> Response {
    platform_api::not_found_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(%detail, "handler panicked");
    platform_api::internal_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
