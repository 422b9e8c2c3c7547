// Temple Ledger - Web Server
// REST API over the books with Axum

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use temple_ledger::{
    init_logging, render_html, AppConfig, Collection, DashboardTotals, ExportFormat, NetPosition,
    PagedDocument, ReportKind, SqliteSource, Table, TaxReport, TempleBooks, UnifiedTransaction,
    Workbook,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    books: Arc<Mutex<TempleBooks>>,
    db_path: PathBuf,
    rows_per_page: usize,
}

impl AppState {
    fn books(&self) -> MutexGuard<'_, TempleBooks> {
        self.books.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

/// Dashboard response: the six stats plus the net position
#[derive(Serialize)]
struct DashboardResponse {
    totals: DashboardTotals,
    net: NetPosition,
    unavailable: Vec<Collection>,
}

#[derive(Serialize)]
struct LedgerResponse {
    transactions: Vec<UnifiedTransaction>,
    net: NetPosition,
}

#[derive(Debug, Deserialize)]
struct YearQuery {
    year: Option<i32>,
}

fn parse_kind(kind: &str) -> Result<ReportKind, Response> {
    kind.parse::<ReportKind>()
        .map_err(|e| error_response(StatusCode::NOT_FOUND, e.to_string()))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard
async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let books = state.books();

    Json(ApiResponse::ok(DashboardResponse {
        totals: books.dashboard(),
        net: books.net_position(),
        unavailable: books.unavailable().iter().copied().collect(),
    }))
}

/// GET /api/ledger - Unified ledger, most recent first
async fn get_ledger(State(state): State<AppState>) -> impl IntoResponse {
    let books = state.books();

    Json(ApiResponse::ok(LedgerResponse {
        transactions: books.ledger(),
        net: books.net_position(),
    }))
}

/// GET /api/reports/tax?year=2024
async fn get_tax_report(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> impl IntoResponse {
    let report: TaxReport = state.books().tax_report(query.year);
    Json(ApiResponse::ok(report))
}

/// GET /api/reports/years - Options for the year selector
async fn get_year_options(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.books().year_options()))
}

/// GET /api/reports/:kind - Any catalog report as a header + rows table
async fn get_report_table(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<YearQuery>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let table: Table = state.books().table(kind, query.year);
    Json(ApiResponse::ok(table)).into_response()
}

/// GET /api/export/:kind/print - Print-ready HTML
async fn export_print(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<YearQuery>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let table = state.books().table(kind, query.year);
    Html(render_html(kind.title(), &table)).into_response()
}

fn download(kind: ReportKind, format: ExportFormat, rendered: anyhow::Result<Vec<u8>>) -> Response {
    let content_type = match format {
        ExportFormat::Spreadsheet => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        ExportFormat::Pdf => "application/pdf",
        ExportFormat::Csv => "text/csv; charset=utf-8",
        ExportFormat::Text => "text/plain; charset=utf-8",
        ExportFormat::Print => "text/html; charset=utf-8",
    };

    match rendered {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}.{}\"",
                        kind.file_stem(),
                        format.extension()
                    ),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(report = %kind, "export failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "export failed")
        }
    }
}

/// GET /api/export/:kind/spreadsheet - .xlsx download
async fn export_spreadsheet(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<YearQuery>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let table = state.books().table(kind, query.year);
    download(
        kind,
        ExportFormat::Spreadsheet,
        Workbook::from_table(table).to_xlsx_bytes(),
    )
}

/// GET /api/export/:kind/pdf - .pdf download
async fn export_pdf(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<YearQuery>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let table = state.books().table(kind, query.year);
    let document = PagedDocument::from_table(kind.title(), table, state.rows_per_page);
    download(kind, ExportFormat::Pdf, document.render_pdf())
}

/// POST /api/refresh - Reload every collection from the document store
async fn refresh(State(state): State<AppState>) -> Response {
    let source = match SqliteSource::open(&state.db_path) {
        Ok(source) => source,
        Err(e) => {
            error!("refresh failed: {:#}", e);
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "document store unavailable");
        }
    };

    let mut books = state.books();
    let changed = books.refresh_from(&source);
    Json(ApiResponse::ok(changed)).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(None)?;
    init_logging(&config.log_level);

    println!("🌐 Temple Ledger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let source = SqliteSource::open(&config.database_path)?;
    let books = TempleBooks::load(&source);
    println!("✓ Database opened: {:?}", config.database_path);

    // Create shared state
    let state = AppState {
        books: Arc::new(Mutex::new(books)),
        db_path: config.database_path.clone(),
        rows_per_page: config.rows_per_page,
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/ledger", get(get_ledger))
        .route("/reports/tax", get(get_tax_report))
        .route("/reports/years", get(get_year_options))
        .route("/reports/:kind", get(get_report_table))
        .route("/export/:kind/print", get(export_print))
        .route("/export/:kind/spreadsheet", get(export_spreadsheet))
        .route("/export/:kind/pdf", get(export_pdf))
        .route("/refresh", post(refresh))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = std::env::var("TEMPLE_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
