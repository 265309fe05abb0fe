use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::data::filter::{self, FilterCriteria};
use crate::data::loader;
use crate::data::model::{format_timestamp, VisitRecord};
use crate::data::summary::summarize;
use crate::export;
use crate::state::DatasetStore;

/// Rows per page served by `/data_page`.
pub const PER_PAGE: usize = 50;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<DatasetStore>,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/data_page", get(data_page))
        .route("/analytics_data", get(analytics_data))
        .route("/classes", get(classes))
        .route("/export_csv", get(export_csv))
        .route("/export_pdf", get(export_pdf))
        .with_state(ctx)
}

// ---------------------------------------------------------------------------
// Query parameters and wire shapes
// ---------------------------------------------------------------------------

/// Filter/paging parameters shared by the query and export endpoints.
/// `username` is the free-text search box; it also matches full names and
/// website addresses.
#[derive(Debug, Default, Deserialize)]
struct DataQuery {
    username: Option<String>,
    class: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<i64>,
}

impl DataQuery {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_text: self.username.clone(),
            class_name: self.class.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

/// One row as the table endpoint serves it: canonical column names as
/// keys, visit time in the fixed export pattern ("" for the sentinel).
fn record_json(rec: &VisitRecord) -> serde_json::Value {
    json!({
        "Username_TRNO": rec.username,
        "Student_FullName": rec.full_name,
        "Student_Class": rec.class_name,
        "Website_Address": rec.website,
        "Visits_to_Website": rec.visits_to_website,
        "Last_Visit_Time": format_timestamp(rec.last_visit_time),
        "Total_Visits": rec.total_visits,
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn attachment_response(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Accept a multipart CSV upload and publish it as the new dataset.
/// A schema failure leaves the previously published dataset untouched.
async fn upload(State(ctx): State<AppContext>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, axum::body::Bytes)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or("upload.csv").to_string();
                match field.bytes().await {
                    Ok(data) => {
                        file = Some((filename, data));
                        break;
                    }
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            &format!("Error reading upload: {e}"),
                        )
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("Bad upload request: {e}"))
            }
        }
    }

    let Some((filename, data)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    match loader::load_csv(data.as_ref()) {
        Ok(dataset) => {
            let rows = ctx.store.replace(dataset);
            log::info!("Loaded {rows} rows from '{filename}'");
            Json(json!({ "ok": true, "rows": rows, "filename": filename })).into_response()
        }
        Err(e) => {
            log::error!("Failed to process upload '{filename}': {e}");
            error_response(StatusCode::BAD_REQUEST, &format!("Error processing file: {e}"))
        }
    }
}

/// Filtered, paginated rows plus the summary of the whole filtered view.
async fn data_page(
    State(ctx): State<AppContext>,
    Query(params): Query<DataQuery>,
) -> Json<serde_json::Value> {
    let Some(dataset) = ctx.store.snapshot() else {
        return Json(json!({
            "data": [],
            "total": 0,
            "page_size": PER_PAGE,
            "summary": {},
        }));
    };

    let view = filter::apply(&dataset, &params.criteria());
    let rows: Vec<serde_json::Value> = view
        .page(params.page.unwrap_or(1), PER_PAGE)
        .iter()
        .map(|&i| record_json(&dataset.records[i]))
        .collect();
    let summary = summarize(&dataset, &view);

    Json(json!({
        "data": rows,
        "total": view.len(),
        "page_size": PER_PAGE,
        "summary": summary,
    }))
}

/// Summary of the filtered view, for the dashboard charts. Only the
/// search and class filters apply here.
async fn analytics_data(
    State(ctx): State<AppContext>,
    Query(params): Query<DataQuery>,
) -> Response {
    let Some(dataset) = ctx.store.snapshot() else {
        return Json(json!({})).into_response();
    };

    let criteria = FilterCriteria {
        search_text: params.username.clone(),
        class_name: params.class.clone(),
        ..FilterCriteria::default()
    };
    let view = filter::apply(&dataset, &criteria);
    Json(summarize(&dataset, &view)).into_response()
}

/// Sorted distinct class names, for the class filter dropdown.
async fn classes(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    let classes = ctx
        .store
        .snapshot()
        .map(|dataset| dataset.classes())
        .unwrap_or_default();
    Json(classes)
}

async fn export_csv(State(ctx): State<AppContext>, Query(params): Query<DataQuery>) -> Response {
    let Some(dataset) = ctx.store.snapshot() else {
        return error_response(StatusCode::NOT_FOUND, "No dataset loaded");
    };

    let view = filter::apply(&dataset, &params.criteria());
    match export::csv::write_csv(&dataset, &view) {
        Ok(bytes) => attachment_response("text/csv", "student_data.csv", bytes),
        Err(e) => {
            log::error!("CSV export failed: {e:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "CSV export failed")
        }
    }
}

async fn export_pdf(State(ctx): State<AppContext>, Query(params): Query<DataQuery>) -> Response {
    let Some(dataset) = ctx.store.snapshot() else {
        return error_response(StatusCode::NOT_FOUND, "No dataset loaded");
    };

    let view = filter::apply(&dataset, &params.criteria());
    let bytes = export::pdf::write_pdf(&dataset, &view);
    attachment_response("application/pdf", "student_data.pdf", bytes)
}
