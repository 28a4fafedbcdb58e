use crate::infra::{deserialize_date, deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use loan_contract::error::AppError;
use loan_contract::workflows::archive::{ArchiveExporter, ArchiveImporter};
use loan_contract::workflows::contract::domain::{Branch, ContractForm, DemographicFacts};
use loan_contract::workflows::contract::{
    amount, identity, maturity, prepare_submission, AmortizationRequest, AmortizationSummary,
    FieldWrite, FieldWriteView, FormDiff, Installment, RepaymentMethod, SubmissionContext,
    Synchronizer,
};
use loan_contract::workflows::roster::{CustomerRecord, FormOptions};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::Ordering;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/identity", post(identity_endpoint))
        .route("/api/v1/amount/label", post(amount_label_endpoint))
        .route("/api/v1/loan/amortization", post(amortization_endpoint))
        .route("/api/v1/loan/maturity", post(maturity_endpoint))
        .route("/api/v1/form/defaults", get(form_defaults_endpoint))
        .route("/api/v1/form/options", get(form_options_endpoint))
        .route("/api/v1/form/reconcile", post(reconcile_endpoint))
        .route("/api/v1/form/submission", post(submission_endpoint))
        .route("/api/v1/archive/export", post(archive_export_endpoint))
        .route("/api/v1/archive/import", post(archive_import_endpoint))
        .route("/api/v1/branches", get(branches_endpoint))
        .route("/api/v1/customers", get(customers_endpoint))
        .route("/api/v1/customers/prefill", post(customer_prefill_endpoint))
        .layer(Extension(state))
}

fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdentityRequest {
    pub(crate) id_card: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdentityResponse {
    pub(crate) id_card: String,
    #[serde(flatten)]
    pub(crate) facts: DemographicFacts,
    pub(crate) gender_label: &'static str,
}

pub(crate) async fn identity_endpoint(
    Json(payload): Json<IdentityRequest>,
) -> Result<Json<IdentityResponse>, AppError> {
    let id_card = payload.id_card.trim().to_string();
    let facts = identity::extract(&id_card, resolve_today(payload.today))
        .ok_or_else(|| AppError::InvalidIdentifier(id_card.clone()))?;

    Ok(Json(IdentityResponse {
        gender_label: facts.gender.label(),
        id_card,
        facts,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct AmountLabelRequest {
    pub(crate) amount: Decimal,
}

#[derive(Debug, Serialize)]
pub(crate) struct AmountLabelResponse {
    pub(crate) amount: Decimal,
    pub(crate) label: String,
}

pub(crate) async fn amount_label_endpoint(
    Json(payload): Json<AmountLabelRequest>,
) -> Result<Json<AmountLabelResponse>, AppError> {
    let label = amount::label(payload.amount)?;
    Ok(Json(AmountLabelResponse {
        amount: payload.amount,
        label,
    }))
}

/// Missing fields fall back to the configured calculator defaults.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AmortizationPayload {
    #[serde(default)]
    pub(crate) principal: Option<Decimal>,
    #[serde(default)]
    pub(crate) term_months: Option<u32>,
    #[serde(default)]
    pub(crate) annual_rate_percent: Option<Decimal>,
    #[serde(default)]
    pub(crate) method: Option<RepaymentMethod>,
    #[serde(default)]
    pub(crate) include_schedule: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AmortizationResponse {
    pub(crate) principal: Decimal,
    pub(crate) term_months: u32,
    pub(crate) annual_rate_percent: Decimal,
    pub(crate) method_label: &'static str,
    pub(crate) summary: AmortizationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) schedule: Option<Vec<Installment>>,
}

pub(crate) async fn amortization_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AmortizationPayload>,
) -> Result<Json<AmortizationResponse>, AppError> {
    let defaults = &state.loan_defaults;
    let request = AmortizationRequest {
        principal: payload.principal.unwrap_or(defaults.principal),
        term_months: payload.term_months.unwrap_or(defaults.term_months),
        annual_rate_percent: payload
            .annual_rate_percent
            .unwrap_or(defaults.annual_rate_percent),
        method: payload.method.unwrap_or(RepaymentMethod::EqualInstallment),
    };

    let summary = request.summarize()?;
    let schedule = if payload.include_schedule {
        Some(request.schedule()?)
    } else {
        None
    };

    Ok(Json(AmortizationResponse {
        principal: request.principal,
        term_months: request.term_months,
        annual_rate_percent: request.annual_rate_percent,
        method_label: request.method.label(),
        summary,
        schedule,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaturityRequest {
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) start_date: NaiveDate,
    pub(crate) term_months: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaturityResponse {
    pub(crate) start_date: NaiveDate,
    pub(crate) term_months: u32,
    pub(crate) maturity_date: NaiveDate,
    pub(crate) maturity_label: String,
}

pub(crate) async fn maturity_endpoint(
    Json(payload): Json<MaturityRequest>,
) -> Result<Json<MaturityResponse>, AppError> {
    let maturity_date = maturity::maturity_date(payload.start_date, payload.term_months)?;
    Ok(Json(MaturityResponse {
        start_date: payload.start_date,
        term_months: payload.term_months,
        maturity_date,
        maturity_label: maturity::format_long(maturity_date),
    }))
}

pub(crate) async fn form_defaults_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<ContractForm> {
    let mut form = ContractForm::default();
    form.mirror_spouse = state.mirror_spouse;
    form.loan.amount = state.loan_defaults.principal;
    form.loan.term_months = Some(state.loan_defaults.term_months);
    Json(form)
}

pub(crate) async fn form_options_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<FormOptions> {
    Json(state.reference.options.clone())
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub(crate) enum FormCommand {
    ToggleSpouse { present: bool },
    ToggleMirroring { enabled: bool },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReconcileRequest {
    pub(crate) form: ContractForm,
    #[serde(default)]
    pub(crate) changes: serde_json::Value,
    #[serde(default)]
    pub(crate) command: Option<FormCommand>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReconcileResponse {
    pub(crate) writes: Vec<FieldWriteView>,
    pub(crate) form: ContractForm,
}

impl ReconcileResponse {
    fn applied(mut form: ContractForm, writes: Vec<FieldWrite>) -> Self {
        form.apply_writes(&writes);
        Self {
            writes: writes.iter().map(FieldWrite::to_view).collect(),
            form,
        }
    }
}

pub(crate) async fn reconcile_endpoint(
    Json(payload): Json<ReconcileRequest>,
) -> Json<ReconcileResponse> {
    let sync = Synchronizer::new(resolve_today(payload.today));
    let writes = match payload.command {
        Some(FormCommand::ToggleSpouse { present }) => sync.toggle_spouse(&payload.form, present),
        Some(FormCommand::ToggleMirroring { enabled }) => {
            sync.toggle_mirroring(&payload.form, enabled)
        }
        None => sync.reconcile(&FormDiff::from_changes(&payload.changes), &payload.form),
    };

    Json(ReconcileResponse::applied(payload.form, writes))
}

#[derive(Debug, Deserialize)]
pub(crate) struct FormRequest {
    pub(crate) form: ContractForm,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn submission_endpoint(
    Json(payload): Json<FormRequest>,
) -> Result<Json<SubmissionContext>, AppError> {
    let context = prepare_submission(&payload.form, resolve_today(payload.today))?;
    Ok(Json(context))
}

#[derive(Debug, Serialize)]
pub(crate) struct ArchiveExportResponse {
    pub(crate) file_name: String,
    pub(crate) content: String,
}

pub(crate) async fn archive_export_endpoint(
    Json(payload): Json<FormRequest>,
) -> Result<Json<ArchiveExportResponse>, AppError> {
    let generated_on = resolve_today(payload.today);
    let content = ArchiveExporter::render(&payload.form, generated_on)?;
    Ok(Json(ArchiveExportResponse {
        file_name: ArchiveExporter::file_name(&payload.form, generated_on),
        content,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveImportRequest {
    pub(crate) content: String,
}

pub(crate) async fn archive_import_endpoint(
    Json(payload): Json<ArchiveImportRequest>,
) -> Result<Json<ContractForm>, AppError> {
    let form = ArchiveImporter::from_text(&payload.content)?;
    Ok(Json(form))
}

pub(crate) async fn branches_endpoint(Extension(state): Extension<AppState>) -> Json<Vec<Branch>> {
    Json(state.reference.branches.clone())
}

pub(crate) async fn customers_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<CustomerRecord>> {
    Json(state.reference.roster.records().to_vec())
}

#[derive(Debug, Deserialize)]
pub(crate) struct PrefillRequest {
    pub(crate) id_card: String,
    #[serde(default)]
    pub(crate) form: Option<ContractForm>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn customer_prefill_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PrefillRequest>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let record = state
        .reference
        .roster
        .find_by_id_card(&payload.id_card)
        .ok_or_else(|| AppError::CustomerNotFound(payload.id_card.trim().to_string()))?;

    let mut form = payload.form.unwrap_or_else(|| ContractForm {
        mirror_spouse: state.mirror_spouse,
        ..ContractForm::default()
    });
    let diff = record.prefill(&mut form, &state.reference.branches);
    let writes = Synchronizer::new(resolve_today(payload.today)).reconcile(&diff, &form);

    Ok(Json(ReconcileResponse::applied(form, writes)))
}
