use chrono::NaiveDate;
use loan_contract::config::{AppConfig, DataSources, LoanDefaults};
use loan_contract::error::AppError;
use loan_contract::workflows::contract::domain::Branch;
use loan_contract::workflows::contract::RepaymentMethod;
use loan_contract::workflows::roster::{
    BranchDirectory, CustomerRoster, FormOptions, RosterImporter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) reference: Arc<ReferenceData>,
    pub(crate) loan_defaults: LoanDefaults,
    pub(crate) mirror_spouse: bool,
}

impl AppState {
    pub(crate) fn new(config: &AppConfig, metrics: PrometheusHandle, reference: ReferenceData) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(metrics),
            reference: Arc::new(reference),
            loan_defaults: config.loan.clone(),
            mirror_spouse: config.form.mirror_spouse,
        }
    }
}

/// Branch directory, maturing-customer roster and form option lists, read once
/// at startup.
#[derive(Debug, Default)]
pub(crate) struct ReferenceData {
    pub(crate) branches: Vec<Branch>,
    pub(crate) roster: CustomerRoster,
    pub(crate) options: FormOptions,
}

impl ReferenceData {
    pub(crate) fn load(sources: &DataSources) -> Result<Self, AppError> {
        let branches = match sources.branch_directory.as_ref() {
            Some(path) => BranchDirectory::from_path(path)?,
            None => Vec::new(),
        };
        let roster = match sources.customer_roster.as_ref() {
            Some(path) => RosterImporter::from_path(path)?,
            None => CustomerRoster::default(),
        };
        let options = match sources.form_options.as_ref() {
            Some(path) => FormOptions::from_path(path)?,
            None => FormOptions::default(),
        };

        info!(
            branches = branches.len(),
            customers = roster.len(),
            "reference data loaded"
        );
        Ok(Self {
            branches,
            roster,
            options,
        })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, String> {
    raw.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(|err| format!("failed to parse '{raw}' as an amount ({err})"))
}

pub(crate) fn parse_method(raw: &str) -> Result<RepaymentMethod, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string())).map_err(|_| {
        format!(
            "unknown repayment method '{raw}' (expected equal_installment, equal_principal, interest_only or bullet)"
        )
    })
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}
