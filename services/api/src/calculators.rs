use chrono::{Local, NaiveDate};
use clap::Args;
use loan_contract::config::{AppConfig, LoanDefaults};
use loan_contract::error::AppError;
use loan_contract::workflows::archive::{ArchiveExporter, ArchiveImportError, ArchiveImporter};
use loan_contract::workflows::contract::domain::ContractForm;
use loan_contract::workflows::contract::{
    amount, identity, maturity, AmortizationRequest, AmortizationSummary, Installment,
    RepaymentMethod,
};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub(crate) struct AmortizeArgs {
    /// Principal in yuan (defaults to LOAN_DEFAULT_PRINCIPAL)
    #[arg(long, value_parser = crate::infra::parse_amount)]
    pub(crate) principal: Option<Decimal>,
    /// Term in months (defaults to LOAN_DEFAULT_TERM_MONTHS)
    #[arg(long)]
    pub(crate) term: Option<u32>,
    /// Annual rate in percent (defaults to LOAN_DEFAULT_ANNUAL_RATE)
    #[arg(long, value_parser = crate::infra::parse_amount)]
    pub(crate) rate: Option<Decimal>,
    /// equal_installment, equal_principal, interest_only or bullet
    #[arg(long, value_parser = crate::infra::parse_method)]
    pub(crate) method: Option<RepaymentMethod>,
    /// Print every installment
    #[arg(long)]
    pub(crate) schedule: bool,
}

#[derive(Args, Debug)]
pub(crate) struct MaturityArgs {
    /// Loan start date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: NaiveDate,
    /// Term in months
    #[arg(long)]
    pub(crate) term: u32,
}

#[derive(Args, Debug)]
pub(crate) struct ArchiveExportArgs {
    /// Form snapshot as JSON
    #[arg(long)]
    pub(crate) form: PathBuf,
    /// Directory for the archive file (defaults to the current directory)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Archive date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) generated_on: Option<NaiveDate>,
}

pub(crate) fn run_identity(id_card: &str, today: Option<NaiveDate>) -> Result<(), AppError> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let facts = identity::extract(id_card.trim(), today)
        .ok_or_else(|| AppError::InvalidIdentifier(id_card.trim().to_string()))?;

    println!("Identifier {}", id_card.trim());
    println!("- 出生日期: {}", facts.birth_date.format("%Y-%m-%d"));
    println!("- 性别: {}", facts.gender.label());
    println!("- 年龄: {} (as of {})", facts.age, today);
    Ok(())
}

pub(crate) fn run_amount(value: Decimal) -> Result<(), AppError> {
    println!("{} -> {}", value, amount::label(value)?);
    Ok(())
}

pub(crate) fn resolve_request(args: &AmortizeArgs, defaults: &LoanDefaults) -> AmortizationRequest {
    AmortizationRequest {
        principal: args.principal.unwrap_or(defaults.principal),
        term_months: args.term.unwrap_or(defaults.term_months),
        annual_rate_percent: args.rate.unwrap_or(defaults.annual_rate_percent),
        method: args.method.unwrap_or(RepaymentMethod::EqualInstallment),
    }
}

pub(crate) fn run_amortize(args: AmortizeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let request = resolve_request(&args, &config.loan);
    let summary = request.summarize()?;

    print_summary(&request, &summary);
    if args.schedule {
        print_schedule(&request.schedule()?);
    }
    Ok(())
}

pub(crate) fn print_summary(request: &AmortizationRequest, summary: &AmortizationSummary) {
    println!(
        "{} | principal {} | {} months | {}% per year",
        request.method.label(),
        request.principal,
        request.term_months,
        request.annual_rate_percent
    );
    println!("- {}", summary.description);
    match summary.per_period_decrement {
        Some(decrement) => println!(
            "- first payment {} | last payment {} | decreasing by {} per month",
            summary.first_payment, summary.last_payment, decrement
        ),
        None => println!(
            "- monthly payment {} | last payment {}",
            summary.monthly_payment, summary.last_payment
        ),
    }
    println!(
        "- total interest {} | total repayment {}",
        summary.total_interest, summary.total_repayment
    );
}

fn print_schedule(schedule: &[Installment]) {
    println!("{:>6} {:>14} {:>14} {:>12} {:>14}", "期数", "月供", "本金", "利息", "剩余本金");
    for row in schedule {
        println!(
            "{:>6} {:>14} {:>14} {:>12} {:>14}",
            row.period, row.payment, row.principal, row.interest, row.remaining
        );
    }
}

pub(crate) fn run_maturity(args: MaturityArgs) -> Result<(), AppError> {
    let date = maturity::maturity_date(args.start, args.term)?;
    println!(
        "{} + {} months -> {}",
        args.start,
        args.term,
        maturity::format_long(date)
    );
    Ok(())
}

pub(crate) fn run_archive_export(args: ArchiveExportArgs) -> Result<(), AppError> {
    let snapshot = std::fs::read_to_string(&args.form)?;
    let form: ContractForm =
        serde_json::from_str(&snapshot).map_err(ArchiveImportError::from)?;
    let generated_on = args
        .generated_on
        .unwrap_or_else(|| Local::now().date_naive());

    let text = ArchiveExporter::render(&form, generated_on)?;
    let target = args
        .output
        .unwrap_or_default()
        .join(ArchiveExporter::file_name(&form, generated_on));
    std::fs::write(&target, text)?;

    println!("Archive written to {}", target.display());
    Ok(())
}

pub(crate) fn run_archive_import(path: &Path) -> Result<(), AppError> {
    let form = ArchiveImporter::from_path(path)?;
    let rendered = serde_json::to_string_pretty(&form).map_err(ArchiveImportError::from)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn calculator_flags_override_configured_defaults() {
        let defaults = LoanDefaults {
            principal: dec!(100000),
            term_months: 12,
            annual_rate_percent: dec!(4.35),
        };

        let request = resolve_request(
            &AmortizeArgs {
                term: Some(24),
                method: Some(RepaymentMethod::EqualPrincipal),
                ..AmortizeArgs::default()
            },
            &defaults,
        );
        assert_eq!(request.principal, dec!(100000));
        assert_eq!(request.term_months, 24);
        assert_eq!(request.annual_rate_percent, dec!(4.35));
        assert_eq!(request.method, RepaymentMethod::EqualPrincipal);
    }

    #[test]
    fn archive_commands_write_and_read_files() {
        let dir = std::env::temp_dir().join(format!("loan-contract-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");

        let mut form = ContractForm::default();
        form.main_borrower.name = "张三".to_string();
        form.loan.amount = dec!(80000);
        let form_path = dir.join("form.json");
        std::fs::write(&form_path, serde_json::to_string(&form).expect("form encodes"))
            .expect("form written");

        run_archive_export(ArchiveExportArgs {
            form: form_path,
            output: Some(dir.clone()),
            generated_on: NaiveDate::from_ymd_opt(2026, 10, 18),
        })
        .expect("archive exported");

        let archive = dir.join("张三_数据存档_20261018.txt");
        let restored = ArchiveImporter::from_path(&archive).expect("archive imports");
        assert_eq!(restored, form);
        assert!(run_archive_import(&archive).is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }
}
