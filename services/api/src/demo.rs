use crate::calculators::print_summary;
use chrono::{Local, NaiveDate};
use clap::Args;
use loan_contract::error::AppError;
use loan_contract::workflows::archive::ArchiveExporter;
use loan_contract::workflows::contract::domain::{Branch, ContractForm, Person};
use loan_contract::workflows::contract::{
    prepare_submission, AmortizationRequest, FieldWrite, FormDiff, PersonList, RepaymentMethod,
    SubmissionContext, Synchronizer,
};
use loan_contract::workflows::roster::{BranchDirectory, CustomerRoster, RosterImporter};
use rust_decimal::Decimal;
use std::path::PathBuf;

const DEMO_RATE_PERCENT: Decimal = Decimal::from_parts(435, 0, 0, false, 2);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the session date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Maturing-customer roster (CSV) to prefill from.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Branch directory (JSON) used to resolve roster branches.
    #[arg(long)]
    pub(crate) branches: Option<PathBuf>,
    /// Identifier of the roster customer to use (defaults to the first record).
    #[arg(long)]
    pub(crate) id_card: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let sync = Synchronizer::new(today);

    println!("Loan contract form demo ({today})");

    let (mut form, diff) = match args.roster.as_ref() {
        Some(path) => {
            let roster = RosterImporter::from_path(path)?;
            let branches = match args.branches.as_ref() {
                Some(path) => BranchDirectory::from_path(path)?,
                None => Vec::new(),
            };
            prefill_from_roster(&roster, &branches, args.id_card.as_deref())
        }
        None => sample_form(),
    };

    let writes = sync.reconcile(&diff, &form);
    render_writes("Initial reconciliation", &writes);
    form.apply_writes(&writes);

    let writes = sync.toggle_mirroring(&form, false);
    render_writes("Spouse mirroring disabled", &writes);
    form.apply_writes(&writes);

    let writes = sync.toggle_mirroring(&form, true);
    render_writes("Spouse mirroring re-enabled", &writes);
    form.apply_writes(&writes);

    if form.loan.amount.is_zero() {
        form.loan.amount = Decimal::from(300_000);
    }
    form.loan.start_date.get_or_insert(today);
    form.loan.term_months.get_or_insert(36);
    let writes = sync.reconcile(&FormDiff::default().with_schedule_change(), &form);
    render_writes("Schedule entered", &writes);
    form.apply_writes(&writes);

    println!("\nRepayment comparison at {DEMO_RATE_PERCENT}% per year");
    let term_months = form.loan.term_months.unwrap_or(36);
    for method in [
        RepaymentMethod::EqualInstallment,
        RepaymentMethod::EqualPrincipal,
        RepaymentMethod::InterestOnly,
        RepaymentMethod::Bullet,
    ] {
        let request = AmortizationRequest {
            principal: form.loan.amount,
            term_months,
            annual_rate_percent: DEMO_RATE_PERCENT,
            method,
        };
        print_summary(&request, &request.summarize()?);
    }

    let context = prepare_submission(&form, today)?;
    render_submission(&context);
    println!(
        "\nArchive file: {}",
        ArchiveExporter::file_name(&form, today)
    );

    Ok(())
}

fn sample_form() -> (ContractForm, FormDiff) {
    let mut form = ContractForm::default();
    form.main_borrower = Person::named("张三");
    form.main_borrower.id_card = "110101199003070017".to_string();
    form.main_borrower.address = "北京市东城区和平里一号".to_string();

    let mut spouse = Person::named("李四");
    spouse.id_card = "110101199205120026".to_string();
    form.spouse = Some(spouse);

    let mut guarantor = Person::named("王五");
    guarantor.id_card = "110101198001010011".to_string();
    form.guarantors.push(guarantor);

    let diff = FormDiff::default()
        .with_principal(["name", "id_card", "address"])
        .with_spouse(["name", "id_card"])
        .with_list_entry(PersonList::Guarantors, 0, ["name", "id_card"]);
    (form, diff)
}

fn prefill_from_roster(
    roster: &CustomerRoster,
    branches: &[Branch],
    id_card: Option<&str>,
) -> (ContractForm, FormDiff) {
    let record = match id_card {
        Some(id_card) => roster.find_by_id_card(id_card),
        None => roster.records().first(),
    };

    match record {
        Some(record) => {
            println!("Prefilling from roster record for {}", record.main.name);
            let mut form = ContractForm::default();
            let diff = record.prefill(&mut form, branches);
            (form, diff)
        }
        None => {
            println!("No matching roster record; using the sample customer");
            sample_form()
        }
    }
}

fn render_writes(heading: &str, writes: &[FieldWrite]) {
    println!("\n{heading}: {} write(s)", writes.len());
    for write in writes {
        let view = write.to_view();
        println!("  - {} = {}", view.path, view.value);
    }
}

fn render_submission(context: &SubmissionContext) {
    println!("\nSubmission labels");
    println!("- 客户类型: {}", context.customer_type_label);
    println!("- 贷款类型: {}", context.loan_type_label);
    println!("- 贷款金额: {}", context.amount_label);
    println!("- 起始日期: {}", context.start_date_label);
    println!("- 到期日期: {}", context.maturity_date_label);
    println!("- 婚姻状况: {}", context.marital_status);
    for collateral in &context.collaterals {
        println!(
            "- 抵押物 {}: {} ({})",
            collateral.index, collateral.collateral.kind, collateral.value_label
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_customer_reconciles_with_spouse_mirrored() {
        let sync = Synchronizer::new(NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"));
        let (mut form, diff) = sample_form();
        let writes = sync.reconcile(&diff, &form);
        form.apply_writes(&writes);

        assert_eq!(form.synthetic_position(), Some(0));
        assert_eq!(
            form.spouse.as_ref().map(|spouse| spouse.address.as_str()),
            Some("北京市东城区和平里一号")
        );
        assert!(form.guarantors[0].demographics.is_some());
    }

    #[test]
    fn demo_runs_against_the_sample_customer() {
        let result = run_demo(DemoArgs {
            today: NaiveDate::from_ymd_opt(2026, 10, 18),
            ..DemoArgs::default()
        });
        assert!(result.is_ok());
    }
}
