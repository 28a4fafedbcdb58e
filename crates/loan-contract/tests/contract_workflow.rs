use chrono::NaiveDate;
use loan_contract::workflows::contract::domain::{ContractForm, Person};
use loan_contract::workflows::contract::{
    prepare_submission, AmortizationRequest, FormDiff, RepaymentMethod, Synchronizer,
};
use rust_decimal_macros::dec;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid session date")
}

fn edit(form: &mut ContractForm, changes: serde_json::Value) -> usize {
    let writes = Synchronizer::new(today()).reconcile(&FormDiff::from_changes(&changes), form);
    form.apply_writes(&writes)
}

#[test]
fn editing_session_keeps_derived_fields_consistent() {
    let sync = Synchronizer::new(today());
    let mut form = ContractForm::default();
    form.main_borrower = Person::named("张三");
    form.main_borrower.id_card = "110101199003070017".to_string();
    assert_eq!(edit(&mut form, json!({"main_borrower": {"id_card": "110101199003070017"}})), 1);

    let writes = sync.toggle_spouse(&form, true);
    form.apply_writes(&writes);
    assert!(form.joint_borrowers.is_empty());

    form.joint_borrowers.push(Person::named("共借人"));
    if let Some(spouse) = form.spouse.as_mut() {
        spouse.name = "李四".to_string();
        spouse.id_card = "110101199205120026".to_string();
    }
    edit(&mut form, json!({"spouse": {"name": "李四", "id_card": "110101199205120026"}}));
    assert_eq!(form.joint_borrowers.len(), 2);
    assert!(form.joint_borrowers[0].synthetic);
    assert!(form.joint_borrowers[0].demographics.is_some());

    let writes = sync.toggle_mirroring(&form, false);
    form.apply_writes(&writes);
    assert_eq!(form.joint_borrowers.len(), 1);
    assert_eq!(form.joint_borrowers[0].name, "共借人");

    let writes = sync.toggle_mirroring(&form, true);
    form.apply_writes(&writes);
    assert_eq!(form.synthetic_position(), Some(0));

    form.loan.amount = dec!(300000);
    form.loan.start_date = NaiveDate::from_ymd_opt(2024, 1, 31);
    form.loan.term_months = Some(1);
    edit(&mut form, json!({"loan": {"start_date": "2024-01-31", "term_months": 1}}));
    assert_eq!(form.loan.maturity_date, NaiveDate::from_ymd_opt(2024, 2, 28));

    form.loan.term_months = Some(36);
    edit(&mut form, json!({"loan": {"term_months": 36}}));
    assert_eq!(form.loan.maturity_date, NaiveDate::from_ymd_opt(2027, 1, 30));

    assert_eq!(edit(&mut form, json!({})), 0);

    let context = prepare_submission(&form, today()).expect("submission prepares");
    assert_eq!(context.amount_label, "叁拾万元整");
    assert_eq!(context.marital_status, "已婚");
    assert_eq!(context.maturity_date_label, "2027年01月30日");
}

#[test]
fn calculator_starts_from_the_form_amount_and_term() {
    let mut form = ContractForm::default();
    form.loan.amount = dec!(120000);
    form.loan.term_months = Some(12);

    let request = AmortizationRequest {
        principal: form.loan.amount,
        term_months: form.loan.term_months.unwrap_or(12),
        annual_rate_percent: dec!(4.35),
        method: RepaymentMethod::EqualPrincipal,
    };
    let summary = request.summarize().expect("valid calculator input");
    assert_eq!(summary.first_payment, dec!(10435.00));
    assert_eq!(summary.total_repayment, dec!(122827.50));

    let schedule = request.schedule().expect("valid calculator input");
    let paid: rust_decimal::Decimal = schedule.iter().map(|row| row.payment).sum();
    assert_eq!(paid, summary.total_repayment);
}
