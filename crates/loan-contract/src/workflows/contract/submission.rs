use super::amount::{self, AmountLabelError};
use super::domain::{Collateral, ContractForm, CustomerType, Person};
use super::identity;
use super::maturity;
use chrono::NaiveDate;
use serde::Serialize;

const AREA_UNIT: &str = "平方米";
const MARRIED: &str = "已婚";
const UNMARRIED: &str = "未婚";
const FALLBACK_PREFIX: &str = "客户";

#[derive(Debug, Clone, Serialize)]
pub struct CollateralView {
    pub index: usize,
    #[serde(flatten)]
    pub collateral: Collateral,
    pub value_label: String,
}

/// Snapshot plus every derived field handed to document assembly.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionContext {
    pub form: ContractForm,
    pub customer_type_label: &'static str,
    pub loan_type_label: &'static str,
    pub amount_label: String,
    pub start_date_label: String,
    pub maturity_date_label: String,
    pub marital_status: &'static str,
    pub collaterals: Vec<CollateralView>,
    pub file_prefix: String,
}

pub fn prepare_submission(
    form: &ContractForm,
    today: NaiveDate,
) -> Result<SubmissionContext, AmountLabelError> {
    let mut form = form.clone();

    refresh_demographics(&mut form.main_borrower, today);
    if let Some(spouse) = form.spouse.as_mut() {
        refresh_demographics(spouse, today);
    }
    for person in form.joint_borrowers.iter_mut().chain(form.guarantors.iter_mut()) {
        refresh_demographics(person, today);
    }

    if form.loan.maturity_date.is_none() {
        if let (Some(start), Some(term)) = (form.loan.start_date, form.loan.term_months) {
            form.loan.maturity_date = maturity::maturity_date(start, term).ok();
        }
    }

    for collateral in &mut form.collaterals {
        collateral.area = with_area_unit(&collateral.area);
        collateral.land_area = with_area_unit(&collateral.land_area);
    }

    let collaterals = form
        .collaterals
        .iter()
        .enumerate()
        .map(|(index, collateral)| {
            Ok(CollateralView {
                index: index + 1,
                collateral: collateral.clone(),
                value_label: amount::label(collateral.value)?,
            })
        })
        .collect::<Result<Vec<_>, AmountLabelError>>()?;

    let marital_status = if form.has_named_spouse() {
        MARRIED
    } else {
        UNMARRIED
    };

    Ok(SubmissionContext {
        customer_type_label: form.customer_type.label(),
        loan_type_label: form.loan_type.label(),
        amount_label: amount::label(form.loan.amount)?,
        start_date_label: form
            .loan
            .start_date
            .map(maturity::format_long)
            .unwrap_or_default(),
        maturity_date_label: form
            .loan
            .maturity_date
            .map(maturity::format_long)
            .unwrap_or_default(),
        marital_status,
        collaterals,
        file_prefix: file_prefix(&form),
        form,
    })
}

/// Name used to prefix generated files: the company for enterprise customers,
/// otherwise the principal borrower.
pub fn file_prefix(form: &ContractForm) -> String {
    let name = match form.customer_type {
        CustomerType::Enterprise => form.enterprise.as_ref().map(|e| e.name.trim()),
        CustomerType::Personal => Some(form.main_borrower.name.trim()),
    };
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => FALLBACK_PREFIX.to_string(),
    }
}

fn refresh_demographics(person: &mut Person, today: NaiveDate) {
    if let Some(facts) = identity::extract(&person.id_card, today) {
        person.demographics = Some(facts);
    }
}

fn with_area_unit(area: &str) -> String {
    let area = area.trim();
    if area.is_empty() || area.contains(AREA_UNIT) {
        area.to_string()
    } else {
        format!("{area}{AREA_UNIT}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::contract::domain::{DemographicFacts, Enterprise, Gender, LoanType};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
    }

    fn form() -> ContractForm {
        let mut form = ContractForm::default();
        form.main_borrower = Person::named("张三");
        form.main_borrower.id_card = "110101199003070017".to_string();
        form.loan.amount = dec!(100000);
        form.loan.start_date = NaiveDate::from_ymd_opt(2024, 3, 15);
        form.loan.term_months = Some(12);
        form
    }

    #[test]
    fn derives_labels_dates_and_demographics() {
        let context = prepare_submission(&form(), today()).expect("labellable amounts");
        assert_eq!(context.amount_label, "壹拾万元整");
        assert_eq!(context.start_date_label, "2024年03月15日");
        assert_eq!(context.maturity_date_label, "2025年03月14日");
        assert_eq!(context.loan_type_label, "担保");
        assert_eq!(context.marital_status, "未婚");
        assert_eq!(context.file_prefix, "张三");
        assert_eq!(
            context.form.main_borrower.demographics.map(|facts| facts.age),
            Some(36)
        );
    }

    #[test]
    fn unparseable_identifiers_keep_stored_demographics() {
        let mut form = form();
        let stored = DemographicFacts {
            birth_date: NaiveDate::from_ymd_opt(1980, 1, 1).expect("valid date"),
            gender: Gender::Female,
            age: 46,
        };
        let mut guarantor = Person::named("王五");
        guarantor.id_card = "unknown".to_string();
        guarantor.demographics = Some(stored);
        form.guarantors.push(guarantor);

        let context = prepare_submission(&form, today()).expect("labellable amounts");
        assert_eq!(context.form.guarantors[0].demographics, Some(stored));
    }

    #[test]
    fn collateral_areas_gain_the_unit_once_and_values_are_labelled() {
        let mut form = form();
        form.loan_type = LoanType::Mortgage;
        form.collaterals.push(Collateral {
            area: "120.5".to_string(),
            land_area: "30平方米".to_string(),
            value: dec!(1500000),
            ..Collateral::default()
        });

        let context = prepare_submission(&form, today()).expect("labellable amounts");
        let view = &context.collaterals[0];
        assert_eq!(view.index, 1);
        assert_eq!(view.collateral.area, "120.5平方米");
        assert_eq!(view.collateral.land_area, "30平方米");
        assert_eq!(view.value_label, "壹佰伍拾万元整");
        assert_eq!(context.loan_type_label, "抵押");
    }

    #[test]
    fn marital_status_requires_a_named_spouse() {
        let mut form = form();
        form.spouse = Some(Person::default());
        let context = prepare_submission(&form, today()).expect("labellable amounts");
        assert_eq!(context.marital_status, "未婚");

        form.spouse = Some(Person::named("李四"));
        let context = prepare_submission(&form, today()).expect("labellable amounts");
        assert_eq!(context.marital_status, "已婚");
    }

    #[test]
    fn enterprise_customers_use_the_company_as_prefix() {
        let mut form = form();
        form.customer_type = CustomerType::Enterprise;
        assert_eq!(file_prefix(&form), "客户");
        form.enterprise = Some(Enterprise {
            name: "某某有限公司".to_string(),
            ..Enterprise::default()
        });
        assert_eq!(file_prefix(&form), "某某有限公司");
    }

    #[test]
    fn negative_amount_is_reported() {
        let mut form = form();
        form.loan.amount = dec!(-5);
        assert!(prepare_submission(&form, today()).is_err());
    }
}
