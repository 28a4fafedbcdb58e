use crate::workflows::contract::amount::{self, AmountLabelError};
use crate::workflows::contract::domain::{ContractForm, CustomerType, LoanType, Person};
use chrono::NaiveDate;

pub(crate) const RULE_WIDTH: usize = 40;
pub(crate) const MACHINE_SECTION_BANNER: &str = "⚠️ 以下内容为系统自动读取数据，请勿修改 ⚠️";

/// Human readable part of an archive, meant for copying into other systems.
pub(crate) fn summary_lines(
    form: &ContractForm,
    generated_on: NaiveDate,
) -> Result<Vec<String>, AmountLabelError> {
    let mut lines = Vec::new();
    let (branch_name, branch_short) = form
        .branch
        .as_ref()
        .map(|branch| (branch.name.as_str(), branch.short_name.as_str()))
        .unwrap_or_default();
    let loan_type = match form.loan_type {
        LoanType::Credit => LoanType::Credit.label(),
        LoanType::Guarantee | LoanType::Mortgage => "担保/抵押",
    };
    let term = form
        .loan
        .term_months
        .map(|months| months.to_string())
        .unwrap_or_default();

    lines.push(format!(
        "====== 业务录入辅助报告 ({}) ======",
        generated_on.format("%Y-%m-%d")
    ));
    lines.push(format!("办理支行：{branch_name} ({branch_short})"));
    lines.push(format!(
        "客户类型：{} ({loan_type})",
        form.customer_type.label()
    ));
    lines.push(format!(
        "贷款金额：{} 元 ({})",
        form.loan.amount,
        amount::label(form.loan.amount)?
    ));
    lines.push(format!("期限用途：{term}个月 | {}", form.loan.loan_use));
    lines.push(String::new());

    match (form.customer_type, form.enterprise.as_ref()) {
        (CustomerType::Enterprise, Some(enterprise)) => {
            lines.push(format!("【企业】 {}", enterprise.name));
            lines.push(format!(
                "代码：{} | 法人：{}",
                enterprise.credit_code, enterprise.legal_rep
            ));
            lines.push(format!("地址：{}", enterprise.address));
        }
        (CustomerType::Enterprise, None) => {}
        (CustomerType::Personal, _) => {
            let principal = &form.main_borrower;
            let marital = if form.has_named_spouse() {
                "已婚"
            } else {
                "未婚"
            };
            lines.push(format!(
                "【主借款人】 {} ({}岁 | {marital})",
                principal.name,
                principal.age_label()
            ));
            lines.push(format!("证件：{}", principal.id_card));
            lines.push(format!("电话：{}", principal.mobile));
            lines.push(format!("地址：{}", principal.address));
            lines.push(format!(
                "画像：{} | {} | {} | {} | {}",
                principal.gender_label(),
                principal.birth_date_label(),
                principal.ethnicity,
                principal.education,
                principal.occupation
            ));
            if let Some(spouse) = form.spouse.as_ref() {
                lines.push(format!(
                    ">>> 配偶：{} ({}岁) | {} | {}",
                    spouse.name,
                    spouse.age_label(),
                    spouse.id_card,
                    spouse.mobile
                ));
                lines.push(format!("    详情：{}", detail(spouse)));
            }
        }
    }

    if !form.collaterals.is_empty() {
        lines.push(String::new());
        lines.push(format!("【抵押物 ({})】", form.collaterals.len()));
        for (index, collateral) in form.collaterals.iter().enumerate() {
            lines.push(format!(
                "{}. {} | {} | {} | 价值:{} ({})",
                index + 1,
                collateral.owner,
                collateral.kind,
                collateral.location,
                collateral.value,
                amount::label(collateral.value)?
            ));
            lines.push(format!(
                "   权证：{} | 建筑面积：{} | 土地面积：{}",
                collateral.cert_no, collateral.area, collateral.land_area
            ));
        }
    }

    push_people(&mut lines, "担保人", &form.guarantors);
    push_people(&mut lines, "共同借款人", &form.joint_borrowers);

    Ok(lines)
}

fn push_people(lines: &mut Vec<String>, heading: &str, people: &[Person]) {
    if people.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("【{heading} ({})】", people.len()));
    for (index, person) in people.iter().enumerate() {
        if person.is_company() {
            lines.push(format!(
                "{}. {} (企业) | {} | 法人：{} | {}",
                index + 1,
                person.name,
                person.id_card,
                person.legal_rep,
                person.mobile
            ));
            lines.push(format!("   地址：{}", person.address));
            continue;
        }
        lines.push(format!(
            "{}. {} ({}岁) | {} | {} | {}",
            index + 1,
            person.name,
            person.age_label(),
            person.id_card,
            person.mobile,
            person.relation
        ));
        lines.push(format!("   详情：{}", detail(person)));
        lines.push(format!("   地址：{}", person.address));
    }
}

fn detail(person: &Person) -> String {
    format!(
        "{} | {} | {} | {} | {}",
        person.gender_label(),
        person.birth_date_label(),
        person.occupation,
        person.ethnicity,
        person.education
    )
}

pub(crate) fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}
