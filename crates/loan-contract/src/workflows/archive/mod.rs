mod parser;
mod report;

use crate::workflows::contract::amount::AmountLabelError;
use crate::workflows::contract::domain::ContractForm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum ArchiveImportError {
    Io(std::io::Error),
    MissingPayload,
    Encoding(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ArchiveImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveImportError::Io(err) => write!(f, "failed to read archive: {}", err),
            ArchiveImportError::MissingPayload => {
                write!(f, "archive does not contain a system data block")
            }
            ArchiveImportError::Encoding(err) => {
                write!(f, "archive data block is not valid base64: {}", err)
            }
            ArchiveImportError::Utf8(err) => {
                write!(f, "archive data block is not valid UTF-8: {}", err)
            }
            ArchiveImportError::Json(err) => {
                write!(f, "archive data block is not a contract form: {}", err)
            }
        }
    }
}

impl std::error::Error for ArchiveImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveImportError::Io(err) => Some(err),
            ArchiveImportError::MissingPayload => None,
            ArchiveImportError::Encoding(err) => Some(err),
            ArchiveImportError::Utf8(err) => Some(err),
            ArchiveImportError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ArchiveImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<base64::DecodeError> for ArchiveImportError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Encoding(err)
    }
}

impl From<std::string::FromUtf8Error> for ArchiveImportError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Utf8(err)
    }
}

impl From<serde_json::Error> for ArchiveImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Debug)]
pub enum ArchiveExportError {
    AmountLabel(AmountLabelError),
    Json(serde_json::Error),
}

impl std::fmt::Display for ArchiveExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveExportError::AmountLabel(err) => {
                write!(f, "could not label archive amounts: {}", err)
            }
            ArchiveExportError::Json(err) => write!(f, "could not encode contract form: {}", err),
        }
    }
}

impl std::error::Error for ArchiveExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveExportError::AmountLabel(err) => Some(err),
            ArchiveExportError::Json(err) => Some(err),
        }
    }
}

impl From<AmountLabelError> for ArchiveExportError {
    fn from(err: AmountLabelError) -> Self {
        Self::AmountLabel(err)
    }
}

impl From<serde_json::Error> for ArchiveExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Reads the snapshot embedded in an archive text.
///
/// The snapshot comes back exactly as stored, synthetic flags and derived
/// demographics included.
pub struct ArchiveImporter;

impl ArchiveImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ContractForm, ArchiveImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<ContractForm, ArchiveImportError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<ContractForm, ArchiveImportError> {
        let payload = parser::extract_payload(text).ok_or(ArchiveImportError::MissingPayload)?;
        let bytes = STANDARD.decode(payload.as_bytes())?;
        let json = String::from_utf8(bytes)?;
        let form: ContractForm = serde_json::from_str(&json)?;

        info!(
            joint_borrowers = form.joint_borrowers.len(),
            guarantors = form.guarantors.len(),
            collaterals = form.collaterals.len(),
            "imported contract archive"
        );
        Ok(form)
    }
}

pub struct ArchiveExporter;

impl ArchiveExporter {
    /// Renders the report followed by the machine-readable data block.
    pub fn render(
        form: &ContractForm,
        generated_on: NaiveDate,
    ) -> Result<String, ArchiveExportError> {
        let mut lines = report::summary_lines(form, generated_on)?;
        let json = serde_json::to_string(form)?;

        lines.push(String::new());
        lines.push(report::rule());
        lines.push(report::MACHINE_SECTION_BANNER.to_string());
        lines.push(report::rule());
        lines.push(parser::payload_line(&STANDARD.encode(json.as_bytes())));

        info!(lines = lines.len(), "rendered contract archive");
        Ok(lines.join("\n"))
    }

    /// File name for an archive generated on `generated_on`.
    pub fn file_name(form: &ContractForm, generated_on: NaiveDate) -> String {
        format!(
            "{}_数据存档_{}.txt",
            crate::workflows::contract::file_prefix(form),
            generated_on.format("%Y%m%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::contract::domain::{Branch, Person, BUSINESS_LICENSE};
    use rust_decimal_macros::dec;

    fn generated_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
    }

    #[test]
    fn report_lists_amount_label_and_banner_before_payload() {
        let mut form = ContractForm::default();
        form.branch = Some(Branch {
            name: "城东支行".to_string(),
            short_name: "城东".to_string(),
            ..Branch::default()
        });
        form.main_borrower = Person::named("张三");
        form.loan.amount = dec!(100000);
        form.loan.term_months = Some(12);

        let text = ArchiveExporter::render(&form, generated_on()).expect("renderable form");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "====== 业务录入辅助报告 (2026-10-18) ======");
        assert!(text.contains("办理支行：城东支行 (城东)"));
        assert!(text.contains("贷款金额：100000 元 (壹拾万元整)"));
        assert!(text.contains("【主借款人】 张三 (岁 | 未婚)"));
        let last = lines.len() - 1;
        assert!(lines[last].starts_with("SYSTEM_DATA_START:"));
        assert_eq!(lines[last - 2], report::MACHINE_SECTION_BANNER);
        assert_eq!(lines[last - 1], "=".repeat(40));
    }

    #[test]
    fn company_guarantors_render_with_their_legal_representative() {
        let mut form = ContractForm::default();
        form.main_borrower = Person::named("张三");
        let mut company = Person::named("北京某某商贸有限公司");
        company.id_type = BUSINESS_LICENSE.to_string();
        company.id_card = "91110101MA01ABCD2X".to_string();
        company.legal_rep = "王五".to_string();
        company.mobile = "010-88888888".to_string();
        form.guarantors.push(company);

        let text = ArchiveExporter::render(&form, generated_on()).expect("renderable form");
        assert!(text.contains(
            "1. 北京某某商贸有限公司 (企业) | 91110101MA01ABCD2X | 法人：王五 | 010-88888888"
        ));
        assert!(!text.contains("北京某某商贸有限公司 (岁)"));
    }

    #[test]
    fn text_without_block_is_missing_payload() {
        assert!(matches!(
            ArchiveImporter::from_text("just a report"),
            Err(ArchiveImportError::MissingPayload)
        ));
    }

    #[test]
    fn corrupt_blocks_report_the_failing_layer() {
        assert!(matches!(
            ArchiveImporter::from_text("SYSTEM_DATA_START:@@@@:SYSTEM_DATA_END"),
            Err(ArchiveImportError::MissingPayload)
        ));
        assert!(matches!(
            ArchiveImporter::from_text("SYSTEM_DATA_START:abc:SYSTEM_DATA_END"),
            Err(ArchiveImportError::Encoding(_))
        ));
        let not_utf8 = STANDARD.encode([0xff_u8, 0xfe, 0xfd]);
        assert!(matches!(
            ArchiveImporter::from_text(&parser::payload_line(&not_utf8)),
            Err(ArchiveImportError::Utf8(_))
        ));
        let not_form = STANDARD.encode("[1,2,3]");
        assert!(matches!(
            ArchiveImporter::from_text(&parser::payload_line(&not_form)),
            Err(ArchiveImportError::Json(_))
        ));
    }

    #[test]
    fn file_name_uses_customer_and_date() {
        let mut form = ContractForm::default();
        form.main_borrower = Person::named("张三");
        assert_eq!(
            ArchiveExporter::file_name(&form, generated_on()),
            "张三_数据存档_20261018.txt"
        );
    }
}
