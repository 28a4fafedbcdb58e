mod parser;

use crate::workflows::contract::domain::{Branch, ContractForm, Person, PersonList};
use crate::workflows::contract::FormDiff;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read customer data: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid customer roster CSV: {}", err),
            RosterImportError::Json(err) => write!(f, "invalid reference JSON: {}", err),
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for RosterImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterContact {
    pub name: String,
    pub id_card: String,
    pub mobile: String,
}

impl RosterContact {
    fn write_onto(&self, person: &mut Person) {
        person.name = self.name.clone();
        person.id_card = self.id_card.clone();
        person.mobile = self.mobile.clone();
    }
}

/// One maturing customer as exported by the branch systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRecord {
    pub branch_short_name: String,
    pub main: RosterContact,
    pub main_address: String,
    pub spouse: Option<RosterContact>,
    pub guarantors: Vec<RosterContact>,
}

impl CustomerRecord {
    /// Copies the record onto `form` and reports what was touched.
    ///
    /// Only the raw roster fields are written. Run the returned diff through
    /// the synchronizer to derive demographics and refresh the mirrored spouse.
    pub fn prefill(&self, form: &mut ContractForm, branches: &[Branch]) -> FormDiff {
        const CONTACT_FIELDS: [&str; 3] = ["name", "id_card", "mobile"];

        if let Some(branch) = branches
            .iter()
            .find(|branch| branch.short_name == self.branch_short_name)
        {
            form.branch = Some(branch.clone());
        }

        self.main.write_onto(&mut form.main_borrower);
        form.main_borrower.address = self.main_address.clone();
        let mut diff = FormDiff::default().with_principal(["name", "id_card", "mobile", "address"]);

        if let Some(contact) = self.spouse.as_ref() {
            contact.write_onto(form.spouse.get_or_insert_with(Person::default));
            diff = diff.with_spouse(CONTACT_FIELDS);
        }

        if !self.guarantors.is_empty() {
            form.guarantors = self
                .guarantors
                .iter()
                .map(|contact| {
                    let mut person = Person::default();
                    contact.write_onto(&mut person);
                    person
                })
                .collect();
            for index in 0..form.guarantors.len() {
                diff = diff.with_list_entry(PersonList::Guarantors, index, CONTACT_FIELDS);
            }
        }

        diff
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerRoster {
    records: Vec<CustomerRecord>,
}

impl CustomerRoster {
    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn find_by_id_card(&self, id_card: &str) -> Option<&CustomerRecord> {
        let id_card = id_card.trim();
        self.records
            .iter()
            .find(|record| record.main.id_card.eq_ignore_ascii_case(id_card))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CustomerRoster, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CustomerRoster, RosterImportError> {
        let records = parser::parse_records(reader)?;
        info!(customers = records.len(), "loaded customer roster");
        Ok(CustomerRoster { records })
    }
}

/// Branch directory stored as a JSON array.
pub struct BranchDirectory;

impl BranchDirectory {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Branch>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Branch>, RosterImportError> {
        let branches: Vec<Branch> = serde_json::from_reader(reader)?;
        info!(branches = branches.len(), "loaded branch directory");
        Ok(branches)
    }
}

/// Choice lists the form offers for its free-text person and collateral fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub ethnicity: Vec<String>,
    pub education: Vec<String>,
    pub occupation: Vec<String>,
    pub loan_use: Vec<String>,
    pub collateral_type: Vec<String>,
}

impl FormOptions {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Accepts either the bare lists or a document that nests them under
    /// `options` (other top-level keys such as `templates` are ignored).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterImportError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Wrapped { options: FormOptions },
            Bare(FormOptions),
        }

        let options = match serde_json::from_reader(reader)? {
            Document::Wrapped { options } | Document::Bare(options) => options,
        };
        info!(
            ethnicity = options.ethnicity.len(),
            education = options.education.len(),
            occupation = options.occupation.len(),
            loan_use = options.loan_use.len(),
            collateral_type = options.collateral_type.len(),
            "loaded form options"
        );
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "\
branch_short_name,main_name,main_id_card,main_mobile,main_address,spouse_name,spouse_id_card,spouse_mobile,guarantor_names,guarantor_id_cards,guarantor_mobiles
城东,张三,110101199003070017,13800000001,北京市东城区一号,李四,110101199205120026,13800000002,王五;赵六,110101198001010011;,13900000001;13900000002
城西,钱七,11010119850101001X,13800000003,北京市西城区二号,nan,nan,nan,,,
,,,,,,,,,,
";

    #[test]
    fn parses_rows_and_skips_blank_customers() {
        let roster = RosterImporter::from_reader(ROSTER.as_bytes()).expect("valid roster");
        assert_eq!(roster.len(), 2);

        let first = &roster.records()[0];
        assert_eq!(first.main.name, "张三");
        assert_eq!(first.spouse.as_ref().map(|s| s.name.as_str()), Some("李四"));
        assert_eq!(first.guarantors.len(), 2);
        assert_eq!(first.guarantors[1].id_card, "");
        assert_eq!(first.guarantors[1].mobile, "13900000002");

        let second = roster
            .find_by_id_card(" 11010119850101001x ")
            .expect("case-insensitive lookup");
        assert!(second.spouse.is_none());
        assert!(second.guarantors.is_empty());
    }

    #[test]
    fn positional_split_keeps_blank_slots() {
        assert_eq!(
            parser::split_list_for_tests("a; ;nan;b"),
            vec!["a", "", "", "b"]
        );
    }

    #[test]
    fn prefill_writes_roster_fields_and_describes_them() {
        let roster = RosterImporter::from_reader(ROSTER.as_bytes()).expect("valid roster");
        let branches = vec![Branch {
            name: "城东支行".to_string(),
            short_name: "城东".to_string(),
            ..Branch::default()
        }];
        let mut form = ContractForm::default();

        let diff = roster.records()[0].prefill(&mut form, &branches);

        assert_eq!(form.branch.as_ref().map(|b| b.name.as_str()), Some("城东支行"));
        assert_eq!(form.main_borrower.address, "北京市东城区一号");
        assert_eq!(form.spouse.as_ref().map(|s| s.mobile.as_str()), Some("13800000002"));
        assert_eq!(form.guarantors.len(), 2);
        assert!(diff.principal_identifier_changed());
        assert!(diff.spouse_identifier_changed());
        let guarantor_changes: Vec<usize> = diff
            .guarantors
            .as_ref()
            .map(|changes| changes.identifier_changes().collect())
            .unwrap_or_default();
        assert_eq!(guarantor_changes, vec![0, 1]);
    }

    #[test]
    fn prefill_without_spouse_leaves_spouse_alone() {
        let roster = RosterImporter::from_reader(ROSTER.as_bytes()).expect("valid roster");
        let mut form = ContractForm::default();
        let diff = roster.records()[1].prefill(&mut form, &[]);
        assert!(form.spouse.is_none());
        assert!(form.branch.is_none());
        assert!(diff.spouse.is_none());
    }

    #[test]
    fn branch_directory_reads_json_array() {
        let json = r#"[{"name":"城东支行","short_name":"城东","manager":"周","phone":"010-1","address":"东路1号"}]"#;
        let branches = BranchDirectory::from_reader(json.as_bytes()).expect("valid directory");
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].manager, "周");
        assert!(BranchDirectory::from_reader("{".as_bytes()).is_err());
    }

    #[test]
    fn form_options_accept_wrapped_and_bare_documents() {
        let wrapped = r#"{"options":{"ethnicity":["汉族","回族"],"loan_use":["经营周转"]},"templates":["a.docx"]}"#;
        let options = FormOptions::from_reader(wrapped.as_bytes()).expect("wrapped options");
        assert_eq!(options.ethnicity, vec!["汉族", "回族"]);
        assert_eq!(options.loan_use, vec!["经营周转"]);
        assert!(options.collateral_type.is_empty());

        let bare = r#"{"collateral_type":["房产","土地"]}"#;
        let options = FormOptions::from_reader(bare.as_bytes()).expect("bare options");
        assert_eq!(options.collateral_type, vec!["房产", "土地"]);
        assert!(options.ethnicity.is_empty());

        let err = FormOptions::from_reader(r#"{"ethnicity": "汉族"}"#.as_bytes())
            .expect_err("lists only");
        assert!(err.to_string().starts_with("invalid reference JSON"));
    }
}
