use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier type recorded for natural persons.
pub const RESIDENT_ID: &str = "身份证";
/// Identifier type recorded for companies listed as borrowers or guarantors.
pub const BUSINESS_LICENSE: &str = "营业执照";
/// Relation written onto the mirrored spouse entry.
pub const SPOUSE_RELATION: &str = "夫妻";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "男")]
    Male,
    #[serde(rename = "女")]
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "男",
            Self::Female => "女",
        }
    }
}

/// Facts derived from an identifier. Never edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicFacts {
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub name: String,
    pub id_type: String,
    pub id_card: String,
    pub mobile: String,
    pub address: String,
    pub relation: String,
    /// Only meaningful when `id_type` is a business license.
    pub legal_rep: String,
    pub ethnicity: String,
    pub education: String,
    pub occupation: String,
    pub demographics: Option<DemographicFacts>,
    /// Set only on the joint-borrower entry generated from the spouse.
    pub synthetic: bool,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            name: String::new(),
            id_type: RESIDENT_ID.to_string(),
            id_card: String::new(),
            mobile: String::new(),
            address: String::new(),
            relation: String::new(),
            legal_rep: String::new(),
            ethnicity: String::new(),
            education: String::new(),
            occupation: String::new(),
            demographics: None,
            synthetic: false,
        }
    }
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_company(&self) -> bool {
        self.id_type == BUSINESS_LICENSE
    }

    pub fn age_label(&self) -> String {
        self.demographics
            .map(|facts| facts.age.to_string())
            .unwrap_or_default()
    }

    pub fn gender_label(&self) -> &'static str {
        self.demographics
            .map(|facts| facts.gender.label())
            .unwrap_or("")
    }

    pub fn birth_date_label(&self) -> String {
        self.demographics
            .map(|facts| facts.birth_date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Personal,
    Enterprise,
}

impl CustomerType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "个人",
            Self::Enterprise => "企业",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Credit,
    #[default]
    Guarantee,
    Mortgage,
}

impl LoanType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Credit => "信用",
            Self::Guarantee => "担保",
            Self::Mortgage => "抵押",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branch {
    pub name: String,
    pub short_name: String,
    pub manager: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enterprise {
    pub name: String,
    pub credit_code: String,
    pub legal_rep: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collateral {
    pub owner: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cert_no: String,
    pub location: String,
    pub area: String,
    pub land_area: String,
    pub value: Decimal,
}

/// Principal amount and schedule dates. `maturity_date` is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanTerms {
    pub amount: Decimal,
    pub term_months: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub loan_use: String,
}

/// Full snapshot of the contract form, the entity graph the synchronizer reads.
///
/// At most one joint borrower carries `synthetic = true`, and it exists only
/// while a spouse is present and `mirror_spouse` is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractForm {
    pub customer_type: CustomerType,
    pub loan_type: LoanType,
    pub branch: Option<Branch>,
    pub main_borrower: Person,
    pub spouse: Option<Person>,
    pub mirror_spouse: bool,
    pub enterprise: Option<Enterprise>,
    pub joint_borrowers: Vec<Person>,
    pub guarantors: Vec<Person>,
    pub collaterals: Vec<Collateral>,
    pub loan: LoanTerms,
    pub selected_templates: Vec<String>,
}

impl Default for ContractForm {
    fn default() -> Self {
        Self {
            customer_type: CustomerType::default(),
            loan_type: LoanType::default(),
            branch: None,
            main_borrower: Person::default(),
            spouse: None,
            mirror_spouse: true,
            enterprise: None,
            joint_borrowers: Vec::new(),
            guarantors: Vec::new(),
            collaterals: Vec::new(),
            loan: LoanTerms::default(),
            selected_templates: Vec::new(),
        }
    }
}

impl ContractForm {
    pub fn person(&self, target: PersonRef) -> Option<&Person> {
        match target {
            PersonRef::Principal => Some(&self.main_borrower),
            PersonRef::Spouse => self.spouse.as_ref(),
            PersonRef::JointBorrower(index) => self.joint_borrowers.get(index),
            PersonRef::Guarantor(index) => self.guarantors.get(index),
        }
    }

    pub fn person_mut(&mut self, target: PersonRef) -> Option<&mut Person> {
        match target {
            PersonRef::Principal => Some(&mut self.main_borrower),
            PersonRef::Spouse => self.spouse.as_mut(),
            PersonRef::JointBorrower(index) => self.joint_borrowers.get_mut(index),
            PersonRef::Guarantor(index) => self.guarantors.get_mut(index),
        }
    }

    /// Position of the mirrored spouse entry, if any.
    pub fn synthetic_position(&self) -> Option<usize> {
        self.joint_borrowers.iter().position(|entry| entry.synthetic)
    }

    pub fn has_named_spouse(&self) -> bool {
        self.spouse
            .as_ref()
            .is_some_and(|spouse| !spouse.name.trim().is_empty())
    }
}

/// Addresses one person inside the entity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "index")]
pub enum PersonRef {
    Principal,
    Spouse,
    JointBorrower(usize),
    Guarantor(usize),
}

impl PersonRef {
    pub fn in_list(list: PersonList, index: usize) -> Self {
        match list {
            PersonList::JointBorrowers => Self::JointBorrower(index),
            PersonList::Guarantors => Self::Guarantor(index),
        }
    }
}

impl fmt::Display for PersonRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonRef::Principal => write!(f, "main_borrower"),
            PersonRef::Spouse => write!(f, "spouse"),
            PersonRef::JointBorrower(index) => write!(f, "joint_borrowers[{index}]"),
            PersonRef::Guarantor(index) => write!(f, "guarantors[{index}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonList {
    JointBorrowers,
    Guarantors,
}

impl PersonList {
    pub const fn ordered() -> [Self; 2] {
        [Self::JointBorrowers, Self::Guarantors]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::JointBorrowers => "joint_borrowers",
            Self::Guarantors => "guarantors",
        }
    }
}
