use crate::workflows::contract::domain::{ContractForm, DemographicFacts, Person, PersonRef};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// One assignment back into the form snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldWrite {
    Demographics {
        target: PersonRef,
        facts: DemographicFacts,
    },
    SpouseAddress(String),
    ClearSpouse,
    SetSpouse(Person),
    MirrorSpouse(bool),
    JointBorrowers(Vec<Person>),
    MaturityDate(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWriteView {
    pub path: String,
    pub value: Value,
}

impl FieldWrite {
    pub fn path(&self) -> String {
        match self {
            FieldWrite::Demographics { target, .. } => format!("{target}.demographics"),
            FieldWrite::SpouseAddress(_) => "spouse.address".to_string(),
            FieldWrite::ClearSpouse | FieldWrite::SetSpouse(_) => "spouse".to_string(),
            FieldWrite::MirrorSpouse(_) => "mirror_spouse".to_string(),
            FieldWrite::JointBorrowers(_) => "joint_borrowers".to_string(),
            FieldWrite::MaturityDate(_) => "loan.maturity_date".to_string(),
        }
    }

    pub fn value(&self) -> Value {
        let value = match self {
            FieldWrite::Demographics { facts, .. } => serde_json::to_value(facts),
            FieldWrite::SpouseAddress(address) => Ok(Value::String(address.clone())),
            FieldWrite::ClearSpouse => Ok(Value::Null),
            FieldWrite::SetSpouse(person) => serde_json::to_value(person),
            FieldWrite::MirrorSpouse(enabled) => Ok(Value::Bool(*enabled)),
            FieldWrite::JointBorrowers(list) => serde_json::to_value(list),
            FieldWrite::MaturityDate(date) => serde_json::to_value(date),
        };
        value.unwrap_or(Value::Null)
    }

    pub fn to_view(&self) -> FieldWriteView {
        FieldWriteView {
            path: self.path(),
            value: self.value(),
        }
    }

    /// Applies the write, returning whether the snapshot changed.
    pub fn apply(&self, form: &mut ContractForm) -> bool {
        match self {
            FieldWrite::Demographics { target, facts } => match form.person_mut(*target) {
                Some(person) if person.demographics != Some(*facts) => {
                    person.demographics = Some(*facts);
                    true
                }
                _ => false,
            },
            FieldWrite::SpouseAddress(address) => match form.spouse.as_mut() {
                Some(spouse) if spouse.address != *address => {
                    spouse.address = address.clone();
                    true
                }
                _ => false,
            },
            FieldWrite::ClearSpouse => form.spouse.take().is_some(),
            FieldWrite::SetSpouse(person) => replace(&mut form.spouse, Some(person.clone())),
            FieldWrite::MirrorSpouse(enabled) => replace(&mut form.mirror_spouse, *enabled),
            FieldWrite::JointBorrowers(list) => replace(&mut form.joint_borrowers, list.clone()),
            FieldWrite::MaturityDate(date) => replace(&mut form.loan.maturity_date, Some(*date)),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

impl ContractForm {
    /// Replays writes in order and returns how many changed the snapshot.
    pub fn apply_writes(&mut self, writes: &[FieldWrite]) -> usize {
        writes.iter().filter(|write| write.apply(self)).count()
    }
}
