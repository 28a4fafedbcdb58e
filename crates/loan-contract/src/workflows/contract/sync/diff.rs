use crate::workflows::contract::domain::PersonList;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const IDENTIFIER_FIELD: &str = "id_card";
const ADDRESS_FIELD: &str = "address";

/// Field keys touched on a single person by the latest edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonChanges {
    fields: BTreeSet<String>,
}

impl PersonChanges {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self::new(object.keys().cloned())
    }

    pub fn touches(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn identifier_changed(&self) -> bool {
        self.touches(IDENTIFIER_FIELD)
    }

    pub fn address_changed(&self) -> bool {
        self.touches(ADDRESS_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpouseChange {
    Edited(PersonChanges),
    Removed,
}

/// Changed entries of a person list, ordered by index.
///
/// The form runtime reports list edits either as a dense array (unchanged slots
/// are `null`) or as a sparse `{"<index>": {...}}` map. Both collapse into the
/// same `(index, changes)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChanges {
    entries: Vec<(usize, PersonChanges)>,
}

impl ListChanges {
    pub fn from_dense(items: &[Value]) -> Self {
        let entries = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_object().map(|object| (index, object)))
            .map(|(index, object)| (index, PersonChanges::from_object(object)))
            .collect();
        Self { entries }
    }

    pub fn from_sparse(items: &Map<String, Value>) -> Self {
        let mut entries: Vec<(usize, PersonChanges)> = items
            .iter()
            .filter_map(|(key, item)| {
                let index = key.trim().parse::<usize>().ok()?;
                let object = item.as_object()?;
                Some((index, PersonChanges::from_object(object)))
            })
            .collect();
        entries.sort_by_key(|(index, _)| *index);
        entries.dedup_by_key(|(index, _)| *index);
        Self { entries }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::from_dense(items)),
            Value::Object(items) => Some(Self::from_sparse(items)),
            _ => None,
        }
    }

    pub fn with_entry<I, S>(mut self, index: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.retain(|(existing, _)| *existing != index);
        self.entries.push((index, PersonChanges::new(fields)));
        self.entries.sort_by_key(|(index, _)| *index);
        self
    }

    pub fn entries(&self) -> &[(usize, PersonChanges)] {
        &self.entries
    }

    /// Indices whose identifier changed, ascending.
    pub fn identifier_changes(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .filter(|(_, changes)| changes.identifier_changed())
            .map(|(index, _)| *index)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalized delta of the most recent form edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDiff {
    pub main_borrower: Option<PersonChanges>,
    pub spouse: Option<SpouseChange>,
    pub mirror_spouse: bool,
    pub joint_borrowers: Option<ListChanges>,
    pub guarantors: Option<ListChanges>,
    pub start_date: bool,
    pub term_months: bool,
}

impl FormDiff {
    /// Reads the changed-values object emitted by the form runtime.
    ///
    /// Unknown keys and malformed shapes are ignored; the result only ever
    /// describes what can be recognised.
    pub fn from_changes(changes: &Value) -> Self {
        let Some(changes) = changes.as_object() else {
            return Self::default();
        };

        let main_borrower = changes
            .get("main_borrower")
            .and_then(Value::as_object)
            .map(PersonChanges::from_object);

        let spouse = match changes.get("spouse") {
            Some(Value::Null) => Some(SpouseChange::Removed),
            Some(Value::Object(object)) => {
                Some(SpouseChange::Edited(PersonChanges::from_object(object)))
            }
            _ => None,
        };

        let list = |list: PersonList| changes.get(list.key()).and_then(ListChanges::from_value);

        let loan = changes.get("loan").and_then(Value::as_object);
        let loan_touches = |field: &str| loan.is_some_and(|loan| loan.contains_key(field));

        Self {
            main_borrower,
            spouse,
            mirror_spouse: changes.contains_key("mirror_spouse"),
            joint_borrowers: list(PersonList::JointBorrowers),
            guarantors: list(PersonList::Guarantors),
            start_date: loan_touches("start_date"),
            term_months: loan_touches("term_months"),
        }
    }

    pub fn list(&self, list: PersonList) -> Option<&ListChanges> {
        match list {
            PersonList::JointBorrowers => self.joint_borrowers.as_ref(),
            PersonList::Guarantors => self.guarantors.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main_borrower.is_none()
            && self.spouse.is_none()
            && !self.mirror_spouse
            && self.joint_borrowers.is_none()
            && self.guarantors.is_none()
            && !self.start_date
            && !self.term_months
    }

    pub fn principal_identifier_changed(&self) -> bool {
        self.main_borrower
            .as_ref()
            .is_some_and(PersonChanges::identifier_changed)
    }

    pub fn principal_address_changed(&self) -> bool {
        self.main_borrower
            .as_ref()
            .is_some_and(PersonChanges::address_changed)
    }

    pub fn spouse_identifier_changed(&self) -> bool {
        matches!(&self.spouse, Some(SpouseChange::Edited(changes)) if changes.identifier_changed())
    }

    pub fn spouse_removed(&self) -> bool {
        matches!(self.spouse, Some(SpouseChange::Removed))
    }

    pub fn with_principal<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.main_borrower = Some(PersonChanges::new(fields));
        self
    }

    pub fn with_spouse<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spouse = Some(SpouseChange::Edited(PersonChanges::new(fields)));
        self
    }

    pub fn with_spouse_removed(mut self) -> Self {
        self.spouse = Some(SpouseChange::Removed);
        self
    }

    pub fn with_mirror_toggle(mut self) -> Self {
        self.mirror_spouse = true;
        self
    }

    pub fn with_list_entry<I, S>(mut self, list: PersonList, index: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slot = match list {
            PersonList::JointBorrowers => &mut self.joint_borrowers,
            PersonList::Guarantors => &mut self.guarantors,
        };
        *slot = Some(slot.take().unwrap_or_default().with_entry(index, fields));
        self
    }

    pub fn with_schedule_change(mut self) -> Self {
        self.start_date = true;
        self.term_months = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dense_and_sparse_list_shapes_normalize_identically() {
        let dense = FormDiff::from_changes(&json!({
            "joint_borrowers": [null, {"id_card": "110101199003070017"}, null, {"name": "B"}]
        }));
        let sparse = FormDiff::from_changes(&json!({
            "joint_borrowers": {"3": {"name": "B"}, "1": {"id_card": "110101199003070017"}}
        }));

        assert_eq!(dense, sparse);
        let changes = dense.joint_borrowers.expect("list changes");
        assert_eq!(changes.identifier_changes().collect::<Vec<_>>(), vec![1]);
        assert_eq!(changes.entries().len(), 2);
    }

    #[test]
    fn sparse_keys_that_are_not_indices_are_ignored() {
        let diff = FormDiff::from_changes(&json!({
            "guarantors": {"first": {"id_card": "x"}, "0": {"id_card": "y"}}
        }));
        let indices: Vec<usize> = diff
            .guarantors
            .expect("list changes")
            .identifier_changes()
            .collect();
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn null_spouse_means_removal() {
        let diff = FormDiff::from_changes(&json!({"spouse": null}));
        assert!(diff.spouse_removed());

        let diff = FormDiff::from_changes(&json!({"spouse": {"id_card": "1"}}));
        assert!(diff.spouse_identifier_changed());
        assert!(!diff.spouse_removed());
    }

    #[test]
    fn reads_schedule_and_flag_changes() {
        let diff = FormDiff::from_changes(&json!({
            "loan": {"term_months": 24},
            "mirror_spouse": false,
            "main_borrower": {"address": "x"}
        }));
        assert!(diff.term_months);
        assert!(!diff.start_date);
        assert!(diff.mirror_spouse);
        assert!(diff.principal_address_changed());
        assert!(!diff.principal_identifier_changed());
    }

    #[test]
    fn builders_match_the_runtime_change_shapes() {
        assert_eq!(
            FormDiff::from_changes(&json!({"spouse": null})),
            FormDiff::default().with_spouse_removed()
        );
        assert_eq!(
            FormDiff::from_changes(&json!({"mirror_spouse": true})),
            FormDiff::default().with_mirror_toggle()
        );

        let diff = FormDiff::from_changes(&json!({
            "main_borrower": {"mobile": "1", "address": "x", "id_card": "2"}
        }));
        let principal = diff.main_borrower.expect("principal changes");
        assert_eq!(
            principal.fields().collect::<Vec<_>>(),
            vec!["address", "id_card", "mobile"]
        );
    }

    #[test]
    fn non_object_changes_produce_an_empty_diff() {
        assert!(FormDiff::from_changes(&json!(null)).is_empty());
        assert!(FormDiff::from_changes(&json!([1, 2])).is_empty());
        assert!(FormDiff::from_changes(&json!({})).is_empty());
    }
}
