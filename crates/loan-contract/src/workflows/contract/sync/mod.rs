//! Reconciliation of form edits into derived field writes.
//!
//! [`Synchronizer::reconcile`] never touches the caller's snapshot. It works on
//! a private copy so that the returned writes, replayed in order, reproduce the
//! same state. A write is only emitted when it changes something, which makes
//! a second pass over an unchanged snapshot produce nothing.

mod diff;
mod mirror;
mod writes;

pub use diff::{FormDiff, ListChanges, PersonChanges, SpouseChange};
pub use writes::{FieldWrite, FieldWriteView};

use super::domain::{ContractForm, Person, PersonList, PersonRef};
use super::{identity, maturity};
use chrono::NaiveDate;
use tracing::debug;

pub(crate) struct Pass {
    form: ContractForm,
    writes: Vec<FieldWrite>,
    /// Submitted joint-borrower index -> index in the working copy.
    joint_positions: Vec<Option<usize>>,
}

impl Pass {
    fn new(snapshot: &ContractForm) -> Self {
        Self {
            joint_positions: (0..snapshot.joint_borrowers.len()).map(Some).collect(),
            form: snapshot.clone(),
            writes: Vec::new(),
        }
    }

    fn write(&mut self, write: FieldWrite) -> bool {
        if !write.apply(&mut self.form) {
            return false;
        }
        self.writes.push(write);
        true
    }

    fn remap_joint_positions(&mut self, remap: &[Option<usize>]) {
        for position in &mut self.joint_positions {
            *position = position.and_then(|current| remap.get(current).copied().flatten());
        }
    }

    fn joint_position(&self, submitted: usize) -> Option<usize> {
        self.joint_positions.get(submitted).copied().flatten()
    }

    fn derive_demographics(&mut self, target: PersonRef, today: NaiveDate) {
        let Some(person) = self.form.person(target) else {
            return;
        };
        if person.is_company() {
            debug!(%target, "company identifier carries no demographics");
            return;
        }
        match identity::extract(&person.id_card, today) {
            Some(facts) => {
                self.write(FieldWrite::Demographics { target, facts });
            }
            None => debug!(%target, "identifier not parseable; demographics left as is"),
        }
    }

    fn finish(self, operation: &'static str) -> Vec<FieldWrite> {
        debug!(operation, writes = self.writes.len(), "form reconciled");
        self.writes
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Synchronizer {
    today: NaiveDate,
}

impl Synchronizer {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Derives the writes implied by `diff` against `snapshot`.
    pub fn reconcile(&self, diff: &FormDiff, snapshot: &ContractForm) -> Vec<FieldWrite> {
        let mut pass = Pass::new(snapshot);
        if diff.is_empty() {
            return pass.finish("reconcile");
        }

        if diff.principal_identifier_changed() {
            pass.derive_demographics(PersonRef::Principal, self.today);
        }
        if diff.spouse_identifier_changed() {
            pass.derive_demographics(PersonRef::Spouse, self.today);
        }
        if diff.spouse_removed() {
            pass.write(FieldWrite::ClearSpouse);
        }
        if diff.spouse.is_some() || diff.mirror_spouse {
            mirror::sync(&mut pass);
        }

        for list in PersonList::ordered() {
            let Some(changes) = diff.list(list) else {
                continue;
            };
            for submitted in changes.identifier_changes() {
                let index = match list {
                    PersonList::JointBorrowers => pass.joint_position(submitted),
                    PersonList::Guarantors => Some(submitted),
                };
                if let Some(index) = index {
                    pass.derive_demographics(PersonRef::in_list(list, index), self.today);
                }
            }
        }

        if diff.principal_address_changed() {
            let address = pass.form.main_borrower.address.clone();
            let spouse_blank = pass
                .form
                .spouse
                .as_ref()
                .is_some_and(|spouse| spouse.address.trim().is_empty());
            if spouse_blank
                && !address.trim().is_empty()
                && pass.write(FieldWrite::SpouseAddress(address))
            {
                mirror::sync(&mut pass);
            }
        }

        if diff.start_date || diff.term_months {
            if let (Some(start), Some(term)) =
                (pass.form.loan.start_date, pass.form.loan.term_months)
            {
                match maturity::maturity_date(start, term) {
                    Ok(date) => {
                        pass.write(FieldWrite::MaturityDate(date));
                    }
                    Err(err) => debug!(error = %err, "maturity date not derived"),
                }
            }
        }

        pass.finish("reconcile")
    }

    /// Turns the spouse on or off together with every derived write.
    pub fn toggle_spouse(&self, snapshot: &ContractForm, present: bool) -> Vec<FieldWrite> {
        let mut pass = Pass::new(snapshot);
        if present {
            if pass.form.spouse.is_none() {
                pass.write(FieldWrite::SetSpouse(Person::default()));
            }
        } else {
            pass.write(FieldWrite::ClearSpouse);
        }
        mirror::sync(&mut pass);
        pass.finish("toggle_spouse")
    }

    pub fn toggle_mirroring(&self, snapshot: &ContractForm, enabled: bool) -> Vec<FieldWrite> {
        let mut pass = Pass::new(snapshot);
        pass.write(FieldWrite::MirrorSpouse(enabled));
        mirror::sync(&mut pass);
        pass.finish("toggle_mirroring")
    }
}
