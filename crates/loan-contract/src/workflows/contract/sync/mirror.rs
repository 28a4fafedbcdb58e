use super::writes::FieldWrite;
use super::Pass;
use crate::workflows::contract::domain::{ContractForm, Person, SPOUSE_RELATION};
use tracing::warn;

enum MirrorTarget {
    Upsert(Person),
    /// Spouse exists but has no name yet; leave the list alone.
    Hold,
    Remove,
}

fn target(form: &ContractForm) -> MirrorTarget {
    let Some(spouse) = form.spouse.as_ref().filter(|_| form.mirror_spouse) else {
        return MirrorTarget::Remove;
    };
    if spouse.name.trim().is_empty() {
        return MirrorTarget::Hold;
    }

    let mut candidate = spouse.clone();
    candidate.relation = SPOUSE_RELATION.to_string();
    candidate.synthetic = true;
    if candidate.address.trim().is_empty() {
        candidate.address = form.main_borrower.address.clone();
    }
    MirrorTarget::Upsert(candidate)
}

/// Brings the mirrored spouse entry in line with the working copy.
///
/// Entries are matched by the synthetic flag only. An existing mirrored entry
/// keeps its position; a new one goes to the head of the list. Surplus
/// synthetic entries are dropped.
pub(super) fn sync(pass: &mut Pass) {
    let current = &pass.form.joint_borrowers;
    let synthetic_count = current.iter().filter(|entry| entry.synthetic).count();
    if synthetic_count > 1 {
        warn!(
            count = synthetic_count,
            "multiple mirrored spouse entries in joint borrowers; keeping the first"
        );
    }

    let candidate = match target(&pass.form) {
        MirrorTarget::Hold => return,
        MirrorTarget::Upsert(candidate) => Some(candidate),
        MirrorTarget::Remove => None,
    };

    let mut next = Vec::with_capacity(current.len() + 1);
    let mut remap = Vec::with_capacity(current.len());
    let mut placed = false;

    if let Some(candidate) = candidate.as_ref() {
        if synthetic_count == 0 {
            next.push(candidate.clone());
            placed = true;
        }
    }

    for entry in current {
        if !entry.synthetic {
            remap.push(Some(next.len()));
            next.push(entry.clone());
            continue;
        }
        match candidate.as_ref() {
            Some(candidate) if !placed => {
                remap.push(Some(next.len()));
                next.push(candidate.clone());
                placed = true;
            }
            _ => remap.push(None),
        }
    }

    if next == *current {
        return;
    }
    if pass.write(FieldWrite::JointBorrowers(next)) {
        pass.remap_joint_positions(&remap);
    }
}
