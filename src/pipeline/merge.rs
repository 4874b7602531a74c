use crate::models::{FactMap, Outcome};

/// Fold one turn's facts into the accumulated map.
///
/// For each field in `new`:
/// - absent from `prior`: set it
/// - prior is `Variable`: overwrite
/// - otherwise overwrite only if the value differs
///
/// `Unknown` never replaces a definite Positive/Negative, so a later turn
/// that is silent on the field cannot degrade it. A `Variable` or label
/// entry is still overwritten by `Unknown`.
pub fn merge(prior: &FactMap, new: &FactMap) -> FactMap {
    let mut merged = prior.clone();
    let mut updated = 0usize;

    for (field, value) in new {
        let write = match merged.get(field) {
            None => true,
            Some(current) if current.is_definite() && *value == Outcome::Unknown => false,
            Some(Outcome::Variable) => true,
            Some(current) => current != value,
        };
        if write {
            merged.insert(field.clone(), value.clone());
            updated += 1;
        }
    }

    tracing::debug!(prior = prior.len(), new = new.len(), updated, "Facts merged");
    merged
}
