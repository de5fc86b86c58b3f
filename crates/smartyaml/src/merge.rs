//! Deep merging of drafts with `!extend` array semantics.

use crate::draft::{Draft, DraftMapping};
use crate::options::TEMPLATE_KEY;

/// Deep-merge `overlay` onto `base`.
///
/// Mappings merge key by key, recursively. Any other overlay value replaces
/// the base value, except an `!extend` marker, which appends its items to a
/// base sequence (or stands alone when there is no base sequence). Keys only
/// present in `base` are kept in their original position.
pub fn deep_merge(base: Draft, overlay: Draft) -> Draft {
    match (base, overlay) {
        (Draft::Mapping(base_map), Draft::Mapping(overlay_map)) => {
            Draft::Mapping(merge_mappings(base_map, overlay_map))
        }
        (base, overlay) => merge_value(Some(base), overlay),
    }
}

fn merge_mappings(mut base: DraftMapping, overlay: DraftMapping) -> DraftMapping {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(slot) => {
                let existing = std::mem::take(slot);
                *slot = merge_value(Some(existing), value);
            }
            None => {
                base.insert(key, merge_value(None, value));
            }
        }
    }
    base
}

fn merge_value(base: Option<Draft>, overlay: Draft) -> Draft {
    match (base, overlay) {
        (Some(Draft::Mapping(base_map)), Draft::Mapping(overlay_map)) => {
            Draft::Mapping(merge_mappings(base_map, overlay_map))
        }
        (base, Draft::Extend(items)) => extend_sequence(base, items),
        (_, overlay) => overlay,
    }
}

/// Append `items` to `base` when it is a sequence; otherwise `items` alone.
pub fn extend_sequence(base: Option<Draft>, items: Vec<Draft>) -> Draft {
    match base {
        Some(Draft::Sequence(mut existing)) => {
            existing.extend(items);
            Draft::Sequence(existing)
        }
        _ => Draft::Sequence(items),
    }
}

/// Merge the mappings of a YAML `<<` merge key, then the local entries.
///
/// Among merged mappings the earlier one wins; local entries win over all
/// of them, with `!extend` appending to the merged value.
pub fn apply_merge_key(sources: Vec<DraftMapping>, local: DraftMapping) -> DraftMapping {
    let mut merged = DraftMapping::new();
    for source in sources {
        for (key, value) in source {
            merged.entry(key).or_insert(value);
        }
    }

    for (key, value) in local {
        match (merged.get_mut(&key), value) {
            (Some(slot), Draft::Extend(items)) => {
                let existing = std::mem::take(slot);
                *slot = extend_sequence(Some(existing), items);
            }
            (Some(slot), other) => *slot = other,
            (None, Draft::Extend(items)) => {
                merged.insert(key, Draft::Sequence(items));
            }
            (None, other) => {
                merged.insert(key, other);
            }
        }
    }
    merged
}

/// Apply `__template` inheritance to a document root.
///
/// When the root mapping has a `__template` mapping, the root becomes that
/// mapping with the root deep-merged on top. The `__template` key itself is
/// kept as metadata.
pub fn apply_template_inheritance(root: Draft) -> Draft {
    let template = match root.as_mapping().and_then(|map| map.get(TEMPLATE_KEY)) {
        Some(Draft::Mapping(template)) => template.clone(),
        _ => return root,
    };
    tracing::debug!(keys = template.len(), "applying __template inheritance");
    deep_merge(Draft::Mapping(template), root)
}
