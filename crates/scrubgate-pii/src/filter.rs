//! Deny-list filtering of recognizer output

use scrubgate_core::EntitySpan;

/// Drop every span whose type is in `skip_entities`, preserving order.
pub fn filter_entities(spans: Vec<EntitySpan>, skip_entities: &[String]) -> Vec<EntitySpan> {
    if skip_entities.is_empty() {
        return spans;
    }

    spans
        .into_iter()
        .filter(|span| !skip_entities.contains(&span.entity_type))
        .collect()
}
