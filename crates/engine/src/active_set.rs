//! The active curated set: whichever `user-set:<id>` was tagged last.

use deckstyle_core::types::{parse_set_id, USER_SET_PREFIX};
use deckstyle_core::{aggregate, ActiveDesignSet, ExtractedDesign, Result};
use deckstyle_store::ExemplarStore;

/// Aggregate the most recently curated set.
///
/// `None` when no exemplar carries a set tag, the tag has no id, or no
/// member of the set has a stored design.
pub fn active_aggregated_set(store: &dyn ExemplarStore) -> Result<Option<ActiveDesignSet>> {
    let Some(latest) = store.latest_with_category_prefix(USER_SET_PREFIX)? else {
        log::debug!("No curated design set found");
        return Ok(None);
    };

    let Some(set_id) = parse_set_id(&latest.category_tag) else {
        log::warn!("Ignoring malformed set tag {:?}", latest.category_tag);
        return Ok(None);
    };

    let members = store.list_by_category(&latest.category_tag)?;
    let designs: Vec<ExtractedDesign> = members
        .into_iter()
        .filter_map(|exemplar| exemplar.extracted_spec)
        .collect();

    if designs.is_empty() {
        log::debug!("Set {} has no analyzed designs", set_id);
        return Ok(None);
    }

    log::info!("Active design set {} with {} designs", set_id, designs.len());
    Ok(Some(ActiveDesignSet {
        set_id: set_id.to_string(),
        spec: aggregate(&designs),
    }))
}
