//! Row tags, the custom tag vocabulary and the For Sale marker.

use std::collections::HashSet;

use crate::constants::{BASE_TAG_SUGGESTIONS, FOR_SALE_TAG};
use crate::row::Row;

/// Split comma-separated user input into trimmed, non-empty tags.
pub fn normalize_tags_input(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_owned).collect()
}

/// Union of two tag lists, case-insensitive, keeping the first spelling seen.
pub fn merge_tags(current: &[String], incoming: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    current
        .iter()
        .chain(incoming)
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .cloned()
        .collect()
}

fn is_base_tag(key: &str) -> bool {
    BASE_TAG_SUGGESTIONS.iter().any(|b| b.to_lowercase() == key)
}

/// Remember tags that are neither base suggestions nor already custom.
pub fn persist_new_tags(custom: &mut Vec<String>, incoming: &[String]) -> bool {
    let mut known: HashSet<String> = custom.iter().map(|t| t.to_lowercase()).collect();
    let mut changed = false;
    for tag in incoming {
        let trimmed = tag.trim();
        let key = trimmed.to_lowercase();
        if key.is_empty() || is_base_tag(&key) || known.contains(&key) {
            continue;
        }
        custom.push(trimmed.to_owned());
        known.insert(key);
        changed = true;
    }
    changed
}

/// Every tag on offer: base suggestions, custom tags, then tags in use,
/// deduplicated case-insensitively and sorted ignoring case.
pub fn all_tags<'a>(custom: &[String], rows: impl IntoIterator<Item = &'a Row>) -> Vec<String> {
    let base: Vec<String> = BASE_TAG_SUGGESTIONS.iter().map(|t| (*t).to_owned()).collect();
    let mut merged = merge_tags(&base, custom);
    for row in rows {
        merged = merge_tags(&merged, &row.clean_tags());
    }
    merged.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    merged
}

/// Replace a row's tags with the cleaned, deduplicated list.
pub fn set_row_tags(row: &mut Row, tags: &[String]) -> bool {
    let next = merge_tags(&[], &tags.iter().map(|t| t.trim().to_owned()).collect::<Vec<_>>());
    if next == row.tags {
        return false;
    }
    row.tags = next;
    true
}

pub fn add_tags(row: &mut Row, incoming: &[String]) -> bool {
    let next = merge_tags(&row.clean_tags(), incoming);
    set_row_tags(row, &next)
}

pub fn remove_tags(row: &mut Row, outgoing: &[String]) -> bool {
    let drop: HashSet<String> = outgoing.iter().map(|t| t.to_lowercase()).collect();
    let next: Vec<String> =
        row.clean_tags().into_iter().filter(|t| !drop.contains(&t.to_lowercase())).collect();
    set_row_tags(row, &next)
}

/// Flip the For Sale tag; returns whether the row is now for sale.
pub fn toggle_for_sale(row: &mut Row) -> bool {
    if row.is_for_sale() {
        remove_tags(row, &[FOR_SALE_TAG.to_owned()]);
        false
    } else {
        let mut tags = row.clean_tags();
        tags.push(FOR_SALE_TAG.to_owned());
        set_row_tags(row, &tags);
        true
    }
}

/// Rename a tag everywhere. Renaming a base suggestion adds the new name as
/// a custom tag. Returns the number of rows touched.
pub fn rename_tag(custom: &mut Vec<String>, rows: &mut [Row], old: &str, new: &str) -> usize {
    let old_key = old.to_lowercase();
    let new = new.trim();
    if new.is_empty() || new.to_lowercase() == old_key {
        return 0;
    }
    match custom.iter().position(|t| t.to_lowercase() == old_key) {
        Some(i) if !is_base_tag(&old_key) => custom[i] = new.to_owned(),
        _ => custom.push(new.to_owned()),
    }
    *custom = merge_tags(&[], custom);

    let mut touched = 0;
    for row in rows {
        let tags = row.clean_tags();
        if tags.iter().any(|t| t.to_lowercase() == old_key) {
            let next: Vec<String> = tags
                .into_iter()
                .map(|t| if t.to_lowercase() == old_key { new.to_owned() } else { t })
                .collect();
            set_row_tags(row, &next);
            touched += 1;
        }
    }
    touched
}

/// Delete a tag from the custom list and from every row. Returns rows touched.
pub fn delete_tag(custom: &mut Vec<String>, rows: &mut [Row], tag: &str) -> usize {
    let key = tag.to_lowercase();
    custom.retain(|t| t.to_lowercase() != key);
    let removed = [tag.to_owned()];
    rows.iter_mut().map(|row| remove_tags(row, &removed)).filter(|changed| *changed).count()
}
