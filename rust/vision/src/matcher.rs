// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate pair generation
//!
//! Items of one element type are split into vertical and horizontal groups,
//! each sorted by projection center, and paired within their group. Two
//! element types are paired by cross product. Elements whose orientation does
//! not constrain matching are coerced onto both axes, always as copies.

use crate::error::Result;
use crate::types::{ConflictCandidate, Orientation, SpatialItem};
use std::cmp::Ordering;

/// Copies of `items`, all set to `orientation`
pub fn coerce_all(items: &[SpatialItem], orientation: Orientation) -> Vec<SpatialItem> {
    items
        .iter()
        .map(|item| item.with_orientation(orientation))
        .collect()
}

/// Stable sort by projection center; ties keep input order
fn sort_by_projection_center(items: &mut [SpatialItem]) -> Result<()> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items.iter() {
        keyed.push(item.projection_center()?);
    }
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| keyed[a].partial_cmp(&keyed[b]).unwrap_or(Ordering::Equal));

    let sorted: Vec<SpatialItem> = order.into_iter().map(|i| items[i].clone()).collect();
    items.clone_from_slice(&sorted);
    Ok(())
}

/// All `C(n, 2)` pairs of an already grouped and sorted list
fn combinations(items: &[SpatialItem], orientation: Orientation) -> Vec<ConflictCandidate> {
    let mut pairs = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            pairs.push(ConflictCandidate::new(
                items[i].clone(),
                items[j].clone(),
                orientation,
            ));
        }
    }
    pairs
}

/// Pairs among items grouped by their own orientation.
///
/// Vertical pairs come first, then horizontal pairs. Cross-orientation pairs
/// are never produced.
pub fn grouped_pairs(items: &[SpatialItem]) -> Result<Vec<ConflictCandidate>> {
    let mut vertical = Vec::new();
    let mut horizontal = Vec::new();
    for item in items {
        match item.require_orientation()? {
            Orientation::Vertical => vertical.push(item.clone()),
            Orientation::Horizontal => horizontal.push(item.clone()),
        }
    }

    sort_by_projection_center(&mut vertical)?;
    sort_by_projection_center(&mut horizontal)?;

    let mut pairs = combinations(&vertical, Orientation::Vertical);
    pairs.extend(combinations(&horizontal, Orientation::Horizontal));
    Ok(pairs)
}

/// Candidate pairs among instances of a single element type
pub fn single_type_pairs(
    items: &[SpatialItem],
    check_orientation: bool,
) -> Result<Vec<ConflictCandidate>> {
    if check_orientation {
        return grouped_pairs(items);
    }

    let mut pairs = Vec::new();
    for axis in Orientation::AXES {
        pairs.extend(grouped_pairs(&coerce_all(items, axis))?);
    }
    Ok(pairs)
}

fn cross_product(
    first: &[SpatialItem],
    second: &[SpatialItem],
    orientation: impl Fn(&SpatialItem) -> Result<Orientation>,
) -> Result<Vec<ConflictCandidate>> {
    let mut pairs = Vec::with_capacity(first.len() * second.len());
    for a in first {
        let axis = orientation(a)?;
        for b in second {
            pairs.push(ConflictCandidate::new(a.clone(), b.clone(), axis));
        }
    }
    Ok(pairs)
}

/// Candidate pairs between two element types (no pairs within a type)
pub fn two_type_pairs(
    first: &[SpatialItem],
    first_checks: bool,
    second: &[SpatialItem],
    second_checks: bool,
) -> Result<Vec<ConflictCandidate>> {
    let mut pairs = Vec::new();

    match (first_checks, second_checks) {
        (false, false) => {
            for axis in Orientation::AXES {
                pairs.extend(cross_product(
                    &coerce_all(first, axis),
                    &coerce_all(second, axis),
                    |_| Ok(axis),
                )?);
            }
        }
        (true, false) => {
            for axis in Orientation::AXES {
                pairs.extend(cross_product(
                    first,
                    &coerce_all(second, axis),
                    SpatialItem::require_orientation,
                )?);
            }
        }
        (false, true) => {
            for axis in Orientation::AXES {
                pairs.extend(cross_product(
                    &coerce_all(first, axis),
                    second,
                    SpatialItem::require_orientation,
                )?);
            }
        }
        (true, true) => {
            pairs.extend(cross_product(first, second, SpatialItem::require_orientation)?);
        }
    }

    Ok(pairs)
}
