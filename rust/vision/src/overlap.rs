// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projection overlap between two same-orientation items
//!
//! The four endpoints of both projection intervals are sorted into
//! `p1 <= p2 <= p3 <= p4`. When `p1` and `p2` come from the same item the
//! intervals are disjoint (or only touch); otherwise the overlap rate is the
//! intersection `p3 - p2` over the union `p4 - p1`.

use crate::error::Result;
use crate::types::{ConflictCandidate, Interval, OverlapResult, SpatialItem};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    First,
    Second,
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    value: f64,
    closing: bool,
    owner: Owner,
}

/// Sort endpoints by value; at equal values a closing endpoint comes first so
/// that touching intervals order the same way whichever item is passed first.
fn ordered_endpoints(a: &Interval, b: &Interval) -> [Endpoint; 4] {
    let mut points = [
        Endpoint { value: a.min, closing: false, owner: Owner::First },
        Endpoint { value: a.max, closing: true, owner: Owner::First },
        Endpoint { value: b.min, closing: false, owner: Owner::Second },
        Endpoint { value: b.max, closing: true, owner: Owner::Second },
    ];
    points.sort_by(|p, q| {
        p.value
            .partial_cmp(&q.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| q.closing.cmp(&p.closing))
    });
    points
}

/// Intersection-over-union rate and containment of two intervals
pub fn interval_overlap(a: &Interval, b: &Interval) -> (f64, bool) {
    let [p1, p2, p3, p4] = ordered_endpoints(a, b);

    if p1.owner == p2.owner {
        return (0.0, false);
    }

    let union = p4.value - p1.value;
    if union <= 0.0 {
        return (0.0, false);
    }

    let intersection = p3.value - p2.value;
    let rate = if intersection >= 0.0 {
        (intersection / union).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let full_coverage = a.contains(b) || b.contains(a) || rate == 1.0;
    (rate, full_coverage)
}

/// Compare two items along their shared orientation axis.
///
/// Items with different orientations have no facing relationship and yield a
/// zero rate. An item without an orientation is a matching bug and fails.
pub fn projection_overlap(first: &SpatialItem, second: &SpatialItem) -> Result<OverlapResult> {
    let orientation = first.require_orientation()?;
    overlap_candidate(ConflictCandidate::new(first.clone(), second.clone(), orientation))
}

/// Compute the overlap result for a prepared candidate
pub fn overlap_candidate(candidate: ConflictCandidate) -> Result<OverlapResult> {
    let a_orient = candidate.first.require_orientation()?;
    let b_orient = candidate.second.require_orientation()?;

    if a_orient != b_orient {
        return Ok(OverlapResult {
            candidate,
            rate: 0.0,
            full_coverage: false,
        });
    }

    let (rate, full_coverage) = interval_overlap(
        &candidate.first.projection()?,
        &candidate.second.projection()?,
    );

    Ok(OverlapResult {
        candidate,
        rate,
        full_coverage,
    })
}
