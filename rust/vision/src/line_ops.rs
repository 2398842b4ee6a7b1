// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line rasterization

/// Error-term stepping from `(x0, y0)` to `(x1, y1)`, both endpoints included
fn trace(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<(i64, i64)> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut points = Vec::with_capacity(dx.max(-dy) as usize + 1);
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;

    loop {
        points.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    points
}

/// Grid points on the segment from `(x0, y0)` to `(x1, y1)` (Bresenham).
///
/// Both endpoints are included and the sequence starts at `(x0, y0)`. The
/// error term breaks ties depending on travel direction, so the segment is
/// always traced from its lexicographically smaller endpoint: swapping start
/// and end yields exactly the same points in reverse order.
pub fn bresenham_line(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<(i64, i64)> {
    if (x1, y1) < (x0, y0) {
        let mut points = trace(x1, y1, x0, y0);
        points.reverse();
        points
    } else {
        trace(x0, y0, x1, y1)
    }
}
