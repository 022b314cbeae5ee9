//! Viewport placement for the popover.
//!
//! Placement needs the popover's own size, so hosts measure first and then
//! call [`place`] with the result.

use crate::types::{Point, Rect, Size};

/// Top-left corner for a popover of size `popover` next to `anchor`.
///
/// Prefers the right of the anchor, top-aligned with it. Flips to the left
/// when the right edge would overflow, moves up when the bottom would
/// overflow, and finally keeps both coordinates at least `padding` from the
/// top-left. The result is never negative.
pub fn place(anchor: Rect, popover: Size, viewport: Size, padding: f64) -> Point {
    let padding = if padding.is_finite() {
        padding.max(0.0)
    } else {
        0.0
    };

    let mut x = anchor.right() + padding;
    if x + popover.width > viewport.width - padding {
        x = anchor.x - popover.width - padding;
    }

    let mut y = anchor.y;
    if y + popover.height > viewport.height - padding {
        y = viewport.height - popover.height - padding;
    }

    Point::new(x.max(padding), y.max(padding))
}
