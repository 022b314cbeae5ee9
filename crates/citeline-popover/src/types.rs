//! Geometry and citation identity shared by the controller and the positioner.
//!
//! Coordinates are CSS pixels in viewport space, origin top-left.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A point in viewport coordinates.
#[derive(Clone, Debug, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a measured element.
#[derive(Clone, Debug, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Bounding box of an element, as reported by the host.
#[derive(Clone, Debug, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Attributes carried by a rendered citation element.
///
/// Enough to resolve the source without re-parsing any text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationTarget {
    pub source_id: SmolStr,
    pub section_key: SmolStr,
    pub display_number: u32,
}

impl CitationTarget {
    pub fn new(
        section_key: impl Into<SmolStr>,
        source_id: impl Into<SmolStr>,
        display_number: u32,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            section_key: section_key.into(),
            display_number,
        }
    }
}
