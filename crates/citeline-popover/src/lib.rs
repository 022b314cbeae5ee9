//! citeline-popover: citation popover logic without UI dependencies.
//!
//! This crate provides:
//! - `TooltipController` - the Hidden/Visible/Pinned state machine for the
//!   single shared popover, driven by typed events
//! - `place` - measure-then-place viewport positioning
//! - Geometry types shared with the host

pub mod position;
pub mod tooltip;
pub mod types;

pub use position::place;
pub use tooltip::{
    ActiveCitation, PopoverContent, TimerId, TooltipController, TooltipDiagnostic,
    TooltipEffect, TooltipEvent, TooltipSettings, TooltipState,
};
pub use types::{CitationTarget, Point, Rect, Size};
