//! Tooltip controller: one shared popover driven by pointer and timer events.
//!
//! The controller owns the popover's visibility state and never touches a UI
//! directly. Hosts feed it [`TooltipEvent`]s and apply the returned
//! [`TooltipEffect`]s (show or hide the popover, start or cancel the hide
//! timer). At most one hide timer is live at a time; scheduling a new one
//! cancels the previous one first.
//!
//! | state   | event                     | next                          |
//! |---------|---------------------------|-------------------------------|
//! | Hidden  | enter citation            | Visible (or Hidden if no source) |
//! | Visible | leave citation or popover | Visible, hide timer scheduled |
//! | Visible | enter popover             | Visible, timer cancelled      |
//! | Visible | enter other citation      | Visible on the new citation   |
//! | any     | click citation            | Pinned on that citation       |
//! | Pinned  | leave / hover             | Pinned (ignored)              |
//! | any     | click outside             | Hidden                        |
//! | Visible | live timer elapsed        | Hidden                        |

use std::fmt;
use std::time::Duration;

use citeline_common::{Source, SourceLookup, TooltipConfig};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::position::place;
use crate::types::{CitationTarget, Point, Rect, Size};

/// Popover visibility.
#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TooltipState {
    #[default]
    Hidden,
    /// Shown on hover; hides after the delay once the pointer leaves.
    Visible,
    /// Shown on click; stays until a click outside.
    Pinned,
}

/// Identifies one scheduled hide timer.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Input events from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TooltipEvent {
    PointerEnterCitation {
        anchor: Rect,
        citation: CitationTarget,
    },
    PointerLeaveCitation,
    PointerEnterPopover,
    PointerLeavePopover,
    ClickCitation {
        anchor: Rect,
        citation: CitationTarget,
    },
    ClickOutside,
    HideTimerElapsed { timer: TimerId },
}

/// Work the host must carry out after an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TooltipEffect {
    /// Fill the popover for `citation` and show it next to `anchor`.
    Show {
        citation: CitationTarget,
        anchor: Rect,
    },
    Hide,
    /// Start a timer that reports back with `HideTimerElapsed { timer }`.
    ScheduleHide { timer: TimerId, delay_ms: u64 },
    CancelHide { timer: TimerId },
}

/// Problems recorded while handling events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TooltipDiagnostic {
    /// A citation pointed at a source its section does not carry.
    MissingSource {
        section_key: SmolStr,
        source_id: SmolStr,
    },
}

/// The citation the popover is currently showing.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveCitation {
    pub citation: CitationTarget,
    pub anchor: Rect,
}

/// What the popover displays for a source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PopoverContent {
    pub display_number: u32,
    pub title: String,
    pub page_label: Option<String>,
    pub excerpt: String,
}

impl PopoverContent {
    /// Build display content, cutting the excerpt to `max_chars` characters.
    pub fn from_source(source: &Source, display_number: u32, max_chars: usize) -> Self {
        let title = source
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| format!("Source {display_number}"), str::to_string);
        let excerpt = source.raw_text.as_deref().unwrap_or_default().trim();

        Self {
            display_number,
            title,
            page_label: source.page_label(),
            excerpt: truncate_chars(excerpt, max_chars),
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = text[..cut].trim_end().to_string();
            out.push('…');
            out
        }
        None => text.to_string(),
    }
}

/// Controller settings, usually built from [`TooltipConfig`].
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct TooltipSettings {
    pub hide_delay: Duration,
    pub padding: f64,
    pub excerpt_max_chars: usize,
}

impl Default for TooltipSettings {
    fn default() -> Self {
        Self::from(&TooltipConfig::default())
    }
}

impl From<&TooltipConfig> for TooltipSettings {
    fn from(config: &TooltipConfig) -> Self {
        Self {
            hide_delay: Duration::from_millis(config.hide_delay_ms),
            padding: config.padding,
            excerpt_max_chars: config.excerpt_max_chars,
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq)]
struct PendingHide {
    timer: TimerId,
    scheduled_at: Instant,
}

/// State machine for the shared citation popover.
#[derive(Clone, Debug, Default)]
pub struct TooltipController {
    settings: TooltipSettings,
    state: TooltipState,
    active: Option<ActiveCitation>,
    pending_hide: Option<PendingHide>,
    next_timer: u64,
    diagnostics: Vec<TooltipDiagnostic>,
}

impl From<&TooltipConfig> for TooltipController {
    fn from(config: &TooltipConfig) -> Self {
        Self::new(TooltipSettings::from(config))
    }
}

impl TooltipController {
    pub fn new(settings: TooltipSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &TooltipSettings {
        &self.settings
    }

    pub fn state(&self) -> TooltipState {
        self.state
    }

    pub fn active(&self) -> Option<&ActiveCitation> {
        self.active.as_ref()
    }

    /// The live hide timer, if one is scheduled.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending_hide.map(|pending| pending.timer)
    }

    pub fn diagnostics(&self) -> &[TooltipDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<TooltipDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Apply one event. Returns the effects for the host, in order.
    pub fn handle<L>(&mut self, event: TooltipEvent, lookup: &L) -> Vec<TooltipEffect>
    where
        L: SourceLookup + ?Sized,
    {
        trace!(state = ?self.state, ?event, "tooltip event");
        let mut effects = Vec::new();

        match event {
            TooltipEvent::PointerEnterCitation { anchor, citation } => match self.state {
                // hovering elsewhere never moves a pinned popover
                TooltipState::Pinned => {}
                TooltipState::Hidden | TooltipState::Visible => {
                    self.cancel_hide(&mut effects);
                    if self.is_showing(&citation, &anchor) {
                        return effects;
                    }
                    if self.resolves(&citation, lookup) {
                        self.show(citation, anchor, TooltipState::Visible, &mut effects);
                    } else {
                        self.hide(&mut effects);
                    }
                }
            },
            TooltipEvent::PointerLeaveCitation | TooltipEvent::PointerLeavePopover => {
                if self.state == TooltipState::Visible {
                    self.schedule_hide(&mut effects);
                }
            }
            TooltipEvent::PointerEnterPopover => {
                self.cancel_hide(&mut effects);
            }
            TooltipEvent::ClickCitation { anchor, citation } => {
                self.cancel_hide(&mut effects);
                if self.resolves(&citation, lookup) {
                    if self.is_showing(&citation, &anchor) {
                        self.state = TooltipState::Pinned;
                        debug!(source_id = %citation.source_id, "tooltip pinned");
                    } else {
                        self.show(citation, anchor, TooltipState::Pinned, &mut effects);
                    }
                } else {
                    self.hide(&mut effects);
                }
            }
            TooltipEvent::ClickOutside => {
                self.cancel_hide(&mut effects);
                self.hide(&mut effects);
            }
            TooltipEvent::HideTimerElapsed { timer } => {
                if self.pending_timer() != Some(timer) {
                    debug!(%timer, "ignoring stale hide timer");
                    return effects;
                }
                self.pending_hide = None;
                if self.state == TooltipState::Visible {
                    self.hide(&mut effects);
                }
            }
        }

        effects
    }

    /// Fire the pending hide if its delay has passed by `now`.
    ///
    /// For hosts that poll a clock instead of running timers.
    pub fn poll(&mut self, now: Instant) -> Vec<TooltipEffect> {
        let mut effects = Vec::new();
        if let Some(pending) = self.pending_hide {
            if now.saturating_duration_since(pending.scheduled_at) >= self.settings.hide_delay {
                self.pending_hide = None;
                if self.state == TooltipState::Visible {
                    self.hide(&mut effects);
                }
            }
        }
        effects
    }

    /// Return to `Hidden` with no timer and no recorded diagnostics.
    pub fn reset(&mut self) -> Vec<TooltipEffect> {
        let mut effects = Vec::new();
        self.diagnostics.clear();
        self.cancel_hide(&mut effects);
        self.hide(&mut effects);
        effects
    }

    /// Where to put a popover measured at `popover`, next to the active anchor.
    pub fn position(&self, popover: Size, viewport: Size) -> Option<Point> {
        let active = self.active.as_ref()?;
        Some(place(active.anchor, popover, viewport, self.settings.padding))
    }

    /// Content for the active citation.
    pub fn content<L>(&self, lookup: &L) -> Option<PopoverContent>
    where
        L: SourceLookup + ?Sized,
    {
        let active = self.active.as_ref()?;
        let source =
            lookup.lookup_source(&active.citation.section_key, &active.citation.source_id)?;
        Some(PopoverContent::from_source(
            source,
            active.citation.display_number,
            self.settings.excerpt_max_chars,
        ))
    }

    /// Whether the popover is already up for this citation at this anchor.
    ///
    /// Repeated markers share a target, so the anchor tells them apart.
    fn is_showing(&self, citation: &CitationTarget, anchor: &Rect) -> bool {
        self.state != TooltipState::Hidden
            && self
                .active
                .as_ref()
                .is_some_and(|active| &active.citation == citation && &active.anchor == anchor)
    }

    fn resolves<L>(&mut self, citation: &CitationTarget, lookup: &L) -> bool
    where
        L: SourceLookup + ?Sized,
    {
        if lookup
            .lookup_source(&citation.section_key, &citation.source_id)
            .is_some()
        {
            return true;
        }
        warn!(
            section = %citation.section_key,
            source_id = %citation.source_id,
            "no source for citation, popover suppressed"
        );
        self.diagnostics.push(TooltipDiagnostic::MissingSource {
            section_key: citation.section_key.clone(),
            source_id: citation.source_id.clone(),
        });
        false
    }

    fn show(
        &mut self,
        citation: CitationTarget,
        anchor: Rect,
        state: TooltipState,
        effects: &mut Vec<TooltipEffect>,
    ) {
        debug!(source_id = %citation.source_id, ?state, "tooltip shown");
        self.state = state;
        self.active = Some(ActiveCitation {
            citation: citation.clone(),
            anchor,
        });
        effects.push(TooltipEffect::Show { citation, anchor });
    }

    fn hide(&mut self, effects: &mut Vec<TooltipEffect>) {
        if self.state == TooltipState::Hidden {
            return;
        }
        debug!("tooltip hidden");
        self.state = TooltipState::Hidden;
        self.active = None;
        effects.push(TooltipEffect::Hide);
    }

    fn schedule_hide(&mut self, effects: &mut Vec<TooltipEffect>) {
        self.cancel_hide(effects);
        self.next_timer += 1;
        let timer = TimerId(self.next_timer);
        self.pending_hide = Some(PendingHide {
            timer,
            scheduled_at: Instant::now(),
        });
        effects.push(TooltipEffect::ScheduleHide {
            timer,
            delay_ms: u64::try_from(self.settings.hide_delay.as_millis()).unwrap_or(u64::MAX),
        });
    }

    fn cancel_hide(&mut self, effects: &mut Vec<TooltipEffect>) {
        if let Some(pending) = self.pending_hide.take() {
            effects.push(TooltipEffect::CancelHide {
                timer: pending.timer,
            });
        }
    }
}
