//! Header and navigation behaviour: shrink on scroll, mobile menu, active
//! section highlight and smooth anchor scrolling.

use std::time::Duration;

use tracing::debug;

use crate::{
    config::{self, ScrollSettings},
    dom::{Document, ElementId},
    observe::{IntersectionTracker, ObserverOptions},
};

const ACTIVE_COLOR: &str = "var(--purple-3)";
const ACTIVE_BACKGROUND: &str = "rgba(139,92,246,.1)";

#[derive(Debug)]
pub struct HeaderShrink {
    header: ElementId,
    threshold: f32,
}

impl HeaderShrink {
    pub fn install<D: Document>(doc: &mut D, threshold: f32) -> Option<Self> {
        let header = doc.elements_with_class("header").into_iter().next()?;
        let shrink = Self { header, threshold };
        shrink.update(doc);
        Some(shrink)
    }

    pub fn update<D: Document>(&self, doc: &mut D) {
        let scrolled = doc.viewport().scroll_y > self.threshold;
        doc.toggle_class(self.header, "scrolled", Some(scrolled));
    }
}

#[derive(Debug)]
pub struct MobileNav {
    toggle: ElementId,
    links: ElementId,
    anchors: Vec<ElementId>,
    open: bool,
}

impl MobileNav {
    pub fn install<D: Document>(doc: &D) -> Option<Self> {
        let (Some(toggle), Some(links)) = (
            doc.element_by_id("menu-toggle"),
            doc.element_by_id("nav-links"),
        ) else {
            debug!("menu toggle or nav links missing, mobile nav disabled");
            return None;
        };
        let anchors = doc.descendants_with_tag(links, "a");
        Some(Self {
            toggle,
            links,
            anchors,
            open: false,
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_element(&self) -> ElementId {
        self.toggle
    }

    /// Reacts to a click anywhere on the page.
    pub fn on_click<D: Document>(&mut self, doc: &mut D, target: Option<ElementId>) {
        let in_toggle = target.is_some_and(|t| doc.contains(self.toggle, t));
        if in_toggle {
            let open = !self.open;
            self.set_open(doc, open);
            return;
        }
        if !self.open {
            return;
        }
        let on_link = target.is_some_and(|t| self.anchors.iter().any(|a| doc.contains(*a, t)));
        let inside = target.is_some_and(|t| doc.contains(self.links, t));
        if on_link || !inside {
            self.set_open(doc, false);
        }
    }

    fn set_open<D: Document>(&mut self, doc: &mut D, open: bool) {
        doc.toggle_class(self.links, "open", Some(open));
        doc.toggle_class(self.toggle, "open", Some(open));
        doc.set_attr(self.toggle, "aria-expanded", if open { "true" } else { "false" });
        let body = doc.body();
        doc.set_style(body, "overflow", if open { "hidden" } else { "" });
        self.open = open;
        debug!(open, "mobile nav toggled");
    }
}

/// Marks the nav link pointing at whichever section most recently scrolled
/// into view.
#[derive(Debug)]
pub struct SectionHighlighter {
    links: Vec<ElementId>,
    tracker: IntersectionTracker,
    active: Option<String>,
}

impl SectionHighlighter {
    pub fn install<D: Document>(doc: &D) -> Option<Self> {
        let sections: Vec<ElementId> = doc
            .elements_with_attr("id")
            .into_iter()
            .filter(|el| doc.tag(*el).as_deref() == Some("section"))
            .collect();
        let links: Vec<ElementId> = doc
            .elements_with_class("nav-links")
            .into_iter()
            .flat_map(|nav| doc.descendants_with_tag(nav, "a"))
            .collect();
        if sections.is_empty() || links.is_empty() {
            return None;
        }
        let tracker = IntersectionTracker::new(
            ObserverOptions::threshold(config::SECTION_THRESHOLD),
            sections,
        );
        Some(Self {
            links,
            tracker,
            active: None,
        })
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn poll<D: Document>(&mut self, doc: &mut D) {
        for entry in self.tracker.poll(&*doc) {
            if !entry.is_intersecting {
                continue;
            }
            let Some(id) = doc.attr(entry.target, "id") else {
                continue;
            };
            if self.active.as_deref() == Some(id.as_str()) {
                continue;
            }
            let href = format!("#{id}");
            for &link in &self.links {
                let on = doc.attr(link, "href").as_deref() == Some(href.as_str());
                doc.set_style(link, "color", if on { ACTIVE_COLOR } else { "" });
                doc.set_style(link, "background", if on { ACTIVE_BACKGROUND } else { "" });
            }
            self.active = Some(id);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ScrollTween {
    from: f32,
    to: f32,
    start: Duration,
}

/// Eased scrolling to in-page anchors, stepped once per frame.
#[derive(Debug)]
pub struct SmoothScroll {
    offset: f32,
    duration: Duration,
    tween: Option<ScrollTween>,
}

impl SmoothScroll {
    pub fn new(settings: &ScrollSettings) -> Self {
        Self {
            offset: settings.anchor_offset,
            duration: Duration::from_millis(settings.smooth_ms),
            tween: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.tween.is_some()
    }

    /// Element named by the `#fragment` of the clicked link, if any.
    pub fn anchor_target<D: Document>(doc: &D, target: ElementId) -> Option<ElementId> {
        let link = doc.closest_with_attr(target, "href")?;
        let href = doc.attr(link, "href")?;
        let id = href.strip_prefix('#').filter(|id| !id.is_empty())?;
        doc.element_by_id(id)
    }

    /// Starts scrolling towards the anchor under `target`. Returns true when
    /// the click was consumed.
    pub fn on_click<D: Document>(&mut self, doc: &D, target: ElementId, now: Duration) -> bool {
        let Some(dest) = Self::anchor_target(doc, target) else {
            return false;
        };
        let Some(rect) = doc.rect(dest) else {
            return false;
        };
        let to = (rect.y - self.offset).clamp(0.0, doc.max_scroll());
        self.tween = Some(ScrollTween {
            from: doc.viewport().scroll_y,
            to,
            start: now,
        });
        true
    }

    /// Advances the running scroll. Returns true if the page scrolled.
    pub fn step<D: Document>(&mut self, doc: &mut D, now: Duration) -> bool {
        let Some(tween) = self.tween else {
            return false;
        };
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (now.saturating_sub(tween.start).as_secs_f32() / self.duration.as_secs_f32())
                .clamp(0.0, 1.0)
        };
        let y = tween.from + (tween.to - tween.from) * ease_in_out_cubic(t);
        let before = doc.viewport().scroll_y;
        doc.scroll_to(y);
        if t >= 1.0 {
            self.tween = None;
        }
        doc.viewport().scroll_y != before
    }

    pub fn cancel(&mut self) {
        self.tween = None;
    }
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
