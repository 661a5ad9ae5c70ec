//! Viewport intersection measurement and the scroll-triggered observers
//! built on it.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    dom::{Document, ElementId},
    types::Rect,
};

/// Grows (positive) or shrinks (negative) the viewport before measuring.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margin {
    pub fn bottom(bottom: f32) -> Self {
        Self {
            bottom,
            ..Self::default()
        }
    }

    fn apply(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.x - self.left,
            rect.y - self.top,
            (rect.width + self.left + self.right).max(0.0),
            (rect.height + self.top + self.bottom).max(0.0),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f32,
    pub root_margin: Margin,
}

impl ObserverOptions {
    pub fn threshold(threshold: f32) -> Self {
        Self {
            threshold,
            root_margin: Margin::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub ratio: f32,
    pub is_intersecting: bool,
}

/// Visible fraction of `target` inside `root`. A zero-area target counts as
/// fully visible when it sits inside the root.
pub fn intersection_ratio(target: Rect, root: Rect) -> f32 {
    let Some(overlap) = target.intersection(&root) else {
        return 0.0;
    };
    let area = target.area();
    if area <= 0.0 {
        return 1.0;
    }
    (overlap.area() / area).clamp(0.0, 1.0)
}

/// Measures `targets` against the current viewport. Targets without layout
/// are skipped.
pub fn measure<D: Document>(
    doc: &D,
    targets: &[ElementId],
    options: &ObserverOptions,
) -> Vec<IntersectionEntry> {
    let root = options.root_margin.apply(doc.viewport().rect());
    targets
        .iter()
        .filter_map(|&target| {
            let rect = doc.rect(target)?;
            let ratio = intersection_ratio(rect, root);
            Some(IntersectionEntry {
                target,
                ratio,
                is_intersecting: ratio > 0.0 && ratio >= options.threshold,
            })
        })
        .collect()
}

/// Reports an entry only when a target's intersecting state flips. The
/// first measurement of a target always reports.
#[derive(Debug)]
pub struct IntersectionTracker {
    options: ObserverOptions,
    targets: Vec<ElementId>,
    last: HashMap<ElementId, bool>,
}

impl IntersectionTracker {
    pub fn new(options: ObserverOptions, targets: Vec<ElementId>) -> Self {
        Self {
            options,
            targets,
            last: HashMap::new(),
        }
    }

    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    pub fn unobserve(&mut self, target: ElementId) {
        self.targets.retain(|t| *t != target);
        self.last.remove(&target);
    }

    pub fn poll<D: Document>(&mut self, doc: &D) -> Vec<IntersectionEntry> {
        self.targets.retain(|t| doc.is_connected(*t));
        measure(doc, &self.targets, &self.options)
            .into_iter()
            .filter(|entry| {
                let prev = self.last.insert(entry.target, entry.is_intersecting);
                prev != Some(entry.is_intersecting)
            })
            .collect()
    }
}

/// Adds a terminal class to each watched element the first time it becomes
/// visible, then forgets the element.
#[derive(Debug)]
pub struct OneShotObserver {
    name: &'static str,
    class: &'static str,
    tracker: IntersectionTracker,
}

impl OneShotObserver {
    /// `None` when nothing on the page matches.
    pub fn install(
        name: &'static str,
        targets: Vec<ElementId>,
        class: &'static str,
        options: ObserverOptions,
    ) -> Option<Self> {
        if targets.is_empty() {
            debug!(observer = name, "no targets, observer disabled");
            return None;
        }
        debug!(observer = name, targets = targets.len(), "observer installed");
        Some(Self {
            name,
            class,
            tracker: IntersectionTracker::new(options, targets),
        })
    }

    pub fn watching(&self) -> usize {
        self.tracker.targets().len()
    }

    /// Applies the class to newly visible targets and returns them.
    pub fn poll<D: Document>(&mut self, doc: &mut D) -> Vec<ElementId> {
        let entries = self.tracker.poll(&*doc);
        self.deliver(doc, &entries)
    }

    /// Handles a batch of entries as an observer callback would.
    pub fn deliver<D: Document>(
        &mut self,
        doc: &mut D,
        entries: &[IntersectionEntry],
    ) -> Vec<ElementId> {
        let mut activated = Vec::new();
        for entry in entries {
            if !entry.is_intersecting || !self.tracker.targets().contains(&entry.target) {
                continue;
            }
            doc.add_class(entry.target, self.class);
            self.tracker.unobserve(entry.target);
            activated.push(entry.target);
        }
        if !activated.is_empty() {
            debug!(
                observer = self.name,
                activated = activated.len(),
                remaining = self.watching(),
                "elements activated"
            );
        }
        activated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Page;

    fn page_with_block(top: f32, height: f32) -> (Page, ElementId) {
        let mut page = Page::new(1000.0, 1000.0);
        let body = page.body();
        let el = page
            .append(body, "div")
            .attr("data-reveal", "")
            .rect(Rect::new(0.0, top, 1000.0, height))
            .build();
        // Tail so the page can scroll.
        page.append(body, "footer")
            .rect(Rect::new(0.0, 4000.0, 1000.0, 100.0))
            .build();
        (page, el)
    }

    mod ratio {
        use super::*;

        #[test]
        fn partial_overlap() {
            let root = Rect::new(0.0, 0.0, 100.0, 100.0);
            let target = Rect::new(0.0, 75.0, 100.0, 100.0);
            assert_eq!(intersection_ratio(target, root), 0.25);
        }

        #[test]
        fn outside_is_zero() {
            let root = Rect::new(0.0, 0.0, 100.0, 100.0);
            let target = Rect::new(0.0, 300.0, 10.0, 10.0);
            assert_eq!(intersection_ratio(target, root), 0.0);
        }

        #[test]
        fn zero_area_inside_is_one() {
            let root = Rect::new(0.0, 0.0, 100.0, 100.0);
            let target = Rect::new(50.0, 50.0, 0.0, 0.0);
            assert_eq!(intersection_ratio(target, root), 1.0);
        }

        #[test]
        fn negative_bottom_margin_shrinks_root() {
            let (page, el) = page_with_block(980.0, 100.0);
            let plain = measure(&page, &[el], &ObserverOptions::threshold(0.0));
            assert!(plain[0].is_intersecting);
            let shrunk = measure(
                &page,
                &[el],
                &ObserverOptions {
                    threshold: 0.0,
                    root_margin: Margin::bottom(-40.0),
                },
            );
            assert!(!shrunk[0].is_intersecting);
        }
    }

    mod tracker {
        use super::*;

        #[test]
        fn reports_first_state_then_only_changes() {
            let (mut page, el) = page_with_block(1500.0, 100.0);
            let mut tracker = IntersectionTracker::new(ObserverOptions::threshold(0.5), vec![el]);
            let first = tracker.poll(&page);
            assert_eq!(first.len(), 1);
            assert!(!first[0].is_intersecting);
            assert!(tracker.poll(&page).is_empty());
            page.scroll_to(1000.0);
            let entered = tracker.poll(&page);
            assert_eq!(entered.len(), 1);
            assert!(entered[0].is_intersecting);
            assert!(tracker.poll(&page).is_empty());
        }

        #[test]
        fn drops_removed_targets() {
            let (mut page, el) = page_with_block(0.0, 100.0);
            let mut tracker = IntersectionTracker::new(ObserverOptions::threshold(0.1), vec![el]);
            page.remove_element(el);
            assert!(tracker.poll(&page).is_empty());
            assert!(tracker.targets().is_empty());
        }
    }

    mod one_shot {
        use super::*;

        fn reveal(el: ElementId) -> OneShotObserver {
            OneShotObserver::install(
                "reveal",
                vec![el],
                "revealed",
                ObserverOptions::threshold(0.12),
            )
            .expect("has targets")
        }

        #[test]
        fn no_targets_disables() {
            assert!(
                OneShotObserver::install("x", Vec::new(), "on", ObserverOptions::threshold(0.1))
                    .is_none()
            );
        }

        #[test]
        fn fifteen_percent_visible_activates_exactly_once() {
            // 100 tall block with its top 15 units inside the viewport.
            let (mut page, el) = page_with_block(985.0, 100.0);
            let mut observer = reveal(el);
            let activated = observer.poll(&mut page);
            assert_eq!(activated, vec![el]);
            assert!(page.has_class(el, "revealed"));
            assert_eq!(observer.watching(), 0);

            page.remove_class(el, "revealed");
            let again = IntersectionEntry {
                target: el,
                ratio: 0.9,
                is_intersecting: true,
            };
            assert!(observer.deliver(&mut page, &[again]).is_empty());
            assert!(!page.has_class(el, "revealed"));
        }

        #[test]
        fn below_threshold_waits_for_scroll() {
            let (mut page, el) = page_with_block(990.0, 100.0);
            let mut observer = reveal(el);
            assert!(observer.poll(&mut page).is_empty());
            assert!(!page.has_class(el, "revealed"));
            page.scroll_to(200.0);
            assert_eq!(observer.poll(&mut page), vec![el]);
        }

        #[test]
        fn scrolling_away_never_reverts() {
            let (mut page, el) = page_with_block(0.0, 100.0);
            let mut observer = reveal(el);
            observer.poll(&mut page);
            page.scroll_to(3000.0);
            assert!(observer.poll(&mut page).is_empty());
            assert!(page.has_class(el, "revealed"));
        }
    }
}
