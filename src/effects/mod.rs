//! Short-lived decorations: cursor trail marks, button ripples, card flashes
//! and hover pulses. Each one is undone by a scheduled task.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::Duration,
};

use tracing::debug;

use crate::{
    config::EffectSettings,
    dom::{Document, ElementId},
    schedule::{Scheduler, TaskHandle},
    types::{Rect, Rgba, Vec2},
};

const TRAIL_MARK_SIZE: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTask {
    RemoveTrail(ElementId),
    RemoveRipple(ElementId),
    EndFlash(ElementId),
    EndPulse(ElementId),
}

/// Bounded FIFO of transient elements, each with a pending removal task.
#[derive(Debug)]
struct MarkQueue {
    max: usize,
    marks: VecDeque<(ElementId, TaskHandle)>,
}

impl MarkQueue {
    fn new(max: usize) -> Self {
        Self {
            max,
            marks: VecDeque::new(),
        }
    }

    /// Frees room for one more mark, evicting the oldest ones early.
    fn make_room<D, T>(&mut self, doc: &mut D, sched: &mut Scheduler<T>, kind: &'static str)
    where
        D: Document,
        T: Clone,
    {
        while !self.marks.is_empty() && self.marks.len() >= self.max {
            if let Some((el, handle)) = self.marks.pop_front() {
                sched.cancel(handle);
                doc.remove_element(el);
                debug!(kind, "evicted oldest mark");
            }
        }
    }

    fn push(&mut self, el: ElementId, handle: TaskHandle) {
        self.marks.push_back((el, handle));
    }

    fn expire<D: Document>(&mut self, doc: &mut D, el: ElementId) {
        self.marks.retain(|(id, _)| *id != el);
        doc.remove_element(el);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.marks.len()
    }
}

#[derive(Debug)]
pub struct CursorTrail {
    ttl: Duration,
    min_step: f32,
    last: Option<Vec2>,
    marks: MarkQueue,
}

impl CursorTrail {
    pub fn new(settings: &EffectSettings) -> Self {
        Self {
            ttl: Duration::from_millis(settings.trail_ttl_ms),
            min_step: settings.trail_min_step,
            last: None,
            marks: MarkQueue::new(settings.trail_max),
        }
    }

    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.marks.len()
    }

    /// Drops a mark at `point` (viewport coordinates) once the pointer has
    /// travelled far enough from the previous one.
    pub fn on_pointer_move<D, T>(
        &mut self,
        doc: &mut D,
        sched: &mut Scheduler<T>,
        point: Vec2,
        accent: Rgba,
    ) -> Option<ElementId>
    where
        D: Document,
        T: Clone + From<EffectTask>,
    {
        if self.marks.max == 0 {
            return None;
        }
        if self.last.is_some_and(|last| last.distance(point) < self.min_step) {
            return None;
        }
        self.last = Some(point);
        self.marks.make_room(doc, sched, "trail");

        let body = doc.body();
        let el = doc.create_element("span", body);
        doc.add_class(el, "cursor-pixel");
        doc.set_style(el, "position", "fixed");
        doc.set_style(el, "background", &accent.to_hex());
        let half = TRAIL_MARK_SIZE / 2.0;
        doc.set_rect(
            el,
            Rect::new(point.x - half, point.y - half, TRAIL_MARK_SIZE, TRAIL_MARK_SIZE),
        );
        let handle = sched.after(self.ttl, EffectTask::RemoveTrail(el).into());
        self.marks.push(el, handle);
        Some(el)
    }

    pub fn expire<D: Document>(&mut self, doc: &mut D, el: ElementId) {
        self.marks.expire(doc, el);
    }
}

#[derive(Debug)]
pub struct Ripples {
    ttl: Duration,
    marks: MarkQueue,
}

impl Ripples {
    pub fn new(settings: &EffectSettings) -> Self {
        Self {
            ttl: Duration::from_millis(settings.ripple_ttl_ms),
            marks: MarkQueue::new(settings.ripple_max),
        }
    }

    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.marks.len()
    }

    /// Spawns a ripple inside the `.btn` under `target`, centred on `point`
    /// (document coordinates).
    pub fn on_click<D, T>(
        &mut self,
        doc: &mut D,
        sched: &mut Scheduler<T>,
        target: ElementId,
        point: Vec2,
    ) -> Option<ElementId>
    where
        D: Document,
        T: Clone + From<EffectTask>,
    {
        if self.marks.max == 0 {
            return None;
        }
        let button = doc.closest_with_class(target, "btn")?;
        let bounds = doc.rect(button)?;
        self.marks.make_room(doc, sched, "ripple");

        let size = bounds.width.max(bounds.height);
        let el = doc.create_element("span", button);
        doc.add_class(el, "ripple");
        doc.set_rect(
            el,
            Rect::new(point.x - size / 2.0, point.y - size / 2.0, size, size),
        );
        let handle = sched.after(self.ttl, EffectTask::RemoveRipple(el).into());
        self.marks.push(el, handle);
        Some(el)
    }

    pub fn expire<D: Document>(&mut self, doc: &mut D, el: ElementId) {
        self.marks.expire(doc, el);
    }
}

/// `flash` class on a clicked `.card`; a repeat click restarts the timer.
#[derive(Debug)]
pub struct ClickFlash {
    duration: Duration,
    pending: HashMap<ElementId, TaskHandle>,
}

impl ClickFlash {
    pub fn new(settings: &EffectSettings) -> Self {
        Self {
            duration: Duration::from_millis(settings.flash_ms),
            pending: HashMap::new(),
        }
    }

    pub fn on_click<D, T>(
        &mut self,
        doc: &mut D,
        sched: &mut Scheduler<T>,
        target: ElementId,
    ) -> Option<ElementId>
    where
        D: Document,
        T: Clone + From<EffectTask>,
    {
        let card = doc.closest_with_class(target, "card")?;
        if let Some(handle) = self.pending.remove(&card) {
            sched.cancel(handle);
        }
        doc.add_class(card, "flash");
        let handle = sched.after(self.duration, EffectTask::EndFlash(card).into());
        self.pending.insert(card, handle);
        Some(card)
    }

    pub fn end<D: Document>(&mut self, doc: &mut D, card: ElementId) {
        self.pending.remove(&card);
        doc.remove_class(card, "flash");
    }
}

/// `pulse` class when the pointer enters a `.pulse-target`.
#[derive(Debug)]
pub struct HoverPulse {
    duration: Duration,
    hovered: Option<ElementId>,
    pulsing: HashSet<ElementId>,
}

impl HoverPulse {
    pub fn new(settings: &EffectSettings) -> Self {
        Self {
            duration: Duration::from_millis(settings.pulse_ms),
            hovered: None,
            pulsing: HashSet::new(),
        }
    }

    pub fn on_pointer_move<D, T>(
        &mut self,
        doc: &mut D,
        sched: &mut Scheduler<T>,
        target: Option<ElementId>,
    ) -> Option<ElementId>
    where
        D: Document,
        T: Clone + From<EffectTask>,
    {
        let over = target.and_then(|t| doc.closest_with_class(t, "pulse-target"));
        let entered = over.filter(|el| self.hovered != Some(*el));
        self.hovered = over;
        let el = entered?;
        if !self.pulsing.insert(el) {
            return None;
        }
        doc.add_class(el, "pulse");
        sched.after(self.duration, EffectTask::EndPulse(el).into());
        Some(el)
    }

    pub fn end<D: Document>(&mut self, doc: &mut D, el: ElementId) {
        self.pulsing.remove(&el);
        doc.remove_class(el, "pulse");
    }
}
