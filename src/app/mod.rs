//! The page controller: owns every effect's state and routes page events,
//! timers and animation frames to them.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::{
    clock::LiveClock,
    config::{self, Settings},
    dom::{Document, ElementId},
    effects::{ClickFlash, CursorTrail, EffectTask, HoverPulse, Ripples},
    field::{Canvas, ParticleField},
    nav::{HeaderShrink, MobileNav, SectionHighlighter, SmoothScroll},
    observe::{Margin, ObserverOptions, OneShotObserver},
    panel::{PanelState, PanelTrigger, SecretPanel, Splash},
    rings::RingFill,
    schedule::{Scheduler, TaskHandle},
    types::{Rgba, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageEvent {
    Resize { width: f32, height: f32 },
    Scroll,
    /// `point` is in viewport coordinates.
    Click {
        target: Option<ElementId>,
        point: Vec2,
    },
    KeyDown(Key),
    PointerMove {
        point: Vec2,
        target: Option<ElementId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    Frame,
    ClockTick,
    HideSplash,
    RemoveSplash,
    Effect(EffectTask),
}

impl From<EffectTask> for Task {
    fn from(task: EffectTask) -> Self {
        Task::Effect(task)
    }
}

type WallClock = Box<dyn Fn() -> NaiveDateTime>;

/// Accent colour from the page's custom property, or the built-in purple.
pub fn accent<D: Document>(doc: &D) -> Rgba {
    doc.custom_property(config::ACCENT_PROPERTY)
        .and_then(|v| Rgba::parse_hex(&v))
        .unwrap_or(config::ACCENT_FALLBACK)
}

pub fn scroll_locked<D: Document>(doc: &D) -> bool {
    doc.style(doc.body(), "overflow").as_deref() == Some("hidden")
}

pub struct Controller {
    settings: Settings,
    scheduler: Scheduler<Task>,
    field: ParticleField,
    wall_clock: WallClock,
    frame_handle: Option<TaskHandle>,
    clock_handle: Option<TaskHandle>,

    header: Option<HeaderShrink>,
    nav: Option<MobileNav>,
    highlighter: Option<SectionHighlighter>,
    smooth: SmoothScroll,
    reveal: Option<OneShotObserver>,
    skills: Option<OneShotObserver>,
    rings: Option<RingFill>,
    panel: Option<SecretPanel>,
    splash: Option<Splash>,
    clock: Option<LiveClock>,
    trail: CursorTrail,
    ripples: Ripples,
    flash: ClickFlash,
    pulse: HoverPulse,
}

impl Controller {
    pub fn new(settings: Settings, field: ParticleField) -> Self {
        Self {
            smooth: SmoothScroll::new(&settings.scroll),
            trail: CursorTrail::new(&settings.effects),
            ripples: Ripples::new(&settings.effects),
            flash: ClickFlash::new(&settings.effects),
            pulse: HoverPulse::new(&settings.effects),
            settings,
            scheduler: Scheduler::new(),
            field,
            wall_clock: Box::new(|| Local::now().naive_local()),
            frame_handle: None,
            clock_handle: None,
            header: None,
            nav: None,
            highlighter: None,
            reveal: None,
            skills: None,
            rings: None,
            panel: None,
            splash: None,
            clock: None,
        }
    }

    #[cfg(test)]
    pub fn with_wall_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + 'static,
    {
        self.wall_clock = Box::new(clock);
        self
    }

    #[cfg(test)]
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn panel_state(&self) -> Option<PanelState> {
        self.panel.as_ref().map(SecretPanel::state)
    }

    pub fn nav_open(&self) -> bool {
        self.nav.as_ref().is_some_and(MobileNav::is_open)
    }

    pub fn menu_toggle(&self) -> Option<ElementId> {
        self.nav.as_ref().map(MobileNav::toggle_element)
    }

    pub fn secret_trigger(&self) -> Option<ElementId> {
        self.panel.as_ref().map(SecretPanel::trigger)
    }

    #[cfg(test)]
    pub fn active_section(&self) -> Option<&str> {
        self.highlighter.as_ref().and_then(SectionHighlighter::active)
    }

    pub fn is_narrow(&self, width: f32) -> bool {
        width < self.settings.field.narrow_breakpoint
    }

    /// Wires every component to `doc`. Components whose elements are
    /// missing stay disabled.
    pub fn boot<D: Document>(&mut self, doc: &mut D) {
        let accent_hex = accent(&*doc).to_hex();
        self.header = HeaderShrink::install(doc, self.settings.scroll.header_threshold);
        self.nav = MobileNav::install(doc);
        self.highlighter = SectionHighlighter::install(doc);
        self.reveal = OneShotObserver::install(
            "reveal",
            doc.elements_with_attr("data-reveal"),
            "revealed",
            ObserverOptions {
                threshold: config::REVEAL_THRESHOLD,
                root_margin: Margin::bottom(config::REVEAL_MARGIN_BOTTOM),
            },
        );
        self.skills = OneShotObserver::install(
            "skill",
            doc.elements_with_class("skill-fill"),
            "animated",
            ObserverOptions::threshold(config::SKILL_THRESHOLD),
        );
        self.rings = RingFill::install(doc, &accent_hex);
        self.panel = SecretPanel::install(doc);
        self.splash = Splash::install(doc);
        self.clock = LiveClock::install(doc);

        if let Some(clock) = &self.clock {
            clock.update(doc, &(self.wall_clock)());
            self.clock_handle = Some(self.scheduler.every(
                Duration::from_millis(config::CLOCK_INTERVAL_MS),
                Task::ClockTick,
            ));
        }
        if self.splash.is_some() {
            self.scheduler.after(
                Duration::from_millis(self.settings.effects.splash_hold_ms),
                Task::HideSplash,
            );
        }

        let viewport = doc.viewport();
        self.field
            .initialize(viewport.width, viewport.height, self.is_narrow(viewport.width));
        self.frame_handle = Some(self.scheduler.request_frame(Task::Frame));
        self.on_scroll(doc);

        info!(
            header = self.header.is_some(),
            nav = self.nav.is_some(),
            sections = self.highlighter.is_some(),
            reveal = self.reveal.is_some(),
            skills = self.skills.is_some(),
            rings = self.rings.is_some(),
            panel = self.panel.is_some(),
            splash = self.splash.is_some(),
            clock = self.clock.is_some(),
            particles = self.field.particles().len(),
            "page controller booted"
        );
    }

    /// Dispatches one page event. Returns true when the event's default
    /// action was taken over.
    pub fn handle<D: Document>(&mut self, doc: &mut D, event: PageEvent) -> bool {
        match event {
            PageEvent::Resize { width, height } => {
                self.field.initialize(width, height, self.is_narrow(width));
                self.on_scroll(doc);
                false
            }
            PageEvent::Scroll => {
                self.on_scroll(doc);
                false
            }
            PageEvent::Click { target, point } => self.on_click(doc, target, point),
            PageEvent::KeyDown(Key::Escape) => {
                if let Some(panel) = &mut self.panel {
                    panel.handle(doc, PanelTrigger::Escape);
                }
                self.sync_scroll_lock(doc);
                false
            }
            PageEvent::KeyDown(Key::Other) => false,
            PageEvent::PointerMove { point, target } => {
                let accent = accent(&*doc);
                self.trail
                    .on_pointer_move(doc, &mut self.scheduler, point, accent);
                self.pulse.on_pointer_move(doc, &mut self.scheduler, target);
                false
            }
        }
    }

    /// User scroll by `dy`. Ignored while the body is scroll-locked.
    pub fn scroll_by<D: Document>(&mut self, doc: &mut D, dy: f32) {
        if scroll_locked(&*doc) {
            return;
        }
        self.smooth.cancel();
        let y = doc.viewport().scroll_y + dy;
        doc.scroll_to(y);
        self.handle(doc, PageEvent::Scroll);
    }

    /// Advances time to `now`, runs due timers and then the frame queue.
    pub fn frame<D: Document, C: Canvas>(&mut self, doc: &mut D, canvas: &mut C, now: Duration) {
        for task in self.scheduler.advance_to(now) {
            self.run_task(doc, task);
        }
        for task in self.scheduler.take_frame() {
            if task == Task::Frame {
                if self.smooth.is_running() && self.smooth.step(doc, now) {
                    self.on_scroll(doc);
                }
                let accent = accent(&*doc);
                self.field.advance_and_render(canvas, accent);
                self.frame_handle = Some(self.scheduler.request_frame(Task::Frame));
            }
        }
    }

    /// Stops the frame loop and the clock.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.frame_handle.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.clock_handle.take() {
            self.scheduler.cancel(handle);
        }
        debug!("page controller stopped");
    }

    fn run_task<D: Document>(&mut self, doc: &mut D, task: Task) {
        match task {
            Task::Frame => {}
            Task::ClockTick => {
                if let Some(clock) = &self.clock {
                    clock.update(doc, &(self.wall_clock)());
                }
            }
            Task::HideSplash => self.hide_splash(doc),
            Task::RemoveSplash => {
                if let Some(splash) = &mut self.splash {
                    splash.remove(doc);
                }
            }
            Task::Effect(EffectTask::RemoveTrail(el)) => self.trail.expire(doc, el),
            Task::Effect(EffectTask::RemoveRipple(el)) => self.ripples.expire(doc, el),
            Task::Effect(EffectTask::EndFlash(el)) => self.flash.end(doc, el),
            Task::Effect(EffectTask::EndPulse(el)) => self.pulse.end(doc, el),
        }
    }

    fn hide_splash<D: Document>(&mut self, doc: &mut D) {
        let Some(splash) = &mut self.splash else {
            return;
        };
        if splash.hide(doc) {
            self.scheduler.after(
                Duration::from_millis(self.settings.effects.splash_fade_ms),
                Task::RemoveSplash,
            );
        }
    }

    fn on_scroll<D: Document>(&mut self, doc: &mut D) {
        if let Some(header) = &self.header {
            header.update(doc);
        }
        if let Some(reveal) = &mut self.reveal {
            reveal.poll(doc);
        }
        if let Some(skills) = &mut self.skills {
            skills.poll(doc);
        }
        if let Some(rings) = &mut self.rings {
            rings.poll(doc);
        }
        if let Some(highlighter) = &mut self.highlighter {
            highlighter.poll(doc);
        }
    }

    /// The body stays locked while either the panel or the mobile menu
    /// is open.
    fn sync_scroll_lock<D: Document>(&self, doc: &mut D) {
        let locked = self.panel_state() == Some(PanelState::Open) || self.nav_open();
        let body = doc.body();
        doc.set_style(body, "overflow", if locked { "hidden" } else { "" });
    }

    fn on_click<D: Document>(
        &mut self,
        doc: &mut D,
        target: Option<ElementId>,
        point: Vec2,
    ) -> bool {
        if let Some(t) = target {
            let on_splash = self
                .splash
                .as_ref()
                .is_some_and(|s| doc.contains(s.element(), t));
            if on_splash {
                self.hide_splash(doc);
                return true;
            }
        }
        if let Some(nav) = &mut self.nav {
            nav.on_click(doc, target);
        }
        if let (Some(panel), Some(t)) = (&mut self.panel, target) {
            if let Some(trigger) = panel.classify_click(&*doc, t) {
                panel.handle(doc, trigger);
            }
        }
        self.sync_scroll_lock(doc);
        let Some(t) = target else {
            return false;
        };
        let now = self.scheduler.now();
        let handled = self.smooth.on_click(&*doc, t, now);
        let doc_point = Vec2::new(point.x, point.y + doc.viewport().scroll_y);
        self.ripples.on_click(doc, &mut self.scheduler, t, doc_point);
        self.flash.on_click(doc, &mut self.scheduler, t);
        handled
    }
}
