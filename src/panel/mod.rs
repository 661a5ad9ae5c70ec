//! Secret drawer panel and the intro splash.

use tracing::{debug, info};

use crate::dom::{Document, ElementId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelTrigger {
    Toggle,
    Overlay,
    CloseButton,
    Escape,
}

#[derive(Debug)]
pub struct SecretPanel {
    trigger: ElementId,
    panel: ElementId,
    overlay: Option<ElementId>,
    close: Option<ElementId>,
    state: PanelState,
}

impl SecretPanel {
    pub fn install<D: Document>(doc: &mut D) -> Option<Self> {
        let (Some(trigger), Some(panel)) = (
            doc.element_by_id("secret-trigger"),
            doc.element_by_id("secret-panel"),
        ) else {
            debug!("secret panel elements missing, panel disabled");
            return None;
        };
        let overlay = doc.element_by_id("secret-overlay");
        let close = doc.element_by_id("secret-close");
        doc.set_attr(panel, "aria-hidden", "true");
        if let Some(overlay) = overlay {
            doc.set_attr(overlay, "aria-hidden", "true");
        }
        debug!(
            overlay = overlay.is_some(),
            close = close.is_some(),
            "secret panel installed"
        );
        Some(Self {
            trigger,
            panel,
            overlay,
            close,
            state: PanelState::Closed,
        })
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn trigger(&self) -> ElementId {
        self.trigger
    }

    /// Which control, if any, a click on `target` hits.
    pub fn classify_click<D: Document>(&self, doc: &D, target: ElementId) -> Option<PanelTrigger> {
        if self.close.is_some_and(|close| doc.contains(close, target)) {
            return Some(PanelTrigger::CloseButton);
        }
        if doc.contains(self.trigger, target) {
            return Some(PanelTrigger::Toggle);
        }
        if self.overlay.is_some_and(|overlay| doc.contains(overlay, target)) {
            return Some(PanelTrigger::Overlay);
        }
        None
    }

    /// Runs one transition. Returns whether the state changed.
    pub fn handle<D: Document>(&mut self, doc: &mut D, trigger: PanelTrigger) -> bool {
        match (trigger, self.state) {
            (PanelTrigger::Toggle, PanelState::Closed) => {
                self.open(doc);
                true
            }
            (_, PanelState::Open) => {
                self.close(doc);
                true
            }
            _ => false,
        }
    }

    fn open<D: Document>(&mut self, doc: &mut D) {
        doc.add_class(self.panel, "open");
        doc.set_attr(self.panel, "aria-hidden", "false");
        doc.set_scroll_top(self.panel, 0.0);
        if let Some(overlay) = self.overlay {
            doc.add_class(overlay, "visible");
            doc.set_attr(overlay, "aria-hidden", "false");
        }
        let body = doc.body();
        doc.set_style(body, "overflow", "hidden");
        self.state = PanelState::Open;
        info!("secret panel opened");
    }

    fn close<D: Document>(&mut self, doc: &mut D) {
        doc.remove_class(self.panel, "open");
        doc.set_attr(self.panel, "aria-hidden", "true");
        if let Some(overlay) = self.overlay {
            doc.remove_class(overlay, "visible");
            doc.set_attr(overlay, "aria-hidden", "true");
        }
        let body = doc.body();
        doc.set_style(body, "overflow", "");
        self.state = PanelState::Closed;
        info!("secret panel closed");
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplashState {
    Shown,
    Hiding,
    Gone,
}

/// Intro overlay: hidden after a hold time or a click, then removed once
/// its fade finishes.
#[derive(Debug)]
pub struct Splash {
    el: ElementId,
    state: SplashState,
}

impl Splash {
    pub fn install<D: Document>(doc: &D) -> Option<Self> {
        let el = doc.element_by_id("splash")?;
        Some(Self {
            el,
            state: SplashState::Shown,
        })
    }

    pub fn element(&self) -> ElementId {
        self.el
    }

    #[cfg(test)]
    pub fn state(&self) -> SplashState {
        self.state
    }

    /// Starts the fade. Returns false when already hiding or gone.
    pub fn hide<D: Document>(&mut self, doc: &mut D) -> bool {
        if self.state != SplashState::Shown {
            return false;
        }
        doc.add_class(self.el, "hidden");
        self.state = SplashState::Hiding;
        true
    }

    pub fn remove<D: Document>(&mut self, doc: &mut D) {
        if self.state == SplashState::Gone {
            return;
        }
        doc.remove_element(self.el);
        self.state = SplashState::Gone;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Page;

    struct Fixture {
        page: Page,
        trigger: ElementId,
        panel: ElementId,
        overlay: ElementId,
        close: ElementId,
        inside: ElementId,
    }

    fn fixture() -> Fixture {
        let mut page = Page::new(800.0, 600.0);
        let body = page.body();
        let trigger = page.append(body, "button").id("secret-trigger").build();
        let overlay = page.append(body, "div").id("secret-overlay").build();
        let panel = page.append(body, "aside").id("secret-panel").build();
        let close = page.append(panel, "button").id("secret-close").build();
        let inside = page.append(panel, "p").build();
        Fixture {
            page,
            trigger,
            panel,
            overlay,
            close,
            inside,
        }
    }

    mod secret_panel {
        use super::*;

        #[test]
        fn missing_elements_disable() {
            let mut page = Page::new(800.0, 600.0);
            assert!(SecretPanel::install(&mut page).is_none());
        }

        #[test]
        fn toggle_opens_locks_scroll_and_resets_offset() {
            let mut f = fixture();
            f.page.set_scroll_top(f.panel, 250.0);
            let mut panel = SecretPanel::install(&mut f.page).expect("installed");
            assert!(panel.handle(&mut f.page, PanelTrigger::Toggle));
            assert_eq!(panel.state(), PanelState::Open);
            assert!(f.page.has_class(f.panel, "open"));
            assert!(f.page.has_class(f.overlay, "visible"));
            assert_eq!(f.page.attr(f.panel, "aria-hidden").as_deref(), Some("false"));
            assert_eq!(f.page.scroll_top(f.panel), 0.0);
            let body = f.page.body();
            assert_eq!(f.page.style(body, "overflow").as_deref(), Some("hidden"));
        }

        #[test]
        fn escape_on_closed_panel_changes_nothing() {
            let mut f = fixture();
            let mut panel = SecretPanel::install(&mut f.page).expect("installed");
            assert!(!panel.handle(&mut f.page, PanelTrigger::Escape));
            assert_eq!(panel.state(), PanelState::Closed);
            assert!(!f.page.has_class(f.panel, "open"));
        }

        #[test]
        fn escape_on_open_panel_closes_and_restores_scroll() {
            let mut f = fixture();
            let mut panel = SecretPanel::install(&mut f.page).expect("installed");
            panel.handle(&mut f.page, PanelTrigger::Toggle);
            assert!(panel.handle(&mut f.page, PanelTrigger::Escape));
            assert_eq!(panel.state(), PanelState::Closed);
            assert!(!f.page.has_class(f.panel, "open"));
            assert!(!f.page.has_class(f.overlay, "visible"));
            let body = f.page.body();
            assert_eq!(f.page.style(body, "overflow"), None);
        }

        #[test]
        fn overlay_and_close_button_only_close() {
            let mut f = fixture();
            let mut panel = SecretPanel::install(&mut f.page).expect("installed");
            assert!(!panel.handle(&mut f.page, PanelTrigger::Overlay));
            assert!(!panel.handle(&mut f.page, PanelTrigger::CloseButton));
            panel.handle(&mut f.page, PanelTrigger::Toggle);
            assert!(panel.handle(&mut f.page, PanelTrigger::CloseButton));
            panel.handle(&mut f.page, PanelTrigger::Toggle);
            assert!(panel.handle(&mut f.page, PanelTrigger::Overlay));
            assert_eq!(panel.state(), PanelState::Closed);
        }

        #[test]
        fn toggle_twice_round_trips() {
            let mut f = fixture();
            let mut panel = SecretPanel::install(&mut f.page).expect("installed");
            panel.handle(&mut f.page, PanelTrigger::Toggle);
            panel.handle(&mut f.page, PanelTrigger::Toggle);
            assert_eq!(panel.state(), PanelState::Closed);
        }

        #[test]
        fn classifies_clicks() {
            let mut f = fixture();
            let panel = SecretPanel::install(&mut f.page).expect("installed");
            let body = f.page.body();
            assert_eq!(
                panel.classify_click(&f.page, f.trigger),
                Some(PanelTrigger::Toggle)
            );
            assert_eq!(
                panel.classify_click(&f.page, f.overlay),
                Some(PanelTrigger::Overlay)
            );
            assert_eq!(
                panel.classify_click(&f.page, f.close),
                Some(PanelTrigger::CloseButton)
            );
            assert_eq!(panel.classify_click(&f.page, f.inside), None);
            assert_eq!(panel.classify_click(&f.page, body), None);
        }
    }

    mod splash {
        use super::*;

        #[test]
        fn hides_once_then_removes() {
            let mut page = Page::new(800.0, 600.0);
            let body = page.body();
            let el = page.append(body, "div").id("splash").build();
            let mut splash = Splash::install(&page).expect("present");
            assert!(splash.hide(&mut page));
            assert!(page.has_class(el, "hidden"));
            assert!(!splash.hide(&mut page));
            splash.remove(&mut page);
            assert_eq!(splash.state(), SplashState::Gone);
            assert!(!page.is_connected(el));
        }

        #[test]
        fn absent_splash_is_none() {
            let page = Page::new(800.0, 600.0);
            assert!(Splash::install(&page).is_none());
        }
    }
}
