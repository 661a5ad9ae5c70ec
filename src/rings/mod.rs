use std::f32::consts::TAU;

use crate::{
    config,
    dom::{Document, ElementId},
    observe::{ObserverOptions, OneShotObserver},
};

/// Ring-card contents, read from its `data-*` attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct RingCard {
    pub icon: String,
    pub label: String,
    pub pct: f32,
    pub color: String,
    pub note: String,
}

impl RingCard {
    pub fn parse<D: Document>(doc: &D, el: ElementId, accent: &str) -> Self {
        let read = |name: &str| doc.attr(el, name).unwrap_or_default();
        let pct = doc
            .attr(el, "data-pct")
            .and_then(|raw| raw.trim().trim_end_matches('%').parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 100.0))
            .unwrap_or(0.0);
        let color = doc
            .attr(el, "data-color")
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| accent.to_string());
        Self {
            icon: read("data-icon"),
            label: read("data-label"),
            pct,
            color,
            note: read("data-note"),
        }
    }

    /// Stroke offset of the filled ring; the full circumference means empty.
    pub fn dash_offset(&self) -> f32 {
        let circumference = TAU * config::RING_RADIUS;
        circumference * (1.0 - self.pct / 100.0)
    }
}

pub struct RingFill {
    cards: Vec<(ElementId, RingCard)>,
    observer: OneShotObserver,
}

impl RingFill {
    pub fn install<D: Document>(doc: &mut D, accent: &str) -> Option<Self> {
        let targets = doc.elements_with_class("ring-card");
        let observer = OneShotObserver::install(
            "ring",
            targets.clone(),
            "animated",
            ObserverOptions::threshold(config::RING_THRESHOLD),
        )?;
        let mut cards = Vec::with_capacity(targets.len());
        for el in targets {
            let card = RingCard::parse(&*doc, el, accent);
            doc.set_style(el, "--ring-color", &card.color);
            doc.set_attr(el, "aria-label", &format!("{}: {}%", card.label, card.pct.round()));
            cards.push((el, card));
        }
        Some(Self { cards, observer })
    }

    pub fn card(&self, el: ElementId) -> Option<&RingCard> {
        self.cards.iter().find(|(id, _)| *id == el).map(|(_, card)| card)
    }

    pub fn poll<D: Document>(&mut self, doc: &mut D) -> Vec<ElementId> {
        let activated = self.observer.poll(doc);
        for el in &activated {
            if let Some(card) = self.card(*el) {
                doc.set_style(*el, "--ring-offset", &format!("{:.2}", card.dash_offset()));
            }
        }
        activated
    }
}
