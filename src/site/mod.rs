//! The demo portfolio page shown by the terminal host, and its layout in
//! terminal-cell metrics.

use tracing::debug;

use crate::{
    config::HostSettings,
    dom::{Document, ElementId, Page},
    types::Rect,
};

pub const HEADER_ROWS: f32 = 3.0;
const PANEL_COLS: f32 = 42.0;
const GUTTER_COLS: f32 = 2.0;

const SKILLS: [(&str, &str); 4] = [
    ("Rust", "90"),
    ("TypeScript", "80"),
    ("Shaders", "55"),
    ("Design systems", "70"),
];

const RINGS: [(&str, &str, &str, &str, &str); 3] = [
    ("◆", "Performance", "96", "#22c55e", "Lighthouse average"),
    ("◇", "Accessibility", "100", "", "WCAG AA audits"),
    ("○", "Coverage", "84", "#f59e0b", "Across core crates"),
];

const PROJECTS: [(&str, &str); 3] = [
    (
        "Nebula Board",
        "A realtime whiteboard with CRDT sync and a canvas renderer that holds 60 fps on low-end phones.",
    ),
    (
        "Trailhead",
        "Offline-first hiking maps. Vector tiles, route planning and a tiny service worker cache.",
    ),
    (
        "Glyphsmith",
        "A font playground that previews variable axes live and exports subsetted webfonts.",
    ),
];

const NAV: [(&str, &str); 4] = [
    ("#about", "About"),
    ("#skills", "Skills"),
    ("#projects", "Projects"),
    ("#contact", "Contact"),
];

/// Builds the page for a viewport of `width` x `height` surface units and
/// lays it out.
pub fn build(width: f32, height: f32, host: &HostSettings, narrow: bool) -> Page {
    let mut page = Page::new(width, height);
    page.set_custom_property("--purple-2", "#8b5cf6");
    page.set_custom_property("--purple-3", "#a78bfa");
    let body = page.body();

    let header = page
        .append(body, "header")
        .class("header")
        .style("position", "fixed")
        .build();
    page.append(header, "span").class("logo").text("folio.fx").build();
    page.append(header, "button")
        .id("menu-toggle")
        .attr("aria-expanded", "false")
        .text("☰ menu")
        .build();
    let links = page
        .append(header, "ul")
        .id("nav-links")
        .class("nav-links")
        .build();
    for (href, label) in NAV {
        page.append(links, "a").attr("href", href).text(label).build();
    }
    page.append(header, "button")
        .id("secret-trigger")
        .text("✦")
        .build();

    let hero = page.append(body, "section").id("hero").build();
    page.append(hero, "h1").text("Marina Costa").build();
    page.append(hero, "p")
        .text("Creative developer building fast, tactile interfaces for the web.")
        .build();
    page.append(hero, "span").id("hero-datetime").build();
    page.append(hero, "a")
        .class("btn")
        .attr("href", "#projects")
        .text("See my work")
        .build();

    let about = page.append(body, "section").id("about").build();
    page.append(about, "h2").text("About").build();
    page.append(about, "p")
        .attr("data-reveal", "")
        .text(
            "I have spent eight years shipping product interfaces, from design tokens to \
             GPU-backed visualisations. I care about motion that explains and code that lasts.",
        )
        .build();
    page.append(about, "p")
        .attr("data-reveal", "")
        .text("Currently based in Lisbon and open to remote collaborations.")
        .build();

    let skills = page.append(body, "section").id("skills").build();
    page.append(skills, "h2").text("Skills").build();
    for (label, pct) in SKILLS {
        page.append(skills, "p").class("skill-name").text(label).build();
        page.append(skills, "div")
            .class("skill-fill")
            .attr("data-pct", pct)
            .build();
    }
    for (icon, label, pct, color, note) in RINGS {
        let mut card = page
            .append(skills, "div")
            .class("ring-card")
            .attr("data-icon", icon)
            .attr("data-label", label)
            .attr("data-pct", pct)
            .attr("data-note", note);
        if !color.is_empty() {
            card = card.attr("data-color", color);
        }
        card.build();
    }

    let projects = page.append(body, "section").id("projects").build();
    page.append(projects, "h2").text("Projects").build();
    for (title, blurb) in PROJECTS {
        let card = page
            .append(projects, "div")
            .class("card")
            .class("pulse-target")
            .attr("data-reveal", "")
            .build();
        page.append(card, "h3").text(title).build();
        page.append(card, "p").text(blurb).build();
    }

    let contact = page.append(body, "section").id("contact").build();
    page.append(contact, "h2").text("Contact").build();
    page.append(contact, "p")
        .attr("data-reveal", "")
        .text("hello@marinacosta.dev · github.com/marinacosta")
        .build();
    page.append(contact, "a")
        .class("btn")
        .attr("href", "#hero")
        .text("Back to top")
        .build();

    page.append(body, "div")
        .id("secret-overlay")
        .style("position", "fixed")
        .build();
    let panel = page
        .append(body, "aside")
        .id("secret-panel")
        .attr("aria-hidden", "true")
        .style("position", "fixed")
        .build();
    page.append(panel, "button").id("secret-close").text("✕ close").build();
    page.append(panel, "h2").text("You found it").build();
    page.append(panel, "p")
        .text("Things I build when nobody is watching: synth patches, pixel fonts and a tiny ray tracer in Rust.")
        .build();
    page.append(panel, "p")
        .text("Press Esc, click the overlay or the close button to go back.")
        .build();

    let splash = page
        .append(body, "div")
        .id("splash")
        .style("position", "fixed")
        .build();
    page.append(splash, "p").text("folio.fx").build();

    layout(&mut page, host, narrow);
    debug!(elements = page.len(), "demo page built");
    page
}

/// Assigns a rect to every element from the current viewport size.
/// Transient elements keep the rects they were created with.
pub fn layout(page: &mut Page, host: &HostSettings, narrow: bool) {
    let viewport = page.viewport();
    let (cw, ch) = (host.cell_px_w, host.cell_px_h);
    let width = viewport.width;
    let screen = Rect::new(0.0, 0.0, viewport.width, viewport.height);
    let body = page.body();

    if let Some(header) = page.elements_with_class("header").into_iter().next() {
        page.toggle_class(header, "compact", Some(narrow));
        layout_header(page, header, width, cw, ch, narrow);
    }

    let gutter = GUTTER_COLS * cw;
    let inner = (width - 2.0 * gutter).max(cw);
    let mut y = HEADER_ROWS * ch;
    for section in page.children(body) {
        if page.tag(section).as_deref() != Some("section") {
            continue;
        }
        let top = y;
        y += ch;
        for child in page.children(section) {
            y = flow_block(page, child, gutter, y, inner, cw, ch);
        }
        y += ch;
        page.set_rect(section, Rect::new(0.0, top, width, y - top));
    }

    if let Some(overlay) = page.element_by_id("secret-overlay") {
        page.set_rect(overlay, screen);
    }
    if let Some(panel) = page.element_by_id("secret-panel") {
        let panel_w = (PANEL_COLS * cw).min(width);
        let x = width - panel_w;
        page.set_rect(panel, Rect::new(x, 0.0, panel_w, viewport.height));
        let mut py = ch;
        for child in page.children(panel) {
            py = flow_block(page, child, x + cw, py, panel_w - 2.0 * cw, cw, ch);
        }
    }
    if let Some(splash) = page.element_by_id("splash") {
        page.set_rect(splash, screen);
        let mid = (viewport.height / ch / 2.0).floor() * ch;
        for child in page.children(splash) {
            page.set_rect(child, Rect::new(0.0, mid, width, ch));
        }
    }
}

fn layout_header(page: &mut Page, header: ElementId, width: f32, cw: f32, ch: f32, narrow: bool) {
    page.set_rect(header, Rect::new(0.0, 0.0, width, HEADER_ROWS * ch));
    let row = ch;
    let mut right = width - GUTTER_COLS * cw;
    let mut left = GUTTER_COLS * cw;

    for child in page.children(header) {
        let text_w = text_cols(page, child) * cw;
        if page.attr(child, "id").as_deref() == Some("secret-trigger") {
            right -= text_w;
            page.set_rect(child, Rect::new(right, row, text_w, ch));
            right -= 2.0 * cw;
        } else if page.has_class(child, "logo") {
            page.set_rect(child, Rect::new(left, row, text_w, ch));
            left += text_w + 2.0 * cw;
        }
    }
    let toggle = page.element_by_id("menu-toggle");
    if let Some(toggle) = toggle {
        let text_w = text_cols(page, toggle) * cw;
        right -= text_w;
        page.set_rect(toggle, Rect::new(right, row, text_w, ch));
    }
    let Some(links) = page.element_by_id("nav-links") else {
        return;
    };
    let anchors = page.descendants_with_tag(links, "a");
    if narrow {
        let menu_w = anchors
            .iter()
            .map(|a| text_cols(page, *a))
            .fold(0.0_f32, f32::max)
            .max(12.0)
            * cw
            + 2.0 * cw;
        let x = (width - menu_w - GUTTER_COLS * cw).max(0.0);
        let top = HEADER_ROWS * ch;
        page.set_rect(
            links,
            Rect::new(x, top, menu_w, anchors.len() as f32 * ch + 2.0 * ch),
        );
        for (i, a) in anchors.iter().enumerate() {
            let y = top + ch + i as f32 * ch;
            page.set_rect(*a, Rect::new(x + cw, y, menu_w - 2.0 * cw, ch));
        }
    } else {
        let mut x = left.max(width / 2.0 - 20.0 * cw);
        let start = x;
        for a in &anchors {
            let w = text_cols(page, *a) * cw + 2.0 * cw;
            page.set_rect(*a, Rect::new(x, row, w, ch));
            x += w + cw;
        }
        page.set_rect(links, Rect::new(start, row, x - start, ch));
    }
}

/// Lays out one block at `y` and returns the y below it.
fn flow_block(page: &mut Page, el: ElementId, x: f32, y: f32, width: f32, cw: f32, ch: f32) -> f32 {
    let cols = (width / cw).floor().max(1.0) as usize;
    if page.has_class(el, "card") {
        let mut inner_y = y + ch;
        for child in page.children(el) {
            inner_y = flow_block(page, child, x + 2.0 * cw, inner_y, width - 4.0 * cw, cw, ch);
        }
        let bottom = inner_y + ch;
        page.set_rect(el, Rect::new(x, y, width, bottom - y));
        return bottom + ch;
    }
    if page.has_class(el, "ring-card") {
        page.set_rect(el, Rect::new(x, y, width, 2.0 * ch));
        return y + 3.0 * ch;
    }
    if page.has_class(el, "skill-fill") {
        let bar = (width * 0.6).max(cw);
        page.set_rect(el, Rect::new(x, y, bar, ch));
        return y + 2.0 * ch;
    }
    let text = page.text(el).unwrap_or_default();
    if page.has_class(el, "btn") {
        let w = (text.chars().count() as f32 + 4.0) * cw;
        page.set_rect(el, Rect::new(x, y, w.min(width), ch));
        return y + 2.0 * ch;
    }
    let lines = wrap_text(&text, cols).len().max(1) as f32;
    page.set_rect(el, Rect::new(x, y, width, lines * ch));
    let gap = match page.tag(el).as_deref() {
        Some("h1" | "h2" | "h3") | Some("span") => 0.0,
        _ => ch,
    };
    y + lines * ch + gap
}

fn text_cols(page: &Page, el: ElementId) -> f32 {
    page.text(el).map_or(0, |t| t.chars().count()) as f32
}

/// Greedy word wrap to `cols` columns. Words longer than a line are split.
pub fn wrap_text(text: &str, cols: usize) -> Vec<String> {
    let cols = cols.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut len = 0;
    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > cols {
            if len > 0 {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            let rest = chars.split_off(cols);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let wlen = chars.len();
        if len > 0 && len + 1 + wlen > cols {
            lines.push(std::mem::take(&mut line));
            len = 0;
        }
        if len > 0 {
            line.push(' ');
            len += 1;
        }
        line.extend(chars);
        len += wlen;
    }
    if len > 0 {
        lines.push(line);
    }
    lines
}

/// Whether `el` is currently shown. A hidden element hides its subtree.
pub fn is_displayed(page: &Page, el: ElementId) -> bool {
    if !page.is_connected(el) {
        return false;
    }
    match page.attr(el, "id").as_deref() {
        Some("secret-panel") => return page.has_class(el, "open"),
        Some("secret-overlay") => return page.has_class(el, "visible"),
        Some("splash") => return !page.has_class(el, "hidden"),
        _ => {}
    }
    let compact = page
        .parent(el)
        .is_some_and(|p| page.has_class(p, "header") && page.has_class(p, "compact"));
    match page.attr(el, "id").as_deref() {
        Some("menu-toggle") => compact,
        Some("nav-links") if compact => page.has_class(el, "open"),
        _ => true,
    }
}
