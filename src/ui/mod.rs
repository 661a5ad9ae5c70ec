use std::{
    io,
    thread,
    time::{Duration, Instant},
};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        KeyEventKind, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect as Area,
    style::{Color, Modifier, Style},
};
use tracing::{debug, info};

use crate::{
    app::{self, Controller, Key, PageEvent},
    config::{HostSettings, Settings},
    dom::{Document, ElementId, Page},
    error::FxError,
    field::ParticleField,
    render::Raster,
    rings::RingCard,
    site,
    types::{Rect, Rgba, Vec2},
};

const STATUS: &str = " q quit · ↑↓ PgUp PgDn scroll · m menu · s secret · 1-4 sections · Esc close ";
const PAGE_BG: Color = Color::Rgb(12, 10, 24);
const TEXT: Color = Color::Rgb(226, 224, 240);
const MUTED: Color = Color::Rgb(110, 104, 140);

/// Terminal input translated into host actions.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Command {
    Quit,
    ScrollBy(f32),
    ScrollPage(f32),
    Click(Vec2),
    Move(Vec2),
    Key(Key),
    Menu,
    Secret,
    NavLink(usize),
    Resize(u16, u16),
}

pub fn run(settings: Settings, seed: Option<u64>) -> Result<(), FxError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, settings, seed);
    shutdown_terminal(&mut terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: Settings,
    seed: Option<u64>,
) -> Result<(), FxError> {
    let host = settings.host.clone();
    let size = terminal.size()?;
    let (cols, rows) = page_cells(size);
    let (width, height) = surface_size(&host, cols, rows);

    let field = match seed {
        Some(seed) => ParticleField::with_seed(settings.field.clone(), seed),
        None => ParticleField::new(settings.field.clone()),
    };
    let scroll_step = settings.scroll.step;
    let mut controller = Controller::new(settings, field);
    let mut page = site::build(width, height, &host, controller.is_narrow(width));
    controller.boot(&mut page);
    let mut raster = Raster::new(cols, rows, host.cell_px_w, host.cell_px_h);

    let started = Instant::now();
    let mut last_render = Instant::now();
    let render_interval = Duration::from_secs_f32(1.0 / host.frame_hz);
    info!(cols, rows, "terminal host started");

    loop {
        while event::poll(Duration::from_millis(0))? {
            let Some(command) = translate(&event::read()?, &host, scroll_step) else {
                continue;
            };
            if command == Command::Quit {
                controller.shutdown();
                info!("terminal host stopped");
                return Ok(());
            }
            apply(command, &mut page, &mut controller, &mut raster, &host);
        }

        if last_render.elapsed() >= render_interval {
            controller.frame(&mut page, &mut raster, started.elapsed());
            terminal.draw(|frame| {
                let area = frame.size();
                paint(frame.buffer_mut(), area, &raster, &page, &host);
            })?;
            last_render = Instant::now();
        }

        thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), FxError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// The page gets every row but the status line.
fn page_cells(size: Area) -> (u16, u16) {
    (size.width, size.height.saturating_sub(1))
}

fn surface_size(host: &HostSettings, cols: u16, rows: u16) -> (f32, f32) {
    (cols as f32 * host.cell_px_w, rows as f32 * host.cell_px_h)
}

/// Centre of a terminal cell in surface units.
fn cell_center(host: &HostSettings, col: u16, row: u16) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * host.cell_px_w,
        (row as f32 + 0.5) * host.cell_px_h,
    )
}

fn translate(event: &CrosstermEvent, host: &HostSettings, step: f32) -> Option<Command> {
    match event {
        CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => match key.code {
            KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Esc => Some(Command::Key(Key::Escape)),
            KeyCode::Up => Some(Command::ScrollBy(-step)),
            KeyCode::Down => Some(Command::ScrollBy(step)),
            KeyCode::PageUp => Some(Command::ScrollPage(-1.0)),
            KeyCode::PageDown => Some(Command::ScrollPage(1.0)),
            KeyCode::Char('m') => Some(Command::Menu),
            KeyCode::Char('s') => Some(Command::Secret),
            KeyCode::Char(c @ '1'..='9') => {
                c.to_digit(10).map(|n| Command::NavLink(n as usize - 1))
            }
            _ => Some(Command::Key(Key::Other)),
        },
        CrosstermEvent::Mouse(mouse) => {
            let point = cell_center(host, mouse.column, mouse.row);
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => Some(Command::Click(point)),
                MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(Command::Move(point)),
                MouseEventKind::ScrollUp => Some(Command::ScrollBy(-step)),
                MouseEventKind::ScrollDown => Some(Command::ScrollBy(step)),
                _ => None,
            }
        }
        CrosstermEvent::Resize(cols, rows) => Some(Command::Resize(*cols, rows.saturating_sub(1))),
        _ => None,
    }
}

fn apply(
    command: Command,
    page: &mut Page,
    controller: &mut Controller,
    raster: &mut Raster,
    host: &HostSettings,
) {
    match command {
        Command::Quit => {}
        Command::ScrollBy(dy) => controller.scroll_by(page, dy),
        Command::ScrollPage(pages) => {
            let dy = pages * page.viewport().height * 0.9;
            controller.scroll_by(page, dy);
        }
        Command::Click(point) => {
            let target = page.hit_test(point, site::is_displayed);
            debug!(?target, x = point.x, y = point.y, "click");
            controller.handle(page, PageEvent::Click { target, point });
        }
        Command::Move(point) => {
            let target = page.hit_test(point, site::is_displayed);
            controller.handle(page, PageEvent::PointerMove { point, target });
        }
        Command::Key(key) => {
            controller.handle(page, PageEvent::KeyDown(key));
        }
        Command::Menu => {
            let toggle = controller.menu_toggle();
            click_element(page, controller, toggle);
        }
        Command::Secret => {
            let trigger = controller.secret_trigger();
            click_element(page, controller, trigger);
        }
        Command::NavLink(n) => {
            let link = page
                .element_by_id("nav-links")
                .and_then(|links| page.descendants_with_tag(links, "a").get(n).copied());
            click_element(page, controller, link);
        }
        Command::Resize(cols, rows) => {
            let (width, height) = surface_size(host, cols, rows);
            page.set_viewport_size(width, height);
            site::layout(page, host, controller.is_narrow(width));
            raster.resize(cols, rows);
            controller.handle(page, PageEvent::Resize { width, height });
            debug!(cols, rows, "terminal resized");
        }
    }
}

/// Clicks the centre of `el` as if the pointer were there.
fn click_element(page: &mut Page, controller: &mut Controller, el: Option<ElementId>) {
    let Some(el) = el else {
        return;
    };
    let point = screen_rect(page, el).map_or(Vec2::ZERO, |r| {
        Vec2::new(r.x + r.width / 2.0, r.y + r.height / 2.0)
    });
    controller.handle(
        page,
        PageEvent::Click {
            target: Some(el),
            point,
        },
    );
}

fn in_fixed_subtree(page: &Page, el: ElementId) -> bool {
    let mut cur = Some(el);
    while let Some(e) = cur {
        if page.style(e, "position").as_deref() == Some("fixed") {
            return true;
        }
        cur = page.parent(e);
    }
    false
}

/// Element rect in viewport coordinates.
fn screen_rect(page: &Page, el: ElementId) -> Option<Rect> {
    let rect = page.rect(el)?;
    if in_fixed_subtree(page, el) {
        Some(rect)
    } else {
        Some(Rect::new(
            rect.x,
            rect.y - page.viewport().scroll_y,
            rect.width,
            rect.height,
        ))
    }
}

fn rgb(color: Rgba) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Darkens `color` towards the page background by its alpha.
fn shade(color: Rgba, alpha: f32) -> Color {
    let t = (0.3 + alpha.clamp(0.0, 1.0) * 1.4).min(1.0);
    let mix = |c: u8, bg: u8| (bg as f32 + (c as f32 - bg as f32) * t).round() as u8;
    Color::Rgb(mix(color.r, 12), mix(color.g, 10), mix(color.b, 24))
}

/// Cell area of a viewport rect, clipped to `area`.
fn cells(area: Area, rect: Rect, host: &HostSettings) -> Option<Area> {
    let x0 = (rect.x / host.cell_px_w).floor().max(0.0);
    let y0 = (rect.y / host.cell_px_h).floor().max(0.0);
    let x1 = (rect.right() / host.cell_px_w).ceil().min(area.width as f32);
    let y1 = (rect.bottom() / host.cell_px_h).ceil().min(area.height as f32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Area::new(
        area.x + x0 as u16,
        area.y + y0 as u16,
        (x1 - x0) as u16,
        (y1 - y0) as u16,
    ))
}

fn fill(buf: &mut Buffer, at: Area, style: Style) {
    for y in at.top()..at.bottom() {
        for x in at.left()..at.right() {
            buf.get_mut(x, y).set_char(' ').set_style(style);
        }
    }
}

fn put(buf: &mut Buffer, bounds: Area, x: u16, y: u16, text: &str, style: Style) {
    if y < bounds.top() || y >= bounds.bottom() || x >= bounds.right() {
        return;
    }
    let room = (bounds.right() - x) as usize;
    let clipped: String = text.chars().take(room).collect();
    buf.set_string(x, y, clipped, style);
}

fn paint(buf: &mut Buffer, screen: Area, raster: &Raster, page: &Page, host: &HostSettings) {
    let (cols, rows) = page_cells(screen);
    let area = Area::new(screen.x, screen.y, cols, rows);
    fill(buf, area, Style::default().bg(PAGE_BG));

    let w = raster.width().min(area.width);
    let h = raster.height().min(area.height);
    for y in 0..h {
        for x in 0..w {
            let cell = raster.get(x, y);
            if cell.ch != ' ' {
                buf.get_mut(area.x + x, area.y + y)
                    .set_char(cell.ch)
                    .set_fg(shade(cell.color, cell.alpha));
            }
        }
    }

    let accent = app::accent(page);
    let body = page.body();
    for child in page.children(body) {
        paint_element(buf, area, page, child, host, accent, false);
    }

    if rows < screen.height {
        let status = Area::new(screen.x, screen.y + rows, screen.width, 1);
        let style = Style::default().fg(MUTED).bg(Color::Black);
        fill(buf, status, style);
        put(buf, status, status.x, status.y, STATUS, style);
    }
}

fn paint_element(
    buf: &mut Buffer,
    area: Area,
    page: &Page,
    el: ElementId,
    host: &HostSettings,
    accent: Rgba,
    dim: bool,
) {
    if !site::is_displayed(page, el) {
        return;
    }
    // Unrevealed blocks stay faint along with everything inside them.
    let hidden =
        dim || (page.attr(el, "data-reveal").is_some() && !page.has_class(el, "revealed"));
    let Some(at) = screen_rect(page, el).and_then(|r| cells(area, r, host)) else {
        for child in page.children(el) {
            paint_element(buf, area, page, child, host, accent, hidden);
        }
        return;
    };
    let bg = Style::default().bg(PAGE_BG);
    let id = page.attr(el, "id");

    if page.has_class(el, "header") {
        let style = Style::default().bg(Color::Rgb(20, 16, 38)).fg(TEXT);
        fill(buf, at, style);
        if page.has_class(el, "scrolled") {
            let line = "─".repeat(at.width as usize);
            put(buf, at, at.x, at.bottom().saturating_sub(1), &line, style.fg(rgb(accent)));
        }
    } else if id.as_deref() == Some("secret-overlay") {
        fill(buf, at, Style::default().bg(Color::Rgb(4, 3, 8)));
    } else if id.as_deref() == Some("secret-panel") || id.as_deref() == Some("splash") {
        fill(buf, at, Style::default().bg(Color::Rgb(24, 18, 44)));
        if id.as_deref() == Some("secret-panel") {
            for y in at.top()..at.bottom() {
                buf.get_mut(at.x, y).set_char('│').set_fg(rgb(accent));
            }
        }
    } else if page.has_class(el, "card") {
        let color = if page.has_class(el, "flash") {
            Color::White
        } else if page.has_class(el, "pulse") {
            rgb(accent)
        } else {
            MUTED
        };
        let style = if hidden { bg.fg(Color::Rgb(40, 36, 60)) } else { bg.fg(color) };
        paint_box(buf, at, style);
    } else if page.has_class(el, "skill-fill") {
        let pct = page
            .attr(el, "data-pct")
            .and_then(|p| p.parse::<f32>().ok())
            .unwrap_or(0.0)
            .clamp(0.0, 100.0);
        let filled = if page.has_class(el, "animated") {
            (at.width as f32 * pct / 100.0).round() as u16
        } else {
            0
        };
        for x in 0..at.width {
            let (ch, fg) = if x < filled { ('█', rgb(accent)) } else { ('░', MUTED) };
            buf.get_mut(at.x + x, at.y).set_char(ch).set_fg(fg);
        }
    } else if page.has_class(el, "ring-card") {
        paint_ring(buf, at, page, el, accent);
    } else if page.has_class(el, "btn") {
        let rippling = page
            .children(el)
            .into_iter()
            .any(|c| page.has_class(c, "ripple"));
        let face = if rippling { Color::Rgb(196, 181, 253) } else { rgb(accent) };
        let style = Style::default().bg(face).fg(Color::Black).add_modifier(Modifier::BOLD);
        fill(buf, at, style);
        let label = format!("  {}  ", page.text(el).unwrap_or_default());
        put(buf, at, at.x, at.y, &label, style);
        return;
    } else if page.has_class(el, "cursor-pixel") {
        let color = page
            .style(el, "background")
            .and_then(|c| Rgba::parse_hex(&c))
            .unwrap_or(accent);
        buf.get_mut(at.x, at.y).set_char('▪').set_fg(rgb(color));
        return;
    } else if let Some(text) = page.text(el).filter(|t| !t.is_empty()) {
        let style = text_style(page, el, accent, hidden);
        for (i, line) in site::wrap_text(&text, at.width as usize).iter().enumerate() {
            put(buf, at, at.x, at.y + i as u16, line, style);
        }
    }

    for child in page.children(el) {
        paint_element(buf, area, page, child, host, accent, hidden);
    }
}

fn text_style(page: &Page, el: ElementId, accent: Rgba, hidden: bool) -> Style {
    let mut style = Style::default().fg(TEXT);
    if hidden {
        return style.fg(Color::Rgb(40, 36, 60));
    }
    match page.tag(el).as_deref() {
        Some("h1") => style = style.fg(rgb(accent)).add_modifier(Modifier::BOLD),
        Some("h2" | "h3") => style = style.add_modifier(Modifier::BOLD),
        Some("button") => style = style.fg(rgb(accent)),
        _ => {}
    }
    if page.style(el, "color").is_some() {
        let active = page
            .custom_property("--purple-3")
            .and_then(|c| Rgba::parse_hex(&c))
            .unwrap_or(accent);
        style = style
            .fg(rgb(active))
            .bg(Color::Rgb(36, 26, 66))
            .add_modifier(Modifier::BOLD);
    }
    style
}

fn paint_box(buf: &mut Buffer, at: Area, style: Style) {
    if at.width < 2 || at.height < 2 {
        return;
    }
    let (l, r, t, b) = (at.left(), at.right() - 1, at.top(), at.bottom() - 1);
    for x in l..=r {
        buf.get_mut(x, t).set_char('─').set_style(style);
        buf.get_mut(x, b).set_char('─').set_style(style);
    }
    for y in t..=b {
        buf.get_mut(l, y).set_char('│').set_style(style);
        buf.get_mut(r, y).set_char('│').set_style(style);
    }
    buf.get_mut(l, t).set_char('╭');
    buf.get_mut(r, t).set_char('╮');
    buf.get_mut(l, b).set_char('╰');
    buf.get_mut(r, b).set_char('╯');
}

/// Ten-segment gauge standing in for the SVG ring.
fn paint_ring(buf: &mut Buffer, at: Area, page: &Page, el: ElementId, accent: Rgba) {
    let card = RingCard::parse(page, el, &accent.to_hex());
    let color = page
        .style(el, "--ring-color")
        .and_then(|c| Rgba::parse_hex(&c))
        .unwrap_or(accent);
    let filled = if page.has_class(el, "animated") {
        (card.pct / 10.0).round() as usize
    } else {
        0
    };
    let gauge: String = (0..10).map(|i| if i < filled { '●' } else { '○' }).collect();
    let head = format!("{} {}  ", card.icon, card.label);
    let style = Style::default().fg(TEXT).add_modifier(Modifier::BOLD);
    put(buf, at, at.x, at.y, &head, style);
    let gx = at.x + head.chars().count() as u16;
    put(buf, at, gx, at.y, &gauge, Style::default().fg(rgb(color)));
    let pct = format!(" {}%", card.pct.round());
    put(buf, at, gx + 10, at.y, &pct, style);
    put(buf, at, at.x, at.y + 1, &card.note, Style::default().fg(MUTED));
}
