use crate::{
    field::Canvas,
    types::{Rgba, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterCell {
    pub ch: char,
    pub alpha: f32,
    pub color: Rgba,
}

const EMPTY: RasterCell = RasterCell {
    ch: ' ',
    alpha: f32::NEG_INFINITY,
    color: Rgba::rgb(0, 0, 0),
};

/// Terminal-cell canvas. Drawing happens in surface units; each cell covers
/// `cell_w` x `cell_h` of them.
#[derive(Debug)]
pub struct Raster {
    width: u16,
    height: u16,
    cell_w: f32,
    cell_h: f32,
    cells: Vec<RasterCell>,
}

impl Raster {
    pub fn new(width: u16, height: u16, cell_w: f32, cell_h: f32) -> Self {
        let mut raster = Self {
            width,
            height,
            cell_w,
            cell_h,
            cells: Vec::new(),
        };
        raster.resize(width, height);
        raster
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(len, EMPTY);
        }
        Canvas::clear(self);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    #[cfg(test)]
    /// Size of the raster in surface units.
    pub fn surface_size(&self) -> (f32, f32) {
        (
            self.width as f32 * self.cell_w,
            self.height as f32 * self.cell_h,
        )
    }

    pub fn get(&self, x: u16, y: u16) -> RasterCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    fn cell_of(&self, p: Vec2) -> Option<(u16, u16)> {
        let cx = (p.x / self.cell_w).floor();
        let cy = (p.y / self.cell_h).floor();
        if cx < 0.0 || cy < 0.0 || cx >= self.width as f32 || cy >= self.height as f32 {
            return None;
        }
        Some((cx as u16, cy as u16))
    }

    /// Stronger alpha wins a contested cell.
    fn set(&mut self, x: u16, y: u16, ch: char, alpha: f32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if alpha >= cell.alpha {
            *cell = RasterCell { ch, alpha, color };
        }
    }
}

impl Canvas for Raster {
    fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let Some((x, y)) = self.cell_of(center) else {
            return;
        };
        let ch = if radius >= 1.25 { '•' } else { '·' };
        self.set(x, y, ch, color.a, color);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, _width: f32, color: Rgba) {
        let dx = (to.x - from.x) / self.cell_w;
        let dy = (to.y - from.y) / self.cell_h;
        let ch = line_glyph(dx, dy);
        // Two samples per cell along the longer axis.
        let steps = (dx.abs().max(dy.abs()) * 2.0).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let p = from.lerp(to, i as f32 / steps as f32);
            if let Some((x, y)) = self.cell_of(p) {
                self.set(x, y, ch, color.a, color);
            }
        }
    }
}

/// Glyph for a segment with the given direction in cell units.
fn line_glyph(dx: f32, dy: f32) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay <= ax * 0.4 {
        '─'
    } else if ax <= ay * 0.4 {
        '│'
    } else if (dx > 0.0) == (dy > 0.0) {
        '╲'
    } else {
        '╱'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCENT: Rgba = Rgba::rgb(139, 92, 246);

    mod raster {
        use super::*;

        #[test]
        fn creates_with_correct_dimensions() {
            let r = Raster::new(80, 24, 8.0, 16.0);
            assert_eq!(r.width(), 80);
            assert_eq!(r.height(), 24);
            assert_eq!(r.surface_size(), (640.0, 384.0));
        }

        #[test]
        fn zero_dimensions_creates_empty_raster() {
            let r = Raster::new(0, 0, 8.0, 16.0);
            assert_eq!(r.surface_size(), (0.0, 0.0));
        }

        #[test]
        fn resize_clears_cells() {
            let mut r = Raster::new(10, 10, 8.0, 16.0);
            r.fill_circle(Vec2::new(4.0, 4.0), 2.0, ACCENT);
            r.resize(12, 10);
            assert_eq!(r.get(0, 0).ch, ' ');
        }

        #[test]
        fn does_not_overwrite_with_lower_alpha() {
            let mut r = Raster::new(10, 10, 8.0, 16.0);
            r.fill_circle(Vec2::new(4.0, 4.0), 2.0, ACCENT.with_alpha(0.4));
            r.fill_circle(Vec2::new(5.0, 5.0), 0.5, ACCENT.with_alpha(0.1));
            assert_eq!(r.get(0, 0).ch, '•');
            assert_eq!(r.get(0, 0).alpha, 0.4);
        }

        #[test]
        fn out_of_bounds_is_ignored() {
            let mut r = Raster::new(10, 10, 8.0, 16.0);
            r.fill_circle(Vec2::new(-1.0, 5.0), 2.0, ACCENT);
            r.fill_circle(Vec2::new(5000.0, 5.0), 2.0, ACCENT);
            r.stroke_line(Vec2::new(-100.0, -100.0), Vec2::new(-50.0, -50.0), 0.6, ACCENT);
        }
    }

    mod lines {
        use super::*;

        #[test]
        fn horizontal_line_covers_each_cell() {
            let mut r = Raster::new(10, 2, 8.0, 16.0);
            r.stroke_line(Vec2::new(4.0, 4.0), Vec2::new(76.0, 4.0), 0.6, ACCENT.with_alpha(0.05));
            for x in 0..10 {
                assert_eq!(r.get(x, 0).ch, '─');
            }
            assert_eq!(r.get(0, 1).ch, ' ');
        }

        #[test]
        fn dots_win_over_faint_lines() {
            let mut r = Raster::new(10, 2, 8.0, 16.0);
            r.fill_circle(Vec2::new(4.0, 4.0), 1.0, ACCENT.with_alpha(0.2));
            r.stroke_line(Vec2::new(4.0, 4.0), Vec2::new(76.0, 4.0), 0.6, ACCENT.with_alpha(0.05));
            assert_eq!(r.get(0, 0).ch, '·');
            assert_eq!(r.get(1, 0).ch, '─');
        }

        #[test]
        fn glyph_follows_slope() {
            assert_eq!(line_glyph(5.0, 0.0), '─');
            assert_eq!(line_glyph(0.0, -5.0), '│');
            assert_eq!(line_glyph(3.0, 3.0), '╲');
            assert_eq!(line_glyph(-3.0, -3.0), '╲');
            assert_eq!(line_glyph(3.0, -3.0), '╱');
        }
    }
}
