//! Ambient particle background: drifting dots with faint links between
//! close neighbours.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{
    config::FieldSettings,
    types::{Rgba, Vec2},
};

/// Drawing operations the field needs from its surface.
pub trait Canvas {
    fn clear(&mut self);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

/// Number of particles for a surface: density-based, capped per device class.
pub fn particle_count(settings: &FieldSettings, width: f32, height: f32, narrow: bool) -> usize {
    let cap = if narrow {
        settings.cap_narrow
    } else {
        settings.cap_wide
    };
    let area = finite_extent(width) * finite_extent(height);
    let by_density = (area / settings.density_divisor).floor();
    if by_density.is_nan() || by_density <= 0.0 {
        0
    } else if by_density.is_infinite() {
        // Finite sides whose product overflows are still a huge surface.
        cap
    } else {
        cap.min(by_density as usize)
    }
}

/// Line opacity for two particles `dist` apart, `None` when too far to link.
pub fn link_opacity(settings: &FieldSettings, dist: f32) -> Option<f32> {
    if dist < settings.link_distance {
        Some(settings.link_opacity * (1.0 - dist / settings.link_distance))
    } else {
        None
    }
}

pub struct ParticleField {
    settings: FieldSettings,
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(settings: FieldSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_seed(settings: FieldSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: FieldSettings, rng: StdRng) -> Self {
        Self {
            settings,
            particles: Vec::new(),
            width: 0.0,
            height: 0.0,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Throws away the current set and scatters a fresh one over the surface.
    pub fn initialize(&mut self, width: f32, height: f32, narrow: bool) {
        self.width = finite_extent(width);
        self.height = finite_extent(height);
        let count = particle_count(&self.settings, self.width, self.height, narrow);
        let drift = self.settings.drift_max;

        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            let pos = Vec2::new(
                self.rng.gen_range(0.0..self.width),
                self.rng.gen_range(0.0..self.height),
            );
            let vel = Vec2::new(
                self.rng.gen_range(-drift..=drift),
                self.rng.gen_range(-drift..=drift),
            );
            let radius = self
                .rng
                .gen_range(self.settings.radius_min..=self.settings.radius_max);
            let alpha = self
                .rng
                .gen_range(self.settings.alpha_min..=self.settings.alpha_max);
            self.particles.push(Particle {
                pos,
                vel,
                radius,
                alpha,
            });
        }
        debug!(
            width = self.width,
            height = self.height,
            narrow,
            count,
            "particle field initialized"
        );
    }

    /// One frame: move, wrap, then draw dots and links.
    pub fn advance_and_render<C: Canvas>(&mut self, canvas: &mut C, accent: Rgba) {
        canvas.clear();
        self.advance();

        for p in &self.particles {
            canvas.fill_circle(p.pos, p.radius, accent.with_alpha(p.alpha));
        }

        for i in 0..self.particles.len() {
            for j in (i + 1)..self.particles.len() {
                let a = self.particles[i].pos;
                let b = self.particles[j].pos;
                if let Some(opacity) = link_opacity(&self.settings, a.distance(b)) {
                    canvas.stroke_line(a, b, self.settings.link_width, accent.with_alpha(opacity));
                }
            }
        }
    }

    fn advance(&mut self) {
        let (w, h) = (self.width, self.height);
        for p in &mut self.particles {
            p.pos += p.vel;
            p.pos.x = wrap(p.pos.x, w);
            p.pos.y = wrap(p.pos.y, h);
        }
    }

    #[cfg(test)]
    fn set_particles(&mut self, width: f32, height: f32, particles: Vec<Particle>) {
        self.width = width;
        self.height = height;
        self.particles = particles;
    }
}

fn finite_extent(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Toroidal wrap into `[0, extent)`.
fn wrap(v: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let mut out = v;
    if out < 0.0 {
        out += extent;
    } else if out >= extent {
        out -= extent;
    }
    // Large velocities or float rounding can still land on the edge.
    if !(0.0..extent).contains(&out) {
        out = out.rem_euclid(extent);
        if out >= extent {
            out = 0.0;
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Clear,
        Circle { center: Vec2, radius: f32, color: Rgba },
        Line { from: Vec2, to: Vec2, width: f32, color: Rgba },
    }

    #[derive(Debug, Default)]
    pub struct RecordingCanvas {
        pub ops: Vec<Op>,
    }

    impl RecordingCanvas {
        pub fn lines(&self) -> Vec<&Op> {
            self.ops.iter().filter(|op| matches!(op, Op::Line { .. })).collect()
        }

        pub fn circles(&self) -> usize {
            self.ops.iter().filter(|op| matches!(op, Op::Circle { .. })).count()
        }
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self) {
            self.ops.clear();
            self.ops.push(Op::Clear);
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
            self.ops.push(Op::Circle {
                center,
                radius,
                color,
            });
        }

        fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
            self.ops.push(Op::Line {
                from,
                to,
                width,
                color,
            });
        }
    }
}
