use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        self + (to - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned box in surface units. `y` grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Overlap of two boxes, `None` when they are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Parses `#rrggbb` or `#rgb`, ignoring surrounding whitespace.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            3 => {
                let mut out = [0u8; 3];
                for (slot, ch) in out.iter_mut().zip(hex.chars()) {
                    let v = ch.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vec2_length {
        use super::*;

        #[test]
        fn calculates_length_squared() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length_sq(), 25.0);
        }

        #[test]
        fn calculates_length() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length(), 5.0);
        }

        #[test]
        fn distance_is_symmetric() {
            let a = Vec2::new(1.0, 1.0);
            let b = Vec2::new(4.0, 5.0);
            assert_eq!(a.distance(b), 5.0);
            assert_eq!(b.distance(a), 5.0);
        }
    }

    mod vec2_ops {
        use super::*;

        #[test]
        fn add_assign_modifies_in_place() {
            let mut a = Vec2::new(1.0, 2.0);
            a += Vec2::new(3.0, 4.0);
            assert_eq!(a, Vec2::new(4.0, 6.0));
        }

        #[test]
        fn sub_assign_modifies_in_place() {
            let mut a = Vec2::new(5.0, 7.0);
            a -= Vec2::new(2.0, 3.0);
            assert_eq!(a, Vec2::new(3.0, 4.0));
        }

        #[test]
        fn lerp_hits_both_ends_and_midpoint() {
            let a = Vec2::new(0.0, 10.0);
            let b = Vec2::new(10.0, 20.0);
            assert_eq!(a.lerp(b, 0.0), a);
            assert_eq!(a.lerp(b, 1.0), b);
            assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 15.0));
        }
    }

    mod rect {
        use super::*;

        #[test]
        fn intersection_of_overlapping_boxes() {
            let a = Rect::new(0.0, 0.0, 10.0, 10.0);
            let b = Rect::new(5.0, 5.0, 10.0, 10.0);
            assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        }

        #[test]
        fn disjoint_boxes_do_not_intersect() {
            let a = Rect::new(0.0, 0.0, 10.0, 10.0);
            let b = Rect::new(20.0, 0.0, 5.0, 5.0);
            assert_eq!(a.intersection(&b), None);
        }

        #[test]
        fn touching_edges_give_zero_area() {
            let a = Rect::new(0.0, 0.0, 10.0, 10.0);
            let b = Rect::new(10.0, 0.0, 5.0, 5.0);
            let hit = a.intersection(&b).expect("edges touch");
            assert_eq!(hit.area(), 0.0);
        }

        #[test]
        fn contains_includes_edges() {
            let r = Rect::new(0.0, 0.0, 10.0, 10.0);
            assert!(r.contains(Vec2::new(10.0, 10.0)));
            assert!(!r.contains(Vec2::new(10.1, 5.0)));
        }
    }

    mod rgba {
        use super::*;

        #[test]
        fn parses_long_hex() {
            assert_eq!(Rgba::parse_hex("#8b5cf6"), Some(Rgba::rgb(139, 92, 246)));
        }

        #[test]
        fn parses_short_hex_with_whitespace() {
            assert_eq!(Rgba::parse_hex("  #fff "), Some(Rgba::rgb(255, 255, 255)));
        }

        #[test]
        fn rejects_garbage() {
            assert_eq!(Rgba::parse_hex("purple"), None);
            assert_eq!(Rgba::parse_hex("#12345"), None);
            assert_eq!(Rgba::parse_hex("#zzzzzz"), None);
        }

        #[test]
        fn rejects_sign_prefixed_pairs() {
            assert_eq!(Rgba::parse_hex("#+f+f+f"), None);
            assert_eq!(Rgba::parse_hex("#-1-1-1"), None);
            assert_eq!(Rgba::parse_hex("#+ff"), None);
        }

        #[test]
        fn alpha_is_clamped() {
            assert_eq!(Rgba::rgb(1, 2, 3).with_alpha(3.0).a, 1.0);
            assert_eq!(Rgba::rgb(1, 2, 3).with_alpha(-1.0).a, 0.0);
        }

        #[test]
        fn hex_round_trips_through_formatting() {
            assert_eq!(Rgba::rgb(139, 92, 246).to_hex(), "#8b5cf6");
        }
    }
}
