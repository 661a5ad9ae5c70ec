use std::{fs, path::Path};

use serde::Deserialize;

use crate::{error::FxError, types::Rgba};

pub const DENSITY_DIVISOR: f32 = 18_000.0;
pub const PARTICLE_CAP_WIDE: usize = 80;
pub const PARTICLE_CAP_NARROW: usize = 40;
pub const NARROW_BREAKPOINT: f32 = 768.0;

pub const DRIFT_MAX: f32 = 0.15;
/// Upper bound accepted for a configured drift, in surface units per frame.
pub const DRIFT_LIMIT: f32 = 100.0;
pub const RADIUS_MIN: f32 = 0.5;
pub const RADIUS_MAX: f32 = 2.0;
pub const ALPHA_MIN: f32 = 0.1;
pub const ALPHA_MAX: f32 = 0.5;

pub const LINK_DISTANCE: f32 = 130.0;
pub const LINK_OPACITY: f32 = 0.08;
pub const LINK_WIDTH: f32 = 0.6;

pub const ACCENT_PROPERTY: &str = "--purple-2";
pub const ACCENT_FALLBACK: Rgba = Rgba::rgb(139, 92, 246);

pub const REVEAL_THRESHOLD: f32 = 0.12;
pub const REVEAL_MARGIN_BOTTOM: f32 = -40.0;
pub const SKILL_THRESHOLD: f32 = 0.3;
pub const RING_THRESHOLD: f32 = 0.3;
pub const SECTION_THRESHOLD: f32 = 0.45;
pub const RING_RADIUS: f32 = 36.0;

pub const HEADER_SCROLL_THRESHOLD: f32 = 40.0;
pub const ANCHOR_OFFSET: f32 = 80.0;
pub const SMOOTH_SCROLL_MS: u64 = 450;

pub const CLOCK_INTERVAL_MS: u64 = 1000;

pub const SPLASH_HOLD_MS: u64 = 1600;
pub const SPLASH_FADE_MS: u64 = 600;

pub const TRAIL_TTL_MS: u64 = 500;
pub const TRAIL_MAX: usize = 24;
pub const TRAIL_MIN_STEP: f32 = 8.0;
pub const RIPPLE_TTL_MS: u64 = 600;
pub const RIPPLE_MAX: usize = 8;
pub const FLASH_MS: u64 = 450;
pub const PULSE_MS: u64 = 700;

pub const FRAME_HZ: f32 = 30.0;
pub const CELL_PX_W: f32 = 8.0;
pub const CELL_PX_H: f32 = 16.0;
pub const SCROLL_STEP: f32 = 48.0;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub field: FieldSettings,
    pub effects: EffectSettings,
    pub scroll: ScrollSettings,
    pub host: HostSettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldSettings {
    pub density_divisor: f32,
    pub cap_wide: usize,
    pub cap_narrow: usize,
    pub narrow_breakpoint: f32,
    pub drift_max: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub alpha_min: f32,
    pub alpha_max: f32,
    pub link_distance: f32,
    pub link_opacity: f32,
    pub link_width: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            density_divisor: DENSITY_DIVISOR,
            cap_wide: PARTICLE_CAP_WIDE,
            cap_narrow: PARTICLE_CAP_NARROW,
            narrow_breakpoint: NARROW_BREAKPOINT,
            drift_max: DRIFT_MAX,
            radius_min: RADIUS_MIN,
            radius_max: RADIUS_MAX,
            alpha_min: ALPHA_MIN,
            alpha_max: ALPHA_MAX,
            link_distance: LINK_DISTANCE,
            link_opacity: LINK_OPACITY,
            link_width: LINK_WIDTH,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EffectSettings {
    pub trail_ttl_ms: u64,
    pub trail_max: usize,
    pub trail_min_step: f32,
    pub ripple_ttl_ms: u64,
    pub ripple_max: usize,
    pub flash_ms: u64,
    pub pulse_ms: u64,
    pub splash_hold_ms: u64,
    pub splash_fade_ms: u64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            trail_ttl_ms: TRAIL_TTL_MS,
            trail_max: TRAIL_MAX,
            trail_min_step: TRAIL_MIN_STEP,
            ripple_ttl_ms: RIPPLE_TTL_MS,
            ripple_max: RIPPLE_MAX,
            flash_ms: FLASH_MS,
            pulse_ms: PULSE_MS,
            splash_hold_ms: SPLASH_HOLD_MS,
            splash_fade_ms: SPLASH_FADE_MS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollSettings {
    pub header_threshold: f32,
    pub anchor_offset: f32,
    pub smooth_ms: u64,
    pub step: f32,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            header_threshold: HEADER_SCROLL_THRESHOLD,
            anchor_offset: ANCHOR_OFFSET,
            smooth_ms: SMOOTH_SCROLL_MS,
            step: SCROLL_STEP,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostSettings {
    pub frame_hz: f32,
    pub cell_px_w: f32,
    pub cell_px_h: f32,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            frame_hz: FRAME_HZ,
            cell_px_w: CELL_PX_W,
            cell_px_h: CELL_PX_H,
        }
    }
}

impl Settings {
    /// Reads settings from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, FxError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&raw).map_err(|source| FxError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings.sanitized())
    }

    /// Replaces values that would break the field or the host loop with defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = FieldSettings::default();
        let field = &mut self.field;
        if !(field.density_divisor.is_finite() && field.density_divisor > 0.0) {
            field.density_divisor = defaults.density_divisor;
        }
        if field.drift_max.is_finite() {
            field.drift_max = field.drift_max.clamp(0.0, DRIFT_LIMIT);
        } else {
            field.drift_max = defaults.drift_max;
        }
        if !(field.radius_min.is_finite()
            && field.radius_max.is_finite()
            && field.radius_min > 0.0
            && field.radius_min <= field.radius_max)
        {
            field.radius_min = defaults.radius_min;
            field.radius_max = defaults.radius_max;
        }
        if !(field.alpha_min >= 0.0 && field.alpha_min <= field.alpha_max && field.alpha_max <= 1.0)
        {
            field.alpha_min = defaults.alpha_min;
            field.alpha_max = defaults.alpha_max;
        }
        if !(field.link_distance.is_finite() && field.link_distance > 0.0) {
            field.link_distance = defaults.link_distance;
        }
        if !(field.link_width.is_finite() && field.link_width >= 0.0) {
            field.link_width = defaults.link_width;
        }
        field.link_opacity = if field.link_opacity.is_nan() {
            defaults.link_opacity
        } else {
            field.link_opacity.clamp(0.0, 1.0)
        };

        let host_defaults = HostSettings::default();
        let frame_secs = 1.0 / self.host.frame_hz;
        if !(self.host.frame_hz > 0.0 && frame_secs.is_finite() && self.host.frame_hz.is_finite())
        {
            self.host.frame_hz = host_defaults.frame_hz;
        }
        if !(self.host.cell_px_w.is_finite()
            && self.host.cell_px_h.is_finite()
            && self.host.cell_px_w > 0.0
            && self.host.cell_px_h > 0.0)
        {
            self.host.cell_px_w = host_defaults.cell_px_w;
            self.host.cell_px_h = host_defaults.cell_px_h;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = Settings::default();
        assert_eq!(settings.field.density_divisor, DENSITY_DIVISOR);
        assert_eq!(settings.field.cap_wide, 80);
        assert_eq!(settings.field.cap_narrow, 40);
        assert_eq!(settings.effects.trail_max, TRAIL_MAX);
        assert_eq!(settings.scroll.anchor_offset, 80.0);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [field]
            cap_wide = 120

            [effects]
            ripple_max = 2
            "#,
        )
        .expect("valid toml");
        assert_eq!(settings.field.cap_wide, 120);
        assert_eq!(settings.field.cap_narrow, PARTICLE_CAP_NARROW);
        assert_eq!(settings.effects.ripple_max, 2);
        assert_eq!(settings.host, HostSettings::default());
    }

    #[test]
    fn sanitize_repairs_zero_divisor_and_inverted_ranges() {
        let mut settings = Settings::default();
        settings.field.density_divisor = 0.0;
        settings.field.radius_min = 3.0;
        settings.field.radius_max = 1.0;
        settings.host.frame_hz = 0.0;
        let fixed = settings.sanitized();
        assert_eq!(fixed.field.density_divisor, DENSITY_DIVISOR);
        assert_eq!(fixed.field.radius_min, RADIUS_MIN);
        assert_eq!(fixed.field.radius_max, RADIUS_MAX);
        assert_eq!(fixed.host.frame_hz, FRAME_HZ);
    }

    #[test]
    fn sanitize_rejects_infinite_radius_bound() {
        let settings: Settings = toml::from_str("[field]\nradius_max = inf").expect("valid toml");
        let fixed = settings.sanitized();
        assert_eq!(fixed.field.radius_min, RADIUS_MIN);
        assert_eq!(fixed.field.radius_max, RADIUS_MAX);
    }

    #[test]
    fn sanitize_caps_drift_and_rejects_nan_bounds() {
        let mut settings = Settings::default();
        settings.field.drift_max = f32::MAX;
        settings.field.alpha_max = f32::NAN;
        settings.field.link_width = f32::INFINITY;
        settings.field.link_opacity = f32::NAN;
        let fixed = settings.sanitized();
        assert_eq!(fixed.field.drift_max, DRIFT_LIMIT);
        assert_eq!(fixed.field.alpha_min, ALPHA_MIN);
        assert_eq!(fixed.field.alpha_max, ALPHA_MAX);
        assert_eq!(fixed.field.link_width, LINK_WIDTH);
        assert_eq!(fixed.field.link_opacity, LINK_OPACITY);
    }

    #[test]
    fn sanitize_rejects_frame_rates_without_a_finite_interval() {
        for hz in [f32::MIN_POSITIVE / 4.0, f32::INFINITY, f32::NAN, -5.0] {
            let mut settings = Settings::default();
            settings.host.frame_hz = hz;
            let fixed = settings.sanitized();
            assert_eq!(fixed.host.frame_hz, FRAME_HZ, "frame_hz {hz}");
        }
    }

    #[test]
    fn sanitized_settings_initialize_a_field() {
        let settings: Settings = toml::from_str(
            r#"
            [field]
            radius_max = inf
            drift_max = 3.0e38
            "#,
        )
        .expect("valid toml");
        let fixed = settings.sanitized();
        let mut field = crate::field::ParticleField::with_seed(fixed.field, 3);
        field.initialize(1024.0, 768.0, false);
        assert_eq!(field.particles().len(), 43);
    }

    #[test]
    fn load_without_path_gives_defaults() {
        let settings = Settings::load(None).expect("defaults");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.toml")))
            .expect_err("missing file");
        assert!(matches!(err, FxError::Io(_)));
    }
}
