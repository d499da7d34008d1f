use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event_bus::{SubscriptionId, Subscribers};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Dark, Theme::Light];

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTheme(pub String);

impl fmt::Display for UnknownTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown theme {:?} (expected \"dark\" or \"light\")", self.0)
    }
}

impl std::error::Error for UnknownTheme {}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Fixed per-theme colors for every themed layer of the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub ocean: Color,
    pub land_fill: Color,
    pub land_glow: Color,
    pub land_stroke: Color,
    pub land_stroke_width_px: f32,
    /// Opacity of the additive glow copy of the land layer.
    pub land_glow_layer_opacity: f32,
    pub highlight_fill: Color,
    pub highlight_stroke: Color,
    pub highlight_bleed: Color,
    pub highlight_stroke_width_px: f32,
    pub atmosphere: Color,
    pub graticule: Color,
    pub ring: Color,
    pub marker: Color,
    pub marker_active: Color,
    pub halo: Color,
    pub label_text: Color,
    pub label_background: Color,
}

pub static DARK: Palette = Palette {
    background: Color::rgb(5, 8, 18),
    ocean: Color::rgb(10, 24, 48),
    land_fill: Color::rgb(28, 58, 92),
    land_glow: Color::rgba(64, 170, 255, 150),
    land_stroke: Color::rgba(94, 200, 255, 220),
    land_stroke_width_px: 1.2,
    land_glow_layer_opacity: 0.35,
    highlight_fill: Color::rgba(110, 220, 255, 140),
    highlight_stroke: Color::rgb(190, 245, 255),
    highlight_bleed: Color::rgba(90, 210, 255, 90),
    highlight_stroke_width_px: 2.0,
    atmosphere: Color::rgba(70, 150, 255, 90),
    graticule: Color::rgba(120, 170, 230, 40),
    ring: Color::rgba(94, 200, 255, 120),
    marker: Color::rgb(120, 200, 255),
    marker_active: Color::rgb(255, 214, 102),
    halo: Color::rgba(120, 200, 255, 255),
    label_text: Color::rgb(235, 245, 255),
    label_background: Color::rgba(8, 16, 32, 200),
};

pub static LIGHT: Palette = Palette {
    background: Color::rgb(244, 241, 234),
    ocean: Color::rgb(206, 226, 242),
    land_fill: Color::rgb(250, 248, 242),
    land_glow: Color::rgba(150, 190, 228, 140),
    land_stroke: Color::rgba(104, 140, 178, 220),
    land_stroke_width_px: 1.0,
    land_glow_layer_opacity: 0.2,
    highlight_fill: Color::rgba(255, 170, 64, 150),
    highlight_stroke: Color::rgb(224, 112, 24),
    highlight_bleed: Color::rgba(255, 186, 110, 90),
    highlight_stroke_width_px: 2.0,
    atmosphere: Color::rgba(150, 190, 235, 80),
    graticule: Color::rgba(90, 120, 160, 45),
    ring: Color::rgba(224, 112, 24, 110),
    marker: Color::rgb(40, 96, 160),
    marker_active: Color::rgb(224, 96, 16),
    halo: Color::rgba(40, 96, 160, 255),
    label_text: Color::rgb(24, 32, 48),
    label_background: Color::rgba(255, 255, 255, 220),
};

/// Process-wide theme signal.
///
/// Dependents subscribe and are notified synchronously whenever the theme
/// actually changes; setting the current theme again is a no-op.
#[derive(Debug, Default)]
pub struct ThemeProvider {
    current: Theme,
    revision: u64,
    subscribers: Subscribers<Theme>,
}

impl ThemeProvider {
    pub fn new(theme: Theme) -> Self {
        Self {
            current: theme,
            revision: 0,
            subscribers: Subscribers::new(),
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn palette(&self) -> &'static Palette {
        self.current.palette()
    }

    /// Number of effective changes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` if the theme changed (and subscribers were notified).
    pub fn set(&mut self, theme: Theme) -> bool {
        if theme == self.current {
            return false;
        }
        self.current = theme;
        self.revision += 1;
        tracing::info!(theme = %theme, revision = self.revision, "theme changed");
        self.subscribers.notify(&theme);
        true
    }

    pub fn toggle(&mut self) -> Theme {
        let next = self.current.toggled();
        self.set(next);
        next
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&Theme) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}
