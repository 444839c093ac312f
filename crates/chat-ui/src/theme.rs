//! UI theme — dark and light palettes.

use egui::{Color32, CornerRadius, Stroke, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            ThemeMode::Dark => &DARK,
            ThemeMode::Light => &LIGHT,
        }
    }
}

pub struct Palette {
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_surface: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub accent: Color32,
    pub success: Color32,
    pub error: Color32,
}

pub const DARK: Palette = Palette {
    bg_primary: Color32::from_rgb(24, 24, 27),
    bg_secondary: Color32::from_rgb(39, 39, 42),
    bg_surface: Color32::from_rgb(52, 52, 56),
    text_primary: Color32::from_rgb(228, 228, 231),
    text_secondary: Color32::from_rgb(161, 161, 170),
    accent: Color32::from_rgb(99, 102, 241),
    success: Color32::from_rgb(34, 197, 94),
    error: Color32::from_rgb(239, 68, 68),
};

pub const LIGHT: Palette = Palette {
    bg_primary: Color32::from_rgb(248, 250, 252),
    bg_secondary: Color32::from_rgb(255, 255, 255),
    bg_surface: Color32::from_rgb(226, 232, 240),
    text_primary: Color32::from_rgb(15, 23, 42),
    text_secondary: Color32::from_rgb(100, 116, 139),
    accent: Color32::from_rgb(79, 70, 229),
    success: Color32::from_rgb(22, 163, 74),
    error: Color32::from_rgb(220, 38, 38),
};

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(6);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

/// Apply a theme to an egui context
pub fn apply_theme(ctx: &egui::Context, mode: ThemeMode) {
    let palette = mode.palette();
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = mode == ThemeMode::Dark;
    style.visuals.panel_fill = palette.bg_primary;
    style.visuals.window_fill = palette.bg_secondary;
    style.visuals.extreme_bg_color = palette.bg_surface;

    style.visuals.widgets.inactive.bg_fill = palette.bg_surface;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, palette.text_secondary);
    style.visuals.widgets.hovered.bg_fill = palette.bg_surface;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, palette.text_primary);
    style.visuals.widgets.active.bg_fill = palette.accent;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, palette.text_primary);

    style.visuals.selection.bg_fill = palette.accent.linear_multiply(0.4);
    style.visuals.selection.stroke = Stroke::new(1.0, palette.accent);

    style.visuals.hyperlink_color = palette.accent;
    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}
