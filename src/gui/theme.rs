use eframe::egui::{
    self,
    RichText,
};
use egui::{
    epaint::Shadow,
    style::{
        Selection,
        WidgetVisuals,
        Widgets,
    },
    Color32,
    Stroke,
    Visuals,
};

#[derive(Clone)]
pub struct Theme {
    dark: Palette,
    light: Palette,
}

impl Default for Theme {
    fn default() -> Self {
        Self::indigo()
    }
}

impl Theme {
    pub fn indigo() -> Self {
        Theme { dark: Palette::indigo_night(), light: Palette::indigo_day() }
    }

    fn palette(&self, ctx: &egui::Context) -> &Palette {
        if ctx.style().visuals.dark_mode {
            &self.dark
        } else {
            &self.light
        }
    }

    pub fn accent(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).accent
    }

    pub fn success(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).green
    }

    pub fn danger(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).red
    }

    pub fn trophy(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).yellow
    }

    pub fn muted(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).muted
    }

    /// Fill of the card face showing the definition.
    pub fn card_back(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).accent
    }

    pub fn card_front(&self, ctx: &egui::Context) -> Color32 {
        self.palette(ctx).surface
    }

    pub fn title(&self, content: &str) -> RichText {
        RichText::new(content).size(26.0).strong()
    }

    pub fn subtitle(&self, ctx: &egui::Context, content: &str) -> RichText {
        RichText::new(content).size(15.0).color(self.muted(ctx))
    }
}

#[derive(Clone)]
struct Palette {
    background: Color32,
    surface: Color32,
    raised: Color32,
    border: Color32,
    foreground: Color32,
    muted: Color32,
    accent: Color32,
    accent_hover: Color32,
    red: Color32,
    green: Color32,
    yellow: Color32,
}

impl Palette {
    fn indigo_day() -> Self {
        Self {
            background: Color32::from_rgb(249, 250, 251),
            surface: Color32::from_rgb(255, 255, 255),
            raised: Color32::from_rgb(243, 244, 246),
            border: Color32::from_rgb(229, 231, 235),
            foreground: Color32::from_rgb(17, 24, 39),
            muted: Color32::from_rgb(75, 85, 99),
            accent: Color32::from_rgb(79, 70, 229),
            accent_hover: Color32::from_rgb(67, 56, 202),
            red: Color32::from_rgb(185, 28, 28),
            green: Color32::from_rgb(34, 197, 94),
            yellow: Color32::from_rgb(234, 179, 8),
        }
    }

    fn indigo_night() -> Self {
        Self {
            background: Color32::from_rgb(17, 24, 39),
            surface: Color32::from_rgb(31, 41, 55),
            raised: Color32::from_rgb(55, 65, 81),
            border: Color32::from_rgb(75, 85, 99),
            foreground: Color32::from_rgb(243, 244, 246),
            muted: Color32::from_rgb(156, 163, 175),
            accent: Color32::from_rgb(99, 102, 241),
            accent_hover: Color32::from_rgb(129, 140, 248),
            red: Color32::from_rgb(248, 113, 113),
            green: Color32::from_rgb(74, 222, 128),
            yellow: Color32::from_rgb(250, 204, 21),
        }
    }
}

pub fn set_theme(ctx: &egui::Context, theme: &Theme) {
    set_theme_variant(ctx, &theme.dark, true);
    set_theme_variant(ctx, &theme.light, false);
}

pub fn blend_colors(color_a: Color32, color_b: Color32, t: f32) -> Color32 {
    let blend_channel = |a: u8, b: u8| ((1.0 - t) * (a as f32) + t * (b as f32)).round() as u8;
    Color32::from_rgba_unmultiplied(
        blend_channel(color_a.r(), color_b.r()),
        blend_channel(color_a.g(), color_b.g()),
        blend_channel(color_a.b(), color_b.b()),
        blend_channel(color_a.a(), color_b.a()),
    )
}

fn set_theme_variant(ctx: &egui::Context, palette: &Palette, is_dark: bool) {
    let (default, variant) = match is_dark {
        true => (Visuals::dark(), egui::Theme::Dark),
        false => (Visuals::light(), egui::Theme::Light),
    };

    let widget = |base: WidgetVisuals, fill: Color32, stroke: Color32| WidgetVisuals {
        bg_fill: fill,
        weak_bg_fill: fill,
        bg_stroke: Stroke { color: stroke, ..base.bg_stroke },
        fg_stroke: Stroke { color: palette.foreground, ..base.fg_stroke },
        ..base
    };

    ctx.set_visuals_of(
        variant,
        Visuals {
            dark_mode: is_dark,
            widgets: Widgets {
                noninteractive: widget(default.widgets.noninteractive, palette.surface, palette.border),
                inactive: widget(default.widgets.inactive, palette.raised, palette.border),
                hovered: widget(
                    default.widgets.hovered,
                    blend_colors(palette.raised, palette.accent, 0.2),
                    palette.accent,
                ),
                active: widget(default.widgets.active, palette.raised, palette.accent_hover),
                open: widget(default.widgets.open, palette.surface, palette.accent),
            },
            selection: Selection {
                bg_fill: blend_colors(palette.surface, palette.accent, 0.35),
                stroke: Stroke { color: palette.accent, ..default.selection.stroke },
            },
            hyperlink_color: palette.accent,
            faint_bg_color: palette.raised,
            extreme_bg_color: palette.surface,
            error_fg_color: palette.red,
            warn_fg_color: palette.yellow,
            window_shadow: Shadow { color: palette.border, ..default.window_shadow },
            window_fill: palette.surface,
            window_stroke: Stroke { color: palette.border, ..default.window_stroke },
            panel_fill: palette.background,
            ..default
        },
    );

    ctx.all_styles_mut(|style| {
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.interaction.tooltip_delay = 0.0;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_is_linear_per_channel() {
        let black = Color32::from_rgb(0, 0, 0);
        let white = Color32::from_rgb(255, 255, 255);

        assert_eq!(blend_colors(black, white, 0.0), black);
        assert_eq!(blend_colors(black, white, 1.0), white);
        assert_eq!(blend_colors(black, white, 0.5), Color32::from_rgb(128, 128, 128));
    }
}
