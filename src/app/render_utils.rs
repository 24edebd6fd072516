use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, StrokeKind, Vec2};

use crate::cohort::GroupLabel;
use crate::sim::Bounds;

pub(super) fn group_color(group: GroupLabel) -> Color32 {
    match group {
        GroupLabel::GroupA => Color32::from_rgb(94, 170, 230),
        GroupLabel::GroupB => Color32::from_rgb(241, 146, 94),
        GroupLabel::GroupC => Color32::from_rgb(132, 205, 128),
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));
}

pub(super) fn draw_region(painter: &Painter, origin: Pos2, bounds: Bounds, opacity: f32) {
    let region = Rect::from_min_max(
        origin + Vec2::new(bounds.x0, bounds.y0),
        origin + Vec2::new(bounds.x1, bounds.y1),
    );
    painter.rect_filled(region, 6.0, with_opacity(Color32::from_rgb(27, 32, 40), opacity));
    painter.rect_stroke(
        region,
        6.0,
        Stroke::new(1.0, with_opacity(Color32::from_rgb(60, 70, 80), opacity)),
        StrokeKind::Inside,
    );
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn layout_to_screen(origin: Pos2, position: Vec2) -> Pos2 {
    origin + position
}

pub(super) fn screen_to_layout(origin: Pos2, screen: Pos2) -> Vec2 {
    screen - origin
}
