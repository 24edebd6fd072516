use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Response, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{entity_label, format_total};

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, draw_region, group_color,
    layout_to_screen, screen_to_layout, with_opacity,
};
use super::super::{SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn search_matches(&mut self) -> Option<&HashSet<u32>> {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_match_cache = None;
            return None;
        }

        let stale = self
            .search_match_cache
            .as_ref()
            .is_none_or(|cached| cached.query != query);
        if stale {
            let matcher = SkimMatcherV2::default();
            let matches = self
                .explorer
                .summaries()
                .keys()
                .copied()
                .filter(|id| fuzzy_match_score(&matcher, &entity_label(*id), query).is_some())
                .collect();
            self.search_match_cache = Some(SearchMatchCache {
                query: query.to_owned(),
                matches,
            });
        }

        self.search_match_cache.as_ref().map(|cached| &cached.matches)
    }

    pub(in crate::app) fn draw_overview(
        &mut self,
        ui: &Ui,
        painter: &Painter,
        rect: Rect,
        response: &Response,
        now: f64,
    ) {
        let presentation = self.explorer.presentation();
        let opacity = presentation.overview_opacity;
        let hover_enabled = presentation.hover_enabled;
        let scroll_hint_visible = presentation.scroll_hint_visible;
        let origin = rect.min;

        draw_background(painter, rect);
        for region in self.explorer.regions() {
            draw_region(painter, origin, region.bounds, opacity);
        }

        self.hovered = if hover_enabled {
            ui.input(|input| input.pointer.hover_pos())
                .filter(|pointer| rect.contains(*pointer))
                .and_then(|pointer| self.explorer.point_at(screen_to_layout(origin, pointer)))
        } else {
            None
        };
        if self.hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let selected = self.explorer.state().entity_id();
        let matches = self.search_matches().cloned();
        let search_active = matches.as_ref().is_some_and(|matches| !matches.is_empty());

        for (group, point) in self.explorer.points() {
            let position = layout_to_screen(origin, point.pos);
            if !circle_visible(rect, position, point.radius) {
                continue;
            }

            let is_hovered = self.hovered == Some(point.entity_id);
            let is_match = matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&point.entity_id));

            let base_color = group_color(group);
            let color = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.35)
            } else if is_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.6)
            } else if search_active {
                dim_color(base_color, 0.38)
            } else {
                base_color
            };

            painter.circle_filled(position, point.radius, with_opacity(color, opacity));
            if selected == Some(point.entity_id) {
                painter.circle_stroke(
                    position,
                    point.radius + 4.0,
                    Stroke::new(2.0, with_opacity(Color32::from_rgb(245, 206, 93), opacity)),
                );
            }
            let stroke_width = if is_hovered || is_match { 2.0 } else { 1.0 };
            painter.circle_stroke(
                position,
                point.radius,
                Stroke::new(
                    stroke_width,
                    with_opacity(Color32::from_rgba_unmultiplied(15, 15, 15, 190), opacity),
                ),
            );
        }

        for handle in self.explorer.simulations() {
            let region = handle.simulation().region();
            painter.text(
                layout_to_screen(origin, vec2(region.anchor.x, region.bounds.y0 + 6.0)),
                Align2::CENTER_TOP,
                handle.group().label(),
                FontId::proportional(14.0),
                with_opacity(Color32::from_gray(200), opacity),
            );
        }

        if let Some(id) = self.hovered
            && let Some(summary) = self.explorer.summary(id)
        {
            let panel_text = format!(
                "{} | {} | total {}",
                entity_label(id),
                summary.group,
                format_total(summary.primary_total)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if scroll_hint_visible {
            painter.text(
                rect.center_bottom() - vec2(0.0, 14.0),
                Align2::CENTER_BOTTOM,
                "Click a subject to see its details",
                FontId::proportional(13.0),
                with_opacity(Color32::from_gray(170), opacity),
            );
        }

        if hover_enabled
            && response.clicked_by(egui::PointerButton::Primary)
            && let Some(id) = self.hovered
        {
            self.explorer.select(id, now);
            ui.ctx().request_repaint();
        }
    }
}
