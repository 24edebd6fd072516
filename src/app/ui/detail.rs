use eframe::egui::{self, Color32, Rect, RichText, Ui, UiBuilder, vec2};

use crate::view::DetailView;

use super::super::ViewModel;
use super::super::render_utils::{draw_background, group_color};

impl ViewModel {
    const DETAIL_CARD_SIZE: egui::Vec2 = vec2(420.0, 260.0);

    pub(in crate::app) fn draw_detail(
        &self,
        ui: &mut Ui,
        rect: Rect,
        detail: &DetailView,
        opacity: f32,
    ) {
        draw_background(ui.painter(), rect);

        let card = Rect::from_center_size(rect.center(), Self::DETAIL_CARD_SIZE.min(rect.size()));
        ui.scope_builder(UiBuilder::new().max_rect(card), |ui| {
            ui.set_opacity(opacity);
            egui::Frame::group(ui.style())
                .fill(Color32::from_rgb(27, 32, 40))
                .inner_margin(egui::Margin::same(16))
                .show(ui, |ui| {
                    ui.set_min_width(card.width() - 32.0);
                    ui.heading(detail.title.as_str());
                    ui.label(
                        RichText::new(detail.group.label()).color(group_color(detail.group)),
                    );
                    ui.add_space(10.0);

                    egui::Grid::new(("detail_rows", detail.entity_id))
                        .num_columns(2)
                        .spacing(vec2(24.0, 6.0))
                        .show(ui, |ui| {
                            for row in &detail.rows {
                                ui.label(row.label.as_str());
                                let value = RichText::new(row.value.as_str()).strong();
                                if row.available {
                                    ui.label(value);
                                } else {
                                    ui.label(value.weak().italics());
                                }
                                ui.end_row();
                            }
                        });

                    if !detail.is_complete() {
                        ui.add_space(6.0);
                        ui.small("Some metrics had no usable samples for this subject.");
                    }
                    ui.add_space(14.0);
                    ui.small("Scroll down to return to the overview");
                });
        });
    }
}
