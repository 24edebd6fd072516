use eframe::egui::{self, Align, Context, Layout, Sense};

use crate::explorer::Explorer;
use crate::util::entity_label;
use crate::view::ViewState;

use super::super::gesture::{ScrollDirection, ScrollGesture};
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(explorer: Explorer, source_label: String) -> Self {
        let fade_ms = (explorer.view().fade_secs() * 1000.0) as f32;
        Self {
            explorer,
            gesture: ScrollGesture::default(),
            source_label,
            search: String::new(),
            search_match_cache: None,
            fade_ms,
            hovered: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let now = ctx.input(|input| input.time);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("cohort-orbit");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    ui.label(format!("subjects: {}", self.explorer.summaries().len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload cohort"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.state_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
            self.explorer.resize(rect.width(), rect.height());

            if response.hovered() {
                let delta = ui.input(|input| input.raw_scroll_delta.y);
                match self.gesture.push(delta) {
                    Some(ScrollDirection::Down) => {
                        self.explorer.scroll_down(now);
                    }
                    Some(ScrollDirection::Up) => {
                        self.explorer.scroll_up(now);
                    }
                    None => {}
                }
            } else {
                self.gesture.reset();
            }

            let moving = self.explorer.advance(now);

            let painter = ui.painter_at(rect);
            let presentation = self.explorer.presentation().clone();
            if presentation.overview_visible {
                self.draw_overview(ui, &painter, rect, &response, now);
            } else {
                self.hovered = None;
            }
            if let Some(detail) = &presentation.detail {
                self.draw_detail(ui, rect, detail, presentation.detail_opacity);
            }

            if moving || self.explorer.view().is_animating() {
                ui.ctx().request_repaint();
            }
        });
    }

    fn state_text(&self) -> String {
        match self.explorer.state() {
            ViewState::Overview => "overview".to_owned(),
            ViewState::TransitioningToDetail { entity_id } => {
                format!("opening {}", entity_label(entity_id))
            }
            ViewState::Detail { entity_id } => format!("detail: {}", entity_label(entity_id)),
            ViewState::TransitioningToOverview { entity_id } => {
                format!("closing {}", entity_label(entity_id))
            }
        }
    }
}
