use eframe::egui::{self, RichText, Ui, vec2};

use crate::cohort::GroupLabel;
use crate::util::{NOT_AVAILABLE, format_total};
use crate::view::ViewState;

use super::super::render_utils::group_color;
use super::super::ViewModel;

impl ViewModel {
    const MAX_FADE_MS: f32 = 2000.0;

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Cohort");
        ui.add_space(6.0);

        let stats = self.explorer.group_stats();
        egui::Grid::new("group_stats")
            .num_columns(4)
            .striped(true)
            .show(ui, |ui| {
                ui.label(RichText::new("Group").strong());
                ui.label(RichText::new("Members").strong());
                ui.label(RichText::new("Mean total").strong());
                ui.label(RichText::new("Layout").strong());
                ui.end_row();

                for group in GroupLabel::ALL {
                    let stat = stats[group.index()];
                    ui.horizontal(|ui| {
                        let (swatch, _) =
                            ui.allocate_exact_size(vec2(10.0, 10.0), egui::Sense::hover());
                        ui.painter()
                            .circle_filled(swatch.center(), 5.0, group_color(group));
                        ui.label(group.label());
                    });
                    ui.label(stat.members.to_string());
                    ui.label(
                        stat.mean_total
                            .map(format_total)
                            .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
                    );
                    ui.label(self.simulation_status(group));
                    ui.end_row();
                }
            });

        ui.separator();
        ui.label(RichText::new("Search").strong());
        let search = ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Subject id")
                .desired_width(f32::INFINITY),
        );
        if search.changed() {
            self.search_match_cache = None;
        }
        if let Some(matches) = self.search_matches() {
            ui.small(format!("{} matching subjects", matches.len()));
        }

        ui.separator();
        ui.label(RichText::new("Layout").strong());
        let in_overview = self.explorer.state() == ViewState::Overview;
        if ui
            .add_enabled(in_overview, egui::Button::new("Reheat layout"))
            .on_hover_text("Restart every group's simulation from its current positions")
            .clicked()
        {
            self.explorer.reheat();
        }

        let fade = ui.add(
            egui::Slider::new(&mut self.fade_ms, 0.0..=Self::MAX_FADE_MS)
                .text("Fade (ms)")
                .step_by(10.0),
        );
        if fade.changed() {
            self.explorer
                .set_fade_secs(f64::from(self.fade_ms) / 1000.0);
        }

        ui.separator();
        egui::CollapsingHeader::new("Diagnostics")
            .default_open(false)
            .show(ui, |ui| self.draw_diagnostics(ui));

        ui.separator();
        ui.small("Click a subject to open its details. Scroll down to return.");
    }

    fn draw_diagnostics(&self, ui: &mut Ui) {
        let view = self.explorer.view();
        let exit = view.exit_listener();
        let idle = view.idle_listener();
        ui.label(format!(
            "exit listener: {} (attached {}x, fired {}x)",
            if exit.is_attached() { "armed" } else { "idle" },
            exit.attachments(),
            exit.fired()
        ));
        ui.label(format!(
            "idle listener: {} (attached {}x)",
            if idle.is_attached() { "armed" } else { "idle" },
            idle.attachments()
        ));
        ui.label(format!("ignored scrolls: {}", view.ignored_scrolls()));
        ui.label(format!("simulation ticks: {}", self.explorer.total_ticks()));

        for handle in self.explorer.simulations() {
            let simulation = handle.simulation();
            ui.small(format!(
                "{}: run {}, tick {}, alpha {:.4}, moved {:.3} px",
                handle.group(),
                handle.run(),
                simulation.ticks(),
                simulation.alpha(),
                simulation.displacement()
            ));
        }
    }

    fn simulation_status(&self, group: GroupLabel) -> &'static str {
        match self.explorer.simulation(group) {
            None => "empty",
            Some(handle) if handle.is_stopped() => "paused",
            Some(handle) if handle.is_settled() => "settled",
            Some(_) => "running",
        }
    }
}
