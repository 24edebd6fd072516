use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::cohort::{Cohort, CohortInput, collect_cohort};
use crate::explorer::{Explorer, ExplorerConfig};

mod gesture;
mod render_utils;
mod ui;

use gesture::ScrollGesture;

#[derive(Clone, Debug)]
pub struct LoadSettings {
    pub input: CohortInput,
    pub workers: usize,
    pub explorer: ExplorerConfig,
    pub viewport: Vec2,
}

pub struct CohortOrbitApp {
    settings: LoadSettings,
    state: AppState,
    reload_rx: Option<Receiver<Result<Cohort, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Cohort, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    explorer: Explorer,
    gesture: ScrollGesture,
    source_label: String,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    fade_ms: f32,
    hovered: Option<u32>,
}

struct SearchMatchCache {
    query: String,
    matches: HashSet<u32>,
}

impl CohortOrbitApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: LoadSettings) -> Self {
        let state = Self::start_load(&settings);
        Self {
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(settings: &LoadSettings) -> Receiver<Result<Cohort, String>> {
        let (tx, rx) = mpsc::channel();
        let input = settings.input.clone();
        let workers = settings.workers;

        thread::spawn(move || {
            let result = collect_cohort(&input, workers).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(settings: &LoadSettings) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(settings),
        }
    }

    fn ready(settings: &LoadSettings, cohort: Cohort) -> AppState {
        let explorer = Explorer::new(cohort, settings.viewport, settings.explorer);
        AppState::Ready(Box::new(ViewModel::new(explorer, settings.input.describe())))
    }
}

impl eframe::App for CohortOrbitApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(cohort)) => transition = Some(Self::ready(&self.settings, cohort)),
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Aggregating cohort...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load cohort");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.settings));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.settings.explorer.fade_secs = model.explorer.view().fade_secs();
                    self.reload_rx = Some(Self::spawn_load(&self.settings));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(cohort)) => {
                            self.settings.viewport = model.explorer.viewport();
                            transition = Some(Self::ready(&self.settings, cohort));
                        }
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
