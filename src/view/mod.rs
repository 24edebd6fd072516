mod detail;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::cohort::{EntitySummary, RosterMetrics};
pub use detail::DetailView;

pub const DEFAULT_FADE_SECS: f64 = 0.6;
pub const IDLE_AFFORDANCE_DELAY_SECS: f64 = 0.150;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    Overview,
    TransitioningToDetail { entity_id: u32 },
    Detail { entity_id: u32 },
    TransitioningToOverview { entity_id: u32 },
}

impl ViewState {
    pub fn entity_id(self) -> Option<u32> {
        match self {
            Self::Overview => None,
            Self::TransitioningToDetail { entity_id }
            | Self::Detail { entity_id }
            | Self::TransitioningToOverview { entity_id } => Some(entity_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewOutcome {
    Ignored,
    Started,
    Restarted,
    Arrived(ViewState),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollListener {
    attached: bool,
    attachments: u64,
    fired: u64,
}

impl ScrollListener {
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attachments(&self) -> u64 {
        self.attachments
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn attach(&mut self) {
        if !self.attached {
            self.attached = true;
            self.attachments += 1;
        }
    }

    fn detach(&mut self) {
        self.attached = false;
    }

    fn consume(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.attached = false;
        self.fired += 1;
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    pub overview_visible: bool,
    pub overview_opacity: f32,
    pub hover_enabled: bool,
    pub simulations_running: bool,
    pub detail: Option<DetailView>,
    pub detail_opacity: f32,
    pub scroll_hint_visible: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            overview_visible: true,
            overview_opacity: 1.0,
            hover_enabled: true,
            simulations_running: true,
            detail: None,
            detail_opacity: 0.0,
            scroll_hint_visible: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Fade {
    started: f64,
    duration: f64,
}

impl Fade {
    fn progress(self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started) / self.duration).clamp(0.0, 1.0) as f32
    }
}

pub struct ViewStateMachine {
    state: ViewState,
    fade: Option<Fade>,
    fade_secs: f64,
    presentation: Presentation,
    summaries: Arc<BTreeMap<u32, EntitySummary>>,
    metrics: RosterMetrics,
    exit_listener: ScrollListener,
    idle_listener: ScrollListener,
    last_scroll: Option<f64>,
    ignored_scrolls: u64,
}

impl ViewStateMachine {
    pub fn new(
        summaries: Arc<BTreeMap<u32, EntitySummary>>,
        metrics: RosterMetrics,
        fade_secs: f64,
    ) -> Self {
        let mut idle_listener = ScrollListener::default();
        idle_listener.attach();

        Self {
            state: ViewState::Overview,
            fade: None,
            fade_secs: fade_secs.max(0.0),
            presentation: Presentation::default(),
            summaries,
            metrics,
            exit_listener: ScrollListener::default(),
            idle_listener,
            last_scroll: None,
            ignored_scrolls: 0,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn exit_listener(&self) -> &ScrollListener {
        &self.exit_listener
    }

    pub fn idle_listener(&self) -> &ScrollListener {
        &self.idle_listener
    }

    pub fn ignored_scrolls(&self) -> u64 {
        self.ignored_scrolls
    }

    pub fn fade_secs(&self) -> f64 {
        self.fade_secs
    }

    pub fn set_fade_secs(&mut self, fade_secs: f64) {
        self.fade_secs = fade_secs.max(0.0);
    }

    pub fn is_animating(&self) -> bool {
        self.fade.is_some() || self.last_scroll.is_some()
    }

    pub fn select(&mut self, entity_id: u32, now: f64) -> ViewOutcome {
        if !self.summaries.contains_key(&entity_id) {
            debug!(entity_id, "selection ignored, no summary for entity");
            return ViewOutcome::Ignored;
        }

        let outcome = match self.state {
            ViewState::Overview => ViewOutcome::Started,
            ViewState::TransitioningToDetail { .. } => ViewOutcome::Restarted,
            ViewState::Detail { .. } | ViewState::TransitioningToOverview { .. } => {
                return ViewOutcome::Ignored;
            }
        };

        self.teardown_detail();
        self.presentation.hover_enabled = false;
        self.presentation.overview_visible = true;
        self.presentation.overview_opacity = 1.0;
        self.presentation.scroll_hint_visible = false;
        self.idle_listener.detach();
        self.last_scroll = None;
        self.fade = Some(Fade {
            started: now,
            duration: self.fade_secs,
        });
        self.state = ViewState::TransitioningToDetail { entity_id };
        debug!(entity_id, ?outcome, "fading overview out");
        outcome
    }

    pub fn scroll_down(&mut self, now: f64) -> ViewOutcome {
        let state = self.state;
        match state {
            ViewState::Overview => {
                self.note_scroll_activity(now);
                ViewOutcome::Ignored
            }
            ViewState::Detail { entity_id } if self.exit_listener.consume() => {
                self.fade = Some(Fade {
                    started: now,
                    duration: self.fade_secs,
                });
                self.state = ViewState::TransitioningToOverview { entity_id };
                debug!(entity_id, "fading detail out");
                ViewOutcome::Started
            }
            _ => {
                self.ignored_scrolls += 1;
                ViewOutcome::Ignored
            }
        }
    }

    pub fn scroll_up(&mut self, now: f64) -> ViewOutcome {
        if self.state == ViewState::Overview {
            self.note_scroll_activity(now);
        } else {
            self.ignored_scrolls += 1;
        }
        ViewOutcome::Ignored
    }

    pub fn tick(&mut self, now: f64) -> ViewOutcome {
        match self.state {
            ViewState::Overview => {
                if let Some(last) = self.last_scroll
                    && now - last >= IDLE_AFFORDANCE_DELAY_SECS
                {
                    self.presentation.scroll_hint_visible = true;
                    self.last_scroll = None;
                }
                ViewOutcome::Ignored
            }
            ViewState::Detail { .. } => ViewOutcome::Ignored,
            ViewState::TransitioningToDetail { entity_id } => {
                let progress = self.fade_progress(now);
                self.presentation.overview_opacity = 1.0 - progress;
                if progress < 1.0 {
                    return ViewOutcome::Ignored;
                }
                self.enter_detail(entity_id)
            }
            ViewState::TransitioningToOverview { .. } => {
                let progress = self.fade_progress(now);
                self.presentation.detail_opacity = 1.0 - progress;
                if progress < 1.0 {
                    return ViewOutcome::Ignored;
                }
                self.enter_overview()
            }
        }
    }

    fn fade_progress(&self, now: f64) -> f32 {
        self.fade.map(|fade| fade.progress(now)).unwrap_or(1.0)
    }

    fn enter_detail(&mut self, entity_id: u32) -> ViewOutcome {
        self.fade = None;
        let Some(summary) = self.summaries.get(&entity_id) else {
            return self.enter_overview();
        };

        self.presentation.overview_visible = false;
        self.presentation.overview_opacity = 0.0;
        self.presentation.simulations_running = false;
        self.presentation.detail = Some(DetailView::build(summary, &self.metrics));
        self.presentation.detail_opacity = 1.0;
        self.exit_listener.attach();
        self.state = ViewState::Detail { entity_id };
        debug!(entity_id, "detail shown");
        ViewOutcome::Arrived(self.state)
    }

    fn enter_overview(&mut self) -> ViewOutcome {
        self.fade = None;
        self.teardown_detail();
        self.presentation.overview_visible = true;
        self.presentation.overview_opacity = 1.0;
        self.presentation.simulations_running = true;
        self.presentation.hover_enabled = true;
        self.presentation.scroll_hint_visible = true;
        self.idle_listener.attach();
        self.last_scroll = None;
        self.state = ViewState::Overview;
        debug!("overview restored");
        ViewOutcome::Arrived(self.state)
    }

    fn teardown_detail(&mut self) {
        self.presentation.detail = None;
        self.presentation.detail_opacity = 0.0;
        self.exit_listener.detach();
    }

    fn note_scroll_activity(&mut self, now: f64) {
        if !self.idle_listener.is_attached() {
            return;
        }
        self.presentation.scroll_hint_visible = false;
        self.last_scroll = Some(now);
    }
}
