use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use eframe::egui::{Vec2, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::cohort::{Cohort, EntitySummary, GroupLabel};
use crate::scale::FALLBACK_RADIUS;
use crate::sim::{
    GroupRegion, SimPoint, SimulationConfig, SimulationHandle, TickStatus, group_regions,
    region_for, seed_points, start_simulation,
};
use crate::view::{Presentation, ViewOutcome, ViewState, ViewStateMachine};

#[derive(Clone, Copy, Debug)]
pub struct ExplorerConfig {
    pub seed: u64,
    pub fade_secs: f64,
    pub simulation: SimulationConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroupStats {
    pub members: usize,
    pub mean_total: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LayoutEntry {
    pub id: u32,
    pub group: GroupLabel,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Serialize)]
pub struct LayoutExport<'a> {
    pub width: f32,
    pub height: f32,
    pub summaries: Vec<&'a EntitySummary>,
    pub layout: Vec<LayoutEntry>,
}

pub struct Explorer {
    summaries: Arc<BTreeMap<u32, EntitySummary>>,
    viewport: Vec2,
    regions: [GroupRegion; 3],
    simulations: Vec<SimulationHandle>,
    view: ViewStateMachine,
    ticks: Arc<AtomicUsize>,
}

impl Explorer {
    const RESIZE_EPSILON: f32 = 0.5;

    pub fn new(cohort: Cohort, viewport: Vec2, config: ExplorerConfig) -> Self {
        let regions = group_regions(viewport.x, viewport.y);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let ticks = Arc::new(AtomicUsize::new(0));
        let mut simulations = GroupLabel::ALL
            .into_iter()
            .filter_map(|group| {
                let region = region_for(&regions, group);
                let members = cohort
                    .summaries
                    .values()
                    .filter(|summary| summary.group == group)
                    .map(|summary| {
                        let radius = cohort.radii.get(&summary.id).copied().unwrap_or(FALLBACK_RADIUS);
                        (summary.id, radius)
                    });
                let points = seed_points(members, &region, &mut rng);
                let seed = config.seed.wrapping_add(group.index() as u64 + 1);
                start_simulation(group, points, region, config.simulation, seed)
            })
            .collect::<Vec<_>>();
        for handle in &mut simulations {
            let group = handle.group();
            let counter = Arc::clone(&ticks);
            handle.on_tick(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
            handle.on_settled(move |points| {
                info!(%group, points = points.len(), "group layout settled");
            });
        }

        let summaries = Arc::new(cohort.summaries);
        let view = ViewStateMachine::new(Arc::clone(&summaries), cohort.metrics, config.fade_secs);

        info!(
            entities = summaries.len(),
            simulations = simulations.len(),
            width = viewport.x,
            height = viewport.y,
            "explorer ready"
        );

        Self {
            summaries,
            viewport,
            regions,
            simulations,
            view,
            ticks,
        }
    }

    pub fn summaries(&self) -> &BTreeMap<u32, EntitySummary> {
        &self.summaries
    }

    pub fn summary(&self, id: u32) -> Option<&EntitySummary> {
        self.summaries.get(&id)
    }

    pub fn total_ticks(&self) -> usize {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn regions(&self) -> &[GroupRegion; 3] {
        &self.regions
    }

    pub fn simulations(&self) -> &[SimulationHandle] {
        &self.simulations
    }

    pub fn simulation(&self, group: GroupLabel) -> Option<&SimulationHandle> {
        self.simulations.iter().find(|handle| handle.group() == group)
    }

    pub fn view(&self) -> &ViewStateMachine {
        &self.view
    }

    pub fn set_fade_secs(&mut self, fade_secs: f64) {
        self.view.set_fade_secs(fade_secs);
    }

    pub fn state(&self) -> ViewState {
        self.view.state()
    }

    pub fn presentation(&self) -> &Presentation {
        self.view.presentation()
    }

    pub fn points(&self) -> impl Iterator<Item = (GroupLabel, &SimPoint)> + '_ {
        self.simulations.iter().flat_map(|handle| {
            let group = handle.group();
            handle.points().iter().map(move |point| (group, point))
        })
    }

    pub fn select(&mut self, entity_id: u32, now: f64) -> ViewOutcome {
        self.view.select(entity_id, now)
    }

    pub fn scroll_down(&mut self, now: f64) -> ViewOutcome {
        self.view.scroll_down(now)
    }

    pub fn scroll_up(&mut self, now: f64) -> ViewOutcome {
        self.view.scroll_up(now)
    }

    // View fades first, then one tick per running simulation.
    pub fn advance(&mut self, now: f64) -> bool {
        match self.view.tick(now) {
            ViewOutcome::Arrived(ViewState::Detail { .. }) => {
                for handle in &mut self.simulations {
                    handle.stop();
                }
            }
            ViewOutcome::Arrived(ViewState::Overview) => {
                self.reheat();
                return true;
            }
            _ => {}
        }

        let mut moving = false;
        if self.view.presentation().simulations_running {
            for handle in &mut self.simulations {
                moving |= handle.tick() == TickStatus::Advanced;
            }
        }
        moving || self.view.is_animating()
    }

    pub fn reheat(&mut self) {
        for handle in &mut self.simulations {
            handle.restart();
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let next = vec2(width, height);
        if (next - self.viewport).abs().max_elem() < Self::RESIZE_EPSILON {
            return false;
        }

        self.viewport = next;
        self.regions = group_regions(width, height);
        let running = self.view.presentation().simulations_running;
        for handle in &mut self.simulations {
            let region = region_for(&self.regions, handle.group());
            let outside = handle
                .points()
                .iter()
                .filter(|point| !region.bounds.contains_circle(point.pos, point.radius, 0.0))
                .count();
            debug!(group = %handle.group(), outside, width, height, "region resized");
            handle.set_region(region);
            if !running {
                handle.stop();
            }
        }
        true
    }

    pub fn settle_all(&mut self) -> usize {
        self.simulations
            .par_iter_mut()
            .map(SimulationHandle::settle)
            .sum()
    }

    pub fn point_at(&self, position: Vec2) -> Option<u32> {
        self.points()
            .filter(|(_, point)| (point.pos - position).length() <= point.radius)
            .min_by(|a, b| {
                (a.1.pos - position)
                    .length()
                    .total_cmp(&(b.1.pos - position).length())
            })
            .map(|(_, point)| point.entity_id)
    }

    pub fn group_stats(&self) -> [GroupStats; 3] {
        let mut stats = [GroupStats::default(); 3];
        let mut totals = [0.0_f64; 3];
        for summary in self.summaries.values() {
            let index = summary.group.index();
            stats[index].members += 1;
            totals[index] += summary.primary_total;
        }
        for (stat, total) in stats.iter_mut().zip(totals) {
            stat.mean_total = (stat.members > 0).then(|| total / stat.members as f64);
        }
        stats
    }

    pub fn layout(&self) -> Vec<LayoutEntry> {
        let mut layout = self
            .points()
            .map(|(group, point)| LayoutEntry {
                id: point.entity_id,
                group,
                x: point.pos.x,
                y: point.pos.y,
                radius: point.radius,
            })
            .collect::<Vec<_>>();
        layout.sort_by_key(|entry| entry.id);
        layout
    }

    pub fn export(&self) -> LayoutExport<'_> {
        LayoutExport {
            width: self.viewport.x,
            height: self.viewport.y,
            summaries: self.summaries.values().collect(),
            layout: self.layout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{CohortInput, RosterMetrics, collect_cohort};
    use crate::scale::encode_radii;
    use crate::view::DEFAULT_FADE_SECS;

    fn config(seed: u64) -> ExplorerConfig {
        ExplorerConfig {
            seed,
            fade_secs: DEFAULT_FADE_SECS,
            simulation: SimulationConfig::default(),
        }
    }

    fn demo_explorer(seed: u64, entities: u32) -> Explorer {
        let input = CohortInput::Demo {
            seed,
            size: entities,
        };
        let cohort = collect_cohort(&input, 4).unwrap();
        Explorer::new(cohort, vec2(1200.0, 700.0), config(seed))
    }

    fn positions(explorer: &Explorer) -> Vec<(u32, Vec2)> {
        explorer
            .layout()
            .into_iter()
            .map(|entry| (entry.id, vec2(entry.x, entry.y)))
            .collect()
    }

    #[test]
    fn points_are_partitioned_by_group() {
        let explorer = demo_explorer(5, 30);

        assert_eq!(explorer.points().count(), 30);
        for (group, point) in explorer.points() {
            assert_eq!(explorer.summary(point.entity_id).unwrap().group, group);
            assert!(point.radius > 0.0);
        }
        let stats = explorer.group_stats();
        assert_eq!(stats.iter().map(|stat| stat.members).sum::<usize>(), 30);
    }

    #[test]
    fn empty_group_gets_no_simulation() {
        let summaries: BTreeMap<u32, EntitySummary> = [
            EntitySummary::unavailable(1, GroupLabel::GroupA),
            EntitySummary {
                id: 2,
                group: GroupLabel::GroupC,
                primary_total: 500.0,
                secondary_mean: None,
                tertiary_mean: Some(40.0),
            },
        ]
        .into_iter()
        .map(|summary| (summary.id, summary))
        .collect();
        let cohort = Cohort {
            radii: encode_radii(&summaries),
            summaries,
            metrics: RosterMetrics::default(),
        };
        let explorer = Explorer::new(cohort, vec2(900.0, 600.0), config(1));

        assert_eq!(explorer.simulations().len(), 2);
        assert!(explorer.simulation(GroupLabel::GroupB).is_none());
        assert_eq!(explorer.group_stats()[1], GroupStats::default());
    }

    #[test]
    fn detail_round_trip_resumes_without_reseeding() {
        let mut explorer = demo_explorer(9, 24);
        let mut now = 0.0;
        for _ in 0..40 {
            now += 1.0 / 60.0;
            explorer.advance(now);
        }

        let id = explorer.layout()[0].id;
        assert_eq!(explorer.select(id, now), ViewOutcome::Started);
        while explorer.state() != (ViewState::Detail { entity_id: id }) {
            now += 1.0 / 60.0;
            explorer.advance(now);
        }
        let paused = positions(&explorer);
        assert!(explorer.simulations().iter().all(SimulationHandle::is_stopped));
        assert_eq!(
            explorer.presentation().detail.as_ref().unwrap().entity_id,
            id
        );

        for _ in 0..10 {
            now += 1.0 / 60.0;
            explorer.advance(now);
        }
        assert_eq!(positions(&explorer), paused);

        assert_eq!(explorer.scroll_down(now), ViewOutcome::Started);
        while explorer.state() != ViewState::Overview {
            now += 1.0 / 60.0;
            explorer.advance(now);
        }

        assert!(explorer.simulations().iter().all(|handle| !handle.is_stopped()));
        assert!(explorer.simulations().iter().all(|handle| handle.run() == 1));
        assert!(explorer.view().idle_listener().is_attached());
        assert_eq!(positions(&explorer), paused);

        now += 1.0 / 60.0;
        explorer.advance(now);
        assert_eq!(explorer.simulations()[0].simulation().ticks(), 1);
        assert!(explorer.total_ticks() > 40);
    }

    #[test]
    fn resize_moves_regions_and_reheats() {
        let mut explorer = demo_explorer(2, 18);
        explorer.settle_all();
        assert!(explorer.simulations().iter().all(SimulationHandle::is_settled));

        assert!(!explorer.resize(1200.2, 700.0));
        assert!(explorer.resize(1500.0, 800.0));
        assert_eq!(explorer.regions(), &group_regions(1500.0, 800.0));
        assert!(explorer.simulations().iter().all(|handle| !handle.is_settled()));

        explorer.settle_all();
        for (group, point) in explorer.points() {
            let bounds = region_for(explorer.regions(), group).bounds;
            assert!(bounds.contains_circle(point.pos, point.radius, 2.0));
        }
    }

    #[test]
    fn demo_sized_cohort_settles_to_rest() {
        let mut explorer = demo_explorer(7, 60);
        let taken = explorer.settle_all();

        assert!(taken > 0);
        assert_eq!(explorer.points().count(), 60);
        for handle in explorer.simulations() {
            assert!(handle.is_settled());
            let simulation = handle.simulation();
            assert!(
                simulation.ticks() < SimulationConfig::default().max_ticks,
                "{} hit the tick cap",
                handle.group()
            );
            assert!(
                simulation.displacement() < 0.05,
                "{} still moving by {}",
                handle.group(),
                simulation.displacement()
            );
        }
        assert!(
            explorer
                .points()
                .all(|(_, point)| point.pos.x.is_finite() && point.pos.y.is_finite())
        );
    }

    #[test]
    fn fade_duration_goes_through_the_explorer() {
        let mut explorer = demo_explorer(3, 6);
        explorer.set_fade_secs(0.0);
        assert_eq!(explorer.view().fade_secs(), 0.0);

        let id = explorer.layout()[0].id;
        explorer.select(id, 1.0);
        explorer.advance(1.0);
        assert_eq!(explorer.state(), ViewState::Detail { entity_id: id });
        assert!(explorer.simulations().iter().all(SimulationHandle::is_stopped));

        explorer.set_fade_secs(-2.0);
        assert_eq!(explorer.view().fade_secs(), 0.0);
    }

    #[test]
    fn point_at_hits_inside_radius_only() {
        let mut explorer = demo_explorer(4, 12);
        explorer.settle_all();
        let entry = explorer.layout().into_iter().next().unwrap();

        assert_eq!(explorer.point_at(vec2(entry.x, entry.y)), Some(entry.id));
        assert_eq!(explorer.point_at(vec2(-500.0, -500.0)), None);
    }

    #[test]
    fn export_serializes_summaries_and_layout() {
        let mut explorer = demo_explorer(6, 10);
        explorer.settle_all();

        let json = serde_json::to_value(explorer.export()).unwrap();
        assert_eq!(json["layout"].as_array().unwrap().len(), 10);
        assert_eq!(json["summaries"].as_array().unwrap().len(), 10);
        assert_eq!(json["width"], 1200.0);
    }
}
