mod forces;
mod region;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::cohort::GroupLabel;
use forces::{Force, ForceContext, tick_forces};
pub use region::{Bounds, GroupRegion, group_regions, region_for};
use region::GroupTuning;

#[derive(Clone, Debug, PartialEq)]
pub struct SimPoint {
    pub entity_id: u32,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub collision_margin: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    pub containment_strength: f32,
    pub max_ticks: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            collision_margin: 2.0,
            collision_strength: 0.8,
            collision_iterations: 6,
            containment_strength: 0.1,
            max_ticks: 600,
        }
    }
}

pub fn seed_points(
    members: impl IntoIterator<Item = (u32, f32)>,
    region: &GroupRegion,
    rng: &mut StdRng,
) -> Vec<SimPoint> {
    let bounds = region.bounds;
    let span = |low: f32, high: f32, radius: f32, rng: &mut StdRng| {
        let (low, high) = if high - low > radius * 2.0 {
            (low + radius, high - radius)
        } else {
            (low, high)
        };
        if high > low {
            rng.random_range(low..high)
        } else {
            low
        }
    };

    members
        .into_iter()
        .map(|(entity_id, radius)| SimPoint {
            entity_id,
            pos: vec2(
                span(bounds.x0, bounds.x1, radius, rng),
                span(bounds.y0, bounds.y1, radius, rng),
            ),
            velocity: Vec2::ZERO,
            radius,
        })
        .collect()
}

pub struct ClusterSimulation {
    group: GroupLabel,
    region: GroupRegion,
    points: Vec<SimPoint>,
    forces: Vec<Force>,
    config: SimulationConfig,
    alpha: f32,
    ticks: usize,
    displacement: f32,
    rng: StdRng,
}

impl ClusterSimulation {
    pub fn new(
        group: GroupLabel,
        points: Vec<SimPoint>,
        region: GroupRegion,
        config: SimulationConfig,
        seed: u64,
    ) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let oversized = points
            .iter()
            .filter(|point| !region.bounds.fits(point.radius))
            .count();
        if oversized > 0 {
            debug!(%group, oversized, "points larger than their region");
        }

        let tuning = GroupTuning::for_group(group);
        let forces = tick_forces(
            tuning.strength_x,
            tuning.strength_y,
            config.collision_margin,
            config.collision_strength,
            config.collision_iterations,
            config.containment_strength,
        );

        Some(Self {
            group,
            region,
            points,
            forces,
            config,
            alpha: 1.0,
            ticks: 0,
            displacement: 0.0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn group(&self) -> GroupLabel {
        self.group
    }

    pub fn region(&self) -> &GroupRegion {
        &self.region
    }

    pub fn points(&self) -> &[SimPoint] {
        &self.points
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn displacement(&self) -> f32 {
        self.displacement
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min || self.ticks >= self.config.max_ticks
    }

    pub fn step(&mut self) -> f32 {
        self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;
        self.ticks += 1;

        let mut ctx = ForceContext {
            region: &self.region,
            alpha: self.alpha,
            rng: &mut self.rng,
        };
        for force in &self.forces {
            force.apply(&mut self.points, &mut ctx);
        }

        let keep = 1.0 - self.config.velocity_decay;
        let mut max_displacement = 0.0_f32;
        for point in &mut self.points {
            point.velocity *= keep;
            point.pos += point.velocity;
            max_displacement = max_displacement.max(point.velocity.length());
        }
        self.displacement = max_displacement;
        max_displacement
    }

    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.ticks = 0;
    }

    pub fn set_region(&mut self, region: GroupRegion) {
        self.region = region;
    }
}

type PointsCallback = Box<dyn FnMut(&[SimPoint]) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    Advanced,
    Settled,
    Stopped,
}

// `on_settled` fires once per run. A restart drops the pending notification.
pub struct SimulationHandle {
    simulation: ClusterSimulation,
    tick_callbacks: Vec<PointsCallback>,
    settled_callbacks: Vec<PointsCallback>,
    stopped: bool,
    run: u64,
    notified_run: Option<u64>,
}

pub fn start_simulation(
    group: GroupLabel,
    points: Vec<SimPoint>,
    region: GroupRegion,
    config: SimulationConfig,
    seed: u64,
) -> Option<SimulationHandle> {
    let Some(simulation) = ClusterSimulation::new(group, points, region, config, seed) else {
        debug!(%group, "group has no members, simulation not started");
        return None;
    };
    debug!(%group, points = simulation.points().len(), "simulation started");

    Some(SimulationHandle {
        simulation,
        tick_callbacks: Vec::new(),
        settled_callbacks: Vec::new(),
        stopped: false,
        run: 0,
        notified_run: None,
    })
}

impl SimulationHandle {
    pub fn on_tick(&mut self, callback: impl FnMut(&[SimPoint]) + Send + 'static) {
        self.tick_callbacks.push(Box::new(callback));
    }

    pub fn on_settled(&mut self, callback: impl FnMut(&[SimPoint]) + Send + 'static) {
        self.settled_callbacks.push(Box::new(callback));
    }

    pub fn simulation(&self) -> &ClusterSimulation {
        &self.simulation
    }

    pub fn group(&self) -> GroupLabel {
        self.simulation.group()
    }

    pub fn points(&self) -> &[SimPoint] {
        self.simulation.points()
    }

    pub fn is_settled(&self) -> bool {
        self.simulation.is_settled()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn tick(&mut self) -> TickStatus {
        if self.stopped {
            return TickStatus::Stopped;
        }
        if self.simulation.is_settled() {
            self.notify_settled();
            return TickStatus::Settled;
        }

        self.simulation.step();
        for callback in &mut self.tick_callbacks {
            callback(self.simulation.points());
        }

        if self.simulation.is_settled() {
            self.notify_settled();
            TickStatus::Settled
        } else {
            TickStatus::Advanced
        }
    }

    pub fn settle(&mut self) -> usize {
        let mut taken = 0;
        while self.tick() == TickStatus::Advanced {
            taken += 1;
        }
        taken
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn restart(&mut self) {
        self.stopped = false;
        self.run = self.run.wrapping_add(1);
        self.simulation.reheat();
        debug!(group = %self.group(), run = self.run, "simulation restarted");
    }

    pub fn set_region(&mut self, region: GroupRegion) {
        self.simulation.set_region(region);
        self.restart();
    }

    fn notify_settled(&mut self) {
        if self.notified_run == Some(self.run) {
            return;
        }
        self.notified_run = Some(self.run);
        debug!(
            group = %self.group(),
            run = self.run,
            ticks = self.simulation.ticks(),
            "simulation settled"
        );
        for callback in &mut self.settled_callbacks {
            callback(self.simulation.points());
        }
    }
}
