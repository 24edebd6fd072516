use eframe::egui::{Vec2, vec2};
use rand::Rng;
use rand::rngs::StdRng;

use super::SimPoint;
use super::region::GroupRegion;

const JIGGLE: f32 = 1e-6;

pub(super) struct ForceContext<'a> {
    pub(super) region: &'a GroupRegion,
    pub(super) alpha: f32,
    pub(super) rng: &'a mut StdRng,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Force {
    Attraction { strength_x: f32, strength_y: f32 },
    Collision {
        margin: f32,
        strength: f32,
        iterations: usize,
    },
    Containment { strength: f32 },
}

impl Force {
    pub(super) fn apply(&self, points: &mut [SimPoint], ctx: &mut ForceContext<'_>) {
        match *self {
            Self::Attraction {
                strength_x,
                strength_y,
            } => apply_attraction(points, ctx.region.anchor, strength_x, strength_y, ctx.alpha),
            Self::Collision {
                margin,
                strength,
                iterations,
            } => {
                for _ in 0..iterations {
                    apply_collision_pass(points, margin, strength, ctx.rng);
                }
            }
            Self::Containment { strength } => apply_containment(points, ctx.region, strength),
        }
    }
}

fn apply_attraction(points: &mut [SimPoint], anchor: Vec2, strength_x: f32, strength_y: f32, alpha: f32) {
    for point in points {
        point.velocity.x += (anchor.x - point.pos.x) * strength_x * alpha;
        point.velocity.y += (anchor.y - point.pos.y) * strength_y * alpha;
    }
}

fn jiggle(rng: &mut StdRng) -> f32 {
    (rng.random::<f32>() - 0.5) * JIGGLE
}

fn apply_collision_pass(points: &mut [SimPoint], margin: f32, strength: f32, rng: &mut StdRng) {
    let half_margin = margin * 0.5;
    let count = points.len();

    for i in 0..count {
        let ri = points[i].radius + half_margin;
        let ri_sq = ri * ri;
        let predicted_i = points[i].pos + points[i].velocity;

        for j in (i + 1)..count {
            let rj = points[j].radius + half_margin;
            let reach = ri + rj;
            let mut delta = predicted_i - (points[j].pos + points[j].velocity);
            let mut distance_sq = delta.length_sq();
            if distance_sq >= reach * reach {
                continue;
            }

            if delta.x == 0.0 {
                delta.x = jiggle(rng);
                distance_sq = delta.length_sq();
            }
            if delta.y == 0.0 {
                delta.y = jiggle(rng);
                distance_sq = delta.length_sq();
            }

            let distance = distance_sq.sqrt();
            if distance <= 0.0 {
                continue;
            }
            let push = delta * ((reach - distance) / distance * strength);
            let rj_sq = rj * rj;
            let share_i = rj_sq / (ri_sq + rj_sq);

            points[i].velocity += push * share_i;
            points[j].velocity -= push * (1.0 - share_i);
        }
    }
}

fn apply_containment(points: &mut [SimPoint], region: &GroupRegion, strength: f32) {
    let bounds = region.bounds;
    for point in points {
        let mut correction = Vec2::ZERO;

        let left = point.pos.x - point.radius;
        if left < bounds.x0 {
            correction.x += (bounds.x0 - left) * strength;
        }
        let right = point.pos.x + point.radius;
        if right > bounds.x1 {
            correction.x -= (right - bounds.x1) * strength;
        }
        let top = point.pos.y - point.radius;
        if top < bounds.y0 {
            correction.y += (bounds.y0 - top) * strength;
        }
        let bottom = point.pos.y + point.radius;
        if bottom > bounds.y1 {
            correction.y -= (bottom - bounds.y1) * strength;
        }

        point.velocity += correction;
    }
}

pub(super) fn tick_forces(
    strength_x: f32,
    strength_y: f32,
    margin: f32,
    collision_strength: f32,
    iterations: usize,
    containment_strength: f32,
) -> Vec<Force> {
    vec![
        Force::Attraction {
            strength_x,
            strength_y,
        },
        Force::Collision {
            margin,
            strength: collision_strength,
            iterations: iterations.max(5),
        },
        Force::Containment {
            strength: containment_strength,
        },
    ]
}
