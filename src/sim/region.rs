use eframe::egui::{Vec2, vec2};

use crate::cohort::GroupLabel;

const REGION_PADDING: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
}

impl Bounds {
    pub fn width(self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(self) -> Vec2 {
        vec2((self.x0 + self.x1) * 0.5, (self.y0 + self.y1) * 0.5)
    }

    pub fn fits(self, radius: f32) -> bool {
        radius * 2.0 <= self.width() && radius * 2.0 <= self.height()
    }

    pub fn contains_circle(self, center: Vec2, radius: f32, tolerance: f32) -> bool {
        center.x - radius >= self.x0 - tolerance
            && center.x + radius <= self.x1 + tolerance
            && center.y - radius >= self.y0 - tolerance
            && center.y + radius <= self.y1 + tolerance
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupRegion {
    pub anchor: Vec2,
    pub bounds: Bounds,
}

impl GroupRegion {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            anchor: bounds.center(),
            bounds,
        }
    }
}

pub fn group_regions(width: f32, height: f32) -> [GroupRegion; 3] {
    let width = width.max(0.0);
    let height = height.max(0.0);
    let column = width / 3.0;
    let padding = REGION_PADDING.min(column * 0.25).min(height * 0.25);

    std::array::from_fn(|index| {
        let left = column * index as f32;
        GroupRegion::new(Bounds {
            x0: left + padding,
            x1: left + column - padding,
            y0: padding,
            y1: height - padding,
        })
    })
}

pub fn region_for(regions: &[GroupRegion; 3], group: GroupLabel) -> GroupRegion {
    regions[group.index()]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupTuning {
    pub strength_x: f32,
    pub strength_y: f32,
}

impl GroupTuning {
    pub fn for_group(group: GroupLabel) -> Self {
        match group {
            GroupLabel::GroupA => Self {
                strength_x: 0.09,
                strength_y: 0.06,
            },
            GroupLabel::GroupB => Self {
                strength_x: 0.04,
                strength_y: 0.03,
            },
            GroupLabel::GroupC => Self {
                strength_x: 0.09,
                strength_y: 0.06,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_tile_the_canvas_left_to_right() {
        let regions = group_regions(1200.0, 600.0);

        for window in regions.windows(2) {
            assert!(window[0].bounds.x1 < window[1].bounds.x0);
        }
        for region in &regions {
            assert_eq!(region.bounds.width(), 400.0 - 32.0);
            assert_eq!(region.bounds.height(), 600.0 - 32.0);
            assert_eq!(region.anchor, region.bounds.center());
        }
        assert_eq!(regions[0].bounds.x0, 16.0);
        assert_eq!(regions[2].bounds.x1, 1184.0);
    }

    #[test]
    fn tiny_canvas_keeps_bounds_ordered() {
        for region in group_regions(30.0, 10.0) {
            assert!(region.bounds.x0 <= region.bounds.x1);
            assert!(region.bounds.y0 <= region.bounds.y1);
        }
    }

    #[test]
    fn least_separable_group_is_looser() {
        let loose = GroupTuning::for_group(GroupLabel::GroupB);
        for tight in [GroupLabel::GroupA, GroupLabel::GroupC].map(GroupTuning::for_group) {
            assert!(loose.strength_x < tight.strength_x);
            assert!(loose.strength_y < tight.strength_y);
        }
    }

    #[test]
    fn containment_check_honours_tolerance() {
        let bounds = Bounds {
            x0: 0.0,
            x1: 100.0,
            y0: 0.0,
            y1: 100.0,
        };
        assert!(bounds.contains_circle(vec2(50.0, 50.0), 50.0, 0.0));
        assert!(!bounds.contains_circle(vec2(49.0, 50.0), 50.0, 0.0));
        assert!(bounds.contains_circle(vec2(49.0, 50.0), 50.0, 1.5));
        assert!(bounds.fits(50.0));
        assert!(!bounds.fits(51.0));
    }
}
