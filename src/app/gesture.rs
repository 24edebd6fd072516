#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ScrollDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ScrollGesture {
    threshold: f32,
    accumulated: f32,
}

impl Default for ScrollGesture {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl ScrollGesture {
    pub(super) const DEFAULT_THRESHOLD: f32 = 60.0;

    pub(super) fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(f32::EPSILON),
            accumulated: 0.0,
        }
    }

    // egui reports wheel-down as a negative `y`.
    pub(super) fn push(&mut self, delta_y: f32) -> Option<ScrollDirection> {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return None;
        }
        if self.accumulated != 0.0 && self.accumulated.signum() != delta_y.signum() {
            self.accumulated = 0.0;
        }

        self.accumulated += delta_y;
        if self.accumulated.abs() < self.threshold {
            return None;
        }

        let direction = if self.accumulated < 0.0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        self.accumulated = 0.0;
        Some(direction)
    }

    pub(super) fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}
