use crate::motion::map::PiecewiseMap;

/// Wrap `v` into `[min, max)`.
pub fn wrap(min: f32, max: f32, v: f32) -> f32 {
    let range = max - min;
    (((v - min) % range) + range) % range + min
}

/// Per-frame finite difference of a signal, in units per second.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    last: f32,
    velocity: f32,
}

impl VelocityTracker {
    pub fn new(initial: f32) -> Self {
        Self {
            last: initial,
            velocity: 0.0,
        }
    }

    pub fn update(&mut self, current: f32, dt: f32) -> f32 {
        if dt > 0.0 {
            self.velocity = (current - self.last) / dt;
        }
        self.last = current;
        self.velocity
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }
}

/// The infinite text strip: constant drift plus a scroll-velocity boost,
/// output wrapped so four copies of the content loop seamlessly.
#[derive(Debug)]
pub struct Marquee {
    base_velocity: f32,
    base_x: f32,
    direction: f32,
    factor_map: PiecewiseMap,
}

impl Marquee {
    pub fn new(base_velocity: f32) -> Self {
        // Smoothed scroll velocity maps 0..1000 px/s onto a 0..5x boost,
        // deliberately unclamped so a hard fling keeps accelerating it.
        let factor_map = PiecewiseMap::new(&[0.0, 1000.0], &[0.0, 5.0])
            .expect("static breakpoints")
            .unclamped();
        Self {
            base_velocity,
            base_x: 0.0,
            direction: 1.0,
            factor_map,
        }
    }

    /// Advance by one frame given the smoothed scroll velocity (px/s).
    pub fn advance(&mut self, smoothed_velocity: f32, dt: f32) -> f32 {
        let factor = self.factor_map.map(smoothed_velocity);
        if factor < 0.0 {
            self.direction = -1.0;
        } else if factor > 0.0 {
            self.direction = 1.0;
        }
        let mut move_by = self.direction * self.base_velocity * dt;
        move_by += self.direction * move_by * factor;
        self.base_x += move_by;
        self.offset_percent()
    }

    /// Current offset in percent, wrapped into [-45, -20).
    pub fn offset_percent(&self) -> f32 {
        wrap(-45.0, -20.0, self.base_x)
    }
}
