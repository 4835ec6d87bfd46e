/// Hover intensity for the distortion card.
///
/// One continuous parameter covers the whole interaction: pointer movement
/// retargets it at 1, silence lets the target decay exponentially, and the
/// visible value relaxes toward the target every frame. The effect ramps
/// while events keep arriving and eases back out once they stop; it never
/// snaps off on a timeout.
#[derive(Debug, Clone)]
pub struct HoverIntensity {
    value: f32,
    target: f32,
    /// Set by `trigger`, consumed by the next `step`.
    triggered: bool,
    /// Per-second approach rate of value toward target.
    ramp: f32,
    /// Per-second exponential decay rate of the target.
    decay: f32,
}

impl HoverIntensity {
    pub fn new(ramp: f32, decay: f32) -> Self {
        Self {
            value: 0.0,
            target: 0.0,
            triggered: false,
            ramp: ramp.max(0.0),
            decay: decay.max(0.0),
        }
    }

    /// Called on every pointer-move event: full intensity becomes the goal
    /// again and the decay clock effectively restarts.
    pub fn trigger(&mut self) {
        self.target = 1.0;
        self.triggered = true;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn step(&mut self, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        // The decay clock only runs on frames with no fresh trigger, so a
        // sustained hover saturates at 1 instead of a frame-rate-dependent
        // ceiling below it.
        if self.triggered {
            self.triggered = false;
        } else {
            self.target *= (-self.decay * dt).exp();
        }
        // Exponential approach; the factor stays in [0, 1] so the value can
        // never jump past the target.
        let k = 1.0 - (-self.ramp * dt).exp();
        self.value += (self.target - self.value) * k;
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn ramps_monotonically_while_events_keep_arriving() {
        let mut h = HoverIntensity::new(9.0, 3.0);
        let mut prev = h.value();
        for _ in 0..120 {
            h.trigger();
            let v = h.step(DT);
            assert!(v >= prev, "intensity dipped while triggered: {v} < {prev}");
            prev = v;
        }
        assert!(prev > 0.9);
    }

    #[test]
    fn decays_monotonically_once_events_stop() {
        let mut h = HoverIntensity::new(9.0, 3.0);
        for _ in 0..60 {
            h.trigger();
            h.step(DT);
        }
        let mut prev = h.value();
        for _ in 0..240 {
            let v = h.step(DT);
            assert!(v <= prev, "intensity rose without events: {v} > {prev}");
            prev = v;
        }
        assert!(prev < 0.05);
        assert!(prev > 0.0, "decay is continuous, never a snap to zero");
    }

    #[test]
    fn sustained_hover_saturates_at_any_frame_rate() {
        // 60 fps and a slow 10 fps must both converge on full intensity;
        // the decay must not run on frames that carried a trigger.
        for dt in [1.0 / 60.0, 0.1] {
            let mut h = HoverIntensity::new(9.0, 3.0);
            for _ in 0..200 {
                h.trigger();
                h.step(dt);
            }
            assert!(h.value() > 0.99, "stuck at {} with dt={dt}", h.value());
        }
    }

    #[test]
    fn idle_stays_at_zero() {
        let mut h = HoverIntensity::new(9.0, 3.0);
        for _ in 0..60 {
            assert_eq!(h.step(DT), 0.0);
        }
    }

    #[test]
    fn retrigger_mid_decay_raises_the_goal_again() {
        let mut h = HoverIntensity::new(9.0, 3.0);
        for _ in 0..60 {
            h.trigger();
            h.step(DT);
        }
        for _ in 0..60 {
            h.step(DT);
        }
        let low = h.value();
        for _ in 0..60 {
            h.trigger();
            h.step(DT);
        }
        assert!(h.value() > low);
    }
}
