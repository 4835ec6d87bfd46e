use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;

use crate::motion::hover::HoverIntensity;
use crate::motion::map::PiecewiseMap;
use crate::motion::marquee::VelocityTracker;
use crate::motion::spring::{Spring, SpringConfig};
use crate::motion::value::Value;

/// Identifies the nodes owned by one mounted effect so they can be retired
/// together when the owning view goes away. Leaving retired nodes behind
/// would keep per-frame work alive across navigations, which is treated as
/// a defect, not a tolerated behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectId(u32);

/// Event-side handle that arms a hover ramp.
#[derive(Debug, Clone)]
pub struct HoverTrigger(Rc<Cell<bool>>);

impl HoverTrigger {
    pub fn fire(&self) {
        self.0.set(true);
    }
}

struct VelocityNode {
    effect: EffectId,
    input: Value,
    tracker: VelocityTracker,
    out: Value,
}

struct SpringNode {
    effect: EffectId,
    input: Value,
    spring: Spring,
    out: Value,
}

struct HoverNode {
    effect: EffectId,
    armed: Rc<Cell<bool>>,
    state: HoverIntensity,
    out: Value,
}

struct BindingNode {
    effect: EffectId,
    input: Value,
    map: PiecewiseMap,
    out: Value,
}

/// The per-frame motion graph.
///
/// `step` runs the stages in a fixed order - velocity trackers over the raw
/// signals, then springs, then hover ramps, then mapping bindings - so a
/// value produced by an earlier stage is never a frame stale by the time a
/// later stage reads it. Within the binding stage nodes evaluate in
/// creation order. Everything is O(1) per node per frame.
#[derive(Default)]
pub struct Rig {
    next_effect: u32,
    current_effect: EffectId,
    velocities: Vec<VelocityNode>,
    springs: Vec<SpringNode>,
    hovers: Vec<HoverNode>,
    bindings: Vec<BindingNode>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new effect scope; nodes created afterwards belong to it.
    pub fn begin_effect(&mut self) -> EffectId {
        self.next_effect += 1;
        self.current_effect = EffectId(self.next_effect);
        self.current_effect
    }

    /// Raw signal cell for event code to write into.
    pub fn signal(&self, initial: f32) -> Value {
        Value::new(initial)
    }

    /// Differentiate `input` each frame.
    pub fn velocity(&mut self, input: &Value) -> Value {
        let out = Value::new(0.0);
        self.velocities.push(VelocityNode {
            effect: self.current_effect,
            input: input.clone(),
            tracker: VelocityTracker::new(input.get()),
            out: out.clone(),
        });
        out
    }

    /// Spring-smooth `input` toward its current value each frame.
    pub fn spring(&mut self, input: &Value, cfg: SpringConfig) -> Value {
        let out = Value::new(input.get());
        self.springs.push(SpringNode {
            effect: self.current_effect,
            input: input.clone(),
            spring: Spring::new(cfg, input.get()),
            out: out.clone(),
        });
        out
    }

    /// Hover-intensity ramp; the returned trigger is fired from pointer-move
    /// events. Firing it twice in one frame is the same as firing it once,
    /// so re-registration by the event side stays idempotent.
    pub fn hover(&mut self, ramp: f32, decay: f32) -> (HoverTrigger, Value) {
        let armed = Rc::new(Cell::new(false));
        let out = Value::new(0.0);
        self.hovers.push(HoverNode {
            effect: self.current_effect,
            armed: armed.clone(),
            state: HoverIntensity::new(ramp, decay),
            out: out.clone(),
        });
        (HoverTrigger(armed), out)
    }

    /// Map `input` through a piecewise-linear transform each frame.
    pub fn bind(&mut self, input: &Value, map: PiecewiseMap) -> Value {
        let out = Value::new(map.map(input.get()));
        self.bindings.push(BindingNode {
            effect: self.current_effect,
            input: input.clone(),
            map,
            out: out.clone(),
        });
        out
    }

    /// Convenience for `bind` with freshly-built breakpoints.
    pub fn map(&mut self, input: &Value, domain: &[f32], range: &[f32]) -> Result<Value> {
        Ok(self.bind(input, PiecewiseMap::new(domain, range)?))
    }

    /// Drop every node belonging to `effect`.
    pub fn retire(&mut self, effect: EffectId) {
        self.velocities.retain(|n| n.effect != effect);
        self.springs.retain(|n| n.effect != effect);
        self.hovers.retain(|n| n.effect != effect);
        self.bindings.retain(|n| n.effect != effect);
    }

    pub fn node_count(&self) -> usize {
        self.velocities.len() + self.springs.len() + self.hovers.len() + self.bindings.len()
    }

    /// Advance every stage by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        for node in &mut self.velocities {
            node.out.set(node.tracker.update(node.input.get(), dt));
        }
        for node in &mut self.springs {
            node.spring.set_target(node.input.get());
            node.out.set(node.spring.step(dt));
        }
        for node in &mut self.hovers {
            if node.armed.replace(false) {
                node.state.trigger();
            }
            node.out.set(node.state.step(dt));
        }
        for node in &mut self.bindings {
            node.out.set(node.map.map(node.input.get()));
        }
    }
}
