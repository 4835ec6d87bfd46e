use std::cell::Cell;
use std::rc::Rc;

/// A continuously-updating scalar shared between motion stages.
///
/// The frame loop is single-threaded and run-to-completion, so a `Rc<Cell>`
/// is all the sharing this needs. Event code writes the raw signals; every
/// downstream stage only ever reads the current value of its inputs and
/// writes its own output cell. Cloning a `Value` yields another handle to
/// the same cell, so one mapped value can drive any number of bindings.
#[derive(Debug, Clone)]
pub struct Value(Rc<Cell<f32>>);

impl Value {
    pub fn new(initial: f32) -> Self {
        Self(Rc::new(Cell::new(initial)))
    }

    pub fn get(&self) -> f32 {
        self.0.get()
    }

    pub fn set(&self, v: f32) {
        self.0.set(v);
    }

    /// True when both handles point at the same cell.
    pub fn same_cell(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A 2-vector signal, e.g. normalized pointer position.
#[derive(Debug, Clone, Default)]
pub struct Value2 {
    pub x: Value,
    pub y: Value,
}

impl Value2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: Value::new(x),
            y: Value::new(y),
        }
    }

    pub fn set(&self, x: f32, y: f32) {
        self.x.set(x);
        self.y.set(y);
    }

    pub fn get(&self) -> (f32, f32) {
        (self.x.get(), self.y.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_cell() {
        let a = Value::new(1.0);
        let b = a.clone();
        b.set(2.5);
        assert!((a.get() - 2.5).abs() < f32::EPSILON);
        assert!(a.same_cell(&b));
        assert!(!a.same_cell(&Value::new(2.5)));
    }
}
