pub mod config;
pub mod error;
pub mod motion {
    pub mod hover;
    pub mod map;
    pub mod marquee;
    pub mod rig;
    pub mod spring;
    pub mod stack;
    pub mod value;
}
pub mod content {
    pub mod actions;
    pub mod model;
    pub mod store;
    pub mod validate;
}
pub mod render {
    pub mod loader;
    pub mod viewer;
}
pub mod web;

pub use error::Error;
