// Domain layer: channel data models and ports (interfaces) the pipeline runs against.

pub mod model;
pub mod ports;
