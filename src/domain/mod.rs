// Domain layer: models, operations and ports (interfaces).

pub mod billing;
pub mod model;
pub mod operation;
pub mod ports;
