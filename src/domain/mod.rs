// Domain layer: lease models and ports. No storage or CLI concerns here.

pub mod model;
pub mod ports;
