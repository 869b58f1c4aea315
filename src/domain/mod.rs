// Domain layer: document model and the ports collections flow through.

pub mod model;
pub mod ports;
