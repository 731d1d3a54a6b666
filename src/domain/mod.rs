// Domain layer: table model, query results and ports (interfaces).

pub mod model;
pub mod ports;
pub mod report;
