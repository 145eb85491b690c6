// Domain layer: request/response models, unit conversion and the ports the
// wrapper pipeline depends on.

pub mod convert;
pub mod model;
pub mod ports;
