// Domain layer: address/pincode models and the ports to the outside world.
// No external dependencies beyond serde/chrono.

pub mod model;
pub mod ports;
