pub mod fingerprint;
pub mod gate;
pub mod route_policy;

pub use self::gate::{AccessGate, GateDecision};
pub use self::route_policy::{AllowedRoles, PolicyError, RoutePolicy};
