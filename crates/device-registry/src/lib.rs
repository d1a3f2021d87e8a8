//! device-registry: stable device identities and OSC address namespaces
//!
//! Devices reported by the sensor SDK are mapped to small integer ids that are reused
//! once a device disconnects. Each id (and each logical arm) owns a precomputed set of
//! OSC addresses, one per telemetry field.

mod types;
pub use types::*;

mod namespace;
pub use namespace::{AddressNamespace, ArmNamespaces, AxisGroup};

mod registry;
pub use registry::{DeviceRegistry, DeviceState};
