//! osc-telemetry: armband events to OSC messages
//!
//! The [`Dispatcher`] turns each [`DeviceEvent`] into one OSC message per telemetry
//! field and hands the encoded datagrams to an [`osc_transport::DatagramSink`]. Motion
//! data is additionally mirrored to the `/arm/<side>/` namespace of the arm a device is
//! synced to. Poses are sticky: a recognized pose is sent as `true` and only turned
//! off by [`Dispatcher::flush_poses`], which the caller runs once per polling
//! iteration (see [`run_bridge`]).

mod error;
pub use error::{SourceError, TelemetryError};

mod event;
pub use event::{DeviceEvent, DeviceRequest, EventKind};

mod encode;
pub use encode::encode_message;

mod orientation;
pub use orientation::quat_to_euler;

mod mirror;
pub use mirror::{render_line, VerboseMirror};

mod metrics;
pub use metrics::{MetricsHub, TelemetryMetrics};

mod dispatcher;
pub use dispatcher::Dispatcher;

mod source;
pub use source::{EventSource, ReplaySource};

mod bridge;
pub use bridge::{run_bridge, BridgeStats};
