use device_registry::{
    Arm, DeviceHandle, FirmwareVersion, Pose, Quaternion, Vector3, WarmupResult, WarmupState,
    XDirection, EMG_CHANNELS,
};
use serde::{Deserialize, Serialize};

/// One SDK callback: which device, when (microseconds, monotonically non-decreasing),
/// and what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub device: DeviceHandle,
    #[serde(default)]
    pub timestamp_us: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl DeviceEvent {
    pub fn new(device: DeviceHandle, timestamp_us: u64, kind: EventKind) -> Self {
        Self {
            device,
            timestamp_us,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Paired {
        #[serde(default)]
        firmware: FirmwareVersion,
    },
    Unpaired,
    Connected {
        #[serde(default)]
        firmware: FirmwareVersion,
    },
    Disconnected,
    ArmSynced {
        arm: Arm,
        #[serde(default)]
        x_direction: XDirection,
        #[serde(default)]
        rotation: f32,
        #[serde(default)]
        warmup_state: WarmupState,
    },
    ArmUnsynced,
    Unlocked,
    Locked,
    Pose {
        pose: Pose,
    },
    Orientation {
        rotation: Quaternion,
    },
    Accelerometer {
        accel: Vector3,
    },
    Gyroscope {
        gyro: Vector3,
    },
    Rssi {
        rssi: i8,
    },
    BatteryLevel {
        level: u8,
    },
    Emg {
        emg: [i8; EMG_CHANNELS],
    },
    WarmupCompleted {
        result: WarmupResult,
    },
}

/// Calls the dispatcher asks the caller to make back into the SDK once the current
/// callback batch has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    /// Enable raw EMG streaming on a freshly connected device.
    StreamEmg(DeviceHandle),
}
