use core::fmt;
use serde::{Deserialize, Serialize};

/// Number of EMG sensors on the armband.
pub const EMG_CHANNELS: usize = 8;

/// Number of poses that carry an address (every variant except `Pose::Unknown`).
pub const POSE_COUNT: usize = 6;

/// Small integer identity handed out by the registry, reused after release.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a physical device, owned by the SDK. Only compared for equality.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Right,
    Left,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Arm {
    /// SDK wire code.
    pub fn code(&self) -> i8 {
        match self {
            Arm::Right => 0,
            Arm::Left => 1,
            Arm::Unknown => 2,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Arm::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::Right => "right",
            Arm::Left => "left",
            Arm::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XDirection {
    TowardWrist,
    TowardElbow,
    #[default]
    #[serde(other)]
    Unknown,
}

impl XDirection {
    pub fn code(&self) -> i8 {
        match self {
            XDirection::TowardWrist => 0,
            XDirection::TowardElbow => 1,
            XDirection::Unknown => 2,
        }
    }
}

impl fmt::Display for XDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            XDirection::TowardWrist => "wrist",
            XDirection::TowardElbow => "elbow",
            XDirection::Unknown => "unknown",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupState {
    Cold,
    Warm,
    #[default]
    #[serde(other)]
    Unknown,
}

impl WarmupState {
    pub fn code(&self) -> i8 {
        match self {
            WarmupState::Unknown => 0,
            WarmupState::Cold => 1,
            WarmupState::Warm => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupResult {
    Success,
    FailedTimeout,
    #[default]
    #[serde(other)]
    Unknown,
}

impl WarmupResult {
    pub fn code(&self) -> i8 {
        match self {
            WarmupResult::Unknown => 0,
            WarmupResult::Success => 1,
            WarmupResult::FailedTimeout => 2,
        }
    }
}

/// Gesture recognized by the armband. Labels follow the SDK's pose naming.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pose {
    Rest,
    Fist,
    WaveIn,
    WaveOut,
    FingersSpread,
    DoubleTap,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Pose {
    /// Every pose with an address, in index order.
    pub const INDEXED: [Pose; POSE_COUNT] = [
        Pose::Rest,
        Pose::Fist,
        Pose::WaveIn,
        Pose::WaveOut,
        Pose::FingersSpread,
        Pose::DoubleTap,
    ];

    /// Position in the per-device pose arrays; `None` for `Unknown`.
    pub fn index(&self) -> Option<usize> {
        Self::INDEXED.iter().position(|p| p == self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pose::Rest => "rest",
            Pose::Fist => "fist",
            Pose::WaveIn => "waveIn",
            Pose::WaveOut => "waveOut",
            Pose::FingersSpread => "fingersSpread",
            Pose::DoubleTap => "doubleTap",
            Pose::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn components(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn components(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub hardware_rev: u32,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.hardware_rev
        )
    }
}
