use crate::{Arm, DeviceId, Pose, EMG_CHANNELS, POSE_COUNT};

const DEVICE_ROOT: &str = "/myo";
const ARM_ROOT: &str = "/arm";
const QUAT_AXES: [&str; 4] = ["x", "y", "z", "w"];
const VEC_AXES: [&str; 3] = ["x", "y", "z"];

/// Addresses of a composite field: the group address plus one per component.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AxisGroup<const N: usize> {
    pub group: String,
    pub axes: [String; N],
}

impl<const N: usize> AxisGroup<N> {
    fn named(base: &str, field: &str, names: [&str; N]) -> Self {
        let group = format!("{base}{field}");
        let axes = names.map(|n| format!("{group}/{n}"));
        Self { group, axes }
    }

    fn indexed(base: &str, field: &str) -> Self {
        let group = format!("{base}{field}");
        let axes = std::array::from_fn(|i| format!("{group}/{i}"));
        Self { group, axes }
    }
}

/// Every OSC address a device (or an arm) will ever send to.
///
/// Built once per id/arm and never mutated. Construction is a pure function of the
/// scope, so two namespaces for the same id are always equal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AddressNamespace {
    pub base: String,
    pub paired: String,
    pub connected: String,
    pub synced: String,
    pub arm: String,
    pub device_direction: String,
    pub arm_rotation: String,
    pub warmup_state: String,
    pub locked: String,
    pub poses: [String; POSE_COUNT],
    pub orient_quat: AxisGroup<4>,
    pub orient_vec: AxisGroup<3>,
    pub accel: AxisGroup<3>,
    pub gyro: AxisGroup<3>,
    pub rssi: String,
    pub battery: String,
    pub emg: AxisGroup<EMG_CHANNELS>,
    pub warmup_result: String,
}

impl AddressNamespace {
    /// Namespace rooted at `/myo/<id>/`.
    pub fn for_device(id: DeviceId) -> Self {
        Self::with_base(format!("{DEVICE_ROOT}/{id}/"))
    }

    /// Namespace rooted at `/arm/<left|right>/`.
    ///
    /// `Arm::Unknown` yields the sentinel `/arm/unknown/` namespace, which no device
    /// or synced arm ever uses.
    pub fn for_arm(arm: Arm) -> Self {
        Self::with_base(format!("{ARM_ROOT}/{}/", arm.as_str()))
    }

    fn with_base(base: String) -> Self {
        let field = |name: &str| format!("{base}{name}");
        Self {
            paired: field("paired"),
            connected: field("connected"),
            synced: field("synced"),
            arm: field("arm"),
            device_direction: field("deviceDirection"),
            arm_rotation: field("armRotation"),
            warmup_state: field("warmupState"),
            locked: field("locked"),
            poses: Pose::INDEXED.map(|p| format!("{base}pose/{}", p.label())),
            orient_quat: AxisGroup::named(&base, "orientQuat", QUAT_AXES),
            orient_vec: AxisGroup::named(&base, "orientVec", VEC_AXES),
            accel: AxisGroup::named(&base, "accel", VEC_AXES),
            gyro: AxisGroup::named(&base, "gyro", VEC_AXES),
            rssi: field("rssi"),
            battery: field("battery"),
            emg: AxisGroup::indexed(&base, "emg"),
            warmup_result: field("warmupResult"),
            base,
        }
    }

    /// Address for a pose, `None` for `Pose::Unknown`.
    pub fn pose(&self, pose: Pose) -> Option<&str> {
        pose.index().map(|i| self.poses[i].as_str())
    }

    /// All leaf addresses in a fixed order.
    pub fn addresses(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![
            &self.paired,
            &self.connected,
            &self.synced,
            &self.arm,
            &self.device_direction,
            &self.arm_rotation,
            &self.warmup_state,
            &self.locked,
        ];
        out.extend(self.poses.iter().map(String::as_str));
        out.extend(self.orient_quat.axes.iter().map(String::as_str));
        out.extend(self.orient_vec.axes.iter().map(String::as_str));
        out.extend(self.accel.axes.iter().map(String::as_str));
        out.extend(self.gyro.axes.iter().map(String::as_str));
        out.push(&self.rssi);
        out.push(&self.battery);
        out.extend(self.emg.axes.iter().map(String::as_str));
        out.push(&self.warmup_result);
        out
    }
}

/// Fixed left/right arm namespaces, plus the sentinel for unsynced devices.
#[derive(Clone, Debug)]
pub struct ArmNamespaces {
    left: AddressNamespace,
    right: AddressNamespace,
    unknown: AddressNamespace,
}

impl ArmNamespaces {
    pub fn new() -> Self {
        Self {
            left: AddressNamespace::for_arm(Arm::Left),
            right: AddressNamespace::for_arm(Arm::Right),
            unknown: AddressNamespace::for_arm(Arm::Unknown),
        }
    }

    /// Total lookup; unknown arms resolve to the sentinel namespace.
    pub fn get(&self, arm: Arm) -> &AddressNamespace {
        match arm {
            Arm::Left => &self.left,
            Arm::Right => &self.right,
            Arm::Unknown => &self.unknown,
        }
    }

    /// Namespace that aggregates data for a synced arm, `None` when unsynced.
    pub fn synced(&self, arm: Arm) -> Option<&AddressNamespace> {
        arm.is_known().then(|| self.get(arm))
    }
}

impl Default for ArmNamespaces {
    fn default() -> Self {
        Self::new()
    }
}
