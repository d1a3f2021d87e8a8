use crate::{AddressNamespace, Arm, DeviceHandle, DeviceId, Pose, POSE_COUNT};

/// Per-slot state. The id and namespace are fixed for the lifetime of the slot; the
/// handle is cleared when the device disconnects so the slot can be reused.
#[derive(Debug, Clone)]
pub struct DeviceState {
    id: DeviceId,
    paths: AddressNamespace,
    handle: Option<DeviceHandle>,
    arm: Arm,
    active_poses: [bool; POSE_COUNT],
}

impl DeviceState {
    fn new(id: DeviceId, handle: DeviceHandle) -> Self {
        Self {
            id,
            paths: AddressNamespace::for_device(id),
            handle: Some(handle),
            arm: Arm::Unknown,
            active_poses: [false; POSE_COUNT],
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn paths(&self) -> &AddressNamespace {
        &self.paths
    }

    pub fn handle(&self) -> Option<DeviceHandle> {
        self.handle
    }

    pub fn is_registered(&self) -> bool {
        self.handle.is_some()
    }

    pub fn arm(&self) -> Arm {
        self.arm
    }

    pub fn set_arm(&mut self, arm: Arm) {
        self.arm = arm;
    }

    pub fn is_pose_active(&self, pose: Pose) -> bool {
        pose.index().is_some_and(|i| self.active_poses[i])
    }

    /// Raise the sticky flag for a pose. Returns false for `Pose::Unknown`.
    pub fn mark_pose(&mut self, pose: Pose) -> bool {
        match pose.index() {
            Some(i) => {
                self.active_poses[i] = true;
                true
            }
            None => false,
        }
    }

    /// Clear every raised pose flag, returning the poses that were active.
    pub fn take_active_poses(&mut self) -> Vec<Pose> {
        let mut out = Vec::new();
        for (i, active) in self.active_poses.iter_mut().enumerate() {
            if std::mem::take(active) {
                out.push(Pose::INDEXED[i]);
            }
        }
        out
    }

    fn clear(&mut self) {
        self.handle = None;
        self.arm = Arm::Unknown;
        self.active_poses = [false; POSE_COUNT];
    }
}

/// Slot table mapping SDK handles to stable ids.
///
/// Allocation reuses the lowest-indexed free slot before appending a new one, so ids
/// stay small and a reconnecting setup sees the same addresses.
#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    slots: Vec<DeviceState>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `handle`, allocating a slot if the handle has not been seen.
    pub fn resolve(&mut self, handle: DeviceHandle) -> &mut DeviceState {
        if let Some(idx) = self.position(handle) {
            return &mut self.slots[idx];
        }
        if let Some(idx) = self.slots.iter().position(|s| s.handle.is_none()) {
            let slot = &mut self.slots[idx];
            slot.handle = Some(handle);
            tracing::debug!(id = %slot.id, %handle, "reusing device slot");
            return slot;
        }
        let id = DeviceId::new(self.slots.len() as u32);
        tracing::debug!(%id, %handle, "allocating device slot");
        self.slots.push(DeviceState::new(id, handle));
        let last = self.slots.len() - 1;
        &mut self.slots[last]
    }

    pub fn find(&self, handle: DeviceHandle) -> Option<&DeviceState> {
        self.slots.iter().find(|s| s.handle == Some(handle))
    }

    pub fn find_mut(&mut self, handle: DeviceHandle) -> Option<&mut DeviceState> {
        self.slots.iter_mut().find(|s| s.handle == Some(handle))
    }

    /// Free the slot owning `handle`. Returns the released id, or `None` for an
    /// unregistered handle.
    pub fn release(&mut self, handle: DeviceHandle) -> Option<DeviceId> {
        let idx = self.position(handle)?;
        let slot = &mut self.slots[idx];
        slot.clear();
        Some(slot.id)
    }

    /// Every allocated slot in id order, including freed ones.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceState> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DeviceState> {
        self.slots.iter_mut()
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently holding a device.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_registered()).count()
    }

    fn position(&self, handle: DeviceHandle) -> Option<usize> {
        self.slots.iter().position(|s| s.handle == Some(handle))
    }
}
