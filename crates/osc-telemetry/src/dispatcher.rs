use crate::{
    encode_message, quat_to_euler, DeviceEvent, DeviceRequest, EventKind, TelemetryError,
    TelemetryMetrics, VerboseMirror,
};
use device_registry::{
    AddressNamespace, Arm, ArmNamespaces, AxisGroup, DeviceRegistry, DeviceState, EMG_CHANNELS,
};
use osc_transport::DatagramSink;
use rosc::OscType;
use tracing::{debug, info, warn};

/// Turns device events into OSC datagrams.
///
/// Owns the registry and the arm namespaces; all access is expected from the single
/// thread that pumps SDK callbacks.
pub struct Dispatcher<S> {
    registry: DeviceRegistry,
    arms: ArmNamespaces,
    sink: S,
    mirror: Option<VerboseMirror>,
    metrics: Option<TelemetryMetrics>,
    requests: Vec<DeviceRequest>,
}

impl<S: DatagramSink> Dispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            arms: ArmNamespaces::new(),
            sink,
            mirror: None,
            metrics: None,
            requests: Vec::new(),
        }
    }

    pub fn with_mirror(mut self, mirror: VerboseMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_metrics(mut self, metrics: TelemetryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Requests queued for the SDK since the last drain.
    pub fn drain_requests(&mut self) -> Vec<DeviceRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn handle(&mut self, event: &DeviceEvent) {
        let Self {
            registry,
            arms,
            sink,
            mirror,
            metrics,
            requests,
        } = self;
        let mut out = Outbound {
            sink,
            mirror: mirror.as_mut(),
            metrics: metrics.as_ref(),
        };
        let handle = event.device;

        match &event.kind {
            EventKind::Disconnected => {
                match registry.find(handle) {
                    Some(state) => out.send(&state.paths().connected, OscType::Bool(false)),
                    None => debug!(%handle, "disconnect from unregistered device"),
                }
                if let Some(id) = registry.release(handle) {
                    info!(%id, %handle, "device disconnected; id released");
                }
            }
            _ => {
                let state = registry.resolve(handle);
                dispatch(&mut out, arms, requests, state, event);
            }
        }

        if let Some(m) = metrics.as_ref() {
            m.devices_registered.set(registry.active_count() as i64);
        }
    }

    /// Send `false` for every pose raised since the last flush, across all slots,
    /// and lower the flags. Poses raised by nothing since the last flush stay silent.
    pub fn flush_poses(&mut self) {
        let Self {
            registry,
            sink,
            mirror,
            metrics,
            ..
        } = self;
        let mut out = Outbound {
            sink,
            mirror: mirror.as_mut(),
            metrics: metrics.as_ref(),
        };
        for state in registry.iter_mut() {
            for pose in state.take_active_poses() {
                if let Some(addr) = state.paths().pose(pose) {
                    out.send(addr, OscType::Bool(false));
                }
            }
        }
    }
}

fn dispatch<S: DatagramSink>(
    out: &mut Outbound<'_, S>,
    arms: &ArmNamespaces,
    requests: &mut Vec<DeviceRequest>,
    state: &mut DeviceState,
    event: &DeviceEvent,
) {
    let id = state.id();
    match &event.kind {
        EventKind::Paired { firmware } => {
            info!(%id, %firmware, "device paired");
            out.send(&state.paths().paired, OscType::Bool(true));
        }
        EventKind::Unpaired => {
            info!(%id, "device unpaired");
            out.send(&state.paths().paired, OscType::Bool(false));
        }
        EventKind::Connected { firmware } => {
            info!(%id, %firmware, "device connected");
            requests.push(DeviceRequest::StreamEmg(event.device));
            out.send(&state.paths().connected, OscType::Bool(true));
        }
        // Disconnects release the slot and are handled by the caller
        EventKind::Disconnected => {}
        EventKind::ArmSynced {
            arm,
            x_direction,
            rotation,
            warmup_state,
        } => {
            info!(%id, %arm, direction = %x_direction, "arm synced");
            state.set_arm(*arm);
            let paths = state.paths();
            out.send(&paths.synced, OscType::Bool(true));
            out.send(&paths.arm, OscType::Int(arm.code().into()));
            out.send(&paths.device_direction, OscType::Int(x_direction.code().into()));
            out.send(&paths.arm_rotation, OscType::Float(*rotation));
            out.send(&paths.warmup_state, OscType::Int(warmup_state.code().into()));
        }
        EventKind::ArmUnsynced => {
            info!(%id, "arm unsynced");
            state.set_arm(Arm::Unknown);
            out.send(&state.paths().synced, OscType::Bool(false));
        }
        EventKind::Locked => out.send(&state.paths().locked, OscType::Bool(true)),
        EventKind::Unlocked => out.send(&state.paths().locked, OscType::Bool(false)),
        EventKind::Pose { pose } => {
            let sent = match state.paths().pose(*pose) {
                Some(addr) => {
                    out.send(addr, OscType::Bool(true));
                    true
                }
                None => false,
            };
            if sent {
                state.mark_pose(*pose);
            } else {
                debug!(%id, %pose, "pose without an address ignored");
            }
        }
        EventKind::Orientation { rotation } => {
            let quat = rotation.components().map(OscType::Float);
            let euler = quat_to_euler(*rotation).components().map(OscType::Float);
            for ns in scopes(state, arms) {
                out.send_group(&ns.orient_quat, &quat);
                out.send_group(&ns.orient_vec, &euler);
            }
        }
        EventKind::Accelerometer { accel } => {
            let values = accel.components().map(OscType::Float);
            for ns in scopes(state, arms) {
                out.send_group(&ns.accel, &values);
            }
        }
        EventKind::Gyroscope { gyro } => {
            let values = gyro.components().map(OscType::Float);
            for ns in scopes(state, arms) {
                out.send_group(&ns.gyro, &values);
            }
        }
        EventKind::Rssi { rssi } => out.send(&state.paths().rssi, OscType::Int((*rssi).into())),
        EventKind::BatteryLevel { level } => {
            out.send(&state.paths().battery, OscType::Int((*level).into()))
        }
        EventKind::Emg { emg } => {
            let values: [OscType; EMG_CHANNELS] = emg.map(|v| OscType::Int(v.into()));
            for ns in scopes(state, arms) {
                out.send_group(&ns.emg, &values);
            }
        }
        EventKind::WarmupCompleted { result } => {
            out.send(
                &state.paths().warmup_result,
                OscType::Int(result.code().into()),
            );
        }
    }
}

/// The device namespace, followed by its arm namespace when synced.
fn scopes<'a>(
    state: &'a DeviceState,
    arms: &'a ArmNamespaces,
) -> impl Iterator<Item = &'a AddressNamespace> {
    std::iter::once(state.paths()).chain(arms.synced(state.arm()))
}

struct Outbound<'a, S> {
    sink: &'a mut S,
    mirror: Option<&'a mut VerboseMirror>,
    metrics: Option<&'a TelemetryMetrics>,
}

impl<S: DatagramSink> Outbound<'_, S> {
    fn send(&mut self, addr: &str, value: OscType) {
        self.transmit(addr, value.clone());
        if let Some(mirror) = self.mirror.as_deref_mut() {
            mirror.mirror(addr, &[value]);
        }
    }

    /// One message per component, echoed to the mirror as a single vector line.
    fn send_group<const N: usize>(&mut self, group: &AxisGroup<N>, values: &[OscType; N]) {
        for (addr, value) in group.axes.iter().zip(values) {
            self.transmit(addr, value.clone());
        }
        if let Some(mirror) = self.mirror.as_deref_mut() {
            mirror.mirror(&group.group, values);
        }
    }

    fn transmit(&mut self, addr: &str, value: OscType) {
        let res = encode_message(addr, vec![value]).and_then(|bytes| {
            self.sink
                .transmit(&bytes)
                .map_err(TelemetryError::Transport)
        });
        match res {
            Ok(()) => {
                debug!(addr, "sent");
                if let Some(m) = self.metrics {
                    m.datagrams_sent.inc();
                }
            }
            Err(e) => {
                warn!(addr, error = %e, "dropping OSC message");
                if let Some(m) = self.metrics {
                    m.transmit_failures.inc();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsHub;
    use device_registry::{
        DeviceHandle, DeviceId, FirmwareVersion, Pose, Quaternion, Vector3, WarmupResult,
        WarmupState, XDirection,
    };
    use osc_transport::MockSink;
    use rosc::OscPacket;
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    const A: DeviceHandle = DeviceHandle::new(0xA);
    const B: DeviceHandle = DeviceHandle::new(0xB);

    fn dispatcher() -> Dispatcher<MockSink> {
        Dispatcher::new(MockSink::open("mock0").unwrap())
    }

    fn ev(device: DeviceHandle, kind: EventKind) -> DeviceEvent {
        DeviceEvent::new(device, 0, kind)
    }

    fn drain(d: &mut Dispatcher<MockSink>) -> Vec<(String, Vec<OscType>)> {
        d.sink_mut()
            .take()
            .into_iter()
            .map(|dg| match rosc::decoder::decode_udp(&dg.bytes).unwrap().1 {
                OscPacket::Message(m) => (m.addr, m.args),
                other => panic!("unexpected packet: {other:?}"),
            })
            .collect()
    }

    fn msg(addr: &str, value: OscType) -> (String, Vec<OscType>) {
        (addr.to_string(), vec![value])
    }

    fn sync(d: &mut Dispatcher<MockSink>, device: DeviceHandle, arm: Arm) {
        d.handle(&ev(
            device,
            EventKind::ArmSynced {
                arm,
                x_direction: XDirection::TowardWrist,
                rotation: 0.0,
                warmup_state: WarmupState::Warm,
            },
        ));
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pair_and_lock_flags() {
        let mut d = dispatcher();
        d.handle(&ev(
            A,
            EventKind::Paired {
                firmware: FirmwareVersion::default(),
            },
        ));
        d.handle(&ev(A, EventKind::Locked));
        d.handle(&ev(A, EventKind::Unlocked));
        d.handle(&ev(A, EventKind::Unpaired));
        assert_eq!(
            drain(&mut d),
            vec![
                msg("/myo/0/paired", OscType::Bool(true)),
                msg("/myo/0/locked", OscType::Bool(true)),
                msg("/myo/0/locked", OscType::Bool(false)),
                msg("/myo/0/paired", OscType::Bool(false)),
            ]
        );
    }

    #[test]
    fn test_pose_flag_roundtrip() {
        let mut d = dispatcher();
        d.handle(&ev(A, EventKind::Pose { pose: Pose::Fist }));
        assert_eq!(
            drain(&mut d),
            vec![msg("/myo/0/pose/fist", OscType::Bool(true))]
        );
        let state = d.registry().find(A).unwrap();
        assert!(state.is_pose_active(Pose::Fist));

        d.flush_poses();
        assert_eq!(
            drain(&mut d),
            vec![msg("/myo/0/pose/fist", OscType::Bool(false))]
        );
        assert!(!d.registry().find(A).unwrap().is_pose_active(Pose::Fist));

        d.flush_poses();
        assert!(drain(&mut d).is_empty());
    }

    #[test]
    fn test_repeated_pose_reemits_true() {
        let mut d = dispatcher();
        d.handle(&ev(A, EventKind::Pose { pose: Pose::WaveIn }));
        d.handle(&ev(A, EventKind::Pose { pose: Pose::WaveIn }));
        assert_eq!(drain(&mut d).len(), 2);
        d.flush_poses();
        assert_eq!(
            drain(&mut d),
            vec![msg("/myo/0/pose/waveIn", OscType::Bool(false))]
        );
    }

    #[test]
    fn test_unknown_pose_is_ignored() {
        let mut d = dispatcher();
        d.handle(&ev(A, EventKind::Pose { pose: Pose::Unknown }));
        assert!(drain(&mut d).is_empty());
        d.flush_poses();
        assert!(drain(&mut d).is_empty());
    }

    #[test]
    fn test_flush_covers_every_device() {
        let mut d = dispatcher();
        d.handle(&ev(A, EventKind::Pose { pose: Pose::Rest }));
        d.handle(&ev(B, EventKind::Pose { pose: Pose::DoubleTap }));
        d.handle(&ev(A, EventKind::Pose { pose: Pose::Fist }));
        drain(&mut d);
        d.flush_poses();
        assert_eq!(
            drain(&mut d),
            vec![
                msg("/myo/0/pose/rest", OscType::Bool(false)),
                msg("/myo/0/pose/fist", OscType::Bool(false)),
                msg("/myo/1/pose/doubleTap", OscType::Bool(false)),
            ]
        );
    }

    #[test]
    fn test_arm_sync_payload() {
        let mut d = dispatcher();
        d.handle(&ev(
            A,
            EventKind::ArmSynced {
                arm: Arm::Left,
                x_direction: XDirection::TowardElbow,
                rotation: 0.75,
                warmup_state: WarmupState::Cold,
            },
        ));
        assert_eq!(
            drain(&mut d),
            vec![
                msg("/myo/0/synced", OscType::Bool(true)),
                msg("/myo/0/arm", OscType::Int(1)),
                msg("/myo/0/deviceDirection", OscType::Int(1)),
                msg("/myo/0/armRotation", OscType::Float(0.75)),
                msg("/myo/0/warmupState", OscType::Int(1)),
            ]
        );
        assert_eq!(d.registry().find(A).unwrap().arm(), Arm::Left);

        d.handle(&ev(A, EventKind::ArmUnsynced));
        assert_eq!(
            drain(&mut d),
            vec![msg("/myo/0/synced", OscType::Bool(false))]
        );
        assert_eq!(d.registry().find(A).unwrap().arm(), Arm::Unknown);
    }

    #[test]
    fn test_accel_follows_synced_arm() {
        let mut d = dispatcher();
        sync(&mut d, A, Arm::Left);
        drain(&mut d);

        let accel = Vector3::new(0.1, 0.2, 0.3);
        d.handle(&ev(A, EventKind::Accelerometer { accel }));
        let sent = drain(&mut d);
        let addrs: Vec<&str> = sent.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(
            addrs,
            vec![
                "/myo/0/accel/x",
                "/myo/0/accel/y",
                "/myo/0/accel/z",
                "/arm/left/accel/x",
                "/arm/left/accel/y",
                "/arm/left/accel/z",
            ]
        );
        assert_eq!(sent[4].1, vec![OscType::Float(0.2)]);

        d.handle(&ev(A, EventKind::ArmUnsynced));
        drain(&mut d);
        d.handle(&ev(A, EventKind::Accelerometer { accel }));
        let sent = drain(&mut d);
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|(a, _)| a.starts_with("/myo/0/accel/")));
    }

    #[test]
    fn test_gyro_and_emg_on_right_arm() {
        let mut d = dispatcher();
        sync(&mut d, A, Arm::Right);
        drain(&mut d);

        d.handle(&ev(
            A,
            EventKind::Gyroscope {
                gyro: Vector3::new(1.0, 2.0, 3.0),
            },
        ));
        let sent = drain(&mut d);
        assert_eq!(sent.len(), 6);
        assert_eq!(sent[5], msg("/arm/right/gyro/z", OscType::Float(3.0)));

        let emg = [1, -2, 3, -4, 5, -6, 7, -8];
        d.handle(&ev(A, EventKind::Emg { emg }));
        let sent = drain(&mut d);
        assert_eq!(sent.len(), 2 * EMG_CHANNELS);
        assert_eq!(sent[0], msg("/myo/0/emg/0", OscType::Int(1)));
        assert_eq!(sent[7], msg("/myo/0/emg/7", OscType::Int(-8)));
        assert_eq!(sent[9], msg("/arm/right/emg/1", OscType::Int(-2)));
    }

    #[test]
    fn test_scalar_samples_stay_device_scoped() {
        let mut d = dispatcher();
        sync(&mut d, A, Arm::Left);
        drain(&mut d);
        d.handle(&ev(A, EventKind::Rssi { rssi: -70 }));
        d.handle(&ev(A, EventKind::BatteryLevel { level: 200 }));
        d.handle(&ev(
            A,
            EventKind::WarmupCompleted {
                result: WarmupResult::Success,
            },
        ));
        assert_eq!(
            drain(&mut d),
            vec![
                msg("/myo/0/rssi", OscType::Int(-70)),
                msg("/myo/0/battery", OscType::Int(200)),
                msg("/myo/0/warmupResult", OscType::Int(1)),
            ]
        );
    }

    #[test]
    fn test_end_to_end_orientation() {
        let mut d = dispatcher();
        d.handle(&ev(
            A,
            EventKind::Connected {
                firmware: FirmwareVersion::default(),
            },
        ));
        sync(&mut d, A, Arm::Left);
        drain(&mut d);
        assert_eq!(d.drain_requests(), vec![DeviceRequest::StreamEmg(A)]);
        assert!(d.drain_requests().is_empty());

        d.handle(&ev(
            A,
            EventKind::Orientation {
                rotation: Quaternion::IDENTITY,
            },
        ));
        let f = OscType::Float;
        assert_eq!(
            drain(&mut d),
            vec![
                msg("/myo/0/orientQuat/x", f(0.0)),
                msg("/myo/0/orientQuat/y", f(0.0)),
                msg("/myo/0/orientQuat/z", f(0.0)),
                msg("/myo/0/orientQuat/w", f(1.0)),
                msg("/myo/0/orientVec/x", f(0.0)),
                msg("/myo/0/orientVec/y", f(0.0)),
                msg("/myo/0/orientVec/z", f(0.0)),
                msg("/arm/left/orientQuat/x", f(0.0)),
                msg("/arm/left/orientQuat/y", f(0.0)),
                msg("/arm/left/orientQuat/z", f(0.0)),
                msg("/arm/left/orientQuat/w", f(1.0)),
                msg("/arm/left/orientVec/x", f(0.0)),
                msg("/arm/left/orientVec/y", f(0.0)),
                msg("/arm/left/orientVec/z", f(0.0)),
            ]
        );
    }

    #[test]
    fn test_unknown_arm_sync_stays_device_scoped() {
        let mut d = dispatcher();
        sync(&mut d, A, Arm::Left);
        sync(&mut d, A, Arm::Unknown);
        drain(&mut d);
        assert_eq!(d.registry().find(A).unwrap().arm(), Arm::Unknown);

        d.handle(&ev(
            A,
            EventKind::Gyroscope {
                gyro: Vector3::new(1.0, 2.0, 3.0),
            },
        ));
        let sent = drain(&mut d);
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|(addr, _)| addr.starts_with("/myo/0/gyro/")));
    }

    #[test]
    fn test_non_unit_quaternion_sends_nan_pitch() {
        let mut d = dispatcher();
        d.handle(&ev(
            A,
            EventKind::Orientation {
                rotation: Quaternion::new(0.0, 1.0, 0.0, 1.0),
            },
        ));
        let sent = drain(&mut d);
        assert_eq!(sent.len(), 7);
        let (_, pitch) = sent
            .iter()
            .find(|(addr, _)| addr == "/myo/0/orientVec/y")
            .unwrap();
        match pitch.as_slice() {
            [OscType::Float(v)] => assert!(v.is_nan()),
            other => panic!("unexpected args: {other:?}"),
        }
    }

    #[test]
    fn test_disconnect_releases_and_reuses_id() {
        let mut d = dispatcher();
        d.handle(&ev(
            A,
            EventKind::Connected {
                firmware: FirmwareVersion::default(),
            },
        ));
        sync(&mut d, A, Arm::Left);
        d.handle(&ev(A, EventKind::Pose { pose: Pose::Fist }));
        drain(&mut d);

        d.handle(&ev(A, EventKind::Disconnected));
        assert_eq!(
            drain(&mut d),
            vec![msg("/myo/0/connected", OscType::Bool(false))]
        );
        assert!(d.registry().find(A).is_none());

        // Pending pose flag was dropped with the slot
        d.flush_poses();
        assert!(drain(&mut d).is_empty());

        d.handle(&ev(B, EventKind::Locked));
        assert_eq!(
            drain(&mut d),
            vec![msg("/myo/0/locked", OscType::Bool(true))]
        );
        let state = d.registry().find(B).unwrap();
        assert_eq!(state.id(), DeviceId::new(0));
        assert_eq!(state.arm(), Arm::Unknown);
    }

    #[test]
    fn test_disconnect_of_unknown_device_is_silent() {
        let mut d = dispatcher();
        d.handle(&ev(B, EventKind::Disconnected));
        assert!(drain(&mut d).is_empty());
        assert!(d.registry().is_empty());
    }

    #[test]
    fn test_failed_transmit_is_counted_not_fatal() {
        let hub = MetricsHub::new().unwrap();
        let mut d =
            Dispatcher::new(MockSink::failing("mock0")).with_metrics(hub.telemetry.clone());
        d.handle(&ev(A, EventKind::Pose { pose: Pose::Fist }));
        d.flush_poses();
        assert_eq!(hub.telemetry.transmit_failures.get(), 2);
        assert_eq!(hub.telemetry.datagrams_sent.get(), 0);
        assert_eq!(hub.telemetry.devices_registered.get(), 1);
    }

    #[test]
    fn test_metrics_track_registrations() {
        let hub = MetricsHub::new().unwrap();
        let mut d = dispatcher().with_metrics(hub.telemetry.clone());
        d.handle(&ev(A, EventKind::Locked));
        d.handle(&ev(B, EventKind::Locked));
        assert_eq!(hub.telemetry.devices_registered.get(), 2);
        d.handle(&ev(A, EventKind::Disconnected));
        assert_eq!(hub.telemetry.devices_registered.get(), 1);
        assert_eq!(hub.telemetry.datagrams_sent.get(), 3);
    }

    #[test]
    fn test_mirror_echoes_messages() {
        let buf = SharedBuf::default();
        let mut d = dispatcher().with_mirror(VerboseMirror::new(buf.clone()));
        d.handle(&ev(A, EventKind::Rssi { rssi: -50 }));
        d.handle(&ev(
            A,
            EventKind::Accelerometer {
                accel: Vector3::new(0.0, 0.0, 1.0),
            },
        ));
        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("/myo/0/rssi:"));
        assert!(lines[1].starts_with("/myo/0/accel:"));
        assert_eq!(drain(&mut d).len(), 4);
    }
}
