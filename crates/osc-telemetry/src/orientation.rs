use device_registry::{Quaternion, Vector3};

/// Euler angles (yaw, pitch, roll) in radians from a unit quaternion.
///
/// The `asin` argument is not clamped: a non-unit quaternion can produce NaN pitch,
/// which is forwarded as-is.
pub fn quat_to_euler(q: Quaternion) -> Vector3 {
    let Quaternion { x, y, z, w } = q;
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
    let pitch = (2.0 * (w * y - z * x)).asin();
    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    Vector3::new(yaw, pitch, roll)
}
