//! Rotation quaternion to compass heading.
//!
//! The game embeds the player camera rotation as a Unity-convention
//! quaternion `[x, y, z, w]` (Y up). Only the yaw matters for a 2D map:
//! the heading is where the rotated forward vector points on the ground
//! plane, measured clockwise from north (+Z) looking down.

/// Squared-norm floor below which a quaternion has no usable direction.
const MIN_NORM_SQ: f64 = 1e-12;

/// Compass heading in degrees `[0, 360)` from a rotation quaternion.
///
/// The quaternion is normalized first, so scaled inputs work. Returns
/// `None` when the norm is zero or non-finite.
pub fn heading_from_quaternion(q: [f64; 4]) -> Option<f64> {
    let [x, y, z, w] = q;
    let norm_sq = x * x + y * y + z * z + w * w;
    if !norm_sq.is_finite() || norm_sq < MIN_NORM_SQ {
        return None;
    }
    let inv = norm_sq.sqrt().recip();
    let (x, y, z, w) = (x * inv, y * inv, z * inv, w * inv);

    // Rotated forward vector q*(0,0,1); its y component is irrelevant.
    let fx = 2.0 * (x * z + w * y);
    let fz = 1.0 - 2.0 * (x * x + y * y);
    Some(normalize_heading(fx.atan2(fz).to_degrees()))
}

/// Wrap any angle in degrees into `[0, 360)`.
pub fn normalize_heading(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}
