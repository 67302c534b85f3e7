//! Vector aliases and the track-local to world transform.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f32>;
pub type Quat = UnitQuaternion<f32>;

/// Vectors shorter than this are treated as having no direction.
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// Rotation whose forward (+Z) axis points along `forward`, with +Y as the
/// preferred up axis. Returns `None` for a zero-length direction.
pub fn look_rotation(forward: &Vec3) -> Option<Quat> {
    let dir = forward.try_normalize(DIRECTION_EPSILON)?;
    // face_towards degenerates when dir is parallel to up
    let up = if dir.dot(&Vec3::y()).abs() > 1.0 - 1e-4 {
        Vec3::z()
    } else {
        Vec3::y()
    };
    Some(UnitQuaternion::face_towards(&dir, &up))
}

/// Translation/rotation/scale placing the track in the world.
/// Points and handle offsets are stored in track-local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TrackTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl TrackTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Local position to world position.
    #[inline]
    pub fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.translation + self.rotation * local.component_mul(&self.scale)
    }

    /// World position to local position. Zero scale axes collapse to 0.
    #[inline]
    pub fn inverse_transform_point(&self, world: &Vec3) -> Vec3 {
        let unrotated = self.rotation.inverse_transform_vector(&(world - self.translation));
        unscale(&unrotated, &self.scale)
    }

    /// Local direction to world direction (rotation and scale, no translation).
    #[inline]
    pub fn transform_vector(&self, local: &Vec3) -> Vec3 {
        self.rotation * local.component_mul(&self.scale)
    }
}

#[inline]
fn unscale(v: &Vec3, scale: &Vec3) -> Vec3 {
    Vec3::from_fn(|i, _| if scale[i] == 0.0 { 0.0 } else { v[i] / scale[i] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn look_rotation_maps_forward_axis() {
        let dir = Vec3::new(1.0, 0.0, 0.0);
        let rot = look_rotation(&dir).unwrap();
        assert_relative_eq!(rot * Vec3::z(), dir, epsilon = 1e-5);

        let up = Vec3::new(0.0, 3.0, 0.0);
        let rot = look_rotation(&up).unwrap();
        assert_relative_eq!(rot * Vec3::z(), Vec3::y(), epsilon = 1e-5);

        assert!(look_rotation(&Vec3::zeros()).is_none());
    }

    #[test]
    fn transform_round_trips_points() {
        let xf = TrackTransform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_euler_angles(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let local = Vec3::new(1.0, 0.0, 0.0);
        let world = xf.transform_point(&local);
        assert_relative_eq!(xf.inverse_transform_point(&world), local, epsilon = 1e-5);
        assert_relative_eq!(
            TrackTransform::identity().transform_point(&local),
            local,
            epsilon = 1e-6
        );
    }
}
