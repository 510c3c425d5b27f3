use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Independent random streams derived from the same (seed, timestep, pass, tag) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Stream {
    Move = 0,
    Depletant = 1,
}

/// Builds the generator for one particle's trial in one pass.
///
/// The stream depends only on the key, never on which thread or in which order cells run, so
/// every backend produces the same trajectory for the same seed.
pub fn trial_rng(seed: u64, timestep: u64, pass: u32, tag: u32, stream: Stream) -> ChaCha8Rng {
    let mut key = [0u8; 32];
    key[0..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&timestep.to_le_bytes());
    key[16..20].copy_from_slice(&pass.to_le_bytes());
    key[20..24].copy_from_slice(&tag.to_le_bytes());
    key[24..28].copy_from_slice(&(stream as u32).to_le_bytes());
    ChaCha8Rng::from_seed(key)
}

/// Uniform sample in `[-1, 1)`.
#[inline]
fn symmetric(rng: &mut impl Rng) -> f64 {
    2.0 * rng.r#gen::<f64>() - 1.0
}

/// Uniform point in a ball of `radius`, or in a disk in the xy-plane when `planar`.
pub fn uniform_in_ball(rng: &mut impl Rng, radius: f64, planar: bool) -> Vector3<f64> {
    loop {
        let x = symmetric(rng);
        let y = symmetric(rng);
        let z = if planar { 0.0 } else { symmetric(rng) };
        let r2 = x * x + y * y + z * z;
        if r2 <= 1.0 {
            return Vector3::new(x, y, z) * radius;
        }
    }
}

pub fn random_unit_vector(rng: &mut impl Rng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(symmetric(rng), symmetric(rng), symmetric(rng));
        let n2 = v.norm_squared();
        if n2 > 1e-12 && n2 <= 1.0 {
            return v / n2.sqrt();
        }
    }
}

/// Rotation by an angle drawn uniformly from `[-max_angle, max_angle]`. Planar moves rotate
/// about z, otherwise the axis is uniform on the sphere.
pub fn small_rotation(rng: &mut impl Rng, max_angle: f64, planar: bool) -> UnitQuaternion<f64> {
    let angle = max_angle * symmetric(rng);
    let axis = if planar {
        Vector3::z_axis()
    } else {
        nalgebra::Unit::new_unchecked(random_unit_vector(rng))
    };
    UnitQuaternion::from_axis_angle(&axis, angle)
}

/// Uniformly distributed orientation (Shoemake's method), restricted to z-rotations when planar.
pub fn random_orientation(rng: &mut impl Rng, planar: bool) -> UnitQuaternion<f64> {
    if planar {
        let angle = PI * symmetric(rng);
        return UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle);
    }
    let u1: f64 = rng.r#gen();
    let u2: f64 = rng.r#gen();
    let u3: f64 = rng.r#gen();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    let q = Quaternion::new(
        a * (2.0 * PI * u2).sin(),
        a * (2.0 * PI * u2).cos(),
        b * (2.0 * PI * u3).sin(),
        b * (2.0 * PI * u3).cos(),
    );
    UnitQuaternion::from_quaternion(q)
}
