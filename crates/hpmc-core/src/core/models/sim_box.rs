use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoxError {
    #[error("Box length along {axis} must be positive and finite, got {value}")]
    NonPositiveLength { axis: char, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensions {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
}

impl Dimensions {
    pub fn count(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

/// An orthorhombic periodic simulation box centered on the origin.
///
/// Positions inside the box satisfy `-L/2 <= x < L/2` along every periodic axis. In two
/// dimensions the z axis is not periodic and particles are expected to sit at `z = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimBox {
    lengths: Vector3<f64>,
    dimensions: Dimensions,
}

impl SimBox {
    pub fn new(lengths: Vector3<f64>, dimensions: Dimensions) -> Result<Self, BoxError> {
        let axes = match dimensions {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        };
        for (axis, name) in ['x', 'y', 'z'].into_iter().enumerate().take(axes) {
            let value = lengths[axis];
            if !(value.is_finite() && value > 0.0) {
                return Err(BoxError::NonPositiveLength { axis: name, value });
            }
        }
        let mut lengths = lengths;
        if dimensions == Dimensions::Two {
            lengths.z = 1.0;
        }
        Ok(Self {
            lengths,
            dimensions,
        })
    }

    pub fn cubic(length: f64) -> Result<Self, BoxError> {
        Self::new(Vector3::repeat(length), Dimensions::Three)
    }

    pub fn square(length: f64) -> Result<Self, BoxError> {
        Self::new(Vector3::new(length, length, 1.0), Dimensions::Two)
    }

    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn is_2d(&self) -> bool {
        self.dimensions == Dimensions::Two
    }

    /// Number of periodic axes (2 or 3).
    pub fn periodic_axes(&self) -> usize {
        self.dimensions.count()
    }

    /// Area in two dimensions, volume in three.
    pub fn volume(&self) -> f64 {
        match self.dimensions {
            Dimensions::Two => self.lengths.x * self.lengths.y,
            Dimensions::Three => self.lengths.x * self.lengths.y * self.lengths.z,
        }
    }

    pub fn wrap(&self, position: &Point3<f64>) -> Point3<f64> {
        let mut wrapped = *position;
        for axis in 0..self.periodic_axes() {
            let length = self.lengths[axis];
            wrapped[axis] -= length * (wrapped[axis] / length).round();
            if wrapped[axis] >= 0.5 * length {
                wrapped[axis] -= length;
            }
        }
        wrapped
    }

    /// Returns the periodic image of `delta` with the smallest components.
    pub fn min_image(&self, delta: &Vector3<f64>) -> Vector3<f64> {
        let mut image = *delta;
        for axis in 0..self.periodic_axes() {
            let length = self.lengths[axis];
            image[axis] -= length * (image[axis] / length).round();
        }
        image
    }

    /// Fractional coordinates in `[0, 1)` along each periodic axis (0 along a non-periodic z).
    pub fn fractional(&self, position: &Point3<f64>) -> Vector3<f64> {
        let wrapped = self.wrap(position);
        let mut frac = Vector3::zeros();
        for axis in 0..self.periodic_axes() {
            let f = wrapped[axis] / self.lengths[axis] + 0.5;
            frac[axis] = f.clamp(0.0, 1.0 - f64::EPSILON);
        }
        frac
    }

    /// Lattice translations that must be added to a minimum-image separation so that every
    /// periodic image within `range` is visited.
    ///
    /// Along axes at least `2 * range` long the minimum image is the only candidate; shorter axes
    /// need `ceil(range / L)` images on either side.
    pub fn image_vectors(&self, range: f64) -> Vec<Vector3<f64>> {
        let mut counts = [0i64; 3];
        for (axis, count) in counts.iter_mut().enumerate().take(self.periodic_axes()) {
            let length = self.lengths[axis];
            if length < 2.0 * range {
                *count = (range / length).ceil() as i64;
            }
        }

        let mut images = Vec::new();
        for i in -counts[0]..=counts[0] {
            for j in -counts[1]..=counts[1] {
                for k in -counts[2]..=counts[2] {
                    images.push(Vector3::new(
                        i as f64 * self.lengths.x,
                        j as f64 * self.lengths.y,
                        k as f64 * self.lengths.z,
                    ));
                }
            }
        }
        images
    }
}
