//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Componentwise minimum.
    pub min: Point3<f64>,
    /// Componentwise maximum.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Smallest box containing every point, or `None` for an empty set.
    ///
    /// A NaN coordinate makes that axis NaN in both corners.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut min = first;
        let mut max = first;
        for p in points {
            for i in 0..3 {
                min[i] = nan_min(min[i], p[i]);
                max[i] = nan_max(max[i], p[i]);
            }
        }
        Some(Self { min, max })
    }

    /// Edge lengths along each axis.
    #[inline]
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

// `f64::min`/`f64::max` return the non-NaN operand, which would drop NaN.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let pts = [
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-1.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let bbox = Aabb::from_points(&pts).unwrap();
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max, Point3::new(1.0, 3.0, 2.0));
        assert_eq!(bbox.extent(), Vector3::new(2.0, 5.0, 2.0));
    }

    #[test]
    fn test_nan_coordinate_propagates() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(f64::NAN, 1.0, 1.0),
            Point3::new(2.0, -1.0, 3.0),
        ];
        let bbox = Aabb::from_points(&pts).unwrap();
        assert!(bbox.min.x.is_nan());
        assert!(bbox.max.x.is_nan());
        assert_eq!((bbox.min.y, bbox.max.y), (-1.0, 1.0));
        assert_eq!((bbox.min.z, bbox.max.z), (0.0, 3.0));

        // NaN in the first point is kept as well.
        let pts = [Point3::new(0.0, f64::NAN, 0.0), Point3::new(1.0, 1.0, 1.0)];
        let bbox = Aabb::from_points(&pts).unwrap();
        assert!(bbox.min.y.is_nan() && bbox.max.y.is_nan());
    }

    #[test]
    fn test_empty_is_none() {
        let pts: [Point3<f64>; 0] = [];
        assert!(Aabb::from_points(&pts).is_none());
    }
}
