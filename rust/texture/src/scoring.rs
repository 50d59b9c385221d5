// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate weighting and top-K blending

use nalgebra::{Point3, Vector3};

use crate::sample::Rgb;

/// A colour observation with its weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub weight: f32,
    pub rgb: Rgb,
}

/// Bounded set keeping the heaviest candidates seen so far
///
/// Once full, a new candidate replaces the lightest one only if it is
/// strictly heavier.
#[derive(Debug, Clone)]
pub struct TopK {
    k: usize,
    items: Vec<Candidate>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            items: Vec::with_capacity(k.max(1)),
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        if self.items.len() < self.k {
            self.items.push(candidate);
            return;
        }
        let mut min_idx = 0;
        for (i, c) in self.items.iter().enumerate().skip(1) {
            if c.weight < self.items[min_idx].weight {
                min_idx = i;
            }
        }
        if candidate.weight > self.items[min_idx].weight {
            self.items[min_idx] = candidate;
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Weighted mean colour, clamped into 0..1
    pub fn blend(&self) -> Option<Rgb> {
        let mut sum_w = 0.0f32;
        let mut acc = [0.0f32; 3];
        for c in &self.items {
            sum_w += c.weight;
            for k in 0..3 {
                acc[k] += c.rgb[k] * c.weight;
            }
        }
        (sum_w > 0.0).then(|| acc.map(|x| (x / sum_w).clamp(0.0, 1.0)))
    }
}

/// Unit normal of a triangle, zero for degenerate ones
pub fn unit_normal(tri: &[Point3<f32>; 3]) -> Vector3<f32> {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let len = n.norm();
    if len > 1e-12 {
        n / len
    } else {
        Vector3::zeros()
    }
}

pub fn centroid(tri: &[Point3<f32>; 3]) -> Point3<f32> {
    Point3::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0)
}

/// Cosine between the surface normal and the direction to the camera
#[inline]
pub fn facing(normal: &Vector3<f32>, point: &Point3<f32>, camera: &Vector3<f32>) -> f32 {
    let to_cam = camera - point.coords;
    let len = to_cam.norm().max(1e-12);
    normal.dot(&(to_cam / len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cand(weight: f32, r: f32) -> Candidate {
        Candidate {
            weight,
            rgb: [r, 0.0, 0.0],
        }
    }

    #[test]
    fn test_top_k_replaces_lightest() {
        let mut top = TopK::new(2);
        top.push(cand(1.0, 0.0));
        top.push(cand(3.0, 1.0));
        top.push(cand(2.0, 1.0));
        // Equal weight does not displace
        top.push(cand(2.0, 0.0));
        assert_eq!(top.len(), 2);
        assert_relative_eq!(top.blend().unwrap()[0], 1.0);
    }

    #[test]
    fn test_blend_weighted_mean() {
        let mut top = TopK::new(4);
        top.push(cand(1.0, 0.0));
        top.push(cand(3.0, 1.0));
        assert_relative_eq!(top.blend().unwrap()[0], 0.75);
        assert!(TopK::new(3).blend().is_none());
    }

    #[test]
    fn test_facing_of_front_triangle() {
        let tri = [
            Point3::new(-0.5, -0.3, 2.0),
            Point3::new(0.0, 0.3, 2.0),
            Point3::new(0.5, -0.3, 2.0),
        ];
        let n = unit_normal(&tri);
        assert_relative_eq!(n.z, -1.0);
        let c = centroid(&tri);
        let f = facing(&n, &Point3::new(0.0, 0.0, 2.0), &Vector3::zeros());
        assert_relative_eq!(f, 1.0);
        assert!(facing(&n, &c, &Vector3::new(0.0, 0.0, 4.0)) < 0.0);
    }
}
