//! Whole-model bounds and centering.

use cgmath::{InnerSpace, Vector3, Zero};

use crate::data_structures::compiled::{CompiledMesh, POSITION_COMPONENTS};

/// Shrink factor applied to the bounding box diagonal to get the model radius.
pub const RADIUS_DIVISOR: f32 = 2.2;

/// Axis aligned bounds of a model and the values derived from them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
    pub center: Vector3<f32>,
    pub radius: f32,
}

impl Bounds {
    /// Bounds of a model without vertices.
    pub const EMPTY: Bounds = Bounds {
        min: Vector3::new(0.0, 0.0, 0.0),
        max: Vector3::new(0.0, 0.0, 0.0),
        center: Vector3::new(0.0, 0.0, 0.0),
        radius: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.radius == 0.0 && self.center.is_zero()
    }
}

/// Scans every vertex of every mesh once and returns the bounding box, or
/// `None` when there are no vertices.
pub fn measure(meshes: &[CompiledMesh]) -> Option<(Vector3<f32>, Vector3<f32>)> {
    let mut positions = meshes
        .iter()
        .flat_map(|mesh| mesh.positions())
        .map(Vector3::from);
    let first = positions.next()?;
    Some(positions.fold((first, first), |(min, max), p| {
        (
            Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
            Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
        )
    }))
}

/// Centers all meshes around the origin and returns the bounds they had before.
///
/// `center = (min + max) / 2` and `radius = |max - min| / divisor`. Running it
/// again on centered data yields a zero center and leaves vertices untouched.
pub fn normalize(meshes: &mut [CompiledMesh], divisor: f32) -> Bounds {
    let Some((min, max)) = measure(meshes) else {
        return Bounds::EMPTY;
    };
    let center = (min + max) / 2.0;
    let radius = (max - min).magnitude() / divisor;

    if !center.is_zero() {
        for mesh in meshes.iter_mut() {
            for p in mesh.vertices.chunks_exact_mut(POSITION_COMPONENTS) {
                p[0] -= center.x;
                p[1] -= center.y;
                p[2] -= center.z;
            }
        }
    }

    log::debug!(
        "model bounds min {:?} max {:?}, center {:?}, radius {}",
        min,
        max,
        center,
        radius
    );

    Bounds {
        min,
        max,
        center,
        radius,
    }
}
