use cgmath::{InnerSpace, Vector3, Zero};

use crate::{
    data_structures::{
        compiled::{Appearance, CompiledMesh, MAX_VERTICES},
        scene::{Face, Node, SceneTree, SourceMesh},
    },
    error::CompileError,
    resources::texture::{TextureCache, TextureUploader},
};

/// Result of compiling a scene.
#[derive(Clone, Debug, Default)]
pub struct Compilation {
    /// One entry per mesh-bearing node, children before their parent.
    pub meshes: Vec<CompiledMesh>,
    /// Number of nodes walked.
    pub visited: usize,
    /// Nodes that named a mesh the scene does not contain.
    pub skipped: Vec<String>,
}

/**
 * Walks every node of the scene once, depth first, and flattens each referenced
 * mesh into render buffers.
 *
 * A node's children are compiled before the node itself and siblings keep their
 * insertion order, so compiling the same scene twice gives the same list. The
 * walk uses an explicit stack so deep hierarchies cannot overflow the call stack.
 *
 * Textures must already be in `cache`; the compiler only reads from it.
 */
pub fn compile<U: TextureUploader>(
    scene: &SceneTree,
    cache: &TextureCache<U>,
) -> Result<Compilation, CompileError> {
    let mut out = Compilation::default();
    // (node, children already pushed)
    let mut stack: Vec<(&Node, bool)> = scene.roots().iter().rev().map(|n| (n, false)).collect();

    while let Some((node, expanded)) = stack.pop() {
        if !expanded {
            stack.push((node, true));
            stack.extend(node.children.iter().rev().map(|child| (child, false)));
            continue;
        }
        out.visited += 1;
        let Some(mesh_name) = &node.mesh else {
            continue;
        };
        match scene.mesh(mesh_name) {
            Some(mesh) => {
                let compiled = compile_mesh(&node.name, mesh, scene, cache)?;
                log::debug!(
                    "compiled node {} ({} vertices, {} triangles)",
                    node.name,
                    compiled.vertex_count(),
                    compiled.triangle_count()
                );
                out.meshes.push(compiled);
            }
            None => {
                log::warn!(
                    "node {} references mesh {} which does not exist, skipping it",
                    node.name,
                    mesh_name
                );
                out.skipped.push(node.name.clone());
            }
        }
    }

    Ok(out)
}

/// Flattens one source mesh. `node` is only used to label the result.
pub fn compile_mesh<U: TextureUploader>(
    node: &str,
    mesh: &SourceMesh,
    scene: &SceneTree,
    cache: &TextureCache<U>,
) -> Result<CompiledMesh, CompileError> {
    let vertex_count = mesh.positions.len();
    if vertex_count > MAX_VERTICES {
        return Err(CompileError::Capacity {
            mesh: mesh.name.clone(),
            vertices: vertex_count,
            limit: MAX_VERTICES,
        });
    }
    if let Some(texels) = &mesh.texels {
        if texels.len() != vertex_count {
            return Err(CompileError::MalformedMesh {
                mesh: mesh.name.clone(),
                reason: format!("{} texels for {} vertices", texels.len(), vertex_count),
            });
        }
    }
    if let Some((idx, face)) = mesh
        .faces
        .iter()
        .enumerate()
        .find(|(_, face)| face.points.iter().any(|&p| p as usize >= vertex_count))
    {
        return Err(CompileError::MalformedMesh {
            mesh: mesh.name.clone(),
            reason: format!(
                "face {} references {:?} but there are only {} vertices",
                idx, face.points, vertex_count
            ),
        });
    }

    let mut appearance = None;
    let mut texture = None;
    let mut texture_key: Option<&str> = None;
    for (idx, face) in mesh.faces.iter().enumerate() {
        let Some(material_name) = &face.material else {
            continue;
        };
        let material =
            scene
                .material(material_name)
                .ok_or_else(|| CompileError::UnresolvedMaterial {
                    mesh: mesh.name.clone(),
                    face: idx,
                    material: material_name.clone(),
                })?;
        appearance.get_or_insert_with(|| Appearance::from_material(material));
        let Some(key) = material.texture.as_deref() else {
            continue;
        };
        match texture_key {
            None => {
                let handle =
                    cache
                        .get(key)
                        .ok_or_else(|| CompileError::UnregisteredTexture {
                            mesh: mesh.name.clone(),
                            key: key.to_string(),
                        })?;
                texture = Some(handle);
                texture_key = Some(key);
            }
            Some(first) if first != key => {
                return Err(CompileError::MixedTextures {
                    mesh: mesh.name.clone(),
                    first: first.to_string(),
                    second: key.to_string(),
                });
            }
            Some(_) => (),
        }
    }

    let normals = compute_normals(&mesh.positions, &mesh.faces);
    let uvs = match (&mesh.texels, texture) {
        (Some(texels), Some(_)) => texels.iter().flatten().copied().collect(),
        _ => Vec::new(),
    };

    Ok(CompiledMesh {
        node: node.to_string(),
        mesh: mesh.name.clone(),
        vertices: mesh.positions.iter().flatten().copied().collect(),
        normals: normals.iter().flatten().copied().collect(),
        uvs,
        // Bounds were checked above, every index fits in u16.
        indices: mesh
            .faces
            .iter()
            .flat_map(|face| face.points)
            .map(|p| p as u16)
            .collect(),
        texture,
        texture_key: texture_key.map(str::to_string),
        appearance: appearance.unwrap_or_default(),
    })
}

/**
 * Smooth per-vertex normals.
 *
 * Every face adds its unnormalized geometric normal to each of its three
 * vertices. The cross product's length is twice the triangle's area, so large
 * faces weigh more. The sums are normalized at the end; vertices no face
 * contributes to keep a zero normal.
 *
 * All face indices must be smaller than `positions.len()`.
 */
pub fn compute_normals(positions: &[[f32; 3]], faces: &[Face]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vector3::<f32>::zero(); positions.len()];

    for face in faces {
        let [a, b, c] = face.points.map(|p| p as usize);
        let pos0: Vector3<f32> = positions[a].into();
        let pos1: Vector3<f32> = positions[b].into();
        let pos2: Vector3<f32> = positions[c].into();

        let face_normal = (pos1 - pos0).cross(pos2 - pos0);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > f32::EPSILON * f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_quad_normals_point_up() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let faces = [Face::new([0, 1, 2]), Face::new([0, 2, 3])];
        for n in compute_normals(&positions, &faces) {
            assert_relative_eq!(n[0], 0.0);
            assert_relative_eq!(n[1], 0.0);
            assert_relative_eq!(n[2], 1.0);
        }
    }

    #[test]
    fn shared_vertex_is_area_weighted() {
        // Vertex 0 is shared by a large face in the xy plane and a small face in the xz plane.
        let positions = [
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        ];
        let faces = [Face::new([0, 1, 2]), Face::new([0, 3, 4])];
        let normals = compute_normals(&positions, &faces);

        let shared = Vector3::from(normals[0]);
        assert_relative_eq!(shared.magnitude(), 1.0, epsilon = 1e-6);
        // z from the big face (area 8) dominates y from the small one (area 0.5)
        assert!(shared.z > shared.y * 10.0);
        assert!(shared.y > 0.0);
    }

    #[test]
    fn unreferenced_vertex_has_zero_normal() {
        let positions = [[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0; 3]];
        let normals = compute_normals(&positions, &[Face::new([0, 1, 2])]);
        assert_eq!(normals.len(), 4);
        assert_eq!(normals[3], [0.0; 3]);
    }

    #[test]
    fn degenerate_face_contributes_nothing() {
        let positions = [[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let normals = compute_normals(&positions, &[Face::new([0, 1, 2])]);
        assert!(normals.iter().all(|n| *n == [0.0; 3]));
    }
}
