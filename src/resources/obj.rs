use std::{
    collections::HashSet,
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::scene::{Face, Material, Node, SceneTree, SourceMesh},
    resources::{ParseOptions, load_string},
};

/// MTL `Ns` ranges up to this value.
const MAX_MTL_SHININESS: f32 = 1000.0;

/**
 * Reads a Wavefront OBJ file and its MTL libraries.
 *
 * Every OBJ object becomes a root node referencing a mesh of the same name.
 * Faces are triangulated and positions/texcoords share one index, so a vertex
 * index addresses both arrays. Material libraries are resolved relative to the
 * OBJ file and their `map_Kd` is used as the texture key.
 */
pub fn load_scene_obj(path: &Path, options: &ParseOptions) -> anyhow::Result<SceneTree> {
    let obj_text = load_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mat_text = load_string(&base.join(p)).map_err(|e| {
                log::error!("Material library {} could not be read: {e}", p.display());
                tobj::LoadError::OpenFileFailed
            })?;
            tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text)))
        },
    )?;
    let obj_materials = obj_materials?;

    let mut scene = SceneTree::new(path);
    for m in &obj_materials {
        scene.add_material(to_material(m));
    }

    let mut names = HashSet::new();
    for (idx, model) in models.into_iter().enumerate() {
        let name = if model.name.is_empty() || names.contains(&model.name) {
            format!("{}#{}", model.name, idx)
        } else {
            model.name.clone()
        };
        names.insert(name.clone());

        let mesh = &model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let texels = (!mesh.texcoords.is_empty()).then(|| {
            mesh.texcoords
                .chunks_exact(2)
                .map(|t| {
                    if options.flip_texcoords_v {
                        [t[0], 1.0 - t[1]]
                    } else {
                        [t[0], t[1]]
                    }
                })
                .collect::<Vec<_>>()
        });
        // Faces of an object with a dangling material id keep a name no material
        // has, so compilation reports the broken reference.
        let material = mesh.material_id.map(|id| {
            obj_materials
                .get(id)
                .map(|m| m.name.clone())
                .unwrap_or_else(|| format!("#missing{id}"))
        });
        let faces = mesh
            .indices
            .chunks_exact(3)
            .map(|c| Face {
                points: [c[0], c[1], c[2]],
                material: material.clone(),
            })
            .collect();

        let mut source = SourceMesh::new(name.clone(), positions, faces);
        source.texels = texels;
        scene.add_mesh(source);
        scene.add_root(Node::with_mesh(name.clone(), name));
    }

    log::info!(
        "Read {} objects and {} materials from {}",
        scene.meshes().len(),
        scene.materials().len(),
        path.display()
    );
    Ok(scene)
}

fn to_material(m: &tobj::Material) -> Material {
    let mut material = Material::new(&m.name);
    if let Some(ambient) = m.ambient {
        material.ambient = ambient;
    }
    if let Some(diffuse) = m.diffuse {
        material.diffuse = diffuse;
    }
    if let Some(specular) = m.specular {
        material.specular = specular;
    }
    if let Some(shininess) = m.shininess {
        material.shininess = (shininess / MAX_MTL_SHININESS).clamp(0.0, 1.0);
    }
    match &m.diffuse_texture {
        Some(texture) => material.texture = Some(texture.clone()),
        None => log::debug!("Material {} references no texture.", m.name),
    }
    material
}
