use std::{collections::HashSet, path::Path};

use anyhow::{Context, anyhow, bail};

use crate::{
    data_structures::scene::{Face, Material, Node, SceneTree, SourceMesh},
    resources::load_binary,
};

/**
 * Reads a glTF (`.gltf` or `.glb`) file.
 *
 * The node hierarchy of the default scene is kept as is. A glTF mesh may hold
 * several primitives with different materials while a scene node references a
 * single mesh, so every triangle primitive becomes its own mesh
 * `"<mesh>#<primitive>"`, attached through a child node `"<node>#<primitive>"`.
 * Mesh names are made unique first: a mesh whose name is already taken by a
 * mesh with a lower index gets `"@<index>"` appended.
 *
 * Texture keys are image URIs, resolved relative to the file. Images stored in
 * buffer views are registered as embedded images under `"<file>#image<index>"`.
 * Node transforms and animations are not evaluated.
 */
pub fn load_scene_gltf(path: &Path) -> anyhow::Result<SceneTree> {
    let bytes = load_binary(path)?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("buffer {} refers to a missing binary chunk", buffer.index()))?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                bail!("buffer {} uses a data URI, which is not supported", buffer.index());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&base.join(uri))
                    .with_context(|| format!("failed to read buffer {uri}"))?;
                buffer_data.push(bin);
            }
        }
    }

    let mut scene = SceneTree::new(path);

    // Image keys by image index
    let mut image_keys = Vec::new();
    for image in gltf.images() {
        let key = match image.source() {
            gltf::image::Source::Uri { uri, .. } => uri.to_string(),
            gltf::image::Source::View { view, .. } => {
                let key = format!("{}#image{}", file_name, image.index());
                let start = view.offset();
                let end = start + view.length();
                let data = buffer_data
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..end))
                    .ok_or_else(|| anyhow!("image {} points outside its buffer", image.index()))?;
                scene.add_embedded_image(key.clone(), data.to_vec());
                key
            }
        };
        image_keys.push(key);
    }

    for material in gltf.materials() {
        let Some(index) = material.index() else {
            continue;
        };
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let mut converted = Material::new(material_name(material.name(), index));
        converted.diffuse = [r, g, b];
        converted.shininess = (1.0 - pbr.roughness_factor()).clamp(0.0, 1.0);
        converted.texture = pbr
            .base_color_texture()
            .and_then(|info| image_keys.get(info.texture().source().index()).cloned());
        scene.add_material(converted);
    }

    let gltf_scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("file contains no scene"))?;
    let mesh_names = unique_mesh_names(&gltf);
    let mut added_meshes = HashSet::new();
    for node in gltf_scene.nodes() {
        let root = to_node(
            node,
            &buffer_data,
            &mesh_names,
            &mut scene,
            &mut added_meshes,
        )?;
        scene.add_root(root);
    }

    log::info!(
        "Read {} nodes, {} meshes and {} materials from {}",
        scene.count_nodes(),
        scene.meshes().len(),
        scene.materials().len(),
        path.display()
    );
    Ok(scene)
}

fn material_name(name: Option<&str>, index: usize) -> String {
    format!("{}#{}", name.unwrap_or("material"), index)
}

/// Scene keys for every mesh, by mesh index.
fn unique_mesh_names(gltf: &gltf::Gltf) -> Vec<String> {
    let mut taken = HashSet::new();
    gltf.meshes()
        .map(|mesh| {
            let mut name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh{}", mesh.index()));
            while !taken.insert(name.clone()) {
                name = format!("{}@{}", name, mesh.index());
            }
            name
        })
        .collect()
}

fn to_node(
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    mesh_names: &[String],
    scene: &mut SceneTree,
    added_meshes: &mut HashSet<usize>,
) -> anyhow::Result<Node> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let mut scene_node = Node::new(name.clone());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh_names
            .get(mesh.index())
            .ok_or_else(|| anyhow!("mesh {} is out of range", mesh.index()))?;
        let first_use = added_meshes.insert(mesh.index());
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {}: only triangle lists are supported",
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let key = format!("{}#{}", mesh_name, primitive.index());
            if first_use {
                scene.add_mesh(to_source_mesh(&key, &primitive, buffers)?);
            }
            scene_node.add_child(Node::with_mesh(
                format!("{}#{}", name, primitive.index()),
                key,
            ));
        }
    }

    for child in node.children() {
        scene_node.add_child(to_node(child, buffers, mesh_names, scene, added_meshes)?);
    }
    Ok(scene_node)
}

fn to_source_mesh(
    name: &str,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
) -> anyhow::Result<SourceMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| anyhow!("primitive {name} has no positions"))?
        .collect();
    let texels = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().collect::<Vec<[f32; 2]>>());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        bail!("primitive {name} has {} indices, not a triangle list", indices.len());
    }

    let material = primitive
        .material()
        .index()
        .map(|index| material_name(primitive.material().name(), index));
    let faces = indices
        .chunks_exact(3)
        .map(|c| Face {
            points: [c[0], c[1], c[2]],
            material: material.clone(),
        })
        .collect();

    let mut mesh = SourceMesh::new(name, positions, faces);
    mesh.texels = texels;
    Ok(mesh)
}
