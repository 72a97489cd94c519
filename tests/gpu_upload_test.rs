#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn device() -> (wgpu::Device, wgpu::Queue) {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no GPU adapter available for integration tests");
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-model test device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .expect("failed to create test device")
    })
}

#[test]
#[cfg(feature = "integration-tests")]
fn textures_are_uploaded_and_destroyed_with_the_model() {
    use std::path::PathBuf;

    use flow_model::{Model, PipelineSettings, gpu::WgpuUploader};

    common::test_utils::init_logging();
    let (device, queue) = device();
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cube.obj");

    let mut model = Model::new(WgpuUploader::new(device, queue), PipelineSettings::default());
    model.load_file(&path).unwrap();
    model.prepare_nodes().unwrap();

    let uploader = model.textures().uploader();
    assert_eq!(uploader.live_textures(), 1);
    let handle = model.textures().get("brick.png").unwrap();
    let texture = uploader.texture(handle).unwrap();
    assert_eq!(texture.texture.width(), 2);
    assert_eq!(texture.texture.height(), 2);
}

#[test]
#[cfg(feature = "integration-tests")]
fn compiled_meshes_fit_into_gpu_buffers() {
    use flow_model::{
        data_structures::scene::{Node, SceneTree},
        gpu::{GpuMesh, WgpuUploader},
        Model, PipelineSettings,
    };

    use crate::common::test_utils::{MemoryDecoder, textured_scene, triangle};

    let (device, queue) = device();
    let mut scene: SceneTree = textured_scene(&[("wall", "brick")], &[("brick", "brick.png")]);
    scene.add_mesh(triangle("plain", None));
    scene.add_root(Node::with_mesh("plain_node", "plain"));

    let mut model = Model::new(WgpuUploader::new(device, queue), PipelineSettings::default());
    model
        .load_scene(scene, &MemoryDecoder::with_keys(&["brick.png"]))
        .unwrap();
    model.prepare_nodes().unwrap();

    let device = model.textures().uploader().device();
    let wall = GpuMesh::from_compiled(device, model.compiled_for("wall").unwrap());
    assert_eq!(wall.num_elements, 3);
    assert!(wall.uvs.is_some());
    // 3 u16 indices are padded to 8 bytes
    assert_eq!(wall.indices.size(), 8);

    let plain = GpuMesh::from_compiled(device, model.compiled_for("plain_node").unwrap());
    assert!(plain.uvs.is_none());
    assert_eq!(plain.texture, None);
    assert_eq!(GpuMesh::layouts(true).len(), 3);
    assert_eq!(GpuMesh::layouts(false).len(), 2);
}
