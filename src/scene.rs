use anyhow::Context;
use futures::future::{FutureExt, LocalBoxFuture};
use glam::{Mat4, Vec3};
use log::{debug, trace, warn};
use reqwest::Url;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::loaders::{AssetNode, Bounds, GltfDocument, LoadedAsset};
use crate::traits::{DocumentFetcher, RenderBackend};

pub type ResourceId = u64;
pub type ModelId = u64;

/// Kind of GPU-side allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VertexBuffer,
    IndexBuffer,
    Material,
    Texture,
}

/// Book-keeping for every live GPU resource
#[derive(Debug, Default)]
pub struct ResourceTracker {
    next_id: ResourceId,
    live: HashMap<ResourceId, ResourceKind>,
}

impl ResourceTracker {
    pub fn allocate(&mut self, kind: ResourceKind) -> ResourceId {
        self.next_id += 1;
        self.live.insert(self.next_id, kind);
        self.next_id
    }

    /// Returns false if the resource was not live
    pub fn release(&mut self, id: ResourceId) -> bool {
        let released = self.live.remove(&id).is_some();
        if !released {
            warn!("Release of unknown resource {}", id);
        }
        released
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|&&k| k == kind).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Mesh { buffers: Vec<ResourceId> },
}

/// Node of a loaded model's hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    fn allocate(asset: &AssetNode, resources: &mut ResourceTracker) -> Self {
        let kind = if asset.primitives.is_empty() {
            NodeKind::Group
        } else {
            let mut buffers = Vec::new();
            for primitive in &asset.primitives {
                buffers.push(resources.allocate(ResourceKind::VertexBuffer));
                if primitive.index_count.is_some() {
                    buffers.push(resources.allocate(ResourceKind::IndexBuffer));
                }
            }
            NodeKind::Mesh { buffers }
        };

        Self {
            name: asset.name.clone(),
            kind,
            children: asset
                .children
                .iter()
                .map(|child| SceneNode::allocate(child, resources))
                .collect(),
        }
    }

    /// True when this node holds geometry buffers that must be released
    pub fn owns_gpu_resources(&self) -> bool {
        matches!(&self.kind, NodeKind::Mesh { buffers } if !buffers.is_empty())
    }

    /// Depth-first walk over this subtree
    pub fn visit(&self, f: &mut impl FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// One loaded asset and the resources allocated for it
#[derive(Debug)]
pub struct SceneModel {
    id: ModelId,
    url: Url,
    nodes: Vec<SceneNode>,
    materials: Vec<ResourceId>,
    textures: Vec<ResourceId>,
    bounds: Option<Bounds>,
}

impl SceneModel {
    fn allocate(id: ModelId, url: Url, asset: &LoadedAsset, resources: &mut ResourceTracker) -> Self {
        let nodes = asset
            .roots
            .iter()
            .map(|node| SceneNode::allocate(node, resources))
            .collect();
        let materials = (0..asset.material_count)
            .map(|_| resources.allocate(ResourceKind::Material))
            .collect();
        let textures = (0..asset.texture_count)
            .map(|_| resources.allocate(ResourceKind::Texture))
            .collect();

        Self {
            id,
            url,
            nodes,
            materials,
            textures,
            bounds: asset.bounds,
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}

/// Placement of a model in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub rotation_y: f32,
    pub scale: f32,
    pub position: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            rotation_y: 0.0,
            scale: 1.0,
            position: Vec3::ZERO,
        }
    }
}

impl ModelTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.rotation_y)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// Perspective camera the scene is drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub world: Mat4,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            world: Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
            fov_y_radians: 90f32.to_radians(),
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

impl CameraRig {
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        self.world.inverse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSurface {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

/// Scene-graph rendering backend without a GPU
///
/// Loads glTF/GLB assets through a fetcher, tracks every allocation and
/// counts draws, so scene state and leaks can be observed directly.
pub struct SceneGraph {
    fetcher: Rc<dyn DocumentFetcher>,
    resources: Rc<RefCell<ResourceTracker>>,
    next_model: Rc<Cell<ModelId>>,
    visible: Vec<ModelId>,
    transforms: HashMap<ModelId, ModelTransform>,
    camera: CameraRig,
    output: OutputSurface,
    frames: u64,
}

impl SceneGraph {
    pub fn new(fetcher: Rc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            resources: Rc::new(RefCell::new(ResourceTracker::default())),
            next_model: Rc::new(Cell::new(0)),
            visible: Vec::new(),
            transforms: HashMap::new(),
            camera: CameraRig::default(),
            output: OutputSurface {
                width: 0,
                height: 0,
                pixel_ratio: 1.0,
            },
            frames: 0,
        }
    }

    pub fn visible_models(&self) -> &[ModelId] {
        &self.visible
    }

    pub fn transform(&self, model: ModelId) -> Option<ModelTransform> {
        self.transforms.get(&model).copied()
    }

    pub fn live_resources(&self) -> usize {
        self.resources.borrow().live_count()
    }

    pub fn live_resources_of(&self, kind: ResourceKind) -> usize {
        self.resources.borrow().live_count_of(kind)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn output(&self) -> OutputSurface {
        self.output
    }
}

impl RenderBackend for SceneGraph {
    type Model = SceneModel;

    fn load_asset(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<SceneModel>> {
        let fetcher = Rc::clone(&self.fetcher);
        let resources = Rc::clone(&self.resources);
        let next_model = Rc::clone(&self.next_model);
        let url = url.clone();

        async move {
            let bytes = fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch asset {}", url))?;
            let document = GltfDocument::from_slice(&bytes)
                .with_context(|| format!("Failed to parse asset {}", url))?;

            // Sibling .bin and image files resolve against the asset URL
            let mut external = HashMap::new();
            for uri in document.external_uris() {
                let resource_url = url
                    .join(&uri)
                    .with_context(|| format!("Invalid resource URI {} in {}", uri, url))?;
                let data = fetcher
                    .fetch(&resource_url)
                    .await
                    .with_context(|| format!("Failed to fetch resource {}", resource_url))?;
                trace!("Fetched {} bytes for {}", data.len(), resource_url);
                external.insert(uri, data);
            }

            let asset = document
                .into_asset(&external)
                .with_context(|| format!("Failed to parse asset {}", url))?;

            let id = next_model.get() + 1;
            next_model.set(id);
            let model = SceneModel::allocate(id, url, &asset, &mut resources.borrow_mut());
            debug!(
                "Model {} loaded from {}: {} primitives, {} materials, {} textures, {} external resources",
                id,
                model.url,
                asset.primitive_count(),
                asset.material_count,
                asset.texture_count,
                external.len()
            );
            Ok(model)
        }
        .boxed_local()
    }

    fn add_to_scene(&mut self, model: &SceneModel) {
        if !self.visible.contains(&model.id) {
            self.visible.push(model.id);
        }
    }

    fn remove_from_scene(&mut self, model: &SceneModel) {
        self.visible.retain(|&id| id != model.id);
    }

    fn dispose_resources(&mut self, model: SceneModel) {
        if self.visible.contains(&model.id) {
            warn!("Disposing model {} while still in the scene", model.id);
            self.visible.retain(|&id| id != model.id);
        }

        let mut resources = self.resources.borrow_mut();
        let mut released = 0;
        for root in &model.nodes {
            root.visit(&mut |node| {
                if !node.owns_gpu_resources() {
                    return;
                }
                if let NodeKind::Mesh { buffers } = &node.kind {
                    for &id in buffers {
                        if resources.release(id) {
                            released += 1;
                        }
                    }
                }
            });
        }
        for &id in model.materials.iter().chain(&model.textures) {
            if resources.release(id) {
                released += 1;
            }
        }

        self.transforms.remove(&model.id);
        debug!("Model {} disposed, {} resources released", model.id, released);
    }

    fn set_rotation_y(&mut self, model: &SceneModel, angle: f32) {
        self.transforms.entry(model.id).or_default().rotation_y = angle;
    }

    fn set_world_transform(&mut self, model: &SceneModel, scale: f32, position: Vec3) {
        let transform = self.transforms.entry(model.id).or_default();
        transform.scale = scale;
        transform.position = position;
    }

    fn camera_world_transform(&self) -> Mat4 {
        self.camera.world
    }

    fn render(&mut self) {
        self.frames += 1;
        trace!(
            "Frame {}: {} models at {}x{}",
            self.frames,
            self.visible.len(),
            self.output.width,
            self.output.height
        );
    }

    fn set_projection_aspect(&mut self, aspect: f32) {
        self.camera.aspect = aspect;
    }

    fn set_output_size(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.output = OutputSurface {
            width,
            height,
            pixel_ratio,
        };
    }
}
