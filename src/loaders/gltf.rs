use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use glam::{Mat4, Vec3};
use log::{debug, warn};
use std::collections::HashMap;

/// Axis-aligned bounds in model space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// One drawable piece of a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveInfo {
    pub vertex_count: usize,
    pub index_count: Option<usize>,
    /// Index into the document's materials
    pub material: Option<usize>,
}

/// Node of the parsed asset hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveInfo>,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AssetNode::node_count).sum::<usize>()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
            + self
                .children
                .iter()
                .map(AssetNode::primitive_count)
                .sum::<usize>()
    }
}

/// Parsed asset, ready for a backend to allocate resources from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    pub roots: Vec<AssetNode>,
    pub material_count: usize,
    pub texture_count: usize,
    /// None when the asset has no geometry
    pub bounds: Option<Bounds>,
}

impl LoadedAsset {
    pub fn primitive_count(&self) -> usize {
        self.roots.iter().map(AssetNode::primitive_count).sum()
    }
}

/// Parse a GLB or self-contained glTF document from memory
pub fn load_gltf_slice(bytes: &[u8]) -> Result<LoadedAsset> {
    GltfDocument::from_slice(bytes)?.into_asset(&HashMap::new())
}

/// Parsed glTF document whose external buffers and images may still need fetching
pub struct GltfDocument {
    document: gltf::Document,
    blob: Option<Vec<u8>>,
}

impl GltfDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::from_slice(bytes).context("Failed to parse glTF asset")?;
        Ok(Self { document, blob })
    }

    /// URIs of buffers and images that live outside the document, in
    /// declaration order, without duplicates
    pub fn external_uris(&self) -> Vec<String> {
        let buffers = self.document.buffers().filter_map(|buffer| match buffer.source() {
            gltf::buffer::Source::Uri(uri) => Some(uri),
            gltf::buffer::Source::Bin => None,
        });
        let images = self.document.images().filter_map(|image| match image.source() {
            gltf::image::Source::Uri { uri, .. } => Some(uri),
            gltf::image::Source::View { .. } => None,
        });

        let mut uris: Vec<String> = Vec::new();
        for uri in buffers.chain(images) {
            if data_uri_payload(uri).is_none() && !uris.iter().any(|known| known == uri) {
                uris.push(uri.to_string());
            }
        }
        uris
    }

    /// Build the asset; `external` maps each URI from `external_uris` to its bytes
    pub fn into_asset(self, external: &HashMap<String, Vec<u8>>) -> Result<LoadedAsset> {
        let GltfDocument { document, blob } = self;
        let buffers = resolve_buffers(&document, blob, external)?;

        for image in document.images() {
            if let gltf::image::Source::Uri { uri, .. } = image.source() {
                if data_uri_payload(uri).is_none() && !external.contains_key(uri) {
                    bail!("Image {} was not loaded", uri);
                }
            }
        }

        debug!(
            "glTF parsed: {} scenes, {} nodes, {} meshes, {} materials, {} images",
            document.scenes().count(),
            document.nodes().count(),
            document.meshes().count(),
            document.materials().count(),
            document.images().count()
        );

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("glTF asset contains no scene")?;

        let mut bounds = None;
        let roots = scene
            .nodes()
            .map(|node| process_node(&node, &buffers, &Mat4::IDENTITY, &mut bounds))
            .collect::<Result<Vec<_>>>()?;

        if bounds.is_none() {
            warn!("No geometry found in glTF asset");
        }

        Ok(LoadedAsset {
            roots,
            material_count: document.materials().count(),
            texture_count: document.images().count(),
            bounds,
        })
    }
}

fn resolve_buffers(
    document: &gltf::Document,
    mut blob: Option<Vec<u8>>,
    external: &HashMap<String, Vec<u8>>,
) -> Result<Vec<gltf::buffer::Data>> {
    let mut buffers = Vec::new();

    for buffer in document.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .take()
                .context("GLB binary chunk is missing")?,
            gltf::buffer::Source::Uri(uri) => match data_uri_payload(uri) {
                Some(encoded) => STANDARD
                    .decode(encoded)
                    .with_context(|| format!("Buffer {} has invalid base64 data", buffer.index()))?,
                None => external
                    .get(uri)
                    .cloned()
                    .with_context(|| format!("Buffer {} was not loaded", uri))?,
            },
        };

        if data.len() < buffer.length() {
            bail!(
                "Buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }
        buffers.push(gltf::buffer::Data(data));
    }

    Ok(buffers)
}

/// Base64 payload of a `data:...;base64,` URI
fn data_uri_payload(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix("data:")?;
    rest.split_once(";base64,").map(|(_, payload)| payload)
}

/// Recursively processes glTF nodes
fn process_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: &Mat4,
    bounds: &mut Option<Bounds>,
) -> Result<AssetNode> {
    let local_transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let global_transform = *parent_transform * local_transform;

    let primitives = match node.mesh() {
        Some(mesh) => process_mesh(&mesh, buffers, &global_transform, bounds)?,
        None => Vec::new(),
    };

    let children = node
        .children()
        .map(|child| process_node(&child, buffers, &global_transform, bounds))
        .collect::<Result<Vec<_>>>()?;

    Ok(AssetNode {
        name: node.name().map(str::to_string),
        primitives,
        children,
    })
}

fn process_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    transform: &Mat4,
    bounds: &mut Option<Bounds>,
) -> Result<Vec<PrimitiveInfo>> {
    let mut primitives = Vec::new();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

        let vertices: Vec<Vec3> = reader
            .read_positions()
            .with_context(|| format!("Mesh {:?} primitive has no positions", mesh.name()))?
            .map(|pos| transform.transform_point3(Vec3::from_array(pos)))
            .collect();

        if let Some(primitive_bounds) = compute_mesh_bounds(&vertices) {
            *bounds = Some(match *bounds {
                Some(existing) => existing.union(primitive_bounds),
                None => primitive_bounds,
            });
        }

        primitives.push(PrimitiveInfo {
            vertex_count: vertices.len(),
            index_count: reader.read_indices().map(|indices| indices.into_u32().count()),
            material: primitive.material().index(),
        });
    }

    Ok(primitives)
}

/// Computes overall bounding box for vertices
pub fn compute_mesh_bounds(vertices: &[Vec3]) -> Option<Bounds> {
    let (first, rest) = vertices.split_first()?;
    let mut min = *first;
    let mut max = *first;

    for &vertex in rest {
        min = min.min(vertex);
        max = max.max(vertex);
    }

    Some(Bounds { min, max })
}
