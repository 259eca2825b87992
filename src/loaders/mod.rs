pub mod gltf;

pub use self::gltf::{
    compute_mesh_bounds, load_gltf_slice, AssetNode, Bounds, GltfDocument, LoadedAsset,
    PrimitiveInfo,
};
