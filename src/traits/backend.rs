use futures::future::LocalBoxFuture;
use glam::{Mat4, Vec3};
use reqwest::Url;

/// Rendering backend - owns the scene, the camera and every GPU resource
///
/// The scene and camera are created with the backend, so `render` draws
/// whatever was added through `add_to_scene` from the backend's camera.
pub trait RenderBackend {
    /// Handle for one loaded asset and all resources allocated for it
    type Model;

    /// Start loading an asset. The returned future does not borrow the backend.
    fn load_asset(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<Self::Model>>;

    /// Make a loaded model visible
    fn add_to_scene(&mut self, model: &Self::Model);

    /// Hide a model without releasing its resources
    fn remove_from_scene(&mut self, model: &Self::Model);

    /// Release every resource the model owns. Consumes the handle.
    fn dispose_resources(&mut self, model: Self::Model);

    /// Set the model's rotation around the Y axis in radians
    fn set_rotation_y(&mut self, model: &Self::Model, angle: f32);

    /// Set uniform scale and world position
    fn set_world_transform(&mut self, model: &Self::Model, scale: f32, position: Vec3);

    /// Current world transform of the camera
    fn camera_world_transform(&self) -> Mat4;

    /// Draw one frame
    fn render(&mut self);

    fn set_projection_aspect(&mut self, aspect: f32);

    fn set_output_size(&mut self, width: u32, height: u32, pixel_ratio: f64);
}
