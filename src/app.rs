use anyhow::{Context, Result};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use log::{error, info};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::ViewerConfig;
use crate::core::{
    ContentResolver, InteractionStateMachine, PlacementPolicy, PointerInputAdapter,
    RenderScheduler, ScanOptions, ScanOrchestrator, SceneModelManager, ViewportBinder,
};
use crate::presentation::LogPresenter;
use crate::scene::SceneGraph;
use crate::traits::{
    CameraProvider, DocumentFetcher, PresentationSink, QrDecoder, WindowContext, WindowDimensions,
};

// === Constants ===

const INITIAL_WINDOW_WIDTH: u32 = 800;
const INITIAL_WINDOW_HEIGHT: u32 = 600;
const HEADLESS_FRAME_INTERVAL: Duration = Duration::from_millis(16);

impl WindowContext for Window {
    fn dimensions(&self) -> WindowDimensions {
        let size = self.inner_size();
        WindowDimensions::new(size.width, size.height)
    }

    fn scale_factor(&self) -> f64 {
        Window::scale_factor(self)
    }

    fn request_redraw(&self) {
        Window::request_redraw(self)
    }
}

/// Fixed-size surface for running without a window
#[derive(Debug)]
pub struct HeadlessSurface {
    dims: WindowDimensions,
    redraw_requested: Cell<bool>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: WindowDimensions::new(width, height),
            redraw_requested: Cell::new(false),
        }
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&self) -> bool {
        self.redraw_requested.replace(false)
    }
}

impl WindowContext for HeadlessSurface {
    fn dimensions(&self) -> WindowDimensions {
        self.dims
    }

    fn scale_factor(&self) -> f64 {
        1.0
    }

    fn request_redraw(&self) {
        self.redraw_requested.set(true);
    }
}

/// All viewer components wired onto one cooperative pool
pub struct Viewer {
    backend: Rc<RefCell<SceneGraph>>,
    scenes: SceneModelManager<SceneGraph>,
    interaction: Rc<RefCell<InteractionStateMachine>>,
    scheduler: RenderScheduler<SceneGraph>,
    viewport: ViewportBinder<SceneGraph>,
    orchestrator: Rc<ScanOrchestrator<SceneGraph>>,
    presenter: Rc<LogPresenter>,
    input: PointerInputAdapter,
    pool: LocalPool,
}

impl Viewer {
    pub fn new(
        config: &ViewerConfig,
        fetcher: Rc<dyn DocumentFetcher>,
        decoder: Box<dyn QrDecoder>,
    ) -> Result<Self> {
        let backend = Rc::new(RefCell::new(SceneGraph::new(Rc::clone(&fetcher))));
        let scenes = SceneModelManager::new(Rc::clone(&backend), PlacementPolicy::from(config));
        let interaction = Rc::new(RefCell::new(InteractionStateMachine::new(
            config.drag_sensitivity,
        )));
        let scheduler = RenderScheduler::new(
            Rc::clone(&backend),
            scenes.clone(),
            Rc::clone(&interaction),
            config.auto_rotate_step,
        );
        let viewport = ViewportBinder::new(Rc::clone(&backend));

        let presenter = Rc::new(LogPresenter::new());
        let resolver = ContentResolver::new(config.base_url()?, fetcher);
        let sink: Rc<dyn PresentationSink> = presenter.clone();
        let orchestrator = Rc::new(ScanOrchestrator::new(
            resolver,
            scenes.clone(),
            sink,
            decoder,
            ScanOptions::from(config),
        ));

        Ok(Self {
            backend,
            scenes,
            interaction,
            scheduler,
            viewport,
            orchestrator,
            presenter,
            input: PointerInputAdapter::new(),
            pool: LocalPool::new(),
        })
    }

    /// Spawn the scan loop onto the pool
    pub fn start_scanning(&mut self, mut camera: Box<dyn CameraProvider>) -> Result<()> {
        let orchestrator = Rc::clone(&self.orchestrator);
        self.pool
            .spawner()
            .spawn_local(async move {
                if let Err(err) = orchestrator.run(camera.as_mut()).await {
                    error!("Scanning disabled: {}", err);
                }
            })
            .context("Failed to spawn scan task")
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let Some(pointer) = self.input.process_event(event) {
            self.interaction.borrow_mut().handle(pointer);
        }
    }

    pub fn resize(&mut self, window: &dyn WindowContext) {
        self.viewport.on_resize(window);
    }

    /// Drain ready work, then draw one frame
    pub fn frame(&mut self, window: &dyn WindowContext) {
        self.pool.run_until_stalled();
        self.orchestrator.refresh_loading();
        self.scheduler.tick(window);
    }

    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        self.orchestrator.stop();
        self.pool.run_until_stalled();
        self.scenes.teardown();
        info!(
            "Viewer shut down after {} frames, {} resources still live",
            self.scheduler.frame_count(),
            self.backend.borrow().live_resources()
        );
    }

    pub fn title(&self) -> String {
        format!("QR Model Viewer - {}", self.presenter.state().summary())
    }

    pub fn presenter(&self) -> &LogPresenter {
        &self.presenter
    }

    pub fn backend(&self) -> &Rc<RefCell<SceneGraph>> {
        &self.backend
    }
}

/// Run for a fixed number of frames against a fixed-size surface
pub fn run_headless(viewer: &mut Viewer, camera: Box<dyn CameraProvider>, frames: u64) -> Result<()> {
    let surface = HeadlessSurface::new(INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT);
    viewer.resize(&surface);
    viewer.start_scanning(camera)?;

    surface.request_redraw();
    for _ in 0..frames {
        if !surface.take_redraw() {
            break;
        }
        viewer.frame(&surface);
        std::thread::sleep(HEADLESS_FRAME_INTERVAL);
    }

    info!("{}", viewer.title());
    viewer.shutdown();
    Ok(())
}

/// Winit host
pub struct App {
    viewer: Viewer,
    camera: Option<Box<dyn CameraProvider>>,
    window: Option<Arc<Window>>,
    title: String,
}

impl App {
    pub fn new(viewer: Viewer, camera: Box<dyn CameraProvider>) -> Self {
        Self {
            viewer,
            camera: Some(camera),
            window: None,
            title: String::new(),
        }
    }

    fn update_title(&mut self) {
        let title = self.viewer.title();
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("QR Model Viewer")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.viewer.resize(window.as_ref());
        if let Some(camera) = self.camera.take() {
            if let Err(e) = self.viewer.start_scanning(camera) {
                error!("{:#}", e);
            }
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.viewer.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.viewer.resize(window.as_ref());
            }
            WindowEvent::RedrawRequested => {
                self.viewer.frame(window.as_ref());
                self.update_title();
            }
            other => self.viewer.handle_window_event(&other),
        }
    }
}
