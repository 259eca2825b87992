use anyhow::Result;
use clap::Parser;
use std::rc::Rc;
use winit::event_loop::EventLoop;

use qr_model_viewer::app::{run_headless, App, Viewer};
use qr_model_viewer::cli::Cli;
use qr_model_viewer::decoder::{ScriptedDecoder, SimulatedCamera, StdinDecoder};
use qr_model_viewer::http::HttpFetcher;
use qr_model_viewer::traits::{CameraProvider, QrDecoder};

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let config = cli.viewer_config()?;
    let fetcher = Rc::new(HttpFetcher::new(config.fetch_timeout())?);

    let (decoder, source): (Box<dyn QrDecoder>, &str) = if cli.payloads.is_empty() {
        (Box::new(StdinDecoder::new()), "stdin")
    } else {
        (Box::new(ScriptedDecoder::new(cli.payloads.clone())), "scripted")
    };
    let camera: Box<dyn CameraProvider> = if cli.no_camera {
        Box::new(SimulatedCamera::unavailable())
    } else {
        Box::new(SimulatedCamera::new(source))
    };

    let mut viewer = Viewer::new(&config, fetcher, decoder)?;

    if let Some(frames) = cli.headless {
        return run_headless(&mut viewer, camera, frames);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(viewer, camera);

    println!("QR Model Viewer - drag to rotate, Escape to quit");
    if source == "stdin" {
        println!("Paste decoded QR payloads, one per line");
    }
    event_loop.run_app(&mut app)?;

    Ok(())
}
