use anyhow::Result;
use log::{debug, error, info};
use std::rc::Rc;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

mod core;
mod engine;
mod game;

use crate::core::SystemClock;
use game::{GameConfig, Scene};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Starting Archer Forest...");

    let config = GameConfig::default();

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Archer Forest")
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
        .with_resizable(true)
        .build(&event_loop)?;

    info!("Window created successfully");

    let mut scene = Scene::new(config, Rc::new(SystemClock::new()))?;
    let size = window.inner_size();
    scene.resize(size.width as f32, size.height as f32);

    // Main event loop
    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Close requested, shutting down...");
                scene.shutdown();
                elwt.exit();
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(physical_size),
                ..
            } => {
                let dimensions =
                    scene.resize(physical_size.width as f32, physical_size.height as f32);
                info!("Window resized to {:?} (stage scale {:.3})", physical_size, dimensions.scale);
            }
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { event: key_event, .. },
                ..
            } => {
                // Pause is handled here so it still works while the loop is paused
                if key_event.state == ElementState::Pressed
                    && !key_event.repeat
                    && key_event.physical_key == PhysicalKey::Code(KeyCode::KeyP)
                {
                    scene.toggle_pause();
                }
                scene.keyboard().process_keyboard_event(&key_event);
            }
            Event::WindowEvent {
                event: WindowEvent::Focused(false),
                ..
            } => {
                scene.keyboard().clear();
            }
            Event::WindowEvent {
                event: WindowEvent::RedrawRequested,
                ..
            } => {
                if !scene.is_running() {
                    elwt.exit();
                    return;
                }
                match scene.frame() {
                    Ok(view) => {
                        if view.frame % 300 == 0 {
                            debug!(
                                "frame {}: {:.1} fps, player {:?} at {:?}",
                                view.frame,
                                scene.fps(),
                                view.player.state,
                                view.player.entity.position
                            );
                        }
                    }
                    Err(err) => {
                        error!("Frame failed: {err:#}");
                        scene.shutdown();
                        elwt.exit();
                        return;
                    }
                }
                window.request_redraw();
            }
            Event::AboutToWait => {
                // Request redraw on next frame
                window.request_redraw();
            }
            _ => {}
        }
    }).map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
