//! Native window host (winit + wgpu)
//!
//! Space cycles through sample forecasts, N toggles day/night, Escape quits.

use std::sync::Arc;
use std::time::Instant;

use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::{HostSurface, SAMPLE_FORECASTS};
use crate::config::EngineConfig;
use crate::engine::WeatherFxEngine;
use crate::error::{graphics_unavailable, host_error, EngineResult};
use crate::renderer::{ContextFactory, RenderBackend, WgpuBackend};
use crate::scheduler::{FrameRequest, FrameSource};
use crate::viewport::SurfaceSize;
use crate::weather::{Backdrop, WeatherDescriptor};

const WINDOW_TITLE: &str = "Weather FX";
const WINDOW_SIZE: (f64, f64) = (1280.0, 320.0);

struct WindowSurface {
    window: Arc<Window>,
}

impl HostSurface for WindowSurface {
    fn container_size(&self) -> SurfaceSize {
        let logical = self.window.inner_size().to_logical::<u32>(self.window.scale_factor());
        SurfaceSize::new(logical.width, logical.height)
    }

    fn hide(&mut self) {
        self.window.set_visible(false);
    }

    fn set_backdrop(&mut self, backdrop: Backdrop) {
        self.window
            .set_title(&format!("{} [{}]", WINDOW_TITLE, backdrop.css_class()));
    }
}

/// Redraw requests stand in for animation frames; winit cannot withdraw one, so
/// cancelled tokens are simply left for the scheduler to reject.
struct RedrawFrameSource {
    window: Arc<Window>,
    next: u64,
}

impl FrameSource for RedrawFrameSource {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        self.window.request_redraw();
        FrameRequest(self.next)
    }

    fn cancel_frame(&mut self, _request: FrameRequest) {}
}

/// Creates a wgpu context on the window
pub struct WindowContextFactory {
    window: Arc<Window>,
    clear_color: [f32; 4],
}

impl WindowContextFactory {
    pub fn new(window: Arc<Window>, clear_color: [f32; 4]) -> Self {
        Self { window, clear_color }
    }
}

impl ContextFactory for WindowContextFactory {
    fn create_context(&self, size: SurfaceSize) -> EngineResult<Box<dyn RenderBackend>> {
        let backend = pollster::block_on(WgpuBackend::new(self.window.clone(), size, self.clear_color))?;
        Ok(Box::new(backend))
    }
}

/// Open a window and run the animation until it is closed
pub fn run_native(mut config: EngineConfig, descriptor: Option<String>) -> EngineResult<()> {
    let event_loop = EventLoop::new().map_err(|e| host_error("create_event_loop", e))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_SIZE.0, WINDOW_SIZE.1))
            .with_transparent(true)
            .build(&event_loop)
            .map_err(|e| host_error("create_window", e))?,
    );
    config.pixel_ratio = window.scale_factor() as f32;
    log::info!(
        "[native::run_native] Window created, scale factor {}",
        config.pixel_ratio
    );

    let factory = WindowContextFactory::new(window.clone(), config.clear_color);
    let frames = RedrawFrameSource {
        window: window.clone(),
        next: 0,
    };
    let mut engine = WeatherFxEngine::init_animation(
        config,
        Box::new(WindowSurface {
            window: window.clone(),
        }),
        Box::new(frames),
        &factory,
    );
    if !engine.is_enabled() {
        return Err(graphics_unavailable("animation could not be initialised"));
    }

    let mut forecast = 0;
    let mut daytime = true;
    let text = descriptor.unwrap_or_else(|| SAMPLE_FORECASTS[forecast].to_string());
    engine.set_weather_animation(WeatherDescriptor::new(text, daytime));

    let start = Instant::now();
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(physical) => {
                    let logical = physical.to_logical::<u32>(window.scale_factor());
                    engine.resize(SurfaceSize::new(logical.width, logical.height));
                }
                WindowEvent::KeyboardInput { event, .. }
                    if event.state == ElementState::Pressed && !event.repeat =>
                {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => elwt.exit(),
                        PhysicalKey::Code(KeyCode::Space) => {
                            forecast = (forecast + 1) % SAMPLE_FORECASTS.len();
                            engine.set_weather_animation(WeatherDescriptor::new(
                                SAMPLE_FORECASTS[forecast],
                                daytime,
                            ));
                        }
                        PhysicalKey::Code(KeyCode::KeyN) => {
                            daytime = !daytime;
                            log::info!("[native::run_native] Daytime: {}", daytime);
                            engine.set_weather_animation(WeatherDescriptor::new(
                                SAMPLE_FORECASTS[forecast],
                                daytime,
                            ));
                        }
                        _ => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    engine.pump(start.elapsed());
                }
                _ => {}
            },
            Event::AboutToWait => {
                engine.run_due_timers(start.elapsed());
                match engine.next_timer_due() {
                    Some(due) => elwt.set_control_flow(ControlFlow::WaitUntil(start + due)),
                    None => elwt.set_control_flow(ControlFlow::Wait),
                }
            }
            Event::LoopExiting => {
                if let Some(report) = engine.shutdown() {
                    log::info!("[native::run_native] Shut down: {:?}", report);
                }
            }
            _ => {}
        })
        .map_err(|e| host_error("run_event_loop", e))
}
