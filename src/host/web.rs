//! Browser host (wasm32, feature `web`)
//!
//! Exports `initAnimation(canvasId)` and `setWeatherAnimation(text, isDaytime)`.
//! The wgpu context is created asynchronously, so descriptors that arrive before
//! init completes are held and applied afterwards.

use std::cell::RefCell;
use std::time::Duration;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlCanvasElement};

use super::HostSurface;
use crate::config::EngineConfig;
use crate::engine::WeatherFxEngine;
use crate::error::{graphics_unavailable, EngineResult};
use crate::renderer::{ContextFactory, RenderBackend, WgpuBackend};
use crate::scheduler::{FrameRequest, FrameSource};
use crate::viewport::SurfaceSize;
use crate::weather::{Backdrop, WeatherDescriptor};

/// How often due timers are pumped between animation frames
const TIMER_PUMP_MS: i32 = 10;

thread_local! {
    static ENGINE: RefCell<Option<WeatherFxEngine>> = RefCell::new(None);
    static PENDING: RefCell<Option<WeatherDescriptor>> = RefCell::new(None);
}

fn now() -> Duration {
    let millis = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    Duration::from_secs_f64(millis.max(0.0) / 1000.0)
}

fn with_engine<R>(f: impl FnOnce(&mut WeatherFxEngine) -> R) -> Option<R> {
    ENGINE.with(|engine| engine.try_borrow_mut().ok()?.as_mut().map(f))
}

struct CanvasSurface {
    canvas: HtmlCanvasElement,
    container: Option<Element>,
}

impl HostSurface for CanvasSurface {
    fn container_size(&self) -> SurfaceSize {
        match &self.container {
            Some(container) => SurfaceSize::new(
                container.client_width().max(0) as u32,
                container.client_height().max(0) as u32,
            ),
            None => SurfaceSize::new(self.canvas.width(), self.canvas.height()),
        }
    }

    fn hide(&mut self) {
        if let Err(e) = self.canvas.style().set_property("display", "none") {
            log::warn!("[CanvasSurface::hide] Could not hide canvas: {:?}", e);
        }
    }

    fn set_backdrop(&mut self, backdrop: Backdrop) {
        let Some(container) = &self.container else {
            return;
        };
        let classes = container.class_list();
        let stale: Vec<String> = (0..classes.length())
            .filter_map(|i| classes.item(i))
            .filter(|c| c.starts_with("weather-"))
            .collect();
        for class in stale {
            if let Err(e) = classes.remove_1(&class) {
                log::warn!("[CanvasSurface::set_backdrop] Could not remove class {}: {:?}", class, e);
            }
        }
        if let Err(e) = classes.add_1(&backdrop.css_class()) {
            log::warn!("[CanvasSurface::set_backdrop] Could not set class: {:?}", e);
        }
    }
}

/// `requestAnimationFrame` as a frame source
#[derive(Default)]
struct AnimationFrameSource {
    next: u64,
    outstanding: Option<(FrameRequest, i32)>,
}

impl FrameSource for AnimationFrameSource {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        let callback = Closure::once_into_js(move |timestamp: f64| {
            let now = Duration::from_secs_f64(timestamp.max(0.0) / 1000.0);
            with_engine(|engine| engine.on_frame(request, now));
        });
        match web_sys::window().map(|w| w.request_animation_frame(callback.unchecked_ref())) {
            Some(Ok(handle)) => self.outstanding = Some((request, handle)),
            _ => log::error!("[AnimationFrameSource::request_frame] requestAnimationFrame failed"),
        }
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Some((outstanding, handle)) = self.outstanding {
            if outstanding == request {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(handle);
                }
                self.outstanding = None;
            }
        }
    }
}

/// Hands over a backend that was created before the engine asked for it
struct PreparedContext {
    backend: RefCell<Option<EngineResult<WgpuBackend>>>,
}

impl ContextFactory for PreparedContext {
    fn create_context(&self, size: SurfaceSize) -> EngineResult<Box<dyn RenderBackend>> {
        let prepared = self
            .backend
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(graphics_unavailable("context already handed out")));
        let mut backend = prepared?;
        backend.resize(size);
        Ok(Box::new(backend))
    }
}

fn find_canvas(canvas_id: &str) -> Option<HtmlCanvasElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(canvas_id)?
        .dyn_into::<HtmlCanvasElement>()
        .ok()
}

fn install_listeners() {
    let Some(window) = web_sys::window() else {
        return;
    };

    let on_resize = Closure::<dyn FnMut()>::new(|| {
        with_engine(|engine| engine.sync_size());
    });
    if window
        .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        .is_err()
    {
        log::warn!("[web::install_listeners] Could not register resize listener");
    }
    on_resize.forget();

    let pump_timers = Closure::<dyn FnMut()>::new(|| {
        with_engine(|engine| engine.run_due_timers(now()));
    });
    if window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            pump_timers.as_ref().unchecked_ref(),
            TIMER_PUMP_MS,
        )
        .is_err()
    {
        log::warn!("[web::install_listeners] Could not start timer pump");
    }
    pump_timers.forget();
}

/// Initialise the animation on the canvas with id `canvas_id`
#[wasm_bindgen(js_name = initAnimation)]
pub fn init_animation(canvas_id: &str) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let Some(canvas) = find_canvas(canvas_id) else {
        log::error!("[web::init_animation] No canvas with id '{}'", canvas_id);
        return;
    };

    wasm_bindgen_futures::spawn_local(async move {
        let config = EngineConfig {
            pixel_ratio: web_sys::window()
                .map(|w| w.device_pixel_ratio() as f32)
                .unwrap_or(1.0),
            ..EngineConfig::default()
        };
        let mut surface = CanvasSurface {
            container: canvas.parent_element(),
            canvas: canvas.clone(),
        };
        let physical = surface.container_size().to_physical(config.pixel_ratio);

        let prepared = WgpuBackend::new(
            wgpu::SurfaceTarget::Canvas(canvas),
            physical,
            config.clear_color,
        )
        .await;
        if let Err(e) = &prepared {
            log::error!("[web::init_animation] WebGL context unavailable: {}", e);
            surface.hide();
            return;
        }
        let factory = PreparedContext {
            backend: RefCell::new(Some(prepared)),
        };

        let mut engine = WeatherFxEngine::init_animation(
            config,
            Box::new(surface),
            Box::new(AnimationFrameSource::default()),
            &factory,
        );
        if let Some(descriptor) = PENDING.with(|pending| pending.borrow_mut().take()) {
            engine.set_weather_animation(descriptor);
        }
        let enabled = engine.is_enabled();
        ENGINE.with(|slot| *slot.borrow_mut() = Some(engine));
        if enabled {
            install_listeners();
        }
    });
}

/// Switch the animation to the weather described by `text`
#[wasm_bindgen(js_name = setWeatherAnimation)]
pub fn set_weather_animation(text: Option<String>, is_daytime: Option<bool>) {
    let descriptor = WeatherDescriptor {
        text,
        is_daytime: is_daytime.unwrap_or(true),
        force_default: false,
    };
    let handed = ENGINE.with(|slot| match slot.try_borrow_mut() {
        Ok(mut slot) => match slot.as_mut() {
            Some(engine) => {
                engine.set_weather_animation(descriptor.clone());
                true
            }
            None => false,
        },
        Err(_) => false,
    });
    if !handed {
        log::debug!("[web::set_weather_animation] Engine not ready, holding {:?}", descriptor.text);
        PENDING.with(|pending| *pending.borrow_mut() = Some(descriptor));
    }
}
