pub mod engine;
pub mod terrain;
mod game;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{WebGlRenderingContext, HtmlCanvasElement, KeyboardEvent, Request, RequestInit, RequestMode, Response, Window};
use std::cell::RefCell;
use std::rc::Rc;
use crate::engine::renderer::Renderer;
use crate::game::{Game, AppConfig};
use crate::game::input::KeyboardState;

pub use crate::terrain::height_at;

thread_local! {
    static GAME: RefCell<Option<Game>> = RefCell::new(None);
    static KEYBOARD: RefCell<KeyboardState> = RefCell::new(KeyboardState::new());
}

#[wasm_bindgen]
pub async fn init_game() -> Result<(), JsValue> {
    init_logging();

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("glCanvas")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_width(window.inner_width()?.as_f64().unwrap_or(800.0) as u32);
    canvas.set_height(window.inner_height()?.as_f64().unwrap_or(600.0) as u32);

    let gl = match canvas.get_context("webgl")? {
        Some(context) => context.dyn_into::<WebGlRenderingContext>()?,
        None => {
            log::error!("WebGL context unavailable");
            window.alert_with_message("WebGL is not available").ok();
            return Err(JsValue::from_str("No WebGL"));
        }
    };

    let renderer = Renderer::new(gl)?;
    let config = fetch_config(&window).await;
    match serde_json::to_string(&config) {
        Ok(json) => log::debug!("config: {}", json),
        Err(e) => log::debug!("config not printable: {}", e),
    }

    let game = Game::new(renderer, config)?;
    GAME.with(|g| *g.borrow_mut() = Some(game));

    // Input handling
    let keydown = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        let key = event.key();
        if key == "r" || key == "R" {
            touch_restart();
            return;
        }
        let handled = KEYBOARD.with(|k| k.borrow_mut().key_down(&key));
        if handled {
            event.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
    keydown.forget();

    let keyup = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        KEYBOARD.with(|k| k.borrow_mut().key_up(&event.key()));
    }) as Box<dyn FnMut(_)>);
    window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
    keyup.forget();

    let blur = Closure::wrap(Box::new(move || {
        KEYBOARD.with(|k| k.borrow_mut().release_all());
    }) as Box<dyn FnMut()>);
    window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
    blur.forget();

    // Game loop
    let f = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let input = KEYBOARD.with(|k| k.borrow().snapshot());
        GAME.with(|game| {
            if let Some(game) = game.borrow_mut().as_mut() {
                game.update(&input);
                game.render();

                update_hud(game.vehicle.speed, game.vehicle.x, game.vehicle.z);
            }
        });
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback);
    }

    Ok(())
}

fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        if console_log::init_with_level(log::Level::Info).is_err() {
            // Already initialised by an earlier call
            log::debug!("logger already set");
        }
    }
}

/// Reads `/assets/config.json`; anything missing, malformed or out of range falls back to defaults.
async fn fetch_config(window: &Window) -> AppConfig {
    match try_fetch_config(window).await {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("using default config, rejected /assets/config.json: {}", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("using default config: {:?}", e);
            AppConfig::default()
        }
    }
}

async fn try_fetch_config(window: &Window) -> Result<AppConfig, JsValue> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init("/assets/config.json", &opts)?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request)).await?.dyn_into()?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("config request failed: {}", resp.status())));
    }

    let json = JsFuture::from(resp.json()?).await?;
    serde_wasm_bindgen::from_value(json).map_err(JsValue::from)
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    let scheduled = web_sys::window()
        .ok_or_else(|| JsValue::from_str("No window"))
        .and_then(|w| w.request_animation_frame(f.as_ref().unchecked_ref()));
    if let Err(e) = scheduled {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
}

fn update_hud(speed: f32, x: f32, z: f32) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let Some(hud) = document.get_element_by_id("hud") {
                hud.set_inner_html(&format!("Speed: {:.1} | Position: {:.0}, {:.0}", speed * 60.0, x, z));
            }
        }
    }
}

#[wasm_bindgen]
pub fn touch_restart() {
    GAME.with(|g| {
        if let Some(game) = g.borrow_mut().as_mut() {
            game.restart();
        }
    });
    KEYBOARD.with(|k| k.borrow_mut().release_all());
}
