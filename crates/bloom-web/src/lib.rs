//! WASM bridge for the bloom stage.
//!
//! wasm-bindgen cannot export a struct holding `Rc`s and trait objects, so one
//! [`StageRunner`] lives in a `thread_local!` and every export is a free function
//! over it. Calls made before `stage_init` are ignored.

pub mod bridge;
pub mod runner;

use std::cell::RefCell;

use bloom_engine::{InputEvent, Target, Viewport};
use wasm_bindgen::prelude::*;

pub use runner::{surface, PageLayout, StageRunner, UNLOCK_CANVAS_SIZE};

thread_local! {
    static RUNNER: RefCell<Option<StageRunner>> = const { RefCell::new(None) };
}

fn with_runner<R>(f: impl FnOnce(&mut StageRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::warn!("stage not initialized; call stage_init() first");
                None
            }
        }
    })
}

fn push(target: u32, time_ms: f64, make: impl FnOnce(Target) -> InputEvent) {
    let Some(target) = Target::from_code(target) else {
        log::warn!("unknown input target {target}");
        return;
    };
    with_runner(|r| r.push_input(make(target), time_ms));
}

/// Create the stage. `config_json` may be empty; `surfaces` is a `surface::*` bit set.
#[wasm_bindgen]
pub fn stage_init(
    config_json: &str,
    width: f32,
    height: f32,
    dpr: f32,
    surfaces: u32,
    pollen_width: f32,
    pollen_height: f32,
) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let layout = PageLayout {
        viewport: Viewport::new(width, height, dpr),
        surfaces,
        pollen: bloom_engine::Canvas::new(pollen_width, pollen_height),
    };
    let runner = StageRunner::new(config_json, layout);
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("bloom: initialized ({}x{} @{})", width, height, dpr);
}

#[wasm_bindgen]
pub fn stage_start(now_ms: f64) {
    with_runner(|r| r.start(now_ms));
}

#[wasm_bindgen]
pub fn stage_tick(now_ms: f64) {
    with_runner(|r| r.tick(now_ms));
}

// ---- Input ----

#[wasm_bindgen]
pub fn stage_pointer_down(target: u32, x: f32, y: f32, time_ms: f64) {
    push(target, time_ms, |target| InputEvent::PointerDown { target, x, y });
}

#[wasm_bindgen]
pub fn stage_pointer_move(target: u32, x: f32, y: f32, time_ms: f64) {
    push(target, time_ms, |target| InputEvent::PointerMove { target, x, y });
}

#[wasm_bindgen]
pub fn stage_pointer_up(target: u32, x: f32, y: f32, time_ms: f64) {
    push(target, time_ms, |target| InputEvent::PointerUp { target, x, y });
}

#[wasm_bindgen]
pub fn stage_pointer_leave(target: u32, time_ms: f64) {
    push(target, time_ms, |target| InputEvent::PointerLeave { target });
}

#[wasm_bindgen]
pub fn stage_pointer_cancel(target: u32, time_ms: f64) {
    push(target, time_ms, |target| InputEvent::PointerCancel { target });
}

#[wasm_bindgen]
pub fn stage_click(target: u32, time_ms: f64) {
    push(target, time_ms, |target| InputEvent::Click { target });
}

#[wasm_bindgen]
pub fn stage_resize(width: f32, height: f32, dpr: f32, time_ms: f64) {
    with_runner(|r| r.push_input(InputEvent::Resize { width, height, dpr }, time_ms));
}

/// The bouquet container was laid out again.
#[wasm_bindgen]
pub fn stage_resize_bouquet(width: f32, height: f32, time_ms: f64) {
    with_runner(|r| r.push_input(InputEvent::BouquetResize { width, height }, time_ms));
}

/// The host finished the animation requested by a PLAY event.
#[wasm_bindgen]
pub fn stage_animation_complete(kind: u32) {
    with_runner(|r| r.animation_complete(kind));
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn stage_phase() -> u32 {
    with_runner(|r| r.phase().code()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_dots_ptr() -> *const f32 {
    with_runner(|r| r.dots_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_dot_count() -> u32 {
    with_runner(|r| r.dot_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_links_ptr() -> *const f32 {
    with_runner(|r| r.links_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_link_count() -> u32 {
    with_runner(|r| r.link_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_events_ptr() -> *const f32 {
    with_runner(|r| r.events_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_event_count() -> u32 {
    with_runner(|r| r.event_count()).unwrap_or(0)
}

/// Copy of this frame's events, for hosts that do not read linear memory.
#[wasm_bindgen]
pub fn get_events() -> js_sys::Float32Array {
    with_runner(|r| js_sys::Float32Array::from(bloom_engine::StageEvent::floats(r.events())))
        .unwrap_or_else(|| js_sys::Float32Array::new_with_length(0))
}

#[wasm_bindgen]
pub fn get_seal_ptr() -> *const f32 {
    with_runner(|r| r.seal_ptr()).unwrap_or(std::ptr::null())
}
