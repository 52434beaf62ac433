//! Browser bindings: the page's widgets call these exports, frames come back
//! to JS callbacks as JSON strings.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use catalog::{DatasetCatalog, ScaleKind};
use foundation::{Rgb, Year};
use gloo_net::http::Request;
use layers::{CorrelationFrame, Legend, MapFrame, Presenter, RankingFrame, ViewKind};
use runtime::{Coordinator, CoordinatorError, Slot, ViewerConfig, load_directory};
use serde::Serialize;
use streaming::{ResourceLoadError, ResourceSource};
use wasm_bindgen::prelude::*;

// Guard to prevent double-initialization of global state (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Fetches resources relative to the page's data directory.
#[derive(Debug, Clone)]
struct HttpSource {
    base_url: String,
}

impl ResourceSource for HttpSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, ResourceLoadError>> {
        let raw = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let url: String = js_sys::encode_uri(&raw).into();
        let path = path.to_string();
        async move {
            let resp = Request::get(&url)
                .send()
                .await
                .map_err(|e| ResourceLoadError::Http {
                    path: path.clone(),
                    status: None,
                    message: e.to_string(),
                })?;
            if resp.status() == 404 {
                return Err(ResourceLoadError::NotFound(path));
            }
            if !resp.ok() {
                return Err(ResourceLoadError::Http {
                    status: Some(resp.status()),
                    message: resp.status_text(),
                    path,
                });
            }
            resp.text().await.map_err(|e| ResourceLoadError::Http {
                path,
                status: None,
                message: e.to_string(),
            })
        }
    }
}

/// Serializes frames while the viewer is borrowed; they are flushed to JS afterwards
/// so callbacks may call back into these exports.
#[derive(Default)]
struct QueuedPresenter {
    queued: Vec<(ViewKind, String)>,
}

impl QueuedPresenter {
    fn queue<T: Serialize>(&mut self, kind: ViewKind, frame: &T) {
        match serde_json::to_string(frame) {
            Ok(json) => self.queued.push((kind, json)),
            Err(e) => log_error(&format!("failed to serialize {kind:?} frame: {e}")),
        }
    }
}

impl Presenter for QueuedPresenter {
    fn present_map(&mut self, frame: &MapFrame) {
        self.queue(ViewKind::Map, frame);
    }

    fn present_ranking(&mut self, frame: &RankingFrame) {
        self.queue(ViewKind::Ranking, frame);
    }

    fn present_correlation(&mut self, frame: &CorrelationFrame) {
        self.queue(ViewKind::Correlation, frame);
    }
}

struct Bridge {
    source: HttpSource,
    on_map: js_sys::Function,
    on_ranking: js_sys::Function,
    on_correlation: js_sys::Function,
}

thread_local! {
    static VIEWER: RefCell<Option<Coordinator<QueuedPresenter>>> = const { RefCell::new(None) };
    static BRIDGE: RefCell<Option<Bridge>> = const { RefCell::new(None) };
}

fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn to_js(e: CoordinatorError) -> JsValue {
    let msg = e.to_string();
    log_error(&msg);
    JsValue::from_str(&msg)
}

/// Runs `f` on the viewer, then hands any rendered frames to their callbacks.
fn with_viewer<R>(
    f: impl FnOnce(&mut Coordinator<QueuedPresenter>) -> Result<R, CoordinatorError>,
) -> Result<R, JsValue> {
    let (result, frames) = VIEWER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let viewer = slot
            .as_mut()
            .ok_or_else(|| JsValue::from_str("viewer not initialised"))?;
        let result = f(viewer).map_err(to_js);
        let frames = std::mem::take(&mut viewer.presenter_mut().queued);
        Ok::<_, JsValue>((result, frames))
    })?;
    flush(frames);
    result
}

fn flush(frames: Vec<(ViewKind, String)>) {
    for (kind, json) in frames {
        let callback = BRIDGE.with(|b| {
            b.borrow().as_ref().map(|b| match kind {
                ViewKind::Map => b.on_map.clone(),
                ViewKind::Ranking => b.on_ranking.clone(),
                ViewKind::Correlation => b.on_correlation.clone(),
            })
        });
        if let Some(callback) = callback
            && let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json))
        {
            web_sys::console::error_2(&JsValue::from_str("view callback failed"), &e);
        }
    }
}

fn source() -> Result<HttpSource, JsValue> {
    BRIDGE
        .with(|b| b.borrow().as_ref().map(|b| b.source.clone()))
        .ok_or_else(|| JsValue::from_str("viewer not initialised"))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Avoid double-initialization (can happen during hot-reload edge cases).
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    console_error_panic_hook::set_once();
    Ok(())
}

/// Loads the directory and the initial datasets. `config_json` may be empty.
#[wasm_bindgen]
pub async fn init(
    base_url: String,
    config_json: String,
    on_map: js_sys::Function,
    on_ranking: js_sys::Function,
    on_correlation: js_sys::Function,
) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        ViewerConfig::default()
    } else {
        ViewerConfig::from_json_str(&config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let catalog = DatasetCatalog::builtin().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let source = HttpSource { base_url };
    let directory = load_directory(&source, &config.directory_resource)
        .await
        .map_err(to_js)?;

    let (a, b) = (config.initial_dataset_a.clone(), config.initial_dataset_b.clone());
    BRIDGE.with(|cell| {
        *cell.borrow_mut() = Some(Bridge {
            source,
            on_map,
            on_ranking,
            on_correlation,
        })
    });
    VIEWER.with(|cell| {
        *cell.borrow_mut() = Some(Coordinator::new(
            config,
            catalog,
            directory,
            QueuedPresenter::default(),
        ))
    });

    on_dataset_selected("a".to_string(), a).await?;
    on_dataset_selected("b".to_string(), b).await
}

/// Dataset names grouped for the selectors, as JSON.
#[wasm_bindgen]
pub fn list_datasets() -> Result<String, JsValue> {
    with_viewer(|v| {
        let groups: Vec<(&str, Vec<&str>)> = v.catalog().groups();
        Ok(serde_json::to_string(&groups).unwrap_or_default())
    })
}

/// `slot` is `"a"` (all views) or `"b"` (correlation y axis).
#[wasm_bindgen]
pub async fn on_dataset_selected(slot: String, name: String) -> Result<(), JsValue> {
    let slot = Slot::parse(&slot).ok_or_else(|| JsValue::from_str("slot must be a or b"))?;
    let (ticket, path) = with_viewer(|v| {
        let ticket = v.begin_load(slot, &name)?;
        let path = v.resource_path(&ticket)?;
        Ok((ticket, path))
    })?;
    let payload = source()?.fetch(&path).await;
    with_viewer(|v| v.complete_load(ticket, payload)).map(|_| ())
}

#[wasm_bindgen]
pub fn on_year_selected(year: i32) -> Result<(), JsValue> {
    with_viewer(|v| v.select_year(Year(year)))
}

/// Returns the mode in effect after a possible fallback to linear.
#[wasm_bindgen]
pub fn on_scale_mode_selected(mode: &str) -> Result<String, JsValue> {
    let mode = ScaleKind::parse(mode).ok_or_else(|| JsValue::from_str("unknown scale mode"))?;
    with_viewer(|v| v.select_scale_mode(mode)).map(|m| m.to_string())
}

#[wasm_bindgen]
pub fn on_ranking_limit_changed(limit: usize) -> Result<usize, JsValue> {
    with_viewer(|v| v.set_ranking_limit(limit))
}

/// Empty input clears the highlight.
#[wasm_bindgen]
pub fn on_highlight_requested(name_or_id: &str) -> Result<(), JsValue> {
    with_viewer(|v| v.highlight(name_or_id)).map(|_| ())
}

#[wasm_bindgen]
pub fn on_correlation_year_selected(year: i32) -> Result<(), JsValue> {
    with_viewer(|v| v.select_correlation_year(Year(year)))
}

/// Legend JSON in threshold mode, otherwise `undefined`.
#[wasm_bindgen]
pub fn get_legend() -> Result<Option<String>, JsValue> {
    with_viewer(|v| Ok(v.legend().and_then(|l| serde_json::to_string(&l).ok())))
}

/// Replaces the threshold breakpoints; the last one is normally `Infinity`.
#[wasm_bindgen]
pub fn edit_thresholds(breakpoints: Vec<f64>) -> Result<(), JsValue> {
    with_viewer(|v| {
        let legend = v.legend().ok_or_else(|| {
            CoordinatorError::InvalidThresholds("not in threshold mode".to_string())
        })?;
        let edited = legend.with_breakpoints(&breakpoints)?;
        v.edit_thresholds(&edited)
    })
}

/// Applies a legend as returned by `get_legend`, after the user edited it.
#[wasm_bindgen]
pub fn apply_legend(legend_json: &str) -> Result<(), JsValue> {
    let legend: Legend = serde_json::from_str(legend_json).map_err(|e| {
        let msg = format!("invalid legend: {e}");
        log_error(&msg);
        JsValue::from_str(&msg)
    })?;
    with_viewer(|v| v.edit_thresholds(&legend))
}

#[wasm_bindgen]
pub fn reset_thresholds() -> Result<(), JsValue> {
    with_viewer(|v| v.reset_thresholds())
}

#[wasm_bindgen]
pub fn set_dot_size(size: u8) -> Result<(), JsValue> {
    with_viewer(|v| v.set_dot_size(size))
}

#[wasm_bindgen]
pub fn set_region_colouring(enabled: bool) -> Result<(), JsValue> {
    with_viewer(|v| {
        v.set_region_colouring(enabled);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_region_color(region: &str, hex: &str) -> Result<(), JsValue> {
    let color = Rgb::parse_hex(hex).ok_or_else(|| JsValue::from_str("expected #RRGGBB"))?;
    with_viewer(|v| v.set_region_color(region, color))
}

#[wasm_bindgen]
pub fn set_region_active(region: &str, active: bool) -> Result<(), JsValue> {
    with_viewer(|v| v.set_region_active(region, active))
}

#[wasm_bindgen]
pub fn reset_region_colors() -> Result<(), JsValue> {
    with_viewer(|v| {
        v.reset_region_colors();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) -> Result<(), JsValue> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(JsValue::from_str("canvas size must be positive"));
    }
    with_viewer(|v| {
        v.resize(width, height);
        Ok(())
    })
}
