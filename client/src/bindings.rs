use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::config::{LabelLayerOptions, LabelLayerOptionsInput};
use crate::layer::LabelLayer;
use crate::leaflet::{HostCallback, LeafletHost};
use crate::logging;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Install console logging with an `EnvFilter` directive such as
/// `"budget_map_labels=debug"`. Returns `false` if logging was already set up.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) -> bool {
    logging::init(filter.as_deref())
}

fn decode_options(value: JsValue) -> Result<LabelLayerOptionsInput, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(LabelLayerOptionsInput::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("invalid label layer options: {e}")))
}

/// Canvas label overlay for a Leaflet map.
#[wasm_bindgen]
pub struct CanvasLabelLayer {
    inner: Rc<RefCell<LabelLayer<LeafletHost>>>,
}

#[wasm_bindgen]
impl CanvasLabelLayer {
    #[wasm_bindgen(constructor)]
    pub fn new(map: JsValue, options: JsValue) -> Result<CanvasLabelLayer, JsError> {
        let mut merged = LabelLayerOptions::default();
        merged.merge(decode_options(options)?.into_patch());

        let host = LeafletHost::new(map);
        let dispatcher = host.dispatcher();
        let inner = Rc::new(RefCell::new(LabelLayer::new(host, merged)));

        let weak = Rc::downgrade(&inner);
        dispatcher.set(move |callback| {
            let Some(layer) = weak.upgrade() else {
                return true;
            };
            let Ok(mut layer) = layer.try_borrow_mut() else {
                debug!(?callback, "label layer busy, callback deferred");
                return false;
            };
            match callback {
                HostCallback::Event(event) => layer.handle_event(event),
                HostCallback::Frame(handle) => layer.on_animation_frame(handle),
            }
            true
        });

        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = addTo)]
    pub fn add_to(&self) {
        if let Ok(mut layer) = self.inner.try_borrow_mut() {
            layer.mount();
        }
    }

    pub fn remove(&self) {
        if let Ok(mut layer) = self.inner.try_borrow_mut() {
            layer.unmount();
        }
    }

    #[wasm_bindgen(js_name = updateOptions)]
    pub fn update_options(&self, patch: JsValue) -> Result<(), JsError> {
        let patch = decode_options(patch)?.into_patch();
        if let Ok(mut layer) = self.inner.try_borrow_mut() {
            layer.update_options(patch);
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = labelCount)]
    pub fn label_count(&self) -> usize {
        self.inner.try_borrow().map_or(0, |layer| layer.labels().len())
    }
}
