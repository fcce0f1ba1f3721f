use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use budget_map_shared::{LatLng, LatLngBounds, ScreenPoint, ScreenSize};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use tracing::warn;
use web_sys::{Element, Window};

use crate::canvas::CanvasSurface;
use crate::config::OVERLAY_PANE;
use crate::host::{FrameHandle, HostError, MapEvent, MapHost};

/// Something the browser asked the layer to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCallback {
    Event(MapEvent),
    Frame(FrameHandle),
}

/// Returns `false` when the callback could not be taken right now.
type Handler = Box<dyn Fn(HostCallback) -> bool>;

/// Routes JS callbacks to the layer. Installed after the layer exists so the
/// handler can hold a `Weak` back-reference.
#[derive(Clone, Default)]
pub struct Dispatcher(Rc<RefCell<Option<Handler>>>);

impl Dispatcher {
    pub fn set(&self, handler: impl Fn(HostCallback) -> bool + 'static) {
        *self.0.borrow_mut() = Some(Box::new(handler));
    }

    /// `false` means the callback was refused and should be retried. With no
    /// handler installed there is nobody to retry for, so that counts as taken.
    fn dispatch(&self, callback: HostCallback) -> bool {
        let Ok(handler) = self.0.try_borrow() else {
            return false;
        };
        handler.as_ref().is_none_or(|handler| handler(callback))
    }
}

/// The one persistent rAF closure. `pending` is the id the layer was handed;
/// `raf_id` is the browser request currently in flight, which differs from
/// `pending` after a refused frame has been re-requested.
struct FrameLoop {
    window: Option<Window>,
    dispatcher: Dispatcher,
    pending: Cell<Option<i32>>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameLoop {
    fn new(window: Option<Window>, dispatcher: Dispatcher) -> Rc<Self> {
        let frames = Rc::new(Self {
            window,
            dispatcher,
            pending: Cell::new(None),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });
        let weak: Weak<Self> = Rc::downgrade(&frames);
        *frames.callback.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
            if let Some(frames) = weak.upgrade() {
                frames.fire();
            }
        }));
        frames
    }

    fn request(&self) -> Result<i32, HostError> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| HostError::Js("no window".to_string()))?;
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| HostError::Js("frame loop stopped".to_string()))?;
        let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.raf_id.set(Some(id));
        Ok(id)
    }

    fn fire(&self) {
        self.raf_id.set(None);
        let Some(id) = self.pending.take() else {
            return;
        };
        if self.dispatcher.dispatch(HostCallback::Frame(FrameHandle(id))) {
            return;
        }
        // The layer still waits on `id`; deliver it on the next frame.
        self.pending.set(Some(id));
        if let Err(error) = self.request() {
            warn!(%error, frame = id, "could not re-request refused frame");
            self.pending.set(None);
        }
    }

    fn cancel(&self, id: i32) {
        if self.pending.get() != Some(id) {
            return;
        }
        self.pending.set(None);
        self.cancel_in_flight();
    }

    fn stop(&self) {
        self.cancel_in_flight();
        self.pending.set(None);
        self.callback.borrow_mut().take();
    }

    fn cancel_in_flight(&self) {
        if let Some(raf_id) = self.raf_id.take()
            && let Some(window) = self.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
    }
}

/// `MapHost` over a Leaflet `L.Map`, reached through `Reflect` so no Leaflet
/// bindings are needed at build time.
pub struct LeafletHost {
    map: JsValue,
    window: Option<Window>,
    dispatcher: Dispatcher,
    listeners: HashMap<MapEvent, Closure<dyn FnMut(JsValue)>>,
    frames: Rc<FrameLoop>,
}

impl LeafletHost {
    pub fn new(map: JsValue) -> Self {
        let window = web_sys::window();
        let dispatcher = Dispatcher::default();
        let frames = FrameLoop::new(window.clone(), dispatcher.clone());
        Self {
            map,
            window,
            dispatcher,
            listeners: HashMap::new(),
            frames,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, HostError> {
        let function: Function = Reflect::get(&self.map, &JsValue::from_str(method))?
            .dyn_into()
            .map_err(|_| HostError::Js(format!("map.{method} is not a function")))?;
        let args: Array = args.iter().collect();
        Ok(function.apply(&self.map, &args)?)
    }

    fn overlay_pane(&self) -> Option<Element> {
        let pane = self
            .call("getPane", &[JsValue::from_str(OVERLAY_PANE)])
            .ok()?
            .dyn_into::<Element>()
            .ok()?;
        pane.is_connected().then_some(pane)
    }
}

fn number(value: &JsValue, key: &str) -> Result<f64, HostError> {
    Reflect::get(value, &JsValue::from_str(key))?
        .as_f64()
        .ok_or_else(|| HostError::Js(format!("`{key}` is not a number")))
}

fn point_arg(point: ScreenPoint) -> JsValue {
    Array::of2(&point.x.into(), &point.y.into()).into()
}

fn lat_lng_arg(point: LatLng) -> JsValue {
    Array::of2(&point.lat.into(), &point.lng.into()).into()
}

fn screen_point(value: &JsValue) -> Result<ScreenPoint, HostError> {
    Ok(ScreenPoint::new(number(value, "x")?, number(value, "y")?))
}

impl MapHost for LeafletHost {
    type Surface = CanvasSurface;

    fn overlay_pane_attached(&self) -> bool {
        self.overlay_pane().is_some()
    }

    fn zoom(&self) -> Result<f64, HostError> {
        self.call("getZoom", &[])?
            .as_f64()
            .ok_or_else(|| HostError::Js("getZoom returned a non-number".to_string()))
    }

    fn bounds(&self) -> Result<LatLngBounds, HostError> {
        let bounds = self.call("getBounds", &[])?;
        let edge = |method: &str| -> Result<f64, HostError> {
            let function: Function = Reflect::get(&bounds, &JsValue::from_str(method))?
                .dyn_into()
                .map_err(|_| HostError::Js(format!("bounds.{method} is not a function")))?;
            function
                .call0(&bounds)?
                .as_f64()
                .ok_or_else(|| HostError::Js(format!("bounds.{method} returned a non-number")))
        };
        Ok(LatLngBounds::new(
            edge("getSouth")?,
            edge("getWest")?,
            edge("getNorth")?,
            edge("getEast")?,
        ))
    }

    fn size(&self) -> Result<ScreenSize, HostError> {
        let size = screen_point(&self.call("getSize", &[])?)?;
        Ok(ScreenSize::new(size.x, size.y))
    }

    fn lat_lng_to_container_point(&self, point: LatLng) -> Result<ScreenPoint, HostError> {
        screen_point(&self.call("latLngToContainerPoint", &[lat_lng_arg(point)])?)
    }

    fn lat_lng_to_layer_point(&self, point: LatLng) -> Result<ScreenPoint, HostError> {
        screen_point(&self.call("latLngToLayerPoint", &[lat_lng_arg(point)])?)
    }

    fn container_point_to_layer_point(&self, point: ScreenPoint) -> Result<ScreenPoint, HostError> {
        screen_point(&self.call("containerPointToLayerPoint", &[point_arg(point)])?)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window
            .as_ref()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
    }

    fn subscribe(&mut self, event: MapEvent) -> Result<(), HostError> {
        if self.listeners.contains_key(&event) {
            return Ok(());
        }
        let dispatcher = self.dispatcher.clone();
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| {
            // A refused event is superseded by the next one of its kind.
            dispatcher.dispatch(HostCallback::Event(event));
        });
        self.call(
            "on",
            &[
                JsValue::from_str(event.name()),
                listener.as_ref().clone(),
            ],
        )?;
        self.listeners.insert(event, listener);
        Ok(())
    }

    fn unsubscribe(&mut self, event: MapEvent) {
        let Some(listener) = self.listeners.remove(&event) else {
            return;
        };
        // A torn-down map may reject `off`; the closure is dropped either way.
        let _ = self.call(
            "off",
            &[
                JsValue::from_str(event.name()),
                listener.as_ref().clone(),
            ],
        );
    }

    fn request_animation_frame(&mut self) -> Result<FrameHandle, HostError> {
        self.frames.cancel_in_flight();
        let id = self.frames.request()?;
        self.frames.pending.set(Some(id));
        Ok(FrameHandle(id))
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.frames.cancel(handle.0);
    }

    fn mount_surface(&mut self) -> Result<CanvasSurface, HostError> {
        let pane = self.overlay_pane().ok_or(HostError::PaneDetached)?;
        let document = self
            .window
            .as_ref()
            .and_then(|w| w.document())
            .ok_or_else(|| HostError::Js("no document".to_string()))?;
        let surface = CanvasSurface::create(&document)?;
        pane.append_child(surface.element())?;
        Ok(surface)
    }

    fn unmount_surface(&mut self, surface: CanvasSurface) {
        surface.remove();
    }
}

impl Drop for LeafletHost {
    fn drop(&mut self) {
        self.frames.stop();
        for event in self.listeners.keys().copied().collect::<Vec<_>>() {
            self.unsubscribe(event);
        }
    }
}
