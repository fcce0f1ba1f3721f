use tracing::{debug, trace, warn};

use crate::config::{LabelLayerOptions, LabelLayerOptionsPatch};
use crate::host::{FrameHandle, HostError, LabelSurface, MapEvent, MapHost};
use crate::label_layout::{LabelDescriptor, process_labels};
use crate::render_loop::{DrawScheduler, GestureState, draw_labels};
use crate::viewport::ViewportState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPhase {
    Unmounted,
    Idle,
    GestureActive,
}

/// Owns the label surface on one map and keeps it in step with the view.
///
/// Every entry point re-checks the overlay pane before touching the map and
/// turns host failures into a logged no-op: the map may be torn down at any
/// moment by code outside our control.
pub struct LabelLayer<H: MapHost> {
    host: H,
    options: LabelLayerOptions,
    surface: Option<H::Surface>,
    labels: Vec<LabelDescriptor>,
    viewport: ViewportState,
    gesture: GestureState,
    scheduler: DrawScheduler,
    subscribed: Vec<MapEvent>,
}

impl<H: MapHost> LabelLayer<H> {
    pub fn new(host: H, options: LabelLayerOptions) -> Self {
        Self {
            host,
            options,
            surface: None,
            labels: Vec::new(),
            viewport: ViewportState::default(),
            gesture: GestureState::default(),
            scheduler: DrawScheduler::default(),
            subscribed: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &LabelLayerOptions {
        &self.options
    }

    pub fn labels(&self) -> &[LabelDescriptor] {
        &self.labels
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn phase(&self) -> LayerPhase {
        if !self.is_mounted() {
            LayerPhase::Unmounted
        } else if self.gesture.active() {
            LayerPhase::GestureActive
        } else {
            LayerPhase::Idle
        }
    }

    /// Attach the surface to the map, subscribe to view events and run the
    /// first process/draw cycle.
    pub fn mount(&mut self) {
        if self.is_mounted() {
            return;
        }
        if !self.host.overlay_pane_attached() {
            debug!("overlay pane missing, label layer not mounted");
            return;
        }
        let surface = match self.host.mount_surface() {
            Ok(surface) => surface,
            Err(HostError::ContextUnavailable) => {
                warn!("2d canvas context unavailable, labels disabled");
                return;
            }
            Err(err) => {
                debug!(error = %err, "label surface mount failed");
                return;
            }
        };
        self.surface = Some(surface);

        for event in MapEvent::ALL {
            match self.host.subscribe(event) {
                Ok(()) => self.subscribed.push(event),
                Err(err) => debug!(event = event.name(), error = %err, "subscribe failed"),
            }
        }
        debug!(features = self.feature_count(), "label layer mounted");

        self.reset();
        self.process();
        self.schedule_draw();
    }

    /// Detach from the map and release every host resource. Safe to call on a
    /// torn-down map and when already unmounted.
    pub fn unmount(&mut self) {
        self.scheduler.cancel(&mut self.host);
        for event in self.subscribed.drain(..) {
            self.host.unsubscribe(event);
        }
        if let Some(surface) = self.surface.take() {
            self.host.unmount_surface(surface);
            debug!("label layer unmounted");
        }
        self.labels.clear();
        self.gesture = GestureState::default();
    }

    /// Merge `patch` into the options, then reprocess and redraw.
    pub fn update_options(&mut self, patch: LabelLayerOptionsPatch) {
        self.options.merge(patch);
        self.process();
        self.schedule_draw();
    }

    pub fn handle_event(&mut self, event: MapEvent) {
        if !self.is_mounted() || !self.host.overlay_pane_attached() {
            return;
        }
        trace!(event = event.name(), "map event");
        match event {
            MapEvent::MoveStart => {
                self.gesture.panning = true;
                self.clear_surface();
            }
            MapEvent::Move => {}
            MapEvent::MoveEnd => {
                self.gesture.panning = false;
                self.update_position();
                self.process();
                self.schedule_draw();
            }
            MapEvent::ZoomStart => {
                self.gesture.zooming = true;
                self.clear_surface();
            }
            MapEvent::Zoom | MapEvent::ViewReset => self.reset(),
            MapEvent::ZoomEnd => {
                self.gesture.zooming = false;
                self.process();
                self.schedule_draw();
            }
            MapEvent::Resize => {
                self.reset();
                self.process();
                self.schedule_draw();
            }
        }
    }

    /// Animation-frame callback. Frames other than the pending one are ignored.
    pub fn on_animation_frame(&mut self, handle: FrameHandle) {
        if !self.scheduler.take_frame(handle) {
            trace!(?handle, "stale animation frame ignored");
            return;
        }
        self.draw();
    }

    fn feature_count(&self) -> usize {
        self.options.geometry.as_ref().map_or(0, |fc| fc.len())
    }

    fn ready(&self) -> bool {
        self.is_mounted() && self.host.overlay_pane_attached()
    }

    /// Resize the surface to the container and move it to the container's
    /// top-left corner.
    fn reset(&mut self) {
        if !self.ready() {
            return;
        }
        if let Err(err) = self.viewport.refresh_placement(&self.host) {
            debug!(error = %err, "surface reset abandoned");
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(self.viewport.size, self.viewport.pixel_ratio);
            surface.set_position(self.viewport.origin);
        }
    }

    fn update_position(&mut self) {
        if !self.ready() {
            return;
        }
        if let Err(err) = self.viewport.refresh_origin(&self.host) {
            debug!(error = %err, "surface reposition abandoned");
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.set_position(self.viewport.origin);
        }
    }

    fn process(&mut self) {
        if !self.ready() {
            return;
        }
        let result = self
            .viewport
            .refresh_view(&self.host)
            .and_then(|()| process_labels(&self.host, &self.options, &self.viewport));
        match result {
            Ok(labels) => {
                trace!(count = labels.len(), zoom = self.viewport.zoom, "labels processed");
                self.labels = labels;
            }
            Err(err) => debug!(error = %err, "label processing abandoned"),
        }
    }

    fn schedule_draw(&mut self) {
        if !self.ready() {
            return;
        }
        if let Err(err) = self.scheduler.schedule(&mut self.host, self.gesture) {
            debug!(error = %err, "animation frame request failed");
        }
    }

    fn clear_surface(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }

    fn draw(&mut self) {
        if !self.ready() || self.gesture.active() {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        if !self.options.show_labels || self.labels.is_empty() {
            return;
        }
        let result = self.host.bounds().and_then(|bounds| {
            draw_labels(
                surface,
                &self.host,
                &self.labels,
                &self.viewport,
                &bounds,
                self.options.profile(),
            )
        });
        match result {
            Ok(count) => trace!(count, "labels drawn"),
            Err(err) => debug!(error = %err, "label draw abandoned"),
        }
    }
}

impl<H: MapHost> Drop for LabelLayer<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}
