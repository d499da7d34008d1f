//! The globe engine: owns scene state and turns input plus elapsed time into
//! render frames.
//!
//! All mutation happens on the caller's thread. Selection, hover and theme
//! calls update state immediately and become visible on the next `tick`.

use std::cell::Cell;
use std::rc::Rc;

use foundation::ids::PointId;
use gpu::renderer::RenderFrame;
use layers::boundaries::BoundaryDataset;
use layers::region_map::RegionMap;
use layers::textures::TextureTag;
use runtime::event_bus::{EventBus, Recorded, SubscriptionId, Subscribers};
use runtime::frame::FrameClock;
use runtime::theme::{Theme, ThemeProvider};
use scene::camera::{CameraRig, CameraStep};
use scene::markers::MarkerField;
use scene::picking::{PickOptions, pick_screen};
use scene::points::{GeoPoint, PointCatalog};
use scene::selection::{SelectOutcome, Selection};
use scene::view::ViewCamera;

use crate::composer::{FrameInputs, SceneComposer, TextureEvent};
use crate::config::EngineConfig;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SelectionChanged {
        previous: Option<PointId>,
        current: PointId,
    },
    SelectionReconfirmed(PointId),
    HoverChanged(Option<PointId>),
    FocusStarted(PointId),
    FocusSettled,
    ThemeApplied(Theme),
    TextureBuilt {
        tag: TextureTag,
        fallback: bool,
    },
    TextureReleased(TextureTag),
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum PointerState {
    Up,
    Pressed { origin: [f64; 2], last: [f64; 2], dragging: bool },
}

pub struct GlobeEngine {
    config: EngineConfig,
    catalog: PointCatalog,
    markers: MarkerField,
    selection: Selection,
    camera: CameraRig,
    composer: SceneComposer,
    themes: ThemeProvider,
    pending_theme: Rc<Cell<Option<Theme>>>,
    clock: FrameClock,
    viewport: [u32; 2],
    pointer: PointerState,
    select_listeners: Subscribers<PointId>,
    hover_listeners: Subscribers<Option<PointId>>,
    events: EventBus<EngineEvent>,
    frame: RenderFrame,
    shut_down: bool,
}

impl GlobeEngine {
    /// Builds the scene, selects the initial point and faces the camera at it.
    pub fn new(
        points: Vec<GeoPoint>,
        region_map: RegionMap,
        boundaries: BoundaryDataset,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let catalog = PointCatalog::new(points)?;
        let initial = match &config.initial_selection {
            Some(id) => catalog
                .index_of(id)
                .ok_or_else(|| EngineError::UnknownPoint(id.clone()))?,
            None => 0,
        };

        let markers = MarkerField::new(&catalog, config.globe.radius, config.markers.clone());
        let target = catalog.points()[initial].position.to_cartesian(config.globe.radius);
        let camera = CameraRig::facing(config.camera.clone(), target);
        let (composer, texture_events) = SceneComposer::new(boundaries, region_map, &config);

        let pending_theme = Rc::new(Cell::new(None));
        let mut themes = ThemeProvider::new(config.theme);
        let slot = Rc::clone(&pending_theme);
        themes.subscribe(move |theme: &Theme| slot.set(Some(*theme)));

        let mut engine = Self {
            markers,
            selection: Selection::with_selected(initial),
            camera,
            composer,
            themes,
            pending_theme,
            clock: FrameClock::new(config.max_dt_s),
            viewport: [config.viewport[0].max(1), config.viewport[1].max(1)],
            pointer: PointerState::Up,
            select_listeners: Subscribers::new(),
            hover_listeners: Subscribers::new(),
            events: EventBus::with_capacity(config.event_capacity),
            frame: RenderFrame::default(),
            shut_down: false,
            catalog,
            config,
        };
        engine.record_textures(0, texture_events);
        tracing::info!(
            points = engine.catalog.len(),
            selected = %engine.catalog.points()[initial].id,
            theme = %engine.composer.theme(),
            "globe engine ready"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PointCatalog {
        &self.catalog
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_id(&self) -> Option<&PointId> {
        self.id_at(self.selection.selected())
    }

    pub fn hovered_id(&self) -> Option<&PointId> {
        self.id_at(self.selection.hovered())
    }

    /// Theme currently drawn. Lags `themes().current()` until the next tick.
    pub fn theme(&self) -> Theme {
        self.composer.theme()
    }

    pub fn themes(&self) -> &ThemeProvider {
        &self.themes
    }

    /// The provider the engine listens to; other subscribers may share it.
    pub fn themes_mut(&mut self) -> &mut ThemeProvider {
        &mut self.themes
    }

    pub fn viewport(&self) -> [u32; 2] {
        self.viewport
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    pub fn events(&self) -> &EventBus<EngineEvent> {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Recorded<EngineEvent>> {
        self.events.drain()
    }

    /// Fired when a click picks a point. Not fired by `set_selected`.
    pub fn on_select(&mut self, callback: impl FnMut(&PointId) + 'static) -> SubscriptionId {
        self.select_listeners.subscribe(callback)
    }

    /// Fired when pointer movement changes the hovered point.
    pub fn on_hover(&mut self, callback: impl FnMut(&Option<PointId>) + 'static) -> SubscriptionId {
        self.hover_listeners.subscribe(callback)
    }

    /// Selects `id` and starts focusing the camera on it. Selecting the
    /// current point again re-focuses without changing selection state.
    pub fn set_selected(&mut self, id: &str) -> Result<SelectOutcome, EngineError> {
        let index = self.resolve(id)?;
        Ok(self.select_index(index))
    }

    /// Sets or clears the externally driven hover.
    pub fn hover(&mut self, id: Option<&str>) -> Result<bool, EngineError> {
        let index = id.map(|id| self.resolve(id)).transpose()?;
        Ok(self.apply_hover(index).is_some())
    }

    pub fn set_theme(&mut self, theme: Theme) -> bool {
        self.themes.set(theme)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.themes.toggle()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = [width.max(1), height.max(1)];
    }

    pub fn pointer_down(&mut self, x_px: f64, y_px: f64) {
        self.pointer = PointerState::Pressed {
            origin: [x_px, y_px],
            last: [x_px, y_px],
            dragging: false,
        };
    }

    pub fn pointer_move(&mut self, x_px: f64, y_px: f64) {
        match self.pointer {
            PointerState::Up => {
                let picked = self.pick(x_px, y_px);
                if let Some(hovered) = self.apply_hover(picked) {
                    self.hover_listeners.notify(&hovered);
                }
            }
            PointerState::Pressed { origin, last, dragging } => {
                let travelled = (x_px - origin[0]).hypot(y_px - origin[1]);
                let dragging = dragging || travelled > self.config.click_threshold_px;
                if dragging {
                    if !self.camera.user_driving() {
                        self.camera.begin_drag();
                    }
                    self.camera.orbit_by_pixels(x_px - last[0], y_px - last[1]);
                }
                self.pointer = PointerState::Pressed {
                    origin,
                    last: [x_px, y_px],
                    dragging,
                };
            }
        }
    }

    /// Ends a press. A press that never became a drag is a click: the picked
    /// point is selected and `on_select` fires. Clicking empty space is a no-op.
    pub fn pointer_up(&mut self, x_px: f64, y_px: f64) {
        let state = std::mem::replace(&mut self.pointer, PointerState::Up);
        match state {
            PointerState::Pressed { dragging: true, .. } => self.camera.end_drag(self.clock.time()),
            PointerState::Pressed { dragging: false, .. } => {
                if let Some(index) = self.pick(x_px, y_px) {
                    self.select_index(index);
                    if let Some(id) = self.id_at(Some(index)).cloned() {
                        self.select_listeners.notify(&id);
                    }
                }
            }
            PointerState::Up => {}
        }
    }

    pub fn pointer_leave(&mut self) {
        if let PointerState::Pressed { dragging: true, .. } = self.pointer {
            self.camera.end_drag(self.clock.time());
        }
        self.pointer = PointerState::Up;
        if self.apply_hover(None).is_some() {
            self.hover_listeners.notify(&None);
        }
    }

    /// Positive deltas zoom out.
    pub fn wheel(&mut self, delta: f64) {
        self.camera.zoom_by(delta);
    }

    /// Advances time by `dt_s` and composes the next frame.
    pub fn tick(&mut self, dt_s: f64) -> &RenderFrame {
        if self.shut_down {
            self.frame.clear();
            return &self.frame;
        }
        let frame = self.clock.advance(dt_s);

        if let Some(theme) = self.pending_theme.take() {
            let changes = self.composer.set_theme(theme);
            if !changes.is_empty() {
                self.events.emit_in(frame, EngineEvent::ThemeApplied(theme));
            }
            self.record_textures(frame.index, changes);
        }

        if self.camera.update(&frame) == CameraStep::Settled {
            self.events.emit_in(frame, EngineEvent::FocusSettled);
        }

        let active = self.id_at(self.selection.active()).cloned();
        let changes = self.composer.sync_highlight(active.as_ref());
        self.record_textures(frame.index, changes);

        let view = self.view();
        self.frame.index = frame.index;
        self.frame.time_s = frame.time.seconds();
        self.frame.viewport = self.viewport;
        self.composer.compose(
            &mut self.frame,
            &FrameInputs {
                catalog: &self.catalog,
                markers: &self.markers,
                selection: &self.selection,
                view: &view,
            },
        );
        &self.frame
    }

    /// Releases every texture. Later ticks produce empty frames.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let index = self.clock.frames_elapsed();
        for tag in self.live_tags() {
            self.events.emit(index, EngineEvent::TextureReleased(tag));
        }
        let released = self.composer.shutdown();
        self.frame.clear();
        self.shut_down = true;
        tracing::info!(released, "globe engine shut down");
    }

    fn view(&self) -> ViewCamera {
        ViewCamera::from_rig(&self.camera, self.viewport[0], self.viewport[1])
    }

    fn pick(&self, x_px: f64, y_px: f64) -> Option<usize> {
        let opts = PickOptions {
            globe_radius: self.composer.globe().radius(),
            ..PickOptions::default()
        };
        pick_screen(&self.markers, &self.view(), x_px, y_px, opts).map(|hit| hit.index)
    }

    fn resolve(&self, id: &str) -> Result<usize, EngineError> {
        self.catalog.index_of(id).ok_or_else(|| {
            tracing::warn!(id, "unknown point id");
            EngineError::UnknownPoint(id.to_string())
        })
    }

    fn id_at(&self, index: Option<usize>) -> Option<&PointId> {
        index.and_then(|i| self.catalog.get(i)).map(|p| &p.id)
    }

    fn select_index(&mut self, index: usize) -> SelectOutcome {
        let at = self.clock.frames_elapsed();
        let outcome = self.selection.select(index);
        let Some(point) = self.catalog.get(index) else {
            return outcome;
        };
        let id = point.id.clone();
        let target = point.position.to_cartesian(self.composer.globe().radius());
        match outcome {
            SelectOutcome::Changed { previous } => {
                let previous = self.id_at(previous).cloned();
                tracing::debug!(point = %id, ?previous, "selection changed");
                self.events.emit(
                    at,
                    EngineEvent::SelectionChanged {
                        previous,
                        current: id.clone(),
                    },
                );
            }
            SelectOutcome::Reconfirmed => {
                self.events.emit(at, EngineEvent::SelectionReconfirmed(id.clone()));
            }
        }
        if self.camera.focus_on(target) {
            self.events.emit(at, EngineEvent::FocusStarted(id));
        }
        outcome
    }

    /// Returns the new hover id when it changed.
    fn apply_hover(&mut self, index: Option<usize>) -> Option<Option<PointId>> {
        if !self.selection.hover(index) {
            return None;
        }
        let hovered = self.id_at(index).cloned();
        self.events
            .emit(self.clock.frames_elapsed(), EngineEvent::HoverChanged(hovered.clone()));
        Some(hovered)
    }

    fn live_tags(&self) -> Vec<TextureTag> {
        [self.composer.land_texture(), self.composer.highlight_texture()]
            .into_iter()
            .flatten()
            .filter_map(|h| self.composer.textures().get(h))
            .map(|asset| asset.tag.clone())
            .collect()
    }

    fn record_textures(&mut self, at: u64, changes: Vec<TextureEvent>) {
        for change in changes {
            let event = match change {
                TextureEvent::Built { tag, fallback, .. } => EngineEvent::TextureBuilt { tag, fallback },
                TextureEvent::Released { tag, .. } => EngineEvent::TextureReleased(tag),
            };
            self.events.emit(at, event);
        }
    }
}
