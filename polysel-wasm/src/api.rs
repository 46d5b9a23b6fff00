use crate::error;
use crate::interop::{arr_f32, arr_u32, new_obj, set_kv, warn};
use crate::Selector;
use js_sys::Uint32Array;
use polysel::geometry::limits::{
    first_bad_coord, in_coord_bounds, MAX_POINTS, MAX_POLYGONS, MAX_RING_VERTICES,
};
use polysel::model::ring_from_flat;
use polysel::{
    EditKind, PointCloud, PolygonEditEvent, PolygonId, SelectionEngine, SelectorConfig, ShapeKind,
    Vertex,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
struct Stats {
    polygons: u32,
    state_version: u64,
    dirty: bool,
    dragging: bool,
    hits: u64,
    recomputes: u64,
    discarded: u64,
}

// Validation shared by the `_res` variants. Errors are ready-made envelopes.

fn check_ring(param: &str, flat: &[f32]) -> Result<Vec<Vertex>, JsValue> {
    if flat.len() % 2 != 0 {
        return Err(error::invalid_array(param, flat.len(), "must hold [x, y] pairs"));
    }
    if flat.len() / 2 > MAX_RING_VERTICES {
        return Err(error::too_large(param, MAX_RING_VERTICES, flat.len() / 2));
    }
    if let Some(i) = first_bad_coord(flat) {
        return Err(error::non_finite(param, i));
    }
    ring_from_flat(flat).ok_or_else(|| error::invalid_array(param, flat.len(), "must hold [x, y] pairs"))
}

fn check_vertices(param: &str, ring: &[Vertex]) -> Result<(), JsValue> {
    if ring.len() > MAX_RING_VERTICES {
        return Err(error::too_large(param, MAX_RING_VERTICES, ring.len()));
    }
    match ring.iter().position(|v| !in_coord_bounds(v.x) || !in_coord_bounds(v.y)) {
        Some(i) => Err(error::non_finite(param, i)),
        None => Ok(()),
    }
}

fn check_points(x: &[f32], y: &[f32]) -> Result<PointCloud, JsValue> {
    if x.len() != y.len() {
        return Err(error::invalid_array("y", y.len(), "must match the length of 'x'"));
    }
    if x.len() > MAX_POINTS {
        return Err(error::too_large("x", MAX_POINTS, x.len()));
    }
    PointCloud::new(x.to_vec(), y.to_vec()).map_err(|e| error::from_select(&e))
}

fn parse_config(config: JsValue) -> Result<SelectorConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(SelectorConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| error::err("invalid_input", format!("bad selector config: {}", e), None))
}

fn envelope(r: Result<JsValue, JsValue>) -> JsValue {
    match r {
        Ok(v) => error::ok(v),
        Err(e) => e,
    }
}

#[wasm_bindgen]
impl Selector {
    /// Throws the error envelope when the columns disagree in length.
    #[wasm_bindgen(constructor)]
    pub fn new(x: &[f32], y: &[f32]) -> Result<Selector, JsValue> {
        let points = check_points(x, y)?;
        Ok(Selector::rs_new(points, SelectionEngine::new()))
    }
    pub fn with_config(x: &[f32], y: &[f32], config: JsValue) -> Result<Selector, JsValue> {
        let config = parse_config(config)?;
        let points = check_points(x, y)?;
        Ok(Selector::rs_new(points, SelectionEngine::with_config(config)))
    }
    pub fn state_version(&self) -> u64 {
        self.rs_state_version()
    }

    // Dataset
    pub fn point_count(&self) -> u32 {
        self.points.len() as u32
    }
    pub fn set_points(&mut self, x: &[f32], y: &[f32]) -> bool {
        let r = self.set_points_res(x, y);
        report("set_points", &r)
    }
    /// Swap the dataset; every cached entry is rescanned on the next read.
    pub fn set_points_res(&mut self, x: &[f32], y: &[f32]) -> JsValue {
        match check_points(x, y) {
            Ok(points) => {
                self.points = points;
                self.inner.invalidate_all();
                error::ok(JsValue::from_f64(self.points.len() as f64))
            }
            Err(e) => e,
        }
    }
    pub fn set_sizes_res(&mut self, size: &[f32]) -> JsValue {
        if size.len() != self.points.len() {
            return error::invalid_array("size", size.len(), "must match the point count");
        }
        let view = self.points.view();
        let cloud = PointCloud::new(view.xs().to_vec(), view.ys().to_vec())
            .and_then(|c| c.with_size(size.to_vec()));
        match cloud {
            Ok(c) => {
                self.points = c;
                error::ok(JsValue::TRUE)
            }
            Err(e) => error::from_select(&e),
        }
    }

    // Shapes
    pub fn create_polygon(&mut self, ring: &[f32]) -> Option<u32> {
        self.create_shape(ShapeKind::Polygon, ring)
    }
    pub fn create_polygon_res(&mut self, ring: &[f32]) -> JsValue {
        self.create_shape_res(ShapeKind::Polygon, ring)
    }
    /// Line strings are stored and listed but never select points.
    pub fn create_line_string(&mut self, ring: &[f32]) -> Option<u32> {
        self.create_shape(ShapeKind::LineString, ring)
    }
    pub fn create_line_string_res(&mut self, ring: &[f32]) -> JsValue {
        self.create_shape_res(ShapeKind::LineString, ring)
    }
    pub fn update_polygon(&mut self, id: u32, ring: &[f32]) -> bool {
        let Some(ring) = ring_from_flat(ring) else {
            warn("update_polygon: ring must hold [x, y] pairs");
            return false;
        };
        match self.inner.update(PolygonId(id), ring) {
            Ok(_) => true,
            Err(e) => {
                warn(&format!("update_polygon: {}", e));
                false
            }
        }
    }
    /// On success the value is the polygon's new version.
    pub fn update_polygon_res(&mut self, id: u32, ring: &[f32]) -> JsValue {
        let ring = match check_ring("ring", ring) {
            Ok(r) => r,
            Err(e) => return e,
        };
        match self.inner.update(PolygonId(id), ring) {
            Ok(version) => error::ok(JsValue::from_f64(version as f64)),
            Err(e) => error::from_select(&e),
        }
    }
    pub fn set_enabled(&mut self, id: u32, enabled: bool) -> bool {
        self.inner.set_enabled(PolygonId(id), enabled).is_ok()
    }
    pub fn set_enabled_res(&mut self, id: u32, enabled: bool) -> JsValue {
        match self.inner.set_enabled(PolygonId(id), enabled) {
            Ok(()) => error::ok(JsValue::from_bool(enabled)),
            Err(e) => error::from_select(&e),
        }
    }
    pub fn delete_polygon(&mut self, id: u32) -> bool {
        self.inner.delete(PolygonId(id)).is_ok()
    }
    pub fn delete_polygon_res(&mut self, id: u32) -> JsValue {
        match self.inner.delete(PolygonId(id)) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::from_select(&e),
        }
    }
    pub fn polygon_count(&self) -> u32 {
        self.inner.polygon_count() as u32
    }
    /// Summaries of every polygon in creation order.
    pub fn polygons(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.list()).unwrap_or(JsValue::NULL)
    }
    pub fn get_polygon(&self, id: u32) -> JsValue {
        let Some(p) = self.inner.get(PolygonId(id)) else {
            return JsValue::NULL;
        };
        let flat: Vec<f32> = p.ring.iter().flat_map(|v| [v.x, v.y]).collect();
        let obj = new_obj();
        set_kv(&obj, "id", &JsValue::from_f64(p.id.0 as f64));
        set_kv(&obj, "kind", &JsValue::from_str(match p.kind {
            ShapeKind::Polygon => "polygon",
            ShapeKind::LineString => "line_string",
        }));
        set_kv(&obj, "enabled", &JsValue::from_bool(p.enabled));
        set_kv(&obj, "version", &JsValue::from_f64(p.version as f64));
        set_kv(&obj, "ring", &arr_f32(&flat).into());
        obj.into()
    }
    pub fn get_polygon_res(&self, id: u32) -> JsValue {
        let v = self.get_polygon(id);
        if v.is_null() {
            return error::from_select(&polysel::SelectError::NotFound(PolygonId(id)));
        }
        error::ok(v)
    }

    // Events
    pub fn apply_event(&mut self, event: JsValue) -> bool {
        let r = self.apply_event_res(event);
        report("apply_event", &r)
    }
    /// Apply a `{ kind, id?, ring?, enabled?, shape? }` event. For `created`
    /// the value is the new id, otherwise `null`.
    pub fn apply_event_res(&mut self, event: JsValue) -> JsValue {
        let event: PolygonEditEvent = match serde_wasm_bindgen::from_value(event) {
            Ok(ev) => ev,
            Err(e) => return error::invalid_event(format!("malformed edit event: {}", e)),
        };
        if let Some(ring) = &event.ring {
            if let Err(e) = check_vertices("ring", ring) {
                return e;
            }
        }
        if event.kind == EditKind::Created && self.inner.polygon_count() >= MAX_POLYGONS {
            return error::too_large("polygons", MAX_POLYGONS, self.inner.polygon_count() + 1);
        }
        match self.inner.apply(event) {
            Ok(Some(id)) => error::ok(JsValue::from_f64(id.0 as f64)),
            Ok(None) => error::ok(JsValue::NULL),
            Err(e) => error::from_select(&e),
        }
    }

    // Interaction hint
    pub fn begin_drag(&mut self) {
        self.inner.begin_drag();
    }
    pub fn end_drag(&mut self) {
        self.inner.end_drag();
    }
    pub fn is_dragging(&self) -> bool {
        self.inner.interaction() == polysel::Interaction::Dragging
    }

    // Selection
    /// Union of all enabled polygons, ascending and without duplicates.
    pub fn selection(&mut self) -> Uint32Array {
        arr_u32(self.inner.selection(&self.points.view()))
    }
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }
    pub fn ensure_fresh_res(&mut self, id: u32) -> JsValue {
        match self.inner.ensure_fresh(PolygonId(id), &self.points.view()) {
            Ok(indices) => error::ok(arr_u32(indices).into()),
            Err(e) => error::from_select(&e),
        }
    }
    pub fn invalidate(&mut self, id: u32) -> bool {
        self.inner.invalidate(PolygonId(id)).is_ok()
    }
    pub fn invalidate_res(&mut self, id: u32) -> JsValue {
        match self.inner.invalidate(PolygonId(id)) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::from_select(&e),
        }
    }
    pub fn invalidate_all(&mut self) {
        self.inner.invalidate_all();
    }
    pub fn stats(&self) -> JsValue {
        let cache = self.inner.cache_stats();
        let s = Stats {
            polygons: self.inner.polygon_count() as u32,
            state_version: self.inner.state_version(),
            dirty: self.inner.is_dirty(),
            dragging: self.is_dragging(),
            hits: cache.hits,
            recomputes: cache.recomputes,
            discarded: cache.discarded,
        };
        serde_wasm_bindgen::to_value(&s).unwrap_or(JsValue::NULL)
    }
}

impl Selector {
    fn create_shape(&mut self, kind: ShapeKind, ring: &[f32]) -> Option<u32> {
        let Some(ring) = ring_from_flat(ring) else {
            warn("create: ring must hold [x, y] pairs");
            return None;
        };
        match self.inner.create_shape(kind, ring) {
            Ok(id) => Some(id.0),
            Err(e) => {
                warn(&format!("create: {}", e));
                None
            }
        }
    }
    fn create_shape_res(&mut self, kind: ShapeKind, ring: &[f32]) -> JsValue {
        envelope(self.try_create(kind, ring))
    }
    fn try_create(&mut self, kind: ShapeKind, ring: &[f32]) -> Result<JsValue, JsValue> {
        let ring = check_ring("ring", ring)?;
        let count = self.inner.polygon_count();
        if count >= MAX_POLYGONS {
            return Err(error::too_large("polygons", MAX_POLYGONS, count + 1));
        }
        let id = self.inner.create_shape(kind, ring).map_err(|e| error::from_select(&e))?;
        Ok(JsValue::from_f64(id.0 as f64))
    }
}

fn is_ok(v: &JsValue) -> bool {
    js_sys::Reflect::get(v, &JsValue::from_str("ok"))
        .ok()
        .and_then(|x| x.as_bool())
        .unwrap_or(false)
}

// Plain variants: log the envelope's message on failure, return success.
fn report(method: &str, envelope: &JsValue) -> bool {
    if is_ok(envelope) {
        return true;
    }
    let reason = error::message(envelope).unwrap_or_else(|| "rejected".to_string());
    warn(&format!("{}: {}", method, reason));
    false
}

/// One-shot containment test without a store or cache.
#[wasm_bindgen]
pub fn filter_points(ring: &[f32], x: &[f32], y: &[f32]) -> Uint32Array {
    let Some(ring) = ring_from_flat(ring) else {
        warn("filter_points: ring must hold [x, y] pairs");
        return arr_u32(&[]);
    };
    match polysel::filter_points(&ring, x, y) {
        Ok(indices) => arr_u32(&indices),
        Err(e) => {
            warn(&format!("filter_points: {}", e));
            arr_u32(&[])
        }
    }
}

#[wasm_bindgen]
pub fn filter_points_res(ring: &[f32], x: &[f32], y: &[f32]) -> JsValue {
    let ring = match check_ring("ring", ring) {
        Ok(r) => r,
        Err(e) => return e,
    };
    if x.len() != y.len() {
        return error::invalid_array("y", y.len(), "must match the length of 'x'");
    }
    match polysel::filter_points(&ring, x, y) {
        Ok(indices) => error::ok(arr_u32(&indices).into()),
        Err(e) => error::from_select(&e),
    }
}
