//! The map surface: shapes, markers, popups and the viewport.

use std::collections::HashMap;
use std::sync::Arc;

use crate::feature::{Bounds, Feature, FeatureId, Position};

pub const INITIAL_CENTER: Position = Position {
    lon: 139.76,
    lat: 35.68,
};
pub const INITIAL_ZOOM: f64 = 13.0;
/// Closest zoom used when framing a question.
pub const QUESTION_ZOOM: f64 = 16.0;

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 19.0;
/// Map tiles that fit across the view at any zoom.
const TILES_ACROSS: f64 = 3.0;
/// Fraction of margin kept around fitted bounds.
const FIT_PADDING: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapColor {
    SkyBlue,
    Blue,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub color: MapColor,
    pub weight: u8,
    pub opacity: f32,
    /// Whether clicks on the shape are dispatched.
    pub interactive: bool,
}

/// Streets as shown outside the street quiz.
pub const DEFAULT_STREET_STYLE: ShapeStyle = ShapeStyle {
    color: MapColor::SkyBlue,
    weight: 2,
    opacity: 0.8,
    interactive: true,
};

/// Streets during the street quiz, so the highlighted one stands out.
pub const STREET_QUIZ_BASE_STYLE: ShapeStyle = ShapeStyle {
    color: MapColor::Blue,
    weight: 3,
    opacity: 1.0,
    interactive: false,
};

pub const HIGHLIGHT_STYLE: ShapeStyle = ShapeStyle {
    color: MapColor::Red,
    weight: 6,
    opacity: 1.0,
    interactive: false,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Position,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: INITIAL_CENTER,
            zoom: INITIAL_ZOOM,
        }
    }
}

impl Viewport {
    /// Degrees of longitude across the view.
    pub fn lon_span(&self) -> f64 {
        360.0 * TILES_ACROSS / 2f64.powf(self.zoom)
    }

    /// Bounds shown in an area of `cols` x `rows` terminal cells, taking
    /// cells to be twice as tall as wide.
    pub fn visible_bounds(&self, cols: u16, rows: u16) -> Bounds {
        let lon_span = self.lon_span();
        let aspect = if cols == 0 {
            1.0
        } else {
            2.0 * rows as f64 / cols as f64
        };
        let lat_span = lon_span * aspect * self.center.lat.to_radians().cos();
        Bounds {
            min: Position::new(
                self.center.lon - lon_span / 2.0,
                self.center.lat - lat_span / 2.0,
            ),
            max: Position::new(
                self.center.lon + lon_span / 2.0,
                self.center.lat + lat_span / 2.0,
            ),
        }
    }

    /// The position under cell (`col`, `row`) of a `cols` x `rows` area.
    pub fn position_at(&self, cols: u16, rows: u16, col: u16, row: u16) -> Position {
        let b = self.visible_bounds(cols, rows);
        let x = (col as f64 + 0.5) / cols.max(1) as f64;
        let y = (row as f64 + 0.5) / rows.max(1) as f64;
        Position::new(b.min.lon + x * b.width(), b.max.lat - y * b.height())
    }

    /// Frames `bounds`, zooming in no further than `max_zoom`.
    pub fn fit(bounds: Bounds, max_zoom: f64) -> Self {
        let cos_lat = bounds.center().lat.to_radians().cos().max(0.01);
        let needed = bounds.width().max(bounds.height() / cos_lat) * FIT_PADDING;
        let zoom = if needed <= 0.0 {
            max_zoom
        } else {
            (360.0 * TILES_ACROSS / needed).log2().floor().min(max_zoom)
        };
        Self {
            center: bounds.center(),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Moves the center by a fraction of the visible longitude span.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let span = self.lon_span();
        self.center.lon += dx * span;
        self.center.lat += dy * span * self.center.lat.to_radians().cos();
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub feature: Arc<Feature>,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Position,
    /// Quiz markers are transient and cleared between questions.
    pub quiz_marker: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub position: Position,
    pub text: String,
}

/// What the quiz needs from a map: drawing shapes and markers, styling,
/// moving the view, popups and click dispatch.
pub trait MapSurface {
    /// Draws a feature's geometry as a shape with `style`.
    fn add_shape(&mut self, feature: Arc<Feature>, style: ShapeStyle);

    fn set_style(&mut self, id: FeatureId, style: ShapeStyle);

    /// Returns a shape to the layer style.
    fn reset_style(&mut self, id: FeatureId);

    /// Restyles every shape and makes `style` the layer style.
    fn set_layer_style(&mut self, style: ShapeStyle);

    fn fit_bounds(&mut self, bounds: Bounds, max_zoom: f64);

    fn set_view(&mut self, center: Position, zoom: f64);

    fn add_marker(&mut self, marker: Marker);

    fn remove_quiz_markers(&mut self);

    /// Opens the popup bound to a shape, if it has one.
    fn open_popup(&mut self, id: FeatureId);

    fn close_popup(&mut self);

    /// The interactive shape within `tolerance` degrees of `position`.
    fn shape_at(&self, position: Position, tolerance: f64) -> Option<FeatureId>;
}

/// Map state rendered by the terminal ui.
#[derive(Debug, Clone)]
pub struct TerminalMap {
    shapes: Vec<Shape>,
    index: HashMap<FeatureId, usize>,
    layer_style: ShapeStyle,
    markers: Vec<Marker>,
    popup: Option<Popup>,
    pub viewport: Viewport,
}

impl Default for TerminalMap {
    fn default() -> Self {
        Self {
            shapes: Vec::new(),
            index: HashMap::new(),
            layer_style: DEFAULT_STREET_STYLE,
            markers: Vec::new(),
            popup: None,
            viewport: Viewport::default(),
        }
    }
}

impl TerminalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: FeatureId) -> Option<&Shape> {
        self.index.get(&id).map(|&idx| &self.shapes[idx])
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn layer_style(&self) -> ShapeStyle {
        self.layer_style
    }
}

impl MapSurface for TerminalMap {
    fn add_shape(&mut self, feature: Arc<Feature>, style: ShapeStyle) {
        let id = feature.id;
        match self.index.get(&id) {
            Some(&idx) => self.shapes[idx] = Shape { feature, style },
            None => {
                self.index.insert(id, self.shapes.len());
                self.shapes.push(Shape { feature, style });
            }
        }
    }

    fn set_style(&mut self, id: FeatureId, style: ShapeStyle) {
        if let Some(&idx) = self.index.get(&id) {
            self.shapes[idx].style = style;
        }
    }

    fn reset_style(&mut self, id: FeatureId) {
        let style = self.layer_style;
        self.set_style(id, style);
    }

    fn set_layer_style(&mut self, style: ShapeStyle) {
        self.layer_style = style;
        for shape in &mut self.shapes {
            shape.style = style;
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds, max_zoom: f64) {
        self.viewport = Viewport::fit(bounds, max_zoom);
    }

    fn set_view(&mut self, center: Position, zoom: f64) {
        self.viewport = Viewport {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        };
    }

    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn remove_quiz_markers(&mut self) {
        self.markers.retain(|m| !m.quiz_marker);
    }

    fn open_popup(&mut self, id: FeatureId) {
        let Some(shape) = self.shape(id) else {
            return;
        };
        let (Some(name), Some(bounds)) = (shape.feature.street_name(), shape.feature.bounds())
        else {
            return;
        };
        self.popup = Some(Popup {
            position: bounds.center(),
            text: name.to_string(),
        });
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }

    fn shape_at(&self, position: Position, tolerance: f64) -> Option<FeatureId> {
        let cos_lat = position.lat.to_radians().cos();
        self.shapes
            .iter()
            .filter(|s| s.style.interactive)
            .filter_map(|s| {
                let geometry = s.feature.geometry.as_ref()?;
                let distance = geometry
                    .paths()
                    .into_iter()
                    .flat_map(|path| path.windows(2))
                    .map(|seg| segment_distance(position, seg[0], seg[1], cos_lat))
                    .fold(f64::INFINITY, f64::min);
                (distance <= tolerance).then_some((s.feature.id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

/// Distance in degrees of longitude from `p` to segment `a`-`b`, with
/// latitude scaled to match.
fn segment_distance(p: Position, a: Position, b: Position, cos_lat: f64) -> f64 {
    let scale = if cos_lat > 0.0 { 1.0 / cos_lat } else { 1.0 };
    let (px, py) = (p.lon, p.lat * scale);
    let (ax, ay) = (a.lon, a.lat * scale);
    let (bx, by) = (b.lon, b.lat * scale);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::fixtures::{intersection, street};

    #[test]
    fn layer_style_applies_to_all_and_reset_returns_to_it() {
        let mut map = TerminalMap::new();
        map.add_shape(street(0, "A", 1), DEFAULT_STREET_STYLE);
        map.add_shape(street(1, "B", 1), DEFAULT_STREET_STYLE);

        map.set_layer_style(STREET_QUIZ_BASE_STYLE);
        assert!(map.shapes().iter().all(|s| s.style == STREET_QUIZ_BASE_STYLE));

        map.set_style(FeatureId(1), HIGHLIGHT_STYLE);
        assert_eq!(map.shape(FeatureId(1)).unwrap().style, HIGHLIGHT_STYLE);
        map.reset_style(FeatureId(1));
        assert_eq!(map.shape(FeatureId(1)).unwrap().style, STREET_QUIZ_BASE_STYLE);
    }

    #[test]
    fn only_quiz_markers_are_removed() {
        let mut map = TerminalMap::new();
        let p = Position::new(139.7, 35.6);
        map.add_marker(Marker {
            position: p,
            quiz_marker: true,
        });
        map.add_marker(Marker {
            position: p,
            quiz_marker: false,
        });
        map.remove_quiz_markers();
        assert_eq!(map.markers().len(), 1);
        assert!(!map.markers()[0].quiz_marker);
    }

    #[test]
    fn click_finds_nearest_interactive_street() {
        let mut map = TerminalMap::new();
        // fixture streets run north-south at lon 139.700 + id * 0.001
        map.add_shape(street(0, "A", 1), DEFAULT_STREET_STYLE);
        map.add_shape(street(1, "B", 1), DEFAULT_STREET_STYLE);

        let near_b = Position::new(139.7009, 35.605);
        assert_eq!(map.shape_at(near_b, 0.0005), Some(FeatureId(1)));
        assert_eq!(map.shape_at(Position::new(139.8, 35.605), 0.0005), None);

        map.set_layer_style(STREET_QUIZ_BASE_STYLE);
        assert_eq!(map.shape_at(near_b, 0.0005), None);
    }

    #[test]
    fn popup_shows_street_name() {
        let mut map = TerminalMap::new();
        map.add_shape(street(0, "Oike", 1), DEFAULT_STREET_STYLE);
        map.open_popup(FeatureId(0));
        assert_eq!(map.popup().unwrap().text, "Oike");
        map.close_popup();
        assert!(map.popup().is_none());

        map.add_shape(intersection(5, "X", "A", "B"), DEFAULT_STREET_STYLE);
        map.open_popup(FeatureId(5));
        assert!(map.popup().is_none());
    }

    #[test]
    fn fit_caps_zoom_for_points() {
        let vp = Viewport::fit(Bounds::around(Position::new(139.7, 35.6)), QUESTION_ZOOM);
        assert_eq!(vp.zoom, QUESTION_ZOOM);
        assert_eq!(vp.center, Position::new(139.7, 35.6));
    }

    #[test]
    fn fit_zooms_out_for_long_streets() {
        let bounds = Bounds {
            min: Position::new(139.6, 35.6),
            max: Position::new(139.8, 35.7),
        };
        let vp = Viewport::fit(bounds, QUESTION_ZOOM);
        assert!(vp.zoom < QUESTION_ZOOM);
        let visible = vp.visible_bounds(80, 40);
        assert!(visible.width() >= bounds.width());
    }

    #[test]
    fn position_at_maps_cells_into_view() {
        let vp = Viewport::default();
        let b = vp.visible_bounds(80, 20);
        let top_left = vp.position_at(80, 20, 0, 0);
        let center = vp.position_at(80, 20, 40, 10);
        assert!(b.contains(top_left));
        assert!((center.lon - vp.center.lon).abs() < b.width() / 40.0);
        assert!(top_left.lat > center.lat);
    }

    #[test]
    fn pan_and_zoom_stay_in_range() {
        let mut vp = Viewport::default();
        let lon = vp.center.lon;
        vp.pan(0.5, 0.0);
        assert!(vp.center.lon > lon);
        vp.zoom_by(100.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_by(-100.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
