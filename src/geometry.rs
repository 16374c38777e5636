//! Pure coordinate maths for the canvas.
//!
//! Everything here works in logical canvas pixels and is free of I/O, so the
//! manipulation state machine and the renderer can share it and the tests
//! can exercise it without bitmaps.
//!
//! | Function | Purpose |
//! |---|---|
//! | [`to_canvas_coordinates`] | client (display) pixels → logical canvas pixels |
//! | [`hit_test_handle`] | which of the 8 resize handles is under a point |
//! | [`hit_delete_hotspot`] | whether a point is on the delete button |
//! | [`resize_from_handle`] | new box for a handle drag, with optional aspect lock |
//! | [`rotate_about_center`] | affine rotating a box about its own center |

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Smallest width or height any element may be resized to.
pub const MIN_ELEMENT_SIZE: f64 = 20.0;

/// Side of a resize handle square.
pub const HANDLE_SIZE: f64 = 8.0;

/// Extra slop added to the handle half-size when hit-testing.
pub const HANDLE_TOLERANCE: f64 = 4.0;

/// Diameter of the circular delete button drawn on the selected element.
pub const DELETE_HOTSPOT_SIZE: f64 = 20.0;

/// One of the eight resize handles around an element's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    W,
    E,
}

impl Handle {
    /// Hit-test order: corners first, then edge midpoints.
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::W,
        Handle::E,
    ];

    pub fn is_corner(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne | Handle::Sw | Handle::Se)
    }

    pub fn name(self) -> &'static str {
        match self {
            Handle::Nw => "nw",
            Handle::Ne => "ne",
            Handle::Sw => "sw",
            Handle::Se => "se",
            Handle::N => "n",
            Handle::S => "s",
            Handle::W => "w",
            Handle::E => "e",
        }
    }

    /// Center of this handle on the boundary of `bounds`.
    pub fn anchor(self, bounds: Rect) -> Point {
        let cx = bounds.x0 + bounds.width() / 2.0;
        let cy = bounds.y0 + bounds.height() / 2.0;
        match self {
            Handle::Nw => Point::new(bounds.x0, bounds.y0),
            Handle::Ne => Point::new(bounds.x1, bounds.y0),
            Handle::Sw => Point::new(bounds.x0, bounds.y1),
            Handle::Se => Point::new(bounds.x1, bounds.y1),
            Handle::N => Point::new(cx, bounds.y0),
            Handle::S => Point::new(cx, bounds.y1),
            Handle::W => Point::new(bounds.x0, cy),
            Handle::E => Point::new(bounds.x1, cy),
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Handle::Nw | Handle::Sw | Handle::W)
    }

    fn moves_top(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne | Handle::N)
    }
}

/// Placement of the canvas element on screen.
///
/// `origin` is the top-left of the element's bounding box in client pixels,
/// `displayed` its on-screen size, `intrinsic` the size of its pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Point,
    pub displayed: Size,
    pub intrinsic: Size,
}

impl Viewport {
    /// A viewport shown at 1:1 at the client origin.
    pub fn identity(intrinsic: Size) -> Self {
        Self {
            origin: Point::ORIGIN,
            displayed: intrinsic,
            intrinsic,
        }
    }
}

/// Map a client-space pointer position into logical canvas pixels.
///
/// `logical = (client - origin) * (intrinsic / displayed)` per axis. A
/// collapsed (zero-size) display axis is treated as unscaled.
pub fn to_canvas_coordinates(client: Point, viewport: &Viewport) -> Point {
    let scale = |intrinsic: f64, displayed: f64| {
        if displayed > 0.0 {
            intrinsic / displayed
        } else {
            1.0
        }
    };
    Point::new(
        (client.x - viewport.origin.x) * scale(viewport.intrinsic.width, viewport.displayed.width),
        (client.y - viewport.origin.y) * scale(viewport.intrinsic.height, viewport.displayed.height),
    )
}

/// Which resize handle of `bounds` is under `point`, if any.
pub fn hit_test_handle(point: Point, bounds: Rect) -> Option<Handle> {
    let reach = HANDLE_SIZE / 2.0 + HANDLE_TOLERANCE;
    Handle::ALL.into_iter().find(|handle| {
        let anchor = handle.anchor(bounds);
        (point.x - anchor.x).abs() <= reach && (point.y - anchor.y).abs() <= reach
    })
}

/// Center of the delete button for an element occupying `bounds`.
///
/// The button sits on top of the top-right corner: its right edge lines up
/// with the element's right edge and its bottom edge with the element's top.
pub fn delete_hotspot_center(bounds: Rect) -> Point {
    let radius = DELETE_HOTSPOT_SIZE / 2.0;
    Point::new(bounds.x1 - radius, bounds.y0 - radius)
}

pub fn hit_delete_hotspot(point: Point, bounds: Rect) -> bool {
    point.distance(delete_hotspot_center(bounds)) <= DELETE_HOTSPOT_SIZE / 2.0
}

/// Compute the box produced by dragging `handle` by `delta` from `start`.
///
/// Corner handles move two edges, edge handles one. With `aspect_locked` on a
/// corner, height follows width at the starting aspect ratio; the `nw` corner
/// additionally keeps the bottom edge fixed. Width and height never drop below
/// [`MIN_ELEMENT_SIZE`]; when that floor engages the edge opposite the handle
/// stays put.
pub fn resize_from_handle(start: Rect, handle: Handle, delta: Vec2, aspect_locked: bool) -> Rect {
    let (x, y) = (start.x0, start.y0);
    let (w, h) = (start.width(), start.height());
    let (dx, dy) = (delta.x, delta.y);

    let (mut width, mut height) = match handle {
        Handle::Nw => (w - dx, h - dy),
        Handle::Ne => (w + dx, h - dy),
        Handle::Sw => (w - dx, h + dy),
        Handle::Se => (w + dx, h + dy),
        Handle::N => (w, h - dy),
        Handle::S => (w, h + dy),
        Handle::W => (w - dx, h),
        Handle::E => (w + dx, h),
    };

    let locked = aspect_locked && handle.is_corner() && h > 0.0 && w > 0.0;
    if locked {
        let aspect = w / h;
        width = width.max(MIN_ELEMENT_SIZE).max(MIN_ELEMENT_SIZE * aspect);
        height = (width / aspect).max(MIN_ELEMENT_SIZE);
    } else {
        width = width.max(MIN_ELEMENT_SIZE);
        height = height.max(MIN_ELEMENT_SIZE);
    }

    let new_x = if handle.moves_left() { x + w - width } else { x };
    let new_y = if !handle.moves_top() {
        y
    } else if locked && handle == Handle::Ne {
        // Locked ne moves the top edge by the raw drag, not by the derived height.
        y + dy
    } else {
        y + h - height
    };

    Rect::from_origin_size((new_x, new_y), (width, height))
}

/// Wrap degrees into `[0, 360)` so `r` and `r + 360` rotate identically.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Affine rotating by `degrees` about the center of `bounds`.
pub fn rotate_about_center(bounds: Rect, degrees: f64) -> Affine {
    Affine::rotate_about(normalize_degrees(degrees).to_radians(), bounds.center())
}
