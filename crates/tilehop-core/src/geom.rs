use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world units.
///
/// `x`/`y` is the top-left corner; y grows downward, matching screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn centre(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// True when the horizontal extents overlap by more than `margin`.
    /// Edge contact alone does not count.
    pub fn overlaps_x_strictly(&self, other: &Rect, margin: f32) -> bool {
        self.right() > other.left() + margin && self.left() < other.right() - margin
    }

    /// True when the vertical extents overlap by more than `margin`.
    pub fn overlaps_y_strictly(&self, other: &Rect, margin: f32) -> bool {
        self.bottom() > other.top() + margin && self.top() < other.bottom() - margin
    }
}

/// Result of testing one rectangle against another.
///
/// Produced fresh by every [`collide`] call and never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Collision {
    /// Signed gap between the near edges on each touching axis, zero elsewhere.
    pub dist: Vec2,
    /// Top-left corner `from` must move to so it no longer overlaps `to`.
    /// Untouched axes keep `from`'s original coordinate.
    pub new_pos: Vec2,
    pub x_touches: bool,
    pub y_touches: bool,
}

/// Closed-interval overlap of two spans.
fn spans_overlap(a_min: f32, a_len: f32, b_min: f32, b_len: f32) -> bool {
    a_min <= b_min + b_len && a_min + a_len >= b_min
}

/// Resolve one axis. Returns `(gap, corrected_min)` when the spans touch or
/// overlap from the side `from` approaches on, decided by comparing centres.
fn resolve_axis(from_min: f32, from_len: f32, to_min: f32, to_len: f32) -> Option<(f32, f32)> {
    let from_centre = from_min + from_len / 2.0;
    let to_centre = to_min + to_len / 2.0;

    if from_centre < to_centre {
        // near edges: from's max against to's min
        let gap = to_min - (from_min + from_len);
        (gap <= 0.0).then_some((gap, to_min - from_len))
    } else {
        let gap = (to_min + to_len) - from_min;
        (gap >= 0.0).then_some((gap, to_min + to_len))
    }
}

/// Compute how `from` has to move, per axis, to stop overlapping `to`.
///
/// An axis is only considered when the rectangles overlap on the other axis,
/// so a pair that is apart vertically never reports a horizontal touch. Both
/// axes are evaluated independently; callers pick which one to apply.
pub fn collide(from: Rect, to: Rect) -> Collision {
    let mut res = Collision {
        new_pos: from.pos(),
        ..Collision::default()
    };

    let might_collide_x = spans_overlap(from.y, from.h, to.y, to.h);
    let might_collide_y = spans_overlap(from.x, from.w, to.x, to.w);

    if might_collide_x && let Some((gap, new_x)) = resolve_axis(from.x, from.w, to.x, to.w) {
        res.x_touches = true;
        res.dist.x = gap;
        res.new_pos.x = new_x;
    }

    if might_collide_y && let Some((gap, new_y)) = resolve_axis(from.y, from.h, to.y, to.h) {
        res.y_touches = true;
        res.dist.y = gap;
        res.new_pos.y = new_y;
    }

    res
}
