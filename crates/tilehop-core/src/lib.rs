pub mod error;
pub mod geom;
pub mod intent;
pub mod personal_best;
pub mod stats;
pub mod time;

pub use glam::Vec2;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::geom::Rect;
    use crate::stats::Stats;

    /// Build a `Stats` with the three fields the PB comparator looks at first.
    pub fn make_stats(time: u32, jumps: u32, deaths: u32) -> Stats {
        Stats {
            time,
            jumps,
            deaths,
            ..Default::default()
        }
    }

    /// Unit tile collider with its top-left corner at `(x, y)`.
    pub fn unit_rect(x: f32, y: f32) -> Rect {
        Rect::new(x, y, 1.0, 1.0)
    }

    /// Assert two floats are within `tol` of each other.
    pub fn assert_close(actual: f32, expected: f32, tol: f32) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected} (±{tol}), got {actual}"
        );
    }
}
