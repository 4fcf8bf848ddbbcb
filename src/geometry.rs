//! Screen-space value types shared by the window mapper and the checker.

/// A point in absolute screen pixels (or window-relative pixels after an
/// offset by the window origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new((self.x as f64 * factor) as i32, (self.y as f64 * factor) as i32)
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Strictly inside: a point lying exactly on an edge is not contained.
    pub const fn is_in(self, rect: Rectangle) -> bool {
        rect.left < self.x && self.x < rect.right && rect.top < self.y && self.y < rect.bottom
    }
}

/// An axis-aligned rectangle in screen pixels, `right`/`bottom` exclusive
/// for size purposes. Doubles as a window bound and a capture region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rectangle {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn width(self) -> i32 {
        self.right - self.left
    }

    pub const fn height(self) -> i32 {
        self.bottom - self.top
    }

    pub const fn middle(self) -> Point {
        Point::new((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(
            (self.left as f64 * factor) as i32,
            (self.top as f64 * factor) as i32,
            (self.right as f64 * factor) as i32,
            (self.bottom as f64 * factor) as i32,
        )
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Maps fractional offsets into this rectangle, truncating toward the
    /// origin. `at(0.0, 0.0)` is the top-left corner, `at(1.0, 1.0)` the
    /// bottom-right.
    pub fn at(self, fx: f64, fy: f64) -> Point {
        Point::new(
            self.left + (self.width() as f64 * fx) as i32,
            self.top + (self.height() as f64 * fy) as i32,
        )
    }

    /// Maps a fractional sub-rectangle into this rectangle.
    pub fn region(self, lf: f64, tf: f64, rf: f64, bf: f64) -> Rectangle {
        let top_left = self.at(lf, tf);
        let bottom_right = self.at(rf, bf);
        Rectangle::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }
}
