//! One-way visibility latch for lazily loaded covers.

use ratatui::layout::Rect;

use crate::domain::entities::{DEFAULT_VISIBILITY_MARGIN, DEFAULT_VISIBILITY_THRESHOLD};

/// Whether the container has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    NotObserved,
    Observed,
}

/// Latches to [`Visibility::Observed`] the first time a container
/// intersects the viewport enough. Never goes back.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    state: Visibility,
    threshold: f32,
    margin: u16,
}

impl VisibilityGate {
    /// Creates a gate. A non-lazy gate starts out observed.
    #[must_use]
    pub const fn new(lazy: bool) -> Self {
        Self {
            state: if lazy {
                Visibility::NotObserved
            } else {
                Visibility::Observed
            },
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
            margin: DEFAULT_VISIBILITY_MARGIN,
        }
    }

    #[must_use]
    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_margin(mut self, margin: u16) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub const fn state(&self) -> Visibility {
        self.state
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self.state, Visibility::Observed)
    }

    /// Tests the container against the viewport.
    ///
    /// Returns true only on the call that flips the latch. Once observed,
    /// the geometry is no longer examined.
    pub fn observe(&mut self, container: Rect, viewport: Rect) -> bool {
        if self.is_visible() {
            return false;
        }

        let root = expand(viewport, self.margin);
        if intersects_or_touches(container, root)
            && intersection_ratio(container, root) >= self.threshold
        {
            self.state = Visibility::Observed;
            return true;
        }

        false
    }

    /// Flips the latch without geometry, for covers shown outside a
    /// scrolling list. Returns true if it was not already observed.
    pub fn reveal(&mut self) -> bool {
        if self.is_visible() {
            return false;
        }
        self.state = Visibility::Observed;
        true
    }
}

fn expand(rect: Rect, margin: u16) -> Rect {
    let x = rect.x.saturating_sub(margin);
    let y = rect.y.saturating_sub(margin);
    let right = rect.right().saturating_add(margin);
    let bottom = rect.bottom().saturating_add(margin);
    Rect::new(x, y, right - x, bottom - y)
}

fn area(rect: Rect) -> u32 {
    u32::from(rect.width) * u32::from(rect.height)
}

fn overlap(a: Rect, b: Rect) -> Rect {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    Rect::new(
        x,
        y,
        right.saturating_sub(x),
        bottom.saturating_sub(y),
    )
}

/// Share of `container`'s area inside `root`.
///
/// A zero-area container counts as fully visible when its origin lies inside.
#[allow(clippy::cast_precision_loss)]
fn intersection_ratio(container: Rect, root: Rect) -> f32 {
    let total = area(container);
    if total == 0 {
        return if intersects_or_touches(container, root) {
            1.0
        } else {
            0.0
        };
    }
    area(overlap(container, root)) as f32 / total as f32
}

fn intersects_or_touches(container: Rect, root: Rect) -> bool {
    if area(container) == 0 {
        return container.x >= root.x
            && container.x <= root.right()
            && container.y >= root.y
            && container.y <= root.bottom();
    }
    area(overlap(container, root)) > 0
}
