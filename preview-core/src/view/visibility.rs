//! ``src/view/visibility.rs``
//! ============================================================================
//! # Visibility Prioritization
//!
//! Partitions the current item set into on-screen and off-screen halves using
//! geometry supplied by the view collaborator. Pure: the only state is the
//! geometry lookup the view provides, so the same inputs always produce the
//! same ordering.

use crate::model::item::ItemId;

/// Axis-aligned rectangle in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.width == 0 || self.height == 0 || other.width == 0 || other.height == 0 {
            return false;
        }
        i64::from(self.x) < other.right()
            && i64::from(other.x) < self.right()
            && i64::from(self.y) < other.bottom()
            && i64::from(other.y) < self.bottom()
    }
}

/// Geometry lookup provided by the view collaborator.
///
/// `None` means the item is not laid out yet; prioritization treats it as not
/// visible rather than as an error.
pub trait ItemGeometry {
    fn item_bounds(&self, id: &ItemId) -> Option<Rect>;
}

/// Split `all` into (visible, rest).
///
/// `visible` holds the identifiers whose bounds intersect `visible_rect`,
/// ordered top-to-bottom then left-to-right to match the view's layout
/// traversal; `rest` preserves the caller's natural order.
pub fn partition(
    all: &[ItemId],
    visible_rect: Rect,
    geometry: &dyn ItemGeometry,
) -> (Vec<ItemId>, Vec<ItemId>) {
    let mut visible: Vec<(Rect, ItemId)> = Vec::new();
    let mut rest: Vec<ItemId> = Vec::new();

    for id in all {
        match geometry.item_bounds(id) {
            Some(bounds) if bounds.intersects(&visible_rect) => {
                visible.push((bounds, id.clone()));
            }
            _ => rest.push(id.clone()),
        }
    }

    // Stable sort keeps model order for items on the same row/column.
    visible.sort_by_key(|(bounds, _)| (bounds.y, bounds.x));

    (visible.into_iter().map(|(_, id)| id).collect(), rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapGeometry(HashMap<ItemId, Rect>);

    impl ItemGeometry for MapGeometry {
        fn item_bounds(&self, id: &ItemId) -> Option<Rect> {
            self.0.get(id).copied()
        }
    }

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|s| ItemId::from(*s)).collect()
    }

    #[test]
    fn intersects_basic() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(5, 5, 10, 10)));
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5))); // touching edge only
        assert!(!a.intersects(&Rect::new(0, 0, 0, 10))); // degenerate
    }

    #[test]
    fn partition_orders_visible_top_to_bottom_left_to_right() {
        let mut bounds: HashMap<ItemId, Rect> = HashMap::new();
        bounds.insert(ItemId::from("bottom"), Rect::new(0, 40, 16, 16));
        bounds.insert(ItemId::from("top_right"), Rect::new(20, 0, 16, 16));
        bounds.insert(ItemId::from("top_left"), Rect::new(0, 0, 16, 16));
        bounds.insert(ItemId::from("offscreen"), Rect::new(0, 500, 16, 16));
        let geometry = MapGeometry(bounds);

        let all = ids(&["bottom", "offscreen", "top_right", "top_left"]);
        let (visible, rest) = partition(&all, Rect::new(0, 0, 100, 100), &geometry);

        assert_eq!(visible, ids(&["top_left", "top_right", "bottom"]));
        assert_eq!(rest, ids(&["offscreen"]));
    }

    #[test]
    fn unlaid_out_items_count_as_not_visible() {
        let geometry = MapGeometry(HashMap::new());
        let all = ids(&["a", "b"]);
        let (visible, rest) = partition(&all, Rect::new(0, 0, 100, 100), &geometry);
        assert!(visible.is_empty());
        assert_eq!(rest, all);
    }

    #[test]
    fn rest_preserves_model_order() {
        let mut bounds: HashMap<ItemId, Rect> = HashMap::new();
        bounds.insert(ItemId::from("b"), Rect::new(0, 0, 8, 8));
        let geometry = MapGeometry(bounds);

        let all = ids(&["a", "b", "c", "d"]);
        let (visible, rest) = partition(&all, Rect::new(0, 0, 100, 100), &geometry);
        assert_eq!(visible, ids(&["b"]));
        assert_eq!(rest, ids(&["a", "c", "d"]));
    }
}
