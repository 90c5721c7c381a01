//! Region quadtree spatial partitioning structure
//!
//! Divides a 2D game space into nested quadrants for broad-phase collision
//! detection. A node splits into four children once its bucket grows past
//! a threshold; entries that straddle a quadrant boundary stay in the
//! bucket of the node where they straddle.

use crate::foundation::math::Rect;
use serde::{Deserialize, Serialize};

/// Configuration for quadtree behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadtreeConfig {
    /// Bucket size a node may exceed before it splits
    pub max_objects: usize,

    /// Maximum nesting level (root is level 0)
    pub max_levels: u32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_objects: 10,
            max_levels: 5,
        }
    }
}

/// Key stored in the quadtree together with the rectangle it was inserted with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadtreeEntry<K> {
    /// Caller-owned identifier
    pub key: K,
    /// World-space rectangle at insertion time
    pub rect: Rect,
}

/// Child slots, in the fixed NE, NW, SW, SE order
pub type Quadrants<K> = Box<[QuadtreeNode<K>; 4]>;

/// Single node in the quadtree hierarchy
#[derive(Debug, Clone)]
pub struct QuadtreeNode<K> {
    /// World-space bounds of this node
    pub bounds: Rect,

    /// Nesting level (0 = root)
    pub level: u32,

    /// Entries that could not descend any further
    pub entries: Vec<QuadtreeEntry<K>>,

    /// Child nodes, None until the first split
    pub children: Option<Quadrants<K>>,
}

impl<K: Copy + PartialEq> QuadtreeNode<K> {
    /// Create a new leaf node
    pub fn new(bounds: Rect, level: u32) -> Self {
        Self {
            bounds,
            level,
            entries: Vec::new(),
            children: None,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Index of the single quadrant that wholly contains `rect`
    ///
    /// Comparisons against the midpoints are strict, so a rectangle that
    /// touches or crosses a midpoint belongs to this node. Rectangles
    /// without area never descend.
    pub fn quadrant_index(&self, rect: &Rect) -> Option<usize> {
        if !rect.has_area() {
            return None;
        }

        let vertical_mid = self.bounds.x + self.bounds.w * 0.5;
        let horizontal_mid = self.bounds.y + self.bounds.h * 0.5;

        let top = rect.y < horizontal_mid && rect.bottom() < horizontal_mid;
        let bottom = rect.y > horizontal_mid;
        let left = rect.x < vertical_mid && rect.right() < vertical_mid;
        let right = rect.x > vertical_mid;

        // Quadrant layout:
        // 0: NE (right, top)
        // 1: NW (left, top)
        // 2: SW (left, bottom)
        // 3: SE (right, bottom)
        match (left, right, top, bottom) {
            (false, true, true, _) => Some(0),
            (true, _, true, _) => Some(1),
            (true, _, _, true) => Some(2),
            (false, true, _, true) => Some(3),
            _ => None,
        }
    }

    /// Subdivide this node into 4 children
    fn split(&mut self) {
        if self.children.is_some() {
            return; // Already subdivided
        }
        let level = self.level + 1;
        self.children = Some(Box::new(
            self.bounds.quadrants().map(|bounds| QuadtreeNode::new(bounds, level)),
        ));
    }

    /// Insert an entry into this node or the child that wholly contains it
    pub fn insert(&mut self, entry: QuadtreeEntry<K>, config: &QuadtreeConfig) {
        if let Some(index) = self.quadrant_index(&entry.rect) {
            if let Some(children) = self.children.as_mut() {
                children[index].insert(entry, config);
                return;
            }
        }

        self.entries.push(entry);

        if self.entries.len() > config.max_objects && self.level < config.max_levels {
            self.split();
            self.redistribute(config);
        }
    }

    /// Push every bucketed entry that fits a child down into it
    fn redistribute(&mut self, config: &QuadtreeConfig) {
        let mut i = 0;
        while i < self.entries.len() {
            match self.quadrant_index(&self.entries[i].rect) {
                Some(index) => {
                    let entry = self.entries.remove(i);
                    if let Some(children) = self.children.as_mut() {
                        children[index].insert(entry, config);
                    }
                }
                None => i += 1,
            }
        }
    }

    /// Collect every key that may overlap `rect`
    ///
    /// Child entries sit strictly on one side of each midpoint, so a child
    /// is only visited when the query reaches across into its half-planes.
    /// A query that fits one quadrant therefore walks a single path.
    pub fn retrieve(&self, rect: &Rect, results: &mut Vec<K>) {
        results.extend(self.entries.iter().map(|entry| entry.key));

        let Some(children) = self.children.as_ref() else {
            return;
        };

        let vertical_mid = self.bounds.x + self.bounds.w * 0.5;
        let horizontal_mid = self.bounds.y + self.bounds.h * 0.5;
        let reaches_left = rect.x < vertical_mid;
        let reaches_right = rect.right() > vertical_mid;
        let reaches_top = rect.y < horizontal_mid;
        let reaches_bottom = rect.bottom() > horizontal_mid;

        let visit = [
            reaches_right && reaches_top,
            reaches_left && reaches_top,
            reaches_left && reaches_bottom,
            reaches_right && reaches_bottom,
        ];
        for (child, wanted) in children.iter().zip(visit) {
            if wanted {
                child.retrieve(rect, results);
            }
        }
    }

    /// Move every entry in this subtree into `out`, leaving it empty
    fn drain_into(&mut self, out: &mut Vec<QuadtreeEntry<K>>) {
        out.append(&mut self.entries);
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.drain_into(out);
            }
        }
    }

    /// Count total entries in this node and all children
    pub fn count_entries(&self) -> usize {
        let mut count = self.entries.len();

        if let Some(ref children) = self.children {
            for child in children.iter() {
                count += child.count_entries();
            }
        }

        count
    }

    /// Count nodes in this subtree, including this one
    pub fn count_nodes(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(QuadtreeNode::count_nodes).sum())
    }

    /// Deepest level present in this subtree
    pub fn max_depth(&self) -> u32 {
        self.children.as_ref().map_or(self.level, |children| {
            children.iter().map(QuadtreeNode::max_depth).max().unwrap_or(self.level)
        })
    }

    /// Find the node currently holding `key`
    pub fn find(&self, key: K) -> Option<&QuadtreeNode<K>> {
        if self.entries.iter().any(|entry| entry.key == key) {
            return Some(self);
        }
        self.children
            .as_ref()
            .and_then(|children| children.iter().find_map(|child| child.find(key)))
    }
}

/// Quadtree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Quadtree<K> {
    /// Root node covering the whole game space
    root: QuadtreeNode<K>,

    /// Configuration
    config: QuadtreeConfig,
}

impl<K: Copy + PartialEq> Quadtree<K> {
    /// Create a new quadtree over `bounds`
    pub fn new(bounds: Rect, config: QuadtreeConfig) -> Self {
        Self {
            root: QuadtreeNode::new(bounds, 0),
            config,
        }
    }

    /// Insert a key with its current world-space rectangle
    pub fn insert(&mut self, key: K, rect: Rect) {
        self.root.insert(QuadtreeEntry { key, rect }, &self.config);
    }

    /// Broad-phase query: every key whose rectangle may overlap `rect`
    ///
    /// This over-approximates; apply the exact overlap test to the result.
    pub fn retrieve(&self, rect: &Rect) -> Vec<K> {
        let mut results = Vec::new();
        self.root.retrieve(rect, &mut results);
        results
    }

    /// Rebuild the tree from the entries it currently holds
    pub fn remake(&mut self) {
        let mut entries = Vec::with_capacity(self.len());
        self.root.drain_into(&mut entries);
        self.clear();
        for entry in entries {
            self.root.insert(entry, &self.config);
        }
    }

    /// Remove every entry and collapse back to a single root
    pub fn clear(&mut self) {
        self.root = QuadtreeNode::new(self.root.bounds, 0);
    }

    /// Root node (for inspection and debug drawing)
    pub fn root(&self) -> &QuadtreeNode<K> {
        &self.root
    }

    /// World bounds covered by the root
    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    /// Configuration in use
    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }

    /// Get total entry count
    pub fn len(&self) -> usize {
        self.root.count_entries()
    }

    /// Whether the tree holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node holding `key`, if any
    pub fn find(&self, key: K) -> Option<&QuadtreeNode<K>> {
        self.root.find(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> Rect {
        Rect::from_size(4000.0, 2250.0)
    }

    fn small_config() -> QuadtreeConfig {
        QuadtreeConfig {
            max_objects: 2,
            max_levels: 5,
        }
    }

    #[test]
    fn test_quadtree_basic_insertion() {
        let mut tree = Quadtree::new(space(), QuadtreeConfig::default());
        tree.insert(1u32, Rect::new(10.0, 10.0, 5.0, 5.0));
        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_quadrant_index() {
        let node: QuadtreeNode<u32> = QuadtreeNode::new(Rect::from_size(100.0, 100.0), 0);
        assert_eq!(node.quadrant_index(&Rect::new(60.0, 10.0, 5.0, 5.0)), Some(0));
        assert_eq!(node.quadrant_index(&Rect::new(10.0, 10.0, 5.0, 5.0)), Some(1));
        assert_eq!(node.quadrant_index(&Rect::new(10.0, 60.0, 5.0, 5.0)), Some(2));
        assert_eq!(node.quadrant_index(&Rect::new(60.0, 60.0, 5.0, 5.0)), Some(3));

        // Straddles the vertical midpoint
        assert_eq!(node.quadrant_index(&Rect::new(45.0, 10.0, 10.0, 5.0)), None);
        // Touches the horizontal midpoint
        assert_eq!(node.quadrant_index(&Rect::new(10.0, 45.0, 5.0, 5.0)), None);
        // No area
        assert_eq!(node.quadrant_index(&Rect::new(10.0, 10.0, 0.0, 5.0)), None);
        assert_eq!(node.quadrant_index(&Rect::new(10.0, 10.0, -3.0, 5.0)), None);
    }

    #[test]
    fn test_quadtree_subdivision() {
        let mut tree = Quadtree::new(space(), small_config());
        tree.insert(1u32, Rect::new(10.0, 10.0, 5.0, 5.0));
        tree.insert(2, Rect::new(3000.0, 10.0, 5.0, 5.0));
        assert!(tree.root().is_leaf());

        tree.insert(3, Rect::new(10.0, 2000.0, 5.0, 5.0));
        assert!(!tree.root().is_leaf());
        assert!(tree.root().entries.is_empty());
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.find(1).map(|n| n.level), Some(1));
        assert_eq!(tree.find(2).map(|n| n.bounds), Some(Rect::new(2000.0, 0.0, 2000.0, 1125.0)));
    }

    #[test]
    fn test_straddlers_stay_in_parent() {
        let mut tree = Quadtree::new(space(), small_config());
        tree.insert(1u32, Rect::new(1990.0, 10.0, 20.0, 20.0));
        tree.insert(2, Rect::new(10.0, 1120.0, 20.0, 20.0));
        tree.insert(3, Rect::new(10.0, 10.0, 20.0, 20.0));

        assert!(!tree.root().is_leaf());
        let root_keys: Vec<u32> = tree.root().entries.iter().map(|e| e.key).collect();
        assert_eq!(root_keys, vec![1, 2]);
        assert_eq!(tree.find(3).map(|n| n.level), Some(1));
    }

    #[test]
    fn test_max_levels_bounds_depth() {
        let config = QuadtreeConfig {
            max_objects: 1,
            max_levels: 3,
        };
        let mut tree = Quadtree::new(space(), config);
        for key in 0..20u32 {
            tree.insert(key, Rect::new(1.0 + f64::from(key) * 0.01, 1.0, 1.0, 1.0));
        }
        assert_eq!(tree.len(), 20);
        assert_eq!(tree.root().max_depth(), 3);
    }

    #[test]
    fn test_degenerate_rects_stay_at_root() {
        let mut tree = Quadtree::new(space(), small_config());
        for key in 0..5u32 {
            tree.insert(key, Rect::new(100.0, 100.0, 10.0, 10.0));
        }
        tree.insert(99, Rect::new(100.0, 100.0, 0.0, 0.0));
        tree.insert(98, Rect::new(100.0, 100.0, -4.0, 10.0));
        assert!(tree.find(99).is_some_and(|n| n.level == 0));
        assert!(tree.find(98).is_some_and(|n| n.level == 0));
    }

    #[test]
    fn test_retrieve_single_path() {
        let mut tree = Quadtree::new(space(), small_config());
        tree.insert(1u32, Rect::new(10.0, 10.0, 5.0, 5.0));
        tree.insert(2, Rect::new(3000.0, 10.0, 5.0, 5.0));
        tree.insert(3, Rect::new(3000.0, 2000.0, 5.0, 5.0));
        tree.insert(4, Rect::new(1990.0, 1000.0, 20.0, 20.0));

        let mut near_first = tree.retrieve(&Rect::new(5.0, 5.0, 20.0, 20.0));
        near_first.sort_unstable();
        assert_eq!(near_first, vec![1, 4]);
    }

    #[test]
    fn test_retrieve_straddling_query_reaches_children() {
        let mut tree = Quadtree::new(space(), small_config());
        tree.insert(1u32, Rect::new(1980.0, 10.0, 10.0, 10.0));
        tree.insert(2, Rect::new(2010.0, 10.0, 10.0, 10.0));
        tree.insert(3, Rect::new(10.0, 2000.0, 10.0, 10.0));
        assert!(!tree.root().is_leaf());

        let mut hits = tree.retrieve(&Rect::new(1985.0, 12.0, 30.0, 4.0));
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn test_retrieve_never_misses_overlaps() {
        let config = QuadtreeConfig {
            max_objects: 3,
            max_levels: 4,
        };
        let mut tree = Quadtree::new(Rect::from_size(1000.0, 1000.0), config);
        let mut rects = Vec::new();
        for i in 0..12u32 {
            for j in 0..12u32 {
                let rect = Rect::new(
                    f64::from(i) * 83.0 + f64::from(j % 3) * 7.0,
                    f64::from(j) * 79.0 + f64::from(i % 4) * 5.0,
                    10.0 + f64::from((i + j) % 5) * 9.0,
                    8.0 + f64::from((i * j) % 7) * 6.0,
                );
                rects.push((i * 12 + j, rect));
                tree.insert(i * 12 + j, rect);
            }
        }

        for qx in (0..1000).step_by(61) {
            for qy in (0..1000).step_by(67) {
                let query = Rect::new(f64::from(qx), f64::from(qy), 45.0, 120.0);
                let candidates = tree.retrieve(&query);
                for (key, rect) in &rects {
                    if rect.overlaps(&query) {
                        assert!(candidates.contains(key), "query {query:?} missed {key}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_remake_preserves_entries() {
        let mut tree = Quadtree::new(space(), small_config());
        for key in 0..8u32 {
            tree.insert(key, Rect::new(100.0 + f64::from(key) * 300.0, 100.0, 10.0, 10.0));
        }
        let nodes_before = tree.root().count_nodes();
        tree.remake();
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.root().count_nodes(), nodes_before);

        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
    }
}
