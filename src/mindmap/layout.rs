use std::collections::HashMap;
use std::f64::consts::PI;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[cfg(feature = "server")]
use utoipa::ToSchema;

use super::types::MindMapNode;

pub const DEFAULT_RADIUS_INCREMENT: f64 = 200.0;

/// Constants of the radial fallback layout
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub radius_increment: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius_increment: DEFAULT_RADIUS_INCREMENT,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Position every node of a lesson
///
/// Nodes of level `L` share a circle of radius `L * radius_increment`, spaced
/// evenly from angle 0 in input order. A node with both coordinates saved keeps
/// them but still occupies its slot, so the result depends only on the node set
/// and which of its nodes are positioned.
pub fn compute_layout(nodes: &[MindMapNode], config: &LayoutConfig) -> IndexMap<String, Point> {
    let mut per_level: HashMap<i32, usize> = HashMap::new();
    for node in nodes {
        *per_level.entry(node.level).or_default() += 1;
    }

    let mut slot: HashMap<i32, usize> = HashMap::new();
    let mut positions = IndexMap::with_capacity(nodes.len());

    for node in nodes {
        let index = slot.entry(node.level).or_default();
        let count = per_level.get(&node.level).copied().unwrap_or(1).max(1);

        let point = match node.saved_position() {
            Some((x, y)) => Point { x, y },
            None => {
                let radius = f64::from(node.level.max(0)) * config.radius_increment;
                let angle = 2.0 * PI * (*index as f64) / (count as f64);
                Point {
                    x: config.origin_x + radius * angle.cos(),
                    y: config.origin_y + radius * angle.sin(),
                }
            }
        };

        *index += 1;
        positions.insert(node.id.clone(), point);
    }

    positions
}
