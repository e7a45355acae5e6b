use serde::{Deserialize, Serialize};

use super::layout::Point;
use super::viewport::{ScaleExtent, ZoomTransform};

pub const DEFAULT_OPEN_DEPTH: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Default for Margin {
	fn default() -> Self {
		Self {
			top: 400.0,
			right: 200.0,
			bottom: 40.0,
			left: 100.0,
		}
	}
}

/// Size of the box drawn for each node, in layout units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeBox {
	pub width: f64,
	pub height: f64,
	/// Vertical offset of the box when a stage header is present.
	pub offset_with_stage: f64,
	pub offset_without_stage: f64,
}

impl Default for NodeBox {
	fn default() -> Self {
		Self {
			width: 190.0,
			height: 120.0,
			offset_with_stage: -35.0,
			offset_without_stage: -18.5,
		}
	}
}

/// Every tunable constant of the diagram. Hosts may deserialize a partial config; missing
/// fields take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
	pub height: f64,
	pub margin: Margin,
	pub duration_ms: f64,
	pub dblclick_duration_ms: f64,
	/// Cross-axis sibling spacing and along-axis depth spacing. A negative depth spacing grows
	/// the tree right-to-left.
	pub node_size: (f64, f64),
	pub scale_extent: ScaleExtent,
	pub initial_scale: f64,
	pub focus_scale: f64,
	pub mobile_focus_scale: f64,
	pub mobile_breakpoint: f64,
	pub zoom_in_factor: f64,
	pub zoom_out_factor: f64,
	pub node_box: NodeBox,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			height: 800.0,
			margin: Margin::default(),
			duration_ms: 750.0,
			dblclick_duration_ms: 250.0,
			node_size: (120.0, -280.0),
			scale_extent: ScaleExtent::default(),
			initial_scale: 0.7,
			focus_scale: 1.2,
			mobile_focus_scale: 1.0,
			mobile_breakpoint: 768.0,
			zoom_in_factor: 1.2,
			zoom_out_factor: 0.8,
			node_box: NodeBox::default(),
		}
	}
}

impl DiagramConfig {
	pub fn inner_width(&self, container_width: f64) -> f64 {
		container_width - self.margin.left - self.margin.right
	}

	pub fn inner_height(&self) -> f64 {
		self.height - self.margin.top - self.margin.bottom
	}

	/// Where the root sits before its first layout; the first nodes grow out of this point.
	pub fn root_anchor(&self) -> Point {
		Point::new(0.0, self.inner_height() / 3.0)
	}

	pub fn initial_transform(&self, container_width: f64) -> ZoomTransform {
		ZoomTransform::new(
			self.margin.left + self.inner_width(container_width),
			self.margin.top,
			self.initial_scale,
		)
	}

	pub fn is_mobile(&self, window_width: f64) -> bool {
		window_width < self.mobile_breakpoint
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn derived_geometry_matches_defaults() {
		let config = DiagramConfig::default();
		assert_eq!(config.inner_width(1000.0), 700.0);
		assert_eq!(config.inner_height(), 360.0);
		assert_eq!(config.root_anchor(), Point::new(0.0, 120.0));
		assert_eq!(
			config.initial_transform(1000.0),
			ZoomTransform::new(800.0, 400.0, 0.7)
		);
	}

	#[test]
	fn partial_json_config_keeps_defaults() {
		let config: DiagramConfig =
			serde_json::from_str(r#"{"duration_ms": 300, "node_box": {"width": 220}}"#).unwrap();
		assert_eq!(config.duration_ms, 300.0);
		assert_eq!(config.node_box.width, 220.0);
		assert_eq!(config.node_box.height, 120.0);
		assert_eq!(config.scale_extent, ScaleExtent::default());
		assert_eq!(config.node_size, (120.0, -280.0));
	}

	#[test]
	fn mobile_threshold_is_exclusive() {
		let config = DiagramConfig::default();
		assert!(config.is_mobile(767.0));
		assert!(!config.is_mobile(768.0));
	}
}
