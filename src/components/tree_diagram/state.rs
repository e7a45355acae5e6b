use log::debug;

use super::config::DiagramConfig;
use super::hierarchy::{Hierarchy, NodeId, NodeIdx, Toggle};
use super::layout::TreeLayout;
use super::scene::{
	Anchor, LinkFrame, NodeFrame, Scene, ScenePatch, Segment, VisibleLink, VisibleNode, VisibleSet,
};
use super::types::RawNode;
use super::viewport::{Viewport, ZoomTransform};

/// Key of a drawn element. Node ids restart with every rebuilt hierarchy, so the build
/// generation is part of the key and a new tree never inherits an old tree's elements.
pub type DrawKey = (u64, NodeId);

/// Everything the view needs to draw one frame. Nodes and links are sorted by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
	pub generation: u64,
	pub transform: ZoomTransform,
	pub nodes: Vec<NodeFrame>,
	pub links: Vec<LinkFrame>,
}

impl Frame {
	pub fn node(&self, id: NodeId) -> Option<&NodeFrame> {
		let i = self.nodes.binary_search_by_key(&id, |n| n.id).ok()?;
		self.nodes.get(i)
	}

	pub fn link(&self, id: NodeId) -> Option<&LinkFrame> {
		let i = self.links.binary_search_by_key(&id, |l| l.id).ok()?;
		self.links.get(i)
	}

	pub fn keyed_nodes(&self) -> Vec<(DrawKey, NodeFrame)> {
		self.nodes
			.iter()
			.map(|n| ((self.generation, n.id), n.clone()))
			.collect()
	}

	pub fn keyed_links(&self) -> Vec<(DrawKey, LinkFrame)> {
		self.links
			.iter()
			.map(|l| ((self.generation, l.id), l.clone()))
			.collect()
	}
}

/// The drawing surface as the browser reports it when a node is clicked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
	/// Client size of the drawing, in CSS pixels.
	pub bounds: (f64, f64),
	pub window_width: f64,
}

pub struct TreeDiagramState {
	pub hierarchy: Hierarchy,
	pub layout: TreeLayout,
	pub scene: Scene,
	pub viewport: Viewport,
	pub config: DiagramConfig,
	generation: u64,
	dirty: bool,
}

impl TreeDiagramState {
	/// Builds the diagram, or nothing when there is no data.
	pub fn mount(
		data: Option<&RawNode>,
		initial_open_depth: usize,
		width: f64,
		config: DiagramConfig,
	) -> Option<Self> {
		data.map(|data| Self::new(data, initial_open_depth, width, config))
	}

	pub fn new(data: &RawNode, initial_open_depth: usize, width: f64, config: DiagramConfig) -> Self {
		let mut hierarchy = Hierarchy::build(data, config.root_anchor());
		hierarchy.collapse_to_depth(hierarchy.root(), 0, initial_open_depth);

		let mut state = Self {
			layout: TreeLayout::new(config.node_size),
			scene: Scene::new(config.duration_ms),
			viewport: Viewport::new(width, config.height, &config),
			hierarchy,
			config,
			generation: 0,
			dirty: true,
		};
		let root = state.hierarchy.root();
		let patch = state.update(root);
		debug!(
			"tree diagram mounted: {} nodes, {} visible, open depth {}",
			data.node_count(),
			patch.nodes.enter.len(),
			initial_open_depth
		);
		state
	}

	/// Tags a rebuilt diagram so its drawn elements are keyed apart from the previous build's.
	pub fn with_generation(mut self, generation: u64) -> Self {
		self.generation = generation;
		self
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Re-lays-out the visible tree and joins it with the drawing. `source` is the node whose
	/// toggle caused the update.
	fn update(&mut self, source: NodeIdx) -> ScenePatch {
		self.layout.apply(&mut self.hierarchy);
		let visible = self.hierarchy.reveal();
		let h = &self.hierarchy;

		let nodes = visible
			.iter()
			.filter_map(|&idx| {
				let node = &h[idx];
				Some(VisibleNode {
					id: node.id?,
					label: node.label.clone(),
					expandable: node.has_descendants(),
					pos: node.pos,
				})
			})
			.collect();
		let links = h
			.links()
			.into_iter()
			.filter_map(|(parent, child)| {
				Some(VisibleLink {
					id: h[child].id?,
					segment: Segment {
						source: h[parent].pos,
						target: h[child].pos,
					},
				})
			})
			.collect();

		let anchor = Anchor {
			before: h[source].prev,
			after: h[source].pos,
		};
		self.dirty = true;
		self.scene.apply(&VisibleSet { nodes, links }, anchor)
	}

	/// Expands or collapses the node and focuses the viewport on it. Leaves only get the focus.
	pub fn toggle(&mut self, id: NodeId, surface: Surface) -> Option<Toggle> {
		let idx = self.hierarchy.find(id)?;
		let toggle = self.hierarchy.toggle(idx);
		if toggle != Toggle::Leaf {
			let patch = self.update(idx);
			debug!(
				"node {id} {toggle:?}: {} entering, {} exiting",
				patch.nodes.enter.len(),
				patch.nodes.exit.len()
			);
		}
		self.focus(idx, surface);
		Some(toggle)
	}

	/// Click on a node. Ignored when the click ends a drag of the canvas.
	pub fn click(&mut self, id: NodeId, surface: Surface) -> Option<Toggle> {
		if self.viewport.take_suppressed_click() {
			return None;
		}
		self.toggle(id, surface)
	}

	/// Click that hit no node. Still ends any pending drag suppression.
	pub fn click_background(&mut self) {
		self.viewport.take_suppressed_click();
	}

	fn focus(&mut self, idx: NodeIdx, surface: Surface) {
		let pos = self.hierarchy[idx].pos;
		let mobile = self.config.is_mobile(surface.window_width);
		debug!("focus on ({}, {}), mobile: {mobile}", pos.x, pos.y);
		self.viewport.zoom_to_node(pos, surface.bounds, mobile);
		self.dirty = true;
	}

	pub fn zoom_in(&mut self) {
		self.viewport.zoom_in();
		self.dirty = true;
	}

	pub fn zoom_out(&mut self) {
		self.viewport.zoom_out();
		self.dirty = true;
	}

	/// Marks the frame stale after a direct viewport change such as a gesture.
	pub fn touch(&mut self) {
		self.dirty = true;
	}

	/// Advances every transition to `now`. Returns true when the frame needs redrawing.
	pub fn tick(&mut self, now: f64) -> bool {
		let was_settled = self.scene.is_settled();
		self.scene.tick(now);
		let zooming = self.viewport.tick(now);
		let moving = !was_settled || !self.scene.is_settled();
		std::mem::take(&mut self.dirty) || moving || zooming
	}

	pub fn frame(&self) -> Frame {
		Frame {
			generation: self.generation,
			transform: self.viewport.transform(),
			nodes: self.scene.node_frames(),
			links: self.scene.link_frames(),
		}
	}

	/// Id of the first visible node with this name.
	pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
		self.hierarchy
			.visible()
			.into_iter()
			.find(|&idx| self.hierarchy[idx].label.name == name)
			.and_then(|idx| self.hierarchy[idx].id)
	}

	pub fn visible_names(&self) -> Vec<String> {
		self.hierarchy
			.visible()
			.into_iter()
			.map(|idx| self.hierarchy[idx].label.name.clone())
			.collect()
	}
}
