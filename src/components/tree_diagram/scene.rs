use std::collections::{BTreeMap, HashMap};

use super::diff::{Reconciliation, reconcile};
use super::hierarchy::NodeId;
use super::layout::{Point, link_path};
use super::transition::{Lerp, Transition};
use super::types::NodeLabel;

/// Endpoints of a drawn link, in layout space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
	pub source: Point,
	pub target: Point,
}

impl Segment {
	/// A zero-length link sitting on `point`.
	pub fn collapsed(point: Point) -> Self {
		Self {
			source: point,
			target: point,
		}
	}

	pub fn path(&self) -> String {
		link_path(self.source, self.target)
	}
}

impl Lerp for Segment {
	fn lerp(self, to: Self, t: f64) -> Self {
		Self {
			source: self.source.lerp(to.source, t),
			target: self.target.lerp(to.target, t),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisibleNode {
	pub id: NodeId,
	pub label: NodeLabel,
	pub expandable: bool,
	pub pos: Point,
}

/// A link is keyed by the id of its target node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleLink {
	pub id: NodeId,
	pub segment: Segment,
}

/// Everything the latest layout wants on screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleSet {
	pub nodes: Vec<VisibleNode>,
	pub links: Vec<VisibleLink>,
}

/// Where the toggled node was before the latest layout and where it is now. Entering elements
/// grow out of `before`, exiting ones shrink into `after`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
	pub before: Point,
	pub after: Point,
}

#[derive(Clone, Debug)]
struct NodeSprite {
	label: NodeLabel,
	expandable: bool,
	motion: Transition<Point>,
	exiting: bool,
}

#[derive(Clone, Debug)]
struct LinkSprite {
	motion: Transition<Segment>,
	exiting: bool,
}

/// A node as drawn on the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeFrame {
	pub id: NodeId,
	pub label: NodeLabel,
	pub expandable: bool,
	pub pos: Point,
	pub exiting: bool,
}

impl NodeFrame {
	pub fn transform(&self) -> String {
		let (x, y) = self.pos.screen();
		format!("translate({x},{y})")
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkFrame {
	pub id: NodeId,
	pub path: String,
	pub exiting: bool,
}

/// What each update did to the drawing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenePatch {
	pub nodes: Reconciliation<NodeId>,
	pub links: Reconciliation<NodeId>,
}

/// The retained set of drawn elements and their in-flight transitions.
#[derive(Clone, Debug)]
pub struct Scene {
	nodes: BTreeMap<NodeId, NodeSprite>,
	links: BTreeMap<NodeId, LinkSprite>,
	duration: f64,
	clock: f64,
}

impl Scene {
	pub fn new(duration: f64) -> Self {
		Self {
			nodes: BTreeMap::new(),
			links: BTreeMap::new(),
			duration,
			clock: 0.0,
		}
	}

	/// Joins the drawn elements with `next` and starts the enter/update/exit transitions.
	pub fn apply(&mut self, next: &VisibleSet, anchor: Anchor) -> ScenePatch {
		let (clock, duration) = (self.clock, self.duration);

		let old: Vec<NodeId> = self.nodes.keys().copied().collect();
		let new: Vec<NodeId> = next.nodes.iter().map(|n| n.id).collect();
		let nodes = reconcile(&old, &new);
		let targets: HashMap<NodeId, &VisibleNode> = next.nodes.iter().map(|n| (n.id, n)).collect();

		for id in &nodes.enter {
			let node = targets[id];
			self.nodes.insert(
				*id,
				NodeSprite {
					label: node.label.clone(),
					expandable: node.expandable,
					motion: Transition::new(anchor.before, node.pos, duration),
					exiting: false,
				},
			);
		}
		for id in &nodes.update {
			let node = targets[id];
			if let Some(sprite) = self.nodes.get_mut(id) {
				sprite.label = node.label.clone();
				sprite.expandable = node.expandable;
				sprite.motion = sprite.motion.retarget(clock, node.pos, duration);
				sprite.exiting = false;
			}
		}
		for id in &nodes.exit {
			if let Some(sprite) = self.nodes.get_mut(id) {
				sprite.motion = sprite.motion.retarget(clock, anchor.after, duration);
				sprite.exiting = true;
			}
		}

		let old: Vec<NodeId> = self.links.keys().copied().collect();
		let new: Vec<NodeId> = next.links.iter().map(|l| l.id).collect();
		let links = reconcile(&old, &new);
		let targets: HashMap<NodeId, Segment> =
			next.links.iter().map(|l| (l.id, l.segment)).collect();

		for id in &links.enter {
			let motion = Transition::new(Segment::collapsed(anchor.before), targets[id], duration);
			self.links.insert(
				*id,
				LinkSprite {
					motion,
					exiting: false,
				},
			);
		}
		for id in &links.update {
			if let Some(sprite) = self.links.get_mut(id) {
				sprite.motion = sprite.motion.retarget(clock, targets[id], duration);
				sprite.exiting = false;
			}
		}
		for id in &links.exit {
			if let Some(sprite) = self.links.get_mut(id) {
				let collapsed = Segment::collapsed(anchor.after);
				sprite.motion = sprite.motion.retarget(clock, collapsed, duration);
				sprite.exiting = true;
			}
		}

		ScenePatch { nodes, links }
	}

	/// Advances the clock, starting pending transitions and dropping finished exits.
	pub fn tick(&mut self, now: f64) {
		self.clock = now;
		for sprite in self.nodes.values_mut() {
			sprite.motion.begin(now);
		}
		for sprite in self.links.values_mut() {
			sprite.motion.begin(now);
		}
		self.nodes
			.retain(|_, s| !(s.exiting && s.motion.is_finished(now)));
		self.links
			.retain(|_, s| !(s.exiting && s.motion.is_finished(now)));
	}

	/// True once every transition has run to completion.
	pub fn is_settled(&self) -> bool {
		let now = self.clock;
		self.nodes.values().all(|s| s.motion.is_finished(now))
			&& self.links.values().all(|s| s.motion.is_finished(now))
	}

	pub fn node_frames(&self) -> Vec<NodeFrame> {
		self.nodes
			.iter()
			.map(|(&id, s)| NodeFrame {
				id,
				label: s.label.clone(),
				expandable: s.expandable,
				pos: s.motion.value_at(self.clock),
				exiting: s.exiting,
			})
			.collect()
	}

	pub fn link_frames(&self) -> Vec<LinkFrame> {
		self.links
			.iter()
			.map(|(&id, s)| LinkFrame {
				id,
				path: s.motion.value_at(self.clock).path(),
				exiting: s.exiting,
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DURATION: f64 = 750.0;

	fn node(id: u64, x: f64, y: f64) -> VisibleNode {
		VisibleNode {
			id: NodeId(id),
			label: NodeLabel {
				name: format!("n{id}"),
				..Default::default()
			},
			expandable: false,
			pos: Point::new(x, y),
		}
	}

	fn link(id: u64, source: Point, target: Point) -> VisibleLink {
		VisibleLink {
			id: NodeId(id),
			segment: Segment { source, target },
		}
	}

	fn position(scene: &Scene, id: u64) -> Option<Point> {
		scene
			.node_frames()
			.into_iter()
			.find(|n| n.id == NodeId(id))
			.map(|n| n.pos)
	}

	fn two_nodes() -> VisibleSet {
		let root = Point::new(0.0, 0.0);
		let child = Point::new(0.0, -280.0);
		VisibleSet {
			nodes: vec![node(1, 0.0, 0.0), node(2, 0.0, -280.0)],
			links: vec![link(2, root, child)],
		}
	}

	#[test]
	fn entering_nodes_grow_out_of_the_anchor() {
		let mut scene = Scene::new(DURATION);
		let anchor = Anchor {
			before: Point::new(0.0, 120.0),
			after: Point::new(0.0, 0.0),
		};
		let patch = scene.apply(&two_nodes(), anchor);
		assert_eq!(patch.nodes.enter, [NodeId(1), NodeId(2)]);
		assert_eq!(patch.links.enter, [NodeId(2)]);

		assert_eq!(position(&scene, 2), Some(Point::new(0.0, 120.0)));
		assert_eq!(scene.link_frames()[0].path, Segment::collapsed(anchor.before).path());
		assert!(!scene.is_settled());

		scene.tick(100.0);
		scene.tick(100.0 + DURATION);
		assert_eq!(position(&scene, 2), Some(Point::new(0.0, -280.0)));
		assert_eq!(scene.link_frames()[0].path, "M0,0C-140,0,-140,0,-280,0");
		assert!(scene.is_settled());
	}

	#[test]
	fn exiting_nodes_collapse_into_the_anchor_and_are_removed() {
		let mut scene = Scene::new(DURATION);
		let root = Point::new(0.0, 0.0);
		scene.apply(&two_nodes(), Anchor { before: root, after: root });
		scene.tick(0.0);
		scene.tick(DURATION);

		let only_root = VisibleSet {
			nodes: vec![node(1, 0.0, 0.0)],
			links: vec![],
		};
		let patch = scene.apply(&only_root, Anchor { before: root, after: root });
		assert_eq!(patch.nodes.exit, [NodeId(2)]);
		assert_eq!(patch.nodes.update, [NodeId(1)]);
		assert_eq!(patch.links.exit, [NodeId(2)]);

		scene.tick(1000.0);
		assert_eq!(scene.node_frames().len(), 2);
		assert!(scene.node_frames()[1].exiting);
		scene.tick(1000.0 + DURATION / 2.0);
		assert_eq!(scene.node_frames().len(), 2);
		scene.tick(1000.0 + DURATION);
		assert_eq!(scene.node_frames().len(), 1);
		assert!(scene.link_frames().is_empty());
	}

	#[test]
	fn updates_retarget_from_the_displayed_position() {
		let mut scene = Scene::new(DURATION);
		let origin = Point::new(0.0, 0.0);
		scene.apply(
			&VisibleSet {
				nodes: vec![node(1, 0.0, 0.0)],
				links: vec![],
			},
			Anchor { before: Point::new(100.0, 0.0), after: origin },
		);
		scene.tick(0.0);
		scene.tick(DURATION / 2.0);
		let halfway = position(&scene, 1).unwrap();
		assert_eq!(halfway, Point::new(50.0, 0.0));

		scene.apply(
			&VisibleSet {
				nodes: vec![node(1, -60.0, 0.0)],
				links: vec![],
			},
			Anchor { before: origin, after: origin },
		);
		assert_eq!(position(&scene, 1), Some(halfway));
		scene.tick(DURATION);
		scene.tick(2.0 * DURATION);
		assert_eq!(position(&scene, 1), Some(Point::new(-60.0, 0.0)));
	}

	#[test]
	fn a_node_revealed_again_mid_exit_is_kept() {
		let mut scene = Scene::new(DURATION);
		let root = Point::new(0.0, 0.0);
		scene.apply(&two_nodes(), Anchor { before: root, after: root });
		scene.tick(0.0);
		scene.tick(DURATION);

		scene.apply(
			&VisibleSet {
				nodes: vec![node(1, 0.0, 0.0)],
				links: vec![],
			},
			Anchor { before: root, after: root },
		);
		scene.tick(1000.0);
		scene.tick(1100.0);

		let patch = scene.apply(&two_nodes(), Anchor { before: root, after: root });
		assert_eq!(patch.nodes.update, [NodeId(1), NodeId(2)]);
		assert!(patch.nodes.enter.is_empty());
		scene.tick(1200.0);
		scene.tick(1200.0 + DURATION);
		assert_eq!(scene.node_frames().len(), 2);
		assert!(scene.node_frames().iter().all(|n| !n.exiting));
		assert_eq!(position(&scene, 2), Some(Point::new(0.0, -280.0)));
	}

	#[test]
	fn node_transform_swaps_axes() {
		let frame = NodeFrame {
			id: NodeId(1),
			label: NodeLabel::default(),
			expandable: false,
			pos: Point::new(60.0, -280.0),
			exiting: false,
		};
		assert_eq!(frame.transform(), "translate(-280,60)");
	}
}
