//! Tidy tree layout over the visible part of a [`Hierarchy`].
//!
//! Buchheim, Jünger and Leipert's linear-time variant of Walker's algorithm: a bottom-up walk
//! assigns preliminary offsets and merges subtree contours through threads, then a top-down
//! walk accumulates modifiers into final positions. Siblings are kept one unit apart, cousins
//! two. Units are scaled by the configured node size and the root lands on the origin.

use super::hierarchy::{Hierarchy, NodeIdx};

/// A position in layout space: `x` runs across siblings, `y` along depth.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Screen-space `(x, y)` for a horizontal tree: depth runs along the screen's x axis.
	pub fn screen(self) -> (f64, f64) {
		(self.y, self.x)
	}

	pub fn lerp(self, to: Point, t: f64) -> Point {
		Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
	}
}

/// SVG path of a horizontal cubic connector between two layout points.
pub fn link_path(source: Point, target: Point) -> String {
	let (sx, sy) = source.screen();
	let (tx, ty) = target.screen();
	let mx = (sx + tx) / 2.0;
	format!("M{sx},{sy}C{mx},{sy},{mx},{ty},{tx},{ty}")
}

#[derive(Debug)]
struct Slot {
	node: Option<NodeIdx>,
	parent: Option<usize>,
	children: Vec<usize>,
	/// Position among siblings.
	number: usize,
	prelim: f64,
	modifier: f64,
	change: f64,
	shift: f64,
	thread: Option<usize>,
	ancestor: usize,
	default_ancestor: Option<usize>,
	x: f64,
}

impl Slot {
	fn new(slot: usize, node: Option<NodeIdx>, parent: Option<usize>, number: usize) -> Self {
		Self {
			node,
			parent,
			children: Vec::new(),
			number,
			prelim: 0.0,
			modifier: 0.0,
			change: 0.0,
			shift: 0.0,
			thread: None,
			ancestor: slot,
			default_ancestor: None,
			x: 0.0,
		}
	}
}

const VIRTUAL_ROOT: usize = 0;
const ROOT: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeLayout {
	/// Cross-axis spacing per unit, along-axis spacing per depth level.
	pub node_size: (f64, f64),
}

impl TreeLayout {
	pub fn new(node_size: (f64, f64)) -> Self {
		Self { node_size }
	}

	/// Positions every visible node, moving each node's current position into `prev` first.
	pub fn apply(&self, hierarchy: &mut Hierarchy) {
		let positions = self.compute(hierarchy);
		for &(idx, pos) in &positions {
			let node = hierarchy.node_mut(idx);
			node.prev = node.pos;
			node.pos = pos;
		}
	}

	/// Layout positions for the visible nodes, without touching the hierarchy.
	pub fn compute(&self, hierarchy: &Hierarchy) -> Vec<(NodeIdx, Point)> {
		let mut slots = build_slots(hierarchy);
		for v in post_order(&slots, ROOT) {
			first_walk(&mut slots, v);
		}
		slots[VIRTUAL_ROOT].modifier = -slots[ROOT].prelim;
		// Slots are in breadth-first order, so every parent is placed before its children.
		for v in ROOT..slots.len() {
			second_walk(&mut slots, v);
		}

		let (dx, dy) = self.node_size;
		slots
			.iter()
			.filter_map(|slot| {
				let idx = slot.node?;
				let depth = hierarchy[idx].depth as f64;
				Some((idx, Point::new(slot.x * dx, depth * dy)))
			})
			.collect()
	}
}

/// Working slots for the visible tree under a virtual root, in breadth-first order.
fn build_slots(hierarchy: &Hierarchy) -> Vec<Slot> {
	let mut slots = vec![
		Slot::new(VIRTUAL_ROOT, None, None, 0),
		Slot::new(ROOT, Some(hierarchy.root()), Some(VIRTUAL_ROOT), 0),
	];
	slots[VIRTUAL_ROOT].children.push(ROOT);

	let mut i = ROOT;
	while i < slots.len() {
		let Some(idx) = slots[i].node else {
			i += 1;
			continue;
		};
		for (number, &child) in hierarchy[idx].children.iter().enumerate() {
			let slot = slots.len();
			slots.push(Slot::new(slot, Some(child), Some(i), number));
			slots[i].children.push(slot);
		}
		i += 1;
	}
	slots
}

fn separation(slots: &[Slot], a: usize, b: usize) -> f64 {
	if slots[a].parent == slots[b].parent {
		1.0
	} else {
		2.0
	}
}

fn next_left(slots: &[Slot], v: usize) -> Option<usize> {
	slots[v].children.first().copied().or(slots[v].thread)
}

fn next_right(slots: &[Slot], v: usize) -> Option<usize> {
	slots[v].children.last().copied().or(slots[v].thread)
}

/// Slots of the subtree at `root`, children left to right before their parent.
fn post_order(slots: &[Slot], root: usize) -> Vec<usize> {
	let mut order = Vec::with_capacity(slots.len());
	let mut stack = vec![root];
	while let Some(v) = stack.pop() {
		order.push(v);
		stack.extend_from_slice(&slots[v].children);
	}
	order.reverse();
	order
}

fn first_walk(slots: &mut [Slot], v: usize) {
	let Some(parent) = slots[v].parent else {
		return;
	};
	let number = slots[v].number;
	let left_sibling = (number > 0).then(|| slots[parent].children[number - 1]);

	if let (Some(&first), Some(&last)) = (slots[v].children.first(), slots[v].children.last()) {
		execute_shifts(slots, v);
		let midpoint = (slots[first].prelim + slots[last].prelim) / 2.0;
		match left_sibling {
			Some(w) => {
				slots[v].prelim = slots[w].prelim + separation(slots, v, w);
				slots[v].modifier = slots[v].prelim - midpoint;
			}
			None => slots[v].prelim = midpoint,
		}
	} else if let Some(w) = left_sibling {
		slots[v].prelim = slots[w].prelim + separation(slots, v, w);
	}

	let ancestor = slots[parent]
		.default_ancestor
		.unwrap_or(slots[parent].children[0]);
	slots[parent].default_ancestor = Some(apportion(slots, v, left_sibling, ancestor));
}

fn second_walk(slots: &mut [Slot], v: usize) {
	if let Some(parent) = slots[v].parent {
		let parent_modifier = slots[parent].modifier;
		slots[v].x = slots[v].prelim + parent_modifier;
		slots[v].modifier += parent_modifier;
	}
}

fn execute_shifts(slots: &mut [Slot], v: usize) {
	let mut shift = 0.0;
	let mut change = 0.0;
	for w in slots[v].children.clone().into_iter().rev() {
		slots[w].prelim += shift;
		slots[w].modifier += shift;
		change += slots[w].change;
		shift += slots[w].shift + change;
	}
}

fn move_subtree(slots: &mut [Slot], wm: usize, wp: usize, shift: f64) {
	let subtrees = slots[wp].number.saturating_sub(slots[wm].number).max(1) as f64;
	let change = shift / subtrees;
	slots[wp].change -= change;
	slots[wp].shift += shift;
	slots[wm].change += change;
	slots[wp].prelim += shift;
	slots[wp].modifier += shift;
}

fn next_ancestor(slots: &[Slot], vim: usize, v: usize, ancestor: usize) -> usize {
	let candidate = slots[vim].ancestor;
	if slots[candidate].parent == slots[v].parent {
		candidate
	} else {
		ancestor
	}
}

fn apportion(slots: &mut [Slot], v: usize, left_sibling: Option<usize>, ancestor: usize) -> usize {
	let Some(w) = left_sibling else {
		return ancestor;
	};
	let Some(parent) = slots[v].parent else {
		return ancestor;
	};
	let mut ancestor = ancestor;

	// Inner/outer contours on the right (p) and left (m) side of the gap between w and v.
	let mut vip = v;
	let mut vop = v;
	let mut vim = w;
	let mut vom = slots[parent].children[0];
	let mut sip = slots[vip].modifier;
	let mut sop = slots[vop].modifier;
	let mut sim = slots[vim].modifier;
	let mut som = slots[vom].modifier;

	let mut next_im = next_right(slots, vim);
	let mut next_ip = next_left(slots, vip);
	while let (Some(im), Some(ip)) = (next_im, next_ip) {
		vim = im;
		vip = ip;
		// Outer contours are at least as deep as the inner ones.
		vom = next_left(slots, vom).unwrap_or(vom);
		vop = next_right(slots, vop).unwrap_or(vop);
		slots[vop].ancestor = v;

		let shift =
			slots[vim].prelim + sim - slots[vip].prelim - sip + separation(slots, vim, vip);
		if shift > 0.0 {
			let wm = next_ancestor(slots, vim, v, ancestor);
			move_subtree(slots, wm, v, shift);
			sip += shift;
			sop += shift;
		}

		sim += slots[vim].modifier;
		sip += slots[vip].modifier;
		som += slots[vom].modifier;
		sop += slots[vop].modifier;

		next_im = next_right(slots, vim);
		next_ip = next_left(slots, vip);
	}

	if let Some(im) = next_im {
		if next_right(slots, vop).is_none() {
			slots[vop].thread = Some(im);
			slots[vop].modifier += sim - sop;
		}
	}
	if let Some(ip) = next_ip {
		if next_left(slots, vom).is_none() {
			slots[vom].thread = Some(ip);
			slots[vom].modifier += sip - som;
			ancestor = v;
		}
	}
	ancestor
}
