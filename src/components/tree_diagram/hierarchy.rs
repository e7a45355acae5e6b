use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Index;

use super::layout::Point;
use super::types::{NodeLabel, RawNode};

/// Stable identity of a node across layouts. Assigned the first time a node becomes visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Slot of a node in the hierarchy arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(usize);

/// Hands out node ids for one hierarchy. Ids start at 1 and are never reused.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
	last: u64,
}

impl IdGenerator {
	pub fn next_id(&mut self) -> NodeId {
		self.last += 1;
		NodeId(self.last)
	}
}

#[derive(Clone, Debug)]
pub struct TreeNode {
	pub label: NodeLabel,
	pub parent: Option<NodeIdx>,
	pub children: Vec<NodeIdx>,
	pub hidden_children: Vec<NodeIdx>,
	pub depth: usize,
	pub id: Option<NodeId>,
	/// Position from the latest layout, in layout space (x cross-axis, y along depth).
	pub pos: Point,
	/// Position captured right before the latest layout.
	pub prev: Point,
}

impl TreeNode {
	fn new(label: NodeLabel, parent: Option<NodeIdx>, depth: usize, anchor: Point) -> Self {
		Self {
			label,
			parent,
			children: Vec::new(),
			hidden_children: Vec::new(),
			depth,
			id: None,
			pos: anchor,
			prev: anchor,
		}
	}

	/// True when the node has descendants, shown or hidden.
	pub fn has_descendants(&self) -> bool {
		!self.children.is_empty() || !self.hidden_children.is_empty()
	}

	pub fn is_collapsed(&self) -> bool {
		!self.hidden_children.is_empty()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
	Collapsed,
	Expanded,
	Leaf,
}

/// Arena holding the whole tree. Parents are non-owning back references by slot.
#[derive(Clone, Debug)]
pub struct Hierarchy {
	nodes: Vec<TreeNode>,
	ids: IdGenerator,
	by_id: HashMap<NodeId, NodeIdx>,
}

impl Hierarchy {
	/// Builds the arena from raw input. Every node starts at `anchor`.
	pub fn build(raw: &RawNode, anchor: Point) -> Self {
		let mut nodes = vec![TreeNode::new(raw.into(), None, 0, anchor)];
		let mut queue = VecDeque::from([(raw, NodeIdx(0))]);

		while let Some((raw, idx)) = queue.pop_front() {
			let depth = nodes[idx.0].depth + 1;
			for child in &raw.children {
				let child_idx = NodeIdx(nodes.len());
				nodes.push(TreeNode::new(child.into(), Some(idx), depth, anchor));
				nodes[idx.0].children.push(child_idx);
				queue.push_back((child, child_idx));
			}
		}

		Self {
			nodes,
			ids: IdGenerator::default(),
			by_id: HashMap::new(),
		}
	}

	pub fn root(&self) -> NodeIdx {
		NodeIdx(0)
	}

	pub fn find(&self, id: NodeId) -> Option<NodeIdx> {
		self.by_id.get(&id).copied()
	}

	pub(super) fn node_mut(&mut self, idx: NodeIdx) -> &mut TreeNode {
		&mut self.nodes[idx.0]
	}

	/// Hides every subtree rooted at `current_depth >= max_depth`, including all of its
	/// descendants' own children.
	pub fn collapse_to_depth(&mut self, idx: NodeIdx, current_depth: usize, max_depth: usize) {
		let mut stack = vec![(idx, current_depth)];
		while let Some((idx, depth)) = stack.pop() {
			let node = &mut self.nodes[idx.0];
			if node.children.is_empty() {
				continue;
			}
			let children = if depth >= max_depth {
				node.hidden_children = std::mem::take(&mut node.children);
				&node.hidden_children
			} else {
				&node.children
			};
			stack.extend(children.iter().map(|&child| (child, depth + 1)));
		}
	}

	/// Swaps a node's shown and hidden children.
	pub fn toggle(&mut self, idx: NodeIdx) -> Toggle {
		let node = &mut self.nodes[idx.0];
		if !node.children.is_empty() {
			node.hidden_children = std::mem::take(&mut node.children);
			Toggle::Collapsed
		} else if !node.hidden_children.is_empty() {
			node.children = std::mem::take(&mut node.hidden_children);
			Toggle::Expanded
		} else {
			Toggle::Leaf
		}
	}

	/// Visible nodes in breadth-first order, root first.
	pub fn visible(&self) -> Vec<NodeIdx> {
		let mut order = vec![self.root()];
		let mut i = 0;
		while i < order.len() {
			order.extend_from_slice(&self.nodes[order[i].0].children);
			i += 1;
		}
		order
	}

	/// Parent/child pairs between visible nodes, in breadth-first order of the child.
	pub fn links(&self) -> Vec<(NodeIdx, NodeIdx)> {
		self.visible()
			.into_iter()
			.filter_map(|idx| self.nodes[idx.0].parent.map(|parent| (parent, idx)))
			.collect()
	}

	/// Gives an id to every visible node that does not have one yet and returns the visible
	/// order.
	pub fn reveal(&mut self) -> Vec<NodeIdx> {
		let visible = self.visible();
		for &idx in &visible {
			if self.nodes[idx.0].id.is_none() {
				let id = self.ids.next_id();
				self.nodes[idx.0].id = Some(id);
				self.by_id.insert(id, idx);
			}
		}
		visible
	}
}

impl Index<NodeIdx> for Hierarchy {
	type Output = TreeNode;

	fn index(&self, idx: NodeIdx) -> &TreeNode {
		&self.nodes[idx.0]
	}
}
