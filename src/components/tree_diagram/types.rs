use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of the host-supplied tree.
///
/// Only `name`, `children`, `stage` and `percent` are read by the diagram; every other field is
/// kept in `extra` and carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
	#[serde(default)]
	pub name: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<RawNode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stage: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub percent: Option<f64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl RawNode {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
		self.children = children;
		self
	}

	pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
		self.stage = Some(stage.into());
		self
	}

	pub fn with_percent(mut self, percent: f64) -> Self {
		self.percent = Some(percent);
		self
	}

	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	/// Number of nodes in this subtree, including `self`.
	pub fn node_count(&self) -> usize {
		let mut count = 0;
		let mut stack = vec![self];
		while let Some(node) = stack.pop() {
			count += 1;
			stack.extend(&node.children);
		}
		count
	}
}

#[cfg(test)]
impl RawNode {
	/// `n0 -> n1 -> ... -> n{depth}`, one child per level.
	pub(crate) fn chain(depth: usize) -> Self {
		let mut node = RawNode::new(format!("n{depth}"));
		for d in (0..depth).rev() {
			node = RawNode::new(format!("n{d}")).with_children(vec![node]);
		}
		node
	}

	/// Drops a deep tree level by level instead of through nested drops.
	pub(crate) fn dismantle(mut self) {
		let mut next = self.children.pop();
		while let Some(mut node) = next {
			next = node.children.pop();
		}
	}
}

/// The per-node payload a drawn box needs, detached from the raw children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeLabel {
	pub name: String,
	pub stage: Option<String>,
	pub percent: Option<f64>,
	pub extra: Map<String, Value>,
}

impl NodeLabel {
	/// Stage header text, if the node has a non-empty stage.
	pub fn stage(&self) -> Option<&str> {
		self.stage.as_deref().filter(|s| !s.is_empty())
	}

	/// Percent badge text. Zero renders as absent.
	pub fn percent_badge(&self) -> Option<String> {
		self.percent
			.filter(|p| *p != 0.0 && !p.is_nan())
			.map(|p| format!("{}%", p))
	}
}

impl From<&RawNode> for NodeLabel {
	fn from(raw: &RawNode) -> Self {
		Self {
			name: raw.name.clone(),
			stage: raw.stage.clone(),
			percent: raw.percent,
			extra: raw.extra.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_nested_json_and_keeps_extra_fields() {
		let raw = RawNode::from_json(
			r#"{"name":"root","owner":"ops","children":[{"name":"A","percent":40},{"name":"B","stage":"draft","children":[{"name":"C"}]}]}"#,
		)
		.unwrap();

		assert_eq!(raw.name, "root");
		assert_eq!(raw.node_count(), 4);
		assert_eq!(raw.extra.get("owner"), Some(&Value::from("ops")));
		assert_eq!(raw.children[0].percent, Some(40.0));
		assert_eq!(raw.children[1].stage.as_deref(), Some("draft"));
		assert!(raw.children[1].children[0].children.is_empty());
	}

	#[test]
	fn counts_very_deep_chains() {
		let raw = RawNode::chain(50_000);
		assert_eq!(raw.node_count(), 50_001);
		raw.dismantle();
	}

	#[test]
	fn empty_children_array_is_a_leaf() {
		let raw = RawNode::from_json(r#"{"name":"leaf","children":[]}"#).unwrap();
		assert!(raw.children.is_empty());
	}

	#[test]
	fn zero_percent_and_empty_stage_render_as_placeholders() {
		let label = NodeLabel::from(&RawNode::new("n").with_stage("").with_percent(0.0));
		assert_eq!(label.stage(), None);
		assert_eq!(label.percent_badge(), None);

		let label = NodeLabel::from(&RawNode::new("n").with_stage("Review").with_percent(12.5));
		assert_eq!(label.stage(), Some("Review"));
		assert_eq!(label.percent_badge().as_deref(), Some("12.5%"));
		assert_eq!(
			NodeLabel::from(&RawNode::new("n").with_percent(42.0)).percent_badge().as_deref(),
			Some("42%")
		);
	}
}
