use leptos::prelude::*;

use super::config::NodeBox;
use super::hierarchy::NodeId;
use super::scene::NodeFrame;
use super::state::Frame;
use super::types::NodeLabel;

fn placeholder() -> AnyView {
	view! { <div></div> }.into_any()
}

/// Fixed-size box for one node: optional stage header, name, optional percent side panel.
/// Missing optional parts still take their slot so every box has the same shape.
pub fn node_box(label: &NodeLabel, expandable: bool, size: &NodeBox) -> impl IntoView + use<> {
	let stage = label.stage().map(str::to_owned);
	let offset = if stage.is_some() {
		size.offset_with_stage
	} else {
		size.offset_without_stage
	};
	let class = if expandable {
		"node-box has-children"
	} else {
		"node-box"
	};
	let name_style = format!(
		"margin-top: {}; padding: 5px;",
		if stage.is_some() { "5px" } else { "0px" }
	);

	let stage = match stage {
		Some(stage) => view! { <div class="node-stage">{stage}</div> }.into_any(),
		None => placeholder(),
	};
	let percent = match label.percent_badge() {
		Some(badge) => view! { <div class="node-percent">{badge}</div> }.into_any(),
		None => placeholder(),
	};

	view! {
		<foreignObject
			x={(-size.width).to_string()}
			y={offset.to_string()}
			width={size.width.to_string()}
			height={size.height.to_string()}
		>
			<div class=class>
				<div class="node-row">
					<div class="node-main">
						{stage}
						<div class="node-name" style=name_style>
							{label.name.clone()}
						</div>
					</div>
					{percent}
				</div>
			</div>
		</foreignObject>
	}
}

/// Path attribute of a link on the latest frame; empty once the link is gone.
pub fn link_d(frame: RwSignal<Frame>, id: NodeId) -> impl Fn() -> String + Copy {
	move || {
		frame.with(|f| f.link(id).map(|l| l.path.clone()).unwrap_or_default())
	}
}

/// Transform attribute of a node on the latest frame.
pub fn node_transform(frame: RwSignal<Frame>, id: NodeId) -> impl Fn() -> String + Copy {
	move || {
		frame.with(|f| f.node(id).map(NodeFrame::transform).unwrap_or_default())
	}
}
