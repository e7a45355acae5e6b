use leptos::prelude::*;

use crate::components::tree_diagram::{RawNode, TreeDiagram};

const SAMPLE_TREE: &str = include_str!("../../assets/sample_tree.json");

/// Demo page: the sample plan tree with a control for how deep it opens.
#[component]
pub fn Home() -> impl IntoView {
	let depth = RwSignal::new(1usize);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="diagram-page">
				<div class="diagram-header">
					<h1>"Tree Diagram"</h1>
					<p class="subtitle">
						"Click a node to expand or collapse it. Scroll or pinch to zoom. Drag to pan."
					</p>
					<label class="depth-control">
						"Open depth: " {move || depth.get()}
						<input
							type="range"
							min="0"
							max="4"
							prop:value=move || depth.get().to_string()
							on:input=move |ev| {
								if let Ok(value) = event_target_value(&ev).parse() {
									depth.set(value);
								}
							}
						/>
					</label>
				</div>
				{move || {
					RawNode::from_json(SAMPLE_TREE)
						.map(|data| {
							view! { <TreeDiagram data=Some(data) initial_open_depth=depth /> }
						})
				}}
			</div>
		</ErrorBoundary>
	}
}
