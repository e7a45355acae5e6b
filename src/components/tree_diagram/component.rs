use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, TouchEvent, WheelEvent, Window};

use super::config::{DEFAULT_OPEN_DEPTH, DiagramConfig};
use super::hierarchy::NodeId;
use super::render;
use super::scene::{LinkFrame, NodeFrame};
use super::state::{DrawKey, Frame, Surface, TreeDiagramState};
use super::types::RawNode;
use super::viewport::{ClientRect, client_to_view};

type SharedState = Rc<RefCell<Option<TreeDiagramState>>>;

fn client_rect(svg_ref: NodeRef<leptos::svg::Svg>) -> Option<ClientRect> {
	let svg = svg_ref.get_untracked()?;
	let rect = svg.get_bounding_client_rect();
	Some(ClientRect {
		left: rect.left(),
		top: rect.top(),
		width: rect.width(),
		height: rect.height(),
	})
}

fn surface(svg_ref: NodeRef<leptos::svg::Svg>) -> Option<Surface> {
	let rect = client_rect(svg_ref)?;
	let window: Window = web_sys::window()?;
	let window_width = window.inner_width().ok()?.as_f64()?;
	Some(Surface {
		bounds: (rect.width, rect.height),
		window_width,
	})
}

/// Client coordinates to viewBox coordinates of the drawing.
fn view_point(
	svg_ref: NodeRef<leptos::svg::Svg>,
	state: &TreeDiagramState,
	client: (i32, i32),
) -> Option<(f64, f64)> {
	let rect = client_rect(svg_ref)?;
	let client = (client.0 as f64, client.1 as f64);
	Some(client_to_view(client, rect, state.viewport.size()))
}

/// Node under the event target, found through the `data-node` attribute of its group.
fn node_at_target(ev: &MouseEvent) -> Option<NodeId> {
	let target: Element = ev.target()?.dyn_into().ok()?;
	let group = target.closest("[data-node]").ok()??;
	let id = group.get_attribute("data-node")?.parse().ok()?;
	Some(NodeId(id))
}

fn touch_points(ev: &TouchEvent) -> Vec<(i32, i32)> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.map(|t| (t.client_x(), t.client_y()))
		.collect()
}

fn start_frame_loop(state: SharedState, frame: RwSignal<Frame>) {
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let animate_inner = animate.clone();
	*animate.borrow_mut() = Some(Closure::new(move |now: f64| {
		let next = state
			.borrow_mut()
			.as_mut()
			.and_then(|s| s.tick(now).then(|| s.frame()));
		if let Some(next) = next {
			frame.set(next);
		}
		if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let (Some(cb), Some(window)) = (animate.borrow().as_ref(), web_sys::window()) {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

/// Collapsible, zoomable tree diagram.
///
/// Rebuilt from scratch whenever `data` or `initial_open_depth` changes; toggles mutate the
/// existing tree so node identities and animations carry over.
#[component]
pub fn TreeDiagram(
	#[prop(into)] data: Signal<Option<RawNode>>,
	#[prop(into, default = Signal::stored(DEFAULT_OPEN_DEPTH))] initial_open_depth: Signal<usize>,
	#[prop(optional)] config: Option<DiagramConfig>,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let svg_ref = NodeRef::<leptos::svg::Svg>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let frame = RwSignal::new(Frame::default());
	let view_box = RwSignal::new(format!("0 0 0 {}", config.height));
	let loop_started = Rc::new(RefCell::new(false));

	// Every rebuild gets a new generation; drawn elements are keyed by generation and id.
	let state_init = state.clone();
	Effect::new(move |generation: Option<u64>| {
		let generation = generation.map_or(0, |g| g + 1);
		let data = data.get();
		let depth = initial_open_depth.get();
		let Some(svg) = svg_ref.get() else {
			return generation;
		};
		let width = svg
			.parent_element()
			.map(|p| p.client_width() as f64)
			.unwrap_or(0.0);
		view_box.set(format!("0 0 {} {}", width, config.height));

		let mounted = TreeDiagramState::mount(data.as_ref(), depth, width, config)
			.map(|s| s.with_generation(generation));
		frame.set(mounted.as_ref().map(TreeDiagramState::frame).unwrap_or_default());
		*state_init.borrow_mut() = mounted;

		if !std::mem::replace(&mut *loop_started.borrow_mut(), true) {
			start_frame_loop(state_init.clone(), frame);
		}
		generation
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(point) = view_point(svg_ref, s, (ev.client_x(), ev.client_y())) {
				s.viewport.pan_start(point);
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.viewport.pan_state().active {
				return;
			}
			if let Some(point) = view_point(svg_ref, s, (ev.client_x(), ev.client_y())) {
				s.viewport.pan_move(point);
				s.touch();
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.viewport.pan_end();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.viewport.pan_end();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			if let Some(point) = view_point(svg_ref, s, (ev.client_x(), ev.client_y())) {
				s.viewport
					.wheel(point, ev.delta_y(), ev.delta_mode(), ev.ctrl_key());
				s.touch();
			}
		}
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		ev.prevent_default();
		if let Some(ref mut s) = *state_dc.borrow_mut() {
			if let Some(point) = view_point(svg_ref, s, (ev.client_x(), ev.client_y())) {
				s.viewport.dblclick(point, ev.shift_key());
				s.touch();
			}
		}
	};

	let state_ck = state.clone();
	let on_click = move |ev: MouseEvent| {
		if let Some(ref mut s) = *state_ck.borrow_mut() {
			match (node_at_target(&ev), surface(svg_ref)) {
				(Some(id), Some(surface)) => {
					s.click(id, surface);
				}
				_ => s.click_background(),
			}
		}
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		if let Some(ref mut s) = *state_ts.borrow_mut() {
			let points: Vec<_> = touch_points(&ev)
				.into_iter()
				.filter_map(|p| view_point(svg_ref, s, p))
				.collect();
			match points.as_slice() {
				[a] => s.viewport.pan_start(*a),
				[a, b, ..] => s.viewport.pinch_start(*a, *b),
				[] => {}
			}
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		if let Some(ref mut s) = *state_tm.borrow_mut() {
			let points: Vec<_> = touch_points(&ev)
				.into_iter()
				.filter_map(|p| view_point(svg_ref, s, p))
				.collect();
			match points.as_slice() {
				[a] if !s.viewport.is_pinching() => s.viewport.pan_move(*a),
				[a, b, ..] => s.viewport.pinch_move(*a, *b),
				_ => return,
			}
			s.touch();
		}
	};

	let state_te = state.clone();
	let on_touchend = move |ev: TouchEvent| {
		if let Some(ref mut s) = *state_te.borrow_mut() {
			let points: Vec<_> = touch_points(&ev)
				.into_iter()
				.filter_map(|p| view_point(svg_ref, s, p))
				.collect();
			match points.as_slice() {
				[] => {
					s.viewport.pinch_end();
					s.viewport.pan_end();
				}
				[a] => {
					s.viewport.pinch_end();
					s.viewport.pan_start(*a);
				}
				_ => {}
			}
		}
	};

	let state_zi = state.clone();
	let zoom_in = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_zi.borrow_mut() {
			s.zoom_in();
		}
	};

	let state_zo = state.clone();
	let zoom_out = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_zo.borrow_mut() {
			s.zoom_out();
		}
	};

	let node_box = config.node_box;

	view! {
		<div class="tree-diagram" style="position: relative;">
			<svg
				node_ref=svg_ref
				class="tree-diagram-canvas"
				viewBox=move || view_box.get()
				preserveAspectRatio="xMidYMid meet"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:dblclick=on_dblclick
				on:click=on_click
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; width: 100%; cursor: grab;"
			>
				<g transform=move || frame.with(|f| f.transform.to_svg())>
					<For
						each=move || frame.with(Frame::keyed_links)
						key=|(key, _): &(DrawKey, LinkFrame)| *key
						children=move |(_, link): (DrawKey, LinkFrame)| {
							view! { <path class="link" d=render::link_d(frame, link.id) /> }
						}
					/>
					<For
						each=move || frame.with(Frame::keyed_nodes)
						key=|(key, _): &(DrawKey, NodeFrame)| *key
						children=move |(_, node): (DrawKey, NodeFrame)| {
							let cursor = if node.expandable { "cursor: pointer;" } else { "" };
							view! {
								<g
									class="node"
									data-node=node.id.to_string()
									style=cursor
									transform=render::node_transform(frame, node.id)
								>
									{render::node_box(&node.label, node.expandable, &node_box)}
								</g>
							}
						}
					/>
				</g>
			</svg>

			<div class="zoom-buttons">
				<button class="zoom-button" on:click=zoom_in>
					"+"
				</button>
				<button class="zoom-button" on:click=zoom_out>
					"−"
				</button>
			</div>
		</div>
	}
}
