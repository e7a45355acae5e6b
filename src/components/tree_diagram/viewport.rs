use serde::{Deserialize, Serialize};

use super::config::DiagramConfig;
use super::layout::Point;
use super::transition::{Lerp, Transition};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleExtent {
	pub min: f64,
	pub max: f64,
}

impl Default for ScaleExtent {
	fn default() -> Self {
		Self { min: 0.5, max: 2.0 }
	}
}

impl ScaleExtent {
	pub fn clamp(&self, k: f64) -> f64 {
		k.max(self.min).min(self.max)
	}

	pub fn contains(&self, k: f64) -> bool {
		k >= self.min && k <= self.max
	}
}

/// Translate-then-scale transform applied to the whole drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ZoomTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ZoomTransform {
	pub const IDENTITY: Self = Self::new(0.0, 0.0, 1.0);

	pub const fn new(x: f64, y: f64, k: f64) -> Self {
		Self { x, y, k }
	}

	/// Drawing coordinates to viewport coordinates.
	pub fn apply(&self, (px, py): (f64, f64)) -> (f64, f64) {
		(self.x + self.k * px, self.y + self.k * py)
	}

	/// Viewport coordinates to drawing coordinates.
	pub fn invert(&self, (sx, sy): (f64, f64)) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Same transform at scale `k`, keeping the drawing point under `anchor` in place.
	pub fn scale_about(&self, k: f64, anchor: (f64, f64)) -> Self {
		let (wx, wy) = self.invert(anchor);
		Self::new(anchor.0 - wx * k, anchor.1 - wy * k, k)
	}

	pub fn is_finite(&self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.k.is_finite() && self.k > 0.0
	}

	pub fn to_svg(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}
}

impl Lerp for ZoomTransform {
	fn lerp(self, to: Self, t: f64) -> Self {
		Self::new(
			self.x + (to.x - self.x) * t,
			self.y + (to.y - self.y) * t,
			self.k + (to.k - self.k) * t,
		)
	}
}

/// Wheel delta in scale doublings, following the browser's delta mode.
pub fn wheel_delta(delta_y: f64, delta_mode: u32, ctrl: bool) -> f64 {
	let unit = match delta_mode {
		0 => 0.002,
		1 => 0.05,
		_ => 1.0,
	};
	-delta_y * unit * if ctrl { 10.0 } else { 1.0 }
}

/// Client rectangle of the drawing surface, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClientRect {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

/// Maps a client point into viewBox units for an `xMidYMid meet` surface.
pub fn client_to_view(client: (f64, f64), rect: ClientRect, view: (f64, f64)) -> (f64, f64) {
	let (cx, cy) = (client.0 - rect.left, client.1 - rect.top);
	let s = (rect.width / view.0).min(rect.height / view.1);
	if !s.is_finite() || s <= 0.0 {
		return (cx, cy);
	}
	let ox = (rect.width - view.0 * s) / 2.0;
	let oy = (rect.height - view.1 * s) / 2.0;
	((cx - ox) / s, (cy - oy) / s)
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct PinchState {
	/// Drawing points under each finger when the pinch began.
	world_a: (f64, f64),
	world_b: (f64, f64),
}

/// Owns the single transform of the drawing. Gestures and programmatic zooms both write it
/// through [`Viewport::set_transform`] or an animation settled in [`Viewport::tick`], and the
/// scale clamp is applied there.
#[derive(Clone, Debug)]
pub struct Viewport {
	transform: ZoomTransform,
	extent: ScaleExtent,
	width: f64,
	height: f64,
	animation: Option<Transition<ZoomTransform>>,
	pan: PanState,
	pinch: Option<PinchState>,
	suppress_click: bool,
	config: DiagramConfig,
}

impl Viewport {
	pub fn new(width: f64, height: f64, config: &DiagramConfig) -> Self {
		let mut viewport = Self {
			transform: ZoomTransform::IDENTITY,
			extent: config.scale_extent,
			width,
			height,
			animation: None,
			pan: PanState::default(),
			pinch: None,
			suppress_click: false,
			config: *config,
		};
		viewport.set_transform(config.initial_transform(width));
		viewport
	}

	pub fn transform(&self) -> ZoomTransform {
		self.transform
	}

	pub fn extent(&self) -> ScaleExtent {
		self.extent
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn is_animating(&self) -> bool {
		self.animation.is_some()
	}

	pub fn pan_state(&self) -> &PanState {
		&self.pan
	}

	fn clamped(&self, t: ZoomTransform) -> ZoomTransform {
		ZoomTransform::new(t.x, t.y, self.extent.clamp(t.k))
	}

	fn assign(&mut self, t: ZoomTransform) {
		let t = self.clamped(t);
		if t.is_finite() {
			self.transform = t;
		}
	}

	/// Jumps to `t`, interrupting any running animation.
	pub fn set_transform(&mut self, t: ZoomTransform) {
		self.animation = None;
		self.assign(t);
	}

	/// Animates from the displayed transform to `target` over `duration` milliseconds.
	pub fn animate_to(&mut self, target: ZoomTransform, duration: f64) {
		let target = self.clamped(target);
		if !target.is_finite() {
			return;
		}
		self.animation = Some(Transition::new(self.transform, target, duration));
	}

	/// Steps the running animation. Returns true while one is in flight.
	pub fn tick(&mut self, now: f64) -> bool {
		let Some(mut animation) = self.animation.take() else {
			return false;
		};
		animation.begin(now);
		self.assign(animation.value_at(now));
		if !animation.is_finished(now) {
			self.animation = Some(animation);
		}
		true
	}

	/// Multiplies the scale by `factor` about the viewport center, animated.
	pub fn scale_by(&mut self, factor: f64) {
		let center = (self.width / 2.0, self.height / 2.0);
		let k = self.extent.clamp(self.transform.k * factor);
		let target = self.transform.scale_about(k, center);
		self.animate_to(target, self.config.duration_ms);
	}

	pub fn zoom_in(&mut self) {
		self.scale_by(self.config.zoom_in_factor);
	}

	pub fn zoom_out(&mut self) {
		self.scale_by(self.config.zoom_out_factor);
	}

	/// Focus transform for `node` on a surface of `bounds` (CSS pixels).
	///
	/// On wide screens the node lands on the surface center. Narrow screens use a smaller
	/// scale and place the node at `width / 0.8` horizontally.
	pub fn focus_transform(&self, node: Point, bounds: (f64, f64), mobile: bool) -> ZoomTransform {
		let (width, height) = bounds;
		let (x, y) = node.screen();
		if mobile {
			let k = self.config.mobile_focus_scale;
			ZoomTransform::new(width / 0.8 - x * k, height / 2.0 - y * k, k)
		} else {
			let k = self.config.focus_scale;
			ZoomTransform::new(width / 2.0 - x * k, height / 2.0 - y * k, k)
		}
	}

	pub fn zoom_to_node(&mut self, node: Point, bounds: (f64, f64), mobile: bool) {
		let target = self.focus_transform(node, bounds, mobile);
		self.animate_to(target, self.config.duration_ms);
	}

	/// Starts a drag. A new press clears any suppression left by an earlier drag.
	pub fn pan_start(&mut self, (x, y): (f64, f64)) {
		self.animation = None;
		self.suppress_click = false;
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_move(&mut self, (x, y): (f64, f64)) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
		if dx != 0.0 || dy != 0.0 {
			self.pan.moved = true;
		}
		self.set_transform(ZoomTransform::new(
			self.pan.transform_start_x + dx,
			self.pan.transform_start_y + dy,
			self.transform.k,
		));
	}

	/// Ends a drag. A drag that moved swallows the click that follows it.
	pub fn pan_end(&mut self) {
		if self.pan.active && self.pan.moved {
			self.suppress_click = true;
		}
		self.pan.active = false;
	}

	/// Returns true once if the current click ends a drag and should be ignored.
	pub fn take_suppressed_click(&mut self) -> bool {
		std::mem::take(&mut self.suppress_click)
	}

	pub fn wheel(&mut self, anchor: (f64, f64), delta_y: f64, delta_mode: u32, ctrl: bool) {
		let k = self.transform.k * 2f64.powf(wheel_delta(delta_y, delta_mode, ctrl));
		let k = self.extent.clamp(k);
		let t = self.transform.scale_about(k, anchor);
		self.set_transform(t);
	}

	pub fn dblclick(&mut self, anchor: (f64, f64), shift: bool) {
		let factor = if shift { 0.5 } else { 2.0 };
		let k = self.extent.clamp(self.transform.k * factor);
		let target = self.transform.scale_about(k, anchor);
		self.animate_to(target, self.config.dblclick_duration_ms);
	}

	pub fn pinch_start(&mut self, a: (f64, f64), b: (f64, f64)) {
		self.animation = None;
		self.suppress_click = false;
		self.pan.active = false;
		self.pinch = Some(PinchState {
			world_a: self.transform.invert(a),
			world_b: self.transform.invert(b),
		});
	}

	pub fn pinch_move(&mut self, a: (f64, f64), b: (f64, f64)) {
		let Some(pinch) = self.pinch else {
			return;
		};
		let screen = distance(a, b);
		let world = distance(pinch.world_a, pinch.world_b);
		if world <= 0.0 {
			return;
		}
		let k = self.extent.clamp(screen / world);
		let p = midpoint(a, b);
		let l = midpoint(pinch.world_a, pinch.world_b);
		self.suppress_click = true;
		self.set_transform(ZoomTransform::new(p.0 - l.0 * k, p.1 - l.1 * k, k));
	}

	pub fn pinch_end(&mut self) {
		self.pinch = None;
	}

	pub fn is_pinching(&self) -> bool {
		self.pinch.is_some()
	}
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
	((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
	((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(1000.0, 800.0, &DiagramConfig::default())
	}

	fn settle(v: &mut Viewport, start: f64) {
		v.tick(start);
		v.tick(start + 10_000.0);
		assert!(!v.is_animating());
	}

	fn assert_close(a: f64, b: f64) {
		assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
	}

	#[test]
	fn opens_on_the_configured_initial_transform() {
		let v = viewport();
		assert_eq!(v.transform(), ZoomTransform::new(800.0, 400.0, 0.7));
	}

	#[test]
	fn zoom_buttons_scale_about_the_center() {
		let mut v = viewport();
		let center = (500.0, 400.0);
		let before = v.transform().invert(center);
		v.zoom_in();
		assert_eq!(v.transform().k, 0.7);
		settle(&mut v, 0.0);
		assert_close(v.transform().k, 0.84);
		let after = v.transform().invert(center);
		assert_close(after.0, before.0);
		assert_close(after.1, before.1);

		v.zoom_out();
		settle(&mut v, 20_000.0);
		assert_close(v.transform().k, 0.672);
	}

	#[test]
	fn scale_stays_in_range_under_any_sequence() {
		let mut v = viewport();
		let mut now = 0.0;
		for step in 0..40 {
			match step % 7 {
				0 | 1 | 2 => v.zoom_in(),
				3 => v.zoom_out(),
				4 => v.wheel((10.0, 20.0), -900.0, 0, true),
				5 => v.dblclick((300.0, 300.0), step % 2 == 0),
				_ => {
					v.pinch_start((0.0, 0.0), (10.0, 0.0));
					v.pinch_move((0.0, 0.0), (1000.0, 0.0));
					v.pinch_end();
				}
			}
			for _ in 0..3 {
				now += 200.0;
				v.tick(now);
				assert!(v.extent().contains(v.transform().k));
			}
		}
		for _ in 0..20 {
			v.zoom_out();
			settle(&mut v, now);
			now += 20_000.0;
		}
		assert_eq!(v.transform().k, 0.5);
		v.set_transform(ZoomTransform::new(0.0, 0.0, 50.0));
		assert_eq!(v.transform().k, 2.0);
	}

	#[test]
	fn zoom_to_node_centers_it_on_wide_screens() {
		let mut v = viewport();
		let node = Point::new(60.0, -280.0);
		v.zoom_to_node(node, (1000.0, 800.0), false);
		settle(&mut v, 0.0);

		let t = v.transform();
		assert_eq!(t.k, 1.2);
		let (sx, sy) = t.apply(node.screen());
		assert_close(sx, 500.0);
		assert_close(sy, 400.0);
	}

	#[test]
	fn zoom_to_node_uses_the_narrow_formula_on_mobile() {
		let v = viewport();
		let t = v.focus_transform(Point::new(60.0, -280.0), (400.0, 700.0), true);
		assert_eq!(t.k, 1.0);
		assert_close(t.x, 400.0 / 0.8 + 280.0);
		assert_close(t.y, 350.0 - 60.0);
		// The narrow formula does not reduce to the wide one at the same size.
		let wide = v.focus_transform(Point::new(60.0, -280.0), (400.0, 700.0), false);
		assert!((wide.x - t.x).abs() > 1.0);
	}

	#[test]
	fn drag_pans_and_swallows_the_next_click() {
		let mut v = viewport();
		v.pan_start((100.0, 100.0));
		v.pan_move((130.0, 90.0));
		v.pan_end();
		assert_eq!(v.transform(), ZoomTransform::new(830.0, 390.0, 0.7));
		assert!(v.take_suppressed_click());
		assert!(!v.take_suppressed_click());

		v.pan_start((0.0, 0.0));
		v.pan_end();
		assert!(!v.take_suppressed_click());
	}

	#[test]
	fn a_new_press_clears_a_stale_suppression() {
		let mut v = viewport();
		v.pan_start((0.0, 0.0));
		v.pan_move((25.0, 0.0));
		v.pan_end();
		v.pan_start((25.0, 0.0));
		v.pan_end();
		assert!(!v.take_suppressed_click());

		v.pinch_start((0.0, 0.0), (10.0, 0.0));
		v.pinch_move((0.0, 0.0), (20.0, 0.0));
		v.pinch_end();
		v.pinch_start((0.0, 0.0), (10.0, 0.0));
		v.pinch_end();
		assert!(!v.take_suppressed_click());
	}

	#[test]
	fn gestures_interrupt_programmatic_zoom() {
		let mut v = viewport();
		v.zoom_to_node(Point::new(0.0, 0.0), (1000.0, 800.0), false);
		v.tick(0.0);
		assert!(v.is_animating());
		v.pan_start((0.0, 0.0));
		assert!(!v.is_animating());
	}

	#[test]
	fn wheel_zooms_about_the_pointer() {
		let mut v = viewport();
		let pointer = (250.0, 125.0);
		let before = v.transform().invert(pointer);
		v.wheel(pointer, -100.0, 0, false);
		assert_close(v.transform().k, 0.7 * 2f64.powf(0.2));
		let after = v.transform().invert(pointer);
		assert_close(after.0, before.0);
		assert_close(after.1, before.1);
		assert_close(wheel_delta(3.0, 1, false), -0.15);
		assert_close(wheel_delta(1.0, 2, true), -10.0);
	}

	#[test]
	fn pinch_keeps_the_fingers_on_their_points() {
		let mut v = viewport();
		let (a, b) = ((400.0, 400.0), (500.0, 400.0));
		let world_a = v.transform().invert(a);
		v.pinch_start(a, b);
		let (a2, b2) = ((380.0, 400.0), (520.0, 400.0));
		v.pinch_move(a2, b2);
		assert_close(v.transform().k, 0.7 * 1.4);
		let moved = v.transform().invert(a2);
		assert_close(moved.0, world_a.0);
		assert!(v.take_suppressed_click());
	}

	#[test]
	fn client_points_map_into_the_view_box() {
		let rect = ClientRect {
			left: 10.0,
			top: 20.0,
			width: 500.0,
			height: 800.0,
		};
		// 1000x800 view in a 500x800 box: scale 0.5, letterboxed vertically by 200.
		assert_eq!(client_to_view((10.0, 220.0), rect, (1000.0, 800.0)), (0.0, 0.0));
		assert_eq!(client_to_view((260.0, 420.0), rect, (1000.0, 800.0)), (500.0, 400.0));
		let empty = ClientRect::default();
		assert_eq!(client_to_view((3.0, 4.0), empty, (0.0, 800.0)), (3.0, 4.0));
	}

	#[test]
	fn zero_width_viewport_does_not_break() {
		let mut v = Viewport::new(0.0, 800.0, &DiagramConfig::default());
		v.zoom_in();
		settle(&mut v, 0.0);
		assert!(v.transform().is_finite());
	}
}
