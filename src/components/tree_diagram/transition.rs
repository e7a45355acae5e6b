use super::layout::Point;

/// Values that can be interpolated by a [`Transition`].
pub trait Lerp: Copy {
	fn lerp(self, to: Self, t: f64) -> Self;
}

impl Lerp for Point {
	fn lerp(self, to: Self, t: f64) -> Self {
		Point::lerp(self, to, t)
	}
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
	let t = t * 2.0;
	if t <= 1.0 {
		t * t * t / 2.0
	} else {
		let t = t - 2.0;
		(t * t * t + 2.0) / 2.0
	}
}

/// A timed interpolation between two values. The clock starts on the first [`begin`] call so a
/// transition created between frames starts with the next frame.
///
/// [`begin`]: Transition::begin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition<T> {
	from: T,
	to: T,
	start: Option<f64>,
	duration: f64,
}

impl<T: Lerp> Transition<T> {
	pub fn new(from: T, to: T, duration: f64) -> Self {
		Self {
			from,
			to,
			start: None,
			duration,
		}
	}

	pub fn begin(&mut self, now: f64) {
		self.start.get_or_insert(now);
	}

	pub fn progress(&self, now: f64) -> f64 {
		match self.start {
			None => 0.0,
			Some(_) if self.duration <= 0.0 => 1.0,
			Some(start) => ((now - start) / self.duration).clamp(0.0, 1.0),
		}
	}

	pub fn value_at(&self, now: f64) -> T {
		let t = self.progress(now);
		if t >= 1.0 {
			self.to
		} else if t <= 0.0 {
			self.from
		} else {
			self.from.lerp(self.to, ease_cubic_in_out(t))
		}
	}

	pub fn is_finished(&self, now: f64) -> bool {
		self.start.is_some() && self.progress(now) >= 1.0
	}

	/// A new transition from wherever this one is at `now` towards `to`.
	pub fn retarget(&self, now: f64, to: T, duration: f64) -> Self {
		Self::new(self.value_at(now), to, duration)
	}
}
