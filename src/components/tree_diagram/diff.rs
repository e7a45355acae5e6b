use std::collections::HashSet;
use std::hash::Hash;

/// Keys split into the three disjoint groups of a data join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation<K> {
	/// In `new` but not in `old`, in `new` order.
	pub enter: Vec<K>,
	/// In both, in `new` order.
	pub update: Vec<K>,
	/// In `old` but not in `new`, in `old` order.
	pub exit: Vec<K>,
}

impl<K> Default for Reconciliation<K> {
	fn default() -> Self {
		Self {
			enter: Vec::new(),
			update: Vec::new(),
			exit: Vec::new(),
		}
	}
}

impl<K> Reconciliation<K> {
	pub fn is_empty(&self) -> bool {
		self.enter.is_empty() && self.update.is_empty() && self.exit.is_empty()
	}
}

pub fn reconcile<K>(old: &[K], new: &[K]) -> Reconciliation<K>
where
	K: Copy + Eq + Hash,
{
	let old_keys: HashSet<K> = old.iter().copied().collect();
	let new_keys: HashSet<K> = new.iter().copied().collect();
	let mut seen = HashSet::with_capacity(new.len());
	let mut out = Reconciliation::default();

	for &key in new {
		if !seen.insert(key) {
			continue;
		}
		if old_keys.contains(&key) {
			out.update.push(key);
		} else {
			out.enter.push(key);
		}
	}
	out.exit = old
		.iter()
		.copied()
		.filter(|key| !new_keys.contains(key))
		.collect();
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_keys_into_enter_update_exit() {
		let r = reconcile(&[1, 2, 3], &[2, 3, 4, 5]);
		assert_eq!(r.enter, [4, 5]);
		assert_eq!(r.update, [2, 3]);
		assert_eq!(r.exit, [1]);
	}

	#[test]
	fn groups_are_disjoint_and_cover_both_sides() {
		let old = [7, 1, 9, 4, 2];
		let new = [4, 8, 7, 3];
		let r = reconcile(&old, &new);

		let mut all: Vec<_> = r.enter.iter().chain(&r.update).chain(&r.exit).copied().collect();
		let total = all.len();
		all.sort();
		all.dedup();
		assert_eq!(all.len(), total);
		assert_eq!(all, [1, 2, 3, 4, 7, 8, 9]);
		assert_eq!(r.update, [4, 7]);
	}

	#[test]
	fn first_render_enters_everything() {
		let r = reconcile::<u32>(&[], &[1, 2]);
		assert_eq!(r.enter, [1, 2]);
		assert!(r.update.is_empty() && r.exit.is_empty());
		assert!(reconcile::<u32>(&[], &[]).is_empty());
	}

	#[test]
	fn duplicate_new_keys_join_once() {
		let r = reconcile(&[1], &[1, 1, 2, 2]);
		assert_eq!(r.update, [1]);
		assert_eq!(r.enter, [2]);
	}
}
