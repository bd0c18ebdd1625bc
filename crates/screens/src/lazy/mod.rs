//! Build-once value with invalidation.
//!
//! # Role
//!
//! [`LazySnapshot`] owns the published registry state. The first reader builds it;
//! concurrent readers wait for that build instead of starting their own. Invalidation
//! drops the published value so the next reader rebuilds from scratch.
//!
//! # Invariants
//!
//! - At most one build runs at a time.
//! - A failed or panicking build leaves the state `NotBuilt` and wakes every waiter.
//! - A build that started before an invalidation is never published.
//! - Published values are never mutated; readers holding one keep a consistent view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	NotBuilt,
	Building,
	Ready,
}

/// A value built on first access and rebuilt after invalidation.
pub struct LazySnapshot<T> {
	state: Mutex<State>,
	settled: Condvar,
	current: ArcSwapOption<T>,
	generation: AtomicU64,
	builds: AtomicU64,
}

impl<T> Default for LazySnapshot<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> LazySnapshot<T> {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(State::NotBuilt),
			settled: Condvar::new(),
			current: ArcSwapOption::empty(),
			generation: AtomicU64::new(0),
			builds: AtomicU64::new(0),
		}
	}

	/// Returns the published value, building it with `build` if needed.
	///
	/// `build` receives the generation it builds for. Callers that find a build in
	/// progress block until it settles; if it fails they race to build again.
	pub fn get_or_build<E>(&self, build: impl Fn(u64) -> Result<T, E>) -> Result<Arc<T>, E> {
		loop {
			if let Some(value) = self.current.load_full() {
				return Ok(value);
			}

			let mut state = self.state.lock();
			match *state {
				State::Building => {
					self.settled.wait(&mut state);
					continue;
				}
				State::Ready => {
					if let Some(value) = self.current.load_full() {
						return Ok(value);
					}
					*state = State::NotBuilt;
				}
				State::NotBuilt => {}
			}

			*state = State::Building;
			let generation = self.generation.load(Ordering::Acquire);
			drop(state);

			let mut guard = BuildGuard { lazy: self, settled: false };
			let result = build(generation);
			guard.settled = true;
			self.builds.fetch_add(1, Ordering::Relaxed);

			let mut state = self.state.lock();
			let outcome = match result {
				Ok(value) if self.generation.load(Ordering::Acquire) == generation => {
					let value = Arc::new(value);
					self.current.store(Some(value.clone()));
					*state = State::Ready;
					Some(Ok(value))
				}
				Ok(_) => {
					tracing::warn!(generation, "registry invalidated during build, rebuilding");
					*state = State::NotBuilt;
					None
				}
				Err(err) => {
					*state = State::NotBuilt;
					Some(Err(err))
				}
			};
			self.settled.notify_all();
			drop(state);

			if let Some(outcome) = outcome {
				return outcome;
			}
		}
	}

	/// The published value, if any, without building.
	pub fn peek(&self) -> Option<Arc<T>> {
		self.current.load_full()
	}

	/// Drops the published value. The next read rebuilds.
	pub fn invalidate(&self) {
		self.invalidate_with(|| ());
	}

	/// Runs `mutation` and drops the published value, atomically with respect to
	/// builds: a build never observes half of the mutation and then gets published.
	pub fn invalidate_with<R>(&self, mutation: impl FnOnce() -> R) -> R {
		let mut state = self.state.lock();
		let result = mutation();
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		self.current.store(None);
		if *state == State::Ready {
			*state = State::NotBuilt;
		}
		drop(state);
		tracing::debug!(generation, "registry invalidated");
		result
	}

	/// Number of invalidations so far.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Number of builds run so far, including failed and discarded ones.
	pub fn builds(&self) -> u64 {
		self.builds.load(Ordering::Relaxed)
	}

	pub fn is_ready(&self) -> bool {
		*self.state.lock() == State::Ready
	}
}

impl<T> std::fmt::Debug for LazySnapshot<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LazySnapshot")
			.field("state", &*self.state.lock())
			.field("generation", &self.generation())
			.field("builds", &self.builds())
			.finish()
	}
}

/// Resets a build that unwinds before settling.
struct BuildGuard<'a, T> {
	lazy: &'a LazySnapshot<T>,
	settled: bool,
}

impl<T> Drop for BuildGuard<'_, T> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}
		self.lazy.builds.fetch_add(1, Ordering::Relaxed);
		*self.lazy.state.lock() = State::NotBuilt;
		self.lazy.settled.notify_all();
	}
}
