use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tether_guid::Guid;
use tracing::trace;

use crate::directory::GuidDirectory;

/// Key identifying one Added/Removed subscriber on a [`GuidRef`]; pass it
/// back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type AddedFn<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;
type RemovedFn = Arc<dyn Fn() + Send + Sync>;

/// Ordered subscriber list with stable unsubscribe keys.
///
/// Keys are never reused, so firing order always matches subscription
/// order even across unsubscribes.
struct SubscriberList<F> {
	next: u64,
	subs: Vec<(u64, F)>,
}

impl<F: Clone> SubscriberList<F> {
	fn new() -> Self {
		Self { next: 0, subs: Vec::new() }
	}

	fn subscribe(&mut self, f: F) -> Subscription {
		let key = self.next;
		self.next += 1;
		self.subs.push((key, f));
		Subscription(key)
	}

	fn unsubscribe(&mut self, sub: Subscription) -> bool {
		let before = self.subs.len();
		self.subs.retain(|(key, _)| *key != sub.0);
		self.subs.len() != before
	}

	fn snapshot(&self) -> Vec<F> {
		self.subs.iter().map(|(_, f)| f.clone()).collect()
	}
}

struct RefState<T> {
	cached: Weak<T>,
	cache_set: bool,
	request_sent: bool,
	added: SubscriberList<AddedFn<T>>,
	removed: SubscriberList<RemovedFn>,
}

/// A held identifier that resolves lazily against the directory.
///
/// The first access sends one resolve request, subscribing the reference to
/// the identifier's transitions; after that the resolved handle is cached
/// and accesses are O(1) with no directory call. When the target is
/// unregistered the cache is invalidated and the next access starts a fresh
/// resolution cycle, so a destroyed-and-recreated target is picked up
/// transparently.
///
/// The reference never owns its target: the cache holds a weak handle, and
/// the directory-side observers hold only a weak handle to this reference's
/// state, so dropping the `GuidRef` is enough to stop receiving
/// notifications.
pub struct GuidRef<T> {
	guid: Guid,
	directory: Arc<dyn GuidDirectory<T>>,
	state: Arc<Mutex<RefState<T>>>,
}

impl<T: Send + Sync + 'static> GuidRef<T> {
	/// Creates an unresolved reference to `guid`.
	pub fn new(directory: Arc<dyn GuidDirectory<T>>, guid: Guid) -> Self {
		Self {
			guid,
			directory,
			state: Arc::new(Mutex::new(RefState {
				cached: Weak::new(),
				cache_set: false,
				request_sent: false,
				added: SubscriberList::new(),
				removed: SubscriberList::new(),
			})),
		}
	}

	/// The identifier this reference tracks.
	#[inline]
	pub fn guid(&self) -> Guid {
		self.guid
	}

	/// Returns the target if it is currently registered.
	///
	/// The cached handle stays valid until the target is unregistered; a
	/// target dropped without unregistering reads as `None` until then.
	/// Ideally the only method holders ever call.
	pub fn handle(&self) -> Option<Arc<T>> {
		let send_request = {
			let mut state = self.state.lock();
			if state.cache_set {
				return state.cached.upgrade();
			}
			// One resolve per cycle: once the request is out, later
			// accesses wait on the subscribed observer instead.
			let send = !state.request_sent;
			state.request_sent = true;
			send
		};

		let resolved = if send_request {
			self.directory
				.resolve_with(self.guid, Some(self.add_observer()), Some(self.remove_observer()))
		} else {
			None
		};

		// A hit on the request path goes through the same transition as the
		// observer path: validate the cache and notify Added subscribers.
		let resolved = resolved?;
		Self::apply_added(&self.state, self.guid, &resolved);
		Some(resolved)
	}

	/// Warms the cache without needing the handle immediately.
	pub fn request_resolve(&self) {
		let _ = self.handle();
	}

	/// Subscribes to resolution; fires with the handle each time the target
	/// appears, in subscription order.
	pub fn on_added(&self, f: impl Fn(&Arc<T>) + Send + Sync + 'static) -> Subscription {
		self.state.lock().added.subscribe(Arc::new(f))
	}

	/// Subscribes to invalidation; fires each time the target goes away.
	pub fn on_removed(&self, f: impl Fn() + Send + Sync + 'static) -> Subscription {
		self.state.lock().removed.subscribe(Arc::new(f))
	}

	/// Removes an Added subscriber. Returns false for an unknown key.
	pub fn unsubscribe_added(&self, sub: Subscription) -> bool {
		self.state.lock().added.unsubscribe(sub)
	}

	/// Removes a Removed subscriber. Returns false for an unknown key.
	pub fn unsubscribe_removed(&self, sub: Subscription) -> bool {
		self.state.lock().removed.unsubscribe(sub)
	}

	/// Directory-side add observer. Holds the state weakly so a discarded
	/// reference cannot be kept alive by its own subscription.
	fn add_observer(&self) -> Box<dyn FnOnce(&Arc<T>) + Send> {
		let guid = self.guid;
		let state = Arc::downgrade(&self.state);
		Box::new(move |handle| {
			if let Some(state) = state.upgrade() {
				Self::apply_added(&state, guid, handle);
			}
		})
	}

	fn remove_observer(&self) -> Box<dyn FnOnce() + Send> {
		let guid = self.guid;
		let state = Arc::downgrade(&self.state);
		Box::new(move || {
			if let Some(state) = state.upgrade() {
				Self::apply_removed(&state, guid);
			}
		})
	}

	/// Subscribers are invoked after the state guard drops, so they may
	/// re-read `handle()` (which now hits the cache).
	fn apply_added(state: &Arc<Mutex<RefState<T>>>, guid: Guid, handle: &Arc<T>) {
		let subscribers = {
			let mut state = state.lock();
			state.cached = Arc::downgrade(handle);
			state.cache_set = true;
			state.added.snapshot()
		};
		trace!(guid = %guid, subscribers = subscribers.len(), "deferred reference resolved");
		for subscriber in subscribers {
			subscriber(handle);
		}
	}

	fn apply_removed(state: &Arc<Mutex<RefState<T>>>, guid: Guid) {
		let subscribers = {
			let mut state = state.lock();
			state.cached = Weak::new();
			state.cache_set = false;
			// The directory entry is gone along with our observers, so the
			// next access must re-issue the resolve from scratch.
			state.request_sent = false;
			state.removed.snapshot()
		};
		trace!(guid = %guid, subscribers = subscribers.len(), "deferred reference invalidated");
		for subscriber in subscribers {
			subscriber();
		}
	}
}
