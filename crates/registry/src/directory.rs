use std::sync::{Arc, Weak};

use tether_guid::Guid;

use crate::error::RegisterError;

/// Observer fired exactly once when an identifier gains a live handle, then
/// discarded.
pub type AddCallback<T> = Box<dyn FnOnce(&Arc<T>) + Send>;

/// Observer fired exactly once when an identifier loses its live handle,
/// then discarded.
pub type RemoveCallback = Box<dyn FnOnce() + Send>;

/// Outcome of a successful [`GuidDirectory::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAction {
	/// No entry existed; one was created with the handle set.
	InsertedNew,
	/// An entry existed with no live handle; the handle was set and every
	/// pending add-observer fired.
	FilledPending,
	/// The same handle was already registered under this identifier; no-op.
	KeptExisting,
}

/// The access point all registration and resolution flows through.
///
/// Normally backed by one [`GuidRegistry`] for the process lifetime and
/// handed around as `Arc<dyn GuidDirectory<T>>`; tests inject their own
/// backend instead of swapping a global.
///
/// Handles are `Weak<T>`: the directory never owns an entity and never
/// keeps one alive. An entry whose stored weak has died counts as having no
/// handle for both collision detection and resolution.
///
/// [`GuidRegistry`]: crate::registry::GuidRegistry
pub trait GuidDirectory<T>: Send + Sync {
	/// Claims `guid` for the entity behind `handle`.
	///
	/// Fires pending add-observers (in registration order, exactly once
	/// each) when this fills an entry that resolvers were already waiting
	/// on. A collision leaves the directory untouched; the caller is
	/// expected to regenerate its identifier and retry.
	fn register(&self, guid: Guid, handle: Weak<T>) -> Result<RegisterAction, RegisterError>;

	/// Releases `guid`, firing every remove-observer exactly once in
	/// registration order and dropping the entry.
	///
	/// Returns false when no entry exists. An entry with pending observers
	/// but no live handle still counts as present and returns true.
	fn unregister(&self, guid: Guid) -> bool;

	/// Looks up the current handle for `guid`, retaining the provided
	/// observers for future transitions.
	///
	/// Never fails: a missing identifier yields a pending entry holding the
	/// observers, and `None`. Passing the same callback again registers it
	/// again; deduplication is the caller's responsibility. The empty guid
	/// resolves to `None` without creating an entry.
	fn resolve_with(
		&self,
		guid: Guid,
		on_add: Option<AddCallback<T>>,
		on_remove: Option<RemoveCallback>,
	) -> Option<Arc<T>>;

	/// Looks up the current handle without observing future transitions.
	fn resolve(&self, guid: Guid) -> Option<Arc<T>> {
		self.resolve_with(guid, None, None)
	}

	/// Looks up the current handle and registers only a remove-observer,
	/// for callers that cache the result and need to invalidate.
	fn resolve_on_remove(&self, guid: Guid, on_remove: RemoveCallback) -> Option<Arc<T>> {
		self.resolve_with(guid, None, Some(on_remove))
	}
}
