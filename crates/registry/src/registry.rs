use std::collections::hash_map::Entry as MapEntry;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use tether_guid::Guid;
use tracing::{debug, trace, warn};

use crate::directory::{AddCallback, GuidDirectory, RegisterAction, RemoveCallback};
use crate::error::RegisterError;

/// Collision reporting posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryMode {
	/// Interactive editing. Duplicating an entity duplicates its identifier,
	/// so collisions are routine and logged quietly.
	Interactive,
	/// Normal operation. A collision means some reference now resolves to
	/// the wrong entity and is logged loudly.
	#[default]
	Running,
}

/// One directory record: the current live handle (a dead or never-set weak
/// means "none") plus the observers waiting on the next transition.
struct Entry<T> {
	handle: Weak<T>,
	on_add: Vec<AddCallback<T>>,
	on_remove: Vec<RemoveCallback>,
}

impl<T> Entry<T> {
	fn claimed(handle: Weak<T>) -> Self {
		Self {
			handle,
			on_add: Vec::new(),
			on_remove: Vec::new(),
		}
	}

	fn pending() -> Self {
		Self::claimed(Weak::new())
	}
}

/// The default in-process [`GuidDirectory`].
///
/// All state lives in one map behind one lock; entries are mutated in
/// place. Observers are drained under the lock but invoked only after the
/// guard drops, so observer code may call back into the directory.
pub struct GuidRegistry<T> {
	entries: Mutex<HashMap<Guid, Entry<T>>>,
	mode: RegistryMode,
}

impl<T> GuidRegistry<T> {
	/// Creates an empty directory in [`RegistryMode::Running`].
	pub fn new() -> Self {
		Self::with_mode(RegistryMode::default())
	}

	/// Creates an empty directory with an explicit collision posture.
	pub fn with_mode(mode: RegistryMode) -> Self {
		Self {
			entries: Mutex::new(HashMap::default()),
			mode,
		}
	}

	/// Number of entries, counting pending ones with no live handle.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl<T> Default for GuidRegistry<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Send + Sync> GuidDirectory<T> for GuidRegistry<T> {
	fn register(&self, guid: Guid, handle: Weak<T>) -> Result<RegisterAction, RegisterError> {
		if guid.is_empty() {
			return Err(RegisterError::EmptyGuid);
		}
		let Some(live) = handle.upgrade() else {
			return Err(RegisterError::DeadHandle { guid });
		};

		let (action, pending) = {
			let mut entries = self.entries.lock();
			match entries.entry(guid) {
				MapEntry::Vacant(slot) => {
					slot.insert(Entry::claimed(handle));
					(RegisterAction::InsertedNew, Vec::new())
				}
				MapEntry::Occupied(mut slot) => {
					let entry = slot.get_mut();
					match entry.handle.upgrade() {
						Some(existing) if Arc::ptr_eq(&existing, &live) => {
							(RegisterAction::KeptExisting, Vec::new())
						}
						Some(_) => {
							match self.mode {
								RegistryMode::Interactive => debug!(
									guid = %guid,
									"guid collision on duplicated entity, registration rejected"
								),
								RegistryMode::Running => warn!(
									guid = %guid,
									"guid collision, a reference may resolve to the wrong entity"
								),
							}
							return Err(RegisterError::Collision { guid });
						}
						// The previous owner died (or was never set); the
						// entry was only kept for its waiting observers.
						None => {
							entry.handle = handle;
							(RegisterAction::FilledPending, std::mem::take(&mut entry.on_add))
						}
					}
				}
			}
		};

		trace!(guid = %guid, ?action, observers = pending.len(), "guid registered");
		for observer in pending {
			observer(&live);
		}
		Ok(action)
	}

	fn unregister(&self, guid: Guid) -> bool {
		let Some(entry) = self.entries.lock().remove(&guid) else {
			return false;
		};
		trace!(guid = %guid, observers = entry.on_remove.len(), "guid unregistered");
		for observer in entry.on_remove {
			observer();
		}
		true
	}

	fn resolve_with(
		&self,
		guid: Guid,
		on_add: Option<AddCallback<T>>,
		on_remove: Option<RemoveCallback>,
	) -> Option<Arc<T>> {
		// The empty guid is not a key; dropping the observers here is fine
		// because no transition can ever fire for it.
		if guid.is_empty() {
			return None;
		}
		let mut entries = self.entries.lock();
		let entry = entries.entry(guid).or_insert_with(Entry::pending);
		if let Some(observer) = on_add {
			entry.on_add.push(observer);
		}
		if let Some(observer) = on_remove {
			entry.on_remove.push(observer);
		}
		entry.handle.upgrade()
	}
}

#[cfg(test)]
mod tests;
