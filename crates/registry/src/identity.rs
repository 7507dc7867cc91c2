use std::sync::Arc;

use tether_guid::Guid;
use tracing::{debug, error};

use crate::directory::GuidDirectory;
use crate::error::RegisterError;

/// Whether an entity is a live, addressable instance or an inert template
/// it gets stamped out from.
///
/// Templates never receive an identifier and never appear in the
/// directory; otherwise every stamped-out instance would collide with its
/// template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
	Instance,
	Template,
}

/// Entity-side binding between one entity and its stable identifier.
///
/// The host calls [`attach`] from its creation hook and either [`detach`]
/// or plain drop from its destruction hook; persistence goes through
/// [`serialized_bytes`] / [`restore_bytes`]. Collisions on attach are
/// recovered by regenerating the identifier and retrying, per the
/// directory contract.
///
/// [`attach`]: GuidIdentity::attach
/// [`detach`]: GuidIdentity::detach
/// [`serialized_bytes`]: GuidIdentity::serialized_bytes
/// [`restore_bytes`]: GuidIdentity::restore_bytes
pub struct GuidIdentity<T> {
	directory: Arc<dyn GuidDirectory<T>>,
	provenance: Provenance,
	guid: Guid,
	registered: bool,
}

impl<T: Send + Sync + 'static> GuidIdentity<T> {
	/// Creates an unassigned identity.
	pub fn new(directory: Arc<dyn GuidDirectory<T>>, provenance: Provenance) -> Self {
		Self {
			directory,
			provenance,
			guid: Guid::EMPTY,
			registered: false,
		}
	}

	/// The assigned identifier, or [`Guid::EMPTY`] while unassigned.
	#[inline]
	pub fn guid(&self) -> Guid {
		self.guid
	}

	#[inline]
	pub fn is_assigned(&self) -> bool {
		!self.guid.is_empty()
	}

	/// Assigns an identifier if needed and registers the entity.
	///
	/// On collision the identifier is regenerated and registration retried
	/// until it lands; with 128 random bits this converges immediately.
	/// Templates are skipped entirely.
	pub fn attach(&mut self, handle: &Arc<T>) -> Result<(), RegisterError> {
		if self.provenance == Provenance::Template {
			return Ok(());
		}
		if self.guid.is_empty() {
			self.guid = Guid::random();
		}
		loop {
			match self.directory.register(self.guid, Arc::downgrade(handle)) {
				Ok(_) => {
					self.registered = true;
					return Ok(());
				}
				Err(RegisterError::Collision { guid }) => {
					debug!(guid = %guid, "guid collision on attach, regenerating");
					self.guid = Guid::random();
				}
				Err(err) => return Err(err),
			}
		}
	}

	/// Re-keys the entity under `guid`.
	///
	/// On failure the previous identifier is restored and re-registered,
	/// and the error is returned. Templates are skipped.
	pub fn set_guid(&mut self, guid: Guid, handle: &Arc<T>) -> Result<(), RegisterError> {
		if self.provenance == Provenance::Template {
			return Ok(());
		}
		let previous = self.is_assigned().then_some(self.guid);
		self.detach();
		self.guid = guid;
		match self.directory.register(guid, Arc::downgrade(handle)) {
			Ok(_) => {
				self.registered = true;
				Ok(())
			}
			Err(err) => {
				error!(guid = %guid, %err, "failed to set guid, restoring previous");
				match previous {
					Some(previous) => {
						self.guid = previous;
						self.registered =
							self.directory.register(previous, Arc::downgrade(handle)).is_ok();
					}
					None => self.guid = Guid::EMPTY,
				}
				Err(err)
			}
		}
	}

	/// Discards the current identifier and attaches under a fresh one.
	pub fn regenerate(&mut self, handle: &Arc<T>) -> Result<(), RegisterError> {
		self.detach();
		self.guid = Guid::EMPTY;
		self.attach(handle)
	}

	/// Releases the directory entry. Safe to call repeatedly; also runs on
	/// drop.
	pub fn detach(&mut self) {
		if self.registered {
			self.directory.unregister(self.guid);
			self.registered = false;
		}
	}

	/// The fixed-width encoding to persist, or `None` when there is
	/// nothing durable to save (unassigned, or a template).
	pub fn serialized_bytes(&self) -> Option<[u8; 16]> {
		if self.provenance == Provenance::Template || self.guid.is_empty() {
			return None;
		}
		Some(self.guid.to_bytes())
	}

	/// Restores a persisted identifier.
	///
	/// A buffer that is not exactly 16 bytes leaves the identity
	/// unassigned; the next [`attach`](GuidIdentity::attach) then generates
	/// a fresh identifier.
	pub fn restore_bytes(&mut self, bytes: &[u8]) {
		self.detach();
		self.guid = Guid::from_slice(bytes).unwrap_or(Guid::EMPTY);
	}
}

impl<T> Drop for GuidIdentity<T> {
	fn drop(&mut self) {
		if self.registered {
			self.directory.unregister(self.guid);
		}
	}
}
