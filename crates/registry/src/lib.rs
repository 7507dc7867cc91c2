//! Durable references to entities by stable identifier.
//!
//! One entity holds a [`GuidRef`] naming another by [`Guid`] instead of by
//! address. The target may not exist yet when the reference is created, and
//! may be destroyed and recreated while the reference is held; resolution
//! tracks those transitions through the directory without the holder owning
//! the target or polling for it.
//!
//! # Pieces
//!
//! - [`GuidDirectory`] - the access point every operation flows through;
//!   injectable, so tests substitute their own backend.
//! - [`GuidRegistry`] - the default in-process directory.
//! - [`GuidRef`] - a held identifier with lazy, cached, self-updating
//!   resolution and Added/Removed notification.
//! - [`GuidIdentity`] - the entity-side binding: assigns an identifier,
//!   registers on attach, recovers from collisions, unregisters on drop.

/// Access-point trait and registration outcomes.
pub mod directory;
/// Registration error conditions.
pub mod error;
/// Entity-side identifier assignment and lifecycle binding.
pub mod identity;
/// Deferred, self-updating references.
pub mod reference;
/// The default directory implementation.
pub mod registry;

pub use directory::{AddCallback, GuidDirectory, RegisterAction, RemoveCallback};
pub use error::RegisterError;
pub use identity::{GuidIdentity, Provenance};
pub use reference::{GuidRef, Subscription};
pub use registry::{GuidRegistry, RegistryMode};
// Re-export the identifier type so consumers need only one dependency.
pub use tether_guid::Guid;
