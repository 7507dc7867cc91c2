use tether_guid::Guid;

/// Rejected registration.
///
/// `EmptyGuid` and `DeadHandle` are invalid-argument conditions: the caller
/// passed something that can never be registered. `Collision` is expected
/// during interactive duplication and is recoverable: assign a fresh
/// identifier and retry (see [`GuidIdentity::attach`]).
///
/// [`GuidIdentity::attach`]: crate::identity::GuidIdentity::attach
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
	/// The all-zero identifier is never a directory key.
	#[error("cannot register the empty guid")]
	EmptyGuid,
	/// The presented handle has no live target.
	#[error("cannot register a dead handle for {guid}")]
	DeadHandle {
		/// Identifier the dead handle was presented under.
		guid: Guid,
	},
	/// A different live entity already claims this identifier. The losing
	/// registration is fully rejected; no directory state changed.
	#[error("guid collision: {guid} is already claimed by another entity")]
	Collision {
		/// The contested identifier.
		guid: Guid,
	},
}
