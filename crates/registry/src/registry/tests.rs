use std::sync::Arc;

use parking_lot::Mutex;
use tether_guid::Guid;

use crate::directory::{GuidDirectory, RegisterAction};
use crate::error::RegisterError;
use crate::registry::{GuidRegistry, RegistryMode};

struct Probe {
	name: &'static str,
}

fn probe(name: &'static str) -> Arc<Probe> {
	Arc::new(Probe { name })
}

fn registry() -> GuidRegistry<Probe> {
	GuidRegistry::new()
}

#[test]
fn register_then_resolve_returns_handle() {
	let registry = registry();
	let guid = Guid::random();
	let entity = probe("a");

	let action = registry.register(guid, Arc::downgrade(&entity)).unwrap();
	assert_eq!(action, RegisterAction::InsertedNew);

	let resolved = registry.resolve(guid).unwrap();
	assert!(Arc::ptr_eq(&resolved, &entity));
}

#[test]
fn register_empty_guid_is_invalid() {
	let registry = registry();
	let entity = probe("a");
	assert_eq!(
		registry.register(Guid::EMPTY, Arc::downgrade(&entity)),
		Err(RegisterError::EmptyGuid)
	);
}

#[test]
fn register_dead_handle_is_invalid() {
	let registry = registry();
	let guid = Guid::random();
	let handle = Arc::downgrade(&probe("gone"));
	assert_eq!(
		registry.register(guid, handle),
		Err(RegisterError::DeadHandle { guid })
	);
	assert!(registry.is_empty());
}

#[test]
fn collision_rejected_and_state_unchanged() {
	let registry = GuidRegistry::with_mode(RegistryMode::Interactive);
	let guid = Guid::random();
	let first = probe("first");
	let second = probe("second");

	registry.register(guid, Arc::downgrade(&first)).unwrap();
	assert_eq!(
		registry.register(guid, Arc::downgrade(&second)),
		Err(RegisterError::Collision { guid })
	);

	// The loser changed nothing: the winner still resolves.
	let resolved = registry.resolve(guid).unwrap();
	assert_eq!(resolved.name, "first");
	assert_eq!(registry.len(), 1);
}

#[test]
fn same_handle_registers_idempotently() {
	let registry = registry();
	let guid = Guid::random();
	let entity = probe("a");

	assert_eq!(
		registry.register(guid, Arc::downgrade(&entity)).unwrap(),
		RegisterAction::InsertedNew
	);
	assert_eq!(
		registry.register(guid, Arc::downgrade(&entity)).unwrap(),
		RegisterAction::KeptExisting
	);
}

#[test]
fn unregister_missing_and_empty_return_false() {
	let registry = registry();
	assert!(!registry.unregister(Guid::random()));
	assert!(!registry.unregister(Guid::EMPTY));
}

#[test]
fn add_observers_fire_in_registration_order() {
	let registry = registry();
	let guid = Guid::random();
	let order = Arc::new(Mutex::new(Vec::new()));

	for tag in ["cb1", "cb2"] {
		let order = order.clone();
		let observed = registry.resolve_with(
			guid,
			Some(Box::new(move |handle: &Arc<Probe>| {
				order.lock().push((tag, handle.name));
			})),
			None,
		);
		assert!(observed.is_none());
	}

	let entity = probe("target");
	let action = registry.register(guid, Arc::downgrade(&entity)).unwrap();
	assert_eq!(action, RegisterAction::FilledPending);
	assert_eq!(*order.lock(), vec![("cb1", "target"), ("cb2", "target")]);

	// Drained on fire: re-registering the same handle fires nothing.
	registry.register(guid, Arc::downgrade(&entity)).unwrap();
	assert_eq!(order.lock().len(), 2);
}

#[test]
fn remove_observers_fire_exactly_once_each() {
	let registry = registry();
	let guid = Guid::random();
	let entity = probe("target");
	registry.register(guid, Arc::downgrade(&entity)).unwrap();

	let fired = Arc::new(Mutex::new(Vec::new()));
	for tag in ["r1", "r2", "r3"] {
		let fired = fired.clone();
		registry.resolve_on_remove(guid, Box::new(move || fired.lock().push(tag)));
	}

	assert!(registry.unregister(guid));
	assert_eq!(*fired.lock(), vec!["r1", "r2", "r3"]);

	// The entry is gone; a second unregister finds nothing to fire.
	assert!(!registry.unregister(guid));
	assert_eq!(fired.lock().len(), 3);
}

#[test]
fn unregister_true_for_pending_entry_without_handle() {
	let registry = registry();
	let guid = Guid::random();
	let fired = Arc::new(Mutex::new(0u32));
	let fired2 = fired.clone();
	registry.resolve_on_remove(guid, Box::new(move || *fired2.lock() += 1));

	// No live handle ever claimed the guid, but the entry is present.
	assert!(registry.unregister(guid));
	assert_eq!(*fired.lock(), 1);
	assert!(registry.is_empty());
}

#[test]
fn dead_winner_counts_as_vacant() {
	let registry = registry();
	let guid = Guid::random();
	{
		let doomed = probe("doomed");
		registry.register(guid, Arc::downgrade(&doomed)).unwrap();
		// Entity dropped without unregistering.
	}
	assert!(registry.resolve(guid).is_none());

	// A new incarnation may reclaim the identifier without a collision.
	let reborn = probe("reborn");
	let action = registry.register(guid, Arc::downgrade(&reborn)).unwrap();
	assert_eq!(action, RegisterAction::FilledPending);
	assert_eq!(registry.resolve(guid).unwrap().name, "reborn");
}

#[test]
fn resolve_empty_guid_creates_no_entry() {
	let registry = registry();
	let observed = registry.resolve_with(
		Guid::EMPTY,
		Some(Box::new(|_: &Arc<Probe>| panic!("must never fire"))),
		None,
	);
	assert!(observed.is_none());
	assert!(registry.is_empty());
}

#[test]
fn resolve_missing_guid_leaves_pending_entry() {
	let registry = registry();
	let guid = Guid::random();
	assert!(registry.resolve(guid).is_none());
	assert_eq!(registry.len(), 1);
}
