//! Tests for opaque handles and the generation-checked registry.

use gangway::{ClientHandle, Error, Handle, HandleTable};
use gangway::handle::{ClientKind, ContextKind};

// =============================================================================
// Handle Opacity
// =============================================================================

#[test]
fn test_handle_survives_raw_round_trip() {
    let table: HandleTable<ClientKind, String> = HandleTable::new(4);
    let handle = table.insert("engine connection".to_string()).unwrap();

    // The foreign side can only carry an integer; a rebuilt handle must
    // resolve to the same resource.
    let rebuilt = ClientHandle::from_raw(handle.as_raw());
    assert_eq!(rebuilt, handle);
    assert_eq!(*table.get(rebuilt).unwrap(), "engine connection");
}

#[test]
fn test_handle_display_is_opaque_hex() {
    let table: HandleTable<ContextKind, ()> = HandleTable::new(4);
    let handle = table.insert(()).unwrap();

    let rendered = handle.to_string();
    assert!(rendered.starts_with("0x"), "got: {rendered}");

    let debug = format!("{handle:?}");
    assert!(debug.contains("context"), "got: {debug}");
}

// =============================================================================
// Registry Semantics
// =============================================================================

#[test]
fn test_released_handle_is_permanently_invalid() {
    let table: HandleTable<ClientKind, u32> = HandleTable::new(4);
    let handle = table.insert(7).unwrap();
    let copy = handle;

    table.remove(handle).unwrap();

    // Every copy dies with the original.
    let err = table.get(copy).unwrap_err();
    assert_eq!(err.kind(), "InvalidHandle");

    let err = table.remove(copy).unwrap_err();
    assert_eq!(err.kind(), "InvalidHandle");
}

#[test]
fn test_stale_handle_does_not_alias_a_reused_slot() {
    let table: HandleTable<ClientKind, &'static str> = HandleTable::new(2);

    let first = table.insert("first").unwrap();
    table.remove(first).unwrap();

    // The slot is reused for a new resource; the old handle must not see it.
    let second = table.insert("second").unwrap();
    assert_ne!(first, second);
    assert!(table.get(first).is_err());
    assert_eq!(*table.get(second).unwrap(), "second");
}

#[test]
fn test_never_issued_handle_is_rejected() {
    let table: HandleTable<ClientKind, u32> = HandleTable::new(4);

    let forged = Handle::<ClientKind>::from_raw(0xdead_beef_0000_0001);
    assert!(matches!(
        table.get(forged),
        Err(Error::InvalidHandle { kind: "client", .. })
    ));
}

#[test]
fn test_capacity_frees_up_on_release() {
    let table: HandleTable<ClientKind, u32> = HandleTable::new(2);
    let a = table.insert(1).unwrap();
    let _b = table.insert(2).unwrap();

    let err = table.insert(3).unwrap_err();
    assert_eq!(err.kind(), "ResourceExhausted");
    assert!(format!("{err}").contains("limit of 2"), "got: {err}");

    table.remove(a).unwrap();
    assert!(table.insert(3).is_ok(), "released capacity is reusable");
    assert_eq!(table.len(), 2);
}
