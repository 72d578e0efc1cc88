//! Tests for the checked value array.

use gangway::{Error, ValueArray, VolumeReference};

// =============================================================================
// Count / Set / Get Identity
// =============================================================================

#[test]
fn test_array_reports_its_creation_count() {
    let array: ValueArray<VolumeReference> = ValueArray::new(3);
    assert_eq!(array.len(), 3);
    assert!(!array.is_empty());

    let empty: ValueArray<VolumeReference> = ValueArray::new(0);
    assert_eq!(empty.len(), 0);
    assert!(empty.is_empty());
}

#[test]
fn test_set_then_get_returns_the_same_element() {
    let mut array: ValueArray<VolumeReference> = ValueArray::new(2);

    array.set(0, VolumeReference::new("data")).unwrap();
    array.set(1, VolumeReference::new("cache")).unwrap();

    assert_eq!(array.get(0).unwrap().unwrap().name, "data");
    assert_eq!(array.get(1).unwrap().unwrap().name, "cache");
}

#[test]
fn test_unset_slot_reads_as_absent() {
    let mut array: ValueArray<String> = ValueArray::new(2);
    array.set(1, "only this one".to_string()).unwrap();

    assert!(array.get(0).unwrap().is_none());
    assert!(array.get(1).unwrap().is_some());
}

#[test]
fn test_set_overwrites_releasing_the_previous_element() {
    let mut array: ValueArray<String> = ValueArray::new(1);
    array.set(0, "first".to_string()).unwrap();
    array.set(0, "second".to_string()).unwrap();

    assert_eq!(array.get(0).unwrap().map(String::as_str), Some("second"));
}

// =============================================================================
// Checked Bounds
// =============================================================================

#[test]
fn test_out_of_range_access_is_a_checked_failure() {
    let mut array: ValueArray<String> = ValueArray::new(2);

    let err = array.set(2, "beyond".to_string()).unwrap_err();
    assert_eq!(err.kind(), "OutOfRange");
    assert!(matches!(
        err,
        Error::IndexOutOfRange { index: 2, count: 2 }
    ));

    let err = array.get(17).unwrap_err();
    assert_eq!(err.kind(), "OutOfRange");

    // The failed set did not disturb the array.
    assert_eq!(array.len(), 2);
    assert!(array.get(0).unwrap().is_none());
}

#[test]
fn test_empty_array_rejects_every_index() {
    let array: ValueArray<String> = ValueArray::new(0);
    assert!(array.get(0).is_err());
}

// =============================================================================
// Marshalling Helpers
// =============================================================================

#[test]
fn test_from_vec_populates_every_slot() {
    let volumes = vec![VolumeReference::new("a"), VolumeReference::new("b")];
    let array = ValueArray::from(volumes);

    assert_eq!(array.len(), 2);
    assert!(array.iter().all(|slot| slot.is_some()));
}

#[test]
fn test_into_elements_skips_absent_slots() {
    let mut array: ValueArray<u32> = ValueArray::new(3);
    array.set(0, 10).unwrap();
    array.set(2, 30).unwrap();

    assert_eq!(array.into_elements().collect::<Vec<_>>(), vec![10, 30]);
}

#[test]
fn test_dropping_a_populated_array_releases_every_element() {
    let mut array: ValueArray<VolumeReference> = ValueArray::new(4);
    for index in 0..4 {
        array.set(index, VolumeReference::new(format!("vol-{index}"))).unwrap();
    }
    drop(array);
}
