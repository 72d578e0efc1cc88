//! Tests for the progress callback contract.

use gangway::{
    ImageBuildProgressUpdate, ProgressChannel, ProgressContinuation, PullImageProgressDetail,
    PullImageProgressUpdate, ReadyNotifier,
};

// =============================================================================
// Delivery Order and Latching
// =============================================================================

#[test]
fn test_updates_arrive_in_emission_order() {
    let mut seen = Vec::new();
    let mut channel = ProgressChannel::new(|update: &PullImageProgressUpdate| {
        seen.push(update.clone());
        ProgressContinuation::Continue
    });

    for message in ["Pulling fs layer", "Downloading", "Pull complete"] {
        channel.emit(&PullImageProgressUpdate::new(message, None, "4f4fb700ef54"));
    }

    assert_eq!(channel.invocations(), 3);
    drop(channel);

    let messages: Vec<&str> = seen.iter().map(|u| u.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Pulling fs layer", "Downloading", "Pull complete"]
    );
}

#[test]
fn test_cancel_on_nth_invocation_stops_all_further_invocations() {
    let mut invocations = 0;
    let mut channel = ProgressChannel::new(|_: &i32| {
        invocations += 1;
        if invocations == 2 {
            ProgressContinuation::Cancel
        } else {
            ProgressContinuation::Continue
        }
    });

    assert_eq!(channel.emit(&1), ProgressContinuation::Continue);
    assert_eq!(channel.emit(&2), ProgressContinuation::Cancel);
    assert!(channel.is_cancelled());

    // Emitting after cancel answers Cancel without touching the callback.
    assert_eq!(channel.emit(&3), ProgressContinuation::Cancel);
    assert_eq!(channel.emit(&4), ProgressContinuation::Cancel);
    assert_eq!(channel.invocations(), 2);

    drop(channel);
    assert_eq!(invocations, 2);
}

#[test]
fn test_update_is_borrowed_and_copied_out() {
    // The callback keeps a clone, never the reference itself; the update
    // remains usable by the producer after delivery.
    let mut kept: Option<PullImageProgressUpdate> = None;
    let mut channel = ProgressChannel::new(|update: &PullImageProgressUpdate| {
        kept = Some(update.clone());
        ProgressContinuation::Continue
    });

    let update = PullImageProgressUpdate::new(
        "Downloading",
        Some(PullImageProgressDetail {
            current: 512,
            total: 2048,
        }),
        "9b18e9b68314",
    );
    channel.emit(&update);
    drop(channel);

    assert_eq!(kept, Some(update));
}

// =============================================================================
// Ready Notification
// =============================================================================

#[test]
fn test_ready_notifier_reports_at_most_once() {
    let mut notifications = 0;
    let mut notifier = ReadyNotifier::new(|| {
        notifications += 1;
        ProgressContinuation::Continue
    });

    assert_eq!(notifier.notify(), ProgressContinuation::Continue);
    assert_eq!(notifier.notify(), ProgressContinuation::Continue);
    drop(notifier);
    assert_eq!(notifications, 1);
}

#[test]
fn test_disabled_notifier_always_continues() {
    let mut notifier = ReadyNotifier::disabled();
    assert_eq!(notifier.notify(), ProgressContinuation::Continue);
}

#[test]
fn test_ready_notifier_can_cancel() {
    let mut notifier = ReadyNotifier::new(|| ProgressContinuation::Cancel);
    assert_eq!(notifier.notify(), ProgressContinuation::Cancel);
}

// =============================================================================
// Update Shapes
// =============================================================================

#[test]
fn test_build_updates_serialize_with_a_variant_tag() {
    let update = ImageBuildProgressUpdate::StepDownloadProgress {
        step_number: 2,
        downloaded_bytes: 1024,
        total_bytes: 4096,
    };

    let json = serde_json::to_string(&update).expect("serialize");
    assert!(json.contains("\"type\":\"stepDownloadProgress\""), "got: {json}");
    assert!(json.contains("\"stepNumber\":2"), "got: {json}");

    let back: ImageBuildProgressUpdate = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, update);
}

#[test]
fn test_step_number_accessor_covers_every_variant() {
    let with_step = [
        ImageBuildProgressUpdate::ContextUploadProgress {
            step_number: 0,
            bytes_uploaded: 2048,
        },
        ImageBuildProgressUpdate::StepStarting {
            step_number: 1,
            step_name: "FROM alpine:3.18".to_string(),
        },
        ImageBuildProgressUpdate::StepOutput {
            step_number: 1,
            output: "hello\n".to_string(),
        },
        ImageBuildProgressUpdate::StepPullProgress {
            step_number: 1,
            pull_progress: PullImageProgressUpdate::new("Pull complete", None, "abc"),
        },
        ImageBuildProgressUpdate::StepDownloadProgress {
            step_number: 1,
            downloaded_bytes: 1,
            total_bytes: 2,
        },
        ImageBuildProgressUpdate::StepFinished { step_number: 1 },
    ];

    for update in &with_step {
        assert!(update.step_number().is_some(), "for {update:?}");
    }

    let failed = ImageBuildProgressUpdate::BuildFailed {
        message: "no space left on device".to_string(),
    };
    assert_eq!(failed.step_number(), None);
}
