// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The image chooser module.
//
// Two entry points: `pick_image` (called by the host on behalf of the app)
// and `handle_activity_result` (called by the host when the platform reports
// that an activity finished). Between them sits a single pending-request
// slot:
//
//   Idle --pick_image--> Awaiting --matching result--> Resolved | Rejected --> Idle
//
// The slot mutex is never held across a bridge call, so a bridge may deliver
// its activity result re-entrantly from inside `launch_image_picker`.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use imagechooser_bridge::{PickerIntent, PlatformBridge};
use imagechooser_core::error::{ChooserError, Result};
use imagechooser_core::{
    ActivityResult, ChooserConfig, ContentReference, ImageSelection, ResultCode, SupersedePolicy,
};

use crate::media::bounds::read_bounds;
use crate::media::resolver::MetadataResolver;
use crate::pending::{PendingRequest, PickHandle};

/// Name under which the host registers this module.
pub const MODULE_NAME: &str = "ImageChooserModule";

/// Picker adapter: one outstanding pick at a time, completed exactly once.
pub struct ImageChooserModule {
    bridge: Box<dyn PlatformBridge>,
    config: ChooserConfig,
    pending: Mutex<Option<PendingRequest>>,
    next_serial: AtomicU64,
}

impl ImageChooserModule {
    pub fn new(bridge: Box<dyn PlatformBridge>, config: ChooserConfig) -> Self {
        info!(
            platform = bridge.platform_name(),
            request_code = %config.request_code,
            "Image chooser module created"
        );
        Self {
            bridge,
            config,
            pending: Mutex::new(None),
            next_serial: AtomicU64::new(1),
        }
    }

    /// Module with the default configuration.
    pub fn with_bridge(bridge: Box<dyn PlatformBridge>) -> Self {
        Self::new(bridge, ChooserConfig::default())
    }

    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    pub fn config(&self) -> &ChooserConfig {
        &self.config
    }

    /// Whether a pick is waiting for its activity result.
    pub fn is_awaiting(&self) -> bool {
        self.slot().is_some()
    }

    // -- Entry point: pick ----------------------------------------------------

    /// Launch the platform picker and return a handle that completes when
    /// the host forwards the matching activity result.
    ///
    /// If a pick is already outstanding, `SupersedePolicy` decides which
    /// request is rejected. A launch failure rejects the returned handle
    /// immediately with the platform's description.
    #[instrument(skip(self), fields(request_code = %self.config.request_code))]
    pub fn pick_image(&self) -> PickHandle {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let (request, handle) = PendingRequest::new(serial, self.config.request_code);

        let superseded = {
            let mut slot = self.slot();
            match (slot.take(), self.config.supersede_policy) {
                (None, _) => {
                    *slot = Some(request);
                    None
                }
                (Some(previous), SupersedePolicy::RejectPrevious) => {
                    *slot = Some(request);
                    Some(previous)
                }
                (Some(previous), SupersedePolicy::RefuseNew) => {
                    *slot = Some(previous);
                    drop(slot);
                    warn!(serial, "Picker already open, refusing new request");
                    request.reject(ChooserError::Busy);
                    return handle;
                }
            }
        };

        if let Some(previous) = superseded {
            warn!(
                previous = previous.serial,
                serial, "New pick supersedes outstanding request"
            );
            previous.reject(ChooserError::Superseded);
        }

        let intent = PickerIntent {
            request_code: self.config.request_code,
            mime_type: self.config.mime_type.clone(),
            chooser_title: self.config.chooser_title.clone(),
        };

        info!(serial, "Launching image picker");
        if let Err(err) = self.bridge.launch_image_picker(&intent) {
            warn!(serial, error = %err, "Image picker failed to launch");
            if let Some(request) = self.take_if(serial) {
                request.reject(err);
            }
        }

        handle
    }

    // -- Entry point: activity result -----------------------------------------

    /// Feed an "activity finished" event to the module.
    ///
    /// Returns `true` if the event carries this module's request code (and
    /// was therefore consumed), `false` otherwise. A non-matching event has
    /// no side effects.
    #[instrument(
        skip(self, result),
        fields(request_code = %result.request_code, result_code = result.result_code.raw())
    )]
    pub fn handle_activity_result(&self, result: ActivityResult) -> bool {
        if result.request_code != self.config.request_code {
            debug!("Activity result is not for the image chooser");
            return false;
        }

        let Some(request) = self.slot().take() else {
            debug!("Activity result arrived with no pick outstanding");
            return true;
        };

        let outcome = match result.result_code {
            ResultCode::Canceled => Err(ChooserError::Cancelled),
            ResultCode::Other(code) => Err(ChooserError::UnexpectedResult(code)),
            ResultCode::Ok => {
                let data = result.data.as_deref();
                catch_unwind(AssertUnwindSafe(|| self.resolve_selection(data)))
                    .unwrap_or_else(|payload| Err(panic_error(payload)))
            }
        };

        request.complete(outcome);
        true
    }

    /// Reject whatever pick is outstanding, e.g. because the host activity
    /// is being torn down. Returns `false` (and does nothing) when idle.
    pub fn reject_pending(&self, error: ChooserError) -> bool {
        let taken = self.slot().take();
        match taken {
            Some(request) => {
                request.reject(error);
                true
            }
            None => false,
        }
    }

    // -- Resolution -----------------------------------------------------------

    /// Turn the picker's content locator into an `ImageSelection`.
    fn resolve_selection(&self, data: Option<&str>) -> Result<ImageSelection> {
        let reference = data
            .and_then(ContentReference::parse)
            .ok_or(ChooserError::NoSelection)?;
        debug!(locator = reference.locator(), "Resolving picked image");

        let resolver = MetadataResolver::new(self.bridge.as_ref());
        let path = resolver
            .resolve_path(&reference)
            .ok_or(ChooserError::UnresolvedPath)?;

        let bounds = read_bounds(&path)?;
        let size = resolver.resolve_size(&reference);
        let name = resolver.resolve_name(&reference);

        Ok(ImageSelection {
            height: bounds.height,
            width: bounds.width,
            size,
            name,
            uri: reference.locator().to_owned(),
        })
    }

    // -- Slot helpers ---------------------------------------------------------

    fn slot(&self) -> MutexGuard<'_, Option<PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the pending request only if it is still the one with `serial`.
    fn take_if(&self, serial: u64) -> Option<PendingRequest> {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(request) if request.serial == serial => slot.take(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ImageChooserModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageChooserModule")
            .field("platform", &self.bridge.platform_name())
            .field("config", &self.config)
            .field("awaiting", &self.is_awaiting())
            .finish()
    }
}

/// Describe a panic caught while resolving a selection.
fn panic_error(payload: Box<dyn Any + Send>) -> ChooserError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());
    ChooserError::Bridge(format!("panic while resolving picked image: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Answer, FakeBridge, FakeRecord, ReentrantBridge};
    use std::sync::{Arc, OnceLock, Weak};
    use image::{Rgb, RgbImage};
    use imagechooser_core::RequestCode;
    use std::io::Write;
    use std::path::Path;

    const PHOTO: &str = "content://media/external/images/media/42";

    fn module(bridge: FakeBridge) -> ImageChooserModule {
        ImageChooserModule::with_bridge(Box::new(bridge))
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save(path)
            .expect("save png");
    }

    fn ok_result(data: &str) -> ActivityResult {
        ActivityResult::from_raw(3500, ResultCode::RAW_OK, Some(data.to_owned()))
    }

    #[test]
    fn pick_launches_chooser_with_config() {
        let bridge = FakeBridge::new();
        let launches = bridge.launch_log();
        let chooser = module(bridge);
        let mut handle = chooser.pick_image();

        assert_eq!(launches.lock().expect("launches lock").len(), 1);

        assert!(chooser.is_awaiting());
        assert!(handle.try_result().is_none());
        assert_eq!(chooser.name(), "ImageChooserModule");
    }

    #[test]
    fn launch_intent_carries_request_code_and_filter() {
        let bridge = FakeBridge::new();
        let launches = bridge.launch_log();
        let chooser = ImageChooserModule::new(
            Box::new(bridge),
            ChooserConfig {
                request_code: RequestCode(77),
                ..ChooserConfig::default()
            },
        );
        let _handle = chooser.pick_image();

        let intent = launches.lock().expect("launches lock")[0].clone();
        assert_eq!(intent.request_code, RequestCode(77));
        assert_eq!(intent.mime_type, "image/*");
        assert_eq!(intent.chooser_title, "Pick an image");

        // Only a result with the configured code is consumed.
        assert!(!chooser.handle_activity_result(ActivityResult::from_raw(3500, 0, None)));
        assert!(chooser.is_awaiting());
        assert!(chooser.handle_activity_result(ActivityResult::from_raw(77, 0, None)));
        assert!(!chooser.is_awaiting());
    }

    #[test]
    fn launch_failure_rejects_immediately() {
        let chooser = module(FakeBridge::new().failing_launch("No Activity found to handle Intent"));
        let mut handle = chooser.pick_image();

        let err = handle.try_result().expect("completed").unwrap_err();
        assert_eq!(err.to_string(), "No Activity found to handle Intent");
        assert!(!chooser.is_awaiting());
    }

    #[test]
    fn cancel_rejects_with_fixed_message() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();

        assert!(chooser.handle_activity_result(ActivityResult::from_raw(
            3500,
            ResultCode::RAW_CANCELED,
            None
        )));
        let err = handle.try_result().expect("completed").unwrap_err();
        assert_eq!(err.to_string(), "Image picker was cancelled");
        assert!(!chooser.is_awaiting());
    }

    #[test]
    fn success_without_data_rejects() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();

        assert!(chooser.handle_activity_result(ActivityResult::from_raw(3500, -1, None)));
        let err = handle.try_result().expect("completed").unwrap_err();
        assert_eq!(err.to_string(), "Failed to pick image");
    }

    #[test]
    fn unresolvable_content_reference_rejects() {
        let chooser = module(FakeBridge::new().with_answer(PHOTO, Answer::Empty));
        let mut handle = chooser.pick_image();

        assert!(chooser.handle_activity_result(ok_result(PHOTO)));
        let err = handle.try_result().expect("completed").unwrap_err();
        assert_eq!(err.to_string(), "Failed resolve image path");
    }

    #[test]
    fn unexpected_result_code_rejects() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();

        assert!(chooser.handle_activity_result(ActivityResult::from_raw(3500, 1, None)));
        let err = handle.try_result().expect("completed").unwrap_err();
        assert!(matches!(err, ChooserError::UnexpectedResult(1)));
    }

    #[test]
    fn foreign_request_code_is_not_consumed() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();

        assert!(!chooser.handle_activity_result(ActivityResult::from_raw(
            1234,
            ResultCode::RAW_CANCELED,
            None
        )));
        assert!(chooser.is_awaiting());
        assert!(handle.try_result().is_none());
    }

    #[test]
    fn matching_result_while_idle_is_consumed_without_effect() {
        let chooser = module(FakeBridge::new());
        assert!(chooser.handle_activity_result(ActivityResult::from_raw(3500, 0, None)));
        assert!(!chooser.is_awaiting());
    }

    #[test]
    fn completes_at_most_once() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();

        assert!(chooser.handle_activity_result(ActivityResult::from_raw(3500, 0, None)));
        assert!(chooser.handle_activity_result(ActivityResult::from_raw(3500, -1, None)));
        assert!(!chooser.reject_pending(ChooserError::Cancelled));

        let err = handle.try_result().expect("completed").unwrap_err();
        assert!(matches!(err, ChooserError::Cancelled));
    }

    #[test]
    fn direct_file_selection_resolves() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("img.jpg");
        write_png(&path, 64, 48);
        // Pad to a known size; the header is all that gets read.
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .expect("open");
        let len = file.metadata().expect("metadata").len();
        file.write_all(&vec![0u8; (12_345 - len) as usize])
            .expect("pad");
        drop(file);

        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();
        let locator = path.to_str().expect("utf8").to_owned();
        assert!(chooser.handle_activity_result(ok_result(&locator)));

        let selection = handle.try_result().expect("completed").expect("resolved");
        assert_eq!(selection.width, 64);
        assert_eq!(selection.height, 48);
        assert_eq!(selection.size, 12_345);
        assert_eq!(selection.name, "img.jpg");
        assert_eq!(selection.uri, locator);
        assert!(!chooser.is_awaiting());
    }

    #[test]
    fn file_uri_selection_keeps_original_locator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("holiday.png");
        write_png(&path, 3, 4);
        let locator = format!("file://{}", path.display());

        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();
        assert!(chooser.handle_activity_result(ok_result(&locator)));

        let selection = handle.try_result().expect("completed").expect("resolved");
        assert_eq!((selection.width, selection.height), (3, 4));
        assert_eq!(selection.name, "holiday.png");
        assert_eq!(selection.uri, locator);
    }

    #[test]
    fn content_selection_uses_media_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("IMG_0001.png");
        write_png(&path, 120, 80);

        let bridge = FakeBridge::new().with_answer(
            PHOTO,
            Answer::Row(FakeRecord {
                data: Some(path.to_str().expect("utf8").to_owned()),
                display_name: Some("Beach.png".into()),
                size: Some(987_654),
            }),
        );
        let chooser = module(bridge);
        let mut handle = chooser.pick_image();
        assert!(chooser.handle_activity_result(ok_result(PHOTO)));

        let selection = handle.try_result().expect("completed").expect("resolved");
        assert_eq!(
            selection,
            ImageSelection {
                height: 80,
                width: 120,
                size: 987_654,
                name: "Beach.png".into(),
                uri: PHOTO.into(),
            }
        );
    }

    #[test]
    fn undecodable_image_rejects_with_description() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").expect("write");

        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();
        assert!(chooser.handle_activity_result(ok_result(path.to_str().expect("utf8"))));

        let err = handle.try_result().expect("completed").unwrap_err();
        assert!(matches!(err, ChooserError::Decode(_)), "got {err:?}");
        assert!(err.to_string().contains("broken.jpg"));
    }

    #[test]
    fn collaborator_panic_becomes_rejection() {
        let chooser = module(FakeBridge::new().with_answer(PHOTO, Answer::Panics));
        let mut handle = chooser.pick_image();

        assert!(chooser.handle_activity_result(ok_result(PHOTO)));
        let err = handle.try_result().expect("completed").unwrap_err();
        assert!(err.to_string().contains("media provider crashed"), "got {err}");
        assert!(!chooser.is_awaiting());
    }

    #[test]
    fn new_pick_supersedes_outstanding_one() {
        let bridge = FakeBridge::new();
        let launches = bridge.launch_log();
        let chooser = module(bridge);
        let mut first = chooser.pick_image();
        let mut second = chooser.pick_image();
        assert_eq!(launches.lock().expect("launches lock").len(), 2);

        let err = first.try_result().expect("first completed").unwrap_err();
        assert!(matches!(err, ChooserError::Superseded));
        assert!(second.try_result().is_none());
        assert!(chooser.is_awaiting());

        assert!(chooser.handle_activity_result(ActivityResult::from_raw(3500, 0, None)));
        assert!(matches!(
            second.try_result(),
            Some(Err(ChooserError::Cancelled))
        ));
    }

    #[test]
    fn refuse_new_keeps_outstanding_pick() {
        let chooser = ImageChooserModule::new(
            Box::new(FakeBridge::new()),
            ChooserConfig {
                supersede_policy: SupersedePolicy::RefuseNew,
                ..ChooserConfig::default()
            },
        );
        let mut first = chooser.pick_image();
        let mut second = chooser.pick_image();

        assert!(matches!(second.try_result(), Some(Err(ChooserError::Busy))));
        assert!(first.try_result().is_none());
        assert!(chooser.is_awaiting());
    }

    #[test]
    fn reject_pending_cancels_outstanding_pick() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();

        assert!(chooser.reject_pending(ChooserError::Cancelled));
        assert!(!chooser.is_awaiting());
        let err = handle.try_result().expect("completed").unwrap_err();
        assert!(matches!(err, ChooserError::Cancelled));
    }

    #[test]
    fn dropping_module_releases_caller() {
        let chooser = module(FakeBridge::new());
        let mut handle = chooser.pick_image();
        drop(chooser);

        assert!(matches!(
            handle.try_result(),
            Some(Err(ChooserError::ModuleDropped))
        ));
    }

    #[test]
    fn separate_modules_do_not_share_state() {
        let a = module(FakeBridge::new());
        let b = module(FakeBridge::new());
        let _handle = a.pick_image();

        assert!(a.is_awaiting());
        assert!(!b.is_awaiting());
    }

    fn reentrant_module(
        bridge: ReentrantBridge,
        link: &OnceLock<Weak<ImageChooserModule>>,
    ) -> Arc<ImageChooserModule> {
        let chooser = Arc::new(ImageChooserModule::with_bridge(Box::new(bridge)));
        assert!(link.set(Arc::downgrade(&chooser)).is_ok());
        chooser
    }

    #[test]
    fn result_delivered_during_launch_completes_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("inline.png");
        write_png(&path, 6, 4);

        let (bridge, link) = ReentrantBridge::new(ok_result(path.to_str().expect("utf8")));
        let consumed = bridge.consumed();
        let chooser = reentrant_module(bridge, &link);

        let mut handle = chooser.pick_image();

        assert_eq!(*consumed.lock().expect("consumed lock"), Some(true));
        assert!(!chooser.is_awaiting());
        let selection = handle.try_result().expect("completed").expect("resolved");
        assert_eq!((selection.width, selection.height), (6, 4));
        assert_eq!(selection.name, "inline.png");
    }

    #[test]
    fn launch_error_after_delivery_does_not_reject_again() {
        let (bridge, link) = ReentrantBridge::new(ActivityResult::from_raw(3500, 0, None));
        let bridge = bridge.failing_after_delivery("activity went away");
        let chooser = reentrant_module(bridge, &link);

        let mut handle = chooser.pick_image();

        let err = handle.try_result().expect("completed").unwrap_err();
        assert!(matches!(err, ChooserError::Cancelled));
        assert!(!chooser.is_awaiting());

        // The next pick gets its own outcome, untouched by the earlier failure.
        let mut next = chooser.pick_image();
        let err = next.try_result().expect("completed").unwrap_err();
        assert!(matches!(err, ChooserError::Cancelled));
    }

    #[tokio::test]
    async fn awaiting_caller_receives_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("async.png");
        write_png(&path, 10, 20);
        let locator = path.to_str().expect("utf8").to_owned();

        let chooser = std::sync::Arc::new(module(FakeBridge::new()));
        let handle = chooser.pick_image();

        let host = std::sync::Arc::clone(&chooser);
        tokio::task::spawn_blocking(move || host.handle_activity_result(ok_result(&locator)))
            .await
            .expect("join");

        let selection = handle.await.expect("resolved");
        assert_eq!((selection.width, selection.height), (10, 20));
        assert_eq!(selection.name, "async.png");
    }
}
