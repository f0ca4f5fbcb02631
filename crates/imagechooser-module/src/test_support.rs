// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory platform bridge used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use imagechooser_bridge::{
    MediaColumn, MediaCursor, NativeImagePicker, NativeMediaStore, PickerIntent, PlatformBridge,
};
use imagechooser_core::ActivityResult;
use imagechooser_core::error::{ChooserError, Result};

use crate::module::ImageChooserModule;

/// One row of the fake media store.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRecord {
    pub data: Option<String>,
    pub display_name: Option<String>,
    pub size: Option<i64>,
}

/// How the fake store answers a query for a given locator.
#[derive(Debug, Clone)]
pub(crate) enum Answer {
    Row(FakeRecord),
    /// Cursor with no rows.
    Empty,
    /// Provider returned no cursor at all.
    NullCursor,
    /// `query` itself fails.
    QueryFails,
    /// Cursor is returned but every column read fails.
    ReadFails,
    /// Collaborator panics while querying.
    Panics,
}

#[derive(Default)]
pub(crate) struct FakeBridge {
    answers: HashMap<String, Answer>,
    launch_error: Option<String>,
    launches: Arc<Mutex<Vec<PickerIntent>>>,
    cursors_opened: Arc<AtomicUsize>,
    cursors_closed: Arc<AtomicUsize>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, locator: &str, answer: Answer) -> Self {
        self.answers.insert(locator.to_owned(), answer);
        self
    }

    pub fn failing_launch(mut self, message: &str) -> Self {
        self.launch_error = Some(message.to_owned());
        self
    }

    /// Shared log of launched intents; stays readable after the bridge is
    /// boxed into a module.
    pub fn launch_log(&self) -> Arc<Mutex<Vec<PickerIntent>>> {
        Arc::clone(&self.launches)
    }

    pub fn open_cursors(&self) -> usize {
        self.cursors_opened.load(Ordering::SeqCst) - self.cursors_closed.load(Ordering::SeqCst)
    }

    fn cursor(&self, record: Option<FakeRecord>, fail_reads: bool) -> Box<dyn MediaCursor + '_> {
        self.cursors_opened.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeCursor {
            record,
            fail_reads,
            positioned: false,
            closed: Arc::clone(&self.cursors_closed),
        })
    }
}

impl PlatformBridge for FakeBridge {
    fn platform_name(&self) -> &str {
        "Fake"
    }
}

impl NativeImagePicker for FakeBridge {
    fn launch_image_picker(&self, intent: &PickerIntent) -> Result<()> {
        self.launches
            .lock()
            .expect("launches lock")
            .push(intent.clone());
        match &self.launch_error {
            Some(message) => Err(ChooserError::Launch(message.clone())),
            None => Ok(()),
        }
    }
}

impl NativeMediaStore for FakeBridge {
    fn query<'a>(
        &'a self,
        uri: &str,
        _projection: &[MediaColumn],
    ) -> Result<Option<Box<dyn MediaCursor + 'a>>> {
        match self.answers.get(uri) {
            Some(Answer::Row(record)) => Ok(Some(self.cursor(Some(record.clone()), false))),
            Some(Answer::Empty) | None => Ok(Some(self.cursor(None, false))),
            Some(Answer::NullCursor) => Ok(None),
            Some(Answer::QueryFails) => {
                Err(ChooserError::MediaStore("provider went away".into()))
            }
            Some(Answer::ReadFails) => Ok(Some(self.cursor(Some(FakeRecord::default()), true))),
            Some(Answer::Panics) => panic!("media provider crashed"),
        }
    }
}

struct FakeCursor {
    record: Option<FakeRecord>,
    fail_reads: bool,
    positioned: bool,
    closed: Arc<AtomicUsize>,
}

impl FakeCursor {
    fn row(&self) -> Result<&FakeRecord> {
        if self.fail_reads {
            return Err(ChooserError::MediaStore("column read failed".into()));
        }
        match (&self.record, self.positioned) {
            (Some(record), true) => Ok(record),
            _ => Err(ChooserError::MediaStore("cursor not positioned on a row".into())),
        }
    }
}

impl MediaCursor for FakeCursor {
    fn move_to_first(&mut self) -> Result<bool> {
        self.positioned = self.record.is_some();
        Ok(self.positioned)
    }

    fn get_string(&mut self, column: MediaColumn) -> Result<Option<String>> {
        let row = self.row()?;
        Ok(match column {
            MediaColumn::Data => row.data.clone(),
            MediaColumn::DisplayName => row.display_name.clone(),
            MediaColumn::Size => row.size.map(|s| s.to_string()),
        })
    }

    fn get_long(&mut self, column: MediaColumn) -> Result<Option<i64>> {
        let row = self.row()?;
        match column {
            MediaColumn::Size => Ok(row.size),
            other => Err(ChooserError::MediaStore(format!(
                "column {} is not numeric",
                other.as_str()
            ))),
        }
    }
}

impl Drop for FakeCursor {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Bridge that delivers its activity result from inside
/// `launch_image_picker`, the way a synchronous host might.
pub(crate) struct ReentrantBridge {
    module: Arc<OnceLock<Weak<ImageChooserModule>>>,
    delivery: ActivityResult,
    launch_error: Option<String>,
    consumed: Arc<Mutex<Option<bool>>>,
}

impl ReentrantBridge {
    /// The returned cell must be filled with the owning module once it is
    /// wrapped in an `Arc`.
    pub fn new(delivery: ActivityResult) -> (Self, Arc<OnceLock<Weak<ImageChooserModule>>>) {
        let module = Arc::new(OnceLock::new());
        let bridge = Self {
            module: Arc::clone(&module),
            delivery,
            launch_error: None,
            consumed: Arc::default(),
        };
        (bridge, module)
    }

    /// Fail the launch after the result has already been delivered.
    pub fn failing_after_delivery(mut self, message: &str) -> Self {
        self.launch_error = Some(message.to_owned());
        self
    }

    /// What `handle_activity_result` returned during the launch, if it ran.
    pub fn consumed(&self) -> Arc<Mutex<Option<bool>>> {
        Arc::clone(&self.consumed)
    }
}

impl PlatformBridge for ReentrantBridge {
    fn platform_name(&self) -> &str {
        "Reentrant"
    }
}

impl NativeImagePicker for ReentrantBridge {
    fn launch_image_picker(&self, _intent: &PickerIntent) -> Result<()> {
        if let Some(module) = self.module.get().and_then(Weak::upgrade) {
            let consumed = module.handle_activity_result(self.delivery.clone());
            *self.consumed.lock().expect("consumed lock") = Some(consumed);
        }
        match &self.launch_error {
            Some(message) => Err(ChooserError::Launch(message.clone())),
            None => Ok(()),
        }
    }
}

impl NativeMediaStore for ReentrantBridge {
    fn query<'a>(
        &'a self,
        _uri: &str,
        _projection: &[MediaColumn],
    ) -> Result<Option<Box<dyn MediaCursor + 'a>>> {
        Ok(None)
    }
}
