// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pending pick request and the caller-side completion handle.
//
// A pick is a `oneshot` channel: the module keeps the sender in its pending
// slot, the caller holds the receiver as a `PickHandle`. Completing consumes
// the sender, so a request can be resolved or rejected at most once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info};

use imagechooser_core::error::{ChooserError, Result};
use imagechooser_core::{ImageSelection, RequestCode};

/// The module-side half of an outstanding pick.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    /// Monotonic id, unique per module instance.
    pub(crate) serial: u64,
    pub(crate) request_code: RequestCode,
    completion: oneshot::Sender<Result<ImageSelection>>,
}

impl PendingRequest {
    /// Create a request and the handle the caller will wait on.
    pub(crate) fn new(serial: u64, request_code: RequestCode) -> (Self, PickHandle) {
        let (tx, rx) = oneshot::channel();
        let request = Self {
            serial,
            request_code,
            completion: tx,
        };
        (request, PickHandle { serial, rx })
    }

    /// Fulfil the request.
    pub(crate) fn resolve(self, selection: ImageSelection) {
        info!(
            serial = self.serial,
            request_code = %self.request_code,
            width = selection.width,
            height = selection.height,
            size = selection.size,
            "Image pick resolved"
        );
        self.send(Ok(selection));
    }

    /// Reject the request.
    pub(crate) fn reject(self, error: ChooserError) {
        info!(
            serial = self.serial,
            request_code = %self.request_code,
            code = error.code(),
            reason = %error,
            "Image pick rejected"
        );
        self.send(Err(error));
    }

    /// Resolve or reject depending on `outcome`.
    pub(crate) fn complete(self, outcome: Result<ImageSelection>) {
        match outcome {
            Ok(selection) => self.resolve(selection),
            Err(error) => self.reject(error),
        }
    }

    fn send(self, outcome: Result<ImageSelection>) {
        if self.completion.send(outcome).is_err() {
            debug!(serial = self.serial, "Caller dropped its pick handle");
        }
    }
}

/// Caller-side completion handle for one `pick_image` call.
///
/// Await it from async code, or call [`PickHandle::blocking_wait`] from a
/// plain thread (e.g. a JNI callback thread). If the module is dropped
/// before the picker returns, the handle yields `ChooserError::ModuleDropped`.
#[derive(Debug)]
pub struct PickHandle {
    serial: u64,
    rx: oneshot::Receiver<Result<ImageSelection>>,
}

impl PickHandle {
    /// Id of the request this handle belongs to.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Block the current thread until the pick completes.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_wait(self) -> Result<ImageSelection> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(ChooserError::ModuleDropped))
    }

    /// Non-blocking check. `None` while the pick is still outstanding.
    pub fn try_result(&mut self) -> Option<Result<ImageSelection>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(ChooserError::ModuleDropped)),
        }
    }
}

impl Future for PickHandle {
    type Output = Result<ImageSelection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ChooserError::ModuleDropped)))
    }
}
