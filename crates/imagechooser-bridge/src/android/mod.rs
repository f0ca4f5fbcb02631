// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Android API through JNI calls into the ART runtime.
//
// ## Architecture notes
//
// The picker is launched with `startActivityForResult`, so its outcome never
// comes back through this module. The host Activity forwards its
// `onActivityResult(requestCode, resultCode, data)` callback to
// `ImageChooserModule::handle_activity_result`, passing `data.getData()`
// as a string.
//
// Media store queries run synchronously through `ContentResolver.query` and
// hand back an `AndroidCursor`, which closes the Java cursor when dropped.

#![cfg(target_os = "android")]

use std::sync::OnceLock;

use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::sys::jsize;
use jni::{JNIEnv, JavaVM};

use imagechooser_core::error::{ChooserError, Result};

use crate::traits::*;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// `Intent.ACTION_PICK`.
const ACTION_PICK: &str = "android.intent.action.PICK";

static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

/// The process-wide `JavaVM`, taken from `ndk_context` on first use.
fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| ChooserError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    let _ = JAVA_VM.set(vm);
    JAVA_VM
        .get()
        .ok_or_else(|| ChooserError::Bridge("JavaVM cell empty after initialisation".into()))
}

/// Obtain a [`JNIEnv`] for the current thread, attaching it if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| ChooserError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the current Android `Activity` as a [`JObject`].
///
/// The pointer comes from `ndk_context::android_context().context()` which
/// is the `jobject` for the Activity hosting the native code.
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(ChooserError::Bridge(
            "Android context is null, no foreground activity".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Clear a pending Java exception and return its message, if any.
fn take_exception_message(env: &mut JNIEnv<'_>) -> Option<String> {
    if !env.exception_check().unwrap_or(false) {
        return None;
    }
    let throwable = env.exception_occurred().ok()?;
    env.exception_clear().ok()?;

    let message = env
        .call_method(&throwable, "getMessage", "()Ljava/lang/String;", &[])
        .ok()?
        .l()
        .ok()?;
    if message.is_null() {
        return None;
    }
    let message = JString::from(message);
    env.get_string(&message).ok().map(String::from)
}

/// Map a JNI failure into `ChooserError::Bridge`, clearing any Java
/// exception so later JNI calls on this thread stay legal.
fn jni_err(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> ChooserError {
    match take_exception_message(env) {
        Some(message) => ChooserError::Bridge(format!("{context}: {message}")),
        None => ChooserError::Bridge(format!("{context}: {e}")),
    }
}

/// Like [`jni_err`], but for failures while presenting the picker. The
/// Java exception message is passed through unchanged.
fn launch_err(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> ChooserError {
    match take_exception_message(env) {
        Some(message) => ChooserError::Launch(message),
        None => ChooserError::Launch(format!("{context}: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the image chooser platform bridge.
///
/// The struct is zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI. The first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativeImagePicker: Intent.ACTION_PICK wrapped in a chooser
// ---------------------------------------------------------------------------

impl NativeImagePicker for AndroidBridge {
    /// Dispatch `ACTION_PICK` filtered to `intent.mime_type`, wrapped in
    /// `Intent.createChooser`, via `startActivityForResult`.
    fn launch_image_picker(&self, intent: &PickerIntent) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(
            request_code = %intent.request_code,
            mime = %intent.mime_type,
            "Android: launching ACTION_PICK chooser"
        );

        let j_action: JString = match env.new_string(ACTION_PICK) {
            Ok(s) => s,
            Err(e) => return Err(launch_err(&mut env, "new_string(ACTION_PICK)", e)),
        };

        let gallery_intent: JObject = match env.new_object(
            "android/content/Intent",
            "(Ljava/lang/String;)V",
            &[JValue::Object(&j_action)],
        ) {
            Ok(obj) => obj,
            Err(e) => return Err(launch_err(&mut env, "new Intent(ACTION_PICK)", e)),
        };

        let j_mime: JString = match env.new_string(&intent.mime_type) {
            Ok(s) => s,
            Err(e) => return Err(launch_err(&mut env, "new_string(mime)", e)),
        };

        // galleryIntent.setType("image/*")
        if let Err(e) = env.call_method(
            &gallery_intent,
            "setType",
            "(Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&j_mime)],
        ) {
            return Err(launch_err(&mut env, "setType", e));
        }

        let j_title: JString = match env.new_string(&intent.chooser_title) {
            Ok(s) => s,
            Err(e) => return Err(launch_err(&mut env, "new_string(title)", e)),
        };

        // Intent.createChooser(galleryIntent, title)
        let chooser: JObject = match env
            .call_static_method(
                "android/content/Intent",
                "createChooser",
                "(Landroid/content/Intent;Ljava/lang/CharSequence;)Landroid/content/Intent;",
                &[JValue::Object(&gallery_intent), JValue::Object(&j_title)],
            )
            .and_then(|v| v.l())
        {
            Ok(obj) => obj,
            Err(e) => return Err(launch_err(&mut env, "Intent.createChooser", e)),
        };

        // -- Dispatch -----------------------------------------------------------
        if let Err(e) = env.call_method(
            &activity,
            "startActivityForResult",
            "(Landroid/content/Intent;I)V",
            &[JValue::Object(&chooser), JValue::Int(intent.request_code.0)],
        ) {
            return Err(launch_err(&mut env, "startActivityForResult(chooser)", e));
        }

        tracing::info!(
            request_code = %intent.request_code,
            "Android: picker dispatched, awaiting onActivityResult"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NativeMediaStore: ContentResolver.query
// ---------------------------------------------------------------------------

impl NativeMediaStore for AndroidBridge {
    fn query<'a>(
        &'a self,
        uri: &str,
        projection: &[MediaColumn],
    ) -> Result<Option<Box<dyn MediaCursor + 'a>>> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::debug!(uri, ?projection, "Android: querying ContentResolver");

        // Uri.parse(uri)
        let j_uri_str: JString = env
            .new_string(uri)
            .map_err(|e| jni_err(&mut env, "new_string(uri)", e))?;

        let uri_obj: JObject = env
            .call_static_method(
                "android/net/Uri",
                "parse",
                "(Ljava/lang/String;)Landroid/net/Uri;",
                &[JValue::Object(&j_uri_str)],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "Uri.parse", e))?;

        // ContentResolver resolver = activity.getContentResolver()
        let resolver: JObject = env
            .call_method(
                &activity,
                "getContentResolver",
                "()Landroid/content/ContentResolver;",
                &[],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "getContentResolver", e))?;

        // String[] projection, or null for "all columns"
        let j_projection: JObject = if projection.is_empty() {
            JObject::null()
        } else {
            let string_class = env
                .find_class("java/lang/String")
                .map_err(|e| jni_err(&mut env, "find_class(String)", e))?;

            let array = env
                .new_object_array(projection.len() as jsize, &string_class, &JObject::null())
                .map_err(|e| jni_err(&mut env, "new_object_array(projection)", e))?;

            for (i, column) in projection.iter().enumerate() {
                let j_column: JString = env
                    .new_string(column.as_str())
                    .map_err(|e| jni_err(&mut env, "new_string(column)", e))?;
                env.set_object_array_element(&array, i as jsize, j_column)
                    .map_err(|e| jni_err(&mut env, "set_object_array_element", e))?;
            }
            JObject::from(array)
        };

        // resolver.query(uri, projection, null, null, null)
        let cursor: JObject = env
            .call_method(
                &resolver,
                "query",
                "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
                &[
                    JValue::Object(&uri_obj),
                    JValue::Object(&j_projection),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&JObject::null()),
                ],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "ContentResolver.query", e))?;

        if cursor.is_null() {
            tracing::debug!(uri, "Android: ContentResolver returned a null cursor");
            return Ok(None);
        }

        let cursor = env
            .new_global_ref(cursor)
            .map_err(|e| jni_err(&mut env, "new_global_ref(cursor)", e))?;

        Ok(Some(Box::new(AndroidCursor { cursor })))
    }
}

// ---------------------------------------------------------------------------
// Cursor guard
// ---------------------------------------------------------------------------

/// Owns an `android.database.Cursor` and closes it on drop.
struct AndroidCursor {
    cursor: GlobalRef,
}

impl AndroidCursor {
    /// `cursor.getColumnIndex(name)`; a missing column is an error.
    fn column_index(&self, env: &mut JNIEnv<'_>, column: MediaColumn) -> Result<i32> {
        let j_name: JString = env
            .new_string(column.as_str())
            .map_err(|e| jni_err(env, "new_string(column)", e))?;

        let index = env
            .call_method(
                self.cursor.as_obj(),
                "getColumnIndex",
                "(Ljava/lang/String;)I",
                &[JValue::Object(&j_name)],
            )
            .and_then(|v| v.i())
            .map_err(|e| jni_err(env, "Cursor.getColumnIndex", e))?;

        if index < 0 {
            return Err(ChooserError::MediaStore(format!(
                "column {} not present in cursor",
                column.as_str()
            )));
        }
        Ok(index)
    }

    /// `cursor.isNull(index)`.
    fn is_null(&self, env: &mut JNIEnv<'_>, index: i32) -> Result<bool> {
        env.call_method(self.cursor.as_obj(), "isNull", "(I)Z", &[JValue::Int(index)])
            .and_then(|v| v.z())
            .map_err(|e| jni_err(env, "Cursor.isNull", e))
    }
}

impl MediaCursor for AndroidCursor {
    fn move_to_first(&mut self) -> Result<bool> {
        let mut env = jni_env()?;
        env.call_method(self.cursor.as_obj(), "moveToFirst", "()Z", &[])
            .and_then(|v| v.z())
            .map_err(|e| jni_err(&mut env, "Cursor.moveToFirst", e))
    }

    fn get_string(&mut self, column: MediaColumn) -> Result<Option<String>> {
        let mut env = jni_env()?;
        let index = self.column_index(&mut env, column)?;
        if self.is_null(&mut env, index)? {
            return Ok(None);
        }

        let value = env
            .call_method(
                self.cursor.as_obj(),
                "getString",
                "(I)Ljava/lang/String;",
                &[JValue::Int(index)],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "Cursor.getString", e))?;

        if value.is_null() {
            return Ok(None);
        }
        let value = JString::from(value);
        let text = env
            .get_string(&value)
            .map_err(|e| jni_err(&mut env, "get_string", e))?;
        Ok(Some(String::from(text)))
    }

    fn get_long(&mut self, column: MediaColumn) -> Result<Option<i64>> {
        let mut env = jni_env()?;
        let index = self.column_index(&mut env, column)?;
        if self.is_null(&mut env, index)? {
            return Ok(None);
        }

        env.call_method(self.cursor.as_obj(), "getLong", "(I)J", &[JValue::Int(index)])
            .and_then(|v| v.j())
            .map(Some)
            .map_err(|e| jni_err(&mut env, "Cursor.getLong", e))
    }
}

impl Drop for AndroidCursor {
    fn drop(&mut self) {
        let mut env = match jni_env() {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "Android: cannot close cursor, JNI unavailable");
                return;
            }
        };
        if let Err(e) = env.call_method(self.cursor.as_obj(), "close", "()V", &[]) {
            let err = jni_err(&mut env, "Cursor.close", e);
            tracing::warn!(error = %err, "Android: failed to close cursor");
        }
    }
}
