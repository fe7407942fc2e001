//! Front-end state: which tool is active, whether a key is connected, and
//! what each form is showing.

use crate::credential::{CredentialGate, CredentialHost};
use crate::error::Result;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// The three tools offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Text-to-image.
    #[default]
    Generator,
    /// Image-to-video.
    Video,
    /// Instruction-guided image editing.
    Editor,
}

/// What a form currently displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    /// A request is outstanding; the submit control is disabled.
    pub loading: bool,
    /// Last successful result (a data URI or playable URL).
    pub result: Option<String>,
    /// Message from the last failed attempt.
    pub error: Option<String>,
}

/// One form with a single loading flag.
///
/// A second submission while one is outstanding is ignored. Submissions on
/// different forms do not block each other.
#[derive(Debug, Default)]
pub struct Form {
    state: Mutex<FormState>,
}

impl Form {
    /// Creates an idle form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of what the form displays.
    pub fn snapshot(&self) -> FormState {
        self.lock().clone()
    }

    /// Runs `action` unless the form is already loading.
    ///
    /// Returns `None` when the submission was ignored. Otherwise the error
    /// (if any) is rendered into the form as a message, the form goes back
    /// to idle, and the final state is returned. A previous result stays
    /// visible when a later attempt fails.
    pub async fn submit<F>(&self, action: F) -> Option<FormState>
    where
        F: Future<Output = Result<String>>,
    {
        {
            let mut state = self.lock();
            if state.loading {
                return None;
            }
            state.loading = true;
            state.error = None;
        }
        let _idle = ResetLoading(self);

        let outcome = action.await;

        let mut state = self.lock();
        match outcome {
            Ok(result) => state.result = Some(result),
            Err(e) => {
                tracing::debug!("form submission failed: {e}");
                state.error = Some(e.to_string());
            }
        }
        state.loading = false;
        Some(state.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Puts the form back to idle if the submission future is dropped mid-flight.
struct ResetLoading<'a>(&'a Form);

impl Drop for ResetLoading<'_> {
    fn drop(&mut self) {
        self.0.lock().loading = false;
    }
}

/// Whole-page state: gate status, active tool and one form per tool.
pub struct Session<H> {
    gate: CredentialGate<H>,
    ready: AtomicBool,
    active: Mutex<Tool>,
    /// Text-to-image form.
    pub generator: Form,
    /// Image-to-video form.
    pub video: Form,
    /// Image edit form.
    pub editor: Form,
}

impl<H: CredentialHost> Session<H> {
    /// Creates a session that starts locked until [`connect`](Self::connect) succeeds.
    pub fn new(gate: CredentialGate<H>) -> Self {
        Self {
            gate,
            ready: AtomicBool::new(false),
            active: Mutex::new(Tool::default()),
            generator: Form::new(),
            video: Form::new(),
            editor: Form::new(),
        }
    }

    /// Runs the credential gate and records the outcome.
    pub async fn connect(&self) -> bool {
        let ready = self.gate.ensure_ready().await;
        self.ready.store(ready, Ordering::SeqCst);
        ready
    }

    /// Whether the tools are unlocked.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Switches the visible tool. Form state is kept.
    pub fn select(&self, tool: Tool) {
        *self.active.lock().unwrap_or_else(|p| p.into_inner()) = tool;
    }

    /// Returns the visible tool.
    pub fn active(&self) -> Tool {
        *self.active.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Returns the form that belongs to `tool`.
    pub fn form(&self, tool: Tool) -> &Form {
        match tool {
            Tool::Generator => &self.generator,
            Tool::Video => &self.video,
            Tool::Editor => &self.editor,
        }
    }
}
