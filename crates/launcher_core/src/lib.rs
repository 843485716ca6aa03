use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock, Weak},
    time::Duration,
};

use shared::{domain::ClientId, protocol::LaunchResult};
use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod dialog;
pub mod platform;
pub mod query;
pub mod validator;

pub use dialog::{
    AuthAppDialog, AuthDialog, ButtonRole, DialogButton, DialogCallback, DialogElement,
    DialogProps, DialogText,
};
pub use platform::{
    ChannelLinkSource, LinkSource, MissingUrlOpener, OpenUrlError, SystemUrlOpener, UrlOpener,
};
pub use query::{build_launch_url, parse_query_params};
pub use validator::{ClientValidator, HttpClientValidator, ValidationError};

pub const DEFAULT_SCHEME_URL: &str = "com.chainlessandroid.app://login";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://download.chainlessdw20.com/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const APP_MISSING_MESSAGE: &str = "auth app is not installed on this device";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    /// Custom-scheme URL the client id is appended to.
    pub scheme_url: String,
    /// Page opened in the browser when the user agrees to install the app.
    pub download_url: String,
    /// Backend used for the pre-flight client check. `None` skips the check.
    pub validation_base_url: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            scheme_url: DEFAULT_SCHEME_URL.into(),
            download_url: DEFAULT_DOWNLOAD_URL.into(),
            validation_base_url: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

pub type DeepLinkCallback = Arc<dyn Fn(&str, &HashMap<String, String>) + Send + Sync>;

#[derive(Clone)]
pub struct LaunchOptions {
    pub client_id: ClientId,
    pub on_deep_link: Option<DeepLinkCallback>,
    pub custom_dialog: Option<Arc<dyn AuthDialog>>,
}

impl LaunchOptions {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            on_deep_link: None,
            custom_dialog: None,
        }
    }

    pub fn on_deep_link<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &HashMap<String, String>) + Send + Sync + 'static,
    {
        self.on_deep_link = Some(Arc::new(callback));
        self
    }

    pub fn custom_dialog(mut self, dialog: Arc<dyn AuthDialog>) -> Self {
        self.custom_dialog = Some(dialog);
        self
    }
}

impl fmt::Debug for LaunchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchOptions")
            .field("client_id", &self.client_id)
            .field("on_deep_link", &self.on_deep_link.is_some())
            .field("custom_dialog", &self.custom_dialog.is_some())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("auth app launcher must be created inside a tokio runtime")]
    NoRuntime,
    #[error("failed to set up client validation: {0}")]
    Validator(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The auth app accepted the login link.
    Opened,
    /// Nothing handles the custom scheme; the download dialog is now visible.
    AppMissing { reason: String },
    /// The backend answered with a non-zero code.
    Rejected { code: i64, message: String },
    /// The pre-flight check could not be completed.
    Unavailable { message: String },
}

impl LaunchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Opened)
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Opened => "",
            Self::AppMissing { .. } => APP_MISSING_MESSAGE,
            Self::Rejected { message, .. } | Self::Unavailable { message } => message,
        }
    }

    pub fn result(&self) -> LaunchResult {
        if self.is_success() {
            LaunchResult::ok()
        } else {
            LaunchResult::failed(self.message())
        }
    }
}

struct LauncherState {
    client_id: ClientId,
    settings: LaunchSettings,
    opener: Arc<dyn UrlOpener>,
    dialog_visible: watch::Sender<bool>,
}

impl LauncherState {
    fn show_dialog(&self) {
        self.dialog_visible.send_replace(true);
    }

    fn hide_dialog(&self) -> bool {
        self.dialog_visible.send_if_modified(hide)
    }

    fn cancel(&self) -> bool {
        let hidden = self.hide_dialog();
        if hidden {
            debug!(client_id = %self.client_id, "launcher: download dialog declined");
        }
        hidden
    }

    async fn confirm(&self) -> bool {
        if !*self.dialog_visible.borrow() {
            return false;
        }
        let download_url = &self.settings.download_url;
        info!(
            client_id = %self.client_id,
            download_url = %download_url,
            "launcher: redirecting to download page"
        );
        if let Err(err) = self.opener.open_url(download_url).await {
            warn!(download_url = %download_url, "launcher: failed to open download page: {err}");
        }
        self.hide_dialog()
    }
}

fn hide(visible: &mut bool) -> bool {
    std::mem::replace(visible, false)
}

/// Open while the listener may call back. A dispatch holds the read side for
/// the whole callback, so closing it waits out one already in flight.
#[derive(Clone)]
struct DispatchGate(Arc<RwLock<bool>>);

impl DispatchGate {
    fn open() -> Self {
        Self(Arc::new(RwLock::new(true)))
    }

    fn close(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = false;
    }

    fn run(&self, dispatch: impl FnOnce()) {
        let open = self.0.read().unwrap_or_else(PoisonError::into_inner);
        if *open {
            dispatch();
        }
    }
}

struct DeepLinkListener {
    gate: DispatchGate,
    task: JoinHandle<()>,
}

impl DeepLinkListener {
    fn spawn(runtime: &Handle, links: Arc<dyn LinkSource>, callback: DeepLinkCallback) -> Self {
        let gate = DispatchGate::open();
        // Subscribe before looking at the cold-start url so nothing delivered
        // in between is lost.
        let mut events = links.subscribe();
        let task_gate = gate.clone();
        let task = runtime.spawn(async move {
            if let Some(url) = links.initial_url().await {
                dispatch_deep_link(&task_gate, &callback, &url, "cold start");
            }
            loop {
                match events.recv().await {
                    Ok(url) => dispatch_deep_link(&task_gate, &callback, &url, "event"),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "deeplink: listener lagged, inbound urls dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("deeplink: link source closed");
                        break;
                    }
                }
            }
        });
        Self { gate, task }
    }

    fn stop(&self) {
        self.task.abort();
        self.gate.close();
    }
}

fn dispatch_deep_link(gate: &DispatchGate, callback: &DeepLinkCallback, url: &str, origin: &str) {
    gate.run(|| {
        let params = parse_query_params(url);
        info!(url, origin, params = params.len(), "deeplink: received");
        callback(url, &params);
    });
}

/// Opens the auth app for a client and owns the "app not installed" dialog.
///
/// Must be created inside a Tokio runtime: dialog callbacks and the deep-link
/// listener run on it. Dropping the launcher (or calling
/// [`AuthAppLauncher::shutdown`]) releases the deep-link subscription; once
/// either returns the deep-link callback never runs again. Dropping from
/// inside the deep-link callback itself deadlocks.
pub struct AuthAppLauncher {
    state: Arc<LauncherState>,
    validator: Option<Arc<dyn ClientValidator>>,
    dialog: Arc<dyn AuthDialog>,
    runtime: Handle,
    deep_links: Option<DeepLinkListener>,
}

impl AuthAppLauncher {
    /// Uses the system URL handler and, when `settings` names a validation
    /// backend, an HTTP pre-flight check.
    pub fn new(
        options: LaunchOptions,
        settings: LaunchSettings,
        links: Arc<dyn LinkSource>,
    ) -> Result<Self, LauncherError> {
        let validator = match settings.validation_base_url.as_deref() {
            Some(base_url) => Some(Arc::new(HttpClientValidator::new(
                base_url,
                settings.request_timeout,
            )?) as Arc<dyn ClientValidator>),
            None => None,
        };
        Self::new_with_dependencies(options, settings, Arc::new(SystemUrlOpener), links, validator)
    }

    pub fn new_with_dependencies(
        options: LaunchOptions,
        settings: LaunchSettings,
        opener: Arc<dyn UrlOpener>,
        links: Arc<dyn LinkSource>,
        validator: Option<Arc<dyn ClientValidator>>,
    ) -> Result<Self, LauncherError> {
        let runtime = Handle::try_current().map_err(|_| LauncherError::NoRuntime)?;
        let LaunchOptions {
            client_id,
            on_deep_link,
            custom_dialog,
        } = options;

        let deep_links = on_deep_link
            .map(|callback| DeepLinkListener::spawn(&runtime, links, callback));
        let dialog: Arc<dyn AuthDialog> = match custom_dialog {
            Some(dialog) => dialog,
            None => Arc::new(AuthAppDialog::new()),
        };
        let (dialog_visible, _) = watch::channel(false);

        Ok(Self {
            state: Arc::new(LauncherState {
                client_id,
                settings,
                opener,
                dialog_visible,
            }),
            validator,
            dialog,
            runtime,
            deep_links,
        })
    }

    pub fn client_id(&self) -> &ClientId {
        &self.state.client_id
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.state.settings
    }

    /// Validates the client (when configured) and then asks the host to open
    /// the auth app. Only a failed open shows the download dialog; any other
    /// outcome hides a dialog left over from an earlier attempt.
    pub async fn launch(&self) -> LaunchOutcome {
        let state = &self.state;
        let client_id = &state.client_id;

        if let Some(validator) = &self.validator {
            match validator.client_info(client_id).await {
                Ok(info) if info.is_ok() => {
                    debug!(client_id = %client_id, "launcher: client validated");
                }
                Ok(info) => {
                    warn!(
                        client_id = %client_id,
                        code = info.code,
                        "launcher: client rejected: {}",
                        info.msg
                    );
                    state.hide_dialog();
                    return LaunchOutcome::Rejected {
                        code: info.code,
                        message: info.msg,
                    };
                }
                Err(err) => {
                    warn!(client_id = %client_id, "launcher: client validation failed: {err}");
                    state.hide_dialog();
                    return LaunchOutcome::Unavailable {
                        message: err.to_string(),
                    };
                }
            }
        }

        let url = build_launch_url(&state.settings.scheme_url, client_id);
        match state.opener.open_url(&url).await {
            Ok(()) => {
                info!(client_id = %client_id, "launcher: auth app opened");
                state.hide_dialog();
                LaunchOutcome::Opened
            }
            Err(err) => {
                warn!(
                    client_id = %client_id,
                    "launcher: auth app unavailable, offering download: {err}"
                );
                state.show_dialog();
                LaunchOutcome::AppMissing {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn is_dialog_visible(&self) -> bool {
        *self.state.dialog_visible.borrow()
    }

    pub fn watch_dialog(&self) -> watch::Receiver<bool> {
        self.state.dialog_visible.subscribe()
    }

    /// Hides the dialog. Returns false when it was already hidden.
    pub fn cancel(&self) -> bool {
        self.state.cancel()
    }

    /// Opens the download page and hides the dialog. Does nothing and returns
    /// false when the dialog is hidden.
    pub async fn confirm(&self) -> bool {
        self.state.confirm().await
    }

    /// Props wired to this launcher, for hosts that drive the dialog
    /// themselves.
    pub fn dialog_props(&self) -> DialogProps {
        let cancel_target = Arc::downgrade(&self.state);
        let confirm_target = Arc::downgrade(&self.state);
        let runtime = self.runtime.clone();
        DialogProps {
            visible: self.is_dialog_visible(),
            on_cancel: Arc::new(move || {
                if let Some(state) = cancel_target.upgrade() {
                    state.cancel();
                }
            }),
            on_confirm: Arc::new(move || spawn_confirm(&runtime, &confirm_target)),
        }
    }

    pub fn render_dialog(&self) -> Option<DialogElement> {
        self.dialog.render(&self.dialog_props())
    }

    /// Stops the deep-link listener and waits for it to finish.
    pub async fn shutdown(&mut self) {
        if let Some(listener) = self.deep_links.take() {
            listener.stop();
            let _ = listener.task.await;
            debug!(client_id = %self.state.client_id, "deeplink: listener released");
        }
    }
}

fn spawn_confirm(runtime: &Handle, target: &Weak<LauncherState>) {
    let Some(state) = target.upgrade() else {
        return;
    };
    runtime.spawn(async move {
        state.confirm().await;
    });
}

impl Drop for AuthAppLauncher {
    fn drop(&mut self) {
        if let Some(listener) = self.deep_links.take() {
            listener.stop();
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
