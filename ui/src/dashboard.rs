//! Top-level shell: auth gate, tab routing, delete confirmation and the
//! refresh signal shared by the child views.

use crate::collections_view::{CollectionsMessage, CollectionsView};
use crate::command::{Command, Program};
use crate::gallery_view::{GalleryMessage, GalleryView};
use crate::toast::{Toast, Toasts};
use crate::upload_panel::{UploadMessage, UploadPanel};
use crate::{Backend, Services};
use api_client::{ApiClient, ApiClientError, MediaKind, UploadClient};
use auth::{AuthError, Identity, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Checking,
    SignedOut,
    SignedIn(Identity),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    All,
    Images,
    Videos,
    Collections,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::All, Tab::Images, Tab::Videos, Tab::Collections];

    /// Unknown or missing values fall back to [`Tab::All`].
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("images") => Tab::Images,
            Some("videos") => Tab::Videos,
            Some("collections") => Tab::Collections,
            _ => Tab::All,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Images => "images",
            Tab::Videos => "videos",
            Tab::Collections => "collections",
        }
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Tab::Images => Some(MediaKind::Image),
            Tab::Videos => Some(MediaKind::Video),
            Tab::All | Tab::Collections => None,
        }
    }
}

/// Sidebar collapse state, owned by the shell and handed to children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SidebarContext {
    pub collapsed: bool,
}

impl SidebarContext {
    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }
}

#[derive(Debug)]
pub enum DashboardMessage {
    CheckSession,
    SessionChecked(Result<Option<Session>, AuthError>),
    SetAuthMode(AuthMode),
    EmailChanged(String),
    PasswordChanged(String),
    ConfirmChanged(String),
    SubmitAuth,
    AuthCompleted(AuthMode, Result<Session, AuthError>),
    Logout,
    SelectTab(Tab),
    ToggleSidebar,
    RequestDelete(String),
    CancelDelete,
    ConfirmDelete,
    DeleteCompleted(String, Result<(), ApiClientError>),
    Gallery(GalleryMessage),
    Collections(CollectionsMessage),
    Upload(UploadMessage),
    DismissToast(usize),
}

struct SignedInViews {
    gallery: GalleryView,
    collections: CollectionsView,
    upload: UploadPanel,
    store: ApiClient,
}

pub struct Dashboard {
    services: Services,
    auth: AuthState,
    form: AuthForm,
    tab: Tab,
    sidebar: SidebarContext,
    pending_delete: Option<String>,
    refresh_signal: u64,
    views: Option<SignedInViews>,
    toasts: Toasts,
}

impl Dashboard {
    /// Mount the shell on the tab named by `tab_param`. The returned command
    /// checks for an existing session.
    pub fn new(services: Services, tab_param: Option<&str>) -> (Self, Command<DashboardMessage>) {
        let toasts = Toasts::new(services.error_log.clone());
        let dashboard = Self {
            services,
            auth: AuthState::Checking,
            form: AuthForm::default(),
            tab: Tab::from_param(tab_param),
            sidebar: SidebarContext::default(),
            pending_delete: None,
            refresh_signal: 0,
            views: None,
            toasts,
        };
        (
            dashboard,
            Command::perform(async {}, |_| DashboardMessage::CheckSession),
        )
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.auth {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn form(&self) -> &AuthForm {
        &self.form
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn sidebar(&self) -> SidebarContext {
        self.sidebar
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn refresh_signal(&self) -> u64 {
        self.refresh_signal
    }

    pub fn gallery(&self) -> Option<&GalleryView> {
        self.views.as_ref().map(|v| &v.gallery)
    }

    pub fn collections(&self) -> Option<&CollectionsView> {
        self.views.as_ref().map(|v| &v.collections)
    }

    pub fn upload(&self) -> Option<&UploadPanel> {
        self.views.as_ref().map(|v| &v.upload)
    }

    pub fn toasts(&self) -> &[Toast] {
        self.toasts.items()
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        self.toasts.take()
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, session)))]
    fn sign_in(&mut self, session: Session) -> Command<DashboardMessage> {
        let backend = Backend {
            store: ApiClient::new(&self.services.store, session.id_token.clone()),
            uploads: UploadClient::new(self.services.uploads.clone()),
            owner_id: session.identity.user_id.clone(),
        };
        let error_log = self.services.error_log.clone();
        let (gallery, gallery_cmd) =
            GalleryView::new(backend.clone(), self.tab.media_kind(), error_log.clone());
        let (collections, collections_cmd) = CollectionsView::new(backend.clone(), error_log.clone());
        let upload = UploadPanel::new(backend.clone(), error_log);
        self.views = Some(SignedInViews {
            gallery,
            collections,
            upload,
            store: backend.store,
        });
        self.form = AuthForm::default();
        tracing::info!(user = %session.identity.email, "dashboard signed in");
        self.auth = AuthState::SignedIn(session.identity);
        Command::batch(vec![
            gallery_cmd.map(DashboardMessage::Gallery),
            collections_cmd.map(DashboardMessage::Collections),
        ])
    }

    fn sign_out(&mut self) {
        self.views = None;
        self.pending_delete = None;
        self.auth = AuthState::SignedOut;
    }

    fn bump_refresh(&mut self) -> Command<DashboardMessage> {
        self.refresh_signal += 1;
        let signal = self.refresh_signal;
        let Some(views) = self.views.as_mut() else {
            return Command::none();
        };
        let gallery = views
            .gallery
            .update(GalleryMessage::RefreshSignal(signal))
            .map(DashboardMessage::Gallery);
        let collections = views
            .collections
            .update(CollectionsMessage::Gallery(GalleryMessage::RefreshSignal(signal)))
            .map(DashboardMessage::Collections);
        Command::batch(vec![gallery, collections])
    }

    /// Pull toasts raised by the child views into the shell.
    fn collect_child_toasts(&mut self) {
        if let Some(views) = self.views.as_mut() {
            let mut toasts = views.gallery.take_toasts();
            toasts.extend(views.collections.take_toasts());
            toasts.extend(views.upload.take_toasts());
            self.toasts.absorb(toasts);
        }
    }

    fn handle(&mut self, message: DashboardMessage) -> Command<DashboardMessage> {
        match message {
            DashboardMessage::CheckSession => {
                self.auth = AuthState::Checking;
                let client = self.services.auth.clone();
                return Command::perform(
                    async move { client.current_session().await },
                    DashboardMessage::SessionChecked,
                );
            }
            DashboardMessage::SessionChecked(result) => match result {
                Ok(Some(session)) => return self.sign_in(session),
                Ok(None) => self.sign_out(),
                Err(err) => {
                    self.sign_out();
                    self.toasts.error("Session Error", err.to_string());
                }
            },
            DashboardMessage::SetAuthMode(mode) => {
                self.form.mode = mode;
                self.form.error = None;
            }
            DashboardMessage::EmailChanged(email) => {
                self.form.email = email;
            }
            DashboardMessage::PasswordChanged(password) => {
                self.form.password = password;
            }
            DashboardMessage::ConfirmChanged(confirm) => {
                self.form.confirm = confirm;
            }
            DashboardMessage::SubmitAuth => {
                let mode = self.form.mode;
                let confirm = match mode {
                    AuthMode::Register => Some(self.form.confirm.as_str()),
                    AuthMode::Login => None,
                };
                if let Err(err) =
                    auth::validate_credentials(&self.form.email, &self.form.password, confirm)
                {
                    self.form.error = Some(err.to_string());
                    self.toasts.error("Authentication Error", err.to_string());
                    return Command::none();
                }
                self.form.error = None;
                self.form.submitting = true;
                let client = self.services.auth.clone();
                let email = self.form.email.clone();
                let password = self.form.password.clone();
                let confirm = self.form.confirm.clone();
                return Command::perform(
                    async move {
                        match mode {
                            AuthMode::Login => client.login(&email, &password).await,
                            AuthMode::Register => client.register(&email, &password, &confirm).await,
                        }
                    },
                    move |result| DashboardMessage::AuthCompleted(mode, result),
                );
            }
            DashboardMessage::AuthCompleted(mode, result) => {
                self.form.submitting = false;
                match result {
                    Ok(session) => {
                        let (title, description) = match mode {
                            AuthMode::Login => ("Welcome back!", "You have successfully logged in."),
                            AuthMode::Register => ("Account created!", "Your account has been created."),
                        };
                        self.toasts.success(title, description);
                        return self.sign_in(session);
                    }
                    Err(err) => {
                        self.form.error = Some(err.to_string());
                        self.toasts.error("Authentication Failed", err.to_string());
                    }
                }
            }
            DashboardMessage::Logout => match self.services.auth.logout() {
                Ok(()) => {
                    self.sign_out();
                    self.toasts.success("Signed out", "");
                }
                Err(err) => self.toasts.error("Logout Failed", err.to_string()),
            },
            DashboardMessage::SelectTab(tab) => {
                self.tab = tab;
                if tab != Tab::Collections {
                    if let Some(views) = self.views.as_mut() {
                        return views
                            .gallery
                            .update(GalleryMessage::SetKind(tab.media_kind()))
                            .map(DashboardMessage::Gallery);
                    }
                }
            }
            DashboardMessage::ToggleSidebar => {
                self.sidebar.toggle();
            }
            DashboardMessage::RequestDelete(media_id) => {
                self.pending_delete = Some(media_id);
            }
            DashboardMessage::CancelDelete => {
                self.pending_delete = None;
            }
            DashboardMessage::ConfirmDelete => {
                let Some(media_id) = self.pending_delete.take() else {
                    return Command::none();
                };
                let Some(views) = self.views.as_ref() else {
                    self.toasts
                        .error("Delete Failed", AuthError::NotSignedIn.to_string());
                    return Command::none();
                };
                let store = views.store.clone();
                return Command::perform(
                    async move {
                        let result = store.delete_media_record(&media_id).await;
                        (media_id, result)
                    },
                    |(media_id, result)| DashboardMessage::DeleteCompleted(media_id, result),
                );
            }
            DashboardMessage::DeleteCompleted(media_id, result) => match result {
                Ok(()) => {
                    tracing::info!(%media_id, "media deleted");
                    self.toasts
                        .success("Media Deleted", "The media has been deleted.");
                    let mut cmds = Vec::new();
                    if let Some(views) = self.views.as_mut() {
                        cmds.push(
                            views
                                .gallery
                                .update(GalleryMessage::MediaRemoved(media_id.clone()))
                                .map(DashboardMessage::Gallery),
                        );
                        cmds.push(
                            views
                                .collections
                                .update(CollectionsMessage::Gallery(GalleryMessage::MediaRemoved(
                                    media_id,
                                )))
                                .map(DashboardMessage::Collections),
                        );
                    }
                    cmds.push(self.bump_refresh());
                    return Command::batch(cmds);
                }
                Err(err) => self.toasts.error("Delete Failed", err.to_string()),
            },
            DashboardMessage::Gallery(message) => {
                if let Some(views) = self.views.as_mut() {
                    return views.gallery.update(message).map(DashboardMessage::Gallery);
                }
            }
            DashboardMessage::Collections(message) => {
                if let Some(views) = self.views.as_mut() {
                    return views
                        .collections
                        .update(message)
                        .map(DashboardMessage::Collections);
                }
            }
            DashboardMessage::Upload(message) => {
                if let Some(views) = self.views.as_mut() {
                    let cmd = views.upload.update(message).map(DashboardMessage::Upload);
                    if views.upload.take_refresh_request() {
                        return Command::batch(vec![cmd, self.bump_refresh()]);
                    }
                    return cmd;
                }
            }
            DashboardMessage::DismissToast(index) => {
                self.toasts.dismiss(index);
            }
        }
        Command::none()
    }
}

impl Program for Dashboard {
    type Message = DashboardMessage;

    fn update(&mut self, message: DashboardMessage) -> Command<DashboardMessage> {
        let cmd = self.handle(message);
        self.collect_child_toasts();
        cmd
    }
}
