//! User interface controllers for MediaVault.
//!
//! Controllers are headless: `update` mutates state and returns a
//! [`Command`] whose futures resolve to further messages. Rendering is left
//! to whichever front end drives them.

mod collections_view;
mod command;
mod dashboard;
mod dialogs;
mod gallery_view;
mod toast;
mod upload_panel;

pub use collections_view::{CollectionSummary, CollectionsMessage, CollectionsView};
pub use command::{settle, Command, Program};
pub use dashboard::{AuthForm, AuthMode, AuthState, Dashboard, DashboardMessage, SidebarContext, Tab};
pub use dialogs::CreateCollectionDialog;
pub use gallery_view::{FetchState, GalleryMessage, GalleryView};
pub use toast::{Toast, ToastKind, Toasts};
pub use upload_panel::{format_file_size, UploadMessage, UploadPanel, UploadSummary};

use api_client::{ApiClient, StoreSettings, UploadClient, UploadSettings};
use auth::AuthClient;
use std::path::PathBuf;

/// Remote handles scoped to the signed-in owner.
#[derive(Debug, Clone)]
pub struct Backend {
    pub store: ApiClient,
    pub uploads: UploadClient,
    pub owner_id: String,
}

/// Everything the shell needs to reach the outside world.
#[derive(Debug, Clone)]
pub struct Services {
    pub auth: AuthClient,
    pub store: StoreSettings,
    pub uploads: UploadSettings,
    pub error_log: Option<PathBuf>,
}
