mod http;
mod storage;

pub use self::http::{
    Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    ValidatedUrl,
};
pub use self::storage::{
    KeyNamespace, Storage, StorageError, StorageKey, StorageOperation, StorageOutput, StorageResult,
};

// Crux's built-in Render capability provides all we need for view updates.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppStorage = Storage<Event>;
pub type AppRender = Render<Event>;

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub storage: Storage<Event>,
    pub render: Render<Event>,
}
