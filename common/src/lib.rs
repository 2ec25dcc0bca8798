//! PetCare Admin Common Library
//!
//! CLIとWeb(WASM)で共有されるデータ層（APIクライアント・ストア・テーブルエンジン）

pub mod auth;
pub mod cache;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod files;
pub mod http;
pub mod modal;
pub mod models;
pub mod notify;
pub mod observe;
pub mod route;
pub mod search;
pub mod storage;
pub mod store;
pub mod table;
pub mod toast;
pub mod validation;

#[cfg(test)]
mod testing;

pub use auth::{AuthState, AuthStore, Session};
pub use cache::{fetch_breeds, LookupCache};
pub use dashboard::{Dashboard, ListView};
pub use error::{Error, FieldErrors, Result};
pub use http::{ApiClient, HttpRequest, HttpResponse, Method, Transport};
pub use modal::ModalStack;
pub use models::{
    Breed, Client, ClientDraft, ClientPatch, ClientStatus, Credentials, Entity, EntityId, Pet,
    PetDraft, PetPatch, PetStatus, Registration, User, Vaccination,
};
pub use route::{DetailRoute, Tab};
pub use search::{DisplayPage, ListMode};
pub use storage::{KeyValueStorage, MemoryStorage};
pub use store::{ClientStore, EntityStore, FetchStatus, Outcome, PetStore};
pub use table::{Column, RowAction, SortConfig, SortDirection, TableRow};
pub use toast::{Scheduler, ToastId, ToastQueue, ToastScheme, ToastSpec};
