//! pagetype: pluggable page types for a content-management system
//!
//! A page type owns one category of page. It fetches its pages through
//! the query composer, stores them through the write pipeline, answers
//! requests through its loader, and contributes diff lines and search
//! texts through the hook registry. Persistence and field schemas sit
//! behind the `PageStore` and `SchemaGateway` traits.

pub mod behavior;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod page;
pub mod page_type;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod request;
pub mod router;
pub mod schema;
pub mod slug;
pub mod store;
pub mod write;

pub use behavior::{DefaultBehavior, PageTypeBehavior};
pub use dispatch::{LoaderState, SkipReason};
pub use error::{PageTypeError, StorageError};
pub use hooks::{HookRegistry, SearchText, STRONG_MATCH_WEIGHT};
pub use page::Page;
pub use page_type::PageType;
pub use registry::{Site, SiteBuilder};
pub use request::{Actor, DispatchOutcome, RequestContext};
pub use store::{Criteria, PageStore, PutOptions, QueryOptions, QueryResult};
