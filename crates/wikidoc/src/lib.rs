pub mod categories;
pub mod client;
pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod parse_tree;
pub mod response;
pub mod revision;
pub mod templates;
pub mod title;
pub mod transport;

pub use categories::extract_categories;
pub use client::WikiClient;
pub use config::WikiConfig;
pub use document::Document;
pub use edit::{EditMode, EditOutcome, EditRequest, apply_edit, edit_query};
pub use error::{TransportError, WikidocError};
pub use response::{PageLookup, SavedEdit, lookup_page};
pub use revision::{RevisionCache, RevisionSnapshot};
pub use templates::{TemplateInvocation, extract_templates};
pub use title::{NamespaceTable, Title};
pub use transport::{HttpTransport, Method, Query, QueryValue, ScriptedTransport, Transport};
