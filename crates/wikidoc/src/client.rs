use std::sync::Arc;

use crate::config::WikiConfig;
use crate::document::Document;
use crate::error::WikidocError;
use crate::title::{NamespaceTable, Title};
use crate::transport::{HttpTransport, Transport};

struct ClientShared {
    transport: Arc<dyn Transport>,
    config: WikiConfig,
    namespaces: NamespaceTable,
}

/// Shared environment for wiki operations: one transport, one configuration.
///
/// Cheap to clone; every [`Document`] keeps a clone.
#[derive(Clone)]
pub struct WikiClient {
    shared: Arc<ClientShared>,
}

impl WikiClient {
    /// Create a client over an explicit transport.
    pub fn new(transport: Arc<dyn Transport>, config: WikiConfig) -> Self {
        let namespaces = NamespaceTable::with_aliases(&config.namespaces);
        Self {
            shared: Arc::new(ClientShared {
                transport,
                config,
                namespaces,
            }),
        }
    }

    /// Create a client talking HTTP to `config.api_url`.
    pub fn connect(config: WikiConfig) -> Result<Self, WikidocError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn transport(&self) -> &dyn Transport {
        self.shared.transport.as_ref()
    }

    pub(crate) fn transport_handle(&self) -> Arc<dyn Transport> {
        self.shared.transport.clone()
    }

    pub fn config(&self) -> &WikiConfig {
        &self.shared.config
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.shared.namespaces
    }

    pub fn title(&self, raw: &str) -> Result<Title, WikidocError> {
        Title::parse(raw, self.namespaces())
    }

    /// Opens a handle on the named document. No network access happens until it is read.
    pub fn document(&self, raw: &str) -> Result<Document, WikidocError> {
        Ok(self.document_for(self.title(raw)?))
    }

    pub fn document_for(&self, title: Title) -> Document {
        Document::new(self.clone(), title)
    }

    /// Handle on the page the workflow was opened on (`current_page` in the configuration).
    pub fn current_document(&self) -> Result<Document, WikidocError> {
        let raw = self
            .config()
            .current_page
            .as_deref()
            .ok_or_else(|| WikidocError::Config("current_page is not configured".into()))?;
        self.document(raw)
    }
}
