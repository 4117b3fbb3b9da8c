//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::config::PortalConfig;
use crate::directory::UserDirectory;
use crate::identity::IdentityClient;
use crate::payments::PaymentsClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the external-service clients. There is no shared
/// mutable state: handlers re-derive truth from the collaborators on every
/// request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    identity: IdentityClient,
    directory: UserDirectory,
    catalog: CatalogClient,
    payments: PaymentsClient,
}

impl AppState {
    /// Create a new application state, constructing all clients from the
    /// configuration.
    #[must_use]
    pub fn new(config: PortalConfig) -> Self {
        let identity = IdentityClient::new(&config.identity);
        let directory = UserDirectory::new(&config.directory);
        let catalog = CatalogClient::new(&config.catalog);
        let payments = PaymentsClient::new(&config.payments);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                directory,
                catalog,
                payments,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the document store client.
    #[must_use]
    pub fn directory(&self) -> &UserDirectory {
        &self.inner.directory
    }

    /// Get a reference to the catalog API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the payment processor client.
    #[must_use]
    pub fn payments(&self) -> &PaymentsClient {
        &self.inner.payments
    }
}
