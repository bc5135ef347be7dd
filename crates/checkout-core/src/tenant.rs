//! # Tenant Configuration
//!
//! Each restaurant storefront is a tenant: its orders and payment sessions are
//! isolated by restaurant id, and it has its own origin for post-redirect
//! completion.

use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tenant used when the storefront has not selected one
pub const DEFAULT_TENANT_ID: &str = "4";

/// Path the gateway returns to after a redirect-based confirmation
pub const CONFIRMATION_PATH: &str = "/order-confirmation";

/// Configuration for a single restaurant tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Restaurant id sent with every session request (e.g. "4")
    pub id: String,

    /// Display name
    pub name: String,

    /// Storefront origin (e.g. "https://order.example.com")
    pub origin: String,

    /// Path appended to the origin for the return URL
    #[serde(default = "default_confirmation_path")]
    pub confirmation_path: String,

    /// Statement descriptor suffix for bank statements (max ~10 chars)
    #[serde(default)]
    pub statement_descriptor_suffix: Option<String>,

    /// Whether this tenant accepts orders
    #[serde(default = "default_true")]
    pub active: bool,

    /// Additional tenant-specific metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_confirmation_path() -> String {
    CONFIRMATION_PATH.to_string()
}

impl Tenant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            origin: origin.into(),
            confirmation_path: default_confirmation_path(),
            statement_descriptor_suffix: None,
            active: true,
            metadata: HashMap::new(),
        }
    }

    /// Builder: set statement descriptor suffix
    pub fn with_statement_descriptor(mut self, suffix: impl Into<String>) -> Self {
        self.statement_descriptor_suffix = Some(suffix.into());
        self
    }

    /// Builder: set confirmation path
    pub fn with_confirmation_path(mut self, path: impl Into<String>) -> Self {
        self.confirmation_path = path.into();
        self
    }

    /// Builder: add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// URL the gateway sends the customer back to after a redirect
    pub fn return_url(&self) -> String {
        return_url_for(&self.origin, &self.confirmation_path)
    }
}

/// Join an origin and a path without doubling the slash
pub fn return_url_for(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Registry of all restaurant tenants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantRegistry {
    #[serde(default)]
    pub tenants: Vec<Tenant>,

    /// Used when no tenant id is specified
    #[serde(default)]
    default_tenant_id: Option<String>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from TOML (`[[tenants]]` tables)
    pub fn from_toml_str(content: &str) -> CheckoutResult<Self> {
        toml::from_str(content).map_err(|e| {
            CheckoutError::Configuration(format!("Invalid tenant configuration: {}", e))
        })
    }

    pub fn add(&mut self, tenant: Tenant) {
        self.tenants.push(tenant);
    }

    /// Add a tenant with builder pattern
    pub fn with_tenant(mut self, tenant: Tenant) -> Self {
        self.add(tenant);
        self
    }

    pub fn set_default(&mut self, tenant_id: impl Into<String>) {
        self.default_tenant_id = Some(tenant_id.into());
    }

    /// Get an active tenant by id
    pub fn get(&self, tenant_id: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.id == tenant_id && t.active)
    }

    /// The configured default, else tenant "4", else the first one
    pub fn default_tenant(&self) -> Option<&Tenant> {
        let default_id = self
            .default_tenant_id
            .as_deref()
            .unwrap_or(DEFAULT_TENANT_ID);
        self.get(default_id).or_else(|| self.active_tenants().next())
    }

    /// Get tenant by id or fall back to the default
    pub fn get_or_default(&self, tenant_id: Option<&str>) -> Option<&Tenant> {
        match tenant_id {
            Some(id) => self.get(id).or_else(|| self.default_tenant()),
            None => self.default_tenant(),
        }
    }

    /// Strict lookup for session requests
    pub fn require(&self, tenant_id: &str) -> CheckoutResult<&Tenant> {
        self.get(tenant_id).ok_or_else(|| CheckoutError::TenantNotFound {
            tenant_id: tenant_id.to_string(),
        })
    }

    pub fn active_tenants(&self) -> impl Iterator<Item = &Tenant> {
        self.tenants.iter().filter(|t| t.active)
    }

    pub fn has_tenant(&self, tenant_id: &str) -> bool {
        self.get(tenant_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
