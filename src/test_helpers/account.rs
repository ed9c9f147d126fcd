//! A builder for creating `Account` instances in tests.

use crate::models::{Account, AccountStatus};

/// A builder for creating `Account` instances in tests.
pub struct AccountBuilder {
    id: Option<String>,
    tenant_id: Option<String>,
    display_name: Option<String>,
    credentials_ref: Option<String>,
    status: Option<AccountStatus>,
}

impl Default for AccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountBuilder {
    /// Creates a new `AccountBuilder` instance.
    pub fn new() -> Self {
        AccountBuilder {
            id: None,
            tenant_id: None,
            display_name: None,
            credentials_ref: None,
            status: None,
        }
    }

    /// Sets the account id.
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Sets the tenant id.
    pub fn tenant_id(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    /// Sets the display name.
    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    /// Sets the credentials reference.
    pub fn credentials_ref(mut self, credentials_ref: &str) -> Self {
        self.credentials_ref = Some(credentials_ref.to_string());
        self
    }

    /// Sets the lifecycle status.
    pub fn status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds the `Account` instance.
    pub fn build(self) -> Account {
        let mut account = Account::new(
            self.id.as_deref().unwrap_or("test-account"),
            self.tenant_id.as_deref().unwrap_or("test-tenant"),
            self.display_name.as_deref().unwrap_or("test account"),
            self.credentials_ref.as_deref().unwrap_or("test"),
        );
        if let Some(status) = self.status {
            account.status = status;
        }
        account
    }
}
