use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, SessionSigner};
use crate::db::{AccountUpdate, Store};
use crate::engine::odds::parse_decimal;
use crate::errors::AppError;
use crate::models::{NumericInput, User};
use crate::services::notifier::Notifier;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub balance: Option<NumericInput>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub balance: Option<NumericInput>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub password: Option<String>,
}

/// Accounts, credentials and session issuance.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    signer: SessionSigner,
    notifier: Notifier,
    default_balance: Decimal,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        signer: SessionSigner,
        notifier: Notifier,
        default_balance: Decimal,
    ) -> Self {
        Self {
            store,
            signer,
            notifier,
            default_balance,
        }
    }

    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    pub async fn login(&self, credentials: Credentials) -> Result<LoginResponse, AppError> {
        let user = self
            .store
            .find_user_by_username(credentials.username.trim())
            .await?
            .filter(|u| verify_password(&credentials.password, &u.password_hash))
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login refused for suspended account");
            return Err(AppError::Forbidden);
        }

        let token = self.signer.issue(&user)?;
        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(LoginResponse { token, user })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list_users().await?)
    }

    pub async fn create_user(&self, form: NewUser) -> Result<User, AppError> {
        let username = form.username.trim();
        if username.is_empty() || form.password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".into(),
            ));
        }
        let balance = match &form.balance {
            Some(raw) => parse_balance(raw)?.unwrap_or(self.default_balance),
            None => self.default_balance,
        };

        let user = User::new(
            username.to_string(),
            hash_password(&form.password)?,
            balance,
            form.is_admin,
        );
        let user = self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, balance = %user.balance, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, AppError> {
        let balance = match &patch.balance {
            Some(raw) => parse_balance(raw)?,
            None => None,
        };
        let password_hash = match patch.password.as_deref() {
            Some("") => return Err(AppError::BadRequest("password cannot be empty".into())),
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let update = AccountUpdate {
            balance,
            is_active: patch.is_active,
            is_admin: patch.is_admin,
            password_hash,
        };
        let user = self
            .store
            .update_account(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

        tracing::info!(
            user_id = %user.id,
            balance = %user.balance,
            is_active = user.is_active,
            "User updated"
        );
        if update.balance.is_some() {
            self.notifier.balance_updated(user.id, user.balance);
        }
        Ok(user)
    }

    /// Create the bootstrap administrator unless the username is taken.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<(), AppError> {
        if self.store.find_user_by_username(username).await?.is_some() {
            tracing::debug!(username, "Bootstrap admin already present");
            return Ok(());
        }
        self.create_user(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            balance: None,
            is_admin: true,
        })
        .await?;
        tracing::info!(username, "Bootstrap admin created");
        Ok(())
    }
}

/// Balances are non-negative amounts in whole cents. Blank means unset.
fn parse_balance(raw: &NumericInput) -> Result<Option<Decimal>, AppError> {
    let text = raw.as_text();
    if text.trim().is_empty() {
        return Ok(None);
    }
    match parse_decimal(&text) {
        Some(balance) if balance >= Decimal::ZERO && balance.normalize().scale() <= 2 => {
            Ok(Some(balance))
        }
        _ => Err(AppError::BadRequest(
            "balance must be a non-negative amount".into(),
        )),
    }
}
