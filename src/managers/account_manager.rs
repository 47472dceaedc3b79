//! Account lifecycle: sign-up, email verification, token resend, login and
//! profile settings.
//!
//! Every mutation follows one read-modify-write contract: open a store
//! transaction, load the account by id, mutate it, commit, and hand the
//! committed value back to the caller. Callers build session principals only
//! from those returned values.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{Account, Tag};
use crate::error::{AppError, Result};
use crate::forms::{NicknameForm, NotificationsForm, ProfileForm, SignUpForm, Validated};
use crate::mail::{templates, SharedEmailService};
use crate::password;
use crate::state::{Database, SharedStore};

/// Result of following an email verification link
#[derive(Debug, Clone)]
pub enum EmailCheck {
    Verified {
        account: Account,
        /// Account count read in the verifying transaction
        number_of_user: usize,
    },
    WrongEmail,
    WrongToken,
}

/// Result of asking for another token email
#[derive(Debug, Clone)]
pub enum TokenEmail {
    Sent(Account),
    UnknownEmail,
    /// The previous token is less than an hour old
    TooSoon,
}

pub struct AccountManager {
    store: SharedStore,
    mailer: SharedEmailService,
    /// Base URL for emailed links
    host: String,
}

impl AccountManager {
    pub fn new(store: SharedStore, mailer: SharedEmailService, host: String) -> Self {
        Self {
            store,
            mailer,
            host,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Validate, persist a new account with a fresh token and send the
    /// confirmation email. The account is removed again if the email cannot
    /// be sent.
    pub async fn process_new_account(&self, form: &SignUpForm) -> Result<Validated<Account>> {
        let errors = self.store.read(|db| form.validate_with(db)).await;
        if errors.has_errors() {
            debug!("Sign-up rejected for {}: {:?}", form.email, errors);
            return Ok(Validated::Invalid(errors));
        }

        let encoded = password::hash_password_task(form.password.clone()).await?;

        let mut tx = self.store.begin().await;

        // Someone may have taken the email or nickname since the check above
        let errors = form.validate_with(&tx);
        if errors.has_errors() {
            return Ok(Validated::Invalid(errors));
        }

        let mut account = Account::new(
            form.email.trim().to_string(),
            form.nickname.clone(),
            encoded,
        );
        account.generate_email_check_token();
        let account = tx.insert_account(account);
        tx.commit().await?;

        // Mail goes out without holding the store lock
        if let Err(e) = self
            .mailer
            .send_email(templates::sign_up_confirm_email(&self.host, &account))
            .await
        {
            warn!(
                "Confirmation email to {} failed, removing account {}",
                account.email, account.id
            );
            self.store
                .transaction(|db| {
                    db.remove_account(account.id);
                    Ok(())
                })
                .await?;
            return Err(e);
        }

        info!("New account {} ({}) created", account.nickname, account.id);
        Ok(Validated::Valid(account))
    }

    /// Verify the address behind `email` with the emailed `token`
    pub async fn complete_sign_up(&self, email: &str, token: &str) -> Result<EmailCheck> {
        let mut tx = self.store.begin().await;

        let id = match tx.find_account_by_email(email) {
            Some(account) => account.id,
            None => {
                debug!("Verification for unknown email {}", email);
                return Ok(EmailCheck::WrongEmail);
            }
        };

        let account = tx.find_account_mut(id)?;
        if !account.is_valid_token(token) {
            warn!("Wrong verification token for account {}", id);
            return Ok(EmailCheck::WrongToken);
        }

        // A second click on the same link keeps the original join date
        if !account.email_verified {
            account.complete_sign_up();
        }
        let account = account.clone();
        let number_of_user = tx.account_count();

        tx.commit().await?;

        info!("Account {} verified {}", account.nickname, account.email);
        Ok(EmailCheck::Verified {
            account,
            number_of_user,
        })
    }

    /// Send a new verification email to a logged-in account
    pub async fn resend_confirm_email(&self, account_id: u64) -> Result<TokenEmail> {
        self.send_token_email(account_id, templates::sign_up_confirm_email)
            .await
    }

    /// Email a passwordless login link to the account registered under `email`
    pub async fn send_login_link(&self, email: &str) -> Result<TokenEmail> {
        let id = self
            .store
            .read(|db| db.find_account_by_email(email.trim()).map(|a| a.id))
            .await;

        match id {
            Some(id) => {
                self.send_token_email(id, templates::login_link_email)
                    .await
            }
            None => Ok(TokenEmail::UnknownEmail),
        }
    }

    async fn send_token_email(
        &self,
        account_id: u64,
        build: fn(&str, &Account) -> crate::mail::EmailMessage,
    ) -> Result<TokenEmail> {
        let mut tx = self.store.begin().await;

        let account = tx.find_account_mut(account_id)?;
        if !account.can_send_confirm_email() {
            debug!("Token email for account {} requested too soon", account_id);
            return Ok(TokenEmail::TooSoon);
        }

        let previous = (
            account.email_check_token.clone(),
            account.email_check_token_generated_at,
        );
        account.generate_email_check_token();
        let account = account.clone();
        tx.commit().await?;

        if let Err(e) = self.mailer.send_email(build(&self.host, &account)).await {
            warn!("Token email to account {} failed, restoring old token", account_id);
            self.store
                .transaction(|db| {
                    let current = db.find_account_mut(account_id)?;
                    // Leave it alone if another request replaced the token meanwhile
                    if current.email_check_token == account.email_check_token {
                        current.email_check_token = previous.0;
                        current.email_check_token_generated_at = previous.1;
                    }
                    Ok(())
                })
                .await?;
            return Err(e);
        }

        info!("Sent token email to account {}", account_id);
        Ok(TokenEmail::Sent(account))
    }

    /// Passwordless login; never touches verification state
    pub async fn login_by_email(&self, email: &str, token: &str) -> Option<Account> {
        self.store
            .read(|db| {
                db.find_account_by_email(email)
                    .filter(|a| a.is_valid_token(token))
                    .cloned()
            })
            .await
    }

    /// Password login by email or nickname
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<Account> {
        let username = username.trim();
        let account = self
            .store
            .read(|db| load_by_username(db, username).cloned())
            .await?;

        if password::verify_password_task(account.password.clone(), password.to_string()).await {
            info!("Account {} logged in with password", account.nickname);
            Some(account)
        } else {
            warn!("Failed password login for '{}'", username);
            None
        }
    }

    pub async fn find_by_id(&self, id: u64) -> Result<Account> {
        self.store
            .read(|db| db.find_account(id).cloned())
            .await
            .ok_or(AppError::AccountNotFound { id })
    }

    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Account> {
        self.store
            .read(|db| db.find_account_by_nickname(nickname).cloned())
            .await
            .ok_or_else(|| AppError::NicknameNotFound {
                nickname: nickname.to_string(),
            })
    }

    pub async fn account_count(&self) -> usize {
        self.store.read(|db| db.account_count()).await
    }

    /// Load by id, mutate, commit, return the committed value
    async fn modify(&self, id: u64, f: impl FnOnce(&mut Account)) -> Result<Account> {
        self.store
            .transaction(|db| {
                let account = db.find_account_mut(id)?;
                f(account);
                Ok(account.clone())
            })
            .await
    }

    pub async fn update_profile(&self, id: u64, profile: &ProfileForm) -> Result<Account> {
        let account = self.modify(id, |a| profile.apply_to(a)).await?;
        info!("Updated profile of {}", account.nickname);
        Ok(account)
    }

    pub async fn update_password(&self, id: u64, new_password: &str) -> Result<Account> {
        let encoded = password::hash_password_task(new_password.to_string()).await?;
        let account = self.modify(id, |a| a.password = encoded).await?;
        info!("Updated password of {}", account.nickname);
        Ok(account)
    }

    pub async fn update_notifications(
        &self,
        id: u64,
        notifications: NotificationsForm,
    ) -> Result<Account> {
        self.modify(id, |a| a.notifications = notifications.into())
            .await
    }

    pub async fn update_nickname(&self, id: u64, form: &NicknameForm) -> Result<Validated<Account>> {
        let mut tx = self.store.begin().await;

        let errors = form.validate_with(&tx);
        if errors.has_errors() {
            return Ok(Validated::Invalid(errors));
        }

        let account = tx.find_account_mut(id)?;
        let previous = std::mem::replace(&mut account.nickname, form.nickname.clone());
        let account = account.clone();
        tx.commit().await?;

        info!("Account {} renamed from {} to {}", id, previous, account.nickname);
        Ok(Validated::Valid(account))
    }

    // Tags

    pub async fn get_tags(&self, id: u64) -> Result<Vec<String>> {
        self.store
            .read(|db| {
                let account = db.find_account(id).ok_or(AppError::AccountNotFound { id })?;
                Ok(account
                    .tags
                    .iter()
                    .filter_map(|t| db.find_tag(*t))
                    .map(|t| t.title.clone())
                    .collect())
            })
            .await
    }

    /// Titles of every known tag, for autocomplete
    pub async fn tag_whitelist(&self) -> Vec<String> {
        self.store
            .read(|db| db.tags.values().map(|t| t.title.clone()).collect())
            .await
    }

    /// Attach the tag titled `title`, creating it if needed
    pub async fn add_tag(&self, id: u64, title: &str) -> Result<Option<Tag>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        self.store
            .transaction(|db| {
                let tag = db.find_or_create_tag(title);
                db.find_account_mut(id)?.tags.insert(tag.id);
                Ok(Some(tag))
            })
            .await
    }

    /// Detach a tag; `false` if no tag has that title
    pub async fn remove_tag(&self, id: u64, title: &str) -> Result<bool> {
        self.store
            .transaction(|db| {
                let tag_id = match db.find_tag_by_title(title.trim()) {
                    Some(tag) => tag.id,
                    None => return Ok(false),
                };
                db.find_account_mut(id)?.tags.remove(&tag_id);
                Ok(true)
            })
            .await
    }

    // Zones

    pub async fn get_zones(&self, id: u64) -> Result<Vec<String>> {
        self.store
            .read(|db| {
                let account = db.find_account(id).ok_or(AppError::AccountNotFound { id })?;
                Ok(account
                    .zones
                    .iter()
                    .filter_map(|z| db.find_zone(*z))
                    .map(|z| z.to_string())
                    .collect())
            })
            .await
    }

    pub async fn zone_whitelist(&self) -> Vec<String> {
        self.store
            .read(|db| db.zones.values().map(|z| z.to_string()).collect())
            .await
    }

    /// Attach a known zone; `false` if it does not exist
    pub async fn add_zone(&self, id: u64, city: &str, province: &str) -> Result<bool> {
        self.store
            .transaction(|db| {
                let zone_id = match db.find_zone_by_city_and_province(city, province) {
                    Some(zone) => zone.id,
                    None => return Ok(false),
                };
                db.find_account_mut(id)?.zones.insert(zone_id);
                Ok(true)
            })
            .await
    }

    /// Detach a known zone; `false` if it does not exist
    pub async fn remove_zone(&self, id: u64, city: &str, province: &str) -> Result<bool> {
        self.store
            .transaction(|db| {
                let zone_id = match db.find_zone_by_city_and_province(city, province) {
                    Some(zone) => zone.id,
                    None => return Ok(false),
                };
                db.find_account_mut(id)?.zones.remove(&zone_id);
                Ok(true)
            })
            .await
    }
}

/// Email first, then nickname
fn load_by_username<'a>(db: &'a Database, username: &str) -> Option<&'a Account> {
    db.find_account_by_email(username)
        .or_else(|| db.find_account_by_nickname(username))
}

/// Shared account manager type
pub type SharedAccountManager = Arc<AccountManager>;

pub fn create_shared_account_manager(
    store: SharedStore,
    mailer: SharedEmailService,
    host: String,
) -> SharedAccountManager {
    Arc::new(AccountManager::new(store, mailer, host))
}
