//! Email bodies.

use super::EmailMessage;
use crate::domain::Account;
use crate::html::escape;

/// Relative verification link for `account`'s current token
pub fn check_email_token_link(account: &Account) -> String {
    token_link("/check-email-token", account)
}

/// Relative passwordless login link for `account`'s current token
pub fn login_by_email_link(account: &Account) -> String {
    token_link("/login-by-email", account)
}

fn token_link(path: &str, account: &Account) -> String {
    format!(
        "{}?token={}&email={}",
        path,
        urlencoding::encode(account.email_check_token.as_deref().unwrap_or_default()),
        urlencoding::encode(&account.email)
    )
}

pub fn sign_up_confirm_email(host: &str, account: &Account) -> EmailMessage {
    EmailMessage {
        to: account.email.clone(),
        subject: "StudyOlle, confirm your sign-up".to_string(),
        message: simple_link(
            host,
            &account.nickname,
            &check_email_token_link(account),
            "Verify email",
            "Click the link below to start using StudyOlle.",
        ),
    }
}

pub fn login_link_email(host: &str, account: &Account) -> EmailMessage {
    EmailMessage {
        to: account.email.clone(),
        subject: "StudyOlle, login link".to_string(),
        message: simple_link(
            host,
            &account.nickname,
            &login_by_email_link(account),
            "Log in to StudyOlle",
            "Click the link below to log in.",
        ),
    }
}

fn simple_link(host: &str, nickname: &str, link: &str, link_name: &str, message: &str) -> String {
    let href = format!("{}{}", host, link);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>StudyOlle</title>
</head>
<body>
    <div>
        <p>Hello, <span>{nickname}</span>.</p>
        <h2>{message}</h2>
        <div><a href="{href}">{link_name}</a></div>
        <p>If the link does not work, copy this URL into your browser:</p>
        <small>{href}</small>
    </div>
    <footer>
        <small>StudyOlle&copy; 2024</small>
    </footer>
</body>
</html>"#,
        nickname = escape(nickname),
        message = escape(message),
        href = escape(&href),
        link_name = escape(link_name),
    )
}
