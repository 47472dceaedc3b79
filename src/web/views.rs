//! HTML rendering.
//!
//! Pages are a view name plus a flat model of attributes. The markup is
//! plain: `<main data-view>` wraps the model as a definition
//! list and field errors as a list keyed by field name.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::fmt::Display;

use crate::forms::FieldErrors;
use crate::html::escape;

/// A named page and the attributes it shows
#[derive(Debug, Clone)]
pub struct View {
    name: &'static str,
    status: StatusCode,
    model: Vec<(String, String)>,
    errors: FieldErrors,
    flash: Option<String>,
}

impl View {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            status: StatusCode::OK,
            model: Vec::new(),
            errors: FieldErrors::new(),
            flash: None,
        }
    }

    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.model.push((key.to_string(), value.to_string()));
        self
    }

    /// Add `key` only when `value` is present
    pub fn with_opt(self, key: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn flash(mut self, message: Option<String>) -> Self {
        self.flash = message;
        self
    }

    pub fn render(&self) -> String {
        let mut body = String::new();

        if let Some(flash) = &self.flash {
            body.push_str(&format!(
                "        <div class=\"flash\">{}</div>\n",
                escape(flash)
            ));
        }

        if !self.model.is_empty() {
            body.push_str("        <dl>\n");
            for (key, value) in &self.model {
                body.push_str(&format!(
                    "            <dt>{}</dt><dd>{}</dd>\n",
                    escape(key),
                    escape(value)
                ));
            }
            body.push_str("        </dl>\n");
        }

        if self.errors.has_errors() {
            body.push_str("        <ul class=\"errors\">\n");
            for (field, code) in self.errors.iter() {
                body.push_str(&format!(
                    "            <li data-field=\"{}\">{}</li>\n",
                    escape(field),
                    escape(code)
                ));
            }
            body.push_str("        </ul>\n");
        }

        layout(
            self.name,
            &format!(
                "    <main data-view=\"{}\">\n{}    </main>\n",
                escape(self.name),
                body
            ),
        )
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        (self.status, Html(self.render())).into_response()
    }
}

fn layout(title: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>StudyOlle - {title}</title>
</head>
<body>
{main}</body>
</html>"#,
        title = escape(title),
        main = main
    )
}

/// Generic error page
pub fn error_page(status: StatusCode, message: &str) -> String {
    View::new("error")
        .with("status", status.as_u16())
        .with("message", message)
        .render()
}
