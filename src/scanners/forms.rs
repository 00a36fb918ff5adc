// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// HTML form discovery shared by the injection probes.
// `scraper::Html` is not Send, so parsing stays in sync functions that return
// owned data and never lives across an await point.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::errors::TransportError;
use crate::http_client::{HttpResponse, Transport};

static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("valid form selector"));

static FIELD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, textarea").expect("valid field selector"));

/// Attributes whose presence marks an inline script entry point
pub const INLINE_HANDLER_ATTRS: [&str; 4] = ["onclick", "onerror", "onload", "onmouseover"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    /// Lowercased `type` attribute; `text` when absent, `textarea` for textareas
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub action: Url,
    pub method: FormMethod,
    pub fields: Vec<FormField>,
}

impl FormField {
    pub fn is_kind(&self, kinds: &[&str]) -> bool {
        kinds.contains(&self.kind.as_str())
    }
}

impl Form {
    /// Submit `values` the way a browser would for this form: urlencoded body
    /// for POST, query string otherwise.
    pub async fn submit(
        &self,
        transport: &dyn Transport,
        values: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        match self.method {
            FormMethod::Post => transport.post_form(self.action.as_str(), values).await,
            FormMethod::Get => {
                let mut url = self.action.clone();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                transport.get(url.as_str()).await
            }
        }
    }
}

/// Distinct query parameter names of `url`, in order of first appearance
pub fn query_param_names(url: &Url) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in url.query_pairs() {
        if !names.iter().any(|n| *n == name) {
            names.push(name.into_owned());
        }
    }
    names
}

/// Copy of `url` with every occurrence of `param` set to `value`; other
/// parameters keep their original values and order
pub fn with_param(url: &Url, param: &str, value: &str) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == param {
                (k.into_owned(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut out = url.clone();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Every `<form>` in document order, with actions resolved against `base`
pub fn discover_forms(html: &str, base: &Url) -> Vec<Form> {
    let document = Html::parse_document(html);

    document
        .select(&FORM_SELECTOR)
        .map(|form| {
            let element = form.value();

            let action = match element.attr("action").map(str::trim) {
                Some(action) if !action.is_empty() => {
                    base.join(action).unwrap_or_else(|_| base.clone())
                }
                _ => base.clone(),
            };

            let method = match element.attr("method") {
                Some(m) if m.trim().eq_ignore_ascii_case("post") => FormMethod::Post,
                _ => FormMethod::Get,
            };

            let fields = form
                .select(&FIELD_SELECTOR)
                .filter_map(|field| {
                    let el = field.value();
                    let name = el.attr("name")?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let kind = if el.name() == "textarea" {
                        "textarea".to_string()
                    } else {
                        el.attr("type")
                            .map(|t| t.trim().to_lowercase())
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| "text".to_string())
                    };
                    Some(FormField {
                        name: name.to_string(),
                        kind,
                        value: el.attr("value").unwrap_or_default().to_string(),
                    })
                })
                .collect();

            Form {
                action,
                method,
                fields,
            }
        })
        .collect()
}

/// First inline handler attribute present in the page and how many elements
/// carry it
pub fn first_inline_handler(html: &str) -> Option<(&'static str, usize)> {
    let document = Html::parse_document(html);

    INLINE_HANDLER_ATTRS.iter().find_map(|attr| {
        let count = document
            .tree
            .nodes()
            .filter_map(|node| node.value().as_element())
            .filter(|el| el.attr(attr).is_some())
            .count();
        (count > 0).then_some((*attr, count))
    })
}

/// Visible text of the document, lowercased
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
