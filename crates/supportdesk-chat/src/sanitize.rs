// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text sanitizer applied before anything is persisted.
//!
//! Removes `<script>` blocks and stray script tags, `on*=` event-handler
//! attributes inside tags, and `javascript:` URIs. Character references
//! inside tags are decoded first, and the scheme match tolerates the tab and
//! newline characters browsers drop from URLs. Passes repeat until the text
//! stops changing, so removals cannot splice a new match together.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script\s*>").unwrap());

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script[^>]*>?").unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z][^>]*>?").unwrap());

static EVENT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([\s/"'])[\s/]*on[a-z]+\s*=\s*(?:"[^"]*"?|'[^']*'?|[^\s>]*)"#).unwrap()
});

// `j[\t\n\r]*a[\t\n\r]*...t\s*:`
static JS_URI: LazyLock<Regex> = LazyLock::new(|| {
    let scheme: Vec<String> = "javascript".chars().map(|c| c.to_string()).collect();
    Regex::new(&format!(r"(?i){}\s*:", scheme.join(r"[\t\n\r]*"))).unwrap()
});

static CHAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&#(?:x([0-9a-f]+)|([0-9]+));?|&(colon|tab|newline);").unwrap()
});

/// Decode numeric references and the named ones that can hide a scheme.
///
/// Every reference is longer than what it decodes to, so this only shrinks
/// the text. Invalid code points are dropped.
fn decode_char_refs(input: &str) -> String {
    CHAR_REF
        .replace_all(input, |caps: &Captures<'_>| {
            let code = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, _, Some(name)) => match name.as_str().to_ascii_lowercase().as_str() {
                    "colon" => Some(u32::from(':')),
                    "tab" => Some(u32::from('\t')),
                    _ => Some(u32::from('\n')),
                },
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

fn pass(input: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(input, "");
    let text = SCRIPT_TAG.replace_all(&text, "");
    let text = TAG.replace_all(&text, |caps: &Captures<'_>| {
        let tag = decode_char_refs(&caps[0]);
        EVENT_ATTR
            .replace_all(&tag, |attr: &Captures<'_>| match &attr[1] {
                // A closing quote of the previous attribute stays.
                quote @ ("\"" | "'") => quote.to_string(),
                _ => String::new(),
            })
            .into_owned()
    });
    JS_URI.replace_all(&text, "").into_owned()
}

/// Strip unsafe markup from `input` and trim surrounding whitespace.
pub fn sanitize(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = pass(&current);
        // Every pass only shrinks the text, so an unchanged length means a fixpoint.
        if next.len() == current.len() {
            return next.trim().to_string();
        }
        current = next;
    }
}
