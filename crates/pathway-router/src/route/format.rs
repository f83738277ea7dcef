//! Reverse URL templates
//!
//! A template is the pattern with every placeholder replaced by a positional
//! slot. Literal text is stored already percent-encoded; parameter values are
//! percent-encoded when the template is rendered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::route::parser::ParsedPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FormatPart {
    Text(String),
    Param(usize),
}

/// Positional URL template for one concrete pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatTemplate {
    parts: Vec<FormatPart>,
}

impl FormatTemplate {
    /// Appends literal text, percent-encoding it
    pub fn push_literal(&mut self, text: &str) {
        let encoded = urlencoding::encode(text);
        self.push_raw(&encoded);
    }

    /// Appends text that is already in URL form, such as a separator
    pub fn push_raw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.parts.last_mut() {
            Some(FormatPart::Text(existing)) => existing.push_str(text),
            _ => self.parts.push(FormatPart::Text(text.to_string())),
        }
    }

    pub fn push_param(&mut self, index: usize) {
        self.parts.push(FormatPart::Param(index));
    }

    pub fn parts(&self) -> &[FormatPart] {
        &self.parts
    }

    /// Renders the template, percent-encoding each value
    ///
    /// A slot without a value renders as empty text.
    pub fn render<S: AsRef<str>>(&self, values: &[S]) -> String {
        let mut url = String::new();

        for part in &self.parts {
            match part {
                FormatPart::Text(text) => url.push_str(text),
                FormatPart::Param(index) => {
                    if let Some(value) = values.get(*index) {
                        url.push_str(&urlencoding::encode(value.as_ref()));
                    }
                }
            }
        }

        url
    }
}

/// Formats a URL for a route with one or more concrete variants
///
/// The variant whose parameter names equal the supplied keys is used. When
/// none matches, supplied keys unknown to every variant are reported as
/// unexpected; otherwise the names missing from the closest variant that
/// accepts all supplied keys are reported.
pub fn format_route(
    name: &str,
    variants: &[ParsedPath],
    params: &HashMap<String, String>,
) -> Result<String, FormatError> {
    let exact = variants.iter().find(|variant| {
        variant.parameter_names().len() == params.len()
            && variant
                .parameter_names()
                .iter()
                .all(|param| params.contains_key(param))
    });

    if let Some(variant) = exact {
        let values: Vec<&str> = variant
            .parameter_names()
            .iter()
            .map(|param| params.get(param).map_or("", String::as_str))
            .collect();
        return Ok(variant.format().render(&values));
    }

    let mut unexpected: Vec<String> = params
        .keys()
        .filter(|key| {
            !variants
                .iter()
                .any(|variant| variant.parameter_names().contains(*key))
        })
        .cloned()
        .collect();

    if !unexpected.is_empty() {
        unexpected.sort();
        return Err(FormatError::UnexpectedParameters {
            name: name.to_string(),
            unexpected,
        });
    }

    let closest = variants
        .iter()
        .filter(|variant| params.keys().all(|key| variant.parameter_names().contains(key)))
        .min_by_key(|variant| variant.parameter_names().len());

    let missing: Vec<String> = match closest {
        Some(variant) => variant
            .parameter_names()
            .iter()
            .filter(|param| !params.contains_key(*param))
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    if missing.is_empty() {
        // Keys spread over several variants with no single one accepting all
        let mut unexpected: Vec<String> = params.keys().cloned().collect();
        unexpected.sort();
        return Err(FormatError::UnexpectedParameters {
            name: name.to_string(),
            unexpected,
        });
    }

    Err(FormatError::MissingParameters {
        name: name.to_string(),
        missing,
    })
}
