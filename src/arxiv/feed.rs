//! Atom feed decoding for arXiv query responses.

use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::arxiv::types::{DocumentHandle, DocumentStoreError};

const ERROR_ENTRY_MARKER: &str = "/api/errors";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(default)]
    updated: String,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    #[serde(rename = "arxiv:doi", alias = "doi", default)]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
    #[serde(rename = "@type", default)]
    mime_type: Option<String>,
}

/// Decode an Atom response body into document handles, preserving feed order.
///
/// arXiv reports query errors as a single entry whose id points at its error catalog; those are
/// surfaced as [`DocumentStoreError::Lookup`] carrying the upstream message.
pub(crate) fn parse_feed(body: &str) -> Result<Vec<DocumentHandle>, DocumentStoreError> {
    let feed: Feed =
        quick_xml::de::from_str(body).map_err(|error| DocumentStoreError::Decode(error.to_string()))?;

    if let Some(error_entry) = feed
        .entries
        .iter()
        .find(|entry| entry.id.contains(ERROR_ENTRY_MARKER))
    {
        return Err(DocumentStoreError::Lookup(normalize_whitespace(
            &error_entry.summary,
        )));
    }

    Ok(feed.entries.into_iter().map(into_handle).collect())
}

fn into_handle(entry: Entry) -> DocumentHandle {
    let pdf_url = entry
        .links
        .iter()
        .find(|link| {
            link.title.as_deref() == Some("pdf")
                || link.mime_type.as_deref() == Some("application/pdf")
        })
        .map(|link| link.href.clone());

    DocumentHandle {
        id: short_id(&entry.id),
        title: normalize_whitespace(&entry.title),
        authors: entry
            .authors
            .into_iter()
            .map(|author| normalize_whitespace(&author.name))
            .collect(),
        published: calendar_date(&entry.published),
        updated: calendar_date(&entry.updated),
        abstract_text: normalize_whitespace(&entry.summary),
        source_url: entry.id.trim().to_string(),
        pdf_url,
        doi: entry
            .doi
            .map(|doi| doi.trim().to_string())
            .filter(|doi| !doi.is_empty()),
    }
}

/// Strip the `http://arxiv.org/abs/` prefix from an entry id.
pub(crate) fn short_id(entry_id: &str) -> String {
    let trimmed = entry_id.trim();
    trimmed
        .rsplit_once("/abs/")
        .map(|(_, id)| id)
        .unwrap_or(trimmed)
        .to_string()
}

fn calendar_date(timestamp: &str) -> String {
    let trimmed = timestamp.trim();
    match OffsetDateTime::parse(trimmed, &Rfc3339) {
        Ok(parsed) => format!(
            "{:04}-{:02}-{:02}",
            parsed.year(),
            u8::from(parsed.month()),
            parsed.day()
        ),
        Err(_) => trimmed.chars().take(10).collect(),
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
