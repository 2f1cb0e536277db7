//! Slug derivation and collision handling.

use std::collections::HashSet;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::airport::AirportRecord;

const SLUG_FRAGMENT_HEX_LEN: usize = 8;

/// Create a URL-friendly slug.
///
/// Accents are stripped after NFKD normalization, the text is lowercased and
/// every run of characters outside `[a-z0-9]` becomes a single `-`. When the
/// text is missing or slugifies to nothing, the trimmed, lowercased fallback
/// is returned as-is.
pub fn slugify(text: Option<&str>, fallback: Option<&str>) -> String {
    let fallback_slug = || fallback.unwrap_or_default().trim().to_lowercase();

    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return fallback_slug(),
    };

    let mut slug = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        return fallback_slug();
    }
    slug.to_string()
}

/// Slug for an airport: its name, or the first usable identifier.
pub fn airport_slug(record: &AirportRecord) -> String {
    let ident = [&record.ident, &record.icao_code, &record.iata_code]
        .into_iter()
        .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
        .map(str::to_string);
    let fallback = ident.or_else(|| record.id.map(|id| id.to_string()));
    slugify(record.name.as_deref(), fallback.as_deref())
}

/// Fill in the slug when the record does not carry one.
pub fn ensure_slug(record: &mut AirportRecord) {
    if record.slug.is_empty() {
        record.slug = airport_slug(record);
    }
}

/// What to do when two distinct records derive the same slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugCollisionPolicy {
    /// Keep every record by appending a stable fragment to later duplicates.
    #[default]
    Suffix,
    /// Last upsert for a slug wins; earlier records are discarded.
    Overwrite,
}

impl FromStr for SlugCollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix),
            "overwrite" | "last_write_wins" => Ok(Self::Overwrite),
            other => Err(format!("Unknown slug collision policy: {}", other)),
        }
    }
}

/// Derive missing slugs and resolve collisions within one ingestion batch.
///
/// Returns the number of collisions encountered. Under
/// [`SlugCollisionPolicy::Suffix`] the output depends only on the records and
/// their order, so re-ingesting the same source is idempotent.
pub fn assign_slugs(records: &mut [AirportRecord], policy: SlugCollisionPolicy) -> usize {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut collisions = 0;

    for record in records.iter_mut() {
        ensure_slug(record);
        if record.slug.is_empty() {
            record.slug = format!("airport-{}", identity_fragment(record));
        }
        if seen.insert(record.slug.clone()) {
            continue;
        }

        collisions += 1;
        if policy == SlugCollisionPolicy::Overwrite {
            continue;
        }

        let base = record.slug.clone();
        let mut candidate = format!("{}-{}", base, identity_fragment(record));
        let mut counter = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}-{}-{}", base, identity_fragment(record), counter);
            counter += 1;
        }
        record.slug = candidate;
        seen.insert(record.slug.clone());
    }

    if collisions > 0 {
        warn!(
            "Resolved {} slug collision(s) using policy {:?}",
            collisions, policy
        );
    }
    collisions
}

fn identity_fragment(record: &AirportRecord) -> String {
    let mut hasher = Sha256::new();
    for part in [
        record.ident.as_deref(),
        record.id.map(|id| id.to_string()).as_deref(),
        record.icao_code.as_deref(),
        record.iata_code.as_deref(),
        record.name.as_deref(),
    ] {
        hasher.update(part.unwrap_or_default().trim().as_bytes());
        hasher.update(b"|");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..SLUG_FRAGMENT_HEX_LEN].to_string()
}
