//! Paper corpus loading
//!
//! Parses `papers_enriched.csv` exports into typed [`PaperRecord`]s.
//! Real-world exports disagree on header names, so columns are resolved
//! once per file against an ordered alias table instead of being looked
//! up per row.

use crate::doi::normalize_opt;
use crate::errors::{AppError, Result};
use crate::source::load_text;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Maximum number of concept tags kept per paper
pub const MAX_CONCEPTS: usize = 10;

/// One paper of the corpus, immutable for the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Stable id derived from DOI, URL, PDF or title and year
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Ordered concept tags, at most [`MAX_CONCEPTS`]
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_media_mentions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mendeley_readers: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altmetric_score: Option<f64>,
}

impl PaperRecord {
    /// Normalized DOI, if the record carries one
    pub fn normalized_doi(&self) -> Option<String> {
        normalize_opt(self.doi.as_deref())
    }
}

/// Canonical fields recognised in the paper CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Abstract,
    Summary,
    Authors,
    Year,
    Pdf,
    Url,
    Concepts,
    Venue,
    Doi,
    Citations,
    SocialMediaMentions,
    MendeleyReaders,
    AltmetricScore,
}

/// Accepted header aliases per field, in priority order
pub const COLUMN_ALIASES: &[(Field, &[&str])] = &[
    (Field::Title, &["title", "paper_title", "name", "articletitle", "document title"]),
    (Field::Abstract, &["abstract", "description", "abstracttext"]),
    (Field::Summary, &["tldr summary", "summary"]),
    (Field::Authors, &["authors", "author", "author_names", "creators", "contributors"]),
    (Field::Year, &["year", "pub_year", "publicationyear", "date", "published", "publication year"]),
    (Field::Pdf, &["pdf", "pdf_url", "pdfurl", "file", "path", "localpdf"]),
    (Field::Url, &["url", "link", "paperurl", "source_url", "doi_url"]),
    (Field::Concepts, &["openalex concepts", "concepts", "keywords", "tags", "fields of study"]),
    (Field::Venue, &["venue", "journal", "source", "publication", "container_title"]),
    (Field::Doi, &["doi"]),
    (Field::Citations, &["citations (openalex)", "citations", "citedby_count", "times_cited"]),
    (Field::SocialMediaMentions, &["social media mentions"]),
    (Field::MendeleyReaders, &["mendeley readers"]),
    (Field::AltmetricScore, &["altmetric score"]),
];

/// Header positions resolved for one file
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<Field, Vec<usize>>,
}

impl ColumnMap {
    /// Resolve the alias table against a header row.
    ///
    /// A field may map to several positions (aliases in priority order,
    /// then duplicate headers in column order).
    pub fn resolve(headers: &StringRecord) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();

        let mut positions = HashMap::new();
        for (field, aliases) in COLUMN_ALIASES {
            let mut found = Vec::new();
            for alias in aliases.iter() {
                for (i, header) in normalized.iter().enumerate() {
                    if header == alias && !found.contains(&i) {
                        found.push(i);
                    }
                }
            }
            if !found.is_empty() {
                positions.insert(*field, found);
            }
        }

        Self { positions }
    }

    /// Whether any header matched the field
    pub fn has(&self, field: Field) -> bool {
        self.positions.contains_key(&field)
    }

    /// First non-empty cell for the field
    pub fn value<'r>(&self, field: Field, row: &'r StringRecord) -> Option<&'r str> {
        self.positions
            .get(&field)?
            .iter()
            .filter_map(|&i| row.get(i))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// Convert one CSV row into a record; rows without a title are malformed
pub fn normalize_row(columns: &ColumnMap, row: &StringRecord) -> Result<PaperRecord> {
    let owned = |field| columns.value(field, row).map(str::to_string);

    let title = owned(Field::Title).ok_or_else(|| AppError::MalformedRecord {
        message: "row has no title".to_string(),
    })?;

    let year = columns.value(Field::Year, row).and_then(leading_int);
    let doi = owned(Field::Doi);
    let url = owned(Field::Url);
    let pdf = owned(Field::Pdf);

    let id_key = doi
        .clone()
        .or_else(|| url.clone())
        .or_else(|| pdf.clone())
        .unwrap_or_else(|| {
            format!("{}::{}", title, year.map(|y| y.to_string()).unwrap_or_default())
        });

    Ok(PaperRecord {
        id: stable_id(&id_key),
        title,
        doi,
        authors: owned(Field::Authors),
        year,
        concepts: split_concepts(columns.value(Field::Concepts, row)),
        abstract_text: owned(Field::Abstract),
        summary: owned(Field::Summary),
        url,
        pdf,
        venue: owned(Field::Venue),
        citations: columns.value(Field::Citations, row).and_then(leading_float),
        social_media_mentions: columns.value(Field::SocialMediaMentions, row).and_then(leading_float),
        mendeley_readers: columns.value(Field::MendeleyReaders, row).and_then(leading_float),
        altmetric_score: columns.value(Field::AltmetricScore, row).and_then(leading_float),
    })
}

/// Parse a whole paper CSV, dropping malformed rows
pub fn parse_papers(text: &str) -> Result<Vec<PaperRecord>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::resolve(&headers);
    if !columns.has(Field::Title) {
        warn!(headers = ?headers, "Paper CSV has no recognised title column");
    }

    let mut papers = Vec::new();
    let mut dropped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping unreadable CSV row");
                dropped += 1;
                continue;
            }
        };

        match normalize_row(&columns, &row) {
            Ok(paper) => papers.push(paper),
            Err(e) => {
                debug!(line = line + 2, error = %e, "Dropping paper row");
                dropped += 1;
            }
        }
    }

    info!(papers = papers.len(), dropped, "Parsed paper CSV");
    Ok(papers)
}

/// Stable paper id: 32-bit `h * 31 + unit` hash over UTF-16 units.
///
/// Matches ids already persisted in existing bookmark stores.
pub fn stable_id(key: &str) -> String {
    let mut h: i32 = 0;
    for unit in key.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    format!("p_{}", (h as i64).abs())
}

/// Split a concept cell into at most [`MAX_CONCEPTS`] tags
pub fn split_concepts(raw: Option<&str>) -> Vec<String> {
    let s = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Vec::new(),
    };

    let looks_json = (s.starts_with('[') && s.ends_with(']')) || (s.starts_with('{') && s.ends_with('}'));
    if looks_json {
        match serde_json::from_str::<serde_json::Value>(s) {
            Ok(serde_json::Value::Array(items)) => {
                return items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(text) => text.trim().to_string(),
                        other => other.to_string(),
                    })
                    .filter(|t| !t.is_empty())
                    .take(MAX_CONCEPTS)
                    .collect();
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Concept cell is not JSON, splitting instead"),
        }
    }

    const QUOTES: &[char] = &['\'', '"', '\u{201c}', '\u{2018}', '\u{201d}', '\u{2019}'];

    s.trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .split([',', ';', '|'])
        .map(|part| part.trim().trim_matches(QUOTES).trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_CONCEPTS)
        .collect()
}

/// Leading integer of a cell ("2019-05-01" -> 2019)
fn leading_int(s: &str) -> Option<i32> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Leading decimal number of a cell ("12.5 readers" -> 12.5)
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(i, c)| {
            let ok = c.is_ascii_digit()
                || (i == 0 && (c == '-' || c == '+'))
                || (c == '.' && !seen_dot);
            if c == '.' {
                seen_dot = true;
            }
            !ok
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// The loaded corpus with id and DOI lookups
#[derive(Debug, Clone, Default)]
pub struct PaperCorpus {
    papers: Vec<PaperRecord>,
    by_id: HashMap<String, usize>,
}

impl PaperCorpus {
    /// Build a corpus; later records with an already-seen id are dropped
    pub fn from_records(records: Vec<PaperRecord>) -> Self {
        let mut papers = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for record in records {
            if by_id.contains_key(&record.id) {
                debug!(id = %record.id, title = %record.title, "Duplicate paper id, keeping first");
                continue;
            }
            by_id.insert(record.id.clone(), papers.len());
            papers.push(record);
        }

        Self { papers, by_id }
    }

    /// Parse a corpus from CSV text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::from_records(parse_papers(text)?))
    }

    /// Load a corpus from a path or URL
    pub async fn load(client: &reqwest::Client, location: &str) -> Result<Self> {
        let text = load_text(client, location).await?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn papers(&self) -> &[PaperRecord] {
        &self.papers
    }

    pub fn get(&self, id: &str) -> Option<&PaperRecord> {
        self.by_id.get(id).map(|&i| &self.papers[i])
    }

    /// Normalized DOI of a paper by id
    pub fn doi_for(&self, id: &str) -> Option<String> {
        self.get(id).and_then(PaperRecord::normalized_doi)
    }

    /// Map from normalized DOI to title
    pub fn titles_by_doi(&self) -> HashMap<String, String> {
        self.papers
            .iter()
            .filter_map(|p| p.normalized_doi().map(|d| (d, p.title.clone())))
            .collect()
    }

    /// Normalized DOIs of the corpus, first occurrence order
    pub fn dois(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.papers
            .iter()
            .filter_map(PaperRecord::normalized_doi)
            .filter(|d| seen.insert(d.clone()))
            .collect()
    }

    /// Case-insensitive title substring search
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a PaperRecord> + 'a {
        let needle = query.trim().to_lowercase();
        self.papers
            .iter()
            .filter(move |p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Title,DOI,Authors,Year,Keywords,OpenAlex Concepts,Citations (OpenAlex),Mendeley Readers,Link
Microgravity and bone,https://doi.org/10.1/BONE,\"Doe, J\",2019-05-01,,\"[\"\"Bone\"\", \"\"Spaceflight\"\"]\",42,7.5,https://example.org/a
,10.1/notitle,Nobody,2020,,,,,
Plant roots in orbit,,Roe R,2021,roots; gravitropism | arabidopsis,,3,,https://example.org/b
";

    #[test]
    fn test_parse_sample() {
        let papers = parse_papers(SAMPLE).unwrap();
        assert_eq!(papers.len(), 2, "untitled row must be dropped");

        let bone = &papers[0];
        assert_eq!(bone.title, "Microgravity and bone");
        assert_eq!(bone.year, Some(2019));
        assert_eq!(bone.citations, Some(42.0));
        assert_eq!(bone.mendeley_readers, Some(7.5));
        assert_eq!(bone.concepts, vec!["Bone", "Spaceflight"]);
        assert_eq!(bone.normalized_doi().as_deref(), Some("10.1/bone"));

        let roots = &papers[1];
        assert_eq!(roots.concepts, vec!["roots", "gravitropism", "arabidopsis"]);
        assert!(roots.doi.is_none());
        assert_eq!(roots.url.as_deref(), Some("https://example.org/b"));
    }

    #[test]
    fn test_duplicate_headers_resolved_positionally() {
        let text = "title,doi,title\n,10.1/a,Second Title\nFirst,10.1/b,Other\n";
        let papers = parse_papers(text).unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "Second Title");
        assert_eq!(papers[1].title, "First");
    }

    #[test]
    fn test_stable_id_matches_known_values() {
        assert_eq!(stable_id(""), "p_0");
        assert_eq!(stable_id("a"), "p_97");
        assert_eq!(stable_id("ab"), "p_3105");
        // Deterministic across calls
        assert_eq!(stable_id("10.1/x"), stable_id("10.1/x"));
    }

    #[test]
    fn test_id_falls_back_to_title_and_year() {
        let text = "title,year\nLonely Paper,2001\n";
        let papers = parse_papers(text).unwrap();
        assert_eq!(papers[0].id, stable_id("Lonely Paper::2001"));
    }

    #[test]
    fn test_concepts_capped() {
        let raw = (0..15).map(|i| format!("c{}", i)).collect::<Vec<_>>().join(",");
        assert_eq!(split_concepts(Some(&raw)).len(), MAX_CONCEPTS);
        assert!(split_concepts(Some("   ")).is_empty());
        assert_eq!(split_concepts(Some("('a', \"b\")")), vec!["a", "b"]);
    }

    #[test]
    fn test_leading_numbers() {
        assert_eq!(leading_int("2019-05-01"), Some(2019));
        assert_eq!(leading_int("n/a"), None);
        assert_eq!(leading_float("12.5 readers"), Some(12.5));
        assert_eq!(leading_float("1.2.3"), Some(1.2));
    }

    #[test]
    fn test_corpus_lookups() {
        let corpus = PaperCorpus::parse(SAMPLE).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.dois(), vec!["10.1/bone".to_string()]);

        let bone_id = corpus.papers()[0].id.clone();
        assert_eq!(corpus.doi_for(&bone_id).as_deref(), Some("10.1/bone"));
        assert_eq!(
            corpus.titles_by_doi().get("10.1/bone").map(String::as_str),
            Some("Microgravity and bone")
        );
        assert_eq!(corpus.search("ROOTS").count(), 1);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let text = "title,doi\nA,10.1/same\nB,10.1/same\n";
        let corpus = PaperCorpus::parse(text).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.papers()[0].title, "A");
    }

    #[tokio::test]
    async fn test_load_keeps_rows_around_invalid_utf8() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"title,doi\nGood paper,10.1/a\nCaf\xe9 paper,10.1/b\n").unwrap();

        let client = reqwest::Client::new();
        let corpus = PaperCorpus::load(&client, file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.papers()[0].title, "Good paper");
        assert_eq!(corpus.papers()[1].title, "Caf\u{FFFD} paper");
        assert_eq!(corpus.dois(), vec!["10.1/a".to_string(), "10.1/b".to_string()]);
    }
}
