//! Sources to analyze: a single locator or a CSV camera list.
//!
//! The list format is a header line naming the columns followed by one row
//! per camera:
//!
//! ```text
//! name,uri,apart
//! hall,rtsp://10.0.0.5/stream,apt-12
//! ```
//!
//! Column order comes from the header and extra columns are ignored. Blank
//! lines and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;

use crate::error::{DesyncError, Result};

/// One camera or media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub name: String,
    /// Locator handed to the prober (path or stream URL).
    pub uri: String,
    /// Apartment or group label; empty when unknown.
    pub group: String,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            group: group.into(),
        }
    }

    /// A lone locator given on the command line.
    pub fn single(locator: &str) -> Self {
        Self::new(locator, locator, "")
    }
}

/// Splits one row on commas outside double quotes. `""` inside a quoted
/// field is a literal quote.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    fields
        .into_iter()
        .map(|field| field.trim().to_string())
        .collect()
}

struct Columns {
    name: Option<usize>,
    uri: usize,
    group: Option<usize>,
}

impl Columns {
    fn from_header(line_number: usize, header: &str) -> Result<Self> {
        let fields = split_row(header);
        let position = |wanted: &str| {
            fields
                .iter()
                .position(|field| field.eq_ignore_ascii_case(wanted))
        };

        let uri = position("uri").ok_or_else(|| DesyncError::SourceList {
            line: line_number,
            message: format!("header has no 'uri' column: {header}"),
        })?;

        Ok(Self {
            name: position("name"),
            uri,
            group: position("apart"),
        })
    }
}

/// Parses the contents of a camera list.
///
/// A missing or unusable header is an error. Rows without a uri are
/// reported and skipped.
pub fn parse_source_list(content: &str) -> Result<Vec<Source>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (header_line, header) = lines.next().ok_or_else(|| DesyncError::SourceList {
        line: 0,
        message: "source list is empty".to_string(),
    })?;
    let columns = Columns::from_header(header_line, header)?;

    let mut sources = Vec::new();
    for (line_number, line) in lines {
        let fields = split_row(line);
        let field = |index: Option<usize>| {
            index
                .and_then(|i| fields.get(i))
                .cloned()
                .unwrap_or_default()
        };

        let uri = field(Some(columns.uri));
        if uri.is_empty() {
            warn!("Skipping source list line {}: missing uri", line_number);
            continue;
        }

        let mut name = field(columns.name);
        if name.is_empty() {
            name = uri.clone();
        }

        sources.push(Source::new(name, uri, field(columns.group)));
    }

    debug!("Parsed {} sources from list", sources.len());
    Ok(sources)
}

/// Reads and parses a camera list file.
pub fn load_source_list(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)?;
    parse_source_list(&content)
}
