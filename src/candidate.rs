//! Projection of provider records into display-ready candidates.
//!
//! Candidates carry the three fields shown to the user during listing and
//! disambiguation: display name, instance identifier, and private IP. The
//! display name is the URL-escaped `Name` tag value, or `[None]` when the
//! instance carries no such tag. Projection is also where data-integrity
//! holes in the provider response surface: a record without an identifier or
//! private address is an error, never silently skipped.

use thiserror::Error;

use crate::inventory::InstanceRecord;

/// Placeholder display name for instances without a `Name` tag.
pub const UNNAMED: &str = "[None]";

/// Inter-column padding for the tabular output.
const COLUMN_GAP: usize = 4;

/// Normalized projection of one instance record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// URL-escaped `Name` tag value, or [`UNNAMED`].
    pub display_name: String,
    /// Provider instance identifier.
    pub id: String,
    /// Primary private IPv4 address.
    pub private_ip: String,
}

/// Data-integrity errors raised while projecting provider records.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProjectError {
    /// Raised when a record has no instance identifier.
    #[error("inventory returned a record without an instance id")]
    MissingInstanceId,
    /// Raised when a record has no private IP address.
    #[error("instance {instance_id} has no private IP address")]
    MissingPrivateIp {
        /// Identifier of the offending record.
        instance_id: String,
    },
}

/// Escapes a tag value for single-line display, query-string style: spaces
/// become `+` and reserved characters are percent-encoded.
fn query_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Projects `records` into candidates sorted ascending by display name.
///
/// The sort is stable, so records sharing a display name keep the order the
/// provider returned them in.
///
/// # Errors
///
/// Returns [`ProjectError`] when a record lacks an identifier or a private
/// IP address.
pub fn project(records: &[InstanceRecord]) -> Result<Vec<Candidate>, ProjectError> {
    let mut candidates = Vec::with_capacity(records.len());
    for record in records {
        let id = record
            .id
            .clone()
            .ok_or(ProjectError::MissingInstanceId)?;
        let private_ip =
            record
                .private_ip
                .clone()
                .ok_or_else(|| ProjectError::MissingPrivateIp {
                    instance_id: id.clone(),
                })?;
        let display_name = record
            .name_tag()
            .map_or_else(|| UNNAMED.to_owned(), query_escape);
        candidates.push(Candidate {
            display_name,
            id,
            private_ip,
        });
    }
    candidates.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(candidates)
}

/// Renders rows into gap-padded columns, each column as wide as its widest
/// cell.
fn render_columns(rows: &[Vec<String>]) -> String {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; column_count];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in rows {
        let last = row.len().saturating_sub(1);
        for (position, (width, cell)) in widths.iter().zip(row).enumerate() {
            if position == last {
                out.push_str(cell);
            } else {
                let padded = width + COLUMN_GAP;
                out.push_str(&format!("{cell:<padded$}"));
            }
        }
        out.push('\n');
    }
    out
}

/// Formats the candidate list as a `Name / Instance ID / Private IP` table,
/// used by list mode.
#[must_use]
pub fn render_table(candidates: &[Candidate]) -> String {
    let mut rows = vec![
        vec!["Name".to_owned(), "Instance ID".to_owned(), "Private IP".to_owned()],
        vec!["----".to_owned(), "-----------".to_owned(), "----------".to_owned()],
    ];
    rows.extend(candidates.iter().map(|candidate| {
        vec![
            candidate.display_name.clone(),
            candidate.id.clone(),
            candidate.private_ip.clone(),
        ]
    }));
    render_columns(&rows)
}

/// Formats the candidate list as a 1-based numbered table, used by the
/// disambiguation prompt.
#[must_use]
pub fn render_numbered_table(candidates: &[Candidate]) -> String {
    let mut rows = vec![
        vec![
            "n".to_owned(),
            "Name".to_owned(),
            "Instance ID".to_owned(),
            "Private IP".to_owned(),
        ],
        vec![
            "-".to_owned(),
            "----".to_owned(),
            "-----------".to_owned(),
            "----------".to_owned(),
        ],
    ];
    rows.extend(candidates.iter().enumerate().map(|(index, candidate)| {
        vec![
            (index + 1).to_string(),
            candidate.display_name.clone(),
            candidate.id.clone(),
            candidate.private_ip.clone(),
        ]
    }));
    render_columns(&rows)
}
