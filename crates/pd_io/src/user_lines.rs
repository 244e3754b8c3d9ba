//! Line-oriented user definitions.
//!
//! One user per line: `ID` optionally followed by `:dep1,dep2,...`. A line
//! with more than one `:` is malformed.
//! Blank lines and lines starting with `#` are skipped; every token is trimmed.
//! A single malformed line rejects the whole batch.

use std::path::Path;

use pd_core::{Partition, User, UserId};

use crate::{read_file, IoError, IoResult};

/// One parsed definition, not yet bound to a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLine {
    pub id: UserId,
    pub deps: Vec<UserId>,
}

impl UserLine {
    pub fn into_user(self, partition: Partition) -> User {
        User {
            id: self.id,
            partition,
            deps: self.deps,
            weight: 0.0,
        }
    }
}

/// Parse one line. `line_no` is 1-based and only used for error messages.
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_user_line(line: &str, line_no: usize) -> IoResult<Option<UserLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (id, deps) = match line.split_once(':') {
        Some((id, deps)) => (id.trim(), Some(deps)),
        None => (line, None),
    };
    if id.is_empty() {
        return Err(IoError::Line {
            line: line_no,
            msg: "empty user id".into(),
        });
    }
    if deps.is_some_and(|d| d.contains(':')) {
        return Err(IoError::Line {
            line: line_no,
            msg: format!("more than one `:` after user {id}"),
        });
    }

    let mut parsed = Vec::new();
    if let Some(deps) = deps {
        for (i, tok) in deps.split(',').enumerate() {
            let tok = tok.trim();
            if tok.is_empty() {
                return Err(IoError::Line {
                    line: line_no,
                    msg: format!("empty dependency #{} for user {id}", i + 1),
                });
            }
            parsed.push(UserId::from(tok));
        }
    }

    Ok(Some(UserLine {
        id: UserId::from(id),
        deps: parsed,
    }))
}

/// Parse a whole document, binding every user to `partition`.
pub fn parse_user_lines(text: &str, partition: &Partition) -> IoResult<Vec<User>> {
    let mut users = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(parsed) = parse_user_line(line, idx + 1)? {
            users.push(parsed.into_user(partition.clone()));
        }
    }
    tracing::debug!(partition = %partition, users = users.len(), "parsed user lines");
    Ok(users)
}

/// Read and parse a user file. The file must be UTF-8.
pub fn load_user_lines(path: &Path, partition: impl Into<Partition>) -> IoResult<Vec<User>> {
    let bytes = read_file(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| IoError::Invalid(format!("{} is not UTF-8: {e}", path.display())))?;
    parse_user_lines(&text, &partition.into())
}
