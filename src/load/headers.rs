// src/load/headers.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{ImportError, Result};

/// What to do with empty or repeated header cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPolicy {
    /// Rename them: an empty header at index `i` becomes `Unnamed: i`, a second
    /// `a` becomes `a.1`, a third `a.2`, and so on.
    #[default]
    Mangle,
    /// Refuse the file.
    Strict,
}

/// Turn the raw header row of `path` into the final column names.
///
/// Names that differ only in ASCII case are always rejected: SQLite would
/// treat them as the same column.
pub fn normalize_headers(path: &Path, raw: &[String], policy: HeaderPolicy) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(raw.len());
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());

    for (index, cell) in raw.iter().enumerate() {
        // a UTF-8 BOM survives the CSV reader on the very first cell
        let cell = if index == 0 {
            cell.trim_start_matches('\u{feff}')
        } else {
            cell.as_str()
        };

        let base = if cell.is_empty() {
            match policy {
                HeaderPolicy::Strict => {
                    return Err(ImportError::EmptyHeader {
                        path: path.to_path_buf(),
                        index,
                    })
                }
                HeaderPolicy::Mangle => format!("Unnamed: {}", index),
            }
        } else {
            cell.to_string()
        };

        let name = if taken.contains(&base) {
            match policy {
                HeaderPolicy::Strict => {
                    return Err(ImportError::DuplicateHeader {
                        path: path.to_path_buf(),
                        name: base,
                    })
                }
                HeaderPolicy::Mangle => {
                    let mut n = 1;
                    let mut candidate = format!("{}.{}", base, n);
                    while taken.contains(&candidate) {
                        n += 1;
                        candidate = format!("{}.{}", base, n);
                    }
                    debug!("renamed duplicate header `{}` to `{}`", base, candidate);
                    candidate
                }
            }
        } else {
            base
        };

        taken.insert(name.clone());
        names.push(name);
    }

    let mut folded = HashSet::with_capacity(names.len());
    for name in &names {
        if !folded.insert(name.to_ascii_lowercase()) {
            return Err(ImportError::DuplicateHeader {
                path: path.to_path_buf(),
                name: name.clone(),
            });
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn raw(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_headers_pass_through() {
        let names = normalize_headers(
            Path::new("Teams.csv"),
            &raw(&["yearID", "teamID", "W", "L"]),
            HeaderPolicy::Mangle,
        )
        .unwrap();
        assert_eq!(names, vec!["yearID", "teamID", "W", "L"]);
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let names = normalize_headers(
            Path::new("Teams.csv"),
            &raw(&["\u{feff}yearID", "teamID"]),
            HeaderPolicy::Strict,
        )
        .unwrap();
        assert_eq!(names[0], "yearID");
    }

    #[test]
    fn mangle_renames_duplicates_and_blanks() {
        let names = normalize_headers(
            Path::new("x.csv"),
            &raw(&["a", "a", "", "a.1", "a"]),
            HeaderPolicy::Mangle,
        )
        .unwrap();
        assert_eq!(names, vec!["a", "a.1", "Unnamed: 2", "a.1.1", "a.2"]);
    }

    #[test]
    fn strict_rejects_blank_header() {
        let err = normalize_headers(Path::new("x.csv"), &raw(&["a", ""]), HeaderPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptyHeader { index: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn strict_rejects_duplicate_header() {
        let err = normalize_headers(Path::new("x.csv"), &raw(&["a", "a"]), HeaderPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, ImportError::DuplicateHeader { .. }));
    }

    #[test]
    fn case_only_difference_is_rejected_under_both_policies() {
        for policy in [HeaderPolicy::Mangle, HeaderPolicy::Strict] {
            let err = normalize_headers(Path::new("x.csv"), &raw(&["Name", "name"]), policy)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Schema);
        }
    }
}
