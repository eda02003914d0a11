//! Document identifiers derived from user-supplied filenames.
//!
//! The identifier is used directly as a directory name under the index root,
//! so it must never contain a separator or be `.`/`..`. Different inputs may
//! collapse to the same identifier (`a/x.pdf` and `b/x.pdf`); the later
//! upload replaces the earlier one.

pub const DEFAULT_DOC_ID: &str = "doc";

pub fn sanitize(raw: &str) -> String {
    let base = raw.rsplit('/').next().unwrap_or(raw);
    let flat: String = base
        .chars()
        .map(|c| if c == '\\' || c == '\0' { '_' } else { c })
        .collect();
    match flat.as_str() {
        "" | "." | ".." => DEFAULT_DOC_ID.to_string(),
        _ => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn strips_directories() {
        assert_eq!(sanitize("reports/2024/q1.pdf"), "q1.pdf");
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
    }

    #[test]
    fn replaces_backslashes_and_nul() {
        assert_eq!(sanitize(r"C:\Users\me\file.pdf"), "C:_Users_me_file.pdf");
        assert_eq!(sanitize("a\0b.pdf"), "a_b.pdf");
    }

    #[test]
    fn placeholder_for_empty_and_dot_names() {
        for raw in ["", "/", "dir/", ".", "..", "a/..", "a/."] {
            assert_eq!(sanitize(raw), DEFAULT_DOC_ID, "input {raw:?}");
        }
    }

    #[test]
    fn idempotent_and_flat() {
        let inputs = [
            "report.pdf", "../../etc/passwd", r"..\..\windows\system32", "", ".", "..",
            "a/b/c/", "  spaced name.PDF", "ünïcödé/文書.pdf", "x\0y", "...", "./.hidden.pdf",
        ];
        let root = Path::new("/srv/indexes");
        for raw in inputs {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once, "input {raw:?}");
            assert!(!once.is_empty());
            assert!(!once.contains('/') && !once.contains('\\'));
            assert_eq!(root.join(&once).parent(), Some(root), "input {raw:?} escapes root");
        }
    }
}
