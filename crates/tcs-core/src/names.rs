//! File-name helpers for fragment files.

use std::path::Path;

/// Basename of `path` with every extension removed (`a.b.json` -> `a`).
///
/// A leading dot is kept, so `.hidden.json` strips to `.hidden`.
pub fn stripped_name(path: impl AsRef<Path>) -> String {
    let base = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_extensions(&base)
}

fn strip_extensions(name: &str) -> String {
    match name.strip_prefix('.') {
        Some(rest) => format!(".{}", strip_extensions(rest)),
        None => name.split('.').next().unwrap_or_default().to_string(),
    }
}

/// Returns true if the file name of `path` ends in `.<ext>`.
pub fn has_ext(path: impl AsRef<Path>, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    path.as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().ends_with(&format!(".{ext}")))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_all_extensions() {
        assert_eq!(stripped_name("schema/1.0.1/statement.json"), "statement");
        assert_eq!(stripped_name("a.b.c.json"), "a");
        assert_eq!(stripped_name("noext"), "noext");
    }

    #[test]
    fn keeps_leading_dot() {
        assert_eq!(stripped_name("dir/.hidden.json"), ".hidden");
    }

    #[test]
    fn extension_check() {
        assert!(has_ext("x/agent.json", "json"));
        assert!(has_ext("x/agent.json", ".json"));
        assert!(!has_ext("x/agent.json.bak", "json"));
        assert!(!has_ext("x/json", "json"));
    }

    proptest! {
        #[test]
        fn stripped_name_never_contains_an_inner_dot(stem in "[a-z][a-z0-9_]{0,12}", ext in "(\\.[a-z]{1,4}){0,3}") {
            let name = stripped_name(format!("dir/{stem}{ext}"));
            prop_assert_eq!(name, stem);
        }
    }
}
