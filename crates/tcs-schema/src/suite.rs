//! # Fixture Suite
//!
//! Data-driven conformance checks for a [`SchemaCatalog`]. The data
//! directory holds one sub-directory per type id, each containing fixture
//! files named `<num>-<good|bad>[-<info>].json`:
//!
//! ```text
//! data/
//!     statement/
//!         001-good.json
//!         002-bad-missing-verb.json
//!     agent/
//!         001-good-mbox.json
//! ```
//!
//! A `good` fixture passes when it validates as its directory's type id; a
//! `bad` fixture passes when it fails to.

use std::fmt;
use std::path::{Path, PathBuf};

use tcs_core::{stripped_name, SchemaError, ValidationError};

use crate::catalog::SchemaCatalog;
use crate::compose::list_json_files;

/// What a fixture is expected to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Must validate.
    Good,
    /// Must fail validation.
    Bad,
    /// The file name names neither.
    Unknown(String),
}

/// What a fixture's path says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureInfo {
    /// The fixture file.
    pub path: PathBuf,
    /// Type id, taken from the parent directory name.
    pub type_id: String,
    /// Leading number of the file name.
    pub num: String,
    /// Expected outcome.
    pub expected: Expectation,
    /// Free-form description after the expectation, if any.
    pub short_info: Option<String>,
}

impl FixtureInfo {
    /// Parse `<dir>/<type id>/<num>-<good|bad>[-<info>].json`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let type_id = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = stripped_name(path);
        let mut parts = stem.splitn(3, '-');
        let num = parts.next().unwrap_or_default().to_string();
        let expected = match parts.next().unwrap_or_default() {
            "good" => Expectation::Good,
            "bad" => Expectation::Bad,
            other => Expectation::Unknown(other.to_string()),
        };
        let short_info = parts.next().map(str::to_string);
        Self {
            path: path.to_path_buf(),
            type_id,
            num,
            expected,
            short_info,
        }
    }
}

/// Result of checking one fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureOutcome {
    /// Behaved as expected. `bad` fixtures keep the failure they produced.
    Passed {
        /// The failure a `bad` fixture produced.
        expected_error: Option<ValidationError>,
    },
    /// Did not behave as expected.
    Failed(ValidationError),
}

/// One checked fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureResult {
    /// The fixture.
    pub info: FixtureInfo,
    /// How it went.
    pub outcome: FixtureOutcome,
}

impl FixtureResult {
    /// Returns true if the fixture behaved as expected.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, FixtureOutcome::Passed { .. })
    }
}

/// Results for one type id directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    /// Type id the fixtures were checked against.
    pub type_id: String,
    /// Per-fixture results, in file-name order.
    pub results: Vec<FixtureResult>,
}

impl CategoryReport {
    /// Number of fixtures.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of fixtures that behaved as expected.
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Number of fixtures that did not.
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }
}

impl fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<40}{}/{} passed",
            format!("{}:", self.type_id),
            self.passed(),
            self.total()
        )
    }
}

/// Results for a whole data directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    /// One entry per category, in directory-name order.
    pub categories: Vec<CategoryReport>,
}

impl SuiteReport {
    /// Returns true if every fixture behaved as expected.
    pub fn all_passed(&self) -> bool {
        self.categories.iter().all(|c| c.failed() == 0)
    }

    /// Total number of fixtures.
    pub fn total_tests(&self) -> usize {
        self.categories.iter().map(CategoryReport::total).sum()
    }

    /// Number of fixtures that did not behave as expected.
    pub fn failed_tests(&self) -> usize {
        self.categories.iter().map(CategoryReport::failed).sum()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let passed_categories = self.categories.iter().filter(|c| c.failed() == 0).count();
        if self.all_passed() {
            format!(
                "SUMMARY: All {} tests in {} test categories passed!",
                self.total_tests(),
                passed_categories
            )
        } else {
            format!(
                "SUMMARY: {}/{} test categories passed, with {} tests failing out of {}",
                passed_categories,
                self.categories.len(),
                self.failed_tests(),
                self.total_tests()
            )
        }
    }
}

/// Check a single fixture file.
pub async fn run_fixture(catalog: &SchemaCatalog, path: impl AsRef<Path>) -> FixtureResult {
    let info = FixtureInfo::from_path(path);
    let result = catalog.validate_json_file(&info.path, &info.type_id).await;
    let outcome = match (&info.expected, result) {
        (Expectation::Good, Ok(())) => FixtureOutcome::Passed {
            expected_error: None,
        },
        (Expectation::Good, Err(e)) => FixtureOutcome::Failed(e.to_report()),
        (Expectation::Bad, Err(e)) => FixtureOutcome::Passed {
            expected_error: Some(e.to_report()),
        },
        (Expectation::Bad, Ok(())) => FixtureOutcome::Failed(ValidationError::new("Unexpected success!")),
        (Expectation::Unknown(found), _) => FixtureOutcome::Failed(ValidationError::new(format!(
            "Unexpected expectation '{found}' (should be 'good' or 'bad')"
        ))),
    };
    if !matches!(outcome, FixtureOutcome::Passed { .. }) {
        tracing::debug!(path = %info.path.display(), "fixture failed");
    }
    FixtureResult { info, outcome }
}

/// Check every fixture in one type id directory.
pub async fn run_category(catalog: &SchemaCatalog, dir: impl AsRef<Path>) -> Result<CategoryReport, SchemaError> {
    let dir = dir.as_ref();
    let type_id = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut results = Vec::new();
    for path in list_json_files(dir).await? {
        results.push(run_fixture(catalog, path).await);
    }
    Ok(CategoryReport { type_id, results })
}

/// Sub-directories of `dir`, sorted by name.
async fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SchemaError::io(dir, e))?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SchemaError::io(dir, e))?
    {
        let path = entry.path();
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Check the categories named by `ids` under `data_dir`, or every
/// category when `ids` is empty.
pub async fn run_suite(catalog: &SchemaCatalog, data_dir: impl AsRef<Path>, ids: &[String]) -> Result<SuiteReport, SchemaError> {
    let data_dir = data_dir.as_ref();
    let dirs = if ids.is_empty() {
        list_dirs(data_dir).await?
    } else {
        ids.iter().map(|id| data_dir.join(id)).collect()
    };

    let mut categories = Vec::with_capacity(dirs.len());
    for dir in dirs {
        categories.push(run_category(catalog, &dir).await?);
    }
    Ok(SuiteReport { categories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SchemaSettings;

    #[test]
    fn fixture_names_are_parsed() {
        let info = FixtureInfo::from_path("data/statement/002-bad-missing-verb.json");
        assert_eq!(info.type_id, "statement");
        assert_eq!(info.num, "002");
        assert_eq!(info.expected, Expectation::Bad);
        assert_eq!(info.short_info.as_deref(), Some("missing-verb"));

        let info = FixtureInfo::from_path("data/agent/1-good.json");
        assert_eq!(info.expected, Expectation::Good);
        assert_eq!(info.short_info, None);

        let info = FixtureInfo::from_path("data/agent/1-maybe.json");
        assert_eq!(info.expected, Expectation::Unknown("maybe".into()));
    }

    fn category(id: &str, outcomes: &[bool]) -> CategoryReport {
        CategoryReport {
            type_id: id.to_string(),
            results: outcomes
                .iter()
                .map(|ok| FixtureResult {
                    info: FixtureInfo::from_path(format!("data/{id}/1-good.json")),
                    outcome: if *ok {
                        FixtureOutcome::Passed {
                            expected_error: None,
                        }
                    } else {
                        FixtureOutcome::Failed(ValidationError::new("nope"))
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn summaries() {
        let all_good = SuiteReport {
            categories: vec![category("agent", &[true, true]), category("verb", &[true])],
        };
        assert!(all_good.all_passed());
        assert_eq!(all_good.summary(), "SUMMARY: All 3 tests in 2 test categories passed!");

        let mixed = SuiteReport {
            categories: vec![category("agent", &[true, false]), category("verb", &[true])],
        };
        assert!(!mixed.all_passed());
        assert_eq!(
            mixed.summary(),
            "SUMMARY: 1/2 test categories passed, with 1 tests failing out of 3"
        );
    }

    #[test]
    fn category_line_is_padded() {
        let line = category("agent", &[true, false]).to_string();
        assert!(line.starts_with("agent:"));
        assert!(line.ends_with("1/2 passed"));
        assert_eq!(line.find("1/2"), Some(40));
    }

    #[tokio::test]
    async fn runs_fixtures_against_their_directories() {
        let root = tempfile::tempdir().unwrap();
        let schema_dir = root.path().join("1.0.1");
        std::fs::create_dir(&schema_dir).unwrap();
        std::fs::write(
            schema_dir.join("verb.json"),
            r##"{"id": "#verb", "type": "object", "required": ["id"]}"##,
        )
        .unwrap();
        let catalog = SchemaCatalog::load(SchemaSettings::new(&schema_dir)).await.unwrap();

        let data = root.path().join("data");
        std::fs::create_dir_all(data.join("verb")).unwrap();
        std::fs::write(data.join("verb/001-good.json"), r#"{"id": "x"}"#).unwrap();
        std::fs::write(data.join("verb/002-bad-no-id.json"), r#"{}"#).unwrap();
        std::fs::write(data.join("verb/003-bad-wrongly.json"), r#"{"id": 1}"#).unwrap();
        std::fs::write(data.join("verb/004-good-surprise.json"), r#"[]"#).unwrap();

        let report = run_suite(&catalog, &data, &[]).await.unwrap();
        assert_eq!(report.categories.len(), 1);
        let verb = &report.categories[0];
        assert_eq!(verb.type_id, "verb");
        assert_eq!(verb.total(), 4);
        assert_eq!(verb.passed(), 2);
        assert!(!verb.results[3].passed());
        assert!(!report.all_passed());

        let only = run_suite(&catalog, &data, &["verb".to_string()]).await.unwrap();
        assert_eq!(only.total_tests(), 4);
    }
}
