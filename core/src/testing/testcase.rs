use std::path::{Path, PathBuf};

use lazy_regex::{lazy_regex, Lazy, Regex};

use crate::error::JudgeError;

static RE_CASE_ID: Lazy<Regex> = lazy_regex!(r"[0-9]+");

/// One (input file, expected-output file) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    name: String,
    id: String,
    input_path: PathBuf,
    expected_path: PathBuf,
}

impl TestCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Digits as they appear in the file name, leading zeros kept.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn expected_path(&self) -> &Path {
        &self.expected_path
    }
}

/// Maps input files to their expected-output artifact by the numeric id
/// embedded in the input file name.
#[derive(Debug, Clone)]
pub struct CaseMatcher {
    output_dir: PathBuf,
    template: String,
}

impl CaseMatcher {
    pub const ID_PLACEHOLDER: &'static str = "{id}";
    pub const DEFAULT_TEMPLATE: &'static str = "cost{id}.txt";

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            template: Self::DEFAULT_TEMPLATE.to_owned(),
        }
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// First maximal run of ASCII digits in `filename`. Later runs are ignored.
    /// ```
    /// use batchjudge_core::testing::CaseMatcher;
    ///
    /// assert_eq!(CaseMatcher::extract_id("case3.txt"), Some("3"));
    /// assert_eq!(CaseMatcher::extract_id("in_007_v2"), Some("007"));
    /// assert_eq!(CaseMatcher::extract_id("sample.txt"), None);
    /// ```
    pub fn extract_id(filename: &str) -> Option<&str> {
        RE_CASE_ID.find(filename).map(|m| m.as_str())
    }

    pub fn expected_filename(&self, id: &str) -> String {
        self.template.replace(Self::ID_PLACEHOLDER, id)
    }

    /// Does not check that the expected file exists; staging does.
    pub fn resolve(&self, input_path: impl AsRef<Path>) -> Result<TestCase, JudgeError> {
        let input_path = input_path.as_ref();
        let name = input_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = Self::extract_id(&name)
            .ok_or_else(|| JudgeError::MalformedCaseName(name.clone()))?
            .to_owned();
        let expected_path = self.output_dir.join(self.expected_filename(&id));
        Ok(TestCase {
            name,
            id,
            input_path: input_path.to_owned(),
            expected_path,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_resolve_expected_path_from_id() {
        let m = CaseMatcher::new("/data/out");
        let t = m.resolve("/data/in/case3.txt").unwrap();
        assert_eq!(t.name(), "case3.txt");
        assert_eq!(t.id(), "3");
        assert_eq!(t.input_path(), Path::new("/data/in/case3.txt"));
        assert_eq!(t.expected_path(), Path::new("/data/out/cost3.txt"));
    }

    #[test]
    fn resolution_is_reproducible() {
        let m = CaseMatcher::new("out");
        assert_eq!(m.resolve("in/x42.in").unwrap(), m.resolve("in/x42.in").unwrap());
    }

    #[test]
    fn only_first_digit_run_is_used() {
        let m = CaseMatcher::new("out");
        let t = m.resolve("in/t12_part3.txt").unwrap();
        assert_eq!(t.id(), "12");
        assert_eq!(t.expected_path(), Path::new("out/cost12.txt"));
    }

    #[test]
    fn custom_template_should_be_applied() {
        let m = CaseMatcher::new("out").template("answer-{id}.out");
        let t = m.resolve("in/input05").unwrap();
        assert_eq!(t.expected_path(), Path::new("out/answer-05.out"));
    }

    #[test]
    fn name_without_digits_is_malformed() {
        let m = CaseMatcher::new("out");
        let err = m.resolve("in/readme.txt").unwrap_err();
        assert!(
            matches!(err, JudgeError::MalformedCaseName(ref name) if name == "readme.txt"),
            "{:?}",
            err
        );
    }
}
