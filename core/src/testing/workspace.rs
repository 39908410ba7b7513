use std::path::{Path, PathBuf};

use super::testcase::TestCase;
use crate::error::JudgeError;

/// The single reusable scratch directory every case runs in.
///
/// The staged executable lives for the whole session; the per-case files are
/// removed after every case by the [`StagedCase`] guard.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    output_file_name: String,
}

impl Workspace {
    pub const DEFAULT_DIR: &'static str = "./temp";
    pub const EXECUTABLE_NAME: &'static str = "test";
    pub const INPUT_FILE_NAME: &'static str = "input.txt";
    pub const EXPECTED_FILE_NAME: &'static str = "cost.txt";
    pub const DEFAULT_OUTPUT_FILE_NAME: &'static str = "output.txt";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            output_file_name: Self::DEFAULT_OUTPUT_FILE_NAME.to_owned(),
        }
    }

    /// Name of the file the subject program writes its answer to.
    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.output_file_name = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn executable_path(&self) -> PathBuf {
        self.dir.join(Self::EXECUTABLE_NAME)
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(Self::INPUT_FILE_NAME)
    }

    pub fn expected_path(&self) -> PathBuf {
        self.dir.join(Self::EXPECTED_FILE_NAME)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(&self.output_file_name)
    }

    fn case_file_paths(&self) -> [PathBuf; 3] {
        [self.input_path(), self.expected_path(), self.output_path()]
    }

    /// Deletes and recreates the scratch dir, then pins it to an absolute path
    /// so the child can be spawned by absolute path.
    pub fn reset(&mut self) -> Result<(), JudgeError> {
        fsutil::recreate_dir(&self.dir)?;
        self.dir = fsutil::canonicalize_path(&self.dir)?;
        log::debug!("Scratch dir ready: {:?}", self.dir);
        Ok(())
    }

    pub fn stage_executable(&self, program: impl AsRef<Path>) -> Result<PathBuf, JudgeError> {
        let dest = self.executable_path();
        fsutil::copy_file(&program, &dest)?;
        log::debug!("Staged {:?} as {:?}", program.as_ref(), dest);
        Ok(dest)
    }

    /// Copies the case's input and expected files under their fixed names.
    ///
    /// The returned guard removes the per-case files when dropped, including
    /// when staging itself fails halfway.
    pub fn stage_case(&self, case: &TestCase) -> Result<StagedCase<'_>, JudgeError> {
        let residue = self.residual_case_files();
        if !residue.is_empty() {
            log::warn!("Removing leftover case files before staging: {:?}", residue);
            self.cleanup_case()?;
        }

        let staged = StagedCase { workspace: self };
        fsutil::copy_file(case.input_path(), self.input_path())?;
        fsutil::copy_file(case.expected_path(), self.expected_path())?;
        log::debug!("Staged case {}", case.name());
        Ok(staged)
    }

    /// Removes the per-case files. Files that are already gone are fine.
    pub fn cleanup_case(&self) -> fsutil::Result<()> {
        for path in self.case_file_paths() {
            if fsutil::remove_file_if_exists(&path)? {
                log::debug!("Removed {:?}", path);
            }
        }
        Ok(())
    }

    /// Per-case files currently present in the scratch dir.
    pub fn residual_case_files(&self) -> Vec<PathBuf> {
        self.case_file_paths()
            .into_iter()
            .filter(|p| p.exists())
            .collect()
    }
}

/// A case's files staged in the scratch dir. Dropping it cleans them up.
#[derive(Debug)]
pub struct StagedCase<'w> {
    workspace: &'w Workspace,
}

impl StagedCase<'_> {
    /// Cleans up now and reports failure instead of only logging it.
    pub fn finish(self) -> fsutil::Result<()> {
        let res = self.workspace.cleanup_case();
        std::mem::forget(self);
        res
    }
}

impl Drop for StagedCase<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.workspace.cleanup_case() {
            log::warn!("Failed to clean up scratch dir: {:#}", e);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::CaseMatcher;

    struct Fixture {
        _tmp: tempfile::TempDir,
        ws: Workspace,
        input_dir: PathBuf,
        output_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let input_dir = tmp.path().join("in");
        let output_dir = tmp.path().join("out");
        fsutil::mkdir_all(&input_dir).unwrap();
        fsutil::mkdir_all(&output_dir).unwrap();
        let mut ws = Workspace::new(tmp.path().join("temp"));
        ws.reset().unwrap();
        Fixture {
            ws,
            input_dir,
            output_dir,
            _tmp: tmp,
        }
    }

    #[test]
    fn reset_should_wipe_previous_session() {
        let mut f = fixture();
        fsutil::write(f.ws.dir().join("junk"), "x").unwrap();
        fsutil::write(f.ws.executable_path(), "x").unwrap();

        f.ws.reset().unwrap();
        assert!(f.ws.dir().is_absolute());
        assert_eq!(fsutil::read_dir(f.ws.dir()).unwrap().count(), 0);
    }

    #[test]
    fn staged_case_is_cleaned_up_but_executable_persists() {
        let f = fixture();
        let program = f.input_dir.join("prog");
        fsutil::write(&program, "#!/bin/sh\n").unwrap();
        fsutil::write(f.input_dir.join("case1.txt"), "1\n").unwrap();
        fsutil::write(f.output_dir.join("cost1.txt"), "2\n").unwrap();

        f.ws.stage_executable(&program).unwrap();
        let case = CaseMatcher::new(&f.output_dir)
            .resolve(f.input_dir.join("case1.txt"))
            .unwrap();

        {
            let _staged = f.ws.stage_case(&case).unwrap();
            assert_eq!(fsutil::read_if_exists(f.ws.input_path()).unwrap().unwrap(), b"1\n");
            assert_eq!(fsutil::read_if_exists(f.ws.expected_path()).unwrap().unwrap(), b"2\n");
            fsutil::write(f.ws.output_path(), "2\n").unwrap();
        }

        assert!(f.ws.residual_case_files().is_empty());
        assert!(f.ws.executable_path().is_file());
    }

    #[test]
    fn missing_expected_file_is_staging_error_without_residue() {
        let f = fixture();
        fsutil::write(f.input_dir.join("case9.txt"), "9\n").unwrap();
        let case = CaseMatcher::new(&f.output_dir)
            .resolve(f.input_dir.join("case9.txt"))
            .unwrap();

        let err = f.ws.stage_case(&case).unwrap_err();
        assert!(matches!(err, JudgeError::Staging(_)), "{:?}", err);
        assert!(f.ws.residual_case_files().is_empty());
    }

    #[test]
    fn finish_should_report_cleanup() {
        let f = fixture();
        fsutil::write(f.input_dir.join("c2"), "").unwrap();
        fsutil::write(f.output_dir.join("cost2.txt"), "").unwrap();
        let case = CaseMatcher::new(&f.output_dir)
            .resolve(f.input_dir.join("c2"))
            .unwrap();

        let staged = f.ws.stage_case(&case).unwrap();
        assert_eq!(f.ws.residual_case_files().len(), 2);
        staged.finish().unwrap();
        assert!(f.ws.residual_case_files().is_empty());
    }
}
