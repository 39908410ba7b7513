use serde::Serialize;
use std::{
    fs::{self, ReadDir},
    io,
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("{0} (from='{1}', to='{2}'): {3}")]
        FromToIO(Msg, PathBuf, PathBuf, #[source] io::Error),

        #[error("Failed to canonicalize path '{0}': {1}")]
        CanonicalizePath(PathBuf, #[source] io::Error),

        #[error("Cannot serialize to JSON (dest='{0}'): {1}")]
        SerializeToJson(PathBuf, #[source] serde_json::Error),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

/// Removes `dir` recursively. A missing `dir` is not an error.
#[must_use]
pub fn remove_dir_all_if_exists(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::SingleIO("Cannot remove dir", dir.to_owned(), e)),
    }
}

/// Deletes `dir` (if any) and creates it again, empty.
#[must_use]
pub fn recreate_dir(path: impl AsRef<Path>) -> Result<()> {
    self::remove_dir_all_if_exists(&path)?;
    self::mkdir_all(&path)
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        if !dir.as_os_str().is_empty() {
            self::mkdir_all(dir)?;
        }
    }
    self::write(filepath, contents)
}

/// Reads the whole file, returning `None` when it does not exist.
#[must_use]
pub fn read_if_exists(filepath: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
    let filepath = filepath.as_ref();
    match fs::read(filepath) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::SingleIO("Cannot read file", filepath.to_owned(), e)),
    }
}

/// Returns whether a file was actually removed.
#[must_use]
pub fn remove_file_if_exists(filepath: impl AsRef<Path>) -> Result<bool> {
    let filepath = filepath.as_ref();
    match fs::remove_file(filepath) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::SingleIO("Cannot remove file", filepath.to_owned(), e)),
    }
}

#[must_use]
pub fn write_json_with_mkdir<P, T>(filepath: P, data: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let s = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SerializeToJson(filepath.as_ref().to_owned(), e))?;
    write_with_mkdir(filepath, &s)
}

/// Copies a regular file. Permission bits travel with the contents.
#[must_use]
pub fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    fs::copy(&from, &to).map_err(|e| {
        Error::FromToIO(
            "Cannot copy file",
            from.as_ref().to_owned(),
            to.as_ref().to_owned(),
            e,
        )
    })
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

/// Lists the non-directory entries of `dir`, sorted by file name.
pub fn list_files_sorted(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in self::read_dir(dir)? {
        let entry =
            entry.map_err(|e| Error::SingleIO("Cannot access dir entry", dir.to_owned(), e))?;
        let Ok(ft) = entry.file_type() else {
            log::debug!("Skipping {:?}: cannot get file type", entry.path());
            continue;
        };
        if ft.is_dir() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn canonicalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    path.canonicalize()
        .map_err(|e| Error::CanonicalizePath(path.to_owned(), e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recreate_dir_should_empty_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("scratch");
        write_with_mkdir(dir.join("stale.txt"), "x").unwrap();

        recreate_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(read_dir(&dir).unwrap().count(), 0);

        // idempotent
        recreate_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn missing_files_are_not_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nothing.txt");
        assert_eq!(read_if_exists(&path).unwrap(), None);
        assert_eq!(remove_file_if_exists(&path).unwrap(), false);
        remove_dir_all_if_exists(tmp.path().join("nodir")).unwrap();
    }

    #[test]
    fn list_files_sorted_should_skip_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path().join("b2.txt"), "").unwrap();
        write(tmp.path().join("a1.txt"), "").unwrap();
        mkdir_all(tmp.path().join("sub")).unwrap();

        let names: Vec<_> = list_files_sorted(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a1.txt", "b2.txt"]);
    }

    #[test]
    fn copy_file_error_should_mention_both_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("missing");
        let to = tmp.path().join("dest");
        let err = copy_file(&from, &to).unwrap_err();
        assert!(matches!(err, Error::FromToIO(_, ref f, ref t, _) if *f == from && *t == to));
        let msg = err.to_string();
        assert!(msg.contains("missing"), "{}", msg);
        assert!(msg.contains("dest"), "{}", msg);
    }
}
