use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Comparison {
    Match,
    Mismatch,
}

/// First pair of normalized lines that differ. `None` on either side means
/// that side ran out of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff {
    pub line_no: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Compares the expected artifact against the produced output, ignoring
/// trailing whitespace on each line and blank lines.
///
/// A missing `actual` file is a [`Comparison::Mismatch`], not an error.
pub fn compare_files(
    expected: impl AsRef<Path>,
    actual: impl AsRef<Path>,
) -> fsutil::Result<(Comparison, Option<LineDiff>)> {
    let Some(expected) = fsutil::read_if_exists(&expected)? else {
        return Err(fsutil::Error::SingleIO(
            "Expected output vanished from scratch dir",
            expected.as_ref().to_owned(),
            std::io::ErrorKind::NotFound.into(),
        ));
    };
    let Some(actual) = fsutil::read_if_exists(&actual)? else {
        log::debug!("No output file at {:?}", actual.as_ref());
        let diff = first_difference(&expected, b"");
        return Ok((Comparison::Mismatch, diff));
    };
    let comparison = compare(&expected, &actual);
    let diff = match comparison {
        Comparison::Match => None,
        Comparison::Mismatch => first_difference(&expected, &actual),
    };
    Ok((comparison, diff))
}

pub fn compare(expected: &[u8], actual: &[u8]) -> Comparison {
    if normalized_lines(expected).eq(normalized_lines(actual)) {
        Comparison::Match
    } else {
        Comparison::Mismatch
    }
}

pub fn first_difference(expected: &[u8], actual: &[u8]) -> Option<LineDiff> {
    let mut expected = normalized_lines(expected);
    let mut actual = normalized_lines(actual);
    let mut line_no = 0;
    loop {
        line_no += 1;
        match (expected.next(), actual.next()) {
            (None, None) => return None,
            (e, a) if e == a => continue,
            (e, a) => {
                let lossy = |l: &[u8]| String::from_utf8_lossy(l).into_owned();
                return Some(LineDiff {
                    line_no,
                    expected: e.map(lossy),
                    actual: a.map(lossy),
                });
            }
        }
    }
}

fn normalized_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|&b| b == b'\n')
        .map(trim_ascii_end)
        .filter(|line| !line.is_empty())
}

fn trim_ascii_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., last] = line {
        if !last.is_ascii_whitespace() {
            break;
        }
        line = rest;
    }
    line
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identical_bytes_should_match() {
        assert_eq!(compare(b"1 2\n3\n", b"1 2\n3\n"), Comparison::Match);
    }

    #[test]
    fn trailing_spaces_and_blank_lines_are_ignored() {
        assert_eq!(compare(b"1 2\n3\n", b"1 2   \n\n3"), Comparison::Match);
        assert_eq!(compare(b"1 2\r\n3\r\n", b"1 2\n3\n"), Comparison::Match);
        assert_eq!(compare(b"\n\n42\n\n", b"42"), Comparison::Match);
    }

    #[test]
    fn leading_spaces_and_content_differences_matter() {
        assert_eq!(compare(b"1 2\n", b" 1 2\n"), Comparison::Mismatch);
        assert_eq!(compare(b"1 2\n", b"1  2\n"), Comparison::Mismatch);
        assert_eq!(compare(b"10\n", b"10.0\n"), Comparison::Mismatch);
        assert_eq!(compare(b"1\n2\n", b"1\n"), Comparison::Mismatch);
    }

    #[test]
    fn first_difference_should_point_at_line() {
        let diff = first_difference(b"a\nb\nc\n", b"a\n\nB\nc\n").unwrap();
        assert_eq!(
            diff,
            LineDiff {
                line_no: 2,
                expected: Some("b".into()),
                actual: Some("B".into()),
            }
        );

        let diff = first_difference(b"a\nb\n", b"a\n").unwrap();
        assert_eq!(diff.line_no, 2);
        assert_eq!(diff.actual, None);
    }

    #[test]
    fn missing_output_file_is_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = tmp.path().join("cost.txt");
        fsutil::write(&expected, "7\n").unwrap();

        let (cmp, diff) = compare_files(&expected, tmp.path().join("output.txt")).unwrap();
        assert_eq!(cmp, Comparison::Mismatch);
        assert_eq!(diff.unwrap().expected.as_deref(), Some("7"));
    }

    #[test]
    fn matching_files_should_match() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = tmp.path().join("cost.txt");
        let actual = tmp.path().join("output.txt");
        fsutil::write(&expected, "7\n8\n").unwrap();
        fsutil::write(&actual, "7\n8").unwrap();

        assert_eq!(
            compare_files(&expected, &actual).unwrap(),
            (Comparison::Match, None)
        );
    }

    #[test]
    fn differing_files_should_report_first_difference() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = tmp.path().join("cost.txt");
        let actual = tmp.path().join("output.txt");
        fsutil::write(&expected, "1 2\n3\n").unwrap();
        fsutil::write(&actual, "1 2  \n\n 3\n").unwrap();

        let (cmp, diff) = compare_files(&expected, &actual).unwrap();
        assert_eq!(cmp, Comparison::Mismatch);
        assert_eq!(
            diff,
            Some(LineDiff {
                line_no: 2,
                expected: Some("3".into()),
                actual: Some(" 3".into()),
            })
        );
    }
}
