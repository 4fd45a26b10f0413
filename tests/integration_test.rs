use std::fs;
use std::path::{Path, PathBuf};

use linesift::{
    search, CancelToken, Candidate, LineMatch, LineMatcher, Origin, SearchError, SearchItem,
    SearchQuery, Source,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a temporary project tree for testing.
///
/// Structure:
/// ```
/// tmp/
///   a.txt              hello world
///   b/
///     c.txt            help low
///   image.bin          (NUL byte in its head)
///   venv/
///     lib/
///       helper.py      hello there
///   .git/
///     HEAD             hello from git
/// ```
fn setup_test_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("a.txt"), "hello world\n").unwrap();

    fs::create_dir(root.join("b")).unwrap();
    fs::write(root.join("b/c.txt"), "help low\n").unwrap();

    fs::write(root.join("image.bin"), b"hlo\0hello world").unwrap();

    fs::create_dir_all(root.join("venv/lib")).unwrap();
    fs::write(root.join("venv/lib/helper.py"), "hello there\n").unwrap();

    fs::create_dir(root.join(".git")).unwrap();
    fs::write(root.join(".git/HEAD"), "hello from git\n").unwrap();

    dir
}

fn relative(items: &[SearchItem], root: &Path) -> Vec<String> {
    items
        .iter()
        .map(|i| {
            i.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

/// Candidates from the root directory only, backed by walkdir.
struct FlatSource(PathBuf);

impl Source for FlatSource {
    fn candidates<'a>(
        &'a self,
        _query: &SearchQuery,
        _cancel: CancelToken,
    ) -> Box<dyn Iterator<Item = Result<Candidate, SearchError>> + 'a> {
        let mut entries: Vec<_> = walkdir::WalkDir::new(&self.0)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .collect();
        entries.retain(|e| e.as_ref().map(|e| e.file_type().is_file()).unwrap_or(true));

        Box::new(entries.into_iter().map(|e| match e {
            Ok(e) => Ok(Candidate {
                path:   e.path().to_path_buf(),
                origin: Origin::Project,
                depth:  e.depth(),
            }),
            Err(e) => {
                let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                Err(SearchError::Io {
                    path,
                    source: e.into_io_error().unwrap_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::Other, "walk error")
                    }),
                })
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn tighter_match_ranks_first() {
    let dir = setup_test_dir();
    let finished = search().run("hlo", dir.path(), false);

    assert_eq!(
        relative(&finished.items, dir.path()),
        ["a.txt", "b/c.txt"],
        "hello is a tighter match than help low"
    );
    assert!(finished.items[0].score > finished.items[1].score);

    let first = &finished.items[0];
    assert_eq!(first.line_number, 1);
    assert_eq!((first.column_start, first.column_end), (0, 5));
    assert_eq!(first.line_text, "hello world");
}

#[test]
fn equal_scores_fall_back_to_path_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("b")).unwrap();
    fs::write(root.join("b/c.txt"), "same line\n").unwrap();
    fs::write(root.join("a.txt"), "same line\nsame line\n").unwrap();

    let finished = search().run("sml", root, false);
    let keys: Vec<_> = finished
        .items
        .iter()
        .map(|i| (i.path.strip_prefix(root).unwrap().to_path_buf(), i.line_number))
        .collect();

    assert_eq!(
        keys,
        [
            (PathBuf::from("a.txt"), 1),
            (PathBuf::from("a.txt"), 2),
            (PathBuf::from("b").join("c.txt"), 1),
        ]
    );
}

#[test]
fn repeated_searches_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for n in 0..20 {
        let sub = root.join(format!("pkg{}", n % 4));
        fs::create_dir_all(&sub).unwrap();
        fs::write(
            sub.join(format!("mod{n}.rs")),
            "fn open_file() {}\nlet o = p.e.n;\nopen();\n",
        )
        .unwrap();
    }

    let first = search().threads(8).run("open", root, false);
    for _ in 0..5 {
        let again = search().threads(8).run("open", root, false);
        assert_eq!(again.items, first.items);
    }
    assert_eq!(first.items.len(), 60);
}

#[test]
fn binary_files_never_match() {
    let dir = setup_test_dir();
    let finished = search().run("hlo", dir.path(), true);

    assert!(finished
        .items
        .iter()
        .all(|i| !i.path.ends_with("image.bin")));
    assert!(finished.stats.files_skipped >= 1);
}

#[test]
fn excluded_dirs_are_not_searched() {
    let dir = setup_test_dir();
    let finished = search().run("hlo", dir.path(), true);

    assert!(finished
        .items
        .iter()
        .all(|i| !i.path.starts_with(dir.path().join(".git"))));
}

#[test]
fn dependency_modules_follow_the_toggle() {
    let dir = setup_test_dir();
    let venv = dir.path().join("venv");

    let without = search().run("hlo", dir.path(), false);
    assert!(without.items.iter().all(|i| !i.path.starts_with(&venv)));

    let with = search().run("hlo", dir.path(), true);
    assert_eq!(
        relative(&with.items, dir.path()),
        ["a.txt", "venv/lib/helper.py", "b/c.txt"],
        "dependency matches rank exactly like project matches"
    );
    assert_eq!(with.items[0].score, with.items[1].score);
}

#[test]
fn cap_keeps_the_highest_scores() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    // Scattered matches sort first by path, tight ones last.
    for n in 0..30 {
        fs::write(root.join(format!("a{n:02}.txt")), "a x b x c\n").unwrap();
    }
    for n in 0..5 {
        fs::write(root.join(format!("z{n}.txt")), "abc\n").unwrap();
    }

    let finished = search().max_results(5).run("abc", root, false);

    assert_eq!(finished.items.len(), 5);
    assert_eq!(finished.stats.matches, 35);
    assert!(finished
        .items
        .iter()
        .all(|i| i.column_end - i.column_start == 3));
}

#[test]
fn invalid_root_finishes_empty() {
    let dir = tempfile::tempdir().unwrap();
    let finished = search().run("hlo", dir.path().join("missing"), false);

    assert!(finished.items.is_empty());
    assert_eq!(finished.stats.files_searched, 0);
}

#[test]
fn empty_query_finishes_empty() {
    let dir = setup_test_dir();
    let finished = search().run("", dir.path(), false);

    assert!(finished.items.is_empty());
    assert_eq!(finished.stats.files_searched, 0);
}

#[test]
fn undecodable_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut content = b"caf\xe9 hello\r\n".to_vec();
    content.extend_from_slice(b"say hello\r\n");
    fs::write(dir.path().join("latin1.txt"), content).unwrap();

    let finished = search().run("hello", dir.path(), false);

    assert_eq!(finished.items.len(), 1);
    assert_eq!(finished.items[0].line_number, 2);
    assert_eq!(finished.items[0].line_text, "say hello");
}

#[test]
fn stats_are_populated() {
    let dir = setup_test_dir();
    let finished = search().run("hlo", dir.path(), false);

    assert_eq!(finished.stats.files_searched, 2);
    assert_eq!(finished.stats.lines, 2);
    assert_eq!(finished.stats.matches, 2);
    assert!(finished.stats.duration.as_nanos() > 0);
}

#[test]
fn custom_source_works() {
    let dir = setup_test_dir();
    let finished = search()
        .source(FlatSource(dir.path().to_path_buf()))
        .run("hlo", dir.path(), false);

    // Flat: b/c.txt is out of reach. image.bin is not probed by this source,
    // so it is searched like any other file, and its contiguous "hlo" wins.
    assert_eq!(relative(&finished.items, dir.path()), ["image.bin", "a.txt"]);
}

#[test]
fn custom_matcher_works() {
    struct Exact;
    impl LineMatcher for Exact {
        fn match_line(&self, query: &str, line: &str) -> Option<LineMatch> {
            let byte = line.find(query)?;
            let start = line[..byte].chars().count();
            Some(LineMatch {
                column_start: start,
                column_end: start + query.chars().count(),
                score: 1,
            })
        }
    }

    let dir = setup_test_dir();
    let finished = search().with_matcher(Exact).run("low", dir.path(), false);

    assert_eq!(relative(&finished.items, dir.path()), ["b/c.txt"]);
    assert_eq!(finished.items[0].column_start, 5);
}
