use crate::extractor::FileRecord;
use crate::writer::report::{StatusSink, WriteEntry, WriteOutcome, WriteReport};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    /// Replace files that already exist.
    pub overwrite: bool,
    /// Reject any record resolving outside the base directory.
    pub strict_containment: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            overwrite: true,
            strict_containment: false,
        }
    }
}

impl WritePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_strict_containment(mut self, strict: bool) -> Self {
        self.strict_containment = strict;
        self
    }
}

/// Writes extracted file records beneath a base directory.
///
/// Each record is handled on its own: a failure is reported as a
/// [`WriteOutcome`] and the next record is attempted.
pub struct FileWriter {
    base_directory: PathBuf,
    policy: WritePolicy,
}

impl FileWriter {
    pub fn new<P: AsRef<Path>>(base_directory: P, policy: WritePolicy) -> Self {
        Self {
            base_directory: resolve_base(base_directory.as_ref()),
            policy,
        }
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn write_all(&self, files: &[FileRecord], sink: &dyn StatusSink) -> WriteReport {
        let mut report = WriteReport::new(self.base_directory.clone());

        for file in files {
            let entry = self.write_one(file);
            sink.emit(&entry.status_line());
            report.record(entry);
        }

        report.finish();
        report
    }

    pub fn write_one(&self, file: &FileRecord) -> WriteEntry {
        let (resolved_path, outcome) = self.attempt(file);

        match &outcome {
            o if o.is_failure() => warn!(path = %file.path, outcome = ?o, "file not written"),
            o => debug!(path = %file.path, outcome = ?o, "file processed"),
        }

        WriteEntry {
            path: file.path.clone(),
            resolved_path,
            outcome,
        }
    }

    fn attempt(&self, file: &FileRecord) -> (Option<PathBuf>, WriteOutcome) {
        if file.path.trim().is_empty() {
            return (None, WriteOutcome::SkippedEmptyPath);
        }

        let target = resolve_path(&self.base_directory, Path::new(&file.path));

        if self.policy.strict_containment && !target.starts_with(&self.base_directory) {
            return (Some(target), WriteOutcome::RejectedPathEscape);
        }

        let existed = target.exists();
        if existed && !self.policy.overwrite {
            return (Some(target), WriteOutcome::SkippedExists);
        }

        let Some(content) = file.content.as_deref() else {
            return (Some(target), WriteOutcome::SkippedNoContent);
        };

        let outcome = match write_text(&target, content) {
            Ok(()) if existed => WriteOutcome::Updated,
            Ok(()) => WriteOutcome::Created,
            Err(e) => classify_io_error(&e),
        };

        (Some(target), outcome)
    }
}

fn write_text(target: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, content.as_bytes())
}

pub fn classify_io_error(error: &io::Error) -> WriteOutcome {
    match error.kind() {
        io::ErrorKind::PermissionDenied => WriteOutcome::FailedPermission(error.to_string()),
        _ => WriteOutcome::FailedOsError(error.to_string()),
    }
}

fn resolve_base(base: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(base) {
        return canonical;
    }

    let absolute = if base.is_absolute() {
        base.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(base))
            .unwrap_or_else(|_| base.to_path_buf())
    };
    resolve_path(Path::new(""), &absolute)
}

const MAX_SYMLINK_HOPS: usize = 40;

/// Join `relative` onto `base` the way the filesystem would walk it.
///
/// `.` is dropped and `..` removes the previous component. Every prefix that
/// exists on disk is canonicalized, so symlinks are followed; a dangling
/// symlink is followed to its missing target. The missing tail is kept as
/// written. An absolute `relative` replaces `base`.
pub fn resolve_path(base: &Path, relative: &Path) -> PathBuf {
    resolve_with_hops(base, relative, 0)
}

fn resolve_with_hops(base: &Path, relative: &Path, hops: usize) -> PathBuf {
    let mut resolved = base.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Prefix(prefix) => resolved = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                match fs::canonicalize(&resolved) {
                    Ok(canonical) => resolved = canonical,
                    Err(_) if hops < MAX_SYMLINK_HOPS => {
                        if let Some(target) = dangling_link_target(&resolved) {
                            let parent = resolved
                                .parent()
                                .map(Path::to_path_buf)
                                .unwrap_or_default();
                            resolved = resolve_with_hops(&parent, &target, hops + 1);
                        }
                    }
                    Err(_) => {}
                }
            }
        }
    }

    resolved
}

// Link text of `path` when it is a symlink canonicalize could not follow.
fn dangling_link_target(path: &Path) -> Option<PathBuf> {
    let metadata = fs::symlink_metadata(path).ok()?;
    if !metadata.file_type().is_symlink() {
        return None;
    }
    fs::read_link(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::report::{CollectingSink, StatusLevel};
    use tempfile::TempDir;

    fn no_sink() -> impl Fn(&crate::writer::StatusLine) {
        |_| {}
    }

    fn project(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join("project");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_end_to_end_write() {
        let temp = TempDir::new().unwrap();
        let files = crate::extractor::extract_files(
            "**File: `app.py`**\n```python\nprint(\"hi\")\n```\n",
        );
        let writer = FileWriter::new(temp.path(), WritePolicy::default());

        let report = writer.write_all(&files, &no_sink());

        assert_eq!(report.written.len(), 1);
        assert!(report.written[0].ends_with("app.py"));
        assert!(report.written[0].is_absolute());
        assert_eq!(
            fs::read_to_string(temp.path().join("app.py")).unwrap(),
            "print(\"hi\")"
        );
        assert_eq!(report.outcome_for("app.py"), Some(&WriteOutcome::Created));
    }

    #[test]
    fn test_creates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let writer = FileWriter::new(temp.path(), WritePolicy::default());

        let report = writer.write_all(
            &[FileRecord::new("a/b/c/file.txt", "deep", "text")],
            &no_sink(),
        );

        assert_eq!(report.created_count(), 1);
        assert!(temp.path().join("a").is_dir());
        assert!(temp.path().join("a/b").is_dir());
        assert!(temp.path().join("a/b/c").is_dir());
        assert_eq!(
            fs::read_to_string(temp.path().join("a/b/c/file.txt")).unwrap(),
            "deep"
        );
    }

    #[test]
    fn test_second_run_updates_with_identical_contents() {
        let temp = TempDir::new().unwrap();
        let writer = FileWriter::new(temp.path(), WritePolicy::default());
        let files = vec![
            FileRecord::new("one.txt", "1", "text"),
            FileRecord::new("nested/two.txt", "2", "text"),
        ];

        let first = writer.write_all(&files, &no_sink());
        let second = writer.write_all(&files, &no_sink());

        assert_eq!(first.created_count(), 2);
        assert_eq!(second.updated_count(), 2);
        assert_eq!(second.created_count(), 0);
        assert_eq!(fs::read_to_string(temp.path().join("one.txt")).unwrap(), "1");
        assert_eq!(
            fs::read_to_string(temp.path().join("nested/two.txt")).unwrap(),
            "2"
        );
    }

    #[test]
    fn test_overwrite_disabled_skips_existing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("keep.txt"), "original").unwrap();
        let writer = FileWriter::new(temp.path(), WritePolicy::new().with_overwrite(false));

        let report = writer.write_all(
            &[
                FileRecord::new("keep.txt", "replacement", "text"),
                FileRecord::new("fresh.txt", "new", "text"),
            ],
            &no_sink(),
        );

        assert_eq!(report.outcome_for("keep.txt"), Some(&WriteOutcome::SkippedExists));
        assert_eq!(report.outcome_for("fresh.txt"), Some(&WriteOutcome::Created));
        assert_eq!(
            fs::read_to_string(temp.path().join("keep.txt")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_empty_path_and_missing_content_are_skipped() {
        let temp = TempDir::new().unwrap();
        let writer = FileWriter::new(temp.path(), WritePolicy::default());

        let report = writer.write_all(
            &[
                FileRecord::new("", "x", "text"),
                FileRecord::new("   ", "x", "text"),
                FileRecord::without_content("ghost/none.txt"),
                FileRecord::new("empty.txt", "", "text"),
            ],
            &no_sink(),
        );

        assert_eq!(report.entries[0].outcome, WriteOutcome::SkippedEmptyPath);
        assert_eq!(report.entries[1].outcome, WriteOutcome::SkippedEmptyPath);
        assert_eq!(report.entries[2].outcome, WriteOutcome::SkippedNoContent);
        assert_eq!(report.entries[3].outcome, WriteOutcome::Created);
        assert!(!temp.path().join("ghost").exists());
        assert_eq!(fs::read_to_string(temp.path().join("empty.txt")).unwrap(), "");
    }

    #[test]
    fn test_strict_containment_rejects_escape() {
        let temp = TempDir::new().unwrap();
        let base = project(&temp);
        let writer = FileWriter::new(&base, WritePolicy::new().with_strict_containment(true));

        let report = writer.write_all(
            &[
                FileRecord::new("../../etc/evil", "pwned", "text"),
                FileRecord::new("../sibling.txt", "pwned", "text"),
                FileRecord::new("inner/../ok.txt", "fine", "text"),
            ],
            &no_sink(),
        );

        assert_eq!(report.entries[0].outcome, WriteOutcome::RejectedPathEscape);
        assert_eq!(report.entries[1].outcome, WriteOutcome::RejectedPathEscape);
        assert_eq!(report.entries[2].outcome, WriteOutcome::Created);
        assert!(!temp.path().join("sibling.txt").exists());
        assert!(!temp.path().parent().unwrap().join("etc/evil").exists());
        assert!(base.join("ok.txt").exists());
    }

    #[test]
    fn test_permissive_default_allows_escape() {
        let temp = TempDir::new().unwrap();
        let base = project(&temp);
        let writer = FileWriter::new(&base, WritePolicy::default());

        let report = writer.write_all(
            &[FileRecord::new("../outside.txt", "escaped", "text")],
            &no_sink(),
        );

        assert_eq!(report.created_count(), 1);
        assert_eq!(
            fs::read_to_string(temp.path().join("outside.txt")).unwrap(),
            "escaped"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_strict_containment_follows_symlinks() {
        let temp = TempDir::new().unwrap();
        let base = project(&temp);
        let elsewhere = temp.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).unwrap();
        std::os::unix::fs::symlink(&elsewhere, base.join("link")).unwrap();

        let writer = FileWriter::new(&base, WritePolicy::new().with_strict_containment(true));
        let report = writer.write_all(
            &[FileRecord::new("link/planted.txt", "x", "text")],
            &no_sink(),
        );

        assert_eq!(report.entries[0].outcome, WriteOutcome::RejectedPathEscape);
        assert!(!elsewhere.join("planted.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_strict_containment_follows_dangling_symlinks() {
        let temp = TempDir::new().unwrap();
        let base = project(&temp);
        std::os::unix::fs::symlink("../outside.txt", base.join("trap.txt")).unwrap();
        std::os::unix::fs::symlink("missing-inside.txt", base.join("inner.txt")).unwrap();

        let writer = FileWriter::new(&base, WritePolicy::new().with_strict_containment(true));
        let trap = writer.write_one(&FileRecord::new("trap.txt", "pwned", "text"));
        let inner = writer.write_one(&FileRecord::new("inner.txt", "fine", "text"));

        assert_eq!(trap.outcome, WriteOutcome::RejectedPathEscape);
        assert!(!temp.path().join("outside.txt").exists());
        assert_eq!(inner.outcome, WriteOutcome::Created);
        assert_eq!(
            fs::read_to_string(base.join("missing-inside.txt")).unwrap(),
            "fine"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_hang() {
        let temp = TempDir::new().unwrap();
        let base = project(&temp);
        std::os::unix::fs::symlink("loop-b", base.join("loop-a")).unwrap();
        std::os::unix::fs::symlink("loop-a", base.join("loop-b")).unwrap();

        let resolved = resolve_path(&fs::canonicalize(&base).unwrap(), Path::new("loop-a"));
        assert!(resolved.starts_with(fs::canonicalize(&base).unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory_reports_permission_failure() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions; nothing to check there.
        if fs::write(locked.join(".writable"), "").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let writer = FileWriter::new(temp.path(), WritePolicy::default());
        let report = writer.write_all(
            &[
                FileRecord::new("first.txt", "1", "text"),
                FileRecord::new("locked/second.txt", "2", "text"),
                FileRecord::new("third.txt", "3", "text"),
            ],
            &no_sink(),
        );
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.entries[0].outcome, WriteOutcome::Created);
        assert!(matches!(
            report.entries[1].outcome,
            WriteOutcome::FailedPermission(_)
        ));
        assert_eq!(report.entries[2].outcome, WriteOutcome::Created);
        assert_eq!(report.failed_count(), 1);
        assert!(!locked.join("second.txt").exists());
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blocker"), "i am a file").unwrap();
        let writer = FileWriter::new(temp.path(), WritePolicy::default());
        let sink = CollectingSink::new();

        let report = writer.write_all(
            &[
                FileRecord::new("first.txt", "1", "text"),
                FileRecord::new("blocker/second.txt", "2", "text"),
                FileRecord::new("third.txt", "3", "text"),
            ],
            &sink,
        );

        assert_eq!(report.entries[0].outcome, WriteOutcome::Created);
        assert!(matches!(
            report.entries[1].outcome,
            WriteOutcome::FailedOsError(_) | WriteOutcome::FailedPermission(_)
        ));
        assert_eq!(report.entries[2].outcome, WriteOutcome::Created);
        assert_eq!(report.written.len(), 2);

        let levels: Vec<StatusLevel> = sink.lines().iter().map(|l| l.level).collect();
        assert_eq!(
            levels,
            vec![StatusLevel::Success, StatusLevel::Error, StatusLevel::Success]
        );
    }

    #[test]
    fn test_permission_errors_are_classified() {
        let error = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            classify_io_error(&error),
            WriteOutcome::FailedPermission(_)
        ));

        let error = io::Error::new(io::ErrorKind::Other, "disk full");
        assert_eq!(
            classify_io_error(&error),
            WriteOutcome::FailedOsError("disk full".to_string())
        );
    }

    #[test]
    fn test_resolve_path_normalizes_segments() {
        let temp = TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();

        let resolved = resolve_path(&base, Path::new("./a/./b/../c.txt"));
        assert_eq!(resolved, base.join("a").join("c.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_record_path_replaces_base() {
        let temp = TempDir::new().unwrap();
        let writer = FileWriter::new(temp.path(), WritePolicy::new().with_strict_containment(true));

        let entry = writer.write_one(&FileRecord::new("/etc/passwd", "nope", "text"));
        assert_eq!(entry.outcome, WriteOutcome::RejectedPathEscape);
    }
}
