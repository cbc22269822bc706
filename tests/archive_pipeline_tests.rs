use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;
use zip::ZipArchive;

use dclean::archive::{DELETE_PROMPT, PROCEED_PROMPT};
use dclean::{AppConfig, ArchiveOptions, Archiver, AssumeYes, Error, RunOutcome, SilentReporter};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn set_mtime(path: &Path, time: SystemTime) {
    File::open(path).unwrap().set_modified(time).unwrap();
}

/// Creates `root/name` with a small project layout, every entry aged `age_days`.
///
///   name/
///     README.md
///     src/main.js
///     node_modules/dep/index.js   (8KB)
fn make_project(root: &Path, name: &str, age_days: u32) {
    let project = root.join(name);
    fs::create_dir_all(project.join("src")).unwrap();
    fs::create_dir_all(project.join("node_modules/dep")).unwrap();
    fs::write(project.join("README.md"), format!("# {}\n", name)).unwrap();
    fs::write(project.join("src/main.js"), "console.log('hi');\n".repeat(50)).unwrap();
    fs::write(project.join("node_modules/dep/index.js"), vec![b'x'; 8192]).unwrap();

    let when = SystemTime::now() - age_days * DAY;
    for path in [
        project.join("README.md"),
        project.join("src/main.js"),
        project.join("node_modules/dep/index.js"),
        project.join("node_modules/dep"),
        project.join("node_modules"),
        project.join("src"),
        project.clone(),
    ] {
        set_mtime(&path, when);
    }
}

fn options(root: &Path) -> ArchiveOptions {
    ArchiveOptions::new(root, &AppConfig::default())
}

/// Answers each prompt in turn from `answers`, then declines.
fn scripted(answers: Vec<bool>) -> impl FnMut(&str) -> bool {
    let mut next = answers.into_iter();
    move |_prompt: &str| next.next().unwrap_or(false)
}

fn zip_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

#[test]
fn test_archives_old_directory_and_keeps_new_one() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "proj-old", 60);
    make_project(root, "proj-new", 0);

    let mut asked = Vec::new();
    let mut confirm = |prompt: &str| {
        asked.push(prompt.to_string());
        prompt == PROCEED_PROMPT
    };
    let report = Archiver::new(options(root))
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    assert_eq!(asked, vec![PROCEED_PROMPT, DELETE_PROMPT]);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.archived.len(), 1);
    assert_eq!(report.archived[0].candidate.name, "proj-old");
    let skipped: Vec<&str> = report.skipped().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(skipped, vec!["proj-new"]);
    assert_eq!(report.not_attempted().len(), 1);
    assert!(report.deleted.is_empty());

    let artifact = root.join("archive/proj-old.zip");
    assert_eq!(report.archived[0].artifact, artifact);
    assert_eq!(
        zip_names(&artifact),
        vec!["README.md", "node_modules/dep/index.js", "src/main.js"]
    );
    assert!(!root.join("archive/proj-new.zip").exists());
    assert!(!root.join("archive/.tmp").exists());

    // Deletion was declined: both originals are still there.
    assert!(root.join("proj-old/README.md").is_file());
    assert!(root.join("proj-new/README.md").is_file());
}

#[test]
fn test_zip_entries_match_original_bytes() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "legacy", 45);

    let mut confirm = scripted(vec![true, false]);
    Archiver::new(options(root))
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    let mut archive = ZipArchive::new(File::open(root.join("archive/legacy.zip")).unwrap()).unwrap();
    let mut contents = Vec::new();
    archive
        .by_name("src/main.js")
        .unwrap()
        .read_to_end(&mut contents)
        .unwrap();
    assert_eq!(contents, fs::read(root.join("legacy/src/main.js")).unwrap());
}

#[test]
fn test_copy_mode_prunes_dependency_caches() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "webapp", 90);

    let mut options = options(root);
    options.use_zip = false;
    options.remove_dependency_caches = true;

    let mut confirm = scripted(vec![true, false]);
    let report = Archiver::new(options)
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    let archived_dir = root.join("archive/webapp");
    assert!(archived_dir.join("src/main.js").is_file());
    assert!(!archived_dir.join("node_modules").exists());
    // Only the staged copy is pruned.
    assert!(root.join("webapp/node_modules/dep/index.js").is_file());

    let archived = &report.archived[0];
    assert_eq!(archived.artifact, archived_dir);
    assert_eq!(archived.original_bytes, archived.archived_bytes + 8192);
    assert_eq!(report.stats.original_bytes, archived.original_bytes);
    assert!(report.stats.percent_saved() > 0.0);
    assert!(!root.join("archive/.tmp").exists());
}

#[test]
fn test_declining_first_prompt_has_no_side_effects() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "old", 100);

    let mut confirm = |_: &str| false;
    let result = Archiver::new(options(root)).run(&mut confirm, &SilentReporter);

    assert!(matches!(result, Err(Error::UserAborted)));
    assert!(!root.join("archive").exists());
    assert!(root.join("old/README.md").is_file());
}

#[test]
fn test_nothing_eligible_skips_prompts() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "fresh", 1);

    let mut prompts = 0;
    let mut confirm = |_: &str| {
        prompts += 1;
        true
    };
    let report = Archiver::new(options(root))
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::NothingToArchive);
    assert_eq!(prompts, 0);
    assert!(!root.join("archive").exists());
}

#[test]
fn test_archive_all_then_rerun_is_idempotent() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "alpha", 0);
    make_project(root, "beta", 0);

    let mut options = options(root);
    options.archive_all = true;

    let first = Archiver::new(options.clone())
        .run(&mut AssumeYes, &SilentReporter)
        .unwrap();
    assert_eq!(first.archived.len(), 2);
    assert_eq!(first.deleted.len(), 2);
    assert!(!root.join("alpha").exists());
    assert!(!root.join("beta").exists());

    let before = fs::metadata(root.join("archive/alpha.zip"))
        .unwrap()
        .modified()
        .unwrap();

    let second = Archiver::new(options)
        .run(&mut AssumeYes, &SilentReporter)
        .unwrap();
    assert_eq!(second.outcome, RunOutcome::NothingToArchive);
    assert!(second.candidates.is_empty());

    let mut entries: Vec<String> = fs::read_dir(root.join("archive"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["alpha.zip", "beta.zip"]);
    assert_eq!(
        fs::metadata(root.join("archive/alpha.zip"))
            .unwrap()
            .modified()
            .unwrap(),
        before
    );
}

#[test]
fn test_one_failure_does_not_stop_the_run() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "broken", 60);
    make_project(root, "good", 60);
    let only_in_broken = root.join("broken/only-in-broken.txt");
    fs::write(&only_in_broken, "stale leftovers").unwrap();
    let when = SystemTime::now() - 60 * DAY;
    set_mtime(&only_in_broken, when);
    set_mtime(&root.join("broken"), when);

    // A directory where the zip should go makes encoding fail for "broken".
    fs::create_dir_all(root.join("archive/broken.zip/occupied")).unwrap();

    let report = Archiver::new(options(root))
        .run(&mut AssumeYes, &SilentReporter)
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].candidate.name, "broken");
    assert_eq!(report.archived.len(), 1);
    assert_eq!(report.archived[0].candidate.name, "good");
    assert_eq!(report.skipped().len(), 1);
    assert!(report.not_attempted().is_empty());

    // Nothing from the failed candidate's staged copy leaks into the next one.
    assert_eq!(
        zip_names(&root.join("archive/good.zip")),
        vec!["README.md", "node_modules/dep/index.js", "src/main.js"]
    );

    // Only the successfully archived original is deleted.
    assert_eq!(report.deleted.len(), 1);
    assert!(!root.join("good").exists());
    assert!(root.join("broken/README.md").is_file());
    assert!(root.join("archive/good.zip").is_file());
    assert!(!root.join("archive/.tmp").exists());
}

#[test]
fn test_with_now_controls_the_cutoff() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, "recent", 5);

    let mut confirm = scripted(vec![true, false]);
    let report = Archiver::new(options(root))
        .with_now(SystemTime::now() + 60 * DAY)
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    assert_eq!(report.archived.len(), 1);
    assert!(root.join("archive/recent.zip").is_file());
}

#[test]
fn test_missing_root_is_fatal() {
    let tmp = tempdir().unwrap();
    let result = Archiver::new(options(&tmp.path().join("does-not-exist")))
        .run(&mut AssumeYes, &SilentReporter);
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn test_deletion_failure_does_not_block_other_deletions() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    for name in ["a", "b", "c"] {
        make_project(&root, name, 60);
    }

    // Replace "a" with a plain file once archiving is done, so removing it fails.
    let swap_root = root.clone();
    let mut confirm = move |prompt: &str| {
        if prompt == DELETE_PROMPT {
            let original = swap_root.join("a");
            fs::remove_dir_all(&original).unwrap();
            fs::write(&original, "not a directory any more").unwrap();
        }
        true
    };
    let report = Archiver::new(options(&root))
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    assert_eq!(report.archived.len(), 3);
    let deleted: Vec<&str> = report.deleted.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(deleted, vec!["b", "c"]);
    assert_eq!(report.deletion_failures.len(), 1);
    assert_eq!(report.deletion_failures[0].candidate.name, "a");
    assert!(report.deletion_failures[0].error.contains("a"));

    assert!(root.join("a").is_file());
    assert!(!root.join("b").exists());
    assert!(!root.join("c").exists());
    for zip in ["a.zip", "b.zip", "c.zip"] {
        assert!(root.join("archive").join(zip).is_file());
    }
}

#[test]
fn test_copy_mode_rejects_candidate_named_like_staging() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    make_project(root, ".tmp", 60);
    make_project(root, "good", 60);

    let mut options = options(root);
    options.use_zip = false;

    let mut confirm = scripted(vec![true, false]);
    let report = Archiver::new(options)
        .run(&mut confirm, &SilentReporter)
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].candidate.name, ".tmp");
    assert!(report.failed[0].error.contains("staging directory"));
    assert_eq!(report.archived.len(), 1);
    assert!(root.join("archive/good/src/main.js").is_file());
    assert!(!root.join("archive/.tmp").exists());
    assert!(root.join(".tmp/README.md").is_file());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_get_separate_archives() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = tempdir().unwrap();
    let root = tmp.path();
    let first = OsStr::from_bytes(b"proj\xff");
    let second = OsStr::from_bytes(b"proj\xfe");
    for (name, contents) in [(first, "first"), (second, "second")] {
        fs::create_dir(root.join(name)).unwrap();
        fs::write(root.join(name).join("data.txt"), contents).unwrap();
    }

    let mut options = options(root);
    options.archive_all = true;
    let report = Archiver::new(options)
        .run(&mut AssumeYes, &SilentReporter)
        .unwrap();

    assert_eq!(report.archived.len(), 2);
    assert_ne!(report.archived[0].artifact, report.archived[1].artifact);

    for (name, contents) in [(first, "first"), (second, "second")] {
        let mut zip_name = name.to_os_string();
        zip_name.push(".zip");
        let mut archive =
            ZipArchive::new(File::open(root.join("archive").join(zip_name)).unwrap()).unwrap();
        let mut data = String::new();
        archive
            .by_name("data.txt")
            .unwrap()
            .read_to_string(&mut data)
            .unwrap();
        assert_eq!(data, contents);
    }
}
