//! Git fixtures shared by unit tests

use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};

/// Initialise a repository whose unborn branch is `main`
pub fn init_repo(dir: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(dir, &opts).unwrap()
}

/// Write `name`, stage it and commit on HEAD at a fixed epoch time
pub fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str, epoch: i64) -> Oid {
    let workdir = repo.workdir().unwrap();
    let file = workdir.join(name);
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&file, contents).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::new("Test", "test@example.com", &Time::new(epoch, 0)).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Create a local branch pointing at HEAD
pub fn branch_at_head(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch(name, &head, false).unwrap();
}
