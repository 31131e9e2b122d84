// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loading a Go package from disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tree_sitter::Tree;

use crate::build::BuildContext;
use crate::error::LoadError;
use crate::resolve::PackageScope;
use crate::syntax::{go_parser, parse};

/// One parsed member file of a package.
#[derive(Debug)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
}

impl SourceFile {
    /// The file name without its directory.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A Go package: its files, their syntax trees and the result of
/// resolving them together.
#[derive(Debug)]
pub struct Package {
    /// The path given on the command line.
    pub path: String,
    /// The import path, used in message references.
    pub pkgpath: String,
    /// The name from the `package` clause.
    pub pkgname: String,
    pub files: Vec<SourceFile>,
    pub scope: PackageScope,
}

impl Package {
    /// Load the package at `path`, relative to the current directory.
    ///
    /// The `path` is either a directory or an import path inside the
    /// module of the current directory.
    pub fn load(path: &str) -> Result<Package, LoadError> {
        let cwd = std::env::current_dir()?;
        Package::load_from(path, &cwd)
    }

    /// Like [`Package::load`], but resolving relative paths against `cwd`.
    pub fn load_from(path: &str, cwd: &Path) -> Result<Package, LoadError> {
        Package::load_for(path, cwd, &BuildContext::default())
    }

    /// Like [`Package::load_from`], selecting the member files for
    /// `context` instead of the host.
    pub fn load_for(path: &str, cwd: &Path, context: &BuildContext) -> Result<Package, LoadError> {
        let dir = locate_dir(path, cwd)?;
        let pkgpath = import_path(path, &dir);
        let mut sources = Vec::new();
        for file in go_files(&dir, context)? {
            let source = match fs::read_to_string(&file) {
                Ok(source) => source,
                Err(source) => return Err(LoadError::ReadError { path: file, source }),
            };
            match context.matches_source(&source) {
                Ok(true) => sources.push((file, source)),
                Ok(false) => log::debug!("Skipping {}: excluded by build constraints", file.display()),
                Err(line) => return Err(LoadError::InvalidConstraint { path: file, line }),
            }
        }
        if sources.is_empty() {
            return Err(LoadError::NoGoFiles(dir));
        }
        Package::from_sources(path, &pkgpath, sources)
    }

    /// Parse and resolve a package from in-memory sources.
    pub fn from_sources(
        path: &str,
        pkgpath: &str,
        sources: Vec<(PathBuf, String)>,
    ) -> Result<Package, LoadError> {
        let mut parser = go_parser()?;
        let mut files = Vec::with_capacity(sources.len());
        for (path, source) in sources {
            log::debug!("Parsing {}", path.display());
            let tree = parse(&mut parser, &path, &source)?;
            files.push(SourceFile { path, source, tree });
        }

        let scope = PackageScope::resolve(
            files
                .iter()
                .map(|file| (file.path.as_path(), file.source.as_str(), &file.tree)),
        )?;

        Ok(Package {
            path: String::from(path),
            pkgpath: String::from(pkgpath),
            pkgname: scope.name.clone(),
            files,
            scope,
        })
    }

    /// Absolute paths of the member files.
    pub fn files_abspath(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|file| file.path.as_path())
    }
}

/// Find the directory holding the package.
fn locate_dir(path: &str, cwd: &Path) -> Result<PathBuf, LoadError> {
    let candidate = cwd.join(path);
    if candidate.is_dir() {
        return Ok(fs::canonicalize(candidate)?);
    }

    // Not a directory: try it as an import path within the current module.
    if let Some((root, module)) = find_module(cwd) {
        let rest = if path == module {
            Some("")
        } else {
            path.strip_prefix(&module)
                .and_then(|rest| rest.strip_prefix('/'))
        };
        if let Some(rest) = rest {
            let dir = root.join(rest);
            if dir.is_dir() {
                return Ok(fs::canonicalize(dir)?);
            }
        }
    }
    Err(LoadError::PackageNotFound(String::from(path)))
}

/// The `.go` files in `dir` whose names fit `context`, sorted by name.
///
/// Test files and files starting with `_` or `.` are ignored, like the
/// `go` tool does. Build constraint lines are checked by the caller.
fn go_files(dir: &Path, context: &BuildContext) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let ignored = name.starts_with('_') || name.starts_with('.') || name.ends_with("_test.go");
        if path.is_file() && name.ends_with(".go") && !ignored && context.matches_file_name(&name) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The import path of the package in `dir`.
///
/// Inside a module this is the module path joined with the directory
/// relative to the module root. Otherwise the path argument is used
/// as given.
fn import_path(path: &str, dir: &Path) -> String {
    if let Some((root, module)) = find_module(dir) {
        if let Ok(rel) = dir.strip_prefix(&root) {
            let mut elements = vec![module];
            elements.extend(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned()),
            );
            return elements.join("/");
        }
    }
    let path = path.replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        path
    } else {
        String::from(trimmed)
    }
}

/// Find the closest `go.mod` in `dir` or its ancestors and return the
/// module root and module path.
fn find_module(dir: &Path) -> Option<(PathBuf, String)> {
    dir.ancestors().find_map(|dir| {
        let content = fs::read_to_string(dir.join("go.mod")).ok()?;
        let module = module_path(&content)?;
        Some((dir.to_path_buf(), module))
    })
}

/// Extract the module path from the content of a `go.mod` file.
fn module_path(go_mod: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();

    let re = RE.get_or_init(|| Regex::new(r#"(?m)^\s*module\s+"?([^\s"]+)"?"#).unwrap());
    re.captures(go_mod)
        .and_then(|captures| captures.get(1))
        .map(|m| String::from(m.as_str()))
}
