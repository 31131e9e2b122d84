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

//! Package-level name resolution.
//!
//! Dependencies are never loaded: we only check what can be checked
//! from the package's own files (one package name, no duplicate
//! package-level declarations) and record the import bindings of each
//! file so that callers can tell which package a qualified call refers
//! to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Tree};

use crate::error::LoadError;
use crate::syntax::node_text;

/// How an import is bound in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import "fmt"` or `import f "fmt"`.
    Named(String),
    /// `import . "fmt"`.
    Dot,
    /// `import _ "fmt"`.
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: ImportName,
    pub path: String,
    pub line: usize,
}

/// The imports of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScope {
    pub imports: Vec<Import>,
}

impl FileScope {
    /// The import path bound to the local `name`, if any.
    pub fn import_path(&self, name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|import| matches!(&import.name, ImportName::Named(n) if n == name))
            .map(|import| import.path.as_str())
    }
}

/// What a package-level name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Func,
    Method,
    Type,
    Var,
    Const,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub kind: DeclKind,
    pub path: PathBuf,
    pub line: usize,
}

/// The result of resolving all files of a package together.
#[derive(Debug, Clone, Default)]
pub struct PackageScope {
    pub name: String,
    /// Package-level declarations. Methods are keyed as `Recv.Name`.
    pub decls: HashMap<String, Decl>,
    /// One entry per file, in load order.
    pub files: Vec<FileScope>,
}

impl PackageScope {
    /// Resolve the parsed `files` of one package.
    pub fn resolve<'a, I>(files: I) -> Result<PackageScope, LoadError>
    where
        I: IntoIterator<Item = (&'a Path, &'a str, &'a Tree)>,
    {
        let mut scope = PackageScope::default();
        for (path, source, tree) in files {
            let root = tree.root_node();
            let name = package_name(root, source).ok_or_else(|| LoadError::MissingPackageClause {
                path: path.to_path_buf(),
            })?;
            if scope.files.is_empty() {
                scope.name = name.to_owned();
            } else if scope.name != name {
                return Err(LoadError::PackageMismatch {
                    path: path.to_path_buf(),
                    found: name.to_owned(),
                    expected: scope.name.clone(),
                });
            }

            let mut imports = Vec::new();
            let mut cursor = root.walk();
            for child in root.named_children(&mut cursor) {
                match child.kind() {
                    "import_declaration" => collect_imports(child, source, &mut imports),
                    _ => {
                        for (name, kind, line) in declared_names(child, source) {
                            scope.declare(name, kind, path, line)?;
                        }
                    }
                }
            }
            scope.files.push(FileScope { imports });
        }
        Ok(scope)
    }

    fn declare(&mut self, name: String, kind: DeclKind, path: &Path, line: usize) -> Result<(), LoadError> {
        if name == "_" || (kind == DeclKind::Func && name == "init") {
            return Ok(());
        }
        if let Some(previous) = self.decls.get(&name) {
            return Err(LoadError::Redeclared {
                location: format!("{}:{}", path.display(), line),
                previous: format!("{}:{}", previous.path.display(), previous.line),
                name,
            });
        }
        let decl = Decl {
            kind,
            path: path.to_path_buf(),
            line,
        };
        self.decls.insert(name, decl);
        Ok(())
    }
}

/// The name in the `package` clause.
pub fn package_name<'a>(root: Node<'_>, source: &'a str) -> Option<&'a str> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_clause")?;
    let mut cursor = clause.walk();
    let ident = clause
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_identifier")?;
    Some(node_text(ident, source))
}

fn collect_imports(node: Node<'_>, source: &str, imports: &mut Vec<Import>) {
    if node.kind() == "import_spec" {
        let Some(path) = node.child_by_field_name("path") else {
            return;
        };
        let path = node_text(path, source).trim_matches(|c| c == '"' || c == '`');
        let name = match node.child_by_field_name("name") {
            Some(name) if name.kind() == "dot" => ImportName::Dot,
            Some(name) if name.kind() == "blank_identifier" => ImportName::Blank,
            Some(name) => ImportName::Named(node_text(name, source).to_owned()),
            None => ImportName::Named(assumed_package_name(path)),
        };
        imports.push(Import {
            name,
            path: path.to_owned(),
            line: node.start_position().row + 1,
        });
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_imports(child, source, imports);
    }
}

/// The package name conventionally used for an import path.
///
/// This is the last path element, skipping a trailing major version
/// such as `v2`, without a `go-` prefix and cut at the first
/// character which cannot appear in an identifier.
///
/// ```
/// use xgettext_go::resolve::assumed_package_name;
///
/// assert_eq!(assumed_package_name("github.com/chai2010/gettext-go"), "gettext");
/// assert_eq!(assumed_package_name("example.com/go-yaml/v3"), "yaml");
/// ```
pub fn assumed_package_name(import_path: &str) -> String {
    let mut elements = import_path.rsplit('/');
    let mut base = elements.next().unwrap_or(import_path);
    let is_major_version = base.len() > 1
        && base.starts_with('v')
        && base[1..].chars().all(|c| c.is_ascii_digit());
    if is_major_version {
        if let Some(parent) = elements.next() {
            base = parent;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    base.chars()
        .take_while(|&c| c == '_' || c.is_alphanumeric())
        .collect()
}

/// Names declared at package level by a top-level node.
fn declared_names(node: Node<'_>, source: &str) -> Vec<(String, DeclKind, usize)> {
    let line = |node: Node<'_>| node.start_position().row + 1;
    match node.kind() {
        "function_declaration" => node
            .child_by_field_name("name")
            .map(|name| vec![(node_text(name, source).to_owned(), DeclKind::Func, line(name))])
            .unwrap_or_default(),
        "method_declaration" => {
            let Some(name) = node.child_by_field_name("name") else {
                return Vec::new();
            };
            let receiver = node
                .child_by_field_name("receiver")
                .and_then(|receiver| receiver_type(receiver, source))
                .unwrap_or_default();
            vec![(
                format!("{receiver}.{}", node_text(name, source)),
                DeclKind::Method,
                line(name),
            )]
        }
        "type_declaration" => specs(node, &["type_spec", "type_alias"])
            .into_iter()
            .filter_map(|spec| spec.child_by_field_name("name"))
            .map(|name| (node_text(name, source).to_owned(), DeclKind::Type, line(name)))
            .collect(),
        "var_declaration" | "const_declaration" => {
            let kind = if node.kind() == "var_declaration" {
                DeclKind::Var
            } else {
                DeclKind::Const
            };
            specs(node, &["var_spec", "const_spec"])
                .into_iter()
                .flat_map(|spec| {
                    let mut cursor = spec.walk();
                    let names = spec
                        .children_by_field_name("name", &mut cursor)
                        .map(|name| (node_text(name, source).to_owned(), kind, line(name)))
                        .collect::<Vec<_>>();
                    names
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

/// All descendants of `node` with one of the given kinds, not looking
/// inside matches.
fn specs<'tree>(node: Node<'tree>, kinds: &[&str]) -> Vec<Node<'tree>> {
    let mut found = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            found.push(child);
        } else {
            found.extend(specs(child, kinds));
        }
    }
    found
}

/// The base type name of a method receiver: `(s *Server[T])` gives
/// `Server`.
fn receiver_type(receiver: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = receiver.walk();
    let param = receiver
        .named_children(&mut cursor)
        .find(|child| child.kind() == "parameter_declaration")?;
    let ty = node_text(param.child_by_field_name("type")?, source);
    let ty = ty.trim_start_matches(|c: char| c == '*' || c == '(' || c.is_whitespace());
    let end = ty
        .find(|c: char| c == '[' || c == ')' || c.is_whitespace())
        .unwrap_or(ty.len());
    Some(ty[..end].to_owned())
}
