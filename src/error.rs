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

use std::path::PathBuf;

use thiserror::Error;

/// Failures while locating, parsing or resolving a package.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Package not found: {0}")]
    PackageNotFound(String),
    #[error("No Go files in {0} for this target")]
    NoGoFiles(PathBuf),
    #[error("{path}: invalid build constraint {line:?}")]
    InvalidConstraint { path: PathBuf, line: String },
    #[error("Could not load the Go grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
    #[error("Could not parse {0}")]
    ParseFailed(PathBuf),
    /// Either the file is not valid Go or it uses a construct the Go
    /// grammar does not know yet, such as generic type aliases.
    #[error(
        "{path}:{line}:{column}: cannot parse near {near:?} \
         (syntax error, or a Go construct the parser does not support)"
    )]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        near: String,
    },
    #[error("{path}: missing package clause")]
    MissingPackageClause { path: PathBuf },
    #[error("{path}: found package {found}, expected {expected}")]
    PackageMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },
    #[error("{location}: {name} redeclared in this block (previous declaration at {previous})")]
    Redeclared {
        name: String,
        location: String,
        previous: String,
    },
}

/// Failures while reducing an argument expression to a string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EvalError {
    #[error("unknown type: {kind} {text:?}")]
    NotConstant { kind: String, text: String },
    #[error("cannot join an empty fragment")]
    EmptyOperand,
}

/// Failures at a recognized translation call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("{reference}: {callee}: {source}")]
    Eval {
        reference: String,
        callee: String,
        source: EvalError,
    },
    #[error("{reference}: {callee} expects at least {expected} argument(s), found {found}")]
    MissingArgument {
        reference: String,
        callee: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

pub type Result<T> = std::result::Result<T, Error>;
