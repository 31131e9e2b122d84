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

//! Extract Gettext messages from Go packages.
//!
//! The functions here implement the `xgettext-go` binary: a Go
//! package is loaded and parsed, every call of the form
//! `X.Gettext("...")` or `X.PGettext("...", "...")` is found, and the
//! literal arguments are collected into a message template which can
//! be written as a GNU Gettext `.pot` file.
//!
//! Extraction is all or nothing: the first file which fails to parse
//! or the first message argument which is not a constant string stops
//! the run.

pub mod build;
pub mod catalog;
pub mod error;
pub mod eval;
pub mod package;
pub mod resolve;
pub mod scanner;
pub mod syntax;

use catalog::{Header, HeaderConfig, Template};
use package::Package;
use scanner::{CallResolver, ImportResolver, NameResolver, Scanner};

pub use error::{Error, Result};

/// Settings for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub header: HeaderConfig,
    /// Import paths of the Gettext package. When empty, calls are
    /// matched by name alone.
    pub import_paths: Vec<String>,
}

impl ExtractOptions {
    fn resolver(&self) -> Box<dyn CallResolver> {
        if self.import_paths.is_empty() {
            Box::new(NameResolver)
        } else {
            Box::new(ImportResolver::new(self.import_paths.iter().cloned()))
        }
    }
}

/// Build the message template for a loaded package.
///
/// # Examples
///
/// ```no_run
/// use xgettext_go::package::Package;
/// use xgettext_go::{generate, ExtractOptions};
///
/// let package = Package::load("./cmd/hello")?;
/// let template = generate(&package, &ExtractOptions::default())?;
/// for message in template.messages() {
///     println!("{}", message.msgid);
/// }
/// # Ok::<(), xgettext_go::Error>(())
/// ```
pub fn generate(package: &Package, options: &ExtractOptions) -> Result<Template> {
    let mut template = Template::new(Header::new(&package.pkgpath, &options.header));
    let resolver = options.resolver();
    Scanner::new(package, resolver.as_ref()).scan(&mut template)?;
    log::info!(
        "Extracted {} messages from {} files of {}",
        template.messages().len(),
        package.files.len(),
        package.pkgpath
    );
    Ok(template)
}

/// Load the package at `path` and build its message template.
pub fn extract(path: &str, options: &ExtractOptions) -> Result<Template> {
    let package = Package::load(path)?;
    generate(&package, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, ExtractError, LoadError};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn create_package(files: &[(&str, &str)]) -> anyhow::Result<(Package, tempfile::TempDir)> {
        let tmpdir = tempfile::tempdir()?;
        for (path, contents) in files {
            fs::write(tmpdir.path().join(path), contents)?;
        }
        let package = Package::load_from(".", tmpdir.path())?;
        Ok((package, tmpdir))
    }

    #[test]
    fn generate_template() -> anyhow::Result<()> {
        let (package, _tmpdir) = create_package(&[
            ("go.mod", "module example.com/greeter\n"),
            (
                "greet.go",
                "package greeter\n\
                 \n\
                 import \"github.com/chai2010/gettext-go\"\n\
                 \n\
                 func Greet() string {\n\
                 \treturn gettext.Gettext(\"Hello, %s!\")\n\
                 }\n\
                 \n\
                 func Menu() string {\n\
                 \treturn gettext.PGettext(\"menu\", \"Open\")\n\
                 }\n",
            ),
        ])?;

        let template = generate(&package, &ExtractOptions::default())?;
        assert_eq!(
            template.header.translator_comment.lines().next(),
            Some("package: example.com/greeter")
        );
        let catalog = template.to_catalog();
        assert_eq!(catalog.metadata.language, "zh_CN");
        assert_eq!(
            catalog
                .messages()
                .map(|msg| (msg.msgctxt(), msg.msgid(), msg.source()))
                .collect::<Vec<_>>(),
            vec![
                ("", "Hello, %s!", "example.com/greeter/greet.go:6"),
                ("menu", "Open", "example.com/greeter/greet.go:10"),
            ]
        );
        Ok(())
    }

    #[test]
    fn generate_with_import_paths() -> anyhow::Result<()> {
        let (package, _tmpdir) = create_package(&[(
            "main.go",
            "package main\n\
             \n\
             import \"example.com/i18n\"\n\
             \n\
             var a = i18n.Gettext(\"kept\")\n\
             var b = local.Gettext(dynamic)\n",
        )])?;

        let options = ExtractOptions {
            import_paths: vec![String::from("example.com/i18n")],
            ..ExtractOptions::default()
        };
        let template = generate(&package, &options)?;
        assert_eq!(template.messages().len(), 1);
        assert_eq!(template.messages()[0].msgid, "kept");
        Ok(())
    }

    #[test]
    fn generate_aborts_on_first_error() -> anyhow::Result<()> {
        let (package, _tmpdir) = create_package(&[(
            "main.go",
            "package main\n\
             \n\
             var a = i18n.Gettext(\"fine\")\n\
             var b = i18n.Gettext(fmt.Sprintf(\"%d\", 1))\n",
        )])?;

        let err = generate(&package, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Extract(ExtractError::Eval {
                source: EvalError::NotConstant { ref kind, .. },
                ..
            }) if kind == "call_expression"
        ));
        Ok(())
    }

    #[test]
    fn extract_missing_package() {
        let err = extract("/definitely/not/a/package", &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::PackageNotFound(_))));
    }
}
