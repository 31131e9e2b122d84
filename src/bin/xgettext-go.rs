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

//! `xgettext` for Go
//!
//! This program works like `xgettext`, meaning it will extract
//! translatable strings from a Go package. Every `Gettext` and
//! `PGettext` call with constant arguments becomes a message in a GNU
//! Gettext `.pot` file, named after the package unless `--output` is
//! given. The header entry is preceded by a comment naming the
//! package and the tool which generated the file.
//!
//! Member files are selected like the `go` tool does, for the host or
//! for the target named by `GOOS` and `GOARCH`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use xgettext_go::catalog::{write_pot, HeaderConfig};
use xgettext_go::package::Package;
use xgettext_go::{generate, ExtractOptions};

#[derive(Clone, Debug, Parser)]
#[command(name = "xgettext-go", version, about)]
struct Cli {
    /// Directory or import path of the Go package to scan.
    package: String,
    /// The file to write the template to [default: <package name>.pot].
    #[arg(short, long, value_name = "messages.pot")]
    output: Option<PathBuf>,
    /// Value of the Project-Id-Version header.
    #[arg(long, default_value = "1.0")]
    project_id_version: String,
    /// Value of the Language header.
    #[arg(long, default_value = "zh_CN")]
    language: String,
    /// Value of the Language-Team header.
    #[arg(long, default_value = "golang-china")]
    language_team: String,
    /// Only extract calls on packages imported from this path. Can be
    /// repeated. Without it, any `X.Gettext(...)` call is extracted.
    #[arg(long = "import-path", value_name = "PATH")]
    import_paths: Vec<String>,
}

impl Cli {
    fn options(&self) -> ExtractOptions {
        ExtractOptions {
            header: HeaderConfig {
                project_id_version: self.project_id_version.clone(),
                language: self.language.clone(),
                language_team: self.language_team.clone(),
            },
            import_paths: self.import_paths.clone(),
        }
    }

    fn output_path(&self, package: &Package) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => PathBuf::from(format!("{}.pot", package.pkgname)),
        }
    }
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .with_context(|| format!("Could not create {}", dir.display())),
        _ => Ok(()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "warn"));
    let cli = Cli::parse();

    let package = Package::load(&cli.package)
        .with_context(|| format!("Could not load package {}", cli.package))?;
    let template = generate(&package, &cli.options()).context("Extracting messages")?;

    let output_path = cli.output_path(&package);
    create_parent_dir(&output_path)?;
    write_pot(&template, &output_path)
        .with_context(|| format!("Writing messages to {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["xgettext-go", "./hello"]).unwrap();
        assert_eq!(cli.package, "./hello");
        assert_eq!(cli.output, None);
        assert_eq!(cli.options(), ExtractOptions::default());
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "xgettext-go",
            "-o",
            "po/messages.pot",
            "--language",
            "fr",
            "--language-team",
            "French",
            "--project-id-version",
            "Hello 2.0",
            "--import-path",
            "github.com/chai2010/gettext-go",
            "--import-path",
            "example.com/i18n",
            "example.com/hello",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("po/messages.pot")));
        let options = cli.options();
        assert_eq!(options.header.language, "fr");
        assert_eq!(options.header.language_team, "French");
        assert_eq!(options.header.project_id_version, "Hello 2.0");
        assert_eq!(
            options.import_paths,
            vec!["github.com/chai2010/gettext-go", "example.com/i18n"]
        );
    }

    #[test]
    fn cli_requires_package() {
        assert!(Cli::try_parse_from(["xgettext-go"]).is_err());
    }

    #[test]
    fn write_template_file() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        fs::write(
            tmpdir.path().join("hello.go"),
            "package hello\n\nvar s = gettext.Gettext(\"Hello\")\n",
        )?;
        let package = Package::load_from(".", tmpdir.path())?;
        let template = generate(&package, &ExtractOptions::default())?;

        let cli = Cli::try_parse_from(["xgettext-go", "."])?;
        assert_eq!(cli.output_path(&package), PathBuf::from("hello.pot"));

        let output_path = tmpdir.path().join("po").join("hello.pot");
        create_parent_dir(&output_path)?;
        write_pot(&template, &output_path)?;

        let written = fs::read_to_string(&output_path)?;
        assert!(written.starts_with("# package: .\n"), "{written}");
        assert!(written.contains("msgid \"Hello\""), "{written}");
        assert!(written.contains("#, go-format"), "{written}");
        assert!(written.contains("#: ./hello.go:3"), "{written}");
        Ok(())
    }
}
