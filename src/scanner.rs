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

//! Finding calls to the Gettext API and turning them into messages.

use std::collections::HashSet;
use std::fmt;

use crate::catalog::{MessageEntry, Reference, Template};
use crate::error::ExtractError;
use crate::eval::eval_string;
use crate::package::{Package, SourceFile};
use crate::resolve::FileScope;
use crate::syntax::{for_each_call, CallSite};

/// The functions of the Gettext API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GettextFn {
    /// `Gettext(msgid string) string`
    Gettext,
    /// `PGettext(msgctxt, msgid string) string`
    PGettext,
    /// `NGettext(msgid, msgidPlural string, n int) string`
    NGettext,
    /// `PNGettext(msgctxt, msgid, msgidPlural string, n int) string`
    PNGettext,
    /// `DGettext(domain, msgid string) string`
    DGettext,
    /// `DPGettext(domain, msgctxt, msgid string) string`
    DPGettext,
    /// `DNGettext(domain, msgid, msgidPlural string, n int) string`
    DNGettext,
    /// `DPNGettext(domain, msgctxt, msgid, msgidPlural string, n int) string`
    DPNGettext,
}

impl GettextFn {
    pub fn from_name(name: &str) -> Option<GettextFn> {
        let function = match name {
            "Gettext" => GettextFn::Gettext,
            "PGettext" => GettextFn::PGettext,
            "NGettext" => GettextFn::NGettext,
            "PNGettext" => GettextFn::PNGettext,
            "DGettext" => GettextFn::DGettext,
            "DPGettext" => GettextFn::DPGettext,
            "DNGettext" => GettextFn::DNGettext,
            "DPNGettext" => GettextFn::DPNGettext,
            _ => return None,
        };
        Some(function)
    }
}

impl fmt::Display for GettextFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Decides which Gettext function, if any, a call refers to.
pub trait CallResolver {
    fn resolve(&self, call: &CallSite<'_>, scope: &FileScope) -> Option<GettextFn>;
}

/// Match calls by the selected name alone.
///
/// Any `X.Gettext(...)` is taken to be a Gettext call, whatever `X` is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl CallResolver for NameResolver {
    fn resolve(&self, call: &CallSite<'_>, _scope: &FileScope) -> Option<GettextFn> {
        GettextFn::from_name(call.name)
    }
}

/// Match calls by name, but only when the receiver is a package
/// imported from one of the given import paths.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    import_paths: HashSet<String>,
}

impl ImportResolver {
    pub fn new<I, S>(import_paths: I) -> ImportResolver
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ImportResolver {
            import_paths: import_paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl CallResolver for ImportResolver {
    fn resolve(&self, call: &CallSite<'_>, scope: &FileScope) -> Option<GettextFn> {
        let function = GettextFn::from_name(call.name)?;
        let path = scope.import_path(call.receiver_ident()?)?;
        self.import_paths.contains(path).then_some(function)
    }
}

/// Walks the files of a package and collects messages.
pub struct Scanner<'a> {
    package: &'a Package,
    resolver: &'a dyn CallResolver,
}

impl<'a> Scanner<'a> {
    pub fn new(package: &'a Package, resolver: &'a dyn CallResolver) -> Scanner<'a> {
        Scanner { package, resolver }
    }

    /// Add a message to `template` for every Gettext call in the
    /// package.
    ///
    /// Stops at the first call whose arguments are not constant
    /// strings.
    pub fn scan(&self, template: &mut Template) -> Result<(), ExtractError> {
        let default_scope = FileScope::default();
        for (idx, file) in self.package.files.iter().enumerate() {
            log::debug!("Scanning {}", file.path.display());
            let scope = self.package.scope.files.get(idx).unwrap_or(&default_scope);
            for_each_call(&file.tree, &file.source, |call| {
                match self.resolver.resolve(&call, scope) {
                    Some(function) => self.process_call(file, &call, function, template),
                    None => Ok(()),
                }
            })?;
        }
        Ok(())
    }

    fn process_call(
        &self,
        file: &SourceFile,
        call: &CallSite<'_>,
        function: GettextFn,
        template: &mut Template,
    ) -> Result<(), ExtractError> {
        let reference = Reference {
            file: format!("{}/{}", self.package.pkgpath, file.basename()),
            line: call.line,
        };
        let (msgctxt, msgid) = match function {
            GettextFn::Gettext => (String::new(), eval_argument(call, function, &reference, 0)?),
            GettextFn::PGettext => (
                eval_argument(call, function, &reference, 0)?,
                eval_argument(call, function, &reference, 1)?,
            ),
            _ => {
                log::debug!("{reference}: skipping {function}, not supported yet");
                return Ok(());
            }
        };
        template.push(MessageEntry::new(msgctxt, msgid, reference));
        Ok(())
    }
}

fn eval_argument(
    call: &CallSite<'_>,
    function: GettextFn,
    reference: &Reference,
    idx: usize,
) -> Result<String, ExtractError> {
    let Some(expr) = call.argument(idx) else {
        return Err(ExtractError::MissingArgument {
            reference: reference.to_string(),
            callee: function.to_string(),
            expected: idx + 1,
            found: call.arguments.len(),
        });
    };
    eval_string(&expr).map_err(|source| ExtractError::Eval {
        reference: reference.to_string(),
        callee: function.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Header, HeaderConfig, GO_FORMAT};
    use crate::error::EvalError;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn load_package(files: &[(&str, &str)]) -> anyhow::Result<(Package, tempfile::TempDir)> {
        let tmpdir = tempfile::tempdir()?;
        fs::write(tmpdir.path().join("go.mod"), "module example.com/app\n")?;
        fs::create_dir(tmpdir.path().join("hello"))?;
        for (path, contents) in files {
            fs::write(tmpdir.path().join("hello").join(path), contents)?;
        }
        let package = Package::load_from("hello", tmpdir.path())?;
        Ok((package, tmpdir))
    }

    fn scan_with(
        files: &[(&str, &str)],
        resolver: &dyn CallResolver,
    ) -> anyhow::Result<Result<Vec<MessageEntry>, ExtractError>> {
        let (package, _tmpdir) = load_package(files)?;
        let mut template = Template::new(Header::new(&package.pkgpath, &HeaderConfig::default()));
        let result = Scanner::new(&package, resolver)
            .scan(&mut template)
            .map(|()| template.messages().to_vec());
        Ok(result)
    }

    fn scan(files: &[(&str, &str)]) -> anyhow::Result<Result<Vec<MessageEntry>, ExtractError>> {
        scan_with(files, &NameResolver)
    }

    fn summary(messages: &[MessageEntry]) -> Vec<(&str, &str, String)> {
        messages
            .iter()
            .map(|msg| {
                let references = msg
                    .references
                    .iter()
                    .map(Reference::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                (msg.msgctxt.as_str(), msg.msgid.as_str(), references)
            })
            .collect()
    }

    #[test]
    fn scan_gettext() -> anyhow::Result<()> {
        let messages = scan(&[(
            "main.go",
            "package main\n\
             \n\
             import \"github.com/chai2010/gettext-go\"\n\
             \n\
             func main() {\n\
             \tprintln(gettext.Gettext(\"hello\"))\n\
             }\n",
        )])??;
        assert_eq!(
            messages,
            vec![MessageEntry {
                msgctxt: String::new(),
                msgid: String::from("hello"),
                references: vec![Reference {
                    file: String::from("example.com/app/hello/main.go"),
                    line: 6,
                }],
                flags: vec![String::from(GO_FORMAT)],
            }]
        );
        Ok(())
    }

    #[test]
    fn scan_pgettext() -> anyhow::Result<()> {
        let messages = scan(&[(
            "menu.go",
            "package main\n\
             \n\
             var label = gettext.PGettext(\"ctx\", \"msg\")\n",
        )])??;
        assert_eq!(
            summary(&messages),
            vec![("ctx", "msg", String::from("example.com/app/hello/menu.go:3"))]
        );
        Ok(())
    }

    #[test]
    fn scan_concatenation() -> anyhow::Result<()> {
        let messages = scan(&[(
            "main.go",
            "package main\n\
             \n\
             var s = gettext.Gettext(\"ab\" + \"cd\")\n",
        )])??;
        assert_eq!(messages[0].msgid, "ad");
        Ok(())
    }

    #[test]
    fn scan_multiline_call_uses_start_line() -> anyhow::Result<()> {
        let messages = scan(&[(
            "main.go",
            "package main\n\
             \n\
             var s = gettext.PGettext(\n\
             \t\"ctx\",\n\
             \t\"msg\",\n\
             )\n",
        )])??;
        assert_eq!(messages[0].references[0].line, 3);
        Ok(())
    }

    #[test]
    fn scan_keeps_duplicates_and_file_order() -> anyhow::Result<()> {
        let messages = scan(&[
            (
                "b.go",
                "package main\n\nvar b = i18n.Gettext(\"same\")\n",
            ),
            (
                "a.go",
                "package main\n\
                 \n\
                 var a1 = i18n.Gettext(\"same\")\n\
                 var a2 = i18n.Gettext(\"other\")\n",
            ),
        ])??;
        assert_eq!(
            summary(&messages),
            vec![
                ("", "same", String::from("example.com/app/hello/a.go:3")),
                ("", "other", String::from("example.com/app/hello/a.go:4")),
                ("", "same", String::from("example.com/app/hello/b.go:3")),
            ]
        );
        Ok(())
    }

    #[test]
    fn scan_skips_unsupported_variants() -> anyhow::Result<()> {
        let messages = scan(&[(
            "main.go",
            "package main\n\
             \n\
             func f(n int) {\n\
             \tgettext.NGettext(\"one\", \"many\", n)\n\
             \tgettext.PNGettext(\"c\", \"one\", \"many\", n)\n\
             \tgettext.DGettext(\"dom\", \"msg\")\n\
             \tgettext.DPGettext(\"dom\", \"c\", \"msg\")\n\
             \tgettext.DNGettext(\"dom\", \"one\", \"many\", n)\n\
             \tgettext.DPNGettext(\"dom\", \"c\", \"one\", \"many\", n)\n\
             \tgettext.NGettext(variable, other, n)\n\
             }\n",
        )])??;
        assert!(messages.is_empty());
        Ok(())
    }

    #[test]
    fn scan_ignores_other_calls() -> anyhow::Result<()> {
        let messages = scan(&[(
            "main.go",
            "package main\n\
             \n\
             func f() {\n\
             \tfmt.Println(msg)\n\
             \tGettext(\"not a selector\")\n\
             \tgettext.Gettextf(\"close, but no\")\n\
             }\n",
        )])??;
        assert!(messages.is_empty());
        Ok(())
    }

    #[test]
    fn scan_matches_any_receiver() -> anyhow::Result<()> {
        let messages = scan(&[(
            "main.go",
            "package main\n\
             \n\
             type T struct{}\n\
             \n\
             func (T) Gettext(s string) string { return s }\n\
             \n\
             func f(t T) {\n\
             \tt.Gettext(\"method\")\n\
             \tnewT().Gettext(\"chained\")\n\
             }\n",
        )])??;
        assert_eq!(
            messages
                .iter()
                .map(|msg| msg.msgid.as_str())
                .collect::<Vec<_>>(),
            vec!["method", "chained"]
        );
        Ok(())
    }

    #[test]
    fn scan_fails_on_variable() -> anyhow::Result<()> {
        let result = scan(&[(
            "main.go",
            "package main\n\
             \n\
             func f(msg string) {\n\
             \tgettext.Gettext(\"before\")\n\
             \tgettext.Gettext(msg)\n\
             \tgettext.Gettext(\"after\")\n\
             }\n",
        )])?;
        assert_eq!(
            result,
            Err(ExtractError::Eval {
                reference: String::from("example.com/app/hello/main.go:5"),
                callee: String::from("Gettext"),
                source: EvalError::NotConstant {
                    kind: String::from("identifier"),
                    text: String::from("msg"),
                },
            })
        );
        Ok(())
    }

    #[test]
    fn scan_fails_on_nested_call() -> anyhow::Result<()> {
        let result = scan(&[(
            "main.go",
            "package main\n\
             \n\
             var s = gettext.Gettext(gettext.Gettext(\"inner\"))\n",
        )])?;
        assert!(matches!(
            result,
            Err(ExtractError::Eval {
                source: EvalError::NotConstant { .. },
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn scan_fails_on_missing_argument() -> anyhow::Result<()> {
        let result = scan(&[(
            "main.go",
            "package main\n\nvar s = gettext.PGettext(\"ctx\")\n",
        )])?;
        assert_eq!(
            result,
            Err(ExtractError::MissingArgument {
                reference: String::from("example.com/app/hello/main.go:3"),
                callee: String::from("PGettext"),
                expected: 2,
                found: 1,
            })
        );
        Ok(())
    }

    #[test]
    fn import_resolver_checks_receiver() -> anyhow::Result<()> {
        let resolver = ImportResolver::new(["github.com/chai2010/gettext-go"]);
        let messages = scan_with(
            &[
                (
                    "a.go",
                    "package main\n\
                     \n\
                     import (\n\
                     \t\"github.com/chai2010/gettext-go\"\n\
                     \ttr \"github.com/chai2010/gettext-go\"\n\
                     )\n\
                     \n\
                     func f(t T) {\n\
                     \tgettext.Gettext(\"default name\")\n\
                     \ttr.Gettext(\"alias\")\n\
                     \tt.Gettext(msg)\n\
                     \tother.Gettext(msg)\n\
                     }\n",
                ),
                (
                    "b.go",
                    "package main\n\
                     \n\
                     func g() {\n\
                     \tgettext.Gettext(msg)\n\
                     }\n",
                ),
            ],
            &resolver,
        )??;
        assert_eq!(
            messages
                .iter()
                .map(|msg| msg.msgid.as_str())
                .collect::<Vec<_>>(),
            vec!["default name", "alias"]
        );
        Ok(())
    }

    #[test]
    fn gettext_fn_from_name() {
        assert_eq!(GettextFn::from_name("Gettext"), Some(GettextFn::Gettext));
        assert_eq!(GettextFn::from_name("DPNGettext"), Some(GettextFn::DPNGettext));
        assert_eq!(GettextFn::from_name("gettext"), None);
        assert_eq!(GettextFn::PGettext.to_string(), "PGettext");
    }
}
