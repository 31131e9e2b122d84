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

//! Build constraints.
//!
//! A file in a package directory only belongs to the package when its
//! name and its `//go:build` (or legacy `// +build`) lines match the
//! target, the same way the `go` tool selects files.

use std::sync::OnceLock;

use regex::Regex;

/// Operating systems recognized in file name suffixes.
const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Operating systems matched by the `unix` tag.
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Architectures recognized in file name suffixes.
const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Newest `go1.N` release tag which is satisfied.
const GO_MINOR: u32 = 24;

/// The target files are selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Go name of the operating system, e.g. `linux` or `darwin`.
    pub goos: String,
    /// Go name of the architecture, e.g. `amd64` or `arm64`.
    pub goarch: String,
    pub cgo: bool,
}

impl Default for BuildContext {
    /// The host, unless `GOOS`, `GOARCH` or `CGO_ENABLED` say otherwise.
    fn default() -> Self {
        let host = BuildContext::host();
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        BuildContext {
            goos: var("GOOS").unwrap_or(host.goos),
            goarch: var("GOARCH").unwrap_or(host.goarch),
            cgo: var("CGO_ENABLED").map_or(host.cgo, |value| value == "1"),
        }
    }
}

impl BuildContext {
    pub fn new(goos: &str, goarch: &str) -> BuildContext {
        BuildContext {
            goos: String::from(goos),
            goarch: String::from(goarch),
            cgo: true,
        }
    }

    /// The machine this program runs on, with Go names.
    pub fn host() -> BuildContext {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            os => os,
        };
        let little = cfg!(target_endian = "little");
        let goarch = match std::env::consts::ARCH {
            "x86" => "386",
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "loongarch64" => "loong64",
            "mips" if little => "mipsle",
            "mips64" if little => "mips64le",
            "powerpc" => "ppc",
            "powerpc64" if little => "ppc64le",
            "powerpc64" => "ppc64",
            "wasm32" => "wasm",
            arch => arch,
        };
        BuildContext::new(goos, goarch)
    }

    /// Whether a single build tag is satisfied.
    pub fn matches_tag(&self, tag: &str) -> bool {
        static RELEASE: OnceLock<Regex> = OnceLock::new();

        let goos = self.goos.as_str();
        match tag {
            "gc" => true,
            "cgo" => self.cgo,
            "unix" => UNIX_OS.contains(&goos),
            "linux" if goos == "android" => true,
            "solaris" if goos == "illumos" => true,
            "darwin" if goos == "ios" => true,
            tag if tag == goos || tag == self.goarch => true,
            tag => {
                let re = RELEASE.get_or_init(|| Regex::new(r"^go1\.(\d+)$").unwrap());
                re.captures(tag)
                    .and_then(|captures| captures[1].parse::<u32>().ok())
                    .is_some_and(|minor| (1..=GO_MINOR).contains(&minor))
            }
        }
    }

    /// Whether the `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix of a
    /// file name matches. Names without such a suffix always match.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.strip_suffix(".go").unwrap_or(name);
        // The part before the first `_` is never a constraint: `linux.go`
        // is built everywhere.
        let Some((_, rest)) = stem.split_once('_') else {
            return true;
        };
        let elements = rest.split('_').collect::<Vec<_>>();
        match elements.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                self.matches_tag(os) && self.matches_tag(arch)
            }
            [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => {
                self.matches_tag(last)
            }
            _ => true,
        }
    }

    /// Whether the build constraints at the top of `source` are
    /// satisfied.
    ///
    /// A `//go:build` line takes precedence over `// +build` lines.
    /// Returns the offending line when a constraint cannot be parsed.
    pub fn matches_source(&self, source: &str) -> Result<bool, String> {
        let header = constraint_lines(source);
        let constraint = match header.go_build {
            Some(line) => Constraint::parse(line).ok_or_else(|| format!("//go:build {line}"))?,
            None => {
                let mut lines = Vec::with_capacity(header.plus_build.len());
                for line in header.plus_build {
                    lines.push(
                        Constraint::parse_plus_build(line)
                            .ok_or_else(|| format!("// +build {line}"))?,
                    );
                }
                match lines.into_iter().reduce(Constraint::and) {
                    Some(constraint) => constraint,
                    None => return Ok(true),
                }
            }
        };
        Ok(constraint.eval(&|tag: &str| self.matches_tag(tag)))
    }
}

/// A boolean expression over build tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    fn and(self, other: Constraint) -> Constraint {
        Constraint::And(Box::new(self), Box::new(other))
    }

    fn or(self, other: Constraint) -> Constraint {
        Constraint::Or(Box::new(self), Box::new(other))
    }

    /// Parse a `//go:build` expression, e.g. `linux && (amd64 || arm64)`.
    pub fn parse(expr: &str) -> Option<Constraint> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let constraint = parser.or()?;
        (parser.pos == parser.tokens.len()).then_some(constraint)
    }

    /// Parse the arguments of a `// +build` line: spaces separate
    /// alternatives, commas separate terms which must all hold.
    pub fn parse_plus_build(line: &str) -> Option<Constraint> {
        let mut alternatives = Vec::new();
        for field in line.split_whitespace() {
            let mut terms = Vec::new();
            for term in field.split(',') {
                let (negated, tag) = match term.strip_prefix('!') {
                    Some(tag) => (true, tag),
                    None => (false, term),
                };
                if !is_tag(tag) {
                    return None;
                }
                let tag = Constraint::Tag(String::from(tag));
                terms.push(if negated { Constraint::Not(Box::new(tag)) } else { tag });
            }
            alternatives.push(terms.into_iter().reduce(Constraint::and)?);
        }
        alternatives.into_iter().reduce(Constraint::or)
    }

    pub fn eval(&self, matches: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Constraint::Tag(tag) => matches(tag),
            Constraint::Not(inner) => !inner.eval(matches),
            Constraint::And(left, right) => left.eval(matches) && right.eval(matches),
            Constraint::Or(left, right) => left.eval(matches) || right.eval(matches),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn is_tag(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn tokenize(expr: &str) -> Option<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = expr.trim_start();
    while !rest.is_empty() {
        let (token, len) = if rest.starts_with("&&") {
            (Token::And, 2)
        } else if rest.starts_with("||") {
            (Token::Or, 2)
        } else if rest.starts_with('!') {
            (Token::Not, 1)
        } else if rest.starts_with('(') {
            (Token::Open, 1)
        } else if rest.starts_with(')') {
            (Token::Close, 1)
        } else {
            let len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(rest.len());
            if len == 0 {
                return None;
            }
            (Token::Tag(&rest[..len]), len)
        };
        tokens.push(token);
        rest = rest[len..].trim_start();
    }
    Some(tokens)
}

struct ExprParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn next_if(&mut self, token: Token<'a>) -> bool {
        let found = self.tokens.get(self.pos) == Some(&token);
        if found {
            self.pos += 1;
        }
        found
    }

    fn or(&mut self) -> Option<Constraint> {
        let mut constraint = self.and()?;
        while self.next_if(Token::Or) {
            constraint = constraint.or(self.and()?);
        }
        Some(constraint)
    }

    fn and(&mut self) -> Option<Constraint> {
        let mut constraint = self.not()?;
        while self.next_if(Token::And) {
            constraint = constraint.and(self.not()?);
        }
        Some(constraint)
    }

    fn not(&mut self) -> Option<Constraint> {
        if self.next_if(Token::Not) {
            return Some(Constraint::Not(Box::new(self.not()?)));
        }
        match self.tokens.get(self.pos)?.clone() {
            Token::Open => {
                self.pos += 1;
                let constraint = self.or()?;
                self.next_if(Token::Close).then_some(constraint)
            }
            Token::Tag(tag) => {
                self.pos += 1;
                Some(Constraint::Tag(String::from(tag)))
            }
            _ => None,
        }
    }
}

/// The constraint comments found before the `package` clause.
#[derive(Debug, Default, PartialEq, Eq)]
struct ConstraintLines<'a> {
    go_build: Option<&'a str>,
    plus_build: Vec<&'a str>,
}

fn constraint_lines(source: &str) -> ConstraintLines<'_> {
    let mut header = ConstraintLines::default();
    let mut in_block_comment = false;
    for line in source.lines() {
        let line = line.trim();
        if in_block_comment {
            in_block_comment = !line.contains("*/");
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix("//") {
            if let Some(expr) = comment.strip_prefix("go:build") {
                if header.go_build.is_none() && (expr.is_empty() || expr.starts_with([' ', '\t'])) {
                    header.go_build = Some(expr.trim());
                }
            } else if let Some(args) = comment.trim_start().strip_prefix("+build") {
                if args.is_empty() || args.starts_with([' ', '\t']) {
                    header.plus_build.push(args.trim());
                }
            }
            continue;
        }
        if line.starts_with("/*") {
            in_block_comment = !line.contains("*/");
            continue;
        }
        // The package clause, or anything else, ends the header.
        break;
    }
    header
}
