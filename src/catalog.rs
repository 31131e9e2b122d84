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

//! The message template built by the scanner and its conversion into a
//! `polib` catalog.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use polib::catalog::Catalog;
use polib::po_file;
use polib::message::{Message, MessageFlags};
use polib::metadata::CatalogMetadata;

/// Flag attached to every extracted message.
pub const GO_FORMAT: &str = "go-format";

/// Header values which can be changed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    pub project_id_version: String,
    pub language: String,
    pub language_team: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            project_id_version: String::from("1.0"),
            language: String::from("zh_CN"),
            language_team: String::from("golang-china"),
        }
    }
}

/// The header entry of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub translator_comment: String,
    pub project_id_version: String,
    pub pot_creation_date: String,
    pub language_team: String,
    pub language: String,
    pub mime_version: String,
    pub content_type: String,
    pub content_transfer_encoding: String,
}

impl Header {
    /// Build the header for the package `pkgpath`, stamped with the
    /// current local time.
    pub fn new(pkgpath: &str, config: &HeaderConfig) -> Header {
        let now = chrono::Local::now();
        Header {
            translator_comment: format!(
                "package: {pkgpath}\n\nGenerated by {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            project_id_version: config.project_id_version.clone(),
            pot_creation_date: now.format("%Y-%m-%d %H:%M%z").to_string(),
            language_team: config.language_team.clone(),
            language: config.language.clone(),
            mime_version: String::from("1.0"),
            content_type: String::from("text/plain; charset=UTF-8"),
            content_transfer_encoding: String::from("8bit"),
        }
    }

    /// The translator comment as `#` comment lines, one per line of
    /// [`Header::translator_comment`].
    pub fn comment_lines(&self) -> String {
        self.translator_comment
            .lines()
            .map(|line| match line {
                "" => String::from("#\n"),
                line => format!("# {line}\n"),
            })
            .collect()
    }

    fn to_metadata(&self) -> CatalogMetadata {
        let mut metadata = CatalogMetadata::new();
        metadata.project_id_version = self.project_id_version.clone();
        metadata.pot_creation_date = self.pot_creation_date.clone();
        metadata.language_team = self.language_team.clone();
        metadata.language = self.language.clone();
        metadata.mime_version = self.mime_version.clone();
        metadata.content_type = self.content_type.clone();
        metadata.content_transfer_encoding = self.content_transfer_encoding.clone();
        metadata
    }
}

/// Where a message was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// `<import path>/<file name>`.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One extracted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Empty when the message has no context.
    pub msgctxt: String,
    pub msgid: String,
    pub references: Vec<Reference>,
    pub flags: Vec<String>,
}

impl MessageEntry {
    /// A message found at `reference`, flagged as `go-format`.
    pub fn new(msgctxt: String, msgid: String, reference: Reference) -> MessageEntry {
        MessageEntry {
            msgctxt,
            msgid,
            references: vec![reference],
            flags: vec![String::from(GO_FORMAT)],
        }
    }
}

/// A message template: a header and the messages in the order they
/// were found. Every call site gets its own entry; duplicates are only
/// merged by [`Template::to_catalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub header: Header,
    messages: Vec<MessageEntry>,
}

impl Template {
    pub fn new(header: Header) -> Template {
        Template {
            header,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: MessageEntry) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[MessageEntry] {
        &self.messages
    }

    /// Convert the template into a `polib` catalog ready to be written.
    ///
    /// Messages with the same context and id are merged into one
    /// catalog message listing every distinct reference in the order
    /// they were found.
    pub fn to_catalog(&self) -> Catalog {
        let mut catalog = Catalog::new(self.header.to_metadata());
        for entry in &self.messages {
            add_message(&mut catalog, entry);
        }
        catalog
    }
}

/// Write `template` as a `.pot` file at `path`.
///
/// `polib` has no place for the comment above the header entry, so the
/// translator comment is put in front of what `polib` writes.
pub fn write_pot(template: &Template, path: &Path) -> io::Result<()> {
    po_file::write(&template.to_catalog(), path)?;
    let body = fs::read_to_string(path)?;
    let mut content = template.header.comment_lines();
    content.push_str(body.trim_start_matches('\n'));
    fs::write(path, content)
}

fn add_message(catalog: &mut Catalog, entry: &MessageEntry) {
    let msgctxt = (!entry.msgctxt.is_empty()).then_some(entry.msgctxt.as_str());
    let mut sources = match catalog.find_message(msgctxt, &entry.msgid, None) {
        Some(msg) => msg.source().lines().map(String::from).collect::<Vec<_>>(),
        None => Vec::new(),
    };
    for reference in &entry.references {
        let source = reference.to_string();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    let mut flags = MessageFlags::new();
    for flag in &entry.flags {
        flags.add_flag(flag);
    }

    let message = Message::build_singular()
        .with_source(sources.join("\n"))
        .with_flags(flags)
        .with_msgctxt(entry.msgctxt.clone())
        .with_msgid(entry.msgid.clone())
        .done();
    catalog.append_or_update(message);
}
