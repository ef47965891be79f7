//! Source unit writing and session bookkeeping.
//!
//! Turns raw source text into a file under the workspace source root. Names
//! are recovered by a line scan rather than a parse; the compiler is what
//! ultimately decides whether the text is valid.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoContext, Result};

/// Extension given to every written source unit.
pub const SOURCE_EXTENSION: &str = "java";

const TYPE_KEYWORDS: &[&str] = &["class", "interface", "@interface", "enum", "record"];

/// Decides whether a source text defines the program entry point.
pub trait EntryPointDetector: Send + Sync {
    fn has_entry_point(&self, source: &str) -> bool;
}

/// Literal substring match on the `main` method signature.
///
/// Matches `public static void main(` or `public static void main (`, with
/// exactly that spacing. A string literal or comment containing the text
/// also matches, and a `final static` ordering or extra whitespace does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct MainSignature;

impl EntryPointDetector for MainSignature {
    fn has_entry_point(&self, source: &str) -> bool {
        source.contains("public static void main(") || source.contains("public static void main (")
    }
}

/// A source text that has been written to disk.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    text: String,
    package: String,
    simple_name: String,
    entry_point: bool,
    path: PathBuf,
}

impl SourceUnit {
    /// The raw text as submitted.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Declared package, empty for the default package.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Name of the first declared type.
    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    /// `package.SimpleName`, or just `SimpleName` in the default package.
    pub fn fully_qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.simple_name.clone()
        } else {
            format!("{}.{}", self.package, self.simple_name)
        }
    }

    /// Whether the entry-point detector matched this text.
    pub fn has_entry_point(&self) -> bool {
        self.entry_point
    }

    /// Where the text was written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Per-run bookkeeping of written units.
///
/// Created fresh for every pipeline run and never shared between runs.
#[derive(Debug, Default)]
pub struct SandboxSession {
    units: Vec<SourceUnit>,
    first_unit_name: Option<String>,
    entry_unit_name: Option<String>,
}

impl SandboxSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written unit.
    ///
    /// The first unit recorded names the session; every unit carrying an
    /// entry point replaces the previous entry unit, so the last one wins.
    pub fn record(&mut self, unit: SourceUnit) {
        let fqn = unit.fully_qualified_name();

        if self.first_unit_name.is_none() {
            self.first_unit_name = Some(fqn.clone());
        }
        if unit.has_entry_point() {
            self.entry_unit_name = Some(fqn);
        }

        self.units.push(unit);
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// Paths of all written units, in submission order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.units.iter().map(|u| u.path.clone()).collect()
    }

    pub fn first_unit_name(&self) -> Option<&str> {
        self.first_unit_name.as_deref()
    }

    pub fn entry_unit_name(&self) -> Option<&str> {
        self.entry_unit_name.as_deref()
    }
}

/// Writes source texts under a source root.
pub struct SourceUnitWriter<'a> {
    source_dir: &'a Path,
    detector: &'a dyn EntryPointDetector,
}

impl<'a> SourceUnitWriter<'a> {
    pub fn new(source_dir: &'a Path, detector: &'a dyn EntryPointDetector) -> Self {
        Self {
            source_dir,
            detector,
        }
    }

    /// Derive names for `text`, write it, and describe the result.
    ///
    /// The file lands at `<source_dir>/<package path>/<SimpleName>.java`.
    pub fn write(&self, text: &str) -> Result<SourceUnit> {
        let package = package_of(text)?;
        let simple_name = type_name_of(text)?;
        let entry_point = self.detector.has_entry_point(text);

        let mut dir = self.source_dir.to_path_buf();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        fs::create_dir_all(&dir).at(&dir)?;

        let path = dir.join(format!("{simple_name}.{SOURCE_EXTENSION}"));
        fs::write(&path, text).at(&path)?;

        Ok(SourceUnit {
            text: text.to_string(),
            package,
            simple_name,
            entry_point,
            path,
        })
    }
}

/// Package named by the first `package ...;` line, or empty.
pub fn package_of(source: &str) -> Result<String> {
    for line in source.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("package ") else {
            continue;
        };
        let Some((name, _)) = rest.split_once(';') else {
            return Err(Error::Parse(format!("unterminated package declaration: {line}")));
        };

        let name = name.trim();
        if name.is_empty() || !name.split('.').all(is_identifier) {
            return Err(Error::Parse(format!("invalid package name: {name}")));
        }
        return Ok(name.to_string());
    }

    Ok(String::new())
}

/// Name of the first declared class, interface, enum or record.
pub fn type_name_of(source: &str) -> Result<String> {
    let mut in_comment = false;

    for raw in source.lines() {
        let line = strip_comments(raw, &mut in_comment);
        let line = line.trim();

        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if !TYPE_KEYWORDS.contains(&token) {
                continue;
            }
            let name: String = tokens
                .next()
                .unwrap_or_default()
                .chars()
                .take_while(|&c| is_identifier_char(c))
                .collect();

            if is_identifier(&name) {
                return Ok(name);
            }
            return Err(Error::Parse(format!("missing type name after `{token}`: {line}")));
        }
    }

    Err(Error::Parse(
        "no class, interface, enum or record declaration found".to_string(),
    ))
}

/// Code left on `line` once comments are removed.
///
/// `in_comment` carries an open `/* ... */` block across lines.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut code = String::new();
    let mut rest = line;

    loop {
        if *in_comment {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    *in_comment = false;
                }
                None => return code,
            }
        }

        let block = rest.find("/*");
        let inline = rest.find("//");
        match (block, inline) {
            (Some(b), Some(i)) if i < b => {
                code.push_str(&rest[..i]);
                return code;
            }
            (Some(b), _) => {
                code.push_str(&rest[..b]);
                code.push(' ');
                rest = &rest[b + 2..];
                *in_comment = true;
            }
            (None, Some(i)) => {
                code.push_str(&rest[..i]);
                return code;
            }
            (None, None) => {
                code.push_str(rest);
                return code;
            }
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => chars.all(is_identifier_char),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO: &str = r#"package com.example;

public class Hello
{
    public static void main(String[] args)
    {
        System.out.println("hi");
    }
}
"#;

    #[test]
    fn test_package_and_type() {
        assert_eq!(package_of(HELLO).unwrap(), "com.example");
        assert_eq!(type_name_of(HELLO).unwrap(), "Hello");
    }

    #[test]
    fn test_default_package() {
        let src = "public final class Plain<T> extends Object {}";
        assert_eq!(package_of(src).unwrap(), "");
        assert_eq!(type_name_of(src).unwrap(), "Plain");
    }

    #[test]
    fn test_other_type_kinds() {
        assert_eq!(type_name_of("interface Shape {}").unwrap(), "Shape");
        assert_eq!(type_name_of("public enum Colour { RED }").unwrap(), "Colour");
        assert_eq!(type_name_of("record Point(int x, int y) {}").unwrap(), "Point");
    }

    #[test]
    fn test_comment_lines_skipped() {
        let src = "// class Decoy\n/* class Other */\n/**\n * class Nope\n */\nclass Real {}";
        assert_eq!(type_name_of(src).unwrap(), "Real");
    }

    #[test]
    fn test_block_comment_body_without_stars() {
        let src = "/**\n Docs mention a class Foo here\n */\npublic class Real {}";
        assert_eq!(type_name_of(src).unwrap(), "Real");
    }

    #[test]
    fn test_comments_inside_a_line() {
        assert_eq!(type_name_of("/* class A */ class B {} // class C").unwrap(), "B");
        assert_eq!(type_name_of("public /* final */ class Mixed {}").unwrap(), "Mixed");
        assert_eq!(type_name_of("/* open\n class Hidden */ enum Shown { X }").unwrap(), "Shown");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(type_name_of("int x = 1;"), Err(Error::Parse(_))));
        assert!(matches!(type_name_of("class {"), Err(Error::Parse(_))));
        assert!(matches!(package_of("package com.example\nclass A {}"), Err(Error::Parse(_))));
        assert!(matches!(package_of("package 9bad;\nclass A {}"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_main_signature_rule() {
        let detector = MainSignature;
        assert!(detector.has_entry_point("public static void main(String[] a) {}"));
        assert!(detector.has_entry_point("public static void main (String[] a) {}"));
        assert!(!detector.has_entry_point("static public void main(String[] a) {}"));
        assert!(!detector.has_entry_point("public static void main  (String[] a) {}"));
        // Matching is purely textual, so a string literal counts
        assert!(detector.has_entry_point(r#"String s = "public static void main(";"#));
    }

    #[test]
    fn test_write_creates_package_path() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let writer = SourceUnitWriter::new(temp.path(), &MainSignature);

        let unit = writer.write(HELLO).expect("write");
        assert_eq!(unit.fully_qualified_name(), "com.example.Hello");
        assert!(unit.has_entry_point());
        assert_eq!(unit.path(), temp.path().join("com/example/Hello.java"));
        assert_eq!(fs::read_to_string(unit.path()).unwrap(), HELLO);
    }

    #[test]
    fn test_write_parse_error_writes_nothing() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let writer = SourceUnitWriter::new(temp.path(), &MainSignature);

        assert!(matches!(writer.write("just some text"), Err(Error::Parse(_))));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_session_first_and_last_entry() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let writer = SourceUnitWriter::new(temp.path(), &MainSignature);
        let mut session = SandboxSession::new();

        for src in [
            "class Helper {}",
            "class A { public static void main(String[] a) {} }",
            "package p; class B { public static void main (String[] a) {} }",
            "class C {}",
        ] {
            session.record(writer.write(src).expect("write"));
        }

        assert_eq!(session.first_unit_name(), Some("Helper"));
        assert_eq!(session.entry_unit_name(), Some("p.B"));
        assert_eq!(session.units().len(), 4);
        assert_eq!(session.files()[2], temp.path().join("p/B.java"));
    }

    #[test]
    fn test_session_without_entry_point() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let writer = SourceUnitWriter::new(temp.path(), &MainSignature);
        let mut session = SandboxSession::new();

        session.record(writer.write("class Only {}").expect("write"));
        assert_eq!(session.first_unit_name(), Some("Only"));
        assert_eq!(session.entry_unit_name(), None);
    }
}
