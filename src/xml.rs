//! Document collaborators: include expansion and field extraction.
//!
//! The assembly pipeline only depends on the two traits here; the shipped
//! implementations cover the stock descriptor format. `FileIncludeExpander`
//! splices `<xi:include href="..."/>` directives (with optional
//! `<xi:fallback>` content) resolved relative to the document location.
//! `XmlFieldExtractor` maps the expanded document into a [`RawDescriptor`]
//! and is deliberately lenient: unknown elements are skipped, only
//! malformed XML aborts extraction.
//!
//! Recognized elements: `<id>`, `<name>`, `<version>`, `<description>`,
//! `<change-notes>`, `<vendor url=".." email="..">`,
//! `<compatibility since-build=".." until-build=".."/>`,
//! `<depends optional="true" config-file="..">`, `<module value=".."/>`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::raw::{RawCompatibility, RawDependency, RawDescriptor, RawVendor};

/// Resolves cross-file include directives before extraction
pub trait IncludeExpander {
    /// Expand all include directives of `document`, resolved against
    /// `location` (the path of the document itself).
    fn expand(&self, document: &str, location: &Path) -> anyhow::Result<String>;
}

/// Maps a document into the raw field set
pub trait FieldExtractor {
    fn extract(&self, document: &str) -> anyhow::Result<RawDescriptor>;
}

/// Failure while expanding include directives
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("unable to read included file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("include directive has no href attribute")]
    MissingHref,
    #[error("include nesting exceeds {0} levels")]
    TooDeep(usize),
    #[error("malformed document")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
}

/// Filesystem-backed include expander.
///
/// Directives are resolved relative to the directory of the document that
/// contains them, recursively, with a nesting cap as the only cycle guard
/// a textual expander can offer.
pub struct FileIncludeExpander {
    max_depth: usize,
}

impl Default for FileIncludeExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl FileIncludeExpander {
    pub fn new() -> Self {
        Self { max_depth: 16 }
    }

    fn is_include(e: &BytesStart<'_>) -> bool {
        e.name().as_ref() == b"xi:include"
    }

    fn href(e: &BytesStart<'_>) -> Result<String, ExpandError> {
        match e.try_get_attribute("href")? {
            Some(attr) => Ok(String::from_utf8_lossy(&attr.value).into_owned()),
            None => Err(ExpandError::MissingHref),
        }
    }

    /// Read and expand one referenced file, stripping any XML declaration
    /// so the content can be spliced into the surrounding document.
    fn load(&self, base_dir: &Path, href: &str, depth: usize) -> Result<String, ExpandError> {
        let path = base_dir.join(href);
        let content = std::fs::read_to_string(&path).map_err(|source| ExpandError::Io {
            path: path.clone(),
            source,
        })?;
        let content = strip_declaration(&content).to_string();
        let parent = path.parent().unwrap_or(base_dir).to_path_buf();
        self.expand_at(&content, &parent, depth + 1)
    }

    /// Locate the first `<xi:fallback>` element inside an include body and
    /// return its expanded content, or None when the body has no fallback.
    fn fallback_of(
        &self,
        inner: &str,
        base_dir: &Path,
        depth: usize,
    ) -> Option<Result<String, ExpandError>> {
        let mut reader = Reader::from_str(inner);
        loop {
            match reader.read_event() {
                Ok(Event::Empty(e)) if e.name().as_ref() == b"xi:fallback" => {
                    return Some(Ok(String::new()));
                }
                Ok(Event::Start(e)) if e.name().as_ref() == b"xi:fallback" => {
                    let end = e.to_end().into_owned();
                    let span = match reader.read_to_end(end.name()) {
                        Ok(span) => span,
                        Err(err) => return Some(Err(err.into())),
                    };
                    let content = &inner[span.start as usize..span.end as usize];
                    return Some(self.expand_at(content, base_dir, depth + 1));
                }
                Ok(Event::Eof) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    fn expand_at(
        &self,
        document: &str,
        base_dir: &Path,
        depth: usize,
    ) -> Result<String, ExpandError> {
        if depth > self.max_depth {
            return Err(ExpandError::TooDeep(self.max_depth));
        }
        let mut reader = Reader::from_str(document);
        let mut out = String::new();
        let mut copied_to = 0usize;
        loop {
            let event_start = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Empty(e) if Self::is_include(&e) => {
                    out.push_str(&document[copied_to..event_start]);
                    let href = Self::href(&e)?;
                    out.push_str(&self.load(base_dir, &href, depth)?);
                    copied_to = reader.buffer_position() as usize;
                }
                Event::Start(e) if Self::is_include(&e) => {
                    let href = Self::href(&e);
                    let end = e.to_end().into_owned();
                    let span = reader.read_to_end(end.name())?;
                    let inner = &document[span.start as usize..span.end as usize];
                    out.push_str(&document[copied_to..event_start]);
                    let included = match self.load(base_dir, &href?, depth) {
                        Ok(content) => content,
                        Err(err) => match self.fallback_of(inner, base_dir, depth) {
                            Some(fallback) => fallback?,
                            None => return Err(err),
                        },
                    };
                    out.push_str(&included);
                    copied_to = reader.buffer_position() as usize;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        out.push_str(&document[copied_to..]);
        Ok(out)
    }
}

impl IncludeExpander for FileIncludeExpander {
    fn expand(&self, document: &str, location: &Path) -> anyhow::Result<String> {
        let base_dir = location.parent().unwrap_or_else(|| Path::new("."));
        Ok(self.expand_at(document, base_dir, 0)?)
    }
}

fn strip_declaration(content: &str) -> &str {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(end) = rest.find("?>") {
            return &rest[end + 2..];
        }
    }
    content
}

/// Top-level element currently being read
enum TopField {
    Id,
    Name,
    Version,
    Description,
    ChangeNotes,
    Vendor,
    Depends,
}

/// Event-driven extractor for the stock XML descriptor format
pub struct XmlFieldExtractor;

impl XmlFieldExtractor {
    fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
        e.attributes()
            .flatten()
            .find(|a| a.key.as_ref() == name)
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
    }

    fn compatibility_from(e: &BytesStart<'_>) -> RawCompatibility {
        RawCompatibility {
            since_build: Self::attr(e, b"since-build"),
            until_build: Self::attr(e, b"until-build"),
        }
    }

    fn dependency_from(e: &BytesStart<'_>) -> RawDependency {
        RawDependency {
            id: String::new(),
            optional: Self::attr(e, b"optional").as_deref() == Some("true"),
            config_file: Self::attr(e, b"config-file"),
        }
    }

    /// Handle a child element of the root that opens with content
    fn begin_element(
        e: &BytesStart<'_>,
        raw: &mut RawDescriptor,
        pending_dependency: &mut Option<RawDependency>,
    ) -> Option<TopField> {
        match e.name().as_ref() {
            b"id" => Some(TopField::Id),
            b"name" => Some(TopField::Name),
            b"version" => Some(TopField::Version),
            b"description" => Some(TopField::Description),
            b"change-notes" => Some(TopField::ChangeNotes),
            b"vendor" => {
                raw.vendor = Some(RawVendor {
                    name: None,
                    url: Self::attr(e, b"url"),
                    email: Self::attr(e, b"email"),
                });
                Some(TopField::Vendor)
            }
            b"depends" => {
                *pending_dependency = Some(Self::dependency_from(e));
                Some(TopField::Depends)
            }
            b"compatibility" => {
                raw.compatibility = Some(Self::compatibility_from(e));
                None
            }
            b"module" => {
                raw.modules.push(Self::attr(e, b"value").unwrap_or_default());
                None
            }
            // unknown elements never abort extraction
            _ => None,
        }
    }

    /// Handle a self-closing child element of the root
    fn empty_element(e: &BytesStart<'_>, raw: &mut RawDescriptor) {
        match e.name().as_ref() {
            b"compatibility" => raw.compatibility = Some(Self::compatibility_from(e)),
            b"module" => raw.modules.push(Self::attr(e, b"value").unwrap_or_default()),
            b"depends" => raw.dependencies.push(Self::dependency_from(e)),
            b"vendor" => {
                raw.vendor = Some(RawVendor {
                    name: None,
                    url: Self::attr(e, b"url"),
                    email: Self::attr(e, b"email"),
                });
            }
            b"id" => raw.id = Some(String::new()),
            b"name" => raw.name = Some(String::new()),
            b"version" => raw.version = Some(String::new()),
            b"description" => raw.description = Some(String::new()),
            b"change-notes" => raw.change_notes = Some(String::new()),
            _ => {}
        }
    }

    fn commit(
        field: Option<TopField>,
        text: &str,
        raw: &mut RawDescriptor,
        pending_dependency: &mut Option<RawDependency>,
    ) {
        match field {
            Some(TopField::Id) => raw.id = Some(text.to_string()),
            Some(TopField::Name) => raw.name = Some(text.to_string()),
            Some(TopField::Version) => raw.version = Some(text.to_string()),
            Some(TopField::Description) => raw.description = Some(text.to_string()),
            Some(TopField::ChangeNotes) => raw.change_notes = Some(text.to_string()),
            Some(TopField::Vendor) => {
                if let Some(vendor) = raw.vendor.as_mut() {
                    vendor.name = Some(text.to_string());
                }
            }
            Some(TopField::Depends) => {
                if let Some(mut dependency) = pending_dependency.take() {
                    dependency.id = text.to_string();
                    raw.dependencies.push(dependency);
                }
            }
            None => {}
        }
    }
}

impl FieldExtractor for XmlFieldExtractor {
    fn extract(&self, document: &str) -> anyhow::Result<RawDescriptor> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut raw = RawDescriptor::default();
        let mut depth = 0usize;
        let mut current: Option<TopField> = None;
        let mut text = String::new();
        let mut pending_dependency: Option<RawDependency> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    depth += 1;
                    if depth == 2 {
                        text.clear();
                        current = Self::begin_element(&e, &mut raw, &mut pending_dependency);
                    }
                }
                Event::Empty(e) => {
                    if depth == 1 {
                        Self::empty_element(&e, &mut raw);
                    }
                }
                Event::Text(t) => {
                    if current.is_some() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if current.is_some() {
                        text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::End(_) => {
                    if depth == 2 {
                        Self::commit(current.take(), &text, &mut raw, &mut pending_dependency);
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => {
                    // quick-xml reports Eof even with elements still open;
                    // a truncated document must abort extraction
                    if depth > 0 {
                        anyhow::bail!("document ends with {depth} unclosed element(s)");
                    }
                    break;
                }
                _ => {}
            }
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn extract(document: &str) -> RawDescriptor {
        XmlFieldExtractor.extract(document).unwrap()
    }

    #[test]
    fn test_extract_scalar_fields() {
        let raw = extract(
            r#"<plugin>
                 <id>com.example.tool</id>
                 <name>Example Tool</name>
                 <version>1.0.3</version>
                 <description>Does example things</description>
                 <change-notes>First release</change-notes>
               </plugin>"#,
        );
        assert_eq!(raw.id.as_deref(), Some("com.example.tool"));
        assert_eq!(raw.name.as_deref(), Some("Example Tool"));
        assert_eq!(raw.version.as_deref(), Some("1.0.3"));
        assert_eq!(raw.description.as_deref(), Some("Does example things"));
        assert_eq!(raw.change_notes.as_deref(), Some("First release"));
    }

    #[test]
    fn test_extract_vendor() {
        let raw = extract(
            r#"<plugin>
                 <vendor url="https://example.org" email="dev@example.org">Example Org</vendor>
               </plugin>"#,
        );
        let vendor = raw.vendor.unwrap();
        assert_eq!(vendor.name.as_deref(), Some("Example Org"));
        assert_eq!(vendor.url.as_deref(), Some("https://example.org"));
        assert_eq!(vendor.email.as_deref(), Some("dev@example.org"));
    }

    #[test]
    fn test_extract_compatibility_and_modules() {
        let raw = extract(
            r#"<plugin>
                 <compatibility since-build="131.1" until-build="145.*"/>
                 <module value="com.example.tool.core"/>
                 <module value=""/>
               </plugin>"#,
        );
        let compatibility = raw.compatibility.unwrap();
        assert_eq!(compatibility.since_build.as_deref(), Some("131.1"));
        assert_eq!(compatibility.until_build.as_deref(), Some("145.*"));
        assert_eq!(raw.modules, vec!["com.example.tool.core".to_string(), String::new()]);
    }

    #[test]
    fn test_extract_dependencies() {
        let raw = extract(
            r#"<plugin>
                 <depends>com.host.modules.platform</depends>
                 <depends optional="true" config-file="extra.xml">com.example.extra</depends>
                 <depends/>
               </plugin>"#,
        );
        assert_eq!(raw.dependencies.len(), 3);
        assert_eq!(raw.dependencies[0].id, "com.host.modules.platform");
        assert!(!raw.dependencies[0].optional);
        assert!(raw.dependencies[1].optional);
        assert_eq!(raw.dependencies[1].config_file.as_deref(), Some("extra.xml"));
        assert_eq!(raw.dependencies[2].id, "");
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let raw = extract(
            r#"<plugin>
                 <name>Example Tool</name>
                 <extensions><toolWindow id="x"/></extensions>
                 <actions/>
               </plugin>"#,
        );
        assert_eq!(raw.name.as_deref(), Some("Example Tool"));
        assert!(raw.dependencies.is_empty());
    }

    #[test]
    fn test_description_with_markup_keeps_text() {
        let raw = extract(
            r#"<plugin>
                 <description>Uses <b>bold</b> markup<br/> inside</description>
               </plugin>"#,
        );
        let description = raw.description.unwrap();
        assert!(description.contains("Uses"));
        assert!(description.contains("bold"));
        assert!(!description.contains("<b>"));
    }

    #[test]
    fn test_cdata_description() {
        let raw = extract(
            r#"<plugin><description><![CDATA[Rich <em>text</em> here]]></description></plugin>"#,
        );
        assert_eq!(raw.description.as_deref(), Some("Rich <em>text</em> here"));
    }

    #[test]
    fn test_empty_elements_count_as_present() {
        let raw = extract(r#"<plugin><name/><description></description></plugin>"#);
        assert_eq!(raw.name.as_deref(), Some(""));
        assert_eq!(raw.description.as_deref(), Some(""));
    }

    #[test]
    fn test_malformed_document_raises() {
        assert!(XmlFieldExtractor.extract("<plugin><name>oops").is_err());
    }

    #[test]
    fn test_truncated_nested_markup_raises() {
        // elements left open deep in the tree must abort, not drop text
        let err = XmlFieldExtractor
            .extract("<plugin><description>Uses <b>bold")
            .unwrap_err();
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn test_expand_include() {
        let dir = tempfile::tempdir().unwrap();
        let fragment = dir.path().join("fragment.xml");
        let mut file = std::fs::File::create(&fragment).unwrap();
        write!(file, r#"<?xml version="1.0"?><name>Included Name</name>"#).unwrap();

        let document = r#"<plugin><xi:include href="fragment.xml"/></plugin>"#;
        let location = dir.path().join("plugin.xml");
        let expanded = FileIncludeExpander::new()
            .expand(document, &location)
            .unwrap();
        assert_eq!(expanded, "<plugin><name>Included Name</name></plugin>");
    }

    #[test]
    fn test_expand_nested_includes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("outer.xml"),
            r#"<vendor>Org</vendor><xi:include href="inner.xml"/>"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("inner.xml"), r#"<version>2.0</version>"#).unwrap();

        let document = r#"<plugin><xi:include href="outer.xml"/></plugin>"#;
        let expanded = FileIncludeExpander::new()
            .expand(document, &dir.path().join("plugin.xml"))
            .unwrap();
        assert_eq!(
            expanded,
            "<plugin><vendor>Org</vendor><version>2.0</version></plugin>"
        );
    }

    #[test]
    fn test_missing_include_raises() {
        let dir = tempfile::tempdir().unwrap();
        let document = r#"<plugin><xi:include href="nope.xml"/></plugin>"#;
        let err = FileIncludeExpander::new()
            .expand(document, &dir.path().join("plugin.xml"))
            .unwrap_err();
        assert!(err.to_string().contains("nope.xml"));
    }

    #[test]
    fn test_missing_include_with_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let document = concat!(
            r#"<plugin><xi:include href="nope.xml">"#,
            r#"<xi:fallback><name>Fallback Name</name></xi:fallback>"#,
            r#"</xi:include></plugin>"#,
        );
        let expanded = FileIncludeExpander::new()
            .expand(document, &dir.path().join("plugin.xml"))
            .unwrap();
        assert_eq!(expanded, "<plugin><name>Fallback Name</name></plugin>");
    }

    #[test]
    fn test_include_cycle_hits_depth_cap() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.xml"),
            r#"<xi:include href="b.xml"/>"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.xml"),
            r#"<xi:include href="a.xml"/>"#,
        )
        .unwrap();
        let document = r#"<plugin><xi:include href="a.xml"/></plugin>"#;
        assert!(FileIncludeExpander::new()
            .expand(document, &dir.path().join("plugin.xml"))
            .is_err());
    }
}
