//! Whole-document and selective key/value exchange over the config file.
//!
//! The selective write is a single pass over the XML event stream: every
//! event is copied through verbatim except the first direct child of the
//! first `<appSettings>` section matching each targeted key, which is
//! re-emitted with only its `value` attribute replaced. "First match wins,
//! update-only, never insert" is therefore an explicit transform over the
//! stream, not ambient mutation of a loaded tree.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::{canonical_key, ConfigError, ScratchDir, QUICK_SETTINGS_KEYS};

/// Editor over one config document. Holds no file handle; each operation
/// reads or replaces the file and returns.
pub struct ConfigEditor<'a> {
    path: &'a Path,
    scratch: &'a ScratchDir,
}

impl<'a> ConfigEditor<'a> {
    pub fn new(path: &'a Path, scratch: &'a ScratchDir) -> Self {
        Self { path, scratch }
    }

    // -----------------------------------------------------------------------
    // Whole-document exchange
    // -----------------------------------------------------------------------

    /// The raw document text, verbatim. Empty string when no document
    /// exists yet; that is not an error.
    pub fn read_raw(&self) -> Result<String, ConfigError> {
        Ok(self.read_if_exists()?.unwrap_or_default())
    }

    /// Replace the whole document. The text must be well-formed XML;
    /// otherwise the write is rejected and the previous document is left
    /// untouched. Nothing is written before validation passes.
    pub fn write_raw(&self, text: &str) -> Result<(), ConfigError> {
        validate_document(text)?;
        self.persist(text)
    }

    // -----------------------------------------------------------------------
    // Selective key/value exchange
    // -----------------------------------------------------------------------

    /// The allow-listed settings actually present in the document's
    /// `<appSettings>` section: canonical key → value, first occurrence
    /// wins. Missing keys are absent from the map, not empty. Absent
    /// document ⇒ empty map.
    pub fn read_quick_settings(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let Some(text) = self.read_if_exists()? else {
            return Ok(BTreeMap::new());
        };
        collect_quick_settings(&text)
    }

    /// Update the `value` attribute of pre-existing allow-listed nodes.
    ///
    /// Supplied keys match the allow-list case-insensitively; keys not on
    /// the list are ignored, as are keys with no matching node (nothing is
    /// ever created). Fails with [`ConfigError::NotFound`] when no document
    /// exists — there is nothing to update.
    pub fn write_quick_settings(
        &self,
        updates: &BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        let Some(text) = self.read_if_exists()? else {
            return Err(ConfigError::NotFound(self.path.to_path_buf()));
        };

        let pending: BTreeMap<&'static str, &str> = updates
            .iter()
            .filter_map(|(k, v)| canonical_key(k).map(|ck| (ck, v.as_str())))
            .collect();

        let rewritten = rewrite_quick_settings(&text, pending)?;
        self.persist(&rewritten)
    }

    // -----------------------------------------------------------------------
    // File plumbing
    // -----------------------------------------------------------------------

    fn read_if_exists(&self) -> Result<Option<String>, ConfigError> {
        match fs::read_to_string(self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stage the new text in the scratch dir, then move it over the
    /// document so a crash mid-write never leaves a truncated file.
    fn persist(&self, text: &str) -> Result<(), ConfigError> {
        let staged = self.scratch.scratch_file();
        fs::write(&staged, text)?;
        match fs::rename(&staged, self.path) {
            Ok(()) => Ok(()),
            // rename cannot cross filesystems; copy instead. Leftover
            // staged files are swept by ScratchDir::teardown.
            Err(_) => {
                fs::copy(&staged, self.path)?;
                let _ = fs::remove_file(&staged);
                Ok(())
            }
        }
    }
}

fn xml_err<E: Display>(e: E) -> ConfigError {
    ConfigError::Malformed(e.to_string())
}

// ---------------------------------------------------------------------------
// Well-formedness validation
// ---------------------------------------------------------------------------

/// Parse every event of `text`, requiring balanced tags, parseable
/// attributes and entity references, and exactly one root element.
fn validate_document(text: &str) -> Result<(), ConfigError> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) => {
                validate_attrs(&e)?;
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                validate_attrs(&e)?;
                if depth == 0 {
                    roots += 1;
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ConfigError::Malformed("closing tag without opening tag".to_string())
                })?;
            }
            Event::Text(t) => {
                let content = t.unescape().map_err(xml_err)?;
                if depth == 0 && !content.trim().is_empty() {
                    return Err(ConfigError::Malformed(
                        "text content outside the root element".to_string(),
                    ));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err(ConfigError::Malformed(
                    "cdata outside the root element".to_string(),
                ));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ConfigError::Malformed("unclosed element".to_string()));
    }
    if roots != 1 {
        return Err(ConfigError::Malformed(format!(
            "expected exactly one root element, found {roots}"
        )));
    }
    Ok(())
}

/// Attribute parsing in quick-xml is lazy; walk them so malformed or
/// badly escaped attributes fail validation instead of slipping through.
fn validate_attrs(e: &BytesStart<'_>) -> Result<(), ConfigError> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        attr.unescape_value().map_err(xml_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// appSettings walk
// ---------------------------------------------------------------------------

const SETTINGS_SECTION: &[u8] = b"appSettings";

/// The unescaped (`key`, `value`) attribute pair of a node, when both are
/// present. Nodes missing either attribute are not candidates for the
/// selective path and fall through to the next sibling.
fn key_value_attrs(e: &BytesStart<'_>) -> Result<Option<(String, String)>, ConfigError> {
    let mut key = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        match attr.key.as_ref() {
            b"key" => key = Some(attr.unescape_value().map_err(xml_err)?.into_owned()),
            b"value" => value = Some(attr.unescape_value().map_err(xml_err)?.into_owned()),
            _ => {}
        }
    }
    Ok(key.zip(value))
}

/// Scan the first `<appSettings>` section's direct children and collect
/// the allow-listed keys present (first occurrence per key).
fn collect_quick_settings(text: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut reader = Reader::from_str(text);
    let mut out = BTreeMap::new();

    let mut in_settings = false;
    let mut settings_done = false;
    let mut child_depth = 0usize;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) => {
                if in_settings {
                    if child_depth == 0 {
                        collect_candidate(&e, &mut out)?;
                    }
                    child_depth += 1;
                } else if !settings_done && e.name().as_ref() == SETTINGS_SECTION {
                    in_settings = true;
                    child_depth = 0;
                }
            }
            Event::Empty(e) => {
                if in_settings && child_depth == 0 {
                    collect_candidate(&e, &mut out)?;
                } else if !in_settings && !settings_done && e.name().as_ref() == SETTINGS_SECTION {
                    // Empty section: nothing to collect, but it still
                    // claims the "first section" slot.
                    settings_done = true;
                }
            }
            Event::End(_) if in_settings => {
                if child_depth == 0 {
                    in_settings = false;
                    settings_done = true;
                } else {
                    child_depth -= 1;
                }
            }
            _ => {}
        }
    }

    Ok(out)
}

fn collect_candidate(
    e: &BytesStart<'_>,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    if let Some((key, value)) = key_value_attrs(e)? {
        if QUICK_SETTINGS_KEYS.contains(&key.as_str()) && !out.contains_key(&key) {
            out.insert(key, value);
        }
    }
    Ok(())
}

/// Re-emit `text` with the `value` attribute of the first matching node
/// replaced for each pending key. Everything else — ordering, other
/// attributes, comments, whitespace, content outside the section — passes
/// through byte-for-byte.
fn rewrite_quick_settings(
    text: &str,
    mut pending: BTreeMap<&'static str, &str>,
) -> Result<String, ConfigError> {
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::new());

    let mut in_settings = false;
    let mut settings_done = false;
    let mut child_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match event {
            Event::Eof => break,
            Event::Start(e) => {
                if in_settings && child_depth == 0 {
                    if let Some(replacement) = rewrite_candidate(&e, &mut pending)? {
                        writer
                            .write_event(Event::Start(replacement))
                            .map_err(xml_err)?;
                        child_depth += 1;
                        continue;
                    }
                }
                if in_settings {
                    child_depth += 1;
                } else if !settings_done && e.name().as_ref() == SETTINGS_SECTION {
                    in_settings = true;
                    child_depth = 0;
                }
                writer.write_event(Event::Start(e)).map_err(xml_err)?;
            }
            Event::Empty(e) => {
                if in_settings && child_depth == 0 {
                    if let Some(replacement) = rewrite_candidate(&e, &mut pending)? {
                        writer
                            .write_event(Event::Empty(replacement))
                            .map_err(xml_err)?;
                        continue;
                    }
                } else if !in_settings && !settings_done && e.name().as_ref() == SETTINGS_SECTION {
                    settings_done = true;
                }
                writer.write_event(Event::Empty(e)).map_err(xml_err)?;
            }
            Event::End(e) => {
                if in_settings {
                    if child_depth == 0 {
                        in_settings = false;
                        settings_done = true;
                    } else {
                        child_depth -= 1;
                    }
                }
                writer.write_event(Event::End(e)).map_err(xml_err)?;
            }
            other => writer.write_event(other).map_err(xml_err)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

/// When the node's `key` attribute names a pending target (and a `value`
/// attribute exists to update), rebuild the tag with the new value and
/// retire the target so later duplicates pass through untouched.
fn rewrite_candidate(
    e: &BytesStart<'_>,
    pending: &mut BTreeMap<&'static str, &str>,
) -> Result<Option<BytesStart<'static>>, ConfigError> {
    let Some((key, _)) = key_value_attrs(e)? else {
        return Ok(None);
    };
    let Some((&canonical, &new_value)) = pending.get_key_value(key.as_str()) else {
        return Ok(None);
    };

    let name = String::from_utf8(e.name().as_ref().to_vec()).map_err(xml_err)?;
    let mut rebuilt = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.as_ref() == b"value" {
            // The (&str, &str) form escapes the value on write.
            rebuilt.push_attribute(("value", new_value));
        } else {
            // Raw passthrough: the stored bytes are already escaped.
            rebuilt.push_attribute(Attribute {
                key: attr.key,
                value: attr.value.clone(),
            });
        }
    }

    pending.remove(canonical);
    Ok(Some(rebuilt))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
