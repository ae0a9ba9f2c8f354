//! Streaming HTML post-processing.
//!
//! The rendered article page is passed through `quick-xml` once and every
//! element marked for removal is dropped together with its subtree. Events are
//! re-emitted verbatim otherwise, without indentation.

use anyhow::{Result, bail};
use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event},
};
use std::io::Cursor;

/// Elements that never have a closing tag in HTML.
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"param", b"source", b"track", b"wbr",
];

#[inline]
fn create_html_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

/// Remove every element whose `id` equals one of `names`, or whose `class`
/// list contains one of them, along with everything nested inside it.
pub fn strip_elements(html: &[u8], names: &[String]) -> Result<Vec<u8>> {
    if names.is_empty() {
        return Ok(html.to_vec());
    }

    let mut reader = create_html_reader(html);
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(html.len())));
    // Names of the open elements inside the subtree being dropped, outermost
    // first; empty when not dropping.
    let mut skipping: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) if !skipping.is_empty() => match event {
                Event::Start(elem) if !is_void(&elem) => skipping.push(tag_name(&elem)),
                Event::End(elem) => {
                    // An end tag closes its nearest open match along with
                    // anything left open inside it (`<p>`, `<li>`, ...).
                    let name = elem.name();
                    if let Some(pos) = skipping
                        .iter()
                        .rposition(|open| open.eq_ignore_ascii_case(name.as_ref()))
                    {
                        skipping.truncate(pos);
                    }
                }
                _ => {}
            },
            Ok(Event::Start(elem)) if is_marked(&elem, names) => {
                if !is_void(&elem) {
                    skipping.push(tag_name(&elem));
                }
            }
            Ok(Event::Empty(elem)) if is_marked(&elem, names) => {}
            Ok(event) => writer.write_event(event)?,
            Err(e) => bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    if let Some(open) = skipping.first() {
        bail!(
            "<{}> marked for removal is never closed",
            String::from_utf8_lossy(open)
        );
    }

    Ok(writer.into_inner().into_inner())
}

fn tag_name(elem: &BytesStart<'_>) -> Vec<u8> {
    elem.name().as_ref().to_vec()
}

#[inline]
fn is_void(elem: &BytesStart<'_>) -> bool {
    let name = elem.name();
    VOID_ELEMENTS
        .iter()
        .any(|void| name.as_ref().eq_ignore_ascii_case(void))
}

fn is_marked(elem: &BytesStart<'_>, names: &[String]) -> bool {
    elem.html_attributes()
        .with_checks(false)
        .flatten()
        .any(|attr| {
            let value = String::from_utf8_lossy(attr.value.as_ref());
            match attr.key.as_ref() {
                b"id" => names.iter().any(|n| *n == value),
                b"class" => value
                    .split_whitespace()
                    .any(|class| names.iter().any(|n| n == class)),
                _ => false,
            }
        })
}
