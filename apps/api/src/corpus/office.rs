//! Office formats: Word and PowerPoint packages are zip archives of XML
//! parts; spreadsheets go through `calamine`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use thiserror::Error;
use zip::ZipArchive;

const DOCX_BODY: &str = "word/document.xml";
const PPTX_SLIDE_PREFIX: &str = "ppt/slides/slide";

#[derive(Debug, Error)]
pub enum OfficeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("spreadsheet error: {0}")]
    Sheet(#[from] calamine::Error),
}

/// Body text of a `.docx`, one line per paragraph.
pub fn docx_text(path: &Path) -> Result<String, OfficeError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let xml = read_part(&mut archive, DOCX_BODY)?;
    Ok(paragraph_text(&xml)?)
}

/// Text of every slide of a `.pptx`, in slide order.
pub fn pptx_text(path: &Path) -> Result<String, OfficeError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    // slide10.xml sorts after slide9.xml
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix(PPTX_SLIDE_PREFIX)?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_unstable();

    let mut out = String::new();
    for (_, name) in slides {
        let xml = read_part(&mut archive, &name)?;
        out.push_str(&paragraph_text(&xml)?);
    }
    Ok(out)
}

/// First worksheet as tab-separated rows.
pub fn spreadsheet_text(path: &Path) -> Result<String, OfficeError> {
    let mut workbook = open_workbook_auto(path)?;
    let Some(first) = workbook.sheet_names().first().cloned() else {
        return Ok(String::new());
    };
    let range = workbook.worksheet_range(&first)?;

    let mut out = String::new();
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        out.push_str(cells.join("\t").trim_end());
        out.push('\n');
    }
    Ok(out)
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<String, OfficeError> {
    let mut xml = String::new();
    archive.by_name(name)?.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Concatenates `<*:t>` text runs, ending each `<*:p>` paragraph with a
/// newline. WordprocessingML and DrawingML share these local names.
fn paragraph_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
pub mod testing {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Writes a zip package with the given `(part name, contents)` entries.
    pub fn write_package(path: &Path, parts: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    pub fn docx_body(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    pub fn pptx_slide(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody>{body}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }
}
