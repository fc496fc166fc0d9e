use lopdf::{content::Operation, dictionary, Object, StringFormat};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::document::ResumeData;
use crate::error::{ContextError, ErrorKind};
use crate::export::{PdfProducer, ProducedPdf};

/// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const LEFT_MARGIN: f32 = 50.0;
pub const TOP_MARGIN: f32 = 50.0;
pub const BOTTOM_MARGIN: f32 = 36.0;
/// The vertical distance between two consecutive lines, in points.
pub const LINE_HEIGHT: f32 = 14.0;
/// Lines longer than this many characters are cut, never wrapped.
pub const MAX_LINE_CHARACTERS: usize = 120;

const PERSONAL_GAP: f32 = 10.0;
const ENTRY_GAP: f32 = 6.0;
const MAX_RESPONSIBILITIES: usize = 6;
const MAX_PROJECT_BULLETS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Names and section titles, in Helvetica-Bold 12 pt.
    Heading,
    /// Everything else, in Helvetica 11 pt.
    Detail,
}

impl TextStyle {
    fn font_resource(&self) -> &'static str {
        match self {
            TextStyle::Heading => "F2",
            TextStyle::Detail => "F1",
        }
    }

    fn font_size(&self) -> f32 {
        match self {
            TextStyle::Heading => 12.0,
            TextStyle::Detail => 11.0,
        }
    }
}

/// A line of text placed on the page, with its baseline position in points.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnLine {
    pub text: String,
    pub style: TextStyle,
    pub position: [f32; 2],
}

/// A running cursor moving down the page one line at a time.
#[derive(Debug)]
struct PageLayout {
    lines: Vec<DrawnLine>,
    cursor: f32,
    dropped_lines: usize,
}

impl PageLayout {
    fn new() -> Self {
        PageLayout {
            lines: Vec::new(),
            cursor: PAGE_HEIGHT - TOP_MARGIN,
            dropped_lines: 0,
        }
    }

    fn draw<S: AsRef<str>>(&mut self, text: S, style: TextStyle) {
        if self.cursor < BOTTOM_MARGIN {
            self.dropped_lines += 1;
        } else {
            self.lines.push(DrawnLine {
                text: text.as_ref().chars().take(MAX_LINE_CHARACTERS).collect(),
                style,
                position: [LEFT_MARGIN, self.cursor],
            });
        }
        self.cursor -= LINE_HEIGHT;
    }

    fn heading<S: AsRef<str>>(&mut self, text: S) {
        self.draw(text, TextStyle::Heading);
    }

    fn detail<S: AsRef<str>>(&mut self, text: S) {
        self.draw(text, TextStyle::Detail);
    }

    fn skip(&mut self, gap: f32) {
        self.cursor -= gap;
    }
}

fn non_blank(lines: &[String]) -> impl Iterator<Item = &str> {
    lines.iter().map(|line| line.trim()).filter(|line| !line.is_empty())
}

fn join_non_blank<'a, I: IntoIterator<Item = &'a str>>(parts: I, separator: &str) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Lay the résumé out on a single page, top to bottom. Lines that would fall below the
/// bottom margin are left out.
pub fn layout_resume(resume: &ResumeData) -> Vec<DrawnLine> {
    let mut page = PageLayout::new();

    let personal = &resume.personal;
    page.heading(&personal.full_name);
    page.detail(join_non_blank(
        [
            personal.location.as_str(),
            personal.phone.as_str(),
            personal.email.as_str(),
        ],
        " | ",
    ));
    for (label, value) in [
        ("LinkedIn", &personal.linkedin),
        ("GitHub", &personal.github),
        ("Portfolio", &personal.portfolio),
    ] {
        if !value.trim().is_empty() {
            page.detail(format!("{}: {}", label, value.trim()));
        }
    }
    page.skip(PERSONAL_GAP);

    page.heading(&resume.section_education);
    for education in &resume.education {
        page.heading(format!(
            "{} \u{2014} {}",
            education.school_name, education.school_location
        ));
        page.detail(format!(
            "{} in {} ({} - {})",
            education.degree, education.major, education.start_date, education.end_date
        ));
        if let Some(gpa) = education.displayed_gpa() {
            page.detail(format!("GPA: {}", gpa));
        }
        page.skip(ENTRY_GAP);
    }

    page.heading(&resume.section_skills);
    for skill in &resume.skills {
        page.detail(format!(
            "{}: {}",
            skill.name,
            join_non_blank(skill.details.iter().map(String::as_str), ", ")
        ));
    }
    page.skip(ENTRY_GAP);

    page.heading(&resume.section_experience);
    for job in &resume.experience {
        page.heading(format!("{} \u{2014} {}", job.company_name, job.company_location));
        page.detail(format!(
            "{} ({} - {})",
            job.job_title, job.start_date, job.end_date
        ));
        for responsibility in non_blank(&job.responsibilities).take(MAX_RESPONSIBILITIES) {
            page.detail(format!("\u{2022} {}", responsibility));
        }
        page.skip(ENTRY_GAP);
    }

    page.heading(&resume.section_projects);
    for project in &resume.projects {
        page.heading(format!("{} \u{2014} {}", project.project_name, project.genre));
        if !project.link.trim().is_empty() {
            page.detail(project.link.trim());
        }
        page.detail(format!("{} - {}", project.start_date, project.end_date));
        for bullet in non_blank(&project.description_bullets).take(MAX_PROJECT_BULLETS) {
            page.detail(format!("\u{2022} {}", bullet));
        }
        let tools = join_non_blank(project.tools_used.iter().map(String::as_str), ", ");
        if !tools.is_empty() {
            page.detail(format!("Tools: {}", tools));
        }
        page.skip(ENTRY_GAP);
    }

    page.heading(&resume.section_awards);
    for award in &resume.awards {
        page.heading(format!("{}: {}", award.award_name, award.summary));
        if !award.awarder.trim().is_empty() {
            page.detail(award.awarder.trim());
        }
        if !award.award_date.trim().is_empty() {
            page.detail(award.award_date.trim());
        }
        page.skip(ENTRY_GAP);
    }

    if page.dropped_lines > 0 {
        log::warn!(
            "The résumé does not fit on one page, {} lines were left out of the fallback PDF",
            page.dropped_lines
        );
    }

    page.lines
}

/// Encode text for the standard Type1 fonts, which use the WinAnsi encoding.
/// Characters outside of it are replaced by a question mark.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc()
        .map(|character| match character {
            '\t' => b' ',
            ' '..='~' => character as u8,
            '\u{a0}'..='\u{ff}' => character as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

/// A page and the content stream operations drawn onto it.
#[derive(Debug, Clone)]
struct PdfPage {
    /// Page width in points.
    width: f32,
    /// Page height in points.
    height: f32,
    operations: Vec<Operation>,
}

/// A minimal PDF document built on top of `lopdf`, drawing text with the standard
/// Helvetica fonts so that no font file has to be embedded.
pub struct PdfDocument {
    /// The underlying PDF document, exposed for low-level access.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used in order to set the PDF `ID` tag.
    pub identifier: String,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    pub fn new(pdf_document_identifier: String) -> Self {
        PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier,
            pages: Vec::new(),
        }
    }

    /// Adds an empty page with the given size in points and returns its index.
    pub fn add_page(&mut self, page_width: f32, page_height: f32) -> usize {
        self.pages.push(PdfPage {
            width: page_width,
            height: page_height,
            operations: Vec::new(),
        });
        self.pages.len() - 1
    }

    /// Write a single line of text with its baseline starting at the given position in points.
    pub fn write_text_to_page(
        &mut self,
        page_index: usize,
        style: TextStyle,
        text: &str,
        position: [f32; 2],
    ) -> Result<(), ContextError> {
        let page = self.pages.get_mut(page_index).ok_or_else(|| {
            ContextError::with_context(
                ErrorKind::Io,
                format!("Unable to find the page with index {}", page_index),
            )
        })?;

        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![style.font_resource().into(), style.font_size().into()],
            ),
            Operation::new("Td", vec![position[0].into(), position[1].into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(text),
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);

        Ok(())
    }

    /// Assemble the catalog, the pages and the fonts, then serialize the document.
    pub fn save_to_bytes(mut self) -> Result<Vec<u8>, ContextError> {
        let pages_id = self.inner_document.new_object_id();

        let regular_font_id = self.inner_document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_font_id = self.inner_document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = self.inner_document.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_font_id,
                "F2" => bold_font_id,
            },
        });

        let mut page_ids = Vec::<Object>::new();
        for page in std::mem::take(&mut self.pages) {
            let content = lopdf::content::Content {
                operations: page.operations,
            };
            let encoded_content = content.encode().map_err(|error| {
                ContextError::with_error(ErrorKind::Io, "Unable to encode the page content", &error)
            })?;
            let content_id = self
                .inner_document
                .add_object(lopdf::Stream::new(dictionary! {}, encoded_content));
            let page_id = self.inner_document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => page_ids,
        };
        self.inner_document
            .objects
            .insert(pages_id, Object::Dictionary(pages));

        let catalog_id = self.inner_document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        // Fixed dates keep the output reproducible for identical documents
        let timestamp = to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH);
        let document_info_id = self.inner_document.add_object(dictionary! {
            "Producer" => Object::string_literal("cvtex"),
            "CreationDate" => Object::string_literal(timestamp.clone()),
            "ModDate" => Object::string_literal(timestamp),
        });

        self.inner_document.trailer.set("Root", catalog_id);
        self.inner_document.trailer.set("Info", document_info_id);
        self.inner_document.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(self.identifier.clone().into_bytes(), StringFormat::Literal),
                Object::String(self.identifier.clone().into_bytes(), StringFormat::Literal),
            ]),
        );

        let mut bytes = Vec::new();
        self.inner_document.save_to(&mut bytes).map_err(|error| {
            ContextError::with_error(ErrorKind::Io, "Unable to serialize the PDF document", &error)
        })?;

        Ok(bytes)
    }
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

/// The fallback PDF strategy: draws the résumé directly, without LaTeX.
#[derive(Debug, Clone, Default)]
pub struct FallbackRenderer;

impl FallbackRenderer {
    pub fn render(&self, resume: &ResumeData) -> Result<Vec<u8>, ContextError> {
        let lines = layout_resume(resume);
        let mut pdf_document = PdfDocument::new("cvtex-fallback-resume".into());
        let page_index = pdf_document.add_page(PAGE_WIDTH, PAGE_HEIGHT);
        for line in &lines {
            pdf_document.write_text_to_page(page_index, line.style, &line.text, line.position)?;
        }
        let bytes = pdf_document.save_to_bytes()?;
        log::debug!(
            "Drew {} lines into a {} bytes fallback PDF",
            lines.len(),
            bytes.len()
        );

        Ok(bytes)
    }
}

impl PdfProducer for FallbackRenderer {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn produce(&self, resume: &ResumeData) -> Result<ProducedPdf, ContextError> {
        Ok(ProducedPdf {
            bytes: self.render(resume)?,
            log: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AwardEntry, EducationEntry, ExperienceEntry, ProjectEntry};

    fn texts(lines: &[DrawnLine]) -> Vec<&str> {
        lines.iter().map(|line| line.text.as_str()).collect()
    }

    #[test]
    fn long_heading_is_truncated_to_the_line_width() {
        let mut resume = ResumeData::default();
        resume.personal.full_name = "N".repeat(200);

        let lines = layout_resume(&resume);

        assert_eq!(lines[0].text, "N".repeat(MAX_LINE_CHARACTERS));
        assert_eq!(lines[0].style, TextStyle::Heading);
        assert!(FallbackRenderer.render(&resume).is_ok());
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let mut resume = ResumeData::default();
        resume.personal.full_name = "é".repeat(200);

        let lines = layout_resume(&resume);

        assert_eq!(lines[0].text.chars().count(), MAX_LINE_CHARACTERS);
    }

    #[test]
    fn gpa_line_only_when_present() {
        let mut resume = ResumeData::default();
        resume.education = vec![
            EducationEntry {
                school_name: "North".into(),
                gpa: Some("3.9".into()),
                ..Default::default()
            },
            EducationEntry {
                school_name: "South".into(),
                ..Default::default()
            },
        ];

        let lines = layout_resume(&resume);
        let gpa_lines: Vec<&str> = texts(&lines)
            .into_iter()
            .filter(|text| text.starts_with("GPA"))
            .collect();

        assert_eq!(gpa_lines, vec!["GPA: 3.9"]);
    }

    #[test]
    fn blank_responsibilities_are_not_drawn() {
        let mut resume = ResumeData::default();
        resume.experience = vec![ExperienceEntry {
            company_name: "Acme".into(),
            responsibilities: vec!["Did X".into(), "".into(), "  ".into(), "Did Y".into()],
            ..Default::default()
        }];

        let lines = layout_resume(&resume);
        let bullets: Vec<&str> = texts(&lines)
            .into_iter()
            .filter(|text| text.starts_with('\u{2022}'))
            .collect();

        assert_eq!(bullets, vec!["\u{2022} Did X", "\u{2022} Did Y"]);
    }

    #[test]
    fn optional_project_and_award_fields_are_skipped() {
        let mut resume = ResumeData::default();
        resume.projects = vec![ProjectEntry {
            project_name: "cvtex".into(),
            genre: "Tool".into(),
            ..Default::default()
        }];
        resume.awards = vec![AwardEntry {
            award_name: "Prize".into(),
            summary: "For things".into(),
            ..Default::default()
        }];

        let lines = layout_resume(&resume);
        let texts = texts(&lines);
        let project = texts.iter().position(|text| *text == "cvtex \u{2014} Tool").unwrap();
        let award = texts.iter().position(|text| *text == "Prize: For things").unwrap();

        assert_eq!(texts[project + 1], " - ");
        // The award is the last thing on the page: no awarder or date lines follow it.
        assert_eq!(award, texts.len() - 1);
    }

    #[test]
    fn cursor_moves_down_by_line_height() {
        let mut resume = ResumeData::default();
        resume.personal.full_name = "Ada".into();
        resume.personal.email = "ada@example.org".into();

        let lines = layout_resume(&resume);

        assert_eq!(lines[0].position, [LEFT_MARGIN, PAGE_HEIGHT - TOP_MARGIN]);
        assert_eq!(lines[1].position[1], PAGE_HEIGHT - TOP_MARGIN - LINE_HEIGHT);
        assert_eq!(lines[1].text, "ada@example.org");
    }

    #[test]
    fn overflowing_lines_stay_on_one_page() {
        let mut resume = ResumeData::default();
        resume.experience = (0..60)
            .map(|index| ExperienceEntry {
                company_name: format!("Company {}", index),
                responsibilities: vec!["Work".to_string(); 6],
                ..Default::default()
            })
            .collect();

        let lines = layout_resume(&resume);

        assert!(lines.iter().all(|line| line.position[1] >= BOTTOM_MARGIN));
        let bytes = FallbackRenderer.render(&resume).unwrap();
        let document = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn win_ansi_encoding_maps_punctuation() {
        assert_eq!(encode_win_ansi("A \u{2014} B"), vec![b'A', b' ', 0x97, b' ', b'B']);
        assert_eq!(encode_win_ansi("\u{2022}"), vec![0x95]);
        // A decomposed e + combining acute is composed first.
        assert_eq!(encode_win_ansi("e\u{301}"), vec![0xe9]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn fallback_pdf_is_a_valid_single_page_document() {
        let mut resume = ResumeData::default();
        resume.personal.full_name = "Ada Lovelace".into();

        let bytes = FallbackRenderer.render(&resume).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let document = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = document.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.get(&1).unwrap();
        let content = document.get_page_content(page_id).unwrap();
        let operations = lopdf::content::Content::decode(&content).unwrap().operations;
        let first_text = operations
            .iter()
            .find(|operation| operation.operator == "Tj")
            .unwrap();
        match &first_text.operands[0] {
            Object::String(bytes, _) => assert_eq!(bytes.as_slice(), b"Ada Lovelace"),
            other => panic!("unexpected operand {:?}", other),
        }
    }

    #[test]
    fn identical_documents_produce_identical_bytes() {
        let resume = ResumeData::default();

        assert_eq!(
            FallbackRenderer.render(&resume).unwrap(),
            FallbackRenderer.render(&resume).unwrap()
        );
    }
}
