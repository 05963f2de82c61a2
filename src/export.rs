use crate::classifier::is_women_college;
use crate::error::Result;
use crate::models::{Category, SeatRecord};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 30.0;
const BOTTOM_MARGIN: f32 = 40.0;
const ROW_HEIGHT: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 8.0;
// rough Helvetica advance, used to clip cell text
const CHAR_WIDTH_EM: f32 = 0.55;

const HEADER_FILL: (f32, f32, f32) = (41.0 / 255.0, 128.0 / 255.0, 185.0 / 255.0);
const ALTERNATE_FILL: (f32, f32, f32) = (245.0 / 255.0, 245.0 / 255.0, 245.0 / 255.0);
const WOMEN_FILL: (f32, f32, f32) = (252.0 / 255.0, 228.0 / 255.0, 236.0 / 255.0);

const COLUMNS: [(&str, f32); 7] = [
    ("#", 25.0),
    ("Inst Code", 50.0),
    ("Institute Name", 170.0),
    ("Branch Code", 45.0),
    ("Branch Name", 135.0),
    ("Dist Code", 40.0),
    ("Place", 70.0),
];

/// Query values printed above the table and used to name the output file.
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    pub name: String,
    pub rank: String,
    pub category: String,
}

impl ExportContext {
    fn header_lines(&self) -> [String; 3] {
        [
            format!("Student Name: {}", or_na(&self.name)),
            format!("Rank: {}", or_na(&self.rank)),
            format!("Category: {}", or_na(&self.category)),
        ]
    }
}

fn or_na(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "N/A"
    } else {
        trimmed
    }
}

/// File name (without extension) built from the non-empty context values.
fn collapse_whitespace(value: &str) -> String {
    static WHITESPACE: OnceLock<Option<Regex>> = OnceLock::new();
    match WHITESPACE.get_or_init(|| Regex::new(r"\s+").ok()) {
        Some(pattern) => pattern.replace_all(value.trim(), "_").into_owned(),
        None => value.trim().replace(char::is_whitespace, "_"),
    }
}

pub fn export_file_stem(ctx: &ExportContext) -> String {
    let parts: Vec<String> = [&ctx.name, &ctx.rank, &ctx.category]
        .iter()
        .map(|value| {
            collapse_whitespace(value)
                .chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
                .collect::<String>()
        })
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        "seat_shortlist".to_string()
    } else {
        parts.join("_")
    }
}

fn table_row(index: usize, record: &SeatRecord) -> [String; 7] {
    [
        (index + 1).to_string(),
        record.inst_code.clone(),
        record.institute_name.clone(),
        record.branch_code.clone(),
        record.branch_name.clone(),
        record.dist_code.clone(),
        record.place.clone(),
    ]
}

/// Helvetica in a standard PDF font only covers Latin-1, keep it to ASCII.
fn pdf_text(text: &str) -> Object {
    let ascii: String = text
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect();
    Object::string_literal(ascii)
}

fn clip(text: &str, width: f32) -> String {
    let max_chars = ((width - 4.0) / (BODY_FONT_SIZE * CHAR_WIDTH_EM)).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(2)).collect();
    format!("{}..", kept)
}

struct PageBuilder {
    operations: Vec<Operation>,
}

impl PageBuilder {
    fn new() -> Self {
        Self { operations: Vec::new() }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new("Tj", vec![pdf_text(text)]));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn fill_color(&mut self, (r, g, b): (f32, f32, f32)) {
        self.operations.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: (f32, f32, f32)) {
        self.fill_color(color);
        self.operations.push(Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]));
        self.operations.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.operations.push(Operation::new("RG", vec![0.8_f32.into(), 0.8_f32.into(), 0.8_f32.into()]));
        self.operations.push(Operation::new("w", vec![0.5_f32.into()]));
        self.operations.push(Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]));
        self.operations.push(Operation::new("S", vec![]));
    }

    /// Draw one table row whose top edge sits at `top`.
    fn row(&mut self, top: f32, cells: &[String; 7], fill: Option<(f32, f32, f32)>, header: bool) {
        let bottom = top - ROW_HEIGHT;
        let table_width: f32 = COLUMNS.iter().map(|(_, w)| w).sum();
        if let Some(color) = fill {
            self.fill_rect(MARGIN, bottom, table_width, ROW_HEIGHT, color);
        }

        self.fill_color(if header { (1.0, 1.0, 1.0) } else { (0.0, 0.0, 0.0) });
        let font = if header { "F2" } else { "F1" };
        let mut x = MARGIN;
        for ((_, width), cell) in COLUMNS.iter().zip(cells.iter()) {
            self.text(font, BODY_FONT_SIZE, x + 2.0, bottom + 4.0, &clip(cell, *width));
            self.stroke_rect(x, bottom, *width, ROW_HEIGHT);
            x += width;
        }
    }

    fn column_header(&mut self, top: f32) {
        let cells = COLUMNS.map(|(title, _)| title.to_string());
        self.row(top, &cells, Some(HEADER_FILL), true);
    }

    fn finish(self) -> Content {
        Content { operations: self.operations }
    }
}

fn layout_pages(rows: &[SeatRecord], ctx: &ExportContext) -> Vec<Content> {
    let mut pages = Vec::new();
    let mut page = PageBuilder::new();

    page.fill_color((0.0, 0.0, 0.0));
    page.text("F2", 14.0, MARGIN, PAGE_HEIGHT - 42.0, "Seat Allotment Shortlist");
    let mut y = PAGE_HEIGHT - 62.0;
    for line in ctx.header_lines() {
        page.text("F1", 11.0, MARGIN, y, &line);
        y -= 14.0;
    }

    let mut top = y - 8.0;
    page.column_header(top);
    top -= ROW_HEIGHT;

    for (index, record) in rows.iter().enumerate() {
        if top - ROW_HEIGHT < BOTTOM_MARGIN {
            pages.push(std::mem::replace(&mut page, PageBuilder::new()).finish());
            top = PAGE_HEIGHT - MARGIN;
            page.column_header(top);
            top -= ROW_HEIGHT;
        }

        let fill = if is_women_college(record) {
            Some(WOMEN_FILL)
        } else if index % 2 == 1 {
            Some(ALTERNATE_FILL)
        } else {
            None
        };
        page.row(top, &table_row(index, record), fill, false);
        top -= ROW_HEIGHT;
    }

    pages.push(page.finish());
    pages
}

/// Render the view as a PDF document.
pub fn render_pdf(rows: &[SeatRecord], ctx: &ExportContext) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for content in layout_pages(rows, ctx) {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.0_f32.into(), 0.0_f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    tracing::debug!(rows = rows.len(), bytes = bytes.len(), "rendered pdf");
    Ok(bytes)
}

pub fn write_pdf(rows: &[SeatRecord], ctx: &ExportContext, output_dir: &Path) -> Result<PathBuf> {
    let bytes = render_pdf(rows, ctx)?;
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.pdf", export_file_stem(ctx)));
    fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote pdf");
    Ok(path)
}

/// Write the view as CSV, adding the active category's rank column when there is one.
pub fn write_csv(
    rows: &[SeatRecord],
    ctx: &ExportContext,
    category: Option<Category>,
    output_dir: &Path,
) -> Result<PathBuf> {
    use csv::Writer;

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.csv", export_file_stem(ctx)));
    let mut writer = Writer::from_path(&path)?;

    // One rank column for the active category, or every category when none is active.
    let rank_columns: Vec<Category> = match category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };

    let mut headers: Vec<String> = COLUMNS.iter().map(|(title, _)| title.to_string()).collect();
    headers.extend(rank_columns.iter().map(|c| c.label().to_string()));
    headers.push("Tuition Fee".to_string());
    writer.write_record(&headers)?;

    for (index, record) in rows.iter().enumerate() {
        let mut fields: Vec<String> = table_row(index, record).to_vec();
        fields.extend(rank_columns.iter().map(|&c| record.rank_display(c)));
        fields.push(record.tuition_fee_display());
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{seat, with_rank};

    fn context() -> ExportContext {
        ExportContext {
            name: "Ravi  Kumar".to_string(),
            rank: "4512".to_string(),
            category: "BC-A Boys".to_string(),
        }
    }

    #[test]
    fn file_stem_replaces_whitespace() {
        assert_eq!(export_file_stem(&context()), "Ravi_Kumar_4512_BC-A_Boys");
        assert_eq!(export_file_stem(&ExportContext::default()), "seat_shortlist");

        let partial = ExportContext { name: "../etc passwd".to_string(), ..Default::default() };
        assert_eq!(export_file_stem(&partial), "etc_passwd");

        let spaced = ExportContext { name: " Sita\t\n Devi ".to_string(), ..Default::default() };
        assert_eq!(export_file_stem(&spaced), "Sita_Devi");
    }

    #[test]
    fn header_lines_fall_back_to_na() {
        let lines = ExportContext::default().header_lines();
        assert_eq!(lines[0], "Student Name: N/A");
        assert_eq!(lines[2], "Category: N/A");
    }

    #[test]
    fn clips_long_cells() {
        let long = "JAWAHARLAL NEHRU TECHNOLOGICAL UNIVERSITY HYDERABAD COLLEGE OF ENGINEERING";
        let clipped = clip(long, 70.0);
        assert!(clipped.ends_with(".."));
        assert!(clipped.chars().count() < long.chars().count());
        assert_eq!(clip("CSE", 45.0), "CSE");
    }

    #[test]
    fn empty_view_renders_a_single_page_document() {
        let bytes = render_pdf(&[], &ExportContext::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_views_flow_onto_more_pages() {
        let rows: Vec<SeatRecord> = (0..120)
            .map(|i| with_rank(seat(&format!("INSTITUTE {}", i), "CSE"), Category::OcBoys, "10"))
            .collect();
        let bytes = render_pdf(&rows, &context()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 3);
    }

    #[test]
    fn women_rows_are_filled() {
        let rows = vec![
            with_rank(seat("CBIT", "CSE"), Category::OcBoys, "10"),
            with_rank(seat("STANLEY", "IT"), Category::OcGirls, "20"),
        ];
        let pages = layout_pages(&rows, &context());
        let pink_fills = pages[0]
            .operations
            .iter()
            .filter(|op| {
                op.operator == "rg"
                    && op.operands.first().and_then(|o| o.as_float().ok()) == Some(WOMEN_FILL.0)
            })
            .count();
        assert_eq!(pink_fills, 1);
    }

    #[test]
    fn writes_pdf_and_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut fee_row = with_rank(seat("CBIT", "CSE"), Category::BcABoys, "4512");
        fee_row.tuition_fee = Some(crate::models::RankValue::Number(140000.0));
        let rows = vec![fee_row];

        let pdf = write_pdf(&rows, &context(), dir.path()).unwrap();
        assert_eq!(pdf.file_name().unwrap(), "Ravi_Kumar_4512_BC-A_Boys.pdf");
        assert!(pdf.exists());

        let csv_path = write_csv(&rows, &context(), Some(Category::BcABoys), dir.path()).unwrap();
        let content = std::fs::read_to_string(csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "#,Inst Code,Institute Name,Branch Code,Branch Name,Dist Code,Place,BC-A Boys,Tuition Fee"
        );
        assert_eq!(lines.next().unwrap(), "1,CBIT,CBIT,CSE,CSE,,,4512,140000");
    }

    #[test]
    fn csv_without_category_lists_every_rank_column() {
        let dir = tempfile::tempdir().unwrap();
        let record = with_rank(seat("CBIT", "CSE"), Category::OcGirls, "20");
        let rows = vec![with_rank(record, Category::BcABoys, "4512")];

        let csv_path = write_csv(&rows, &ExportContext::default(), None, dir.path()).unwrap();
        let content = std::fs::read_to_string(csv_path).unwrap();
        let mut lines = content.lines();

        let headers: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(headers.len(), COLUMNS.len() + Category::ALL.len() + 1);
        assert_eq!(&headers[7..10], &["OC Boys", "OC Girls", "BC-A Boys"]);
        assert_eq!(headers[24], "EWS GIRLS OU");
        assert_eq!(headers[25], "Tuition Fee");

        let fields: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(fields.len(), headers.len());
        assert_eq!(&fields[7..10], &["", "20", "4512"]);
    }
}
