// ==========================================
// 化工设备参数可视化 - PDF 渲染器
// ==========================================
// 页面: A4 纵向，内置 Helvetica / Helvetica-Bold（WinAnsi 编码）
// 非拉丁文字: Type0 CID 字体（UTF-16BE），不丢字符
// 单元格: 长文本折行，不截断
// 分页: 表格跨页时在新页重复表头行
// ==========================================

use crate::report::error::ReportResult;
use crate::report::layout::{ReportDocument, ReportTable};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

// ===== 页面几何（单位: pt）=====
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_TOP: f32 = 36.0;
const MARGIN_BOTTOM: f32 = 36.0;

const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const HEADER_CELL_SIZE: f32 = 12.0;

const LABEL_COL_WIDTH: f32 = 216.0; // 3 inch
const VALUE_COL_WIDTH: f32 = 144.0; // 2 inch
const HEADER_ROW_HEIGHT: f32 = 28.0;
const BODY_ROW_HEIGHT: f32 = 24.0;
const CELL_PADDING: f32 = 4.0;
const LINE_SPACING: f32 = 4.0;

/// 单行数据行在一页内的最大高度（页面可用高度扣除表头行）
const MAX_BODY_ROW_HEIGHT: f32 = PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM - HEADER_ROW_HEIGHT;

/// Helvetica 平均字宽系数（用于居中与折行）
const AVG_GLYPH_WIDTH: f32 = 0.52;
/// 全角字形宽度系数
const WIDE_GLYPH_WIDTH: f32 = 1.0;

/// 非拉丁文字使用的 CID 字体（Adobe-GB1 预定义字体，阅读器提供字形）
const UNICODE_BASE_FONT: &str = "STSong-Light";
/// UTF-16BE 编码的预定义 CMap
const UNICODE_CMAP: &str = "UniGB-UTF16-H";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Font {
    Regular,
    Bold,
    Unicode,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Unicode => "F3",
        }
    }

    /// 文本含 WinAnsi 无法表示的字符时切换到 Unicode 字体
    fn for_text(self, text: &str) -> Font {
        if text.chars().all(is_win_ansi) {
            self
        } else {
            Font::Unicode
        }
    }
}

/// 可由 Helvetica/WinAnsi 直接表示的字符（可打印 ASCII 与 Latin-1 补充）
fn is_win_ansi(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF)
}

/// 十六进制 RGB 颜色
#[derive(Clone, Copy)]
struct Rgb(u32);

impl Rgb {
    fn operands(self) -> Vec<Object> {
        let channel = |shift: u32| real(((self.0 >> shift) & 0xFF) as f32 / 255.0);
        vec![channel(16), channel(8), channel(0)]
    }
}

const WHITE: Rgb = Rgb(0xF5F5F5);
const TEXT: Rgb = Rgb(0x303133);

struct TableStyle {
    header_fill: Rgb,
    body_fill: Rgb,
    grid: Rgb,
}

const STATS_STYLE: TableStyle = TableStyle {
    header_fill: Rgb(0x2C3E50),
    body_fill: Rgb(0xECF0F1),
    grid: Rgb(0xBDC3C7),
};

const DISTRIBUTION_STYLE: TableStyle = TableStyle {
    header_fill: Rgb(0x27AE60),
    body_fill: Rgb(0xE8F8F0),
    grid: Rgb(0xA3D9B1),
};

/// 一行表格的绘制样式
struct RowStyle {
    fill: Rgb,
    grid: Rgb,
    font: Font,
    size: f32,
    color: Rgb,
    min_height: f32,
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// 控制字符替换为空格
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// 按字体编码: WinAnsi 单字节，Unicode 字体为 UTF-16BE
fn encode_text(font: Font, text: &str) -> Vec<u8> {
    match font {
        Font::Unicode => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        Font::Regular | Font::Bold => text
            .chars()
            .map(|c| if is_win_ansi(c) { c as u32 as u8 } else { b' ' })
            .collect(),
    }
}

/// 估算宽度（ASCII 按 Helvetica 平均字宽，其余按全角）
fn text_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| if c.is_ascii() { AVG_GLYPH_WIDTH } else { WIDE_GLYPH_WIDTH })
        .sum::<f32>()
        * size
}

/// 按可用宽度折行: 优先在空白处断开，单个词超宽时按字符断开；不丢弃任何字符
fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    if text_width(text, size) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if current.chars().count() > 1 && text_width(&current, size) > max_width {
                current.pop();
                lines.push(std::mem::replace(&mut current, c.to_string()));
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn line_height(size: f32) -> f32 {
    size + LINE_SPACING
}

/// n 行文本所需的单元格高度
fn cell_height(size: f32, lines: usize, min_height: f32) -> f32 {
    min_height.max(lines as f32 * line_height(size) + 2.0 * CELL_PADDING)
}

/// 给定高度内可容纳的行数（至少 1 行）
fn lines_within(size: f32, height: f32) -> usize {
    let fit = ((height - 2.0 * CELL_PADDING) / line_height(size) + 1e-3).floor();
    if fit >= 1.0 {
        fit as usize
    } else {
        1
    }
}

// ==========================================
// PageCursor - 分页游标
// ==========================================
struct PageCursor {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN_TOP;
    }

    /// 剩余空间不足 height 时换页；返回是否发生换页
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN_BOTTOM
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // pages 至少包含一页
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text(&mut self, font: Font, size: f32, color: Rgb, x: f32, y: f32, text: &str) {
        let text = sanitize(text);
        let font = font.for_text(&text);
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("rg", color.operands()));
        ops.push(Operation::new(
            "Tf",
            vec![font.resource_name().into(), real(size)],
        ));
        ops.push(Operation::new("Td", vec![real(x), real(y)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_text(font, &text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    #[allow(clippy::too_many_arguments)]
    fn centered_text(&mut self, font: Font, size: f32, color: Rgb, left: f32, width: f32, y: f32, text: &str) {
        let x = left + (width - text_width(text, size)).max(0.0) / 2.0;
        self.text(font, size, color, x, y, text);
    }

    /// 单元格内多行文本: 水平居中，整体垂直居中
    fn cell_lines(&mut self, style: &RowStyle, left: f32, width: f32, top: f32, height: f32, lines: &[String]) {
        let block = lines.len() as f32 * line_height(style.size);
        let first_top = top - (height - block) / 2.0;
        for (idx, line) in lines.iter().enumerate() {
            let baseline = first_top - (idx + 1) as f32 * line_height(style.size)
                + (line_height(style.size) - style.size) / 2.0
                + 2.0;
            self.centered_text(style.font, style.size, style.color, left, width, baseline, line);
        }
    }

    fn cell(&mut self, fill: Rgb, grid: Rgb, x: f32, y: f32, width: f32, height: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("rg", fill.operands()));
        ops.push(Operation::new("RG", grid.operands()));
        ops.push(Operation::new("w", vec![real(1.0)]));
        ops.push(Operation::new(
            "re",
            vec![real(x), real(y), real(width), real(height)],
        ));
        ops.push(Operation::new("B", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }
}

// ==========================================
// RenderedPdf - 渲染结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

// ==========================================
// PdfRenderer - PDF 渲染器
// ==========================================
pub struct PdfRenderer {
    table_left: f32,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self {
            table_left: (PAGE_WIDTH - LABEL_COL_WIDTH - VALUE_COL_WIDTH) / 2.0,
        }
    }

    /// 渲染报表文档
    pub fn render(&self, document: &ReportDocument) -> ReportResult<RenderedPdf> {
        let pages = self.layout(document);
        let page_count = pages.len();
        let bytes = self.write_pdf(document, pages)?;

        tracing::debug!(
            "报表渲染完成: dataset_id={:?}, pages={}, bytes={}",
            document.dataset_id,
            page_count,
            bytes.len()
        );

        Ok(RenderedPdf { bytes, page_count })
    }

    // ==========================================
    // 布局: 文档 -> 每页绘制指令
    // ==========================================
    fn layout(&self, document: &ReportDocument) -> Vec<Vec<Operation>> {
        let mut cursor = PageCursor::new();

        // 标题
        cursor.y -= TITLE_SIZE;
        cursor.centered_text(Font::Bold, TITLE_SIZE, TEXT, 0.0, PAGE_WIDTH, cursor.y, &document.title);
        cursor.y -= 30.0;

        // 元数据
        for line in document.metadata_lines() {
            cursor.y -= BODY_SIZE + 5.0;
            cursor.text(Font::Regular, BODY_SIZE, TEXT, self.table_left, cursor.y, &line);
        }
        cursor.y -= 20.0;

        for (idx, table) in document.tables().enumerate() {
            let style = if idx == 0 { &STATS_STYLE } else { &DISTRIBUTION_STYLE };
            self.draw_table(&mut cursor, table, style);
            cursor.y -= 30.0;
        }

        cursor.pages
    }

    fn draw_table(&self, cursor: &mut PageCursor, table: &ReportTable, style: &TableStyle) {
        // 标题 + 表头 + 至少一行数据放在同一页
        cursor.ensure_space(HEADING_SIZE + 12.0 + HEADER_ROW_HEIGHT + BODY_ROW_HEIGHT);

        cursor.y -= HEADING_SIZE;
        cursor.text(Font::Bold, HEADING_SIZE, TEXT, self.table_left, cursor.y, &table.heading);
        cursor.y -= 12.0;

        self.draw_header_row(cursor, table, style);

        let body = RowStyle {
            fill: style.body_fill,
            grid: style.grid,
            font: Font::Regular,
            size: BODY_SIZE,
            color: TEXT,
            min_height: BODY_ROW_HEIGHT,
        };

        for (label, value) in &table.rows {
            let mut label_lines = wrap_text(&sanitize(label), BODY_SIZE, LABEL_COL_WIDTH - 2.0 * CELL_PADDING);
            let mut value_lines = wrap_text(&sanitize(value), BODY_SIZE, VALUE_COL_WIDTH - 2.0 * CELL_PADDING);

            // 折行后超过一页的行拆成多段，后续段在新页（含表头）继续
            loop {
                let lines = label_lines.len().max(value_lines.len());
                let height = cell_height(BODY_SIZE, lines, BODY_ROW_HEIGHT).min(MAX_BODY_ROW_HEIGHT);
                if cursor.ensure_space(height) {
                    self.draw_header_row(cursor, table, style);
                }

                let fit = lines_within(BODY_SIZE, cursor.remaining()).min(lines);
                let label_rest = label_lines.split_off(fit.min(label_lines.len()));
                let value_rest = value_lines.split_off(fit.min(value_lines.len()));

                self.draw_row(cursor, &label_lines, &value_lines, &body, fit);

                if label_rest.is_empty() && value_rest.is_empty() {
                    break;
                }
                label_lines = label_rest;
                value_lines = value_rest;
            }
        }
    }

    fn draw_header_row(&self, cursor: &mut PageCursor, table: &ReportTable, style: &TableStyle) {
        let header = RowStyle {
            fill: style.header_fill,
            grid: style.grid,
            font: Font::Bold,
            size: HEADER_CELL_SIZE,
            color: WHITE,
            min_height: HEADER_ROW_HEIGHT,
        };
        self.draw_row(
            cursor,
            &[table.header.0.clone()],
            &[table.header.1.clone()],
            &header,
            1,
        );
    }

    fn draw_row(&self, cursor: &mut PageCursor, label: &[String], value: &[String], style: &RowStyle, lines: usize) {
        let height = cell_height(style.size, lines, style.min_height);
        let top = cursor.y;
        let bottom = top - height;
        let value_left = self.table_left + LABEL_COL_WIDTH;

        cursor.cell(style.fill, style.grid, self.table_left, bottom, LABEL_COL_WIDTH, height);
        cursor.cell(style.fill, style.grid, value_left, bottom, VALUE_COL_WIDTH, height);

        cursor.cell_lines(style, self.table_left, LABEL_COL_WIDTH, top, height, label);
        cursor.cell_lines(style, value_left, VALUE_COL_WIDTH, top, height, value);

        cursor.y = bottom;
    }

    // ==========================================
    // 写出: 绘制指令 -> PDF 字节
    // ==========================================
    fn write_pdf(&self, document: &ReportDocument, pages: Vec<Vec<Operation>>) -> ReportResult<Vec<u8>> {
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
        let unicode_id = add_unicode_font(&mut doc);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                Font::Regular.resource_name() => regular_id,
                Font::Bold.resource_name() => bold_id,
                Font::Unicode.resource_name() => unicode_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_text(Font::Regular, &document.title), StringFormat::Literal),
            "Producer" => Object::String(
                encode_text(
                    Font::Regular,
                    concat!("chem-equipment-visualizer ", env!("CARGO_PKG_VERSION")),
                ),
                StringFormat::Literal,
            ),
        });
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Type0 复合字体: STSong-Light + UniGB-UTF16-H，字形由阅读器提供
fn add_unicode_font(doc: &mut Document) -> ObjectId {
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => UNICODE_BASE_FONT,
        "Flags" => Object::Integer(6),
        "FontBBox" => vec![
            Object::Integer(-25),
            Object::Integer(-254),
            Object::Integer(1000),
            Object::Integer(880),
        ],
        "ItalicAngle" => Object::Integer(0),
        "Ascent" => Object::Integer(880),
        "Descent" => Object::Integer(-120),
        "CapHeight" => Object::Integer(880),
        "StemV" => Object::Integer(93),
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => UNICODE_BASE_FONT,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("GB1"),
            "Supplement" => Object::Integer(2),
        },
        "FontDescriptor" => descriptor_id,
        "DW" => Object::Integer(1000),
        // CID 1..95 为半角拉丁字形
        "W" => vec![Object::Integer(1), Object::Integer(95), Object::Integer(500)],
    });
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => format!("{}-{}", UNICODE_BASE_FONT, UNICODE_CMAP).as_str(),
        "Encoding" => UNICODE_CMAP,
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
    })
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TypeDistribution;
    use crate::report::layout::ReportInput;
    use chrono::NaiveDate;

    fn doc_with_types(n: usize) -> ReportDocument {
        let input = ReportInput {
            total_equipment: Some(n as u64),
            avg_flowrate: Some(1.0),
            avg_pressure: Some(2.0),
            avg_temperature: Some(3.0),
            type_distribution: TypeDistribution::from_pairs(
                (0..n).map(|i| (format!("Type-{:03}", i), 1u64)),
            ),
        };
        let at = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ReportDocument::build(&input, Some(1), at)
    }

    #[test]
    fn test_small_report_is_single_page_pdf() {
        let rendered = PdfRenderer::new().render(&doc_with_types(2)).unwrap();
        assert_eq!(rendered.page_count, 1);
        assert!(rendered.bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_long_distribution_spills_to_more_pages() {
        let rendered = PdfRenderer::new().render(&doc_with_types(80)).unwrap();
        assert!(rendered.page_count >= 3);

        let parsed = Document::load_mem(&rendered.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), rendered.page_count);
    }

    #[test]
    fn test_encode_text_by_font() {
        assert_eq!(encode_text(Font::Regular, "Pump"), b"Pump".to_vec());
        assert_eq!(encode_text(Font::Regular, "°C"), vec![0xB0, b'C']);
        assert_eq!(encode_text(Font::Unicode, "泵A"), vec![0x6C, 0xF5, 0x00, 0x41]);
    }

    #[test]
    fn test_non_latin_text_switches_to_unicode_font() {
        assert_eq!(Font::Regular.for_text("Pump °C"), Font::Regular);
        assert_eq!(Font::Regular.for_text("离心泵"), Font::Unicode);
        assert_eq!(Font::Bold.for_text("Pompe à chaleur"), Font::Bold);
        assert_eq!(Font::Bold.for_text("Насос"), Font::Unicode);
    }

    #[test]
    fn test_wrap_text_breaks_on_spaces() {
        let name = "Centrifugal Compressor Unit Model X-1000 with Extended Housing";
        let width = LABEL_COL_WIDTH - 2.0 * CELL_PADDING;
        let lines = wrap_text(name, BODY_SIZE, width);

        assert!(lines.len() >= 2);
        assert!(lines.iter().all(|l| text_width(l, BODY_SIZE) <= width));
        assert_eq!(lines.join(" "), name);
    }

    #[test]
    fn test_wrap_text_breaks_long_words_by_char() {
        let long = "X".repeat(200);
        let width = LABEL_COL_WIDTH - 2.0 * CELL_PADDING;
        let lines = wrap_text(&long, BODY_SIZE, width);

        assert!(lines.len() >= 2);
        assert!(lines.iter().all(|l| text_width(l, BODY_SIZE) <= width));
        assert_eq!(lines.concat(), long);
    }

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(wrap_text("Pump", BODY_SIZE, 100.0), vec!["Pump".to_string()]);
        assert_eq!(wrap_text("", BODY_SIZE, 100.0), vec![String::new()]);
    }

    #[test]
    fn test_unicode_font_registered() {
        let rendered = PdfRenderer::new().render(&doc_with_types(1)).unwrap();
        let parsed = Document::load_mem(&rendered.bytes).unwrap();

        let has_type0 = parsed.objects.values().any(|obj| {
            obj.as_dict()
                .ok()
                .and_then(|d| d.get(b"Encoding").ok())
                .and_then(|e| e.as_name().ok())
                == Some(UNICODE_CMAP.as_bytes())
        });
        assert!(has_type0);
    }
}
