//! 從上傳檔案取出純文字：PDF、純文字（TXT/MD）與 DOCX。

use crate::utils::error::{BotError, Result};
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["pdf", "txt", "md", "text", "docx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Docx,
}

/// 取最後一個 `.` 之後的副檔名（小寫）；沒有 `.` 時為空字串
pub fn file_extension(filename: &str) -> String {
    let lower = filename.to_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" | "text" => Some(DocumentKind::PlainText),
            "docx" | "doc" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::from_extension(&file_extension(filename))
    }
}

fn strip_nul(text: String) -> String {
    if text.contains('\0') {
        text.replace('\0', "")
    } else {
        text
    }
}

/// 依序嘗試 UTF-8、Windows-1251、Latin-1
pub fn decode_text(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return strip_nul(text.to_string());
    }

    // 0x98 在 cp1251 沒有定義，但 encoding_rs 會映射成 U+0098，視為解碼失敗
    let (text, had_errors) = encoding_rs::WINDOWS_1251.decode_without_bom_handling(bytes);
    if !had_errors && !text.contains('\u{98}') {
        return strip_nul(text.into_owned());
    }

    // Latin-1 每個位元組都對應到同值的 code point
    strip_nul(bytes.iter().map(|&b| b as char).collect())
}

/// PDF 解析器遇到損壞檔案可能 panic，放到 blocking pool 隔離
pub async fn extract_pdf_text(bytes: Vec<u8>) -> String {
    let result =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes)).await;

    match result {
        Ok(Ok(pages)) => strip_nul(join_pages(&pages)),
        Ok(Err(e)) => {
            tracing::error!("❌ PDF text extraction failed: {}", e);
            String::new()
        }
        Err(e) => {
            tracing::error!("❌ PDF parser aborted: {}", e);
            String::new()
        }
    }
}

// 空白頁略過，頁與頁之間空一行
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn extract_docx_text(bytes: &[u8]) -> String {
    match read_docx(bytes) {
        Ok(text) => strip_nul(text),
        Err(e) => {
            tracing::error!("❌ DOCX text extraction failed: {}", e);
            String::new()
        }
    }
}

// WordprocessingML 元素一律以 local name 比對
fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// 段落內所有 run 的文字；`w:tab` 為 tab，`w:br` / `w:cr` 為換行
fn paragraph_text(paragraph: Node) -> String {
    let mut out = String::new();
    for run in paragraph.descendants().filter(|n| is_element(n, "r")) {
        for piece in run.children().filter(|n| n.is_element()) {
            match piece.tag_name().name() {
                "t" => out.push_str(piece.text().unwrap_or_default()),
                "tab" => out.push('\t'),
                "br" | "cr" => out.push('\n'),
                _ => {}
            }
        }
    }
    out
}

/// 每一列的非空儲存格以 " | " 連接；空白列略過
fn table_rows(table: Node) -> Vec<String> {
    table
        .children()
        .filter(|n| is_element(n, "tr"))
        .filter_map(|row| {
            let cells: Vec<String> = row
                .children()
                .filter(|n| is_element(n, "tc"))
                .map(|cell| cell_text(cell).trim().to_string())
                .filter(|text| !text.is_empty())
                .collect();
            (!cells.is_empty()).then(|| cells.join(" | "))
        })
        .collect()
}

/// 儲存格內的段落與巢狀表格，依文件順序以換行連接
fn cell_text(cell: Node) -> String {
    let mut lines = Vec::new();
    for child in cell.children() {
        if is_element(&child, "p") {
            lines.push(paragraph_text(child));
        } else if is_element(&child, "tbl") {
            lines.extend(table_rows(child));
        }
    }
    lines.join("\n")
}

/// 先取 body 直屬的段落，再逐列取 body 直屬的表格
fn read_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")?
        .read_to_string(&mut xml)
        .map_err(BotError::IoError)?;

    let document = Document::parse(&xml)?;
    let Some(body) = document.root_element().children().find(|n| is_element(n, "body")) else {
        return Ok(String::new());
    };

    let mut parts: Vec<String> = Vec::new();
    let mut tables = Vec::new();
    for child in body.children() {
        if is_element(&child, "p") {
            let text = paragraph_text(child);
            if !text.trim().is_empty() {
                parts.push(text);
            }
        } else if is_element(&child, "tbl") {
            tables.push(child);
        }
    }
    for table in tables {
        parts.extend(table_rows(table));
    }

    Ok(parts.join("\n\n"))
}
