//! Reply payloads handed back to the host for display.
//!
//! The host owns the actual embed rendering; these are just the strings and colour it needs.

use serde::{Deserialize, Serialize};

use super::BoardError;
use crate::board::models::{LeaderboardRecord, Page, RankedEntry};
use crate::constants::{COLOR_BOARD, COLOR_INGEST, COLOR_RESET, COLOR_TOP};

pub const TITLE_INGEST: &str = "✅ ĐÃ GHI NHẬN BẢNG XẾP HẠNG NGÀY";
pub const TITLE_TOP: &str = "🏆 TOP 10 CREW – TỔNG ĐIỂM";
pub const TITLE_BOARD: &str = "📊 BẢNG XẾP HẠNG CREW";
pub const TITLE_RESET: &str = "♻️ RESET BẢNG XẾP HẠNG";
const RESET_DESCRIPTION: &str = "Toàn bộ điểm crew đã được **reset về 0**.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

impl Embed {
    fn new(title: &str, description: String, color: u32) -> Self {
        Self {
            title: title.to_string(),
            description,
            color,
        }
    }
}

pub fn ingestion(records: &[LeaderboardRecord]) -> Embed {
    let description = records
        .iter()
        .enumerate()
        .map(|(i, r)| format!("**{}. [{}] {}** — +{} điểm\n", i + 1, r.tag, r.name, r.point))
        .collect();

    Embed::new(TITLE_INGEST, description, COLOR_INGEST)
}

pub fn top(rows: &[RankedEntry]) -> Embed {
    let description = rows
        .iter()
        .map(|r| {
            format!(
                "**{}. [{}] {}** — **{}** điểm\n",
                r.rank,
                r.tag,
                r.name,
                group_thousands(r.total)
            )
        })
        .collect();

    Embed::new(TITLE_TOP, description, COLOR_TOP)
}

pub fn board(pages: &[Page]) -> Vec<Embed> {
    pages
        .iter()
        .map(|page| {
            let description = page
                .entries
                .iter()
                .map(|r| {
                    format!(
                        "**{}. [{}] {}** — {} điểm\n",
                        r.rank,
                        r.tag,
                        r.name,
                        group_thousands(r.total)
                    )
                })
                .collect();

            Embed::new(TITLE_BOARD, description, COLOR_BOARD)
        })
        .collect()
}

pub fn reset() -> Embed {
    Embed::new(TITLE_RESET, RESET_DESCRIPTION.to_string(), COLOR_RESET)
}

/// Short user-facing text for a failed command. The host shows these only to the caller.
pub fn error_message(err: &BoardError) -> String {
    match err {
        BoardError::NoData => "❌ Chưa có dữ liệu.".to_string(),
        BoardError::ConfirmationRequired => {
            "❌ Bạn phải nhập **YES** để xác nhận reset.".to_string()
        }
        BoardError::MissingPermission => "❌ Bạn cần quyền quản trị viên.".to_string(),
        BoardError::Store(_) => "❌ Không đọc được dữ liệu bảng xếp hạng.".to_string(),
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
