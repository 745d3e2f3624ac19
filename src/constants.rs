pub const DEFAULT_RANK_FILE: &str = "ranking.json";
pub const DEFAULT_DAILY_FILE: &str = "daily_logs.json";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_SERVICE_NAME: &str = "crewrank";
pub const TRACER_NAME: &str = "crewrank-tracer";

/// Bot-local time is pinned to UTC+7 regardless of host timezone
pub const LOCAL_UTC_OFFSET_SECS: i32 = 7 * 3600;
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

// LEADERBOARD SECTION HEADERS
//
// Matched as substrings; the header line itself never carries data.
pub const HEADER_CREW: &str = "Tên Crew";
pub const HEADER_LEVEL: &str = "Cấp độ";
pub const HEADER_POINT: &str = "Điểm";

pub const TOP_LIMIT: usize = 10;
pub const BOARD_PAGE_SIZE: usize = 20;
pub const RESET_CONFIRMATION: &str = "YES";

// EMBED COLOURS
pub const COLOR_INGEST: u32 = 0x2ecc71;
pub const COLOR_TOP: u32 = 0xf1c40f;
pub const COLOR_BOARD: u32 = 0x3498db;
pub const COLOR_RESET: u32 = 0xe74c3c;
