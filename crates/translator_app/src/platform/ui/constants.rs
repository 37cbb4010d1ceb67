pub const CHANNEL_DOT: &str = "●";
pub const PROLOGUE_BADGE: &str = "Prologue";
pub const EPILOGUE_BADGE: &str = "Epilogue";

pub const CHUNK_DONE: char = '✓';
pub const CHUNK_ACTIVE: char = '▶';
pub const CHUNK_PENDING: char = '·';

pub const PROGRESS_WIDTH: usize = 20;
pub const RULE: &str = "────────────────────────────────────────";
pub const DOWNLOAD_HINT: &str = "💾 Download available: run without --no-download to save it";
