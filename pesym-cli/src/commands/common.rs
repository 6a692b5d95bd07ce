use std::path::Path;

use anyhow::Context;
use pesym::{File, WalkOptions};

/// Longest raw name printed before it is cut short.
pub const MAX_RAW_NAME: usize = 60;

/// Load a PE32 image, validating its DOS and NT headers.
pub fn load_image(path: &Path) -> anyhow::Result<File> {
    File::from_file(path).with_context(|| format!("failed to load image: {}", path.display()))
}

/// Walk options for the `--full` flag.
pub fn walk_options(full: bool) -> WalkOptions {
    WalkOptions {
        base_name_only: !full,
    }
}

/// `0x`-prefixed uppercase hex, zero-padded to `pad` digits.
pub fn hexa(value: u64, pad: usize) -> String {
    format!("0x{value:0pad$X}")
}

/// Cut `name` to `max_len - 4` characters plus `...` when longer than `max_len`.
pub fn truncate(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let mut cut: String = name.chars().take(max_len.saturating_sub(4)).collect();
    cut.push_str("...");
    cut
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
