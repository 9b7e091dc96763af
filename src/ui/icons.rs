//! Shared UI icons.
//!
//! Each icon falls back to plain ASCII when the terminal can't render emoji.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR] ");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "* ");

// File indicators
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "- ");
pub static FILE_NEW: Emoji<'_, '_> = Emoji("📄 ", "- ");

// Request indicators
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");
