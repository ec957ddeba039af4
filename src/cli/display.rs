// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal display helpers: ANSI styling that degrades to plain text
//! when stderr is not a TTY.

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RESET: &str = "\x1b[0m";

/// Wrap `text` in the ANSI code when stderr is a terminal.
pub fn styled(code: &str, text: &str) -> String {
    if atty::is(atty::Stream::Stderr) {
        format!("{}{}{}", code, text, RESET)
    } else {
        text.to_string()
    }
}
