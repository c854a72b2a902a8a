// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// README quality scoring from length and structural signals.
use regex::Regex;

use crate::error::Error;

/// Structural signals extracted from README text.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct ReadmeSignals
{
    /// Length in characters.
    pub length:          usize,
    pub headings:        usize,
    pub has_code_blocks: bool,
    pub has_images:      bool,
}

impl ReadmeSignals
{
    /// Score in `0..=10`, two points per satisfied signal.
    pub fn score(&self,) -> f64
    {
        let signals = [
            self.length > 500,
            self.length > 2000,
            self.headings > 3,
            self.has_code_blocks,
            self.has_images,
        ];
        signals.iter().filter(|signal| **signal,).count() as f64 * 2.0
    }
}

/// Extracts [`ReadmeSignals`] from README text.
pub struct ReadmeScorer
{
    heading: Regex,
}

impl ReadmeScorer
{
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the heading expression fails to
    /// compile.
    pub fn new() -> Result<Self, Error,>
    {
        let heading = Regex::new(r"#+\s+\w+",)
            .map_err(|e| Error::validation(format!("invalid heading regex: {e}"),),)?;
        Ok(Self {
            heading,
        },)
    }

    pub fn signals(&self, text: &str,) -> ReadmeSignals
    {
        ReadmeSignals {
            length:          text.chars().count(),
            headings:        self.heading.find_iter(text,).count(),
            has_code_blocks: text.matches("```",).count() > 1,
            has_images:      text.contains("![",),
        }
    }
}
