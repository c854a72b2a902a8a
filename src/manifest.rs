// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Ecosystem manifest (`package.json`) inspection.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// Path of the manifest inspected by the dependency probes.
pub const MANIFEST_PATH: &str = "package.json";

/// Substrings marking a development dependency as a test framework.
pub const TESTING_KEYWORDS: &[&str] =
    &["jest", "mocha", "jasmine", "karma", "chai", "cypress", "enzyme", "@testing-library"];
/// Substrings marking a development dependency as a linter or formatter.
pub const LINTING_KEYWORDS: &[&str] = &["eslint", "prettier", "tslint", "stylelint"];
/// Substrings marking a runtime dependency as security related.
pub const SECURITY_KEYWORDS: &[&str] = &["helmet", "csrf", "xss", "sanitize", "validate"];

const BASELINE_SCORE: f64 = 5.0;

/// Subset of `package.json` read by the probes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest
{
    #[serde(default)]
    pub dependencies:     Option<BTreeMap<String, Value,>,>,
    #[serde(default)]
    pub dev_dependencies: Option<BTreeMap<String, Value,>,>,
    #[serde(default)]
    pub scripts:          Option<BTreeMap<String, Value,>,>,
}

fn is_truthy(value: &Value,) -> bool
{
    match value {
        Value::Null => false,
        Value::Bool(flag,) => *flag,
        Value::Number(number,) => number.as_f64().is_some_and(|n| n != 0.0,),
        Value::String(text,) => !text.is_empty(),
        Value::Array(_,) | Value::Object(_,) => true,
    }
}

fn keys_match(map: Option<&BTreeMap<String, Value,>,>, keywords: &[&str],) -> bool
{
    map.is_some_and(|map| {
        map.keys().any(|name| keywords.iter().any(|keyword| name.contains(keyword,),),)
    },)
}

impl PackageManifest
{
    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the text is not a JSON object with the
    /// expected field shapes.
    pub fn parse(text: &str,) -> Result<Self, Error,>
    {
        serde_json::from_str(text,).map_err(|error| Error::decode(MANIFEST_PATH, error,),)
    }

    /// Whether a `dependencies` table is declared at all, even empty.
    pub fn declares_dependencies(&self,) -> bool
    {
        self.dependencies.is_some()
    }

    pub fn has_dependencies(&self,) -> bool
    {
        self.dependencies.as_ref().is_some_and(|map| !map.is_empty(),)
    }

    pub fn has_dev_dependencies(&self,) -> bool
    {
        self.dev_dependencies.as_ref().is_some_and(|map| !map.is_empty(),)
    }

    pub fn script_count(&self,) -> usize
    {
        self.scripts.as_ref().map_or(0, BTreeMap::len,)
    }

    /// Whether the named script is declared with a non-empty value.
    pub fn has_script(&self, name: &str,) -> bool
    {
        self.scripts.as_ref().and_then(|scripts| scripts.get(name,),).is_some_and(is_truthy,)
    }

    pub fn has_testing_tools(&self,) -> bool
    {
        keys_match(self.dev_dependencies.as_ref(), TESTING_KEYWORDS,)
    }

    pub fn has_linting_tools(&self,) -> bool
    {
        keys_match(self.dev_dependencies.as_ref(), LINTING_KEYWORDS,)
    }

    pub fn has_security_tools(&self,) -> bool
    {
        keys_match(self.dependencies.as_ref(), SECURITY_KEYWORDS,)
    }

    /// Whether any runtime dependency pins an exact version (starts with a
    /// digit rather than a range operator).
    pub fn has_pinned_versions(&self,) -> bool
    {
        self.dependencies.as_ref().is_some_and(|map| {
            map.values().any(|version| {
                version.as_str().and_then(|text| text.chars().next(),).is_some_and(|ch| ch.is_ascii_digit(),)
            },)
        },)
    }

    /// Dependency-management score: baseline 5 plus additive bonuses,
    /// capped at 10.
    pub fn management_score(&self,) -> f64
    {
        let scripts = self.script_count();
        let bonuses = [
            (self.has_dependencies(), 2.0,),
            (self.has_dev_dependencies(), 1.0,),
            (scripts > 0, 1.0,),
            (scripts > 3, 1.0,),
            (self.has_pinned_versions(), 1.0,),
        ];

        let score = bonuses.iter().filter(|(applies, _,)| *applies,).fold(BASELINE_SCORE, |acc, (_, bonus,)| acc + bonus,);
        score.min(10.0,)
    }
}
