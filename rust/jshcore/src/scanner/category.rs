//! Category - the tag every highlight carries
//!
//! Categories are ordered by precedence: a region claimed by an earlier
//! category can never be re-claimed by a later one in the same pass.

use serde::{Deserialize, Serialize};

/// Class shared by every marker element, regardless of category
pub const MARK_CLASS: &str = "jsh-mark";

/// Attribute carried by every marker element; value is the category slug
pub const MARK_ATTR: &str = "data-jsh-mark";

// ==================== TYPE DEFINITIONS ====================

/// Highlight category, declared in precedence order (highest first)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Terms the visitor searched for on the current site
    SearchTerm,
    AlwaysHighlight,
    Flagged,
    WorkType,
    Currency,
    Location,
}

impl Category {
    /// Every category, in precedence order
    pub const ALL: [Category; 6] = [
        Category::SearchTerm,
        Category::AlwaysHighlight,
        Category::Flagged,
        Category::WorkType,
        Category::Currency,
        Category::Location,
    ];

    /// Stable slug, used for the marker attribute and the CSS class suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SearchTerm => "search-term",
            Category::AlwaysHighlight => "always-highlight",
            Category::Flagged => "flagged",
            Category::WorkType => "work-type",
            Category::Currency => "currency",
            Category::Location => "location",
        }
    }

    /// Parse a slug produced by [`Category::as_str`]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == slug)
    }

    /// Lower is stronger
    pub fn precedence(&self) -> usize {
        *self as usize
    }

    /// Category-specific CSS class
    pub fn css_class(&self) -> String {
        format!("jsh-{}", self.as_str())
    }

    /// Full `class` attribute value for a marker of this category
    pub fn marker_classes(&self) -> String {
        format!("{} {}", MARK_CLASS, self.css_class())
    }

    /// Hover explanation shown on the marker
    pub fn tooltip(&self) -> &'static str {
        match self {
            Category::SearchTerm => {
                "Job Search Highlighter: You searched for this word or phrase on this website"
            }
            Category::AlwaysHighlight => {
                "Job Search Highlighter: You specified this word or phrase to always be highlighted"
            }
            Category::Flagged => {
                "Job Search Highlighter: You specified this as a flagged term that you should be made aware of"
            }
            Category::WorkType => "Job Search Highlighter: You marked this as a type of work",
            Category::Currency => {
                "Job Search Highlighter: This matches a pattern that looks like it might mention a compensation amount"
            }
            Category::Location => {
                "Job Search Highlighter: This location matches the pattern you specified"
            }
        }
    }

    /// Display hue (HSL degrees) used by the default stylesheet
    pub fn hue(&self) -> u16 {
        match self {
            Category::SearchTerm => 203,
            Category::AlwaysHighlight => 46,
            Category::Flagged => 0,
            Category::WorkType => 268,
            Category::Currency => 126,
            Category::Location => 28,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
