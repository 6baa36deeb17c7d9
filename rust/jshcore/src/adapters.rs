//! Site adapters - per-site watch tables
//!
//! The engine has no per-site conditionals. Each supported site is an
//! [`AdapterRecord`]: where its job description and location blocks live,
//! which query parameter holds the visitor's search, and a few one-shot
//! tweaks (extra CSS, a click to expand a collapsed description).
//! Records are plain data and deserialize from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dom::{Page, PageError};
use crate::engine::Engine;
use crate::watch::{Repeat, WatchOptions};

// =============================================================================
// Records
// =============================================================================

/// What a watch does with each matched element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WatchTarget {
    /// Free-text annotation
    Description,
    /// Whole-block location classification
    Location {
        #[serde(default)]
        text_nodes_only: bool,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WatchSpec {
    pub selector: String,
    pub target: WatchTarget,
    #[serde(default)]
    pub repeat: Repeat,
    /// Stay dormant this long after install
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

impl WatchSpec {
    fn description(selector: &str, repeat: Repeat) -> Self {
        Self {
            selector: selector.to_string(),
            target: WatchTarget::Description,
            repeat,
            delay_ms: None,
        }
    }

    fn location(selector: &str, repeat: Repeat, text_nodes_only: bool) -> Self {
        Self {
            selector: selector.to_string(),
            target: WatchTarget::Location { text_nodes_only },
            repeat,
            delay_ms: None,
        }
    }

    fn delayed(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }
}

/// Page tweaks applied once at install time
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OneShotAction {
    InjectStyle { css: String },
    /// Add a class to the first elements matching `selector`
    AddClass { selector: String, class: String },
    /// Click the first elements matching `selector` after a delay
    ClickAfter { selector: String, delay_ms: u64 },
}

/// One supported site (or one section of a site)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AdapterRecord {
    pub name: String,
    /// Matched as a substring of the page hostname
    pub host: String,
    /// Path prefixes this record applies to; empty means every path
    #[serde(default)]
    pub path_prefixes: Vec<String>,
    /// Query parameter holding the visitor's search
    #[serde(default)]
    pub search_param: Option<String>,
    #[serde(default)]
    pub watches: Vec<WatchSpec>,
    #[serde(default)]
    pub actions: Vec<OneShotAction>,
}

// =============================================================================
// Install capability
// =============================================================================

/// Something that can set up an engine for a page
pub trait SiteAdapter {
    fn name(&self) -> &str;

    fn matches(&self, host: &str, path: &str) -> bool;

    /// Query parameter holding the visitor's search, if the site has one
    fn search_param(&self) -> Option<&str>;

    /// Register watches and apply one-shot actions
    fn install<P: Page>(&self, engine: &mut Engine<P>, page: &mut P) -> Result<(), PageError>;
}

impl SiteAdapter for AdapterRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, host: &str, path: &str) -> bool {
        if !host.contains(self.host.as_str()) {
            return false;
        }
        self.path_prefixes.is_empty()
            || self
                .path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn search_param(&self) -> Option<&str> {
        self.search_param.as_deref()
    }

    fn install<P: Page>(&self, engine: &mut Engine<P>, page: &mut P) -> Result<(), PageError> {
        for action in &self.actions {
            match action {
                OneShotAction::InjectStyle { css } => page.inject_style(css)?,
                OneShotAction::AddClass { selector, class } => {
                    engine.watch_add_class(selector, class);
                }
                OneShotAction::ClickAfter { selector, delay_ms } => {
                    engine.watch_click(selector, Duration::from_millis(*delay_ms));
                }
            }
        }

        for spec in &self.watches {
            let mut options = WatchOptions::repeat(spec.repeat);
            if let Some(delay_ms) = spec.delay_ms {
                options = options.with_delay(Duration::from_millis(delay_ms));
            }
            match spec.target {
                WatchTarget::Description => {
                    engine.watch_description(&spec.selector, options);
                }
                WatchTarget::Location { text_nodes_only } => {
                    engine.watch_location(&spec.selector, options, text_nodes_only);
                }
            }
        }

        tracing::debug!(
            adapter = self.name.as_str(),
            watches = self.watches.len(),
            actions = self.actions.len(),
            "adapter installed"
        );
        Ok(())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered adapter records; the first record that matches wins
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AdapterRegistry {
    records: Vec<AdapterRecord>,
}

impl AdapterRegistry {
    pub fn new(records: Vec<AdapterRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn records(&self) -> &[AdapterRecord] {
        &self.records
    }

    pub fn push(&mut self, record: AdapterRecord) {
        self.records.push(record);
    }

    pub fn select(&self, host: &str, path: &str) -> Option<&AdapterRecord> {
        self.records.iter().find(|r| r.matches(host, path))
    }

    /// Stock table of supported job boards
    pub fn builtin() -> Self {
        use Repeat::Continuous;

        let indeed_style = OneShotAction::InjectStyle {
            css: ".mosaic-provider-jobcards .desktop.vjs-highlight .slider_container{box-shadow: 0 0.125rem 0.25rem rgba(0,0,0,.5), 0 0 0.8rem rgba(37, 87, 167,.5);}".to_string(),
        };
        let dice_style = OneShotAction::InjectStyle {
            css: ".search-card .card-description{overflow:visible !important; max-height:none !important;}".to_string(),
        };
        let linkedin_expand = OneShotAction::ClickAfter {
            selector: ".jobs-description footer button".to_string(),
            delay_ms: 1000,
        };
        let linkedin_watches = vec![
            // the site swaps each viewed job into the same container
            WatchSpec::description("#job-details, #job-details > *", Continuous),
            WatchSpec::location(".jobs-unified-top-card__primary-description > div", Continuous, true),
        ];

        let records = vec![
            AdapterRecord {
                name: "indeed-job".to_string(),
                host: "indeed.com".to_string(),
                path_prefixes: vec!["/job/".to_string(), "/viewjob".to_string()],
                search_param: Some("q".to_string()),
                watches: vec![
                    WatchSpec::description("#jobDescriptionText", Continuous),
                    WatchSpec::location(
                        ".jobsearch-CompanyInfoWithReview > div > div > div:nth-child(2)",
                        Continuous,
                        false,
                    ),
                ],
                actions: vec![indeed_style.clone()],
            },
            AdapterRecord {
                name: "indeed-search".to_string(),
                host: "indeed.com".to_string(),
                path_prefixes: Vec::new(),
                search_param: Some("q".to_string()),
                watches: vec![
                    WatchSpec::description("#jobDescriptionText, #jobDescriptionText > *", Continuous),
                    WatchSpec::location(
                        "#mosaic-provider-jobcards .companyLocation, #mosaic-provider-jobcards .companyLocation span:not(.companyLocation--extras)",
                        Continuous,
                        true,
                    ),
                    WatchSpec::location(
                        ".jobsearch-CompanyInfoWithReview [data-testid=\"inlineHeader-companyLocation\"], .jobsearch-CompanyInfoWithoutHeaderImage [data-testid=\"inlineHeader-companyLocation\"]",
                        Continuous,
                        false,
                    ),
                ],
                actions: vec![indeed_style],
            },
            AdapterRecord {
                name: "dice-job".to_string(),
                host: "dice.com".to_string(),
                path_prefixes: vec!["/job-detail/".to_string()],
                search_param: Some("q".to_string()),
                watches: vec![
                    WatchSpec::description("#jobDescription", Continuous),
                    WatchSpec::location(".companyInfo li[data-cy=\"companyLocation\"]", Continuous, false),
                ],
                actions: vec![
                    dice_style.clone(),
                    OneShotAction::ClickAfter {
                        selector: "#descriptionToggle".to_string(),
                        delay_ms: 1000,
                    },
                ],
            },
            AdapterRecord {
                name: "dice-search".to_string(),
                host: "dice.com".to_string(),
                path_prefixes: Vec::new(),
                search_param: Some("q".to_string()),
                watches: vec![
                    WatchSpec::location(".search-result-location", Continuous, false),
                    WatchSpec::description(".card-description", Continuous),
                ],
                actions: vec![dice_style],
            },
            AdapterRecord {
                name: "remote-co".to_string(),
                host: "remote.co".to_string(),
                path_prefixes: Vec::new(),
                search_param: None,
                watches: vec![
                    WatchSpec::description(".job_description", Continuous),
                    WatchSpec::location(".location_sm", Continuous, false),
                ],
                actions: Vec::new(),
            },
            AdapterRecord {
                name: "ziprecruiter".to_string(),
                host: "ziprecruiter.com".to_string(),
                path_prefixes: Vec::new(),
                search_param: None,
                watches: vec![
                    WatchSpec::description(".job_description", Continuous),
                    WatchSpec::location(".job_header .hiring_location", Continuous, false),
                ],
                actions: vec![OneShotAction::AddClass {
                    selector: ".job_details_tile".to_string(),
                    class: "clicked".to_string(),
                }],
            },
            AdapterRecord {
                name: "linkedin-search".to_string(),
                host: "linkedin.com".to_string(),
                path_prefixes: vec!["/jobs/collections/".to_string(), "/jobs/search/".to_string()],
                search_param: Some("keywords".to_string()),
                watches: {
                    let mut watches = linkedin_watches.clone();
                    watches.push(WatchSpec::location(
                        ".job-card-container__metadata-wrapper .job-card-container__metadata-item",
                        Continuous,
                        false,
                    ));
                    watches
                },
                actions: vec![linkedin_expand.clone()],
            },
            AdapterRecord {
                name: "linkedin".to_string(),
                host: "linkedin.com".to_string(),
                path_prefixes: Vec::new(),
                search_param: Some("keywords".to_string()),
                watches: linkedin_watches,
                actions: vec![linkedin_expand],
            },
            // locations there are prominent and formatted differently; descriptions only
            AdapterRecord {
                name: "jobsfordevelopers".to_string(),
                host: "jobsfordevelopers.com".to_string(),
                path_prefixes: Vec::new(),
                search_param: None,
                watches: vec![WatchSpec::description(".container .prose", Continuous)],
                actions: Vec::new(),
            },
            // single-page app: give it a moment to render before watching
            AdapterRecord {
                name: "jobot".to_string(),
                host: "jobot.com".to_string(),
                path_prefixes: Vec::new(),
                search_param: Some("q".to_string()),
                watches: vec![
                    WatchSpec::description(".JobDescription", Continuous).delayed(1000),
                    WatchSpec::location(
                        ".header-details li, .JobInfoCard .q-item__section--main, .JobInfoCard .q-item__section--main .content div",
                        Continuous,
                        false,
                    )
                    .delayed(1000),
                ],
                actions: vec![OneShotAction::InjectStyle {
                    css: ".search-result .job.selected{box-shadow: 0 0 0.8rem #23b3e7;border-radius:10px 0 0 10px;}".to_string(),
                }],
            },
        ];

        Self { records }
    }
}
