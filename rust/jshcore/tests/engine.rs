//! End-to-end engine tests on the in-memory page.

use std::time::Duration;

use jshcore::highlight::collect_markers;
use jshcore::{AdapterRegistry, Category, Document, Engine, HighlightConfig, NodeId, Page};

fn config() -> HighlightConfig {
    let mut config = HighlightConfig::default();
    config.always_highlight = vec!["typescript".to_string()];
    config.flagged = vec!["must be".to_string()];
    config.flag_security_clearances = false;
    config.work_types = vec!["contract".to_string()];
    config
}

fn marker(category: Category, text: &str) -> (Category, String) {
    (category, text.to_string())
}

/// Indeed job page: description plus the company info block
fn indeed_job_page() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();

    let info = doc.append_element(body, "div", &[("class", "jobsearch-CompanyInfoWithReview")]);
    let outer = doc.append_element(info, "div", &[]);
    let inner = doc.append_element(outer, "div", &[]);
    let company = doc.append_element(inner, "div", &[]);
    doc.append_text(company, "Acme Corp");
    let location = doc.append_element(inner, "div", &[]);
    doc.append_text(location, "Charlotte, NC");

    let description = doc.append_element(body, "div", &[("id", "jobDescriptionText")]);
    doc.append_text(
        description,
        "Rust engineer for the Platform Team. Must be fluent in TypeScript. Contract role paying $120K-$150K.",
    );

    (doc, description, location)
}

#[test]
fn test_indeed_job_page_end_to_end() {
    let (mut doc, description, location) = indeed_job_page();
    let mut engine = Engine::bootstrap(
        config(),
        "https://www.indeed.com/viewjob?jk=abc&q=rust+%22platform+team%22",
        &AdapterRegistry::builtin(),
        &mut doc,
    )
    .unwrap();

    assert_eq!(engine.adapter(), Some("indeed-job"));
    assert_eq!(
        engine.highlighter().search_terms(),
        &["rust".to_string(), "platform team".to_string()]
    );
    // default stylesheet plus the site tweak
    assert_eq!(doc.styles().len(), 2);

    let report = engine.tick(&mut doc);
    assert_eq!(report.dispatched, 2);
    // page watches keep scanning for later renders
    assert_eq!(report.retired, 0);

    assert_eq!(
        collect_markers(&doc, &description),
        vec![
            marker(Category::SearchTerm, "Rust"),
            marker(Category::SearchTerm, "Platform Team"),
            marker(Category::Flagged, "Must be"),
            marker(Category::AlwaysHighlight, "TypeScript"),
            marker(Category::WorkType, "Contract"),
            marker(Category::Currency, "$120K"),
            marker(Category::Currency, "$150K"),
        ]
    );
    assert_eq!(
        doc.text_content(description),
        "Rust engineer for the Platform Team. Must be fluent in TypeScript. Contract role paying $120K-$150K."
    );
    assert_eq!(
        collect_markers(&doc, &location),
        vec![marker(Category::Location, "Charlotte, NC")]
    );

    let html = doc.outer_html(doc.body());
    let again = engine.tick(&mut doc);
    assert_eq!(again.dispatched, 0);
    assert_eq!(doc.outer_html(doc.body()), html);
}

#[test]
fn test_direct_annotate_is_idempotent() {
    let (mut doc, description, _) = indeed_job_page();
    let engine: Engine<Document> = Engine::new(config());

    let first = engine.annotate(&mut doc, &description, None);
    let html = doc.inner_html(description);
    let second = engine.annotate(&mut doc, &description, None);

    assert!(first.markers_added > 0);
    assert_eq!(second.markers_added, 0);
    assert_eq!(doc.inner_html(description), html);
}

#[test]
fn test_linkedin_search_picks_up_new_cards() {
    let mut doc = Document::new();
    let mut engine = Engine::bootstrap(
        config(),
        "https://www.linkedin.com/jobs/search/?keywords=rust",
        &AdapterRegistry::builtin(),
        &mut doc,
    )
    .unwrap();
    assert_eq!(engine.adapter(), Some("linkedin-search"));

    assert_eq!(engine.tick(&mut doc).dispatched, 0);

    let body = doc.body();
    let wrapper = doc.append_element(body, "div", &[("class", "job-card-container__metadata-wrapper")]);
    let first = doc.append_element(wrapper, "li", &[("class", "job-card-container__metadata-item")]);
    doc.append_text(first, "Remote");
    assert_eq!(engine.tick(&mut doc).dispatched, 1);

    let second = doc.append_element(wrapper, "li", &[("class", "job-card-container__metadata-item")]);
    doc.append_text(second, "Austin, TX");
    let third = doc.append_element(wrapper, "li", &[("class", "job-card-container__metadata-item")]);
    doc.append_text(third, "United States (Remote)");
    assert_eq!(engine.tick(&mut doc).dispatched, 2);

    assert_eq!(collect_markers(&doc, &first), vec![marker(Category::Location, "Remote")]);
    assert!(collect_markers(&doc, &second).is_empty());
    assert_eq!(
        collect_markers(&doc, &third),
        vec![marker(Category::Location, "United States (Remote)")]
    );
}

#[test]
fn test_linkedin_highlights_job_swapped_into_same_container() {
    let mut doc = Document::new();
    let body = doc.body();
    let details = doc.append_element(body, "div", &[("id", "job-details")]);
    let first = doc.append_element(details, "span", &[]);
    doc.append_text(first, "A full-time role, TypeScript preferred.");

    let mut engine = Engine::bootstrap(
        config(),
        "https://www.linkedin.com/jobs/view/1",
        &AdapterRegistry::builtin(),
        &mut doc,
    )
    .unwrap();
    assert_eq!(engine.adapter(), Some("linkedin"));

    engine.tick(&mut doc);
    assert_eq!(
        collect_markers(&doc, &details),
        vec![marker(Category::AlwaysHighlight, "TypeScript")]
    );

    // the visitor opens another job; the site reuses #job-details
    doc.remove(first);
    let second = doc.append_element(details, "span", &[]);
    doc.append_text(second, "another contract role");
    engine.tick(&mut doc);

    assert_eq!(
        collect_markers(&doc, &details),
        vec![marker(Category::WorkType, "contract")]
    );
    assert_eq!(doc.text_content(details), "another contract role");
}

#[test]
fn test_dice_expands_description_after_delay() {
    let mut doc = Document::new();
    let body = doc.body();
    let toggle = doc.append_element(body, "button", &[("id", "descriptionToggle")]);
    let mut engine = Engine::bootstrap(
        config(),
        "https://www.dice.com/job-detail/1234",
        &AdapterRegistry::builtin(),
        &mut doc,
    )
    .unwrap();

    engine.tick(&mut doc);
    assert!(doc.clicks().is_empty());

    engine.tick_at(&mut doc, instant::Instant::now() + Duration::from_secs(2));
    assert_eq!(doc.clicks(), &[toggle]);
}

#[test]
fn test_removed_element_is_skipped() {
    let (mut doc, description, _) = indeed_job_page();
    doc.remove(description);
    let mut engine = Engine::bootstrap(
        config(),
        "https://www.indeed.com/viewjob?jk=abc",
        &AdapterRegistry::builtin(),
        &mut doc,
    )
    .unwrap();

    // only the location block is still on the page
    assert_eq!(engine.tick(&mut doc).dispatched, 1);
    assert!(!doc.is_connected(&description));
}
