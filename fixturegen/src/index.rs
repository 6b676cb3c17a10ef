//! The HTML index of the client suite

use std::{fs, path::Path};

use log::info;
use maud::{html, Markup, DOCTYPE};

use crate::{
    category::CategoryGroup,
    error::Error,
    registry::{CaseRegistry, Role, TestCase},
};

const PAGE_TITLE: &str = "IFT: Client Test Suite";

const SUITE_NOTE: &str = "\
Each case below is rendered with the case's incremental font, falling back to \
a font that reads PASS or FAIL. A client passes a case when the text reads \
PASS: cases that should load are drawn with the incremental font, cases that \
should be rejected are drawn with the fallback.";

/// Render the index page for every registered case.
///
/// Output depends only on the registry contents.
pub fn render_index(registry: &CaseRegistry) -> String {
    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (PAGE_TITLE) }
                link rel="stylesheet" href="resources/index.css";
                script src="resources/brotli.js" {}
            }
            body {
                h1 { (PAGE_TITLE) }
                p.note { (SUITE_NOTE) }
                @for (group, cases) in registry.all_groups() {
                    (make_group(&group, cases))
                }
            }
        }
    };
    page.into_string()
}

fn make_group(group: &CategoryGroup, cases: &[TestCase]) -> Markup {
    html! {
        section.category id=(group.tag) {
            h2 { (group.title) }
            p.spec { a href=(group.spec_section_url) { (group.spec_section_url) } }
            p.note { (group.note) }
            @if cases.is_empty() {
                p.empty { "No cases." }
            }
            @for case in cases {
                (make_case(case))
            }
        }
    }
}

fn make_case(case: &TestCase) -> Markup {
    let outcome = if case.expected_valid {
        "should load"
    } else {
        "should be rejected"
    };
    html! {
        div.testcase {
            h3 { (case.identifier) }
            // the harness script renders this element's text with the case's font
            p.result id=(case.identifier) { (case.title) }
            p.description { (case.description) }
            p.outcome { "Expected: " (outcome) }
            p.spec {
                @for link in case.spec_link.split(',') {
                    a href=(link) { (link) } " "
                }
            }
            @if !case.credits.is_empty() {
                ul.credits {
                    @for credit in &case.credits {
                        li {
                            a href=(credit.contact) { (credit.name) }
                            @match credit.role {
                                Role::Author => " (author)",
                                Role::Reviewer => " (reviewer)",
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn write_index(registry: &CaseRegistry, path: &Path) -> Result<(), Error> {
    fs::write(path, render_index(registry)).map_err(Error::io(path))?;
    info!("Wrote index of {} cases to {}", registry.len(), path.display());
    Ok(())
}
