//! Shared test utilities for the card-expandable test suite.
//!
//! Markup builders produce well-formed XHTML fragments following the card
//! markup contract, so tests describe a page in one line:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let markup = page(&[
//!     group_markup("faq", &[card_markup("q1", true, 80), card_markup("q2", false, 40)]),
//!     card_markup("solo", false, 120),
//! ]);
//! let mut ctl = controller(&markup, false);
//! let log = record_events(&mut ctl);
//! ctl.initialize(None, InitOptions::default());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::dom::parse_document;
use crate::events::CardEvent;

// =========================================================================
// Controllers
// =========================================================================

/// Parse `markup` and wrap it in an uninitialized controller with stock
/// config, optionally preferring reduced motion.
pub fn controller(markup: &str, reduced_motion: bool) -> Controller {
    let mut config = ControllerConfig::default();
    config.motion.prefers_reduced_motion = reduced_motion;
    let document = parse_document(markup)
        .unwrap_or_else(|e| panic!("test markup does not parse: {e}\n{markup}"));
    Controller::new(document, &config)
}

/// Subscribe a listener that records every event in dispatch order.
pub fn record_events(ctl: &mut Controller) -> Rc<RefCell<Vec<CardEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    ctl.subscribe(move |event, _| sink.borrow_mut().push(*event));
    log
}

// =========================================================================
// Markup builders
// =========================================================================

/// A page whose body is `<main id="main">` holding `sections`.
pub fn page(sections: &[String]) -> String {
    format!("<html><main id=\"main\">{}</main></html>", sections.concat())
}

/// Like [`page`], with the collapse duration token set on the root element.
pub fn page_with_duration(duration: &str, sections: &[String]) -> String {
    format!(
        "<html style=\"--motion-duration-collapse: {duration}\"><main id=\"main\">{}</main></html>",
        sections.concat()
    )
}

/// An expandable card with id `id`. The toggle and panel carry no ids so
/// initialization has to generate them.
pub fn card_markup(id: &str, open: bool, height: u32) -> String {
    let expanded = if open { r#" data-expanded="""# } else { "" };
    format!(
        r#"<article class="card card--expandable" data-expandable=""{expanded} id="{id}"><button class="card__toggle">Toggle {id}</button><div class="card__content" data-height="{height}"><p>Body of {id}</p></div></article>"#
    )
}

/// A card whose toggle swaps between "Show more" and "Show less".
pub fn labelled_card_markup(id: &str, open: bool) -> String {
    let expanded = if open { r#" data-expanded="""# } else { "" };
    format!(
        r#"<article class="card card--expandable" data-expandable=""{expanded} id="{id}"><button class="card__toggle" data-label-open="Show less" data-label-closed="Show more"><span class="card__toggle-dyn">Show more</span></button><div class="card__content" data-height="60"><p>Body of {id}</p></div></article>"#
    )
}

/// An accordion group container with id `id`.
pub fn group_markup(id: &str, cards: &[String]) -> String {
    format!(
        r#"<section data-accordion-group="" id="{id}">{}</section>"#,
        cards.concat()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::InitOptions;

    #[test]
    fn builders_produce_parseable_markup() {
        let markup = page_with_duration(
            "300ms",
            &[
                group_markup("g", &[card_markup("a", true, 10)]),
                labelled_card_markup("b", false),
            ],
        );
        let mut ctl = controller(&markup, false);
        let report = ctl.initialize(None, InitOptions::default());
        assert_eq!(report.registered.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(ctl.is_open("a"), Some(true));
    }
}
