//! Which live elements break loose
//!
//! Runs against whatever is mounted at trigger time; the result is not a
//! fixed manifest and can differ between runs.

use std::collections::HashSet;

use crate::Rect;
use crate::platform::{ElementId, PageSurface, Viewport};
use crate::settings::BreakerConfig;

/// Queried in this order; earlier selectors claim first
pub const BREAK_SELECTORS: &[&str] = &[
    "header",
    "nav",
    "h1",
    "h2",
    "h3",
    "h4",
    "p",
    "button",
    "a:not(nav a):not(header a)",
    "img",
    ".card",
    "[data-card]",
    "article",
    "footer",
];

/// Size and visibility filters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRules {
    /// Elements narrower or shorter than this are skipped (px)
    pub min_size: f32,
    /// Slack around the viewport that still counts as visible (px)
    pub margin: f32,
}

impl From<&BreakerConfig> for SelectionRules {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            min_size: config.min_element_size,
            margin: config.viewport_margin,
        }
    }
}

impl SelectionRules {
    /// Big enough and at least partly inside the padded viewport
    pub fn accepts(&self, rect: &Rect, viewport: Viewport) -> bool {
        if rect.width < self.min_size || rect.height < self.min_size {
            return false;
        }
        let m = self.margin;
        !(rect.bottom() < -m
            || rect.top > viewport.height + m
            || rect.right() < -m
            || rect.left > viewport.width + m)
    }
}

/// Elements to detach, with their rects at selection time.
///
/// Skips anything already `claimed`, anything in the overlay and anything
/// unmeasurable. When both an element and one of its ancestors survive, only
/// the ancestor is kept.
pub fn select_targets<S: PageSurface + ?Sized>(
    surface: &mut S,
    rules: &SelectionRules,
    claimed: &HashSet<ElementId>,
) -> Vec<(ElementId, Rect)> {
    let viewport = surface.viewport();
    let mut seen: HashSet<ElementId> = HashSet::new();
    let mut survivors: Vec<(ElementId, Rect)> = Vec::new();

    for selector in BREAK_SELECTORS {
        for element in surface.query_all(selector) {
            if !seen.insert(element) || claimed.contains(&element) || surface.in_overlay(element) {
                continue;
            }
            let Some(rect) = surface.measure(element) else {
                log::debug!("Skipping unmeasurable element {:?}", element);
                continue;
            };
            if rules.accepts(&rect, viewport) {
                survivors.push((element, rect));
            }
        }
    }

    // Outermost wins, including against elements claimed by an earlier run
    let kept: Vec<(ElementId, Rect)> = survivors
        .iter()
        .filter(|(element, _)| {
            let nested_in_survivor = survivors
                .iter()
                .any(|(other, _)| other != element && surface.contains(*other, *element));
            let nested_in_claimed = claimed
                .iter()
                .any(|other| surface.contains(*other, *element));
            !nested_in_survivor && !nested_in_claimed
        })
        .copied()
        .collect();

    log::debug!(
        "Selected {} of {} candidate elements",
        kept.len(),
        survivors.len()
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemorySurface;

    fn rules() -> SelectionRules {
        SelectionRules {
            min_size: 10.0,
            margin: 50.0,
        }
    }

    #[test]
    fn test_card_claims_nested_button() {
        let mut page = MemorySurface::new(1024.0, 768.0);
        let card = page.add_element(None, &[".card"], Rect::new(100.0, 100.0, 300.0, 200.0));
        let _button = page.add_element(Some(card), &["button"], Rect::new(120.0, 240.0, 100.0, 40.0));

        let picked = select_targets(&mut page, &rules(), &HashSet::new());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, card);
    }

    #[test]
    fn test_below_viewport_never_claimed() {
        let mut page = MemorySurface::new(1024.0, 768.0);
        let low = page.add_element(None, &["p"], Rect::new(0.0, 768.0 + 51.0, 400.0, 40.0));
        let edge = page.add_element(None, &["p"], Rect::new(0.0, 768.0 + 49.0, 400.0, 40.0));

        let picked: Vec<ElementId> = select_targets(&mut page, &rules(), &HashSet::new())
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert!(!picked.contains(&low));
        assert!(picked.contains(&edge));
    }

    #[test]
    fn test_small_unmeasurable_and_overlay_skipped() {
        let mut page = MemorySurface::new(1024.0, 768.0);
        let tiny = page.add_element(None, &["img"], Rect::new(10.0, 10.0, 8.0, 200.0));
        let gone = page.add_element(None, &["h1"], Rect::new(10.0, 10.0, 300.0, 40.0));
        page.set_rect(gone, None);
        let _overlay = page.add_overlay_element(&["button"], Rect::new(10.0, 10.0, 80.0, 30.0));
        let ok = page.add_element(None, &["h2"], Rect::new(10.0, 60.0, 300.0, 30.0));

        let picked = select_targets(&mut page, &rules(), &HashSet::new());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, ok);
        assert!(picked.iter().all(|(id, _)| *id != tiny));
    }

    #[test]
    fn test_claimed_and_descendants_skipped() {
        let mut page = MemorySurface::new(1024.0, 768.0);
        let header = page.add_element(None, &["header"], Rect::new(0.0, 0.0, 1024.0, 80.0));
        let title = page.add_element(Some(header), &["h1"], Rect::new(20.0, 20.0, 300.0, 40.0));
        let footer = page.add_element(None, &["footer"], Rect::new(0.0, 700.0, 1024.0, 68.0));

        let claimed: HashSet<ElementId> = [header].into_iter().collect();
        let picked: Vec<ElementId> = select_targets(&mut page, &rules(), &claimed)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(picked, vec![footer]);
        assert!(!picked.contains(&title));
    }

    #[test]
    fn test_element_matching_two_selectors_listed_once() {
        let mut page = MemorySurface::new(1024.0, 768.0);
        page.add_element(None, &["article", ".card"], Rect::new(0.0, 0.0, 300.0, 300.0));
        assert_eq!(select_targets(&mut page, &rules(), &HashSet::new()).len(), 1);
    }
}
