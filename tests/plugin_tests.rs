//! Plugin protocol behavior: bounded clicks, per-element isolation.

mod common;

use common::{FakeElement, FakePage, Round};
use threadscrape::PagePlugin;

fn page_with(selector: &str, elements: Vec<FakeElement>) -> FakePage {
    FakePage::scripted(vec![Round::new(100).with(selector, elements)])
}

#[tokio::test(start_paused = true)]
async fn no_matching_elements_is_no_effect() {
    let plugin = PagePlugin::ExpandComments;
    let page = FakePage::scripted(vec![Round::new(100)]);
    assert!(!plugin.attempt(&page).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn reports_true_when_any_element_activates() {
    let plugin = PagePlugin::CloseDialog;
    let ok = FakeElement::clickable();
    let broken = FakeElement::unclickable();
    let page = page_with(plugin.selector(), vec![broken.clone(), ok.clone()]);

    assert!(plugin.attempt(&page).await.unwrap());
    // The broken element exhausted its retry budget without aborting the
    // pass; the good one was clicked once.
    assert_eq!(broken.attempts(), 3);
    assert_eq!(ok.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn reports_false_when_every_element_fails() {
    let plugin = PagePlugin::ExpandReplies;
    let first = FakeElement::unclickable();
    let second = FakeElement::unclickable();
    let page = page_with(plugin.selector(), vec![first.clone(), second.clone()]);

    assert!(!plugin.attempt(&page).await.unwrap());
    assert_eq!(first.attempts(), 3);
    assert_eq!(second.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn every_matching_element_is_activated() {
    let plugin = PagePlugin::ExpandThread;
    let elements: Vec<FakeElement> = (0..4).map(|_| FakeElement::clickable()).collect();
    let page = page_with(plugin.selector(), elements.clone());

    assert!(plugin.attempt(&page).await.unwrap());
    for element in &elements {
        assert_eq!(element.attempts(), 1);
    }
}

#[test]
fn default_pipeline_is_ordered_and_closed() {
    let pipeline = PagePlugin::default_pipeline();
    assert_eq!(
        pipeline,
        vec![
            PagePlugin::ExpandComments,
            PagePlugin::CloseDialog,
            PagePlugin::ExpandThread,
            PagePlugin::ExpandReplies,
        ]
    );
}
