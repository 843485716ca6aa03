use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

struct Counters {
    cancels: Arc<AtomicUsize>,
    confirms: Arc<AtomicUsize>,
}

fn props(visible: bool) -> (DialogProps, Counters) {
    let cancels = Arc::new(AtomicUsize::new(0));
    let confirms = Arc::new(AtomicUsize::new(0));
    let cancel_counter = Arc::clone(&cancels);
    let confirm_counter = Arc::clone(&confirms);
    let props = DialogProps {
        visible,
        on_cancel: Arc::new(move || {
            cancel_counter.fetch_add(1, Ordering::SeqCst);
        }),
        on_confirm: Arc::new(move || {
            confirm_counter.fetch_add(1, Ordering::SeqCst);
        }),
    };
    (props, Counters { cancels, confirms })
}

#[test]
fn hidden_dialog_renders_nothing_and_calls_nothing() {
    let (props, counters) = props(false);
    assert!(AuthAppDialog::new().render(&props).is_none());
    assert_eq!(counters.cancels.load(Ordering::SeqCst), 0);
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 0);
}

#[test]
fn visible_dialog_has_texts_and_controls() {
    let (props, counters) = props(true);
    let element = AuthAppDialog::new().render(&props).expect("visible dialog");

    let text = DialogText::default();
    assert_eq!(element.title(), text.title);
    assert_eq!(element.description(), text.description);
    assert_eq!(element.link().map(DialogButton::label), Some(text.link_hint.as_str()));
    let labels: Vec<_> = element.buttons().iter().map(DialogButton::label).collect();
    assert_eq!(labels, vec![text.decline_label.as_str(), text.proceed_label.as_str()]);

    assert_eq!(counters.cancels.load(Ordering::SeqCst), 0);
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 0);
}

#[test]
fn each_press_invokes_its_callback_once() {
    let (props, counters) = props(true);
    let element = AuthAppDialog::new().render(&props).expect("visible dialog");

    assert!(element.press(ButtonRole::Decline));
    assert_eq!(counters.cancels.load(Ordering::SeqCst), 1);
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 0);

    assert!(element.press(ButtonRole::Proceed));
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 1);

    assert!(element.press(ButtonRole::Link));
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 2);

    element.press(ButtonRole::Proceed);
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 3);
    assert_eq!(counters.cancels.load(Ordering::SeqCst), 1);
}

#[test]
fn dismiss_maps_to_cancel() {
    let (props, counters) = props(true);
    let element = AuthAppDialog::new().render(&props).expect("visible dialog");
    element.dismiss();
    assert_eq!(counters.cancels.load(Ordering::SeqCst), 1);
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 0);
}

#[test]
fn custom_text_is_used() {
    let text = DialogText {
        title: "Heads up".into(),
        ..DialogText::default()
    };
    let (props, _) = props(true);
    let element = AuthAppDialog::with_text(text)
        .render(&props)
        .expect("visible dialog");
    assert_eq!(element.title(), "Heads up");
}

#[test]
fn closures_satisfy_the_dialog_contract() {
    let minimal = |props: &DialogProps| {
        props.visible.then(|| {
            DialogElement::new("Install?", "", Arc::clone(&props.on_cancel)).with_button(
                DialogButton::new("OK", ButtonRole::Proceed, Arc::clone(&props.on_confirm)),
            )
        })
    };

    let (hidden, _) = props(false);
    assert!(minimal.render(&hidden).is_none());

    let (visible, counters) = props(true);
    let element = minimal.render(&visible).expect("visible dialog");
    assert!(!element.press(ButtonRole::Link));
    assert!(element.press(ButtonRole::Proceed));
    assert_eq!(counters.confirms.load(Ordering::SeqCst), 1);
}
