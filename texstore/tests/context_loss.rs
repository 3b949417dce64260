mod common;

use common::{filled, session};
use std::cell::Cell;
use std::rc::Rc;
use texstore::{LoadOptions, TextureError};

#[test]
fn listener_is_registered_once() {
    let (mut session, _) = session();
    assert_eq!(session.context().loss_listeners(), 0);

    session.resolve([1.0, 1.0, 1.0, 1.0]).unwrap();
    session.resolve("a.png").unwrap();
    session.create_depth_texture(4, 4).unwrap();

    assert_eq!(session.context().loss_listeners(), 1);
}

#[test]
fn lost_context_forgets_everything() {
    let (mut session, fetcher) = session();

    let red = session.resolve([255.0, 0.0, 0.0, 255.0]).unwrap();
    let pending = session.resolve("late.png").unwrap();
    let live_before = session.context().live_textures();

    session.context_mut().lose_context();
    assert_eq!(session.context_losses(), 0);

    // the next use notices the loss before doing anything else
    let fresh = session.resolve([255.0, 0.0, 0.0, 255.0]).unwrap();
    assert_ne!(fresh, red);
    assert_eq!(session.context_losses(), 1);
    assert_eq!(session.textures().len(), 1);
    assert!(matches!(
        session.texture(pending),
        Err(TextureError::UnknownTexture { .. })
    ));

    // nothing is deleted, those names died with the context
    assert!(session.context().deleted().is_empty());
    assert_eq!(session.context().live_textures(), live_before + 1);

    // the old load is gone and never lands anywhere
    assert_eq!(session.loads_in_flight(), 0);
    assert!(!fetcher.complete("late.png", filled(2, 2, [0, 0, 0, 255])));
    assert_eq!(session.process_loads(), 0);
}

#[test]
fn urls_are_fetched_again_after_loss() {
    let (mut session, fetcher) = session();

    let before = session.resolve("tree.png").unwrap();
    session.loss_signal().raise();
    let after = session.resolve("tree.png").unwrap();

    assert_ne!(before, after);
    assert_eq!(fetcher.requested(), vec!["tree.png", "tree.png"]);
    assert_eq!(session.cache().len(), 1);
}

#[test]
fn pending_callbacks_are_dropped() {
    let (mut session, fetcher) = session();
    let fired = Rc::new(Cell::new(false));

    let flag = fired.clone();
    session
        .resolve_with("ui.png", LoadOptions::on_ready(move |_| flag.set(true)))
        .unwrap();
    session.handle_context_lost();

    assert!(!fetcher.complete("ui.png", filled(1, 1, [0; 4])));
    session.process_loads();
    assert!(!fired.get());
    assert_eq!(session.context_losses(), 1);
}

#[test]
fn handling_loss_twice_is_harmless() {
    let (mut session, _) = session();

    session.resolve([0.0, 0.0, 0.0, 255.0]).unwrap();
    session.handle_context_lost();
    session.handle_context_lost();

    assert!(session.textures().is_empty());
    assert!(session.cache().is_empty());
    assert_eq!(session.context_losses(), 2);
    assert_eq!(session.context().errors(), 0);
}

#[test]
fn signal_outlives_the_session_thread() {
    let (mut session, _) = session();
    session.resolve([0.0, 0.0, 0.0, 255.0]).unwrap();

    let signal = session.loss_signal();
    std::thread::spawn(move || signal.raise()).join().unwrap();

    assert_eq!(session.process_loads(), 0);
    assert_eq!(session.context_losses(), 1);
    assert!(session.textures().is_empty());
}
