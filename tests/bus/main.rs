
use pretty_assertions::assert_eq;
use support::{LoudPing, Ping, Pong, Recorder};
use tickbus::{BusError, EventBus, Listener};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[test]
fn add_then_has_listener() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");

    bus.add_listener(&f);
    assert!(bus.has_listener(&f));
    assert!(bus.has_subscribers::<Ping>());
    assert!(!bus.has_no_listeners());
}

#[test]
fn duplicate_add_delivers_once() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");

    bus.add_listener(&f);
    bus.add_listener(&f);
    bus.add_listener(&f.clone());

    assert_eq!(bus.listener_count::<Ping>(), 1);
    bus.dispatch(&Ping(7));
    assert_eq!(recorder.entries(), vec!["f:7"]);
}

#[test]
fn distinct_handles_over_same_behaviour_both_deliver() {
    let bus = EventBus::new();
    let recorder = Recorder::new();

    bus.add_listener(&recorder.ping("f"));
    bus.add_listener(&recorder.ping("f"));

    assert_eq!(bus.dispatch(&Ping(1)), 2);
    assert_eq!(recorder.entries(), vec!["f:1", "f:1"]);
}

#[test]
fn multicast_in_registration_order_then_remove() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");
    let g = recorder.ping("g");

    bus.add_listener(&f);
    bus.add_listener(&g);
    bus.dispatch(&Ping(1));
    assert_eq!(recorder.entries(), vec!["f:1", "g:1"]);

    recorder.reset();
    bus.remove_listener(&f);
    bus.dispatch(&Ping(2));
    assert_eq!(recorder.entries(), vec!["g:2"]);
}

#[test]
fn remove_last_listener_drops_type() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");

    bus.add_listener(&f);
    bus.remove_listener(&f);

    assert!(!bus.has_listener(&f));
    assert!(!bus.has_subscribers::<Ping>());
    assert!(bus.has_no_listeners());
    assert!(!bus.enqueue(Ping(1)));
}

#[test]
fn remove_unregistered_is_noop() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");
    let stranger = recorder.ping("stranger");

    bus.add_listener(&f);
    bus.remove_listener(&stranger);
    bus.remove_listener(&stranger);

    assert!(bus.has_listener(&f));
    assert_eq!(bus.listener_count::<Ping>(), 1);
}

#[test]
fn once_listener_delivers_once_and_leaves() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let h = recorder.ping("h");

    bus.add_listener_once(&h);
    assert!(bus.has_listener(&h));

    bus.dispatch(&Ping(1));
    bus.dispatch(&Ping(2));

    assert_eq!(recorder.entries(), vec!["h:1"]);
    assert!(!bus.has_listener(&h));
    assert!(bus.has_no_listeners());
}

#[test]
fn once_listener_readded_before_firing_fires_once() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let h = recorder.ping("h");

    bus.add_listener_once(&h);
    bus.add_listener_once(&h);
    assert!(bus.has_listener(&h));
    assert_eq!(bus.listener_count::<Ping>(), 1);

    assert!(bus.enqueue(Ping(1)));
    bus.drain(None);

    assert_eq!(recorder.entries(), vec!["h:1"]);
    assert!(!bus.has_listener(&h));
    assert!(bus.has_no_listeners());
}

#[test]
fn once_listener_readded_after_firing_is_registered_again() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let h = recorder.ping("h");

    bus.add_listener_once(&h);
    bus.dispatch(&Ping(1));
    bus.add_listener_once(&h);

    assert!(bus.has_listener(&h));
    bus.dispatch(&Ping(2));
    assert_eq!(recorder.entries(), vec!["h:1", "h:2"]);
    assert!(!bus.has_listener(&h));
}

#[test]
fn plain_listener_can_be_made_one_shot() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");
    let g = recorder.ping("g");

    bus.add_listener(&f);
    bus.add_listener(&g);
    bus.add_listener_once(&f);

    bus.dispatch(&Ping(1));
    bus.dispatch(&Ping(2));

    assert_eq!(recorder.entries(), vec!["f:1", "g:1", "g:2"]);
}

#[test]
fn once_listener_removed_explicitly() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let h = recorder.ping("h");

    bus.add_listener_once(&h);
    bus.remove_listener(&h);

    assert!(!bus.has_listener(&h));
    assert!(bus.has_no_listeners());
    assert_eq!(bus.dispatch(&Ping(1)), 0);
}

#[test]
fn subscriptions_match_exact_type_only() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    bus.add_listener(&recorder.ping("ping"));
    bus.add_listener(&recorder.pong("pong"));

    bus.dispatch(&Pong(1));
    assert_eq!(bus.dispatch(&LoudPing(Ping(2))), 0);
    bus.dispatch(&Ping(3));

    assert_eq!(recorder.entries(), vec!["pong:1", "ping:3"]);
}

#[test]
fn enqueue_without_listener_is_rejected() {
    let bus = EventBus::new();
    let recorder = Recorder::new();

    assert!(!bus.enqueue(Ping(1)));
    assert_eq!(bus.queue_len(), 0);
    assert!(bus.is_queue_empty());

    match bus.try_enqueue(Ping(1)) {
        Err(BusError::NoSubscribers { message_type }) => {
            assert!(message_type.ends_with("Ping"));
        }
        other => panic!("expected NoSubscribers, got {:?}", other),
    }

    bus.add_listener(&recorder.ping("f"));
    assert!(bus.enqueue(Ping(1)));
    assert_eq!(bus.queue_len(), 1);
}

#[test]
fn enqueue_checks_exact_type() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    bus.add_listener(&recorder.ping("f"));

    assert!(!bus.enqueue(Pong(1)));
    assert!(!bus.enqueue(LoudPing(Ping(1))));
    assert!(bus.is_queue_empty());
}

#[test]
fn once_listener_through_queue() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let h = recorder.ping("h");

    bus.add_listener_once(&h);
    assert!(bus.enqueue(Ping(1)));

    let report = bus.drain(None);
    assert_eq!(report.dispatched, 1);
    assert_eq!(bus.queue_len(), 0);
    assert_eq!(recorder.entries(), vec!["h:1"]);
    assert!(!bus.has_listener(&h));
}

#[test]
fn clear_drops_pending_and_subscriptions() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");
    let g = recorder.pong("g");
    let h = recorder.ping("h");

    bus.add_listener(&f);
    bus.add_listener(&g);
    bus.add_listener_once(&h);
    bus.enqueue(Ping(1));
    bus.enqueue(Pong(2));

    bus.clear();

    assert!(bus.is_queue_empty());
    assert!(!bus.has_listener(&f));
    assert!(!bus.has_listener(&g));
    assert!(!bus.has_listener(&h));
    assert!(bus.has_no_listeners());

    bus.drain(None);
    assert_eq!(recorder.count(), 0);
}

#[test]
fn remove_all_listeners_leaves_queue() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    bus.add_listener(&recorder.ping("f"));
    bus.enqueue(Ping(1));

    bus.remove_all_listeners();

    assert!(bus.has_no_listeners());
    assert_eq!(bus.queue_len(), 1);
}

#[test]
fn listener_can_be_shared_between_buses() {
    let first = EventBus::new();
    let second = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");

    first.add_listener_once(&f);
    second.add_listener(&f);

    first.dispatch(&Ping(1));
    second.dispatch(&Ping(2));
    second.dispatch(&Ping(3));

    assert!(!first.has_listener(&f));
    assert!(second.has_listener(&f));
    assert_eq!(recorder.entries(), vec!["f:1", "f:2", "f:3"]);
}

#[test]
fn subscription_guard_scopes_listener() {
    let bus = EventBus::new();
    let recorder = Recorder::new();
    let f = recorder.ping("f");

    {
        let _subscription = bus.subscribe(&f);
        bus.dispatch(&Ping(1));
    }
    bus.dispatch(&Ping(2));

    assert_eq!(recorder.entries(), vec!["f:1"]);
    assert!(bus.has_no_listeners());
}

#[test]
fn listener_callable_directly() {
    let recorder = Recorder::new();
    let f: Listener<Ping> = recorder.ping("f");
    f.call(&Ping(9));
    assert_eq!(recorder.entries(), vec!["f:9"]);
}
