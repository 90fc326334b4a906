//! Channel behaviour across threads: blocking pops, termination, split and
//! namespace relays.

mod common;

use common::builders::{num, nums};
use common::test_timeout;
use jqsh::channel::{NamespaceSet, Scope, SlotKind};
use jqsh::{CancelToken, Channel, ChannelError, Value};
use std::thread;

#[test]
fn test_pop_blocks_until_push() {
    let channel = Channel::new(CancelToken::new());
    let producer = channel.clone();
    let handle = thread::spawn(move || {
        thread::sleep(test_timeout());
        producer.push(num(1)).unwrap();
        producer.terminate().unwrap();
    });
    assert_eq!(channel.pop(true).unwrap(), Some(num(1)));
    assert_eq!(channel.pop(true).unwrap(), None);
    handle.join().unwrap();
}

#[test]
fn test_end_of_stream_is_permanent() {
    let channel = Channel::from_values(nums(&[1]));
    assert_eq!(channel.pop(false).unwrap(), Some(num(1)));
    assert_eq!(channel.pop(false).unwrap(), None);
    assert_eq!(channel.pop(true).unwrap(), None);
    assert!(channel.is_terminated());
}

#[test]
fn test_non_blocking_pop_on_empty_open_channel() {
    let channel = Channel::new(CancelToken::never());
    assert_eq!(channel.pop(false), Err(ChannelError::WouldBlock));
}

#[test]
fn test_push_after_terminate_fails() {
    let channel = Channel::new(CancelToken::never());
    channel.terminate().unwrap();
    assert_eq!(channel.push(num(1)), Err(ChannelError::Closed));
    assert_eq!(channel.terminate(), Err(ChannelError::Closed));
    assert_eq!(channel.values().count(), 0);
}

#[test]
fn test_pull_preserves_order() {
    let source = Channel::from_values(nums(&[1, 2, 3]));
    let sink = Channel::new(CancelToken::never());
    sink.push(num(0)).unwrap();
    sink.pull(&source, true).unwrap();
    assert_eq!(sink.values().collect::<Vec<_>>(), nums(&[0, 1, 2, 3]));
}

#[test]
fn test_cancel_wakes_blocked_reader() {
    let cancel = CancelToken::new();
    let channel = Channel::new(cancel.clone());
    let reader = channel.clone();
    let handle = thread::spawn(move || reader.pop(true));
    thread::sleep(test_timeout());
    cancel.cancel();
    assert_eq!(handle.join().unwrap(), Err(ChannelError::Cancelled));
}

#[test]
fn test_split_replicas_see_buffered_and_later_values() {
    let channel = Channel::new(CancelToken::new());
    channel.push(num(1)).unwrap();
    let replicas = channel.split(3);

    let producer = channel.clone();
    let handle = thread::spawn(move || {
        producer.push(num(2)).unwrap();
        producer.terminate().unwrap();
    });

    for replica in &replicas {
        assert_eq!(replica.values().collect::<Vec<_>>(), nums(&[1, 2]));
    }
    handle.join().unwrap();
    assert_eq!(channel.pop(false).unwrap(), None);
}

#[test]
fn test_split_of_exhausted_channel_is_empty() {
    let channel = Channel::from_values(nums(&[1]));
    let _ = channel.values().count();
    let (a, b) = channel.split2();
    assert_eq!(a.values().count(), 0);
    assert_eq!(b.values().count(), 0);
}

#[test]
fn test_split_broadcasts_namespaces_before_values() {
    let channel = Channel::new(CancelToken::new());
    let (a, b) = channel.split2();
    let scope = Scope::new().bind("x", nums(&[1]));
    channel.namespaces().set_locals(scope.clone()).unwrap();
    channel.namespaces().fill_defaults();

    assert_eq!(a.locals().unwrap(), scope);
    assert_eq!(b.locals().unwrap(), scope);
    assert_eq!(a.pop(false), Err(ChannelError::WouldBlock));
    channel.terminate().unwrap();
    assert_eq!(a.values().count(), 0);
}

#[test]
fn test_relay_namespaces_selected_slots_only() {
    let mut set = NamespaceSet::default();
    set.globals = Scope::new().bind("g", vec![Value::Null]);
    let source = Channel::with_namespaces(Vec::new(), set);
    let target = Channel::new(CancelToken::never());

    jqsh::channel::join_all(source.relay_namespaces(&[target.clone()], &[SlotKind::Globals]));
    assert!(target.namespaces().is_set(SlotKind::Globals));
    assert!(!target.namespaces().is_set(SlotKind::Locals));
    assert!(target.globals().unwrap().contains("g"));
}

#[test]
fn test_throw_delivers_exception_and_defaults() {
    let channel = Channel::new(CancelToken::never());
    channel.throw(jqsh::Exception::new("boom"));
    let values: Vec<Value> = channel.values().collect();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].as_exception().map(|e| e.name()), Some("boom"));
    assert!(channel.namespace_set().is_ok());
}

#[test]
fn test_concurrent_lazy_array_readers_agree() {
    let queue = jqsh::channel::Queue::new(CancelToken::new());
    let array = jqsh::values::JqArray::from_queue(queue.clone());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let array = array.clone();
            thread::spawn(move || array.items())
        })
        .collect();
    for n in 0..50 {
        queue.push(num(n)).unwrap();
    }
    queue.terminate().unwrap();

    let expected: Vec<Value> = (0..50).map(num).collect();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), expected);
    }
}
