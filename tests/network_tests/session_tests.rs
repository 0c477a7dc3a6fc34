//! Tests for Session
//!
//! These tests verify:
//! - Handshake and authentication
//! - Reply resolution for the common shapes
//! - The command-list state machine
//! - Reconnect-and-retry on transport failure
//! - Chunked binary transfers

mod mock;

use std::fmt;
use std::io;
use std::sync::Arc;

use mock::{Probe, Script, ScriptedConnector};
use mpdwire::protocol::{Arg, Pair, Record, Reply, ResponseShape};
use mpdwire::{Config, Logger, MpdError, Session};
use parking_lot::Mutex;

// =============================================================================
// Helper Functions
// =============================================================================

fn session_with(scripts: Vec<Script>) -> (Session, Probe) {
    session_with_config(Config::default(), scripts)
}

fn session_with_config(config: Config, scripts: Vec<Script>) -> (Session, Probe) {
    let (connector, probe) = ScriptedConnector::new(scripts);
    let session = Session::new(config).with_connector(connector);
    (session, probe)
}

fn connected(scripts: Vec<Script>) -> (Session, Probe) {
    let (mut session, probe) = session_with(scripts);
    session.connect().unwrap();
    (session, probe)
}

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().map(|(k, v)| Pair::new(*k, *v)).collect()
}

#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl Logger for RecordingLogger {
    fn log(&self, level: tracing::Level, message: fmt::Arguments<'_>) {
        self.lines.lock().push(format!("{} {}", level, message));
    }
}

// =============================================================================
// Handshake Tests
// =============================================================================

#[test]
fn test_connect_reads_version() {
    let (session, probe) = connected(vec![Script::hello()]);

    assert!(session.is_connected());
    let version = session.version().unwrap();
    assert_eq!(version.as_str(), "0.23.5");
    assert!(version.at_least(0, 23));
    assert!(!version.at_least(0, 24));
    assert_eq!(probe.connects(), 1);
}

#[test]
fn test_connect_is_noop_when_connected() {
    let (mut session, probe) = connected(vec![Script::hello(), Script::hello()]);
    session.connect().unwrap();
    assert_eq!(probe.connects(), 1);
}

#[test]
fn test_handshake_rejects_unexpected_greeting() {
    let (mut session, _probe) = session_with(vec![Script::default().line("HELLO 1.0")]);

    let err = session.connect().unwrap_err();
    assert!(matches!(err, MpdError::Handshake(_)));
    assert!(!session.is_connected());
    assert!(session.version().is_none());
}

#[test]
fn test_handshake_requires_newline() {
    let (mut session, _probe) = session_with(vec![Script::default().bytes(b"OK MPD 0.23.5")]);

    let err = session.connect().unwrap_err();
    assert!(matches!(err, MpdError::Handshake(_)));
    assert!(!session.is_connected());
}

#[test]
fn test_password_sent_after_handshake() {
    let config = Config::builder().password("s3cret").build();
    let (mut session, probe) = session_with_config(config, vec![Script::hello().line("OK")]);

    session.connect().unwrap();
    assert_eq!(probe.written(), "password \"s3cret\"\n");
}

#[test]
fn test_password_rejected() {
    let config = Config::builder().password("wrong").build();
    let script = Script::hello().line("ACK [3@0] {password} incorrect password");
    let (mut session, _probe) = session_with_config(config, vec![script]);

    let err = session.connect().unwrap_err();
    let ack = err.ack().unwrap();
    assert_eq!(ack.code, Some(3));
    assert_eq!(ack.text, "incorrect password");
    assert!(!session.is_connected());
}

#[test]
fn test_logger_receives_session_events() {
    let logger = Arc::new(RecordingLogger::default());
    let (connector, _probe) = ScriptedConnector::new(vec![Script::hello()]);
    let mut session = Session::new(Config::default())
        .with_connector(connector)
        .with_logger(logger.clone());

    session.connect().unwrap();
    let lines = logger.lines.lock();
    assert!(lines.iter().any(|l| l.contains("connected to localhost:6600")));
}

// =============================================================================
// Exchange Tests
// =============================================================================

#[test]
fn test_status_reply_is_a_record() {
    let (mut session, probe) = connected(vec![Script::hello().lines("volume: 100\nOK")]);

    let reply = session.call("status", &[]).unwrap();
    assert_eq!(reply, Reply::Record(Some(record(&[("volume", "100")]))));
    assert_eq!(probe.written(), "status\n");
}

#[test]
fn test_song_list_reply() {
    let body = "file: a.flac\nTitle: A\nfile: b.flac\nTitle: B\nOK";
    let (mut session, probe) = connected(vec![Script::hello().lines(body)]);

    let songs = session
        .call("playlistinfo", &[Arg::from(0..2u32)])
        .unwrap()
        .into_records()
        .unwrap();
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[1].get("Title"), Some("B"));
    assert_eq!(probe.written(), "playlistinfo 0:2\n");
}

#[test]
fn test_empty_reply_is_absent_record() {
    let (mut session, _probe) = connected(vec![Script::hello().line("OK")]);

    let reply = session.call("currentsong", &[]).unwrap();
    assert_eq!(reply, Reply::Record(None));
}

#[test]
fn test_ack_surfaces_server_message() {
    let script = Script::hello().line("ACK [50@0] {play} No such song");
    let (mut session, _probe) = connected(vec![script]);

    let err = session.call("play", &[Arg::from(99u32)]).unwrap_err();
    let ack = err.ack().unwrap();
    assert_eq!(ack.message, "[50@0] {play} No such song");
    assert_eq!(ack.code, Some(50));
    assert_eq!(ack.command.as_deref(), Some("play"));
    assert_eq!(ack.text, "No such song");
    assert!(session.is_connected());
}

#[test]
fn test_list_ok_outside_command_list() {
    let (mut session, _probe) = connected(vec![Script::hello().line("list_OK")]);

    let err = session.call("status", &[]).unwrap_err();
    assert!(matches!(err, MpdError::Framing(_)));
}

#[test]
fn test_raw_write_and_read() {
    let (mut session, probe) = connected(vec![Script::hello().lines("tagtype: Artist\ntagtype: Album\nOK")]);

    session.write_line("tagtypes").unwrap();
    let reply = session.read_shape(ResponseShape::List).unwrap();
    assert_eq!(reply, Reply::List(vec!["Artist".into(), "Album".into()]));
    assert_eq!(probe.written(), "tagtypes\n");
}

#[test]
fn test_send_before_connect() {
    let (mut session, probe) = session_with(vec![Script::hello()]);

    let err = session.call("status", &[]).unwrap_err();
    assert!(matches!(err, MpdError::NotConnected));
    assert_eq!(probe.connects(), 0);
}

#[test]
fn test_unknown_command() {
    let (mut session, probe) = connected(vec![Script::hello()]);

    let err = session.call("frobnicate", &[]).unwrap_err();
    assert!(matches!(err, MpdError::UnknownCommand(name) if name == "frobnicate"));
    assert_eq!(probe.written(), "");
}

#[test]
fn test_disconnect_resets_state() {
    let (mut session, _probe) = connected(vec![Script::hello()]);
    session.begin_batch().unwrap();

    session.disconnect();
    assert!(!session.is_connected());
    assert!(session.version().is_none());
    assert!(!session.is_batching());
    assert!(matches!(
        session.call("status", &[]).unwrap_err(),
        MpdError::NotConnected
    ));
}

// =============================================================================
// Command List Tests
// =============================================================================

#[test]
fn test_command_list_resolves_in_order() {
    let body = "list_OK\nkey: val\nlist_OK\nOK";
    let (mut session, probe) = connected(vec![Script::hello().lines(body)]);

    session.begin_batch().unwrap();
    assert!(session.call("clearerror", &[]).unwrap().is_deferred());
    assert!(session.call("currentsong", &[]).unwrap().is_deferred());
    assert_eq!(session.pending(), 2);

    let replies = session.end_batch().unwrap();
    assert_eq!(
        replies,
        vec![Reply::Nothing, Reply::Record(Some(record(&[("key", "val")])))]
    );
    assert!(!session.is_batching());
    assert_eq!(
        probe.written(),
        "command_list_ok_begin\nclearerror\ncurrentsong\ncommand_list_end\n"
    );
}

#[test]
fn test_empty_command_list() {
    let (mut session, _probe) = connected(vec![Script::hello().line("OK")]);

    session.begin_batch().unwrap();
    assert!(session.end_batch().unwrap().is_empty());
}

#[test]
fn test_command_list_ack_stops_reading() {
    let hello = "OK MPD 0.23.5\n";
    let before_ack = "list_OK\nACK [50@1] {play} No such song\n";
    let script = Script::hello()
        .lines(before_ack)
        .lines("list_OK\nOK");
    let (mut session, probe) = connected(vec![script]);

    session.begin_batch().unwrap();
    session.call("clearerror", &[]).unwrap();
    session.call("play", &[Arg::from(7u32)]).unwrap();
    session.call("stop", &[]).unwrap();

    let err = session.end_batch().unwrap_err();
    assert_eq!(err.ack().unwrap().list_index, Some(1));
    assert_eq!(probe.delivered(), hello.len() + before_ack.len());
    assert!(!session.is_batching());
    assert!(session.is_connected());
}

#[test]
fn test_nested_command_list_is_rejected() {
    let (mut session, probe) = connected(vec![Script::hello()]);

    session.begin_batch().unwrap();
    session.call("stop", &[]).unwrap();
    let err = session.begin_batch().unwrap_err();
    assert!(matches!(err, MpdError::Framing(_)));
    assert!(session.is_batching());
    assert_eq!(session.pending(), 1);
    assert_eq!(probe.written(), "command_list_ok_begin\nstop\n");
}

#[test]
fn test_end_without_begin() {
    let (mut session, _probe) = connected(vec![Script::hello()]);
    assert!(matches!(
        session.end_batch().unwrap_err(),
        MpdError::Framing(_)
    ));
}

#[test]
fn test_command_list_missing_item_terminator() {
    let (mut session, _probe) = connected(vec![Script::hello().lines("list_OK\nOK")]);

    session.begin_batch().unwrap();
    session.call("stop", &[]).unwrap();
    session.call("clear", &[]).unwrap();

    let err = session.end_batch().unwrap_err();
    assert!(matches!(err, MpdError::Framing(_)));
}

#[test]
fn test_command_list_truncated_by_eof() {
    let (mut session, _probe) = connected(vec![Script::hello().line("list_OK")]);

    session.begin_batch().unwrap();
    session.call("stop", &[]).unwrap();
    session.call("clear", &[]).unwrap();

    let err = session.end_batch().unwrap_err();
    assert!(matches!(err, MpdError::Framing(msg) if msg.contains("1 of 2")));
}

#[test]
fn test_command_list_missing_final_ok() {
    let (mut session, _probe) = connected(vec![Script::hello().line("list_OK")]);

    session.begin_batch().unwrap();
    session.call("clearerror", &[]).unwrap();

    let err = session.end_batch().unwrap_err();
    assert!(matches!(err, MpdError::Framing(msg) if msg.contains("final OK")));
    assert!(!session.is_batching());
    assert!(!session.is_connected());
}

#[test]
fn test_reads_are_rejected_inside_command_list() {
    let (mut session, _probe) = connected(vec![Script::hello()]);

    session.begin_batch().unwrap();
    let err = session.read_shape(ResponseShape::Nothing).unwrap_err();
    assert!(matches!(err, MpdError::Framing(_)));
}

// =============================================================================
// Reconnect Tests
// =============================================================================

#[test]
fn test_read_failure_reconnects_once() {
    let scripts = vec![
        Script::hello().fail(io::ErrorKind::ConnectionReset),
        Script::hello().lines("volume: 50\nOK"),
    ];
    let (mut session, probe) = connected(scripts);

    let reply = session.call("status", &[]).unwrap();
    assert_eq!(reply.into_record().unwrap().get("volume"), Some("50"));
    assert_eq!(probe.connects(), 2);
    assert_eq!(probe.written(), "status\nstatus\n");
}

#[test]
fn test_write_failure_reconnects_once() {
    let scripts = vec![
        Script::hello().fail_writes(),
        Script::hello().line("OK"),
    ];
    let (mut session, probe) = connected(scripts);

    session.call("pause", &[Arg::from(true)]).unwrap();
    assert_eq!(probe.connects(), 2);
    assert_eq!(probe.written(), "pause 1\n");
}

#[test]
fn test_second_failure_surfaces_transport_error() {
    let scripts = vec![
        Script::hello().fail(io::ErrorKind::ConnectionReset),
        Script::hello().fail(io::ErrorKind::ConnectionReset),
        Script::hello().line("OK"),
    ];
    let (mut session, probe) = connected(scripts);

    let err = session.call("stop", &[]).unwrap_err();
    assert!(err.is_transport());
    assert_eq!(probe.connects(), 2);
}

#[test]
fn test_reconnect_disabled() {
    let config = Config::builder().reconnect(false).build();
    let scripts = vec![
        Script::hello().fail(io::ErrorKind::ConnectionReset),
        Script::hello().line("OK"),
    ];
    let (mut session, probe) = session_with_config(config, scripts);
    session.connect().unwrap();

    let err = session.call("stop", &[]).unwrap_err();
    assert!(err.is_transport());
    assert_eq!(probe.connects(), 1);
    assert!(!session.is_connected());
}

#[test]
fn test_hang_up_before_reply_is_retried() {
    let scripts = vec![
        Script::hello(),
        Script::hello().lines("file: a.flac\nTitle: A\nOK"),
    ];
    let (mut session, probe) = connected(scripts);

    let song = session.call("currentsong", &[]).unwrap().into_record().unwrap();
    assert_eq!(song.get("Title"), Some("A"));
    assert_eq!(probe.connects(), 2);
    assert_eq!(probe.written(), "currentsong\ncurrentsong\n");
}

#[test]
fn test_hang_up_on_both_attempts() {
    let (mut session, probe) = connected(vec![Script::hello(), Script::hello()]);

    let err = session.call("play", &[]).unwrap_err();
    assert!(matches!(&err, MpdError::Transport(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    assert_eq!(probe.connects(), 2);
    assert!(!session.is_connected());
}

#[test]
fn test_hang_up_mid_reply_is_not_a_short_reply() {
    let scripts = vec![
        Script::hello().line("volume: 40"),
        Script::hello().lines("volume: 40\nstate: stop\nOK"),
    ];
    let (mut session, probe) = connected(scripts);

    let status = session.call("status", &[]).unwrap().into_record().unwrap();
    assert_eq!(status.get("state"), Some("stop"));
    assert_eq!(probe.connects(), 2);
}

#[test]
fn test_failed_connection_is_not_reported_connected() {
    let config = Config::builder().reconnect(false).build();
    let (mut session, probe) = session_with_config(config, vec![Script::hello(), Script::hello()]);
    session.connect().unwrap();

    assert!(session.call("stop", &[]).unwrap_err().is_transport());
    assert!(!session.is_connected());
    assert!(session.version().is_none());

    // An explicit connect replaces the failed connection
    session.connect().unwrap();
    assert!(session.is_connected());
    assert_eq!(probe.connects(), 2);
}

#[test]
fn test_ack_is_not_retried() {
    let scripts = vec![
        Script::hello().line("ACK [2@0] {setvol} Invalid volume value"),
        Script::hello().line("OK"),
    ];
    let (mut session, probe) = connected(scripts);

    let err = session.call("setvol", &[Arg::from(300u32)]).unwrap_err();
    assert!(matches!(err, MpdError::Protocol(_)));
    assert_eq!(probe.connects(), 1);
}

// =============================================================================
// Binary Transfer Tests
// =============================================================================

#[test]
fn test_fetch_binary_follows_server_chunk_sizes() {
    let script = Script::hello()
        .lines("size: 10\ntype: image/png\nbinary: 4")
        .bytes(b"abcd\n")
        .line("OK")
        .lines("size: 10\ntype: image/png\nbinary: 3")
        .bytes(b"efg\n")
        .line("OK")
        .lines("size: 10\ntype: image/png\nbinary: 3")
        .bytes(b"hij\n")
        .line("OK");
    let (mut session, probe) = connected(vec![script]);

    let object = session
        .fetch_binary("readpicture", &[Arg::from("cover.flac")])
        .unwrap()
        .unwrap();

    assert_eq!(&object.data[..], b"abcdefghij");
    assert_eq!(object.mime_type(), Some("image/png"));
    assert_eq!(object.meta.get("size"), Some("10"));
    assert_eq!(
        probe.written(),
        "readpicture \"cover.flac\" 0\nreadpicture \"cover.flac\" 4\nreadpicture \"cover.flac\" 7\n"
    );
}

#[test]
fn test_fetch_binary_nothing_to_send() {
    let (mut session, _probe) = connected(vec![Script::hello().line("OK")]);

    let object = session
        .fetch_binary("readpicture", &[Arg::from("plain.mp3")])
        .unwrap();
    assert!(object.is_none());
}

#[test]
fn test_fetch_binary_rejects_empty_chunk() {
    let script = Script::hello()
        .lines("size: 10\nbinary: 0")
        .bytes(b"\n")
        .line("OK");
    let (mut session, _probe) = connected(vec![script]);

    let err = session
        .fetch_binary("albumart", &[Arg::from("a.flac")])
        .unwrap_err();
    assert!(matches!(err, MpdError::Framing(_)));
}

#[test]
fn test_fetch_binary_inside_command_list() {
    let (mut session, _probe) = connected(vec![Script::hello()]);

    session.begin_batch().unwrap();
    let err = session
        .fetch_binary("albumart", &[Arg::from("a.flac")])
        .unwrap_err();
    assert!(matches!(err, MpdError::Framing(_)));
}
