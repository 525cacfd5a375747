mod common;

use common::{scores, RecordingChannel};
use serde_json::json;
use tally_protocol::*;
use tally_state::{Channel, Origin, Session, SessionHub};

fn hub() -> SessionHub<RecordingChannel> {
    SessionHub::new(Session::default())
}

fn connect(hub: &mut SessionHub<RecordingChannel>, device_id: &str) -> (RecordingChannel, Origin) {
    let channel = RecordingChannel::new();
    let origin = Origin::new(device_id, channel.id(), "192.168.1.60");
    hub.connect(device_id, channel.clone(), None);
    (channel, origin)
}

fn vote_intent(a: i64) -> ClientIntent {
    ClientIntent::SubmitVote(VoteSubmission {
        items: vec![BallotItem::group(scores(&[("a", json!(a))]))],
    })
}

fn open_voting(hub: &mut SessionHub<RecordingChannel>, host: &Origin) {
    hub.apply(
        host,
        ClientIntent::CreateSession(CreateSessionParams {
            name: "Demo Day".into(),
            categories: vec![Category::new("a", "Clarity")],
        }),
    );
    hub.apply(
        host,
        ClientIntent::UpdateStatus(StatusUpdate::default().subject("Team1").open(true)),
    );
}

#[test]
fn test_connect_pushes_snapshot_to_new_channel_only() {
    let mut hub = hub();
    let (first, _) = connect(&mut hub, "device-1");
    let (second, _) = connect(&mut hub, "device-2");

    assert_eq!(first.snapshots().len(), 1);
    assert_eq!(second.snapshots().len(), 1);
}

#[test]
fn test_connect_refreshes_display_addresses() {
    let mut hub = hub();
    let channel = RecordingChannel::new();
    let addresses = vec![DisplayAddress::new("eth0", "192.168.1.2", 3000)];

    hub.connect("LOCALHOST", channel.clone(), Some(addresses.clone()));

    assert_eq!(hub.session().available_ips(), addresses.as_slice());
    assert_eq!(channel.snapshots()[0].available_ips, addresses);
}

#[test]
fn test_every_transition_broadcasts_to_all() {
    let mut hub = hub();
    let (host, host_origin) = connect(&mut hub, LOCALHOST_DEVICE_ID);
    let (student, _) = connect(&mut hub, "device-1");

    open_voting(&mut hub, &host_origin);

    // Initial push plus create-session and update-status.
    assert_eq!(host.snapshots().len(), 3);
    assert_eq!(student.snapshots().len(), 3);

    let latest = student.snapshots().pop().unwrap();
    assert!(latest.session_id.is_some());
    assert_eq!(latest.current_subject, "Team1");
    assert!(latest.is_voting_open);
}

#[test]
fn test_accepted_vote_broadcasts_state() {
    let mut hub = hub();
    let (host, host_origin) = connect(&mut hub, LOCALHOST_DEVICE_ID);
    let (student, student_origin) = connect(&mut hub, "device-1");
    open_voting(&mut hub, &host_origin);

    hub.apply(&student_origin, vote_intent(4));

    let latest = host.snapshots().pop().unwrap();
    assert_eq!(latest.votes.len(), 1);
    assert_eq!(latest.votes[0].device_id, "device-1");
    assert!(student.errors().is_empty());
}

#[test]
fn test_rejection_goes_to_submitter_only() {
    let mut hub = hub();
    let (host, host_origin) = connect(&mut hub, LOCALHOST_DEVICE_ID);
    let (student, student_origin) = connect(&mut hub, "device-1");
    open_voting(&mut hub, &host_origin);

    hub.apply(&student_origin, vote_intent(4));
    let host_snapshots = host.snapshots().len();

    hub.apply(&student_origin, vote_intent(5));

    assert_eq!(student.errors(), [ALREADY_VOTED_MESSAGE]);
    assert!(host.errors().is_empty());
    assert_eq!(host.snapshots().len(), host_snapshots, "rejection must not broadcast");
    assert_eq!(hub.session().votes().len(), 1);
}

#[test]
fn test_closed_voting_notice() {
    let mut hub = hub();
    let (student, student_origin) = connect(&mut hub, "device-1");

    hub.apply(&student_origin, vote_intent(4));

    assert_eq!(student.errors(), [VOTING_CLOSED_MESSAGE]);
    assert!(hub.session().votes().is_empty());
}

#[test]
fn test_reconnect_supersedes_and_keeps_vote_history() {
    let mut hub = hub();
    let (_, host_origin) = connect(&mut hub, LOCALHOST_DEVICE_ID);
    let (old_tab, old_origin) = connect(&mut hub, "AA:BB:CC:DD:EE:FF");
    open_voting(&mut hub, &host_origin);
    hub.apply(&old_origin, vote_intent(4));

    let (new_tab, new_origin) = connect(&mut hub, "AA:BB:CC:DD:EE:FF");

    assert_eq!(old_tab.superseded_count(), 1);
    assert!(old_tab.is_closed());
    assert_eq!(hub.registry().len(), 2);

    hub.apply(&new_origin, vote_intent(1));
    assert_eq!(new_tab.errors(), [ALREADY_VOTED_MESSAGE]);

    // The late disconnect of the old tab leaves the new one registered.
    assert!(!hub.disconnect("AA:BB:CC:DD:EE:FF", old_origin.channel_id));
    assert!(hub
        .registry()
        .is_current("AA:BB:CC:DD:EE:FF", new_origin.channel_id));
}

#[test]
fn test_intents_from_superseded_channel_are_dropped() {
    let mut hub = hub();
    let (_, host_origin) = connect(&mut hub, LOCALHOST_DEVICE_ID);
    let (_, old_origin) = connect(&mut hub, "device-1");
    open_voting(&mut hub, &host_origin);

    let (_, _new_origin) = connect(&mut hub, "device-1");
    hub.apply(&old_origin, vote_intent(4));

    assert!(hub.session().votes().is_empty());
}

#[test]
fn test_out_of_range_selection_is_silent() {
    let mut hub = hub();
    let channel = RecordingChannel::new();
    let origin = Origin::new(LOCALHOST_DEVICE_ID, channel.id(), "127.0.0.1");
    hub.connect(
        LOCALHOST_DEVICE_ID,
        channel.clone(),
        Some(vec![
            DisplayAddress::new("eth0", "192.168.1.2", 3000),
            DisplayAddress::new("wlan0", "10.0.0.2", 3000),
        ]),
    );

    hub.apply(&origin, ClientIntent::SelectDisplayAddress { index: 7 });
    hub.apply(&origin, ClientIntent::SelectDisplayAddress { index: -1 });
    assert_eq!(channel.snapshots().len(), 1);
    assert!(channel.errors().is_empty());

    hub.apply(&origin, ClientIntent::SelectDisplayAddress { index: 1 });
    assert_eq!(channel.snapshots().len(), 2);
    assert_eq!(hub.session().selected_ip_index(), 1);
}

#[test]
fn test_export_reads_current_log() {
    let mut hub = hub();
    let (_, host_origin) = connect(&mut hub, LOCALHOST_DEVICE_ID);
    let (_, student_origin) = connect(&mut hub, "device-1");
    open_voting(&mut hub, &host_origin);
    hub.apply(&student_origin, vote_intent(4));

    let csv = hub.export_csv();
    assert!(csv.starts_with("Group/Subject,Participant/Detail,Vote Count,Clarity"));
    assert!(csv.contains("\"Team1\",\"Group Score\",1,4.00"));
    assert_eq!(hub.session().votes().len(), 1);
}
