//! Demo binary: an offerer and an answerer negotiate over the loopback
//! engine, exchanging the same JSON records a signaling server would relay.

use sdp_handshake::{
    config::{Config, HandshakeSettings},
    engine::{LocalTrack, LoopbackEngine, TrackKind},
    ice::{CandidateMessage, IceConnectionState},
    log::{log_sink::LogSink, logger::Logger},
    monitor::{ConnectionEvent, ConnectionMonitor, MonitorReport},
    negotiation::{NegotiationEvent, Negotiator},
    sdp::SessionDescription,
};
use std::{env, error::Error, sync::Arc};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

type DemoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> DemoResult<()> {
    let args: Vec<String> = env::args().collect();

    let config_result = if args.len() > 1 {
        let path = &args[1];
        println!("Loading config from {path}");
        Config::load(path)
    } else {
        Config::load("sdp_handshake.conf")
    };

    let config = config_result.unwrap_or_else(|e| {
        eprintln!("Error loading config: {e}. Using defaults.");
        Config::empty()
    });
    let settings = HandshakeSettings::from_config(&config);

    let logger = Logger::start(&settings.logging);
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());
    let result = run(&settings, sink).await;

    while let Some(line) = logger.try_recv_console() {
        println!("{line}");
    }
    println!("Log file: {}", logger.file_path().display());
    logger.shutdown();
    result
}

async fn run(settings: &HandshakeSettings, sink: Arc<dyn LogSink>) -> DemoResult<()> {
    let offer_engine = Arc::new(LoopbackEngine::new(settings.ice_servers.clone()));
    let answer_engine = Arc::new(LoopbackEngine::new(settings.ice_servers.clone()));
    let offerer = Negotiator::new(offer_engine.clone(), sink.clone());
    let answerer = Negotiator::new(answer_engine.clone(), sink.clone());

    let mut offerer_events = offerer.subscribe();
    let mut answerer_events = answerer.subscribe();

    let (report_tx, mut report_rx) = unbounded_channel();
    let monitor = tokio::spawn(
        ConnectionMonitor::new(settings.stall_timeout, sink).run(
            offerer.subscribe(),
            offer_engine.clone(),
            report_tx,
        ),
    );

    offerer
        .add_local_track(LocalTrack::new("mic", TrackKind::Audio))
        .await?;
    offerer
        .add_local_track(LocalTrack::new("cam", TrackKind::Video))
        .await?;

    let offer = offerer.create_offer().await?.serialize()?;
    println!("offerer -> answerer: {offer}");
    answerer
        .set_remote_offer(SessionDescription::parse(&offer)?)
        .await?;

    let answer = answerer.create_answer().await?.serialize()?;
    println!("answerer -> offerer: {answer}");
    offerer
        .set_remote_answer(SessionDescription::parse(&answer)?)
        .await?;

    for (negotiator, engine) in [(&offerer, &offer_engine), (&answerer, &answer_engine)] {
        for candidate in engine.gather_host_candidates() {
            negotiator.on_local_candidate(Some(candidate))?;
        }
        negotiator.on_local_candidate(None)?;
    }
    relay(&mut offerer_events, &answerer, "offerer -> answerer").await?;
    relay(&mut answerer_events, &offerer, "answerer -> offerer").await?;

    for negotiator in [&offerer, &answerer] {
        negotiator.on_ice_connection_state(IceConnectionState::Checking);
        negotiator.on_ice_connection_state(IceConnectionState::Connected);
    }

    while let Some(report) = report_rx.recv().await {
        print_report(&report);
        if report.event == ConnectionEvent::Established {
            break;
        }
    }

    offerer.close();
    answerer.close();
    monitor.await?;
    while let Some(report) = report_rx.recv().await {
        print_report(&report);
    }
    Ok(())
}

/// Forwards every trickle record `events` has published to `peer`, going
/// through the JSON wire form.
async fn relay(
    events: &mut UnboundedReceiver<NegotiationEvent>,
    peer: &Negotiator,
    label: &str,
) -> DemoResult<()> {
    while let Ok(event) = events.try_recv() {
        let message = match event {
            NegotiationEvent::LocalCandidate(tagged) => tagged.to_message(),
            NegotiationEvent::EndOfCandidates { sdp_mid, .. } => {
                let index = sdp_mid.as_ref().map(|_| 0);
                CandidateMessage::end_of_candidates(sdp_mid, index)
            }
            _ => continue,
        };
        let wire = message.serialize()?;
        println!("{label}: {wire}");
        let admission = peer
            .add_remote_candidate(CandidateMessage::parse(&wire)?)
            .await?;
        println!("  -> {admission:?}");
    }
    Ok(())
}

fn print_report(report: &MonitorReport) {
    match &report.selected_pair {
        Some(pair) => println!(
            "connection {}: pair {} ({} -> {})",
            report.event,
            pair.pair_id,
            pair.local
                .as_ref()
                .map_or_else(|| pair.local_candidate_id.clone(), |c| format!("{}:{}", c.address, c.port)),
            pair.remote
                .as_ref()
                .map_or_else(|| pair.remote_candidate_id.clone(), |c| format!("{}:{}", c.address, c.port)),
        ),
        None => println!("connection {}", report.event),
    }
}
