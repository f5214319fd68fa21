//! Feeds synthetic headset traffic into the relay as a producer: EEG bursts
//! at the real packet cadence, slowly drifting motion vectors, and an
//! optional periodic frontal spike to exercise blink detection downstream.

use std::f32::consts::PI;
use std::time::Duration;

use brain_core::{FRONTAL_CHANNELS, NUM_CHANNELS};
use clap::Parser;
use daemon::protocol::FeedMessage;
use daemon::synth::SynthEeg;
use futures_util::SinkExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mock-producer")]
struct Args {
    /// Relay WebSocket URL.
    #[arg(long, default_value = "ws://127.0.0.1:8765")]
    relay: String,
    /// Inject a 500 µV frontal spike every N seconds; 0 disables.
    #[arg(long, default_value_t = 10)]
    blink_every_secs: u64,
}

const SAMPLE_RATE: f32 = 256.0;
/// Samples per channel per packet, matching the headset's BLE framing.
const SAMPLES_PER_PACKET: usize = 12;
const SPIKE_AMPLITUDE_UV: f32 = 500.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_producer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let url = format!("{}?role=producer", args.relay);
    tracing::info!("connecting to relay at {}", url);
    let (ws, _) = connect_async(&url).await?;
    let (mut sink, _) = futures_util::StreamExt::split(ws);

    let mut synth = SynthEeg::new(SAMPLE_RATE);
    let packet_period = Duration::from_secs_f32(SAMPLES_PER_PACKET as f32 / SAMPLE_RATE);
    let mut interval = tokio::time::interval(packet_period);
    let mut packets = 0u64;
    let packets_per_spike = if args.blink_every_secs == 0 {
        u64::MAX
    } else {
        args.blink_every_secs * SAMPLE_RATE as u64 / SAMPLES_PER_PACKET as u64
    };

    tracing::info!("streaming synthetic EEG at {} Hz", SAMPLE_RATE);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {}
        }
        packets += 1;
        let spike = packets % packets_per_spike == 0;

        for ch in 0..NUM_CHANNELS {
            let mut samples = synth.next_burst(ch, SAMPLES_PER_PACKET);
            if spike && FRONTAL_CHANNELS.contains(&ch) {
                for v in &mut samples {
                    *v += SPIKE_AMPLITUDE_UV;
                }
            }
            let frame = serde_json::to_string(&FeedMessage::Eeg { ch, samples })?;
            sink.send(Message::Text(frame)).await?;
        }
        if spike {
            tracing::info!("injected frontal spike");
        }

        // Motion at a coarser cadence: slow gravity wobble and gyro drift.
        if packets % 5 == 0 {
            let t = packets as f32 * packet_period.as_secs_f32();
            let accel = FeedMessage::Accel {
                x: 0.02 * (0.3 * t).sin(),
                y: 0.02 * (0.2 * t).cos(),
                z: 0.98,
            };
            let gyro = FeedMessage::Gyro {
                x: 1.5 * (0.5 * t).sin(),
                y: 1.5 * (0.4 * t + PI / 3.0).sin(),
                z: 0.2,
            };
            sink.send(Message::Text(serde_json::to_string(&accel)?)).await?;
            sink.send(Message::Text(serde_json::to_string(&gyro)?)).await?;
        }

        if packets % (30 * SAMPLE_RATE as u64 / SAMPLES_PER_PACKET as u64) == 0 {
            let telemetry = FeedMessage::Telemetry {
                battery: 0.9,
                temp: 31.0,
            };
            sink.send(Message::Text(serde_json::to_string(&telemetry)?)).await?;
        }
    }

    tracing::info!("producer stopped");
    Ok(())
}
