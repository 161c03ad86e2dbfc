// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Publish one message to a broker, then disconnect.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::Level;

use mqtt_endpoint_core::logger;
use mqtt_endpoint_core::mqtt::config::ClientConfig;
use mqtt_endpoint_core::mqtt::endpoint::{ClientEventHandler, ClientState, MqttClient};
use mqtt_endpoint_core::mqtt::packet::Qos;
use mqtt_endpoint_core::mqtt::result_code::ConnackReturnCode;

#[derive(Parser)]
#[command(
    name = "mqtt-pub",
    version,
    about = "Publish a message on an MQTT broker",
    disable_help_flag = true
)]
struct Args {
    #[arg(long, action = clap::ArgAction::Help, help = "Print help")]
    help: Option<bool>,

    /// Broker host
    #[arg(short = 'h', long, default_value = "127.0.0.1")]
    host: String,

    /// Broker port
    #[arg(short = 'p', long, default_value_t = 1883)]
    port: u16,

    /// Topic to publish on
    #[arg(short = 't', long)]
    topic: String,

    /// Message payload
    #[arg(short = 'm', long, default_value = "")]
    message: String,

    /// QoS level (0..=2)
    #[arg(short = 'q', long, default_value_t = 0)]
    qos: u8,

    /// Ask the broker to retain the message
    #[arg(short = 'r', long)]
    retain: bool,

    /// Keepalive in seconds (0 disables)
    #[arg(short = 'k', long, default_value_t = 0)]
    keepalive: u16,

    /// Username
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Password
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Client identifier
    #[arg(short = 'i', long, default_value = "mqtt-pub")]
    client_id: String,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Default)]
struct Flags {
    failed: AtomicBool,
    disconnected: AtomicBool,
}

struct PubHandler {
    flags: Arc<Flags>,
}

impl ClientEventHandler for PubHandler {
    fn on_connect(&mut self, connected: bool, return_code: ConnackReturnCode) {
        if !connected {
            eprintln!("connection failed: {return_code}");
            self.flags.failed.store(true, Ordering::SeqCst);
        }
    }

    fn on_disconnect(&mut self, expected: bool) {
        if !expected {
            eprintln!("connection lost");
            self.flags.failed.store(true, Ordering::SeqCst);
        }
        self.flags.disconnected.store(true, Ordering::SeqCst);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let qos = Qos::try_from(args.qos).map_err(|_| "invalid QoS, must be 0, 1 or 2")?;
    let flags = Arc::new(Flags::default());

    let mut client = MqttClient::new(ClientConfig::default());
    client.set_client_id(args.client_id.as_str())?;
    client.set_keepalive(args.keepalive)?;
    client.set_handler(Box::new(PubHandler {
        flags: flags.clone(),
    }))?;
    if let Some(username) = &args.username {
        client.set_credentials(username, args.password.as_deref().map(str::as_bytes))?;
    }
    client.connect(&args.host, args.port)?;

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut published = false;
    loop {
        client.task()?;
        if flags.failed.load(Ordering::SeqCst) {
            return Err("publish aborted".into());
        }
        if client.is_connected() && !published {
            client.publish(&args.topic, args.message.as_bytes(), qos, args.retain)?;
            println!("published on '{}'", args.topic);
            published = true;
            client.disconnect()?;
        }
        if published && client.state() == ClientState::Disconnected {
            return Ok(());
        }
        if Instant::now() > deadline {
            return Err("timed out waiting for the broker".into());
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    });

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mqtt-pub: {err}");
            ExitCode::FAILURE
        }
    }
}
