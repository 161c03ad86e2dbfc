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

//! Run a broker on the given address until interrupted.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use mqtt_endpoint_core::logger;
use mqtt_endpoint_core::mqtt::config::BrokerConfig;
use mqtt_endpoint_core::mqtt::endpoint::MqttBroker;

#[derive(Parser)]
#[command(
    name = "mqtt-broker",
    version,
    about = "A lightweight MQTT v3.1.1 broker",
    disable_help_flag = true
)]
struct Args {
    #[arg(long, action = clap::ArgAction::Help, help = "Print help")]
    help: Option<bool>,

    /// Listen host
    #[arg(short = 'h', long, default_value = "0.0.0.0")]
    host: String,

    /// Listen port
    #[arg(short = 'p', long, default_value_t = 1883)]
    port: u16,

    /// Maximum number of simultaneous clients
    #[arg(short = 'c', long, default_value_t = 10)]
    max_clients: usize,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = BrokerConfig {
        max_clients: args.max_clients,
        ..BrokerConfig::default()
    };
    let mut broker = MqttBroker::new(config);
    broker.start(&args.host, args.port)?;
    loop {
        broker.task()?;
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
            eprintln!("mqtt-broker: {err}");
            ExitCode::FAILURE
        }
    }
}
