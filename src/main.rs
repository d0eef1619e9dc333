use std::net::{SocketAddr, TcpListener};
use std::thread;

use anyhow::Context;
use async_io::Async;
use clap::Parser;
use h1_framer::server::{self, CancellationToken, DecodeOptions, ServerOptions};
use log::info;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

mod demo;

/// Serve the demo handler over HTTP/1.1.
#[derive(Debug, Parser)]
#[command(name = "h1-framer", version, about, long_about = None)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "H1_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(short, long, env = "H1_PORT", default_value_t = 42069)]
    port: u16,

    /// Initial size of each connection's read buffer, in bytes.
    #[arg(long, default_value_t = 1024)]
    initial_buffer: usize,

    /// Size a read buffer may never grow past, in bytes.
    #[arg(long, default_value_t = 64 * 1024)]
    max_buffer: usize,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;
    let listener = Async::<TcpListener>::bind(addr)
        .with_context(|| format!("failed to make listener on {}", addr))?;
    info!("Server started on {}", listener.get_ref().local_addr()?);

    let token = CancellationToken::new();
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    let on_signal = token.clone();
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!("received signal {}, shutting down", signal);
            on_signal.cancel();
        }
    });

    let opts = ServerOptions {
        decode: DecodeOptions {
            initial_capacity: args.initial_buffer,
            max_capacity: args.max_buffer,
        },
    };
    async_global_executor::block_on(server::listen(listener, demo::Demo, opts, token));
    info!("Server gracefully stopped");
    Ok(())
}
