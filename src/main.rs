//! Lists the touchpads discovery accepts, and the dimension bytes the renderer would be sent.
//! `RUST_LOG=tracepad=debug` shows why everything else was skipped.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracepad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tracepad probe v{}", env!("CARGO_PKG_VERSION"));
    probe();
}

#[cfg(raw_input)]
fn probe() {
    let (session, _devices) = match tracepad::Builder::new().build_raw_input() {
        Ok(built) => built,
        Err(err) => {
            tracing::error!(%err, "device enumeration failed");
            std::process::exit(1);
        }
    };
    for (name, pad) in session.touchpads() {
        println!(
            "{name}: {}x{}, {} contacts",
            pad.width,
            pad.height,
            pad.max_contacts()
        );
    }
    match session.dimensions() {
        Ok(dimensions) => println!(
            "renderer gets {}x{} as {:02X?}",
            dimensions.width,
            dimensions.height,
            dimensions.to_bytes()
        ),
        Err(err) => tracing::error!(%err, "touchpad too large to describe"),
    }
}

#[cfg(not(raw_input))]
fn probe() {
    tracing::warn!("built without a raw input backend, nothing to probe");
}
