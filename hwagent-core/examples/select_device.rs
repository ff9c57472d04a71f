//! Select the attached signing device and print its details
//!
//! Run with: RUST_LOG=debug cargo run --example select_device

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut device = hwagent_core::load()?;
    device.connection_mut().ping("hwagent")?;

    let info = device.device_info();
    println!("{}", serde_json::to_string_pretty(&info)?);

    let identity = device.identity_type().identity("ssh://git@github.com", 0)?;
    println!("identity {identity} -> {:?}", identity.address_n());
    Ok(())
}
