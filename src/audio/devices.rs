use anyhow::Result;
use console::style;
use cpal::traits::{DeviceTrait, HostTrait};

/// List the audio input devices the detector could capture from.
pub fn list() -> Result<()> {
    let host = cpal::default_host();

    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    let devices: Vec<_> = host.input_devices()?.collect();
    if devices.is_empty() {
        eprintln!("No audio input devices found.");
        return Ok(());
    }

    println!("{}", style("Input devices").bold());
    println!();

    for device in &devices {
        let name = device.name().unwrap_or_else(|_| "<unknown>".into());
        if name == default_name {
            println!("  {} {}", style("*").green().bold(), style(&name).green());
        } else {
            println!("    {name}");
        }

        match device.supported_input_configs() {
            Ok(configs) => {
                for cfg in configs {
                    let min = cfg.min_sample_rate().0;
                    let max = cfg.max_sample_rate().0;
                    let rates = if min == max {
                        format!("{min} Hz")
                    } else {
                        format!("{min}-{max} Hz")
                    };
                    println!(
                        "      {}ch  {rates}  {:?}",
                        cfg.channels(),
                        cfg.sample_format()
                    );
                }
            }
            Err(e) => println!("      could not query configs: {e}"),
        }
    }

    println!();
    println!("  {} = default input", style("*").green().bold());

    Ok(())
}
