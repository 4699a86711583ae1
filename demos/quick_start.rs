//! Quick Start Example
//!
//! Demonstrates the minimal setup to run the sensor core against a
//! simulated device: a two-cell layout, an identity calibration profile,
//! and a polling loop over the patch aggregate.

use skin_config::LayoutRow;
use skin_core::{Layout, SensorBuilder};
use skin_hardware::{SimulatedDevice, SimulatedDeviceOpener};
use std::time::Duration;

fn main() -> eyre::Result<()> {
    let layout = Layout::load(&[
        LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 },
        LayoutRow { patch: 1, cell: 1, x: 1.0, y: 0.0 },
    ])?;

    let records = [(1u8, 0u8, 100i32), (1, 1, 140)];
    let script = SimulatedDevice::encode_records(&records, 8, &[0xAA, 0x55]);
    let opener = SimulatedDeviceOpener::looping(script, 8);

    let mut sensor = SensorBuilder::new()
        .with_layout(layout)
        .with_device_opener(opener)
        .with_alpha(0.5)
        .try_build()?;

    sensor.start()?;
    std::thread::sleep(Duration::from_millis(50));
    println!("patch 1 mean = {:.3}", sensor.get_patch_mean(1)?);
    let (mag, cx, cy) = sensor.get_patch_pressure(1)?;
    println!("patch 1 pressure = {mag:.3} at ({cx:.3}, {cy:.3})");
    sensor.stop()?;

    Ok(())
}
