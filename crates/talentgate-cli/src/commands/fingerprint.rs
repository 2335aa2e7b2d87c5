//! Compute a device fingerprint and compare it with a stored one.

use anyhow::{Context, Result};
use talentgate_device::{DeviceAttributes, DeviceFingerprint, is_new_device};

use crate::style::{print_labeled, print_warn};

pub fn run(device: &DeviceAttributes, stored: Option<&str>) -> Result<()> {
    let stored = stored
        .map(DeviceFingerprint::parse)
        .transpose()
        .context("Invalid --stored fingerprint")?;

    let current = device.fingerprint();
    println!("{current}");

    if is_new_device(stored.as_ref(), &current) {
        print_warn("new device");
    } else {
        print_labeled("device", "known");
    }
    Ok(())
}
