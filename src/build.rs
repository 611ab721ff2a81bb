//! Top-level build driver.
//!
//! One build invocation runs strictly in sequence: clear the output
//! directory, index every root, then build each device's manifest and
//! image. Device builds are fail-fast: the first failure aborts the run,
//! and a failed device writes neither manifest nor image.

use crate::config::Config;
use crate::error::{BuildError, Result};
use crate::firmware::{FirmwareDef, FirmwareManifest, DEFINITION_FILE};
use crate::root::{index_root, RootSet};
use crate::{fsutil, image, lfs, resolve};

/// Index the shared core root, every library root, and every device root.
pub fn index_all_roots(config: &Config) -> Result<RootSet> {
    let mut roots = RootSet::new();

    println!("Indexing firmware root {}", config.firmware_dir.display());
    roots.add(index_root("firmware", &config.firmware_dir)?);

    let lib_dir = config.lib_dir();
    for name in fsutil::list_dir(&lib_dir)?.dirs {
        roots.add(index_root(&format!("lib/{name}"), &lib_dir.join(&name))?);
    }

    let devices_dir = config.devices_dir();
    for name in fsutil::list_dir(&devices_dir)?.dirs {
        roots.add(index_root(
            &format!("device/{name}"),
            &devices_dir.join(&name),
        )?);
    }

    Ok(roots)
}

/// Build the manifest and image for one device. Both artifacts are fully
/// assembled in memory before anything is written, so a failure leaves no
/// partial output for the device.
pub fn build_device(config: &Config, roots: &RootSet, device: &str) -> Result<()> {
    let definition_path = config.device_dir(device).join(DEFINITION_FILE);
    let def = FirmwareDef::load(device, &definition_path)?;

    let mut files = resolve::assemble_device(roots, &def, device)?;
    if def.lfs {
        if let Some(entry) = lfs::build_lfs_image(config, &def, &files)? {
            files.insert(entry.path.clone(), entry);
        }
    }

    let (manifest, entries) = FirmwareManifest::from_file_set(&def, &files);
    let image_bytes = image::pack(&def.device, &entries)?;

    let manifest_path = config.dist_dir.join(format!("{}.json", def.device.id));
    let image_path = config.dist_dir.join(format!("{}.img", def.device.id));
    manifest.save(&manifest_path)?;
    fsutil::write_bytes(&image_path, &image_bytes)?;

    println!(
        "Built device {} ({} files) -> {}",
        def.device.id,
        manifest.files.len(),
        image_path.display()
    );
    Ok(())
}

/// Run a full build: every device, in sorted name order, fail-fast.
/// With `only`, build that single device (all roots are still indexed).
pub fn build(config: &Config, only: Option<&str>) -> Result<()> {
    fsutil::remove_dir_contents(&config.dist_dir)?;

    let roots = index_all_roots(config)?;

    let devices = fsutil::list_dir(&config.devices_dir())?.dirs;
    if let Some(device) = only {
        if !devices.iter().any(|d| d == device) {
            return Err(BuildError::RootNotFound(format!("device/{device}")));
        }
    }
    for device in devices {
        if only.is_some_and(|d| d != device) {
            continue;
        }
        build_device(config, &roots, &device).map_err(|e| BuildError::Device {
            device: device.clone(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}

/// Remove build outputs. The bytecode cache survives unless `cache` is set.
pub fn clean(config: &Config, cache: bool) -> Result<()> {
    println!("Removing {} contents...", config.dist_dir.display());
    fsutil::remove_dir_contents(&config.dist_dir)?;
    if cache {
        println!("Removing {} contents...", config.imgcache_dir.display());
        fsutil::remove_dir_contents(&config.imgcache_dir)?;
    }
    println!("Clean complete.");
    Ok(())
}
