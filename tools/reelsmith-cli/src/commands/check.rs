//! Check system capabilities.

use reelsmith_common::{config_file_path, AppConfig};
use reelsmith_render_engine::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelsmith System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;
    for (role, binary) in [
        ("Encoder", &config.render.ffmpeg_path),
        ("Probe", &config.render.ffprobe_path),
    ] {
        if command_exists(binary) {
            println!("[OK] {role}: {binary}");
        } else {
            println!("[MISSING] {role}: {binary} not found in PATH");
            ready = false;
        }
    }

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }
    println!("     Jobs dir: {}", config.jobs_dir.display());
    println!("     Output dir: {}", config.output_dir.display());

    let store = &config.assets.object_store;
    match (&store.root, &store.base_url) {
        (Some(root), _) => println!("[OK] Object store: directory {}", root.display()),
        (None, Some(url)) => println!("[OK] Object store: {url}"),
        (None, None) => println!("[INFO] Object store: none (renders stay local)"),
    }

    println!();
    if ready {
        println!("All required tools are available. Reelsmith is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg to render.");
    }
    Ok(())
}
