//! Compile a timeline without rendering it.

use std::path::PathBuf;

use reelsmith_common::AppConfig;
use reelsmith_render_engine::{plan, validate_output_name, CompileOptions, EncodeSettings, NodeKind};
use reelsmith_timeline::Timeline;

pub fn run(config: &AppConfig, path: PathBuf, output: String, graph_only: bool) -> anyhow::Result<()> {
    validate_output_name(&output)?;
    let timeline =
        Timeline::load(&path).map_err(|e| anyhow::anyhow!("Failed to load timeline: {e}"))?;
    timeline.validate()?;

    let compiled = plan(&timeline, &CompileOptions::from(&config.render))?;
    if graph_only {
        println!("{}", compiled.filter_complex().replace(';', ";\n"));
        return Ok(());
    }

    let graph = &compiled.graph;
    eprintln!(
        "  Graph: {} input(s), {} clip chain(s), {} text node(s), {} audio chain(s)",
        graph.inputs.len(),
        graph.nodes_of(NodeKind::ClipChain).count(),
        graph.nodes_of(NodeKind::TextDraw).count(),
        graph.nodes_of(NodeKind::AudioChain).count()
    );

    let output_path = config.output_dir.join(&output);
    let args = compiled.ffmpeg_args(&output_path, &EncodeSettings::from(&config.render));
    let quoted: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
    println!("{} {}", config.render.ffmpeg_path, quoted.join(" "));
    Ok(())
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:+=,@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("-c:v"), "-c:v");
        assert_eq!(shell_quote("[vout]"), "'[vout]'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
