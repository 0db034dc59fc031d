// ABOUTME: Layers command implementation.
// ABOUTME: Prints stacks grouped into dependency layers, first to last.

use strata::config::Config;
use strata::error::Result;
use strata::layers::Layers;
use strata::output::Output;

pub fn layers(config: &Config, only_pushable: bool, output: &Output) -> Result<()> {
    let layers = Layers::layered(&config.stacks, only_pushable)?;

    for (index, layer) in layers.iter().enumerate() {
        output.item(&format!("layer {}: {}", index + 1, layer.join(", ")), layer);
    }

    output.success(&format!("{} layer(s)", layers.len()));
    Ok(())
}
