// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine, film and output configuration derived from settings plus what the
//! pass discovered.

use std::collections::BTreeSet;

use relay_app_core::ExportSettings;
use relay_props::PropertySet;
use relay_scene_port::AuxOutput;

/// Film output type of the beauty pass.
pub const BEAUTY_OUTPUT: &str = "RGB_IMAGEPIPELINE";

/// Film output type of a per-light-group pass.
pub const LIGHT_GROUP_OUTPUT: &str = "RADIANCE_GROUP";

/// Build the renderer configuration.
///
/// Output 0 is always the beauty pass. When enabled, one radiance output per
/// light group follows in id order, then every requested auxiliary output in
/// a fixed order, each once.
pub fn build_config(
    settings: &ExportSettings,
    light_groups: &[String],
    aux_outputs: &BTreeSet<AuxOutput>,
) -> PropertySet {
    let mut config = PropertySet::new();
    config
        .set("renderengine.type", settings.engine.as_str())
        .set("sampler.type", settings.sampler.as_str())
        .set("film.width", settings.film_width)
        .set("film.height", settings.film_height)
        .set("film.outputs.0.type", BEAUTY_OUTPUT);

    let mut next = 1_usize;
    let mut push_output = |config: &mut PropertySet, output_type: &str| -> usize {
        let index = next;
        config.set(format!("film.outputs.{index}.type"), output_type);
        next += 1;
        index
    };

    if settings.light_group_outputs {
        for id in 0..light_groups.len() {
            let index = push_output(&mut config, LIGHT_GROUP_OUTPUT);
            config.set(
                format!("film.outputs.{index}.id"),
                u32::try_from(id).unwrap_or(u32::MAX),
            );
        }
    }

    let requested: BTreeSet<AuxOutput> = aux_outputs
        .iter()
        .chain(settings.extra_outputs.iter())
        .copied()
        .collect();
    for output in requested {
        push_output(&mut config, output.output_type());
    }

    if settings.halt_spp > 0 {
        config.set("batch.haltspp", settings.halt_spp);
    }
    if settings.halt_time_secs > 0 {
        config.set("batch.halttime", settings.halt_time_secs);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_types(config: &PropertySet) -> Vec<String> {
        (0..)
            .map_while(|i| config.get_str(&format!("film.outputs.{i}.type")))
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn two_light_groups_two_radiance_outputs() {
        let settings = ExportSettings::default();
        let groups = vec!["default".to_owned(), "window".to_owned()];
        let config = build_config(&settings, &groups, &BTreeSet::new());
        assert_eq!(
            output_types(&config),
            vec![BEAUTY_OUTPUT, LIGHT_GROUP_OUTPUT, LIGHT_GROUP_OUTPUT]
        );
        assert_eq!(
            config.first("film.outputs.2.id").and_then(relay_props::PropValue::as_i64),
            Some(1)
        );
    }

    #[test]
    fn light_group_outputs_can_be_disabled() {
        let settings = ExportSettings::preview();
        let groups = vec!["default".to_owned()];
        let config = build_config(&settings, &groups, &BTreeSet::new());
        assert_eq!(output_types(&config), vec![BEAUTY_OUTPUT]);
        assert_eq!(config.get_str("renderengine.type"), Some("RTPATHCPU"));
    }

    #[test]
    fn requested_outputs_appear_once() {
        let settings = ExportSettings {
            extra_outputs: vec![AuxOutput::Depth, AuxOutput::Albedo],
            light_group_outputs: false,
            ..ExportSettings::default()
        };
        let requested = BTreeSet::from([AuxOutput::Albedo, AuxOutput::MaterialId]);
        let config = build_config(&settings, &[], &requested);
        assert_eq!(
            output_types(&config),
            vec![BEAUTY_OUTPUT, "MATERIAL_ID", "ALBEDO", "DEPTH"]
        );
    }

    #[test]
    fn halt_conditions_only_when_set() {
        let mut settings = ExportSettings::default();
        assert!(!build_config(&settings, &[], &BTreeSet::new()).contains("batch.haltspp"));
        settings.halt_spp = 64;
        let config = build_config(&settings, &[], &BTreeSet::new());
        assert_eq!(
            config.first("batch.haltspp").and_then(relay_props::PropValue::as_i64),
            Some(64)
        );
        assert!(!config.contains("batch.halttime"));
    }
}
