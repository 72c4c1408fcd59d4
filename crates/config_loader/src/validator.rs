//! Configuration validation
//!
//! Rules:
//! - input paths are non-empty
//! - window_size > 0 and 0 < min_matched <= window_size
//! - tolerance_ticks >= 0, fine_time_bits < 16
//! - ahcal_cycle_modulo is a power of two, max_backwards < modulo
//! - sink names are non-empty and unique; file sinks carry a `path` param

use std::collections::HashSet;

use contracts::{ContractError, RunBlueprint};

/// Validate a RunBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    validate_inputs(blueprint)?;
    validate_decoder(blueprint)?;
    validate_correlation(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_inputs(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let inputs = &blueprint.inputs;
    for (field, path) in [("inputs.bif", &inputs.bif), ("inputs.ahcal", &inputs.ahcal)] {
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(field, "path cannot be empty"));
        }
    }
    if inputs.dwc.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
        return Err(ContractError::config_validation(
            "inputs.dwc",
            "path cannot be empty (omit the key instead)",
        ));
    }
    Ok(())
}

fn validate_decoder(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let ahcal = &blueprint.decoder.ahcal;
    if !ahcal.cycle_modulo.is_power_of_two() {
        return Err(ContractError::config_validation(
            "decoder.ahcal_cycle_modulo",
            format!("must be a power of two, got {}", ahcal.cycle_modulo),
        ));
    }
    if ahcal.max_backwards >= ahcal.cycle_modulo {
        return Err(ContractError::config_validation(
            "decoder.ahcal_max_backwards",
            format!(
                "max_backwards ({}) must be < cycle_modulo ({})",
                ahcal.max_backwards, ahcal.cycle_modulo
            ),
        ));
    }
    Ok(())
}

fn validate_correlation(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let corr = &blueprint.correlation;
    if corr.window_size == 0 {
        return Err(ContractError::config_validation(
            "correlation.window_size",
            "window_size must be > 0",
        ));
    }
    if corr.min_matched == 0 || corr.min_matched > corr.window_size {
        return Err(ContractError::config_validation(
            "correlation.min_matched",
            format!(
                "min_matched ({}) must be in 1..={}",
                corr.min_matched, corr.window_size
            ),
        ));
    }
    if corr.tolerance_ticks < 0 {
        return Err(ContractError::config_validation(
            "correlation.tolerance_ticks",
            format!("tolerance_ticks must be >= 0, got {}", corr.tolerance_ticks),
        ));
    }
    if corr.fine_time_bits >= 16 {
        return Err(ContractError::config_validation(
            "correlation.fine_time_bits",
            format!("fine_time_bits must be < 16, got {}", corr.fine_time_bits),
        ));
    }
    Ok(())
}

fn validate_sinks(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.sink_type.is_file_backed()
            && sink.params.get("path").map_or(true, |p| p.is_empty())
        {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                format!("{:?} sink requires a 'path' parameter", sink.sink_type),
            ));
        }
    }
    Ok(())
}
