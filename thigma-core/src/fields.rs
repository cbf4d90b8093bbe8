//! Routing of parsed status fields into the machine model.
//!
//! Two static tables map wire field names to handlers: one for scalar
//! fields, one for array fields. Parsed values arrive as raw text and
//! handlers decode what they need; a value that fails to decode leaves
//! the model untouched, matching the link's graceful-degradation rule.
//!
//! The tables must stay sorted (ASCII case-insensitive, no duplicates)
//! for the binary search in [`FieldTable`]; `test_tables_sorted` guards
//! the ordering whenever an entry is added.

use thigma_protocol::{decode_float, decode_int, FieldTable};

use crate::model::MachineModel;
use crate::status::{HeaterStatus, PrinterStatus};

/// Handler for a scalar field value
pub type ScalarHandler = fn(&mut MachineModel, &str);

/// Handler for one element of an array field
pub type ArrayHandler = fn(&mut MachineModel, u16, &str);

fn on_beep_freq(model: &mut MachineModel, value: &str) {
    if let Some(hertz) = decode_int(value) {
        model.set_beep_frequency(hertz);
    }
}

fn on_beep_length(model: &mut MachineModel, value: &str) {
    if let Some(millis) = decode_int(value) {
        model.set_beep_length(millis);
    }
}

fn on_dir(model: &mut MachineModel, value: &str) {
    model.set_files_dir(value);
}

fn on_err(model: &mut MachineModel, value: &str) {
    if let Some(code) = decode_int(value) {
        model.set_file_list_err(code);
    }
}

fn on_fraction_printed(model: &mut MachineModel, value: &str) {
    // The wire reports a fraction of the job (0..=1), not a percentage.
    if let Some(fraction) = decode_float(value) {
        let percent = fraction * 100.0;
        let rounded = if percent < 0.0 {
            (percent - 0.5) as i32
        } else {
            (percent + 0.5) as i32
        };
        model.set_fraction_printed(rounded);
    }
}

fn on_generated_by(model: &mut MachineModel, value: &str) {
    model.set_generated_by(value);
}

fn on_geometry(model: &mut MachineModel, value: &str) {
    model.set_geometry(value);
}

fn on_height(model: &mut MachineModel, value: &str) {
    if let Some(mm) = decode_float(value) {
        model.set_print_height(mm);
    }
}

fn on_layer_height(model: &mut MachineModel, value: &str) {
    if let Some(mm) = decode_float(value) {
        model.set_layer_height(mm);
    }
}

fn on_message(model: &mut MachineModel, value: &str) {
    model.set_message(value);
}

fn on_my_name(model: &mut MachineModel, value: &str) {
    model.set_printer_name(value);
}

fn on_probe(model: &mut MachineModel, value: &str) {
    model.set_probe(value);
}

fn on_resp(model: &mut MachineModel, value: &str) {
    model.set_response(value);
}

fn on_sfactor(model: &mut MachineModel, value: &str) {
    if let Some(percent) = decode_int(value) {
        model.set_speed_factor(percent);
    }
}

fn on_size(model: &mut MachineModel, value: &str) {
    if let Some(bytes) = decode_int(value) {
        model.set_file_size(bytes);
    }
}

fn on_status(model: &mut MachineModel, value: &str) {
    if let Some(status) = PrinterStatus::from_wire(value) {
        model.set_status(status);
    }
}

fn on_active(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(celsius) = decode_int(value) {
        model.set_active_temp(index as usize, celsius);
    }
}

fn on_efactor(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(percent) = decode_int(value) {
        model.set_extrusion_factor(index as usize, percent);
    }
}

fn on_fan_percent(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(percent) = decode_int(value) {
        model.set_fan_percent(index as usize, percent);
    }
}

fn on_filament(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(mm) = decode_float(value) {
        model.set_filament_needed(index as usize, mm);
    }
}

fn on_files(model: &mut MachineModel, index: u16, value: &str) {
    model.set_file_name(index, value);
}

fn on_heaters(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(celsius) = decode_float(value) {
        model.set_current_temp(index as usize, celsius);
    }
}

fn on_homed(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(flag) = decode_int(value) {
        model.set_axis_homed(index as usize, flag != 0);
    }
}

fn on_hstat(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(status) = decode_int(value).and_then(HeaterStatus::from_code) {
        model.set_heater_status(index as usize, status);
    }
}

fn on_pos(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(mm) = decode_float(value) {
        model.set_position(index as usize, mm);
    }
}

fn on_standby(model: &mut MachineModel, index: u16, value: &str) {
    if let Some(celsius) = decode_int(value) {
        model.set_standby_temp(index as usize, celsius);
    }
}

/// Scalar fields, sorted case-insensitively by name
pub static SCALAR_FIELDS: FieldTable<ScalarHandler> = FieldTable::new(&[
    ("beep_freq", on_beep_freq),
    ("beep_length", on_beep_length),
    ("dir", on_dir),
    ("err", on_err),
    ("fraction_printed", on_fraction_printed),
    ("generatedBy", on_generated_by),
    ("geometry", on_geometry),
    ("height", on_height),
    ("layerHeight", on_layer_height),
    ("message", on_message),
    ("myName", on_my_name),
    ("probe", on_probe),
    ("resp", on_resp),
    ("sfactor", on_sfactor),
    ("size", on_size),
    ("status", on_status),
]);

/// Array fields, sorted case-insensitively by name
pub static ARRAY_FIELDS: FieldTable<ArrayHandler> = FieldTable::new(&[
    ("active", on_active),
    ("efactor", on_efactor),
    ("fanPercent", on_fan_percent),
    ("filament", on_filament),
    ("files", on_files),
    ("heaters", on_heaters),
    ("homed", on_homed),
    ("hstat", on_hstat),
    ("pos", on_pos),
    ("standby", on_standby),
]);

/// Route one parsed field into the model
///
/// Returns whether the name was recognized. Scalar and array fields live
/// in separate tables, so a scalar arriving where an array is expected
/// (or vice versa) is treated as unknown.
pub fn apply(model: &mut MachineModel, name: &str, value: &str, index: Option<u16>) -> bool {
    match index {
        None => match SCALAR_FIELDS.lookup(name) {
            Some(handler) => {
                handler(model, value);
                true
            }
            None => false,
        },
        Some(i) => match ARRAY_FIELDS.lookup(name) {
            Some(handler) => {
                handler(model, i, value);
                true
            }
            None => false,
        },
    }
}
