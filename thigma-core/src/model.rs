//! Mirror of the printer state the pendant renders from.
//!
//! [`MachineModel`] is plain data: field handlers write into it as status
//! records arrive and the UI reads it back out. One-shot items (beeps,
//! messages, a refreshed file list) are latched and handed over through
//! `take_*` accessors so the UI acts on them exactly once.
//!
//! All storage is fixed-size. Array updates whose index falls outside the
//! arrays are ignored, so a board with more heaters or axes than the
//! pendant tracks degrades to showing the first few.

use heapless::{String, Vec};

use crate::status::{HeaterStatus, PrinterStatus};

/// Heater slots tracked, bed first
pub const MAX_HEATERS: usize = 6;

/// Motion axes tracked (X, Y, Z)
pub const MAX_AXES: usize = 3;

/// Extruder slots tracked
pub const MAX_EXTRUDERS: usize = 4;

/// Fan slots tracked
pub const MAX_FANS: usize = 4;

/// File list entries kept from one directory listing
pub const MAX_FILES: usize = 20;

/// Longest stored file name in bytes
pub const FILENAME_LEN: usize = 64;

/// Longest stored printer name in bytes
pub const NAME_LEN: usize = 40;

/// Longest stored message or console response in bytes
pub const MSG_LEN: usize = 100;

/// Longest stored directory path in bytes
pub const DIR_LEN: usize = 100;

/// Copy `src` into `dst`, truncating at the capacity
fn set_clamped<const N: usize>(dst: &mut String<N>, src: &str) {
    dst.clear();
    for ch in src.chars() {
        if dst.push(ch).is_err() {
            break;
        }
    }
}

/// Everything the pendant knows about the printer
#[derive(Debug)]
pub struct MachineModel {
    status: PrinterStatus,

    // Heaters
    current_temps: [f32; MAX_HEATERS],
    active_temps: [i32; MAX_HEATERS],
    standby_temps: [i32; MAX_HEATERS],
    heater_status: [HeaterStatus; MAX_HEATERS],
    num_heaters: usize,

    // Motion
    positions: [f32; MAX_AXES],
    homed: [bool; MAX_AXES],

    // Speed overrides, in percent
    speed_factor: i32,
    extrusion_factors: [i32; MAX_EXTRUDERS],
    fan_percents: [i32; MAX_FANS],

    // Current print job
    fraction_printed: i32,
    print_height: f32,
    layer_height: f32,
    file_size: i32,
    filament_needed: [f32; MAX_EXTRUDERS],
    generated_by: String<MSG_LEN>,

    // Identity
    printer_name: String<NAME_LEN>,
    geometry: String<16>,
    probe: String<16>,

    // File listings
    files: Vec<String<FILENAME_LEN>, MAX_FILES>,
    files_dir: String<DIR_LEN>,
    file_list_err: i32,
    files_changed: bool,
    files_truncated: bool,

    // One-shot items
    beep_frequency: i32,
    beep_length: i32,
    message: String<MSG_LEN>,
    message_pending: bool,
    response: String<MSG_LEN>,
    response_pending: bool,
}

impl Default for MachineModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineModel {
    pub const fn new() -> Self {
        Self {
            status: PrinterStatus::Unknown,
            current_temps: [0.0; MAX_HEATERS],
            active_temps: [0; MAX_HEATERS],
            standby_temps: [0; MAX_HEATERS],
            heater_status: [HeaterStatus::Off; MAX_HEATERS],
            num_heaters: 0,
            positions: [0.0; MAX_AXES],
            homed: [false; MAX_AXES],
            speed_factor: 100,
            extrusion_factors: [100; MAX_EXTRUDERS],
            fan_percents: [0; MAX_FANS],
            fraction_printed: 0,
            print_height: 0.0,
            layer_height: 0.0,
            file_size: 0,
            filament_needed: [0.0; MAX_EXTRUDERS],
            generated_by: String::new(),
            printer_name: String::new(),
            geometry: String::new(),
            probe: String::new(),
            files: Vec::new(),
            files_dir: String::new(),
            file_list_err: 0,
            files_changed: false,
            files_truncated: false,
            beep_frequency: 0,
            beep_length: 0,
            message: String::new(),
            message_pending: false,
            response: String::new(),
            response_pending: false,
        }
    }

    // --- Status ---

    pub fn status(&self) -> PrinterStatus {
        self.status
    }

    pub fn set_status(&mut self, status: PrinterStatus) {
        self.status = status;
    }

    // --- Heaters ---

    /// Heaters the board has reported on so far
    pub fn num_heaters(&self) -> usize {
        self.num_heaters
    }

    pub fn current_temp(&self, heater: usize) -> f32 {
        self.current_temps.get(heater).copied().unwrap_or(0.0)
    }

    pub fn active_temp(&self, heater: usize) -> i32 {
        self.active_temps.get(heater).copied().unwrap_or(0)
    }

    pub fn standby_temp(&self, heater: usize) -> i32 {
        self.standby_temps.get(heater).copied().unwrap_or(0)
    }

    pub fn heater_status(&self, heater: usize) -> HeaterStatus {
        self.heater_status
            .get(heater)
            .copied()
            .unwrap_or(HeaterStatus::Off)
    }

    fn note_heater(&mut self, heater: usize) {
        if heater < MAX_HEATERS && heater + 1 > self.num_heaters {
            self.num_heaters = heater + 1;
        }
    }

    pub fn set_current_temp(&mut self, heater: usize, celsius: f32) {
        if let Some(slot) = self.current_temps.get_mut(heater) {
            *slot = celsius;
            self.note_heater(heater);
        }
    }

    pub fn set_active_temp(&mut self, heater: usize, celsius: i32) {
        if let Some(slot) = self.active_temps.get_mut(heater) {
            *slot = celsius;
            self.note_heater(heater);
        }
    }

    pub fn set_standby_temp(&mut self, heater: usize, celsius: i32) {
        if let Some(slot) = self.standby_temps.get_mut(heater) {
            *slot = celsius;
            self.note_heater(heater);
        }
    }

    pub fn set_heater_status(&mut self, heater: usize, status: HeaterStatus) {
        if let Some(slot) = self.heater_status.get_mut(heater) {
            *slot = status;
            self.note_heater(heater);
        }
    }

    // --- Motion ---

    pub fn position(&self, axis: usize) -> f32 {
        self.positions.get(axis).copied().unwrap_or(0.0)
    }

    pub fn set_position(&mut self, axis: usize, millimetres: f32) {
        if let Some(slot) = self.positions.get_mut(axis) {
            *slot = millimetres;
        }
    }

    pub fn axis_homed(&self, axis: usize) -> bool {
        self.homed.get(axis).copied().unwrap_or(false)
    }

    pub fn all_homed(&self) -> bool {
        self.homed.iter().all(|&h| h)
    }

    pub fn set_axis_homed(&mut self, axis: usize, homed: bool) {
        if let Some(slot) = self.homed.get_mut(axis) {
            *slot = homed;
        }
    }

    // --- Speed overrides ---

    pub fn speed_factor(&self) -> i32 {
        self.speed_factor
    }

    pub fn set_speed_factor(&mut self, percent: i32) {
        self.speed_factor = percent;
    }

    pub fn extrusion_factor(&self, extruder: usize) -> i32 {
        self.extrusion_factors.get(extruder).copied().unwrap_or(100)
    }

    pub fn set_extrusion_factor(&mut self, extruder: usize, percent: i32) {
        if let Some(slot) = self.extrusion_factors.get_mut(extruder) {
            *slot = percent;
        }
    }

    pub fn fan_percent(&self, fan: usize) -> i32 {
        self.fan_percents.get(fan).copied().unwrap_or(0)
    }

    /// Stored clamped to 0..=100
    pub fn set_fan_percent(&mut self, fan: usize, percent: i32) {
        if let Some(slot) = self.fan_percents.get_mut(fan) {
            *slot = percent.clamp(0, 100);
        }
    }

    // --- Print job ---

    pub fn fraction_printed(&self) -> i32 {
        self.fraction_printed
    }

    /// Stored clamped to 0..=100
    pub fn set_fraction_printed(&mut self, percent: i32) {
        self.fraction_printed = percent.clamp(0, 100);
    }

    pub fn print_height(&self) -> f32 {
        self.print_height
    }

    pub fn set_print_height(&mut self, millimetres: f32) {
        self.print_height = millimetres;
    }

    pub fn layer_height(&self) -> f32 {
        self.layer_height
    }

    pub fn set_layer_height(&mut self, millimetres: f32) {
        self.layer_height = millimetres;
    }

    pub fn file_size(&self) -> i32 {
        self.file_size
    }

    pub fn set_file_size(&mut self, bytes: i32) {
        self.file_size = bytes.max(0);
    }

    pub fn filament_needed(&self, extruder: usize) -> f32 {
        self.filament_needed.get(extruder).copied().unwrap_or(0.0)
    }

    pub fn set_filament_needed(&mut self, extruder: usize, millimetres: f32) {
        if let Some(slot) = self.filament_needed.get_mut(extruder) {
            *slot = millimetres;
        }
    }

    pub fn filament_total(&self) -> f32 {
        self.filament_needed.iter().sum()
    }

    pub fn generated_by(&self) -> &str {
        &self.generated_by
    }

    pub fn set_generated_by(&mut self, text: &str) {
        set_clamped(&mut self.generated_by, text);
    }

    // --- Identity ---

    pub fn printer_name(&self) -> &str {
        &self.printer_name
    }

    pub fn set_printer_name(&mut self, text: &str) {
        set_clamped(&mut self.printer_name, text);
    }

    pub fn geometry(&self) -> &str {
        &self.geometry
    }

    pub fn set_geometry(&mut self, text: &str) {
        set_clamped(&mut self.geometry, text);
    }

    pub fn probe(&self) -> &str {
        &self.probe
    }

    pub fn set_probe(&mut self, text: &str) {
        set_clamped(&mut self.probe, text);
    }

    // --- File listings ---

    pub fn files(&self) -> &[String<FILENAME_LEN>] {
        &self.files
    }

    pub fn files_dir(&self) -> &str {
        &self.files_dir
    }

    pub fn file_list_err(&self) -> i32 {
        self.file_list_err
    }

    pub fn set_file_list_err(&mut self, code: i32) {
        self.file_list_err = code;
    }

    /// A new listing is coming; remember its directory and drop the old
    /// entries so an empty directory does not show stale names
    pub fn set_files_dir(&mut self, dir: &str) {
        set_clamped(&mut self.files_dir, dir);
        self.files.clear();
        self.files_changed = true;
    }

    /// Store one file name from the listing
    ///
    /// Index 0 restarts the list for boards that send listings without a
    /// leading `dir` field. A name too long for an entry, or an entry past
    /// [`MAX_FILES`], is dropped whole and the loss is recorded for
    /// [`take_files_truncated`](Self::take_files_truncated).
    pub fn set_file_name(&mut self, index: u16, name: &str) {
        if index == 0 && !self.files.is_empty() {
            self.files.clear();
        }
        match String::try_from(name) {
            Ok(entry) => {
                if self.files.push(entry).is_ok() {
                    self.files_changed = true;
                } else {
                    self.files_truncated = true;
                }
            }
            Err(_) => self.files_truncated = true,
        }
    }

    /// The file list changed since the last call
    pub fn take_files_changed(&mut self) -> bool {
        core::mem::replace(&mut self.files_changed, false)
    }

    /// Listing entries were lost to the storage bounds since the last call
    pub fn take_files_truncated(&mut self) -> bool {
        core::mem::replace(&mut self.files_truncated, false)
    }

    // --- One-shot items ---

    pub fn set_beep_frequency(&mut self, hertz: i32) {
        self.beep_frequency = hertz;
    }

    pub fn set_beep_length(&mut self, millis: i32) {
        self.beep_length = millis;
    }

    /// Frequency and duration of a requested beep, at most once per
    /// request; `None` until both halves have arrived
    pub fn take_beep(&mut self) -> Option<(i32, i32)> {
        if self.beep_frequency > 0 && self.beep_length > 0 {
            let beep = (self.beep_frequency, self.beep_length);
            self.beep_frequency = 0;
            self.beep_length = 0;
            Some(beep)
        } else {
            None
        }
    }

    pub fn set_message(&mut self, text: &str) {
        set_clamped(&mut self.message, text);
        self.message_pending = !text.is_empty();
    }

    /// Display message from the board, delivered once
    pub fn take_message(&mut self) -> Option<String<MSG_LEN>> {
        if self.message_pending {
            self.message_pending = false;
            Some(self.message.clone())
        } else {
            None
        }
    }

    pub fn set_response(&mut self, text: &str) {
        set_clamped(&mut self.response, text);
        self.response_pending = !text.is_empty();
    }

    /// Console output from the last command, delivered once
    pub fn take_response(&mut self) -> Option<String<MSG_LEN>> {
        if self.response_pending {
            self.response_pending = false;
            Some(self.response.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let model = MachineModel::new();
        assert_eq!(model.status(), PrinterStatus::Unknown);
        assert_eq!(model.speed_factor(), 100);
        assert_eq!(model.extrusion_factor(0), 100);
        assert_eq!(model.num_heaters(), 0);
        assert!(model.files().is_empty());
        assert!(!model.all_homed());
    }

    #[test]
    fn test_heater_count_tracks_highest_index() {
        let mut model = MachineModel::new();
        model.set_current_temp(0, 60.0);
        assert_eq!(model.num_heaters(), 1);
        model.set_heater_status(2, HeaterStatus::Active);
        assert_eq!(model.num_heaters(), 3);
        // Lower indices do not shrink the count.
        model.set_active_temp(1, 210);
        assert_eq!(model.num_heaters(), 3);
        assert_eq!(model.current_temp(0), 60.0);
        assert_eq!(model.active_temp(1), 210);
        assert_eq!(model.heater_status(2), HeaterStatus::Active);
    }

    #[test]
    fn test_out_of_range_indices_ignored() {
        let mut model = MachineModel::new();
        model.set_current_temp(MAX_HEATERS, 999.0);
        model.set_position(MAX_AXES, 1.0);
        model.set_fan_percent(MAX_FANS, 50);
        assert_eq!(model.num_heaters(), 0);
        assert_eq!(model.current_temp(MAX_HEATERS), 0.0);
        assert_eq!(model.position(MAX_AXES), 0.0);
        assert_eq!(model.fan_percent(MAX_FANS), 0);
    }

    #[test]
    fn test_fraction_printed_clamps() {
        let mut model = MachineModel::new();
        model.set_fraction_printed(150);
        assert_eq!(model.fraction_printed(), 100);
        model.set_fraction_printed(-5);
        assert_eq!(model.fraction_printed(), 0);
        model.set_fraction_printed(42);
        assert_eq!(model.fraction_printed(), 42);
    }

    #[test]
    fn test_fan_percent_clamps() {
        let mut model = MachineModel::new();
        model.set_fan_percent(0, 255);
        assert_eq!(model.fan_percent(0), 100);
        model.set_fan_percent(1, -10);
        assert_eq!(model.fan_percent(1), 0);
        model.set_fan_percent(2, 65);
        assert_eq!(model.fan_percent(2), 65);
    }

    #[test]
    fn test_homed_axes() {
        let mut model = MachineModel::new();
        model.set_axis_homed(0, true);
        model.set_axis_homed(1, true);
        assert!(!model.all_homed());
        model.set_axis_homed(2, true);
        assert!(model.all_homed());
        assert!(model.axis_homed(1));
    }

    #[test]
    fn test_beep_needs_both_halves() {
        let mut model = MachineModel::new();
        model.set_beep_frequency(440);
        assert_eq!(model.take_beep(), None);
        model.set_beep_length(500);
        assert_eq!(model.take_beep(), Some((440, 500)));
        // Consumed.
        assert_eq!(model.take_beep(), None);
    }

    #[test]
    fn test_message_delivered_once() {
        let mut model = MachineModel::new();
        assert_eq!(model.take_message(), None);
        model.set_message("Heating");
        let msg = model.take_message();
        assert_eq!(msg.as_deref(), Some("Heating"));
        assert_eq!(model.take_message(), None);
        // Empty text clears without arming.
        model.set_message("");
        assert_eq!(model.take_message(), None);
    }

    #[test]
    fn test_new_dir_clears_listing() {
        let mut model = MachineModel::new();
        model.set_files_dir("0:/gcodes");
        model.set_file_name(0, "part.g");
        model.set_file_name(1, "other.g");
        assert_eq!(model.files().len(), 2);
        assert!(model.take_files_changed());
        assert!(!model.take_files_changed());

        model.set_files_dir("0:/macros");
        assert!(model.files().is_empty());
        assert_eq!(model.files_dir(), "0:/macros");
        assert!(model.take_files_changed());
    }

    #[test]
    fn test_index_zero_restarts_listing() {
        let mut model = MachineModel::new();
        model.set_file_name(0, "a.g");
        model.set_file_name(1, "b.g");
        model.set_file_name(0, "c.g");
        assert_eq!(model.files().len(), 1);
        assert_eq!(model.files()[0].as_str(), "c.g");
    }

    #[test]
    fn test_file_list_capacity() {
        let mut model = MachineModel::new();
        for i in 0..(MAX_FILES + 5) as u16 {
            model.set_file_name(i, "file.g");
        }
        assert_eq!(model.files().len(), MAX_FILES);
        // The dropped tail is recorded, once.
        assert!(model.take_files_truncated());
        assert!(!model.take_files_truncated());
    }

    #[test]
    fn test_overlong_file_name_dropped() {
        let mut model = MachineModel::new();
        let mut long: String<{ FILENAME_LEN + 1 }> = String::new();
        for _ in 0..FILENAME_LEN + 1 {
            long.push('x').unwrap();
        }
        model.set_file_name(0, "short.g");
        assert!(!model.take_files_truncated());

        model.set_file_name(1, &long);
        assert_eq!(model.files().len(), 1);
        assert_eq!(model.files()[0].as_str(), "short.g");
        assert!(model.take_files_truncated());

        // A name exactly at the bound still fits.
        model.set_file_name(2, &long[..FILENAME_LEN]);
        assert_eq!(model.files().len(), 2);
        assert!(!model.take_files_truncated());
    }

    #[test]
    fn test_filament_total_sums_extruders() {
        let mut model = MachineModel::new();
        model.set_filament_needed(0, 1000.0);
        model.set_filament_needed(1, 250.5);
        assert_eq!(model.filament_total(), 1250.5);
        // Out of range adds nothing.
        model.set_filament_needed(MAX_EXTRUDERS, 99.0);
        assert_eq!(model.filament_total(), 1250.5);
    }

    #[test]
    fn test_long_strings_truncate() {
        let mut model = MachineModel::new();
        let mut long: String<{ NAME_LEN + 10 }> = String::new();
        for _ in 0..NAME_LEN + 10 {
            long.push('x').unwrap();
        }
        model.set_printer_name(&long);
        assert_eq!(model.printer_name().len(), NAME_LEN);
    }
}
