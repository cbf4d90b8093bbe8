//! Printer and heater status codes reported by the board

/// Overall printer state, decoded from the single-letter `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrinterStatus {
    /// No status seen yet on this connection
    Unknown,
    /// Processing the configuration file (`C`)
    Configuring,
    /// Idle (`I`)
    Idle,
    /// Busy with a blocking operation (`B`)
    Busy,
    /// Printing (`P`)
    Printing,
    /// Decelerating into a pause (`D`)
    Pausing,
    /// Print stopped and resumable (`S`)
    Paused,
    /// Resuming a paused print (`R`)
    Resuming,
    /// Halted after an emergency stop (`H`)
    Halted,
    /// Writing new firmware to flash (`F`)
    Flashing,
    /// Changing tool (`T`)
    ToolChange,
}

impl PrinterStatus {
    /// Decode the `status` field value
    ///
    /// Empty or unrecognized text yields `None`, so a garbled report
    /// leaves the previously seen state in place.
    pub fn from_wire(text: &str) -> Option<Self> {
        match text.as_bytes().first() {
            Some(b'C') => Some(PrinterStatus::Configuring),
            Some(b'I') => Some(PrinterStatus::Idle),
            Some(b'B') => Some(PrinterStatus::Busy),
            Some(b'P') => Some(PrinterStatus::Printing),
            Some(b'D') => Some(PrinterStatus::Pausing),
            Some(b'S') => Some(PrinterStatus::Paused),
            Some(b'R') => Some(PrinterStatus::Resuming),
            Some(b'H') => Some(PrinterStatus::Halted),
            Some(b'F') => Some(PrinterStatus::Flashing),
            Some(b'T') => Some(PrinterStatus::ToolChange),
            _ => None,
        }
    }

    /// May we send ordinary requests to the board in this state?
    ///
    /// Configuring, busy, halted and flashing states are left alone so the
    /// board is not derailed by pendant traffic.
    pub fn ready_for_requests(&self) -> bool {
        matches!(
            self,
            PrinterStatus::Idle | PrinterStatus::Printing | PrinterStatus::Paused
        )
    }

    /// A print job is in progress, possibly paused
    pub fn is_print_active(&self) -> bool {
        matches!(
            self,
            PrinterStatus::Printing
                | PrinterStatus::Pausing
                | PrinterStatus::Paused
                | PrinterStatus::Resuming
        )
    }
}

/// Per-heater state, decoded from the numeric `hstat` array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaterStatus {
    /// Heater off (`0`)
    Off,
    /// Holding standby temperature (`1`)
    Standby,
    /// Holding active temperature (`2`)
    Active,
    /// Fault detected (`3`)
    Fault,
}

impl HeaterStatus {
    /// Decode an `hstat` element; codes outside the table yield `None`
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(HeaterStatus::Off),
            1 => Some(HeaterStatus::Standby),
            2 => Some(HeaterStatus::Active),
            3 => Some(HeaterStatus::Fault),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_letters() {
        assert_eq!(PrinterStatus::from_wire("I"), Some(PrinterStatus::Idle));
        assert_eq!(PrinterStatus::from_wire("P"), Some(PrinterStatus::Printing));
        assert_eq!(PrinterStatus::from_wire("S"), Some(PrinterStatus::Paused));
        assert_eq!(
            PrinterStatus::from_wire("C"),
            Some(PrinterStatus::Configuring)
        );
        assert_eq!(PrinterStatus::from_wire("H"), Some(PrinterStatus::Halted));
        assert_eq!(PrinterStatus::from_wire("B"), Some(PrinterStatus::Busy));
        assert_eq!(PrinterStatus::from_wire("D"), Some(PrinterStatus::Pausing));
        assert_eq!(PrinterStatus::from_wire("R"), Some(PrinterStatus::Resuming));
        assert_eq!(PrinterStatus::from_wire("F"), Some(PrinterStatus::Flashing));
        assert_eq!(
            PrinterStatus::from_wire("T"),
            Some(PrinterStatus::ToolChange)
        );
    }

    #[test]
    fn test_status_unknown_forms() {
        assert_eq!(PrinterStatus::from_wire(""), None);
        assert_eq!(PrinterStatus::from_wire("Z"), None);
        // Lowercase letters are not valid status codes.
        assert_eq!(PrinterStatus::from_wire("i"), None);
    }

    #[test]
    fn test_ready_for_requests() {
        assert!(PrinterStatus::Idle.ready_for_requests());
        assert!(PrinterStatus::Printing.ready_for_requests());
        assert!(PrinterStatus::Paused.ready_for_requests());
        assert!(!PrinterStatus::Unknown.ready_for_requests());
        assert!(!PrinterStatus::Configuring.ready_for_requests());
        assert!(!PrinterStatus::Busy.ready_for_requests());
        assert!(!PrinterStatus::Halted.ready_for_requests());
        assert!(!PrinterStatus::Flashing.ready_for_requests());
    }

    #[test]
    fn test_print_active() {
        assert!(PrinterStatus::Printing.is_print_active());
        assert!(PrinterStatus::Paused.is_print_active());
        assert!(PrinterStatus::Resuming.is_print_active());
        assert!(!PrinterStatus::Idle.is_print_active());
        assert!(!PrinterStatus::Busy.is_print_active());
    }

    #[test]
    fn test_heater_codes() {
        assert_eq!(HeaterStatus::from_code(0), Some(HeaterStatus::Off));
        assert_eq!(HeaterStatus::from_code(1), Some(HeaterStatus::Standby));
        assert_eq!(HeaterStatus::from_code(2), Some(HeaterStatus::Active));
        assert_eq!(HeaterStatus::from_code(3), Some(HeaterStatus::Fault));
        assert_eq!(HeaterStatus::from_code(-1), None);
        assert_eq!(HeaterStatus::from_code(99), None);
    }
}
